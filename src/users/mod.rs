pub mod dto;
pub mod handlers;
pub mod password;
pub mod query;
pub mod service;
pub mod store;
pub mod token;

#[cfg(test)]
pub mod memory;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
