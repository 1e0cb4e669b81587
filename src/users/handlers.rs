use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{
            ListQuery, ListResponse, LoginRequest, LoginResponse, SignUpParams, SignUpRequest,
            SignUpResponse,
        },
        service,
        store::Role,
        token::JwtKeys,
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signUp", post(sign_up))
        .route("/login", post(login))
        .route("/list", get(list))
}

#[instrument(skip(state, payload))]
async fn sign_up(
    State(state): State<AppState>,
    Query(params): Query<SignUpParams>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpResponse>), ApiError> {
    let role = Role::parse(&params.role).ok_or_else(|| {
        ApiError::Validation(format!(
            "role must be one of USER, ADMIN, GUEST; got '{}'",
            params.role
        ))
    })?;
    let user = service::sign_up(state.users.as_ref(), role, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            message: "User signed up successfully".into(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let token = service::login(state.users.as_ref(), &keys, payload).await?;
    Ok(Json(LoginResponse {
        message: "User logged in successfully".into(),
        token,
    }))
}

#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let page = service::list(state.users.as_ref(), &params).await?;
    Ok(Json(ListResponse {
        message: "User list retrieved successfully".into(),
        items: page.items,
        count: page.count,
    }))
}
