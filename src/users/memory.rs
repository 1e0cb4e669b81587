//! Test-only `UserStore` over a `Vec`, mirroring the semantics the
//! Postgres implementation gets from SQL: conjunction of present filters,
//! case-insensitive substring search ORed across three fields, whole-set
//! count independent of the requested page.

use std::cmp::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::query::{QueryPlan, SortKey, SortOrder};
use crate::users::store::{NewUser, StoreError, User, UserListItem, UserPage, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    records: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

fn matches(plan: &QueryPlan, user: &User) -> bool {
    if let Some(fragment) = &plan.search {
        let needle = fragment.to_lowercase();
        let hit = user.first_name.to_lowercase().contains(&needle)
            || user.last_name.to_lowercase().contains(&needle)
            || user.email.to_lowercase().contains(&needle);
        if !hit {
            return false;
        }
    }
    if let Some(role) = plan.role {
        if user.role != role {
            return false;
        }
    }
    true
}

fn compare(plan: &QueryPlan, a: &User, b: &User) -> Ordering {
    let ordering = match plan.sort_key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortKey::FirstName => a.first_name.cmp(&b.first_name),
        SortKey::Email => a.email.cmp(&b.email),
    };
    match plan.sort_order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let stored = User {
            id: Uuid::new_v4(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            mobile_number: user.mobile_number,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        records.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|u| u.email == email).cloned())
    }

    async fn query(&self, plan: &QueryPlan) -> Result<UserPage, StoreError> {
        let records = self.records.lock().unwrap();
        let mut filtered: Vec<&User> = records.iter().filter(|u| matches(plan, u)).collect();
        let count = filtered.len() as i64;
        filtered.sort_by(|a, b| compare(plan, a, b));
        let items = filtered
            .into_iter()
            .skip(plan.skip as usize)
            .take(plan.limit as usize)
            .map(|u| UserListItem {
                id: u.id,
                email: u.email.clone(),
                first_name: u.first_name.clone(),
                last_name: u.last_name.clone(),
                full_name: format!("{} {}", u.first_name, u.last_name),
                role: u.role,
                mobile_number: u.mobile_number,
                created_at: u.created_at,
                updated_at: u.updated_at,
            })
            .collect();
        Ok(UserPage { items, count })
    }
}
