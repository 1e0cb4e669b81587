use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::query::QueryPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
    Guest,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "USER" => Some(Self::User),
            "ADMIN" => Some(Self::Admin),
            "GUEST" => Some(Self::Guest),
            _ => None,
        }
    }
}

/// Stored user record. Not serialized directly; responses go through the
/// projections in `dto`, which never carry the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub mobile_number: i64,
    pub role: Role,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields for a user about to be persisted; timestamps and id are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub mobile_number: i64,
    pub role: Role,
}

/// Row shape returned by the listing query.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: Role,
    pub mobile_number: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// One page of listing results plus the total size of the filtered set.
/// `count` covers the whole match set, not the page, and is 0 (never
/// absent) when nothing matches.
#[derive(Debug)]
pub struct UserPage {
    pub items: Vec<UserListItem>,
    pub count: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("user store unavailable")]
    Unavailable(#[from] sqlx::Error),
}

/// Persistence seam consumed by the services. The store is the only shared
/// resource and the only suspension point in the core.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Execute filter, sort, paginate and count as one logically atomic
    /// read over the plan's filtered set.
    async fn query(&self, plan: &QueryPlan) -> Result<UserPage, StoreError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, password_hash, mobile_number, role, created_at, updated_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let inserted = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, mobile_number, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.mobile_number)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            _ => StoreError::Unavailable(e),
        })?;
        Ok(inserted)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = $1
            "#
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn query(&self, plan: &QueryPlan) -> Result<UserPage, StoreError> {
        // Count and page run in one transaction so both see the same
        // filtered set.
        let mut tx = self.pool.begin().await?;

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count_query, plan);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await?;

        let mut page_query = QueryBuilder::<Postgres>::new(
            "SELECT id, email, first_name, last_name, \
             first_name || ' ' || last_name AS full_name, \
             role, mobile_number, created_at, updated_at FROM users",
        );
        push_filters(&mut page_query, plan);
        page_query
            .push(" ORDER BY ")
            .push(plan.sort_key.column())
            .push(" ")
            .push(plan.sort_order.sql());
        page_query
            .push(" LIMIT ")
            .push_bind(plan.limit)
            .push(" OFFSET ")
            .push_bind(plan.skip);
        let items: Vec<UserListItem> = page_query
            .build_query_as()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(UserPage { items, count })
    }
}

/// Append the plan's predicates. Absent filters contribute nothing; search
/// and role are ANDed when both present, and the search fragment is ORed
/// across first name, last name and email.
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, plan: &QueryPlan) {
    let mut prefix = " WHERE ";
    if let Some(fragment) = &plan.search {
        let pattern = format!("%{}%", escape_like(fragment));
        query
            .push(prefix)
            .push("(first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
        prefix = " AND ";
    }
    if let Some(role) = plan.role {
        query.push(prefix).push("role = ").push_bind(role);
    }
}

/// Escape LIKE metacharacters so the sanitized fragment matches literally.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
