use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::store::{Role, User, UserListItem};

/// Body of `POST /users/signUp`. The role arrives as a query parameter, see
/// [`SignUpParams`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub mobile_number: i64,
}

#[derive(Debug, Deserialize)]
pub struct SignUpParams {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Raw listing parameters as they arrive on the query string; normalized
/// into a `QueryPlan` before they reach the store.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub searchtext: Option<String>,
    pub role: Option<String>,
    pub sortorder: Option<String>,
    pub sortkey: Option<String>,
}

/// User as exposed to callers; the password hash stays behind.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_number: i64,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            mobile_number: user.mobile_number,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub message: String,
    pub items: Vec<UserListItem>,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_never_serializes_the_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            mobile_number: 9876543210,
            role: Role::User,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("john@example.com"));
        assert!(json.contains("\"role\":\"USER\""));
        assert!(json.contains("mobileNumber"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }
}
