use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::users::dto::{ListQuery, LoginRequest, SignUpRequest};
use crate::users::password::{hash_password, verify_password};
use crate::users::query::build_plan;
use crate::users::store::{NewUser, Role, User, UserPage, UserStore};
use crate::users::token::JwtKeys;

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Validate and persist a new user. The plaintext password only exists for
/// the duration of this call; the store receives the hash.
pub async fn sign_up(
    store: &dyn UserStore,
    role: Role,
    req: SignUpRequest,
) -> Result<User, ApiError> {
    require_non_empty("firstName", &req.first_name)?;
    require_non_empty("lastName", &req.last_name)?;
    require_non_empty("email", &req.email)?;
    require_non_empty("password", &req.password)?;
    if !is_valid_email(&req.email) {
        warn!(email = %req.email, "sign up with malformed email");
        return Err(ApiError::Validation("email is not well-formed".into()));
    }
    if req.mobile_number <= 0 {
        return Err(ApiError::Validation(
            "mobileNumber must be a positive number".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = store
        .insert(NewUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password_hash,
            mobile_number: req.mobile_number,
            role,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, role = ?user.role, "user signed up");
    Ok(user)
}

/// Check credentials and issue a login token. Unknown email and wrong
/// password surface as distinct kinds internally but identically to the
/// caller, and the unknown-email path burns one hashing operation so
/// latency does not tell the two apart.
pub async fn login(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<String, ApiError> {
    require_non_empty("email", &req.email)?;
    require_non_empty("password", &req.password)?;

    let Some(user) = store.find_by_email(&req.email).await? else {
        let _ = hash_password(&req.password);
        warn!(email = %req.email, "login for unknown email");
        return Err(ApiError::UserNotFound);
    };

    if !verify_password(&req.password, &user.password_hash) {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

/// Normalize listing parameters into a plan and run it as one combined
/// filter/sort/paginate/count read.
pub async fn list(store: &dyn UserStore, params: &ListQuery) -> Result<UserPage, ApiError> {
    let plan = build_plan(params)?;
    debug!(?plan, "listing users");
    let page = store.query(&plan).await?;
    Ok(page)
}
