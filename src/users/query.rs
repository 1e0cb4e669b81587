use crate::error::ApiError;
use crate::users::dto::ListQuery;
use crate::users::store::Role;

/// Fields the listing may be sorted by. Anything outside this set is a
/// validation failure, never passed through to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    FirstName,
    Email,
}

impl SortKey {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "firstName" => Some(Self::FirstName),
            "email" => Some(Self::Email),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::FirstName => "first_name",
            Self::Email => "email",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Normalized description of one listing request. Built once per request by
/// [`build_plan`] and handed to the store read-only; absent optional filters
/// are truly absent, not null placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub skip: i64,
    pub limit: i64,
}

const DEFAULT_LIMIT: i64 = 20;

/// Punctuation permitted in search text, everything else is stripped.
const SEARCH_ALLOWED_PUNCT: &str = "!@#$%^&*)(+=._";

/// Reduce raw search input to a literal-matching fragment. Returns `None`
/// when nothing searchable remains, so no text predicate is applied.
fn sanitize_search(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || SEARCH_ALLOWED_PUNCT.contains(*c))
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn build_plan(params: &ListQuery) -> Result<QueryPlan, ApiError> {
    let sort_key = match params.sortkey.as_deref() {
        None => SortKey::CreatedAt,
        Some(raw) => SortKey::parse(raw).ok_or_else(|| {
            ApiError::Validation(format!(
                "sortkey must be one of createdAt, updatedAt, firstName, email; got '{raw}'"
            ))
        })?,
    };

    let sort_order = match params.sortorder.as_deref() {
        None => SortOrder::Desc,
        Some(raw) => SortOrder::parse(raw).ok_or_else(|| {
            ApiError::Validation(format!("sortorder must be ASC or DESC; got '{raw}'"))
        })?,
    };

    let role = match params.role.as_deref() {
        None => None,
        Some(raw) => Some(Role::parse(raw).ok_or_else(|| {
            ApiError::Validation(format!("role must be one of USER, ADMIN, GUEST; got '{raw}'"))
        })?),
    };

    let skip = params.skip.unwrap_or(0);
    if skip < 0 {
        return Err(ApiError::Validation("skip must not be negative".into()));
    }
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit < 1 {
        return Err(ApiError::Validation("limit must be positive".into()));
    }

    Ok(QueryPlan {
        search: params.searchtext.as_deref().and_then(sanitize_search),
        role,
        sort_key,
        sort_order,
        skip,
        limit,
    })
}
