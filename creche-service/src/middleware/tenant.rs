//! Tenant context extracted from gateway headers.
//!
//! The authenticating gateway resolves the caller and sets `X-Creche-ID`,
//! `X-User-ID` and `X-User-Role` before forwarding.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::str::FromStr;

pub const CRECHE_ID_HEADER: &str = "X-Creche-ID";
pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    SuperAdmin,
    Admin,
    Director,
    Accountant,
    Staff,
}

impl ActorRole {
    /// Hard-deleting ledger entries is reserved to management.
    pub fn can_delete_ledger_entries(&self) -> bool {
        matches!(
            self,
            ActorRole::SuperAdmin | ActorRole::Admin | ActorRole::Director
        )
    }

    pub fn can_manage_settings(&self) -> bool {
        self.can_delete_ledger_entries()
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "SUPER_ADMIN" => Ok(ActorRole::SuperAdmin),
            "ADMIN" => Ok(ActorRole::Admin),
            "DIRECTOR" => Ok(ActorRole::Director),
            "ACCOUNTANT" => Ok(ActorRole::Accountant),
            "STAFF" => Ok(ActorRole::Staff),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Caller identity and tenant for one request.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub creche_id: String,
    pub user_id: String,
    pub role: ActorRole,
}

impl TenantContext {
    pub fn new(creche_id: impl Into<String>, user_id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            creche_id: creche_id.into(),
            user_id: user_id.into(),
            role,
        }
    }
}

fn required_header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            AppError::AuthError(anyhow::anyhow!(
                "Missing {} header (required from gateway)",
                name
            ))
        })
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let creche_id = required_header(parts, CRECHE_ID_HEADER)?;
        let user_id = required_header(parts, USER_ID_HEADER)?;
        let role: ActorRole = required_header(parts, USER_ROLE_HEADER)?
            .parse()
            .map_err(|e: String| AppError::Forbidden(anyhow::anyhow!(e)))?;

        let span = tracing::Span::current();
        span.record("creche_id", creche_id);
        span.record("user_id", user_id);

        Ok(TenantContext::new(creche_id, user_id, role))
    }
}
