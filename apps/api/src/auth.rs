//! Current-user lookup.
//!
//! The mobile client authenticates against its own provider and forwards the
//! provider's user id in the `x-user-id` header. Only the save flow consults
//! this; export never does.

use async_trait::async_trait;
use axum::http::HeaderMap;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::user::User;

pub const USER_HEADER: &str = "x-user-id";

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves the caller, or `None` when the credential is absent or unknown.
    async fn current_user(&self, credential: Option<&str>) -> Result<Option<User>, AppError>;
}

/// Reads the caller's credential from request headers.
pub fn credential_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Looks the credential up in the `users` table by external id.
pub struct PgAuthProvider {
    pool: PgPool,
}

impl PgAuthProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthProvider for PgAuthProvider {
    async fn current_user(&self, credential: Option<&str>) -> Result<Option<User>, AppError> {
        let Some(external_id) = credential else {
            return Ok(None);
        };
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, external_id, email, created_at FROM users WHERE external_id = $1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
