//! Resume persistence behind a narrow trait, so handlers and export code never
//! depend on a particular storage technology.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{Resume, StoredResume};

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Persists a new resume for `user_id` and returns its id.
    async fn save(&self, user_id: Uuid, resume: &Resume) -> Result<Uuid, AppError>;

    async fn load(&self, id: Uuid) -> Result<Option<StoredResume>, AppError>;
}

/// PostgreSQL store. Each save is a new row; resumes are never updated in place.
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn save(&self, user_id: Uuid, resume: &Resume) -> Result<Uuid, AppError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO resumes (user_id, data, template)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(Json(resume))
        .bind(resume.template.as_str())
        .fetch_one(&self.pool)
        .await?;

        info!("Saved resume {id} for user {user_id}");
        Ok(id)
    }

    async fn load(&self, id: Uuid) -> Result<Option<StoredResume>, AppError> {
        Ok(sqlx::query_as::<_, StoredResume>(
            "SELECT id, user_id, data, created_at, updated_at FROM resumes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
