use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Identifier issued by the mobile client's auth provider.
    pub external_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
