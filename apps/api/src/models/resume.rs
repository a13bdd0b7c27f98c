use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// The structured resume collected by the multi-step form.
///
/// Field order here is the export order for every output format:
/// personal info, summary, experience, education, skills.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    /// Empty strings are kept so index-based editing stays stable.
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub template: Template,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
}

impl PersonalInfo {
    /// `email | phone | location`, shared by the text and document formats.
    pub fn contact_line(&self) -> String {
        format!("{} | {} | {}", self.email, self.phone, self.location)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub description: String,
}

impl Experience {
    pub fn date_range(&self) -> String {
        format!("{} - {}", self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub graduation_date: String,
}

/// Visual template. Cosmetic only: no formatter reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    #[default]
    Modern,
    Professional,
    Creative,
}

impl Template {
    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Modern => "modern",
            Template::Professional => "professional",
            Template::Creative => "creative",
        }
    }
}

/// A persisted resume. The form payload lives in a JSONB column.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredResume {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "data")]
    pub resume: Json<Resume>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
