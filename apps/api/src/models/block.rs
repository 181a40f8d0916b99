use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The fixed set of block categories the assembler understands.
/// Lowercase on the wire and in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Experience,
    Project,
    Skills,
    Education,
    Heading,
    Location,
    Email,
    Coursework,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Experience => "experience",
            Category::Project => "project",
            Category::Skills => "skills",
            Category::Education => "education",
            Category::Heading => "heading",
            Category::Location => "location",
            Category::Email => "email",
            Category::Coursework => "coursework",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "experience" => Ok(Category::Experience),
            "project" => Ok(Category::Project),
            "skills" => Ok(Category::Skills),
            "education" => Ok(Category::Education),
            "heading" => Ok(Category::Heading),
            "location" => Ok(Category::Location),
            "email" => Ok(Category::Email),
            "coursework" => Ok(Category::Coursework),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable version of a reusable building block.
/// Rows are append-only: updates insert a new version and flip the
/// previous current flag inside the same transaction.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContentBlock {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category: String,
    pub identifier: String,
    pub variant: String,
    pub version: String,
    pub payload: Value,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Experience block payload. Decoded leniently — older blocks may use
/// `role` instead of `title`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperiencePayload {
    pub title: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub dates: Option<String>,
    pub bullets: Vec<String>,
    pub tags: Vec<String>,
}

impl ExperiencePayload {
    /// Display title: `title` wins over `role`.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.role.as_deref())
            .unwrap_or_default()
    }
}

/// Project block payload. `tech` may be a plain string or a list of
/// stack items, so it stays a raw value until escape time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPayload {
    pub name: Option<String>,
    pub tech: Option<Value>,
    pub bullets: Vec<String>,
    pub tags: Vec<String>,
}

/// Heading block payload. Only non-empty fields override the default
/// identity record at assembly time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingPayload {
    pub name: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub phone_display: Option<String>,
    pub email: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}
