use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Selection priority for a (category, identifier) chain during matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Always,
    Normal,
    Never,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Always => "always",
            Priority::Normal => "normal",
            Priority::Never => "never",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Priority::Always),
            "normal" => Ok(Priority::Normal),
            "never" => Ok(Priority::Never),
            other => Err(format!(
                "priority must be always, normal, or never, got '{other}'"
            )),
        }
    }
}

/// Policy overlay for one (owner, category, identifier) chain,
/// independent of block versions. Absence implies `normal`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BlockConfig {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category: String,
    pub identifier: String,
    pub priority: String,
    pub pinned_variant: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
