use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::block::{ExperiencePayload, HeadingPayload, ProjectPayload};

/// A composition request ("resume config"): which block versions to
/// assemble into one document. Every key is optional; references are
/// `identifier[:variant[:version]]` strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionRequest {
    pub heading: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub education: Option<String>,
    pub skills: Option<String>,
    pub experiences: Vec<String>,
    pub projects: Vec<String>,
}

/// Fully resolved content handed to the assembler. References that did
/// not resolve are simply absent — a partial resume is a valid resume.
#[derive(Debug, Clone, Default)]
pub struct ComposedDocument {
    pub experiences: Vec<ExperiencePayload>,
    pub projects: Vec<ProjectPayload>,
    pub skills: Option<Value>,
    pub heading: Option<HeadingPayload>,
    pub education: Option<Value>,
    /// Location/email text resolved from their own blocks; applied as
    /// heading overrides at assembly time, not at resolve time.
    pub location: Option<String>,
    pub email: Option<String>,
}

impl ComposedDocument {
    pub fn is_empty(&self) -> bool {
        self.experiences.is_empty()
            && self.projects.is_empty()
            && self.skills.is_none()
            && self.heading.is_none()
            && self.education.is_none()
            && self.location.is_none()
            && self.email.is_none()
    }
}
