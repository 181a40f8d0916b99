use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Skeleton directory with resume.tex, custom-commands.tex and src/ defaults.
    pub templates_dir: PathBuf,
    /// LaTeX compiler command.
    pub latex_compiler: String,
    /// Wall-clock bound per compiler pass.
    pub compile_timeout: Duration,
    /// Minimum experiences/projects a match response is padded up to.
    pub min_match_selections: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            templates_dir: std::env::var("TEMPLATES_DIR")
                .unwrap_or_else(|_| "templates".to_string())
                .into(),
            latex_compiler: std::env::var("LATEX_COMPILER")
                .unwrap_or_else(|_| "pdflatex".to_string()),
            compile_timeout: Duration::from_secs(
                std::env::var("COMPILE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse::<u64>()
                    .context("COMPILE_TIMEOUT_SECS must be an integer")?,
            ),
            min_match_selections: std::env::var("MIN_MATCH_SELECTIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse::<usize>()
                .context("MIN_MATCH_SELECTIONS must be an integer")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
