//! Build/compile pipeline.
//!
//! Per request: stage a scratch directory with the skeleton, overlay
//! the generated fragments, run the LaTeX compiler twice (the second
//! pass resolves cross-references), then pull out the PDF bytes or a
//! diagnosable error. The scratch directory is a `TempDir`, so cleanup
//! runs on every exit path, timeouts included.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::latex::fragments::{experience_tex, heading_tex, projects_tex, skills_tex};
use crate::models::compose::ComposedDocument;

const ARTIFACT_FILE: &str = "resume.pdf";
const LOG_FILE: &str = "resume.log";
const INPUT_FILE: &str = "resume.tex";
/// Lines surfaced from the compiler log on failure.
const MAX_LOG_ERRORS: usize = 5;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("compiler did not finish within the timeout")]
    Timeout,

    #[error("{detail}")]
    Failed { detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Skeleton directory copied verbatim into every scratch dir.
    pub templates_dir: PathBuf,
    /// Compiler command, `pdflatex` in production.
    pub compiler: String,
    /// Wall-clock bound per compiler pass.
    pub timeout: Duration,
    /// Parent for scratch directories; system temp when unset.
    pub build_root: Option<PathBuf>,
}

/// Renders a composed document to PDF bytes. All-or-nothing: no
/// partial output, and the scratch directory never outlives the call.
pub async fn render_pdf(
    settings: &RenderSettings,
    doc: &ComposedDocument,
) -> Result<Bytes, RenderError> {
    let scratch = stage(settings)?;
    let build_dir = scratch.path();

    write_fragments(doc, &build_dir.join("src"))?;
    compile(settings, build_dir).await?;

    let artifact = build_dir.join(ARTIFACT_FILE);
    if !artifact.exists() {
        return Err(RenderError::Failed {
            detail: read_compile_diagnostics(build_dir),
        });
    }

    let bytes = std::fs::read(&artifact)?;
    info!("Compiled {} bytes of PDF output", bytes.len());
    Ok(Bytes::from(bytes))
}

/// Stage: scratch dir seeded with a verbatim copy of the skeleton.
fn stage(settings: &RenderSettings) -> Result<TempDir, RenderError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("resume_build_");
    let scratch = match &settings.build_root {
        Some(root) => builder.tempdir_in(root)?,
        None => builder.tempdir()?,
    };
    copy_dir(&settings.templates_dir, scratch.path())?;
    std::fs::create_dir_all(scratch.path().join("src"))?;
    debug!("Staged build directory {}", scratch.path().display());
    Ok(scratch)
}

fn copy_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

/// Writes each non-empty fragment over the skeleton's default file.
/// Categories with no resolved content leave the default untouched.
fn write_fragments(doc: &ComposedDocument, src_dir: &Path) -> std::io::Result<()> {
    if !doc.experiences.is_empty() {
        std::fs::write(
            src_dir.join("experience.tex"),
            experience_tex(&doc.experiences),
        )?;
    }
    if !doc.projects.is_empty() {
        std::fs::write(src_dir.join("projects.tex"), projects_tex(&doc.projects))?;
    }
    if let Some(skills) = &doc.skills {
        std::fs::write(src_dir.join("skills.tex"), skills_tex(skills, None))?;
    }
    if doc.heading.is_some() || doc.location.is_some() || doc.email.is_some() {
        std::fs::write(
            src_dir.join("heading.tex"),
            heading_tex(
                doc.heading.as_ref(),
                doc.location.as_deref(),
                doc.email.as_deref(),
            ),
        )?;
    }
    Ok(())
}

/// Runs the compiler exactly twice, each pass bounded by the timeout.
/// Exit codes are ignored: some LaTeX engines exit non-zero on benign
/// warnings, so success is judged by the artifact's existence.
async fn compile(settings: &RenderSettings, build_dir: &Path) -> Result<(), RenderError> {
    for pass in 1..=2 {
        let mut command = Command::new(&settings.compiler);
        command
            .arg("-interaction=nonstopmode")
            .arg("-output-directory")
            .arg(build_dir)
            .arg(build_dir.join(INPUT_FILE))
            .current_dir(build_dir)
            .kill_on_drop(true);

        debug!("Compiler pass {pass} starting");
        match tokio::time::timeout(settings.timeout, command.output()).await {
            Ok(output) => {
                let output = output?;
                debug!("Compiler pass {pass} exited with {}", output.status);
            }
            Err(_) => return Err(RenderError::Timeout),
        }
    }
    Ok(())
}

/// Best-effort diagnostics: the first few `!`-prefixed lines from the
/// compiler log, or a generic message when no log exists.
fn read_compile_diagnostics(build_dir: &Path) -> String {
    match std::fs::read_to_string(build_dir.join(LOG_FILE)) {
        Ok(log) => {
            let errors = scrape_log_errors(&log);
            if errors.is_empty() {
                "PDF compilation failed".to_string()
            } else {
                errors.join("\n")
            }
        }
        Err(_) => "PDF compilation failed".to_string(),
    }
}

fn scrape_log_errors(log: &str) -> Vec<String> {
    log.lines()
        .filter(|line| line.starts_with('!'))
        .take(MAX_LOG_ERRORS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::block::ExperiencePayload;
    use std::os::unix::fs::PermissionsExt;

    /// Writes an executable shell script standing in for pdflatex.
    /// The script sees `$3` as the output directory.
    fn fake_compiler(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-latex.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn fake_skeleton(dir: &Path) -> PathBuf {
        let templates = dir.join("templates");
        std::fs::create_dir_all(templates.join("src")).unwrap();
        std::fs::write(templates.join("resume.tex"), "\\input{src/heading.tex}\n").unwrap();
        std::fs::write(templates.join("custom-commands.tex"), "% commands\n").unwrap();
        std::fs::write(templates.join("src/heading.tex"), "% default heading\n").unwrap();
        templates
    }

    fn settings(root: &Path, compiler: String, timeout_ms: u64) -> RenderSettings {
        RenderSettings {
            templates_dir: fake_skeleton(root),
            compiler,
            timeout: Duration::from_millis(timeout_ms),
            build_root: Some(root.to_path_buf()),
        }
    }

    fn doc_with_experience() -> ComposedDocument {
        ComposedDocument {
            experiences: vec![ExperiencePayload {
                title: Some("SDE".to_string()),
                bullets: vec!["Shipped things".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn scratch_dirs_left(root: &Path) -> usize {
        std::fs::read_dir(root)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("resume_build_"))
            .count()
    }

    #[tokio::test]
    async fn test_success_returns_artifact_bytes_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let compiler = fake_compiler(root.path(), r#"printf '%%PDF-1.4 fake' > "$3/resume.pdf""#);
        let settings = settings(root.path(), compiler, 5_000);

        let bytes = render_pdf(&settings, &doc_with_experience()).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(scratch_dirs_left(root.path()), 0);
    }

    #[tokio::test]
    async fn test_success_despite_nonzero_exit_code() {
        let root = tempfile::tempdir().unwrap();
        // Benign-warning behavior: artifact produced, exit 1.
        let compiler = fake_compiler(
            root.path(),
            r#"printf '%%PDF-1.4 fake' > "$3/resume.pdf"; exit 1"#,
        );
        let settings = settings(root.path(), compiler, 5_000);

        let bytes = render_pdf(&settings, &doc_with_experience()).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_failure_scrapes_log_diagnostics() {
        let root = tempfile::tempdir().unwrap();
        let compiler = fake_compiler(
            root.path(),
            r#"printf '! Undefined control sequence.\nl.10 \\nope\n' > "$3/resume.log""#,
        );
        let settings = settings(root.path(), compiler, 5_000);

        let err = render_pdf(&settings, &doc_with_experience())
            .await
            .unwrap_err();
        match err {
            RenderError::Failed { detail } => {
                assert!(detail.contains("! Undefined control sequence."));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(scratch_dirs_left(root.path()), 0);
    }

    #[tokio::test]
    async fn test_failure_without_log_is_generic() {
        let root = tempfile::tempdir().unwrap();
        let compiler = fake_compiler(root.path(), "exit 0");
        let settings = settings(root.path(), compiler, 5_000);

        let err = render_pdf(&settings, &doc_with_experience())
            .await
            .unwrap_err();
        match err {
            RenderError::Failed { detail } => assert_eq!(detail, "PDF compilation failed"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_reports_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let compiler = fake_compiler(root.path(), "sleep 10");
        let settings = settings(root.path(), compiler, 100);

        let err = render_pdf(&settings, &doc_with_experience())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Timeout));
        assert_eq!(scratch_dirs_left(root.path()), 0);
    }

    #[test]
    fn test_scrape_log_errors_caps_at_five() {
        let log = (0..8)
            .map(|i| format!("! error {i}"))
            .collect::<Vec<_>>()
            .join("\nnoise line\n");
        let errors = scrape_log_errors(&log);
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[0], "! error 0");
    }

    #[test]
    fn test_scrape_log_errors_ignores_non_error_lines() {
        let log = "This is pdfTeX\nOutput written on resume.pdf\n";
        assert!(scrape_log_errors(log).is_empty());
    }
}
