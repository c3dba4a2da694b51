//! MAFE CLI support
//!
//! Directory loading, configuration, report rendering, and write-back for
//! the `mafe` binary.

use anyhow::{bail, Context, Result};
use mafe_core::{
    Coordinator, EngineConfig, LanguageCapability, OutcomeStatus, Report, ResolvedSet,
    TargetDisambiguator,
};
use mafe_llm::GeminiConfig;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Contents of the `--config` file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Engine settings, at the top level of the file
    #[serde(flatten)]
    pub engine: EngineConfig,
    /// `[llm]` table
    pub llm: GeminiConfig,
}

impl CliConfig {
    /// Parse from TOML text and validate
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("parsing config")?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Load from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// A text file read from the working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    /// File name, used as id and display name
    pub name: String,
    /// Full path
    pub path: PathBuf,
    /// UTF-8 content
    pub content: String,
}

/// Read the regular UTF-8 files directly inside `dir`, sorted by name
///
/// Hidden files and files that are not valid UTF-8 are skipped. More than
/// `max_files` eligible files is an error rather than a silent truncation.
pub fn load_dir(dir: &Path, max_files: usize) -> Result<Vec<LoadedFile>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!(path = %entry.path().display(), "skipping file with non-UTF-8 name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        paths.push((name, entry.path()));
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for (name, path) in paths {
        let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        match String::from_utf8(bytes) {
            Ok(content) => files.push(LoadedFile { name, path, content }),
            Err(_) => tracing::warn!(file = %name, "skipping binary file"),
        }
    }

    if files.len() > max_files {
        bail!(
            "{} holds {} text files; at most {max_files} can be edited at once",
            dir.display(),
            files.len()
        );
    }
    Ok(files)
}

/// Coordinator with `files` registered
pub fn build_coordinator(
    config: &EngineConfig,
    files: &[LoadedFile],
    capability: Arc<dyn LanguageCapability>,
    disambiguator: Option<Arc<dyn TargetDisambiguator>>,
) -> Result<Coordinator> {
    let mut coordinator = Coordinator::new(config.clone(), capability);
    if let Some(disambiguator) = disambiguator {
        coordinator = coordinator.with_disambiguator(disambiguator);
    }
    for file in files {
        coordinator
            .register_file(file.name.as_str(), file.name.as_str(), file.content.as_str())
            .with_context(|| format!("registering {}", file.name))?;
    }
    Ok(coordinator)
}

/// Human-readable report
#[must_use]
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "instruction: {}", report.instruction.raw_text);

    if let Some(error) = &report.resolution_error {
        let _ = writeln!(out, "resolution failed: {error}");
        return out;
    }
    if report.broadcast {
        out.push_str("broadcast to every file\n");
    }

    let width = report
        .outcomes
        .iter()
        .map(|o| o.file_id.as_str().len())
        .max()
        .unwrap_or(0);
    for outcome in &report.outcomes {
        let status = match &outcome.status {
            OutcomeStatus::Succeeded { version, .. } => format!("ok       v{version}"),
            OutcomeStatus::Skipped { reason } => format!("skipped  {reason}"),
            OutcomeStatus::Failed { error } => format!("failed   {error}"),
        };
        let _ = writeln!(
            out,
            "  {:<width$}  {status}  ({} ms)",
            outcome.file_id.as_str(),
            outcome.duration.as_millis()
        );
    }
    let _ = writeln!(
        out,
        "{} succeeded, {} failed, {} skipped",
        report.succeeded(),
        report.failed(),
        report.skipped()
    );
    out
}

/// Human-readable resolution
#[must_use]
pub fn render_resolution(resolved: &ResolvedSet) -> String {
    let mut out = format!("{} target(s) via {:?}\n", resolved.len(), resolved.method);
    for task in &resolved.tasks {
        let _ = writeln!(out, "  {}: {}", task.file_id, task.directive);
    }
    out
}

/// Write every succeeded outcome back into `dir`; returns files written
pub fn write_back(dir: &Path, report: &Report) -> Result<usize> {
    let mut written = 0;
    for outcome in &report.outcomes {
        let Some(content) = outcome.new_content() else {
            continue;
        };
        let path = dir.join(outcome.file_id.as_str());
        std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(file = %outcome.file_id, "wrote file");
        written += 1;
    }
    Ok(written)
}

/// Install the global subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing(json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
