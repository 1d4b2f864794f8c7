//! Caller-facing side effects of a run.
//!
//! The orchestrator never prints or writes outputs directly. It talks to a
//! [`Reporter`]:
//! - `ActionsReporter` speaks the GitHub Actions runner protocol
//!   (stdout notices, `$GITHUB_OUTPUT`, `::error::` workflow command)
//! - `MemoryReporter` records everything for assertions in tests

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;
use uuid::Uuid;

/// Name of the output carrying the queued build's id.
pub const BUILD_ID_OUTPUT: &str = "build_id";

/// Progress, result and failure sink for a run.
pub trait Reporter: Send + Sync {
    /// Informational progress notice.
    fn notify(&self, message: &str);

    /// Publish a named result value.
    fn publish(&self, name: &str, value: &str);

    /// Report the run's terminal failure.
    fn fail(&self, message: &str);
}

// ---------------------------------------------------------------------------
// ActionsReporter
// ---------------------------------------------------------------------------

/// Reporter for GitHub Actions steps.
#[derive(Debug, Clone, Default)]
pub struct ActionsReporter {
    output_path: Option<PathBuf>,
}

impl ActionsReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    /// Use the output file the runner names in `GITHUB_OUTPUT`, if any.
    pub fn from_env() -> Self {
        let output_path = std::env::var_os("GITHUB_OUTPUT")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Self::new(output_path)
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }
}

impl Reporter for ActionsReporter {
    fn notify(&self, message: &str) {
        write_stdout(message);
    }

    fn publish(&self, name: &str, value: &str) {
        if let Some(path) = &self.output_path {
            match append_output(path, name, value) {
                Ok(()) => return,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to write step output file");
                }
            }
        }
        write_stdout(&format!("::set-output name={}::{}", name, escape_data(value)));
    }

    fn fail(&self, message: &str) {
        write_stdout(&format!("::error::{}", escape_data(message)));
    }
}

/// Write one line to stdout. A closed stdout is logged, not fatal.
fn write_stdout(line: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{line}").and_then(|()| stdout.flush()) {
        warn!(error = %e, "Failed to write to stdout");
    }
}

/// Append `name=value` to a runner output file.
///
/// Values spanning several lines use the `name<<delimiter` form.
pub fn append_output(path: &Path, name: &str, value: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if value.contains('\n') || value.contains('\r') {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        writeln!(file, "{name}<<{delimiter}")?;
        writeln!(file, "{value}")?;
        writeln!(file, "{delimiter}")?;
    } else {
        writeln!(file, "{name}={value}")?;
    }
    Ok(())
}

/// Escape a workflow-command payload.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

// ---------------------------------------------------------------------------
// MemoryReporter
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ReportLog {
    notices: Vec<String>,
    outputs: Vec<(String, String)>,
    failures: Vec<String>,
}

/// In-memory reporter (testing only).
#[derive(Debug, Default)]
pub struct MemoryReporter {
    log: Mutex<ReportLog>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<String> {
        self.log().notices.clone()
    }

    pub fn outputs(&self) -> Vec<(String, String)> {
        self.log().outputs.clone()
    }

    /// Last value published under `name`.
    pub fn output(&self, name: &str) -> Option<String> {
        self.log()
            .outputs
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn failures(&self) -> Vec<String> {
        self.log().failures.clone()
    }

    fn log(&self) -> MutexGuard<'_, ReportLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Reporter for MemoryReporter {
    fn notify(&self, message: &str) {
        self.log().notices.push(message.to_string());
    }

    fn publish(&self, name: &str, value: &str) {
        self.log()
            .outputs
            .push((name.to_string(), value.to_string()));
    }

    fn fail(&self, message: &str) {
        self.log().failures.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("plain"), "plain");
        assert_eq!(escape_data("100%"), "100%25");
        assert_eq!(escape_data("a\r\nb"), "a%0D%0Ab");
    }

    #[test]
    fn test_append_output_single_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "previous=1\n").unwrap();

        append_output(&path, BUILD_ID_OUTPUT, "42").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "previous=1\nbuild_id=42\n");
    }

    #[test]
    fn test_append_output_multi_line_uses_delimiter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output");

        append_output(&path, "notes", "line one\nline two").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        let delimiter = lines[0].strip_prefix("notes<<").expect("heredoc header");
        assert_eq!(lines[1], "line one");
        assert_eq!(lines[2], "line two");
        assert_eq!(lines[3], delimiter);
    }

    #[test]
    fn test_actions_reporter_publishes_to_output_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output");
        let reporter = ActionsReporter::new(Some(path.clone()));

        reporter.publish(BUILD_ID_OUTPUT, "b123");

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "build_id=b123\n");
    }

    #[test]
    fn test_actions_reporter_falls_back_to_stdout_command() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened for appending
        let reporter = ActionsReporter::new(Some(dir.path().to_path_buf()));

        reporter.notify("🔄 Step 1: Check if there is a build in progress");
        reporter.publish(BUILD_ID_OUTPUT, "b123");
        reporter.fail("❌ boom\nsecond line");

        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_memory_reporter_records_everything() {
        let reporter = MemoryReporter::new();
        reporter.notify("step");
        reporter.publish(BUILD_ID_OUTPUT, "1");
        reporter.publish(BUILD_ID_OUTPUT, "2");
        reporter.fail("boom");

        assert_eq!(reporter.notices(), vec!["step".to_string()]);
        assert_eq!(reporter.outputs().len(), 2);
        assert_eq!(reporter.output(BUILD_ID_OUTPUT).as_deref(), Some("2"));
        assert_eq!(reporter.failures(), vec!["boom".to_string()]);
    }
}
