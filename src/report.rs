//! Run reports in text and JSON form.

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Error;
use crate::executor::Action;

/// One reported file and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAction {
    pub path: String,
    pub action: String,
}

impl FileAction {
    pub fn new(path: &Path, action: &str) -> Self {
        Self { path: path.display().to_string(), action: action.to_string() }
    }

    pub fn planned(path: &Path, action: Action) -> Self {
        Self::new(path, action.planned_label())
    }

    pub fn done(path: &Path, action: Action) -> Self {
        Self::new(path, action.done_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Success,
    DryRun,
    Error,
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub status: Status,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    pub fn success(files: Vec<FileAction>) -> Self {
        Self { status: Status::Success, files, error: None }
    }

    pub fn dry_run(files: Vec<FileAction>) -> Self {
        Self { status: Status::DryRun, files, error: None }
    }

    /// Error report. Nested validation errors are joined so the JSON
    /// document carries every problem.
    pub fn failure(err: &Error) -> Self {
        let message = match err {
            Error::PlanValidationError(errors) => {
                let mut lines = vec![err.to_string()];
                lines.extend(errors.iter().map(|e| e.to_string()));
                lines.join("\n")
            }
            other => other.to_string(),
        };
        Self { status: Status::Error, files: Vec::new(), error: Some(message) }
    }

    /// Writes the report as pretty JSON or line-oriented text.
    pub fn write_to<W: Write>(&self, out: &mut W, json: bool) -> io::Result<()> {
        if json {
            serde_json::to_writer_pretty(&mut *out, self)?;
            return writeln!(out);
        }
        match self.status {
            Status::DryRun => {
                writeln!(out, "Dry run - would perform:")?;
                for file in &self.files {
                    writeln!(out, "  [{}] {}", file.action, file.path)?;
                }
            }
            Status::Success => {
                for file in &self.files {
                    writeln!(out, "{}: {}", capitalize_first(&file.action), file.path)?;
                }
            }
            Status::Error => {
                if let Some(error) = &self.error {
                    writeln!(out, "{error}")?;
                }
            }
        }
        Ok(())
    }

    /// Prints the report to stdout.
    pub fn print(&self, json: bool) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.write_to(&mut lock, json)
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
