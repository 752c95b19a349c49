//! Plan execution.
//! Applies a validated [`OutputPlan`] to disk, in order, with skip-if-identical
//! and no-overwrite protection.

use log::{debug, warn};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::plan::{OutputPlan, Payload, PlannedOutput};

/// What happens, or would happen, to one planned output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Render,
    Copy,
    /// Destination already holds the exact bytes.
    SkipIdentical,
    /// Destination exists and the entry is marked no-overwrite.
    SkipNoOverwrite,
}

impl Action {
    /// Label used when reporting a plan that has not run.
    pub fn planned_label(self) -> &'static str {
        match self {
            Action::Render => "render",
            Action::Copy => "copy",
            Action::SkipIdentical => "skip (identical)",
            Action::SkipNoOverwrite => "skip (exists, no-overwrite)",
        }
    }

    /// Label used after execution.
    pub fn done_label(self) -> &'static str {
        match self {
            Action::Render => "rendered",
            Action::Copy => "copied",
            Action::SkipIdentical => "skipped (identical)",
            Action::SkipNoOverwrite => "skipped (exists, no-overwrite)",
        }
    }
}

/// Outcome of [`execute`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecuteResult {
    /// Every output in plan order with what was done to it.
    pub actions: Vec<(PathBuf, Action)>,
    /// Outputs left alone because they existed and were marked no-overwrite.
    pub skipped: HashSet<PathBuf>,
    /// Outputs left alone because their content was already identical.
    pub unchanged: HashSet<PathBuf>,
}

impl ExecuteResult {
    fn record(&mut self, path: &Path, action: Action) {
        match action {
            Action::SkipNoOverwrite => {
                self.skipped.insert(path.to_path_buf());
            }
            Action::SkipIdentical => {
                self.unchanged.insert(path.to_path_buf());
            }
            Action::Render | Action::Copy => {}
        }
        self.actions.push((path.to_path_buf(), action));
    }
}

fn payload_bytes(output: &PlannedOutput) -> Result<Cow<'_, [u8]>> {
    match &output.payload {
        Payload::Content(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
        Payload::CopyFrom(source) => {
            fs::read(source).map(Cow::Owned).map_err(|e| Error::file(source, e))
        }
    }
}

/// Decides what executing `output` would do given the current disk state.
///
/// Fails with an output conflict when the destination holds different
/// content and `force` is not set.
pub fn classify(output: &PlannedOutput, force: bool) -> Result<Action> {
    classify_loading(output, force).map(|(action, _)| action)
}

/// Like [`classify`], also handing back the payload when it had to be read
/// for the comparison. Payloads are only read when a destination exists.
fn classify_loading(output: &PlannedOutput, force: bool) -> Result<(Action, Option<Cow<'_, [u8]>>)> {
    let write = if output.is_copy() { Action::Copy } else { Action::Render };
    let path = &output.output_path;

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok((write, None)),
        Err(e) => return Err(Error::file(path, e)),
    };

    if !output.overwrite {
        return Ok((Action::SkipNoOverwrite, None));
    }
    if !metadata.is_file() {
        return Err(Error::NotAFileError { path: path.clone() });
    }

    let existing = fs::read(path).map_err(|e| Error::file(path, e))?;
    let bytes = payload_bytes(output)?;
    if existing.as_slice() == bytes.as_ref() {
        return Ok((Action::SkipIdentical, Some(bytes)));
    }
    if !force {
        return Err(Error::OutputConflictError { path: path.clone() });
    }
    Ok((write, Some(bytes)))
}

fn write_file(path: &Path, content: &[u8], permissions: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::file(parent, e))?;
    }
    fs::write(path, content).map_err(|e| Error::file(path, e))?;
    set_permissions(path, permissions)
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| Error::file(path, e))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Applies `plan` sequentially. Earlier writes are not rolled back if a later
/// entry fails.
pub fn execute(plan: &OutputPlan, force: bool) -> Result<ExecuteResult> {
    let mut result = ExecuteResult::default();

    for dir in &plan.directories {
        fs::create_dir_all(&dir.output_path).map_err(|e| Error::file(&dir.output_path, e))?;
    }

    for output in &plan.outputs {
        let path = &output.output_path;
        let (action, loaded) = classify_loading(output, force)?;
        match action {
            Action::Render | Action::Copy => {
                let bytes = match loaded {
                    Some(bytes) => bytes,
                    None => payload_bytes(output)?,
                };
                debug!("{} {}", action.done_label(), path.display());
                write_file(path, &bytes, output.permissions)?;
            }
            Action::SkipIdentical => debug!("Unchanged {}", path.display()),
            Action::SkipNoOverwrite => {
                warn!("Skipping existing no-overwrite file {}", path.display());
            }
        }
        result.record(path, action);
    }

    Ok(result)
}
