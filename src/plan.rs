//! In-memory output plans.
//! A plan lists every prospective write for one rendering unit and is
//! validated as a whole before anything touches the filesystem.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// What a planned output writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Rendered template text.
    Content(Vec<u8>),
    /// Verbatim copy of an absolute source path.
    CopyFrom(PathBuf),
}

/// One prospective file write or copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOutput {
    /// Path relative to the template source, or a synthetic label such as
    /// `[2]` for each-file items.
    pub source_path: String,
    /// Absolute destination.
    pub output_path: PathBuf,
    pub payload: Payload,
    /// Mode bits applied after writing.
    pub permissions: u32,
    /// Whether an existing destination may be replaced.
    pub overwrite: bool,
}

impl PlannedOutput {
    pub fn is_copy(&self) -> bool {
        matches!(self.payload, Payload::CopyFrom(_))
    }
}

/// A directory from the template tree, created at execute time so that
/// empty source directories survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDirectory {
    pub source_path: String,
    pub output_path: PathBuf,
}

/// Ordered planned writes for a single file, directory tree or item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPlan {
    pub outputs: Vec<PlannedOutput>,
    pub directories: Vec<PlannedDirectory>,
}

impl OutputPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, output: PlannedOutput) {
        self.outputs.push(output);
    }

    pub fn push_directory(&mut self, source_path: String, output_path: PathBuf) {
        self.directories.push(PlannedDirectory { source_path, output_path });
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Returns every problem found in the plan; an empty list means valid.
    pub fn validate(&self) -> Vec<Error> {
        let mut index = CollisionIndex::default();
        for output in &self.outputs {
            index.add_file(&output.output_path, &output.source_path);
        }
        for dir in &self.directories {
            index.add_directory(&dir.output_path, &dir.source_path);
        }
        index.finish()
    }

    /// Human readable listing of the plan.
    pub fn preview(&self) -> String {
        let mut out = String::new();
        for dir in &self.directories {
            let _ = writeln!(out, "  [mkdir] {}", dir.output_path.display());
        }
        for output in &self.outputs {
            let action = if output.is_copy() { "copy" } else { "render" };
            let _ = write!(out, "  [{action}] {}", output.output_path.display());
            if !output.source_path.is_empty() {
                let _ = write!(out, " (from {})", output.source_path);
            }
            if !output.overwrite {
                out.push_str(" [no-overwrite]");
            }
            out.push('\n');
        }
        out
    }
}

/// Validates several plans that will be executed together, such as the
/// per-item plans of each-directory mode. Source paths in errors are
/// prefixed with the item index.
pub fn validate_all(plans: &[OutputPlan]) -> Vec<Error> {
    if let [plan] = plans {
        return plan.validate();
    }

    let mut index = CollisionIndex::default();
    for (i, plan) in plans.iter().enumerate() {
        for output in &plan.outputs {
            index.add_file(&output.output_path, &format!("[{i}] {}", output.source_path));
        }
        for dir in &plan.directories {
            index.add_directory(&dir.output_path, &format!("[{i}] {}", dir.source_path));
        }
    }
    index.finish()
}

/// Tracks destinations claimed so far and records every clash.
#[derive(Default)]
struct CollisionIndex {
    files: HashMap<PathBuf, String>,
    directories: Vec<(PathBuf, String)>,
    errors: Vec<Error>,
}

impl CollisionIndex {
    fn add_file(&mut self, path: &Path, source: &str) {
        match self.files.get(path) {
            Some(first) => self.errors.push(collision(path, first, source)),
            None => {
                self.files.insert(path.to_path_buf(), source.to_string());
            }
        }
    }

    fn add_directory(&mut self, path: &Path, source: &str) {
        self.directories.push((path.to_path_buf(), source.to_string()));
    }

    fn finish(mut self) -> Vec<Error> {
        // A file cannot also be a directory: either a planned directory or
        // the parent of another planned file.
        for (dir, source) in &self.directories {
            if let Some(file_source) = self.files.get(dir) {
                self.errors.push(collision(dir, file_source, source));
            }
        }
        let mut nested = Vec::new();
        for (path, source) in &self.files {
            for ancestor in path.ancestors().skip(1) {
                if let Some(parent_source) = self.files.get(ancestor) {
                    nested.push(collision(ancestor, parent_source, source));
                }
            }
        }
        nested.sort_by_key(|e| e.to_string());
        self.errors.extend(nested);
        self.errors
    }
}

fn collision(path: &Path, first: &str, second: &str) -> Error {
    Error::CollisionError {
        output_path: path.to_path_buf(),
        first: first.to_string(),
        second: second.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(source: &str, output: &str) -> PlannedOutput {
        PlannedOutput {
            source_path: source.to_string(),
            output_path: PathBuf::from(output),
            payload: Payload::Content(b"x".to_vec()),
            permissions: 0o644,
            overwrite: true,
        }
    }

    #[test]
    fn test_valid_plan() {
        let mut plan = OutputPlan::new();
        plan.push(rendered("a.tmpl", "/out/a"));
        plan.push(rendered("b.tmpl", "/out/b"));
        plan.push_directory("src".into(), "/out/src".into());
        assert!(plan.validate().is_empty());
    }

    #[test]
    fn test_reports_every_collision() {
        let mut plan = OutputPlan::new();
        plan.push(rendered("a.tmpl", "/out/x"));
        plan.push(rendered("b.tmpl", "/out/x"));
        plan.push(rendered("c.tmpl", "/out/y"));
        plan.push(rendered("d.tmpl", "/out/y"));

        let errors = plan.validate();
        assert_eq!(errors.len(), 2);
        let message = errors[0].to_string();
        assert!(message.contains("a.tmpl"));
        assert!(message.contains("b.tmpl"));
        assert!(errors[1].to_string().contains("d.tmpl"));
    }

    #[test]
    fn test_file_over_directory_collides() {
        let mut plan = OutputPlan::new();
        plan.push(rendered("a.txt", "/out/lib"));
        plan.push_directory("src".into(), "/out/lib".into());
        plan.push(rendered("src/b.txt", "/out/lib/b.txt"));

        let errors = plan.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, Error::CollisionError { .. })));
    }

    #[test]
    fn test_validate_all_labels_items() {
        let mut first = OutputPlan::new();
        first.push(rendered("README.md", "/out/README.md"));
        let mut second = OutputPlan::new();
        second.push(rendered("README.md", "/out/README.md"));

        let errors = validate_all(&[first, second]);
        assert_eq!(errors.len(), 1);
        let message = errors[0].to_string();
        assert!(message.contains("[0] README.md"));
        assert!(message.contains("[1] README.md"));
    }

    #[test]
    fn test_shared_directories_are_not_collisions() {
        let mut first = OutputPlan::new();
        first.push_directory("src".into(), "/out/src".into());
        let mut second = OutputPlan::new();
        second.push_directory("src".into(), "/out/src".into());
        assert!(validate_all(&[first, second]).is_empty());
    }

    #[test]
    fn test_preview() {
        let mut plan = OutputPlan::new();
        plan.push(rendered("a.tmpl", "/out/a"));
        plan.push(PlannedOutput {
            source_path: "logo.png".into(),
            output_path: "/out/logo.png".into(),
            payload: Payload::CopyFrom("/tpl/logo.png".into()),
            permissions: 0o644,
            overwrite: false,
        });
        let preview = plan.preview();
        assert!(preview.contains("[render] /out/a (from a.tmpl)"));
        assert!(preview.contains("[copy] /out/logo.png (from logo.png) [no-overwrite]"));
    }
}
