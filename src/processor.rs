//! Plan collection.
//! Turns a template file or directory tree into an [`OutputPlan`] without
//! writing anything to disk.

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{is_config_file, ParsedPathConfig};
use crate::constants::{RENDERED_FILE_MODE, TEMPLATE_SUFFIX};
use crate::error::{Error, Result};
use crate::mapper::PathMapper;
use crate::plan::{OutputPlan, Payload, PlannedOutput};
use crate::renderer::TemplateRenderer;
use crate::safety::{ensure_no_traversal, has_traversal, is_within, normalize};

fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::file(path, e))
}

/// A template file is any file whose name carries the template suffix after
/// a non-empty stem.
pub fn is_template_path(filename: &str) -> bool {
    filename.len() > TEMPLATE_SUFFIX.len() && filename.ends_with(TEMPLATE_SUFFIX)
}

/// Strips the template suffix from the final component of `path`, if present.
pub fn strip_template_suffix(path: &Path) -> PathBuf {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) if is_template_path(name) => {
            path.with_file_name(&name[..name.len() - TEMPLATE_SUFFIX.len()])
        }
        _ => path.to_path_buf(),
    }
}

/// Joins a mapped relative path onto the output root the way a plain path
/// join would if leading separators were ignored.
fn resolve_target_path(output_dir: &Path, mapped: &str) -> PathBuf {
    normalize(&output_dir.join(mapped.trim_start_matches(['/', '\\'])))
}

#[cfg(unix)]
fn source_permissions(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn source_permissions(_metadata: &fs::Metadata) -> u32 {
    RENDERED_FILE_MODE
}

/// Walks `template_dir` and plans every output under `output_dir`.
///
/// Both directories are expected to be absolute. The walk is pre-order and
/// sorted by file name so plans are deterministic. Any render failure aborts
/// the whole collection.
pub fn collect(
    template_dir: &Path,
    output_dir: &Path,
    data: &serde_json::Value,
    renderer: &dyn TemplateRenderer,
    config: Option<&ParsedPathConfig>,
) -> Result<OutputPlan> {
    debug!("Collecting outputs from '{}'", template_dir.display());
    let mapper = PathMapper::new(config);
    let output_dir = normalize(output_dir);
    let mut plan = OutputPlan::new();

    for entry in WalkDir::new(template_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::IoError(e.into()))?;
        let path = entry.path();
        let relative_path = path
            .strip_prefix(template_dir)
            .map_err(|e| Error::TemplateError(e.to_string()))?
            .to_str()
            .ok_or_else(|| {
                Error::TemplateError(format!("non UTF-8 path in template: '{}'", path.display()))
            })?
            .replace('\\', "/");

        if entry.depth() == 1 && is_config_file(&relative_path) {
            debug!("Skipping control file {}", relative_path);
            continue;
        }
        if entry.path_is_symlink() {
            return Err(Error::SafetyError(format!(
                "template source contains symlink: '{}'",
                path.display()
            )));
        }
        if has_traversal(&relative_path) {
            return Err(Error::SafetyError(format!(
                "source path contains directory traversal: '{relative_path}'"
            )));
        }

        let mapped = mapper.transform(&relative_path, data)?;
        ensure_no_traversal(&mapped, "output path")?;
        let target_path = resolve_target_path(&output_dir, &mapped);
        if !is_within(&target_path, &output_dir) {
            return Err(Error::SafetyError(format!(
                "output path escapes output directory: '{}'",
                target_path.display()
            )));
        }

        if entry.file_type().is_dir() {
            debug!("Planning directory {} -> {}", relative_path, target_path.display());
            plan.push_directory(relative_path, target_path);
            continue;
        }
        if target_path == output_dir {
            return Err(Error::TemplateError(format!(
                "'{relative_path}' maps onto the output directory itself"
            )));
        }

        let overwrite = mapper.can_overwrite(&relative_path);
        let is_template = entry
            .file_name()
            .to_str()
            .is_some_and(is_template_path);

        let output = if is_template {
            let content = read_template(path)?;
            let rendered = renderer.render(&relative_path, &content, data)?;
            let output_path = strip_template_suffix(&target_path);
            debug!("Planning render {} -> {}", relative_path, output_path.display());
            PlannedOutput {
                source_path: relative_path,
                output_path,
                payload: Payload::Content(rendered.into_bytes()),
                permissions: RENDERED_FILE_MODE,
                overwrite,
            }
        } else {
            let metadata = entry.metadata().map_err(|e| Error::IoError(e.into()))?;
            debug!("Planning copy {} -> {}", relative_path, target_path.display());
            PlannedOutput {
                source_path: relative_path,
                output_path: target_path,
                payload: Payload::CopyFrom(path.to_path_buf()),
                permissions: source_permissions(&metadata),
                overwrite,
            }
        };
        plan.push(output);
    }

    debug!("Collected {} output(s):\n{}", plan.len(), plan.preview());
    Ok(plan)
}

/// Plans a single rendered file at `output_path`.
pub fn collect_file(
    template_path: &Path,
    output_path: &Path,
    data: &serde_json::Value,
    renderer: &dyn TemplateRenderer,
) -> Result<OutputPlan> {
    let content = read_template(template_path)?;
    let name = template_name(template_path);
    let rendered = renderer.render(&name, &content, data)?;

    let mut plan = OutputPlan::new();
    plan.push(PlannedOutput {
        source_path: name,
        output_path: normalize(output_path),
        payload: Payload::Content(rendered.into_bytes()),
        permissions: RENDERED_FILE_MODE,
        overwrite: true,
    });
    Ok(plan)
}

/// Plans one rendered file per item. `output_pattern` is rendered against
/// each item to give its destination; `resolve` turns that into an absolute
/// path.
///
/// Items sharing a destination are left in the plan and reported by
/// validation.
pub fn collect_each_file<F>(
    template_path: &Path,
    output_pattern: &str,
    items: &[serde_json::Value],
    renderer: &dyn TemplateRenderer,
    resolve: F,
) -> Result<OutputPlan>
where
    F: Fn(&str) -> Result<PathBuf>,
{
    let content = read_template(template_path)?;
    let name = template_name(template_path);
    let mut plan = OutputPlan::new();

    for (i, item) in items.iter().enumerate() {
        let rendered_path = render_output_path(renderer, output_pattern, item)?;
        let output_path = resolve(&rendered_path)?;
        let rendered = renderer.render(&name, &content, item)?;
        debug!("Planning item [{}] -> {}", i, output_path.display());
        plan.push(PlannedOutput {
            source_path: format!("[{i}]"),
            output_path,
            payload: Payload::Content(rendered.into_bytes()),
            permissions: RENDERED_FILE_MODE,
            overwrite: true,
        });
    }
    Ok(plan)
}

/// Renders a per-item output path pattern, trims it and rejects empty or
/// traversing results.
pub fn render_output_path(
    renderer: &dyn TemplateRenderer,
    pattern: &str,
    item: &serde_json::Value,
) -> Result<String> {
    let rendered = renderer.render("output path", pattern, item)?;
    let rendered = rendered.trim();
    if rendered.is_empty() {
        return Err(Error::TemplateError(format!(
            "output path '{pattern}' rendered to an empty string"
        )));
    }
    ensure_no_traversal(rendered, "output path")?;
    Ok(rendered.to_string())
}

fn template_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("template")
        .to_string()
}
