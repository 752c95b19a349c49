//! Control file handling for render template directories.
//! Loads `.render.yaml`, `.render.yml` or `render.json`, validates every
//! path rule against the template tree and compiles the rule templates.

use indexmap::IndexMap;
use log::debug;
use minijinja::Environment;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::constants::CONFIG_FILES;
use crate::error::{Error, Result};
use crate::renderer::{new_environment, template_context};
use crate::safety::has_traversal;

/// The only top-level key a control file may contain.
const PATHS_KEY: &str = "paths";

/// A single path rule: either a bare output template or an object form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PathMapping {
    Template(String),
    Detailed {
        path: String,
        #[serde(default)]
        overwrite: Option<bool>,
    },
}

impl PathMapping {
    pub fn template(&self) -> &str {
        match self {
            PathMapping::Template(path) | PathMapping::Detailed { path, .. } => path,
        }
    }

    /// Whether rendered output may replace an existing file (default true).
    pub fn overwrite(&self) -> bool {
        match self {
            PathMapping::Template(_) => true,
            PathMapping::Detailed { overwrite, .. } => overwrite.unwrap_or(true),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub paths: IndexMap<String, PathMapping>,
}

/// Validated, pre-compiled control file.
///
/// Every rule template is compiled into the config's own environment under
/// its source path, so rules are parsed once and never share a lifecycle
/// with body templates.
#[derive(Debug)]
pub struct ParsedPathConfig {
    env: Environment<'static>,
    file_templates: HashSet<String>,
    dir_mappings: Vec<String>,
    no_overwrite: HashSet<String>,
}

impl ParsedPathConfig {
    fn empty() -> Self {
        Self {
            env: new_environment(),
            file_templates: HashSet::new(),
            dir_mappings: Vec::new(),
            no_overwrite: HashSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.file_templates.is_empty() && self.dir_mappings.is_empty()
    }

    /// Returns true if `source` has an exact file rule.
    pub fn has_file_rule(&self, source: &str) -> bool {
        self.file_templates.contains(source)
    }

    /// Directory rule prefixes, longest first.
    pub fn dir_prefixes(&self) -> &[String] {
        &self.dir_mappings
    }

    /// Whether output produced from `source` may overwrite an existing file.
    pub fn can_overwrite(&self, source: &str) -> bool {
        !self.no_overwrite.contains(source)
    }

    /// Renders the rule template registered for `source`.
    pub fn render_rule(&self, source: &str, data: &serde_json::Value) -> Result<String> {
        let render_error = |e| Error::RenderError {
            template: format!("path rule '{source}'"),
            source: e,
        };
        self.env
            .get_template(source)
            .map_err(render_error)?
            .render(template_context(data))
            .map_err(render_error)
    }
}

/// Finds and loads the control file in `template_dir`.
///
/// Returns `Ok(None)` when no control file exists.
pub fn load<P: AsRef<Path>>(template_dir: P) -> Result<Option<ParsedPathConfig>> {
    let template_dir = template_dir.as_ref();
    for file in CONFIG_FILES {
        let config_path = template_dir.join(file);
        if config_path.is_file() {
            debug!("Loading control file from {}", config_path.display());
            return load_file(&config_path, template_dir).map(Some);
        }
    }
    debug!("No control file found (tried: {})", CONFIG_FILES.join(", "));
    Ok(None)
}

/// Loads an explicit control file, validating it against `template_dir`.
pub fn load_file<P: AsRef<Path>, T: AsRef<Path>>(
    config_path: P,
    template_dir: T,
) -> Result<ParsedPathConfig> {
    let config_path = config_path.as_ref();
    let content = fs::read(config_path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::ConfigError(format!(
            "control file does not exist: '{}'",
            config_path.display()
        )),
        _ => Error::file(config_path, e),
    })?;
    let filename = config_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config_path.display().to_string());
    parse(&content, template_dir, &filename)
}

/// Parses control file content and validates it against `template_dir`.
///
/// # Errors
/// * `Error::ConfigError` for malformed content, unknown keys, missing
///   sources and invalid templates
/// * `Error::SafetyError` for absolute or traversing source keys
pub fn parse<P: AsRef<Path>>(content: &[u8], template_dir: P, filename: &str) -> Result<ParsedPathConfig> {
    let template_dir = template_dir.as_ref();
    let config_error = |msg: String| Error::ConfigError(format!("{filename}: {msg}"));

    let raw: Option<IndexMap<String, serde_yaml::Value>> = if filename.ends_with(".json") {
        serde_json::from_slice(content).map_err(|e| config_error(format!("invalid JSON: {e}")))?
    } else {
        serde_yaml::from_slice(content).map_err(|e| config_error(format!("invalid YAML: {e}")))?
    };
    let raw = raw.unwrap_or_default();

    if let Some(key) = raw.keys().find(|k| k.as_str() != PATHS_KEY) {
        return Err(config_error(format!("unknown key '{key}' (only '{PATHS_KEY}' allowed)")));
    }

    let config: RawConfig = match raw.into_iter().next() {
        Some((_, paths)) if !paths.is_null() => {
            let paths = serde_yaml::from_value(paths).map_err(|e| {
                config_error(format!(
                    "invalid path mapping (expected a string or an object with 'path'): {e}"
                ))
            })?;
            RawConfig { paths }
        }
        _ => RawConfig::default(),
    };

    let mut parsed = ParsedPathConfig::empty();
    for (source, mapping) in config.paths {
        validate_source_path(&source).map_err(|e| match e {
            Error::SafetyError(msg) => Error::SafetyError(format!("{filename}: paths[\"{source}\"]: {msg}")),
            other => other,
        })?;
        validate_source_path_shape(&source)
            .map_err(|msg| config_error(format!("paths[\"{source}\"]: {msg}")))?;
        if mapping.template().trim().is_empty() {
            return Err(config_error(format!("paths[\"{source}\"]: output path template is empty")));
        }

        let metadata = fs::metadata(template_dir.join(&source)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => config_error(format!(
                "paths[\"{source}\"]: source does not exist in template directory"
            )),
            _ => Error::file(template_dir.join(&source), e),
        })?;

        parsed
            .env
            .add_template_owned(source.clone(), mapping.template().to_string())
            .map_err(|e| {
                config_error(format!(
                    "paths[\"{source}\"]: invalid template syntax '{}': {e}",
                    mapping.template()
                ))
            })?;

        if !mapping.overwrite() {
            parsed.no_overwrite.insert(source.clone());
        }

        if metadata.is_dir() {
            debug!("Directory rule: '{}' -> '{}'", source, mapping.template());
            parsed.dir_mappings.push(source);
        } else {
            debug!("File rule: '{}' -> '{}'", source, mapping.template());
            parsed.file_templates.insert(source);
        }
    }

    parsed.dir_mappings.sort_by(|a, b| b.len().cmp(&a.len()));
    Ok(parsed)
}

/// Rejects absolute and traversing source keys.
fn validate_source_path(source: &str) -> Result<()> {
    if Path::new(source).is_absolute() || source.starts_with('/') || source.starts_with('\\') {
        return Err(Error::SafetyError(
            "source path must be relative (got absolute path)".to_string(),
        ));
    }
    if has_traversal(source) {
        return Err(Error::SafetyError(
            "source path contains '..' (directory traversal)".to_string(),
        ));
    }
    Ok(())
}

fn validate_source_path_shape(source: &str) -> std::result::Result<(), String> {
    if source.is_empty() {
        return Err("source path is empty".to_string());
    }
    if source.contains('\0') {
        return Err("source path contains null byte".to_string());
    }
    Ok(())
}

/// Returns true if `relative_path` is a control file at the template root.
pub fn is_config_file(relative_path: &str) -> bool {
    CONFIG_FILES.contains(&relative_path)
}
