//! Source-to-output path transformation driven by control file rules.

use log::debug;

use crate::config::ParsedPathConfig;
use crate::error::Result;
use crate::safety::ensure_no_traversal;

/// Transforms template-relative paths using a parsed control file.
///
/// A mapper without a config (or with an empty one) returns every path
/// unchanged and allows overwriting everywhere.
#[derive(Debug, Clone, Copy)]
pub struct PathMapper<'a> {
    config: Option<&'a ParsedPathConfig>,
}

impl<'a> PathMapper<'a> {
    pub fn new(config: Option<&'a ParsedPathConfig>) -> Self {
        Self { config: config.filter(|c| !c.is_empty()) }
    }

    /// Transforms `relative_path` into an output-relative path.
    ///
    /// 1. An exact file rule renders the working path.
    /// 2. The longest directory prefix matching the working path is
    ///    replaced by its rendered template.
    /// 3. Without a match the working path is returned unchanged.
    pub fn transform(&self, relative_path: &str, data: &serde_json::Value) -> Result<String> {
        let Some(config) = self.config else {
            return Ok(relative_path.to_string());
        };

        let working = if config.has_file_rule(relative_path) {
            let rendered = config.render_rule(relative_path, data)?;
            ensure_no_traversal(&rendered, "rendered path")?;
            rendered
        } else {
            relative_path.to_string()
        };

        for prefix in config.dir_prefixes() {
            let Some(suffix) = strip_dir_prefix(&working, prefix) else {
                continue;
            };
            let rendered_prefix = config.render_rule(prefix, data)?;
            ensure_no_traversal(&rendered_prefix, "rendered path")?;
            let result = format!("{rendered_prefix}{suffix}");
            debug!("Transformed '{}' -> '{}' via '{}'", relative_path, result, prefix);
            return Ok(result);
        }

        Ok(working)
    }

    /// Whether output from `source_path` may overwrite an existing file.
    /// Keyed by the source path, before any renaming.
    pub fn can_overwrite(&self, source_path: &str) -> bool {
        self.config.map_or(true, |c| c.can_overwrite(source_path))
    }
}

/// Returns the remainder after `prefix` when `path` equals it or continues
/// with a separator.
fn strip_dir_prefix<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
