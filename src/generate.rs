//! Orchestration of a single render invocation.
//! Loads data, infers the mode, builds and validates every plan, then either
//! reports the planned actions (dry run) or executes them.

use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::config::{self, ParsedPathConfig};
use crate::constants::TEMPLATE_SUFFIX;
use crate::data;
use crate::error::{Error, Result};
use crate::executor::{classify, execute};
use crate::mode::{infer_mode, Mode};
use crate::plan::{validate_all, OutputPlan};
use crate::processor::{
    collect, collect_each_file, collect_file, is_template_path, render_output_path,
};
use crate::query::{query, query_all};
use crate::renderer::{MiniJinjaRenderer, TemplateRenderer};
use crate::report::{FileAction, Report};
use crate::safety::{absolutize, check_dir_for_symlinks, check_for_symlink};

/// Everything one invocation needs, built once from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub template: PathBuf,
    pub data: PathBuf,
    /// Output path or per-item output path template.
    pub output: String,
    pub force: bool,
    pub dry_run: bool,
    /// Explicit control file; disables discovery in the template directory.
    pub control: Option<PathBuf>,
    pub query: Option<String>,
    pub item_query: Option<String>,
}

/// Items an each mode iterates: a list is unwrapped, anything else is a
/// single item.
pub fn iterable_items(data: &serde_json::Value) -> &[serde_json::Value] {
    match data {
        serde_json::Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

/// Loads the data file and applies `--query` then `--item-query`.
pub fn load_data(options: &Options) -> Result<serde_json::Value> {
    let mut value = data::load(&options.data)?;
    if let Some(expression) = &options.query {
        value = query(&value, expression)?;
    }
    if let Some(expression) = &options.item_query {
        value = serde_json::Value::Array(query_all(&value, expression)?);
    }
    Ok(value)
}

fn load_config(options: &Options, template_dir: &Path) -> Result<Option<ParsedPathConfig>> {
    match &options.control {
        Some(control) => config::load_file(control, template_dir).map(Some),
        None => config::load(template_dir),
    }
}

/// Destination for file-into-directory mode: the template's own name, minus
/// the template suffix, inside the output directory.
fn file_into_directory_target(template: &Path, output: &str) -> Result<PathBuf> {
    let name = template
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InputError(format!("invalid template path: '{}'", template.display())))?;
    let name = match name.strip_suffix(TEMPLATE_SUFFIX) {
        Some(stem) if is_template_path(name) => stem,
        _ => name,
    };
    let dir = output.trim_end_matches(['/', MAIN_SEPARATOR]);
    Ok(absolutize(dir)?.join(name))
}

/// Builds every plan for `mode`. Nothing is written.
pub fn build_plans(
    mode: Mode,
    options: &Options,
    data: &serde_json::Value,
    renderer: &dyn TemplateRenderer,
) -> Result<Vec<OutputPlan>> {
    let template = absolutize(&options.template)?;
    if options.control.is_some() && !matches!(mode, Mode::Directory | Mode::EachDirectory) {
        warn!("Ignoring control file for {} mode", mode);
    }

    let plans = match mode {
        Mode::File => {
            let output = absolutize(&options.output)?;
            vec![collect_file(&template, &output, data, renderer)?]
        }
        Mode::FileIntoDirectory => {
            let output = file_into_directory_target(&template, &options.output)?;
            vec![collect_file(&template, &output, data, renderer)?]
        }
        Mode::Directory => {
            check_dir_for_symlinks(&template)?;
            let config = load_config(options, &template)?;
            let output_dir = absolutize(&options.output)?;
            vec![collect(&template, &output_dir, data, renderer, config.as_ref())?]
        }
        Mode::EachFile => {
            let items = iterable_items(data);
            debug!("Rendering {} item(s)", items.len());
            vec![collect_each_file(&template, &options.output, items, renderer, |path| {
                absolutize(path)
            })?]
        }
        Mode::EachDirectory => {
            check_dir_for_symlinks(&template)?;
            let config = load_config(options, &template)?;
            let items = iterable_items(data);
            debug!("Rendering {} item(s)", items.len());
            items
                .iter()
                .map(|item| {
                    let output_dir = absolutize(render_output_path(renderer, &options.output, item)?)?;
                    collect(&template, &output_dir, item, renderer, config.as_ref())
                })
                .collect::<Result<Vec<_>>>()?
        }
    };
    Ok(plans)
}

/// Runs one invocation and returns its report.
pub fn run(options: &Options) -> Result<Report> {
    if options.output.trim().is_empty() {
        return Err(Error::UsageError("required flag --output/-o not set".to_string()));
    }

    check_for_symlink(&options.template)?;
    let data = load_data(options)?;

    let metadata = fs::metadata(&options.template).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::InputError(format!(
            "template does not exist: '{}'",
            options.template.display()
        )),
        _ => Error::file(&options.template, e),
    })?;
    let mode = infer_mode(metadata.is_dir(), &options.output);
    debug!("Rendering '{}' in {} mode", options.template.display(), mode);

    let renderer = MiniJinjaRenderer::new();
    let plans = build_plans(mode, options, &data, &renderer)?;

    let errors = validate_all(&plans);
    if !errors.is_empty() {
        return Err(Error::PlanValidationError(errors));
    }

    // Every existing destination is checked before the first write.
    let mut planned = Vec::new();
    for plan in &plans {
        for output in &plan.outputs {
            planned.push(FileAction::planned(&output.output_path, classify(output, options.force)?));
        }
    }
    if options.dry_run {
        return Ok(Report::dry_run(planned));
    }

    let mut files = Vec::with_capacity(planned.len());
    for plan in &plans {
        let result = execute(plan, options.force)?;
        files.extend(result.actions.iter().map(|(path, action)| FileAction::done(path, *action)));
    }
    Ok(Report::success(files))
}
