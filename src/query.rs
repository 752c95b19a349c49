//! jq-style queries over data values, backed by jaq.

use jaq_core::load::{Arena, File, Loader};
use jaq_core::{Compiler, Ctx, RcIter};
use jaq_json::Val;
use log::debug;

use crate::error::{Error, Result};

/// Runs `expression` against `data` and collects every result.
pub fn query_all(data: &serde_json::Value, expression: &str) -> Result<Vec<serde_json::Value>> {
    let syntax_error = |reason: String| Error::QuerySyntaxError {
        expression: expression.to_string(),
        reason,
    };

    let program = File { code: expression, path: () };
    let loader = Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = Arena::default();
    let modules = loader
        .load(&arena, program)
        .map_err(|errs| syntax_error(format!("{} parse error(s)", errs.len())))?;
    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| syntax_error(format!("{} undefined name(s)", errs.len())))?;

    let inputs = RcIter::new(core::iter::empty());
    let mut results = Vec::new();
    for output in filter.run((Ctx::new([], &inputs), Val::from(data.clone()))) {
        let value = output.map_err(|e| Error::QueryError(format!("'{expression}': {e}")))?;
        results.push(serde_json::Value::from(value));
    }

    debug!("Query '{}' produced {} result(s)", expression, results.len());
    Ok(results)
}

/// Runs `expression` against `data` and returns the first result, or
/// `null` when the expression yields nothing.
pub fn query(data: &serde_json::Value, expression: &str) -> Result<serde_json::Value> {
    Ok(query_all(data, expression)?.into_iter().next().unwrap_or(serde_json::Value::Null))
}
