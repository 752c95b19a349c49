//! Custom MiniJinja filters available to body and path templates.
//!
//! MiniJinja's builtins already cover the common string and collection
//! helpers (`lower`, `upper`, `replace`, `join`, `default`, `tojson`, ...);
//! this module adds casing, inflection, regex and conversion helpers.
//! Conversions are fallible and surface as render errors on bad input.

use cruet::Inflector;
use minijinja::value::{Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};
use regex::Regex;

/// Registers every custom filter on the given environment.
pub fn register_filters(env: &mut Environment<'_>) {
    env.add_filter("camel_case", camel_case);
    env.add_filter("pascal_case", pascal_case);
    env.add_filter("snake_case", snake_case);
    env.add_filter("kebab_case", kebab_case);
    env.add_filter("screaming_snake_case", screaming_snake_case);
    env.add_filter("train_case", train_case);
    env.add_filter("sentence_case", sentence_case);
    env.add_filter("pluralize", pluralize);
    env.add_filter("singularize", singularize);
    env.add_filter("trim_prefix", trim_prefix);
    env.add_filter("trim_suffix", trim_suffix);
    env.add_filter("slug", slug);
    env.add_filter("regex_replace", regex_replace);
    env.add_filter("regex_match", regex_match);
    env.add_filter("to_int", to_int);
    env.add_filter("to_float", to_float);
    env.add_filter("to_bool", to_bool);
    env.add_filter("from_json", from_json);
}

pub fn camel_case(value: &str) -> String {
    value.to_camel_case()
}

pub fn pascal_case(value: &str) -> String {
    value.to_pascal_case()
}

pub fn snake_case(value: &str) -> String {
    value.to_snake_case()
}

pub fn kebab_case(value: &str) -> String {
    value.to_kebab_case()
}

pub fn screaming_snake_case(value: &str) -> String {
    value.to_screaming_snake_case()
}

pub fn train_case(value: &str) -> String {
    value.to_train_case()
}

pub fn sentence_case(value: &str) -> String {
    value.to_sentence_case()
}

pub fn pluralize(value: &str) -> String {
    value.to_plural()
}

pub fn singularize(value: &str) -> String {
    value.to_singular()
}

pub fn trim_prefix(value: &str, prefix: &str) -> String {
    value.strip_prefix(prefix).unwrap_or(value).to_string()
}

pub fn trim_suffix(value: &str, suffix: &str) -> String {
    value.strip_suffix(suffix).unwrap_or(value).to_string()
}

/// Lower-cases and joins alphanumeric runs with single dashes.
pub fn slug(value: &str) -> String {
    value
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn compile_regex(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|e| {
        Error::new(ErrorKind::InvalidOperation, format!("invalid regex '{pattern}': {e}"))
    })
}

pub fn regex_replace(value: &str, pattern: &str, replacement: &str) -> Result<String, Error> {
    Ok(compile_regex(pattern)?.replace_all(value, replacement).into_owned())
}

pub fn regex_match(value: &str, pattern: &str) -> Result<bool, Error> {
    Ok(compile_regex(pattern)?.is_match(value))
}

fn conversion_error(value: &Value, target: &str) -> Error {
    Error::new(ErrorKind::InvalidOperation, format!("cannot convert {value:?} to {target}"))
}

pub fn to_int(value: Value) -> Result<Value, Error> {
    match value.kind() {
        ValueKind::Number => {
            if let Ok(n) = i64::try_from(value.clone()) {
                return Ok(Value::from(n));
            }
            let f = f64::try_from(value.clone()).map_err(|_| conversion_error(&value, "int"))?;
            Ok(Value::from(f.trunc() as i64))
        }
        ValueKind::Bool => Ok(Value::from(i64::from(value.is_true()))),
        ValueKind::String => {
            let s = value.as_str().unwrap_or_default().trim();
            if let Ok(n) = s.parse::<i64>() {
                Ok(Value::from(n))
            } else if let Ok(f) = s.parse::<f64>() {
                Ok(Value::from(f.trunc() as i64))
            } else {
                Err(conversion_error(&value, "int"))
            }
        }
        _ => Err(conversion_error(&value, "int")),
    }
}

pub fn to_float(value: Value) -> Result<Value, Error> {
    match value.kind() {
        ValueKind::Number => f64::try_from(value.clone())
            .map(Value::from)
            .map_err(|_| conversion_error(&value, "float")),
        ValueKind::Bool => Ok(Value::from(if value.is_true() { 1.0 } else { 0.0 })),
        ValueKind::String => value
            .as_str()
            .unwrap_or_default()
            .trim()
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| conversion_error(&value, "float")),
        _ => Err(conversion_error(&value, "float")),
    }
}

pub fn to_bool(value: Value) -> Result<Value, Error> {
    match value.kind() {
        ValueKind::Bool => Ok(value),
        ValueKind::Number => Ok(Value::from(value.is_true())),
        ValueKind::String => match value.as_str().unwrap_or_default().trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::from(true)),
            "false" | "no" | "off" | "0" | "" => Ok(Value::from(false)),
            _ => Err(conversion_error(&value, "bool")),
        },
        ValueKind::None | ValueKind::Undefined => Ok(Value::from(false)),
        _ => Err(conversion_error(&value, "bool")),
    }
}

pub fn from_json(value: &str) -> Result<Value, Error> {
    serde_json::from_str::<serde_json::Value>(value)
        .map(|parsed| Value::from_serialize(&parsed))
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("invalid JSON: {e}")))
}
