//! MiniJinja-backed template rendering.

use minijinja::{context, AutoEscape, Environment, Value};

use super::filters::register_filters;
use super::interface::TemplateRenderer;
use crate::error::{Error, Result};

/// Creates an environment with the function registry bound.
///
/// Trailing newlines are kept so rendered files match their templates
/// byte-for-byte. Output is never escaped, whatever the template name.
pub fn new_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    register_filters(&mut env);
    env
}

/// Builds the render context for a data value.
///
/// Map keys become top-level variables and the whole value is bound as
/// `data`, so list and scalar roots stay reachable.
pub fn template_context(data: &serde_json::Value) -> Value {
    let root = Value::from_serialize(data);
    context! { data => root.clone(), ..root }
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a new renderer with the function registry bound.
    pub fn new() -> Self {
        Self { env: new_environment() }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// # Errors
    /// * `Error::RenderError` if the template fails to parse or execute
    fn render(&self, name: &str, template: &str, data: &serde_json::Value) -> Result<String> {
        self.env
            .render_named_str(name, template, template_context(data))
            .map_err(|source| Error::RenderError { template: name.to_string(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_keys_are_top_level() {
        let renderer = MiniJinjaRenderer::new();
        let out = renderer.render("t", "Hello {{ name }}!", &json!({"name": "World"})).unwrap();
        assert_eq!(out, "Hello World!");
    }

    #[test]
    fn test_list_root_reachable_as_data() {
        let renderer = MiniJinjaRenderer::new();
        let out = renderer
            .render("t", "{% for u in data %}{{ u.name }};{% endfor %}", &json!([{"name": "a"}, {"name": "b"}]))
            .unwrap();
        assert_eq!(out, "a;b;");
    }

    #[test]
    fn test_trailing_newline_preserved() {
        let renderer = MiniJinjaRenderer::new();
        let out = renderer.render("t", "line\n", &json!({})).unwrap();
        assert_eq!(out, "line\n");
    }

    #[test]
    fn test_file_name_does_not_select_escaping() {
        let renderer = MiniJinjaRenderer::new();
        let data = json!({"name": "A & B"});
        assert_eq!(renderer.render("index.html", "{{ name }}", &data).unwrap(), "A & B");
        assert_eq!(renderer.render("config.yaml", "name: {{ name }}", &data).unwrap(), "name: A & B");
        assert_eq!(renderer.render("data.json", "{{ name }}", &data).unwrap(), "A & B");
    }

    #[test]
    fn test_syntax_error_names_template() {
        let renderer = MiniJinjaRenderer::new();
        let err = renderer.render("broken.txt.tmpl", "{{ name ", &json!({})).unwrap_err();
        match err {
            Error::RenderError { template, .. } => assert_eq!(template, "broken.txt.tmpl"),
            other => panic!("Expected RenderError, got {other:?}"),
        }
    }
}
