use crate::error::Result;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string against a data value.
    ///
    /// # Arguments
    /// * `name` - Label used in error messages (usually the template's source path)
    /// * `template` - Template source
    /// * `data` - Value tree the template executes against
    fn render(&self, name: &str, template: &str, data: &serde_json::Value) -> Result<String>;
}
