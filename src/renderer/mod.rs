//! Template rendering engine for render.
//!
//! - `interface`: the trait the rest of the crate renders through
//! - `minijinja`: MiniJinja-backed implementation and render context
//! - `filters`: the function registry bound into every environment

pub mod filters;
pub mod interface;
pub mod minijinja;

pub use interface::TemplateRenderer;
pub use self::minijinja::{new_environment, template_context, MiniJinjaRenderer};
