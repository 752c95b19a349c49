//! Common constants used throughout the render application.

/// Control file names, in discovery priority order.
pub const CONFIG_FILES: [&str; 3] = [".render.yaml", ".render.yml", "render.json"];

/// Suffix marking a file as a template; stripped from the output name.
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Permission bits applied to rendered (non-copied) files.
pub const RENDERED_FILE_MODE: u32 = 0o644;
