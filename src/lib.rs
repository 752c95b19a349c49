//! render is a file generation tool.
//! It renders templates against JSON or YAML data to produce one or many
//! output files, planning and validating every write before touching disk.

/// Command-line interface module for the render application
pub mod cli;

/// Control file handling for template directories
/// Supports `.render.yaml`, `.render.yml` and `render.json`
pub mod config;

pub mod constants;

/// Data file loading (JSON and YAML)
pub mod data;

/// Error types and handling for the render application
pub mod error;

/// Writes validated plans to disk
pub mod executor;

/// Mode inference, planning and reporting for one invocation
pub mod generate;

pub mod logger;

/// Source-to-output path renaming driven by control file rules
pub mod mapper;

/// Rendering mode inference
pub mod mode;

/// Output plans and their validation
pub mod plan;

/// Walks template sources and builds output plans
pub mod processor;

/// jq-style data queries
pub mod query;

/// Template rendering with MiniJinja
/// Handles the actual template processing logic
pub mod renderer;

pub mod report;

/// Path traversal and symlink checks
pub mod safety;
