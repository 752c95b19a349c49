//! Rendering mode inference from the template kind and output path shape.

use std::fmt;

/// The five ways a template can be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Single template file to a single output file.
    File,
    /// Single template file into an existing or new directory.
    FileIntoDirectory,
    /// Template directory rendered once.
    Directory,
    /// Single template file rendered once per item.
    EachFile,
    /// Template directory rendered once per item.
    EachDirectory,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::File => "file",
            Mode::FileIntoDirectory => "file-into-dir",
            Mode::Directory => "directory",
            Mode::EachFile => "each-file",
            Mode::EachDirectory => "each-directory",
        };
        f.write_str(name)
    }
}

/// True when `output` looks like a template (contains both `{{` and `}}`).
pub fn is_dynamic(output: &str) -> bool {
    output.contains("{{") && output.contains("}}")
}

/// True when `output` ends with `/` or the platform separator.
pub fn has_trailing_separator(output: &str) -> bool {
    output.ends_with('/') || output.ends_with(std::path::MAIN_SEPARATOR)
}

/// Picks the mode. The first matching rule wins.
pub fn infer_mode(is_dir: bool, output: &str) -> Mode {
    let dynamic = is_dynamic(output);
    match (is_dir, dynamic) {
        (true, true) => Mode::EachDirectory,
        (true, false) => Mode::Directory,
        (false, true) => Mode::EachFile,
        (false, false) if has_trailing_separator(output) => Mode::FileIntoDirectory,
        (false, false) => Mode::File,
    }
}
