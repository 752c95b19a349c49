//! Path safety checks shared by the config loader, collector and each modes.

use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Returns true if any `/`- or `\`-separated segment of `path` is `..`.
pub fn has_traversal(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Rejects rendered paths containing a `..` segment.
pub fn ensure_no_traversal(path: &str, what: &str) -> Result<()> {
    if has_traversal(path) {
        return Err(Error::SafetyError(format!(
            "{what} contains directory traversal: '{path}'"
        )));
    }
    Ok(())
}

/// Resolves `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Makes `path` absolute against the current directory and normalizes it.
pub fn absolutize<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&abs))
}

/// Lexical containment: true when `path` equals `root` or lies beneath it.
pub fn is_within(path: &Path, root: &Path) -> bool {
    normalize(path).starts_with(normalize(root))
}

/// Rejects a template source that is itself a symlink.
pub fn check_for_symlink<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Err(Error::SafetyError(format!(
            "template source contains symlink: '{}'",
            path.display()
        ))),
        // A missing path is reported later as an input error.
        _ => Ok(()),
    }
}

/// Rejects any symlink inside a template directory tree.
pub fn check_dir_for_symlinks<P: AsRef<Path>>(dir: P) -> Result<()> {
    for entry in WalkDir::new(dir.as_ref()) {
        let entry = entry.map_err(|e| Error::IoError(e.into()))?;
        if entry.path_is_symlink() {
            return Err(Error::SafetyError(format!(
                "template source contains symlink: '{}'",
                entry.path().display()
            )));
        }
    }
    Ok(())
}
