//! Startup checks for the external tools netfind shells out to
//!
//! Missing tools are fatal before the first round; a sweep that fails
//! mid-run because its binary vanished is just a per-interface failure.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Fail with [`Error::MissingExternalTool`] for the first tool not found on `PATH`
pub fn require_tools<P: AsRef<Path>>(tools: &[P]) -> Result<()> {
    let path_var = std::env::var_os("PATH");
    require_tools_in(tools, path_var.as_deref())
}

/// Same as [`require_tools`], searching an explicit `PATH` value
pub fn require_tools_in<P: AsRef<Path>>(tools: &[P], path_var: Option<&OsStr>) -> Result<()> {
    for tool in tools {
        let tool = tool.as_ref();
        match find_executable(tool, path_var) {
            Some(found) => tracing::debug!("Found {} at {}", tool.display(), found.display()),
            None => return Err(Error::missing_tool(tool.display().to_string())),
        }
    }
    Ok(())
}

/// Resolve `tool` the way a shell would
///
/// Names containing a path separator are checked as given; bare names are
/// searched in each directory of `path_var`.
pub fn find_executable(tool: &Path, path_var: Option<&OsStr>) -> Option<PathBuf> {
    if tool.components().count() > 1 || tool.is_absolute() {
        return is_executable(tool).then(|| tool.to_path_buf());
    }

    let path_var = path_var?;
    std::env::split_paths(path_var)
        .map(|dir| dir.join(tool))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
