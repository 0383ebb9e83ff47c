//! Mesh URI rewriting for the generated URDF.
//!
//! Expanders resolve `$(find pkg)` into absolute paths, which leaves URIs like
//! `file:///home/me/ws/src/arm_description/meshes/base.stl` in the output.
//! Unity's URDF importer resolves `package://` URIs relative to the imported
//! folder, so the machine-specific prefix is replaced.

use crate::error::ConvertError;
use regex::Regex;
use std::{borrow::Cow, fs, path::Path, sync::OnceLock};

static FILE_MESH_URI_REGEX: OnceLock<Regex> = OnceLock::new();

// Lazy so each URI stops at its own `meshes` segment; `.` never crosses lines
fn file_mesh_uri_regex() -> &'static Regex {
    FILE_MESH_URI_REGEX
        .get_or_init(|| Regex::new(r"file://.*?[/\\]meshes").expect("Valid regex pattern"))
}

/// `package://` prefix replacing each `file://…/meshes` match
pub fn package_mesh_prefix(robot_mesh_name: &str) -> String {
    format!("package://{}/meshes", robot_mesh_name)
}

/// Rewrite `file://…/meshes` into `package://<robot_mesh_name>/meshes`.
///
/// Returns the text and the number of replacements. URIs without a
/// `meshes` segment are left as they are.
pub fn rewrite_mesh_uris<'a>(
    text: &'a str,
    robot_mesh_name: &str,
) -> (Cow<'a, str>, usize) {
    let regex = file_mesh_uri_regex();
    let count = regex.find_iter(text).count();
    if count == 0 {
        return (Cow::Borrowed(text), 0);
    }
    let prefix = package_mesh_prefix(robot_mesh_name);
    let rewritten = regex.replace_all(text, regex::NoExpand(prefix.as_str()));
    (Cow::Owned(rewritten.into_owned()), count)
}

/// Rewrite the URDF at `path` in place, returning the number of replacements
pub fn rewrite_urdf_file(
    path: &Path,
    robot_mesh_name: &str,
) -> Result<usize, ConvertError> {
    let urdf = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    let (rewritten, count) = rewrite_mesh_uris(&urdf, robot_mesh_name);
    if count > 0 {
        fs::write(path, rewritten.as_bytes()).map_err(|e| ConvertError::io(path, e))?;
    }
    log::info!("Rewrote {} mesh URI(s) in {}", count, path.display());
    Ok(count)
}
