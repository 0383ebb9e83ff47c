//! Removal of Gazebo-only includes before expansion.
//!
//! Gazebo plugin files (`*.gazebo`) usually pull in `$(find ...)` lookups and
//! simulator tags that Unity has no use for, so their include directives are
//! blanked out in a temporary copy of the xacro source.

use crate::{context::WorkingContext, error::ConvertError};
use regex::Regex;
use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

/// Comment left in place of each removed include
pub const GAZEBO_PLACEHOLDER: &str = "<!-- omitted .gazebo include -->";

static GAZEBO_INCLUDE_REGEX: OnceLock<Regex> = OnceLock::new();

fn gazebo_include_regex() -> &'static Regex {
    GAZEBO_INCLUDE_REGEX.get_or_init(|| {
        Regex::new(r"<xacro:include\b[^>]*\.gazebo[^>]*>").expect("Valid regex pattern")
    })
}

/// Replace every `<xacro:include ... .gazebo ...>` tag with [`GAZEBO_PLACEHOLDER`].
///
/// This is a textual substitution: attribute order and whitespace inside the
/// tag do not matter, and everything outside matched tags is preserved
/// byte-for-byte. Returns the (possibly borrowed) text and the match count.
pub fn strip_gazebo_includes(text: &str) -> (Cow<'_, str>, usize) {
    let regex = gazebo_include_regex();
    let count = regex.find_iter(text).count();
    if count == 0 {
        return (Cow::Borrowed(text), 0);
    }
    let replaced = regex.replace_all(text, regex::NoExpand(GAZEBO_PLACEHOLDER));
    (Cow::Owned(replaced.into_owned()), count)
}

/// Temporary filtered xacro file.
///
/// The file is removed when the guard is dropped or [`FilteredXacro::remove`]
/// is called. Removal failures are logged as warnings only.
#[derive(Debug)]
pub struct FilteredXacro {
    path: PathBuf,
    removed_includes: usize,
    removed: bool,
}

impl FilteredXacro {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of `.gazebo` includes replaced by the placeholder
    pub fn removed_includes(&self) -> usize {
        self.removed_includes
    }

    /// Delete the temporary file now
    pub fn remove(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!(
                "failed to remove temporary file '{}': {}",
                self.path.display(),
                e
            );
        }
    }
}

impl Drop for FilteredXacro {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Write the filtered copy of `urdf/<robot>.xacro` next to the original
pub fn write_filtered(ctx: &WorkingContext) -> Result<FilteredXacro, ConvertError> {
    let source = ctx.xacro_source();
    let content = fs::read_to_string(&source).map_err(|e| ConvertError::io(&source, e))?;

    let (filtered, removed_includes) = strip_gazebo_includes(&content);
    if removed_includes > 0 {
        log::info!(
            "Omitting {} .gazebo include(s) from {}",
            removed_includes,
            source.display()
        );
    }

    let path = ctx.filtered_xacro();
    fs::write(&path, filtered.as_bytes()).map_err(|e| ConvertError::io(&path, e))?;

    Ok(FilteredXacro {
        path,
        removed_includes,
        removed: false,
    })
}
