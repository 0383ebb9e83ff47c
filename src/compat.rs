//! Compatibility patch for Python `xacro.py` expanders.
//!
//! Older standalone `xacro.py` scripts call the private
//! `xml.dom.minidom._write_data(writer, data)` helper, which gained a third
//! `attr` parameter in Python 3.12 and stopped accepting two arguments. The
//! patch injects a small adapter that tries the three-argument form first and
//! falls back to the two-argument form, then routes the attribute writer
//! through it. Native expanders never go through this module.

use crate::error::ConvertError;
use std::{fs, io, path::Path};

/// Name of the injected adapter; its presence means the script is patched
pub const SHIM_MARKER: &str = "_write_data_compat";

/// Revision of the injected adapter block
pub const SHIM_VERSION: u32 = 1;

/// The attribute-writer call that breaks on Python 3.12+
const VULNERABLE_CALL: &str = "xml.dom.minidom._write_data(writer, attrs[a_name].value)";

const PATCHED_CALL: &str = "_write_data_compat(writer, attrs[a_name].value, None)";

// New three-argument form must be tried first: each runtime rejects the other shape.
const ADAPTER: &str = "import xml.dom.minidom\n\
\n\
def _write_data_compat(writer, data, attr=None):\n    \
    try:\n        \
        # Python 3.12+\n        \
        return xml.dom.minidom._write_data(writer, data, attr)\n    \
    except TypeError:\n        \
        # Python <= 3.11\n        \
        return xml.dom.minidom._write_data(writer, data)\n\
\n";

/// What [`patch_expander_source`] did to the script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShimOutcome {
    /// The adapter was injected and the file rewritten
    Patched,
    /// The marker was already present
    AlreadyPatched,
    /// The vulnerable call is absent, nothing to do
    NotNeeded,
    /// The script could not be read; expansion may still fail later
    Unreadable,
}

/// Patch the expander script at `path` in place.
///
/// Read failures are logged and reported as [`ShimOutcome::Unreadable`];
/// a failure to write the patched text back is fatal.
pub fn patch_expander_source(path: &Path) -> Result<ShimOutcome, ConvertError> {
    patch_with(path, |path, patched| fs::write(path, patched))
}

fn patch_with<W>(
    path: &Path,
    write: W,
) -> Result<ShimOutcome, ConvertError>
where
    W: FnOnce(&Path, &str) -> io::Result<()>,
{
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            log::warn!(
                "failed to read '{}' for minidom compatibility patch: {}",
                path.display(),
                e
            );
            return Ok(ShimOutcome::Unreadable);
        }
    };

    if source.contains(SHIM_MARKER) {
        log::debug!("{} already carries the minidom shim", path.display());
        return Ok(ShimOutcome::AlreadyPatched);
    }

    let Some(patched) = apply_minidom_shim(&source) else {
        log::debug!("{} does not need the minidom shim", path.display());
        return Ok(ShimOutcome::NotNeeded);
    };

    write(path, &patched).map_err(|source| ConvertError::ShimWrite {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "Patched {} for minidom compatibility (shim v{})",
        path.display(),
        SHIM_VERSION
    );
    Ok(ShimOutcome::Patched)
}

/// Return the patched script, or `None` when no change is needed.
pub fn apply_minidom_shim(source: &str) -> Option<String> {
    if source.contains(SHIM_MARKER) || !source.contains(VULNERABLE_CALL) {
        return None;
    }

    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let insert_at = adapter_insertion_line(&lines);

    let mut patched = String::with_capacity(source.len() + ADAPTER.len() + 1);
    patched.extend(lines[..insert_at].iter().copied());
    patched.push('\n');
    patched.push_str(ADAPTER);
    patched.extend(lines[insert_at..].iter().copied());

    Some(patched.replace(VULNERABLE_CALL, PATCHED_CALL))
}

/// Index of the line the adapter goes in front of.
///
/// Right after the last top-level import; with no imports, after a leading
/// shebang or encoding line; otherwise at the top.
fn adapter_insertion_line(lines: &[&str]) -> usize {
    let after_last_import = lines
        .iter()
        .rposition(|line| line.starts_with("import ") || line.starts_with("from "))
        .map_or(0, |i| i + 1);
    if after_last_import > 0 {
        return after_last_import;
    }

    match lines.first() {
        Some(first) if first.starts_with("#!") || first.contains("coding") => 1,
        _ => 0,
    }
}
