//! Filesystem helpers shared by the staging and assembly steps

use crate::error::ConvertError;
use std::{fs, path::Path};

/// Recursively copy the contents of `src` into `dst`.
///
/// `dst` is created if needed. Existing files are overwritten and files that
/// only exist in `dst` are left alone. Returns the number of files copied.
pub fn copy_dir_recursive(
    src: &Path,
    dst: &Path,
) -> Result<usize, ConvertError> {
    fs::create_dir_all(dst).map_err(|e| ConvertError::io(dst, e))?;

    let entries = fs::read_dir(src).map_err(|e| ConvertError::io(src, e))?;
    let mut copied = 0;
    for entry in entries {
        let entry = entry.map_err(|e| ConvertError::io(src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        // Follow symlinks so a linked mesh folder is copied as real content
        if from.is_dir() {
            copied += copy_dir_recursive(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| ConvertError::io(&from, e))?;
            log::trace!("Copied {} -> {}", from.display(), to.display());
            copied += 1;
        }
    }
    Ok(copied)
}

/// Move `src` (file or directory) into the existing directory `dst_dir`,
/// keeping its file name.
///
/// Tries a rename first. When that fails (typically across filesystems) the
/// tree is copied and the source removed afterwards.
pub fn move_into(
    src: &Path,
    dst_dir: &Path,
) -> Result<std::path::PathBuf, ConvertError> {
    let name = src.file_name().ok_or_else(|| {
        ConvertError::io(
            src,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let dst = dst_dir.join(name);

    match fs::rename(src, &dst) {
        Ok(()) => {}
        Err(rename_err) => {
            if !src.exists() {
                return Err(ConvertError::io(src, rename_err));
            }
            log::debug!(
                "rename {} -> {} failed ({}), falling back to copy",
                src.display(),
                dst.display(),
                rename_err
            );
            if src.is_dir() {
                copy_dir_recursive(src, &dst)?;
                fs::remove_dir_all(src).map_err(|e| ConvertError::io(src, e))?;
            } else {
                fs::copy(src, &dst).map_err(|e| ConvertError::io(src, e))?;
                fs::remove_file(src).map_err(|e| ConvertError::io(src, e))?;
            }
        }
    }
    Ok(dst)
}
