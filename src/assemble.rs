//! Assembly of the `<robot>_to_unity` bundle

use crate::{context::WorkingContext, error::ConvertError, utils::fs::move_into};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Build a fresh output folder and move the URDF and staged meshes into it.
///
/// Any previous bundle at the same path is deleted first, never merged.
/// Returns the output folder.
pub fn assemble(
    ctx: &WorkingContext,
    urdf: &Path,
    staged_dir: &Path,
) -> Result<PathBuf, ConvertError> {
    let output_dir = ctx.output_dir();

    if output_dir.exists() {
        log::debug!("Removing previous output {}", output_dir.display());
        fs::remove_dir_all(&output_dir).map_err(|e| ConvertError::io(&output_dir, e))?;
    }
    fs::create_dir_all(&output_dir).map_err(|e| ConvertError::io(&output_dir, e))?;

    move_into(urdf, &output_dir)?;
    move_into(staged_dir, &output_dir)?;

    log::info!("Files are ready in '{}'", output_dir.display());
    Ok(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged_package(tmp: &Path) -> WorkingContext {
        let root = tmp.join("arm_description");
        fs::create_dir_all(root.join("urdf/arm_description/meshes")).unwrap();
        fs::write(root.join("urdf/arm.xacro"), "<robot name=\"arm\"/>").unwrap();
        fs::write(root.join("urdf/arm_description/meshes/base.stl"), "solid").unwrap();
        fs::write(root.join("arm.urdf"), "<robot name=\"arm\"/>").unwrap();
        WorkingContext::locate(&root).unwrap()
    }

    #[test]
    fn test_assemble_moves_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = staged_package(tmp.path());

        let out = assemble(&ctx, &ctx.urdf_output(), &ctx.staged_dir()).unwrap();

        assert_eq!(out, ctx.output_dir());
        assert!(out.join("arm.urdf").is_file());
        assert!(out.join("arm_description/meshes/base.stl").is_file());
        assert!(!ctx.urdf_output().exists());
        assert!(!ctx.staged_dir().exists());
    }

    #[test]
    fn test_assemble_replaces_previous_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = staged_package(tmp.path());
        let stale = ctx.output_dir().join("arm_description/meshes/old.stl");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let out = assemble(&ctx, &ctx.urdf_output(), &ctx.staged_dir()).unwrap();

        assert!(!stale.exists());
        assert!(out.join("arm_description/meshes/base.stl").is_file());
    }

    #[test]
    fn test_assemble_missing_urdf_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = staged_package(tmp.path());
        fs::remove_file(ctx.urdf_output()).unwrap();

        let err = assemble(&ctx, &ctx.urdf_output(), &ctx.staged_dir()).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
    }
}
