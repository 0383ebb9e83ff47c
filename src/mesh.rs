//! Staging of mesh assets under `urdf/<package>/meshes`

use crate::{context::WorkingContext, error::ConvertError, utils::fs::copy_dir_recursive};
use std::{fs, path::PathBuf};

/// Result of [`stage_meshes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedMeshes {
    /// `urdf/<robot_mesh_name>`, the folder later moved into the bundle
    pub dir: PathBuf,
    /// Number of files copied from `meshes/`
    pub files: usize,
}

/// Create `urdf/<robot_mesh_name>/meshes` and copy `meshes/**` into it.
///
/// Existing staged files are overwritten, extra ones are kept. A package
/// without a `meshes` folder just gets an empty staging directory.
pub fn stage_meshes(ctx: &WorkingContext) -> Result<StagedMeshes, ConvertError> {
    let dest = ctx.staged_mesh_dir();
    fs::create_dir_all(&dest).map_err(|e| ConvertError::io(&dest, e))?;

    let source = ctx.mesh_source();
    let files = if source.is_dir() {
        copy_dir_recursive(&source, &dest)?
    } else {
        log::debug!("No meshes folder at {}", source.display());
        0
    };

    log::debug!("Staged {} mesh file(s) in {}", files, dest.display());
    Ok(StagedMeshes {
        dir: ctx.staged_dir(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn package(tmp: &Path) -> PathBuf {
        let root = tmp.join("arm_description");
        fs::create_dir_all(root.join("urdf")).unwrap();
        fs::write(root.join("urdf/arm.xacro"), "<robot name=\"arm\"/>").unwrap();
        root
    }

    #[test]
    fn test_stage_without_meshes_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = WorkingContext::locate(&package(tmp.path())).unwrap();

        let staged = stage_meshes(&ctx).unwrap();

        assert_eq!(staged.files, 0);
        assert_eq!(staged.dir, ctx.staged_dir());
        assert!(ctx.staged_mesh_dir().is_dir());
        assert_eq!(fs::read_dir(ctx.staged_mesh_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_stage_copies_tree_and_is_repeatable() {
        let tmp = tempfile::tempdir().unwrap();
        let root = package(tmp.path());
        fs::create_dir_all(root.join("meshes/collision")).unwrap();
        fs::write(root.join("meshes/base.stl"), "base").unwrap();
        fs::write(root.join("meshes/collision/base.stl"), "hull").unwrap();
        let ctx = WorkingContext::locate(&root).unwrap();

        assert_eq!(stage_meshes(&ctx).unwrap().files, 2);
        assert_eq!(stage_meshes(&ctx).unwrap().files, 2);

        let staged = ctx.staged_mesh_dir();
        assert_eq!(fs::read_to_string(staged.join("base.stl")).unwrap(), "base");
        assert_eq!(
            fs::read_to_string(staged.join("collision/base.stl")).unwrap(),
            "hull"
        );
        // Source is copied, not moved
        assert!(root.join("meshes/base.stl").is_file());
    }
}
