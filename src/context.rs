//! Locating the robot description package and deriving its names

use crate::error::ConvertError;
use std::path::{Path, PathBuf};

/// Folder-name suffix that marks a ROS description package
pub const DESCRIPTION_SUFFIX: &str = "_description";

/// Suffix of the output folder handed to Unity
pub const OUTPUT_SUFFIX: &str = "_to_unity";

/// Paths and names for one conversion run.
///
/// Built once by [`WorkingContext::locate`] and never mutated. Every component
/// receives it explicitly; nothing depends on the process working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingContext {
    root: PathBuf,
    robot_mesh_name: String,
    robot_name: String,
}

impl WorkingContext {
    /// Resolve `root` and validate that it holds `urdf/<robot>.xacro`.
    ///
    /// `robot_mesh_name` is the final path segment of the (canonical) root,
    /// e.g. `arm_description`, and `robot_name` is that name without the
    /// `_description` suffix.
    pub fn locate(root: &Path) -> Result<Self, ConvertError> {
        let root = root
            .canonicalize()
            .map_err(|e| ConvertError::InvalidRoot {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;

        let robot_mesh_name = root
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| ConvertError::InvalidRoot {
                path: root.clone(),
                reason: "path has no usable final segment".to_string(),
            })?;

        let ctx = Self::from_parts(root, robot_mesh_name);

        if !ctx.urdf_dir().is_dir() {
            return Err(ConvertError::MissingUrdfDir { root: ctx.root });
        }
        if !ctx.xacro_source().is_file() {
            return Err(ConvertError::MissingXacro {
                path: Path::new("urdf").join(ctx.xacro_file_name()),
            });
        }

        log::debug!(
            "Located '{}' (robot '{}') at {}",
            ctx.robot_mesh_name,
            ctx.robot_name,
            ctx.root.display()
        );
        Ok(ctx)
    }

    fn from_parts(
        root: PathBuf,
        robot_mesh_name: String,
    ) -> Self {
        let robot_name = robot_name_for(&robot_mesh_name).to_string();
        Self {
            root,
            robot_mesh_name,
            robot_name,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Description package folder name, e.g. `arm_description`
    pub fn robot_mesh_name(&self) -> &str {
        &self.robot_mesh_name
    }

    /// Robot name, e.g. `arm`
    pub fn robot_name(&self) -> &str {
        &self.robot_name
    }

    pub fn urdf_dir(&self) -> PathBuf {
        self.root.join("urdf")
    }

    fn xacro_file_name(&self) -> String {
        format!("{}.xacro", self.robot_name)
    }

    /// `urdf/<robot>.xacro`
    pub fn xacro_source(&self) -> PathBuf {
        self.urdf_dir().join(self.xacro_file_name())
    }

    /// Transient filtered copy handed to the expander
    pub fn filtered_xacro(&self) -> PathBuf {
        self.urdf_dir().join(format!("{}.temp", self.xacro_file_name()))
    }

    /// Expander output, `<root>/<robot>.urdf`
    pub fn urdf_output(&self) -> PathBuf {
        self.root.join(format!("{}.urdf", self.robot_name))
    }

    /// Source mesh tree, `<root>/meshes`
    pub fn mesh_source(&self) -> PathBuf {
        self.root.join("meshes")
    }

    /// Staging folder, `urdf/<robot_mesh_name>`
    pub fn staged_dir(&self) -> PathBuf {
        self.urdf_dir().join(&self.robot_mesh_name)
    }

    pub fn staged_mesh_dir(&self) -> PathBuf {
        self.staged_dir().join("meshes")
    }

    /// Final bundle, `<root>/<robot>_to_unity`
    pub fn output_dir(&self) -> PathBuf {
        self.root
            .join(format!("{}{}", self.robot_name, OUTPUT_SUFFIX))
    }
}

/// Strip the description suffix from a package folder name
pub fn robot_name_for(robot_mesh_name: &str) -> &str {
    robot_mesh_name
        .strip_suffix(DESCRIPTION_SUFFIX)
        .unwrap_or(robot_mesh_name)
}
