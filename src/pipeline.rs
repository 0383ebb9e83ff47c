//! The end-to-end conversion run

use crate::{
    assemble::assemble,
    compat::ShimOutcome,
    context::WorkingContext,
    error::ConvertError,
    expander::{Expander, ExpansionInvoker, DEFAULT_TIMEOUT},
    mesh::stage_meshes,
    preprocess::write_filtered,
    rewrite::rewrite_urdf_file,
};
use core::time::Duration;
use std::path::{Path, PathBuf};

/// Summary of a successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    /// `<root>/<robot>_to_unity`
    pub output_dir: PathBuf,
    /// URDF inside the bundle
    pub urdf: PathBuf,
    /// Expander that produced the URDF
    pub expander: Expander,
    /// `None` when the expander is a native binary
    pub shim: Option<ShimOutcome>,
    pub gazebo_includes_removed: usize,
    pub mesh_uris_rewritten: usize,
    pub mesh_files_staged: usize,
}

/// Converts a description package into a Unity-ready bundle.
///
/// Use [`Converter::builder`] to pick the expander or the timeout.
#[derive(Debug, Clone)]
pub struct Converter {
    expander: Option<PathBuf>,
    interpreter: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::new()
    }

    /// Run the whole pipeline on the package at `root`.
    ///
    /// Nothing on disk is touched when `root` fails validation.
    pub fn run(
        &self,
        root: &Path,
    ) -> Result<ConversionReport, ConvertError> {
        let ctx = WorkingContext::locate(root)?;

        let expander = Expander::resolve(
            ctx.root(),
            self.expander.as_deref(),
            self.interpreter.as_deref(),
        );
        let shim = expander.prepare()?;

        let staged = stage_meshes(&ctx)?;

        let filtered = write_filtered(&ctx)?;
        let gazebo_includes_removed = filtered.removed_includes();

        log::info!("Generating URDF ...");
        let urdf = ctx.urdf_output();
        let invoker =
            ExpansionInvoker::new(expander, self.timeout).with_working_dir(ctx.root());
        let expanded = invoker.run(filtered.path(), &urdf);
        filtered.remove();
        expanded?;

        let mesh_uris_rewritten = rewrite_urdf_file(&urdf, ctx.robot_mesh_name())?;

        let output_dir = assemble(&ctx, &urdf, &staged.dir)?;
        let urdf = output_dir.join(format!("{}.urdf", ctx.robot_name()));

        Ok(ConversionReport {
            output_dir,
            urdf,
            expander: invoker.expander().clone(),
            shim,
            gazebo_includes_removed,
            mesh_uris_rewritten,
            mesh_files_staged: staged.files,
        })
    }
}

/// Builder for [`Converter`]
#[derive(Debug, Clone)]
pub struct ConverterBuilder {
    expander: Option<PathBuf>,
    interpreter: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterBuilder {
    pub fn new() -> Self {
        Self {
            expander: None,
            interpreter: None,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Use this expander instead of `xacro.py` in the root or `xacro` on `PATH`.
    /// Paths ending in `.py` are run through the interpreter.
    pub fn with_expander(
        mut self,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.expander = Some(path.into());
        self
    }

    /// Python interpreter for script expanders (default `python3`)
    pub fn with_interpreter(
        mut self,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.interpreter = Some(path.into());
        self
    }

    /// Limit on the expander run; `None` waits forever
    pub fn with_timeout(
        mut self,
        timeout: Option<Duration>,
    ) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Converter {
        Converter {
            expander: self.expander,
            interpreter: self.interpreter,
            timeout: self.timeout,
        }
    }
}
