use core::time::Duration;
use std::{path::PathBuf, process::ExitStatus};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid root directory '{}': {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("'urdf' folder not found in '{}'. Please run from the parent folder of 'urdf'.", root.display())]
    MissingUrdfDir { root: PathBuf },

    #[error("'{}' not found.", path.display())]
    MissingXacro { path: PathBuf },

    #[error("Expander script '{}' not found (it can be downloaded from {url})", path.display())]
    MissingExpander { path: PathBuf, url: &'static str },

    #[error("Failed to write patched expander source '{}': {source}", path.display())]
    ShimWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start expander '{program}': {source}")]
    ExpanderSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for expander '{program}': {source}")]
    ExpanderWait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Expander '{program}' failed with {status}")]
    ExpansionFailed { program: String, status: ExitStatus },

    #[error("Expander '{program}' did not finish within {}s and was killed", timeout.as_secs_f64())]
    ExpansionTimeout { program: String, timeout: Duration },
}

impl ConvertError {
    /// Wrap an I/O error with the path it happened on
    pub(crate) fn io(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error.
    ///
    /// A failing expander passes its own exit code through; everything else
    /// (including an expander killed by a signal) exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::ExpansionFailed { status, .. } => {
                status.code().filter(|code| *code != 0).unwrap_or(1)
            }
            _ => 1,
        }
    }

    /// True for errors raised before anything on disk was touched
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ConvertError::InvalidRoot { .. }
                | ConvertError::MissingUrdfDir { .. }
                | ConvertError::MissingXacro { .. }
        )
    }
}
