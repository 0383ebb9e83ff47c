//! Running the external xacro expander

use crate::{
    compat::{self, ShimOutcome},
    error::ConvertError,
};
use core::time::Duration;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus},
    thread,
    time::Instant,
};

/// Where the standalone `xacro.py` script is published
pub const XACRO_SCRIPT_URL: &str =
    "https://raw.githubusercontent.com/doctorsrn/xacro2urdf/master/xacro.py";

/// Script name looked up in the package root when no expander is given
pub const DEFAULT_SCRIPT_NAME: &str = "xacro.py";

/// Executable looked up on `PATH` as a last resort
pub const DEFAULT_BINARY: &str = "xacro";

pub const DEFAULT_INTERPRETER: &str = "python3";

/// Default upper bound on a single expansion
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// The program that turns xacro into URDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expander {
    /// A native executable called as `<bin> -o <out> <in>`
    Binary(PathBuf),
    /// A Python script called as `<interpreter> <script> -o <out> <in>`
    PythonScript {
        interpreter: PathBuf,
        script: PathBuf,
    },
}

impl Default for Expander {
    fn default() -> Self {
        Expander::Binary(PathBuf::from(DEFAULT_BINARY))
    }
}

impl Expander {
    /// Pick the expander for a package rooted at `root`.
    ///
    /// An explicit path wins (`.py` files run through `interpreter`). Without
    /// one, a `xacro.py` in the root is used, then `xacro` from `PATH`.
    ///
    /// The expander runs from the package root, so relative paths given by
    /// the caller are anchored to the caller's working directory first.
    pub fn resolve(
        root: &Path,
        explicit: Option<&Path>,
        interpreter: Option<&Path>,
    ) -> Self {
        let interpreter = interpreter
            .map(|path| anchor_to_cwd(path, false))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INTERPRETER));

        match explicit {
            Some(path) if is_python_script(path) => Expander::PythonScript {
                interpreter,
                script: anchor_to_cwd(path, true),
            },
            Some(path) => Expander::Binary(anchor_to_cwd(path, false)),
            None => {
                let script = root.join(DEFAULT_SCRIPT_NAME);
                if script.is_file() {
                    Expander::PythonScript {
                        interpreter,
                        script,
                    }
                } else {
                    Expander::default()
                }
            }
        }
    }

    /// Human-readable name used in logs and errors
    pub fn program_name(&self) -> String {
        match self {
            Expander::Binary(bin) => bin.display().to_string(),
            Expander::PythonScript { script, .. } => script.display().to_string(),
        }
    }

    /// Make sure the expander can be used, patching Python scripts if needed.
    ///
    /// Returns `None` for native binaries, which are never patched.
    pub fn prepare(&self) -> Result<Option<ShimOutcome>, ConvertError> {
        match self {
            Expander::Binary(_) => Ok(None),
            Expander::PythonScript { script, .. } => {
                if !script.is_file() {
                    return Err(ConvertError::MissingExpander {
                        path: script.clone(),
                        url: XACRO_SCRIPT_URL,
                    });
                }
                compat::patch_expander_source(script).map(Some)
            }
        }
    }

    fn command(
        &self,
        input: &Path,
        output: &Path,
        working_dir: Option<&Path>,
    ) -> Command {
        let mut cmd = match self {
            Expander::Binary(bin) => Command::new(bin),
            Expander::PythonScript {
                interpreter,
                script,
            } => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(script);
                cmd
            }
        };
        cmd.arg("-o").arg(output).arg(input);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

fn is_python_script(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}

/// Runs an [`Expander`] with an optional wall-clock limit
#[derive(Debug, Clone)]
pub struct ExpansionInvoker {
    expander: Expander,
    timeout: Option<Duration>,
    working_dir: Option<PathBuf>,
}

impl ExpansionInvoker {
    pub fn new(
        expander: Expander,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            expander,
            timeout,
            working_dir: None,
        }
    }

    /// Run the expander from `dir` instead of the caller's working directory.
    ///
    /// Expanders resolve `$(find ...)` and relative includes from their own
    /// working directory, so the pipeline runs them from the package root.
    pub fn with_working_dir(
        mut self,
        dir: impl Into<PathBuf>,
    ) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn expander(&self) -> &Expander {
        &self.expander
    }

    /// Expand `input` into `output`, blocking until the expander exits.
    ///
    /// A non-zero exit status is an error. When the timeout elapses the child
    /// is killed and reaped before [`ConvertError::ExpansionTimeout`] is returned.
    pub fn run(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<(), ConvertError> {
        let mut cmd = self
            .expander
            .command(input, output, self.working_dir.as_deref());
        let program = self.expander.program_name();
        log::debug!("Running {:?}", command_line(&cmd));

        let mut child = cmd
            .spawn()
            .map_err(|source| ConvertError::ExpanderSpawn {
                program: program.clone(),
                source,
            })?;

        let status = match self.timeout {
            Some(limit) => wait_with_timeout(&mut child, limit, &program)?,
            None => child
                .wait()
                .map_err(|source| ConvertError::ExpanderWait {
                    program: program.clone(),
                    source,
                })?,
        };

        if status.success() {
            Ok(())
        } else {
            Err(ConvertError::ExpansionFailed { program, status })
        }
    }
}

// Bare program names stay as they are for the `PATH` lookup unless `always`
fn anchor_to_cwd(
    path: &Path,
    always: bool,
) -> PathBuf {
    let bare = path.components().count() == 1;
    if path.is_absolute() || (bare && !always) {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            log::debug!("keeping '{}' relative: {}", path.display(), e);
            path.to_path_buf()
        }
    }
}

fn wait_with_timeout(
    child: &mut Child,
    limit: Duration,
    program: &str,
) -> Result<ExitStatus, ConvertError> {
    let started = Instant::now();
    loop {
        let polled = child
            .try_wait()
            .map_err(|source| ConvertError::ExpanderWait {
                program: program.to_string(),
                source,
            })?;
        if let Some(status) = polled {
            return Ok(status);
        }
        if started.elapsed() >= limit {
            log::warn!("{} exceeded {:?}, killing it", program, limit);
            // The child may exit between the poll and the kill
            if let Err(e) = child.kill() {
                log::debug!("kill failed: {}", e);
            }
            if let Err(e) = child.wait() {
                log::debug!("reaping {} failed: {}", program, e);
            }
            return Err(ConvertError::ExpansionTimeout {
                program: program.to_string(),
                timeout: limit,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn command_line(cmd: &Command) -> Vec<OsString> {
    core::iter::once(cmd.get_program().to_os_string())
        .chain(cmd.get_args().map(|arg| arg.to_os_string()))
        .collect()
}
