use anyhow::Context;
use clap::Parser;
use core::time::Duration;
use std::path::PathBuf;
use std::process::ExitCode;
use xacro2unity::{ConversionReport, ConvertError, Converter};

#[derive(Parser, Debug)]
#[command(name = "xacro2unity")]
#[command(
    about = "Convert a xacro file to URDF and prepare files for Unity",
    long_about = None
)]
#[command(version)]
struct Args {
    /// Path to the folder containing the 'urdf' folder
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Expander to run (default: ./xacro.py if present, else `xacro` on PATH)
    #[arg(long = "expander", value_name = "FILE")]
    expander: Option<PathBuf>,

    /// Python interpreter for .py expanders
    #[arg(long = "python", value_name = "EXE")]
    python: Option<PathBuf>,

    /// Seconds to wait for the expander, 0 waits forever
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 300)]
    timeout: u64,

    /// Quiet operation, suppress warnings
    #[arg(short = 'q', conflicts_with = "verbose")]
    quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Set verbosity level explicitly (0-4)
    #[arg(
        long = "verbosity",
        value_name = "LEVEL",
        conflicts_with = "verbose",
        conflicts_with = "quiet"
    )]
    verbosity_level: Option<u8>,
}

impl Args {
    fn get_verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else if let Some(level) = self.verbosity_level {
            level.min(4)
        } else {
            1 + self.verbose.min(3)
        }
    }

    fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    fn converter(&self) -> Converter {
        let mut builder = Converter::builder().with_timeout(self.timeout());
        if let Some(expander) = &self.expander {
            builder = builder.with_expander(expander);
        }
        if let Some(python) = &self.python {
            builder = builder.with_interpreter(python);
        }
        builder.build()
    }
}

fn init_logging(verbosity: u8) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    Builder::new().filter_level(level).init();
}

fn run(args: &Args) -> anyhow::Result<ConversionReport> {
    args.converter()
        .run(&args.path)
        .with_context(|| format!("Failed to convert '{}'", args.path.display()))
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.get_verbosity());

    match run(&args) {
        Ok(report) => {
            println!(
                "Success. Files are ready in '{}'.",
                report.output_dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<ConvertError>()
                .map_or(1, ConvertError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
