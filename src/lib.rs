#![forbid(unsafe_code)]
// #![warn(clippy::pedantic)]
#![warn(clippy::alloc_instead_of_core)]
#![warn(clippy::std_instead_of_core)]

pub mod assemble;
pub mod compat;
pub mod context;
pub mod error;
pub mod expander;
pub mod mesh;
pub mod pipeline;
pub mod preprocess;
pub mod rewrite;
pub mod utils;

pub use context::WorkingContext;
pub use error::ConvertError;
pub use expander::{Expander, ExpansionInvoker};
pub use pipeline::{ConversionReport, Converter, ConverterBuilder};

/// Convert the description package at `root` with default settings
pub fn convert<P: AsRef<std::path::Path>>(root: P) -> Result<ConversionReport, ConvertError> {
    Converter::new().run(root.as_ref())
}
