//! Report output.

pub mod writer;

pub use writer::{ReportWriter, DEFAULT_FILE_PREFIX, DEFAULT_OUTPUT_DIR};
