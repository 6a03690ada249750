//! Shared foundation types for the esmod conversion toolchain.

pub mod diagnostics;
pub mod error;
pub mod fs;
pub mod testing;

pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind, Severity};
pub use error::{ConvertError, Result};
pub use fs::{DiskFs, FileAccess};
