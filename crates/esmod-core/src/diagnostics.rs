//! Structured diagnostics for conversion runs
//!
//! The engine never prints directly; every noteworthy condition is recorded
//! as a [`Diagnostic`] so callers decide on fatal-vs-continue policy. Each
//! diagnostic is also mirrored to the `log` facade at the level matching its
//! severity.

use std::fmt;
use std::path::PathBuf;

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Two files define the same exported identifier
    ExportConflict,
    /// A scanned usage names a symbol no file owns
    UnresolvedImport,
    /// No anchor fragment was found in a file's directory
    MissingAnchor,
    /// The file uses an idiom (AMD) the engine cannot convert
    UnconvertibleModule,
    /// No export could be extracted; the file name was used instead
    ExportFallback,
    /// An input path passed to discovery does not exist
    MissingInput,
    /// A file matched an exclude pattern and was skipped
    ExcludedFile,
    /// Per-file processing was aborted
    FileAborted,
}

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

/// One structured diagnostic record: kind, severity, file, message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub file: Option<PathBuf>,
    pub message: String,
}

impl Diagnostic {
    pub fn new<S: Into<String>>(kind: DiagnosticKind, severity: Severity, message: S) -> Self {
        Self {
            kind,
            severity,
            file: None,
            message: message.into(),
        }
    }

    /// Create an info diagnostic
    pub fn info<S: Into<String>>(kind: DiagnosticKind, message: S) -> Self {
        Self::new(kind, Severity::Info, message)
    }

    /// Create a warning diagnostic
    pub fn warning<S: Into<String>>(kind: DiagnosticKind, message: S) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    /// Create an error diagnostic
    pub fn error<S: Into<String>>(kind: DiagnosticKind, message: S) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    /// Create a fatal diagnostic (the affected unit could not be processed)
    pub fn fatal<S: Into<String>>(kind: DiagnosticKind, message: S) -> Self {
        Self::new(kind, Severity::Fatal, message)
    }

    /// Attach the file the diagnostic concerns
    pub fn with_file<P: Into<PathBuf>>(mut self, file: P) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(file) = &self.file {
            write!(f, " ({})", file.display())?;
        }
        Ok(())
    }
}

/// Collector gathering every diagnostic emitted during a run
#[derive(Debug, Default, Clone)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and mirror it to the log facade
    pub fn add(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => log::info!("{}", diagnostic),
            Severity::Warning => log::warn!("{}", diagnostic),
            Severity::Error | Severity::Fatal => log::error!("{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    /// Get all diagnostics recorded so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Check whether any error- or fatal-level diagnostic was recorded
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity >= Severity::Error)
    }

    /// Number of warning-level diagnostics
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Number of error- and fatal-level diagnostics
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity >= Severity::Error)
            .count()
    }

    /// Diagnostics of one kind, in emission order
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// Consume the collector, returning the recorded diagnostics
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_counts_by_severity() {
        let mut collector = DiagnosticCollector::new();
        collector.add(Diagnostic::warning(
            DiagnosticKind::ExportFallback,
            "no exports found",
        ));
        collector.add(Diagnostic::error(
            DiagnosticKind::ExportConflict,
            "two sources define Foo",
        ));
        collector.add(Diagnostic::fatal(
            DiagnosticKind::FileAborted,
            "wrapper close not recognized",
        ));

        assert_eq!(collector.warning_count(), 1);
        assert_eq!(collector.error_count(), 2);
        assert!(collector.has_errors());
        assert_eq!(
            collector.of_kind(DiagnosticKind::ExportConflict).count(),
            1
        );
    }

    #[test]
    fn display_includes_file() {
        let diagnostic = Diagnostic::warning(DiagnosticKind::UnresolvedImport, "missing Bar")
            .with_file("sources/cameras/Camera.js");
        let rendered = diagnostic.to_string();
        assert!(rendered.starts_with("warning: missing Bar"));
        assert!(rendered.contains("Camera.js"));
    }
}
