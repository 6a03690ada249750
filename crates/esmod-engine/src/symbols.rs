//! Global symbol index
//!
//! Phase 1 inserts every file's extracted exports here; phase 2 reads the
//! finished index through a shared reference and never mutates it. Each
//! identifier has exactly one owner after arbitration: a source-anchored
//! file always beats an example-anchored one, while same-category
//! collisions keep the incumbent and surface an error-level diagnostic for
//! human resolution, so the outcome does not depend on traversal order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use esmod_core::{Diagnostic, DiagnosticCollector, DiagnosticKind};

use crate::router::normalized;

/// Immutable symbol → owner and owner → exports mapping
#[derive(Debug, Default, Clone)]
pub struct SymbolIndex {
    owners: BTreeMap<String, PathBuf>,
    exports: BTreeMap<PathBuf, Vec<String>>,
}

impl SymbolIndex {
    /// The file owning an exported identifier
    pub fn owner(&self, symbol: &str) -> Option<&Path> {
        self.owners.get(symbol).map(PathBuf::as_path)
    }

    /// The export list recorded for a file in phase 1
    pub fn exports_of(&self, file: &Path) -> Option<&[String]> {
        self.exports.get(file).map(Vec::as_slice)
    }

    /// Whether the index attributes `symbol` back to `file` itself
    pub fn is_owned_by(&self, symbol: &str, file: &Path) -> bool {
        self.owner(symbol) == Some(file)
    }

    /// Every known identifier, in sorted order
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.owners.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Phase-1 builder applying conflict arbitration on insertion
pub struct SymbolIndexBuilder {
    index: SymbolIndex,
    source_markers: Vec<String>,
}

impl SymbolIndexBuilder {
    pub fn new(source_markers: &[String]) -> Self {
        Self {
            index: SymbolIndex::default(),
            source_markers: source_markers.to_vec(),
        }
    }

    fn is_source(&self, file: &Path) -> bool {
        let path = normalized(file);
        self.source_markers.iter().any(|m| path.contains(m.as_str()))
    }

    /// Record one file's exports, arbitrating against previous owners
    pub fn insert_file(
        &mut self,
        file: &Path,
        exported: &[String],
        diagnostics: &mut DiagnosticCollector,
    ) {
        for symbol in exported {
            let incumbent = match self.index.owners.get(symbol) {
                Some(owner) => owner.clone(),
                None => {
                    self.index
                        .owners
                        .insert(symbol.clone(), file.to_path_buf());
                    continue;
                }
            };

            if incumbent == *file {
                continue;
            }

            let incumbent_is_source = self.is_source(&incumbent);
            let candidate_is_source = self.is_source(file);

            match (incumbent_is_source, candidate_is_source) {
                (true, true) => {
                    // Ambiguous; a human must decide which source file owns it.
                    diagnostics.add(
                        Diagnostic::error(
                            DiagnosticKind::ExportConflict,
                            format!(
                                "'{}' in source {} is already exported by source {}; which one is the right exporter?",
                                symbol,
                                base_name(file),
                                base_name(&incumbent)
                            ),
                        )
                        .with_file(file),
                    );
                }
                (true, false) => {
                    diagnostics.add(
                        Diagnostic::warning(
                            DiagnosticKind::ExportConflict,
                            format!(
                                "'{}' in example {} is already exported by source {}; ignoring the example export",
                                symbol,
                                base_name(file),
                                base_name(&incumbent)
                            ),
                        )
                        .with_file(file),
                    );
                }
                (false, true) => {
                    self.index
                        .owners
                        .insert(symbol.clone(), file.to_path_buf());
                    diagnostics.add(
                        Diagnostic::warning(
                            DiagnosticKind::ExportConflict,
                            format!(
                                "'{}' in source {} was exported by example {}; replacing with the source file",
                                symbol,
                                base_name(file),
                                base_name(&incumbent)
                            ),
                        )
                        .with_file(file),
                    );
                }
                (false, false) => {
                    diagnostics.add(
                        Diagnostic::error(
                            DiagnosticKind::ExportConflict,
                            format!(
                                "'{}' in example {} is already exported by example {}; which one is the right exporter?",
                                symbol,
                                base_name(file),
                                base_name(&incumbent)
                            ),
                        )
                        .with_file(file),
                    );
                }
            }
        }

        // The reverse table keeps every file's own export list even when it
        // lost arbitration, so replacement rules still see it.
        self.index
            .exports
            .insert(file.to_path_buf(), exported.to_vec());
    }

    pub fn finish(self) -> SymbolIndex {
        self.index
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use esmod_core::Severity;

    fn builder() -> SymbolIndexBuilder {
        SymbolIndexBuilder::new(&["sources/".to_string(), "src/".to_string()])
    }

    #[test]
    fn single_ownership_after_insertion() {
        let mut diagnostics = DiagnosticCollector::new();
        let mut builder = builder();
        builder.insert_file(
            Path::new("lib/sources/math/Vector3.js"),
            &["Vector3".to_string()],
            &mut diagnostics,
        );
        let index = builder.finish();

        assert_eq!(
            index.owner("Vector3"),
            Some(Path::new("lib/sources/math/Vector3.js"))
        );
        assert_eq!(index.len(), 1);
        assert!(diagnostics.diagnostics().is_empty());
    }

    #[test]
    fn source_beats_example_in_either_order() {
        let source = Path::new("lib/sources/loaders/Loader.js");
        let example = Path::new("lib/examples/js/loaders/Loader.js");
        let symbol = vec!["Loader".to_string()];

        let mut diagnostics = DiagnosticCollector::new();
        let mut first = builder();
        first.insert_file(source, &symbol, &mut diagnostics);
        first.insert_file(example, &symbol, &mut diagnostics);
        assert_eq!(first.finish().owner("Loader"), Some(source));

        let mut second = builder();
        second.insert_file(example, &symbol, &mut diagnostics);
        second.insert_file(source, &symbol, &mut diagnostics);
        assert_eq!(second.finish().owner("Loader"), Some(source));

        assert_eq!(diagnostics.warning_count(), 2);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn same_category_conflict_keeps_incumbent_and_reports() {
        let first = Path::new("lib/sources/a/Baz.js");
        let second = Path::new("lib/sources/b/Baz.js");
        let symbol = vec!["Baz".to_string()];

        let mut diagnostics = DiagnosticCollector::new();
        let mut builder = builder();
        builder.insert_file(first, &symbol, &mut diagnostics);
        builder.insert_file(second, &symbol, &mut diagnostics);
        let index = builder.finish();

        assert_eq!(index.owner("Baz"), Some(first));
        let conflict = diagnostics
            .of_kind(DiagnosticKind::ExportConflict)
            .next()
            .unwrap();
        assert_eq!(conflict.severity, Severity::Error);
    }

    #[test]
    fn reverse_table_records_losing_file_exports() {
        let source = Path::new("lib/sources/Foo.js");
        let example = Path::new("lib/examples/js/Foo.js");
        let symbol = vec!["Foo".to_string()];

        let mut diagnostics = DiagnosticCollector::new();
        let mut builder = builder();
        builder.insert_file(source, &symbol, &mut diagnostics);
        builder.insert_file(example, &symbol, &mut diagnostics);
        let index = builder.finish();

        assert_eq!(index.exports_of(example), Some(symbol.as_slice()));
        assert_eq!(index.exports_of(source), Some(symbol.as_slice()));
    }
}
