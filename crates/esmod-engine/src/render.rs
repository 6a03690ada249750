//! Import and export block rendering
//!
//! Emits the declarative header and footer around a transformed body. One
//! grouped import clause is rendered per distinct source path; groups are
//! ordered by path so identical runs produce byte-identical output. Single
//! symbol clauses stay inline, multi-symbol clauses render one identifier
//! per line.

use std::collections::BTreeMap;
use std::path::Path;

use esmod_core::{Diagnostic, DiagnosticCollector, DiagnosticKind};

use crate::router::{import_specific_path, normalized, relative_import_path};
use crate::symbols::SymbolIndex;

/// Render the import block of a file. Symbols without an owner in the index
/// are dropped with a diagnostic; they need manual edge-case follow-up.
pub fn format_import_block(
    importer: &Path,
    imports: &[String],
    index: &SymbolIndex,
    import_anchors: &[String],
    diagnostics: &mut DiagnosticCollector,
) -> String {
    let importer_specific = match import_specific_path(importer, import_anchors) {
        Some(specific) => specific,
        None => {
            diagnostics.add(
                Diagnostic::warning(
                    DiagnosticKind::MissingAnchor,
                    format!(
                        "no import anchor found in {}; treating it as output root",
                        importer.display()
                    ),
                )
                .with_file(importer),
            );
            file_name(importer)
        }
    };

    let mut groups: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for symbol in imports {
        let Some(owner) = index.owner(symbol) else {
            diagnostics.add(
                Diagnostic::warning(
                    DiagnosticKind::UnresolvedImport,
                    format!(
                        "missing export statement for '{}' in {}; this edge case will need to be managed manually",
                        symbol, importer_specific
                    ),
                )
                .with_file(importer),
            );
            continue;
        };
        let owner_specific = match import_specific_path(owner, import_anchors) {
            Some(specific) => specific,
            None => {
                diagnostics.add(
                    Diagnostic::warning(
                        DiagnosticKind::MissingAnchor,
                        format!("no import anchor found in {}", owner.display()),
                    )
                    .with_file(owner),
                );
                normalized(owner)
            }
        };
        let relative = relative_import_path(&importer_specific, &owner_specific);
        groups.entry(relative).or_default().push(symbol);
    }

    let mut clauses = Vec::new();
    for (path, symbols) in &groups {
        let mut clause = String::from("import {");
        if symbols.len() == 1 {
            clause.push(' ');
            clause.push_str(symbols[0]);
            clause.push(' ');
        } else {
            clause.push('\n');
            for (i, symbol) in symbols.iter().enumerate() {
                clause.push('\t');
                clause.push_str(symbol);
                if i + 1 < symbols.len() {
                    clause.push(',');
                }
                clause.push('\n');
            }
        }
        clause.push_str(&format!("}} from '{}'", path));
        clauses.push(clause);
    }

    let mut block = clauses.join("\n");
    block.push_str("\n\n");
    block
}

/// Render the export block of a file. An empty list falls back to the file's
/// base name with a diagnostic. Callers emitting a passthrough update omit
/// the block instead of calling this.
pub fn format_export_block(
    file: &Path,
    exports: &[String],
    diagnostics: &mut DiagnosticCollector,
) -> String {
    let mut block = String::from("\nexport {");
    if exports.is_empty() {
        diagnostics.add(
            Diagnostic::warning(
                DiagnosticKind::ExportFallback,
                format!(
                    "{} carries no explicit or implicit export; falling back to the file name",
                    file_name(file)
                ),
            )
            .with_file(file),
        );
        block.push(' ');
        block.push_str(&file_stem(file));
        block.push(' ');
    } else if exports.len() == 1 {
        block.push(' ');
        block.push_str(&exports[0]);
        block.push(' ');
    } else {
        block.push('\n');
        for (i, export) in exports.iter().enumerate() {
            block.push('\t');
            block.push_str(export);
            if i + 1 < exports.len() {
                block.push(',');
            }
            block.push('\n');
        }
    }
    block.push_str("}\n");
    block
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolIndexBuilder;

    fn index() -> SymbolIndex {
        let mut diagnostics = DiagnosticCollector::new();
        let mut builder = SymbolIndexBuilder::new(&["sources/".to_string()]);
        builder.insert_file(
            Path::new("lib/sources/b.js"),
            &["Bar".to_string()],
            &mut diagnostics,
        );
        builder.insert_file(
            Path::new("lib/sources/constants.js"),
            &["REVISION".to_string()],
            &mut diagnostics,
        );
        builder.insert_file(
            Path::new("lib/sources/math/Vector3.js"),
            &["Vector3".to_string(), "Vector3Helper".to_string()],
            &mut diagnostics,
        );
        builder.finish()
    }

    fn anchors() -> Vec<String> {
        vec!["sources".to_string()]
    }

    #[test]
    fn single_symbol_clause_is_inline() {
        let mut diagnostics = DiagnosticCollector::new();
        let block = format_import_block(
            Path::new("lib/sources/Foo.js"),
            &["Bar".to_string()],
            &index(),
            &anchors(),
            &mut diagnostics,
        );
        assert_eq!(block, "import { Bar } from './b.js'\n\n");
    }

    #[test]
    fn multi_symbol_clause_is_one_per_line() {
        let mut diagnostics = DiagnosticCollector::new();
        let block = format_import_block(
            Path::new("lib/sources/Foo.js"),
            &["Vector3".to_string(), "Vector3Helper".to_string()],
            &index(),
            &anchors(),
            &mut diagnostics,
        );
        assert_eq!(
            block,
            "import {\n\tVector3,\n\tVector3Helper\n} from './math/Vector3.js'\n\n"
        );
    }

    #[test]
    fn groups_are_ordered_by_path() {
        let mut diagnostics = DiagnosticCollector::new();
        let block = format_import_block(
            Path::new("lib/sources/renderers/Renderer.js"),
            &["Vector3".to_string(), "Bar".to_string()],
            &index(),
            &anchors(),
            &mut diagnostics,
        );
        let bar_at = block.find("'../b.js'").unwrap();
        let vector_at = block.find("'../math/Vector3.js'").unwrap();
        assert!(bar_at < vector_at);
    }

    #[test]
    fn unresolved_imports_are_dropped_with_diagnostic() {
        let mut diagnostics = DiagnosticCollector::new();
        let block = format_import_block(
            Path::new("lib/sources/Foo.js"),
            &["Ghost".to_string(), "Bar".to_string()],
            &index(),
            &anchors(),
            &mut diagnostics,
        );
        assert!(!block.contains("Ghost"));
        assert!(block.contains("Bar"));
        assert_eq!(
            diagnostics.of_kind(DiagnosticKind::UnresolvedImport).count(),
            1
        );
    }

    #[test]
    fn empty_import_list_renders_blank_header() {
        let mut diagnostics = DiagnosticCollector::new();
        let block = format_import_block(
            Path::new("lib/sources/Foo.js"),
            &[],
            &index(),
            &anchors(),
            &mut diagnostics,
        );
        assert_eq!(block, "\n\n");
    }

    #[test]
    fn single_export_block_form() {
        let mut diagnostics = DiagnosticCollector::new();
        let block = format_export_block(
            Path::new("lib/sources/Foo.js"),
            &["Foo".to_string()],
            &mut diagnostics,
        );
        assert_eq!(block, "\nexport { Foo }\n");
    }

    #[test]
    fn multi_export_block_form() {
        let mut diagnostics = DiagnosticCollector::new();
        let block = format_export_block(
            Path::new("lib/sources/Foo.js"),
            &["Foo".to_string(), "Bar".to_string()],
            &mut diagnostics,
        );
        assert_eq!(block, "\nexport {\n\tFoo,\n\tBar\n}\n");
    }

    #[test]
    fn empty_export_list_falls_back_to_file_name() {
        let mut diagnostics = DiagnosticCollector::new();
        let block = format_export_block(Path::new("lib/sources/Foo.js"), &[], &mut diagnostics);
        assert_eq!(block, "\nexport { Foo }\n");
        assert_eq!(diagnostics.of_kind(DiagnosticKind::ExportFallback).count(), 1);
    }
}
