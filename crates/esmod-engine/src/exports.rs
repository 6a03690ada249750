//! Export extraction
//!
//! Derives the identifiers a file makes externally visible, with one
//! extraction rule per authoring style. The result is never empty: when no
//! idiom yields a name the file's base name is used and a warning is
//! recorded. AMD files cannot be converted automatically; they export their
//! base name and are flagged for manual follow-up.

use std::path::Path;

use esmod_core::{Diagnostic, DiagnosticCollector, DiagnosticKind};
use regex::Regex;

use crate::classify::FileStyle;

/// Exports recovered from one file
#[derive(Debug, Clone)]
pub struct ExtractedExports {
    pub symbols: Vec<String>,
    /// `false` for AMD files, which need manual conversion
    pub convertible: bool,
}

/// Compiled extraction patterns for one namespace identifier
pub struct ExportExtractor {
    namespace: String,
    declarative_clause: Regex,
    alias: Regex,
    declarative_noise: Regex,
    commonjs_clause: Regex,
    commonjs_noise: Regex,
    assignment_clause: Regex,
    assignment_tail: Regex,
    prototype_clause: Regex,
    prototype_head: Regex,
    object_clause: Regex,
    whitespace: Regex,
}

impl ExportExtractor {
    pub fn new(namespace: &str) -> Self {
        let ns = regex::escape(namespace);
        Self {
            namespace: namespace.to_string(),
            declarative_clause: Regex::new(r"export[{\r\n\s]+(\w+[,\r\n\s]*)+\}?(\s*from)?")
                .unwrap(),
            alias: Regex::new(r"\w+\sas").unwrap(),
            declarative_noise: Regex::new(r"[\s\n\r;{}]+").unwrap(),
            commonjs_clause: Regex::new(r"module\.exports\s*=\s*\{?[^}]*\}?").unwrap(),
            commonjs_noise: Regex::new(r"[\s\n\r;{}=]+").unwrap(),
            assignment_clause: Regex::new(&format!(r"({ns}\.(\w+)\s*=\s*)+\s*function")).unwrap(),
            assignment_tail: Regex::new(r"\s*=\s*function").unwrap(),
            prototype_clause: Regex::new(&format!(r"prototype\.constructor\s?=\s?({ns}\.)?(\w)+"))
                .unwrap(),
            prototype_head: Regex::new(r"prototype\.constructor\s?=\s?").unwrap(),
            object_clause: Regex::new(&format!(r"{ns}\.(\w+) = \{{")).unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Extract the exports of a file given its style tag, on the
    /// comment-stripped text
    pub fn extract(
        &self,
        file: &Path,
        style: FileStyle,
        stripped: &str,
        diagnostics: &mut DiagnosticCollector,
    ) -> ExtractedExports {
        let symbols = match style {
            FileStyle::Declarative => self.declarative_exports(stripped),
            FileStyle::Amd => {
                diagnostics.add(
                    Diagnostic::warning(
                        DiagnosticKind::UnconvertibleModule,
                        format!(
                            "{} is an AMD module and cannot be converted automatically",
                            base_name(file)
                        ),
                    )
                    .with_file(file),
                );
                return ExtractedExports {
                    symbols: vec![file_stem(file)],
                    convertible: false,
                };
            }
            FileStyle::CommonJs => self.commonjs_exports(stripped),
            FileStyle::NamespaceAssignment => self.assignment_exports(stripped),
            FileStyle::Prototype => self.prototype_exports(stripped),
            FileStyle::NamespaceObject => self.object_exports(stripped),
            FileStyle::Unknown => Vec::new(),
        };

        if symbols.is_empty() {
            diagnostics.add(
                Diagnostic::warning(
                    DiagnosticKind::ExportFallback,
                    format!(
                        "{} carries no explicit or implicit export; falling back to the file name",
                        base_name(file)
                    ),
                )
                .with_file(file),
            );
            return ExtractedExports {
                symbols: vec![file_stem(file)],
                convertible: true,
            };
        }

        ExtractedExports {
            symbols,
            convertible: true,
        }
    }

    /// Parse `export { ... }` clauses, dropping re-export-from clauses and
    /// `as`-aliases, stripping `var`/`function` qualifiers
    fn declarative_exports(&self, stripped: &str) -> Vec<String> {
        let mut symbols = Vec::new();
        for clause in self.declarative_clause.find_iter(stripped) {
            let clause = clause.as_str();
            if clause.contains("from") {
                continue;
            }
            let clause = self.alias.replace_all(clause, "");
            let clause = clause.replace("var", "").replace("function", "");
            let clause = clause.replace("export", "");
            let clause = self.declarative_noise.replace_all(&clause, "");
            push_split(&mut symbols, &clause, ',');
        }
        symbols
    }

    /// Split the `module.exports = { ... }` target list
    fn commonjs_exports(&self, stripped: &str) -> Vec<String> {
        let mut symbols = Vec::new();
        for clause in self.commonjs_clause.find_iter(stripped) {
            let clause = clause.as_str().replace("module.exports", "");
            let clause = self.commonjs_noise.replace_all(&clause, "");
            push_split(&mut symbols, &clause, ',');
        }
        symbols
    }

    /// Split chained `NS.A = NS.B = function` assignment targets
    fn assignment_exports(&self, stripped: &str) -> Vec<String> {
        let prefix = format!("{}.", self.namespace);
        let mut symbols = Vec::new();
        for clause in self.assignment_clause.find_iter(stripped) {
            let clause = clause.as_str().replace(&prefix, "");
            let clause = self.assignment_tail.replace_all(&clause, "");
            let clause = self.whitespace.replace_all(&clause, "");
            push_split(&mut symbols, &clause, '=');
        }
        symbols
    }

    /// Read the constructor name from `prototype.constructor = NS.Name`
    fn prototype_exports(&self, stripped: &str) -> Vec<String> {
        let prefix = format!("{}.", self.namespace);
        let mut symbols = Vec::new();
        for clause in self.prototype_clause.find_iter(stripped) {
            let name = self.prototype_head.replace(clause.as_str(), "");
            let name = name.replace(&prefix, "");
            if !name.is_empty() && !symbols.contains(&name) {
                symbols.push(name);
            }
        }
        symbols
    }

    /// Read the declared property name from `NS.Name = {`
    fn object_exports(&self, stripped: &str) -> Vec<String> {
        let mut symbols = Vec::new();
        for caps in self.object_clause.captures_iter(stripped) {
            let name = caps[1].to_string();
            if !symbols.contains(&name) {
                symbols.push(name);
            }
        }
        symbols
    }
}

fn push_split(symbols: &mut Vec<String>, joined: &str, separator: char) {
    for part in joined.split(separator) {
        if !part.is_empty() && !symbols.iter().any(|s| s == part) {
            symbols.push(part.to_string());
        }
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(style: FileStyle, text: &str) -> ExtractedExports {
        let extractor = ExportExtractor::new("THREE");
        let mut diagnostics = DiagnosticCollector::new();
        extractor.extract(Path::new("lib/sources/Test.js"), style, text, &mut diagnostics)
    }

    #[test]
    fn declarative_export_clause() {
        let found = extract(FileStyle::Declarative, "export { Foo, Bar }\n");
        assert_eq!(found.symbols, vec!["Foo", "Bar"]);
        assert!(found.convertible);
    }

    #[test]
    fn declarative_skips_reexport_and_aliases() {
        let text = "export { Foo as Renamed }\nexport { Gone } from './other.js'\n";
        let found = extract(FileStyle::Declarative, text);
        assert_eq!(found.symbols, vec!["Renamed"]);
    }

    #[test]
    fn chained_assignment_targets() {
        let text = "THREE.HDRLoader = THREE.RGBELoader = function ( manager ) {};";
        let found = extract(FileStyle::NamespaceAssignment, text);
        assert_eq!(found.symbols, vec!["HDRLoader", "RGBELoader"]);
    }

    #[test]
    fn prototype_constructor_name() {
        let text = "Foo.prototype.constructor = THREE.Foo;";
        let found = extract(FileStyle::Prototype, text);
        assert_eq!(found.symbols, vec!["Foo"]);
    }

    #[test]
    fn object_literal_name() {
        let found = extract(FileStyle::NamespaceObject, "THREE.ShaderChunk = {\n};");
        assert_eq!(found.symbols, vec!["ShaderChunk"]);
    }

    #[test]
    fn commonjs_target_list() {
        let found = extract(FileStyle::CommonJs, "module.exports = { Foo, Bar };");
        assert_eq!(found.symbols, vec!["Foo", "Bar"]);
    }

    #[test]
    fn amd_flags_unconvertible_with_base_name() {
        let extractor = ExportExtractor::new("THREE");
        let mut diagnostics = DiagnosticCollector::new();
        let found = extractor.extract(
            Path::new("lib/examples/js/Amd.js"),
            FileStyle::Amd,
            "define.amd",
            &mut diagnostics,
        );
        assert_eq!(found.symbols, vec!["Amd"]);
        assert!(!found.convertible);
        assert_eq!(
            diagnostics
                .of_kind(DiagnosticKind::UnconvertibleModule)
                .count(),
            1
        );
    }

    #[test]
    fn unknown_falls_back_to_file_name() {
        let extractor = ExportExtractor::new("THREE");
        let mut diagnostics = DiagnosticCollector::new();
        let found = extractor.extract(
            Path::new("lib/sources/Helpers.js"),
            FileStyle::Unknown,
            "var x = 1;",
            &mut diagnostics,
        );
        assert_eq!(found.symbols, vec!["Helpers"]);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::ExportFallback).count(), 1);
    }
}
