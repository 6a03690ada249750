//! Conversion orchestrator
//!
//! Drives the two-phase batch pipeline. Phase 1 reads, classifies and
//! extracts exports from every candidate file to build the complete symbol
//! index; phase 2 only starts afterwards, because resolving any file's
//! imports needs the whole table. Per file, phase 2 picks one of three
//! outcomes: convert (legacy style), passthrough-update (already
//! declarative, import paths still rewritten, no export block) or verbatim
//! copy (non-source asset). Non-fatal conditions are collected as
//! diagnostics and never halt the run; a file whose wrapper cannot be
//! stripped safely is aborted on its own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use esmod_core::{
    ConvertError, Diagnostic, DiagnosticCollector, DiagnosticKind, DiskFs, FileAccess, Result,
};

use crate::classify::{FileStyle, StylePatterns};
use crate::comments::CommentStripper;
use crate::config::ConverterConfig;
use crate::edge_cases::{apply_edge_case, origin_override_path};
use crate::exports::ExportExtractor;
use crate::render::{format_export_block, format_import_block};
use crate::replace::{Replacement, ReplacementGenerator};
use crate::router::{normalized, output_path};
use crate::symbols::{SymbolIndex, SymbolIndexBuilder};
use crate::usage::UsageScanner;

/// Per-file working result of phase 2, consumed immediately by rendering
#[derive(Debug)]
pub struct ConversionUnit {
    pub imports: Vec<String>,
    pub replacements: Vec<Replacement>,
    pub exports: Vec<String>,
    pub output: PathBuf,
}

/// Summary of one conversion run
#[derive(Debug, Default)]
pub struct RunReport {
    pub converted: usize,
    pub updated: usize,
    pub copied: usize,
    pub skipped: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity >= esmod_core::Severity::Error)
    }
}

/// Classification result for one file, as shown by `inspect`
#[derive(Debug, Clone)]
pub struct InspectEntry {
    pub path: PathBuf,
    pub style: FileStyle,
    pub exports: Vec<String>,
}

/// One discovered file with its derived texts, created at classification
/// time and read-only afterwards
struct FileRecord {
    path: PathBuf,
    input_path: PathBuf,
    style: FileStyle,
    raw: String,
    stripped: String,
}

/// The conversion engine, generic over the filesystem collaborator
pub struct Converter<F: FileAccess> {
    config: ConverterConfig,
    fs: F,
    stripper: CommentStripper,
    styles: StylePatterns,
    extractor: ExportExtractor,
    scanner: UsageScanner,
    generator: ReplacementGenerator,
}

impl Converter<DiskFs> {
    /// Engine over the real filesystem
    pub fn new(config: ConverterConfig) -> Result<Self> {
        Self::with_fs(config, DiskFs::new())
    }
}

impl<F: FileAccess> Converter<F> {
    /// Engine over an injected filesystem. Configuration is validated here,
    /// before any file is touched.
    pub fn with_fs(config: ConverterConfig, fs: F) -> Result<Self> {
        config.validate()?;
        let stripper = CommentStripper::new();
        let styles = StylePatterns::new(&config.namespace);
        let extractor = ExportExtractor::new(&config.namespace);
        let scanner = UsageScanner::new(&config.namespace, config.constants_symbol.as_deref());
        let generator = ReplacementGenerator::new(&config.namespace);
        Ok(Self {
            config,
            fs,
            stripper,
            styles,
            extractor,
            scanner,
            generator,
        })
    }

    /// Run the whole pipeline and report what happened
    pub fn run(&mut self) -> Result<RunReport> {
        let mut diagnostics = DiagnosticCollector::new();
        let mut report = RunReport::default();

        let discovered = self.discover(&mut diagnostics);
        let available = self.filter_excluded(discovered, &mut diagnostics, &mut report);

        // Phase 1: index every JS file, example trees included, since they
        // may define symbols other files consume.
        let (records, index) = self.build_index(&available, &mut diagnostics);

        // Phase 2: emission. The index is complete and read-only from here.
        for file in &available {
            if is_javascript(file) {
                let Some(record) = records.get(file) else {
                    report.skipped += 1;
                    continue;
                };
                match self.emit_module(record, &index, &mut diagnostics) {
                    Ok(()) => {
                        if record.style.is_declarative() {
                            log::info!("Update: {}", file.display());
                            report.updated += 1;
                        } else {
                            log::info!("Convert: {}", file.display());
                            report.converted += 1;
                        }
                    }
                    Err(error) => {
                        diagnostics.add(
                            Diagnostic::fatal(
                                DiagnosticKind::FileAborted,
                                format!("{}: {}", file.display(), error),
                            )
                            .with_file(file.clone()),
                        );
                        report.skipped += 1;
                    }
                }
            } else {
                match self.copy_verbatim(file) {
                    Ok(()) => {
                        log::info!("Copy: {}", file.display());
                        report.copied += 1;
                    }
                    Err(error) => {
                        diagnostics.add(
                            Diagnostic::fatal(
                                DiagnosticKind::FileAborted,
                                format!("{}: {}", file.display(), error),
                            )
                            .with_file(file.clone()),
                        );
                        report.skipped += 1;
                    }
                }
            }
        }

        report.diagnostics = diagnostics.into_diagnostics();
        Ok(report)
    }

    /// Classify the candidate set without emitting anything
    pub fn inspect(&mut self) -> Result<Vec<InspectEntry>> {
        let mut diagnostics = DiagnosticCollector::new();
        let mut report = RunReport::default();
        let discovered = self.discover(&mut diagnostics);
        let available = self.filter_excluded(discovered, &mut diagnostics, &mut report);
        let (records, index) = self.build_index(&available, &mut diagnostics);

        let mut entries = Vec::new();
        for (path, record) in &records {
            entries.push(InspectEntry {
                path: path.clone(),
                style: record.style,
                exports: index
                    .exports_of(path)
                    .map(<[String]>::to_vec)
                    .unwrap_or_default(),
            });
        }
        Ok(entries)
    }

    /// Render an import block naming every symbol in the index, relative to
    /// `importer`; diagnostic aid for manual edge-case work
    pub fn format_all_imports(&mut self, importer: &Path) -> Result<String> {
        let mut diagnostics = DiagnosticCollector::new();
        let mut report = RunReport::default();
        let discovered = self.discover(&mut diagnostics);
        let available = self.filter_excluded(discovered, &mut diagnostics, &mut report);
        let (_, index) = self.build_index(&available, &mut diagnostics);

        let symbols: Vec<String> = index.symbols().map(str::to_string).collect();
        Ok(format_import_block(
            importer,
            &symbols,
            &index,
            &self.config.anchors.import_anchors,
            &mut diagnostics,
        ))
    }

    /// Collect every file under the configured inputs, sorted and
    /// deduplicated so traversal order never influences a run
    fn discover(&self, diagnostics: &mut DiagnosticCollector) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for input in &self.config.inputs {
            if !self.fs.exists(input) {
                diagnostics.add(
                    Diagnostic::error(
                        DiagnosticKind::MissingInput,
                        format!("invalid input path {}", input.display()),
                    )
                    .with_file(input.clone()),
                );
                continue;
            }
            match self.fs.walk(input) {
                Ok(found) => files.extend(found),
                Err(error) => diagnostics.add(
                    Diagnostic::error(
                        DiagnosticKind::MissingInput,
                        format!("failed to traverse {}: {}", input.display(), error),
                    )
                    .with_file(input.clone()),
                ),
            }
        }
        files.sort();
        files.dedup();
        files
    }

    /// Exclude filtering happens before any classification
    fn filter_excluded(
        &self,
        files: Vec<PathBuf>,
        diagnostics: &mut DiagnosticCollector,
        report: &mut RunReport,
    ) -> Vec<PathBuf> {
        let mut available = Vec::new();
        for file in files {
            if self.is_excluded(&file) {
                diagnostics.add(
                    Diagnostic::info(
                        DiagnosticKind::ExcludedFile,
                        format!("exclude: {}", file.display()),
                    )
                    .with_file(file),
                );
                report.skipped += 1;
            } else {
                available.push(file);
            }
        }
        available
    }

    /// A pattern containing a dot must equal the file name; any other
    /// pattern matches as a path substring
    fn is_excluded(&self, file: &Path) -> bool {
        let path = normalized(file);
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.config.excludes.iter().any(|pattern| {
            if pattern.contains('.') {
                name == *pattern
            } else {
                path.contains(pattern.as_str())
            }
        })
    }

    /// Phase 1: read, classify and extract exports for every JS file
    fn build_index(
        &self,
        available: &[PathBuf],
        diagnostics: &mut DiagnosticCollector,
    ) -> (BTreeMap<PathBuf, FileRecord>, SymbolIndex) {
        let mut records = BTreeMap::new();
        let mut builder = SymbolIndexBuilder::new(&self.config.anchors.source_markers);

        for file in available {
            if !is_javascript(file) {
                continue;
            }
            let edge_case = self.edge_case_for(file);
            let input_path =
                origin_override_path(file, edge_case, self.config.origin_root.as_deref());
            let raw = match self.fs.read_text(&input_path) {
                Ok(raw) => raw,
                Err(error) => {
                    diagnostics.add(
                        Diagnostic::error(
                            DiagnosticKind::MissingInput,
                            format!("failed to read {}: {}", input_path.display(), error),
                        )
                        .with_file(file.clone()),
                    );
                    continue;
                }
            };
            let stripped = self.stripper.strip(&raw);
            let style = self.styles.classify(&stripped);
            let extracted = self.extractor.extract(file, style, &stripped, diagnostics);
            builder.insert_file(file, &extracted.symbols, diagnostics);
            records.insert(
                file.clone(),
                FileRecord {
                    path: file.clone(),
                    input_path,
                    style,
                    raw,
                    stripped,
                },
            );
        }

        (records, builder.finish())
    }

    /// Phase 2 for one JS file: scan usage, derive replacements, route the
    /// output, overlay the edge case and render. Nothing is written when an
    /// error surfaces.
    fn emit_module(
        &mut self,
        record: &FileRecord,
        index: &SymbolIndex,
        diagnostics: &mut DiagnosticCollector,
    ) -> Result<()> {
        let file = &record.path;
        let exports = index
            .exports_of(file)
            .ok_or_else(|| ConvertError::missing_exports(file))?
            .to_vec();

        let imports = self.scanner.scan(file, &record.stripped, index)?;
        let replacements = self.generator.rules(file, &record.stripped, &exports)?;

        let (output, anchored) = output_path(
            &record.input_path,
            &self.config.output,
            &self.config.anchors.route_anchors,
        );
        if !anchored {
            diagnostics.add(
                Diagnostic::warning(
                    DiagnosticKind::MissingAnchor,
                    format!(
                        "no route anchor found in {}; output location needs manual fixing",
                        record.input_path.display()
                    ),
                )
                .with_file(file.clone()),
            );
        }

        // A passthrough update keeps its declarative exports in place; the
        // rendered export list is empty and the block is omitted.
        let declarative = record.style.is_declarative();
        let mut unit = ConversionUnit {
            imports,
            replacements,
            exports: if declarative { Vec::new() } else { exports },
            output,
        };
        if let Some(edge_case) = self.edge_case_for(file) {
            apply_edge_case(&mut unit, edge_case)?;
        }

        let import_block = format_import_block(
            &record.input_path,
            &unit.imports,
            index,
            &self.config.anchors.import_anchors,
            diagnostics,
        );
        let body = self.generator.apply(&record.raw, &unit.replacements);
        let export_block = if declarative {
            String::new()
        } else {
            format_export_block(file, &unit.exports, diagnostics)
        };

        let rendered = format!("{}{}{}", import_block, body, export_block);
        if let Some(parent) = unit.output.parent() {
            self.fs.ensure_directory(parent)?;
        }
        self.fs.write_text(&unit.output, &rendered)?;
        Ok(())
    }

    /// Verbatim copy of a non-source asset to its routed location
    fn copy_verbatim(&mut self, file: &Path) -> Result<()> {
        let content = self.fs.read_text(file)?;
        let (output, _) = output_path(
            file,
            &self.config.output,
            &self.config.anchors.route_anchors,
        );
        if let Some(parent) = output.parent() {
            self.fs.ensure_directory(parent)?;
        }
        self.fs.write_text(&output, &content)?;
        Ok(())
    }

    fn edge_case_for(&self, file: &Path) -> Option<&crate::config::EdgeCase> {
        let base = file.file_stem()?.to_string_lossy().into_owned();
        self.config.edge_cases.get(&base)
    }

    /// The filesystem collaborator, mainly for tests to look at outputs
    pub fn fs(&self) -> &F {
        &self.fs
    }
}

fn is_javascript(file: &Path) -> bool {
    file.extension().map_or(false, |ext| ext == "js")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnchorConfig, EdgeCase, RouteAnchor};
    use esmod_core::testing::MemoryFs;
    use esmod_core::Severity;

    fn config() -> ConverterConfig {
        ConverterConfig {
            inputs: vec![PathBuf::from("lib/sources")],
            excludes: Vec::new(),
            output: PathBuf::from("out"),
            namespace: "THREE".to_string(),
            constants_symbol: Some("REVISION".to_string()),
            origin_root: None,
            anchors: AnchorConfig {
                source_markers: vec!["sources/".to_string()],
                route_anchors: vec![RouteAnchor::new("lib/sources", "")],
                import_anchors: vec!["sources".to_string()],
            },
            edge_cases: Default::default(),
        }
    }

    fn seeded_fs() -> MemoryFs {
        let mut fs = MemoryFs::new();
        fs.insert(
            "lib/sources/Foo.js",
            "THREE.Foo = function () {\n\tthis.bar = new THREE.Bar();\n\tthis.rev = THREE.REVISION;\n};\n",
        );
        fs.insert("lib/sources/b.js", "THREE.Bar = function () {};\n");
        fs.insert("lib/sources/constants.js", "export var REVISION = '86';\n");
        fs.insert("lib/sources/uniform.glsl", "void main() {}\n");
        fs
    }

    fn run(fs: MemoryFs, config: ConverterConfig) -> (RunReport, MemoryFs) {
        let mut converter = Converter::with_fs(config, fs).unwrap();
        let report = converter.run().unwrap();
        let fs = converter.fs().clone();
        (report, fs)
    }

    #[test]
    fn converts_a_legacy_file_end_to_end() {
        let (report, fs) = run(seeded_fs(), config());

        assert_eq!(report.converted, 2);
        assert_eq!(report.updated, 1);
        assert_eq!(report.copied, 1);

        let foo = fs.get(Path::new("out/Foo.js")).unwrap();
        assert_eq!(
            foo,
            "import { Bar } from './b.js'\nimport { REVISION } from './constants.js'\n\n\
             var Foo = function () {\n\tthis.bar = new Bar();\n\tthis.rev = REVISION;\n};\n\
             \nexport { Foo }\n"
        );
    }

    #[test]
    fn declarative_file_is_updated_without_export_block() {
        let (_, fs) = run(seeded_fs(), config());
        let constants = fs.get(Path::new("out/constants.js")).unwrap();
        assert_eq!(constants, "\n\nexport var REVISION = '86';\n");
    }

    #[test]
    fn non_source_assets_are_copied_verbatim() {
        let (_, fs) = run(seeded_fs(), config());
        let shader = fs.get(Path::new("out/uniform.glsl")).unwrap();
        assert_eq!(shader, "void main() {}\n");
    }

    #[test]
    fn reruns_are_byte_identical() {
        let (_, first) = run(seeded_fs(), config());
        let (_, second) = run(seeded_fs(), config());
        assert_eq!(first.paths(), second.paths());
        for path in first.paths() {
            assert_eq!(first.get(&path), second.get(&path), "{}", path.display());
        }
    }

    #[test]
    fn excluded_files_are_skipped_before_classification() {
        let mut config = config();
        config.excludes.push("b.js".to_string());
        let (report, fs) = run(seeded_fs(), config);

        assert!(fs.get(Path::new("out/b.js")).is_none());
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ExcludedFile));
        // Bar loses its owner, so Foo's reference surfaces as unresolved.
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnresolvedImport));
        let foo = fs.get(Path::new("out/Foo.js")).unwrap();
        assert!(!foo.contains("import { Bar }"));
    }

    #[test]
    fn same_category_conflict_keeps_first_owner_and_continues() {
        let mut fs = seeded_fs();
        fs.insert("lib/sources/BazA.js", "THREE.Baz = function () {};\n");
        fs.insert("lib/sources/BazB.js", "THREE.Baz = function () {};\n");
        let (report, fs) = run(fs, config());

        let conflicts: Vec<_> = report
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::ExportConflict)
            .collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].severity, Severity::Error);
        // Both files are still emitted; each declares Baz locally.
        assert!(fs.get(Path::new("out/BazA.js")).unwrap().contains("var Baz ="));
        assert!(fs.get(Path::new("out/BazB.js")).unwrap().contains("var Baz ="));
    }

    #[test]
    fn unrecognized_wrapper_aborts_only_that_file() {
        let mut fs = seeded_fs();
        fs.insert(
            "lib/sources/Weird.js",
            "( function () {\n\tTHREE.Weird = function () {};\n} ).call( this );\n",
        );
        let (report, fs) = run(fs, config());

        assert!(fs.get(Path::new("out/Weird.js")).is_none());
        assert!(fs.get(Path::new("out/Foo.js")).is_some());
        assert_eq!(report.skipped, 1);
        let aborted: Vec<_> = report
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::FileAborted)
            .collect();
        assert_eq!(aborted.len(), 1);
        assert_eq!(aborted[0].severity, Severity::Fatal);
    }

    #[test]
    fn missing_input_path_is_reported_not_fatal() {
        let mut config = config();
        config.inputs.push(PathBuf::from("lib/nowhere"));
        let (report, fs) = run(seeded_fs(), config);

        assert!(fs.get(Path::new("out/Foo.js")).is_some());
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::MissingInput));
    }

    #[test]
    fn edge_case_overlay_redirects_output_and_appends_exports() {
        let mut config = config();
        config.edge_cases.insert(
            "Foo".to_string(),
            EdgeCase {
                exports: vec!["FooHelper".to_string()],
                output: Some(PathBuf::from("out/extras/Foo.js")),
                ..EdgeCase::default()
            },
        );
        let (_, fs) = run(seeded_fs(), config);

        assert!(fs.get(Path::new("out/Foo.js")).is_none());
        let foo = fs.get(Path::new("out/extras/Foo.js")).unwrap();
        assert!(foo.contains("export {\n\tFoo,\n\tFooHelper\n}"));
    }

    #[test]
    fn inspect_reports_style_and_exports_without_writing() {
        let mut converter = Converter::with_fs(config(), seeded_fs()).unwrap();
        let entries = converter.inspect().unwrap();

        assert_eq!(entries.len(), 3);
        let foo = entries
            .iter()
            .find(|e| e.path == Path::new("lib/sources/Foo.js"))
            .unwrap();
        assert_eq!(foo.style, FileStyle::NamespaceAssignment);
        assert_eq!(foo.exports, vec!["Foo"]);
        assert!(converter.fs().get(Path::new("out/Foo.js")).is_none());
    }

    #[test]
    fn format_all_imports_names_every_indexed_symbol() {
        let mut converter = Converter::with_fs(config(), seeded_fs()).unwrap();
        let block = converter
            .format_all_imports(Path::new("lib/sources/Foo.js"))
            .unwrap();
        assert!(block.contains("Bar"));
        assert!(block.contains("REVISION"));
        assert!(block.contains("Foo"));
    }
}
