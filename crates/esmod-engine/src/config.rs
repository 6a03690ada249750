//! Configuration surface for a conversion run
//!
//! A run is parametrized by input paths, exclude patterns, the output root,
//! the namespace identifier legacy files attach to, the anchor sets driving
//! path routing and conflict arbitration, and a table of per-file edge-case
//! overrides. Validation happens up front: a malformed configuration fails
//! before any file is touched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use esmod_core::{ConvertError, Result};
use serde::{Deserialize, Serialize};

/// One recognized directory fragment for output routing.
///
/// Everything right of the fragment becomes the path relative to the output
/// root; `prefix` is prepended to that remainder (the fonts tree keeps a
/// `fonts/` prefix, the others map straight through).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteAnchor {
    pub fragment: String,
    #[serde(default)]
    pub prefix: String,
}

impl RouteAnchor {
    pub fn new<F: Into<String>, P: Into<String>>(fragment: F, prefix: P) -> Self {
        Self {
            fragment: fragment.into(),
            prefix: prefix.into(),
        }
    }
}

/// The three configurable anchor sets.
///
/// The source tool drifted between two anchor conventions over time; neither
/// is assumed to be a fix of the other, so all of them are configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Fragments marking a file as belonging to the canonical source tree,
    /// used for export-conflict arbitration (anything else is "example")
    pub source_markers: Vec<String>,
    /// Anchors used to compute output locations
    pub route_anchors: Vec<RouteAnchor>,
    /// Fragments used to compute the specific path of import clauses
    pub import_anchors: Vec<String>,
}

/// Replacement rule supplied through an edge case: a regex pattern and its
/// substitution, applied globally to the file body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementSpec {
    pub pattern: String,
    pub substitution: String,
}

/// Manual override/augmentation record for one file, keyed by base name.
///
/// Plain list fields append to the inferred lists; `*_override` fields
/// replace them wholesale. `output` replaces the computed output path and
/// `origin_override` redirects which input file is read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeCase {
    pub origin_override: Option<String>,
    pub imports: Vec<String>,
    pub imports_override: Option<Vec<String>>,
    pub replacements: Vec<ReplacementSpec>,
    pub replacements_override: Option<Vec<ReplacementSpec>>,
    pub exports: Vec<String>,
    pub exports_override: Option<Vec<String>>,
    pub output: Option<PathBuf>,
}

/// Edge cases keyed by file base name (no extension)
pub type EdgeCaseTable = BTreeMap<String, EdgeCase>;

/// Full configuration of a conversion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Files or directories to convert
    pub inputs: Vec<PathBuf>,
    /// Exclude patterns: a pattern containing a dot must equal the file
    /// name; any other pattern matches as a path substring
    pub excludes: Vec<String>,
    /// Output root directory
    pub output: PathBuf,
    /// The shared global namespace identifier (e.g. `THREE`)
    pub namespace: String,
    /// A well-known member of the shared-constant aggregate, used to locate
    /// the file owning it; `None` disables the constant usage scan
    pub constants_symbol: Option<String>,
    /// Base directory edge-case `origin_override` paths resolve against
    pub origin_root: Option<PathBuf>,
    pub anchors: AnchorConfig,
    pub edge_cases: EdgeCaseTable,
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl ConverterConfig {
    /// Load a configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ConvertError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            ConvertError::configuration(format!(
                "Failed to parse config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Load an edge-case table from a JSON file and merge it in
    pub fn load_edge_cases<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ConvertError::configuration(format!(
                "Failed to read edge-case file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let table: EdgeCaseTable = serde_json::from_str(&content).map_err(|e| {
            ConvertError::configuration(format!(
                "Failed to parse edge-case file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        self.edge_cases.extend(table);
        Ok(())
    }

    /// Check value shape; fatal before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(ConvertError::configuration_with_field(
                "expected at least one input path",
                "inputs",
            ));
        }
        if self.inputs.iter().any(|p| p.as_os_str().is_empty()) {
            return Err(ConvertError::configuration_with_field(
                "input paths must not be empty",
                "inputs",
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConvertError::configuration_with_field(
                "expected an output root path",
                "output",
            ));
        }
        if !is_identifier(&self.namespace) {
            return Err(ConvertError::configuration_with_field(
                format!("'{}' is not a valid namespace identifier", self.namespace),
                "namespace",
            ));
        }
        if let Some(symbol) = &self.constants_symbol {
            if !is_identifier(symbol) {
                return Err(ConvertError::configuration_with_field(
                    format!("'{}' is not a valid constant identifier", symbol),
                    "constants_symbol",
                ));
            }
        }
        if self.excludes.iter().any(|e| e.is_empty()) {
            return Err(ConvertError::configuration_with_field(
                "exclude patterns must not be empty",
                "excludes",
            ));
        }
        if self.anchors.source_markers.is_empty() {
            return Err(ConvertError::configuration_with_field(
                "expected at least one source marker fragment",
                "anchors.source_markers",
            ));
        }
        if self.anchors.route_anchors.is_empty()
            || self.anchors.route_anchors.iter().any(|a| a.fragment.is_empty())
        {
            return Err(ConvertError::configuration_with_field(
                "expected non-empty route anchor fragments",
                "anchors.route_anchors",
            ));
        }
        if self.anchors.import_anchors.is_empty()
            || self.anchors.import_anchors.iter().any(|a| a.is_empty())
        {
            return Err(ConvertError::configuration_with_field(
                "expected non-empty import anchor fragments",
                "anchors.import_anchors",
            ));
        }
        for (name, edge_case) in &self.edge_cases {
            if edge_case.origin_override.is_some() && self.origin_root.is_none() {
                return Err(ConvertError::configuration_with_field(
                    format!(
                        "edge case '{}' uses origin_override but no origin_root is set",
                        name
                    ),
                    "origin_root",
                ));
            }
            for spec in edge_case
                .replacements
                .iter()
                .chain(edge_case.replacements_override.iter().flatten())
            {
                regex::Regex::new(&spec.pattern).map_err(|e| ConvertError::InvalidPattern {
                    pattern: spec.pattern.clone(),
                    source: e,
                })?;
            }
        }
        Ok(())
    }
}
