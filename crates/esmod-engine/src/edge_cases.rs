//! Edge-case overlay
//!
//! Manual per-file overrides applied after inference. Plain list fields
//! append to the inferred lists, `*_override` fields replace them, `output`
//! replaces the computed output path. Application is pure and
//! order-independent across fields.

use std::path::{Path, PathBuf};

use esmod_core::Result;

use crate::config::EdgeCase;
use crate::pipeline::ConversionUnit;
use crate::replace::Replacement;

/// Overlay one edge-case record onto an inferred conversion unit
pub fn apply_edge_case(unit: &mut ConversionUnit, edge_case: &EdgeCase) -> Result<()> {
    if let Some(imports) = &edge_case.imports_override {
        unit.imports = imports.clone();
    } else {
        unit.imports.extend(edge_case.imports.iter().cloned());
    }

    if let Some(specs) = &edge_case.replacements_override {
        unit.replacements = specs
            .iter()
            .map(Replacement::from_spec)
            .collect::<Result<Vec<_>>>()?;
    } else {
        for spec in &edge_case.replacements {
            unit.replacements.push(Replacement::from_spec(spec)?);
        }
    }

    if let Some(exports) = &edge_case.exports_override {
        unit.exports = exports.clone();
    } else {
        unit.exports.extend(edge_case.exports.iter().cloned());
    }

    if let Some(output) = &edge_case.output {
        unit.output = output.clone();
    }

    Ok(())
}

/// Resolve which input file is actually read for a discovered path.
///
/// An `origin_override` redirects the read to another file under
/// `origin_root`; used when one conceptual unit's final home differs from
/// its physical source location.
pub fn origin_override_path(
    file: &Path,
    edge_case: Option<&EdgeCase>,
    origin_root: Option<&Path>,
) -> PathBuf {
    match (edge_case.and_then(|e| e.origin_override.as_deref()), origin_root) {
        (Some(origin), Some(root)) => root.join(origin),
        _ => file.to_path_buf(),
    }
}
