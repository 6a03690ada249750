//! Conversion engine turning namespace-attached legacy sources into ES modules
//!
//! The engine runs in two strict phases. Phase 1 classifies every candidate
//! file and builds the global [`SymbolIndex`](symbols::SymbolIndex) mapping
//! each exported identifier to the one file that defines it. Phase 2 only
//! starts once the index is complete: per file it scans structural usage
//! patterns, derives idiom-stripping replacement rules, routes the output
//! path, overlays manual edge cases and renders the final
//! import-block / body / export-block text.

pub mod classify;
pub mod comments;
pub mod config;
pub mod edge_cases;
pub mod exports;
pub mod pipeline;
pub mod render;
pub mod replace;
pub mod router;
pub mod symbols;
pub mod usage;

pub use classify::{FileStyle, StylePatterns};
pub use config::{AnchorConfig, ConverterConfig, EdgeCase, EdgeCaseTable, RouteAnchor};
pub use pipeline::{Converter, InspectEntry, RunReport};
pub use symbols::SymbolIndex;
