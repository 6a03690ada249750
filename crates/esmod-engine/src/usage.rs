//! Usage scanning
//!
//! Infers which external symbols a file depends on by scanning five
//! independent structural patterns on the comment-stripped text. Each idiom
//! has a narrow textual signature of its own; folding them into one pattern
//! would raise both false positives and false negatives. Candidates that the
//! symbol index attributes back to the scanned file itself are
//! self-references, not imports, and are dropped.

use std::path::Path;

use esmod_core::{ConvertError, Result};
use regex::Regex;

use crate::symbols::SymbolIndex;

/// Compiled usage patterns for one namespace identifier
pub struct UsageScanner {
    namespace: String,
    /// `Object.assign( A.prototype, NS.B.prototype, ... )` mixin merges
    mixin: Regex,
    /// `Object.create( NS.A.prototype )` prototype chains
    inherit: Regex,
    /// Qualified prototype references inside the two constructs above
    prototype_name: Regex,
    /// `new NS.Type` constructor invocations
    construction: Regex,
    /// `instanceof NS.Type` runtime type tests
    instance_of: Regex,
    /// Well-known member of the shared-constant aggregate, if configured
    constants_symbol: Option<String>,
}

impl UsageScanner {
    pub fn new(namespace: &str, constants_symbol: Option<&str>) -> Self {
        let ns = regex::escape(namespace);
        Self {
            namespace: namespace.to_string(),
            mixin: Regex::new(&format!(
                r"Object\.assign\(\s*(({ns}\.)?(\w+)\.prototype[,]*\s*){{2,}}"
            ))
            .unwrap(),
            inherit: Regex::new(&format!(
                r"Object\.create\(\s+(({ns}\.)?(\w+)\.prototype[,]?\s*)+\)"
            ))
            .unwrap(),
            prototype_name: Regex::new(&format!(r"(?:{ns}\.)?(\w+)\.prototype")).unwrap(),
            construction: Regex::new(&format!(r"new\s{ns}\.(\w+)\s?")).unwrap(),
            instance_of: Regex::new(&format!(r"instanceof\s{ns}\.(\w+)\s?")).unwrap(),
            constants_symbol: constants_symbol.map(str::to_string),
        }
    }

    /// External symbols the file depends on, deduplicated in scan order
    pub fn scan(&self, file: &Path, stripped: &str, index: &SymbolIndex) -> Result<Vec<String>> {
        let mut imports = Vec::new();

        self.scan_prototype_lists(&self.mixin, stripped, file, index, &mut imports);
        self.scan_prototype_lists(&self.inherit, stripped, file, index, &mut imports);
        self.scan_qualified(&self.construction, stripped, file, index, &mut imports);
        self.scan_qualified(&self.instance_of, stripped, file, index, &mut imports);
        self.scan_constants(stripped, file, index, &mut imports)?;

        Ok(imports)
    }

    /// Patterns 1 and 2: prototype names inside a mixin or inheritance
    /// construct
    fn scan_prototype_lists(
        &self,
        construct: &Regex,
        stripped: &str,
        file: &Path,
        index: &SymbolIndex,
        imports: &mut Vec<String>,
    ) {
        for found in construct.find_iter(stripped) {
            for caps in self.prototype_name.captures_iter(found.as_str()) {
                push_candidate(imports, &caps[1], file, index);
            }
        }
    }

    /// Patterns 3 and 4: a single qualified identifier per match
    fn scan_qualified(
        &self,
        pattern: &Regex,
        stripped: &str,
        file: &Path,
        index: &SymbolIndex,
        imports: &mut Vec<String>,
    ) {
        for caps in pattern.captures_iter(stripped) {
            push_candidate(imports, &caps[1], file, index);
        }
    }

    /// Pattern 5: references to members of the shared-constant aggregate.
    /// The aggregate is located through the owner of the configured marker
    /// symbol; each of that file's exports is then matched as a qualified
    /// reference.
    fn scan_constants(
        &self,
        stripped: &str,
        file: &Path,
        index: &SymbolIndex,
        imports: &mut Vec<String>,
    ) -> Result<()> {
        let Some(marker) = &self.constants_symbol else {
            return Ok(());
        };
        let owner = index
            .owner(marker)
            .ok_or_else(|| ConvertError::MissingConstants {
                symbol: marker.clone(),
            })?;
        let constants = index
            .exports_of(owner)
            .ok_or_else(|| ConvertError::missing_exports(owner))?;

        let ns = regex::escape(&self.namespace);
        let alternation = constants
            .iter()
            .map(|c| regex::escape(c))
            .collect::<Vec<_>>()
            .join("|");
        let pattern =
            Regex::new(&format!(r"{ns}\.({alternation})\b")).map_err(|e| {
                ConvertError::InvalidPattern {
                    pattern: alternation.clone(),
                    source: e,
                }
            })?;

        for caps in pattern.captures_iter(stripped) {
            push_candidate(imports, &caps[1], file, index);
        }
        Ok(())
    }
}

fn push_candidate(imports: &mut Vec<String>, name: &str, file: &Path, index: &SymbolIndex) {
    if name.is_empty() || index.is_owned_by(name, file) {
        return;
    }
    if !imports.iter().any(|i| i == name) {
        imports.push(name.to_string());
    }
}
