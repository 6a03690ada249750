//! Replacement rule generation and application
//!
//! Derives the ordered text substitutions that strip legacy idioms from a
//! file: namespace-qualified declarations become bare local declarations,
//! self-invoking wrappers are removed, remaining namespace prefixes are
//! dropped and leftover self-assignments are cleaned up. Rules are computed
//! from the file's own text alone and applied in sequence to the original
//! (not comment-stripped) text.

use std::path::Path;

use esmod_core::{ConvertError, Result};
use regex::{Captures, Regex};

use crate::config::ReplacementSpec;

/// One text-rewrite rule
#[derive(Debug, Clone)]
pub enum Replacement {
    /// Regex substitution; `global` controls every-match vs first-match
    Pattern {
        regex: Regex,
        substitution: String,
        global: bool,
    },
    /// Drops statements of the form `var X = X;` left by prefix stripping
    DropSelfAssignments,
}

impl Replacement {
    /// Global regex substitution
    pub fn pattern(pattern: &str, substitution: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| ConvertError::InvalidPattern {
            pattern: pattern.to_string(),
            source: e,
        })?;
        Ok(Self::Pattern {
            regex,
            substitution: substitution.to_string(),
            global: true,
        })
    }

    /// First-match-only regex substitution
    fn pattern_once(pattern: &str, substitution: &str) -> Self {
        Self::Pattern {
            regex: Regex::new(pattern).unwrap(),
            substitution: substitution.to_string(),
            global: false,
        }
    }

    /// Compile an edge-case supplied rule
    pub fn from_spec(spec: &ReplacementSpec) -> Result<Self> {
        Self::pattern(&spec.pattern, &spec.substitution)
    }
}

/// Compiled rule generator for one namespace identifier
pub struct ReplacementGenerator {
    namespace: String,
    whitespace: Regex,
    wrapper_open_detect: Regex,
    wrapper_close_param_detect: Regex,
    wrapper_close_bare_detect: Regex,
    self_assignment: Regex,
}

impl ReplacementGenerator {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            whitespace: Regex::new(r"\s+").unwrap(),
            wrapper_open_detect: Regex::new(r"^\(\s*function\s*\(\s*(\w+)?\s*\)\s*\{").unwrap(),
            wrapper_close_param_detect: Regex::new(
                r"\}\s*\)\s*\(\s*[\w.=\s]*(\|\|\s*\{\})?\s*\);?$",
            )
            .unwrap(),
            wrapper_close_bare_detect: Regex::new(r"\}\s*\(\s*[\w]*\s*\)\s*\);?$").unwrap(),
            self_assignment: Regex::new(r"var\s?(\w+)\s?=\s?(\w+);").unwrap(),
        }
    }

    /// Ordered rule list for one file.
    ///
    /// `stripped` is the comment-stripped text (wrapper detection also
    /// removes whitespace before matching); `exports` is the file's export
    /// list from the symbol index.
    pub fn rules(
        &self,
        file: &Path,
        stripped: &str,
        exports: &[String],
    ) -> Result<Vec<Replacement>> {
        let ns = regex::escape(&self.namespace);
        let mut rules = Vec::new();

        // Rewrite each exported declaration to a bare local declaration.
        for export in exports {
            let name = regex::escape(export);
            rules.push(Replacement::pattern(
                &format!(r"{ns}\.{name} ="),
                &format!("var {} =", export),
            )?);
        }
        // Chained assignments leave `= var` artifacts behind.
        rules.push(Replacement::pattern(" = var ", " = ")?);

        // Wrapper stripping is decided on the condensed text: comments are
        // already gone, whitespace goes next so the open/close signatures
        // become position-stable.
        let condensed = self.whitespace.replace_all(stripped, "");
        if self.wrapper_open_detect.is_match(&condensed) {
            rules.push(Replacement::pattern_once(
                r"\(\s*function\s*\(\s*(\w+)?\s*\)\s*\{",
                "",
            ));

            if self.wrapper_close_param_detect.is_match(&condensed) {
                rules.push(Replacement::pattern_once(
                    r"\}\s*\)\s*\(\s*[\w.=\s]*(\|\|\s*\{\})?\s*\);?",
                    "",
                ));
            } else if self.wrapper_close_bare_detect.is_match(&condensed) {
                rules.push(Replacement::pattern_once(r"\}\s*\(\s*[\w]*\s*\)\s*\);?", ""));
            } else {
                return Err(ConvertError::ambiguous_wrapper(file));
            }
        }

        // Strip every remaining namespace qualifier.
        rules.push(Replacement::pattern(&format!(r"{ns}\."), "")?);

        // Prefix stripping can collapse aliasing chains into `var X = X;`.
        rules.push(Replacement::DropSelfAssignments);

        Ok(rules)
    }

    /// Apply rules in order to the original file text
    pub fn apply(&self, text: &str, rules: &[Replacement]) -> String {
        let mut body = text.to_string();
        for rule in rules {
            body = match rule {
                Replacement::Pattern {
                    regex,
                    substitution,
                    global: true,
                } => regex.replace_all(&body, substitution.as_str()).into_owned(),
                Replacement::Pattern {
                    regex,
                    substitution,
                    global: false,
                } => regex.replace(&body, substitution.as_str()).into_owned(),
                Replacement::DropSelfAssignments => self
                    .self_assignment
                    .replace_all(&body, |caps: &Captures| {
                        if caps[1] == caps[2] {
                            String::new()
                        } else {
                            caps[0].to_string()
                        }
                    })
                    .into_owned(),
            };
        }
        body
    }
}
