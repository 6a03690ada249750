//! File style classification
//!
//! Tags each file with the authoring idiom it uses. The battery of pattern
//! tests is ordered: declarative markers are checked first so a file that
//! already uses modern import/export syntax is never treated as legacy.

use regex::Regex;

/// Authoring idiom of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStyle {
    /// Already uses declarative import/export statements
    Declarative,
    /// AMD loader module; flagged unconvertible
    Amd,
    /// CommonJS-like bulk export assignment
    CommonJs,
    /// Repeated namespace-property function assignment
    NamespaceAssignment,
    /// Prototype-based "class" with a constructor reassignment
    Prototype,
    /// Plain object-literal namespace declaration
    NamespaceObject,
    /// None of the recognized idioms matched
    Unknown,
}

impl FileStyle {
    /// Whether the file already carries declarative module syntax
    pub fn is_declarative(&self) -> bool {
        matches!(self, FileStyle::Declarative)
    }
}

impl std::fmt::Display for FileStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FileStyle::Declarative => "declarative",
            FileStyle::Amd => "amd",
            FileStyle::CommonJs => "commonjs",
            FileStyle::NamespaceAssignment => "namespace-assignment",
            FileStyle::Prototype => "prototype",
            FileStyle::NamespaceObject => "namespace-object",
            FileStyle::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Compiled detection patterns for one namespace identifier
pub struct StylePatterns {
    declarative: Regex,
    amd: Regex,
    commonjs: Regex,
    namespace_assignment: Regex,
    prototype: Regex,
    namespace_object: Regex,
}

impl StylePatterns {
    pub fn new(namespace: &str) -> Self {
        let ns = regex::escape(namespace);
        Self {
            declarative: Regex::new(
                r"(export\s(default|var))|((import|export)[\r\n\s]*(default)?\{[\w\s,]+\}\s?(from)?)",
            )
            .unwrap(),
            amd: Regex::new(r"define\.amd").unwrap(),
            commonjs: Regex::new(r"module\.exports\s*=\s*\{?[^}]*\}?").unwrap(),
            namespace_assignment: Regex::new(&format!(r"({ns}\.(\w+)\s*=\s*)+\s*function"))
                .unwrap(),
            prototype: Regex::new(&format!(r"prototype\.constructor\s?=\s?({ns}\.)?(\w)+"))
                .unwrap(),
            namespace_object: Regex::new(&format!(r"{ns}\.(\w+) = \{{")).unwrap(),
        }
    }

    /// Classify comment-stripped text; pure function, first match wins
    pub fn classify(&self, stripped: &str) -> FileStyle {
        if self.declarative.is_match(stripped) {
            FileStyle::Declarative
        } else if self.amd.is_match(stripped) {
            FileStyle::Amd
        } else if self.commonjs.is_match(stripped) {
            FileStyle::CommonJs
        } else if self.namespace_assignment.is_match(stripped) {
            FileStyle::NamespaceAssignment
        } else if self.prototype.is_match(stripped) {
            FileStyle::Prototype
        } else if self.namespace_object.is_match(stripped) {
            FileStyle::NamespaceObject
        } else {
            FileStyle::Unknown
        }
    }

    /// Individual predicates, exposed so each idiom test is checkable alone
    pub fn is_declarative(&self, text: &str) -> bool {
        self.declarative.is_match(text)
    }

    pub fn is_amd(&self, text: &str) -> bool {
        self.amd.is_match(text)
    }

    pub fn is_commonjs(&self, text: &str) -> bool {
        self.commonjs.is_match(text)
    }

    pub fn is_namespace_assignment(&self, text: &str) -> bool {
        self.namespace_assignment.is_match(text)
    }

    pub fn is_prototype(&self, text: &str) -> bool {
        self.prototype.is_match(text)
    }

    pub fn is_namespace_object(&self, text: &str) -> bool {
        self.namespace_object.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> StylePatterns {
        StylePatterns::new("THREE")
    }

    #[test]
    fn declarative_import_wins_over_legacy_markers() {
        // Declarative syntax must shadow any legacy idiom in the same file.
        let text = "import { Vector3 } from './Vector3.js'\nTHREE.Thing = function () {}";
        assert_eq!(patterns().classify(text), FileStyle::Declarative);
    }

    #[test]
    fn export_var_is_declarative() {
        assert_eq!(
            patterns().classify("export var REVISION = '86';"),
            FileStyle::Declarative
        );
    }

    #[test]
    fn amd_marker() {
        assert_eq!(
            patterns().classify("if ( typeof define === 'function' && define.amd ) {}"),
            FileStyle::Amd
        );
    }

    #[test]
    fn commonjs_bulk_export() {
        assert_eq!(
            patterns().classify("module.exports = { Foo, Bar };"),
            FileStyle::CommonJs
        );
    }

    #[test]
    fn namespace_function_assignment() {
        assert_eq!(
            patterns().classify("THREE.Camera = function () { this.zoom = 1; };"),
            FileStyle::NamespaceAssignment
        );
    }

    #[test]
    fn prototype_constructor_reassignment() {
        let text = "Foo.prototype = Object.create( Bar.prototype );\nFoo.prototype.constructor = THREE.Foo;";
        assert_eq!(patterns().classify(text), FileStyle::Prototype);
    }

    #[test]
    fn object_literal_namespace() {
        assert_eq!(
            patterns().classify("THREE.ShaderChunk = {\n\tfog: ''\n};"),
            FileStyle::NamespaceObject
        );
    }

    #[test]
    fn unknown_when_nothing_matches() {
        assert_eq!(patterns().classify("var x = 1;"), FileStyle::Unknown);
    }
}
