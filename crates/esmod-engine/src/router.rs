//! Output path routing and import relative-path resolution
//!
//! Pure path helpers taking explicit anchor parameters. Paths are normalized
//! to `/` separators before any fragment matching so the same configuration
//! works on either separator convention.

use std::path::{Path, PathBuf};

use crate::config::RouteAnchor;

/// Path rendered with `/` separators
pub fn normalized(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Right-most occurrence of `fragment` in `haystack`, on directory
/// boundaries; returns the byte offset just past the fragment.
fn rightmost_fragment_end(haystack: &str, fragment: &str) -> Option<usize> {
    let fragment = fragment.trim_matches('/');
    if fragment.is_empty() {
        return None;
    }
    let mut search_end = haystack.len();
    while let Some(start) = haystack[..search_end].rfind(fragment) {
        let end = start + fragment.len();
        let starts_on_boundary = start == 0 || haystack[..start].ends_with('/');
        let ends_on_boundary = end == haystack.len() || haystack[end..].starts_with('/');
        if starts_on_boundary && ends_on_boundary {
            return Some(end);
        }
        if start == 0 {
            break;
        }
        search_end = start;
    }
    None
}

/// Anchor-relative part of a directory path for output placement.
///
/// The right-most match across all anchors wins. `None` when no anchor
/// fragment occurs in the path.
pub fn specific_dir_path(dir: &Path, anchors: &[RouteAnchor]) -> Option<String> {
    let dir = normalized(dir);
    let mut best: Option<(usize, &RouteAnchor)> = None;
    for anchor in anchors {
        if let Some(end) = rightmost_fragment_end(&dir, &anchor.fragment) {
            if best.map_or(true, |(e, _)| end > e) {
                best = Some((end, anchor));
            }
        }
    }
    best.map(|(end, anchor)| {
        let remainder = dir[end..].trim_start_matches('/');
        join_specific(&anchor.prefix, remainder)
    })
}

fn join_specific(prefix: &str, remainder: &str) -> String {
    match (prefix.is_empty(), remainder.is_empty()) {
        (true, _) => remainder.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}/{}", prefix, remainder),
    }
}

/// Destination of a file under the output root. The boolean is `false` when
/// no anchor matched, in which case the specific part is empty and the file
/// lands directly under the output root (an unroutable location a human
/// must fix).
pub fn output_path(file: &Path, output_root: &Path, anchors: &[RouteAnchor]) -> (PathBuf, bool) {
    let dir = file.parent().unwrap_or_else(|| Path::new(""));
    let specific = specific_dir_path(dir, anchors);
    let anchored = specific.is_some();
    let mut path = output_root.to_path_buf();
    if let Some(specific) = specific {
        if !specific.is_empty() {
            for part in specific.split('/') {
                path.push(part);
            }
        }
    }
    if let Some(name) = file.file_name() {
        path.push(name);
    }
    (path, anchored)
}

/// Anchor-relative part of a file path (name included) for import clauses
pub fn import_specific_path(file: &Path, anchors: &[String]) -> Option<String> {
    let path = normalized(file);
    let mut best: Option<usize> = None;
    for fragment in anchors {
        if let Some(end) = rightmost_fragment_end(&path, fragment) {
            if best.map_or(true, |e| end > e) {
                best = Some(end);
            }
        }
    }
    best.map(|end| path[end..].trim_start_matches('/').to_string())
}

/// Relative import path from one anchor-relative file path to another.
///
/// The shared directory prefix is stripped, the importer's remaining depth
/// becomes `../` steps (`./` when it sits at the root), and the imported
/// file's remaining specific path follows.
pub fn relative_import_path(importer_specific: &str, imported_specific: &str) -> String {
    let importer_dirs: Vec<&str> = dir_components(importer_specific);
    let mut imported_parts: Vec<&str> =
        imported_specific.split('/').filter(|p| !p.is_empty()).collect();

    let mut common = 0;
    while common < importer_dirs.len()
        && imported_parts.len() > 1
        && importer_dirs[common] == imported_parts[0]
    {
        imported_parts.remove(0);
        common += 1;
    }

    let remaining_levels = importer_dirs.len() - common;
    let mut relative = String::new();
    if remaining_levels == 0 {
        relative.push_str("./");
    } else {
        for _ in 0..remaining_levels {
            relative.push_str("../");
        }
    }
    relative.push_str(&imported_parts.join("/"));
    relative
}

fn dir_components(specific: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = specific.split('/').filter(|p| !p.is_empty()).collect();
    parts.pop(); // drop the file name
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchors() -> Vec<RouteAnchor> {
        vec![
            RouteAnchor::new("examples/fonts", "fonts"),
            RouteAnchor::new("examples/js", ""),
            RouteAnchor::new("three/sources", ""),
        ]
    }

    #[test]
    fn routes_source_files_under_output_root() {
        let (path, anchored) = output_path(
            Path::new("work/three/sources/math/Vector3.js"),
            Path::new("out"),
            &anchors(),
        );
        assert!(anchored);
        assert_eq!(path, PathBuf::from("out/math/Vector3.js"));
    }

    #[test]
    fn fonts_anchor_keeps_its_prefix() {
        let (path, anchored) = output_path(
            Path::new("work/three/examples/fonts/helvetiker_regular.typeface.json"),
            Path::new("out"),
            &anchors(),
        );
        assert!(anchored);
        assert_eq!(
            path,
            PathBuf::from("out/fonts/helvetiker_regular.typeface.json")
        );
    }

    #[test]
    fn missing_anchor_lands_at_output_root() {
        let (path, anchored) = output_path(
            Path::new("elsewhere/Thing.js"),
            Path::new("out"),
            &anchors(),
        );
        assert!(!anchored);
        assert_eq!(path, PathBuf::from("out/Thing.js"));
    }

    #[test]
    fn rightmost_anchor_occurrence_wins() {
        // A nested tree repeating an anchor fragment must split at the
        // right-most occurrence.
        let specific = specific_dir_path(
            Path::new("three/sources/legacy/three/sources/math"),
            &anchors(),
        );
        assert_eq!(specific.as_deref(), Some("math"));
    }

    #[test]
    fn fragment_matching_respects_directory_boundaries() {
        let specific = specific_dir_path(
            Path::new("work/three/sources-old/math"),
            &[RouteAnchor::new("sources", "")],
        );
        assert_eq!(specific, None);
    }

    #[test]
    fn import_specific_path_includes_file_name() {
        let specific = import_specific_path(
            Path::new("work/three/sources/cameras/Camera.js"),
            &["sources".to_string()],
        );
        assert_eq!(specific.as_deref(), Some("cameras/Camera.js"));
    }

    #[test]
    fn sibling_import_from_root() {
        assert_eq!(
            relative_import_path("constants.js", "math/Vector3.js"),
            "./math/Vector3.js"
        );
    }

    #[test]
    fn parent_steps_per_importer_level() {
        assert_eq!(
            relative_import_path("renderers/webgl/WebGLState.js", "math/Vector3.js"),
            "../../math/Vector3.js"
        );
    }

    #[test]
    fn shared_prefix_is_stripped() {
        assert_eq!(
            relative_import_path("math/interpolants/Linear.js", "math/Vector3.js"),
            "../Vector3.js"
        );
        assert_eq!(
            relative_import_path("math/Matrix4.js", "math/Vector3.js"),
            "./Vector3.js"
        );
    }
}
