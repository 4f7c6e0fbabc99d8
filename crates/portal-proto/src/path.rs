//! Virtual working-directory paths.
//!
//! Paths are purely logical: nothing here touches a filesystem. Every
//! resolved path is absolute, has no `.`/`..` segments, no repeated
//! separators and no trailing separator (except the root itself).

/// The root directory every session starts in.
pub const ROOT: &str = "/";

/// Resolve `target` against the working directory `cwd`.
///
/// An absolute `target` ignores `cwd`. `..` above the root stays at the root.
///
/// ```rust
/// use portal_proto::path::resolve;
///
/// assert_eq!(resolve("/a/b", "../foo"), "/a/foo");
/// assert_eq!(resolve("/a/b", "/x"), "/x");
/// assert_eq!(resolve("/", "docs//notes/"), "/docs/notes");
/// ```
pub fn resolve(cwd: &str, target: &str) -> String {
    let base = if target.starts_with('/') { "" } else { cwd };

    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(target.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name),
        }
    }

    if segments.is_empty() {
        ROOT.to_string()
    } else {
        let mut out = String::with_capacity(segments.iter().map(|s| s.len() + 1).sum());
        for segment in segments {
            out.push('/');
            out.push_str(segment);
        }
        out
    }
}

/// Returns true if `path` is already in the form [`resolve`] produces.
pub fn is_normalized(path: &str) -> bool {
    resolve(ROOT, path) == path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_parent() {
        assert_eq!(resolve("/a/b", "../foo"), "/a/foo");
    }

    #[test]
    fn absolute_overrides_cwd() {
        assert_eq!(resolve("/a/b", "/x"), "/x");
        assert_eq!(resolve("/a/b", "/"), "/");
    }

    #[test]
    fn trailing_and_redundant_separators() {
        assert_eq!(resolve("/a", "b/"), "/a/b");
        assert_eq!(resolve("/a", "b//c///"), "/a/b/c");
        assert_eq!(resolve("/", "///"), "/");
    }

    #[test]
    fn dot_segments() {
        assert_eq!(resolve("/a/b", "."), "/a/b");
        assert_eq!(resolve("/a/b", "./c/./d"), "/a/b/c/d");
        assert_eq!(resolve("/a/b", "c/../../d"), "/a/d");
    }

    #[test]
    fn parent_of_root_is_root() {
        assert_eq!(resolve("/", ".."), "/");
        assert_eq!(resolve("/a", "../../../.."), "/");
    }

    #[test]
    fn tolerates_unnormalized_cwd() {
        assert_eq!(resolve("/a//b/", "c"), "/a/b/c");
    }

    #[test]
    fn normalized_check() {
        assert!(is_normalized("/"));
        assert!(is_normalized("/a/b"));
        assert!(!is_normalized("/a/b/"));
        assert!(!is_normalized("/a/../b"));
        assert!(!is_normalized("a"));
    }
}
