//! Resolution of template names to files on disk

use std::path::{Path, PathBuf};

use crate::parser::shorthand::file_stub;

/// The file stub a request name refers to.
///
/// Everything from the first `#` is a fragment path, so nested names may
/// hold slashes (`page#a/b` lives in `page`). In what remains, everything
/// from the first dot after the last path separator is dropped:
/// `themes/page#row` and `themes/page.row` both live in `themes/page`.
pub fn stub_for(name: &str) -> String {
    let file_part = name.find('#').map_or(name, |hash| &name[..hash]);
    file_stub(file_part).to_string()
}

/// Maps template names to file paths under a base folder
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    base_dir: PathBuf,
}

impl PathResolver {
    /// Create a resolver rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the base folder
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Set the base folder
    pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
        self.base_dir = dir.into();
    }

    /// Resolve a template name to the file that defines it.
    ///
    /// Either `/` or `\` may separate folders in the name; each segment
    /// becomes a native path component under the base folder.
    pub fn resolve(&self, name: &str, extension: &str) -> PathBuf {
        let stub = stub_for(name);
        let mut path = self.base_dir.clone();
        let mut segments = stub.split(['/', '\\']).filter(|s| !s.is_empty()).peekable();

        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{}.{}", segment, extension));
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_for() {
        assert_eq!(stub_for("page"), "page");
        assert_eq!(stub_for("page.outer.inner"), "page");
        assert_eq!(stub_for("page#outer"), "page");
        assert_eq!(stub_for("themes/dark/page#row"), "themes/dark/page");
        assert_eq!(stub_for("v1.2/page.row"), "v1.2/page");
        assert_eq!(stub_for("page.row#cell"), "page");
    }

    #[test]
    fn test_hash_path_may_contain_slashes() {
        assert_eq!(stub_for("page#a/b"), "page");
        assert_eq!(stub_for("themes/page#a/b#c"), "themes/page");

        let resolver = PathResolver::new("/srv/templates");
        assert_eq!(
            resolver.resolve("page#a/b", "html"),
            PathBuf::from("/srv/templates").join("page.html")
        );
    }

    #[test]
    fn test_resolve_simple_name() {
        let resolver = PathResolver::new("/srv/templates");
        assert_eq!(
            resolver.resolve("page.row", "html"),
            PathBuf::from("/srv/templates").join("page.html")
        );
    }

    #[test]
    fn test_resolve_with_folders() {
        let resolver = PathResolver::new("/srv/templates");
        let expected = PathBuf::from("/srv/templates")
            .join("themes")
            .join("dark")
            .join("page.xml");
        assert_eq!(resolver.resolve("themes/dark/page#row", "xml"), expected);
        assert_eq!(resolver.resolve(r"themes\dark\page.row", "xml"), expected);
    }

    #[test]
    fn test_resolve_without_base_dir() {
        let resolver = PathResolver::default();
        assert_eq!(resolver.resolve("page", "html"), PathBuf::from("page.html"));
    }
}
