//! Error types for template lookups

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while loading a template fragment
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The file does not exist, or it was parsed but has no such fragment
    #[error("{extension} template '{name}' not found (looked in {})", path.display())]
    NotFound {
        name: String,
        extension: String,
        path: PathBuf,
    },

    /// The file exists but could not be read
    #[error("error fetching {extension} template '{name}' from {}: {source}", path.display())]
    Io {
        name: String,
        extension: String,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl TemplateError {
    /// Create a not-found error
    pub fn not_found(
        name: impl Into<String>,
        extension: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::NotFound {
            name: name.into(),
            extension: extension.into(),
            path: path.into(),
        }
    }

    /// Create a read error
    pub fn io(
        name: impl Into<String>,
        extension: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            name: name.into(),
            extension: extension.into(),
            path: path.into(),
            source,
        }
    }

    /// The file the lookup went to
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path, .. } | Self::Io { path, .. } => path,
        }
    }

    /// Inline text shown in place of the fragment when failures are visible
    pub fn placeholder(&self) -> String {
        match self {
            Self::NotFound {
                name,
                extension,
                path,
            } => format!(
                "[{} template '{}' not found]<!-- looked in [{}] -->",
                extension,
                name,
                path.display()
            ),
            Self::Io {
                name,
                extension,
                path,
                source,
            } => format!(
                "[error fetching {} template '{}']<!-- {}: {} ({:?}) -->",
                extension,
                name,
                path.display(),
                source,
                source.kind()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_placeholder() {
        let err = TemplateError::not_found("page.row", "html", "/t/page.html");
        assert_eq!(
            err.placeholder(),
            "[html template 'page.row' not found]<!-- looked in [/t/page.html] -->"
        );
        assert!(err.to_string().contains("page.row"));
    }

    #[test]
    fn test_io_placeholder() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = TemplateError::io("page", "xml", "/t/page.xml", source);
        let text = err.placeholder();
        assert!(text.starts_with("[error fetching xml template 'page']<!-- "));
        assert!(text.contains("denied"));
        assert!(text.ends_with(" -->"));
        assert_eq!(err.path(), Path::new("/t/page.xml"));
    }
}
