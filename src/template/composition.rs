//! Compositions: template text under assembly, plus the sources its
//! includes route to

use std::sync::Arc;

use super::set::TemplateSet;
use super::source::ContentSource;
use crate::tags::TagBoundaries;

/// Makes compositions bound to a template set
pub trait FragmentFactory {
    /// An empty composition
    fn make_blank(&self) -> Composition;

    /// A composition holding the named fragment, default extension
    fn make_from(&self, name: &str) -> Composition;

    /// A composition holding the named fragment with the given extension
    fn make_from_with_extension(&self, name: &str, extension: &str) -> Composition;
}

/// Template text being assembled, with the tag boundaries and content
/// sources in force when it was made
#[derive(Debug, Clone)]
pub struct Composition {
    tags: TagBoundaries,
    sources: Vec<Arc<dyn ContentSource>>,
    text: String,
}

impl Composition {
    /// Create an empty composition
    pub fn new(tags: TagBoundaries, sources: Vec<Arc<dyn ContentSource>>) -> Self {
        Self {
            tags,
            sources,
            text: String::new(),
        }
    }

    /// Append template text
    pub fn append(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// The text so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the composition, returning its text
    pub fn into_text(self) -> String {
        self.text
    }

    /// The tag boundaries this composition was made with
    pub fn tag_boundaries(&self) -> &TagBoundaries {
        &self.tags
    }

    /// Wrap a tag name in this composition's boundaries
    pub fn make_tag(&self, name: &str) -> String {
        self.tags.make_tag(name)
    }

    /// Protocol identifiers of the attached sources, in lookup order
    pub fn protocols(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.protocol()).collect()
    }

    /// The first source answering to `protocol`
    pub fn source_for(&self, protocol: &str) -> Option<&Arc<dyn ContentSource>> {
        self.sources
            .iter()
            .find(|source| source.protocol() == protocol)
    }

    /// Fetch `name` from the source answering to `protocol`
    pub fn fetch_from(&self, protocol: &str, name: &str) -> Option<String> {
        let source = self.source_for(protocol);
        if source.is_none() {
            tracing::debug!(protocol, name, "no content source for protocol");
        }
        source?.fetch(name)
    }
}

impl FragmentFactory for Arc<TemplateSet> {
    fn make_blank(&self) -> Composition {
        let set: Arc<dyn ContentSource> = self.clone();
        let mut sources = vec![set];
        sources.extend(self.protocols());
        Composition::new(self.tag_boundaries(), sources)
    }

    fn make_from(&self, name: &str) -> Composition {
        let extension = self.default_extension();
        self.make_from_with_extension(name, &extension)
    }

    fn make_from_with_extension(&self, name: &str, extension: &str) -> Composition {
        let mut composition = self.make_blank();
        if let Some(text) = self.get_with_extension(name, extension) {
            composition.append(&text);
        }
        composition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::source::InMemorySource;

    fn sources() -> Vec<Arc<dyn ContentSource>> {
        vec![
            Arc::new(InMemorySource::new("include").with_entry("page", "from include")),
            Arc::new(InMemorySource::new("snippet").with_entry("page", "from snippet")),
        ]
    }

    #[test]
    fn test_append_and_text() {
        let mut composition = Composition::new(TagBoundaries::default(), Vec::new());
        composition.append("Hello, ");
        composition.append("{~name}");
        assert_eq!(composition.text(), "Hello, {~name}");
        assert_eq!(composition.into_text(), "Hello, {~name}");
    }

    #[test]
    fn test_make_tag_uses_own_boundaries() {
        let composition = Composition::new(TagBoundaries::new("<%", "%>"), Vec::new());
        assert_eq!(composition.make_tag("user.name"), "<%user.name%>");
    }

    #[test]
    fn test_routing_by_protocol() {
        let composition = Composition::new(TagBoundaries::default(), sources());
        assert_eq!(composition.protocols(), vec!["include", "snippet"]);
        assert_eq!(
            composition.fetch_from("snippet", "page"),
            Some("from snippet".to_string())
        );
        assert_eq!(
            composition.fetch_from("include", "page"),
            Some("from include".to_string())
        );
        assert_eq!(composition.fetch_from("missing", "page"), None);
        assert!(composition.source_for("snippet").is_some());
    }
}
