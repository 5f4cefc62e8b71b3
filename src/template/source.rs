//! Content sources that supply template text by name
//!
//! Compositions route includes to a source by its protocol identifier.
//! The template set itself answers to `include`; other sources can be
//! registered alongside it.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

/// Protocol identifier of the filesystem-backed template set
pub const INCLUDE_PROTOCOL: &str = "include";

/// Something that can supply template text by name
pub trait ContentSource: Send + Sync + fmt::Debug {
    /// Get the text for `name`, or `None` if it cannot be supplied
    fn fetch(&self, name: &str) -> Option<String>;

    /// Check whether `name` can be supplied
    fn provides(&self, name: &str) -> bool {
        self.fetch(name).is_some()
    }

    /// Identifier includes use to route to this source
    fn protocol(&self) -> &str;
}

/// A content source backed by a map of names to text
#[derive(Debug)]
pub struct InMemorySource {
    protocol: String,
    entries: RwLock<HashMap<String, String>>,
}

impl InMemorySource {
    /// Create an empty source answering to `protocol`
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Add an entry
    pub fn with_entry(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    /// Add or replace an entry
    pub fn insert(&self, name: impl Into<String>, text: impl Into<String>) {
        self.entries.write().insert(name.into(), text.into());
    }
}

impl ContentSource for InMemorySource {
    fn fetch(&self, name: &str) -> Option<String> {
        self.entries.read().get(name).cloned()
    }

    fn provides(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    fn protocol(&self) -> &str {
        &self.protocol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_source() {
        let source = InMemorySource::new("snippet").with_entry("greeting", "hello");
        assert_eq!(source.protocol(), "snippet");
        assert_eq!(source.fetch("greeting"), Some("hello".to_string()));
        assert!(source.provides("greeting"));
        assert!(!source.provides("farewell"));

        source.insert("greeting", "hi");
        assert_eq!(source.fetch("greeting"), Some("hi".to_string()));
    }

    #[test]
    fn test_default_provides_uses_fetch() {
        #[derive(Debug)]
        struct Echo;

        impl ContentSource for Echo {
            fn fetch(&self, name: &str) -> Option<String> {
                (!name.is_empty()).then(|| name.to_string())
            }

            fn protocol(&self) -> &str {
                "echo"
            }
        }

        assert!(Echo.provides("x"));
        assert!(!Echo.provides(""));
    }
}
