//! Tag boundary markers and tag syntax conversion

use serde::Deserialize;

use crate::parser::delimiter::find_from;
use crate::parser::{DEFAULT_TAG_END, DEFAULT_TAG_START};

/// The pair of markers that delimit a tag, `{~` and `}` by default
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TagBoundaries {
    /// Marker that opens a tag
    pub start: String,
    /// Marker that closes a tag
    pub end: String,
}

impl Default for TagBoundaries {
    fn default() -> Self {
        Self {
            start: DEFAULT_TAG_START.to_string(),
            end: DEFAULT_TAG_END.to_string(),
        }
    }
}

impl TagBoundaries {
    /// Create a boundary pair
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Wrap a tag name in these boundaries
    pub fn make_tag(&self, name: &str) -> String {
        format!("{}{}{}", self.start, name, self.end)
    }

    /// Rewrite tags written with `old` boundaries into these boundaries
    pub fn convert_from(&self, text: &str, old: &TagBoundaries) -> String {
        convert_tags(text, &old.start, &old.end, &self.start, &self.end)
    }
}

/// Convert tags from one syntax to another.
///
/// Every `old_start ... old_end` span becomes `new_start ... new_end`. An
/// old start marker with no end marker after it is left as it is.
pub fn convert_tags(
    text: &str,
    old_start: &str,
    old_end: &str,
    new_start: &str,
    new_end: &str,
) -> String {
    if old_start.is_empty() || old_end.is_empty() {
        return text.to_string();
    }

    let mut converted = String::with_capacity(text.len());
    let mut marker = 0;

    while let Some(start) = find_from(text, old_start, marker) {
        converted.push_str(&text[marker..start]);
        let body_start = start + old_start.len();

        match find_from(text, old_end, body_start) {
            Some(end) => {
                converted.push_str(new_start);
                converted.push_str(&text[body_start..end]);
                converted.push_str(new_end);
                marker = end + old_end.len();
            }
            None => {
                converted.push_str(old_start);
                marker = body_start;
            }
        }
    }

    converted.push_str(&text[marker..]);
    converted
}

/// Convert tags from another syntax to the default `{~...}` syntax
pub fn convert_tags_to_default(text: &str, old_start: &str, old_end: &str) -> String {
    convert_tags(text, old_start, old_end, DEFAULT_TAG_START, DEFAULT_TAG_END)
}
