//! Text-level preprocessing for template sources
//!
//! Template files are split into named fragments, stripped of comments and
//! have their shorthand tags rewritten into canonical directives before they
//! ever reach a cache.

pub mod delimiter;
pub mod shorthand;
pub mod splitter;

pub use delimiter::next_unescaped;
pub use shorthand::expand_shorthand;
pub use splitter::{split_fragments, split_source, SplitFragment};

/// Default opening marker of a tag
pub const DEFAULT_TAG_START: &str = "{~";
/// Default closing marker of a tag
pub const DEFAULT_TAG_END: &str = "}";

/// Opening marker of a macro invocation
pub const MACRO_START: &str = "{*";
/// Terminator of a macro name
pub const MACRO_NAME_END: &str = "}";
/// Closing marker of a macro invocation
pub const MACRO_END: &str = "{*}";
/// Opening marker of a macro argument binding
pub const MACRO_LET: &str = "{=";
/// Closing marker of a macro argument binding
pub const MACRO_LET_END: &str = "}";
/// Opening marker of an include shorthand
pub const INCLUDE_SHORTHAND: &str = "{+";
/// Opening marker of a protocol shorthand
pub const PROTOCOL_SHORTHAND: &str = "{^";

pub(crate) const SUB_START: &str = "{#";
pub(crate) const SUB_NAME_END: &str = "}";
pub(crate) const SUB_END: &str = "{#}";
pub(crate) const COMMENT_START: &str = "{!--";
pub(crate) const COMMENT_END: &str = "--}";
