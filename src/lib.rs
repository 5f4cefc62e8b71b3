//! Template Fragments - preprocessing and caching of template sources
//!
//! Template files hold named fragments (`{#name} ... {#}`), comments
//! (`{!-- ... --}`) and shorthand tags (`{+#row}`). This crate splits files
//! into fragments, strips comments, expands shorthand into canonical
//! directives and serves the results from a time-based cache.
//!
//! # Example
//!
//! ```rust
//! use template_fragments::{expand_shorthand, split_source};
//!
//! let fragments = split_source("page", "Hello {+#row}!{#row}<tr/>{#}");
//! let page = fragments.iter().find(|f| f.name == "page").unwrap();
//! let row = fragments.iter().find(|f| f.name == "page.row").unwrap();
//!
//! assert_eq!(row.body, "<tr/>");
//! assert_eq!(
//!     expand_shorthand("page", page.body.clone()),
//!     "Hello {~.include.page#row}!"
//! );
//! ```
//!
//! Loading from disk goes through a [`TemplateSet`]:
//!
//! ```rust,no_run
//! use template_fragments::TemplateSet;
//!
//! let set = TemplateSet::new("templates");
//! // templates/page.html, fragment `row`
//! let row = set.get("page#row");
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod tags;
pub mod template;

pub use config::{ConfigError, FailMode, TemplateSetConfig, FOLDER_ENV_VAR};
pub use error::TemplateError;
pub use parser::{expand_shorthand, next_unescaped, split_fragments, split_source, SplitFragment};
pub use tags::{convert_tags, convert_tags_to_default, TagBoundaries};
pub use template::{
    Composition, ContentSource, FragmentCache, FragmentFactory, InMemorySource, TemplateSet,
    TemplateSetSlice,
};
