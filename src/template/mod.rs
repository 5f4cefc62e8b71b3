//! Template sets and the collaborators built around them
//!
//! A [`TemplateSet`] maps fragment names such as `page.row` or
//! `themes/page#row` to files under its folder, parses each file into
//! fragments on first use and keeps them in a [`FragmentCache`].
//! [`Composition`]s carry template text together with the content sources
//! their includes are routed to.

mod composition;
mod registry;
mod resolver;
mod set;
mod source;

pub use composition::{Composition, FragmentFactory};
pub use registry::{
    fragment_key, CachedFragment, Clock, FragmentCache, ManualClock, SystemClock, MIN_FRESHNESS,
};
pub use resolver::{stub_for, PathResolver};
pub use set::{TemplateSet, TemplateSetSlice};
pub use source::{ContentSource, InMemorySource, INCLUDE_PROTOCOL};
