//! The template set: named fragments loaded from a folder of template files
//!
//! A lookup resolves the name to a file, parses the whole file into
//! fragments on a cache miss, expands shorthand in each fragment and caches
//! them all, then answers from the cache.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use super::registry::{Clock, FragmentCache};
use super::resolver::{stub_for, PathResolver};
use super::source::{ContentSource, INCLUDE_PROTOCOL};
use crate::config::{FailMode, TemplateSetConfig};
use crate::error::TemplateError;
use crate::parser::{expand_shorthand, split_fragments};
use crate::tags::TagBoundaries;

#[derive(Debug, Clone)]
struct Settings {
    resolver: PathResolver,
    default_extension: String,
    tag_boundaries: TagBoundaries,
    fail_mode: FailMode,
}

/// A folder of template files and the cache of fragments parsed from them.
///
/// Share it between threads and compositions through `Arc<TemplateSet>`.
/// Settings can be changed through a shared reference; compositions that
/// were already made keep the tag boundaries they were made with.
#[derive(Debug)]
pub struct TemplateSet {
    settings: RwLock<Settings>,
    cache: FragmentCache,
    protocols: RwLock<Vec<Arc<dyn ContentSource>>>,
}

impl TemplateSet {
    /// Create a set reading templates from `base_dir` with default settings
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(TemplateSetConfig::new().with_base_dir(base_dir))
    }

    /// Create a set from a configuration
    pub fn from_config(config: TemplateSetConfig) -> Self {
        let base_dir = config.resolved_base_dir();
        tracing::debug!(base_dir = %base_dir.display(), "creating template set");

        let refresh = Duration::from_secs(config.refresh_minutes.saturating_mul(60));
        Self {
            settings: RwLock::new(Settings {
                resolver: PathResolver::new(base_dir),
                default_extension: config.default_extension,
                tag_boundaries: config.tag_boundaries,
                fail_mode: config.fail_mode,
            }),
            cache: FragmentCache::new(refresh),
            protocols: RwLock::new(Vec::new()),
        }
    }

    /// Use a different time source for cache freshness
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = self.cache.with_clock(clock);
        self
    }

    /// Get a fragment with the default extension and the configured fail mode
    pub fn get(&self, name: &str) -> Option<String> {
        let extension = self.default_extension();
        self.get_with_extension(name, &extension)
    }

    /// Get a fragment with the configured fail mode
    pub fn get_with_extension(&self, name: &str, extension: &str) -> Option<String> {
        let mode = self.fail_mode();
        self.fetch_with(name, extension, mode)
    }

    /// Get a fragment, reporting failures according to `mode`.
    ///
    /// In verbose mode a failed lookup returns a placeholder describing the
    /// failure, so the result is never `None`. In silent mode it returns
    /// `None`.
    pub fn fetch_with(&self, name: &str, extension: &str, mode: FailMode) -> Option<String> {
        match self.load(name, extension) {
            Ok(text) => Some(text),
            Err(err) => {
                match &err {
                    TemplateError::Io { .. } => {
                        tracing::warn!(error = %err, "failed to read template file")
                    }
                    TemplateError::NotFound { .. } => {
                        tracing::debug!(error = %err, "template not found")
                    }
                }
                match mode {
                    FailMode::Verbose => Some(err.placeholder()),
                    FailMode::Silent => None,
                }
            }
        }
    }

    /// Load a fragment from the cache, parsing its file on a miss
    pub fn load(&self, name: &str, extension: &str) -> Result<String, TemplateError> {
        if let Some(text) = self.cache.get(extension, name) {
            tracing::debug!(name, extension, "fragment cache hit");
            return Ok(text);
        }

        let path = self.template_path(name, extension);
        tracing::debug!(name, extension, path = %path.display(), "fragment cache miss");
        self.parse_file(name, extension, &path)?;

        self.cache
            .get(extension, name)
            .ok_or_else(|| TemplateError::not_found(name, extension, &path))
    }

    /// Split a whole file into fragments and cache every one of them
    fn parse_file(&self, name: &str, extension: &str, path: &Path) -> Result<(), TemplateError> {
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => TemplateError::not_found(name, extension, path),
            _ => TemplateError::io(name, extension, path, err),
        })?;

        let lines = LossyLines::new(BufReader::new(file));
        let count = self
            .cache_fragments(&stub_for(name), extension, lines)
            .map_err(|err| TemplateError::io(name, extension, path, err))?;

        tracing::debug!(path = %path.display(), fragments = count, "parsed template file");
        Ok(())
    }

    /// Split, expand and cache the fragments of one file. Nothing is cached
    /// unless every line was read.
    fn cache_fragments<I>(&self, stub: &str, extension: &str, lines: I) -> io::Result<usize>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        let mut fragments = Vec::new();
        split_fragments(stub, lines, |fragment| fragments.push(fragment))?;

        let count = fragments.len();
        for fragment in fragments {
            let body = expand_shorthand(stub, fragment.body);
            self.cache.put(extension, &fragment.name, body);
        }
        Ok(count)
    }

    /// Check whether a fragment exists, without producing a placeholder
    pub fn exists(&self, name: &str) -> bool {
        let extension = self.default_extension();
        self.fetch_with(name, &extension, FailMode::Silent).is_some()
    }

    /// The file a fragment name resolves to
    pub fn template_path(&self, name: &str, extension: &str) -> PathBuf {
        self.settings.read().resolver.resolve(name, extension)
    }

    /// Get the template folder
    pub fn base_dir(&self) -> PathBuf {
        self.settings.read().resolver.base_dir().to_path_buf()
    }

    /// Read templates from another folder. Cached fragments are kept.
    pub fn set_base_dir(&self, dir: impl Into<PathBuf>) {
        self.settings.write().resolver.set_base_dir(dir);
    }

    /// Get the default file extension
    pub fn default_extension(&self) -> String {
        self.settings.read().default_extension.clone()
    }

    /// Set the default file extension
    pub fn set_default_extension(&self, extension: impl Into<String>) {
        self.settings.write().default_extension = extension.into();
    }

    /// Get the cache refresh interval
    pub fn refresh_interval(&self) -> Duration {
        self.cache.refresh_interval()
    }

    /// Set how many minutes fragments stay fresh
    pub fn set_refresh_minutes(&self, minutes: u64) {
        self.cache
            .set_refresh_interval(Duration::from_secs(minutes.saturating_mul(60)));
    }

    /// Get the current tag boundaries
    pub fn tag_boundaries(&self) -> TagBoundaries {
        self.settings.read().tag_boundaries.clone()
    }

    /// Set the tag boundaries handed to new compositions
    pub fn set_tag_boundaries(&self, tags: TagBoundaries) {
        self.settings.write().tag_boundaries = tags;
    }

    /// Get the fail mode used by [`get`](Self::get)
    pub fn fail_mode(&self) -> FailMode {
        self.settings.read().fail_mode
    }

    /// Set the fail mode used by [`get`](Self::get)
    pub fn set_fail_mode(&self, mode: FailMode) {
        self.settings.write().fail_mode = mode;
    }

    /// Wrap a tag name in the current boundaries
    pub fn make_tag(&self, name: &str) -> String {
        self.settings.read().tag_boundaries.make_tag(name)
    }

    /// Rewrite tags written with other boundaries into the current ones
    pub fn convert_to_my_tags(&self, text: &str, old_start: &str, old_end: &str) -> String {
        let old = TagBoundaries::new(old_start, old_end);
        self.settings.read().tag_boundaries.convert_from(text, &old)
    }

    /// The fragment cache
    pub fn cache(&self) -> &FragmentCache {
        &self.cache
    }

    /// Drop every cached fragment
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Register an extra content source for compositions to route includes
    /// to. A source with the same protocol replaces the earlier one.
    pub fn add_protocol(&self, source: Arc<dyn ContentSource>) {
        let mut protocols = self.protocols.write();
        match protocols
            .iter_mut()
            .find(|existing| existing.protocol() == source.protocol())
        {
            Some(existing) => *existing = source,
            None => protocols.push(source),
        }
    }

    /// The registered extra content sources
    pub fn protocols(&self) -> Vec<Arc<dyn ContentSource>> {
        self.protocols.read().clone()
    }

    /// A view of the templates under the `context` subfolder
    pub fn subset(self: &Arc<Self>, context: impl Into<String>) -> TemplateSetSlice {
        TemplateSetSlice {
            parent: Arc::clone(self),
            context: context.into(),
        }
    }
}

impl ContentSource for TemplateSet {
    fn fetch(&self, name: &str) -> Option<String> {
        self.get(name)
    }

    fn provides(&self, name: &str) -> bool {
        self.exists(name)
    }

    fn protocol(&self) -> &str {
        INCLUDE_PROTOCOL
    }
}

/// Lines of a reader, with invalid UTF-8 replaced rather than rejected.
///
/// Strips the `\n` or `\r\n` terminator like [`BufRead::lines`].
struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

/// Templates under a subfolder of a parent set, sharing its cache
#[derive(Clone)]
pub struct TemplateSetSlice {
    parent: Arc<TemplateSet>,
    context: String,
}

impl TemplateSetSlice {
    /// The subfolder names are resolved in
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The name the parent set is asked for
    fn qualify(&self, name: &str) -> String {
        let context = self.context.trim_end_matches(['/', '\\']);
        if context.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", context, name)
        }
    }
}

// The parent may hold this slice as a protocol; print only its folder
impl fmt::Debug for TemplateSetSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSetSlice")
            .field("base_dir", &self.parent.base_dir())
            .field("context", &self.context)
            .finish()
    }
}

impl ContentSource for TemplateSetSlice {
    fn fetch(&self, name: &str) -> Option<String> {
        self.parent.get(&self.qualify(name))
    }

    fn provides(&self, name: &str) -> bool {
        self.parent.exists(&self.qualify(name))
    }

    fn protocol(&self) -> &str {
        INCLUDE_PROTOCOL
    }
}
