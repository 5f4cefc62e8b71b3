//! Shorthand tag expansion
//!
//! Rewrites abbreviated tag syntax into canonical directives once, when a
//! fragment is cached, so downstream consumers only ever see long-form tags:
//!
//! ```text
//! {+#sub}            => {~.include.page#sub}
//! {+(cond)#sub}      => {~.includeIf(cond).page#sub}
//! {^include.#sub}    => {~.include.page#sub}
//! {* #card}          => {* page#card}
//! {~x|nomatch(+#y)}  => {~x|nomatch(~.include.page#y)}
//! {~.loop(d,#row)}   => {~.loop(d,page#row)}
//! ```
//!
//! where `page` is the file stub of the fragment being expanded.

use super::delimiter::{find_from, next_unescaped};
use super::{
    DEFAULT_TAG_END, DEFAULT_TAG_START, INCLUDE_SHORTHAND, MACRO_NAME_END, MACRO_START,
    PROTOCOL_SHORTHAND,
};

/// Expand every shorthand tag in `template`.
///
/// `stub` is the file stub of the file the fragment came from (see
/// [`file_stub`]); it is spliced into hash references as is, so every
/// fragment of one file expands against the same stub. Expansion stops at
/// the first unterminated tag, leaving the rest of the buffer untouched.
pub fn expand_shorthand(stub: &str, template: String) -> String {
    let mut expander = Expander {
        buf: template,
        stub,
    };
    expander.run();
    expander.buf
}

/// The file-identifying prefix of a qualified fragment name: everything
/// before the first dot after the last path separator.
pub fn file_stub(name: &str) -> &str {
    let dir_end = name.rfind(['/', '\\']).map_or(0, |sep| sep + 1);
    match name[dir_end..].find('.') {
        Some(dot) if dir_end + dot > 0 => &name[..dir_end + dot],
        _ => name,
    }
}

/// What kind of tag starts at a `{`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Include,
    Tag,
    Protocol,
    Macro,
    /// Not a tag; skip this many bytes
    Other(usize),
}

impl TagKind {
    /// Classify the text starting at an opening brace. `None` if the brace
    /// is the last character of the buffer.
    fn at(text: &str) -> Option<Self> {
        let after = text[1..].chars().next()?;
        let kind = if text.starts_with(INCLUDE_SHORTHAND) {
            Self::Include
        } else if text.starts_with(DEFAULT_TAG_START) {
            Self::Tag
        } else if text.starts_with(PROTOCOL_SHORTHAND) {
            Self::Protocol
        } else if text.starts_with(MACRO_START) {
            Self::Macro
        } else {
            Self::Other(1 + after.len_utf8())
        };
        Some(kind)
    }
}

struct Expander<'a> {
    buf: String,
    stub: &'a str,
}

impl Expander<'_> {
    fn run(&mut self) {
        let mut cursor = self.buf.find('{');

        while let Some(open) = cursor {
            let Some(kind) = TagKind::at(&self.buf[open..]) else {
                return;
            };

            let resume = match kind {
                TagKind::Include => self.include(open),
                TagKind::Tag => self.tag(open),
                TagKind::Protocol => {
                    // Caret is shorthand for `~.`; reprocess the rewritten tag
                    self.buf.replace_range(open + 1..open + 2, "~.");
                    Some(open)
                }
                TagKind::Macro => self.macro_call(open),
                TagKind::Other(len) => Some(open + len),
            };

            let Some(resume) = resume else {
                tracing::warn!(
                    stub = self.stub,
                    offset = open,
                    "unterminated tag, shorthand expansion stopped"
                );
                return;
            };
            cursor = find_from(&self.buf, "{", resume);
        }
    }

    /// `{+#name}` and `{+(cond)#name}`
    fn include(&mut self, open: usize) -> Option<usize> {
        match *self.buf.as_bytes().get(open + 2)? {
            b'#' => {
                let expanded = format!("~.include.{}", self.stub);
                self.buf.replace_range(open + 1..open + 2, &expanded);
                find_from(&self.buf, DEFAULT_TAG_END, open + 1 + expanded.len())
            }
            b'(' => {
                let cond_end = next_unescaped(&self.buf, ")", open + 3)?;
                if *self.buf.as_bytes().get(cond_end + 1)? != b'#' {
                    return Some(cond_end + 1);
                }
                let expanded = format!(
                    "~.includeIf{}.{}",
                    &self.buf[open + 2..=cond_end],
                    self.stub
                );
                self.buf.replace_range(open + 1..=cond_end, &expanded);
                find_from(&self.buf, DEFAULT_TAG_END, open + 1 + expanded.len())
            }
            _ => Some(open + 2),
        }
    }

    /// Long-form `{~...}` tags with hash references inside
    fn tag(&mut self, open: usize) -> Option<usize> {
        let body_start = open + DEFAULT_TAG_START.len();
        let tag_end = next_unescaped(&self.buf, DEFAULT_TAG_END, body_start)?;
        let directive = &self.buf[body_start..tag_end];

        let expanded = if directive.starts_with(".loop") || directive.starts_with(".grid") {
            splice_fn_args(directive, self.stub)
        } else {
            splice_hash_refs(directive, self.stub)
        };

        let tag_end = match expanded {
            Some(expanded) => {
                self.buf.replace_range(body_start..tag_end, &expanded);
                body_start + expanded.len()
            }
            None => tag_end,
        };
        Some(tag_end + DEFAULT_TAG_END.len())
    }

    /// `{* #name}` macro invocations
    fn macro_call(&mut self, open: usize) -> Option<usize> {
        let mut offset = open + MACRO_START.len();
        while self.buf.as_bytes().get(offset) == Some(&b' ') {
            offset += 1;
        }

        let name_from = if *self.buf.as_bytes().get(offset)? == b'#' {
            self.buf.insert_str(offset, self.stub);
            offset + self.stub.len() + 1
        } else {
            offset
        };

        match find_from(&self.buf, MACRO_NAME_END, name_from) {
            Some(end) => Some(end + MACRO_NAME_END.len()),
            None => Some(open + 1),
        }
    }
}

/// Splice the stub into `,+#`, `:+#`, `(+#`, `).#` and `e.#` references.
///
/// The `+` forms become full `~.include.` references. Returns `None` when
/// nothing changed.
fn splice_hash_refs(directive: &str, stub: &str) -> Option<String> {
    let bytes = directive.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;

    for (hash, _) in directive.match_indices('#') {
        if hash < 2 {
            continue;
        }
        let (a, b) = (bytes[hash - 2], bytes[hash - 1]);

        if b == b'+' && matches!(a, b',' | b':' | b'(') {
            let out = out.get_or_insert_with(String::new);
            out.push_str(&directive[copied..hash - 1]);
            out.push_str("~.include.");
            out.push_str(stub);
            copied = hash;
        } else if b == b'.' && matches!(a, b')' | b'e') {
            let out = out.get_or_insert_with(String::new);
            out.push_str(&directive[copied..hash]);
            out.push_str(stub);
            copied = hash;
        }
    }

    out.map(|mut out| {
        out.push_str(&directive[copied..]);
        out
    })
}

/// Splice the stub before every `#` that follows `"`, `,`, a space or `(`
/// in `.loop(...)` / `.grid(...)` argument lists.
fn splice_fn_args(directive: &str, stub: &str) -> Option<String> {
    let bytes = directive.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;

    for (hash, _) in directive.match_indices('#') {
        if hash < 2 {
            continue;
        }
        if matches!(bytes[hash - 1], b'"' | b',' | b' ' | b'(') {
            let out = out.get_or_insert_with(String::new);
            out.push_str(&directive[copied..hash]);
            out.push_str(stub);
            copied = hash;
        }
    }

    out.map(|mut out| {
        out.push_str(&directive[copied..]);
        out
    })
}
