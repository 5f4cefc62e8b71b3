//! Fragment splitter - carves a template file into named fragments
//!
//! A file may define nested subtemplates:
//!
//! ```text
//! page header
//! {#row}
//! <tr>{~cells}</tr>
//! {#}
//! {!-- comments vanish entirely --}
//! ```
//!
//! Splitting the file with stub `page` yields the fragments `page` and
//! `page.row`. Fragments are handed to a sink as soon as they are closed, so
//! nested fragments arrive before their parents and the top-level fragment
//! always arrives last.

use std::convert::Infallible;
use std::iter::Peekable;

use super::delimiter::{find_from, next_unescaped};
use super::{COMMENT_END, COMMENT_START, SUB_END, SUB_NAME_END, SUB_START};

/// One fragment produced by the splitter, before shorthand expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFragment {
    /// Qualified name, e.g. `page.outer.inner`
    pub name: String,
    /// Comment-stripped body with nested fragments removed
    pub body: String,
}

/// Split a stream of lines into fragments.
///
/// `stub` names the top-level fragment. Every fragment is passed to `sink`
/// as soon as it is fully delimited. Malformed markers never fail the split;
/// only an error from the line source is propagated.
pub fn split_fragments<I, E, F>(stub: &str, lines: I, sink: F) -> Result<(), E>
where
    I: IntoIterator<Item = Result<String, E>>,
    F: FnMut(SplitFragment),
{
    let mut splitter = Splitter {
        lines: lines.into_iter().peekable(),
        sink,
    };
    splitter.read_fragment(stub.to_string(), None)?;
    Ok(())
}

/// Split an in-memory source text into fragments, top-level fragment last
pub fn split_source(stub: &str, source: &str) -> Vec<SplitFragment> {
    let mut fragments = Vec::new();
    let lines = source.lines().map(|line| Ok::<_, Infallible>(line.to_string()));
    match split_fragments(stub, lines, |fragment| fragments.push(fragment)) {
        Ok(()) => fragments,
        Err(never) => match never {},
    }
}

/// How the scan of a single line ended
enum LineEnd {
    /// The line was consumed into the current fragment; `true` if it
    /// contributed any text
    Open(bool),
    /// A nested fragment swallowed the rest of the line
    Swallowed,
    /// The current fragment closed; carries the rest of the line
    Closed(String),
}

struct Splitter<I: Iterator, F> {
    lines: Peekable<I>,
    sink: F,
}

impl<I, E, F> Splitter<I, F>
where
    I: Iterator<Item = Result<String, E>>,
    F: FnMut(SplitFragment),
{
    fn has_more(&mut self) -> bool {
        self.lines.peek().is_some()
    }

    fn next_line(&mut self) -> Result<Option<String>, E> {
        self.lines.next().transpose()
    }

    /// Read one fragment. `first_line` is the rest of the line after a
    /// nested opening marker, `None` for the top-level fragment. Returns
    /// whatever followed the fragment's close marker on its last line.
    fn read_fragment(&mut self, name: String, first_line: Option<String>) -> Result<String, E> {
        let nested = first_line.is_some();
        let mut on_first_line = nested;
        let mut pending = first_line;
        let mut body = String::new();

        loop {
            let line = match pending.take() {
                Some(line) => line,
                None => match self.next_line()? {
                    Some(line) => line,
                    None => break,
                },
            };

            match self.scan_line(&name, nested, line, &mut body)? {
                LineEnd::Closed(rest) => {
                    self.emit(name, body);
                    return Ok(rest);
                }
                LineEnd::Swallowed => {}
                LineEnd::Open(wrote) => {
                    // An empty first line of a nested fragment adds no newline
                    if self.has_more() && (wrote || !on_first_line) {
                        body.push('\n');
                    }
                }
            }
            on_first_line = false;
        }

        if nested {
            tracing::warn!(fragment = %name, "subtemplate not closed before end of file");
        }
        self.emit(name, body);
        Ok(String::new())
    }

    fn scan_line(
        &mut self,
        name: &str,
        nested: bool,
        mut line: String,
        body: &mut String,
    ) -> Result<LineEnd, E> {
        let mut wrote = false;

        loop {
            line = self.strip_comments(line)?;

            let Some(marker) = line.find(SUB_START) else {
                wrote |= !line.is_empty();
                body.push_str(&line);
                return Ok(LineEnd::Open(wrote));
            };

            if line[marker..].starts_with(SUB_END) {
                if nested {
                    body.push_str(&line[..marker]);
                    return Ok(LineEnd::Closed(line[marker + SUB_END.len()..].to_string()));
                }
                tracing::warn!(fragment = %name, "ignoring subtemplate end marker with no opening");
                let after = marker + SUB_END.len();
                body.push_str(&line[..after]);
                wrote = true;
                line.replace_range(..after, "");
                continue;
            }

            let name_start = marker + SUB_START.len();
            let Some(name_end) = find_from(&line, SUB_NAME_END, name_start) else {
                wrote |= !line.is_empty();
                body.push_str(&line);
                return Ok(LineEnd::Open(wrote));
            };

            body.push_str(&line[..marker]);
            wrote |= marker > 0;

            let child = format!("{}.{}", name, &line[name_start..name_end]);
            let rest = line[name_end + SUB_NAME_END.len()..].to_string();
            line = self.read_fragment(child, Some(rest))?;

            // Nothing left after the nested fragment: no blank line in its place
            if line.is_empty() {
                return Ok(LineEnd::Swallowed);
            }
        }
    }

    /// Strip every comment that starts before the first subtemplate marker,
    /// rescanning the line after each strip.
    fn strip_comments(&mut self, mut line: String) -> Result<String, E> {
        loop {
            let Some(start) = line.find(COMMENT_START) else {
                return Ok(line);
            };
            if matches!(line.find(SUB_START), Some(sub) if sub < start) {
                return Ok(line);
            }
            line = self.strip_comment(line, start)?;
        }
    }

    /// Remove one comment starting at `start`, eating lines until its end
    /// marker. An unterminated comment swallows the rest of the input.
    fn strip_comment(&mut self, line: String, start: usize) -> Result<String, E> {
        let before = &line[..start];

        if let Some(end) = next_unescaped(&line, COMMENT_END, start + COMMENT_START.len()) {
            return Ok(format!("{}{}", before, &line[end + COMMENT_END.len()..]));
        }

        while let Some(next) = self.next_line()? {
            if let Some(end) = next_unescaped(&next, COMMENT_END, 0) {
                return Ok(format!("{}{}", before, &next[end + COMMENT_END.len()..]));
            }
        }

        tracing::warn!("comment not closed before end of file");
        Ok(before.to_string())
    }

    fn emit(&mut self, name: String, body: String) {
        tracing::trace!(fragment = %name, len = body.len(), "fragment delimited");
        (self.sink)(SplitFragment { name, body });
    }
}
