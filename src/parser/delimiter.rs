//! Escape-aware delimiter search
//!
//! Every component that needs to find "the real closing marker" goes through
//! [`next_unescaped`], so they all agree on what an escape is.

/// Find the first unescaped occurrence of `delim` in `text` at or after `from`.
///
/// An occurrence is escaped when it is immediately preceded by an odd number
/// of consecutive backslashes. Only backslashes at or after `from` are
/// counted. Returns the byte offset of the delimiter, or `None`.
pub fn next_unescaped(text: &str, delim: &str, from: usize) -> Option<usize> {
    if delim.is_empty() || from > text.len() {
        return None;
    }

    let bytes = text.as_bytes();
    let mut search = from;

    loop {
        let pos = search + text.get(search..)?.find(delim)?;

        let backslashes = bytes[from..pos]
            .iter()
            .rev()
            .take_while(|&&b| b == b'\\')
            .count();

        if backslashes % 2 == 0 {
            return Some(pos);
        }

        // Escaped; keep looking past this candidate
        search = pos + delim.chars().next().map_or(1, char::len_utf8);
    }
}

/// Find `needle` in `text` at or after `from`, without escape handling.
pub(crate) fn find_from(text: &str, needle: &str, from: usize) -> Option<usize> {
    text.get(from..)?.find(needle).map(|pos| pos + from)
}
