//! Single-character classification used by every parser in the crate.

/// `[A-Za-z-]`, the characters rule names and class names are made of
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-'
}

pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// ASCII printable, space through tilde
pub fn is_printable(c: char) -> bool {
    (' '..='~').contains(&c)
}

/// Space, form feed, line feed, carriage return and tab
pub fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\u{c}' | '\n' | '\r' | '\t')
}

/// Return the offset of the first non-whitespace character at or after `pos`,
/// clamped to the length of the input. A `pos` inside a multi-byte character
/// moves forward to the next character.
pub fn skip_whitespace(input: &str, pos: usize) -> usize {
    let mut pos = pos.min(input.len());
    while !input.is_char_boundary(pos) {
        pos += 1;
    }

    input[pos..]
        .char_indices()
        .find(|&(_, c)| !is_whitespace(c))
        .map(|(offset, _)| pos + offset)
        .unwrap_or(input.len())
}

/// Tail-based form of `skip_whitespace`, for the parsers that work on the
/// unconsumed remainder of the input.
pub(crate) fn trim_whitespace(tail: &str) -> &str {
    &tail[skip_whitespace(tail, 0)..]
}
