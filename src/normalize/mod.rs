//! SQL text and parameter normalization.
//!
//! Every statement handed to a concrete adapter passes through this pipeline
//! before it reaches the driver, in order:
//!
//! 1. dialect-idiom rewrite (`INSERT OR IGNORE` → `ON CONFLICT DO NOTHING`),
//! 2. placeholder rewrite (`?` → the target dialect's positional form),
//! 3. parameter-shape normalization (a single sequence argument is unwrapped).
//!
//! The placeholder rewrite skips quoted strings, comments, and dollar-quoted
//! blocks via a lightweight state machine, so a literal `'?'` in data is never
//! touched. `?N`-style placeholders that are already positional pass through
//! unchanged.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

mod scanner;

use scanner::{
    State, has_following_digits, is_block_comment_end, is_block_comment_start,
    is_line_comment_start, is_word_at, matches_tag, try_start_dollar_quote,
};

use crate::dialect::DialectRenderer;
use crate::types::SqlValue;

/// Rewrite each bare `?` to the dialect's positional placeholder, numbering
/// left to right starting at `start + 1`.
///
/// Returns the rewritten text (borrowed when nothing changed) and the number
/// of placeholders rewritten.
#[must_use]
pub fn rewrite_placeholders<'a>(
    sql: &'a str,
    renderer: &dyn DialectRenderer,
    start: usize,
) -> (Cow<'a, str>, usize) {
    let mut out: Option<String> = None;
    // Byte index up to which the input has been flushed into `out`. Untouched
    // spans are copied verbatim as slices, so multi-byte text survives.
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;
    let mut count = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => state = State::BlockComment(1),
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                b'?' if !has_following_digits(bytes, idx + 1) => {
                    count += 1;
                    let buf = out.get_or_insert_with(String::new);
                    buf.push_str(&sql[copied..idx]);
                    buf.push_str(&renderer.placeholder(start + count));
                    copied = idx + 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len;
                }
            }
        }

        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            (Cow::Owned(buf), count)
        }
        None => (Cow::Borrowed(sql), 0),
    }
}

/// Case-insensitive, word-bounded check for a `RETURNING` clause outside
/// string literals, comments, and dollar-quoted blocks. A literal containing
/// the word (`SET note = 'RETURNING soon'`) does not count.
#[must_use]
pub fn has_returning_clause(sql: &str) -> bool {
    let bytes = sql.as_bytes();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => state = State::BlockComment(1),
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                b'r' | b'R' if is_word_at(bytes, idx, b"returning") => return true,
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len;
                }
            }
        }

        idx += 1;
    }

    false
}

static INSERT_OR_IGNORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*INSERT\s+OR\s+IGNORE\s+INTO\b").expect("static regex")
});

/// Rewrite the SQLite `INSERT OR IGNORE` idiom into the Postgres equivalent
/// (`INSERT ... ON CONFLICT DO NOTHING`), preserving a trailing statement
/// terminator if one is present. Statements without the idiom pass through
/// borrowed.
#[must_use]
pub fn rewrite_insert_or_ignore(sql: &str) -> Cow<'_, str> {
    if !INSERT_OR_IGNORE.is_match(sql) {
        return Cow::Borrowed(sql);
    }

    let rewritten = INSERT_OR_IGNORE.replace(sql, "INSERT INTO");
    let trimmed = rewritten.trim_end();
    let result = if let Some(body) = trimmed.strip_suffix(';') {
        format!("{} ON CONFLICT DO NOTHING;", body.trim_end())
    } else {
        format!("{trimmed} ON CONFLICT DO NOTHING")
    };
    Cow::Owned(result)
}

/// Unwrap a parameter slice whose single element is itself a sequence.
///
/// Supports both `run(sql, &[a, b])` and `run(sql, &[SqlValue::Array(vec![a, b])])`
/// call shapes; anything else is used as-is.
#[must_use]
pub fn normalize_params(params: &[SqlValue]) -> Cow<'_, [SqlValue]> {
    match params {
        [SqlValue::Array(inner)] => Cow::Owned(inner.clone()),
        _ => Cow::Borrowed(params),
    }
}
