//! Password scrubbing for serialized log envelopes.
//!
//! The log line is JSON-encoded and then embedded as a string inside the
//! outer envelope, and request bodies are themselves encoded strings inside
//! the log line. A `password` key can therefore appear at any escaping depth:
//! `"password":"x"`, `\"password\":\"x\"`, `\\\"password\\\":\\\"x\\\"`, ...
//! The scanner measures the backslash run `d` in front of the key's opening
//! quote and treats a later quote as structural when its run `n` satisfies
//! `n >= d` and `(n - d) % (2 * (d + 1)) == 0`. Shorter or odd runs belong to
//! escaped content inside the value.

/// Replacement written in place of every password value.
pub const MASK: &str = "*****";

const KEY: &str = "password";

/// Mask every `password` value in a serialized JSON string.
///
/// Everything outside the masked values is left byte-identical. Input with no
/// complete `password` field is returned unchanged.
pub fn redact_passwords(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(offset) = input[search..].find(KEY) {
        let key_start = search + offset;
        search = key_start + KEY.len();

        if let Some((value_start, value_end)) = locate_value(bytes, key_start) {
            out.push_str(&input[copied..value_start]);
            out.push_str(MASK);
            copied = value_end;
            search = value_end;
        }
    }

    out.push_str(&input[copied..]);
    out
}

/// Given the byte offset of a `password` token, return the byte range of its
/// string value if the token is a complete key at some escaping depth.
fn locate_value(bytes: &[u8], key_start: usize) -> Option<(usize, usize)> {
    // Opening quote of the key, then the run of backslashes escaping it.
    let open_quote = key_start.checked_sub(1)?;
    if bytes[open_quote] != b'"' {
        return None;
    }
    let depth = backslashes_before(bytes, open_quote);

    let mut pos = key_start + KEY.len();
    pos = expect_quote(bytes, pos, depth)?;
    pos = skip_whitespace(bytes, pos);
    if bytes.get(pos) != Some(&b':') {
        return None;
    }
    pos = skip_whitespace(bytes, pos + 1);
    let value_start = expect_quote(bytes, pos, depth)?;

    let mut scan = value_start;
    while scan < bytes.len() {
        if bytes[scan] == b'"' && is_structural(backslashes_before(bytes, scan), depth) {
            return Some((value_start, scan - depth));
        }
        scan += 1;
    }
    None
}

/// Expect `depth` backslashes followed by a quote at `pos`; return the offset
/// just past the quote.
fn expect_quote(bytes: &[u8], pos: usize, depth: usize) -> Option<usize> {
    let quote = pos + depth;
    if bytes.get(quote) != Some(&b'"') {
        return None;
    }
    if bytes[pos..quote].iter().any(|b| *b != b'\\') {
        return None;
    }
    Some(quote + 1)
}

fn is_structural(run: usize, depth: usize) -> bool {
    run >= depth && (run - depth) % (2 * (depth + 1)) == 0
}

fn backslashes_before(bytes: &[u8], pos: usize) -> usize {
    bytes[..pos].iter().rev().take_while(|b| **b == b'\\').count()
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}
