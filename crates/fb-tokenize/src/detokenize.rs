//! Reverses tokenization for snippet display.
//!
//! Hex escapes decode back to their original bytes (variable-length, so
//! multi-byte UTF-8 characters survive), whitespace collapses around the
//! decoded punctuation, and camelCase splits are glued back together.

use std::sync::OnceLock;

use regex::Regex;

fn hex_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^T((?:[0-9a-f]{2})+)K$").unwrap())
}

fn camel_glue_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z]) ([A-Z][a-z])").unwrap())
}

/// Detokenize a token string with no highlight markers.
pub fn detokenize(tokens: &str) -> String {
    detokenize_marked(tokens, "", "")
}

/// Detokenize a token string that may carry highlight markers around
/// matched tokens (as emitted by the search snippet function).
///
/// Markers present on both sides of a token are preserved outside the
/// decoded text; adjacent `<end><start>` pairs are elided so runs of
/// highlighted tokens merge into one span.
pub fn detokenize_marked(tokens: &str, mark_start: &str, mark_end: &str) -> String {
    let mut out = String::with_capacity(tokens.len());
    let mut prev_was_word = false;

    for raw in tokens.split_whitespace() {
        let mut token = raw;
        let mut marked = false;
        if !mark_start.is_empty() {
            if let Some(stripped) = token
                .strip_prefix(mark_start)
                .and_then(|t| t.strip_suffix(mark_end))
            {
                token = stripped;
                marked = true;
            }
        }

        let (text, is_word) = match hex_token_re().captures(token) {
            Some(caps) => (decode_hex(&caps[1]), false),
            None => (token.to_string(), true),
        };

        if prev_was_word && is_word && !out.is_empty() {
            out.push(' ');
        }
        if marked {
            out.push_str(mark_start);
        }
        out.push_str(&text);
        if marked {
            out.push_str(mark_end);
        }
        prev_was_word = is_word;
    }

    if !mark_start.is_empty() {
        let adjacent = format!("{mark_end}{mark_start}");
        let spaced = format!("{mark_end} {mark_start}");
        while out.contains(&adjacent) || out.contains(&spaced) {
            out = out.replace(&adjacent, "");
            out = out.replace(&spaced, " ");
        }
    }

    glue_camel(&out, mark_start, mark_end)
}

/// Re-join camelCase words split by the tokenizer: a lowercase letter, a
/// space, then an uppercase letter followed by a lowercase letter. A marker
/// boundary between the two halves is allowed and preserved. Applied
/// repeatedly until stable because matches cannot overlap within one pass.
fn glue_camel(s: &str, mark_start: &str, mark_end: &str) -> String {
    let marked = if mark_start.is_empty() && mark_end.is_empty() {
        None
    } else {
        Regex::new(&format!(
            r"([a-z])((?:{end})?) ((?:{start})?[A-Z][a-z])",
            end = regex::escape(mark_end),
            start = regex::escape(mark_start),
        ))
        .ok()
    };
    let (re, replacement) = match &marked {
        Some(re) => (re, "${1}${2}${3}"),
        None => (camel_glue_re(), "$1$2"),
    };
    let mut cur = s.to_string();
    loop {
        let next = re.replace_all(&cur, replacement).into_owned();
        if next == cur {
            return cur;
        }
        cur = next;
    }
}

/// Decode an even-length lowercase hex run into text.
fn decode_hex(hex: &str) -> String {
    let bytes: Vec<u8> = hex
        .as_bytes()
        .chunks(2)
        .filter_map(|pair| {
            let s = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(s, 16).ok()
        })
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
