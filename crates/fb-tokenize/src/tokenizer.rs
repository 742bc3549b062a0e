//! Splits source text into the canonical token string.
//!
//! The same function runs over indexed text and over query leaves, so the
//! stored index and the search query share one vocabulary. Word-character
//! runs pass through (split at `_`, camelCase transitions, and word
//! boundaries); every maximal run of other characters is hex-escaped into a
//! single `T<hex>K` token so the full-text backend cannot strip it.

/// Tokenize arbitrary source text into a space-separated token string.
///
/// Splitting happens at whitespace, underscores, lowercase→uppercase
/// transitions, and every word/non-word boundary. Double quotes are
/// rewritten to single quotes before escaping, collapsing the two string
/// styles into one token.
pub fn tokenize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut word = String::new();
    let mut punct: Vec<u8> = Vec::new();
    let mut prev_lower = false;

    let push_part = |part: &mut String, out: &mut String| {
        if !part.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(part);
            part.clear();
        }
    };
    let flush_punct = |punct: &mut Vec<u8>, out: &mut String| {
        if !punct.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push('T');
            for b in punct.iter() {
                out.push_str(&format!("{:02x}", b));
            }
            out.push('K');
            punct.clear();
        }
    };

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            flush_punct(&mut punct, &mut out);
            if prev_lower && ch.is_ascii_uppercase() {
                push_part(&mut word, &mut out);
            }
            word.push(ch);
            prev_lower = ch.is_ascii_lowercase();
        } else if ch == '_' || ch.is_whitespace() {
            // Separators: close both runs, emit nothing.
            push_part(&mut word, &mut out);
            flush_punct(&mut punct, &mut out);
            prev_lower = false;
        } else {
            push_part(&mut word, &mut out);
            prev_lower = false;
            let ch = if ch == '"' { '\'' } else { ch };
            let mut buf = [0u8; 4];
            punct.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
    }
    push_part(&mut word, &mut out);
    flush_punct(&mut punct, &mut out);
    out
}
