//! Scanning helpers shared by the extractors.

/// Number of leading bytes to inspect for binary detection.
const BINARY_CHECK_SIZE: usize = 8192;

/// Returns `true` if the buffer appears to contain binary (non-text) data.
/// Detection: presence of null bytes in the first 8 KB.
pub fn is_binary(content: &[u8]) -> bool {
    let check_len = content.len().min(BINARY_CHECK_SIZE);
    content[..check_len].contains(&0)
}

/// Byte offsets at which each line starts. Line numbers are 1-indexed
/// throughout the extractors.
pub fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0usize];
    for (idx, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

/// 1-indexed line number containing the byte at `offset`.
pub fn line_of(starts: &[usize], offset: usize) -> u32 {
    match starts.binary_search(&offset) {
        Ok(idx) => idx as u32 + 1,
        Err(idx) => idx as u32,
    }
}

/// Number of lines in `text` (a trailing newline does not open a new line).
pub fn count_lines(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    let newlines = text.bytes().filter(|b| *b == b'\n').count() as u32;
    if text.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

/// Comment and string syntax a brace matcher must skip.
#[derive(Debug, Clone, Copy)]
pub struct BraceSyntax {
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    pub string_quotes: &'static [char],
}

impl BraceSyntax {
    pub const PHP: Self = Self {
        line_comments: &["//", "#"],
        block_comment: Some(("/*", "*/")),
        string_quotes: &['\'', '"'],
    };

    pub const JS: Self = Self {
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        string_quotes: &['\'', '"', '`'],
    };

    pub const CSS: Self = Self {
        line_comments: &[],
        block_comment: Some(("/*", "*/")),
        string_quotes: &['\'', '"'],
    };
}

/// Find the byte offset of the `}` closing the `{` at `open`, honoring the
/// language's comments and quoted strings (with backslash escapes).
/// Returns `None` when the brace never closes.
pub fn match_brace(text: &str, open: usize, syntax: BraceSyntax) -> Option<usize> {
    let bytes = text.as_bytes();
    debug_assert_eq!(bytes.get(open), Some(&b'{'));

    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        // Line comments run to end of line.
        if let Some(prefix) = syntax
            .line_comments
            .iter()
            .find(|p| text[i..].starts_with(**p))
        {
            i += prefix.len();
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        // Block comments run to their terminator (or EOF).
        if let Some((start, end)) = syntax.block_comment {
            if text[i..].starts_with(start) {
                i += start.len();
                match text[i..].find(end) {
                    Some(pos) => i += pos + end.len(),
                    None => return None,
                }
                continue;
            }
        }
        let ch = bytes[i];
        // Quoted strings with backslash escapes.
        if ch < 0x80 && syntax.string_quotes.contains(&(ch as char)) {
            let quote = ch;
            i += 1;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' => i += 2,
                    b if b == quote => {
                        i += 1;
                        break;
                    }
                    _ => i += 1,
                }
            }
            continue;
        }
        match ch {
            b'{' => depth += 1,
            b'}' => {
                if depth <= 1 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Replace every byte of `text[start..=end]` with a space, preserving
/// newlines. Byte length is unchanged, so offsets and line numbers
/// computed against the original text stay valid. Used to blank class
/// bodies before the free-function pass.
pub fn blank_region(text: &mut String, start: usize, end: usize) {
    let blanked: String = text.as_bytes()[start..=end]
        .iter()
        .map(|b| if *b == b'\n' { '\n' } else { ' ' })
        .collect();
    text.replace_range(start..=end, &blanked);
}
