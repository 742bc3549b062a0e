//! Recovery path for files that are not valid UTF-8.
//!
//! Legacy single-byte encodings dominate the real-world failures, so the
//! fallback decodes CP1252 (a superset of ISO-8859-1 in the printable
//! range) byte-for-byte. Bytes with no assigned code point are stripped.

use crate::error::TokenizeError;

/// CP1252 mappings for 0x80..0xA0; `None` positions are unassigned.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), // 0x80 €
    None,             // 0x81
    Some('\u{201A}'), // 0x82
    Some('\u{0192}'), // 0x83
    Some('\u{201E}'), // 0x84
    Some('\u{2026}'), // 0x85
    Some('\u{2020}'), // 0x86
    Some('\u{2021}'), // 0x87
    Some('\u{02C6}'), // 0x88
    Some('\u{2030}'), // 0x89
    Some('\u{0160}'), // 0x8A
    Some('\u{2039}'), // 0x8B
    Some('\u{0152}'), // 0x8C
    None,             // 0x8D
    Some('\u{017D}'), // 0x8E
    None,             // 0x8F
    None,             // 0x90
    Some('\u{2018}'), // 0x91
    Some('\u{2019}'), // 0x92
    Some('\u{201C}'), // 0x93
    Some('\u{201D}'), // 0x94
    Some('\u{2022}'), // 0x95
    Some('\u{2013}'), // 0x96
    Some('\u{2014}'), // 0x97
    Some('\u{02DC}'), // 0x98
    Some('\u{2122}'), // 0x99
    Some('\u{0161}'), // 0x9A
    Some('\u{203A}'), // 0x9B
    Some('\u{0153}'), // 0x9C
    None,             // 0x9D
    Some('\u{017E}'), // 0x9E
    Some('\u{0178}'), // 0x9F
];

/// Decode raw file bytes into text.
///
/// Valid UTF-8 passes through untouched. Anything else is an error in
/// developer mode; in production it is transcoded as CP1252/latin-1 with
/// unassigned bytes stripped, and indexing continues.
pub fn decode_text(bytes: &[u8], dev_mode: bool) -> Result<String, TokenizeError> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(e) if dev_mode => Err(TokenizeError::InvalidEncoding {
            offset: e.valid_up_to(),
        }),
        Err(e) => {
            tracing::debug!(offset = e.valid_up_to(), "non-UTF-8 input, transcoding");
            Ok(decode_cp1252(bytes))
        }
    }
}

fn decode_cp1252(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            0x00..=0x7F => out.push(b as char),
            0x80..=0x9F => {
                if let Some(ch) = CP1252_HIGH[(b - 0x80) as usize] {
                    out.push(ch);
                }
            }
            // latin-1: byte value equals code point
            0xA0..=0xFF => out.push(char::from_u32(b as u32).unwrap_or('\u{FFFD}')),
        }
    }
    out
}
