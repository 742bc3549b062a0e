//! Python extractor: indentation-driven block detection.
//!
//! Decorator and comment lines directly above a `def`/`class` form the
//! preamble, the first triple-quoted string at the start of a block is its
//! docstring, and visibility follows naming (`__x` private unless dunder,
//! `_x` protected).

use std::sync::OnceLock;

use regex::Regex;

use fb_core::{collapse_ws, EntityKind, EntityRecord};

use crate::error::ExtractError;
use crate::registry::Extractor;

fn decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)(def|class)\s+(\w+)").unwrap())
}

pub struct PythonExtractor;

#[derive(Debug)]
struct Decl {
    line: usize, // 1-indexed
    indent: usize,
    is_class: bool,
    name: String,
    end_line: usize,
}

impl Extractor for PythonExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn extract(&self, filename: &str, content: &str) -> Result<Vec<EntityRecord>, ExtractError> {
        let lines: Vec<&str> = content.lines().collect();
        let total = lines.len().max(1) as u32;
        let basename = filename.rsplit('/').next().unwrap_or(filename);

        let mut records = vec![EntityRecord::file(basename, content, total, "python")];

        let mut decls: Vec<Decl> = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            if let Some(caps) = decl_re().captures(line) {
                let indent = caps[1].chars().count();
                let line_no = idx + 1;
                decls.push(Decl {
                    line: line_no,
                    indent,
                    is_class: &caps[2] == "class",
                    name: caps[3].to_string(),
                    end_line: block_end(&lines, idx, indent),
                });
            }
        }

        // Stack of enclosing declarations; methods are defs whose direct
        // parent is a class, defs nested in defs are skipped.
        let mut stack: Vec<(bool, String, usize, usize)> = Vec::new(); // (is_class, name, indent, end_line)
        for decl in &decls {
            while let Some((_, _, indent, end_line)) = stack.last() {
                if decl.line > *end_line || decl.indent <= *indent {
                    stack.pop();
                } else {
                    break;
                }
            }

            let parent = stack.last();
            let record = match (decl.is_class, parent) {
                (true, _) => Some((EntityKind::Class, String::new())),
                (false, None) => Some((EntityKind::Function, String::new())),
                (false, Some((true, parent_name, _, _))) => {
                    Some((EntityKind::Method, parent_name.clone()))
                }
                // Function nested inside a function: not addressable.
                (false, Some((false, _, _, _))) => None,
            };

            if let Some((kind, enclosing)) = record {
                let signature_raw = signature_text(&lines, decl.line - 1);
                let mut preamble = leading_preamble(&lines, decl.line - 1);
                if let Some(doc) = docstring(&lines, decl.line - 1, decl.end_line) {
                    if preamble.is_empty() {
                        preamble = doc;
                    } else {
                        preamble.push('\n');
                        preamble.push_str(&doc);
                    }
                }
                records.push(EntityRecord {
                    kind,
                    name: decl.name.clone(),
                    namespace: String::new(),
                    enclosing,
                    signature_raw,
                    preamble_raw: preamble,
                    body_raw: lines[decl.line - 1..decl.end_line].join("\n"),
                    line_start: decl.line as u32,
                    line_end: decl.end_line as u32,
                    language: "python".to_string(),
                    visibility: Some(visibility_of(&decl.name)),
                });
            }

            stack.push((decl.is_class, decl.name.clone(), decl.indent, decl.end_line));
        }

        Ok(records)
    }
}

/// Last line (1-indexed) of the block opened at `decl_idx` (0-indexed):
/// the final non-blank line indented deeper than the declaration.
fn block_end(lines: &[&str], decl_idx: usize, indent: usize) -> usize {
    let mut end = decl_idx + 1;
    for (offset, line) in lines[decl_idx + 1..].iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let line_indent = line.chars().take_while(|c| c.is_whitespace()).count();
        if line_indent <= indent {
            break;
        }
        end = decl_idx + 1 + offset + 1;
    }
    end
}

/// The declaration text through the header `:` (bounded lookahead for
/// signatures wrapped across lines), whitespace-collapsed. Inline bodies
/// ("def f(): pass") keep only the header.
fn signature_text(lines: &[&str], decl_idx: usize) -> String {
    let mut sig = String::new();
    for line in lines[decl_idx..].iter().take(10) {
        let code = line.split('#').next().unwrap_or("").trim();
        if !sig.is_empty() {
            sig.push(' ');
        }
        if let Some(colon) = header_colon(code) {
            sig.push_str(&code[..=colon]);
            break;
        }
        sig.push_str(code);
    }
    collapse_ws(&sig)
}

/// Byte index of the colon that closes a `def`/`class` header, if present
/// on this line.
fn header_colon(code: &str) -> Option<usize> {
    if let Some(pos) = code.find("):") {
        return Some(pos + 1);
    }
    if code.ends_with(':') {
        return Some(code.len() - 1);
    }
    None
}

/// Contiguous decorator/comment lines directly above the declaration,
/// stopping at the first blank line.
fn leading_preamble(lines: &[&str], decl_idx: usize) -> String {
    let mut first = decl_idx;
    while first > 0 {
        let above = lines[first - 1].trim();
        if above.starts_with('@') || above.starts_with('#') {
            first -= 1;
        } else {
            break;
        }
    }
    if first == decl_idx {
        return String::new();
    }
    lines[first..decl_idx].join("\n")
}

/// The first triple-quoted string at the start of the block body.
fn docstring(lines: &[&str], decl_idx: usize, end_line: usize) -> Option<String> {
    // Find the line after the signature's closing ':'.
    let mut body_start = decl_idx + 1;
    for (offset, line) in lines[decl_idx..end_line].iter().enumerate() {
        let code = line.split('#').next().unwrap_or("").trim_end();
        if code.ends_with(':') {
            body_start = decl_idx + offset + 1;
            break;
        }
    }

    let first_line = lines.get(body_start)?.trim_start();
    let quoted = first_line.trim_start_matches(|c| matches!(c, 'r' | 'b' | 'f' | 'u' | 'R' | 'B' | 'F' | 'U'));
    let delim = if quoted.starts_with("\"\"\"") {
        "\"\"\""
    } else if quoted.starts_with("'''") {
        "'''"
    } else {
        return None;
    };

    let mut collected = vec![lines[body_start].trim().to_string()];
    let after_open = &quoted[3..];
    if after_open.contains(delim) {
        return Some(collected.remove(0));
    }
    for line in lines[body_start + 1..end_line].iter() {
        collected.push(line.trim().to_string());
        if line.contains(delim) {
            return Some(collected.join("\n"));
        }
    }
    None
}

/// `__x` (and not dunder) is private, `_x` protected, everything else
/// public.
fn visibility_of(name: &str) -> String {
    if name.starts_with("__") && !name.ends_with("__") {
        "private".to_string()
    } else if name.starts_with('_') {
        "protected".to_string()
    } else {
        "public".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(content: &str) -> Vec<EntityRecord> {
        PythonExtractor.extract("/p/a.py", content).unwrap()
    }

    fn find<'a>(records: &'a [EntityRecord], kind: EntityKind, name: &str) -> &'a EntityRecord {
        records
            .iter()
            .find(|r| r.kind == kind && r.name == name)
            .unwrap_or_else(|| panic!("no {kind:?} named {name}"))
    }

    #[test]
    fn class_with_inline_method() {
        let records = extract("class Foo:\n    def bar(self): pass\n");

        assert_eq!(records[0].kind, EntityKind::File);
        assert_eq!(records[0].line_start, 1);
        assert_eq!(records[0].line_end, 2);

        let class = find(&records, EntityKind::Class, "Foo");
        assert_eq!(class.line_start, 1);
        assert_eq!(class.line_end, 2);

        let method = find(&records, EntityKind::Method, "bar");
        assert_eq!(method.enclosing, "Foo");
        assert_eq!(method.line_start, 2);
        assert_eq!(method.line_end, 2);
    }

    #[test]
    fn block_extends_over_nested_lines() {
        let src = "def top():\n    a = 1\n\n    return a\n\ndef next_one():\n    pass\n";
        let records = extract(src);
        let top = find(&records, EntityKind::Function, "top");
        assert_eq!(top.line_start, 1);
        assert_eq!(top.line_end, 4);
        let next_one = find(&records, EntityKind::Function, "next_one");
        assert_eq!(next_one.line_start, 6);
    }

    #[test]
    fn decorators_and_comments_form_preamble() {
        let src = "# validates input\n@validator\n@cached\ndef check(x):\n    return x\n";
        let records = extract(src);
        let check = find(&records, EntityKind::Function, "check");
        assert!(check.preamble_raw.contains("# validates input"));
        assert!(check.preamble_raw.contains("@validator"));
        assert!(check.preamble_raw.contains("@cached"));
        assert_eq!(check.line_start, 4);
    }

    #[test]
    fn preamble_stops_at_blank_line() {
        let src = "# stale\n\n@fresh\ndef f():\n    pass\n";
        let records = extract(src);
        let f = find(&records, EntityKind::Function, "f");
        assert!(f.preamble_raw.contains("@fresh"));
        assert!(!f.preamble_raw.contains("stale"));
    }

    #[test]
    fn docstring_joins_preamble() {
        let src = "def described():\n    \"\"\"Single line doc.\"\"\"\n    return 1\n";
        let records = extract(src);
        let f = find(&records, EntityKind::Function, "described");
        assert!(f.preamble_raw.contains("Single line doc."));
    }

    #[test]
    fn multiline_docstring_captured() {
        let src = "class C:\n    '''\n    Lines of\n    documentation.\n    '''\n    def m(self):\n        pass\n";
        let records = extract(src);
        let class = find(&records, EntityKind::Class, "C");
        assert!(class.preamble_raw.contains("documentation."));
    }

    #[test]
    fn visibility_from_naming() {
        let src = "class C:\n    def public_m(self): pass\n    def _prot(self): pass\n    def __priv(self): pass\n    def __dunder__(self): pass\n";
        let records = extract(src);
        assert_eq!(
            find(&records, EntityKind::Method, "public_m").visibility.as_deref(),
            Some("public")
        );
        assert_eq!(
            find(&records, EntityKind::Method, "_prot").visibility.as_deref(),
            Some("protected")
        );
        assert_eq!(
            find(&records, EntityKind::Method, "__priv").visibility.as_deref(),
            Some("private")
        );
        assert_eq!(
            find(&records, EntityKind::Method, "__dunder__").visibility.as_deref(),
            Some("public")
        );
    }

    #[test]
    fn nested_functions_are_skipped() {
        let src = "def outer():\n    def inner():\n        pass\n    return inner\n";
        let records = extract(src);
        find(&records, EntityKind::Function, "outer");
        assert!(records.iter().all(|r| r.name != "inner"));
    }

    #[test]
    fn module_level_code_only_yields_file_record() {
        let records = extract("x = 1\nprint(x)\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, EntityKind::File);
    }

    #[test]
    fn multiline_signature_collapsed() {
        let src = "def long_one(\n    a,\n    b,\n):\n    return a + b\n";
        let records = extract(src);
        let f = find(&records, EntityKind::Function, "long_one");
        assert_eq!(f.signature_raw, "def long_one( a, b, ):");
    }
}
