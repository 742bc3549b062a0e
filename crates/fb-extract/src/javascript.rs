//! JavaScript/TypeScript extractor.
//!
//! A hybrid scan: simple regexes find signature openings (`class`,
//! `function`, arrow-assigned `const|let|var`), then a brace matcher that
//! honors line/block comments and quoted strings (including template
//! literals) consumes the body.

use std::sync::OnceLock;

use regex::Regex;

use fb_core::{collapse_ws, EntityKind, EntityRecord, Language};

use crate::common::{blank_region, count_lines, line_of, line_starts, match_brace, BraceSyntax};
use crate::error::ExtractError;
use crate::php::leading_preamble;
use crate::registry::Extractor;

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ms)^[ \t]*(?P<sig>(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(?P<name>[A-Za-z_$][\w$]*)[^{;]*?)\{",
        )
        .unwrap()
    })
}

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ms)^[ \t]*(?P<sig>(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*\([^{;]*?)\{",
        )
        .unwrap()
    })
}

fn arrow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*(?P<sig>(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)[^=\n]*=\s*(?:async\s+)?(?:\([^)\n]*\)|[A-Za-z_$][\w$]*)\s*=>)",
        )
        .unwrap()
    })
}

fn func_expr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ms)^[ \t]*(?P<sig>(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?function\s*\*?\s*\([^{;]*?)\{",
        )
        .unwrap()
    })
}

fn method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ms)^[ \t]*(?P<sig>(?P<mods>(?:(?:public|private|protected|static|readonly|async|override)\s+)*)(?:get\s+|set\s+)?(?P<name>[A-Za-z_$][\w$]*)\s*\([^{;]*?\)(?:\s*:[^{;]*?)?)\s*\{",
        )
        .unwrap()
    })
}

/// Statement keywords a method-looking match must not be.
const NON_METHOD_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "do", "else", "new", "typeof", "function",
];

pub struct JsExtractor;

impl Extractor for JsExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "ts", "tsx", "mjs", "cjs"]
    }

    fn extract(&self, filename: &str, content: &str) -> Result<Vec<EntityRecord>, ExtractError> {
        let starts = line_starts(content);
        let total = count_lines(content).max(1);
        let basename = filename.rsplit('/').next().unwrap_or(filename);
        let lang = language_tag(filename);

        let mut records = vec![EntityRecord::file(basename, content, total, lang)];
        let mut class_spans: Vec<(usize, usize)> = Vec::new();

        for caps in class_re().captures_iter(content) {
            let (Some(sig), Some(full)) = (caps.name("sig"), caps.get(0)) else {
                continue;
            };
            let open = full.end() - 1;
            let Some(close) = match_brace(content, open, BraceSyntax::JS) else {
                continue;
            };
            class_spans.push((open, close));
            let class_name = caps["name"].to_string();

            records.push(EntityRecord {
                kind: EntityKind::Class,
                name: class_name.clone(),
                namespace: String::new(),
                enclosing: String::new(),
                signature_raw: collapse_ws(sig.as_str()),
                preamble_raw: leading_preamble(content, &starts, sig.start()),
                body_raw: content[open..=close].to_string(),
                line_start: line_of(&starts, sig.start()),
                line_end: line_of(&starts, close),
                language: lang.to_string(),
                visibility: None,
            });

            let body = &content[open..=close];
            for m_caps in method_re().captures_iter(body) {
                let name = &m_caps["name"];
                if NON_METHOD_KEYWORDS.contains(&name) {
                    continue;
                }
                let (Some(m_sig), Some(m_full)) = (m_caps.name("sig"), m_caps.get(0)) else {
                    continue;
                };
                let m_open = open + m_full.end() - 1;
                let Some(m_close) = match_brace(content, m_open, BraceSyntax::JS) else {
                    continue;
                };
                let m_start_abs = open + m_sig.start();
                let visibility = m_caps
                    .name("mods")
                    .map(|m| m.as_str())
                    .and_then(|mods| {
                        ["private", "protected", "public"]
                            .iter()
                            .find(|v| mods.contains(**v))
                            .map(|v| v.to_string())
                    });
                records.push(EntityRecord {
                    kind: EntityKind::Method,
                    name: name.to_string(),
                    namespace: String::new(),
                    enclosing: class_name.clone(),
                    signature_raw: collapse_ws(m_sig.as_str()),
                    preamble_raw: leading_preamble(content, &starts, m_start_abs),
                    body_raw: content[m_start_abs..=m_close].to_string(),
                    line_start: line_of(&starts, m_start_abs),
                    line_end: line_of(&starts, m_close),
                    language: lang.to_string(),
                    visibility,
                });
            }
        }

        // Blank class bodies so methods don't surface again as functions.
        let mut blanked = content.to_string();
        for (open, close) in &class_spans {
            blank_region(&mut blanked, *open, *close);
        }

        for caps in function_re().captures_iter(&blanked) {
            let (Some(sig), Some(full)) = (caps.name("sig"), caps.get(0)) else {
                continue;
            };
            let Some(close) = match_brace(&blanked, full.end() - 1, BraceSyntax::JS) else {
                continue;
            };
            records.push(function_record(
                EntityKind::Function,
                &caps["name"],
                sig.as_str(),
                content,
                &starts,
                sig.start(),
                close,
                lang,
            ));
        }

        for caps in func_expr_re().captures_iter(&blanked) {
            let (Some(sig), Some(full)) = (caps.name("sig"), caps.get(0)) else {
                continue;
            };
            let Some(close) = match_brace(&blanked, full.end() - 1, BraceSyntax::JS) else {
                continue;
            };
            records.push(function_record(
                EntityKind::Function,
                &caps["name"],
                sig.as_str(),
                content,
                &starts,
                sig.start(),
                close,
                lang,
            ));
        }

        for caps in arrow_re().captures_iter(&blanked) {
            let Some(sig) = caps.name("sig") else {
                continue;
            };
            let close = arrow_body_end(&blanked, sig.end());
            records.push(function_record(
                EntityKind::ArrowFunction,
                &caps["name"],
                sig.as_str(),
                content,
                &starts,
                sig.start(),
                close,
                lang,
            ));
        }

        records.sort_by_key(|r| (r.line_start, r.line_end));
        Ok(records)
    }
}

#[allow(clippy::too_many_arguments)]
fn function_record(
    kind: EntityKind,
    name: &str,
    sig: &str,
    content: &str,
    starts: &[usize],
    sig_start: usize,
    body_end: usize,
    lang: &str,
) -> EntityRecord {
    EntityRecord {
        kind,
        name: name.to_string(),
        namespace: String::new(),
        enclosing: String::new(),
        signature_raw: collapse_ws(sig),
        preamble_raw: leading_preamble(content, starts, sig_start),
        body_raw: content[sig_start..=body_end.min(content.len() - 1)].to_string(),
        line_start: line_of(starts, sig_start),
        line_end: line_of(starts, body_end.min(content.len().saturating_sub(1))),
        language: lang.to_string(),
        visibility: None,
    }
}

/// End offset of an arrow-function body: the matched `}` for a block
/// body, otherwise the end of the expression statement (`;` or newline).
fn arrow_body_end(text: &str, after_arrow: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = after_arrow;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'{' {
        if let Some(close) = match_brace(text, i, BraceSyntax::JS) {
            return close;
        }
        return text.len().saturating_sub(1);
    }
    while i < bytes.len() && bytes[i] != b';' && bytes[i] != b'\n' {
        i += 1;
    }
    i.min(text.len().saturating_sub(1))
}

fn language_tag(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("");
    match Language::from_extension(ext) {
        Some(Language::TypeScript) => "typescript",
        _ => "javascript",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(content: &str) -> Vec<EntityRecord> {
        JsExtractor.extract("/p/app.js", content).unwrap()
    }

    fn find<'a>(records: &'a [EntityRecord], kind: EntityKind, name: &str) -> &'a EntityRecord {
        records
            .iter()
            .find(|r| r.kind == kind && r.name == name)
            .unwrap_or_else(|| panic!("no {kind:?} named {name}"))
    }

    #[test]
    fn plain_function() {
        let src = "function greet(name) {\n  return `hi ${name}`;\n}\n";
        let records = extract(src);
        let f = find(&records, EntityKind::Function, "greet");
        assert_eq!(f.line_start, 1);
        assert_eq!(f.line_end, 3);
        assert_eq!(f.signature_raw, "function greet(name)");
    }

    #[test]
    fn class_with_methods() {
        let src = "class Cart {\n\
                   \x20 constructor(items) {\n\
                   \x20   this.items = items;\n\
                   \x20 }\n\
                   \n\
                   \x20 total() {\n\
                   \x20   return this.items.reduce((a, b) => a + b.price, 0);\n\
                   \x20 }\n\
                   }\n";
        let records = extract(src);
        let class = find(&records, EntityKind::Class, "Cart");
        assert_eq!(class.line_start, 1);
        assert_eq!(class.line_end, 9);

        let ctor = find(&records, EntityKind::Method, "constructor");
        assert_eq!(ctor.enclosing, "Cart");
        assert_eq!(ctor.line_start, 2);
        assert_eq!(ctor.line_end, 4);

        let total = find(&records, EntityKind::Method, "total");
        assert_eq!(total.line_start, 6);
        assert_eq!(total.line_end, 8);
    }

    #[test]
    fn arrow_functions_block_and_expression() {
        let src = "const add = (a, b) => a + b;\n\
                   const wrap = (x) => {\n\
                   \x20 return [x];\n\
                   };\n";
        let records = extract(src);
        let add = find(&records, EntityKind::ArrowFunction, "add");
        assert_eq!(add.line_start, 1);
        assert_eq!(add.line_end, 1);

        let wrap = find(&records, EntityKind::ArrowFunction, "wrap");
        assert_eq!(wrap.line_start, 2);
        assert_eq!(wrap.line_end, 4);
    }

    #[test]
    fn assigned_function_expression() {
        let src = "const handler = function (req) {\n  return req.url;\n};\n";
        let records = extract(src);
        let f = find(&records, EntityKind::Function, "handler");
        assert_eq!(f.line_end, 3);
    }

    #[test]
    fn methods_not_double_counted() {
        let src = "class A {\n  run() { return 1; }\n}\nfunction outside() { return 2; }\n";
        let records = extract(src);
        let functions: Vec<&str> = records
            .iter()
            .filter(|r| r.kind == EntityKind::Function)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(functions, vec!["outside"]);
    }

    #[test]
    fn control_flow_is_not_a_method() {
        let src = "class A {\n\
                   \x20 run() {\n\
                   \x20   if (this.x) {\n\
                   \x20     return 1;\n\
                   \x20   }\n\
                   \x20   for (const i of []) {\n\
                   \x20   }\n\
                   \x20 }\n\
                   }\n";
        let records = extract(src);
        let methods: Vec<&str> = records
            .iter()
            .filter(|r| r.kind == EntityKind::Method)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(methods, vec!["run"]);
    }

    #[test]
    fn comments_and_strings_do_not_confuse_braces() {
        let src = "function f() {\n\
                   \x20 // ignore }\n\
                   \x20 const s = \"}\";\n\
                   \x20 const t = `template ${'}'}`;\n\
                   }\n\
                   function g() {}\n";
        let records = extract(src);
        let f = find(&records, EntityKind::Function, "f");
        assert_eq!(f.line_end, 5);
        find(&records, EntityKind::Function, "g");
    }

    #[test]
    fn typescript_visibility_modifiers() {
        let records = JsExtractor
            .extract(
                "/p/svc.ts",
                "class Svc {\n  private load(): void {\n  }\n}\n",
            )
            .unwrap();
        let load = find(&records, EntityKind::Method, "load");
        assert_eq!(load.visibility.as_deref(), Some("private"));
        assert_eq!(load.language, "typescript");
    }

    #[test]
    fn file_record_present_for_unparseable_content() {
        let records = extract("]]] not javascript at all [[[");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, EntityKind::File);
    }
}
