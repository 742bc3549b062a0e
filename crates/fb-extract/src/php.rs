//! PHP extractor: namespaces, class-likes, methods, free functions.
//!
//! A regex pass finds declaration openings; a brace matcher that honors
//! comments and strings consumes bodies. Class bodies are blanked out of
//! the working text before the free-function pass so methods are not
//! counted twice.

use std::sync::OnceLock;

use regex::Regex;

use fb_core::{collapse_ws, EntityKind, EntityRecord};

use crate::common::{blank_region, count_lines, line_of, line_starts, match_brace, BraceSyntax};
use crate::error::ExtractError;
use crate::registry::Extractor;

fn namespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*namespace[ \t]+([\w\\]+)[ \t]*;").unwrap())
}

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ms)^[ \t]*(?P<sig>(?:abstract\s+|final\s+|readonly\s+)*(?P<kw>class|interface|trait|enum)\s+(?P<name>\w+)[^{;]*?)\{",
        )
        .unwrap()
    })
}

// Declarations are led by a statement boundary rather than a line start,
// so one-line class bodies still yield their methods.
fn method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ms)(?:^|[\s{;}])[ \t]*(?P<sig>(?P<mods>(?:(?:public|protected|private|static|final|abstract)\s+)*)function\s+&?(?P<name>\w+)\s*\([^{;]*?)(?P<term>[{;])",
        )
        .unwrap()
    })
}

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?ms)(?:^|[\s{;}])[ \t]*(?P<sig>function\s+&?(?P<name>\w+)\s*\([^{;]*?)\{")
            .unwrap()
    })
}

pub struct PhpExtractor;

impl Extractor for PhpExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["php", "phtml"]
    }

    fn priority(&self) -> u8 {
        10
    }

    fn extract(&self, filename: &str, content: &str) -> Result<Vec<EntityRecord>, ExtractError> {
        let starts = line_starts(content);
        let total_lines = count_lines(content).max(1);
        let basename = basename(filename);

        let mut records = vec![EntityRecord::file(basename, content, total_lines, "php")];

        // Namespace declarations; each scopes everything until the next.
        let namespaces: Vec<(usize, String)> = namespace_re()
            .captures_iter(content)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let name = caps.get(1)?;
                Some((full.start(), name.as_str().to_string()))
            })
            .collect();
        for (idx, (offset, name)) in namespaces.iter().enumerate() {
            let end_offset = namespaces
                .get(idx + 1)
                .map(|(next, _)| next.saturating_sub(1))
                .unwrap_or(content.len().saturating_sub(1));
            records.push(EntityRecord {
                kind: EntityKind::Namespace,
                name: name.clone(),
                namespace: String::new(),
                enclosing: String::new(),
                signature_raw: format!("namespace {name}"),
                preamble_raw: String::new(),
                body_raw: String::new(),
                line_start: line_of(&starts, *offset),
                line_end: line_of(&starts, end_offset).max(line_of(&starts, *offset)),
                language: "php".to_string(),
                visibility: None,
            });
        }
        let namespace_at = |offset: usize| -> String {
            namespaces
                .iter()
                .rev()
                .find(|(ns_offset, _)| *ns_offset <= offset)
                .map(|(_, name)| name.clone())
                .unwrap_or_default()
        };

        // Class-likes and their methods; remember body spans for blanking.
        let mut class_spans: Vec<(usize, usize)> = Vec::new();
        for caps in class_re().captures_iter(content) {
            let (Some(sig_match), Some(full)) = (caps.name("sig"), caps.get(0)) else {
                continue;
            };
            let open = full.end() - 1;
            let Some(close) = match_brace(content, open, BraceSyntax::PHP) else {
                continue;
            };
            class_spans.push((open, close));

            let kind = match &caps["kw"] {
                "interface" => EntityKind::Interface,
                "trait" => EntityKind::Trait,
                "enum" => EntityKind::Enum,
                _ => EntityKind::Class,
            };
            let type_name = caps["name"].to_string();
            let namespace = namespace_at(sig_match.start());

            records.push(EntityRecord {
                kind,
                name: type_name.clone(),
                namespace: namespace.clone(),
                enclosing: String::new(),
                signature_raw: collapse_ws(sig_match.as_str()),
                preamble_raw: leading_preamble(content, &starts, sig_match.start()),
                body_raw: content[open..=close].to_string(),
                line_start: line_of(&starts, sig_match.start()),
                line_end: line_of(&starts, close),
                language: "php".to_string(),
                visibility: None,
            });

            // Methods live inside the class body.
            let body = &content[open..=close];
            for method_caps in method_re().captures_iter(body) {
                let (Some(m_sig), Some(m_full)) = (method_caps.name("sig"), method_caps.get(0))
                else {
                    continue;
                };
                let m_start_abs = open + m_sig.start();
                let terminator = method_caps.name("term").map(|t| t.as_str()).unwrap_or(";");
                let m_end_abs = if terminator == "{" {
                    match match_brace(content, open + m_full.end() - 1, BraceSyntax::PHP) {
                        Some(end) => end,
                        None => continue,
                    }
                } else {
                    open + m_full.end() - 1
                };
                let visibility = visibility_of(method_caps.name("mods").map(|m| m.as_str()));
                records.push(EntityRecord {
                    kind: EntityKind::Method,
                    name: method_caps["name"].to_string(),
                    namespace: namespace.clone(),
                    enclosing: type_name.clone(),
                    signature_raw: collapse_ws(m_sig.as_str()),
                    preamble_raw: leading_preamble(content, &starts, m_start_abs),
                    body_raw: content[m_start_abs..=m_end_abs].to_string(),
                    line_start: line_of(&starts, m_start_abs),
                    line_end: line_of(&starts, m_end_abs),
                    language: "php".to_string(),
                    visibility: Some(visibility),
                });
            }
        }

        // Free functions: blank class bodies first so methods don't double
        // as functions.
        let mut blanked = content.to_string();
        for (open, close) in &class_spans {
            blank_region(&mut blanked, *open, *close);
        }
        for caps in function_re().captures_iter(&blanked) {
            let (Some(sig), Some(full)) = (caps.name("sig"), caps.get(0)) else {
                continue;
            };
            let Some(close) = match_brace(&blanked, full.end() - 1, BraceSyntax::PHP) else {
                continue;
            };
            records.push(EntityRecord {
                kind: EntityKind::Function,
                name: caps["name"].to_string(),
                namespace: namespace_at(sig.start()),
                enclosing: String::new(),
                signature_raw: collapse_ws(sig.as_str()),
                preamble_raw: leading_preamble(content, &starts, sig.start()),
                body_raw: content[sig.start()..=close].to_string(),
                line_start: line_of(&starts, sig.start()),
                line_end: line_of(&starts, close),
                language: "php".to_string(),
                visibility: None,
            });
        }

        Ok(records)
    }
}

/// PHP methods default to public when no modifier is written.
fn visibility_of(mods: Option<&str>) -> String {
    let mods = mods.unwrap_or("");
    for vis in ["private", "protected", "public"] {
        if mods.contains(vis) {
            return vis.to_string();
        }
    }
    "public".to_string()
}

/// Contiguous run of doc-comment, attribute, and comment lines directly
/// above a declaration, stopping at the first blank line.
pub(crate) fn leading_preamble(content: &str, starts: &[usize], decl_offset: usize) -> String {
    let decl_line = line_of(starts, decl_offset) as usize;
    if decl_line <= 1 {
        return String::new();
    }
    let lines: Vec<&str> = content.lines().collect();
    let mut first = decl_line - 1; // 1-indexed line above the declaration
    let mut in_block = false;
    let mut collected_from = None;

    while first >= 1 {
        let line = lines.get(first - 1).copied().unwrap_or("").trim();
        if in_block {
            collected_from = Some(first);
            if line.starts_with("/*") {
                in_block = false;
            }
            if first == 1 {
                break;
            }
            first -= 1;
            continue;
        }
        if line.is_empty() {
            break;
        }
        if line.ends_with("*/") && !line.starts_with("/*") {
            in_block = true;
            collected_from = Some(first);
        } else if line.starts_with("//")
            || line.starts_with('#')
            || (line.starts_with("/*") && line.ends_with("*/"))
        {
            collected_from = Some(first);
        } else {
            break;
        }
        if first == 1 {
            break;
        }
        first -= 1;
    }

    match collected_from {
        Some(from) => lines[from - 1..decl_line - 1].join("\n"),
        None => String::new(),
    }
}

fn basename(filename: &str) -> &str {
    filename.rsplit('/').next().unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(content: &str) -> Vec<EntityRecord> {
        PhpExtractor.extract("/p/src/User.php", content).unwrap()
    }

    fn find<'a>(records: &'a [EntityRecord], kind: EntityKind, name: &str) -> &'a EntityRecord {
        records
            .iter()
            .find(|r| r.kind == kind && r.name == name)
            .unwrap_or_else(|| panic!("no {kind:?} named {name}"))
    }

    #[test]
    fn file_record_always_first() {
        let records = extract("<?php\n");
        assert_eq!(records[0].kind, EntityKind::File);
        assert_eq!(records[0].name, "User.php");
    }

    #[test]
    fn class_with_methods() {
        let src = "<?php\n\
                   namespace App\\Models;\n\
                   \n\
                   class User extends Model\n\
                   {\n\
                   \x20   public function getName(): string\n\
                   \x20   {\n\
                   \x20       return $this->name;\n\
                   \x20   }\n\
                   \n\
                   \x20   private static function hydrate(array $row): self\n\
                   \x20   {\n\
                   \x20       return new self($row);\n\
                   \x20   }\n\
                   }\n";
        let records = extract(src);

        let class = find(&records, EntityKind::Class, "User");
        assert_eq!(class.namespace, "App\\Models");
        assert_eq!(class.signature_raw, "class User extends Model");
        assert_eq!(class.line_start, 4);
        assert_eq!(class.line_end, 15);

        let get_name = find(&records, EntityKind::Method, "getName");
        assert_eq!(get_name.enclosing, "User");
        assert_eq!(get_name.visibility.as_deref(), Some("public"));
        assert_eq!(get_name.line_start, 6);
        assert_eq!(get_name.line_end, 9);

        let hydrate = find(&records, EntityKind::Method, "hydrate");
        assert_eq!(hydrate.visibility.as_deref(), Some("private"));

        // Methods are nested inside the class line range.
        assert!(get_name.line_start >= class.line_start);
        assert!(get_name.line_end <= class.line_end);
    }

    #[test]
    fn namespace_record_spans_to_end() {
        let src = "<?php\nnamespace App;\n\nclass A {}\n";
        let records = extract(src);
        let ns = find(&records, EntityKind::Namespace, "App");
        assert_eq!(ns.line_start, 2);
        assert_eq!(ns.line_end, 4);
    }

    #[test]
    fn methods_not_double_counted_as_functions() {
        let src = "<?php\n\
                   class A\n\
                   {\n\
                   \x20   public function inside() {}\n\
                   }\n\
                   function outside() {\n\
                   \x20   return 1;\n\
                   }\n";
        let records = extract(src);

        let functions: Vec<&str> = records
            .iter()
            .filter(|r| r.kind == EntityKind::Function)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(functions, vec!["outside"]);
        find(&records, EntityKind::Method, "inside");
    }

    #[test]
    fn interface_trait_enum_kinds() {
        let src = "<?php\n\
                   interface Shape { public function area(): float; }\n\
                   trait Loggable { public function log(string $m): void {} }\n\
                   enum Suit { case Hearts; case Spades; }\n";
        let records = extract(src);
        find(&records, EntityKind::Interface, "Shape");
        find(&records, EntityKind::Trait, "Loggable");
        find(&records, EntityKind::Enum, "Suit");

        // The abstract interface method terminates at ';'.
        let area = find(&records, EntityKind::Method, "area");
        assert_eq!(area.enclosing, "Shape");
        assert_eq!(area.line_start, 2);
        assert_eq!(area.line_end, 2);
    }

    #[test]
    fn doc_comment_and_attribute_preamble() {
        let src = "<?php\n\
                   \n\
                   /**\n\
                   \x20* Maps users to rows.\n\
                   \x20*/\n\
                   #[Entity]\n\
                   class UserMap {}\n";
        let records = extract(src);
        let class = find(&records, EntityKind::Class, "UserMap");
        assert!(class.preamble_raw.contains("Maps users to rows."));
        assert!(class.preamble_raw.contains("#[Entity]"));
        assert_eq!(class.line_start, 7);
    }

    #[test]
    fn preamble_stops_at_blank_line() {
        let src = "<?php\n\
                   // unrelated comment\n\
                   \n\
                   // attached comment\n\
                   function f() {}\n";
        let records = extract(src);
        let f = find(&records, EntityKind::Function, "f");
        assert!(f.preamble_raw.contains("attached"));
        assert!(!f.preamble_raw.contains("unrelated"));
    }

    #[test]
    fn braces_in_strings_do_not_break_bodies() {
        let src = "<?php\n\
                   function f() {\n\
                   \x20   $s = \"closing } brace\";\n\
                   \x20   return $s; // } in comment\n\
                   }\n\
                   function g() {}\n";
        let records = extract(src);
        let f = find(&records, EntityKind::Function, "f");
        assert_eq!(f.line_end, 5);
        find(&records, EntityKind::Function, "g");
    }

    #[test]
    fn parse_failure_still_yields_file_record() {
        let records = extract("<?php\nclass Broken {\n");
        assert_eq!(records[0].kind, EntityKind::File);
        // The unclosed class is dropped, not fatal.
        assert!(records.iter().all(|r| r.kind != EntityKind::Class));
    }
}
