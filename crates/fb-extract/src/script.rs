//! Extension-less executable scripts with a shebang line.

use fb_core::{script_tag, EntityKind, EntityRecord};

use crate::common::{count_lines, is_binary};
use crate::error::ExtractError;

pub struct ScriptExtractor;

impl ScriptExtractor {
    /// Extract records for a shebang script. Emitted only when the file is
    /// executable, non-binary, and starts with `#!`; anything else yields
    /// no records and the file is skipped.
    pub fn extract(&self, filename: &str, content: &str) -> Result<Vec<EntityRecord>, ExtractError> {
        if !content.starts_with("#!") || is_binary(content.as_bytes()) {
            return Ok(Vec::new());
        }
        if !is_executable(filename) {
            return Ok(Vec::new());
        }

        let total = count_lines(content).max(1);
        let basename = filename.rsplit('/').next().unwrap_or(filename);
        let shebang = content.lines().next().unwrap_or("#!");
        let lang = script_tag(shebang);

        let mut records = vec![EntityRecord::file(basename, content, total, lang)];
        records.push(EntityRecord {
            kind: EntityKind::Script,
            name: basename.to_string(),
            namespace: String::new(),
            enclosing: String::new(),
            signature_raw: shebang.to_string(),
            preamble_raw: String::new(),
            body_raw: content.to_string(),
            line_start: 1,
            line_end: total,
            language: lang.to_string(),
            visibility: None,
        });
        Ok(records)
    }
}

#[cfg(unix)]
fn is_executable(filename: &str) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(filename)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_filename: &str) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[cfg(unix)]
    fn write_script(dir: &std::path::Path, name: &str, content: &str, mode: u32) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[test]
    fn executable_shebang_script_extracted() {
        let tmp = tempfile::TempDir::new().unwrap();
        let content = "#!/usr/bin/env python3\nprint('hi')\n";
        let path = write_script(tmp.path(), "deploy", content, 0o755);

        let records = ScriptExtractor.extract(&path, content).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, EntityKind::File);
        assert_eq!(records[0].language, "python");
        assert_eq!(records[1].kind, EntityKind::Script);
        assert_eq!(records[1].name, "deploy");
        assert_eq!(records[1].signature_raw, "#!/usr/bin/env python3");
        assert_eq!(records[1].line_end, 2);
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_yields_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let content = "#!/bin/sh\necho hi\n";
        let path = write_script(tmp.path(), "notexec", content, 0o644);

        let records = ScriptExtractor.extract(&path, content).unwrap();
        assert!(records.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn missing_shebang_yields_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let content = "echo plain\n";
        let path = write_script(tmp.path(), "plain", content, 0o755);

        let records = ScriptExtractor.extract(&path, content).unwrap();
        assert!(records.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn binary_content_yields_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let content = "#!/bin/sh\n\u{0}binary\n";
        let path = write_script(tmp.path(), "bin", content, 0o755);

        let records = ScriptExtractor.extract(&path, content).unwrap();
        assert!(records.is_empty());
    }
}
