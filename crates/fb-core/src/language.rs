use serde::{Deserialize, Serialize};

/// Languages the discovery layer can classify by extension.
///
/// Extension-less executables with a `#!` line are classified as `Script`;
/// their display tag is refined from the interpreter (see `script_tag`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Php,
    Css,
    JavaScript,
    TypeScript,
    Markdown,
    Html,
    Python,
    Ruby,
    Go,
    Rust,
    Script,
}

impl Language {
    /// Map a file extension (lowercase, no dot) to a Language.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "php" | "phtml" => Some(Self::Php),
            "css" | "scss" | "sass" | "less" => Some(Self::Css),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "tsx" => Some(Self::TypeScript),
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            "py" => Some(Self::Python),
            "rb" => Some(Self::Ruby),
            "go" => Some(Self::Go),
            "rs" => Some(Self::Rust),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::Css => "css",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Python => "python",
            Self::Ruby => "ruby",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Script => "script",
        }
    }
}

/// Refine a script language tag from its shebang interpreter line.
///
/// `#!/usr/bin/env python3` -> "python", `#!/bin/sh` -> "sh". Falls back to
/// "script" when the interpreter is unrecognized.
pub fn script_tag(shebang: &str) -> &'static str {
    let line = shebang.lines().next().unwrap_or("");
    for (needle, tag) in [
        ("python", "python"),
        ("node", "javascript"),
        ("ruby", "ruby"),
        ("perl", "perl"),
        ("php", "php"),
        ("bash", "bash"),
        ("zsh", "zsh"),
        ("sh", "sh"),
    ] {
        if line.contains(needle) {
            return tag;
        }
    }
    "script"
}
