//! Reference-token extraction per file family.
//!
//! Python and Rust are parsed with tree-sitter. JavaScript and TypeScript
//! use regexes over import and require statements. Extraction is best
//! effort: a file that fails to parse yields no tokens.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tree_sitter::{Node, Parser};

static JS_IMPORT_FROM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s[^;]*?from\s*['"]([^'"]+)['"]"#).unwrap());
static JS_SIDE_EFFECT_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\s*['"]([^'"]+)['"]"#).unwrap());
static JS_REQUIRE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

/// Sorted, de-duplicated reference tokens for one file.
pub fn extract_references(path: &str, content: &str) -> Vec<String> {
    let ext = path.rsplit_once('.').map(|(_, e)| e).unwrap_or_default();
    let tokens = match ext.to_ascii_lowercase().as_str() {
        "py" => python_references(content),
        "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" => js_references(content),
        "rs" => rust_references(content),
        _ => BTreeSet::new(),
    };
    tokens.into_iter().collect()
}

fn parse(content: &str, language: tree_sitter::Language) -> Option<tree_sitter::Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&language) {
        tracing::warn!("Failed to load tree-sitter grammar: {e}");
        return None;
    }
    parser.parse(content, None)
}

/// Pre-order traversal of every node under `root`.
fn visit_all<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn text<'a>(node: Node<'_>, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or_default()
}

// ─── Python ──────────────────────────────────────────────

fn python_references(content: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    let Some(tree) = parse(content, tree_sitter_python::LANGUAGE.into()) else {
        return tokens;
    };

    visit_all(tree.root_node(), |node| match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                // `import a.b as c` keeps the module, not the alias
                let module = match name.kind() {
                    "aliased_import" => name.child_by_field_name("name"),
                    _ => Some(name),
                };
                if let Some(module) = module {
                    push_module(&mut tokens, text(module, content));
                }
            }
        }
        "import_from_statement" => {
            if let Some(module) = node.child_by_field_name("module_name") {
                push_module(&mut tokens, text(module, content));
            }
        }
        "call" => {
            let Some(func) = node.child_by_field_name("function") else {
                return;
            };
            let name = match func.kind() {
                "identifier" => Some(func),
                "attribute" => func.child_by_field_name("attribute"),
                _ => None,
            };
            if let Some(name) = name {
                let name = text(name, content);
                if !name.is_empty() {
                    tokens.insert(name.to_string());
                }
            }
        }
        _ => {}
    });

    tokens
}

/// `..pkg.mod` becomes `pkg/mod`, so it can match a file path.
fn push_module(tokens: &mut BTreeSet<String>, module: &str) {
    let module = module.trim_start_matches('.');
    if !module.is_empty() {
        tokens.insert(module.replace('.', "/"));
    }
}

// ─── JavaScript / TypeScript ─────────────────────────────

fn js_references(content: &str) -> BTreeSet<String> {
    [&*JS_IMPORT_FROM, &*JS_SIDE_EFFECT_IMPORT, &*JS_REQUIRE]
        .into_iter()
        .flat_map(|re| re.captures_iter(content))
        .filter_map(|caps| caps.get(1))
        .map(|m| strip_relative(m.as_str()))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_relative(mut spec: &str) -> &str {
    loop {
        if let Some(rest) = spec.strip_prefix("./") {
            spec = rest;
        } else if let Some(rest) = spec.strip_prefix("../") {
            spec = rest;
        } else {
            return spec;
        }
    }
}

// ─── Rust ────────────────────────────────────────────────

fn rust_references(content: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    let Some(tree) = parse(content, tree_sitter_rust::LANGUAGE.into()) else {
        return tokens;
    };

    visit_all(tree.root_node(), |node| match node.kind() {
        "mod_item" => {
            if let Some(name) = node.child_by_field_name("name") {
                tokens.insert(text(name, content).to_string());
            }
        }
        "use_declaration" => {
            if let Some(arg) = node.child_by_field_name("argument") {
                if let Some(path) = render_use_path(text(arg, content)) {
                    tokens.insert(path);
                }
            }
        }
        _ => {}
    });

    tokens.retain(|t| !t.is_empty());
    tokens
}

/// `crate::store::Index` → `store`, `super::a::{b, c}` → `a`,
/// `std::io::*` → `std/io`.
fn render_use_path(arg: &str) -> Option<String> {
    let mut path = arg.trim();
    let mut keep_last = false;

    if let Some((prefix, _)) = path.split_once('{') {
        path = prefix;
        keep_last = true;
    }
    if let Some(prefix) = path.strip_suffix("*") {
        path = prefix;
        keep_last = true;
    }
    if let Some((prefix, _)) = path.split_once(" as ") {
        path = prefix;
    }

    let mut segments: Vec<&str> = path
        .split("::")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if !keep_last && segments.len() > 1 {
        segments.pop();
    }

    let segments: Vec<&str> = segments
        .into_iter()
        .filter(|s| !matches!(*s, "crate" | "self" | "super"))
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_imports_and_calls() {
        let src = "\
import os
import pkg.sub as s
from ..models import User
from . import helpers
from utils.io import read

def run():
    data = read('x')
    s.process(data)
    helper()
";
        let tokens = extract_references("app/main.py", src);
        for expected in ["os", "pkg/sub", "models", "utils/io", "read", "process", "helper"] {
            assert!(tokens.contains(&expected.to_string()), "missing {expected}: {tokens:?}");
        }
        assert!(!tokens.iter().any(|t| t.is_empty()));
    }

    #[test]
    fn test_python_syntax_error_is_tolerated() {
        let tokens = extract_references("broken.py", "import a\ndef (:\n");
        assert!(tokens.contains(&"a".to_string()));
    }

    #[test]
    fn test_js_imports() {
        let src = r#"
import React from 'react';
import { a, b } from "./lib/util";
import './styles.css';
const fs = require('fs');
const api = require("../../api/client");
"#;
        let tokens = extract_references("web/app.tsx", src);
        assert_eq!(
            tokens,
            vec!["api/client", "fs", "lib/util", "react", "styles.css"]
        );
    }

    #[test]
    fn test_rust_mod_and_use() {
        let src = "\
mod store;
pub mod api;
use crate::store::Index;
use super::config::{Config, LlmConfig};
use std::io::*;
use serde;
";
        let tokens = extract_references("src/lib.rs", src);
        for expected in ["store", "api", "config", "std/io", "serde"] {
            assert!(tokens.contains(&expected.to_string()), "missing {expected}: {tokens:?}");
        }
    }

    #[test]
    fn test_unknown_extension_is_empty() {
        assert!(extract_references("notes.md", "import a").is_empty());
        assert!(extract_references("Makefile", "require('x')").is_empty());
    }

    #[test]
    fn test_render_use_path() {
        assert_eq!(render_use_path("crate::a::B").as_deref(), Some("a"));
        assert_eq!(render_use_path("self::Thing"), None);
        assert_eq!(render_use_path("a::b as c").as_deref(), Some("a"));
        assert_eq!(render_use_path("x::y::{self, z}").as_deref(), Some("x/y"));
    }
}
