//! Shared input loading for the tree and query commands.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use stolyar_core::Language;
use stolyar_parser::{ParseOutcome, Parser, Tree};

/// Load source code from inline text, a file, or stdin (`-`).
pub fn load_source(source_text: Option<&str>, source_path: Option<&Path>) -> String {
    if let Some(text) = source_text {
        return text.to_owned();
    }
    if let Some(path) = source_path {
        if path.as_os_str() == "-" {
            let mut buf = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buf) {
                eprintln!("error: failed to read stdin: {}", e);
                std::process::exit(1);
            }
            return buf;
        }
        return fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("error: failed to read '{}': {}", path.display(), e);
            std::process::exit(1);
        });
    }
    eprintln!("error: source is required: use a positional file or -s/--source");
    std::process::exit(1);
}

/// Resolve the language from --lang or the source file extension.
pub fn resolve_lang(lang_name: Option<&str>, source_path: Option<&Path>) -> Language {
    if let Some(name) = lang_name {
        return stolyar_langs::from_name(name).unwrap_or_else(|| {
            eprintln!("error: unknown language '{}'", name);
            eprintln!();
            eprintln!("Run 'stolyar langs' for the full list.");
            std::process::exit(1);
        });
    }

    if let Some(path) = source_path
        && path.as_os_str() != "-"
        && let Some(ext) = path.extension().and_then(|e| e.to_str())
    {
        if let Some(language) = stolyar_langs::from_ext(ext) {
            return language;
        }
        eprintln!(
            "error: cannot infer language from extension '.{}', use --lang",
            ext
        );
        std::process::exit(1);
    }

    eprintln!("error: --lang is required (cannot infer from input)");
    std::process::exit(1)
}

/// Parse the source from scratch. No timeout or cancellation flag is set
/// here, so the parser always completes.
pub fn parse(language: &Language, source: &str) -> Tree {
    match Parser::new(language.clone()).parse(source, None) {
        ParseOutcome::Tree(tree) => tree,
        ParseOutcome::Cancelled | ParseOutcome::TimedOut => {
            eprintln!("error: parse interrupted");
            std::process::exit(1);
        }
    }
}
