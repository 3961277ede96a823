//! Built-in demo grammars.
//!
//! Each grammar is compiled once, on first use, and shared from then on
//! (a [`Language`] clone is an `Arc` bump). The registry resolves
//! languages by name or by file extension for the CLI.

use std::sync::LazyLock;

use stolyar_core::{GrammarBuilder, Language, Production};

#[cfg(test)]
mod lib_tests;

/// Infix arithmetic over integers and identifiers, with `+ - * /` and
/// parentheses.
pub fn arithmetic() -> Language {
    static LANG: LazyLock<Language> = LazyLock::new(|| {
        GrammarBuilder::new("arithmetic")
            .token("number", "[0-9]+")
            .token("identifier", "[A-Za-z_][A-Za-z0-9_]*")
            .literal("+")
            .literal("-")
            .literal("*")
            .literal("/")
            .literal("(")
            .literal(")")
            .extra_anon("whitespace", "[ \\t\\r\\n]+")
            .extra_token("comment", "#[^\\n]*")
            .production(Production::new("program").sym("_expression"))
            .production(
                Production::new("binary_expression")
                    .field("left", "_expression")
                    .sym("+")
                    .field("right", "_expression")
                    .prec_left(1),
            )
            .production(
                Production::new("binary_expression")
                    .field("left", "_expression")
                    .sym("-")
                    .field("right", "_expression")
                    .prec_left(1),
            )
            .production(
                Production::new("binary_expression")
                    .field("left", "_expression")
                    .sym("*")
                    .field("right", "_expression")
                    .prec_left(2),
            )
            .production(
                Production::new("binary_expression")
                    .field("left", "_expression")
                    .sym("/")
                    .field("right", "_expression")
                    .prec_left(2),
            )
            .production(
                Production::new("paren_expression")
                    .sym("(")
                    .sym("_expression")
                    .sym(")"),
            )
            .production(Production::new("_expression").sym("binary_expression"))
            .production(Production::new("_expression").sym("paren_expression"))
            .production(Production::new("_expression").sym("number"))
            .production(Production::new("_expression").sym("identifier"))
            .build()
            .expect("arithmetic grammar compiles")
    });
    LANG.clone()
}

/// JSON without exponents or unicode escapes validation: objects, arrays,
/// strings, integers and decimals, `true`, `false`, `null`.
pub fn json_mini() -> Language {
    static LANG: LazyLock<Language> = LazyLock::new(|| {
        GrammarBuilder::new("json_mini")
            // Keywords go before broad tokens: declaration order is match
            // priority.
            .token("true", "true")
            .token("false", "false")
            .token("null", "null")
            .token("string", r#""(?:[^"\\]|\\.)*""#)
            .token("number", r"-?[0-9]+(\.[0-9]+)?")
            .literal("{")
            .literal("}")
            .literal("[")
            .literal("]")
            .literal(",")
            .literal(":")
            .extra_anon("whitespace", "[ \\t\\r\\n]+")
            .production(Production::new("document").sym("_value"))
            .production(Production::new("object").sym("{").sym("}"))
            .production(
                Production::new("object")
                    .sym("{")
                    .sym("_members")
                    .sym("}"),
            )
            .production(Production::new("_members").sym("pair"))
            .production(
                Production::new("_members")
                    .sym("_members")
                    .sym(",")
                    .sym("pair"),
            )
            .production(
                Production::new("pair")
                    .field("key", "string")
                    .sym(":")
                    .field("value", "_value"),
            )
            .production(Production::new("array").sym("[").sym("]"))
            .production(
                Production::new("array")
                    .sym("[")
                    .sym("_elements")
                    .sym("]"),
            )
            .production(Production::new("_elements").sym("_value"))
            .production(
                Production::new("_elements")
                    .sym("_elements")
                    .sym(",")
                    .sym("_value"),
            )
            .production(Production::new("_value").sym("object"))
            .production(Production::new("_value").sym("array"))
            .production(Production::new("_value").sym("string"))
            .production(Production::new("_value").sym("number"))
            .production(Production::new("_value").sym("true"))
            .production(Production::new("_value").sym("false"))
            .production(Production::new("_value").sym("null"))
            .build()
            .expect("json_mini grammar compiles")
    });
    LANG.clone()
}

/// Resolve a built-in language by name or alias, case-insensitively.
pub fn from_name(name: &str) -> Option<Language> {
    match name.to_ascii_lowercase().as_str() {
        "arithmetic" | "arith" => Some(arithmetic()),
        "json_mini" | "json-mini" | "json" => Some(json_mini()),
        _ => None,
    }
}

/// Resolve a built-in language by file extension.
pub fn from_ext(ext: &str) -> Option<Language> {
    match ext.to_ascii_lowercase().as_str() {
        "arith" => Some(arithmetic()),
        "json" => Some(json_mini()),
        _ => None,
    }
}

/// All built-in languages.
pub fn all() -> Vec<Language> {
    vec![arithmetic(), json_mini()]
}
