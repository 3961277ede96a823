//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("stolyar")
        .about("Incremental parsing and tree queries for built-in grammars")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(tree_command())
        .subcommand(query_command())
        .subcommand(langs_command())
}

/// Parse a source file and print its syntax tree.
fn tree_command() -> Command {
    Command::new("tree")
        .about("Parse a source file and print its syntax tree")
        .override_usage(
            "\
  stolyar tree <SOURCE>
  stolyar tree -s <TEXT> -l <LANG>",
        )
        .after_help(
            r#"EXAMPLES:
  stolyar tree config.json            # language inferred from extension
  stolyar tree - -l arith             # read source from stdin
  stolyar tree -s '1 + 2 * 3' -l arith"#,
        )
        .arg(source_path_arg())
        .arg(source_text_arg())
        .arg(lang_arg())
}

/// Run a query pattern over a source file and print its captures.
fn query_command() -> Command {
    Command::new("query")
        .about("Run a query pattern over a source file and print captures")
        .override_usage(
            "\
  stolyar query <PATTERN> <SOURCE>
  stolyar query <PATTERN> -s <TEXT> -l <LANG>",
        )
        .after_help(
            r#"EXAMPLES:
  stolyar query '(pair key: (string) @k)' config.json
  stolyar query '(number) @n' -s '1 + 2' -l arith
  stolyar query '(number) @n' big.json --limit 100"#,
        )
        .arg(pattern_arg())
        .arg(source_path_arg())
        .arg(source_text_arg())
        .arg(lang_arg())
        .arg(limit_arg())
}

/// List built-in languages.
fn langs_command() -> Command {
    Command::new("langs").about("List built-in languages")
}
