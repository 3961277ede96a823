//! Parse a source file and print its syntax tree.

use std::path::PathBuf;

use super::run_common;

pub struct TreeArgs {
    pub source_path: Option<PathBuf>,
    pub source_text: Option<String>,
    pub lang: Option<String>,
}

pub fn run(args: TreeArgs) {
    let source = run_common::load_source(args.source_text.as_deref(), args.source_path.as_deref());
    let language = run_common::resolve_lang(args.lang.as_deref(), args.source_path.as_deref());
    let tree = run_common::parse(&language, &source);

    println!("{}", tree.root_node().to_sexp());

    if tree.root_node().has_error() {
        eprintln!("warning: source contains syntax errors");
    }
}
