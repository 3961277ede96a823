//! Run a query pattern over a source file and print its captures.

use std::path::PathBuf;

use stolyar_query::{Query, QueryCursor};

use super::run_common;

pub struct QueryArgs {
    pub pattern: String,
    pub source_path: Option<PathBuf>,
    pub source_text: Option<String>,
    pub lang: Option<String>,
    pub limit: Option<u32>,
}

pub fn run(args: QueryArgs) {
    let source = run_common::load_source(args.source_text.as_deref(), args.source_path.as_deref());
    let language = run_common::resolve_lang(args.lang.as_deref(), args.source_path.as_deref());
    let tree = run_common::parse(&language, &source);

    let query = Query::compile(&language, &args.pattern).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(1);
    });

    let mut cursor = QueryCursor::new();
    if let Some(limit) = args.limit {
        cursor.set_match_limit(limit);
    }
    let matches = cursor
        .matches(&query, tree.root_node())
        .unwrap_or_else(|e| {
            eprintln!("error: {}", e);
            std::process::exit(1);
        });

    for m in matches {
        for capture in &m.captures {
            let name = query.capture_name(capture.index).unwrap_or("?");
            println!(
                "{}\t@{}\t{}..{}\t{}",
                m.pattern_index,
                name,
                capture.node.start_byte(),
                capture.node.end_byte(),
                capture.node.text(&source)
            );
        }
    }

    if cursor.did_exceed_match_limit() {
        eprintln!("warning: match limit reached, output truncated");
    }
}
