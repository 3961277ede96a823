pub mod langs;
pub mod query;
pub mod run_common;
pub mod tree;
