#![allow(dead_code)]
use std::fs;
use std::path::Path;

use jsonx::ast::Node;
use jsonx::{lexer, parser};

pub fn workloads(tag: &str) -> Vec<(String, String)> {
    test_support::bench_workloads(Path::new("tests/programs"), tag)
        .unwrap_or_else(|err| panic!("load bench workloads: {err:#}"))
        .into_iter()
        .map(|(name, path)| (name, path.display().to_string()))
        .collect()
}

pub fn load_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {path}: {err}"))
}

pub fn load_document(path: &str) -> Node {
    let source = load_source(path);
    let tokens = lexer::tokenize(&source).unwrap_or_else(|err| panic!("tokenize {path}: {err}"));
    parser::parse_tokens(tokens).unwrap_or_else(|err| panic!("parse {path}: {err}"))
}
