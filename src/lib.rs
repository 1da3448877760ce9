//! Compiler for JSONX, a JSON template language.
//!
//! A JSONX document is JSON extended with `var` bindings, arithmetic and string
//! expressions, `this` references into the object being built, and `-> { ... }`
//! callable blocks. [`compile`] runs the whole pipeline: [`lexer`] →
//! [`parser`] → [`interpreter`] → JSON text.

use std::path::{Path, PathBuf};

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::CompileError;

/// Output settings for [`compile_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Indent the JSON output instead of emitting it on one line.
    pub pretty: bool,
}

/// Compiles JSONX source text into compact JSON text.
pub fn compile(source: &str) -> Result<String, CompileError> {
    compile_with(source, &CompileOptions::default())
}

pub fn compile_with(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    let tokens = lexer::tokenize(source)?;
    let document = parser::parse_tokens(tokens)?;
    let json = interpreter::Interpreter::new().build(&document)?;
    let text = if options.pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    Ok(text)
}

/// Path of the JSON file written next to a `.jsonx` input.
pub fn output_path_for(input: &Path) -> PathBuf {
    input.with_extension("json")
}
