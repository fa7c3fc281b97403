//! C struct parser
//!
//! This module transforms C source text into a [`ParseResult`]:
//! - [`lexer`]: Tokenization (source text → lexemes)
//! - [`parse`]: Pratt parsing (lexemes → symbols, scopes, diagnostics)
//! - [`ast`]: Symbol, scope and result definitions
//! - [`symbols`]: The prototype table describing the grammar
//! - [`comments`]: Binding comments to declarations
//! - [`diagnostics`]: Errors and warnings collected while parsing
//!
//! # Supported C Subset
//!
//! - `struct` declarations, forward declarations and `typedef` aliases
//! - Members of primitive type (`char`, `int`, `unsigned long long`, ...)
//! - Fixed-size arrays with an integer literal dimension
//! - Block and line comments
//! - No preprocessor, pointers, unions, bitfields, nested structs or functions
//!
//! # Parser Implementation
//!
//! Top-down operator precedence parser (Pratt) driven by a prototype table.
//! Parsing never stops at the first problem: every error or warning becomes a
//! [`Diagnostic`](diagnostics::Diagnostic) and a best-effort tree is returned.

pub mod ast;
pub mod comments;
mod declarations;
pub mod diagnostics;
mod expressions;
pub mod lexer;
pub mod parse;
mod scope;
pub mod symbols;

pub use ast::ParseResult;
pub use parse::{parse, Parser};
