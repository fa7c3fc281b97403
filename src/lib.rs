//! # Introduction
//!
//! Wick reads C struct declarations and produces a documented program model
//! that binary serializer generators turn into reader/writer code.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Pratt parser → ParseResult → Program model → Generators
//! ```
//!
//! 1. [`parser`]: tokenises the source, parses struct and member declarations
//!    into a symbol arena with scopes, and collects comments and diagnostics.
//! 2. [`model`]: resolves struct symbols into [`model::Struct`]s with member
//!    types, array lengths, comment descriptions and binary layout.
//!
//! ## Supported C subset
//!
//! `struct` declarations (with forward declarations and `typedef` aliases),
//! members of primitive type, fixed-size arrays and comments.
//!
//! ```
//! use wick::model::{ModelOptions, Program};
//!
//! let program = Program::from_source(
//!     "// A 2D point\nstruct point { int x; int y; };",
//!     &ModelOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(program.structs[0].description, "A 2D point");
//! assert_eq!(program.structs[0].size, 8);
//! ```

pub mod model;
pub mod parser;

pub use parser::parse;
