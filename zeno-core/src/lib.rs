//! Core compiler pipeline for the Zeno language.
//!
//! The pipeline is roughly:
//!
//!   source .zeno
//!     -> lexer      (tokens, lazily pulled by the parser)
//!     -> parser     (AST + accumulated syntax diagnostics)
//!     -> analysis   (lint issues; advisory only)
//!     -> codegen_go (single-file `package main` Go source)
//!
//! Higher-level tools (the CLI, editors, tests) should depend on this
//! crate rather than reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Semantic layers: types, scopes, traversal, lint analysis
// ---------------------------------------------------------------------

pub mod types;
pub mod scope;
pub mod visit;
pub mod analysis;

// ---------------------------------------------------------------------
// Native bridge and stdlib integration
// ---------------------------------------------------------------------

pub mod bridge;
pub mod stdlib;

// ---------------------------------------------------------------------
// Back-end: code generation and compiler orchestration
// ---------------------------------------------------------------------

pub mod codegen_go;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use analysis::{Analyzer, Issue, Rule};
pub use compiler::{
    CompilationArtifact, CompileOptions, compile_file, compile_go, lint_file, lint_source,
};
pub use error::{CoreError, GenerateError};
pub use stdlib::{FsResolver, MemoryResolver, ModuleResolver};
