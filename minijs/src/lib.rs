//! minijs interpreter library
//!
//! Embeddable JavaScript-like interpreter: lexer, backtracking
//! recursive-descent parser, and tree-walking evaluator with a
//! prototype-based runtime object model.

pub mod ast;
pub mod engine;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

pub use engine::Engine;
pub use error::{Error, Result};
pub use interp::{Num, Value};
