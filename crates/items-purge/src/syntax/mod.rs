//! Text format for save files.
//!
//! A save file is a sequence of nested blocks and `key = value` fields.
//! Parsing keeps every byte span so serialization reproduces untouched
//! regions exactly.

pub mod parse;
pub mod scanner;
pub mod serialize;

pub use parse::parse;
pub use scanner::{Scanner, Token, TokenKind};
pub use serialize::{removal_span, serialize};
