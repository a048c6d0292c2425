//! Data model for save files.
//!
//! - Identifiers shared by items and piles
//! - The lossless document tree (blocks, fields, opaque values)
//! - The structural item role

pub mod document;
pub mod id;

pub use document::{Block, BlockId, Document, Field, ItemRole, Node, Span};
pub use id::{unquote, Identifier};
