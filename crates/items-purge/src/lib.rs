//! items-purge: remove permanently deleted items from a game save.
//!
//! Games that keep a "permanently deleted" pile in their save data still
//! load and simulate everything in it. This crate rewrites the save file
//! without those records while leaving every other byte exactly as it was.
//!
//! # Quick Start
//!
//! ```rust
//! use items_purge::{clean_bytes, CleanOptions, Grammar};
//!
//! let input = b"items { count = 2
//!   item { id = 1001  name = Wrench      pile = Garage }
//!   item { id = 2002  name = EmptyBottle pile = PermanentlyDeletedItems }
//! }
//! ";
//!
//! let cleaned = clean_bytes(input, &Grammar::default(), &CleanOptions::default()).unwrap();
//! assert_eq!(cleaned.report.removed.len(), 1);
//! assert_eq!(
//!     cleaned.output,
//!     b"items { count = 1
//!   item { id = 1001  name = Wrench      pile = Garage }
//! }
//! "
//! );
//! ```
//!
//! # Modules
//!
//! - [`syntax`]: Lossless tokenizer, parser and serializer
//! - [`model`]: Document tree, identifiers and the item role
//! - [`index`]: Identifier and pile lookup
//! - [`filter`]: Deletion closure and its removal
//! - [`backup`]: Backup rotation and atomic replacement
//! - [`pipeline`]: The whole run, in memory or against a file
//! - [`listing`]: Item listing for inspection
//! - [`config`]: Grammar and run options
//! - [`error`]: Error types
//! - [`limits`]: Input limits and well-known constants
//!
//! # Safety of the rewrite
//!
//! - Untouched regions are copied from the original bytes, never re-emitted
//! - Nothing is written until the whole file has parsed and checked out
//! - The previous content always survives as the newest backup

pub mod backup;
pub mod config;
pub mod error;
pub mod filter;
pub mod index;
pub mod limits;
pub mod listing;
pub mod model;
pub mod pipeline;
pub mod syntax;

// Re-export commonly used types at crate root
pub use backup::{backup_path, rotate_and_write, FsStorage, MemoryStorage, Rotation, Storage};
pub use config::{CleanOptions, Grammar, Protection};
pub use error::{CleanError, ConsistencyError, ErrorCode, ParseError};
pub use filter::{apply, compute_closure, compute_closure_with, ApplyOutcome, Closure};
pub use index::{ItemIndex, ItemRef};
pub use listing::render_listing;
pub use model::{Block, BlockId, Document, Field, Identifier, ItemRole, Node, Span};
pub use pipeline::{clean_bytes, clean_file, CleanReport, Cleaned};
pub use syntax::{parse, serialize};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
