//! Plain-text listing of the items left in a document.
//!
//! One line per item: `id<TAB>pile<TAB>block`, with items physically nested
//! inside other items indented by two spaces per level. Useful for diffing
//! a save before and after cleaning.

use std::fmt::Write;

use crate::model::{BlockId, Document};

/// Renders every item that is not removed.
pub fn render_listing(doc: &Document) -> String {
    let mut out = String::new();
    for (id, role) in doc.items() {
        if doc.is_removed(id) {
            continue;
        }
        let depth = item_depth(doc, id);
        let pile = role.pile.as_ref().map(|p| p.as_str()).unwrap_or("-");
        let _ = writeln!(
            out,
            "{:indent$}{}\t{}\t{}",
            "",
            role.id,
            pile,
            doc.block_name(id),
            indent = depth * 2
        );
    }
    out
}

/// Number of item blocks enclosing `id`.
fn item_depth(doc: &Document, id: BlockId) -> usize {
    let mut depth = 0;
    let mut current = doc.block(id).parent;
    while let Some(parent) = current {
        if doc.block(parent).role.is_some() {
            depth += 1;
        }
        current = doc.block(parent).parent;
    }
    depth
}
