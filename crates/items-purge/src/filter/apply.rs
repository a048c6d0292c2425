//! Removing the closure from a document.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::filter::Closure;
use crate::model::{unquote, BlockId, Document, Identifier, Node, Span};

/// What [`apply`] removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOutcome {
    /// Closure items removed, in file order.
    pub removed: Vec<Identifier>,
    /// Items outside the closure that went with an enclosing removed block.
    pub swept: Vec<Identifier>,
    /// Closure items left in place because they enclose a kept item.
    pub held: Vec<Identifier>,
    /// Count fields rewritten.
    pub counts_adjusted: usize,
}

/// Marks every closure item's block for removal and adjusts count fields.
///
/// A closure item whose block encloses an item the closure keeps (protected,
/// on a cycle, or held by one of those) stays in place; closure items nested
/// inside it are still removed one by one. A block inside another removed
/// block is not removed separately and does not count against its parent's
/// count field.
///
/// A count field is only rewritten when it equals the number of item blocks
/// directly inside its record. Anything else is some other quantity and is
/// left alone.
pub fn apply(doc: &mut Document, closure: &Closure) -> ApplyOutcome {
    let holding = holders_of_kept(doc, closure);
    let mut outcome = ApplyOutcome::default();

    let mut selected: FxHashSet<BlockId> = FxHashSet::default();
    for (id, role) in doc.items() {
        if !closure.ids.contains(&role.id) {
            continue;
        }
        if holding.contains(&id) {
            log::warn!(
                "item {} at offset {} encloses an item that must be kept; left in place",
                role.id,
                doc.block(id).span.start
            );
            outcome.held.push(role.id.clone());
            continue;
        }
        selected.insert(id);
    }

    let mut targets: Vec<BlockId> = selected
        .iter()
        .copied()
        .filter(|&id| !has_selected_ancestor(doc, &selected, id))
        .collect();
    targets.sort_unstable();

    let mut removed_per_parent: FxHashMap<BlockId, u64> = FxHashMap::default();
    for &id in &targets {
        if let Some(parent) = doc.block(id).parent {
            *removed_per_parent.entry(parent).or_default() += 1;
        }
    }

    let mut rewrites: Vec<(Span, String)> = Vec::new();
    let mut parents: Vec<_> = removed_per_parent.into_iter().collect();
    parents.sort_unstable();
    for (parent, removed) in parents {
        let Some(field) = doc.block(parent).count() else {
            continue;
        };
        let raw = doc.bytes(field.value);
        let children = item_children(doc, parent);
        match parse_count(raw) {
            Some(declared) if declared == children => {
                rewrites.push((field.value, format_count(raw, declared - removed)));
            }
            Some(declared) => log::warn!(
                "count field at offset {} is {declared} but its record holds {children} items; left unchanged",
                field.key.start
            ),
            None => log::warn!(
                "count field at offset {} is not a plain number ({}); left unchanged",
                field.key.start,
                doc.text(field.value)
            ),
        }
    }
    outcome.counts_adjusted = rewrites.len();

    let mut removed_blocks: Vec<BlockId> = selected.into_iter().collect();
    removed_blocks.sort_unstable();
    for id in removed_blocks {
        if let Some(role) = &doc.block(id).role {
            log::debug!("removing item {} at offset {}", role.id, doc.block(id).span.start);
            outcome.removed.push(role.id.clone());
        }
    }
    for &id in &targets {
        let mut inner = doc.descendants(id);
        inner.sort_unstable();
        for nested in inner {
            if let Some(role) = &doc.block(nested).role {
                if !closure.ids.contains(&role.id) {
                    log::warn!(
                        "item {} is inside removed item {} and goes with it",
                        role.id,
                        doc.block(id).role.as_ref().map(|r| r.id.as_str()).unwrap_or("?")
                    );
                    outcome.swept.push(role.id.clone());
                }
            }
        }
    }

    for id in targets {
        doc.mark_removed(id);
    }
    for (span, text) in rewrites {
        doc.set_rewrite(span, text);
    }

    outcome
}

/// Blocks enclosing, at any depth, an item the closure keeps.
fn holders_of_kept(doc: &Document, closure: &Closure) -> FxHashSet<BlockId> {
    let mut holding = FxHashSet::default();
    for (id, role) in doc.items() {
        if !closure.keeps(role.id.as_str()) {
            continue;
        }
        let mut current = doc.block(id).parent;
        while let Some(parent) = current {
            if !holding.insert(parent) {
                break;
            }
            current = doc.block(parent).parent;
        }
    }
    holding
}

/// Number of item blocks directly inside `id`.
fn item_children(doc: &Document, id: BlockId) -> u64 {
    doc.block(id)
        .children
        .iter()
        .filter(|node| matches!(node, Node::Block(child) if doc.block(*child).role.is_some()))
        .count() as u64
}

fn has_selected_ancestor(doc: &Document, selected: &FxHashSet<BlockId>, id: BlockId) -> bool {
    let mut current = doc.block(id).parent;
    while let Some(parent) = current {
        if selected.contains(&parent) {
            return true;
        }
        current = doc.block(parent).parent;
    }
    false
}

/// Parses a count value: decimal digits, optionally quoted.
pub fn parse_count(raw: &[u8]) -> Option<u64> {
    let digits = unquote(raw);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Formats `value` in the style of `raw`: same quoting, and the same width
/// when `raw` is zero-padded.
pub fn format_count(raw: &[u8], value: u64) -> String {
    let digits = unquote(raw);
    let quoted = digits.len() != raw.len();
    let number = if digits.len() > 1 && digits[0] == b'0' {
        format!("{value:0width$}", width = digits.len())
    } else {
        value.to_string()
    };
    if quoted {
        format!("\"{number}\"")
    } else {
        number
    }
}
