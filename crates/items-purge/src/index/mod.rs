//! Item index: identifier lookup and pile membership.
//!
//! Ownership is kept as a graph keyed by identifier rather than as pointers
//! between blocks, so the closure and cycle walks never touch the arena.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::ConsistencyError;
use crate::model::{BlockId, Document, Identifier};

/// Where an item lives and which pile it declares.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRef {
    pub block: BlockId,
    pub pile: Option<Identifier>,
    /// Byte offset of the item's block, for diagnostics.
    pub offset: usize,
}

/// Lookup from item identifier to record, and from pile to members.
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    by_id: FxHashMap<Identifier, ItemRef>,
    children_of: FxHashMap<Identifier, FxHashSet<Identifier>>,
}

impl ItemIndex {
    /// Builds the index in one pass over the document's items.
    ///
    /// Two items declaring the same identifier abort the build: picking one
    /// would risk removing an unrelated record.
    pub fn build(doc: &Document) -> Result<Self, ConsistencyError> {
        let mut index = Self::default();

        for (block, role) in doc.items() {
            let offset = doc.block(block).span.start;
            if let Some(existing) = index.by_id.get(&role.id) {
                return Err(ConsistencyError::DuplicateIdentifier {
                    id: role.id.clone(),
                    first: existing.offset,
                    second: offset,
                });
            }
            if let Some(pile) = &role.pile {
                index
                    .children_of
                    .entry(pile.clone())
                    .or_default()
                    .insert(role.id.clone());
            }
            index.by_id.insert(
                role.id.clone(),
                ItemRef {
                    block,
                    pile: role.pile.clone(),
                    offset,
                },
            );
        }

        Ok(index)
    }

    pub fn get(&self, id: &str) -> Option<&ItemRef> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Returns the pile an item declares.
    pub fn pile_of(&self, id: &str) -> Option<&Identifier> {
        self.by_id.get(id)?.pile.as_ref()
    }

    /// Returns the items whose pile is `pile`.
    pub fn members<'a>(&'a self, pile: &str) -> impl Iterator<Item = &'a Identifier> + use<'a> {
        self.children_of.get(pile).into_iter().flatten()
    }

    /// Iterates over all indexed items, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &ItemRef)> + '_ {
        self.by_id.iter()
    }

    /// Returns the distinct pile identifiers referenced by items.
    pub fn piles(&self) -> impl Iterator<Item = &Identifier> + '_ {
        self.children_of.keys()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
