//! Lossless syntax tree for save files.
//!
//! A [`Document`] owns the original bytes and an arena of [`Block`]s. Every
//! node records the byte span it was parsed from, so anything the cleaner
//! does not touch is written back verbatim. Edits (removed blocks and
//! rewritten values) are recorded beside the tree instead of mutating the
//! source text.

use std::borrow::Cow;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::Identifier;

/// Half-open byte range `[start, end)` into the document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Index of a block in the document arena.
pub type BlockId = usize;

/// A child of the root or of a block, in file order.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `key = value`.
    Field(Field),
    /// A nested block, stored in the arena.
    Block(BlockId),
    /// A lone word or string the grammar does not interpret.
    Value(Span),
}

/// A `key = value` pair. Both parts keep their raw spelling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub key: Span,
    pub value: Span,
}

/// Semantic role of a block that carries an identifier field.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRole {
    /// The item's own identifier.
    pub id: Identifier,
    /// The pile (or containing item) this item belongs to, if declared.
    pub pile: Option<Identifier>,
}

/// A braced region: `name {`, `name = {` or a bare `{`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Block name, if the block has one.
    pub name: Option<Span>,
    /// Whole block from the name (or brace) through the closing brace.
    pub span: Span,
    /// The opening brace.
    pub open: Span,
    /// The closing brace.
    pub close: Span,
    /// Fields, nested blocks and opaque values in file order.
    pub children: Vec<Node>,
    /// Enclosing block, `None` at top level.
    pub parent: Option<BlockId>,
    /// Item role, assigned structurally when the block has an id field.
    pub role: Option<ItemRole>,
    /// Index into `children` of the field that counts this block's children.
    pub count_field: Option<usize>,
}

impl Block {
    /// Returns the count field, if the block declares one.
    pub fn count(&self) -> Option<&Field> {
        match self.children.get(self.count_field?) {
            Some(Node::Field(field)) => Some(field),
            _ => None,
        }
    }
}

/// Edits recorded against a parsed document.
#[derive(Debug, Clone, Default, PartialEq)]
struct Edits {
    removed: FxHashSet<BlockId>,
    /// Replacement text keyed by the start offset of the value it replaces.
    rewrites: FxHashMap<usize, String>,
}

/// A parsed save file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    source: Vec<u8>,
    blocks: Vec<Block>,
    roots: Vec<Node>,
    edits: Edits,
}

impl Document {
    pub(crate) fn from_parts(source: Vec<u8>, blocks: Vec<Block>, roots: Vec<Node>) -> Self {
        Self {
            source,
            blocks,
            roots,
            edits: Edits::default(),
        }
    }

    /// Returns the original bytes the document was parsed from.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Returns the raw bytes covered by `span`.
    pub fn bytes(&self, span: Span) -> &[u8] {
        &self.source[span.start..span.end]
    }

    /// Returns the text covered by `span`, replacing invalid UTF-8.
    pub fn text(&self, span: Span) -> Cow<'_, str> {
        String::from_utf8_lossy(self.bytes(span))
    }

    /// Returns top-level nodes in file order.
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Returns all blocks in the order their opening braces appear.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    /// Returns the block's name text, or an empty string for anonymous blocks.
    pub fn block_name(&self, id: BlockId) -> Cow<'_, str> {
        match self.blocks[id].name {
            Some(span) => self.text(span),
            None => Cow::Borrowed(""),
        }
    }

    /// Iterates over every block with an item role.
    pub fn items(&self) -> impl Iterator<Item = (BlockId, &ItemRole)> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(id, block)| block.role.as_ref().map(|role| (id, role)))
    }

    /// Returns every block nested (at any depth) inside `id`.
    pub fn descendants(&self, id: BlockId) -> Vec<BlockId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for node in &self.blocks[current].children {
                if let Node::Block(child) = node {
                    out.push(*child);
                    stack.push(*child);
                }
            }
        }
        out
    }

    /// Returns true if the block, or any block enclosing it, was removed.
    pub fn is_removed(&self, id: BlockId) -> bool {
        let mut current = Some(id);
        while let Some(block) = current {
            if self.edits.removed.contains(&block) {
                return true;
            }
            current = self.blocks[block].parent;
        }
        false
    }

    /// Returns true if the block itself was marked for removal.
    pub(crate) fn is_marked(&self, id: BlockId) -> bool {
        self.edits.removed.contains(&id)
    }

    /// Returns replacement text for a value starting at `span.start`.
    pub fn rewrite(&self, span: Span) -> Option<&str> {
        self.edits.rewrites.get(&span.start).map(String::as_str)
    }

    /// Returns true if any removal or rewrite was recorded.
    pub fn is_modified(&self) -> bool {
        !self.edits.removed.is_empty() || !self.edits.rewrites.is_empty()
    }

    /// Number of blocks marked for removal (not counting blocks inside them).
    pub fn removed_block_count(&self) -> usize {
        self.edits.removed.len()
    }

    pub(crate) fn mark_removed(&mut self, id: BlockId) {
        self.edits.removed.insert(id);
    }

    pub(crate) fn set_rewrite(&mut self, value: Span, text: String) {
        self.edits.rewrites.insert(value.start, text);
    }
}
