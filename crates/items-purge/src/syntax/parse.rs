//! Save-file parsing.
//!
//! A stack-based scan: `{` pushes a block, `}` pops it, and `key = value`
//! appends a field to the innermost open block. Blocks are classified into
//! items as they close.

use crate::config::Grammar;
use crate::error::ParseError;
use crate::limits::{MAX_INPUT_SIZE, MAX_NESTING_DEPTH};
use crate::model::{unquote, Block, BlockId, Document, Field, Identifier, ItemRole, Node, Span};
use crate::syntax::scanner::{Scanner, Token, TokenKind};

/// Parses a save file into a lossless [`Document`].
///
/// Fails on unbalanced braces, a key without a value, a stray `=`, or a
/// block that looks like an item but has no usable identifier. Block and
/// field shapes the grammar does not know are kept as pass-through nodes.
pub fn parse(input: &[u8], grammar: &Grammar) -> Result<Document, ParseError> {
    if input.len() > MAX_INPUT_SIZE {
        return Err(ParseError::InputTooLarge {
            len: input.len(),
            max: MAX_INPUT_SIZE,
        });
    }

    let mut scanner = Scanner::new(input, &grammar.comment_prefixes);
    let mut tree = TreeBuilder::default();

    loop {
        let token = scanner.next_token()?;
        match token.kind {
            TokenKind::Eof => break,
            TokenKind::Open => tree.open(None, token.span.start, token.span)?,
            TokenKind::Close => {
                let id = tree.close(token.span)?;
                classify(&mut tree.blocks[id], input, grammar)?;
            }
            TokenKind::Equals => {
                return Err(ParseError::UnexpectedToken {
                    found: '=',
                    offset: token.span.start,
                });
            }
            TokenKind::Word | TokenKind::Quoted => parse_after_atom(&mut scanner, &mut tree, token, input)?,
        }
    }

    if let Some(&open) = tree.stack.last() {
        return Err(ParseError::UnclosedBlock {
            offset: tree.blocks[open].open.start,
        });
    }

    Ok(Document::from_parts(input.to_vec(), tree.blocks, tree.roots))
}

/// Handles the tokens following a word or string: a field, a named block,
/// or an opaque value.
fn parse_after_atom(
    scanner: &mut Scanner<'_>,
    tree: &mut TreeBuilder,
    key: Token,
    input: &[u8],
) -> Result<(), ParseError> {
    let next = scanner.peek_token()?;
    match next.kind {
        TokenKind::Equals => {
            scanner.next_token()?;
            let value = scanner.next_token()?;
            if value.is_atom() {
                tree.push(Node::Field(Field {
                    key: key.span,
                    value: value.span,
                }));
                return Ok(());
            }
            match value.kind {
                TokenKind::Open => tree.open(Some(key.span), key.span.start, value.span),
                _ => Err(ParseError::MissingValue {
                    key: String::from_utf8_lossy(&input[key.span.start..key.span.end]).into_owned(),
                    offset: next.span.end,
                }),
            }
        }
        TokenKind::Open => {
            scanner.next_token()?;
            tree.open(Some(key.span), key.span.start, next.span)
        }
        _ => {
            tree.push(Node::Value(key.span));
            Ok(())
        }
    }
}

/// Arena and open-block stack used while scanning.
#[derive(Debug, Default)]
struct TreeBuilder {
    blocks: Vec<Block>,
    roots: Vec<Node>,
    stack: Vec<BlockId>,
}

impl TreeBuilder {
    fn push(&mut self, node: Node) {
        match self.stack.last() {
            Some(&parent) => self.blocks[parent].children.push(node),
            None => self.roots.push(node),
        }
    }

    fn open(&mut self, name: Option<Span>, start: usize, open: Span) -> Result<(), ParseError> {
        if self.stack.len() >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                offset: start,
                max: MAX_NESTING_DEPTH,
            });
        }
        let id = self.blocks.len();
        self.blocks.push(Block {
            name,
            span: Span::new(start, open.end),
            open,
            close: Span::default(),
            children: Vec::new(),
            parent: self.stack.last().copied(),
            role: None,
            count_field: None,
        });
        self.push(Node::Block(id));
        self.stack.push(id);
        Ok(())
    }

    fn close(&mut self, close: Span) -> Result<BlockId, ParseError> {
        let id = self
            .stack
            .pop()
            .ok_or(ParseError::UnbalancedClose { offset: close.start })?;
        let block = &mut self.blocks[id];
        block.close = close;
        block.span.end = close.end;
        Ok(id)
    }
}

/// Assigns the item role and count field of a closed block from its direct
/// fields.
fn classify(block: &mut Block, input: &[u8], grammar: &Grammar) -> Result<(), ParseError> {
    let mut id_field: Option<Field> = None;
    let mut pile_field: Option<Field> = None;

    for (index, node) in block.children.iter().enumerate() {
        let Node::Field(field) = node else { continue };
        let key = unquote(&input[field.key.start..field.key.end]);

        if grammar.is_id_key(key) {
            if id_field.replace(*field).is_some() {
                return Err(duplicate_field(key, field));
            }
        } else if grammar.is_pile_key(key) {
            if pile_field.replace(*field).is_some() {
                return Err(duplicate_field(key, field));
            }
        } else if grammar.is_count_key(key) && block.count_field.is_none() {
            block.count_field = Some(index);
        }
    }

    let Some(id_field) = id_field else {
        if pile_field.is_some() {
            let name = block
                .name
                .map(|s| String::from_utf8_lossy(&input[s.start..s.end]).into_owned())
                .unwrap_or_default();
            return Err(ParseError::MissingIdentifier {
                block: name,
                offset: block.span.start,
            });
        }
        return Ok(());
    };

    let id = identifier(input, id_field.value)?;
    let pile = pile_field.map(|f| identifier(input, f.value)).transpose()?;
    block.role = Some(ItemRole { id, pile });
    Ok(())
}

fn identifier(input: &[u8], span: Span) -> Result<Identifier, ParseError> {
    Identifier::from_raw(&input[span.start..span.end], span.start)
}

fn duplicate_field(key: &[u8], field: &Field) -> ParseError {
    ParseError::DuplicateField {
        key: String::from_utf8_lossy(key).into_owned(),
        offset: field.key.start,
    }
}
