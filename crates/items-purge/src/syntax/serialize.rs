//! Save-file serialization.
//!
//! Output is assembled from the original source: gaps between nodes
//! (whitespace, comments) and every untouched node are copied verbatim.
//! Removed blocks are cut out together with their separator, and rewritten
//! values are substituted in place. Nothing else is reflowed.

use crate::model::{Block, Document, Node, Span};

/// Serializes a document, applying recorded removals and rewrites.
///
/// For an unmodified document this returns exactly the parsed bytes.
pub fn serialize(doc: &Document) -> Vec<u8> {
    let mut out = Vec::with_capacity(doc.source().len());
    emit_children(doc, doc.roots(), Span::new(0, doc.source().len()), &mut out);
    out
}

/// Emits `children` and the gaps between them, covering all of `content`.
fn emit_children(doc: &Document, children: &[Node], content: Span, out: &mut Vec<u8>) {
    let src = doc.source();
    let mut cursor = content.start;

    for node in children {
        match node {
            Node::Block(id) if doc.is_marked(*id) => {
                let cut = removal_span(src, doc.block(*id).span, content);
                if cut.start > cursor {
                    out.extend_from_slice(&src[cursor..cut.start]);
                }
                cursor = cursor.max(cut.end);
            }
            Node::Block(id) => {
                let block = doc.block(*id);
                out.extend_from_slice(&src[cursor..block.span.start]);
                emit_block(doc, block, out);
                cursor = block.span.end;
            }
            Node::Field(field) => {
                out.extend_from_slice(&src[cursor..field.value.start]);
                match doc.rewrite(field.value) {
                    Some(text) => out.extend_from_slice(text.as_bytes()),
                    None => out.extend_from_slice(doc.bytes(field.value)),
                }
                cursor = field.value.end;
            }
            Node::Value(span) => {
                out.extend_from_slice(&src[cursor..span.end]);
                cursor = span.end;
            }
        }
    }

    if content.end > cursor {
        out.extend_from_slice(&src[cursor..content.end]);
    }
}

fn emit_block(doc: &Document, block: &Block, out: &mut Vec<u8>) {
    let src = doc.source();
    out.extend_from_slice(&src[block.span.start..block.open.end]);
    emit_children(
        doc,
        &block.children,
        Span::new(block.open.end, block.close.start),
        out,
    );
    out.extend_from_slice(&src[block.close.start..block.close.end]);
}

/// Widens a removed block's span to take its layout with it.
///
/// - Alone on its line(s): the whole lines go, newline included.
/// - Last thing on a line: leading horizontal whitespace goes, the newline stays.
/// - Otherwise: the following separator goes, or the preceding one if none
///   follows and the next byte still keeps its neighbours apart.
///
/// The result never leaves `container` and never joins two tokens.
pub fn removal_span(src: &[u8], span: Span, container: Span) -> Span {
    let mut before = span.start;
    while before > container.start && is_hspace(src[before - 1]) {
        before -= 1;
    }
    let mut after = span.end;
    while after < container.end && is_hspace(src[after]) {
        after += 1;
    }

    let starts_line = before == 0 || src[before - 1] == b'\n';
    let line_end = if after == src.len() {
        Some(after)
    } else if after < container.end {
        newline_end(src, after)
    } else {
        None
    };

    match line_end {
        Some(end) if starts_line => Span::new(before, end),
        Some(_) => Span::new(before, after),
        None if after > span.end => Span::new(span.start, after),
        None if separates(src, span.end, container) => Span::new(before, span.end),
        None => span,
    }
}

/// Returns true if the byte at `pos` ends any token before it.
fn separates(src: &[u8], pos: usize, container: Span) -> bool {
    pos >= container.end
        || src[pos].is_ascii_whitespace()
        || matches!(src[pos], b'{' | b'}' | b'=' | b'"')
}

/// Returns the offset just past a newline starting at `pos`, if any.
fn newline_end(src: &[u8], pos: usize) -> Option<usize> {
    match src.get(pos) {
        Some(b'\n') => Some(pos + 1),
        Some(b'\r') if src.get(pos + 1) == Some(&b'\n') => Some(pos + 2),
        _ => None,
    }
}

#[inline]
fn is_hspace(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Grammar;
    use crate::syntax::parse;

    fn roundtrip(input: &str) {
        let doc = parse(input.as_bytes(), &Grammar::default()).unwrap();
        assert_eq!(
            String::from_utf8(serialize(&doc)).unwrap(),
            input,
            "round trip changed {input:?}"
        );
    }

    /// Removes the blocks named by `ids` (item ids) and serializes.
    fn remove(input: &str, ids: &[&str]) -> String {
        let mut doc = parse(input.as_bytes(), &Grammar::default()).unwrap();
        let targets: Vec<_> = doc
            .items()
            .filter(|(_, role)| ids.contains(&role.id.as_str()))
            .map(|(id, _)| id)
            .collect();
        for id in targets {
            doc.mark_removed(id);
        }
        String::from_utf8(serialize(&doc)).unwrap()
    }

    #[test]
    fn test_roundtrip_preserves_layout() {
        roundtrip("");
        roundtrip("\n\n  \n");
        roundtrip("items { count = 2\n  item { id = 1001  name = Wrench      pile = Garage }\n}\n");
        roundtrip("# comment { not a block\nroot={x=1}// tail\r\n\tother { 0.5000 -0.0 1e10 }");
        roundtrip("a = \"quoted { brace } and \\\" quote\"\nb = c");
        roundtrip("no_trailing_newline { id = 1 }");
    }

    #[test]
    fn test_remove_own_line() {
        let input = "items {\n  item { id = 1 }\n  item { id = 2 }\n  item { id = 3 }\n}\n";
        assert_eq!(
            remove(input, &["2"]),
            "items {\n  item { id = 1 }\n  item { id = 3 }\n}\n"
        );
        assert_eq!(remove(input, &["3"]), "items {\n  item { id = 1 }\n  item { id = 2 }\n}\n");
        assert_eq!(remove(input, &["1", "2", "3"]), "items {\n}\n");
    }

    #[test]
    fn test_remove_inline() {
        let input = "items { item { id = A } item { id = B } }";
        assert_eq!(remove(input, &["A"]), "items { item { id = B } }");
        assert_eq!(remove(input, &["B"]), "items { item { id = A } }");
        assert_eq!(remove(input, &["A", "B"]), "items { }");
    }

    #[test]
    fn test_remove_before_adjacent_token() {
        let input = "a { x = 1 item{id=Z pile=PermanentlyDeletedItems}y = 2 }";
        let output = remove(input, &["Z"]);
        assert_eq!(output, "a { x = 1 y = 2 }");
        assert!(parse(output.as_bytes(), &Grammar::default()).is_ok());

        let input = "a { x = 1 item{id=Z}# note\n}";
        assert_eq!(remove(input, &["Z"]), "a { x = 1 # note\n}");

        let input = "a { x = 1 item{id=Z}}";
        assert_eq!(remove(input, &["Z"]), "a { x = 1}");

        let input = "a { b{id=Y}item{id=Z}c{id=W} }";
        assert_eq!(remove(input, &["Z"]), "a { b{id=Y}c{id=W} }");
    }

    #[test]
    fn test_remove_at_end_of_line() {
        let input = "items { count = 2  item { id = A }\n}";
        assert_eq!(remove(input, &["A"]), "items { count = 2\n}");
    }

    #[test]
    fn test_remove_multiline_block() {
        let input = "items {\n  item {\n    id = A\n    part { id = B pile = A }\n  }\n  item { id = C }\n}\n";
        assert_eq!(remove(input, &["A"]), "items {\n  item { id = C }\n}\n");
    }

    #[test]
    fn test_remove_crlf() {
        let input = "items {\r\n  item { id = 1 }\r\n  item { id = 2 }\r\n}\r\n";
        assert_eq!(remove(input, &["1"]), "items {\r\n  item { id = 2 }\r\n}\r\n");
    }

    #[test]
    fn test_remove_top_level_last_line_without_newline() {
        let input = "item { id = 1 }\nitem { id = 2 }";
        assert_eq!(remove(input, &["2"]), "item { id = 1 }\n");
    }

    #[test]
    fn test_comments_around_removed_block_survive() {
        let input = "items {\n  # the bottle\n  item { id = 2 } # trailing\n}\n";
        assert_eq!(remove(input, &["2"]), "items {\n  # the bottle\n  # trailing\n}\n");
    }

    #[test]
    fn test_removal_span_stays_in_container() {
        let src = b"a {x}";
        let span = removal_span(src, Span::new(3, 4), Span::new(3, 4));
        assert_eq!(span, Span::new(3, 4));
    }
}
