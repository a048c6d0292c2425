//! Tokenizer for the block/field text format.
//!
//! The scanner never copies: every token is a [`Span`] into the input, and
//! whitespace and comments between tokens are skipped but left in the source
//! for the serializer to reproduce.

use crate::error::ParseError;
use crate::model::Span;

/// Kind of a scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `{`
    Open,
    /// `}`
    Close,
    /// `=`
    Equals,
    /// A bare run of non-delimiter bytes.
    Word,
    /// A double-quoted string, quotes included.
    Quoted,
    /// End of input.
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Returns true for tokens that can serve as a key or a value.
    pub fn is_atom(&self) -> bool {
        matches!(self.kind, TokenKind::Word | TokenKind::Quoted)
    }
}

/// Scanner over a byte slice.
///
/// Cheap to clone, which is how one-token lookahead is done.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
    comment_prefixes: &'a [String],
    /// Last token was `=`: a comment prefix on the same line starts the value.
    after_equals: bool,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner recognising the given comment prefixes.
    pub fn new(data: &'a [u8], comment_prefixes: &'a [String]) -> Self {
        Self {
            data,
            pos: 0,
            comment_prefixes,
            after_equals: false,
        }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the next token without consuming it.
    pub fn peek_token(&self) -> Result<Token, ParseError> {
        self.clone().next_token()
    }

    /// Skips trivia and returns the next token.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia();

        let start = self.pos;
        let Some(&byte) = self.data.get(start) else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
            });
        };

        let kind = match byte {
            b'{' => {
                self.pos += 1;
                TokenKind::Open
            }
            b'}' => {
                self.pos += 1;
                TokenKind::Close
            }
            b'=' => {
                self.pos += 1;
                TokenKind::Equals
            }
            b'"' => {
                self.read_quoted()?;
                TokenKind::Quoted
            }
            _ => {
                while self.pos < self.data.len() && !is_delimiter(self.data[self.pos]) {
                    self.pos += 1;
                }
                TokenKind::Word
            }
        };

        self.after_equals = kind == TokenKind::Equals;
        Ok(Token {
            kind,
            span: Span::new(start, self.pos),
        })
    }

    fn read_quoted(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.data.len() {
            match self.data[self.pos] {
                b'\\' => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(ParseError::UnterminatedString { offset: start })
    }

    fn skip_trivia(&mut self) {
        let mut value_expected = self.after_equals;
        loop {
            while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
                if self.data[self.pos] == b'\n' {
                    value_expected = false;
                }
                self.pos += 1;
            }
            if value_expected || !self.at_comment() {
                return;
            }
            while self.pos < self.data.len() && self.data[self.pos] != b'\n' {
                self.pos += 1;
            }
        }
    }

    fn at_comment(&self) -> bool {
        let rest = &self.data[self.pos..];
        self.comment_prefixes
            .iter()
            .any(|p| !p.is_empty() && rest.starts_with(p.as_bytes()))
    }
}

#[inline]
fn is_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b'{' | b'}' | b'=' | b'"')
}
