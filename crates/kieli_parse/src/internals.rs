//! Parser state and shared helpers.
//!
//! The parser is a plain recursive descent over the token stream. A
//! failed expectation is a value, not an exception: `parse_*` functions
//! return `Ok(None)` when the construct simply is not there, and
//! `Err(ParseFailure)` when it started but went wrong — in which case a
//! diagnostic has already been recorded and the definition parser
//! recovers by skipping ahead to the next definition keyword.

use kieli_base::{Position, Range, StringId};
use kieli_compiler::db::{self, Database, DocumentId};
use kieli_compiler::lsp::SemanticTokenType;
use kieli_compiler::{cst, Name};
use kieli_lex::{Token, TokenType};

/// A parse expectation failed; the diagnostic is already recorded.
#[derive(Clone, Copy, Debug)]
pub struct ParseFailure;

pub type Parse<T> = Result<T, ParseFailure>;

pub struct Context<'a> {
    pub db: &'a mut Database,
    pub doc_id: DocumentId,
    pub arena: cst::Arena,
    tokens: &'a [Token],
    index: usize,
}

impl<'a> Context<'a> {
    pub fn new(db: &'a mut Database, doc_id: DocumentId, tokens: &'a [Token]) -> Self {
        Context {
            db,
            doc_id,
            arena: cst::Arena::default(),
            tokens,
            index: 0,
        }
    }

    pub fn peek(&self) -> Token {
        self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    pub fn peek_second(&self) -> Token {
        self.tokens[(self.index + 1).min(self.tokens.len() - 1)]
    }

    pub fn at_end(&self) -> bool {
        matches!(self.peek().kind, TokenType::EndOfInput)
    }

    pub fn extract(&mut self) -> Token {
        let token = self.peek();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    /// Extracts the next token if `predicate` accepts its kind.
    pub fn try_extract(&mut self, predicate: impl Fn(TokenType) -> bool) -> Option<Token> {
        if predicate(self.peek().kind) {
            Some(self.extract())
        } else {
            None
        }
    }

    /// Extracts the next token if it is exactly `kind` (payload-free
    /// kinds only).
    pub fn try_punct(&mut self, kind: TokenType) -> Option<Token> {
        self.try_extract(|found| found == kind)
    }

    /// Extracts `kind` or records an expectation failure.
    pub fn require_punct(&mut self, kind: TokenType) -> Parse<Token> {
        match self.try_punct(kind) {
            Some(token) => Ok(token),
            None => Err(self.error_expected(kind.description())),
        }
    }

    pub fn try_lower_name(&mut self) -> Option<Name> {
        let token = self.peek();
        match token.kind {
            TokenType::LowerName(id) => {
                self.extract();
                Some(Name { id, range: token.range })
            }
            _ => None,
        }
    }

    pub fn try_upper_name(&mut self) -> Option<Name> {
        let token = self.peek();
        match token.kind {
            TokenType::UpperName(id) => {
                self.extract();
                Some(Name { id, range: token.range })
            }
            _ => None,
        }
    }

    pub fn require_lower_name(&mut self, description: &str) -> Parse<Name> {
        self.try_lower_name()
            .ok_or_else(|| self.error_expected(description))
    }

    pub fn require_upper_name(&mut self, description: &str) -> Parse<Name> {
        self.try_upper_name()
            .ok_or_else(|| self.error_expected(description))
    }

    /// Records an "expected X, but found Y" error at the current token.
    pub fn error_expected(&mut self, description: &str) -> ParseFailure {
        let token = self.peek();
        let message = format!(
            "Expected {}, but found {}",
            description,
            token.kind.description()
        );
        db::add_error(self.db, self.doc_id, token.range, message);
        ParseFailure
    }

    /// The current token index, for speculative parsing.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Rewinds to a previously saved token index.
    pub fn restore(&mut self, index: usize) {
        self.index = index;
    }

    /// Skips tokens until the next definition keyword or the end of
    /// input, so one malformed definition does not poison the module.
    pub fn recover_to_next_definition(&mut self) {
        while !self.at_end() && !self.peek().kind.starts_definition() {
            self.extract();
        }
    }

    /// The range from `start` up to the previously extracted token.
    pub fn up_to_current(&self, start: Range) -> Range {
        let previous = self.tokens[self.index.saturating_sub(1).min(self.tokens.len() - 1)];
        if previous.range.stop < start.start {
            start
        } else {
            Range::new(start.start, previous.range.stop)
        }
    }

    pub fn current_position(&self) -> Position {
        self.peek().range.start
    }

    pub fn add_semantic_token(&mut self, range: Range, kind: SemanticTokenType) {
        db::add_semantic_token(self.db, self.doc_id, range, kind);
    }

    pub fn add_keyword(&mut self, token: Token) {
        self.add_semantic_token(token.range, SemanticTokenType::Keyword);
    }

    pub fn add_operator(&mut self, token: Token) {
        self.add_semantic_token(token.range, SemanticTokenType::Operator);
    }

    pub fn string(&self, id: StringId) -> &str {
        self.db.string_pool.get(id)
    }
}

/// Parses `open` `element (, element)*` `close`, allowing the empty
/// list.
pub fn parse_comma_separated<T>(
    ctx: &mut Context<'_>,
    close: TokenType,
    description: &str,
    mut parse_element: impl FnMut(&mut Context<'_>) -> Parse<Option<T>>,
) -> Parse<Vec<T>> {
    let mut elements = Vec::new();
    if ctx.peek().kind == close {
        ctx.extract();
        return Ok(elements);
    }
    loop {
        match parse_element(ctx)? {
            Some(element) => elements.push(element),
            None => return Err(ctx.error_expected(description)),
        }
        if ctx.try_punct(TokenType::Comma).is_none() {
            ctx.require_punct(close)?;
            return Ok(elements);
        }
    }
}
