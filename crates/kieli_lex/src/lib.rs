//! # kieli-lex
//!
//! Produces a token stream from kieli source text.
//!
//! The lexer walks the document character by character, tracking
//! (line, column) positions so every token carries the exact source
//! [`Range`] it came from. It never aborts: unrecognized characters and
//! unterminated literals become [`TokenType::Error`] tokens with an
//! accompanying diagnostic, and lexing continues.

use kieli_base::{Position, Range, StringPool};
use kieli_compiler::db::{self, Database, DocumentId};
use kieli_compiler::lsp::{self, Diagnostic};

pub mod token;

pub use token::{Token, TokenType};

struct Lexer<'a> {
    rest: std::str::Chars<'a>,
    position: Position,
    pool: &'a mut StringPool,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
}

const OPERATOR_CHARACTERS: &str = "+-*/%<>=!?~^$#@|&\\";

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.rest.clone().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut clone = self.rest.clone();
        clone.next();
        clone.next()
    }

    fn advance(&mut self) -> Option<char> {
        let character = self.rest.next()?;
        self.position = self.position.advance(character);
        Some(character)
    }

    fn advance_while(&mut self, predicate: impl Fn(char) -> bool, lexeme: &mut String) {
        while let Some(character) = self.peek() {
            if !predicate(character) {
                break;
            }
            lexeme.push(character);
            self.advance();
        }
    }

    fn push(&mut self, kind: TokenType, start: Position) {
        self.tokens.push(Token {
            kind,
            range: Range::new(start, self.position),
        });
    }

    fn error(&mut self, range: Range, message: String) {
        self.diagnostics.push(lsp::error(range, message));
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(character) if character.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(character) = self.peek() {
                        if character == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_word(&mut self, start: Position) {
        let mut lexeme = String::new();
        self.advance_while(
            |character| character.is_alphanumeric() || character == '_',
            &mut lexeme,
        );
        if let Some(keyword) = TokenType::keyword(&lexeme) {
            return self.push(keyword, start);
        }
        let kind = match lexeme.chars().find(|character| *character != '_') {
            None => TokenType::Underscore,
            Some(first) if first.is_uppercase() => TokenType::UpperName(self.pool.intern(&lexeme)),
            Some(_) => TokenType::LowerName(self.pool.intern(&lexeme)),
        };
        self.push(kind, start);
    }

    fn lex_digits(&mut self) -> String {
        let mut digits = String::new();
        self.advance_while(|character| character.is_ascii_digit() || character == '_', &mut digits);
        digits.retain(|character| character != '_');
        digits
    }

    fn lex_number(&mut self, start: Position) {
        let integer_digits = self.lex_digits();

        let is_float = self.peek() == Some('.')
            && self.peek_second().is_some_and(|character| character.is_ascii_digit());

        let mut fraction_digits = String::new();
        if is_float {
            self.advance();
            fraction_digits = self.lex_digits();
        }

        let mut exponent = None;
        if self.peek() == Some('e') || self.peek() == Some('E') {
            self.advance();
            let mut negative = false;
            if self.peek() == Some('-') {
                negative = true;
                self.advance();
            } else if self.peek() == Some('+') {
                self.advance();
            }
            let digits = self.lex_digits();
            match digits.parse::<i32>() {
                Ok(value) => exponent = Some(if negative { -value } else { value }),
                Err(_) => {
                    let range = Range::new(start, self.position);
                    self.error(range, "Invalid numeric exponent".to_string());
                    return self.push(TokenType::Error, start);
                }
            }
        }

        let range = Range::new(start, self.position);

        if is_float {
            let text = format!(
                "{integer_digits}.{fraction_digits}e{}",
                exponent.unwrap_or(0)
            );
            match text.parse::<f64>() {
                Ok(value) => self.push(TokenType::Floating(value), start),
                Err(_) => {
                    self.error(range, "Invalid floating point literal".to_string());
                    self.push(TokenType::Error, start);
                }
            }
            return;
        }

        let value = integer_digits.parse::<u64>().ok().and_then(|mantissa| {
            match exponent {
                None => Some(mantissa),
                Some(exponent) if exponent >= 0 => {
                    let scale = 10u64.checked_pow(exponent as u32)?;
                    mantissa.checked_mul(scale)
                }
                Some(_) => None,
            }
        });
        match value {
            Some(value) => self.push(TokenType::Integer(value), start),
            None => {
                self.error(range, "Integer literal is too large".to_string());
                self.push(TokenType::Error, start);
            }
        }
    }

    fn lex_escape(&mut self, start: Position) -> Option<char> {
        match self.advance() {
            Some('n') => Some('\n'),
            Some('t') => Some('\t'),
            Some('r') => Some('\r'),
            Some('0') => Some('\0'),
            Some('\\') => Some('\\'),
            Some('\'') => Some('\''),
            Some('"') => Some('"'),
            _ => {
                let range = Range::new(start, self.position);
                self.error(range, "Unrecognized escape sequence".to_string());
                None
            }
        }
    }

    fn lex_character(&mut self, start: Position) {
        self.advance(); // The opening quote.
        let value = match self.advance() {
            Some('\\') => self.lex_escape(start),
            Some('\'') | Some('\n') | None => {
                let range = Range::new(start, self.position);
                self.error(range, "Missing character literal".to_string());
                return self.push(TokenType::Error, start);
            }
            Some(character) => Some(character),
        };
        if self.peek() == Some('\'') {
            self.advance();
        } else {
            let range = Range::new(start, self.position);
            self.error(range, "Unterminated character literal".to_string());
            return self.push(TokenType::Error, start);
        }
        match value {
            Some(value) => self.push(TokenType::Character(value), start),
            None => self.push(TokenType::Error, start),
        }
    }

    fn lex_string(&mut self, start: Position) {
        self.advance(); // The opening quote.
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => {
                    if let Some(escaped) = self.lex_escape(start) {
                        value.push(escaped);
                    }
                }
                Some(character) => value.push(character),
                None => {
                    let range = Range::new(start, self.position);
                    self.error(range, "Unterminated string literal".to_string());
                    return self.push(TokenType::Error, start);
                }
            }
        }
        let id = self.pool.intern(&value);
        self.push(TokenType::String(id), start);
    }

    fn lex_operator(&mut self, start: Position) {
        let mut lexeme = String::new();
        self.advance_while(|character| OPERATOR_CHARACTERS.contains(character), &mut lexeme);
        let kind = match lexeme.as_str() {
            "=" => TokenType::Equals,
            "|" => TokenType::Pipe,
            "&" => TokenType::Ampersand,
            "*" => TokenType::Asterisk,
            "?" => TokenType::Question,
            "->" => TokenType::Arrow,
            _ => TokenType::Operator(self.pool.intern(&lexeme)),
        };
        self.push(kind, start);
    }

    fn run(&mut self) {
        loop {
            self.skip_trivia();
            let start = self.position;
            let Some(character) = self.peek() else {
                self.push(TokenType::EndOfInput, start);
                return;
            };
            match character {
                _ if character.is_alphabetic() || character == '_' => self.lex_word(start),
                _ if character.is_ascii_digit() => self.lex_number(start),
                '\'' => self.lex_character(start),
                '"' => self.lex_string(start),
                '(' => self.lex_single(TokenType::ParenOpen, start),
                ')' => self.lex_single(TokenType::ParenClose, start),
                '[' => self.lex_single(TokenType::BracketOpen, start),
                ']' => self.lex_single(TokenType::BracketClose, start),
                '{' => self.lex_single(TokenType::BraceOpen, start),
                '}' => self.lex_single(TokenType::BraceClose, start),
                ',' => self.lex_single(TokenType::Comma, start),
                ';' => self.lex_single(TokenType::Semicolon, start),
                '.' => self.lex_single(TokenType::Dot, start),
                ':' => {
                    self.advance();
                    if self.peek() == Some(':') {
                        self.advance();
                        self.push(TokenType::DoubleColon, start);
                    } else {
                        self.push(TokenType::Colon, start);
                    }
                }
                _ if OPERATOR_CHARACTERS.contains(character) => self.lex_operator(start),
                _ => {
                    self.advance();
                    let range = Range::new(start, self.position);
                    self.error(range, format!("Unrecognized character: '{character}'"));
                    self.push(TokenType::Error, start);
                }
            }
        }
    }

    fn lex_single(&mut self, kind: TokenType, start: Position) {
        self.advance();
        self.push(kind, start);
    }
}

/// Lex `text`, interning names into `pool`.
///
/// Always produces a token stream terminated by
/// [`TokenType::EndOfInput`]; problems are returned as diagnostics
/// alongside it.
pub fn tokenize(text: &str, pool: &mut StringPool) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut lexer = Lexer {
        rest: text.chars(),
        position: Position::default(),
        pool,
        tokens: Vec::new(),
        diagnostics: Vec::new(),
    };
    lexer.run();
    (lexer.tokens, lexer.diagnostics)
}

/// Lex the document identified by `doc_id`, recording diagnostics on
/// it.
pub fn lex(db: &mut Database, doc_id: DocumentId) -> Vec<Token> {
    let text = db.documents[doc_id].text.clone();
    let (tokens, diagnostics) = tokenize(&text, &mut db.string_pool);
    for diagnostic in diagnostics {
        db::add_diagnostic(db, doc_id, diagnostic);
    }
    tokens
}

/// Render one token for the `lex` debug REPL.
pub fn display_token(pool: &StringPool, token: &Token) -> String {
    match token.kind {
        TokenType::LowerName(id) | TokenType::UpperName(id) | TokenType::Operator(id) => {
            pool.get(id).to_string()
        }
        TokenType::Integer(value) => value.to_string(),
        TokenType::Floating(value) => value.to_string(),
        TokenType::Boolean(value) => value.to_string(),
        TokenType::Character(value) => format!("{value:?}"),
        TokenType::String(id) => format!("{:?}", pool.get(id)),
        kind => kind.description().trim_matches('\'').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenType> {
        let mut pool = StringPool::new();
        let (tokens, diagnostics) = tokenize(text, &mut pool);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        tokens.into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn empty_input_is_end_of_input() {
        assert_eq!(kinds(""), vec![TokenType::EndOfInput]);
    }

    #[test]
    fn keywords_and_names() {
        let mut pool = StringPool::new();
        let (tokens, _) = tokenize("fn main Self _ __ _x", &mut pool);
        assert_eq!(tokens[0].kind, TokenType::Fn);
        assert!(matches!(tokens[1].kind, TokenType::LowerName(_)));
        assert_eq!(tokens[2].kind, TokenType::UpperSelf);
        assert_eq!(tokens[3].kind, TokenType::Underscore);
        assert_eq!(tokens[4].kind, TokenType::Underscore);
        assert!(matches!(tokens[5].kind, TokenType::LowerName(_)));
    }

    #[test]
    fn integer_with_exponent() {
        assert_eq!(kinds("5e3")[0], TokenType::Integer(5000));
    }

    #[test]
    fn floating_literals() {
        assert_eq!(kinds("5.0")[0], TokenType::Floating(5.0));
        assert_eq!(kinds("5.0e3")[0], TokenType::Floating(5000.0));
    }

    #[test]
    fn tuple_field_access_is_dot_then_integer() {
        assert_eq!(
            kinds("x.0")[1..3],
            [TokenType::Dot, TokenType::Integer(0)]
        );
    }

    #[test]
    fn character_escapes() {
        assert_eq!(kinds("'\\n'")[0], TokenType::Character('\n'));
        assert_eq!(kinds("'x'")[0], TokenType::Character('x'));
    }

    #[test]
    fn string_literal_contents_are_interned() {
        let mut pool = StringPool::new();
        let (tokens, _) = tokenize("\"hello,\\tworld!\\n\"", &mut pool);
        let TokenType::String(id) = tokens[0].kind else {
            panic!("expected a string token");
        };
        assert_eq!(pool.get(id), "hello,\tworld!\n");
    }

    #[test]
    fn unterminated_string_is_reported() {
        let mut pool = StringPool::new();
        let (tokens, diagnostics) = tokenize("\"oops", &mut pool);
        assert_eq!(tokens[0].kind, TokenType::Error);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("Unterminated"));
    }

    #[test]
    fn reserved_operators_are_distinguished() {
        assert_eq!(
            kinds("= -> | & * ?"),
            vec![
                TokenType::Equals,
                TokenType::Arrow,
                TokenType::Pipe,
                TokenType::Ampersand,
                TokenType::Asterisk,
                TokenType::Question,
                TokenType::EndOfInput,
            ]
        );
    }

    #[test]
    fn custom_operators_lex_as_one_token() {
        let mut pool = StringPool::new();
        let (tokens, _) = tokenize("a <$> b", &mut pool);
        let TokenType::Operator(id) = tokens[1].kind else {
            panic!("expected an operator token");
        };
        assert_eq!(pool.get(id), "<$>");
    }

    #[test]
    fn double_colon_and_colon() {
        assert_eq!(
            kinds("a::b: T")[1],
            TokenType::DoubleColon
        );
        assert_eq!(kinds("x: T")[1], TokenType::Colon);
    }

    #[test]
    fn line_comments_are_skipped() {
        let tokens = kinds("x // comment\ny");
        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[0], TokenType::LowerName(_)));
        assert!(matches!(tokens[1], TokenType::LowerName(_)));
        assert_eq!(tokens[2], TokenType::EndOfInput);
    }

    #[test]
    fn token_ranges_track_lines() {
        let mut pool = StringPool::new();
        let (tokens, _) = tokenize("a\n  b", &mut pool);
        assert_eq!(tokens[0].range.start, Position::new(0, 0));
        assert_eq!(tokens[1].range.start, Position::new(1, 2));
        assert_eq!(tokens[1].range.stop, Position::new(1, 3));
    }

    #[test]
    fn ranges_are_ordered_and_disjoint() {
        let mut pool = StringPool::new();
        let (tokens, _) = tokenize("fn f(x: I32): I32 = x", &mut pool);
        for pair in tokens.windows(2) {
            assert!(pair[0].range.stop <= pair[1].range.start);
        }
    }

    #[test]
    fn unrecognized_character_is_reported() {
        let mut pool = StringPool::new();
        let (tokens, diagnostics) = tokenize("§", &mut pool);
        assert_eq!(tokens[0].kind, TokenType::Error);
        assert_eq!(diagnostics.len(), 1);
    }
}
