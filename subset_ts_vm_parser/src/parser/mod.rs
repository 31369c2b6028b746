//! Recursive-descent parser for the checked subset of the surface language.
//!
//! This is deliberately small: §1 of the spec this crate serves treats
//! lexing/parsing as an external collaborator, so only the constructs that
//! exercise the compiler/VM (type aliases, interface-shaped object types,
//! conditional types, tuples, template literals, generic functions, and
//! `const`/call statements) are supported.

mod decls;
mod types;

use crate::ast::SourceFile;
use crate::error::{ParseError, ParseErrors};
use crate::lexer::{Lexer, SpannedToken};
use crate::span::Span;
use crate::token::Token;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    errors: ParseErrors,
    eof_span: Span,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            errors: Vec::new(),
            eof_span: Span::new(source.len(), source.len()),
        }
    }

    fn peek(&mut self) -> Option<Token> {
        match self.lexer.peek() {
            Some(Ok(t)) => Some(t.token.clone()),
            _ => None,
        }
    }

    fn peek_span(&mut self) -> Span {
        match self.lexer.peek() {
            Some(Ok(t)) => t.span,
            Some(Err(e)) => e.span(),
            None => self.eof_span,
        }
    }

    fn bump(&mut self) -> Option<SpannedToken> {
        match self.lexer.next() {
            Some(Ok(t)) => Some(t),
            Some(Err(e)) => {
                self.errors.push(e);
                None
            }
            None => None,
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Span {
        match self.bump() {
            Some(t) if std::mem::discriminant(&t.token) == std::mem::discriminant(expected) => {
                t.span
            }
            Some(t) => {
                let span = t.span;
                self.errors.push(ParseError::UnexpectedToken {
                    found: format!("{:?}", t.token),
                    expected: what.to_string(),
                    span,
                });
                span
            }
            None => {
                self.errors.push(ParseError::UnexpectedEof {
                    expected: what.to_string(),
                    span: self.eof_span,
                });
                self.eof_span
            }
        }
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek().as_ref().map(|t| std::mem::discriminant(t)) == Some(std::mem::discriminant(tok)) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Snapshot lexer + error-count so a speculative parse (e.g.
    /// disambiguating a function type from a parenthesized type) can be
    /// rolled back without double-reporting errors.
    fn checkpoint(&self) -> (Lexer<'a>, usize) {
        (self.lexer.clone(), self.errors.len())
    }

    fn restore(&mut self, checkpoint: (Lexer<'a>, usize)) {
        self.lexer = checkpoint.0;
        self.errors.truncate(checkpoint.1);
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(ParseError::InvalidSyntax {
            message: message.into(),
            span,
        });
    }

    pub fn parse_source_file(&mut self) -> SourceFile {
        let start = self.peek_span();
        let mut statements = Vec::new();
        while self.peek().is_some() {
            if let Some(stmt) = self.parse_stmt() {
                statements.push(stmt);
            } else {
                // skip a token to avoid looping forever on unexpected input
                if self.bump().is_none() {
                    break;
                }
            }
        }
        let end = self.eof_span;
        SourceFile {
            statements,
            span: start.merge(&end),
        }
    }

    pub fn into_errors(self) -> ParseErrors {
        self.errors
    }

    pub fn errors(&self) -> &ParseErrors {
        &self.errors
    }
}

/// Parse `source` into a [`SourceFile`], returning any parse errors
/// encountered alongside the best-effort tree (statements that failed to
/// parse are simply omitted, mirroring the compiler's own "continue past
/// structural errors" policy).
pub fn parse(source: &str) -> (SourceFile, ParseErrors) {
    let mut parser = Parser::new(source);
    let file = parser.parse_source_file();
    (file, parser.into_errors())
}
