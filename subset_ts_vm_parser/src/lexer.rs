//! Lexer wrapping the logos-generated [`Token`] stream with span tracking
//! and one-token lookahead.

use logos::Logos;

use crate::error::ParseError;
use crate::span::Span;
use crate::token::Token;

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

#[derive(Clone)]
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, Token>,
    peeked: Option<Option<Result<SpannedToken, ParseError>>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: Token::lexer(source),
            peeked: None,
        }
    }

    fn lex_next(&mut self) -> Option<Result<SpannedToken, ParseError>> {
        let result = self.inner.next()?;
        let span = Span::new(self.inner.span().start, self.inner.span().end);
        match result {
            Ok(token) => Some(Ok(SpannedToken { token, span })),
            Err(_) => Some(Err(ParseError::LexerError { span })),
        }
    }

    pub fn peek(&mut self) -> Option<&Result<SpannedToken, ParseError>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lex_next());
        }
        self.peeked.as_ref().unwrap().as_ref()
    }

    pub fn next(&mut self) -> Option<Result<SpannedToken, ParseError>> {
        if let Some(peeked) = self.peeked.take() {
            return peeked;
        }
        self.lex_next()
    }
}

/// Tokenize the whole source, stopping at the first lexer error.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken, ParseError>> {
    let mut lexer = Lexer::new(source);
    let mut out = Vec::new();
    while let Some(tok) = lexer.next() {
        let is_err = tok.is_err();
        out.push(tok);
        if is_err {
            break;
        }
    }
    out
}
