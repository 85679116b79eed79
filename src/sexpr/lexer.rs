use logos::{Logos, SpannedIter};

pub(super) struct Token {
    pub(super) kind: TokenKind,
    pub(super) span: logos::Span,
}

pub(super) struct TokenIter<'a> {
    iter: SpannedIter<'a, LogosTokenKind>,
}

impl<'a> TokenIter<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            iter: LogosTokenKind::lexer(input).spanned(),
        }
    }
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let (kind, span) = self.iter.next()?;
        let (kind, span) = match kind {
            Ok(LogosTokenKind::LParen) => (TokenKind::LParen, span),
            Ok(LogosTokenKind::RParen) => (TokenKind::RParen, span),
            // Strip the quotes, escapes are left to the reader
            Ok(LogosTokenKind::QuotedString) => (TokenKind::Atom, (span.start + 1)..(span.end - 1)),
            Ok(LogosTokenKind::Bare) => (TokenKind::Atom, span),
            Err(()) => (TokenKind::Error, span),
        };
        Some(Token { kind, span })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum TokenKind {
    LParen,
    RParen,
    Atom,
    Error,
}

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f\n]+")]
#[logos(skip r";[^\n]*")]
enum LogosTokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r#""([^"\\]|\\["\\bnfrt]|\\u[a-fA-F0-9]{4})*""#)]
    QuotedString,
    #[regex(r#"[^"() \t\r\f\n;]+"#)]
    Bare,
}
