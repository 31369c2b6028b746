//! Token kinds for the surface language lexer.

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum Token {
    // keywords
    #[token("type")]
    KwType,
    #[token("const")]
    KwConst,
    #[token("function")]
    KwFunction,
    #[token("extends")]
    KwExtends,
    #[token("infer")]
    KwInfer,
    #[token("keyof")]
    KwKeyof,
    #[token("readonly")]
    KwReadonly,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,
    #[token("never")]
    KwNever,
    #[token("any")]
    KwAny,
    #[token("unknown")]
    KwUnknown,
    #[token("void")]
    KwVoid,
    #[token("object")]
    KwObject,
    #[token("string")]
    KwString,
    #[token("number")]
    KwNumber,
    #[token("boolean")]
    KwBoolean,
    #[token("bigint")]
    KwBigint,
    #[token("symbol")]
    KwSymbol,
    #[token("null")]
    KwNull,
    #[token("undefined")]
    KwUndefined,

    // literals
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+n", |lex| { let s = lex.slice(); s[..s.len()-1].to_string() })]
    BigIntLiteral(String),

    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().to_string())]
    NumberLiteral(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| { let s = lex.slice(); s[1..s.len()-1].to_string() })]
    #[regex(r"'([^'\\]|\\.)*'", |lex| { let s = lex.slice(); s[1..s.len()-1].to_string() })]
    StringLiteral(String),

    /// Raw text between the backticks of a template literal, unparsed.
    /// Balances `${` / `}` nesting so a placeholder may itself contain braces.
    #[token("`", lex_template_literal)]
    TemplateLiteral(String),

    // punctuation
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token("|")]
    Pipe,
    #[token("&")]
    Amp,
    #[token("=>")]
    FatArrow,
    #[token("=")]
    Eq,
    #[token("...")]
    Ellipsis,
    #[token(".")]
    Dot,
}

/// Callback invoked by logos once the opening backtick is seen; scans to the
/// matching closing backtick, tracking `${ ... }` nesting depth so a nested
/// `}` inside a placeholder type expression does not end the literal early.
fn lex_template_literal(lex: &mut logos::Lexer<Token>) -> Option<String> {
    let remainder = lex.remainder();
    let bytes = remainder.as_bytes();
    let mut i = 0usize;
    let mut depth = 0i32;
    while i < bytes.len() {
        match bytes[i] {
            b'`' if depth == 0 => {
                let text = remainder[..i].to_string();
                lex.bump(i + 1);
                return Some(text);
            }
            b'$' if depth == 0 && i + 1 < bytes.len() && bytes[i + 1] == b'{' => {
                depth += 1;
                i += 2;
                continue;
            }
            b'{' if depth > 0 => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}
