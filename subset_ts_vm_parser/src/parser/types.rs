//! Type-expression parsing: precedence climbing over union/intersection,
//! postfix array/index-access, conditional types, tuples, object literal
//! types, and template literal types.

use super::Parser;
use crate::ast::{ObjectMember, Param, TemplateLiteralPart, TupleElement, TypeExpr, TypeParam};
use crate::span::Span;
use crate::token::Token;

impl<'a> Parser<'a> {
    pub(crate) fn parse_type_params(&mut self) -> Vec<TypeParam> {
        let mut params = Vec::new();
        if !self.eat(&Token::Lt) {
            return params;
        }
        loop {
            if matches!(self.peek(), Some(Token::Gt) | None) {
                break;
            }
            let start = self.peek_span();
            let name = self.parse_ident_name();
            let constraint = if self.eat(&Token::KwExtends) {
                Some(self.parse_union())
            } else {
                None
            };
            let default = if self.eat(&Token::Eq) {
                Some(self.parse_type())
            } else {
                None
            };
            let end = self.peek_span();
            params.push(TypeParam {
                name,
                constraint,
                default,
                span: start.merge(&end),
            });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::Gt, "'>'");
        params
    }

    pub(crate) fn parse_ident_name(&mut self) -> String {
        match self.bump() {
            Some(t) => match t.token {
                Token::Ident(s) => s,
                other => {
                    self.error(format!("expected identifier, found {:?}", other), t.span);
                    String::new()
                }
            },
            None => {
                self.error("expected identifier", self.eof_span);
                String::new()
            }
        }
    }

    pub(crate) fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        self.expect(&Token::LParen, "'('");
        loop {
            if matches!(self.peek(), Some(Token::RParen) | None) {
                break;
            }
            let start = self.peek_span();
            let name = self.parse_ident_name();
            let optional = self.eat(&Token::Question);
            let type_ann = if self.eat(&Token::Colon) {
                Some(self.parse_type())
            } else {
                None
            };
            let end = self.peek_span();
            params.push(Param {
                name,
                type_ann,
                optional,
                span: start.merge(&end),
            });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen, "')'");
        params
    }

    /// Entry point: conditional types sit above union/intersection.
    pub fn parse_type(&mut self) -> TypeExpr {
        let start = self.peek_span();
        let check = self.parse_union();
        if self.eat(&Token::KwExtends) {
            let extends = self.parse_union();
            self.expect(&Token::Question, "'?'");
            let then_branch = self.parse_type();
            self.expect(&Token::Colon, "':'");
            let else_branch = self.parse_type();
            let span = start.merge(&else_branch.span());
            return TypeExpr::Conditional {
                check: Box::new(check),
                extends: Box::new(extends),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
                span,
            };
        }
        check
    }

    fn parse_union(&mut self) -> TypeExpr {
        let start = self.peek_span();
        let mut members = vec![self.parse_intersection()];
        while self.eat(&Token::Pipe) {
            members.push(self.parse_intersection());
        }
        if members.len() == 1 {
            members.pop().unwrap()
        } else {
            let end = members.last().unwrap().span();
            TypeExpr::Union(members, start.merge(&end))
        }
    }

    fn parse_intersection(&mut self) -> TypeExpr {
        let start = self.peek_span();
        let mut members = vec![self.parse_postfix_type()];
        while self.eat(&Token::Amp) {
            members.push(self.parse_postfix_type());
        }
        if members.len() == 1 {
            members.pop().unwrap()
        } else {
            let end = members.last().unwrap().span();
            TypeExpr::Intersection(members, start.merge(&end))
        }
    }

    fn parse_postfix_type(&mut self) -> TypeExpr {
        let mut expr = self.parse_primary_type();
        loop {
            match self.peek() {
                Some(Token::LBracket) => {
                    let start = expr.span();
                    self.bump();
                    if self.eat(&Token::RBracket) {
                        expr = TypeExpr::Array(Box::new(expr), start.merge(&self.peek_span()));
                    } else {
                        let index = self.parse_type();
                        let end = self.peek_span();
                        self.expect(&Token::RBracket, "']'");
                        expr = TypeExpr::IndexAccess {
                            object: Box::new(expr),
                            index: Box::new(index),
                            span: start.merge(&end),
                        };
                    }
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary_type(&mut self) -> TypeExpr {
        let span = self.peek_span();
        match self.peek() {
            Some(Token::KwNever) => {
                self.bump();
                TypeExpr::Never(span)
            }
            Some(Token::KwAny) => {
                self.bump();
                TypeExpr::Any(span)
            }
            Some(Token::KwUnknown) => {
                self.bump();
                TypeExpr::Unknown(span)
            }
            Some(Token::KwVoid) => {
                self.bump();
                TypeExpr::Void(span)
            }
            Some(Token::KwObject) => {
                self.bump();
                TypeExpr::Object(span)
            }
            Some(Token::KwString) => {
                self.bump();
                TypeExpr::StringKw(span)
            }
            Some(Token::KwNumber) => {
                self.bump();
                TypeExpr::NumberKw(span)
            }
            Some(Token::KwBoolean) => {
                self.bump();
                TypeExpr::BooleanKw(span)
            }
            Some(Token::KwBigint) => {
                self.bump();
                TypeExpr::BigIntKw(span)
            }
            Some(Token::KwSymbol) => {
                self.bump();
                TypeExpr::SymbolKw(span)
            }
            Some(Token::KwNull) => {
                self.bump();
                TypeExpr::Null(span)
            }
            Some(Token::KwUndefined) => {
                self.bump();
                TypeExpr::Undefined(span)
            }
            Some(Token::KwTrue) => {
                self.bump();
                TypeExpr::True(span)
            }
            Some(Token::KwFalse) => {
                self.bump();
                TypeExpr::False(span)
            }
            Some(Token::KwReadonly) => {
                // readonly array/tuple modifier: parse through to the operand type.
                self.bump();
                self.parse_postfix_type()
            }
            Some(Token::KwInfer) => {
                self.bump();
                let name = self.parse_ident_name();
                TypeExpr::Infer {
                    name,
                    span: span.merge(&self.peek_span()),
                }
            }
            Some(Token::KwKeyof) => {
                self.bump();
                let operand = self.parse_postfix_type();
                let end = operand.span();
                TypeExpr::Keyof {
                    operand: Box::new(operand),
                    span: span.merge(&end),
                }
            }
            Some(Token::StringLiteral(text)) => {
                self.bump();
                TypeExpr::StringLiteral(text, span)
            }
            Some(Token::NumberLiteral(text)) => {
                self.bump();
                TypeExpr::NumberLiteral(text, span)
            }
            Some(Token::BigIntLiteral(text)) => {
                self.bump();
                TypeExpr::BigIntLiteral(text, span)
            }
            Some(Token::TemplateLiteral(raw)) => {
                self.bump();
                let parts = parse_template_literal_body(&raw);
                TypeExpr::TemplateLiteral(parts, span)
            }
            Some(Token::LBracket) => self.parse_tuple_type(),
            Some(Token::LBrace) => self.parse_object_type(),
            Some(Token::LParen) => self.parse_paren_or_function_type(),
            Some(Token::Ident(name)) => {
                self.bump();
                let args = if self.eat(&Token::Lt) {
                    let mut args = Vec::new();
                    loop {
                        if matches!(self.peek(), Some(Token::Gt) | None) {
                            break;
                        }
                        args.push(self.parse_type());
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                    self.expect(&Token::Gt, "'>'");
                    args
                } else {
                    Vec::new()
                };
                let end = self.peek_span();
                TypeExpr::TypeRef {
                    name,
                    args,
                    span: span.merge(&end),
                }
            }
            other => {
                self.error(format!("expected a type, found {:?}", other), span);
                self.bump();
                TypeExpr::Never(span)
            }
        }
    }

    fn parse_paren_or_function_type(&mut self) -> TypeExpr {
        let start = self.peek_span();
        let checkpoint = self.checkpoint();
        let params = self.parse_params();
        if self.errors.len() == checkpoint.1 && self.eat(&Token::FatArrow) {
            let return_type = self.parse_type();
            let end = return_type.span();
            return TypeExpr::FunctionType {
                params,
                return_type: Box::new(return_type),
                span: start.merge(&end),
            };
        }
        // Not a function type: backtrack and parse a parenthesized type.
        self.restore(checkpoint);
        self.expect(&Token::LParen, "'('");
        let inner = self.parse_type();
        self.expect(&Token::RParen, "')'");
        inner
    }

    fn parse_tuple_type(&mut self) -> TypeExpr {
        let start = self.peek_span();
        self.bump(); // [
        let mut elements = Vec::new();
        loop {
            if matches!(self.peek(), Some(Token::RBracket) | None) {
                break;
            }
            let el_start = self.peek_span();
            let rest = self.eat(&Token::Ellipsis);

            // Optional `name?:` / `name:` label lookahead.
            let name = {
                let checkpoint = self.checkpoint();
                if let Some(Token::Ident(n)) = self.peek() {
                    self.bump();
                    let optional_marker = self.eat(&Token::Question);
                    if self.eat(&Token::Colon) {
                        Some((n, optional_marker))
                    } else {
                        self.restore(checkpoint);
                        None
                    }
                } else {
                    None
                }
            };
            let (label, labeled_optional) = match name {
                Some((n, opt)) => (Some(n), opt),
                None => (None, false),
            };

            let type_expr = self.parse_type();
            let optional = labeled_optional || self.eat(&Token::Question);
            let end = self.peek_span();
            elements.push(TupleElement {
                type_expr,
                optional,
                rest,
                name: label,
                span: el_start.merge(&end),
            });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        let end = self.peek_span();
        self.expect(&Token::RBracket, "']'");
        TypeExpr::Tuple(elements, start.merge(&end))
    }

    fn parse_object_type(&mut self) -> TypeExpr {
        let start = self.peek_span();
        self.bump(); // {
        let mut members = Vec::new();
        loop {
            if matches!(self.peek(), Some(Token::RBrace) | None) {
                break;
            }
            members.push(self.parse_object_member());
            // members may be separated by `,` or `;`, or nothing at all
            let _ = self.eat(&Token::Comma) || self.eat(&Token::Semicolon);
        }
        let end = self.peek_span();
        self.expect(&Token::RBrace, "'}'");
        TypeExpr::ObjectLiteral(members, start.merge(&end))
    }

    fn parse_object_member(&mut self) -> ObjectMember {
        let start = self.peek_span();
        let readonly = self.eat(&Token::KwReadonly);

        if matches!(self.peek(), Some(Token::LBracket)) {
            self.bump();
            let key_name = self.parse_ident_name();
            self.expect(&Token::Colon, "':'");
            let key_type = self.parse_type();
            self.expect(&Token::RBracket, "']'");
            self.expect(&Token::Colon, "':'");
            let value_type = self.parse_type();
            let end = self.peek_span();
            return ObjectMember::IndexSignature {
                key_name,
                key_type: Box::new(key_type),
                value_type: Box::new(value_type),
                span: start.merge(&end),
            };
        }

        let name = self.parse_ident_name();
        let optional = self.eat(&Token::Question);

        if matches!(self.peek(), Some(Token::LParen)) {
            let params = self.parse_params();
            self.expect(&Token::Colon, "':'");
            let return_type = self.parse_type();
            let end = self.peek_span();
            return ObjectMember::Method {
                name,
                optional,
                params,
                return_type: Box::new(return_type),
                span: start.merge(&end),
            };
        }

        self.expect(&Token::Colon, "':'");
        let type_expr = self.parse_type();
        let end = self.peek_span();
        ObjectMember::Property {
            name,
            optional,
            readonly,
            type_expr,
            span: start.merge(&end),
        }
    }
}

/// Split the raw text between a template literal's backticks into literal
/// runs and `${ ... }` placeholders, parsing each placeholder as its own
/// standalone type expression.
fn parse_template_literal_body(raw: &str) -> Vec<TemplateLiteralPart> {
    let mut parts = Vec::new();
    let bytes = raw.as_bytes();
    let mut literal = String::new();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            if !literal.is_empty() {
                parts.push(TemplateLiteralPart::Literal(std::mem::take(&mut literal)));
            }
            let mut depth = 1i32;
            let mut j = i + 2;
            let inner_start = j;
            while j < bytes.len() && depth > 0 {
                match bytes[j] {
                    b'{' => depth += 1,
                    b'}' => depth -= 1,
                    _ => {}
                }
                if depth > 0 {
                    j += 1;
                }
            }
            let inner = &raw[inner_start..j.min(raw.len())];
            let mut sub = Parser::new(inner);
            let expr = sub.parse_type();
            parts.push(TemplateLiteralPart::Placeholder(expr));
            i = j + 1;
        } else {
            // advance by one UTF-8 scalar
            let ch_len = utf8_char_len(bytes[i]);
            literal.push_str(&raw[i..(i + ch_len).min(raw.len())]);
            i += ch_len;
        }
    }
    if !literal.is_empty() {
        parts.push(TemplateLiteralPart::Literal(literal));
    }
    parts
}

fn utf8_char_len(first_byte: u8) -> usize {
    if first_byte & 0x80 == 0 {
        1
    } else if first_byte & 0xE0 == 0xC0 {
        2
    } else if first_byte & 0xF0 == 0xE0 {
        3
    } else {
        4
    }
}
