//! Type-expression resolution.
//!
//! Turns written signatures such as `?Logger`, `int|string`, `list<Entry>` or
//! `Countable&Traversable` into [`TypeId`]s, registering the compound types it
//! builds. Built-in names are case-insensitive; contract names are looked up
//! exactly as registered.
//!
//! Grammar:
//!
//! ```text
//! union  := inter ('|' inter)*
//! inter  := prefix ('&' prefix)*
//! prefix := '?' prefix | atom
//! atom   := '(' union ')' | NAME ('<' union '>')?
//! ```

use crate::error::CoreError;
use crate::type_id::{TypeId, TypeRegistry};
use crate::types::{DeclaredType, TypeMembers};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Question,
    Pipe,
    Amp,
    LParen,
    RParen,
    Lt,
    Gt,
}

/// Resolves a type expression against `registry`, registering any compound
/// types it needs.
pub fn resolve_type_expr(registry: &mut TypeRegistry, expr: &str) -> Result<TypeId, CoreError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        expr,
        tokens,
        pos: 0,
        registry,
    };
    let id = parser.union()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.invalid("unexpected trailing input"));
    }
    Ok(id)
}

fn tokenize(expr: &str) -> Result<Vec<Token>, CoreError> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '?' | '|' | '&' | '(' | ')' | '<' | '>' => {
                chars.next();
                tokens.push(match c {
                    '?' => Token::Question,
                    '|' => Token::Pipe,
                    '&' => Token::Amp,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '<' => Token::Lt,
                    _ => Token::Gt,
                });
            }
            c if c.is_alphanumeric() || c == '_' || c == '\\' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '\\' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(expr[start..end].to_string()));
            }
            other => {
                return Err(CoreError::InvalidTypeExpression {
                    expr: expr.to_string(),
                    reason: format!("unexpected character '{other}'"),
                })
            }
        }
    }

    if tokens.is_empty() {
        return Err(CoreError::InvalidTypeExpression {
            expr: expr.to_string(),
            reason: "empty type expression".into(),
        });
    }
    Ok(tokens)
}

struct Parser<'a> {
    expr: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    registry: &'a mut TypeRegistry,
}

impl Parser<'_> {
    fn invalid(&self, reason: &str) -> CoreError {
        CoreError::InvalidTypeExpression {
            expr: self.expr.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn union(&mut self) -> Result<TypeId, CoreError> {
        let mut members = TypeMembers::new();
        members.push(self.intersection()?);
        while self.eat(&Token::Pipe) {
            members.push(self.intersection()?);
        }
        if members.len() == 1 {
            return Ok(members[0]);
        }
        self.reject_standalone_only(&members)?;
        Ok(self.registry.register(DeclaredType::Union { members }))
    }

    fn intersection(&mut self) -> Result<TypeId, CoreError> {
        let mut members = TypeMembers::new();
        members.push(self.prefix()?);
        while self.eat(&Token::Amp) {
            members.push(self.prefix()?);
        }
        if members.len() == 1 {
            return Ok(members[0]);
        }
        self.reject_standalone_only(&members)?;
        Ok(self.registry.register(DeclaredType::Intersection { members }))
    }

    fn prefix(&mut self) -> Result<TypeId, CoreError> {
        if self.eat(&Token::Question) {
            let inner = self.prefix()?;
            self.reject_standalone_only(&[inner])?;
            return Ok(self.registry.register(DeclaredType::Nullable { inner }));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<TypeId, CoreError> {
        match self.peek().cloned() {
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.union()?;
                if !self.eat(&Token::RParen) {
                    return Err(self.invalid("missing ')'"));
                }
                Ok(inner)
            }
            Some(Token::Name(name)) => {
                self.pos += 1;
                if self.eat(&Token::Lt) {
                    let element = self.union()?;
                    if !self.eat(&Token::Gt) {
                        return Err(self.invalid("missing '>'"));
                    }
                    return match name.to_ascii_lowercase().as_str() {
                        "list" | "array" | "iterable" => {
                            Ok(self.registry.register(DeclaredType::Sequence { element }))
                        }
                        _ => Err(self.invalid(&format!("'{name}' takes no type argument"))),
                    };
                }
                self.named(&name)
            }
            Some(_) => Err(self.invalid("expected a type name")),
            None => Err(self.invalid("unexpected end of expression")),
        }
    }

    fn named(&mut self, name: &str) -> Result<TypeId, CoreError> {
        let builtin = match name.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Some(TypeId::BOOL),
            "int" | "integer" => Some(TypeId::INT),
            "float" | "double" => Some(TypeId::FLOAT),
            "string" => Some(TypeId::STRING),
            "void" => Some(TypeId::VOID),
            "never" => Some(TypeId::NEVER),
            "mixed" => Some(TypeId::MIXED),
            "null" => Some(TypeId::NULL),
            "self" | "static" => Some(TypeId::SELF),
            "array" | "iterable" | "list" => Some(TypeId::ARRAY),
            _ => None,
        };
        if let Some(id) = builtin {
            return Ok(id);
        }
        self.registry
            .get_by_name(name.trim_start_matches('\\'))
            .ok_or_else(|| CoreError::UnknownTypeName {
                name: name.to_string(),
            })
    }

    /// `void` and `never` cannot be combined with anything.
    fn reject_standalone_only(&self, members: &[TypeId]) -> Result<(), CoreError> {
        if members
            .iter()
            .any(|m| *m == TypeId::VOID || *m == TypeId::NEVER)
        {
            return Err(self.invalid("void and never must stand alone"));
        }
        Ok(())
    }
}
