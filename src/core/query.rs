//! Record selectors
//!
//! A query names a collection and optionally filters it with equality
//! conditions:
//!
//! ```text
//! accounts
//! accounts where status = 'open'
//! accounts WHERE status = 'open' AND employees = 12 AND archived != true
//! ```
//!
//! Keywords are case-insensitive. Literals are single-quoted strings (a
//! doubled quote escapes a quote), integers, decimals, `true`, `false` and
//! `null`. The pseudo-field `id` matches the record identifier.

use crate::domain::{ChunkwiseError, Record, Result};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => f.write_str("="),
            Self::Ne => f.write_str("!="),
        }
    }
}

/// A single `field op literal` filter
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    /// Evaluates the condition against a record
    ///
    /// A missing field compares equal to `null`.
    pub fn matches(&self, record: &Record) -> bool {
        let id_value;
        let actual = if self.field == "id" {
            id_value = Value::String(record.id.as_str().to_string());
            &id_value
        } else {
            record.field(&self.field).unwrap_or(&Value::Null)
        };

        match self.operator {
            Operator::Eq => actual == &self.value,
            Operator::Ne => actual != &self.value,
        }
    }
}

/// Parsed record selector
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub conditions: Vec<Condition>,
}

impl Query {
    /// Parses selector text
    ///
    /// # Errors
    ///
    /// Returns `ChunkwiseError::InvalidQuery` for empty input, bad
    /// identifiers, unterminated strings, missing operators or literals and
    /// trailing tokens.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text)?;
        Parser { tokens, pos: 0 }.parse_query()
    }

    /// Returns true if the record passes every condition
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}

impl FromStr for Query {
    type Err = ChunkwiseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection)?;
        for (i, condition) in self.conditions.iter().enumerate() {
            let keyword = if i == 0 { "where" } else { "and" };
            write!(f, " {keyword} {} {} ", condition.field, condition.operator)?;
            match &condition.value {
                Value::String(s) => write!(f, "'{}'", s.replace('\'', "''"))?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(Number),
    Eq,
    Ne,
}

fn invalid(message: impl Into<String>) -> ChunkwiseError {
    ChunkwiseError::InvalidQuery(message.into())
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => tokens.push(Token::Ne),
                    _ => return Err(invalid(format!("expected '=' after '!' at offset {start}"))),
                }
            }
            '\'' => {
                chars.next();
                let mut literal = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    if c == '\'' {
                        if matches!(chars.peek(), Some((_, '\''))) {
                            chars.next();
                            literal.push('\'');
                        } else {
                            closed = true;
                            break;
                        }
                    } else {
                        literal.push(c);
                    }
                }
                if !closed {
                    return Err(invalid(format!(
                        "unterminated string literal starting at offset {start}"
                    )));
                }
                tokens.push(Token::Str(literal));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' || (i == start && c == '-') {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let raw = &text[start..end];
                let number = parse_number(raw)
                    .ok_or_else(|| invalid(format!("invalid number literal '{raw}'")))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(text[start..end].to_string()));
            }
            other => {
                return Err(invalid(format!(
                    "unexpected character '{other}' at offset {start}"
                )))
            }
        }
    }

    Ok(tokens)
}

fn parse_number(raw: &str) -> Option<Number> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(int.into());
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn next_is_keyword(&self, keyword: &str) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Ident(word)) if word.eq_ignore_ascii_case(keyword))
    }

    fn parse_query(mut self) -> Result<Query> {
        let collection = match self.next() {
            Some(Token::Ident(name)) if !is_keyword(&name) => name,
            Some(other) => return Err(invalid(format!("expected collection name, got {other:?}"))),
            None => return Err(invalid("query is empty")),
        };

        let mut conditions = Vec::new();
        if self.next_is_keyword("where") {
            self.pos += 1;
            conditions.push(self.parse_condition()?);
            while self.next_is_keyword("and") {
                self.pos += 1;
                conditions.push(self.parse_condition()?);
            }
        }

        if let Some(token) = self.next() {
            return Err(invalid(format!("unexpected trailing token {token:?}")));
        }

        Ok(Query {
            collection,
            conditions,
        })
    }

    fn parse_condition(&mut self) -> Result<Condition> {
        let field = match self.next() {
            Some(Token::Ident(name)) if !is_keyword(&name) => name,
            Some(other) => return Err(invalid(format!("expected field name, got {other:?}"))),
            None => return Err(invalid("expected field name after 'where'/'and'")),
        };

        let operator = match self.next() {
            Some(Token::Eq) => Operator::Eq,
            Some(Token::Ne) => Operator::Ne,
            _ => return Err(invalid(format!("expected '=' or '!=' after '{field}'"))),
        };

        let value = match self.next() {
            Some(Token::Str(s)) => Value::String(s),
            Some(Token::Number(n)) => Value::Number(n),
            Some(Token::Ident(word)) => match word.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                _ => return Err(invalid(format!("expected literal, got identifier '{word}'"))),
            },
            _ => return Err(invalid(format!("expected literal after '{field} {operator}'"))),
        };

        Ok(Condition {
            field,
            operator,
            value,
        })
    }
}

fn is_keyword(word: &str) -> bool {
    ["where", "and"]
        .iter()
        .any(|keyword| word.eq_ignore_ascii_case(keyword))
}
