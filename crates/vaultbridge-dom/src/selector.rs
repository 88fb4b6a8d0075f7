//! CSS selector subset used by the field heuristics.
//!
//! Supported: type selectors, `*`, `.class`, `#id`, and attribute selectors
//! `[a]`, `[a=v]`, `[a~=v]`, `[a*=v]`, `[a^=v]`, `[a$=v]`, combined into
//! compound selectors and comma-separated lists. No combinators or
//! pseudo-classes.
//!
//! Attribute values compare case-sensitively, except `type`, whose HTML
//! values are ASCII case-insensitive.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::node::Element;

/// Selector parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected character '{ch}' at {pos}")]
    Unexpected { ch: char, pos: usize },

    #[error("Unterminated {0}")]
    Unterminated(&'static str),
}

/// Attribute comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Exists,
    Equals,
    /// `~=`: whitespace-separated word match.
    Includes,
    Contains,
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    pub name: String,
    pub op: AttrOp,
    pub value: String,
}

impl AttrSelector {
    fn matches(&self, element: &Element) -> bool {
        let Some(actual) = element.attribute(&self.name) else {
            return false;
        };
        let (actual, value): (Cow<'_, str>, Cow<'_, str>) = if self.name == "type" {
            (
                actual.to_ascii_lowercase().into(),
                self.value.to_ascii_lowercase().into(),
            )
        } else {
            (actual.into(), self.value.as_str().into())
        };
        // Per CSS, an empty operand never matches the substring operators.
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == value,
            AttrOp::Includes => {
                !value.is_empty() && actual.split_whitespace().any(|w| w == value)
            }
            AttrOp::Contains => !value.is_empty() && actual.contains(&*value),
            AttrOp::Prefix => !value.is_empty() && actual.starts_with(&*value),
            AttrOp::Suffix => !value.is_empty() && actual.ends_with(&*value),
        }
    }
}

/// One compound selector, e.g. `input[type="text"][name*="user"]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    /// Lowercase tag name; `None` for `*` or no type selector.
    pub tag: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttrSelector>,
}

impl Selector {
    pub fn matches(&self, element: &Element) -> bool {
        if let Some(ref tag) = self.tag {
            if element.tag() != tag {
                return false;
            }
        }
        self.classes.iter().all(|c| element.has_class(c))
            && self.attributes.iter().all(|a| a.matches(element))
    }
}

/// Comma-separated selector list; matches if any member matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Selector>,
    source: String,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser {
            chars: input.char_indices().collect(),
            pos: 0,
        };
        let mut selectors = Vec::new();

        loop {
            parser.skip_ws();
            selectors.push(parser.compound()?);
            parser.skip_ws();
            match parser.next() {
                None => break,
                Some((_, ',')) => continue,
                Some((pos, ch)) => return Err(SelectorError::Unexpected { ch, pos }),
            }
        }

        Ok(Self {
            selectors,
            source: input.trim().to_string(),
        })
    }

    pub fn matches(&self, element: &Element) -> bool {
        self.selectors.iter().any(|s| s.matches(element))
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn next(&mut self) -> Option<(usize, char)> {
        let item = self.chars.get(self.pos).copied();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map(|(i, _)| *i).unwrap_or_else(|| {
            self.chars.last().map(|(i, c)| i + c.len_utf8()).unwrap_or(0)
        })
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        out
    }

    fn compound(&mut self) -> Result<Selector, SelectorError> {
        let mut selector = Selector::default();
        let start = self.pos;

        match self.peek() {
            Some('*') => {
                self.pos += 1;
            }
            Some(c) if c.is_alphabetic() => {
                selector.tag = Some(self.ident().to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    let class = self.ident();
                    if class.is_empty() {
                        return Err(self.unexpected());
                    }
                    selector.classes.push(class);
                }
                Some('#') => {
                    self.pos += 1;
                    let id = self.ident();
                    if id.is_empty() {
                        return Err(self.unexpected());
                    }
                    selector.attributes.push(AttrSelector {
                        name: "id".to_string(),
                        op: AttrOp::Equals,
                        value: id,
                    });
                }
                Some('[') => {
                    self.pos += 1;
                    selector.attributes.push(self.attribute()?);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return match self.peek() {
                None => Err(SelectorError::Empty),
                Some(_) => Err(self.unexpected()),
            };
        }
        Ok(selector)
    }

    fn attribute(&mut self) -> Result<AttrSelector, SelectorError> {
        self.skip_ws();
        let name = self.ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.unexpected_or_unterminated());
        }
        self.skip_ws();

        let op = match self.next() {
            Some((_, ']')) => {
                return Ok(AttrSelector {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                });
            }
            Some((_, '=')) => AttrOp::Equals,
            Some((pos, c @ ('~' | '*' | '^' | '$'))) => {
                if self.next().map(|(_, c)| c) != Some('=') {
                    return Err(SelectorError::Unexpected { ch: c, pos });
                }
                match c {
                    '~' => AttrOp::Includes,
                    '*' => AttrOp::Contains,
                    '^' => AttrOp::Prefix,
                    _ => AttrOp::Suffix,
                }
            }
            Some((pos, ch)) => return Err(SelectorError::Unexpected { ch, pos }),
            None => return Err(SelectorError::Unterminated("attribute selector")),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.next() {
                        Some((_, c)) if c == quote => break,
                        Some((_, c)) => value.push(c),
                        None => return Err(SelectorError::Unterminated("string")),
                    }
                }
                value
            }
            _ => self.ident(),
        };

        self.skip_ws();
        match self.next() {
            Some((_, ']')) => Ok(AttrSelector { name, op, value }),
            Some((pos, ch)) => Err(SelectorError::Unexpected { ch, pos }),
            None => Err(SelectorError::Unterminated("attribute selector")),
        }
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::Unexpected {
                ch,
                pos: self.offset(),
            },
            None => SelectorError::Empty,
        }
    }

    fn unexpected_or_unterminated(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::Unexpected {
                ch,
                pos: self.offset(),
            },
            None => SelectorError::Unterminated("attribute selector"),
        }
    }
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
