// Span-annotated JSON reader and the stable pretty printer used for
// synthetic ASTs and whole-value replacements.
use serde_json::Value;

use crate::error::ParseError;

pub const BASE_INDENT: usize = 4;

pub type NodeId = u32;

/// 1-based line/column plus 0-based byte offset into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Half-open source range: start inclusive, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub span: Span,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Object(Vec<Property>),
    Array(Vec<Node>),
    Literal(Value),
}

/// One object entry. `span` covers the key token through the value end, so
/// deleting a property reclaims the whole `"key": value` stretch.
#[derive(Debug, Clone)]
pub struct Property {
    pub key: String,
    pub key_span: Span,
    pub span: Span,
    pub value: Node,
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Object(_) => "object",
            NodeKind::Array(_) => "array",
            NodeKind::Literal(_) => "literal",
        }
    }

    /// Fold the subtree back into a plain value, object keys in property
    /// order (duplicate keys: last value wins, first position kept).
    pub fn to_value(&self) -> Value {
        match &self.kind {
            NodeKind::Object(props) => {
                let mut map = serde_json::Map::with_capacity(props.len());
                for p in props {
                    map.insert(p.key.clone(), p.value.to_value());
                }
                Value::Object(map)
            }
            NodeKind::Array(items) => Value::Array(items.iter().map(Node::to_value).collect()),
            NodeKind::Literal(v) => v.clone(),
        }
    }
}

/// Pre-order traversal: the node itself, then children in source order.
pub fn visit<'a>(node: &'a Node, visitor: &mut dyn FnMut(&'a Node)) {
    visitor(node);
    match &node.kind {
        NodeKind::Object(props) => {
            for p in props {
                visit(&p.value, visitor);
            }
        }
        NodeKind::Array(items) => {
            for it in items {
                visit(it, visitor);
            }
        }
        NodeKind::Literal(_) => {}
    }
}

pub fn parse(text: &str) -> Result<Node, ParseError> {
    Parser::new(text).parse()
}

#[derive(Debug)]
pub struct Parser<'a> {
    src: &'a str,
    pos: Position,
    next_id: NodeId,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: Position {
                line: 1,
                column: 1,
                offset: 0,
            },
            next_id: 0,
        }
    }

    pub fn parse(mut self) -> Result<Node, ParseError> {
        self.skip_ws();
        let node = self.parse_value()?;
        self.skip_ws();
        if self.pos.offset != self.src.len() {
            return Err(self.err("unexpected trailing content"));
        }
        Ok(node)
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.pos.line,
            column: self.pos.column,
            message: message.into(),
        }
    }

    fn err_at(&self, at: Position, message: impl Into<String>) -> ParseError {
        ParseError {
            line: at.line,
            column: at.column,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos.offset += c.len_utf8();
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r')) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ParseError> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(self.err(format!("expected '{}', found '{}'", want, c))),
            None => Err(self.err(format!("expected '{}', found end of input", want))),
        }
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn parse_value(&mut self) -> Result<Node, ParseError> {
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') => {
                let id = self.alloc_id();
                let (value, span) = self.parse_string()?;
                Ok(Node {
                    id,
                    span,
                    kind: NodeKind::Literal(Value::String(value)),
                })
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some('t') => self.parse_keyword("true", Value::Bool(true)),
            Some('f') => self.parse_keyword("false", Value::Bool(false)),
            Some('n') => self.parse_keyword("null", Value::Null),
            Some(c) => Err(self.err(format!("unexpected character '{}'", c))),
            None => Err(self.err("unexpected end of input")),
        }
    }

    fn parse_object(&mut self) -> Result<Node, ParseError> {
        let id = self.alloc_id();
        let start = self.pos;
        self.expect('{')?;
        let mut properties = Vec::new();
        self.skip_ws();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(Node {
                id,
                span: Span {
                    start,
                    end: self.pos,
                },
                kind: NodeKind::Object(properties),
            });
        }
        loop {
            self.skip_ws();
            if self.peek() != Some('"') {
                return Err(self.err("expected property key"));
            }
            let (key, key_span) = self.parse_string()?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.parse_value()?;
            let span = Span {
                start: key_span.start,
                end: value.span.end,
            };
            properties.push(Property {
                key,
                key_span,
                span,
                value,
            });
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => break,
                Some(c) => return Err(self.err(format!("expected ',' or '}}', found '{}'", c))),
                None => return Err(self.err("unterminated object")),
            }
        }
        Ok(Node {
            id,
            span: Span {
                start,
                end: self.pos,
            },
            kind: NodeKind::Object(properties),
        })
    }

    fn parse_array(&mut self) -> Result<Node, ParseError> {
        let id = self.alloc_id();
        let start = self.pos;
        self.expect('[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(']') {
            self.bump();
            return Ok(Node {
                id,
                span: Span {
                    start,
                    end: self.pos,
                },
                kind: NodeKind::Array(items),
            });
        }
        loop {
            self.skip_ws();
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some(']') => break,
                Some(c) => return Err(self.err(format!("expected ',' or ']', found '{}'", c))),
                None => return Err(self.err("unterminated array")),
            }
        }
        Ok(Node {
            id,
            span: Span {
                start,
                end: self.pos,
            },
            kind: NodeKind::Array(items),
        })
    }

    // Scans the raw token for its span, then lets serde_json do the decoding
    // so escape handling matches the writer exactly.
    fn parse_string(&mut self) -> Result<(String, Span), ParseError> {
        let start = self.pos;
        self.expect('"')?;
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    if self.bump().is_none() {
                        return Err(self.err_at(start, "unterminated string"));
                    }
                }
                Some(_) => {}
                None => return Err(self.err_at(start, "unterminated string")),
            }
        }
        let raw = &self.src[start.offset..self.pos.offset];
        let decoded: String = serde_json::from_str(raw)
            .map_err(|e| self.err_at(start, format!("invalid string: {}", e)))?;
        Ok((
            decoded,
            Span {
                start,
                end: self.pos,
            },
        ))
    }

    fn parse_number(&mut self) -> Result<Node, ParseError> {
        let id = self.alloc_id();
        let start = self.pos;
        while matches!(
            self.peek(),
            Some('-' | '+' | '.' | 'e' | 'E') | Some('0'..='9')
        ) {
            self.bump();
        }
        let raw = &self.src[start.offset..self.pos.offset];
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| self.err_at(start, format!("invalid number: {}", e)))?;
        Ok(Node {
            id,
            span: Span {
                start,
                end: self.pos,
            },
            kind: NodeKind::Literal(value),
        })
    }

    fn parse_keyword(&mut self, word: &'static str, value: Value) -> Result<Node, ParseError> {
        let id = self.alloc_id();
        let start = self.pos;
        for expected in word.chars() {
            match self.bump() {
                Some(c) if c == expected => {}
                _ => return Err(self.err_at(start, format!("invalid literal, expected '{}'", word))),
            }
        }
        Ok(Node {
            id,
            span: Span {
                start,
                end: self.pos,
            },
            kind: NodeKind::Literal(value),
        })
    }
}

/// Stable pretty printer: 4-space indent, object keys in insertion order.
/// This is the shape freshly created documents and `set` replacements take.
pub fn serialize(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, 0, &mut out);
    out
}

fn write_value(v: &Value, depth: usize, out: &mut String) {
    match v {
        Value::Object(map) if !map.is_empty() => {
            out.push_str("{\n");
            for (i, (k, val)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(out, depth + 1);
                out.push('"');
                out.push_str(&escape_json(k));
                out.push_str("\": ");
                write_value(val, depth + 1, out);
            }
            out.push('\n');
            push_indent(out, depth);
            out.push('}');
        }
        Value::Array(items) if !items.is_empty() => {
            out.push_str("[\n");
            for (i, it) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(out, depth + 1);
                write_value(it, depth + 1, out);
            }
            out.push('\n');
            push_indent(out, depth);
            out.push(']');
        }
        // {} / [] / scalars: serde's compact form
        _ => out.push_str(&v.to_string()),
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth * BASE_INDENT {
        out.push(' ');
    }
}

pub(crate) fn escape_json(s: &str) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                write!(&mut out, "\\u{:04x}", c as u32).ok();
            }
            c => out.push(c),
        }
    }
    out
}

/// Re-prefix every interior newline of `source` with `indent`, so nested
/// serializations inherit the depth of their insertion point.
pub fn add_indent(source: &str, indent: &str, add_at_start: bool) -> String {
    if indent.is_empty() {
        return source.to_string();
    }
    let mut res = String::with_capacity(source.len() + indent.len());
    if add_at_start {
        res.push_str(indent);
    }
    for c in source.chars() {
        res.push(c);
        if c == '\n' {
            res.push_str(indent);
        }
    }
    res
}
