// Whole-document re-serializer for bulk rewrites: priority key ordering and
// optional compact rendering for small leaf collections.
use serde_json::Value;

use crate::ast::{BASE_INDENT, escape_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactWhen {
    Never,
    Always,
    /// Compact collections whose entries are all scalars and whose length
    /// does not exceed the given count.
    LeafMaxLen(usize),
}

#[derive(Debug, Clone)]
pub struct Formatter {
    key_order: Vec<String>,
    compact: CompactWhen,
    indent: usize,
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            key_order: Vec::new(),
            compact: CompactWhen::Never,
            indent: BASE_INDENT,
        }
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys listed here sort first, in list order; everything else keeps its
    /// insertion order after them.
    pub fn key_order<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_order = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn compact(mut self, when: CompactWhen) -> Self {
        self.compact = when;
        self
    }

    pub fn indent(mut self, width: usize) -> Self {
        self.indent = width;
        self
    }

    pub fn format(&self, value: &Value) -> String {
        let mut out = String::new();
        self.write_value(value, 0, &mut out);
        out
    }

    fn key_priority(&self, key: &str) -> usize {
        self.key_order
            .iter()
            .position(|k| k == key)
            .unwrap_or(usize::MAX)
    }

    fn should_compact(&self, value: &Value) -> bool {
        match self.compact {
            CompactWhen::Never => false,
            CompactWhen::Always => true,
            CompactWhen::LeafMaxLen(max) => match value {
                Value::Array(items) => {
                    items.len() <= max && items.iter().all(|v| !is_container(v))
                }
                Value::Object(map) => {
                    map.len() <= max && map.values().all(|v| !is_container(v))
                }
                _ => false,
            },
        }
    }

    fn ordered_keys<'a>(&self, map: &'a serde_json::Map<String, Value>) -> Vec<&'a String> {
        let mut keys: Vec<&String> = map.keys().collect();
        // stable sort keeps insertion order within equal priority
        keys.sort_by_key(|k| self.key_priority(k));
        keys
    }

    fn write_value(&self, v: &Value, depth: usize, out: &mut String) {
        match v {
            Value::Object(map) if !map.is_empty() => {
                let keys = self.ordered_keys(map);
                if self.should_compact(v) {
                    out.push('{');
                    for (i, k) in keys.iter().enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        out.push('"');
                        out.push_str(&escape_json(k));
                        out.push_str("\":");
                        out.push_str(&map[k.as_str()].to_string());
                    }
                    out.push('}');
                    return;
                }
                out.push_str("{\n");
                for (i, k) in keys.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    self.push_indent(out, depth + 1);
                    out.push('"');
                    out.push_str(&escape_json(k));
                    out.push_str("\": ");
                    self.write_value(&map[k.as_str()], depth + 1, out);
                }
                out.push('\n');
                self.push_indent(out, depth);
                out.push('}');
            }
            Value::Array(items) if !items.is_empty() => {
                if self.should_compact(v) {
                    out.push_str(&v.to_string());
                    return;
                }
                out.push_str("[\n");
                for (i, it) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    self.push_indent(out, depth + 1);
                    self.write_value(it, depth + 1, out);
                }
                out.push('\n');
                self.push_indent(out, depth);
                out.push(']');
            }
            _ => out.push_str(&v.to_string()),
        }
    }

    fn push_indent(&self, out: &mut String, depth: usize) {
        for _ in 0..depth * self.indent {
            out.push(' ');
        }
    }
}

fn is_container(v: &Value) -> bool {
    matches!(v, Value::Object(_) | Value::Array(_))
}
