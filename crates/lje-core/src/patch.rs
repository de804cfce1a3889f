// Patch generator: walks an edit descriptor against a live AST and produces
// the span/text replacements that realize it, leaving every other byte alone.
use std::collections::HashMap;

use serde_json::Value;

use crate::ast::{self, BASE_INDENT, Node, NodeId, NodeKind, Position, Span};
use crate::edit::{ArrayEdit, CompoundEdit, JsonEdit, ObjectEdit};
use crate::error::EditError;

/// One textual replacement. An empty span is an insertion, empty text a
/// deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    pub span: Span,
    pub text: String,
}

/// Key -> property position for every object node reachable from a root,
/// keyed by `NodeId` rather than node identity. Rebuilt wholesale on every
/// AST swap, never mutated incrementally. Duplicate keys: last write wins.
#[derive(Debug, Default)]
pub struct PropertyIndex {
    props: HashMap<NodeId, HashMap<String, usize>>,
}

impl PropertyIndex {
    pub fn build(root: &Node) -> Self {
        let mut index = PropertyIndex::default();
        ast::visit(root, &mut |node| {
            if let NodeKind::Object(props) = &node.kind {
                let mut by_key = HashMap::with_capacity(props.len());
                for (i, p) in props.iter().enumerate() {
                    by_key.insert(p.key.clone(), i);
                }
                index.props.insert(node.id, by_key);
            }
        });
        index
    }

    pub fn property<'a>(&self, node: &'a Node, key: &str) -> Option<&'a ast::Property> {
        let NodeKind::Object(props) = &node.kind else {
            return None;
        };
        let i = *self.props.get(&node.id)?.get(key)?;
        props.get(i)
    }
}

/// Compute the ordered replacement list for `edit` against `node`. Any
/// failure aborts the whole computation; partial patches are never returned.
pub fn make_edit(
    edit: &JsonEdit,
    node: &Node,
    index: &PropertyIndex,
    indent_level: usize,
) -> Result<Vec<TextOp>, EditError> {
    let mut ops = Vec::new();
    make_edit_into(edit, node, index, indent_level, &mut ops)?;
    Ok(ops)
}

fn make_edit_into(
    edit: &JsonEdit,
    node: &Node,
    index: &PropertyIndex,
    indent_level: usize,
    ops: &mut Vec<TextOp>,
) -> Result<(), EditError> {
    let compound = match edit {
        JsonEdit::Value(v) => {
            ops.push(node_replace(node, v, indent_level));
            return Ok(());
        }
        JsonEdit::Compound(c) => c,
    };

    match compound {
        CompoundEdit::Object(o) => match o {
            // set replaces the full span, terminal for any node kind
            ObjectEdit::Set { values } => ops.push(node_replace(node, values, indent_level)),
            ObjectEdit::Update { key, value } => {
                let NodeKind::Object(_) = node.kind else {
                    return Err(schema_mismatch("object", node));
                };
                if let Some(prop) = index.property(node, key) {
                    make_edit_into(value, &prop.value, index, indent_level + 1, ops)?;
                } else {
                    // Only whole-value creation is legal for a missing
                    // property; incremental updates have nothing to target.
                    let resolved = match value.as_ref() {
                        JsonEdit::Value(v) => v.clone(),
                        JsonEdit::Compound(CompoundEdit::Object(ObjectEdit::Set { values })) => {
                            values.clone()
                        }
                        JsonEdit::Compound(CompoundEdit::Array(ArrayEdit::Set { values })) => {
                            Value::Array(values.clone())
                        }
                        JsonEdit::Compound(_) => {
                            return Err(EditError::MissingTarget(format!("property '{}'", key)));
                        }
                    };
                    let mut content = serde_json::Map::new();
                    content.insert(key.clone(), resolved);
                    insert_entries(node, &Value::Object(content), indent_level, ops);
                }
            }
            ObjectEdit::Delete { key } => {
                let NodeKind::Object(props) = &node.kind else {
                    return Err(schema_mismatch("object", node));
                };
                // Deliberately lenient: a missing key is a no-op.
                if let Some(i) = props.iter().position(|p| p.key == *key) {
                    delete_entry(node, i, ops);
                }
            }
        },
        CompoundEdit::Array(a) => match a {
            ArrayEdit::Set { values } => {
                ops.push(node_replace(node, &Value::Array(values.clone()), indent_level));
            }
            ArrayEdit::Push { values } => {
                let NodeKind::Array(_) = node.kind else {
                    return Err(schema_mismatch("array", node));
                };
                insert_entries(node, &Value::Array(values.clone()), indent_level, ops);
            }
            ArrayEdit::Update { index: i, value } => {
                let NodeKind::Array(items) = &node.kind else {
                    return Err(schema_mismatch("array", node));
                };
                // No auto-extension; callers pre-extend via push or set.
                let Some(child) = items.get(*i) else {
                    return Err(EditError::MissingTarget(format!("array element {}", i)));
                };
                make_edit_into(value, child, index, indent_level + 1, ops)?;
            }
            ArrayEdit::Delete { index: i } => {
                let NodeKind::Array(items) = &node.kind else {
                    return Err(schema_mismatch("array", node));
                };
                if *i < items.len() {
                    delete_entry(node, *i, ops);
                }
            }
        },
    }
    Ok(())
}

fn schema_mismatch(expected: &'static str, node: &Node) -> EditError {
    EditError::SchemaMismatch {
        expected,
        actual: node.kind_name(),
    }
}

fn node_replace(node: &Node, value: &Value, indent_level: usize) -> TextOp {
    let indent = " ".repeat(indent_level * BASE_INDENT);
    TextOp {
        span: node.span,
        text: ast::add_indent(&ast::serialize(value), &indent, false),
    }
}

fn entry_count(node: &Node) -> usize {
    match &node.kind {
        NodeKind::Object(props) => props.len(),
        NodeKind::Array(items) => items.len(),
        NodeKind::Literal(_) => 0,
    }
}

fn entry_span(node: &Node, i: usize) -> Option<Span> {
    match &node.kind {
        NodeKind::Object(props) => props.get(i).map(|p| p.span),
        NodeKind::Array(items) => items.get(i).map(|n| n.span),
        NodeKind::Literal(_) => None,
    }
}

// Brackets are single ASCII bytes, so shifting a position by one column is
// exact in both column and offset.
fn shift_right(p: Position) -> Position {
    Position {
        line: p.line,
        column: p.column + 1,
        offset: p.offset + 1,
    }
}

fn shift_left(p: Position) -> Position {
    Position {
        line: p.line,
        column: p.column - 1,
        offset: p.offset - 1,
    }
}

/// The serialized entries of a container, without the bracket lines.
fn entries_body(serialized: &str) -> &str {
    match (serialized.find('\n'), serialized.rfind('\n')) {
        (Some(first), Some(last)) if first < last => &serialized[first + 1..last],
        _ => serialized,
    }
}

/// Insert the entries of `content` (an object or array value) into the
/// container: after the last entry with a comma separator, or as the sole
/// content right after the opening bracket.
fn insert_entries(node: &Node, content: &Value, indent_level: usize, ops: &mut Vec<TextOp>) {
    let empty = match content {
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    };
    if empty {
        return;
    }

    let indent = " ".repeat(indent_level * BASE_INDENT);
    let serialized = ast::serialize(content);
    let body = ast::add_indent(entries_body(&serialized), &indent, true);

    let last = entry_count(node)
        .checked_sub(1)
        .and_then(|i| entry_span(node, i));
    let (pos, text) = match last {
        Some(last) => (last.end, format!(",\n{}", body)),
        None => (
            shift_right(node.span.start),
            format!("\n{}\n{}", body, indent),
        ),
    };
    ops.push(TextOp {
        span: Span {
            start: pos,
            end: pos,
        },
        text,
    });
}

/// Remove entry `i`, reclaiming exactly one comma. Separators live between
/// siblings, so the replaced span depends on which neighbors exist:
/// - following sibling: target start -> next start (trailing comma),
/// - else preceding sibling: previous end -> target end (leading comma),
/// - else: just after the opening bracket -> just before the closing one.
fn delete_entry(node: &Node, i: usize, ops: &mut Vec<TextOp>) {
    let Some(target) = entry_span(node, i) else {
        return;
    };
    let next = entry_span(node, i + 1);
    let prev = if i > 0 { entry_span(node, i - 1) } else { None };

    let (start, end) = match (next, prev) {
        (Some(next), _) => (target.start, next.start),
        (None, Some(prev)) => (prev.end, target.end),
        (None, None) => (shift_right(node.span.start), shift_left(node.span.end)),
    };
    ops.push(TextOp {
        span: Span { start, end },
        text: String::new(),
    });
}
