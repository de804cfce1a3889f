// Typed, position-free edit descriptors. A descriptor only talks about the
// logical shape of the target value, so the same descriptor can be replayed
// against different parses (e.g. retried after a forced re-creation).
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Either a compound (object/array) edit or a plain replacement value.
///
/// The wire shape keeps the `type`/`action` tags of the original format:
/// `{"type": "object", "action": "update", "key": "title", "value": "Hi"}`.
/// A plain object supplied as a replacement value must go through a `set`
/// wrapper; anything without a `type` tag deserializes as a literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonEdit {
    Compound(CompoundEdit),
    Value(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CompoundEdit {
    Object(ObjectEdit),
    Array(ArrayEdit),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ObjectEdit {
    Set { values: Value },
    Update { key: String, value: Box<JsonEdit> },
    Delete { key: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ArrayEdit {
    Set { values: Vec<Value> },
    Push { values: Vec<Value> },
    Update { index: usize, value: Box<JsonEdit> },
    Delete { index: usize },
}

impl JsonEdit {
    /// True iff this is a tagged object/array edit rather than a literal
    /// replacement value. `set` is itself a tagged action precisely so a
    /// plain object/array literal never masquerades as a compound edit.
    pub fn is_compound(&self) -> bool {
        matches!(self, JsonEdit::Compound(_))
    }

    pub fn set_object(values: Value) -> Self {
        JsonEdit::Compound(CompoundEdit::Object(ObjectEdit::Set { values }))
    }

    pub fn set_array(values: Vec<Value>) -> Self {
        JsonEdit::Compound(CompoundEdit::Array(ArrayEdit::Set { values }))
    }

    pub fn update_key(key: impl Into<String>, value: impl Into<JsonEdit>) -> Self {
        JsonEdit::Compound(CompoundEdit::Object(ObjectEdit::Update {
            key: key.into(),
            value: Box::new(value.into()),
        }))
    }

    pub fn delete_key(key: impl Into<String>) -> Self {
        JsonEdit::Compound(CompoundEdit::Object(ObjectEdit::Delete { key: key.into() }))
    }

    pub fn push(values: Vec<Value>) -> Self {
        JsonEdit::Compound(CompoundEdit::Array(ArrayEdit::Push { values }))
    }

    pub fn update_index(index: usize, value: impl Into<JsonEdit>) -> Self {
        JsonEdit::Compound(CompoundEdit::Array(ArrayEdit::Update {
            index,
            value: Box::new(value.into()),
        }))
    }

    pub fn delete_index(index: usize) -> Self {
        JsonEdit::Compound(CompoundEdit::Array(ArrayEdit::Delete { index }))
    }
}

impl From<Value> for JsonEdit {
    fn from(v: Value) -> Self {
        JsonEdit::Value(v)
    }
}

/// Pure value-level fold of an edit, used by the whole-document formatter
/// path where the result is re-serialized in full rather than patched.
pub fn apply_to_value(data: Value, edit: &JsonEdit) -> Value {
    let compound = match edit {
        JsonEdit::Value(v) => return v.clone(),
        JsonEdit::Compound(c) => c,
    };
    match compound {
        CompoundEdit::Object(o) => {
            let mut map = match data {
                Value::Object(m) => m,
                _ => serde_json::Map::new(),
            };
            match o {
                ObjectEdit::Set { values } => return values.clone(),
                ObjectEdit::Update { key, value } => {
                    let current = map.get(key).cloned().unwrap_or(Value::Null);
                    map.insert(key.clone(), apply_to_value(current, value));
                }
                ObjectEdit::Delete { key } => {
                    // shift_remove keeps the remaining keys in order
                    map.shift_remove(key);
                }
            }
            Value::Object(map)
        }
        CompoundEdit::Array(a) => {
            let mut arr = match data {
                Value::Array(items) => items,
                _ => Vec::new(),
            };
            match a {
                ArrayEdit::Set { values } => return Value::Array(values.clone()),
                ArrayEdit::Push { values } => arr.extend(values.iter().cloned()),
                ArrayEdit::Update { index, value } => {
                    // No auto-extension, matching the patch path.
                    if let Some(slot) = arr.get_mut(*index) {
                        let current = std::mem::take(slot);
                        *slot = apply_to_value(current, value);
                    }
                }
                ArrayEdit::Delete { index } => {
                    if *index < arr.len() {
                        arr.remove(*index);
                    }
                }
            }
            Value::Array(arr)
        }
    }
}
