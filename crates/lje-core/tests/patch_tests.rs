use lje_core::ast::{self, Node};
use lje_core::{EditError, JsonEdit, PropertyIndex, TextOp, apply_to_value, make_edit};
use serde_json::json;

fn parsed(text: &str) -> (Node, PropertyIndex) {
    let node = ast::parse(text).expect("parse");
    let index = PropertyIndex::build(&node);
    (node, index)
}

fn apply_ops(text: &str, ops: &[TextOp]) -> String {
    let mut out = text.to_string();
    for op in ops.iter().rev() {
        out.replace_range(op.span.start.offset..op.span.end.offset, &op.text);
    }
    out
}

fn run(text: &str, edit: &JsonEdit) -> String {
    let (node, index) = parsed(text);
    let ops = make_edit(edit, &node, &index, 0).expect("make_edit");
    apply_ops(text, &ops)
}

#[test]
fn parse_serialize_round_trip() {
    let v = json!({
        "title": "Hello",
        "tags": ["a", "b"],
        "meta": { "count": 3, "ratio": 0.5, "on": true, "none": null }
    });
    let node = ast::parse(&ast::serialize(&v)).expect("parse");
    assert_eq!(node.to_value(), v);
}

#[test]
fn parse_reports_failure_position() {
    let err = ast::parse("{\n  \"a\": }").unwrap_err();
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 8);

    assert!(ast::parse("{} x").is_err());
    assert!(ast::parse("").is_err());
    assert!(ast::parse("{\"a\": 1,}").is_err());
}

#[test]
fn visit_is_preorder() {
    let node = ast::parse(r#"{"a": [1, 2], "b": "x"}"#).expect("parse");
    let mut kinds = Vec::new();
    ast::visit(&node, &mut |n| kinds.push(n.kind_name()));
    assert_eq!(kinds, ["object", "array", "literal", "literal", "literal"]);
}

#[test]
fn duplicate_keys_last_write_wins() {
    let (node, index) = parsed("{\"k\": 1, \"k\": 2}");
    let prop = index.property(&node, "k").expect("indexed");
    assert_eq!(prop.value.to_value(), json!(2));
}

#[test]
fn insert_into_empty_object() {
    let out = run("{}", &JsonEdit::update_key("title", json!("Hello")));
    assert_eq!(out, "{\n    \"title\": \"Hello\"\n}");
}

#[test]
fn update_existing_replaces_only_the_value_token() {
    let text = "{\n    \"title\": \"Hello\"\n}";
    let (node, index) = parsed(text);
    let edit = JsonEdit::update_key("title", json!("Hi"));
    let ops = make_edit(&edit, &node, &index, 0).expect("make_edit");
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].span.start.offset, 15);
    assert_eq!(ops[0].span.end.offset, 22);
    assert_eq!(ops[0].text, "\"Hi\"");
    assert_eq!(apply_ops(text, &ops), "{\n    \"title\": \"Hi\"\n}");
}

#[test]
fn update_preserves_surrounding_oddities() {
    let out = run("{ \"a\" :1 ,   \"b\":2 }", &JsonEdit::update_key("b", json!(9)));
    assert_eq!(out, "{ \"a\" :1 ,   \"b\":9 }");
}

#[test]
fn delete_object_key_reclaims_one_comma() {
    let text = "{\"a\": 1, \"b\": 2}";
    assert_eq!(run(text, &JsonEdit::delete_key("a")), "{\"b\": 2}");
    assert_eq!(run(text, &JsonEdit::delete_key("b")), "{\"a\": 1}");
    assert_eq!(run("{\"only\": 1}", &JsonEdit::delete_key("only")), "{}");
}

#[test]
fn delete_array_elements_first_middle_last() {
    let text = "[1, 2, 3]";
    assert_eq!(run(text, &JsonEdit::delete_index(0)), "[2, 3]");
    assert_eq!(run(text, &JsonEdit::delete_index(1)), "[1, 3]");
    assert_eq!(run(text, &JsonEdit::delete_index(2)), "[1, 2]");
    assert_eq!(run("[5]", &JsonEdit::delete_index(0)), "[]");
}

#[test]
fn delete_missing_target_is_a_noop() {
    let (node, index) = parsed("{\"a\": 1}");
    let ops = make_edit(&JsonEdit::delete_key("zzz"), &node, &index, 0).expect("make_edit");
    assert!(ops.is_empty());

    let (node, index) = parsed("[1]");
    let ops = make_edit(&JsonEdit::delete_index(5), &node, &index, 0).expect("make_edit");
    assert!(ops.is_empty());
}

#[test]
fn update_missing_property_requires_whole_value() {
    let (node, index) = parsed("{}");
    // a non-set compound edit has nothing to recurse into
    let edit = JsonEdit::update_key("outer", JsonEdit::update_key("inner", json!(1)));
    let err = make_edit(&edit, &node, &index, 0).unwrap_err();
    assert!(matches!(err, EditError::MissingTarget(_)));

    // a set wrapper creates the whole value instead
    let edit = JsonEdit::update_key("outer", JsonEdit::set_object(json!({"x": 1})));
    let ops = make_edit(&edit, &node, &index, 0).expect("make_edit");
    assert_eq!(
        apply_ops("{}", &ops),
        "{\n    \"outer\": {\n        \"x\": 1\n    }\n}"
    );
}

#[test]
fn array_update_out_of_range_is_missing_target() {
    let (node, index) = parsed("[]");
    let err = make_edit(&JsonEdit::update_index(0, json!(1)), &node, &index, 0).unwrap_err();
    assert!(matches!(err, EditError::MissingTarget(_)));
}

#[test]
fn schema_mismatch_on_kind_disagreement() {
    let (node, index) = parsed("[1]");
    let err = make_edit(&JsonEdit::update_key("k", json!(1)), &node, &index, 0).unwrap_err();
    assert!(matches!(
        err,
        EditError::SchemaMismatch {
            expected: "object",
            actual: "array"
        }
    ));

    let (node, index) = parsed("1");
    let err = make_edit(&JsonEdit::push(vec![json!(1)]), &node, &index, 0).unwrap_err();
    assert!(matches!(
        err,
        EditError::SchemaMismatch {
            expected: "array",
            actual: "literal"
        }
    ));
}

#[test]
fn set_is_terminal_for_any_node_kind() {
    let out = run("[1, 2]", &JsonEdit::set_object(json!({"a": 1})));
    assert_eq!(out, "{\n    \"a\": 1\n}");
}

#[test]
fn set_is_idempotent() {
    let edit = JsonEdit::set_object(json!({"k": [1, 2]}));
    let once = run("{\"old\": true}", &edit);
    let twice = run(&once, &edit);
    assert_eq!(once, twice);
}

#[test]
fn push_into_empty_and_populated_arrays() {
    assert_eq!(run("[]", &JsonEdit::push(vec![json!(1)])), "[\n    1\n]");
    assert_eq!(
        run("[\n    1\n]", &JsonEdit::push(vec![json!(2), json!(3)])),
        "[\n    1,\n    2,\n    3\n]"
    );

    let (node, index) = parsed("[1]");
    let ops = make_edit(&JsonEdit::push(Vec::new()), &node, &index, 0).expect("make_edit");
    assert!(ops.is_empty());
}

#[test]
fn nested_insert_inherits_indent_depth() {
    let text = "{\n    \"outer\": {}\n}";
    let edit = JsonEdit::update_key(
        "outer",
        JsonEdit::update_key("inner", JsonEdit::set_object(json!({"x": 1}))),
    );
    let out = run(text, &edit);
    assert_eq!(
        out,
        "{\n    \"outer\": {\n        \"inner\": {\n            \"x\": 1\n        }\n    }\n}"
    );
}

#[test]
fn delete_then_reinsert_appends_at_end() {
    let original = "{\n    \"a\": 1,\n    \"b\": 2\n}";
    let after_delete = run(original, &JsonEdit::delete_key("a"));
    assert_eq!(after_delete, "{\n    \"b\": 2\n}");
    // re-inserting appends rather than restoring the original position
    let restored = run(&after_delete, &JsonEdit::update_key("a", json!(1)));
    assert_eq!(restored, "{\n    \"b\": 2,\n    \"a\": 1\n}");
}

#[test]
fn descriptor_wire_shape() {
    let edit: JsonEdit = serde_json::from_str(
        r#"{"type":"object","action":"update","key":"title","value":"Hi"}"#,
    )
    .expect("descriptor");
    assert_eq!(edit, JsonEdit::update_key("title", json!("Hi")));
    assert!(edit.is_compound());

    let plain: JsonEdit = serde_json::from_str(r#""Hello""#).expect("literal");
    assert!(!plain.is_compound());

    // an untagged object literal stays a literal replacement value
    let literal: JsonEdit = serde_json::from_str(r#"{"values": {"a": 1}}"#).expect("literal");
    assert!(!literal.is_compound());

    let s = serde_json::to_string(&JsonEdit::delete_index(2)).expect("serialize");
    assert_eq!(s, r#"{"type":"array","action":"delete","index":2}"#);
}

#[test]
fn value_fold_matches_edit_semantics() {
    let v = apply_to_value(json!({"a": 1}), &JsonEdit::update_key("b", json!(2)));
    assert_eq!(v, json!({"a": 1, "b": 2}));
    let v = apply_to_value(v, &JsonEdit::delete_key("a"));
    assert_eq!(v, json!({"b": 2}));
    let v = apply_to_value(json!([1]), &JsonEdit::push(vec![json!(2)]));
    assert_eq!(v, json!([1, 2]));
    let v = apply_to_value(json!([1, 2]), &JsonEdit::update_index(1, json!(9)));
    assert_eq!(v, json!([1, 9]));
}
