//! Tests for WHERE handling: blank values, placeholders, quoting and IN lists.

mod common;
use common::*;
use neptune_sql_core::SqlValue;

#[test]
fn test_blank_value_is_a_no_op() {
    let mut plain = select();
    plain.from("t");

    let mut filtered = select();
    filtered
        .from("t")
        .and_where("x = ?", "")
        .and_where("y", "0")
        .and_where("z", false)
        .or_where("w", Vec::<u8>::new());

    assert_eq!(sql(&filtered), sql(&plain));
    assert!(filtered.clauses().conditions.is_none());
}

#[test]
fn test_integer_zero_is_appended() {
    let mut query = select();
    query.from("t").and_where("x = ?", 0).and_where("y", 0.0);
    assert_eq!(sql(&query), "SELECT * FROM t WHERE x = '0'");
}

#[test]
fn test_placeholder_is_stored_unquoted() {
    let mut query = select();
    query.from("t").and_where("id", "?").and_where("name", "abc");

    let conditions = query.clauses().conditions.as_ref().unwrap();
    assert_eq!(conditions[0].value.as_deref(), Some("?"));
    assert_eq!(conditions[1].value.as_deref(), Some("'abc'"));
    assert_eq!(sql(&query), "SELECT * FROM t WHERE id = ? AND name = 'abc'");
}

#[test]
fn test_injection_attempt_is_quoted() {
    let mut query = select();
    query.from("users").and_where("name", "'; DROP TABLE users; --");
    assert_eq!(
        sql(&query),
        "SELECT * FROM users WHERE name = '\\'; DROP TABLE users; --'"
    );
}

#[test]
fn test_value_fills_expression_placeholder() {
    let mut query = select();
    query.from("t").and_where("created_at > ? AND deleted = 0", "2024-01-01");
    assert_eq!(
        sql(&query),
        "SELECT * FROM t WHERE created_at > '2024-01-01' AND deleted = 0"
    );
}

#[test]
fn test_null_value_keeps_bare_expression() {
    let mut query = select();
    query
        .from("t")
        .where_clause("deleted_at IS NULL", SqlValue::Null, "and")
        .where_expr("archived = 0");
    assert_eq!(
        sql(&query),
        "SELECT * FROM t WHERE deleted_at IS NULL AND archived = 0"
    );
}

#[test]
fn test_unknown_logic_falls_back_to_and() {
    let mut query = select();
    query
        .from("t")
        .where_clause("a", 1, "or")
        .where_clause("b", 2, "xor")
        .where_clause("c", 3, "Or");
    assert_eq!(
        sql(&query),
        "SELECT * FROM t WHERE a = '1' AND b = '2' OR c = '3'"
    );
}

#[test]
fn test_where_in_quotes_every_value() {
    let mut query = select();
    query.from("t").and_where_in("id", [1, 2, 3]);
    assert_eq!(sql(&query), "SELECT * FROM t WHERE id IN ('1','2','3')");

    let entry = &query.clauses().conditions.as_ref().unwrap()[0];
    assert_eq!(entry.value, None);
}

#[test]
fn test_or_where_in_with_strings() {
    let mut query = select();
    query
        .from("t")
        .and_where("active", 1)
        .or_where_in("role", vec!["admin", "o'neil"]);
    assert_eq!(
        sql(&query),
        "SELECT * FROM t WHERE active = '1' OR role IN ('admin','o\\'neil')"
    );
}

#[test]
fn test_empty_where_in_keeps_empty_list() {
    let mut query = select();
    query.from("t").and_where_in("id", Vec::<i64>::new());
    assert_eq!(sql(&query), "SELECT * FROM t WHERE id IN ()");
}
