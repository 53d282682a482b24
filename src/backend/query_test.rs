use super::*;
use serde_json::json;

#[test]
fn encode_eq_string_is_raw() {
    let (col, val) = encode_filter(&Filter::eq("status", "published"));
    assert_eq!(col, "status");
    assert_eq!(val, "eq.published");
}

#[test]
fn encode_eq_number_and_bool() {
    assert_eq!(encode_filter(&Filter::eq("n", 3)).1, "eq.3");
    assert_eq!(encode_filter(&Filter::eq("b", true)).1, "eq.true");
}

#[test]
fn encode_in_joins_values() {
    let (col, val) = encode_filter(&Filter::is_in("id", ["a", "b"]));
    assert_eq!(col, "id");
    assert_eq!(val, "in.(a,b)");
}

#[test]
fn encode_in_quotes_reserved_characters() {
    let (_, val) = encode_filter(&Filter::is_in("username", ["x,y", "plain"]));
    assert_eq!(val, "in.(\"x,y\",plain)");
}

#[test]
fn encode_in_empty_list() {
    let (_, val) = encode_filter(&Filter::In("id".into(), vec![]));
    assert_eq!(val, "in.()");
}

#[test]
fn encode_select_defaults_to_star() {
    let pairs = encode_select(&Select::from("posts"));
    assert_eq!(pairs, vec![("select".to_owned(), "*".to_owned())]);
}

#[test]
fn encode_select_full() {
    let select = Select::from("posts")
        .columns(&["id", "title"])
        .eq("status", "published")
        .order_desc("created_at")
        .limit(5);
    let pairs = encode_select(&select);
    assert_eq!(
        pairs,
        vec![
            ("select".to_owned(), "id,title".to_owned()),
            ("status".to_owned(), "eq.published".to_owned()),
            ("order".to_owned(), "created_at.desc".to_owned()),
            ("limit".to_owned(), "5".to_owned()),
        ]
    );
}

#[test]
fn filter_column_accessor() {
    assert_eq!(Filter::eq("a", json!(1)).column(), "a");
    assert_eq!(Filter::is_in("b", [1, 2]).column(), "b");
}
