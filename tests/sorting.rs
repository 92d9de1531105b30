use rstest::rstest;
use std::cmp::Ordering;

use jsonflex::{Document, SortKey, SortSpec};

#[rstest]
fn mixed_types_order_null_number_string_bool() {
    let mut doc = Document::parse(r#"[true, "b", 7, null, "A", 2]"#);
    let root = doc.root();
    assert!(doc.sort_children(root, &SortSpec::by_value()));
    assert_eq!(doc.text(), r#"[null,2,7,"A","b",true]"#);
}

#[rstest]
fn table_rows_sort_by_multiple_columns() {
    let mut doc = Document::parse(
        r#"[["smith", 2], ["jones", 9], ["smith", 1], ["adams", 5]]"#,
    );
    let root = doc.root();
    let spec = SortSpec::by_columns([0, 1]);
    assert!(doc.sort_children(root, &spec));
    assert_eq!(doc.str_at("0.0", ""), "adams");
    assert_eq!(doc.str_at("1.0", ""), "jones");
    assert_eq!(doc.int_at("2.1", 0), 1);
    assert_eq!(doc.int_at("3.1", 0), 2);
}

#[rstest]
fn records_sort_by_field_then_tiebreaker() {
    let mut doc = Document::parse(
        r#"[
            {"dept": "eng", "name": "zoe"},
            {"dept": "art", "name": "amy"},
            {"dept": "eng", "name": "abe"}
        ]"#,
    );
    let root = doc.root();
    let spec = SortSpec::by_fields(["dept"]).then(SortKey::Field("name".to_string()));
    assert!(doc.sort_children(root, &spec));
    assert_eq!(doc.str_at("0.name", ""), "amy");
    assert_eq!(doc.str_at("1.name", ""), "abe");
    assert_eq!(doc.str_at("2.name", ""), "zoe");
}

#[rstest]
fn object_members_sort_by_key() {
    let mut doc = Document::parse(r#"{"zeta": 1, "Alpha": 2, "mid": 3}"#);
    let root = doc.root();
    assert!(doc.sort_children(root, &SortSpec::by_child_key()));
    assert_eq!(doc.text(), r#"{"Alpha":2,"mid":3,"zeta":1}"#);
}

#[rstest]
fn descending_sort() {
    let mut doc = Document::parse("[1, 5, 3]");
    assert!(doc.sort_children(doc.root(), &SortSpec::by_value().reversed()));
    assert_eq!(doc.text(), "[5,3,1]");
}

#[rstest]
fn compare_is_exposed_directly() {
    let doc = Document::parse(r#"[1, "one"]"#);
    let root = doc.root();
    let number = doc.at(root, 0).unwrap();
    let string = doc.at(root, 1).unwrap();
    assert_eq!(doc.compare(number, string), Ordering::Less);
    assert_eq!(doc.compare(string, number), Ordering::Greater);
    assert_eq!(doc.compare(number, number), Ordering::Equal);
}

#[rstest]
fn sorting_invalidates_only_the_container() {
    let mut doc = Document::parse("[[9], [1]]");
    let root = doc.root();
    let _ = doc.to_text(root);
    assert!(doc.sort_children(root, &SortSpec::by_columns([0])));
    assert!(!doc.cached_text_valid(root));
    // element caches are untouched and reused
    assert_eq!(doc.text(), "[[1],[9]]");
}

#[rstest]
fn missing_sort_field_orders_first() {
    let mut doc = Document::parse(r#"[{"rank": 2}, {}, {"rank": 1}]"#);
    let root = doc.root();
    assert!(doc.sort_children(root, &SortSpec::by_fields(["rank"])));
    assert_eq!(doc.len(doc.at(root, 0).unwrap()), 0);
    assert_eq!(doc.int_at("1.rank", 0), 1);
    assert_eq!(doc.int_at("2.rank", 0), 2);
}
