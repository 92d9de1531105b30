use rstest::rstest;

use jsonflex::{Document, Fault, NodeKind, ParseOptions};

#[rstest]
#[case("null", NodeKind::Null)]
#[case("true", NodeKind::Boolean)]
#[case("false", NodeKind::Boolean)]
#[case("42", NodeKind::Number)]
#[case("-3.25", NodeKind::Number)]
#[case("1e6", NodeKind::Number)]
#[case("1e+5", NodeKind::Number)]
#[case("2E-2", NodeKind::Number)]
#[case("\"hi\"", NodeKind::String)]
#[case("[]", NodeKind::Array)]
#[case("{}", NodeKind::Object)]
fn strict_accepts_standard_roots(#[case] input: &str, #[case] kind: NodeKind) {
    let doc = Document::parse(input);
    assert_eq!(doc.status(doc.root()), 0, "input: {input}");
    assert_eq!(doc.kind(doc.root()), kind);
}

#[rstest]
#[case("{a: 1}", Fault::KeyNotString)]
#[case("'single'", Fault::BadLiteral)]
#[case("// comment\n1", Fault::BadLiteral)]
#[case("[1, 2,]", Fault::BadLiteral)]
#[case("{\"a\": 1,}", Fault::BadLiteral)]
#[case("hello", Fault::BadLiteral)]
#[case("", Fault::BadLiteral)]
#[case("\"open", Fault::UnterminatedString)]
#[case("\"bad\\q\"", Fault::BadEscape)]
#[case("{\"a\" 1}", Fault::MissingColon)]
#[case("{\"a\": 1 \"b\": 2}", Fault::MissingDelimiter)]
#[case("[1 2]", Fault::MissingDelimiter)]
#[case("[1, 2", Fault::MissingDelimiter)]
#[case("{3: 1}", Fault::KeyNotString)]
#[case("1 2", Fault::TrailingText)]
#[case("+1", Fault::BadLiteral)]
fn strict_rejections_map_to_status_codes(#[case] input: &str, #[case] fault: Fault) {
    let doc = Document::parse(input);
    assert_eq!(doc.status(doc.root()), fault.code(), "input: {input}");
}

#[rstest]
fn status_is_sticky_across_reads_and_writes() {
    let mut doc = Document::parse("[1, 2");
    let root = doc.root();
    let code = doc.status(root);
    assert_eq!(code, Fault::MissingDelimiter.code());

    // reads fall back to defaults, writes refuse, the code never changes
    assert_eq!(doc.int_or(root, 7), 7);
    assert!(!doc.set_number(root, 1.0));
    let child = doc.new_number(9.0);
    assert!(!doc.push(root, child));
    assert_eq!(doc.status(root), code);
}

#[rstest]
fn status_message_names_the_fault() {
    let doc = Document::parse("{\"a\" 1}");
    assert_eq!(doc.status_message(doc.root()), "missing ':' after object key");
    let doc = Document::parse("1");
    assert_eq!(doc.status_message(doc.root()), "ok");
}

#[rstest]
fn partial_tree_survives_a_fault() {
    let doc = Document::parse(r#"{"a": 1, "b": [true, }"#);
    let root = doc.root();
    assert!(doc.status(root) < 0);
    // members parsed before the fault are still reachable
    let a = doc.find_member(root, "a").unwrap();
    assert_eq!(doc.int_or(a, 0), 1);
}

#[rstest]
fn duplicate_keys_keep_the_last_value() {
    let doc = Document::parse(r#"{"x": 1, "X": 2, "x": 3}"#);
    let root = doc.root();
    assert_eq!(doc.len(root), 1);
    assert_eq!(doc.int_or(doc.find_member(root, "X").unwrap(), 0), 3);
}

#[rstest]
fn clip_trailing_keeps_the_first_item() {
    let opts = ParseOptions::strict().with_clip_trailing(true);
    let doc = Document::parse_with("{\"a\": 1} leftover text", &opts);
    let root = doc.root();
    assert_eq!(doc.status(root), 0);
    assert_eq!(doc.int_or(doc.find_member(root, "a").unwrap(), 0), 1);
}

#[rstest]
fn step_limit_guards_against_runaway_input() {
    let opts = ParseOptions::strict().with_step_limit(Some(8));
    let doc = Document::parse_with(&"[".repeat(500), &opts);
    assert_eq!(doc.status(doc.root()), Fault::StepLimit.code());

    // the default budget comfortably covers real documents
    let deep = format!("{}1{}", "[".repeat(60), "]".repeat(60));
    let doc = Document::parse(&deep);
    assert_eq!(doc.status(doc.root()), 0);
}

#[rstest]
fn hostile_nesting_faults_instead_of_overflowing() {
    let doc = Document::parse(&"[".repeat(100_000));
    assert_eq!(doc.status(doc.root()), Fault::StepLimit.code());

    let objects = r#"{"k":"#.repeat(50_000);
    let doc = Document::parse(&objects);
    assert_eq!(doc.status(doc.root()), Fault::StepLimit.code());
}

#[rstest]
fn reparse_reuses_the_document() {
    let mut doc = Document::parse(r#"{"a": 1}"#);
    let root = doc.reparse("[null]", &ParseOptions::default());
    assert_eq!(root, doc.root());
    assert_eq!(doc.kind(root), NodeKind::Array);
    assert_eq!(doc.len(root), 1);
}

#[rstest]
fn unicode_escapes_decode() {
    let doc = Document::parse(r#""café 😀""#);
    assert_eq!(doc.str_or(doc.root(), ""), "café 😀");
}

#[rstest]
fn diagnostics_record_parse_faults() {
    let mut doc = Document::new();
    doc.enable_diagnostics();
    doc.reparse("{\"a\" 1}", &ParseOptions::default());
    let diag = doc.diagnostics().unwrap();
    assert_eq!(diag.count("parse"), 1);
    assert!(diag
        .messages()
        .iter()
        .any(|message| message.contains("line 1")));
}
