use rstest::rstest;

use jsonflex::{parse_flex, Document, Fault, GrammarMode, NodeKind, ParseOptions};

#[rstest]
fn full_flex_superset() {
    let doc = parse_flex(
        "{\n  // config for the demo\n  host: localhost,\n  'port': 8080,\n  /* block */ debug: true,\n  extras: [a, b,],\n}",
    );
    let root = doc.root();
    assert_eq!(doc.status(root), 0);
    assert_eq!(doc.str_at("host", ""), "localhost");
    assert_eq!(doc.int_at("port", 0), 8080);
    assert!(doc.bool_at("debug", false));
    assert_eq!(doc.len(doc.resolve("extras").unwrap()), 2);
    assert_eq!(doc.str_at("extras.1", ""), "b");
}

#[rstest]
fn literal_keywords_are_case_insensitive() {
    let doc = parse_flex("[Null, TRUE, fAlSe]");
    let root = doc.root();
    assert_eq!(doc.kind(doc.at(root, 0).unwrap()), NodeKind::Null);
    assert!(doc.bool_or(doc.at(root, 1).unwrap(), false));
    assert!(!doc.bool_or(doc.at(root, 2).unwrap(), true));
}

#[rstest]
fn blank_as_null() {
    let doc = parse_flex("{a:, b: 2}");
    assert_eq!(doc.kind(doc.resolve("a").unwrap()), NodeKind::Null);

    let doc = parse_flex("[,1,,2,]");
    let root = doc.root();
    assert_eq!(doc.len(root), 4);
    assert_eq!(doc.kind(doc.at(root, 0).unwrap()), NodeKind::Null);
    assert_eq!(doc.kind(doc.at(root, 2).unwrap()), NodeKind::Null);

    let doc = parse_flex("   ");
    assert_eq!(doc.status(doc.root()), 0);
    assert_eq!(doc.kind(doc.root()), NodeKind::Null);
}

#[rstest]
fn switches_toggle_independently() {
    let comments_only = ParseOptions::new().with_mode(GrammarMode::Flex {
        single_quotes: false,
        comments: true,
        barewords: false,
    });
    let doc = Document::parse_with("// ok\n[1]", &comments_only);
    assert_eq!(doc.status(doc.root()), 0);

    let doc = Document::parse_with("'nope'", &comments_only);
    assert_eq!(doc.status(doc.root()), Fault::BadLiteral.code());

    let doc = Document::parse_with("{bare: 1}", &comments_only);
    assert_eq!(doc.status(doc.root()), Fault::KeyNotString.code());

    let quotes_only = ParseOptions::new().with_mode(GrammarMode::Flex {
        single_quotes: true,
        comments: false,
        barewords: false,
    });
    let doc = Document::parse_with("'fine'", &quotes_only);
    assert_eq!(doc.str_or(doc.root(), ""), "fine");

    let doc = Document::parse_with("// no\n1", &quotes_only);
    assert_eq!(doc.status(doc.root()), Fault::BadLiteral.code());
}

#[rstest]
fn barewords_stay_strings_unless_they_read_as_numbers() {
    let doc = parse_flex("[version-2, 1.5, -0.5, 007, 1.2.3]");
    let root = doc.root();
    assert_eq!(doc.kind(doc.at(root, 0).unwrap()), NodeKind::String);
    assert_eq!(doc.kind(doc.at(root, 1).unwrap()), NodeKind::Number);
    assert_eq!(doc.kind(doc.at(root, 2).unwrap()), NodeKind::Number);
    assert_eq!(doc.kind(doc.at(root, 3).unwrap()), NodeKind::Number);
    assert_eq!(doc.kind(doc.at(root, 4).unwrap()), NodeKind::String);
}

#[rstest]
fn single_quoted_strings_handle_escapes() {
    let doc = parse_flex(r#"['it\'s', 'tab\there']"#);
    let root = doc.root();
    assert_eq!(doc.str_or(doc.at(root, 0).unwrap(), ""), "it's");
    assert_eq!(doc.str_or(doc.at(root, 1).unwrap(), ""), "tab\there");
}

#[rstest]
fn unterminated_block_comment_runs_to_the_end() {
    let doc = parse_flex("[1, 2] /* dangling");
    assert_eq!(doc.status(doc.root()), 0);
    assert_eq!(doc.len(doc.root()), 2);
}

#[rstest]
fn comment_before_value_keeps_the_value() {
    let doc = parse_flex("{a: /* inline */ 1}");
    assert_eq!(doc.int_at("a", 0), 1);
}
