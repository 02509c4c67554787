use doctree::{
    ingest, render_html, render_markdown, ConvertOptions, DocumentConverter, ElementFilter, Error,
    ExportFormat, HtmlImport, HtmlParser, ListAttrs, Node, NodeEntry, NodeKind, Registry,
    SourceFormat, StructuralError, TableCellAttrs, TextFormat, Theme, Tree,
};

fn paragraph(children: Vec<Node>) -> Node {
    Node::build(NodeKind::Paragraph, children).unwrap()
}

fn item(children: Vec<Node>) -> Node {
    Node::build(NodeKind::ListItem, children).unwrap()
}

fn cell(header: bool, col_span: u32, text: &str) -> Node {
    let attrs = TableCellAttrs {
        header,
        col_span,
        row_span: 1,
    };
    Node::build(NodeKind::TableCell(attrs), vec![paragraph(vec![Node::text(text)])]).unwrap()
}

/// Trees covering every variant and the interesting attribute values
fn sample_trees() -> Vec<Tree> {
    let heading = Node::build(NodeKind::heading(3), vec![Node::text("Section")]).unwrap();
    let empty_heading = Node::build(NodeKind::heading(6), vec![]).unwrap();
    let marks = paragraph(vec![
        Node::text("plain "),
        Node::formatted_text("bold", TextFormat::BOLD),
        Node::formatted_text(" both ", TextFormat::BOLD | TextFormat::ITALIC),
        Node::formatted_text("x<y & z", TextFormat::CODE),
        Node::line_break(),
        Node::formatted_text("gone", TextFormat::UNDERLINE | TextFormat::STRIKETHROUGH),
        Node::formatted_text("2", TextFormat::SUPERSCRIPT | TextFormat::HIGHLIGHT),
    ]);
    let quote = Node::build(
        NodeKind::Quote,
        vec![Node::text("said"), Node::line_break(), Node::text("twice")],
    )
    .unwrap();

    let inner = Node::build(
        NodeKind::List(ListAttrs {
            ordered: true,
            start: 1,
        }),
        vec![item(vec![Node::text("one")])],
    )
    .unwrap();
    let list = Node::build(
        NodeKind::List(ListAttrs {
            ordered: true,
            start: 5,
        }),
        vec![
            item(vec![Node::text("five"), inner]),
            item(vec![Node::formatted_text("six", TextFormat::ITALIC)]),
        ],
    )
    .unwrap();

    let header_row =
        Node::build(NodeKind::TableRow, vec![cell(true, 2, "Head")]).unwrap();
    let body_row =
        Node::build(NodeKind::TableRow, vec![cell(false, 1, "a"), cell(false, 1, "b")]).unwrap();
    let table = Node::build(NodeKind::Table, vec![header_row, body_row]).unwrap();

    let build = |children| Tree::new(Node::build(NodeKind::Root, children).unwrap()).unwrap();
    vec![
        Tree::empty(),
        build(vec![heading, marks]),
        build(vec![empty_heading, quote]),
        build(vec![list]),
        build(vec![table]),
    ]
}

fn converters() -> Vec<DocumentConverter> {
    vec![
        DocumentConverter::new(),
        DocumentConverter::with_registry(Registry::new(), ConvertOptions::default()),
        DocumentConverter::with_options(ConvertOptions {
            theme: Theme::empty(),
            ..ConvertOptions::default()
        }),
    ]
}

#[test]
fn test_html_round_trip_is_stable() {
    for converter in converters() {
        for tree in sample_trees() {
            let html = converter.export(tree.deep_clone(), ExportFormat::Html).unwrap();
            let reparsed = HtmlParser::new(converter.registry()).parse(&html).unwrap();
            let again = converter.export(reparsed, ExportFormat::Html).unwrap();
            assert_eq!(again, html);
        }
    }
}

#[test]
fn test_round_trip_preserves_structure() {
    let converter = DocumentConverter::new();
    for tree in sample_trees() {
        let html = converter.export(tree.deep_clone(), ExportFormat::Html).unwrap();
        let reparsed = HtmlParser::new(converter.registry()).parse(&html).unwrap();
        assert!(reparsed.same_structure(&tree), "structure changed for {html}");
    }
}

#[test]
fn test_ingest_is_idempotent() {
    let inputs = [
        "<h1>Title</h1><p><b>Hello</b> world</p>",
        "<div><p>wrapped</p><ul><li>a<ul><li>b</li></ul></li><li>c</li></ul></div>",
        "<blockquote><p>one</p><p>two</p></blockquote>",
        "<table><tbody><tr><th>h</th></tr><tr><td>d</td></tr></tbody></table>",
        "loose <em>text</em>",
    ];
    for input in inputs {
        let first = ingest(input, SourceFormat::Html).unwrap();
        let html = render_html(&first).unwrap();
        let second = ingest(&html, SourceFormat::Html).unwrap();
        assert_eq!(first, second, "not idempotent for {input}");
    }
}

#[test]
fn test_markdown_is_total() {
    let converter = DocumentConverter::new();
    for tree in sample_trees() {
        let expected_empty = tree.is_empty();
        let markdown = converter.export(tree, ExportFormat::Markdown).unwrap();
        assert_eq!(markdown.is_empty(), expected_empty);
        assert_eq!(markdown, markdown.trim());
        assert!(!markdown.contains("\n\n\n"));
    }
}

#[test]
fn test_format_flags_compose() {
    let json = ingest("<p><b><i><s>x</s></i></b></p>", SourceFormat::Html).unwrap();
    let tree = Tree::from_json(&json).unwrap();
    let run = tree.descendants().find_map(|n| n.as_text()).unwrap();
    assert_eq!(
        run.format,
        TextFormat::BOLD | TextFormat::ITALIC | TextFormat::STRIKETHROUGH
    );
    assert!(json.contains(r#""format":7"#));
    assert_eq!(render_markdown(&json).unwrap(), "***~~x~~***");
}

#[test]
fn test_override_is_isolated() {
    let mut custom = DocumentConverter::with_registry(Registry::new(), ConvertOptions::default());
    custom
        .override_node(
            "quote",
            NodeEntry::new(NodeKind::Quote, |node, writer| {
                writer.element("aside", &[], node)
            }),
        )
        .unwrap();
    let plain = DocumentConverter::with_registry(Registry::new(), ConvertOptions::default());

    let json = ingest("<blockquote>q</blockquote><p>p</p>", SourceFormat::Html).unwrap();
    let custom_html = custom.render_html(&json).unwrap();
    let plain_html = plain.render_html(&json).unwrap();

    assert!(custom_html.starts_with("<aside><span>q</span></aside>"));
    assert!(plain_html.starts_with("<blockquote>"));
    // Everything outside the overridden tag is identical
    assert_eq!(
        custom_html.split_once("</aside>").map(|(_, rest)| rest),
        plain_html.split_once("</blockquote>").map(|(_, rest)| rest)
    );
}

#[test]
fn test_table_override_leaves_other_nodes_unchanged() {
    let heading = Node::build(NodeKind::heading(2), vec![Node::text("Totals")]).unwrap();
    let list = Node::build(
        NodeKind::List(ListAttrs {
            ordered: false,
            start: 1,
        }),
        vec![item(vec![Node::text("north")]), item(vec![Node::text("south")])],
    )
    .unwrap();
    let row = Node::build(
        NodeKind::TableRow,
        vec![cell(true, 1, "Region"), cell(true, 1, "Sum")],
    )
    .unwrap();
    let table = Node::build(NodeKind::Table, vec![row]).unwrap();
    let root = Node::build(NodeKind::Root, vec![heading, list, table]).unwrap();
    let tree = Tree::new(root).unwrap();

    let plain = DocumentConverter::with_registry(Registry::new(), ConvertOptions::default())
        .export(tree.deep_clone(), ExportFormat::Html)
        .unwrap();
    let wrapped = DocumentConverter::new().export(tree, ExportFormat::Html).unwrap();

    let opening = r#"<div class="ExampleEditorTheme__tableScrollableWrapper">"#;
    assert!(wrapped.contains(opening));
    assert!(!plain.contains("<div"));
    assert_eq!(wrapped.replace(opening, "").replace("</div>", ""), plain);
}

#[test]
fn test_heading_and_bold_scenario() {
    let heading = Node::build(NodeKind::heading(1), vec![Node::text("Title")]).unwrap();
    let body = paragraph(vec![Node::formatted_text("Hello", TextFormat::BOLD)]);
    let tree = Tree::new(Node::build(NodeKind::Root, vec![heading, body]).unwrap()).unwrap();

    let converter = DocumentConverter::new();
    assert_eq!(
        converter.export(tree.deep_clone(), ExportFormat::Markdown).unwrap(),
        "# Title\n\n**Hello**"
    );
    assert_eq!(
        converter.export(tree, ExportFormat::Html).unwrap(),
        r#"<h1 class="glyf-editor-h1"><span>Title</span></h1><p><strong class="glyf-editor-bold">Hello</strong></p>"#
    );
}

#[test]
fn test_malformed_table_markup() {
    for markup in [
        "<table>text<tr><td>x</td></tr></table>",
        "<tr><td>x</td></tr>",
        "<table><tr>y<td>x</td></tr></table>",
    ] {
        let result = ingest(markup, SourceFormat::Html);
        assert!(
            matches!(result, Err(Error::Structural(StructuralError::DisallowedChild { .. }))),
            "expected structural error for {markup}"
        );
    }
}

#[test]
fn test_unknown_tag_becomes_text() {
    let json = ingest("<foo>bar</foo>", SourceFormat::Html).unwrap();
    assert_eq!(render_markdown(&json).unwrap(), "bar");
    assert_eq!(render_html(&json).unwrap(), "<p><span>bar</span></p>");
}

#[test]
fn test_markdown_ingest_to_markdown() {
    let source = "## Plan\n\n- first\n- second\n\n> quoted\n\nSome *italic* and `code`";
    let json = ingest(source, SourceFormat::Markdown).unwrap();
    assert_eq!(render_markdown(&json).unwrap(), source);
}

#[test]
fn test_unknown_type_in_stored_json() {
    let json = r#"{"root":{"type":"root","children":[{"type":"callout"}]}}"#;
    assert!(matches!(render_html(json), Err(Error::UnknownType(tag)) if tag == "callout"));
}

#[test]
fn test_registered_entry_imports_new_element() {
    let mut converter = DocumentConverter::new();
    converter.register(
        "callout",
        NodeEntry::new(NodeKind::Quote, |node, writer| writer.children(node))
            .with_html_import(ElementFilter::tag("aside"), |_| {
                Some(HtmlImport::Node(NodeKind::Quote))
            }),
    );
    let tree = converter
        .ingest_tree("<aside>note</aside>", SourceFormat::Html)
        .unwrap();
    assert_eq!(tree.root().children()[0].type_tag(), "quote");
    assert_eq!(converter.export(tree, ExportFormat::Markdown).unwrap(), "> note");

    // Saving and rendering go through the quote entry, not the alias
    let json = converter.ingest("<aside>note</aside>", SourceFormat::Html).unwrap();
    assert!(json.contains(r#""type":"quote""#));
    assert!(!json.contains("callout"));
    assert!(converter.render_html(&json).unwrap().starts_with("<blockquote"));
}

#[test]
fn test_ingested_list_start_at_u32_max() {
    let json = ingest(
        r#"<ol start="4294967295"><li>a</li><li>b</li></ol>"#,
        SourceFormat::Html,
    )
    .unwrap();
    assert_eq!(render_markdown(&json).unwrap(), "4294967295. a\n4294967296. b");
}
