use tagtree::{Closing, Document, Error, NodeId, NodeType, ParseOptions};

fn parse(input: &str) -> Document {
    Document::parse(input).expect("parse")
}

fn first(doc: &Document) -> NodeId {
    doc.first_child(NodeId::ROOT).expect("first child")
}

#[test]
fn remove_child_keeping_grandchildren_splices_them_in_place() {
    let mut doc = parse("<div><a>1</a><span><b>2</b>3<i>4</i></span><c>5</c></div>");
    let div = first(&doc);
    let span = doc.children(div)[1];
    let grandchildren = doc.children(span).to_vec();

    doc.remove_child(div, span, true).unwrap();

    let names: Vec<&str> = doc
        .children(div)
        .iter()
        .map(|c| doc.name(*c).unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b", "#text", "i", "c"]);
    assert_eq!(&doc.children(div)[1..4], grandchildren.as_slice());
    assert!(doc.children(span).is_empty());
    assert_eq!(doc.parent(span), None);
    assert_eq!(doc.depth(grandchildren[0]), Some(2));
    assert_eq!(
        doc.to_html().unwrap(),
        "<div><a>1</a><b>2</b>3<i>4</i><c>5</c></div>"
    );
}

#[test]
fn remove_child_without_grandchildren_drops_the_subtree() {
    let mut doc = parse("<div><span><b>2</b></span>x</div>");
    let div = first(&doc);
    let span = doc.first_child(div).unwrap();
    doc.remove_child(div, span, false).unwrap();
    assert_eq!(doc.to_html().unwrap(), "<div>x</div>");
    assert_eq!(doc.outer_html(span).unwrap(), "<span><b>2</b></span>");
    assert_eq!(
        doc.remove_child(div, span, false),
        Err(Error::NotAChild {
            parent: div,
            node: span
        })
    );
}

#[test]
fn insert_before_and_after_reference() {
    let mut doc = parse("<ul><li>b</li></ul>");
    let ul = first(&doc);
    let b = doc.first_child(ul).unwrap();
    let a = doc.create_element("li");
    let a_text = doc.create_text_node("a");
    doc.append_child(a, a_text).unwrap();
    let c = doc.clone_node(a, true).unwrap();
    doc.set_text(doc.first_child(c).unwrap(), "c").unwrap();

    doc.insert_before(ul, a, b).unwrap();
    doc.insert_after(ul, c, b).unwrap();
    assert_eq!(doc.to_html().unwrap(), "<ul><li>a</li><li>b</li><li>c</li></ul>");

    // no-op when the new node is the reference
    doc.insert_after(ul, b, b).unwrap();
    assert_eq!(doc.children(ul), &[a, b, c]);
}

#[test]
fn moving_a_node_detaches_it_first() {
    let mut doc = parse("<p id=x>1</p><div></div>");
    let p = first(&doc);
    let div = doc.last_child(NodeId::ROOT).unwrap();
    doc.append_child(div, p).unwrap();
    assert_eq!(doc.children(NodeId::ROOT), &[div]);
    assert_eq!(doc.parent(p), Some(div));
    assert_eq!(doc.to_html().unwrap(), "<div><p id=x>1</p></div>");
    assert_eq!(doc.get_element_by_id("x").unwrap(), Some(p));
}

#[test]
fn prepend_children_keeps_order() {
    let mut doc = parse("<div><i>z</i></div>");
    let div = first(&doc);
    let x = doc.create_text_node("x");
    let y = doc.create_comment("y");
    doc.prepend_children(div, &[x, y]).unwrap();
    assert_eq!(doc.to_html().unwrap(), "<div>x<!--y--><i>z</i></div>");
}

#[test]
fn replace_child_returns_the_old_node() {
    let mut doc = parse("<div><old>o</old></div>");
    let div = first(&doc);
    let old = doc.first_child(div).unwrap();
    let new = doc.create_element("new");
    assert_eq!(doc.replace_child(div, new, old), Ok(old));
    assert_eq!(doc.to_html().unwrap(), "<div><new></new></div>");
    assert!(!doc.is_attached(old));
}

#[test]
fn structural_misuse_is_rejected() {
    let mut doc = parse("<div><p>x</p></div>");
    let div = first(&doc);
    let p = doc.first_child(div).unwrap();
    let text = doc.first_child(p).unwrap();
    assert!(matches!(doc.append_child(p, div), Err(Error::InvalidArgument(_))));
    assert!(matches!(doc.append_child(text, p), Err(Error::InvalidArgument(_))));
    assert!(matches!(doc.remove(NodeId::ROOT), Err(Error::InvalidArgument(_))));
    assert!(matches!(doc.clone_node(NodeId::ROOT, true), Err(Error::InvalidArgument(_))));
    assert!(matches!(doc.set_attribute(div, "", "v"), Err(Error::InvalidArgument(_))));
    assert!(matches!(doc.set_attribute(text, "a", "v"), Err(Error::InvalidArgument(_))));
    assert!(matches!(doc.set_comment(text, "c"), Err(Error::InvalidArgument(_))));
    let big = parse(&"<i>".repeat(20));
    let foreign = big.descendants(NodeId::ROOT).last().unwrap().unwrap();
    assert!(foreign.index() >= doc.node_count());
    assert_eq!(doc.remove(foreign), Err(Error::UnknownNode(foreign)));
    assert_eq!(doc.to_html().unwrap(), "<div><p>x</p></div>");
}

#[test]
fn set_inner_html_replaces_children() {
    let mut doc = parse("<div id=d><p>old</p></div>");
    let div = first(&doc);
    doc.set_inner_html(div, "<b id=new>bold</b> and <i>more").unwrap();
    // imported nodes are regenerated; the auto-closed <i> stays without an end tag
    assert_eq!(doc.inner_html(div).unwrap(), r#"<b id="new">bold</b> and <i>more"#);
    let b = doc.first_child(div).unwrap();
    assert_eq!(doc.depth(b), Some(2));
    assert_eq!(doc.get_element_by_id("new").unwrap(), Some(b));

    doc.set_inner_html(div, "").unwrap();
    assert!(!doc.has_children(div));
    assert_eq!(doc.to_html().unwrap(), r#"<div id="d"></div>"#);
}

#[test]
fn set_inner_html_respects_depth_limit() {
    let mut doc = Document::parse_with("<a><b></b></a>", ParseOptions::default().with_max_depth(3)).unwrap();
    let a = first(&doc);
    let b = doc.first_child(a).unwrap();
    assert_eq!(
        doc.set_inner_html(b, "<c><d></d></c>"),
        Err(Error::DepthLimit { max: 3 })
    );
    assert_eq!(doc.to_html().unwrap(), "<a><b></b></a>");
    doc.set_inner_html(b, "<c></c>").unwrap();
    assert_eq!(doc.to_html().unwrap(), "<a><b><c></c></b></a>");
}

#[test]
fn clone_node_copies_closing_state_and_attributes() {
    let mut doc = parse(r#"<div class="k">x</div end="1"><br/>"#);
    let div = first(&doc);
    let br = doc.last_child(NodeId::ROOT).unwrap();
    let shallow = doc.clone_node(div, false).unwrap();
    let deep = doc.clone_node(div, true).unwrap();
    let br_copy = doc.clone_node(br, false).unwrap();

    assert!(doc.children(shallow).is_empty());
    assert_eq!(doc.attribute_value(shallow, "class"), Some("k"));
    assert_eq!(doc.outer_html(deep).unwrap(), r#"<div class="k">x</div end="1">"#);
    assert_eq!(doc.closing(br_copy), Some(&Closing::SelfClosing));
    assert_eq!(doc.outer_html(br_copy).unwrap(), "<br />");
    assert!(!doc.is_attached(deep));
}

#[test]
fn copy_from_takes_attributes_and_children() {
    let mut doc = parse(r#"<p id=src class=a>one <b>two</b></p><p id=dst>gone</p>"#);
    let src = first(&doc);
    let dst = doc.last_child(NodeId::ROOT).unwrap();
    doc.copy_from(dst, src, true).unwrap();
    assert_eq!(
        doc.outer_html(dst).unwrap(),
        r#"<p id="src" class="a">one <b>two</b></p>"#
    );
    // the later holder of a shared id wins
    assert_eq!(doc.get_element_by_id("src").unwrap(), Some(dst));
    assert_eq!(doc.get_element_by_id("dst").unwrap(), None);
}

#[test]
fn remove_all_clears_children_and_attributes() {
    let mut doc = parse(r#"<div id=a class=b>x<i>y</i></div c=d>"#);
    let div = first(&doc);
    doc.remove_all(div).unwrap();
    assert_eq!(doc.to_html().unwrap(), "<div></div>");
    assert_eq!(doc.get_element_by_id("a").unwrap(), None);
}

#[test]
fn text_and_comment_edits() {
    let mut doc = parse("<p>x<!--c--></p>");
    let p = first(&doc);
    let text = doc.first_child(p).unwrap();
    let comment = doc.last_child(p).unwrap();
    doc.set_text(text, "y").unwrap();
    doc.set_comment(comment, " note ").unwrap();
    assert_eq!(doc.node_type(comment), Some(NodeType::Comment));
    assert_eq!(doc.to_html().unwrap(), "<p>y<!-- note --></p>");
    assert!(matches!(doc.set_text(p, "z"), Err(Error::InvalidArgument(_))));
}

#[test]
fn edits_mark_ancestors_changed_only() {
    let mut doc = parse("<a><b>x</b></a><c>y</c>");
    let a = first(&doc);
    let b = doc.first_child(a).unwrap();
    let c = doc.last_child(NodeId::ROOT).unwrap();
    doc.set_attribute(b, "k", "v").unwrap();
    for (id, changed) in [(NodeId::ROOT, true), (a, true), (b, true), (c, false)] {
        assert_eq!(doc.get(id).unwrap().is_changed(), changed, "node {id}");
    }
    assert_eq!(doc.to_html().unwrap(), r#"<a><b k="v">x</b></a><c>y</c>"#);
}

#[test]
fn setting_the_same_value_is_a_no_op() {
    let mut doc = parse("<p class=a>x</p>");
    let p = first(&doc);
    doc.set_attribute(p, "CLASS", "a").unwrap();
    assert!(!doc.get(p).unwrap().is_changed());
    assert_eq!(doc.to_html().unwrap(), "<p class=a>x</p>");
}
