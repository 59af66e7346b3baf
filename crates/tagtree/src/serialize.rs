//! HTML and XML output.
//!
//! Unchanged parsed nodes are copied out of the source buffer when the output
//! options leave markup untouched; everything else is regenerated from the
//! node records. The walk runs on an explicit stack bounded by `max_depth`.

use crate::attributes::{Attribute, Attributes};
use crate::config::OutputOptions;
use crate::document::{Document, is_doctype_markup};
use crate::entities;
use crate::error::{Error, Result};
use crate::node::{Closing, CommentKind, ElementData, Node, NodeData};
use crate::types::{NodeId, QuoteStyle};
use std::fmt::{self, Write};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
const SHELL_OPEN: &str = concat!(
    r#"<html xmlns="http://www.w3.org/1999/xhtml"><head>"#,
    r#"<meta http-equiv="Content-Type" content="text/html; charset=utf-8" />"#,
    "</head><body>",
);
const SHELL_CLOSE: &str = "</body></html>";
/// Root element for XML output with several top-level nodes.
const XML_WRAPPER: &str = "span";
const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

enum Step {
    Enter(NodeId, usize),
    Close(NodeId),
}

struct Serializer<'a, W> {
    doc: &'a Document,
    options: &'a OutputOptions,
    out: &'a mut W,
}

impl<'a, W: Write> Serializer<'a, W> {
    fn new(doc: &'a Document, out: &'a mut W) -> Self {
        Self {
            doc,
            options: &doc.output,
            out,
        }
    }

    fn document(&mut self) -> Result<()> {
        let xml = self.options.is_xml();
        if xml {
            self.out.write_str(XML_DECLARATION)?;
        }
        if self.options.wrap_document {
            self.out.write_str(SHELL_OPEN)?;
            self.document_content()?;
            self.out.write_str(SHELL_CLOSE)?;
        } else if xml && self.needs_xml_wrapper() {
            write!(self.out, "<{XML_WRAPPER}>")?;
            self.document_content()?;
            write!(self.out, "</{XML_WRAPPER}>")?;
        } else {
            self.document_content()?;
        }
        Ok(())
    }

    /// An unedited document is its source, stray end tags included.
    fn document_content(&mut self) -> Result<()> {
        let doc = self.doc;
        if self.options.preserves_source() && !doc.node(NodeId::ROOT).changed {
            self.out.write_str(doc.source())?;
            return Ok(());
        }
        self.children(NodeId::ROOT)
    }

    fn needs_xml_wrapper(&self) -> bool {
        let doc = self.doc;
        let mut elements = 0;
        for child in doc.children(NodeId::ROOT) {
            match &doc.node(*child).data {
                NodeData::Element(_) => elements += 1,
                NodeData::Text(content) if !doc.content(content).trim().is_empty() => return true,
                _ => {}
            }
        }
        elements > 1
    }

    fn children(&mut self, parent: NodeId) -> Result<()> {
        let doc = self.doc;
        for child in doc.children(parent) {
            self.subtree(*child)?;
        }
        Ok(())
    }

    fn can_slice(&self, node: &Node) -> bool {
        self.options.preserves_source()
            && !node.changed
            && node.outer.is_some()
            && node
                .as_element()
                .is_none_or(|el| el.is_closed() || node.children.is_empty())
    }

    fn subtree(&mut self, root: NodeId) -> Result<()> {
        let doc = self.doc;
        let max = doc.options.max_depth;
        let mut stack = vec![Step::Enter(root, 0)];
        while let Some(step) = stack.pop() {
            let (id, level) = match step {
                Step::Enter(id, level) => (id, level),
                Step::Close(id) => {
                    self.end_tag(id)?;
                    continue;
                }
            };
            let node = doc.node(id);
            if node.exceeds_depth(level, max) {
                return Err(Error::DepthLimit { max });
            }
            if self.can_slice(node) {
                if let Some(span) = node.outer {
                    self.out.write_str(doc.source.slice(span))?;
                    continue;
                }
            }
            match &node.data {
                NodeData::Document => {
                    stack.extend(node.children.iter().rev().map(|c| Step::Enter(*c, level + 1)));
                }
                NodeData::Element(el) => {
                    self.start_tag(node, el)?;
                    if node.children.is_empty() {
                        self.childless_end(node, el)?;
                    } else {
                        self.out.write_char('>')?;
                        stack.push(Step::Close(id));
                        stack.extend(node.children.iter().rev().map(|c| Step::Enter(*c, level + 1)));
                    }
                }
                NodeData::Text(content) => self.text(node, doc.content(content))?,
                NodeData::Comment { payload, kind } => self.comment(doc.content(payload), *kind)?,
            }
        }
        Ok(())
    }

    // ========== elements ==========

    fn start_tag(&mut self, node: &Node, el: &ElementData) -> Result<()> {
        self.out.write_char('<')?;
        self.element_name(el)?;
        self.attributes(&el.attributes)?;
        if self.options.debugging_attributes {
            let doc = self.doc;
            write!(
                self.out,
                r#" _closed="{}" _children="{}""#,
                el.is_closed(),
                node.children.len()
            )?;
            for (i, child) in node.children.iter().enumerate() {
                write!(self.out, r#" _child_{i}="{}""#, doc.node(*child).name())?;
            }
        }
        Ok(())
    }

    fn childless_end(&mut self, node: &Node, el: &ElementData) -> Result<()> {
        if self.options.is_xml() {
            self.out.write_str(" />")?;
            return Ok(());
        }
        match &el.closing {
            Closing::SelfClosing if el.empty_syntax || self.options.write_empty_nodes => {
                self.out.write_str(" />")?;
            }
            Closing::EndTag(end) if !end.synthetic => {
                self.out.write_char('>')?;
                self.closing_tag(node, el)?;
            }
            _ => self.out.write_char('>')?,
        }
        Ok(())
    }

    /// End tag of an element whose children were written.
    fn end_tag(&mut self, id: NodeId) -> Result<()> {
        let doc = self.doc;
        let node = doc.node(id);
        let Some(el) = node.as_element() else {
            return Ok(());
        };
        let written = self.options.is_xml()
            || match &el.closing {
                Closing::EndTag(end) => !end.synthetic,
                Closing::SelfClosing => true,
                Closing::Open => false,
            };
        if written {
            self.closing_tag(node, el)?;
        }
        Ok(())
    }

    /// Writes `</name>`. In HTML an end tag that carried attributes gets
    /// them back, followed by the debugging attributes when enabled.
    fn closing_tag(&mut self, node: &Node, el: &ElementData) -> Result<()> {
        self.out.write_str("</")?;
        self.element_name(el)?;
        if !self.options.is_xml() {
            if let Closing::EndTag(end) = &el.closing {
                if !end.attributes.is_empty() {
                    self.attributes(&end.attributes)?;
                    if self.options.debugging_attributes {
                        write!(
                            self.out,
                            r#" _closed="{}" _children="{}""#,
                            el.is_closed(),
                            node.children.len()
                        )?;
                    }
                }
            }
        }
        self.out.write_char('>')?;
        Ok(())
    }

    fn element_name(&mut self, el: &ElementData) -> Result<()> {
        let name = if self.options.original_case {
            el.original_name()
        } else {
            el.name()
        };
        self.name(name)
    }

    fn name(&mut self, name: &str) -> Result<()> {
        let upper = self.options.upper_case;
        if self.options.is_xml() {
            write_xml_name(&mut *self.out, name, upper)?;
        } else if upper {
            for ch in name.chars() {
                self.out.write_char(ch.to_ascii_uppercase())?;
            }
        } else {
            self.out.write_str(name)?;
        }
        Ok(())
    }

    // ========== attributes ==========

    fn attributes(&mut self, attributes: &Attributes) -> Result<()> {
        for attribute in attributes {
            self.attribute(attribute)?;
        }
        Ok(())
    }

    fn attribute(&mut self, attr: &Attribute) -> Result<()> {
        let Some(value) = attr.value() else {
            return Ok(());
        };
        let xml = self.options.is_xml();
        if attr.is_directive() {
            if !xml {
                write!(self.out, " {}", attr.original_name())?;
            }
            return Ok(());
        }
        self.out.write_char(' ')?;
        let name = if self.options.original_case {
            attr.original_name()
        } else {
            attr.name()
        };
        self.name(name)?;

        if xml {
            self.out.write_str("=\"")?;
            write_xml_escaped(&mut *self.out, value, true)?;
            self.out.write_char('"')?;
            return Ok(());
        }
        if attr.quote() == QuoteStyle::Bare && value.is_empty() {
            return Ok(());
        }
        if self.options.optimize_attribute_values && can_drop_quotes(value) {
            write!(self.out, "={value}")?;
            return Ok(());
        }
        match attr.quote() {
            QuoteStyle::Single => {
                self.out.write_str("='")?;
                write_replacing(&mut *self.out, value, '\'', "&#39;")?;
                self.out.write_char('\'')?;
            }
            QuoteStyle::Double | QuoteStyle::Bare => {
                self.out.write_str("=\"")?;
                if value.starts_with('@') {
                    self.out.write_str(value)?;
                } else {
                    write_replacing(&mut *self.out, value, '"', "&quot;")?;
                }
                self.out.write_char('"')?;
            }
        }
        Ok(())
    }

    // ========== character data ==========

    fn text(&mut self, node: &Node, text: &str) -> Result<()> {
        if !self.options.is_xml() {
            self.out.write_str(text)?;
            return Ok(());
        }
        let doc = self.doc;
        let raw = node
            .parent
            .and_then(|p| doc.element_data(p))
            .is_some_and(|el| doc.options.elements.is_raw_text(el.name()));
        if raw {
            self.out.write_str(CDATA_OPEN)?;
            let mut parts = text.split(CDATA_CLOSE);
            if let Some(first) = parts.next() {
                self.out.write_str(first)?;
            }
            for part in parts {
                // Split `]]>` across two sections.
                write!(self.out, "]]{CDATA_CLOSE}{CDATA_OPEN}>{part}")?;
            }
            self.out.write_str(CDATA_CLOSE)?;
        } else {
            write_xml_escaped(&mut *self.out, text, false)?;
        }
        Ok(())
    }

    fn comment(&mut self, payload: &str, kind: CommentKind) -> Result<()> {
        match (kind, self.options.is_xml()) {
            (CommentKind::Comment, false) => write!(self.out, "<!--{payload}-->")?,
            (CommentKind::Declaration, false) => self.out.write_str(payload)?,
            (CommentKind::Comment, true) => write_xml_comment(&mut *self.out, payload)?,
            (CommentKind::Declaration, true) => {
                if is_doctype_markup(payload)
                    || payload.starts_with(CDATA_OPEN)
                    || payload.starts_with("<?")
                {
                    self.out.write_str(payload)?;
                } else {
                    let inner = payload.strip_prefix("<!").unwrap_or(payload);
                    let inner = inner.strip_suffix('>').unwrap_or(inner);
                    write_xml_comment(&mut *self.out, inner)?;
                }
            }
        }
        Ok(())
    }
}

/// Unquoted values must survive re-tokenizing as a single attribute value.
/// True when the tokenizer reads `value` back unchanged without quotes.
fn can_drop_quotes(value: &str) -> bool {
    !value.is_empty()
        && !value.ends_with('/')
        && !value.bytes().any(|b| {
            b.is_ascii_whitespace()
                || b.is_ascii_control()
                || matches!(b, b'"' | b'\'' | b'=' | b'<' | b'>')
        })
}

fn write_replacing<W: Write>(out: &mut W, value: &str, from: char, to: &str) -> fmt::Result {
    let mut parts = value.split(from);
    if let Some(first) = parts.next() {
        out.write_str(first)?;
    }
    for part in parts {
        out.write_str(to)?;
        out.write_str(part)?;
    }
    Ok(())
}

fn write_xml_name<W: Write>(out: &mut W, name: &str, upper: bool) -> fmt::Result {
    for (i, ch) in name.chars().enumerate() {
        let ch = if upper { ch.to_ascii_uppercase() } else { ch };
        if i == 0 && (ch.is_ascii_digit() || matches!(ch, '-' | '.')) {
            out.write_char('_')?;
        }
        let valid = ch.is_alphanumeric() || matches!(ch, '_' | ':' | '-' | '.');
        out.write_char(if valid { ch } else { '_' })?;
    }
    Ok(())
}

/// Escapes markup characters for XML. Character references that XML
/// understands are kept, known HTML names become numeric references and any
/// other `&` is escaped.
fn write_xml_escaped<W: Write>(out: &mut W, s: &str, in_attribute: bool) -> fmt::Result {
    let bytes = s.as_bytes();
    let mut pending = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let special = matches!(b, b'<' | b'>' | b'&') || (in_attribute && b == b'"');
        if !special {
            i += 1;
            continue;
        }
        out.write_str(&s[pending..i])?;
        let mut next = i + 1;
        match b {
            b'<' => out.write_str("&lt;")?,
            b'>' => out.write_str("&gt;")?,
            b'"' => out.write_str("&quot;")?,
            _ => match entities::reference_at(bytes, i) {
                Some((_, end)) if bytes[i + 1] == b'#' || entities::is_xml_predefined_at(bytes, i) => {
                    out.write_str(&s[i..end])?;
                    next = end;
                }
                Some((ch, end)) => {
                    write!(out, "&#{};", u32::from(ch))?;
                    next = end;
                }
                None => out.write_str("&amp;")?,
            },
        }
        i = next;
        pending = next;
    }
    out.write_str(&s[pending..])
}

/// `--` may not appear inside an XML comment, nor may it end in `-`.
fn write_xml_comment<W: Write>(out: &mut W, payload: &str) -> fmt::Result {
    out.write_str("<!--")?;
    let mut prev_dash = false;
    for ch in payload.chars() {
        if ch == '-' && prev_dash {
            out.write_char(' ')?;
        }
        out.write_char(ch)?;
        prev_dash = ch == '-';
    }
    if prev_dash {
        out.write_char(' ')?;
    }
    out.write_str("-->")
}

impl Document {
    /// The whole document, as configured by the document's output options.
    pub fn to_html(&self) -> Result<String> {
        let mut out = String::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        Serializer::new(self, out).document()
    }

    /// Markup of `node` including its own tags. For the document node this is
    /// [`to_html`](Document::to_html).
    pub fn outer_html(&self, node: NodeId) -> Result<String> {
        self.check(node)?;
        if node == NodeId::ROOT {
            return self.to_html();
        }
        let mut out = String::new();
        Serializer::new(self, &mut out).subtree(node)?;
        Ok(out)
    }

    /// Markup of the children of `node`. Text nodes give their text and
    /// comments their payload.
    pub fn inner_html(&self, node: NodeId) -> Result<String> {
        let n = self.check(node)?;
        let mut out = String::new();
        match &n.data {
            NodeData::Text(content) => out.push_str(self.content(content)),
            NodeData::Comment { payload, .. } => out.push_str(self.content(payload)),
            NodeData::Document => Serializer::new(self, &mut out).document_content()?,
            NodeData::Element(_) => {
                let mut serializer = Serializer::new(self, &mut out);
                match n.inner {
                    Some(span) if serializer.options.preserves_source() && !n.changed => {
                        serializer.out.write_str(self.source.slice(span))?;
                    }
                    _ => serializer.children(node)?,
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputMode, ParseOptions};

    fn parse(input: &str) -> Document {
        Document::parse(input).expect("parse")
    }

    fn first(doc: &Document) -> NodeId {
        doc.first_child(NodeId::ROOT).expect("first child")
    }

    fn with_output(mut doc: Document, output: OutputOptions) -> Document {
        doc.set_output_options(output);
        doc
    }

    #[test]
    fn unchanged_document_is_written_back_verbatim() {
        for input in [
            "",
            "plain text",
            "<div></span><p class=x>a<br/></div>",
            "<!DOCTYPE html><HTML><body onload='f()'>x</body></html>",
            "<div><span>unclosed",
            "<ul><li>1<li>2</ul></ul>",
            "<script>if (a < b) { x = '</p>'; }</script>",
            "a < b && c > d",
        ] {
            assert_eq!(parse(input).to_html().unwrap(), input, "input {input:?}");
        }
    }

    #[test]
    fn regenerated_element_keeps_attribute_quoting() {
        let mut doc = parse(r#"<div id="a" class='b' hidden data-x=y>x</div>"#);
        let div = first(&doc);
        doc.set_attribute(div, "class", "c").unwrap();
        assert_eq!(
            doc.to_html().unwrap(),
            r#"<div id="a" class='c' hidden data-x="y">x</div>"#
        );
    }

    #[test]
    fn untouched_siblings_keep_their_source_text() {
        let mut doc = parse("<p>one</p><p CLASS = 'z'>two</p >");
        let p = first(&doc);
        doc.set_attribute(p, "title", "t").unwrap();
        assert_eq!(
            doc.to_html().unwrap(),
            r#"<p title="t">one</p><p CLASS = 'z'>two</p >"#
        );
    }

    #[test]
    fn synthetic_closings_are_not_written() {
        let mut doc = parse("<div><span>text");
        let div = first(&doc);
        doc.set_attribute(div, "a", "1").unwrap();
        assert_eq!(doc.to_html().unwrap(), r#"<div a="1"><span>text"#);
    }

    #[test]
    fn open_element_with_children_is_regenerated() {
        let doc = parse("<div><p>a</div>");
        let p = doc.first_child(first(&doc)).unwrap();
        assert_eq!(doc.closing(p), Some(&Closing::Open));
        assert_eq!(doc.outer_html(p).unwrap(), "<p>a");
    }

    #[test]
    fn childless_elements_follow_their_closing() {
        let mut doc = Document::new();
        let br = doc.create_element("br");
        let p = doc.create_element("p");
        doc.append_children(NodeId::ROOT, &[br, p]).unwrap();
        assert_eq!(doc.to_html().unwrap(), "<br><p></p>");

        let doc = with_output(
            doc,
            OutputOptions {
                write_empty_nodes: true,
                ..OutputOptions::default()
            },
        );
        assert_eq!(doc.to_html().unwrap(), "<br /><p></p>");
    }

    #[test]
    fn self_closing_element_that_gains_children_gets_an_end_tag() {
        let mut doc = parse("<x/>");
        let x = first(&doc);
        let text = doc.create_text_node("y");
        doc.append_child(x, text).unwrap();
        assert_eq!(doc.to_html().unwrap(), "<x>y</x>");
    }

    #[test]
    fn closing_attributes_are_kept_in_html() {
        let mut doc = parse(r#"<div>x</div class="c">"#);
        let div = first(&doc);
        doc.set_attribute(div, "id", "d").unwrap();
        assert_eq!(doc.to_html().unwrap(), r#"<div id="d">x</div class="c">"#);
    }

    #[test]
    fn attribute_values_are_escaped_per_quote_style() {
        let mut doc = parse("<a></a>");
        let a = first(&doc);
        doc.set_attribute(a, "title", "say \"hi\"").unwrap();
        doc.set_attribute(a, "data-bind", "@\"raw\"").unwrap();
        doc.set_attribute(a, "alt", "it's").unwrap();
        doc.set_attribute_quote(a, "alt", QuoteStyle::Single).unwrap();
        doc.set_attribute_value(a, "gone", None).unwrap();
        assert_eq!(
            doc.to_html().unwrap(),
            r#"<a title="say &quot;hi&quot;" data-bind="@"raw"" alt='it&#39;s'></a>"#
        );
    }

    #[test]
    fn optimized_values_drop_quotes_without_whitespace() {
        let doc = with_output(
            parse(r#"<div id="a" class="b c" title="">x</div>"#),
            OutputOptions {
                optimize_attribute_values: true,
                ..OutputOptions::default()
            },
        );
        assert_eq!(
            doc.to_html().unwrap(),
            r#"<div id=a class="b c" title="">x</div>"#
        );
    }

    #[test]
    fn optimized_values_read_back_unchanged() {
        let optimize = OutputOptions {
            optimize_attribute_values: true,
            ..OutputOptions::default()
        };
        let values = ["a/", "x\u{c}y", "a<b", "bell\u{7}", "path/to", "@x"];
        for value in values {
            let mut doc = parse("<p></p>");
            let p = doc.first_child(NodeId::ROOT).unwrap();
            doc.set_attribute(p, "title", value).unwrap();
            doc.set_output_options(optimize.clone());
            let html = doc.to_html().unwrap();
            let back = parse(&html);
            let q = back.first_child(NodeId::ROOT).unwrap();
            assert_eq!(back.attribute_value(q, "title"), Some(value), "via {html:?}");
            assert!(
                matches!(back.closing(q), Some(Closing::EndTag(_))),
                "{html:?} lost its end tag"
            );
        }
        assert!(can_drop_quotes("path/to"));
        assert!(!can_drop_quotes("a/"));
    }

    #[test]
    fn name_case_options() {
        let input = r#"<Div Class="x">t</Div>"#;
        let upper = with_output(
            parse(input),
            OutputOptions {
                upper_case: true,
                ..OutputOptions::default()
            },
        );
        assert_eq!(upper.to_html().unwrap(), r#"<DIV CLASS="x">t</DIV>"#);
        let original = with_output(
            parse("<Div Class='x'>t</Div>"),
            OutputOptions {
                original_case: true,
                ..OutputOptions::default()
            },
        );
        assert_eq!(original.to_html().unwrap(), "<Div Class='x'>t</Div>");
    }

    #[test]
    fn debugging_attributes_describe_children() {
        let doc = with_output(
            parse("<ul><li>a</li></ul>"),
            OutputOptions {
                debugging_attributes: true,
                ..OutputOptions::default()
            },
        );
        assert_eq!(
            doc.to_html().unwrap(),
            concat!(
                r#"<ul _closed="true" _children="1" _child_0="li">"#,
                r##"<li _closed="true" _children="1" _child_0="#text">a</li></ul>"##
            )
        );
    }

    #[test]
    fn debugging_attributes_follow_closing_attributes() {
        let doc = with_output(
            parse(r#"<p>a</p data-end="1"><b></b>"#),
            OutputOptions {
                debugging_attributes: true,
                ..OutputOptions::default()
            },
        );
        assert_eq!(
            doc.to_html().unwrap(),
            concat!(
                r##"<p _closed="true" _children="1" _child_0="#text">a"##,
                r#"</p data-end="1" _closed="true" _children="1">"#,
                r#"<b _closed="true" _children="0"></b>"#
            )
        );
    }

    #[test]
    fn wrap_document_emits_shell() {
        let doc = with_output(
            parse("<p>x</p>"),
            OutputOptions {
                wrap_document: true,
                ..OutputOptions::default()
            },
        );
        assert_eq!(
            doc.to_html().unwrap(),
            format!("{SHELL_OPEN}<p>x</p>{SHELL_CLOSE}")
        );
    }

    #[test]
    fn xml_output_closes_and_escapes() {
        let doc = with_output(parse("<p>a & b <br></p>"), OutputOptions::xml());
        assert_eq!(
            doc.to_html().unwrap(),
            format!("{XML_DECLARATION}<p>a &amp; b <br /></p>")
        );
    }

    #[test]
    fn xml_output_wraps_multiple_roots() {
        let doc = with_output(parse("<a></a><b></b>"), OutputOptions::xml());
        assert_eq!(
            doc.to_html().unwrap(),
            format!("{XML_DECLARATION}<span><a /><b /></span>")
        );
        let single = with_output(parse(" <a>x</a> "), OutputOptions::xml());
        assert_eq!(
            single.to_html().unwrap(),
            format!("{XML_DECLARATION} <a>x</a> ")
        );
    }

    #[test]
    fn xml_output_converts_references() {
        let doc = with_output(
            parse("<p>&nbsp;&amp;&#65;&bogus;</p>"),
            OutputOptions::xml(),
        );
        assert_eq!(
            doc.to_html().unwrap(),
            format!("{XML_DECLARATION}<p>&#160;&amp;&#65;&amp;bogus;</p>")
        );
    }

    #[test]
    fn xml_raw_text_becomes_cdata() {
        let doc = with_output(
            parse("<script>if (a < b) { s = ']]>'; }</script>"),
            OutputOptions::xml(),
        );
        assert_eq!(
            doc.to_html().unwrap(),
            format!(
                "{XML_DECLARATION}<script><![CDATA[if (a < b) {{ s = ']]]]><![CDATA[>'; }}]]></script>"
            )
        );
    }

    #[test]
    fn xml_comments_and_declarations() {
        let doc = with_output(
            parse("<!DOCTYPE html><!-- a -- b --><!bogus><?pi x?>"),
            OutputOptions::xml(),
        );
        let out = doc.to_html().unwrap();
        assert!(out.starts_with(&format!("{XML_DECLARATION}<!DOCTYPE html>")));
        assert!(out.contains("<!-- a - - b -->"));
        assert!(out.contains("<!--bogus-->"));
        assert!(out.ends_with("<?pi x?>"));
    }

    #[test]
    fn xml_skips_directives_and_sanitizes_names() {
        let mut doc = with_output(parse("<p <%= x %> a=1>t</p>"), OutputOptions::xml());
        let p = first(&doc);
        assert_eq!(doc.output_options().mode, OutputMode::Xml);
        doc.set_attribute(p, "1bad name", "v").unwrap();
        assert_eq!(
            doc.to_html().unwrap(),
            format!(r#"{XML_DECLARATION}<p a="1" _1bad_name="v">t</p>"#)
        );
    }

    #[test]
    fn html_writes_directives_bare() {
        let mut doc = parse("<p <%= x %> a=1>t</p>");
        let p = first(&doc);
        doc.set_attribute(p, "b", "2").unwrap();
        assert_eq!(doc.to_html().unwrap(), r#"<p <%= x %> a="1" b="2">t</p>"#);
    }

    #[test]
    fn inner_and_outer_html() {
        let mut doc = parse("<div><b>x</b>y<!-- c --></div>");
        let div = first(&doc);
        let b = doc.first_child(div).unwrap();
        let comment = doc.last_child(div).unwrap();
        assert_eq!(doc.inner_html(div).unwrap(), "<b>x</b>y<!-- c -->");
        assert_eq!(doc.outer_html(comment).unwrap(), "<!-- c -->");
        assert_eq!(doc.inner_html(comment).unwrap(), " c ");
        doc.set_attribute(b, "class", "k").unwrap();
        assert_eq!(doc.inner_html(div).unwrap(), r#"<b class="k">x</b>y<!-- c -->"#);
        assert_eq!(doc.inner_html(NodeId::ROOT).unwrap(), doc.to_html().unwrap());
    }

    #[test]
    fn serialization_is_depth_guarded() {
        let mut doc = parse("<a><b><c><d>x</d></c></b></a>");
        let d = doc
            .descendants_named(NodeId::ROOT, "d")
            .next()
            .unwrap()
            .unwrap();
        doc.set_attribute(d, "k", "v").unwrap();
        doc.set_max_depth(2);
        assert_eq!(doc.to_html(), Err(Error::DepthLimit { max: 2 }));
    }

    #[test]
    fn writer_errors_are_reported() {
        struct Failing;
        impl Write for Failing {
            fn write_str(&mut self, _: &str) -> fmt::Result {
                Err(fmt::Error)
            }
        }
        let doc = parse("<p>x</p>");
        assert_eq!(doc.write_to(&mut Failing), Err(Error::Format(fmt::Error)));
    }

    #[test]
    fn deep_regeneration_does_not_overflow() {
        let depth = 10_000;
        let input = "<i>".repeat(depth);
        let mut doc =
            Document::parse_with(&input, ParseOptions::default().with_max_depth(depth + 1)).unwrap();
        doc.set_output_options(OutputOptions {
            upper_case: true,
            ..OutputOptions::default()
        });
        let out = doc.to_html().unwrap();
        assert_eq!(out, "<I>".repeat(depth));
    }
}
