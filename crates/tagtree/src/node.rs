//! Arena node records.
//!
//! A parsed node reads its HTML from the source buffer through `outer` and
//! `inner` spans until it is edited. Nodes created through the API carry no
//! spans and own their text.
//!
//! Invariants:
//! - `inner` is only set on elements closed against an end node with a span.
//! - `changed` on a node implies `changed` on every ancestor.
//! - `depth` is the distance from the topmost ancestor (the document for
//!   attached nodes).

use crate::attributes::Attributes;
use crate::source::Span;
use crate::types::{NodeId, NodeType};
use std::sync::Arc;

/// Character data of a text node or comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Content {
    Source(Span),
    Owned(String),
}

/// How an element was closed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Closing {
    /// Never closed, and no synthetic closer was created.
    Open,
    /// The element is its own end node: void elements and `<x/>`.
    SelfClosing,
    /// A distinct end node.
    EndTag(EndTag),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndTag {
    pub(crate) span: Option<Span>,
    pub(crate) synthetic: bool,
    pub(crate) attributes: Attributes,
}

impl EndTag {
    pub(crate) fn real(span: Option<Span>, attributes: Attributes) -> Self {
        Self {
            span,
            synthetic: false,
            attributes,
        }
    }

    pub(crate) fn synthetic_at(at: usize) -> Self {
        Self {
            span: Some(Span::empty_at(at)),
            synthetic: true,
            attributes: Attributes::new(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Created by the tree builder rather than read from the source.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Attributes written on the closing tag.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

#[derive(Clone, Debug)]
pub struct ElementData {
    pub(crate) name: Arc<str>,
    pub(crate) original_name: Option<Box<str>>,
    pub(crate) attributes: Attributes,
    pub(crate) closing: Closing,
    /// Written with a trailing `/>`.
    pub(crate) empty_syntax: bool,
}

impl ElementData {
    pub(crate) fn new(name: Arc<str>, original: &str, closing: Closing) -> Self {
        let original_name = (original != &*name).then(|| original.into());
        Self {
            name,
            original_name,
            attributes: Attributes::new(),
            closing,
            empty_syntax: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original_name(&self) -> &str {
        self.original_name.as_deref().unwrap_or(&self.name)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn closing(&self) -> &Closing {
        &self.closing
    }

    pub fn is_closed(&self) -> bool {
        !matches!(self.closing, Closing::Open)
    }

    /// Closed by a distinct end node that carries attributes.
    pub fn has_closing_attributes(&self) -> bool {
        matches!(&self.closing, Closing::EndTag(end) if !end.attributes.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CommentKind {
    /// `<!--payload-->`
    Comment,
    /// Doctype, CDATA, processing instruction or bogus `<!…>`, kept whole.
    Declaration,
}

#[derive(Clone, Debug)]
pub(crate) enum NodeData {
    Document,
    Element(ElementData),
    Text(Content),
    Comment { payload: Content, kind: CommentKind },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) outer: Option<Span>,
    pub(crate) inner: Option<Span>,
    pub(crate) changed: bool,
    pub(crate) depth: usize,
    pub(crate) hide_inner_text: bool,
}

impl Node {
    pub(crate) fn parsed(data: NodeData, parent: NodeId, span: Span, depth: usize) -> Self {
        Self {
            data,
            parent: Some(parent),
            children: Vec::new(),
            outer: Some(span),
            inner: None,
            changed: false,
            depth,
            hide_inner_text: false,
        }
    }

    /// A detached node with no source spans, dirty from the start.
    pub(crate) fn detached(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            outer: None,
            inner: None,
            changed: true,
            depth: 0,
            hide_inner_text: false,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self.data {
            NodeData::Document => NodeType::Document,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment { .. } => NodeType::Comment,
        }
    }

    /// Lower-cased tag name for elements, `#document`, `#text` or `#comment` otherwise.
    pub fn name(&self) -> &str {
        match &self.data {
            NodeData::Document => "#document",
            NodeData::Element(el) => el.name(),
            NodeData::Text(_) => "#text",
            NodeData::Comment { .. } => "#comment",
        }
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Depth bounds count elements only; a leaf may sit one level below the
    /// deepest allowed element.
    pub(crate) fn exceeds_depth(&self, level: usize, max: usize) -> bool {
        level > max && self.is_element()
    }

    pub(crate) fn can_have_children(&self) -> bool {
        matches!(self.data, NodeData::Document | NodeData::Element(_))
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Byte range of the node's full source HTML, absent for API-created nodes.
    pub fn outer_span(&self) -> Option<Span> {
        self.outer
    }

    /// Byte range of an element's content, once closed against an end tag.
    pub fn inner_span(&self) -> Option<Span> {
        self.inner
    }

    /// True once the node or its subtree was edited after parsing.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn hides_inner_text(&self) -> bool {
        self.hide_inner_text
    }
}
