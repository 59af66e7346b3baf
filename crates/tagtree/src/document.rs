use crate::attributes::Attributes;
use crate::config::{OutputOptions, ParseOptions};
use crate::dom_builder;
use crate::error::{Error, Result};
use crate::id_index::IdIndex;
use crate::node::{Closing, CommentKind, Content, ElementData, EndTag, Node, NodeData};
use crate::source::Source;
use crate::types::{NodeId, NodeType};
use std::sync::Arc;

/// A parsed HTML tree.
///
/// Nodes live in an arena owned by the document and are addressed by
/// [`NodeId`]. Node 0 is always the document node.
#[derive(Clone, Debug)]
pub struct Document {
    pub(crate) source: Source,
    pub(crate) nodes: Vec<Node>,
    pub(crate) ids: Option<IdIndex>,
    pub(crate) options: ParseOptions,
    pub(crate) output: OutputOptions,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with default options.
    pub fn new() -> Self {
        Self::empty(Source::default(), ParseOptions::default())
    }

    pub fn parse(html: &str) -> Result<Self> {
        Self::parse_with(html, ParseOptions::default())
    }

    pub fn parse_with(html: &str, options: ParseOptions) -> Result<Self> {
        dom_builder::build(Source::new(html), options)
    }

    pub(crate) fn empty(source: Source, options: ParseOptions) -> Self {
        let ids = options.track_ids.then(IdIndex::default);
        let mut root = Node::detached(NodeData::Document);
        root.changed = false;
        Self {
            source,
            nodes: vec![root],
            ids,
            options,
            output: OutputOptions::default(),
        }
    }

    pub fn source(&self) -> &str {
        self.source.as_str()
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn output_options(&self) -> &OutputOptions {
        &self.output
    }

    pub fn set_output_options(&mut self, output: OutputOptions) {
        self.output = output;
    }

    /// Adjusts the depth bound for later mutations and walks.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.options.max_depth = max_depth;
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes ever allocated, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn check(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(Error::UnknownNode(id))
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn content<'a>(&'a self, content: &'a Content) -> &'a str {
        match content {
            Content::Source(span) => self.source.slice(*span),
            Content::Owned(text) => text,
        }
    }

    /// Marks `id` and its ancestors as edited.
    pub(crate) fn mark_changed(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(n) = current {
            let node = &mut self.nodes[n.index()];
            if node.changed && n != id {
                break;
            }
            node.changed = true;
            current = node.parent;
        }
    }

    /// True when `id` is reachable from the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(n) = current {
            if n == NodeId::ROOT {
                return true;
            }
            current = self.get(n).and_then(Node::parent);
        }
        false
    }

    // ========== navigation ==========

    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.get(id).map(Node::node_type)
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(Node::name)
    }

    pub fn original_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get(id)?;
        Some(match node.as_element() {
            Some(el) => el.original_name(),
            None => node.name(),
        })
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    fn sibling_position(&self, id: NodeId) -> Option<(&[NodeId], usize)> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|c| *c == id)?;
        Some((siblings, pos))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, pos) = self.sibling_position(id)?;
        siblings.get(pos + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, pos) = self.sibling_position(id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.get(id).map(Node::depth)
    }

    pub fn element_data(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    pub fn attributes(&self, id: NodeId) -> Option<&Attributes> {
        self.element_data(id).map(ElementData::attributes)
    }

    pub fn attribute_value(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id).and_then(|attrs| attrs.value(name))
    }

    pub fn closing(&self, id: NodeId) -> Option<&Closing> {
        self.element_data(id).map(ElementData::closing)
    }

    /// Elements are closed once they have an end node; other nodes always are.
    pub fn is_closed(&self, id: NodeId) -> bool {
        match self.get(id) {
            Some(node) => node.as_element().is_none_or(ElementData::is_closed),
            None => false,
        }
    }

    pub fn has_closing_attributes(&self, id: NodeId) -> bool {
        self.element_data(id)
            .is_some_and(ElementData::has_closing_attributes)
    }

    /// First child element of `parent` named `name`.
    pub fn element(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.elements(parent, name).next()
    }

    /// Child elements of `parent` named `name`, in order.
    pub fn elements<'a>(&'a self, parent: NodeId, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.children(parent).iter().copied().filter(move |c| {
            self.element_data(*c)
                .is_some_and(|el| el.name().eq_ignore_ascii_case(name))
        })
    }

    /// Raw text of a text node, or the payload of a comment.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Text(content) => Some(self.content(content)),
            NodeData::Comment { payload, .. } => Some(self.content(payload)),
            _ => None,
        }
    }

    /// True for a comment node holding `<!DOCTYPE …>`.
    pub fn is_doctype(&self, id: NodeId) -> bool {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Comment {
                payload,
                kind: CommentKind::Declaration,
            }) => is_doctype_markup(self.content(payload)),
            _ => false,
        }
    }

    // ========== creation ==========

    /// Creates a detached element. Void names start self-closing, other names
    /// are written with an end tag.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let folded: Arc<str> = Arc::from(name.to_ascii_lowercase());
        let closing = if self.options.elements.is_void(&folded) {
            Closing::SelfClosing
        } else {
            Closing::EndTag(EndTag::real(None, Attributes::new()))
        };
        let element = ElementData::new(folded, name, closing);
        self.alloc(Node::detached(NodeData::Element(element)))
    }

    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.alloc(Node::detached(NodeData::Text(Content::Owned(text.to_string()))))
    }

    pub fn create_comment(&mut self, payload: &str) -> NodeId {
        self.alloc(Node::detached(NodeData::Comment {
            payload: Content::Owned(payload.to_string()),
            kind: CommentKind::Comment,
        }))
    }
}

pub(crate) fn is_doctype_markup(text: &str) -> bool {
    text.len() >= 9 && text.as_bytes()[..9].eq_ignore_ascii_case(b"<!doctype")
}
