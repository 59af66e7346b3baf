use crate::document::Document;
use crate::error::{Error, Result};
use crate::types::NodeId;

/// Pre-order walk below a node, driven by an explicit stack.
///
/// Yields `Err(DepthLimit)` once when the walk reaches an element more than
/// `max_depth` levels below its start, then ends. Cloning forks the walk at
/// its current position; asking the document again starts over.
#[derive(Clone, Debug)]
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<(NodeId, usize)>,
    max_depth: usize,
    failed: bool,
}

impl<'a> Descendants<'a> {
    fn new(doc: &'a Document, start: NodeId, include_self: bool) -> Self {
        let stack = if include_self {
            if doc.get(start).is_some() {
                vec![(start, 0)]
            } else {
                Vec::new()
            }
        } else {
            doc.children(start).iter().rev().map(|c| (*c, 1)).collect()
        };
        Self {
            doc,
            stack,
            max_depth: doc.options.max_depth,
            failed: false,
        }
    }
}

impl Iterator for Descendants<'_> {
    type Item = Result<NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (id, level) = self.stack.pop()?;
        if self.doc.node(id).exceeds_depth(level, self.max_depth) {
            self.failed = true;
            self.stack.clear();
            return Some(Err(Error::DepthLimit {
                max: self.max_depth,
            }));
        }
        self.stack
            .extend(self.doc.children(id).iter().rev().map(|c| (*c, level + 1)));
        Some(Ok(id))
    }
}

/// Parent chain of a node, nearest first.
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.doc.parent(id);
        Some(id)
    }
}

impl Document {
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        Descendants::new(self, node, false)
    }

    pub fn descendants_and_self(&self, node: NodeId) -> Descendants<'_> {
        Descendants::new(self, node, true)
    }

    /// Descendant elements named `name` (ASCII case-insensitive), in pre-order.
    pub fn descendants_named<'a>(
        &'a self,
        node: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = Result<NodeId>> + 'a {
        self.descendants(node).filter(move |item| match item {
            Ok(id) => self
                .element_data(*id)
                .is_some_and(|el| el.name().eq_ignore_ascii_case(name)),
            Err(_) => true,
        })
    }

    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(node),
        }
    }

    pub fn ancestors_and_self(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.get(node).map(|_| node),
        }
    }

    /// Absolute path such as `/html[1]/body[1]/div[2]/#text[1]`.
    ///
    /// Each step is the node name with its 1-based position among same-named
    /// siblings. The document itself is `/`.
    pub fn xpath(&self, node: NodeId) -> String {
        let mut steps: Vec<String> = Vec::new();
        for id in self.ancestors_and_self(node) {
            let Some(parent) = self.parent(id) else {
                break;
            };
            let name = self.name(id).unwrap_or_default();
            let position = 1 + self
                .children(parent)
                .iter()
                .take_while(|c| **c != id)
                .filter(|c| self.name(**c) == Some(name))
                .count();
            steps.push(format!("{name}[{position}]"));
        }
        if steps.is_empty() {
            return "/".to_string();
        }
        steps.reverse();
        let mut path = String::new();
        for step in steps {
            path.push('/');
            path.push_str(&step);
        }
        path
    }
}
