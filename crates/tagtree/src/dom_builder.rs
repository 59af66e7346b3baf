//! Stack-based tree construction.
//!
//! Start tags nest under the innermost open element. An end tag closes the
//! nearest open element with the same name, resolved through a
//! last-open-node-per-name map; elements still open above it are closed
//! according to [`ClosePolicy`]. End tags with no open match are dropped.

use crate::attributes::Attribute;
use crate::config::{ClosePolicy, ParseOptions};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::node::{Closing, CommentKind, Content, ElementData, EndTag, Node, NodeData};
use crate::source::{Source, Span};
use crate::tokenizer::tokenize;
use crate::types::{AtomId, AtomTable, NodeId, RawAttribute, Token};
use std::collections::HashMap;

pub(crate) fn build(source: Source, options: ParseOptions) -> Result<Document> {
    let stream = tokenize(source.as_str(), &options.elements);
    let mut doc = Document::empty(source, options);
    let mut builder = TreeBuilder::new(stream.atoms());
    for token in stream.tokens() {
        builder.push(&mut doc, token)?;
    }
    builder.finish(&mut doc)?;
    log::trace!(
        target: "tagtree.tree_builder",
        "built {} nodes from {} tokens",
        doc.node_count(),
        stream.tokens().len()
    );
    Ok(doc)
}

struct TreeBuilder<'a> {
    atoms: &'a AtomTable,
    open: Vec<(NodeId, AtomId)>,
    last_by_name: HashMap<AtomId, NodeId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(atoms: &'a AtomTable) -> Self {
        Self {
            atoms,
            open: Vec::new(),
            last_by_name: HashMap::new(),
        }
    }

    fn current(&self) -> NodeId {
        self.open.last().map_or(NodeId::ROOT, |(id, _)| *id)
    }

    fn push(&mut self, doc: &mut Document, token: &Token) -> Result<()> {
        match token {
            Token::Text(span) => {
                self.append_leaf(doc, NodeData::Text(Content::Source(*span)), *span);
            }
            Token::Comment { payload, span } => {
                let data = NodeData::Comment {
                    payload: Content::Source(*payload),
                    kind: CommentKind::Comment,
                };
                self.append_leaf(doc, data, *span);
            }
            Token::Doctype { span } | Token::Declaration { span } => {
                let data = NodeData::Comment {
                    payload: Content::Source(*span),
                    kind: CommentKind::Declaration,
                };
                self.append_leaf(doc, data, *span);
            }
            Token::StartTag {
                name,
                name_span,
                attributes,
                span,
                self_closing,
            } => self.start_tag(doc, *name, *name_span, attributes, *span, *self_closing)?,
            Token::EndTag {
                name,
                attributes,
                span,
                ..
            } => self.end_tag(doc, *name, attributes, *span)?,
        }
        Ok(())
    }

    fn append_leaf(&mut self, doc: &mut Document, data: NodeData, span: Span) {
        let parent = self.current();
        let depth = doc.node(parent).depth + 1;
        let id = doc.alloc(Node::parsed(data, parent, span, depth));
        doc.node_mut(parent).children.push(id);
    }

    fn start_tag(
        &mut self,
        doc: &mut Document,
        name: AtomId,
        name_span: Span,
        attributes: &[RawAttribute],
        span: Span,
        self_closing: bool,
    ) -> Result<()> {
        let parent = self.current();
        let depth = doc.node(parent).depth + 1;
        let max = doc.options.max_depth;
        if depth > max {
            log::debug!(
                target: "tagtree.tree_builder",
                "aborting parse: <{}> at {} exceeds max depth {max}",
                self.atoms.resolve(name),
                span
            );
            return Err(Error::DepthLimit { max });
        }

        let closing = if self_closing {
            Closing::SelfClosing
        } else {
            Closing::Open
        };
        let mut element = ElementData::new(
            self.atoms.resolve_arc(name),
            doc.source.slice(name_span),
            closing,
        );
        element.empty_syntax = doc.source.slice(span).ends_with("/>");
        for raw in attributes {
            element.attributes.push(self.attribute(&doc.source, raw));
        }
        let id_value = element.attributes.value("id").map(str::to_owned);

        let id = doc.alloc(Node::parsed(NodeData::Element(element), parent, span, depth));
        doc.node_mut(parent).children.push(id);
        if let (Some(ids), Some(value)) = (doc.ids.as_mut(), id_value) {
            ids.register(&value, id);
        }

        if !self_closing {
            self.open.push((id, name));
            self.last_by_name.insert(name, id);
        }
        Ok(())
    }

    fn attribute(&self, source: &Source, raw: &RawAttribute) -> Attribute {
        let value = raw
            .value
            .map_or_else(String::new, |span| source.slice(span).to_string());
        Attribute::parsed(
            self.atoms.resolve(raw.name),
            source.slice(raw.name_span),
            value,
            raw.quote,
        )
    }

    fn end_tag(
        &mut self,
        doc: &mut Document,
        name: AtomId,
        attributes: &[RawAttribute],
        span: Span,
    ) -> Result<()> {
        let Some(&target) = self.last_by_name.get(&name) else {
            log::trace!(
                target: "tagtree.tree_builder",
                "dropping stray </{}> at {}",
                self.atoms.resolve(name),
                span
            );
            return Ok(());
        };
        let Some(pos) = self.open.iter().rposition(|(id, _)| *id == target) else {
            self.last_by_name.remove(&name);
            return Ok(());
        };

        let pending = self.open.len() - pos - 1;
        match doc.options.close_policy {
            // the open stack never holds more than `max_depth` elements, so
            // the cascade is bounded by the start tag depth check
            ClosePolicy::Cascade => {
                for &(id, _) in self.open[pos + 1..].iter().rev() {
                    close_element(doc, id, EndTag::synthetic_at(span.start));
                }
            }
            ClosePolicy::ForceClose if pending > 0 => {
                log::trace!(
                    target: "tagtree.tree_builder",
                    "</{}> at {} leaves {pending} element(s) unclosed",
                    self.atoms.resolve(name),
                    span
                );
            }
            ClosePolicy::ForceClose => {}
        }

        let mut end = EndTag::real(Some(span), Default::default());
        for raw in attributes {
            end.attributes.push(self.attribute(&doc.source, raw));
        }
        close_element(doc, target, end);

        let closed: Vec<AtomId> = self.open.drain(pos..).map(|(_, atom)| atom).collect();
        for atom in closed {
            self.repoint(atom);
        }
        Ok(())
    }

    /// Points the map for `atom` at the next-nearest open element, if any.
    fn repoint(&mut self, atom: AtomId) {
        match self.open.iter().rev().find(|(_, a)| *a == atom) {
            Some(&(id, _)) => {
                self.last_by_name.insert(atom, id);
            }
            None => {
                self.last_by_name.remove(&atom);
            }
        }
    }

    fn finish(&mut self, doc: &mut Document) -> Result<()> {
        if doc.options.auto_close_on_end {
            let at = doc.source.len();
            while let Some((id, _)) = self.open.pop() {
                close_element(doc, id, EndTag::synthetic_at(at));
            }
        } else if !self.open.is_empty() {
            log::trace!(
                target: "tagtree.tree_builder",
                "{} element(s) left open at end of input",
                self.open.len()
            );
            self.open.clear();
        }
        self.last_by_name.clear();
        Ok(())
    }
}

/// Records `end` as the element's end node and extends its spans through it.
fn close_element(doc: &mut Document, id: NodeId, end: EndTag) {
    let node = doc.node_mut(id);
    if let (Some(outer), Some(end_span)) = (node.outer, end.span) {
        node.inner = Some(Span::new(outer.end, end_span.start));
        node.outer = Some(Span::new(outer.start, end_span.end));
    }
    if let Some(element) = node.as_element_mut() {
        element.closing = Closing::EndTag(end);
    }
}
