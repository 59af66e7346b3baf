use crate::document::Document;
use crate::entities::deentitize;
use crate::error::{Error, Result};
use crate::node::NodeData;
use crate::types::NodeId;
use std::borrow::Cow;

#[inline]
fn is_control_ws(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\t')
}

impl Document {
    /// Text of a text node as it contributes to inner text: `\n`, `\r` and
    /// `\t` are dropped unless the parent keeps whitespace.
    pub fn materialized_text(&self, node: NodeId) -> Option<Cow<'_, str>> {
        let NodeData::Text(content) = &self.get(node)?.data else {
            return None;
        };
        let text = self.content(content);
        let preserve = self
            .parent(node)
            .and_then(|p| self.element_data(p))
            .is_some_and(|el| self.options.elements.preserves_whitespace(el.name()));
        if preserve || !text.contains(is_control_ws) {
            return Some(Cow::Borrowed(text));
        }
        Some(Cow::Owned(text.chars().filter(|c| !is_control_ws(*c)).collect()))
    }

    /// Concatenated text of the node's immediate text children.
    pub fn direct_inner_text(&self, node: NodeId) -> String {
        if let Some(text) = self.materialized_text(node) {
            return text.into_owned();
        }
        let mut out = String::new();
        for child in self.children(node) {
            if let Some(text) = self.materialized_text(*child) {
                out.push_str(&text);
            }
        }
        out
    }

    /// Text of the whole subtree, skipping subtrees flagged to hide their
    /// inner text.
    pub fn inner_text(&self, node: NodeId) -> Result<String> {
        self.inner_text_with(node, false)
    }

    pub fn inner_text_with(&self, node: NodeId, show_hidden: bool) -> Result<String> {
        self.check(node)?;
        let max = self.options.max_depth;
        let mut out = String::new();
        let mut stack = vec![(node, 0usize)];
        while let Some((id, level)) = stack.pop() {
            let current = self.node(id);
            if current.exceeds_depth(level, max) {
                return Err(Error::DepthLimit { max });
            }
            if id != node && current.hide_inner_text && !show_hidden {
                continue;
            }
            if let Some(text) = self.materialized_text(id) {
                out.push_str(&text);
                continue;
            }
            stack.extend(current.children.iter().rev().map(|c| (*c, level + 1)));
        }
        Ok(out)
    }

    /// [`inner_text`](Document::inner_text) with character references decoded.
    pub fn decoded_inner_text(&self, node: NodeId) -> Result<String> {
        Ok(deentitize(&self.inner_text(node)?))
    }
}
