//! Per-document index from `id` attribute values to elements.
//!
//! Keys are ASCII-lower-cased. Several attached elements may share an id;
//! lookups return the most recently registered one, and removing it exposes
//! the previous holder again. The index always contains exactly the ids of
//! attached elements with a non-empty `id`.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::types::NodeId;
use std::borrow::Cow;
use std::collections::HashMap;

const ID_ATTRIBUTE: &str = "id";

fn key(id: &str) -> Cow<'_, str> {
    if id.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(id.to_ascii_lowercase())
    } else {
        Cow::Borrowed(id)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct IdIndex {
    map: HashMap<String, Vec<NodeId>>,
}

impl IdIndex {
    pub(crate) fn register(&mut self, id: &str, node: NodeId) {
        if id.is_empty() {
            return;
        }
        let holders = self.map.entry(key(id).into_owned()).or_default();
        holders.retain(|n| *n != node);
        holders.push(node);
    }

    pub(crate) fn unregister(&mut self, id: &str, node: NodeId) {
        let key = key(id);
        if let Some(holders) = self.map.get_mut(key.as_ref()) {
            holders.retain(|n| *n != node);
            if holders.is_empty() {
                self.map.remove(key.as_ref());
            }
        }
    }

    pub(crate) fn get(&self, id: &str) -> Option<NodeId> {
        self.map.get(key(id).as_ref()).and_then(|h| h.last().copied())
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}

impl Document {
    fn id_index(&self) -> Result<&IdIndex> {
        self.ids.as_ref().ok_or(Error::IdTrackingDisabled)
    }

    /// Element whose `id` matches, ASCII case-insensitively.
    pub fn get_element_by_id(&self, id: &str) -> Result<Option<NodeId>> {
        Ok(self.id_index()?.get(id))
    }

    /// Number of distinct ids currently indexed.
    pub fn indexed_id_count(&self) -> Result<usize> {
        Ok(self.id_index()?.len())
    }

    /// The element's `id` attribute.
    pub fn id(&self, node: NodeId) -> Result<Option<&str>> {
        self.id_index()?;
        self.check(node)?;
        Ok(self.attribute_value(node, ID_ATTRIBUTE))
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) -> Result<()> {
        self.id_index()?;
        self.set_attribute(node, ID_ATTRIBUTE, id)
    }

    /// Keeps the index in step with an `id` attribute change on `node`.
    pub(crate) fn reindex_id(&mut self, node: NodeId, old: Option<&str>, new: Option<&str>) {
        if self.ids.is_none() || !self.is_attached(node) {
            return;
        }
        if let Some(ids) = self.ids.as_mut() {
            if let Some(old) = old {
                ids.unregister(old, node);
            }
            if let Some(new) = new {
                ids.register(new, node);
            }
        }
    }

    /// Registers every element of the subtree under `root`.
    pub(crate) fn index_subtree(&mut self, root: NodeId) {
        self.walk_ids(root, true);
    }

    /// Evicts every element of the subtree under `root`.
    pub(crate) fn unindex_subtree(&mut self, root: NodeId) {
        self.walk_ids(root, false);
    }

    fn walk_ids(&mut self, root: NodeId, register: bool) {
        let Some(ids) = self.ids.as_mut() else {
            return;
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            if let Some(value) = node
                .as_element()
                .and_then(|el| el.attributes().value(ID_ATTRIBUTE))
            {
                if register {
                    ids.register(value, id);
                } else {
                    ids.unregister(value, id);
                }
            }
            stack.extend(node.children.iter().rev().copied());
        }
    }
}
