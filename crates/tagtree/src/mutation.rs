//! Tree edits.
//!
//! Every edit validates before it touches the tree, so a failed call leaves
//! the document unchanged. Successful edits mark the edited node and its
//! ancestors changed and keep the id index and node depths consistent.

use crate::attributes::{Attribute, Attributes};
use crate::config::ParseOptions;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::node::{Closing, Content, ElementData, EndTag, Node, NodeData};
use crate::types::{NodeId, QuoteStyle};

const ID_ATTRIBUTE: &str = "id";

/// Detached copies of a subtree, in pre-order, waiting to be allocated.
struct CopyPlan {
    root: Node,
    /// Each node with the plan index of its parent (0 is the root).
    rest: Vec<(Node, usize)>,
}

/// Copies `root` (and its subtree when `deep`) out of `src`.
///
/// `base_depth` is the depth the copy of `root` will have once inserted.
fn copy_plan(
    src: &Document,
    root: NodeId,
    deep: bool,
    base_depth: usize,
    max: usize,
) -> Result<CopyPlan> {
    if src.node(root).exceeds_depth(base_depth, max) {
        return Err(Error::DepthLimit { max });
    }
    let mut plan = CopyPlan {
        root: detached_copy(src, root),
        rest: Vec::new(),
    };
    if !deep {
        return Ok(plan);
    }
    let mut stack: Vec<(NodeId, usize, usize)> = src
        .children(root)
        .iter()
        .rev()
        .map(|c| (*c, 0, 1))
        .collect();
    while let Some((id, parent_slot, level)) = stack.pop() {
        if src.node(id).exceeds_depth(base_depth + level, max) {
            return Err(Error::DepthLimit { max });
        }
        plan.rest.push((detached_copy(src, id), parent_slot));
        let slot = plan.rest.len();
        stack.extend(src.children(id).iter().rev().map(|c| (*c, slot, level + 1)));
    }
    Ok(plan)
}

fn detached_copy(src: &Document, id: NodeId) -> Node {
    let node = src.node(id);
    let data = match &node.data {
        NodeData::Document => NodeData::Document,
        NodeData::Element(el) => NodeData::Element(ElementData {
            name: el.name.clone(),
            original_name: el.original_name.clone(),
            attributes: el.attributes.clone(),
            closing: match &el.closing {
                Closing::Open => Closing::Open,
                Closing::SelfClosing => Closing::SelfClosing,
                Closing::EndTag(end) => Closing::EndTag(EndTag {
                    span: None,
                    synthetic: end.synthetic,
                    attributes: end.attributes.clone(),
                }),
            },
            empty_syntax: el.empty_syntax,
        }),
        NodeData::Text(content) => NodeData::Text(Content::Owned(src.content(content).to_string())),
        NodeData::Comment { payload, kind } => NodeData::Comment {
            payload: Content::Owned(src.content(payload).to_string()),
            kind: *kind,
        },
    };
    let mut copy = Node::detached(data);
    copy.hide_inner_text = node.hide_inner_text;
    copy
}

impl Document {
    // ========== internal linking ==========

    fn validate_insert(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_node = self.check(parent)?;
        let child_node = self.check(child)?;
        if matches!(child_node.data, NodeData::Document) {
            return Err(Error::InvalidArgument("the document node cannot be inserted"));
        }
        if !parent_node.can_have_children() {
            return Err(Error::InvalidArgument(
                "text and comment nodes cannot have children",
            ));
        }
        let mut current = Some(parent);
        while let Some(ancestor) = current {
            if ancestor == child {
                return Err(Error::InvalidArgument(
                    "a node cannot be inserted into its own subtree",
                ));
            }
            current = self.node(ancestor).parent;
        }
        let max = self.options.max_depth;
        let base = parent_node.depth + 1;
        if self
            .element_height(child)
            .is_some_and(|height| base + height > max)
        {
            return Err(Error::DepthLimit { max });
        }
        Ok(())
    }

    /// Level of the deepest element below `root` (0 for `root` itself), or
    /// `None` when the subtree holds no element.
    pub(crate) fn element_height(&self, root: NodeId) -> Option<usize> {
        let mut height = None;
        let mut stack = vec![(root, 0usize)];
        while let Some((id, level)) = stack.pop() {
            let node = self.node(id);
            if node.is_element() {
                height = height.max(Some(level));
            }
            stack.extend(node.children.iter().map(|c| (*c, level + 1)));
        }
        height
    }

    fn rebase_depth(&mut self, root: NodeId, depth: usize) {
        let mut stack = vec![(root, depth)];
        while let Some((id, d)) = stack.pop() {
            let node = &mut self.nodes[id.index()];
            node.depth = d;
            stack.extend(node.children.iter().map(|c| (*c, d + 1)));
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).parent else {
            return;
        };
        let was_attached = self.is_attached(parent);
        let siblings = &mut self.nodes[parent.index()].children;
        if let Some(pos) = siblings.iter().position(|c| *c == child) {
            siblings.remove(pos);
        }
        self.nodes[child.index()].parent = None;
        if was_attached {
            self.unindex_subtree(child);
        }
        self.mark_changed(parent);
        self.rebase_depth(child, 0);
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, pos: usize) {
        debug_assert!(self.node(child).parent.is_none(), "attach expects a detached node");
        let depth = self.node(parent).depth + 1;
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.insert(pos, child);
        self.rebase_depth(child, depth);
        if self.is_attached(parent) {
            self.index_subtree(child);
        }
        self.mark_changed(parent);
    }

    fn adopt(&mut self, plan: CopyPlan) -> NodeId {
        let root = self.alloc(plan.root);
        let mut ids = vec![root];
        for (mut node, parent_slot) in plan.rest {
            let parent = ids[parent_slot];
            node.parent = Some(parent);
            node.depth = self.node(parent).depth + 1;
            let id = self.alloc(node);
            self.nodes[parent.index()].children.push(id);
            ids.push(id);
        }
        root
    }

    fn child_position(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        self.check(child)?;
        self.check(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(Error::NotAChild {
                parent,
                node: child,
            })
    }

    // ========== children ==========

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.validate_insert(parent, child)?;
        self.detach(child);
        let pos = self.node(parent).children.len();
        self.attach(parent, child, pos);
        Ok(child)
    }

    pub fn append_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<()> {
        for child in children {
            self.validate_insert(parent, *child)?;
        }
        for child in children {
            self.detach(*child);
            let pos = self.node(parent).children.len();
            self.attach(parent, *child, pos);
        }
        Ok(())
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.validate_insert(parent, child)?;
        self.detach(child);
        self.attach(parent, child, 0);
        Ok(child)
    }

    /// Inserts `children` at the front of `parent`, keeping their order.
    pub fn prepend_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<()> {
        for child in children {
            self.validate_insert(parent, *child)?;
        }
        for (i, child) in children.iter().enumerate() {
            self.detach(*child);
            let pos = i.min(self.node(parent).children.len());
            self.attach(parent, *child, pos);
        }
        Ok(())
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        reference: NodeId,
    ) -> Result<NodeId> {
        self.insert_relative(parent, new_child, reference, 0)
    }

    pub fn insert_after(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        reference: NodeId,
    ) -> Result<NodeId> {
        self.insert_relative(parent, new_child, reference, 1)
    }

    fn insert_relative(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        reference: NodeId,
        offset: usize,
    ) -> Result<NodeId> {
        self.child_position(parent, reference)?;
        if new_child == reference {
            return Ok(new_child);
        }
        self.validate_insert(parent, new_child)?;
        self.detach(new_child);
        let pos = self.child_position(parent, reference)? + offset;
        self.attach(parent, new_child, pos);
        Ok(new_child)
    }

    /// Detaches `child` from `parent`. With `keep_grandchildren`, the
    /// children of `child` take its place under `parent`, in order.
    pub fn remove_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        keep_grandchildren: bool,
    ) -> Result<NodeId> {
        let pos = self.child_position(parent, child)?;
        let grandchildren = if keep_grandchildren {
            self.node(child).children.clone()
        } else {
            Vec::new()
        };
        self.detach(child);
        for (i, grandchild) in grandchildren.into_iter().enumerate() {
            self.detach(grandchild);
            self.attach(parent, grandchild, pos + i);
        }
        Ok(child)
    }

    /// Detaches `node` from its parent, if any.
    pub fn remove(&mut self, node: NodeId) -> Result<NodeId> {
        self.check(node)?;
        if node == NodeId::ROOT {
            return Err(Error::InvalidArgument("the document node cannot be removed"));
        }
        self.detach(node);
        Ok(node)
    }

    /// Puts `new_child` where `old_child` was and returns `old_child`.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<NodeId> {
        self.child_position(parent, old_child)?;
        if new_child == old_child {
            return Ok(old_child);
        }
        self.validate_insert(parent, new_child)?;
        self.detach(new_child);
        let pos = self.child_position(parent, old_child)?;
        self.detach(old_child);
        self.attach(parent, new_child, pos);
        Ok(old_child)
    }

    pub fn remove_all_children(&mut self, node: NodeId) -> Result<()> {
        self.check(node)?;
        let children = std::mem::take(&mut self.nodes[node.index()].children);
        if children.is_empty() {
            return Ok(());
        }
        let attached = self.is_attached(node);
        for child in children {
            self.nodes[child.index()].parent = None;
            if attached {
                self.unindex_subtree(child);
            }
            self.rebase_depth(child, 0);
        }
        self.mark_changed(node);
        Ok(())
    }

    /// Removes children, attributes and closing attributes.
    pub fn remove_all(&mut self, node: NodeId) -> Result<()> {
        self.remove_all_children(node)?;
        let old_id = self.attribute_value(node, ID_ATTRIBUTE).map(str::to_owned);
        let Some(el) = self.nodes[node.index()].as_element_mut() else {
            return Ok(());
        };
        let mut cleared = !el.attributes.is_empty();
        el.attributes.clear();
        if let Closing::EndTag(end) = &mut el.closing {
            cleared |= !end.attributes.is_empty();
            end.attributes.clear();
        }
        if cleared {
            self.reindex_id(node, old_id.as_deref(), None);
            self.mark_changed(node);
        }
        Ok(())
    }

    // ========== content ==========

    /// Replaces the text of a text node or the payload of a comment.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.check(node)?;
        match &mut self.nodes[node.index()].data {
            NodeData::Text(content) => *content = Content::Owned(text.to_string()),
            NodeData::Comment { payload, .. } => *payload = Content::Owned(text.to_string()),
            _ => {
                return Err(Error::InvalidArgument(
                    "only text and comment nodes carry text",
                ));
            }
        }
        self.mark_changed(node);
        Ok(())
    }

    pub fn set_comment(&mut self, node: NodeId, payload: &str) -> Result<()> {
        if !matches!(self.check(node)?.data, NodeData::Comment { .. }) {
            return Err(Error::InvalidArgument("not a comment node"));
        }
        self.set_text(node, payload)
    }

    /// Replaces the children of `node` with the nodes parsed from `html`.
    /// Empty input just removes the children.
    pub fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<()> {
        let target = self.check(node)?;
        if !target.can_have_children() {
            return Err(Error::InvalidArgument(
                "only elements and the document have inner html",
            ));
        }
        let base_depth = target.depth + 1;
        let max = self.options.max_depth;
        let options = ParseOptions {
            track_ids: false,
            ..self.options.clone()
        };
        let fragment = Document::parse_with(html, options)?;
        let plans = fragment
            .children(NodeId::ROOT)
            .iter()
            .map(|child| copy_plan(&fragment, *child, true, base_depth, max))
            .collect::<Result<Vec<_>>>()?;

        self.remove_all_children(node)?;
        for plan in plans {
            let child = self.adopt(plan);
            let pos = self.node(node).children.len();
            self.attach(node, child, pos);
        }
        Ok(())
    }

    /// Skips the subtree of `node` in [`inner_text`](Document::inner_text).
    pub fn set_hide_inner_text(&mut self, node: NodeId, hide: bool) -> Result<()> {
        self.check(node)?;
        self.nodes[node.index()].hide_inner_text = hide;
        Ok(())
    }

    /// Detached copy of `node`: attributes, closing state and, when `deep`,
    /// the whole subtree. The copy owns its text and has no source spans.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId> {
        self.check(node)?;
        if node == NodeId::ROOT {
            return Err(Error::InvalidArgument("the document node cannot be cloned"));
        }
        let plan = copy_plan(self, node, deep, 0, self.options.max_depth)?;
        Ok(self.adopt(plan))
    }

    /// Copies the attributes of `source` onto `target` and, when `deep`,
    /// replaces the children of `target` with copies of those of `source`.
    pub fn copy_from(&mut self, target: NodeId, source: NodeId, deep: bool) -> Result<()> {
        if target == source {
            return Ok(());
        }
        let attributes = self
            .check(source)?
            .as_element()
            .ok_or(Error::InvalidArgument("can only copy from an element"))?
            .attributes
            .clone();
        let target_node = self.check(target)?;
        let target_el = target_node
            .as_element()
            .ok_or(Error::InvalidArgument("can only copy into an element"))?;
        let old_id = target_el.attributes.value(ID_ATTRIBUTE).map(str::to_owned);
        let new_id = attributes.value(ID_ATTRIBUTE).map(str::to_owned);
        let plans = if deep {
            let base_depth = target_node.depth + 1;
            let max = self.options.max_depth;
            self.children(source)
                .iter()
                .map(|child| copy_plan(self, *child, true, base_depth, max))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        if let Some(el) = self.nodes[target.index()].as_element_mut() {
            el.attributes = attributes;
        }
        self.reindex_id(target, old_id.as_deref(), new_id.as_deref());
        self.mark_changed(target);
        if deep {
            self.remove_all_children(target)?;
            for plan in plans {
                let child = self.adopt(plan);
                let pos = self.node(target).children.len();
                self.attach(target, child, pos);
            }
        }
        Ok(())
    }

    // ========== attributes ==========

    fn check_element(&self, node: NodeId) -> Result<&ElementData> {
        self.check(node)?
            .as_element()
            .ok_or(Error::InvalidArgument("attributes only exist on elements"))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.set_attribute_value(node, name, Some(value.to_string()))
    }

    /// Sets `name` to `value`; a `None` value keeps the attribute but omits it
    /// from output. Setting the current value is a no-op.
    pub fn set_attribute_value(
        &mut self,
        node: NodeId,
        name: &str,
        value: Option<String>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("attribute name must not be empty"));
        }
        let el = self.check_element(node)?;
        let is_id = name.eq_ignore_ascii_case(ID_ATTRIBUTE);
        let old_id = if is_id {
            el.attributes.value(ID_ATTRIBUTE).map(str::to_owned)
        } else {
            None
        };
        let new_id = if is_id { value.clone() } else { None };

        let changed = self.nodes[node.index()]
            .as_element_mut()
            .is_some_and(|el| el.attributes.set(name, value));
        if !changed {
            return Ok(());
        }
        if is_id {
            self.reindex_id(node, old_id.as_deref(), new_id.as_deref());
        }
        self.mark_changed(node);
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<Option<Attribute>> {
        self.check_element(node)?;
        let removed = self.nodes[node.index()]
            .as_element_mut()
            .and_then(|el| el.attributes.remove(name));
        if let Some(attr) = &removed {
            if attr.name() == ID_ATTRIBUTE {
                self.reindex_id(node, attr.value(), None);
            }
            self.mark_changed(node);
        }
        Ok(removed)
    }

    pub fn set_attribute_quote(&mut self, node: NodeId, name: &str, quote: QuoteStyle) -> Result<()> {
        self.check_element(node)?;
        let changed = self.nodes[node.index()]
            .as_element_mut()
            .is_some_and(|el| el.attributes.set_quote(name, quote));
        if changed {
            self.mark_changed(node);
        }
        Ok(())
    }

    /// Attributes of the element's closing tag, if it was closed by one.
    pub fn closing_attributes(&self, node: NodeId) -> Option<&Attributes> {
        match self.closing(node)? {
            Closing::EndTag(end) => Some(end.attributes()),
            _ => None,
        }
    }
}
