//! The live design: an arena of component nodes plus the per-node metadata
//! side-table.

use crate::model::value::{Fields, Value};
use crate::registry::layouts::LayoutStrategy;
use slotmap::{SecondaryMap, SlotMap, new_key_type};
use std::collections::{BTreeMap, HashMap};

new_key_type! {
    /// Stable handle of a node in a [`Design`].
    pub(crate) struct NodeId;
}

/// Children and arrangement of a container node.
#[derive(Clone, Debug)]
pub(crate) struct ContainerBody {
    pub(crate) children: Vec<NodeId>,
    pub(crate) layout: LayoutStrategy,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) kind: String,
    pub(crate) fields: Fields,
    pub(crate) container: Option<ContainerBody>,
}

impl Node {
    pub(crate) fn leaf(kind: impl Into<String>, fields: Fields) -> Self {
        Self {
            kind: kind.into(),
            fields,
            container: None,
        }
    }

    pub(crate) fn container(kind: impl Into<String>, layout: LayoutStrategy) -> Self {
        Self {
            kind: kind.into(),
            fields: Fields::new(),
            container: Some(ContainerBody {
                children: Vec::new(),
                layout,
            }),
        }
    }

    pub(crate) fn is_container(&self) -> bool {
        self.container.is_some()
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        self.container
            .as_ref()
            .map(|c| c.children.as_slice())
            .unwrap_or(&[])
    }
}

/// Direction marker for box layouts. The box strategy itself does not
/// record whether it was created as `HBox` or `VBox`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Horizontal,
    Vertical,
}

/// Out-of-band per-node properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Meta {
    pub(crate) name: Option<String>,
    /// Layout parameters of a container, as entered by the user.
    pub(crate) params: BTreeMap<String, String>,
    pub(crate) dir: Option<Direction>,
}

#[derive(Default)]
pub(crate) struct Design {
    nodes: SlotMap<NodeId, Node>,
    meta: SecondaryMap<NodeId, Meta>,
    root: Option<NodeId>,
}

impl Design {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        self.nodes.insert(node)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn meta(&self, id: NodeId) -> Option<&Meta> {
        self.meta.get(id)
    }

    /// Side-table entry for `id`, created on first access.
    pub(crate) fn meta_mut(&mut self, id: NodeId) -> &mut Meta {
        if !self.meta.contains_key(id) {
            self.meta.insert(id, Meta::default());
        }
        &mut self.meta[id]
    }

    pub(crate) fn name(&self, id: NodeId) -> Option<&str> {
        self.meta
            .get(id)
            .and_then(|m| m.name.as_deref())
            .filter(|n| !n.is_empty())
    }

    pub(crate) fn set_name(&mut self, id: NodeId, name: Option<String>) {
        self.meta_mut(id).name = name.filter(|n| !n.is_empty());
    }

    /// Nested slot nodes (in field order) followed by container children.
    pub(crate) fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut out = node.fields.nodes();
        out.extend_from_slice(node.children());
        out
    }

    /// Pre-order traversal from `id`.
    pub(crate) fn walk(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            let kids = self.children(current);
            stack.extend(kids.into_iter().rev());
        }
        out
    }

    pub(crate) fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| {
                node.children().contains(&id) || node.fields.nodes().contains(&id)
            })
            .map(|(pid, _)| pid)
    }

    /// Appends to a container's child list. Returns false for leaves.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        match self
            .nodes
            .get_mut(parent)
            .and_then(|n| n.container.as_mut())
        {
            Some(body) => {
                body.children.push(child);
                true
            }
            None => false,
        }
    }

    /// Inserts into a container's child list at `index` (clamped).
    pub(crate) fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> bool {
        match self
            .nodes
            .get_mut(parent)
            .and_then(|n| n.container.as_mut())
        {
            Some(body) => {
                let index = index.min(body.children.len());
                body.children.insert(index, child);
                true
            }
            None => false,
        }
    }

    /// Removes `id` and its whole subtree, detaching it from its parent and
    /// dropping the side-table entries. Returns the former parent.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        let parent = self.parent_of(id);
        if let Some(pid) = parent
            && let Some(node) = self.nodes.get_mut(pid)
        {
            if let Some(body) = node.container.as_mut() {
                body.children.retain(|c| *c != id);
            }
            node.fields.detach(id);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        for gone in self.walk(id) {
            self.nodes.remove(gone);
            self.meta.remove(gone);
        }
        parent
    }

    /// Moves a container child by `delta` positions. Returns false when the
    /// move is out of range or `child` is not in `parent`.
    pub(crate) fn move_child(&mut self, parent: NodeId, child: NodeId, delta: isize) -> bool {
        let Some(body) = self
            .nodes
            .get_mut(parent)
            .and_then(|n| n.container.as_mut())
        else {
            return false;
        };
        let Some(from) = body.children.iter().position(|c| *c == child) else {
            return false;
        };
        let to = from as isize + delta;
        if to < 0 || to as usize >= body.children.len() {
            return false;
        }
        body.children.swap(from, to as usize);
        true
    }

    /// Deep-copies the subtree at `id`. Copies get fresh handles and no name;
    /// layout parameters and direction markers are kept.
    pub(crate) fn duplicate(&mut self, id: NodeId) -> Option<NodeId> {
        let originals = self.walk(id);
        if originals.is_empty() {
            return None;
        }
        let mut remap = HashMap::new();
        for old in &originals {
            let node = self.nodes.get(*old)?.clone();
            let new = self.nodes.insert(node);
            remap.insert(*old, new);
            if let Some(meta) = self.meta.get(*old).cloned() {
                self.meta.insert(new, Meta { name: None, ..meta });
            }
        }
        for new in remap.values() {
            if let Some(node) = self.nodes.get_mut(*new) {
                remap_fields(&mut node.fields, &remap);
                if let Some(body) = node.container.as_mut() {
                    for child in &mut body.children {
                        if let Some(mapped) = remap.get(&*child) {
                            *child = *mapped;
                        }
                    }
                    body.layout.remap(&remap);
                }
            }
        }
        remap.get(&id).copied()
    }
}

fn remap_fields(fields: &mut Fields, remap: &HashMap<NodeId, NodeId>) {
    let names: Vec<String> = fields.iter().map(|(k, _)| k.to_owned()).collect();
    for name in names {
        match fields.get_mut(&name) {
            Some(Value::Node(Some(id))) => {
                if let Some(mapped) = remap.get(&*id) {
                    *id = *mapped;
                }
            }
            Some(Value::Records(rows)) => {
                for row in rows {
                    remap_fields(row, remap);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::layouts::LayoutStrategy;

    fn label(text: &str) -> Node {
        Node::leaf("Label", Fields::new().with("Text", Value::text(text)))
    }

    fn vbox_with(design: &mut Design, n: usize) -> (NodeId, Vec<NodeId>) {
        let root = design.insert(Node::container("Container", LayoutStrategy::Box));
        let kids: Vec<_> = (0..n)
            .map(|i| {
                let id = design.insert(label(&format!("L{i}")));
                design.append_child(root, id);
                id
            })
            .collect();
        design.set_root(root);
        (root, kids)
    }

    #[test]
    fn test_walk_is_pre_order() {
        let mut design = Design::new();
        let (root, kids) = vbox_with(&mut design, 2);
        let card = design.insert(Node::leaf(
            "Card",
            Fields::new().with("Content", Value::Node(Some(kids[0]))),
        ));
        design.get_mut(root).unwrap().container.as_mut().unwrap().children[0] = card;
        assert_eq!(design.walk(root), vec![root, card, kids[0], kids[1]]);
    }

    #[test]
    fn test_remove_drops_subtree_and_meta() {
        let mut design = Design::new();
        let (root, kids) = vbox_with(&mut design, 3);
        design.set_name(kids[1], Some("middle".into()));
        assert_eq!(design.remove(kids[1]), Some(root));
        assert!(!design.contains(kids[1]));
        assert!(design.meta(kids[1]).is_none());
        assert_eq!(design.get(root).unwrap().children(), &[kids[0], kids[2]]);
    }

    #[test]
    fn test_remove_clears_slot_field() {
        let mut design = Design::new();
        let content = design.insert(label("inside"));
        let card = design.insert(Node::leaf(
            "Card",
            Fields::new().with("Content", Value::Node(Some(content))),
        ));
        design.remove(content);
        assert_eq!(design.get(card).unwrap().fields.node("Content"), None);
    }

    #[test]
    fn test_move_child_bounds() {
        let mut design = Design::new();
        let (root, kids) = vbox_with(&mut design, 2);
        assert!(!design.move_child(root, kids[0], -1));
        assert!(design.move_child(root, kids[0], 1));
        assert_eq!(design.get(root).unwrap().children(), &[kids[1], kids[0]]);
    }

    #[test]
    fn test_duplicate_gets_fresh_ids_and_no_name() {
        let mut design = Design::new();
        let (root, kids) = vbox_with(&mut design, 2);
        design.set_name(root, Some("panel".into()));
        design.meta_mut(root).dir = Some(Direction::Horizontal);
        let copy = design.duplicate(root).unwrap();
        assert_ne!(copy, root);
        assert_eq!(design.name(copy), None);
        assert_eq!(design.meta(copy).unwrap().dir, Some(Direction::Horizontal));
        let copied_kids = design.get(copy).unwrap().children().to_vec();
        assert_eq!(copied_kids.len(), 2);
        assert!(copied_kids.iter().all(|k| !kids.contains(k)));
        assert_eq!(design.len(), 6);
    }

    #[test]
    fn test_empty_name_is_no_name() {
        let mut design = Design::new();
        let id = design.insert(label("x"));
        design.set_name(id, Some(String::new()));
        assert_eq!(design.name(id), None);
    }
}
