use crate::error::{Error, Result};
use crate::point::Point;

/// Position of a [`TreeNode`] inside its [`Hierarchy`].
///
/// Indices are only meaningful for the hierarchy that handed them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

/// One node of a [`Hierarchy`].
///
/// All layout fields are declared upfront: the layout writes `position`,
/// the reconciliation snapshots it into `previous_position`
/// and the text measurement fills `measured_extent` once.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub(crate) id: String,
    pub(crate) depth: usize,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) visible_children: Vec<NodeIndex>,
    pub(crate) hidden_children: Vec<NodeIndex>,
    pub(crate) position: Point,
    pub(crate) previous_position: Point,
    pub(crate) measured_extent: Option<f64>,
}

impl TreeNode {
    pub(crate) const fn new(id: String, depth: usize, parent: Option<NodeIndex>) -> Self {
        Self {
            id,
            depth,
            parent,
            visible_children: Vec::new(),
            hidden_children: Vec::new(),
            position: Point::new(0.0, 0.0),
            previous_position: Point::new(0.0, 0.0),
            measured_extent: None,
        }
    }

    /// Identity key, also used as the label.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub const fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    #[must_use]
    pub fn visible_children(&self) -> &[NodeIndex] {
        &self.visible_children
    }

    #[must_use]
    pub fn hidden_children(&self) -> &[NodeIndex] {
        &self.hidden_children
    }

    /// The full child set, regardless of the collapse state.
    #[must_use]
    pub fn children(&self) -> &[NodeIndex] {
        if self.visible_children.is_empty() {
            &self.hidden_children
        } else {
            &self.visible_children
        }
    }

    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.visible_children.is_empty() || !self.hidden_children.is_empty()
    }

    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        !self.hidden_children.is_empty()
    }

    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub const fn previous_position(&self) -> Point {
        self.previous_position
    }

    #[must_use]
    pub const fn measured_extent(&self) -> Option<f64> {
        self.measured_extent
    }
}

/// The whole tree of a session, stored as an arena.
///
/// Nodes are created once by the [`HierarchyBuilder`](crate::HierarchyBuilder) and never removed.
/// Parents are referenced by [`NodeIndex`] so there is no ownership cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    pub(crate) nodes: Vec<TreeNode>,
}

impl Hierarchy {
    pub(crate) const ROOT: NodeIndex = NodeIndex(0);

    /// Create a hierarchy with only a root node.
    #[must_use]
    pub fn new_root(id: impl Into<String>) -> Self {
        Self {
            nodes: vec![TreeNode::new(id.into(), 0, None)],
        }
    }

    /// Append a visible child below `parent`.
    ///
    /// # Panics
    ///
    /// Panics when `parent` does not belong to this hierarchy.
    pub fn push_child(&mut self, parent: NodeIndex, id: impl Into<String>) -> NodeIndex {
        let depth = self.nodes[parent.0].depth + 1;
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(TreeNode::new(id.into(), depth, Some(parent)));
        self.nodes[parent.0].visible_children.push(index);
        index
    }

    #[must_use]
    pub const fn root(&self) -> NodeIndex {
        Self::ROOT
    }

    /// Number of nodes, visible or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A hierarchy always has its root.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// # Panics
    ///
    /// Panics when `index` does not belong to this hierarchy.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &TreeNode {
        &self.nodes[index.0]
    }

    #[must_use]
    pub fn get(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(index.0)
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut TreeNode {
        &mut self.nodes[index.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &TreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeIndex(index), node))
    }

    /// All nodes reachable from the root through visible children, in pre-order.
    #[must_use]
    pub fn visible(&self) -> Vec<NodeIndex> {
        let mut result = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(index) = stack.pop() {
            result.push(index);
            stack.extend(self.node(index).visible_children.iter().rev());
        }
        result
    }

    /// Every visible parent/child pair, in the pre-order of the children.
    #[must_use]
    pub fn visible_links(&self) -> Vec<(NodeIndex, NodeIndex)> {
        self.visible()
            .into_iter()
            .filter_map(|child| self.node(child).parent.map(|parent| (parent, child)))
            .collect()
    }

    /// Whether no ancestor of `index` is collapsed.
    #[must_use]
    pub fn is_visible(&self, index: NodeIndex) -> bool {
        let mut current = index;
        while let Some(parent) = self.node(current).parent {
            if !self.node(parent).visible_children.contains(&current) {
                return false;
            }
            current = parent;
        }
        true
    }

    /// Resolve an identity key among the visible nodes.
    ///
    /// # Errors
    ///
    /// Errors when no visible node carries `id` or when more than one does.
    pub fn find_visible(&self, id: &str) -> Result<NodeIndex> {
        let mut matches = self
            .visible()
            .into_iter()
            .filter(|index| self.node(*index).id == id);
        let found = matches.next().ok_or_else(|| Error::UnknownNode { id: id.to_owned() })?;
        if matches.next().is_some() {
            return Err(Error::DuplicateIdentity { id: id.to_owned() });
        }
        Ok(found)
    }

    /// The visible identity keys in pre-order.
    #[must_use]
    pub fn visible_ids(&self) -> Vec<&str> {
        self.visible()
            .into_iter()
            .map(|index| self.node(index).id())
            .collect()
    }
}

#[cfg(test)]
impl Hierarchy {
    /// ```text
    /// a
    /// ├── b
    /// │   ├── c
    /// │   └── d
    /// │       ├── e
    /// │       └── f
    /// └── g
    /// ```
    pub(crate) fn example() -> Self {
        let mut hierarchy = Self::new_root("a");
        let b = hierarchy.push_child(Self::ROOT, "b");
        hierarchy.push_child(b, "c");
        let d = hierarchy.push_child(b, "d");
        hierarchy.push_child(d, "e");
        hierarchy.push_child(d, "f");
        hierarchy.push_child(Self::ROOT, "g");
        hierarchy
    }
}

#[test]
fn push_child_sets_parent_and_depth() {
    let hierarchy = Hierarchy::example();
    let depths = hierarchy
        .iter()
        .map(|(_, node)| node.depth())
        .collect::<Vec<_>>();
    assert_eq!(depths, [0, 1, 2, 2, 3, 3, 1]);
    let e = hierarchy.find_visible("e").unwrap();
    let d = hierarchy.node(e).parent().unwrap();
    assert_eq!(hierarchy.node(d).id(), "d");
}

#[test]
fn visible_is_pre_order() {
    let hierarchy = Hierarchy::example();
    assert_eq!(hierarchy.visible_ids(), ["a", "b", "c", "d", "e", "f", "g"]);
}

#[test]
fn visible_links_are_keyed_by_child() {
    let hierarchy = Hierarchy::example();
    let links = hierarchy
        .visible_links()
        .into_iter()
        .map(|(parent, child)| (hierarchy.node(parent).id(), hierarchy.node(child).id()))
        .collect::<Vec<_>>();
    assert_eq!(
        links,
        [("a", "b"), ("b", "c"), ("b", "d"), ("d", "e"), ("d", "f"), ("a", "g")]
    );
}

#[test]
fn find_visible_rejects_unknown_and_duplicates() {
    let mut hierarchy = Hierarchy::example();
    assert!(matches!(
        hierarchy.find_visible("zulu"),
        Err(Error::UnknownNode { .. })
    ));
    hierarchy.push_child(Hierarchy::ROOT, "c");
    assert!(matches!(
        hierarchy.find_visible("c"),
        Err(Error::DuplicateIdentity { .. })
    ));
}
