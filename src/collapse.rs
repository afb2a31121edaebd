use crate::hierarchy::{Hierarchy, NodeIndex};

/// Whether the children of a node are shown.
///
/// Leaves have nothing to hide and count as expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    Expanded,
    Collapsed,
}

/// What a [`toggle`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    /// The visible children were hidden.
    Collapsed,
    /// The hidden children are visible again. The layout needs to be recomputed.
    Expanded,
    /// Leaves and the root do not change.
    Unchanged,
}

impl Hierarchy {
    #[must_use]
    pub fn expansion(&self, index: NodeIndex) -> Expansion {
        if self.node(index).is_collapsed() {
            Expansion::Collapsed
        } else {
            Expansion::Expanded
        }
    }
}

/// Hide the children of `index` and collapse everything below them as well.
///
/// Nodes which are already collapsed keep their hidden subtree untouched.
///
/// Returns `true` when anything was hidden.
pub fn collapse_subtree(hierarchy: &mut Hierarchy, index: NodeIndex) -> bool {
    let node = hierarchy.node_mut(index);
    if node.visible_children.is_empty() {
        return false;
    }
    node.hidden_children = std::mem::take(&mut node.visible_children);
    let hidden = node.hidden_children.clone();
    for child in hidden {
        collapse_subtree(hierarchy, child);
    }
    true
}

/// The startup state: the root and its children are visible, everything deeper is hidden.
///
/// Returns `true` when anything was hidden.
pub fn collapse_below_root(hierarchy: &mut Hierarchy) -> bool {
    let children = hierarchy.node(hierarchy.root()).visible_children.clone();
    children
        .into_iter()
        .fold(false, |changed, child| collapse_subtree(hierarchy, child) | changed)
}

/// Show every hidden subtree.
///
/// Returns `true` when anything was shown.
pub fn expand_all(hierarchy: &mut Hierarchy) -> bool {
    let mut changed = false;
    let mut stack = vec![hierarchy.root()];
    while let Some(index) = stack.pop() {
        let node = hierarchy.node_mut(index);
        if !node.hidden_children.is_empty() {
            node.visible_children = std::mem::take(&mut node.hidden_children);
            changed = true;
        }
        stack.extend(node.visible_children.iter());
    }
    changed
}

/// Flip the collapse state of a single node.
///
/// Collapsing does not touch the state stored deeper in the hidden subtree,
/// so expanding it again restores what was visible before.
pub fn toggle(hierarchy: &mut Hierarchy, index: NodeIndex) -> Toggled {
    if index == hierarchy.root() {
        return Toggled::Unchanged;
    }
    let node = hierarchy.node_mut(index);
    if !node.visible_children.is_empty() {
        node.hidden_children = std::mem::take(&mut node.visible_children);
        Toggled::Collapsed
    } else if !node.hidden_children.is_empty() {
        node.visible_children = std::mem::take(&mut node.hidden_children);
        Toggled::Expanded
    } else {
        Toggled::Unchanged
    }
}
