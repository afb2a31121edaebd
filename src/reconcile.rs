use crate::adapter::RenderAdapter;
use crate::flatten::{EdgePath, NodeShape, VisibleSet};
use crate::hierarchy::Hierarchy;
use crate::point::Point;

/// Items of one render pass, classified against the previous pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Changes<T> {
    /// Only in the new pass
    pub entering: Vec<T>,
    /// In both passes
    pub updating: Vec<T>,
    /// Only in the previous pass
    pub exiting: Vec<T>,
}

impl<T> Default for Changes<T> {
    fn default() -> Self {
        Self {
            entering: Vec::new(),
            updating: Vec::new(),
            exiting: Vec::new(),
        }
    }
}

impl<T> Changes<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entering.len() + self.updating.len() + self.exiting.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entering, then updating, then exiting items.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entering
            .iter()
            .chain(&self.updating)
            .chain(&self.exiting)
    }
}

/// Motion of a node between two render passes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTransition {
    pub key: String,
    pub from: Point,
    pub to: Point,
    pub shape: NodeShape,
    pub has_hidden_children: bool,
    pub has_visible_children: bool,
}

/// Motion of an edge between two render passes. Keyed by its child node.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeTransition {
    pub key: String,
    pub from: EdgePath,
    pub to: EdgePath,
}

/// Where the node which triggered an update was before and after the layout.
///
/// Entering items grow out of `previous`, exiting items shrink into `current`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub previous: Point,
    pub current: Point,
}

/// Result of [`reconcile`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Reconciliation {
    pub anchor: Anchor,
    pub nodes: Changes<NodeTransition>,
    pub edges: Changes<EdgeTransition>,
}

impl Reconciliation {
    /// Hand the transitions to a [`RenderAdapter`]. Edges first so nodes are drawn on top.
    pub fn present<R>(&self, adapter: &mut R)
    where
        R: RenderAdapter + ?Sized,
    {
        adapter.render_edges(&self.edges);
        adapter.render_nodes(&self.nodes);
    }
}

/// Match two render passes by identity key.
///
/// Updating and exiting items start where the previous pass put them.
/// Entering items start at the previous anchor position and exiting items end at the current one.
/// Neither set nor the hierarchy is changed.
#[must_use]
pub fn reconcile(previous: &VisibleSet, next: &VisibleSet, anchor: Anchor) -> Reconciliation {
    let mut nodes = Changes::default();
    for node in next.nodes() {
        let (from, changes) = match previous.node(&node.key) {
            Some(before) => (before.position, &mut nodes.updating),
            None => (anchor.previous, &mut nodes.entering),
        };
        changes.push(NodeTransition {
            key: node.key.clone(),
            from,
            to: node.position,
            shape: node.shape,
            has_hidden_children: node.has_hidden_children,
            has_visible_children: node.has_visible_children,
        });
    }
    nodes.exiting = previous
        .nodes()
        .iter()
        .filter(|node| !next.contains(&node.key))
        .map(|node| NodeTransition {
            key: node.key.clone(),
            from: node.position,
            to: anchor.current,
            shape: node.shape,
            has_hidden_children: node.has_hidden_children,
            has_visible_children: node.has_visible_children,
        })
        .collect();

    let mut edges = Changes::default();
    for edge in next.edges() {
        let (from, changes) = match previous.edge(&edge.key) {
            Some(before) => (before.path, &mut edges.updating),
            None => (EdgePath::collapsed(anchor.previous), &mut edges.entering),
        };
        changes.push(EdgeTransition {
            key: edge.key.clone(),
            from,
            to: edge.path,
        });
    }
    edges.exiting = previous
        .edges()
        .iter()
        .filter(|edge| next.edge(&edge.key).is_none())
        .map(|edge| EdgeTransition {
            key: edge.key.clone(),
            from: edge.path,
            to: EdgePath::collapsed(anchor.current),
        })
        .collect();

    log::debug!(
        "reconciled nodes +{} ~{} -{}, edges +{} ~{} -{}",
        nodes.entering.len(),
        nodes.updating.len(),
        nodes.exiting.len(),
        edges.entering.len(),
        edges.updating.len(),
        edges.exiting.len(),
    );
    Reconciliation {
        anchor,
        nodes,
        edges,
    }
}

/// Remember the current layout as the animation source of the next reconciliation.
pub fn snapshot_positions(hierarchy: &mut Hierarchy) {
    for node in &mut hierarchy.nodes {
        node.previous_position = node.position;
    }
}
