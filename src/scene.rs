use std::time::{Duration, Instant};

use crate::adapter::RenderAdapter;
use crate::animation::{Transition, Transitions};
use crate::flatten::{EdgePath, NodeShape};
use crate::point::Point;
use crate::reconcile::{Changes, EdgeTransition, NodeTransition};

/// Everything needed to draw a node besides its position.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct NodeLook {
    pub shape: NodeShape,
    pub has_hidden_children: bool,
    pub has_visible_children: bool,
}

/// A [`RenderAdapter`] keeping every element animated between render passes.
///
/// The scene has its own clock which is moved forward with [`advance`](Self::advance).
/// New transitions start at the current clock, [`frame`](Self::frame) samples the elements at it.
///
/// # Example
///
/// ```
/// # use std::time::Instant;
/// # use tui_tree_diagram::{Scene, TreeSession};
/// let raw = serde_json::json!([{ "valor": "root", "subnodos": [{ "valor": "leaf" }] }]);
/// let mut session = TreeSession::default();
/// let mut scene = Scene::new(Instant::now());
///
/// session.load(&mut raw.clone())?.present(&mut scene);
/// assert_eq!(scene.frame().nodes.len(), 2);
/// # Ok::<(), tui_tree_diagram::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Transitions<Point, NodeLook>,
    edges: Transitions<EdgePath>,
    clock: Instant,
    duration: Duration,
}

impl Scene {
    #[must_use]
    pub fn new(now: Instant) -> Self {
        Self {
            nodes: Transitions::default(),
            edges: Transitions::default(),
            clock: now,
            duration: Duration::from_millis(500),
        }
    }

    /// How long every transition takes.
    #[must_use]
    pub const fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub const fn clock(&self) -> Instant {
        self.clock
    }

    /// Move the clock to `now` and drop the exiting elements which arrived.
    ///
    /// Returns `true` while anything is still moving.
    pub fn advance(&mut self, now: Instant) -> bool {
        self.clock = now.max(self.clock);
        let removed = self.nodes.prune(self.clock) + self.edges.prune(self.clock);
        if removed > 0 {
            log::trace!("removed {removed} exited elements");
        }
        self.is_animating()
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.nodes.is_animating(self.clock) || self.edges.is_animating(self.clock)
    }

    /// The elements as they are at the current clock.
    #[must_use]
    pub fn frame(&self) -> SceneFrame {
        SceneFrame {
            nodes: self
                .nodes
                .sample(self.clock)
                .map(|(key, look, position, exiting)| FrameNode {
                    key: key.to_owned(),
                    position,
                    look: *look,
                    exiting,
                })
                .collect(),
            edges: self
                .edges
                .sample(self.clock)
                .map(|(key, _, path, exiting)| FrameEdge {
                    key: key.to_owned(),
                    path,
                    exiting,
                })
                .collect(),
        }
    }

    fn transition<V>(&self, from: V, to: V) -> Transition<V> {
        Transition {
            from,
            to,
            start: self.clock,
            duration: self.duration,
        }
    }
}

impl RenderAdapter for Scene {
    fn render_nodes(&mut self, nodes: &Changes<NodeTransition>) {
        // an entering key may still be on its way out from an earlier pass
        for node in &nodes.entering {
            let look = look(node);
            let transition = self.transition(node.from, node.to);
            self.nodes.retarget(&node.key, look, transition, false);
        }
        for node in &nodes.updating {
            let look = look(node);
            let transition = self.transition(node.from, node.to);
            self.nodes.retarget(&node.key, look, transition, false);
        }
        for node in &nodes.exiting {
            let look = look(node);
            let transition = self.transition(node.from, node.to);
            self.nodes.retarget(&node.key, look, transition, true);
        }
    }

    fn render_edges(&mut self, edges: &Changes<EdgeTransition>) {
        for edge in &edges.entering {
            let transition = self.transition(edge.from, edge.to);
            self.edges.retarget(&edge.key, (), transition, false);
        }
        for edge in &edges.updating {
            let transition = self.transition(edge.from, edge.to);
            self.edges.retarget(&edge.key, (), transition, false);
        }
        for edge in &edges.exiting {
            let transition = self.transition(edge.from, edge.to);
            self.edges.retarget(&edge.key, (), transition, true);
        }
    }
}

const fn look(node: &NodeTransition) -> NodeLook {
    NodeLook {
        shape: node.shape,
        has_hidden_children: node.has_hidden_children,
        has_visible_children: node.has_visible_children,
    }
}

/// A node sampled from a [`Scene`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrameNode {
    pub key: String,
    pub position: Point,
    pub look: NodeLook,
    pub exiting: bool,
}

/// An edge sampled from a [`Scene`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEdge {
    pub key: String,
    pub path: EdgePath,
    pub exiting: bool,
}

/// Snapshot of a [`Scene`], ready to be drawn.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SceneFrame {
    pub nodes: Vec<FrameNode>,
    pub edges: Vec<FrameEdge>,
}

impl SceneFrame {
    /// The topmost node whose box contains `point`. Exiting nodes can not be hit.
    #[must_use]
    pub fn node_at(&self, point: Point) -> Option<&FrameNode> {
        self.nodes
            .iter()
            .rev()
            .filter(|node| !node.exiting)
            .find(|node| node.look.shape.contains(node.position, point))
    }
}
