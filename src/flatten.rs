use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::hierarchy::{Hierarchy, NodeIndex};
use crate::point::Point;

/// Box drawn for a node, centered on its position.
///
/// `width` runs along the primary axis (horizontal on screen), `height` along the cross axis.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct NodeShape {
    pub width: f64,
    pub height: f64,
}

impl NodeShape {
    /// Offset of the top left corner relative to the center, as `(primary, cross)`.
    #[must_use]
    pub fn offset(&self) -> (f64, f64) {
        (-self.width / 2.0, -self.height / 2.0)
    }

    #[must_use]
    pub fn contains(&self, center: Point, point: Point) -> bool {
        (point.y - center.y).abs() <= self.width / 2.0
            && (point.x - center.x).abs() <= self.height / 2.0
    }
}

/// How node boxes are sized from the measured label extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBox {
    padding: f64,
    height: f64,
}

impl Default for NodeBox {
    fn default() -> Self {
        Self {
            padding: 20.0,
            height: 20.0,
        }
    }
}

impl NodeBox {
    /// Added to the measured label extent.
    #[must_use]
    pub const fn padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    #[must_use]
    pub const fn height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    #[must_use]
    pub fn shape(&self, measured_extent: Option<f64>) -> NodeShape {
        NodeShape {
            width: measured_extent.unwrap_or(0.0) + self.padding,
            height: self.height,
        }
    }
}

/// Both ends of an edge.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct EdgePath {
    pub source: Point,
    pub target: Point,
}

impl EdgePath {
    /// An edge of zero length sitting at `point`.
    #[must_use]
    pub const fn collapsed(point: Point) -> Self {
        Self {
            source: point,
            target: point,
        }
    }
}

/// A node reachable from the root through visible children.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleNode {
    pub key: String,
    pub index: NodeIndex,
    pub depth: usize,
    pub position: Point,
    pub shape: NodeShape,
    /// The node is collapsed and can be expanded.
    pub has_hidden_children: bool,
    pub has_visible_children: bool,
}

/// An edge between two visible nodes, identified by the key of its child.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleEdge {
    pub key: String,
    pub path: EdgePath,
}

/// The visible nodes and edges of one layout pass, addressable by identity key.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VisibleSet {
    nodes: Vec<VisibleNode>,
    edges: Vec<VisibleEdge>,
    by_key: HashMap<String, usize>,
}

impl VisibleSet {
    /// Flatten the visible part of `hierarchy` in pre-order.
    ///
    /// # Errors
    ///
    /// Errors when two visible nodes share an identity key.
    pub fn collect(hierarchy: &Hierarchy, node_box: &NodeBox) -> Result<Self> {
        let visible = hierarchy.visible();
        let mut set = Self {
            nodes: Vec::with_capacity(visible.len()),
            edges: Vec::with_capacity(visible.len().saturating_sub(1)),
            by_key: HashMap::with_capacity(visible.len()),
        };

        for index in visible {
            let node = hierarchy.node(index);
            if set.by_key.insert(node.id.clone(), set.nodes.len()).is_some() {
                return Err(Error::DuplicateIdentity {
                    id: node.id.clone(),
                });
            }
            set.nodes.push(VisibleNode {
                key: node.id.clone(),
                index,
                depth: node.depth,
                position: node.position,
                shape: node_box.shape(node.measured_extent),
                has_hidden_children: node.is_collapsed(),
                has_visible_children: !node.visible_children.is_empty(),
            });
            if let Some(parent) = node.parent {
                set.edges.push(VisibleEdge {
                    key: node.id.clone(),
                    path: EdgePath {
                        source: hierarchy.node(parent).position,
                        target: node.position,
                    },
                });
            }
        }
        Ok(set)
    }

    #[must_use]
    pub fn nodes(&self) -> &[VisibleNode] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[VisibleEdge] {
        &self.edges
    }

    #[must_use]
    pub fn node(&self, key: &str) -> Option<&VisibleNode> {
        self.by_key.get(key).map(|position| &self.nodes[*position])
    }

    /// The edge leading to the node with `key`.
    #[must_use]
    pub fn edge(&self, key: &str) -> Option<&VisibleEdge> {
        // Every node but the root has exactly one edge, in the same order.
        let position = self.by_key.get(key)?.checked_sub(1)?;
        self.edges.get(position)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collapse::collapse_below_root;

    #[test]
    fn nothing_collapsed_is_everything() {
        let hierarchy = Hierarchy::example();
        let set = VisibleSet::collect(&hierarchy, &NodeBox::default()).unwrap();
        assert_eq!(set.len(), 7);
        assert_eq!(set.edges().len(), 6);
    }

    #[test]
    fn collapsed_only_shows_top() {
        let mut hierarchy = Hierarchy::example();
        collapse_below_root(&mut hierarchy);
        let set = VisibleSet::collect(&hierarchy, &NodeBox::default()).unwrap();
        let keys = set
            .nodes()
            .iter()
            .map(|node| node.key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(keys, ["a", "b", "g"]);
        assert!(set.node("b").unwrap().has_hidden_children);
        assert!(!set.node("g").unwrap().has_hidden_children);
        assert!(set.node("a").unwrap().has_visible_children);
        assert!(!set.node("b").unwrap().has_visible_children);
        assert!(!set.contains("c"));
    }

    #[test]
    fn edges_are_found_by_child_key() {
        let hierarchy = Hierarchy::example();
        let set = VisibleSet::collect(&hierarchy, &NodeBox::default()).unwrap();
        for node in set.nodes().iter().skip(1) {
            assert_eq!(set.edge(&node.key).unwrap().key, node.key);
        }
        assert!(set.edge("a").is_none());
        assert!(set.edge("zulu").is_none());
    }

    #[test]
    fn visible_duplicates_are_rejected() {
        let mut hierarchy = Hierarchy::example();
        hierarchy.push_child(hierarchy.root(), "e");
        assert!(VisibleSet::collect(&hierarchy, &NodeBox::default()).is_err());

        // hidden duplicates do not matter until they are visible
        collapse_below_root(&mut hierarchy);
        assert!(VisibleSet::collect(&hierarchy, &NodeBox::default()).is_ok());
    }

    #[test]
    fn shape_uses_padding() {
        let node_box = NodeBox::default().padding(10.0).height(4.0);
        let shape = node_box.shape(Some(30.0));
        assert_eq!(
            shape,
            NodeShape {
                width: 40.0,
                height: 4.0
            }
        );
        assert_eq!(shape.offset(), (-20.0, -2.0));
        let center = Point::new(100.0, 50.0);
        assert!(shape.contains(center, Point::new(101.0, 69.0)));
        assert!(!shape.contains(center, Point::new(103.0, 50.0)));
    }
}
