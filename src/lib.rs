#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]

/*!
Collapsible tree diagrams for the terminal.

A [`TreeSession`] builds a [`Hierarchy`] from nested JSON records, keeps which subtrees are collapsed
and lays the visible part out with a tidy tree layout ([`LayoutEngine`]).
Every command ([`Command`]) results in a [`Reconciliation`]: the visible nodes and edges classified
into entering, updating and exiting, each with where it starts and where it ends.

The [`Scene`] turns these into running transitions and the [`TreeDiagram`] widget draws a sampled
[`SceneFrame`] with ratatui. Anything else implementing [`RenderAdapter`] can be used instead.
*/

mod adapter;
mod animation;
mod builder;
mod collapse;
mod diagram;
mod error;
mod flatten;
mod hierarchy;
mod layout;
mod point;
mod reconcile;
mod scene;
mod session;

pub use crate::adapter::{DataSource, JsonFile, RenderAdapter, TextMeasurer, UnicodeWidthMeasurer};
pub use crate::animation::{ease_cubic_in_out, Interpolate, Transition, Transitions};
pub use crate::builder::{ExtraRoots, HierarchyBuilder};
pub use crate::collapse::{
    collapse_below_root, collapse_subtree, expand_all, toggle, Expansion, Toggled,
};
pub use crate::diagram::{link_horizontal, TreeDiagram};
pub use crate::error::{Error, LoadError, Result};
pub use crate::flatten::{EdgePath, NodeBox, NodeShape, VisibleEdge, VisibleNode, VisibleSet};
pub use crate::hierarchy::{Hierarchy, NodeIndex, TreeNode};
pub use crate::layout::{default_separation, LayoutEngine, Separation};
pub use crate::point::Point;
pub use crate::reconcile::{
    reconcile, snapshot_positions, Anchor, Changes, EdgeTransition, NodeTransition, Reconciliation,
};
pub use crate::scene::{FrameEdge, FrameNode, NodeLook, Scene, SceneFrame};
pub use crate::session::{Command, LoadState, TreeSession};
