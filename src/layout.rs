/*!
Tidy tree layout of the visible part of a [`Hierarchy`].

This is the Buchheim, Jünger and Leipert variant of the Reingold-Tilford algorithm:
a post-order walk places every subtree next to its left siblings using their contours,
a pre-order walk accumulates the modifiers into final cross-axis coordinates.
The result is then scaled into the configured extents and every depth is put on its own rank line.

Collapsed nodes are laid out as leaves, their hidden descendants keep whatever position they had.
*/

use crate::hierarchy::{Hierarchy, NodeIndex, TreeNode};
use crate::point::Point;

/// Distance between two neighbouring nodes on the same depth, in units of the narrowest spacing.
pub type Separation = fn(&TreeNode, &TreeNode) -> f64;

/// Siblings get unit spacing, cousins double spacing. Both shrink with the depth.
///
/// Depth 0 only ever holds the root, it is treated as depth 1 to avoid dividing by zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn default_separation(a: &TreeNode, b: &TreeNode) -> f64 {
    let base = if a.parent() == b.parent() { 1.0 } else { 2.0 };
    base / a.depth().max(1) as f64
}

/// Computes [`TreeNode::position`] for every visible node.
///
/// The cross axis spans `0..=cross_extent`, the primary axis spans `0..=primary_extent` with the root at `0`.
#[derive(Clone, Copy)]
pub struct LayoutEngine {
    cross_extent: f64,
    primary_extent: f64,
    separation: Separation,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            cross_extent: 800.0,
            primary_extent: 960.0,
            separation: default_separation,
        }
    }
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("cross_extent", &self.cross_extent)
            .field("primary_extent", &self.primary_extent)
            .finish_non_exhaustive()
    }
}

impl LayoutEngine {
    /// Extent along the sibling axis. Shown as the height of the diagram.
    #[must_use]
    pub const fn cross_extent(mut self, extent: f64) -> Self {
        self.cross_extent = extent;
        self
    }

    /// Extent along the depth axis. Shown as the width of the diagram.
    #[must_use]
    pub const fn primary_extent(mut self, extent: f64) -> Self {
        self.primary_extent = extent;
        self
    }

    #[must_use]
    pub const fn separation(mut self, separation: Separation) -> Self {
        self.separation = separation;
        self
    }

    #[must_use]
    pub const fn extents(&self) -> (f64, f64) {
        (self.cross_extent, self.primary_extent)
    }

    /// Where a lone root ends up. Used as the animation source of the first render.
    #[must_use]
    pub fn default_anchor(&self) -> Point {
        Point::new(self.cross_extent / 2.0, 0.0)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn layout(&self, hierarchy: &mut Hierarchy) {
        let raw = Walk::run(hierarchy, self.separation);
        let visible = hierarchy.visible();

        let root = hierarchy.root();
        let (mut left, mut right, mut bottom) = (root, root, root);
        for &index in &visible {
            if raw[index.0] < raw[left.0] {
                left = index;
            }
            if raw[index.0] > raw[right.0] {
                right = index;
            }
            if hierarchy.node(index).depth > hierarchy.node(bottom).depth {
                bottom = index;
            }
        }

        let s = if left == right {
            1.0
        } else {
            (self.separation)(hierarchy.node(left), hierarchy.node(right)) / 2.0
        };
        let tx = s - raw[left.0];
        let kx = self.cross_extent / (raw[right.0] + s + tx);
        let ky = self.primary_extent / hierarchy.node(bottom).depth.max(1) as f64;
        log::trace!(
            "layout of {} visible nodes, {} ranks, cross scale {kx}",
            visible.len(),
            hierarchy.node(bottom).depth + 1
        );

        for index in visible {
            let node = hierarchy.node_mut(index);
            node.position = Point::new((raw[index.0] + tx) * kx, node.depth as f64 * ky);
        }
    }
}

#[derive(Debug)]
struct Walker {
    node: NodeIndex,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Position among the siblings
    number: usize,
    ancestor: usize,
    /// Greatest distinct ancestor used by the apportion of the next child
    default_ancestor: Option<usize>,
    thread: Option<usize>,
    prelim: f64,
    modifier: f64,
    change: f64,
    shift: f64,
}

struct Walk<'h> {
    hierarchy: &'h Hierarchy,
    separation: Separation,
    walkers: Vec<Walker>,
}

impl<'h> Walk<'h> {
    /// Raw cross-axis coordinates indexed by [`NodeIndex`]. Hidden nodes are `NaN`.
    fn run(hierarchy: &'h Hierarchy, separation: Separation) -> Vec<f64> {
        let mut walk = Self {
            hierarchy,
            separation,
            walkers: vec![Walker::new(hierarchy.root(), None, 0, 0)],
        };
        let mut stack = vec![0];
        while let Some(parent) = stack.pop() {
            let node = walk.walkers[parent].node;
            for (number, &child) in hierarchy.node(node).visible_children.iter().enumerate() {
                let index = walk.walkers.len();
                walk.walkers.push(Walker::new(child, Some(parent), number, index));
                walk.walkers[parent].children.push(index);
                stack.push(index);
            }
        }

        walk.first_walk(0);
        walk.second_walk()
    }

    fn separation(&self, a: usize, b: usize) -> f64 {
        (self.separation)(
            self.hierarchy.node(self.walkers[a].node),
            self.hierarchy.node(self.walkers[b].node),
        )
    }

    fn previous_sibling(&self, v: usize) -> Option<usize> {
        let walker = &self.walkers[v];
        let parent = walker.parent?;
        walker
            .number
            .checked_sub(1)
            .map(|number| self.walkers[parent].children[number])
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        let walker = &self.walkers[v];
        walker.children.first().copied().or(walker.thread)
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        let walker = &self.walkers[v];
        walker.children.last().copied().or(walker.thread)
    }

    fn first_walk(&mut self, v: usize) {
        for position in 0..self.walkers[v].children.len() {
            let child = self.walkers[v].children[position];
            self.first_walk(child);
        }

        let previous = self.previous_sibling(v);
        let extremes = self.walkers[v]
            .children
            .first()
            .copied()
            .zip(self.walkers[v].children.last().copied());
        if let Some((first, last)) = extremes {
            self.execute_shifts(v);
            let midpoint = (self.walkers[first].prelim + self.walkers[last].prelim) / 2.0;
            if let Some(w) = previous {
                let prelim = self.walkers[w].prelim + self.separation(v, w);
                self.walkers[v].prelim = prelim;
                self.walkers[v].modifier = prelim - midpoint;
            } else {
                self.walkers[v].prelim = midpoint;
            }
        } else if let Some(w) = previous {
            self.walkers[v].prelim = self.walkers[w].prelim + self.separation(v, w);
        }

        if let Some(parent) = self.walkers[v].parent {
            let parent_walker = &self.walkers[parent];
            let ancestor = parent_walker
                .default_ancestor
                .unwrap_or(parent_walker.children[0]);
            let ancestor = self.apportion(v, previous, ancestor);
            self.walkers[parent].default_ancestor = Some(ancestor);
        }
    }

    /// Push the subtree of `v` away from its left siblings until their contours are separated.
    #[allow(clippy::similar_names)]
    fn apportion(&mut self, v: usize, previous: Option<usize>, mut ancestor: usize) -> usize {
        let Some(w) = previous else {
            return ancestor;
        };
        let Some(parent) = self.walkers[v].parent else {
            return ancestor;
        };

        let (mut vip, mut vop, mut vim) = (v, v, w);
        let mut vom = self.walkers[parent].children[0];
        let mut sip = self.walkers[vip].modifier;
        let mut sop = self.walkers[vop].modifier;
        let mut sim = self.walkers[vim].modifier;
        let mut som = self.walkers[vom].modifier;

        let mut next_vim = self.next_right(vim);
        let mut next_vip = self.next_left(vip);
        while let (Some(inner_left), Some(inner_right)) = (next_vim, next_vip) {
            vim = inner_left;
            vip = inner_right;
            vom = self.next_left(vom).unwrap_or(vom);
            vop = self.next_right(vop).unwrap_or(vop);
            self.walkers[vop].ancestor = v;

            let shift = self.walkers[vim].prelim + sim - self.walkers[vip].prelim - sip
                + self.separation(vim, vip);
            if shift > 0.0 {
                let moved = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(moved, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.walkers[vim].modifier;
            sip += self.walkers[vip].modifier;
            som += self.walkers[vom].modifier;
            sop += self.walkers[vop].modifier;

            next_vim = self.next_right(vim);
            next_vip = self.next_left(vip);
        }

        if next_vim.is_some() && self.next_right(vop).is_none() {
            self.walkers[vop].thread = next_vim;
            self.walkers[vop].modifier += sim - sop;
        }
        if next_vip.is_some() && self.next_left(vom).is_none() {
            self.walkers[vom].thread = next_vip;
            self.walkers[vom].modifier += sip - som;
            ancestor = v;
        }
        ancestor
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        let candidate = self.walkers[vim].ancestor;
        if self.walkers[candidate].parent == self.walkers[v].parent {
            candidate
        } else {
            ancestor
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
        let subtrees = self.walkers[wp].number as f64 - self.walkers[wm].number as f64;
        let change = shift / subtrees;
        let right = &mut self.walkers[wp];
        right.change -= change;
        right.shift += shift;
        right.prelim += shift;
        right.modifier += shift;
        self.walkers[wm].change += change;
    }

    /// Spread the shifts collected by [`move_subtree`](Self::move_subtree) over the children of `v`.
    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        for position in (0..self.walkers[v].children.len()).rev() {
            let child = self.walkers[v].children[position];
            let walker = &mut self.walkers[child];
            walker.prelim += shift;
            walker.modifier += shift;
            change += walker.change;
            shift += walker.shift + change;
        }
    }

    fn second_walk(&mut self) -> Vec<f64> {
        let mut raw = vec![f64::NAN; self.hierarchy.len()];
        let root_modifier = -self.walkers[0].prelim;
        let mut stack = vec![(0, root_modifier)];
        while let Some((v, parent_modifier)) = stack.pop() {
            let walker = &mut self.walkers[v];
            raw[walker.node.0] = walker.prelim + parent_modifier;
            walker.modifier += parent_modifier;
            let modifier = walker.modifier;
            stack.extend(walker.children.iter().map(|&child| (child, modifier)));
        }
        raw
    }
}

impl Walker {
    const fn new(node: NodeIndex, parent: Option<usize>, number: usize, index: usize) -> Self {
        Self {
            node,
            parent,
            children: Vec::new(),
            number,
            ancestor: index,
            default_ancestor: None,
            thread: None,
            prelim: 0.0,
            modifier: 0.0,
            change: 0.0,
            shift: 0.0,
        }
    }
}
