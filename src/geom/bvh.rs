//! Fixed-depth octree BVH stored as an implicit 8-ary heap.
//!
//! Node `0` is the integer bounding box of the control points. The children of
//! node `p` live at `p * 8 + 1 ..= p * 8 + 8` and are produced by bisecting the
//! parent at its integer midpoint on every axis, regardless of where any points
//! lie. The arena is sized for `depth` levels below the root, but only the
//! first `split_depth` levels are actually subdivided; deeper slots stay at
//! [`TreeNode::default`].

use std::collections::VecDeque;
use std::fmt;

use serde::Deserialize;

use super::core::{BBox, Point3, Vec3};
use crate::debug_draw::{DebugBox, DebugSink, NullSink};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Children per node.
pub const BRANCHING: usize = 8;

/// Deepest arena the builder accepts (`8^7` leaf slots would no longer be a
/// "small fixed tree").
pub const MAX_DEPTH: usize = 6;

/// Index of child `slot` (1..=8) of `parent`.
#[must_use]
pub const fn child_index(parent: usize, slot: usize) -> usize {
    parent * BRANCHING + slot
}

#[must_use]
pub const fn parent_index(index: usize) -> Option<usize> {
    if index == 0 {
        None
    } else {
        Some((index - 1) / BRANCHING)
    }
}

/// Number of slots in levels `0..=level` of a complete 8-ary tree.
#[must_use]
pub const fn nodes_through_level(level: usize) -> usize {
    let mut total = 0;
    let mut width = 1;
    let mut current = 0;
    while current <= level {
        total += width;
        width *= BRANCHING;
        current += 1;
    }
    total
}

/// Level of the slot at `index` (root is level 0).
#[must_use]
pub const fn level_of(index: usize) -> usize {
    let mut level = 0;
    while index >= nodes_through_level(level) {
        level += 1;
    }
    level
}

/// How a point lying exactly on a shared split plane is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryRule {
    /// Upper bounds are exclusive unless they coincide with the root's upper
    /// bound on an axis where the node has width (or the root has none), so
    /// every point inside a non-degenerate root falls in exactly one child.
    #[default]
    #[serde(alias = "half_open", alias = "halfopen")]
    HalfOpen,
    /// Every bound is inclusive; points on split planes match every adjacent
    /// child.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BvhOptions {
    /// Levels of capacity below the root.
    pub depth: usize,
    /// Levels below the root that are actually subdivided; `<= depth`.
    pub split_depth: usize,
    pub boundary: BoundaryRule,
}

impl Default for BvhOptions {
    fn default() -> Self {
        Self {
            depth: 3,
            split_depth: 2,
            boundary: BoundaryRule::HalfOpen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QueryOptions {
    /// Distance every node box is grown by during containment tests.
    pub margin: f64,
}

/// Integer axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeNode {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl TreeNode {
    #[must_use]
    pub const fn new(min: [i32; 3], max: [i32; 3]) -> Self {
        Self {
            min_x: min[0],
            max_x: max[0],
            min_y: min[1],
            max_y: max[1],
            min_z: min[2],
            max_z: max[2],
        }
    }

    /// Smallest integer box enclosing `bbox`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn enclosing(bbox: BBox) -> Self {
        Self::new(
            [
                bbox.min.x.floor() as i32,
                bbox.min.y.floor() as i32,
                bbox.min.z.floor() as i32,
            ],
            [
                bbox.max.x.ceil() as i32,
                bbox.max.y.ceil() as i32,
                bbox.max.z.ceil() as i32,
            ],
        )
    }

    #[must_use]
    pub const fn min(&self) -> [i32; 3] {
        [self.min_x, self.min_y, self.min_z]
    }

    #[must_use]
    pub const fn max(&self) -> [i32; 3] {
        [self.max_x, self.max_y, self.max_z]
    }

    /// Integer midpoint per axis, truncated toward zero.
    #[must_use]
    pub fn midpoint(&self) -> [i32; 3] {
        [
            midpoint(self.min_x, self.max_x),
            midpoint(self.min_y, self.max_y),
            midpoint(self.min_z, self.max_z),
        ]
    }

    #[must_use]
    pub fn center(&self) -> Point3 {
        self.to_bbox().center()
    }

    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        self.to_bbox().half_extents()
    }

    #[must_use]
    pub fn to_bbox(&self) -> BBox {
        let [min_x, min_y, min_z] = self.min().map(f64::from);
        let [max_x, max_y, max_z] = self.max().map(f64::from);
        BBox::new(
            Point3::new(min_x, min_y, min_z),
            Point3::new(max_x, max_y, max_z),
        )
    }

    #[must_use]
    pub fn volume(&self) -> i64 {
        let [dx, dy, dz] = [
            i64::from(self.max_x) - i64::from(self.min_x),
            i64::from(self.max_y) - i64::from(self.min_y),
            i64::from(self.max_z) - i64::from(self.min_z),
        ];
        dx * dy * dz
    }

    /// Inclusive containment on every axis.
    #[must_use]
    pub fn contains(&self, point: Point3) -> bool {
        self.to_bbox().contains_point(point)
    }

    #[must_use]
    pub fn contains_node(&self, other: &Self) -> bool {
        let (min, max) = (self.min(), self.max());
        let (other_min, other_max) = (other.min(), other.max());
        (0..3).all(|axis| min[axis] <= other_min[axis] && other_max[axis] <= max[axis])
    }

    /// The eight octants in slot order 1..=8: the upper Z half first, then the
    /// lower one, each as `(-X,+Y)`, `(+X,+Y)`, `(-X,-Y)`, `(+X,-Y)`.
    #[must_use]
    pub fn octants(&self) -> [Self; BRANCHING] {
        let [mid_x, mid_y, mid_z] = self.midpoint();
        let low_x = (self.min_x, mid_x);
        let high_x = (mid_x, self.max_x);
        let low_y = (self.min_y, mid_y);
        let high_y = (mid_y, self.max_y);
        let low_z = (self.min_z, mid_z);
        let high_z = (mid_z, self.max_z);

        let octant = |x: (i32, i32), y: (i32, i32), z: (i32, i32)| {
            Self::new([x.0, y.0, z.0], [x.1, y.1, z.1])
        };

        [
            octant(low_x, high_y, high_z),
            octant(high_x, high_y, high_z),
            octant(low_x, low_y, high_z),
            octant(high_x, low_y, high_z),
            octant(low_x, high_y, low_z),
            octant(high_x, high_y, low_z),
            octant(low_x, low_y, low_z),
            octant(high_x, low_y, low_z),
        ]
    }

    fn contains_with(&self, point: Point3, root: &Self, rule: BoundaryRule, margin: f64) -> bool {
        let coords = point.to_array();
        let min = self.min();
        let max = self.max();
        let root_min = root.min();
        let root_max = root.max();

        (0..3).all(|axis| {
            let lo = f64::from(min[axis]) - margin;
            let hi = f64::from(max[axis]) + margin;
            let p = coords[axis];
            if p < lo {
                return false;
            }
            match rule {
                BoundaryRule::Closed => p <= hi,
                BoundaryRule::HalfOpen => {
                    // Zero-width halves on the root's upper face defer to their sibling.
                    let closes_root = max[axis] == root_max[axis]
                        && (min[axis] < max[axis] || root_min[axis] == root_max[axis]);
                    p < hi || (closes_root && p <= hi)
                }
            }
        })
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X {}~{}, Y {}~{}, Z {}~{}",
            self.min_x, self.max_x, self.min_y, self.max_y, self.min_z, self.max_z
        )
    }
}

#[allow(clippy::cast_possible_truncation)]
fn midpoint(a: i32, b: i32) -> i32 {
    ((i64::from(a) + i64::from(b)) / 2) as i32
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bvh {
    nodes: Vec<TreeNode>,
    depth: usize,
    split_depth: usize,
    boundary: BoundaryRule,
}

impl Bvh {
    /// Builds the tree over the bounding box of `control_points`.
    ///
    /// Returns `None` when there are no points. `options.depth` is clamped to
    /// [`MAX_DEPTH`] and `options.split_depth` to `options.depth`; configuration
    /// validation rejects both cases before they get here.
    #[must_use]
    pub fn build(control_points: &[Point3], options: &BvhOptions) -> Option<Self> {
        let bbox = BBox::from_points(control_points)?;
        Some(Self::build_in(TreeNode::enclosing(bbox), options))
    }

    /// Builds the tree below an explicit root box.
    #[must_use]
    pub fn build_in(root: TreeNode, options: &BvhOptions) -> Self {
        let depth = options.depth.min(MAX_DEPTH);
        let split_depth = options.split_depth.min(depth);

        let mut bvh = Self {
            nodes: vec![TreeNode::default(); nodes_through_level(depth)],
            depth,
            split_depth,
            boundary: options.boundary,
        };
        bvh.nodes[0] = root;

        // Parents always precede their children in index order.
        for index in 0..bvh.internal_len() {
            bvh.split_node(index);
        }

        log::debug!(
            "built bvh: root [{root}], {} of {} slots populated",
            bvh.populated_len(),
            bvh.nodes.len()
        );
        bvh
    }

    fn split_node(&mut self, index: usize) {
        let octants = self.nodes[index].octants();
        for (offset, octant) in octants.into_iter().enumerate() {
            self.nodes[child_index(index, offset + 1)] = octant;
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    #[must_use]
    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    /// Total slots in the arena, populated or not.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub const fn split_depth(&self) -> usize {
        self.split_depth
    }

    #[must_use]
    pub const fn boundary(&self) -> BoundaryRule {
        self.boundary
    }

    /// Slots that received geometry from the builder.
    #[must_use]
    pub const fn populated_len(&self) -> usize {
        nodes_through_level(self.split_depth)
    }

    #[must_use]
    pub const fn is_populated(&self, index: usize) -> bool {
        index < self.populated_len()
    }

    /// Nodes that were subdivided and are expanded during traversal.
    #[must_use]
    pub const fn internal_len(&self) -> usize {
        if self.split_depth == 0 {
            0
        } else {
            nodes_through_level(self.split_depth - 1)
        }
    }

    /// Largest index treated as internal during traversal; `None` when even the
    /// root is terminal.
    #[must_use]
    pub const fn leaf_threshold(&self) -> Option<usize> {
        self.internal_len().checked_sub(1)
    }

    #[must_use]
    pub const fn is_internal(&self, index: usize) -> bool {
        index < self.internal_len()
    }

    /// Indices of every node containing `point`, in breadth-first order.
    #[must_use]
    pub fn locate(&self, point: Point3) -> Vec<usize> {
        self.locate_with(point, &QueryOptions::default(), &mut NullSink)
    }

    /// Breadth-first point location. Each match is drawn on `sink`; internal
    /// matches have their children queued, terminal matches end their branch.
    pub fn locate_with<S: DebugSink>(
        &self,
        point: Point3,
        query: &QueryOptions,
        sink: &mut S,
    ) -> Vec<usize> {
        let root = self.root();
        let mut matches = Vec::new();
        let mut queue = VecDeque::from([0usize]);

        while let Some(index) = queue.pop_front() {
            let node = &self.nodes[index];
            log::trace!("visit node {index}: {node}");

            if !node.contains_with(point, root, self.boundary, query.margin) {
                continue;
            }

            log::debug!("node {index} contains query point: {node}");
            sink.draw_box(&DebugBox::located(node.center(), node.half_extents()));
            matches.push(index);

            if self.is_internal(index) {
                queue.extend(
                    (1..=BRANCHING)
                        .map(|slot| child_index(index, slot))
                        .filter(|&child| child < self.nodes.len()),
                );
            }
        }

        matches
    }

    /// Locates a batch of independent points without drawing.
    #[must_use]
    pub fn locate_many(&self, points: &[Point3], query: &QueryOptions) -> Vec<Vec<usize>> {
        locate_batch(self, points, query)
    }
}

#[cfg(feature = "parallel")]
fn locate_batch(bvh: &Bvh, points: &[Point3], query: &QueryOptions) -> Vec<Vec<usize>> {
    points
        .par_iter()
        .map(|&point| bvh.locate_with(point, query, &mut NullSink))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn locate_batch(bvh: &Bvh, points: &[Point3], query: &QueryOptions) -> Vec<Vec<usize>> {
    points
        .iter()
        .map(|&point| bvh.locate_with(point, query, &mut NullSink))
        .collect()
}
