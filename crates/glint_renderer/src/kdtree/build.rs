//! Surface-area-heuristic kd-tree construction.
//!
//! Grows a binary subdivision of the scene bounds over the committed
//! triangle set. Split candidates are the sorted begin/end extents of the
//! triangles on the chosen axis; each candidate is scored with the SAH cost
//! model and the node is split only when that beats the cost of leaving it a
//! leaf. Nodes live in a transient arena that is discarded after packing.

use glint_core::Scene;
use glint_math::{Aabb, Interval};

/// Cost-model constants for the surface-area heuristic.
#[derive(Debug, Clone, Copy)]
pub struct SahParams {
    /// Cost of one traversal step through an internal node.
    pub traversal_cost: f32,
    /// Cost of one ray/triangle intersection test.
    pub intersect_cost: f32,
    /// Cost discount for splits that cut off an empty sub-box, in [0, 1).
    pub empty_bonus: f32,
}

impl Default for SahParams {
    fn default() -> Self {
        Self {
            traversal_cost: 2.0,
            intersect_cost: 80.0,
            empty_bonus: 0.5,
        }
    }
}

/// Split record kept on internal nodes. `p_below`/`p_above` are the SAH
/// child probabilities, reused for the expected-cost report.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Split {
    pub axis: usize,
    pub pos: f32,
    pub p_below: f32,
    pub p_above: f32,
    pub left: u32,
    pub right: u32,
}

pub(crate) struct BuildNode {
    pub bounds: Aabb,
    pub depth: u32,
    /// Triangle indices; populated on leaves, empty once a node splits.
    pub tris: Vec<u32>,
    pub split: Option<Split>,
}

/// Tree-wide counters reported after the build and checked by packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TreeTotals {
    pub nodes: usize,
    pub leaves: usize,
    pub triangle_refs: usize,
    pub duplicates: usize,
}

/// Arena-backed uncompressed kd-tree. The root is node 0.
pub(crate) struct BuildTree {
    pub nodes: Vec<BuildNode>,
    params: SahParams,
    n_triangles: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    Begin,
    End,
}

#[derive(Clone, Copy)]
struct SweepEvent {
    pos: f32,
    triangle: u32,
    kind: EventKind,
}

struct SweepResult {
    axis: usize,
    pos: f32,
    p_below: f32,
    p_above: f32,
    /// Index of the winning event in `events`.
    offset: usize,
    events: Vec<SweepEvent>,
}

impl BuildTree {
    pub(crate) fn build(scene: &Scene, params: &SahParams) -> BuildTree {
        let n = scene.triangles().len();
        let max_depth = if n >= 2 {
            (n as f32).log2().floor() as u32 + 8
        } else {
            0
        };
        log::debug!("building kd-tree over {n} triangles, max depth {max_depth}");

        let root = BuildNode {
            bounds: scene.bounds(),
            depth: 0,
            tris: (0..n as u32).collect(),
            split: None,
        };
        let mut tree = BuildTree {
            nodes: vec![root],
            params: *params,
            n_triangles: n,
        };
        tree.subdivide(0, scene, max_depth);

        let totals = tree.totals();
        log::debug!(
            "kd-tree: {} triangle refs in {} leaves, {} nodes, {} duplicates",
            totals.triangle_refs,
            totals.leaves,
            totals.nodes,
            totals.duplicates
        );
        log::debug!(
            "estimated cost: {} without tree, {} with tree",
            params.intersect_cost * n as f32,
            tree.expected_cost(0)
        );

        tree
    }

    pub(crate) fn totals(&self) -> TreeTotals {
        let mut leaves = 0;
        let mut triangle_refs = 0;
        for node in &self.nodes {
            if node.split.is_none() {
                leaves += 1;
                triangle_refs += node.tris.len();
            }
        }
        TreeTotals {
            nodes: self.nodes.len(),
            leaves,
            triangle_refs,
            duplicates: triangle_refs - self.n_triangles,
        }
    }

    /// Expected traversal cost of the subtree under the SAH model.
    pub(crate) fn expected_cost(&self, index: u32) -> f32 {
        let node = &self.nodes[index as usize];
        match node.split {
            None => self.params.intersect_cost * node.tris.len() as f32,
            Some(split) => {
                self.params.traversal_cost
                    + split.p_below * self.expected_cost(split.left)
                    + split.p_above * self.expected_cost(split.right)
            }
        }
    }

    fn subdivide(&mut self, index: u32, scene: &Scene, max_depth: u32) {
        let depth = self.nodes[index as usize].depth;
        if depth >= max_depth {
            return;
        }
        if self.nodes[index as usize].tris.len() < 2 {
            return;
        }

        let bounds = self.nodes[index as usize].bounds;
        let tris = std::mem::take(&mut self.nodes[index as usize].tris);

        // Longest axis first; when no worthwhile split exists there, retry
        // the remaining axes in cyclic order.
        let first_axis = bounds.longest_axis();
        let mut chosen = None;
        for retry in 0..3 {
            let axis = (first_axis + retry) % 3;
            if let Some(sweep) = self.sweep_axis(scene, &tris, bounds, axis) {
                chosen = Some(sweep);
                break;
            }
        }
        let Some(sweep) = chosen else {
            self.nodes[index as usize].tris = tris;
            return;
        };

        // Partition by event index, not by comparing positions: coincident
        // begin/end events at the split position land on the side the sort
        // order assigned them.
        let mut left_tris = Vec::new();
        for event in &sweep.events[..sweep.offset] {
            if event.kind == EventKind::Begin {
                left_tris.push(event.triangle);
            }
        }
        let mut right_tris = Vec::new();
        for event in &sweep.events[sweep.offset + 1..] {
            if event.kind == EventKind::End {
                right_tris.push(event.triangle);
            }
        }

        let axis_bounds = bounds.axis_interval(sweep.axis);
        let left_bounds =
            bounds.with_axis_interval(sweep.axis, Interval::new(axis_bounds.min, sweep.pos));
        let right_bounds =
            bounds.with_axis_interval(sweep.axis, Interval::new(sweep.pos, axis_bounds.max));

        let left = self.nodes.len() as u32;
        self.nodes.push(BuildNode {
            bounds: left_bounds,
            depth: depth + 1,
            tris: left_tris,
            split: None,
        });
        let right = self.nodes.len() as u32;
        self.nodes.push(BuildNode {
            bounds: right_bounds,
            depth: depth + 1,
            tris: right_tris,
            split: None,
        });
        self.nodes[index as usize].split = Some(Split {
            axis: sweep.axis,
            pos: sweep.pos,
            p_below: sweep.p_below,
            p_above: sweep.p_above,
            left,
            right,
        });

        self.subdivide(left, scene, max_depth);
        self.subdivide(right, scene, max_depth);
    }

    /// Sweep the begin/end events of `tris` along `axis` and return the best
    /// SAH split, or `None` when no candidate beats leaving the node a leaf.
    fn sweep_axis(
        &self,
        scene: &Scene,
        tris: &[u32],
        bounds: Aabb,
        axis: usize,
    ) -> Option<SweepResult> {
        let n = tris.len();
        let table = scene.axis_events(axis);

        let mut events = Vec::with_capacity(2 * n);
        for &t in tris {
            events.push(SweepEvent {
                pos: table[2 * t as usize],
                triangle: t,
                kind: EventKind::Begin,
            });
            events.push(SweepEvent {
                pos: table[2 * t as usize + 1],
                triangle: t,
                kind: EventKind::End,
            });
        }
        // Ties break Begin before End so coincident extents group together.
        events.sort_unstable_by(|a, b| {
            a.pos
                .partial_cmp(&b.pos)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.kind.cmp(&b.kind))
        });

        let axis_bounds = bounds.axis_interval(axis);
        let sizes = bounds.diagonal();
        let axis2 = (axis + 1) % 3;
        let axis3 = (axis + 2) % 3;
        let inv_total_sa = 1.0 / bounds.surface_area();

        let mut best: Option<(usize, f32, f32, f32)> = None;
        let mut best_cost = f32::INFINITY;
        let nosplit_cost = self.params.intersect_cost * n as f32;

        let mut n_before: usize = 0;
        let mut n_after: usize = n;
        for (i, event) in events.iter().enumerate() {
            if event.kind == EventKind::End {
                n_after -= 1;
            }
            let pos = event.pos;
            // Only positions strictly inside the node's bounds qualify.
            if pos > axis_bounds.min && pos < axis_bounds.max {
                let cross_section = sizes[axis2] * sizes[axis3];
                let rim = sizes[axis2] + sizes[axis3];
                let below_sa = 2.0 * (cross_section + (pos - axis_bounds.min) * rim);
                let above_sa = 2.0 * (cross_section + (axis_bounds.max - pos) * rim);
                let p_below = below_sa * inv_total_sa;
                let p_above = above_sa * inv_total_sa;
                let bonus = if n_before == 0 || n_after == 0 {
                    self.params.empty_bonus
                } else {
                    0.0
                };
                let cost = self.params.traversal_cost
                    + self.params.intersect_cost
                        * (1.0 - bonus)
                        * (p_below * n_before as f32 + p_above * n_after as f32);
                if cost < best_cost {
                    best_cost = cost;
                    best = Some((i, pos, p_below, p_above));
                }
            }
            if event.kind == EventKind::Begin {
                n_before += 1;
            }
        }

        let (offset, pos, p_below, p_above) = best?;
        if best_cost > nosplit_cost {
            return None;
        }

        Some(SweepResult {
            axis,
            pos,
            p_below,
            p_above,
            offset,
            events,
        })
    }
}
