//! Packed kd-tree and its traversal queries.
//!
//! Each node is a 64-bit record of two words. The low two bits of the
//! second word are a tag: 0, 1, 2 mean "internal, split axis = tag" and 3
//! means "leaf". Internal nodes keep the split plane as float bits in the
//! first word and the right-child index (shifted past the tag) in the
//! second; the left child is the node immediately following in memory.
//! Leaves keep the start of their run in the triangle-reference array in
//! the first word and `count << 2 | 3` in the second.

use glint_core::{Intersection, Scene};
use glint_math::{Aabb, Interval, Ray, Vec3};

use super::build::BuildTree;
use super::SahParams;

const TAG_MASK: u32 = 0b11;
const LEAF_TAG: u32 = 0b11;

#[derive(Debug, Clone, Copy)]
struct PackedNode {
    word0: u32,
    word1: u32,
}

impl PackedNode {
    fn internal(axis: usize, split: f32) -> Self {
        Self {
            word0: split.to_bits(),
            word1: axis as u32,
        }
    }

    fn leaf(start: u32, count: u32) -> Self {
        Self {
            word0: start,
            word1: (count << 2) | LEAF_TAG,
        }
    }

    /// Store the right child's index once the left subtree has been emitted.
    fn patch_right_child(&mut self, index: u32) {
        self.word1 = (self.word1 & TAG_MASK) | (index << 2);
    }

    fn is_leaf(&self) -> bool {
        self.word1 & TAG_MASK == LEAF_TAG
    }

    fn split_axis(&self) -> usize {
        (self.word1 & TAG_MASK) as usize
    }

    fn split_pos(&self) -> f32 {
        f32::from_bits(self.word0)
    }

    fn right_child(&self) -> u32 {
        self.word1 >> 2
    }

    fn run_start(&self) -> usize {
        self.word0 as usize
    }

    fn run_len(&self) -> usize {
        (self.word1 >> 2) as usize
    }
}

enum QueryMode {
    Nearest,
    Any,
}

/// The compressed kd-tree used for all intersection queries.
///
/// Read-only after construction; shared freely across render workers.
pub struct KdTree {
    nodes: Vec<PackedNode>,
    triangle_refs: Vec<u32>,
    bounds: Aabb,
    epsilon: f32,
}

impl KdTree {
    /// Build the tree for a committed scene: grow the SAH subdivision, pack
    /// it, and drop the build arena.
    pub fn build(scene: &Scene, params: &SahParams) -> KdTree {
        let build = BuildTree::build(scene, params);
        Self::pack(&build, scene)
    }

    fn pack(build: &BuildTree, scene: &Scene) -> KdTree {
        let totals = build.totals();
        let mut nodes = Vec::with_capacity(totals.nodes);
        let mut refs = Vec::with_capacity(totals.triangle_refs);
        emit(build, 0, &mut nodes, &mut refs);

        assert_eq!(nodes.len(), totals.nodes, "kd-tree packing node mismatch");
        assert_eq!(
            refs.len(),
            totals.triangle_refs,
            "kd-tree packing triangle mismatch"
        );
        log::debug!(
            "packed kd-tree: {} nodes ({} bytes), {} triangle refs",
            nodes.len(),
            nodes.len() * std::mem::size_of::<PackedNode>(),
            refs.len()
        );

        KdTree {
            nodes,
            triangle_refs: refs,
            bounds: scene.bounds(),
            epsilon: scene.epsilon(),
        }
    }

    /// Number of packed nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of entries in the triangle-reference array.
    pub fn triangle_ref_count(&self) -> usize {
        self.triangle_refs.len()
    }

    /// Closest intersection along the ray, or `None`.
    pub fn nearest_hit(&self, scene: &Scene, ray: &Ray) -> Option<Intersection> {
        self.traverse(
            scene,
            ray,
            Interval::new(0.0, f32::INFINITY),
            QueryMode::Nearest,
            None,
        )
    }

    /// Closest intersection that is not on triangle `exclude`. Used for rays
    /// leaving a surface so they cannot re-hit their source triangle.
    pub fn nearest_hit_excluding(
        &self,
        scene: &Scene,
        ray: &Ray,
        exclude: u32,
    ) -> Option<Intersection> {
        self.traverse(
            scene,
            ray,
            Interval::new(0.0, f32::INFINITY),
            QueryMode::Nearest,
            Some(exclude),
        )
    }

    /// True if the ray hits anything at all.
    pub fn any_hit(&self, scene: &Scene, ray: &Ray) -> bool {
        self.traverse(
            scene,
            ray,
            Interval::new(0.0, f32::INFINITY),
            QueryMode::Any,
            None,
        )
        .is_some()
    }

    /// True when nothing blocks the open segment between `a` and `b`. The
    /// segment ends are pulled in by 20 epsilon so the surfaces the points
    /// sit on do not occlude themselves.
    pub fn visible(&self, scene: &Scene, a: Vec3, b: Vec3) -> bool {
        let (ray, dist) = Ray::between(a, b);
        let offset = 20.0 * self.epsilon;
        if dist <= 2.0 * offset {
            return true;
        }
        self.traverse(
            scene,
            &ray,
            Interval::new(offset, dist - offset),
            QueryMode::Any,
            None,
        )
        .is_none()
    }

    fn traverse(
        &self,
        scene: &Scene,
        ray: &Ray,
        window: Interval,
        mode: QueryMode,
        exclude: Option<u32>,
    ) -> Option<Intersection> {
        let clip = self.bounds.hit_window(ray, window)?;

        let mut stack: Vec<(u32, f32, f32)> = Vec::with_capacity(64);
        stack.push((0, clip.min, clip.max));
        let mut best: Option<Intersection> = None;
        let eps = self.epsilon;

        while let Some((index, t_min, t_max)) = stack.pop() {
            if let Some(hit) = &best {
                if t_min > hit.t + eps {
                    continue;
                }
            }
            let node = self.nodes[index as usize];

            if node.is_leaf() {
                let start = node.run_start();
                for &t in &self.triangle_refs[start..start + node.run_len()] {
                    if exclude == Some(t) {
                        continue;
                    }
                    let Some((hit_t, u, v)) = scene.intersect_triangle(t, ray) else {
                        continue;
                    };
                    if hit_t < t_min - eps || hit_t > t_max + eps {
                        continue;
                    }
                    let isect = Intersection {
                        triangle: t,
                        t: hit_t,
                        u,
                        v,
                    };
                    match mode {
                        QueryMode::Any => return Some(isect),
                        QueryMode::Nearest => {
                            if best.map_or(true, |b| hit_t < b.t) {
                                best = Some(isect);
                            }
                        }
                    }
                }
                // A closer hit may still live in a farther sibling reached
                // through duplication, so nearest queries keep draining the
                // stack.
            } else {
                let axis = node.split_axis();
                let split = node.split_pos();
                let o = ray.origin()[axis];
                let d = ray.direction()[axis];
                let left = index + 1;
                let right = node.right_child();

                if d == 0.0 {
                    // The ray never crosses the plane; it stays on one side.
                    let near = if o < split { left } else { right };
                    stack.push((near, t_min, t_max));
                    continue;
                }

                let t_split = (split - o) / d;
                let below = o < split || (o == split && d <= 0.0);
                let (near, far) = if below { (left, right) } else { (right, left) };

                if t_split >= t_max || t_split < 0.0 {
                    stack.push((near, t_min, t_max));
                } else if t_split <= t_min {
                    stack.push((far, t_min, t_max));
                } else {
                    stack.push((far, t_split, t_max));
                    stack.push((near, t_min, t_split));
                }
            }
        }

        best
    }
}

/// Preorder emission: internal nodes are written in place and the right
/// child's slot is patched into the parent after the left subtree.
fn emit(build: &BuildTree, index: u32, nodes: &mut Vec<PackedNode>, refs: &mut Vec<u32>) {
    let node = &build.nodes[index as usize];
    match node.split {
        None => {
            nodes.push(PackedNode::leaf(refs.len() as u32, node.tris.len() as u32));
            refs.extend_from_slice(&node.tris);
        }
        Some(split) => {
            let slot = nodes.len();
            nodes.push(PackedNode::internal(split.axis, split.pos));
            emit(build, split.left, nodes, refs);
            let right_index = nodes.len() as u32;
            nodes[slot].patch_right_child(right_index);
            emit(build, split.right, nodes, refs);
        }
    }
}
