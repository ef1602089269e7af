//! Flat k-d tree traversal (§4.C). The tree itself is built externally
//! (§6) — this module only walks an already-linearized node array, the
//! way the teacher's `pbr_core::bvh::Bvh::intersect` walks its flattened
//! `LNode` array with a fixed-size `nodes_to_visit` stack instead of
//! recursion. Nodes here split on an axis/position instead of child
//! bounds, since a k-d node doesn't carry its own bounding box.

use crate::geometry::{Geom, Intersection, Ray, TrianglePool};
use crate::math::Vec3;

#[derive(Debug, Clone, Copy)]
pub enum KdNodeKind {
    Leaf { first_prim: u32, num_prims: u32 },
    Interior { axis: u8, split: f32, right_child: u32 },
}

/// One node of the flattened tree. For an interior node the left child is
/// always `self_index + 1` (depth-first layout); `right_child` is the
/// explicit jump target, mirroring the teacher's `second_child_offset`.
#[derive(Debug, Clone, Copy)]
pub struct KdNode {
    pub kind: KdNodeKind,
}

/// The traverser's view of a scene: the flat node array, the permuted
/// primitive index array the builder produced (indices into `geoms`), the
/// geoms themselves, and the shared triangle pool mesh instances draw from.
pub struct KdTree<'a> {
    pub nodes: &'a [KdNode],
    pub ordered_prims: &'a [u32],
    pub geoms: &'a [Geom],
    pub pool: &'a TrianglePool,
}

const MAX_TODO: usize = 64;

impl<'a> KdTree<'a> {
    /// Closest-hit query. Walks near-child-first, pushing the far child
    /// onto a short stack only when its half-space interval is non-empty,
    /// exactly the descend-then-push-far-if-needed shape of the teacher's
    /// BVH traversal loop.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut closest: Option<Intersection> = None;
        let mut ray_max_t = ray.max_t;

        struct Todo {
            node: u32,
            t_min: f32,
            t_max: f32,
        }
        let mut todo: [Todo; MAX_TODO] = std::array::from_fn(|_| Todo { node: 0, t_min: 0.0, t_max: 0.0 });
        let mut todo_pos = 0usize;

        let mut node_index = 0u32;
        let mut t_min = ray.min_t;
        let mut t_max = ray_max_t;

        loop {
            let node = &self.nodes[node_index as usize];
            match node.kind {
                KdNodeKind::Leaf { first_prim, num_prims } => {
                    for i in first_prim..first_prim + num_prims {
                        let geom_id = self.ordered_prims[i as usize];
                        let geom = &self.geoms[geom_id as usize];
                        let mut bounded_ray = *ray;
                        bounded_ray.max_t = ray_max_t;
                        if let Some(hit) = geom.intersect(&bounded_ray, self.pool, geom_id) {
                            if hit.t < ray_max_t {
                                ray_max_t = hit.t;
                                closest = Some(hit);
                            }
                        }
                    }
                    if todo_pos == 0 {
                        break;
                    }
                    todo_pos -= 1;
                    node_index = todo[todo_pos].node;
                    t_min = todo[todo_pos].t_min;
                    t_max = todo[todo_pos].t_max.min(ray_max_t);
                }
                KdNodeKind::Interior { axis, split, right_child } => {
                    let axis = axis as usize;
                    let origin_axis = ray.o[axis];
                    let dir_axis = ray.d[axis];

                    let below = origin_axis < split || (origin_axis == split && dir_axis <= 0.0);
                    let (first_child, second_child) = if below {
                        (node_index + 1, right_child)
                    } else {
                        (right_child, node_index + 1)
                    };

                    if dir_axis.abs() < 1e-12 {
                        node_index = first_child;
                        continue;
                    }
                    let t_split = (split - origin_axis) / dir_axis;

                    if t_split > t_max || t_split <= 0.0 {
                        node_index = first_child;
                    } else if t_split < t_min {
                        node_index = second_child;
                    } else {
                        if todo_pos < MAX_TODO {
                            todo[todo_pos] = Todo { node: second_child, t_min: t_split, t_max };
                            todo_pos += 1;
                        }
                        node_index = first_child;
                        t_max = t_split;
                    }
                    continue;
                }
            }
        }

        closest
    }

    /// Any-hit query for shadow rays (§4.E): stops at the first primitive
    /// found with `t` inside `(ray.min_t, ray.max_t)`, ignoring distance.
    pub fn intersect_any(&self, ray: &Ray) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        let mut stack = Vec::with_capacity(32);
        stack.push(0u32);
        while let Some(node_index) = stack.pop() {
            match self.nodes[node_index as usize].kind {
                KdNodeKind::Leaf { first_prim, num_prims } => {
                    for i in first_prim..first_prim + num_prims {
                        let geom_id = self.ordered_prims[i as usize];
                        let geom = &self.geoms[geom_id as usize];
                        if geom.intersect(ray, self.pool, geom_id).is_some() {
                            return true;
                        }
                    }
                }
                KdNodeKind::Interior { right_child, .. } => {
                    stack.push(node_index + 1);
                    stack.push(right_child);
                }
            }
        }
        false
    }
}

/// Minimal median-split builder, good enough for tests and small host
/// scenes (§6 names the real builder as an external collaborator; this is
/// the "tiny loader" counterpart for the k-d tree the way `scene::Scene`
/// is for scene files).
pub fn build_median_split(geoms: &[Geom], max_leaf_size: usize) -> (Vec<KdNode>, Vec<u32>) {
    let mut nodes = Vec::new();
    let mut ordered = Vec::new();
    let indices: Vec<u32> = (0..geoms.len() as u32).collect();
    build_recursive(geoms, indices, max_leaf_size, &mut nodes, &mut ordered);
    (nodes, ordered)
}

fn build_recursive(
    geoms: &[Geom],
    mut indices: Vec<u32>,
    max_leaf_size: usize,
    nodes: &mut Vec<KdNode>,
    ordered: &mut Vec<u32>,
) -> u32 {
    if indices.len() <= max_leaf_size {
        let first_prim = ordered.len() as u32;
        let num_prims = indices.len() as u32;
        ordered.extend_from_slice(&indices);
        let idx = nodes.len() as u32;
        nodes.push(KdNode { kind: KdNodeKind::Leaf { first_prim, num_prims } });
        return idx;
    }

    let mut bounds = crate::geometry::BBox::empty();
    for &i in &indices {
        bounds = bounds.union(&geoms[i as usize].world_bounds);
    }
    let axis = bounds.max_extent_axis();
    indices.sort_by(|&a, &b| {
        let ca = geoms[a as usize].world_bounds.centroid()[axis];
        let cb = geoms[b as usize].world_bounds.centroid()[axis];
        ca.partial_cmp(&cb).unwrap()
    });
    let mid = indices.len() / 2;
    let split = geoms[indices[mid] as usize].world_bounds.centroid()[axis];
    let (left, right) = indices.split_at(mid);

    let node_index = nodes.len() as u32;
    nodes.push(KdNode { kind: KdNodeKind::Leaf { first_prim: 0, num_prims: 0 } });

    build_recursive(geoms, left.to_vec(), max_leaf_size, nodes, ordered);
    let right_child = build_recursive(geoms, right.to_vec(), max_leaf_size, nodes, ordered);

    nodes[node_index as usize] = KdNode {
        kind: KdNodeKind::Interior { axis: axis as u8, split, right_child },
    };
    node_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform;

    #[test]
    fn single_sphere_tree_hits() {
        let geoms = vec![Geom::sphere(1.0, Transform::identity(), 0)];
        let (nodes, ordered) = build_median_split(&geoms, 1);
        let pool = TrianglePool::default();
        let tree = KdTree { nodes: &nodes, ordered_prims: &ordered, geoms: &geoms, pool: &pool };
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = tree.intersect(&ray).expect("should hit");
        assert!((hit.t - 4.0).abs() < 1e-3);
    }

    #[test]
    fn many_spheres_finds_closest() {
        let geoms = vec![
            Geom::sphere(1.0, Transform::new(Vec3::new(0.0, 0.0, 5.0), (Vec3::new(0.0, 1.0, 0.0), 0.0), Vec3::ONE), 0),
            Geom::sphere(1.0, Transform::new(Vec3::new(0.0, 0.0, -5.0), (Vec3::new(0.0, 1.0, 0.0), 0.0), Vec3::ONE), 1),
            Geom::sphere(1.0, Transform::new(Vec3::new(3.0, 3.0, 0.0), (Vec3::new(0.0, 1.0, 0.0), 0.0), Vec3::ONE), 2),
        ];
        let (nodes, ordered) = build_median_split(&geoms, 1);
        let pool = TrianglePool::default();
        let tree = KdTree { nodes: &nodes, ordered_prims: &ordered, geoms: &geoms, pool: &pool };
        let ray = Ray::new(Vec3::new(0.0, 0.0, -20.0), Vec3::new(0.0, 0.0, 1.0));
        let hit = tree.intersect(&ray).expect("should hit");
        assert_eq!(hit.material_id, 1);
    }

    #[test]
    fn miss_returns_none() {
        let geoms = vec![Geom::sphere(1.0, Transform::identity(), 0)];
        let (nodes, ordered) = build_median_split(&geoms, 1);
        let pool = TrianglePool::default();
        let tree = KdTree { nodes: &nodes, ordered_prims: &ordered, geoms: &geoms, pool: &pool };
        let ray = Ray::new(Vec3::new(10.0, 10.0, -20.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(tree.intersect(&ray).is_none());
    }
}
