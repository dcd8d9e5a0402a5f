//! Triangle primitive and the ray/triangle intersection record.

use glint_math::{Ray, Vec3};
use std::ops::{Add, Mul};

/// Barycentric tolerance for points sitting exactly on a triangle edge.
const EDGE_SLACK: f32 = 1e-6;

/// A triangle referencing scene vertices by index.
///
/// The plane `(n, d)` is precomputed when the scene is committed and drives
/// the ray/plane part of the intersection test.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub va: u32,
    pub vb: u32,
    pub vc: u32,
    /// Index into the scene's material table.
    pub mat: u32,
    pub plane_n: Vec3,
    pub plane_d: f32,
}

impl Triangle {
    /// Create a triangle with an uninitialized plane; `compute_plane` is
    /// called at scene commit once all vertices are in place.
    pub fn new(va: u32, vb: u32, vc: u32, mat: u32) -> Self {
        Self {
            va,
            vb,
            vc,
            mat,
            plane_n: Vec3::ZERO,
            plane_d: 0.0,
        }
    }

    /// Compute the triangle's plane from its vertices. Returns `false` for a
    /// degenerate (zero-area) triangle, which callers skip.
    pub fn compute_plane(&mut self, vertices: &[Vec3]) -> bool {
        let a = vertices[self.va as usize];
        let b = vertices[self.vb as usize];
        let c = vertices[self.vc as usize];
        let n = (b - a).cross(c - a);
        if n.length_squared() < 1e-18 {
            return false;
        }
        self.plane_n = n.normalize();
        self.plane_d = -self.plane_n.dot(a);
        true
    }

    /// Intersect a ray with this triangle via the precomputed plane followed
    /// by a barycentric inside test.
    ///
    /// Returns `(t, u, v)` with `t > 0` and the barycentric weights of the
    /// hit relative to `(va, vb, vc)`, or `None` on a miss.
    pub fn intersect(&self, corners: [Vec3; 3], ray: &Ray) -> Option<(f32, f32, f32)> {
        let denom = self.plane_n.dot(ray.direction());
        if denom.abs() < 1e-12 {
            return None;
        }
        let t = -(self.plane_n.dot(ray.origin()) + self.plane_d) / denom;
        if t <= 0.0 {
            return None;
        }

        let [a, b, c] = corners;
        let p = ray.at(t);
        let ab = b - a;
        let ac = c - a;
        let ap = p - a;

        let d00 = ab.dot(ab);
        let d01 = ab.dot(ac);
        let d11 = ac.dot(ac);
        let d20 = ap.dot(ab);
        let d21 = ap.dot(ac);
        let det = d00 * d11 - d01 * d01;
        if det.abs() < 1e-18 {
            return None;
        }

        let u = (d11 * d20 - d01 * d21) / det;
        let v = (d00 * d21 - d01 * d20) / det;
        if u < -EDGE_SLACK || v < -EDGE_SLACK || u + v > 1.0 + EDGE_SLACK {
            return None;
        }

        Some((t, u, v))
    }
}

/// Record of a ray hitting a triangle.
#[derive(Debug, Clone, Copy)]
pub struct Intersection {
    /// Index of the triangle that was hit.
    pub triangle: u32,
    /// Ray parameter of the hit.
    pub t: f32,
    /// Barycentric weight of vertex B.
    pub u: f32,
    /// Barycentric weight of vertex C.
    pub v: f32,
}

impl Intersection {
    /// Interpolate a per-vertex attribute at the hit point.
    pub fn interpolate<T>(&self, a: T, b: T, c: T) -> T
    where
        T: Mul<f32, Output = T> + Add<Output = T> + Copy,
    {
        a * (1.0 - self.u - self.v) + b * self.u + c * self.v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> (Triangle, [Vec3; 3]) {
        let corners = [
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
        ];
        let mut tri = Triangle::new(0, 1, 2, 0);
        assert!(tri.compute_plane(&corners));
        (tri, corners)
    }

    #[test]
    fn test_triangle_hit() {
        let (tri, corners) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, 0.0), Vec3::new(0.0, 0.0, -1.0));

        let (t, u, v) = tri.intersect(corners, &ray).expect("should hit");
        assert!((t - 1.0).abs() < 1e-5);
        assert!((u - 0.25).abs() < 1e-5);
        assert!((v - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_triangle_miss_outside() {
        let (tri, corners) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.9, 0.9, 0.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(tri.intersect(corners, &ray).is_none());
    }

    #[test]
    fn test_triangle_miss_behind() {
        let (tri, corners) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.25, 0.25, 0.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(tri.intersect(corners, &ray).is_none());
    }

    #[test]
    fn test_triangle_parallel_ray() {
        let (tri, corners) = unit_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(tri.intersect(corners, &ray).is_none());
    }

    #[test]
    fn test_degenerate_triangle_rejected() {
        let corners = [Vec3::ZERO, Vec3::X, Vec3::X * 2.0];
        let mut tri = Triangle::new(0, 1, 2, 0);
        assert!(!tri.compute_plane(&corners));
    }

    #[test]
    fn test_interpolate_weights() {
        let isect = Intersection {
            triangle: 0,
            t: 1.0,
            u: 0.25,
            v: 0.5,
        };
        let value = isect.interpolate(0.0f32, 4.0, 8.0);
        assert!((value - 5.0).abs() < 1e-6);

        let vec = isect.interpolate(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert!((vec - Vec3::new(0.25, 0.5, 0.0)).length() < 1e-6);
    }
}
