//! Cameras producing subpixel rays.
//!
//! The pixel sampler asks for one ray per N-rooks cell `(i, j)` of an M x M
//! grid inside the pixel. A pinhole camera is fully deterministic; a
//! thin-lens camera additionally jitters the ray origin across the lens.

use crate::sampling::Sampler;
use glint_math::{Ray, Vec3};

/// Pinhole or thin-lens camera.
#[derive(Debug, Clone)]
pub struct Camera {
    origin: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    /// Viewport height at unit distance along `forward`.
    view_height: f32,
    lens_radius: f32,
    focus_dist: f32,
}

impl Camera {
    /// Create a pinhole camera.
    pub fn pinhole(position: Vec3, look_at: Vec3, up: Vec3, view_height: f32) -> Self {
        let forward = (look_at - position).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);
        Self {
            origin: position,
            forward,
            right,
            up,
            view_height,
            lens_radius: 0.0,
            focus_dist: 1.0,
        }
    }

    /// Create a thin-lens camera focused at `focus_dist` along the view
    /// direction.
    pub fn thin_lens(
        position: Vec3,
        look_at: Vec3,
        up: Vec3,
        view_height: f32,
        lens_radius: f32,
        focus_dist: f32,
    ) -> Self {
        let mut camera = Self::pinhole(position, look_at, up, view_height);
        camera.lens_radius = lens_radius;
        camera.focus_dist = focus_dist;
        camera
    }

    /// True for pinhole cameras, whose subpixel rays need no lens sample.
    pub fn is_simple(&self) -> bool {
        self.lens_radius <= 0.0
    }

    /// Unnormalized direction through N-rooks cell `(i, j)` of pixel
    /// `(x, y)`.
    fn cell_direction(&self, x: u32, y: u32, xres: u32, yres: u32, i: u32, j: u32, m: u32) -> Vec3 {
        let cell = 1.0 / m as f32;
        let px = (x as f32 + (i as f32 + 0.5) * cell) / xres as f32 - 0.5;
        let py = (y as f32 + (j as f32 + 0.5) * cell) / yres as f32 - 0.5;
        let view_width = self.view_height * xres as f32 / yres as f32;
        self.forward + px * view_width * self.right - py * self.view_height * self.up
    }

    /// Subpixel ray for a pinhole camera.
    #[allow(clippy::too_many_arguments)]
    pub fn subpixel_ray(&self, x: u32, y: u32, xres: u32, yres: u32, i: u32, j: u32, m: u32) -> Ray {
        let dir = self.cell_direction(x, y, xres, yres, i, j, m);
        Ray::new(self.origin, dir.normalize())
    }

    /// Subpixel ray for a thin-lens camera: the origin is jittered on the
    /// lens disk and re-aimed so the focal plane stays sharp.
    #[allow(clippy::too_many_arguments)]
    pub fn subpixel_ray_lens(
        &self,
        x: u32,
        y: u32,
        xres: u32,
        yres: u32,
        i: u32,
        j: u32,
        m: u32,
        sampler: &mut Sampler,
    ) -> Ray {
        let dir = self.cell_direction(x, y, xres, yres, i, j, m);
        let target = self.origin + dir * self.focus_dist;
        let (lx, ly) = sampler.in_unit_disk();
        let origin = self.origin + (lx * self.right + ly * self.up) * self.lens_radius;
        Ray::new(origin, (target - origin).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_points_forward() {
        let camera = Camera::pinhole(Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO, Vec3::Z, 1.0);
        // Center cell of the center pixel in an odd-resolution image.
        let ray = camera.subpixel_ray(1, 1, 3, 3, 0, 0, 1);
        assert!((ray.direction() - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-5);
        assert_eq!(ray.origin(), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_subpixel_cells_differ() {
        let camera = Camera::pinhole(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y, 1.0);
        let a = camera.subpixel_ray(5, 5, 10, 10, 0, 0, 4);
        let b = camera.subpixel_ray(5, 5, 10, 10, 3, 1, 4);
        assert!((a.direction() - b.direction()).length() > 1e-5);
    }

    #[test]
    fn test_lens_rays_share_focal_point() {
        let camera = Camera::thin_lens(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::Y,
            1.0,
            0.2,
            5.0,
        );
        assert!(!camera.is_simple());

        let mut sampler = Sampler::seeded(11);
        let pinhole_dir = camera.cell_direction(2, 2, 5, 5, 0, 0, 1);
        let focal_point = Vec3::ZERO + pinhole_dir * 5.0;

        for _ in 0..8 {
            let ray = camera.subpixel_ray_lens(2, 2, 5, 5, 0, 0, 1, &mut sampler);
            // Every lens ray passes through the focal-plane target.
            let t = (focal_point - ray.origin()).dot(ray.direction());
            let closest = ray.at(t);
            assert!((closest - focal_point).length() < 1e-4);
        }
    }
}
