//! Per-worker random sampling.
//!
//! Every render worker owns its own seeded `Sampler`, so renders are
//! deterministic for a fixed seed no matter how work is scheduled.

use glint_math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// A seekable random stream plus the sampling routines the integrator needs.
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    /// Create a sampler with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform f32 in [0, 1).
    #[inline]
    pub fn unit(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    #[inline]
    pub fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Uniform point inside a ball of the given radius, for jittering area
    /// light positions. A non-positive radius yields the center.
    pub fn in_ball(&mut self, radius: f32) -> Vec3 {
        if radius <= 0.0 {
            return Vec3::ZERO;
        }
        loop {
            let v = Vec3::new(
                self.unit() * 2.0 - 1.0,
                self.unit() * 2.0 - 1.0,
                self.unit() * 2.0 - 1.0,
            );
            if v.length_squared() <= 1.0 {
                return v * radius;
            }
        }
    }

    /// Uniform point in the unit disk, for thin-lens sampling.
    pub fn in_unit_disk(&mut self) -> (f32, f32) {
        loop {
            let x = self.unit() * 2.0 - 1.0;
            let y = self.unit() * 2.0 - 1.0;
            if x * x + y * y < 1.0 {
                return (x, y);
            }
        }
    }

    /// Cosine-weighted direction on the hemisphere around `normal`.
    ///
    /// Malley's method: a uniform disk sample lifted onto the hemisphere.
    pub fn cosine_hemisphere(&mut self, normal: Vec3) -> Vec3 {
        let (tangent, bitangent) = orthonormal_frame(normal);
        let area = self.unit();
        let phi = 2.0 * PI * self.unit();
        let in_plane = area.sqrt();

        tangent * (in_plane * phi.cos())
            + bitangent * (in_plane * phi.sin())
            + normal * (1.0 - area).sqrt()
    }

    /// Random permutation of `0..n`, used for N-rooks subpixel placement.
    pub fn permutation(&mut self, n: usize) -> Vec<u32> {
        let mut values: Vec<u32> = (0..n as u32).collect();
        for i in (1..values.len()).rev() {
            let j = self.rng.gen_range(0..=i);
            values.swap(i, j);
        }
        values
    }
}

/// Mirror a direction pointing away from the surface about the normal.
#[inline]
pub fn mirror(v: Vec3, n: Vec3) -> Vec3 {
    2.0 * v.dot(n) * n - v
}

/// Refract a direction pointing away from the surface with relative index
/// `eta`. Returns `Vec3::ZERO` on total internal reflection.
#[inline]
pub fn refract(i: Vec3, n: Vec3, eta: f32) -> Vec3 {
    let cos = n.dot(i);
    let k = 1.0 - eta * eta * (1.0 - cos * cos);
    if k < 0.0 {
        Vec3::ZERO
    } else {
        i * eta - n * (eta * cos + k.sqrt())
    }
}

/// Two unit vectors spanning the plane orthogonal to a unit normal.
///
/// Crosses the normal with the world axis it is least aligned with, which
/// keeps the first cross product well away from zero.
fn orthonormal_frame(n: Vec3) -> (Vec3, Vec3) {
    let magnitudes = n.abs();
    let helper = if magnitudes.x < magnitudes.y && magnitudes.x < magnitudes.z {
        Vec3::X
    } else if magnitudes.y < magnitudes.z {
        Vec3::Y
    } else {
        Vec3::Z
    };
    let tangent = n.cross(helper).normalize();
    let bitangent = n.cross(tangent);
    (tangent, bitangent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_deterministic() {
        let mut a = Sampler::seeded(99);
        let mut b = Sampler::seeded(99);
        for _ in 0..32 {
            assert_eq!(a.unit().to_bits(), b.unit().to_bits());
        }
    }

    #[test]
    fn test_permutation_is_permutation() {
        let mut sampler = Sampler::seeded(5);
        let p = sampler.permutation(16);
        let mut sorted = p.clone();
        sorted.sort_unstable();
        let expected: Vec<u32> = (0..16).collect();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn test_in_ball_stays_inside() {
        let mut sampler = Sampler::seeded(1);
        for _ in 0..100 {
            assert!(sampler.in_ball(2.5).length() <= 2.5 + 1e-5);
        }
        assert_eq!(sampler.in_ball(0.0), Vec3::ZERO);
    }

    #[test]
    fn test_orthonormal_frame_is_orthonormal() {
        for n in [
            Vec3::Y,
            -Vec3::Z,
            Vec3::new(0.3, -0.8, 0.52).normalize(),
        ] {
            let (t, b) = orthonormal_frame(n);
            assert!(t.dot(n).abs() < 1e-5);
            assert!(b.dot(n).abs() < 1e-5);
            assert!(t.dot(b).abs() < 1e-5);
            assert!((t.length() - 1.0).abs() < 1e-5);
            assert!((b.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_cosine_hemisphere_above_surface() {
        let mut sampler = Sampler::seeded(2);
        let normal = Vec3::new(1.0, 2.0, -0.5).normalize();
        for _ in 0..200 {
            let d = sampler.cosine_hemisphere(normal);
            assert!(d.dot(normal) >= 0.0);
            assert!((d.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_mirror_reflection() {
        let n = Vec3::Y;
        let v = Vec3::new(1.0, 1.0, 0.0).normalize();
        let m = mirror(v, n);
        assert!((m - Vec3::new(-1.0, 1.0, 0.0).normalize()).length() < 1e-5);
        // Mirroring a direction along the normal returns it unchanged.
        assert!((mirror(n, n) - n).length() < 1e-6);
    }

    #[test]
    fn test_refract_normal_incidence() {
        // Straight-on entry passes through undeflected (reversed through
        // the surface).
        let d = refract(Vec3::Y, Vec3::Y, 1.0 / 1.5);
        assert!((d - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_refract_total_internal_reflection() {
        // Grazing exit from a dense medium: eta > 1 and a shallow angle.
        let i = Vec3::new(0.95, 0.3122499, 0.0);
        let d = refract(i.normalize(), Vec3::Y, 1.5);
        assert_eq!(d, Vec3::ZERO);
    }
}
