use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box used by the kd-tree builder and traversal.
///
/// Defined by three intervals, one per axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let mut aabb = Self {
            x: Interval::new(a.x.min(b.x), a.x.max(b.x)),
            y: Interval::new(a.y.min(b.y), a.y.max(b.y)),
            z: Interval::new(a.z.min(b.z), a.z.max(b.z)),
        };
        aabb.pad_to_minimums();
        aabb
    }

    /// An AABB containing nothing.
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// The interval for axis `n` (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Replace the interval for axis `n`.
    pub fn with_axis_interval(&self, n: usize, interval: Interval) -> Aabb {
        let mut b = *self;
        match n {
            0 => b.x = interval,
            1 => b.y = interval,
            _ => b.z = interval,
        }
        b
    }

    /// Grow the box by `delta` on every side.
    pub fn padded(&self, delta: f32) -> Aabb {
        Aabb {
            x: self.x.expand(delta),
            y: self.y.expand(delta),
            z: self.z.expand(delta),
        }
    }

    /// Extent along each axis.
    pub fn diagonal(&self) -> Vec3 {
        Vec3::new(self.x.size(), self.y.size(), self.z.size())
    }

    /// Total surface area, `2(ab + bc + ca)`.
    pub fn surface_area(&self) -> f32 {
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Index of the axis with the largest extent.
    pub fn longest_axis(&self) -> usize {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    /// Clip a ray's parameter window against the box using the slab method.
    ///
    /// Returns the clipped `[entry, exit]` window, or `None` when the ray
    /// misses the box within `window`.
    pub fn hit_window(&self, r: &Ray, window: Interval) -> Option<Interval> {
        let mut t = window;

        for axis in 0..3 {
            let inv = 1.0 / r.direction()[axis];
            let slab = self.axis_interval(axis);
            let mut t0 = (slab.min - r.origin()[axis]) * inv;
            let mut t1 = (slab.max - r.origin()[axis]) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            // f32::max / f32::min discard a NaN operand, which handles the
            // origin-on-slab, zero-direction corner.
            t.min = t0.max(t.min);
            t.max = t1.min(t.max);
            if t.max < t.min {
                return None;
            }
        }

        Some(t)
    }

    /// Pad intervals to avoid zero-width boxes (degenerate cases).
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        if self.x.size() < delta {
            self.x = self.x.expand(delta / 2.0);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta / 2.0);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta / 2.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(Vec3::new(5.0, 0.0, -1.0), Vec3::new(0.0, 2.0, 1.0));
        assert_eq!(aabb.x.min, 0.0);
        assert_eq!(aabb.x.max, 5.0);
        assert_eq!(aabb.y.max, 2.0);
        assert_eq!(aabb.z.min, -1.0);
    }

    #[test]
    fn test_aabb_surface_area() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        // 2 * (1*2 + 2*3 + 3*1) = 22
        assert!((aabb.surface_area() - 22.0).abs() < 1e-4);
    }

    #[test]
    fn test_aabb_longest_axis() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 4.0, 2.0));
        assert_eq!(aabb.longest_axis(), 1);
    }

    #[test]
    fn test_hit_window_through_box() {
        let aabb = Aabb::from_points(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));

        let window = aabb
            .hit_window(&ray, Interval::new(0.0, f32::INFINITY))
            .expect("ray should hit the box");
        assert!((window.min - 4.0).abs() < 1e-5);
        assert!((window.max - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_hit_window_miss() {
        let aabb = Aabb::from_points(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        // Pointing away.
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(aabb.hit_window(&ray, Interval::new(0.0, f32::INFINITY)).is_none());

        // Offset to the side.
        let ray = Ray::new(Vec3::new(5.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.hit_window(&ray, Interval::new(0.0, f32::INFINITY)).is_none());
    }

    #[test]
    fn test_hit_window_respects_input_window() {
        let aabb = Aabb::from_points(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));

        // Box spans t in [4, 6]; a window ending at 3 misses it.
        assert!(aabb.hit_window(&ray, Interval::new(0.0, 3.0)).is_none());

        // A window starting inside the box clips the entry.
        let window = aabb
            .hit_window(&ray, Interval::new(5.0, 100.0))
            .expect("window overlaps the box");
        assert!((window.min - 5.0).abs() < 1e-5);
        assert!((window.max - 6.0).abs() < 1e-5);
    }
}
