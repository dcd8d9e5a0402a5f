//! Bucket (tile) scheduling and the parallel render driver.
//!
//! The image is divided into buckets rendered independently on a rayon
//! pool. Every bucket owns a sampler seeded from its pixel coordinates, so
//! the result is deterministic no matter how the pool schedules work.
//! Cancellation is cooperative: workers check a shared flag between
//! buckets, never mid-bucket.

use crate::path_tracer::PathTracer;
use crate::sampling::Sampler;
use glint_core::Radiance;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 32;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy)]
pub struct Bucket {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position of this bucket in the render order.
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Generate buckets covering the image, sorted center-first so the most
/// interesting region appears early in progressive displays.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let mut buckets = Vec::new();
    let mut index = 0;

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, index));
            index += 1;
            x += bucket_size;
        }
        y += bucket_size;
    }

    sort_spiral(&mut buckets, width, height);
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from the image center.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    buckets.sort_by(|a, b| {
        let a_dx = a.x as f32 + a.width as f32 / 2.0 - center_x;
        let a_dy = a.y as f32 + a.height as f32 / 2.0 - center_y;
        let b_dx = b.x as f32 + b.width as f32 / 2.0 - center_x;
        let b_dy = b.y as f32 + b.height as f32 / 2.0 - center_y;

        let a_dist = a_dx * a_dx + a_dy * a_dy;
        let b_dist = b_dx * b_dx + b_dy * b_dy;
        a_dist.partial_cmp(&b_dist).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Accumulated render output in linear radiance, row-major.
pub struct Film {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Radiance>,
}

impl Film {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Radiance::ZERO; (width * height) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Radiance {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: Radiance) {
        self.pixels[(y * self.width + x) as usize] = value;
    }

    /// Convert to 8-bit RGBA with gamma 2.0.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for radiance in &self.pixels {
            bytes.extend_from_slice(&radiance_to_rgba(*radiance));
        }
        bytes
    }
}

/// Gamma-correct one channel (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a radiance value to 8-bit RGBA.
pub fn radiance_to_rgba(radiance: Radiance) -> [u8; 4] {
    let r = (255.0 * linear_to_gamma(radiance.x).clamp(0.0, 1.0)) as u8;
    let g = (255.0 * linear_to_gamma(radiance.y).clamp(0.0, 1.0)) as u8;
    let b = (255.0 * linear_to_gamma(radiance.z).clamp(0.0, 1.0)) as u8;
    [r, g, b, 255]
}

/// Outcome of a render pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderStats {
    /// Total rays cast across all workers.
    pub rays: u64,
    /// True when the cancel flag stopped the render before completion.
    pub cancelled: bool,
}

/// Render the full image in parallel buckets.
///
/// Buckets skipped due to cancellation are left black in the film.
pub fn render_parallel(
    tracer: &PathTracer,
    width: u32,
    height: u32,
    bucket_size: u32,
    base_seed: u64,
    cancel: &AtomicBool,
) -> (Film, RenderStats) {
    let buckets = generate_buckets(width, height, bucket_size);
    let rays = AtomicU64::new(0);

    let rendered: Vec<(Bucket, Vec<Radiance>)> = buckets
        .par_iter()
        .filter_map(|bucket| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }

            // Seed from the bucket's position so the image is identical
            // for any bucket order or thread count.
            let seed = base_seed ^ ((bucket.x as u64) << 32 | bucket.y as u64);
            let mut sampler = Sampler::seeded(seed);
            let mut local_rays = 0u64;

            let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);
            for local_y in 0..bucket.height {
                for local_x in 0..bucket.width {
                    pixels.push(tracer.render_pixel(
                        bucket.x + local_x,
                        bucket.y + local_y,
                        &mut sampler,
                        &mut local_rays,
                    ));
                }
            }

            rays.fetch_add(local_rays, Ordering::Relaxed);
            Some((*bucket, pixels))
        })
        .collect();

    let cancelled = rendered.len() != buckets.len();
    let mut film = Film::new(width, height);
    for (bucket, pixels) in rendered {
        for local_y in 0..bucket.height {
            for local_x in 0..bucket.width {
                let value = pixels[(local_y * bucket.width + local_x) as usize];
                film.set(bucket.x + local_x, bucket.y + local_y, value);
            }
        }
    }

    (
        film,
        RenderStats {
            rays: rays.load(Ordering::Relaxed),
            cancelled,
        },
    )
}
