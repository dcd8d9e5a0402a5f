//! Glint renderer - CPU path tracing.
//!
//! A Monte Carlo path tracer over a compressed kd-tree acceleration
//! structure. The scene data lives in `glint_core`; this crate adds the
//! spatial index, the BRDF library, sampling, cameras, the path integrator,
//! and the parallel bucket render driver.

pub mod brdf;
mod bucket;
mod camera;
pub mod kdtree;
mod path_tracer;
mod sampling;

pub use bucket::{
    generate_buckets, linear_to_gamma, radiance_to_rgba, render_parallel, Bucket, Film,
    RenderStats, DEFAULT_BUCKET_SIZE,
};
pub use camera::Camera;
pub use kdtree::{KdTree, SahParams};
pub use path_tracer::{fresnel, PathTracer, TracerParams};
pub use sampling::Sampler;

/// Re-export the common scene and math types.
pub use glint_core::{Color, Intersection, Light, Material, Radiance, Scene, SceneBuilder};
pub use glint_math::{Ray, Vec3};
