//! BRDF library: pure reflectance functions selected by name.
//!
//! Every BRDF shares one signature: given the shading normal, the surface
//! colors, the incoming and outgoing directions, the Phong exponent, and the
//! refractive indices on both sides of the boundary, return the fraction of
//! radiance carried from `vi` towards `vr`.

use glint_core::{BrdfId, Color, Radiance};
use glint_math::Vec3;
use std::f32::consts::PI;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("unknown BRDF name: {0}")]
pub struct BrdfError(pub String);

/// The shared BRDF signature.
pub type BrdfFn = fn(
    light_n: Vec3,
    diffuse: Color,
    specular: Color,
    vi: Vec3,
    vr: Vec3,
    exponent: f32,
    eta_from: f32,
    eta_to: f32,
) -> Radiance;

/// Resolve a BRDF by its configuration name.
pub fn by_name(name: &str) -> Result<BrdfFn, BrdfError> {
    match name {
        "phong" => Ok(phong),
        "cooktorr" => Ok(cook_torrance),
        other => Err(BrdfError(other.to_string())),
    }
}

/// Resolve a configuration name to the identifier stored on materials.
pub fn id_by_name(name: &str) -> Result<BrdfId, BrdfError> {
    match name {
        "phong" => Ok(BrdfId::Phong),
        "cooktorr" => Ok(BrdfId::CookTorrance),
        other => Err(BrdfError(other.to_string())),
    }
}

/// Resolve the function for a material's BRDF identifier.
pub fn for_id(id: BrdfId) -> BrdfFn {
    match id {
        BrdfId::Phong => phong,
        BrdfId::CookTorrance => cook_torrance,
    }
}

/// Energy-normalized Phong: Lambertian diffuse plus a cosine-lobe specular
/// term around the mirror direction.
pub fn phong(
    light_n: Vec3,
    diffuse: Color,
    specular: Color,
    vi: Vec3,
    vr: Vec3,
    exponent: f32,
    _eta_from: f32,
    _eta_to: f32,
) -> Radiance {
    let n = light_n;
    let vi = vi.normalize();
    let vr = vr.normalize();

    if n.dot(vi) <= 0.0 || n.dot(vr) <= 0.0 {
        return Radiance::ZERO;
    }

    let mut f = diffuse / PI;
    if exponent > 0.0 {
        let reflected = 2.0 * n.dot(vi) * n - vi;
        let lobe = reflected.dot(vr).max(0.0);
        f += specular * ((exponent + 2.0) / (2.0 * PI)) * lobe.powf(exponent);
    }
    f
}

/// Cook-Torrance microfacet specular with a Lambertian diffuse floor.
///
/// Uses a Beckmann distribution with roughness derived from the Phong
/// exponent and a Schlick Fresnel term from the index ratio.
pub fn cook_torrance(
    light_n: Vec3,
    diffuse: Color,
    specular: Color,
    vi: Vec3,
    vr: Vec3,
    exponent: f32,
    eta_from: f32,
    eta_to: f32,
) -> Radiance {
    let n = light_n;
    let vi = vi.normalize();
    let vr = vr.normalize();

    let cos_i = n.dot(vi);
    let cos_o = n.dot(vr);
    if cos_i <= 0.0 || cos_o <= 0.0 {
        return Radiance::ZERO;
    }

    let half = vi + vr;
    if half.length_squared() < 1e-12 {
        return diffuse / PI;
    }
    let h = half.normalize();
    let cos_h = n.dot(h).max(1e-4);
    let vh = vr.dot(h).max(1e-4);

    // Beckmann roughness from the Phong exponent.
    let m = (2.0 / (exponent + 2.0)).sqrt();
    let cos_h2 = cos_h * cos_h;
    let tan2 = (1.0 - cos_h2) / cos_h2;
    let d = (-tan2 / (m * m)).exp() / (PI * m * m * cos_h2 * cos_h2);

    let f0 = ((eta_to - eta_from) / (eta_to + eta_from)).powi(2);
    let fresnel = f0 + (1.0 - f0) * (1.0 - vh).powi(5);

    let g = (2.0 * cos_h * cos_o / vh)
        .min(2.0 * cos_h * cos_i / vh)
        .min(1.0);

    let spec = d * fresnel * g / (4.0 * cos_o * cos_i);
    diffuse / PI + specular * spec
}
