//! Monte Carlo path integrator.
//!
//! `render_pixel` spreads `multisample` subpixel rays over a jittered
//! N-rooks pattern and averages their radiance estimates. Each estimate is
//! produced in two phases: a forward walk that records one path point per
//! surface interaction, then a backward sweep that accumulates radiance
//! from the far end of the path towards the camera.

use crate::brdf;
use crate::camera::Camera;
use crate::kdtree::KdTree;
use crate::sampling::{mirror, refract, Sampler};
use glint_core::{Color, Intersection, Radiance, Scene};
use glint_math::{Ray, Vec2, Vec3};
use std::f32::consts::PI;

/// Hard ceiling on path-construction iterations, regardless of the
/// termination policy.
const MAX_PATH_ITERATIONS: u32 = 20;

/// Integrator configuration.
#[derive(Debug, Clone)]
pub struct TracerParams {
    /// Samples per pixel, placed on an N-rooks pattern.
    pub multisample: u32,
    /// Counted bounces per path when roulette is disabled.
    pub depth: u32,
    /// Roulette continuation probability in (0, 1); any negative value
    /// selects fixed-depth termination instead.
    pub russian: f32,
    /// Per-channel radiance ceiling.
    pub clamp: f32,
    /// Multiplier on bump-map normal perturbation.
    pub bumpmap_scale: f32,
    /// Weight mirror events by Fresnel reflectance instead of the
    /// material's reflection strength.
    pub force_fresnel: bool,
    pub sky_color: Color,
    pub sky_brightness: f32,
}

impl Default for TracerParams {
    fn default() -> Self {
        Self {
            multisample: 1,
            depth: 4,
            russian: -1.0,
            clamp: 100000.0,
            bumpmap_scale: 10.0,
            force_fresnel: false,
            sky_color: Color::ZERO,
            sky_brightness: 2.0,
        }
    }
}

/// Fresnel reflectance for an incident direction `i`, surface normal `n`,
/// and relative index ratio `ior`. Returns 1 on total internal reflection.
pub fn fresnel(i: Vec3, n: Vec3, ior: f32) -> f32 {
    let mut cosi = i.dot(n).clamp(-1.0, 1.0);
    let (etai, etat) = if cosi > 0.0 { (ior, 1.0) } else { (1.0, ior) };

    let sint = etai / etat * (1.0 - cosi * cosi).max(0.0).sqrt();
    if sint >= 1.0 {
        return 1.0;
    }

    let cost = (1.0 - sint * sint).max(0.0).sqrt();
    cosi = cosi.abs();
    let rs = (etat * cosi - etai * cost) / (etat * cosi + etai * cost);
    let rp = (etai * cosi - etat * cost) / (etai * cosi + etat * cost);
    (rs * rs + rp * rp) / 2.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointKind {
    /// Diffuse bounce; collects direct and indirect lighting.
    Scattered,
    /// Mirror bounce; passes the next point's radiance through.
    Reflected,
    /// Refraction into a translucent medium.
    Entered,
    /// Exit from a translucent medium.
    Left,
    /// The ray escaped the scene.
    Infinity,
}

struct PathPoint {
    kind: PointKind,
    isect: Option<Intersection>,
    pos: Vec3,
    face_n: Vec3,
    light_n: Vec3,
    /// Direction towards the previous path point.
    vr: Vec3,
    /// Direction towards the next path point.
    vi: Vec3,
    tex_uv: Vec2,
    to_prev: Radiance,
}

/// Path tracer over a committed scene and its kd-tree.
///
/// Immutable once constructed; shared by reference across render workers.
pub struct PathTracer<'a> {
    scene: &'a Scene,
    tree: &'a KdTree,
    camera: &'a Camera,
    xres: u32,
    yres: u32,
    params: TracerParams,
}

impl<'a> PathTracer<'a> {
    pub fn new(
        scene: &'a Scene,
        tree: &'a KdTree,
        camera: &'a Camera,
        xres: u32,
        yres: u32,
        params: TracerParams,
    ) -> Self {
        Self {
            scene,
            tree,
            camera,
            xres,
            yres,
            params,
        }
    }

    pub fn params(&self) -> &TracerParams {
        &self.params
    }

    /// Estimate the radiance of pixel `(x, y)`. `raycount` accumulates the
    /// number of rays cast, for profiling.
    pub fn render_pixel(
        &self,
        x: u32,
        y: u32,
        sampler: &mut Sampler,
        raycount: &mut u64,
    ) -> Radiance {
        let m = self.params.multisample.max(1);
        let rooks = sampler.permutation(m as usize);

        let mut total = Radiance::ZERO;
        for i in 0..m {
            let ray = if self.camera.is_simple() {
                self.camera
                    .subpixel_ray(x, y, self.xres, self.yres, i, rooks[i as usize], m)
            } else {
                self.camera.subpixel_ray_lens(
                    x,
                    y,
                    self.xres,
                    self.yres,
                    i,
                    rooks[i as usize],
                    m,
                    sampler,
                )
            };
            total += self.trace_path(&ray, sampler, raycount);
        }

        total / m as f32
    }

    /// Produce one radiance estimate for a primary ray.
    fn trace_path(&self, ray: &Ray, sampler: &mut Sampler, raycount: &mut u64) -> Radiance {
        let mut path: Vec<PathPoint> = Vec::new();

        // Phase A: forward path construction.
        let mut current = *ray;
        let mut n: u32 = 0;
        let mut iterations: u32 = 0;
        // Points that do not count towards depth also may not be
        // roulette-terminated; this flag skips the next roulette draw.
        let mut skip_russian = false;
        let mut last_triangle: Option<u32> = None;

        loop {
            n += 1;
            iterations += 1;
            if iterations >= MAX_PATH_ITERATIONS {
                break;
            }
            if self.params.russian >= 0.0 {
                if n > 1 && !skip_russian && sampler.unit() > self.params.russian {
                    break;
                }
                skip_russian = false;
            } else if n > self.params.depth {
                break;
            }

            *raycount += 1;
            let hit = match last_triangle {
                Some(t) => self.tree.nearest_hit_excluding(self.scene, &current, t),
                None => self.tree.nearest_hit(self.scene, &current),
            };
            let Some(isect) = hit else {
                path.push(PathPoint {
                    kind: PointKind::Infinity,
                    isect: None,
                    pos: Vec3::ZERO,
                    face_n: Vec3::ZERO,
                    light_n: Vec3::ZERO,
                    vr: -current.direction(),
                    vi: Vec3::ZERO,
                    tex_uv: Vec2::ZERO,
                    to_prev: Radiance::ZERO,
                });
                break;
            };

            let tri = self.scene.triangle(isect.triangle);
            let mat = self.scene.material_of(tri);
            let pos = current.at(isect.t);
            let [na, nb, nc] = self.scene.triangle_normals(isect.triangle);
            let face_n = isect.interpolate(na, nb, nc).normalize();
            let vr = -current.direction();
            let from_inside = face_n.dot(vr) < 0.0;

            let tex_uv = if mat.has_any_texture() {
                let [ta, tb, tc] = self.scene.triangle_texcoords(isect.triangle);
                isect.interpolate(ta, tb, tc)
            } else {
                Vec2::ZERO
            };

            // Bump mapping tilts the shading normal along the tangent frame.
            let light_n = if let Some(id) = mat.bump_texture {
                let bump = self.scene.texture(id);
                let right = bump.slope_right(tex_uv);
                let bottom = bump.slope_down(tex_uv);
                let [ta, tb, tc] = self.scene.triangle_tangents(isect.triangle);
                let tangent = isect.interpolate(ta, tb, tc);
                let bitangent = face_n.cross(tangent).normalize_or_zero();
                let tilted =
                    face_n + (tangent * right + bitangent * bottom) * self.params.bumpmap_scale;
                tilted.try_normalize().unwrap_or(face_n)
            } else {
                face_n
            };

            // Classify the interaction.
            let mut kind;
            if mat.translucency > 0.001 {
                if from_inside {
                    kind = PointKind::Left;
                    n -= 1;
                    skip_russian = true;
                } else if sampler.unit() < mat.translucency {
                    let f = fresnel(vr, light_n, 1.0 / mat.refraction_index);
                    kind = if sampler.unit() < f {
                        PointKind::Reflected
                    } else {
                        PointKind::Entered
                    };
                    n -= 1;
                    skip_russian = true;
                } else {
                    kind = PointKind::Scattered;
                }
            } else if mat.reflective {
                let p_mirror = if self.params.force_fresnel {
                    fresnel(vr, light_n, 1.0 / mat.refraction_index)
                } else {
                    mat.reflection_strength
                };
                if sampler.unit() < p_mirror {
                    kind = PointKind::Reflected;
                    n -= 1;
                    skip_russian = true;
                } else {
                    kind = PointKind::Scattered;
                }
            } else {
                kind = PointKind::Scattered;
            }

            // Sample the next direction.
            let dir = match kind {
                PointKind::Scattered => {
                    let mut d = sampler.cosine_hemisphere(face_n);
                    while d.dot(light_n) < 0.0 {
                        d = sampler.cosine_hemisphere(face_n);
                    }
                    d
                }
                PointKind::Reflected => mirror(vr, light_n),
                PointKind::Entered => {
                    let d = refract(vr, light_n, 1.0 / mat.refraction_index);
                    if d.length() < 0.001 || d.x.is_nan() {
                        // Total internal reflection falls back to a mirror.
                        kind = PointKind::Reflected;
                        mirror(vr, light_n)
                    } else {
                        d
                    }
                }
                PointKind::Left => {
                    let d = refract(vr, light_n, mat.refraction_index);
                    if d.length() < 0.001 {
                        kind = PointKind::Reflected;
                    }
                    // The transmitted direction is discarded; the exit ray
                    // continues reversed. Changing this alters every
                    // translucent render, so it stays.
                    -vr
                }
                PointKind::Infinity => unreachable!(),
            };

            // Rays entering a medium start just below the surface, all
            // others just above it.
            let offset_sign = if kind == PointKind::Entered { -1.0 } else { 1.0 };
            let origin = pos + face_n * self.scene.epsilon() * 10.0 * offset_sign;

            path.push(PathPoint {
                kind,
                isect: Some(isect),
                pos,
                face_n,
                light_n,
                vr,
                vi: dir,
                tex_uv,
                to_prev: Radiance::ZERO,
            });

            current = Ray::new(origin, dir.normalize());
            last_triangle = Some(isect.triangle);
        }

        if path.is_empty() {
            return Radiance::ZERO;
        }

        // Phase B: back-to-front radiance accumulation.
        let sky = self.params.sky_color * self.params.sky_brightness;
        for index in (0..path.len()).rev() {
            let incoming_next = path.get(index + 1).map(|next| next.to_prev);
            let total = self.point_radiance(&path[index], incoming_next, sampler, sky);
            path[index].to_prev = total;
        }

        path[0].to_prev
    }

    /// Radiance a path point sends towards its predecessor.
    fn point_radiance(
        &self,
        pp: &PathPoint,
        incoming_next: Option<Radiance>,
        sampler: &mut Sampler,
        sky: Radiance,
    ) -> Radiance {
        if pp.kind == PointKind::Infinity {
            return sky;
        }
        let Some(isect) = pp.isect else {
            return Radiance::ZERO;
        };

        let tri = self.scene.triangle(isect.triangle);
        let mat = self.scene.material_of(tri);
        let diffuse = match mat.diffuse_texture {
            Some(id) => self.scene.texture(id).sample(pp.tex_uv),
            None => mat.diffuse,
        };
        let specular = match mat.specular_texture {
            Some(id) => self.scene.texture(id).sample(pp.tex_uv),
            None => mat.specular,
        };
        let brdf_fn = brdf::for_id(mat.brdf);

        let mut total = Radiance::ZERO;
        match pp.kind {
            PointKind::Scattered => {
                // Direct lighting from one randomly chosen light.
                let lights = self.scene.lights();
                if !lights.is_empty() {
                    let light = &lights[sampler.pick_index(lights.len())];
                    let light_pos = light.position + sampler.in_ball(light.size);

                    if self.tree.visible(self.scene, light_pos, pp.pos) {
                        let vi = (light_pos - pp.pos).normalize();
                        let f = brdf_fn(
                            pp.light_n,
                            diffuse,
                            specular,
                            vi,
                            pp.vr,
                            mat.exponent,
                            1.0,
                            mat.refraction_index,
                        );
                        let g = pp.light_n.dot(vi).max(0.0)
                            / pp.pos.distance_squared(light_pos);
                        total += light.color * light.intensity * f * g;
                    }
                }

                // Indirect lighting carried back from the next path point.
                if let Some(mut incoming) = incoming_next {
                    if self.params.russian > 0.0 {
                        incoming /= self.params.russian;
                    }
                    let f = brdf_fn(
                        pp.light_n,
                        diffuse,
                        specular,
                        pp.vi,
                        pp.vr,
                        mat.exponent,
                        1.0,
                        mat.refraction_index,
                    );
                    total += incoming * f * PI;
                }
            }
            PointKind::Reflected | PointKind::Left => {
                if let Some(incoming) = incoming_next {
                    total += incoming;
                }
            }
            PointKind::Entered => {
                // Absorption inside the medium approximated by the diffuse
                // albedo.
                if let Some(incoming) = incoming_next {
                    total += incoming * diffuse;
                }
            }
            PointKind::Infinity => {}
        }

        let c = self.params.clamp;
        Vec3::new(scrub(total.x, c), scrub(total.y, c), scrub(total.z, c))
    }
}

/// Clamp a channel and zero out NaN or negative values.
#[inline]
fn scrub(value: f32, clamp: f32) -> f32 {
    let value = if value > clamp { clamp } else { value };
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdtree::SahParams;
    use glint_core::{Light, Material, MeshData, SceneBuilder};
    use glint_math::Vec3;

    fn quad(material: usize, corners: [Vec3; 4], normal: Vec3) -> MeshData {
        MeshData::new(
            corners.to_vec(),
            vec![normal; 4],
            vec![0, 1, 2, 0, 2, 3],
            material,
        )
    }

    fn floor_scene(material: Material, intensity: f32) -> Scene {
        let mut builder = SceneBuilder::new();
        let mat = builder.load_material(material).unwrap();
        builder
            .add_mesh(&quad(
                mat,
                [
                    Vec3::new(-2.0, 0.0, -2.0),
                    Vec3::new(2.0, 0.0, -2.0),
                    Vec3::new(2.0, 0.0, 2.0),
                    Vec3::new(-2.0, 0.0, 2.0),
                ],
                Vec3::Y,
            ))
            .unwrap();
        let mut scene = builder.commit().unwrap();
        scene.add_point_lights(vec![Light::new(
            Vec3::new(0.0, 1.0, 0.0),
            Color::ONE,
            intensity,
            0.0,
        )]);
        scene
    }

    fn white_diffuse() -> Material {
        Material::new("white", Color::ONE).with_brdf(glint_core::BrdfId::Phong)
    }

    fn down_camera() -> Camera {
        Camera::pinhole(Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO, Vec3::Z, 1.0)
    }

    #[test]
    fn test_fresnel_bounds() {
        let n = Vec3::Y;
        for angle_deg in [0, 15, 30, 45, 60, 75, 89] {
            let a = (angle_deg as f32).to_radians();
            let i = Vec3::new(a.sin(), a.cos(), 0.0);
            for ior in [1.0 / 1.5, 1.0 / 1.1, 1.3, 1.5, 2.4] {
                let f = fresnel(i, n, ior);
                assert!((0.0..=1.0).contains(&f), "F = {f} out of bounds");
            }
        }
    }

    #[test]
    fn test_fresnel_normal_incidence_glass() {
        // Head-on entry into glass reflects about 4 percent.
        let f = fresnel(Vec3::Y, Vec3::Y, 1.0 / 1.5);
        assert!(f < 0.1);
        assert!((f - 0.04).abs() < 0.005);
    }

    #[test]
    fn test_fresnel_total_internal_reflection() {
        // Leaving a dense medium past the critical angle.
        let a = 60.0f32.to_radians();
        let i = Vec3::new(a.sin(), a.cos(), 0.0);
        assert_eq!(fresnel(i, Vec3::Y, 1.5), 1.0);
    }

    #[test]
    fn test_fresnel_grazing_approaches_one() {
        let i = Vec3::new(0.9999, 0.0141, 0.0).normalize();
        let f = fresnel(i, Vec3::Y, 1.0 / 1.5);
        assert!(f > 0.9);
    }

    #[test]
    fn test_empty_scene_returns_sky() {
        let scene = SceneBuilder::new().commit().unwrap();
        let tree = KdTree::build(&scene, &SahParams::default());
        let camera = down_camera();
        let params = TracerParams {
            multisample: 4,
            sky_color: Color::new(0.2, 0.3, 0.5),
            sky_brightness: 2.0,
            ..TracerParams::default()
        };
        let tracer = PathTracer::new(&scene, &tree, &camera, 3, 3, params);

        let mut sampler = Sampler::seeded(1);
        let mut rays = 0;
        let radiance = tracer.render_pixel(1, 1, &mut sampler, &mut rays);
        assert!((radiance - Color::new(0.4, 0.6, 1.0)).length() < 1e-5);
        assert_eq!(rays, 4);
    }

    #[test]
    fn test_floor_direct_lighting_value() {
        // White Lambertian floor, unit-distance light of intensity 10, seen
        // head-on: the direct term is intensity / pi.
        let scene = floor_scene(white_diffuse(), 10.0);
        let tree = KdTree::build(&scene, &SahParams::default());
        let camera = down_camera();
        let params = TracerParams {
            depth: 1,
            ..TracerParams::default()
        };
        let tracer = PathTracer::new(&scene, &tree, &camera, 3, 3, params);

        let mut sampler = Sampler::seeded(7);
        let mut rays = 0;
        let radiance = tracer.render_pixel(1, 1, &mut sampler, &mut rays);

        let expected = 10.0 / PI;
        assert!(radiance.x > 0.0);
        assert!(
            (radiance.x - expected).abs() < 2e-3,
            "got {} expected {}",
            radiance.x,
            expected
        );
        assert!((radiance.x - radiance.y).abs() < 1e-6);
    }

    #[test]
    fn test_depth_zero_yields_black() {
        let scene = floor_scene(white_diffuse(), 10.0);
        let tree = KdTree::build(&scene, &SahParams::default());
        let camera = down_camera();
        let params = TracerParams {
            depth: 0,
            ..TracerParams::default()
        };
        let tracer = PathTracer::new(&scene, &tree, &camera, 3, 3, params);

        let mut sampler = Sampler::seeded(7);
        let mut rays = 0;
        let radiance = tracer.render_pixel(1, 1, &mut sampler, &mut rays);
        assert_eq!(radiance, Radiance::ZERO);
        assert_eq!(rays, 0);
    }

    #[test]
    fn test_mirror_transports_light() {
        // Camera -> tilted mirror -> lit ceiling. The mirror bounce does not
        // count towards depth, so depth 1 still reaches the ceiling.
        let mut builder = SceneBuilder::new();
        let mirror_mat = builder
            .load_material(
                Material::new("mirror", Color::ZERO)
                    .with_brdf(glint_core::BrdfId::Phong)
                    .with_reflectivity(1.0),
            )
            .unwrap();
        let white = builder.load_material(white_diffuse()).unwrap();

        let mirror_n = Vec3::new(-1.0, 1.0, 0.0).normalize();
        builder
            .add_mesh(&quad(
                mirror_mat,
                [
                    Vec3::new(1.5, -0.5, -1.0),
                    Vec3::new(2.5, 0.5, -1.0),
                    Vec3::new(2.5, 0.5, 1.0),
                    Vec3::new(1.5, -0.5, 1.0),
                ],
                mirror_n,
            ))
            .unwrap();
        builder
            .add_mesh(&quad(
                white,
                [
                    Vec3::new(1.0, 4.0, -1.0),
                    Vec3::new(3.0, 4.0, -1.0),
                    Vec3::new(3.0, 4.0, 1.0),
                    Vec3::new(1.0, 4.0, 1.0),
                ],
                -Vec3::Y,
            ))
            .unwrap();

        let mut scene = builder.commit().unwrap();
        scene.add_point_lights(vec![Light::new(
            Vec3::new(2.0, 3.0, 0.0),
            Color::ONE,
            10.0,
            0.0,
        )]);
        let tree = KdTree::build(&scene, &SahParams::default());

        let camera = Camera::pinhole(Vec3::ZERO, Vec3::X, Vec3::Y, 0.5);
        let params = TracerParams {
            depth: 1,
            ..TracerParams::default()
        };
        let tracer = PathTracer::new(&scene, &tree, &camera, 3, 3, params);

        let mut sampler = Sampler::seeded(3);
        let mut rays = 0;
        let radiance = tracer.render_pixel(1, 1, &mut sampler, &mut rays);
        assert!(
            radiance.x > 0.5,
            "mirror should transport the lit ceiling, got {radiance}"
        );
    }

    #[test]
    fn test_translucent_slab_stays_finite() {
        let mut builder = SceneBuilder::new();
        let glass = builder
            .load_material(
                Material::new("glass", Color::new(0.9, 0.9, 0.9))
                    .with_translucency(1.0, 1.5),
            )
            .unwrap();
        let white = builder.load_material(white_diffuse()).unwrap();

        builder
            .add_mesh(&quad(
                glass,
                [
                    Vec3::new(-2.0, 1.0, -2.0),
                    Vec3::new(2.0, 1.0, -2.0),
                    Vec3::new(2.0, 1.0, 2.0),
                    Vec3::new(-2.0, 1.0, 2.0),
                ],
                Vec3::Y,
            ))
            .unwrap();
        builder
            .add_mesh(&quad(
                white,
                [
                    Vec3::new(-2.0, 0.0, -2.0),
                    Vec3::new(2.0, 0.0, -2.0),
                    Vec3::new(2.0, 0.0, 2.0),
                    Vec3::new(-2.0, 0.0, 2.0),
                ],
                Vec3::Y,
            ))
            .unwrap();

        let mut scene = builder.commit().unwrap();
        scene.add_point_lights(vec![Light::new(
            Vec3::new(0.0, 3.0, 0.0),
            Color::ONE,
            10.0,
            0.1,
        )]);
        let tree = KdTree::build(&scene, &SahParams::default());

        let camera = Camera::pinhole(Vec3::new(0.0, 3.0, 0.1), Vec3::ZERO, Vec3::Z, 1.0);
        let params = TracerParams {
            multisample: 8,
            depth: 4,
            ..TracerParams::default()
        };
        let tracer = PathTracer::new(&scene, &tree, &camera, 5, 5, params);

        let mut sampler = Sampler::seeded(17);
        let mut rays = 0;
        let radiance = tracer.render_pixel(2, 2, &mut sampler, &mut rays);
        for channel in [radiance.x, radiance.y, radiance.z] {
            assert!(channel.is_finite());
            assert!(channel >= 0.0);
        }
        assert!(rays > 0);
    }

    #[test]
    fn test_clamp_bounds_every_channel() {
        let scene = floor_scene(white_diffuse(), 1e9);
        let tree = KdTree::build(&scene, &SahParams::default());
        let camera = down_camera();
        let params = TracerParams {
            depth: 2,
            clamp: 0.5,
            ..TracerParams::default()
        };
        let tracer = PathTracer::new(&scene, &tree, &camera, 3, 3, params);

        let mut sampler = Sampler::seeded(9);
        let mut rays = 0;
        let radiance = tracer.render_pixel(1, 1, &mut sampler, &mut rays);
        for channel in [radiance.x, radiance.y, radiance.z] {
            assert!(channel.is_finite());
            assert!((0.0..=0.5).contains(&channel));
        }
    }

    #[test]
    fn test_render_pixel_bit_stable() {
        let scene = floor_scene(white_diffuse(), 10.0);
        let tree = KdTree::build(&scene, &SahParams::default());
        let camera = down_camera();
        let params = TracerParams {
            multisample: 4,
            russian: 0.7,
            ..TracerParams::default()
        };
        let tracer = PathTracer::new(&scene, &tree, &camera, 8, 8, params);

        let mut rays_a = 0;
        let mut rays_b = 0;
        let a = tracer.render_pixel(3, 5, &mut Sampler::seeded(42), &mut rays_a);
        let b = tracer.render_pixel(3, 5, &mut Sampler::seeded(42), &mut rays_b);

        assert_eq!(a.x.to_bits(), b.x.to_bits());
        assert_eq!(a.y.to_bits(), b.y.to_bits());
        assert_eq!(a.z.to_bits(), b.z.to_bits());
        assert_eq!(rays_a, rays_b);
    }

    #[test]
    fn test_roulette_probability_one_still_terminates() {
        // A continuation probability of 1 never roulette-terminates; the
        // walk must end through escape or the iteration ceiling instead.
        let scene = floor_scene(white_diffuse(), 1.0);
        let tree = KdTree::build(&scene, &SahParams::default());
        let camera = down_camera();
        let params = TracerParams {
            russian: 1.0,
            ..TracerParams::default()
        };
        let tracer = PathTracer::new(&scene, &tree, &camera, 3, 3, params);

        let mut sampler = Sampler::seeded(21);
        let mut rays = 0;
        let radiance = tracer.render_pixel(1, 1, &mut sampler, &mut rays);
        assert!(rays < MAX_PATH_ITERATIONS as u64);
        assert!(radiance.x.is_finite());
    }
}
