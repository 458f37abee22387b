//! CPU reference of the shading library.
//!
//! Mirrors the WGSL in `shaders/` closely enough to compute expected values
//! for GPU tests and to check the estimators statistically on the host.

use glam::{Mat3, Vec2, Vec3};

use crate::Material;

pub const PI: f32 = std::f32::consts::PI;
pub const TWO_PI: f32 = 2.0 * PI;

/// Same hash as `pcg_hash` in `random.wgsl`.
pub fn pcg_hash(v: u32) -> u32 {
    let state = v.wrapping_mul(747796405).wrapping_add(2891336453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277803737);
    (word >> 22) ^ word
}

/// Host-side random stream matching `rand()` in WGSL.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { state: pcg_hash(seed) }
    }

    pub fn next_f32(&mut self) -> f32 {
        self.state = pcg_hash(self.state);
        (self.state >> 8) as f32 / 16_777_216.0
    }

    pub fn next_vec2(&mut self) -> Vec2 {
        let a = self.next_f32();
        let b = self.next_f32();
        Vec2::new(a, b)
    }
}

/// Orthonormal basis with `n` as the third column.
pub fn onb(n: Vec3) -> Mat3 {
    let s = if n.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (s + n.z);
    let b = n.x * n.y * a;
    let t = Vec3::new(1.0 + s * n.x * n.x * a, s * b, -s * n.x);
    let bt = Vec3::new(b, s + n.y * n.y * a, -n.y);
    Mat3::from_cols(t, bt, n)
}

pub fn cosine_sample_hemisphere(u: Vec2) -> Vec3 {
    let r = u.x.sqrt();
    let phi = TWO_PI * u.y;
    Vec3::new(r * phi.cos(), r * phi.sin(), (1.0 - u.x).max(0.0).sqrt())
}

pub fn uniform_sample_cap(u: Vec2, cos_max: f32) -> Vec3 {
    let z = 1.0 + (cos_max - 1.0) * u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = TWO_PI * u.y;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn power_heuristic(a: f32, b: f32) -> f32 {
    let a2 = a * a;
    let b2 = b * b;
    if a2 + b2 <= 0.0 {
        return 0.0;
    }
    a2 / (a2 + b2)
}

fn schlick_fresnel(u: f32) -> f32 {
    let m = (1.0 - u).clamp(0.0, 1.0);
    let m2 = m * m;
    m2 * m2 * m
}

fn gtr1(n_dot_h: f32, a: f32) -> f32 {
    if a >= 1.0 {
        return 1.0 / PI;
    }
    let a2 = a * a;
    let t = 1.0 + (a2 - 1.0) * n_dot_h * n_dot_h;
    (a2 - 1.0) / (PI * a2.ln() * t)
}

fn gtr2_aniso(n_dot_h: f32, h_dot_x: f32, h_dot_y: f32, ax: f32, ay: f32) -> f32 {
    let t = (h_dot_x / ax).powi(2) + (h_dot_y / ay).powi(2) + n_dot_h * n_dot_h;
    1.0 / (PI * ax * ay * t * t)
}

fn smith_g_ggx(n_dot_v: f32, alpha_g: f32) -> f32 {
    let a = alpha_g * alpha_g;
    let b = n_dot_v * n_dot_v;
    1.0 / (n_dot_v + (a + b - a * b).sqrt())
}

fn smith_g_ggx_aniso(n_dot_v: f32, v_dot_x: f32, v_dot_y: f32, ax: f32, ay: f32) -> f32 {
    1.0 / (n_dot_v + ((v_dot_x * ax).powi(2) + (v_dot_y * ay).powi(2) + n_dot_v * n_dot_v).sqrt())
}

fn aniso_alpha(m: &Material) -> (f32, f32) {
    let aspect = (1.0 - m.emission_anisotropic.w * 0.9).sqrt();
    let r2 = m.roughness() * m.roughness();
    ((r2 / aspect).max(0.001), (r2 * aspect).max(0.001))
}

/// Disney BSDF value as evaluated by the direct-light kernel.
pub fn disney_eval(m: &Material, v: Vec3, n: Vec3, l: Vec3) -> Vec3 {
    let n_dot_l = n.dot(l);
    let n_dot_v = n.dot(v);
    if n_dot_l <= 0.0 || n_dot_v <= 0.0 {
        return Vec3::ZERO;
    }
    let basis = onb(n);
    let (x, y) = (basis.x_axis, basis.y_axis);
    let h = (l + v).normalize();
    let n_dot_h = n.dot(h);
    let l_dot_h = l.dot(h);

    let specular = m.albedo_specular.w;
    let (metallic, roughness, subsurface, specular_tint) =
        (m.surface.x, m.surface.y, m.surface.z, m.surface.w);
    let (sheen, sheen_tint, clearcoat, clearcoat_gloss) = (
        m.sheen_clearcoat.x,
        m.sheen_clearcoat.y,
        m.sheen_clearcoat.z,
        m.sheen_clearcoat.w,
    );

    let cdlin = m.albedo();
    let cdlum = cdlin.dot(Vec3::new(0.3, 0.6, 0.1));
    let ctint = if cdlum > 0.0 { cdlin / cdlum } else { Vec3::ONE };
    let cspec0 = (specular * 0.08 * Vec3::ONE.lerp(ctint, specular_tint)).lerp(cdlin, metallic);
    let csheen = Vec3::ONE.lerp(ctint, sheen_tint);

    let fl = schlick_fresnel(n_dot_l);
    let fv = schlick_fresnel(n_dot_v);
    let fd90 = 0.5 + 2.0 * l_dot_h * l_dot_h * roughness;
    let fd = (1.0 + (fd90 - 1.0) * fl) * (1.0 + (fd90 - 1.0) * fv);
    let fss90 = l_dot_h * l_dot_h * roughness;
    let fss = (1.0 + (fss90 - 1.0) * fl) * (1.0 + (fss90 - 1.0) * fv);
    let ss = 1.25 * (fss * (1.0 / (n_dot_l + n_dot_v) - 0.5) + 0.5);

    let (ax, ay) = aniso_alpha(m);
    let ds = gtr2_aniso(n_dot_h, h.dot(x), h.dot(y), ax, ay);
    let fh = schlick_fresnel(l_dot_h);
    let fs = cspec0.lerp(Vec3::ONE, fh);
    let gs = smith_g_ggx_aniso(n_dot_l, l.dot(x), l.dot(y), ax, ay)
        * smith_g_ggx_aniso(n_dot_v, v.dot(x), v.dot(y), ax, ay);
    let fsheen = fh * sheen * csheen;

    let dr = gtr1(n_dot_h, 0.1 + (0.001 - 0.1) * clearcoat_gloss);
    let fr = 0.04 + (1.0 - 0.04) * fh;
    let gr = smith_g_ggx(n_dot_l, 0.25) * smith_g_ggx(n_dot_v, 0.25);

    let diffuse = fd + (ss - fd) * subsurface;
    let brdf = (diffuse / PI * cdlin + fsheen) * (1.0 - metallic)
        + gs * fs * ds
        + Vec3::splat(0.25 * clearcoat * gr * fr * dr);
    brdf * (1.0 - m.transmission.x)
}

/// Solid angle subtended by a sphere of `radius` seen from `distance`.
pub fn sphere_solid_angle(radius: f32, distance: f32) -> f32 {
    let sin2 = (radius / distance).powi(2).min(1.0);
    TWO_PI * (1.0 - (1.0 - sin2).sqrt())
}

/// Exact reflected radiance of a Lambertian point lit by a sphere of
/// uniform radiance fully above its horizon.
pub fn lambert_sphere_light(albedo: f32, radiance: f32, radius: f32, distance: f32, cos_theta: f32) -> f32 {
    let sin2 = (radius / distance).powi(2);
    albedo / PI * radiance * PI * sin2 * cos_theta
}

/// One NEE sample for a Lambertian point at the origin with normal +y lit by
/// a sphere light, using visible-cap area sampling like the material kernel.
pub fn nee_sphere_sample(rng: &mut Rng, albedo: f32, radiance: f32, center: Vec3, radius: f32) -> f32 {
    let n = Vec3::Y;
    let to_point = -center;
    let dist_center = to_point.length();
    let cos_max = radius / dist_center;
    let local = uniform_sample_cap(rng.next_vec2(), cos_max);
    let light_normal = onb(to_point / dist_center) * local;
    let light_point = center + light_normal * radius;
    let to_light = light_point;
    let dist = to_light.length();
    let l = to_light / dist;
    let cos_surface = n.dot(l);
    let cos_light = light_normal.dot(-l).abs();
    if cos_surface <= 0.0 || cos_light <= 1e-4 {
        return 0.0;
    }
    let cap_area = TWO_PI * radius * radius * (1.0 - cos_max);
    let light_pdf = dist * dist / (cap_area * cos_light);
    albedo / PI * cos_surface * radiance / light_pdf
}
