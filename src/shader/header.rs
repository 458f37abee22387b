//! Shared WGSL declarations prepended to the generated pass groups.

use std::fmt::Write as _;

use crate::gpu::{Plane, BANK_COUNT, FIRST_BANK_BINDING, PLANES_PER_BANK};

/// Frame uniform, scene buffers and the accumulated image. The plane banks
/// come from [`gbuffer_access`].
pub const BINDINGS: &str = r#"
struct Frame {
    width: u32,
    height: u32,
    sample_index: u32,
    bounce: u32,
    max_depth: u32,
    seed: u32,
    _pad0: u32,
    _pad1: u32,
    background: vec4<f32>,
}

struct Ray {
    origin: vec3<f32>,
    dir: vec3<f32>,
}

@group(0) @binding(0) var<uniform> frame: Frame;
@group(0) @binding(1) var<storage, read> constants: array<vec4<f32>>;
@group(0) @binding(2) var<storage, read> lights: array<vec4<f32>>;
@group(0) @binding(3) var<storage, read_write> final_image: array<vec4<f32>>;

// hit.x of a live ray that has not hit anything yet
const NO_HIT: f32 = -1.0;
// hit.x of a finished path
const TERMINATED: f32 = -2.0;
const RAY_FAR: f32 = 10000.0;
// Shadow rays travelling further than this reach the sun
const SUN_FAR: f32 = 1000.0;
const SUN_SOLID_ANGLE: f32 = 0.0687;
// tan of the sun's angular radius
const SUN_DISK_RADIUS: f32 = 0.1492;

fn pixel_count() -> u32 {
    return frame.width * frame.height;
}
"#;

/// Plane set selected per dispatch for the intersection kernels.
pub const RAY_SET: &str = r#"
struct RaySet {
    origin: u32,
    direction: u32,
    hit: u32,
    normal: u32,
}

@group(1) @binding(0) var<uniform> rays: RaySet;

struct Hit {
    t: f32,
    normal: vec3<f32>,
    material: f32,
}

fn no_hit(material: f32) -> Hit {
    var h: Hit;
    h.t = -1.0;
    h.normal = vec3<f32>(0.0, 1.0, 0.0);
    h.material = material;
    return h;
}
"#;

/// Distance functions and combinators used by generated primitives.
pub const SDF_LIB: &str = r#"
fn sd_sphere(p: vec3<f32>, r: f32) -> f32 {
    return length(p) - r;
}

fn sd_box(p: vec3<f32>, b: vec3<f32>, r: f32) -> f32 {
    let q = abs(p) - b + vec3<f32>(r);
    return length(max(q, vec3<f32>(0.0))) + min(max(q.x, max(q.y, q.z)), 0.0) - r;
}

fn sd_torus(p: vec3<f32>, major: f32, minor: f32) -> f32 {
    let q = vec2<f32>(length(p.xz) - major, p.y);
    return length(q) - minor;
}

fn sd_capsule(p: vec3<f32>, a: vec3<f32>, b: vec3<f32>, r: f32) -> f32 {
    let pa = p - a;
    let ba = b - a;
    let h = clamp(dot(pa, ba) / max(dot(ba, ba), 1e-8), 0.0, 1.0);
    return length(pa - ba * h) - r;
}

fn op_smooth_union(a: f32, b: f32, k: f32) -> f32 {
    if (k <= 0.0) {
        return min(a, b);
    }
    let h = clamp(0.5 + 0.5 * (b - a) / k, 0.0, 1.0);
    return mix(b, a, h) - k * h * (1.0 - h);
}

fn op_displace(p: vec3<f32>, amplitude: f32, frequency: f32) -> f32 {
    return amplitude * sin(frequency * p.x) * sin(frequency * p.y) * sin(frequency * p.z);
}
"#;

/// Material plane I/O. Row order matches the scene constant records.
pub const MATERIAL_IO: &str = r#"
fn material_from_constants(slot: u32) -> Material {
    let r0 = constants[slot];
    let r1 = constants[slot + 1u];
    let r2 = constants[slot + 2u];
    let r3 = constants[slot + 3u];
    let r4 = constants[slot + 4u];
    let r5 = constants[slot + 5u];
    var m: Material;
    m.albedo = r0.xyz;
    m.specular = r0.w;
    m.emission = r1.xyz;
    m.anisotropic = r1.w;
    m.metallic = r2.x;
    m.roughness = r2.y;
    m.subsurface = r2.z;
    m.specular_tint = r2.w;
    m.sheen = r3.x;
    m.sheen_tint = r3.y;
    m.clearcoat = r3.z;
    m.clearcoat_gloss = r3.w;
    m.transmission = r4.x;
    m.ior = r5.x;
    m.extinction = r5.yzw;
    return m;
}

fn store_material(px: u32, m: Material, light_dir: vec3<f32>) {
    gstore(PLANE_MAT_ALBEDO, px, vec4<f32>(m.albedo, m.specular));
    gstore(PLANE_MAT_EMISSION, px, vec4<f32>(m.emission, m.anisotropic));
    gstore(PLANE_MAT_SURFACE, px, vec4<f32>(m.metallic, m.roughness, m.subsurface, m.specular_tint));
    gstore(PLANE_MAT_SHEEN, px, vec4<f32>(m.sheen, m.sheen_tint, m.clearcoat, m.clearcoat_gloss));
    gstore(PLANE_MAT_TRANSMISSION, px, vec4<f32>(light_dir, m.transmission));
    gstore(PLANE_MAT_MEDIUM, px, vec4<f32>(m.ior, m.extinction));
}

fn load_material(px: u32) -> Material {
    let a = gload(PLANE_MAT_ALBEDO, px);
    let e = gload(PLANE_MAT_EMISSION, px);
    let s = gload(PLANE_MAT_SURFACE, px);
    let c = gload(PLANE_MAT_SHEEN, px);
    let t = gload(PLANE_MAT_TRANSMISSION, px);
    let md = gload(PLANE_MAT_MEDIUM, px);
    var m: Material;
    m.albedo = a.xyz;
    m.specular = a.w;
    m.emission = e.xyz;
    m.anisotropic = e.w;
    m.metallic = s.x;
    m.roughness = s.y;
    m.subsurface = s.z;
    m.specular_tint = s.w;
    m.sheen = c.x;
    m.sheen_tint = c.y;
    m.clearcoat = c.z;
    m.clearcoat_gloss = c.w;
    m.transmission = t.w;
    m.ior = md.x;
    m.extinction = md.yzw;
    return m;
}

fn is_emissive(m: Material) -> bool {
    return any(m.emission > vec3<f32>(0.0));
}
"#;

/// `const PLANE_*: u32` declarations, the bank bindings and `gload`/`gstore`.
pub fn gbuffer_access() -> String {
    let mut out = String::from("\n");
    for plane in Plane::ALL {
        let _ = writeln!(out, "const {}: u32 = {}u;", plane.wgsl_name(), plane.index());
    }
    let _ = writeln!(out, "const PLANES_PER_BANK: u32 = {PLANES_PER_BANK}u;\n");
    for bank in 0..BANK_COUNT {
        let _ = writeln!(
            out,
            "@group(0) @binding({}) var<storage, read_write> bank{bank}: array<vec4<f32>>;",
            FIRST_BANK_BINDING as usize + bank
        );
    }

    let last = BANK_COUNT - 1;
    let mut load = String::new();
    let mut store = String::new();
    for bank in 0..BANK_COUNT {
        let label = if bank == last { "default".to_string() } else { format!("case {bank}u") };
        let _ = writeln!(load, "        {label}: {{ v = bank{bank}[i]; }}");
        let _ = writeln!(store, "        {label}: {{ bank{bank}[i] = value; }}");
    }
    let _ = write!(
        out,
        r#"
fn plane_index(plane: u32, px: u32) -> u32 {{
    return (plane % PLANES_PER_BANK) * pixel_count() + px;
}}

fn gload(plane: u32, px: u32) -> vec4<f32> {{
    let i = plane_index(plane, px);
    var v = vec4<f32>(0.0);
    switch (plane / PLANES_PER_BANK) {{
{load}    }}
    return v;
}}

fn gstore(plane: u32, px: u32, value: vec4<f32>) {{
    let i = plane_index(plane, px);
    switch (plane / PLANES_PER_BANK) {{
{store}    }}
}}
"#
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gbuffer_access() {
        let src = gbuffer_access();
        assert!(src.contains("const PLANE_RAY_ORIGIN: u32 = 0u;"));
        assert!(src.contains("const PLANE_FIRST_HIT: u32 = 19u;"));
        assert_eq!(src.lines().filter(|l| l.starts_with("const PLANE_")).count(), Plane::COUNT);
        assert_eq!(src.matches("var<storage, read_write> bank").count(), BANK_COUNT);
        assert!(src.contains(&format!("@binding({}) var<storage, read_write> bank0", FIRST_BANK_BINDING)));
        assert_eq!(src.matches("default:").count(), 2);
    }

    #[test]
    fn test_material_io_covers_planes() {
        for plane in [
            Plane::MatAlbedo,
            Plane::MatEmission,
            Plane::MatSurface,
            Plane::MatSheen,
            Plane::MatTransmission,
            Plane::MatMedium,
        ] {
            assert!(MATERIAL_IO.contains(plane.wgsl_name()));
        }
    }
}
