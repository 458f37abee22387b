//! Scene-specific WGSL generation.
//!
//! One routine per node kind. Parameters are never baked into the source:
//! every value is read from `constants[slot]` at the slot the
//! [`SceneLayout`] assigned, so a camera move or animation tick only needs a
//! buffer upload. Material and primitive indices are baked in as literals.

use std::fmt::Write as _;

use crate::scene::{
    AnalyticPrimitive, AnalyticShape, CameraNode, NodeKind, PrimitiveLayout, Scene, SceneLayout, SdfPrimitive,
    SdfShape,
};

/// WGSL float literal.
fn lit(v: f32) -> String {
    if v.is_finite() {
        format!("{v:?}")
    } else {
        "0.0".to_string()
    }
}

const CAMERA_BASIS: &str = r#"
fn camera_basis(origin: vec3<f32>, look_at: vec3<f32>) -> mat3x3<f32> {
    var forward = look_at - origin;
    if (dot(forward, forward) < 1e-12) {
        forward = vec3<f32>(0.0, 0.0, -1.0);
    }
    forward = normalize(forward);
    var right = cross(forward, vec3<f32>(0.0, 1.0, 0.0));
    if (dot(right, right) < 1e-8) {
        right = vec3<f32>(1.0, 0.0, 0.0);
    }
    right = normalize(right);
    let up = cross(right, forward);
    return mat3x3<f32>(right, up, forward);
}
"#;

/// `camera_ray(ndc, size, state)` for the scene camera.
pub fn camera(layout: &SceneLayout) -> String {
    let c0 = layout.camera;
    let c1 = c0 + 1;
    let c2 = c0 + 2;
    let body = match layout.camera_kind {
        CameraNode::Pinhole { .. } => format!(
            r#"
fn camera_ray(ndc: vec2<f32>, size: vec2<f32>, state: ptr<function, u32>) -> Ray {{
    let c0 = constants[{c0}u];
    let c1 = constants[{c1}u];
    let c2 = constants[{c2}u];
    let basis = camera_basis(c0.xyz, c1.xyz);
    let scale = tan(radians(c0.w) * 0.5);
    let d = vec2<f32>(ndc.x * scale, ndc.y * size.y / size.x * scale);
    var ray: Ray;
    ray.origin = c0.xyz;
    ray.dir = normalize(basis[0] * d.x + basis[1] * d.y + basis[2]);
    let aperture = c1.w;
    if (aperture > 0.0) {{
        let focus = ray.origin + ray.dir * (c2.x / dot(ray.dir, basis[2]));
        let lens = uniform_sample_disk(rand2(state)) * aperture;
        ray.origin = ray.origin + basis[0] * lens.x + basis[1] * lens.y;
        ray.dir = normalize(focus - ray.origin);
    }}
    return ray;
}}
"#
        ),
        CameraNode::Isometric { .. } => format!(
            r#"
fn camera_ray(ndc: vec2<f32>, size: vec2<f32>, state: ptr<function, u32>) -> Ray {{
    let c0 = constants[{c0}u];
    let c1 = constants[{c1}u];
    let basis = camera_basis(c0.xyz, c1.xyz);
    let half_width = tan(radians(c0.w) * 0.5) * c0.w;
    let half_height = half_width * size.y / size.x;
    var ray: Ray;
    ray.origin = c0.xyz + basis[0] * (ndc.x * half_width) + basis[1] * (ndc.y * half_height);
    ray.dir = basis[2];
    return ray;
}}
"#
        ),
    };
    format!("{CAMERA_BASIS}{body}")
}

/// `background(rd)`: the sky node when present, else the flat frame color.
pub fn background(layout: &SceneLayout) -> String {
    let Some(s) = layout.sky else {
        return r#"
fn background(rd: vec3<f32>) -> vec3<f32> {
    return frame.background.xyz;
}
"#
        .to_string();
    };
    format!(
        r#"
fn background(rd: vec3<f32>) -> vec3<f32> {{
    let sky_color = constants[{s0}u].xyz;
    let sun_dir = constants[{s1}u].xyz;
    let sun_color = constants[{s2}u].xyz;
    let horizon_color = constants[{s3}u].xyz;
    var sd = vec3<f32>(0.0);
    if (dot(sun_dir, sun_dir) > 0.0) {{
        sd = normalize(sun_dir);
    }}
    let sun = max(dot(rd, sd), 0.0);
    let hor = pow(1.0 - max(rd.y, 0.0), 3.0);
    var col = mix(sky_color, sun_color, sun * 0.5);
    col = mix(col, horizon_color, hor);
    let sun5 = pow(sun, 5.0);
    col = col + 0.25 * vec3<f32>(1.0, 0.7, 0.4) * sun5;
    col = col + 0.25 * vec3<f32>(1.0, 0.8, 0.6) * sun5;
    col = col + 0.15 * vec3<f32>(1.0, 0.9, 0.7) * max(pow(sun, 512.0), 0.25);
    return col;
}}
"#,
        s0 = s,
        s1 = s + 1,
        s2 = s + 2,
        s3 = s + 3,
    )
}

/// Emits a distance expression, consuming parameter slots in pre-order.
struct SdfEmitter<'a> {
    prim: usize,
    slots: std::slice::Iter<'a, u32>,
    helpers: String,
    customs: usize,
}

impl SdfEmitter<'_> {
    fn slot(&mut self) -> u32 {
        self.slots.next().copied().unwrap_or_default()
    }

    fn expr(&mut self, shape: &SdfShape, p: &str) -> String {
        match shape {
            SdfShape::Sphere { .. } => {
                let s = self.slot();
                format!("sd_sphere({p}, constants[{s}u].x)")
            }
            SdfShape::Cuboid { .. } => {
                let s = self.slot();
                format!("sd_box({p}, constants[{s}u].xyz, constants[{s}u].w)")
            }
            SdfShape::Torus { .. } => {
                let s = self.slot();
                format!("sd_torus({p}, constants[{s}u].x, constants[{s}u].y)")
            }
            SdfShape::Capsule { .. } => {
                let s = self.slot();
                let s1 = s + 1;
                format!("sd_capsule({p}, constants[{s}u].xyz, constants[{s1}u].xyz, constants[{s}u].w)")
            }
            SdfShape::Custom { source } => {
                let name = format!("sdf_custom_{}_{}", self.prim, self.customs);
                self.customs += 1;
                let _ = write!(self.helpers, "\nfn {name}(p: vec3<f32>) -> f32 {{\n{source}\n}}\n");
                format!("{name}({p})")
            }
            SdfShape::Translate { shape, .. } => {
                let s = self.slot();
                let q = format!("({p} - constants[{s}u].xyz)");
                self.expr(shape, &q)
            }
            SdfShape::Union(a, b) => {
                let (a, b) = (self.expr(a, p), self.expr(b, p));
                format!("min({a}, {b})")
            }
            SdfShape::Intersect(a, b) => {
                let (a, b) = (self.expr(a, p), self.expr(b, p));
                format!("max({a}, {b})")
            }
            SdfShape::Subtract(a, b) => {
                let (a, b) = (self.expr(a, p), self.expr(b, p));
                format!("max({a}, -({b}))")
            }
            SdfShape::SmoothUnion { a, b, .. } => {
                let s = self.slot();
                let (a, b) = (self.expr(a, p), self.expr(b, p));
                format!("op_smooth_union({a}, {b}, constants[{s}u].x)")
            }
            SdfShape::Displace { shape, .. } => {
                let s = self.slot();
                let inner = self.expr(shape, p);
                format!("({inner} + op_displace({p}, constants[{s}u].x, constants[{s}u].y))")
            }
        }
    }
}

fn sdf_primitive(prim: &SdfPrimitive, pl: &PrimitiveLayout) -> String {
    let idx = pl.index;
    let mut emitter = SdfEmitter { prim: idx, slots: pl.param_slots.iter(), helpers: String::new(), customs: 0 };
    let body = emitter.expr(&prim.shape, "p");
    format!(
        r#"{helpers}
fn sdf_{idx}(pw: vec3<f32>) -> f32 {{
    let p = pw - constants[{base}u].xyz;
    return {body};
}}

fn prim_{idx}(ro: vec3<f32>, rd: vec3<f32>, t_max: f32) -> Hit {{
    var h = no_hit({material});
    // Rays starting inside march on the negated field to reach the exit
    let side = select(1.0, -1.0, sdf_{idx}(ro) < 0.0);
    var t = 0.001;
    for (var k = 0u; k < {steps}u; k = k + 1u) {{
        let d = side * sdf_{idx}(ro + rd * t);
        if (abs(d) < 0.0001 * t) {{
            h.t = t;
            break;
        }}
        t = t + d * {mult};
        if (t > t_max) {{
            break;
        }}
    }}
    if (h.t > 0.0) {{
        let p = ro + rd * h.t;
        let e = vec2<f32>(0.001, 0.0);
        h.normal = normalize(vec3<f32>(
            sdf_{idx}(p + e.xyy) - sdf_{idx}(p - e.xyy),
            sdf_{idx}(p + e.yxy) - sdf_{idx}(p - e.yxy),
            sdf_{idx}(p + e.yyx) - sdf_{idx}(p - e.yyx)
        ));
    }}
    return h;
}}
"#,
        helpers = emitter.helpers,
        base = pl.base,
        material = lit(prim.material as f32),
        steps = pl.steps,
        mult = lit(pl.step_multiplier),
    )
}

fn analytic_primitive(prim: &AnalyticPrimitive, pl: &PrimitiveLayout) -> String {
    let idx = pl.index;
    let base = pl.base;
    let material = lit(prim.material as f32);
    let body = match prim.shape {
        AnalyticShape::Plane { .. } => format!(
            r#"
    let height = constants[{base}u].x;
    if (abs(rd.y) > 1e-8) {{
        let t = (height - ro.y) / rd.y;
        if (t > 0.0 && t < t_max) {{
            h.t = t;
            h.normal = vec3<f32>(0.0, 1.0, 0.0);
        }}
    }}"#
        ),
        AnalyticShape::Sphere { .. } => format!(
            r#"
    let c = constants[{base}u];
    let oc = ro - c.xyz;
    let b = dot(oc, rd);
    let disc = b * b - (dot(oc, oc) - c.w * c.w);
    if (disc > 0.0) {{
        let s = sqrt(disc);
        var t = -b - s;
        if (t <= 0.0) {{
            t = -b + s;
        }}
        if (t > 0.0 && t < t_max) {{
            h.t = t;
            h.normal = (ro + rd * t - c.xyz) / c.w;
        }}
    }}"#
        ),
        AnalyticShape::Dome { .. } => format!(
            r#"
    let c = constants[{base}u];
    let radius = c.x;
    let ceiling = c.y;
    var best = t_max;
    let b = dot(ro, rd);
    let disc = b * b - (dot(ro, ro) - radius * radius);
    if (disc > 0.0) {{
        let t = -b + sqrt(disc);
        let p = ro + rd * t;
        if (t > 0.0 && t < best && p.y >= 0.0) {{
            best = t;
            h.t = t;
            h.normal = -p / radius;
            if (ceiling >= 0.0 && p.y > 0.0) {{
                h.material = ceiling;
            }}
        }}
    }}
    if (rd.y < 0.0 && ro.y > 0.0) {{
        let t = -ro.y / rd.y;
        let p = ro + rd * t;
        if (t > 0.0 && t < best && dot(p, p) <= radius * radius) {{
            h.t = t;
            h.normal = vec3<f32>(0.0, 1.0, 0.0);
            h.material = {material};
        }}
    }}"#
        ),
    };
    format!(
        r#"
fn prim_{idx}(ro: vec3<f32>, rd: vec3<f32>, t_max: f32) -> Hit {{
    var h = no_hit({material});{body}
    return h;
}}
"#
    )
}

/// `sdf_*`/`prim_*` functions for one primitive.
pub fn primitive(scene: &Scene, pl: &PrimitiveLayout) -> String {
    match scene.nodes.get(pl.node).map(|n| &n.kind) {
        Some(NodeKind::Sdf(prim)) => sdf_primitive(prim, pl),
        Some(NodeKind::Analytic(prim)) => analytic_primitive(prim, pl),
        _ => String::new(),
    }
}

/// Intersection entry point for primitive `index` against the bound ray set.
pub fn intersect_entry(index: usize) -> String {
    format!(
        r#"
@compute @workgroup_size(8, 8, 1)
fn intersect_{index}(@builtin(global_invocation_id) gid: vec3<u32>) {{
    if (gid.x >= frame.width || gid.y >= frame.height) {{
        return;
    }}
    let px = gid.y * frame.width + gid.x;
    let cur = gload(rays.hit, px);
    if (cur.x <= TERMINATED) {{
        return;
    }}
    var t_max = RAY_FAR;
    if (cur.x > 0.0) {{
        t_max = cur.x;
    }}
    let h = prim_{index}(gload(rays.origin, px).xyz, gload(rays.direction, px).xyz, t_max);
    if (h.t > 0.0 && (cur.x < 0.0 || h.t < cur.x)) {{
        gstore(rays.hit, px, vec4<f32>(h.t, h.material, {index}.0, 0.0));
        gstore(rays.normal, px, vec4<f32>(h.normal, 0.0));
    }}
}}
"#
    )
}

/// One function per material node plus the `resolve_material` equality chain.
pub fn materials(scene: &Scene, layout: &SceneLayout) -> String {
    let mut out = String::new();
    let mut chain = String::new();
    for (index, (node, slot)) in scene.materials().zip(&layout.materials).enumerate() {
        let custom = node.custom.as_deref().unwrap_or("");
        let _ = write!(
            out,
            r#"
fn material_{index}(p: vec3<f32>, n: vec3<f32>) -> Material {{
    var m = material_from_constants({slot}u);
    {custom}
    return m;
}}
"#
        );
        let keyword = if index == 0 { "if" } else { " else if" };
        let _ = write!(chain, "{keyword} (index == {index}.0) {{\n        return material_{index}(p, n);\n    }}");
    }
    let _ = write!(
        out,
        r#"
fn resolve_material(index: f32, p: vec3<f32>, n: vec3<f32>) -> Material {{
    {chain}
    return material_default();
}}
"#
    );
    out
}
