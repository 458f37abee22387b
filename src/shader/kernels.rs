//! Fixed pass entry points.
//!
//! Each pass reads and writes G-buffer planes only; the scene-specific parts
//! (`camera_ray`, `background`, `resolve_material`, `prim_*`) come from codegen.

/// Primary ray generation and per-sample plane reset.
pub const CAMERA_PASS: &str = r#"
// Tent filter over [-1, 1] pixels
fn tent(r: f32) -> f32 {
    if (r < 1.0) {
        return sqrt(r) - 1.0;
    }
    return 1.0 - sqrt(2.0 - r);
}

@compute @workgroup_size(8, 8, 1)
fn camera_main(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= frame.width || gid.y >= frame.height) {
        return;
    }
    let px = gid.y * frame.width + gid.x;
    let size = vec2<f32>(f32(frame.width), f32(frame.height));
    var state = rng_seed(px, frame.sample_index, 0u, frame.seed ^ 0x9e3779b9u);

    let r = 2.0 * rand2(&state);
    let jitter = vec2<f32>(tent(r.x), tent(r.y)) / (size * 0.5);
    let uv = (vec2<f32>(gid.xy) + vec2<f32>(0.5)) / size;
    let ndc = vec2<f32>(2.0 * uv.x - 1.0, 1.0 - 2.0 * uv.y) + jitter;
    let ray = camera_ray(ndc, size, &state);

    gstore(PLANE_RAY_ORIGIN, px, vec4<f32>(ray.origin, 0.0));
    gstore(PLANE_RAY_DIR, px, vec4<f32>(ray.dir, 0.0));
    gstore(PLANE_HIT, px, vec4<f32>(NO_HIT, -1.0, 0.0, 0.0));
    gstore(PLANE_NORMAL, px, vec4<f32>(0.0));
    gstore(PLANE_DIRECT, px, vec4<f32>(0.0));
    gstore(PLANE_RADIANCE, px, vec4<f32>(0.0));
    gstore(PLANE_THROUGHPUT, px, vec4<f32>(1.0, 1.0, 1.0, -1.0));
    gstore(PLANE_ABSORPTION, px, vec4<f32>(0.0));
    gstore(PLANE_FIRST_HIT, px, vec4<f32>(-1.0, -1.0, -1.0, 0.0));
}
"#;

/// Incremental mean of the gamma-mapped sample into the final image.
pub const ACCUMULATE_PASS: &str = r#"
@compute @workgroup_size(8, 8, 1)
fn accumulate_main(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= frame.width || gid.y >= frame.height) {
        return;
    }
    let px = gid.y * frame.width + gid.x;
    let k = f32(frame.sample_index + 1u);

    var radiance = gload(PLANE_RADIANCE, px).xyz;
    if (!finite3(radiance)) {
        radiance = vec3<f32>(0.0);
    }
    radiance = max(radiance, vec3<f32>(0.0));
    let positive = radiance > vec3<f32>(0.0);
    let mapped = select(vec3<f32>(0.0), pow(radiance, vec3<f32>(1.0 / 2.2)), positive);
    let sample_color = clamp(mapped, vec3<f32>(0.0), vec3<f32>(1.0));

    let prev = final_image[px].xyz;
    final_image[px] = vec4<f32>(prev * (1.0 - 1.0 / k) + sample_color / k, 1.0);
}
"#;

/// Light selection helpers shared by the shading kernels.
pub const LIGHT_SAMPLING: &str = r#"
fn light_count() -> u32 {
    return u32(lights[0].x);
}

// Direction inside the sun's disk.
fn sample_sun(dir: vec3<f32>, u: vec2<f32>) -> vec3<f32> {
    let basis = onb(normalize(dir));
    let d = uniform_sample_disk(u) * SUN_DISK_RADIUS;
    return normalize(basis * vec3<f32>(d, 1.0));
}

// Uniform point on the cap of the sphere visible from origin; w = 0 when origin is inside.
fn sample_sphere_light(origin: vec3<f32>, center: vec3<f32>, radius: f32, u: vec2<f32>) -> vec4<f32> {
    let to_center = center - origin;
    let dist = length(to_center);
    if (dist <= radius) {
        return vec4<f32>(0.0);
    }
    let axis = -to_center / dist;
    let local = uniform_sample_cap(u, radius / dist);
    let q = center + (onb(axis) * local) * radius;
    return vec4<f32>(normalize(q - origin), 1.0);
}

fn visible_cap_area(origin: vec3<f32>, center: vec3<f32>, radius: f32) -> f32 {
    let dist = length(center - origin);
    if (dist <= radius) {
        return 0.0;
    }
    return TWO_PI * radius * radius * (1.0 - radius / dist);
}

// Solid-angle pdf of NEE choosing point p on a sphere light from origin; 0 when p is not on one.
fn emitter_pdf(origin: vec3<f32>, p: vec3<f32>, n: vec3<f32>, material: f32) -> f32 {
    let count = light_count();
    for (var i = 0u; i < count; i = i + 1u) {
        let rec = lights[1u + i * 2u];
        if (rec.x != 1.0 || rec.z != material) {
            continue;
        }
        let center = constants[u32(rec.y)].xyz;
        let radius = rec.w;
        if (abs(length(p - center) - radius) > 0.01 * radius + EPS) {
            continue;
        }
        let cap_area = visible_cap_area(origin, center, radius);
        let to_p = p - origin;
        let dist2 = dot(to_p, to_p);
        let cos_light = abs(dot(n, to_p / sqrt(dist2)));
        if (cap_area <= 0.0 || cos_light < 1e-4) {
            return 0.0;
        }
        return dist2 / (cap_area * cos_light * f32(count));
    }
    return 0.0;
}
"#;

/// Material resolve plus light selection for next-event estimation.
pub const MATERIAL_PASS: &str = r#"
@compute @workgroup_size(8, 8, 1)
fn material_main(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= frame.width || gid.y >= frame.height) {
        return;
    }
    let px = gid.y * frame.width + gid.x;
    let hit = gload(PLANE_HIT, px);
    if (hit.y < 0.0) {
        gstore(PLANE_SHADOW_HIT, px, vec4<f32>(TERMINATED, -1.0, 0.0, 0.0));
        return;
    }

    let ro = gload(PLANE_RAY_ORIGIN, px).xyz;
    let rd = gload(PLANE_RAY_DIR, px).xyz;
    let n = gload(PLANE_NORMAL, px).xyz;
    let p = ro + rd * hit.x;
    let m = resolve_material(hit.y, p, n);
    let ffn = face_forward(n, rd);
    let origin = p + ffn * EPS;

    var state = rng_seed(px, frame.sample_index, frame.bounce, frame.seed ^ 0x68bc21ebu);
    var light_dir = vec3<f32>(0.0);
    var record = -1.0;
    let count = light_count();
    if (count > 0u && !is_emissive(m)) {
        let pick = min(u32(floor(rand(&state) * f32(count))), count - 1u);
        let index = 1u + pick * 2u;
        let rec = lights[index];
        if (rec.x == 0.0) {
            light_dir = sample_sun(rec.yzw, rand2(&state));
            record = f32(index);
        } else {
            let s = sample_sphere_light(origin, constants[u32(rec.y)].xyz, rec.w, rand2(&state));
            if (s.w > 0.0) {
                light_dir = s.xyz;
                record = f32(index);
            }
        }
        if (dot(light_dir, ffn) <= 0.0) {
            record = -1.0;
        }
    }

    store_material(px, m, light_dir);
    gstore(PLANE_LIGHT_SAMPLE, px, vec4<f32>(record, 0.0, 0.0, 0.0));
    gstore(PLANE_SHADOW_ORIGIN, px, vec4<f32>(origin, 0.0));
    gstore(PLANE_SHADOW_DIR, px, vec4<f32>(light_dir, 0.0));
    gstore(PLANE_SHADOW_HIT, px, vec4<f32>(select(TERMINATED, NO_HIT, record >= 0.0), -1.0, 0.0, 0.0));
    gstore(PLANE_SHADOW_NORMAL, px, vec4<f32>(0.0));
}
"#;

/// Next-event estimate from the shadow ray result.
pub const DIRECT_PASS: &str = r#"
@compute @workgroup_size(8, 8, 1)
fn direct_main(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= frame.width || gid.y >= frame.height) {
        return;
    }
    let px = gid.y * frame.width + gid.x;
    let hit = gload(PLANE_HIT, px);
    let record = gload(PLANE_LIGHT_SAMPLE, px).x;
    var direct = vec3<f32>(0.0);

    if (hit.y >= 0.0 && record >= 0.0) {
        let index = u32(record);
        let rec = lights[index];
        let emission = lights[index + 1u].xyz;
        let count = f32(light_count());
        let shadow = gload(PLANE_SHADOW_HIT, px);
        let l = gload(PLANE_SHADOW_DIR, px).xyz;
        let rd = gload(PLANE_RAY_DIR, px).xyz;
        let n = face_forward(gload(PLANE_NORMAL, px).xyz, rd);
        let v = -rd;
        let m = load_material(px);
        let f = disney_eval(m, v, n, l);
        let cos_surface = abs(dot(n, l));

        if (rec.x == 0.0) {
            if (shadow.x < 0.0 || shadow.x > SUN_FAR) {
                let light_pdf = 1.0 / (SUN_SOLID_ANGLE * count);
                direct = f * cos_surface * emission / light_pdf;
            }
        } else if (shadow.y == rec.z) {
            let origin = gload(PLANE_SHADOW_ORIGIN, px).xyz;
            let cap_area = visible_cap_area(origin, constants[u32(rec.y)].xyz, rec.w);
            let cos_light = abs(dot(gload(PLANE_SHADOW_NORMAL, px).xyz, -l));
            if (cap_area > 0.0 && cos_light > 1e-4) {
                let light_pdf = shadow.x * shadow.x / (cap_area * cos_light * count);
                let bsdf_pdf = disney_pdf(m, v, n, l);
                let w = power_heuristic(light_pdf, bsdf_pdf);
                direct = w * f * cos_surface * emission / light_pdf;
            }
        }
        if (!finite3(direct)) {
            direct = vec3<f32>(0.0);
        }
    }
    gstore(PLANE_DIRECT, px, vec4<f32>(direct, 0.0));
}
"#;

/// Radiance gathering and BSDF continuation for one bounce.
pub const TRACE_PASS: &str = r#"
fn terminate(px: u32, radiance: vec3<f32>) {
    gstore(PLANE_RADIANCE, px, vec4<f32>(radiance, 1.0));
    gstore(PLANE_HIT, px, vec4<f32>(TERMINATED, -1.0, 0.0, 0.0));
}

@compute @workgroup_size(8, 8, 1)
fn trace_main(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= frame.width || gid.y >= frame.height) {
        return;
    }
    let px = gid.y * frame.width + gid.x;
    let hit = gload(PLANE_HIT, px);
    if (hit.x <= TERMINATED) {
        return;
    }
    if (frame.bounce == 0u) {
        gstore(PLANE_FIRST_HIT, px, vec4<f32>(hit.x, hit.y, hit.z, 0.0));
    }

    let rd = gload(PLANE_RAY_DIR, px).xyz;
    var radiance = gload(PLANE_RADIANCE, px).xyz;
    let thr = gload(PLANE_THROUGHPUT, px);
    var throughput = thr.xyz;

    if (hit.y < 0.0) {
        terminate(px, radiance + throughput * background(rd));
        return;
    }

    let absorption = gload(PLANE_ABSORPTION, px);
    if (absorption.w > 0.0) {
        throughput = throughput * exp(-absorption.xyz * hit.x);
    }

    let ro = gload(PLANE_RAY_ORIGIN, px).xyz;
    let p = ro + rd * hit.x;
    let n_geo = gload(PLANE_NORMAL, px).xyz;
    let m = load_material(px);

    if (is_emissive(m)) {
        var w = 1.0;
        if (frame.bounce > 0u && thr.w > 0.0) {
            w = power_heuristic(thr.w, emitter_pdf(ro, p, n_geo, hit.y));
        }
        terminate(px, radiance + throughput * m.emission * w);
        return;
    }

    radiance = radiance + throughput * gload(PLANE_DIRECT, px).xyz;

    let n = face_forward(n_geo, rd);
    let entering = dot(n_geo, rd) < 0.0;
    var state = rng_seed(px, frame.sample_index, frame.bounce, frame.seed ^ 0x2545f491u);
    let s = disney_sample(m, -rd, n, entering, &state);
    if (s.pdf <= 0.0 || dot(s.dir, s.dir) == 0.0 || !finite3(s.f)) {
        terminate(px, radiance);
        return;
    }
    throughput = throughput * s.f * abs(dot(n, s.dir)) / s.pdf;
    if (!finite3(throughput)) {
        terminate(px, radiance);
        return;
    }

    if (s.medium > 0.0) {
        gstore(PLANE_ABSORPTION, px, vec4<f32>(-log(max(m.extinction, vec3<f32>(1e-4))), 1.0));
    } else if (s.medium < 0.0) {
        gstore(PLANE_ABSORPTION, px, vec4<f32>(0.0));
    }
    gstore(PLANE_THROUGHPUT, px, vec4<f32>(throughput, select(s.pdf, -1.0, s.specular > 0.0)));
    gstore(PLANE_RADIANCE, px, vec4<f32>(radiance, 1.0));
    gstore(PLANE_RAY_ORIGIN, px, vec4<f32>(p + s.dir * EPS, 0.0));
    gstore(PLANE_RAY_DIR, px, vec4<f32>(s.dir, 0.0));
    gstore(PLANE_HIT, px, vec4<f32>(NO_HIT, -1.0, 0.0, 0.0));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_points() {
        assert!(CAMERA_PASS.contains("fn camera_main("));
        assert!(ACCUMULATE_PASS.contains("fn accumulate_main("));
        assert!(MATERIAL_PASS.contains("fn material_main("));
        assert!(DIRECT_PASS.contains("fn direct_main("));
        assert!(TRACE_PASS.contains("fn trace_main("));
    }

    #[test]
    fn test_light_index_arithmetic() {
        // One header record, two records per light
        assert!(MATERIAL_PASS.contains("let index = 1u + pick * 2u;"));
        assert!(LIGHT_SAMPLING.contains("lights[1u + i * 2u]"));
    }
}
