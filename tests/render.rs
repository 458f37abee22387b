//! GPU integration tests. Each test returns early when no adapter is available.

use std::time::{Duration, Instant};

use disney_bsdf::reference::{self, Rng, TWO_PI};
use disney_bsdf::Material;
use glam::Vec3;

use sdf_tracer::gpu::{GpuContext, KernelState, Plane};
use sdf_tracer::pipeline::{PipelineEvent, PipelineState, RenderPipeline, RenderWorker, WorkerCommand, WorkerResult};
use sdf_tracer::scene::{AnalyticShape, CameraNode, NodeKind, Scene, SdfPrimitive, SdfShape, SkyNode};
use sdf_tracer::settings::RenderSettings;
use sdf_tracer::shader::KernelId;
use sdf_tracer::Error;

fn context() -> Option<GpuContext> {
    match GpuContext::new() {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

fn v3(record: [f32; 4]) -> Vec3 {
    Vec3::new(record[0], record[1], record[2])
}

const CAMERA: Vec3 = Vec3::new(0.0, 1.0, 3.0);

fn sphere_scene() -> Scene {
    let mut scene = Scene::new();
    let m = scene.add_material("diffuse", Material::diffuse(Vec3::new(0.8, 0.3, 0.2)));
    scene.add_sdf("ball", SdfPrimitive::new(Vec3::ZERO, SdfShape::Sphere { radius: 1.0 }, m));
    scene.add_sun(Vec3::new(0.3, 1.0, 0.2), Vec3::splat(3.0));
    scene.set_sky(SkyNode::default());
    scene.set_camera(CameraNode::pinhole(CAMERA, Vec3::ZERO, 60.0));
    scene
}

fn compiled(ctx: &GpuContext, settings: RenderSettings, scene: &Scene, width: u32, height: u32) -> RenderPipeline {
    let mut pipeline = RenderPipeline::new(ctx.clone(), settings);
    pipeline.resize_view(width, height).unwrap();
    pipeline.compile(scene).unwrap();
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert_eq!(pipeline.kernels().pending(), 0);
    pipeline
}

/// Gamma mapping applied by the accumulation pass.
fn display(c: f32) -> f32 {
    if !c.is_finite() || c <= 0.0 {
        return 0.0;
    }
    c.powf(1.0 / 2.2).clamp(0.0, 1.0)
}

#[test]
fn test_single_sphere_one_sample() {
    let Some(ctx) = context() else { return };
    let settings = RenderSettings { max_depth: 1, ..Default::default() };
    let mut pipeline = compiled(&ctx, settings, &sphere_scene(), 32, 24);
    assert_eq!(pipeline.render_samples(1).unwrap(), 1);

    let dirs = pipeline.read_plane(Plane::RayDir).unwrap();
    let origins = pipeline.read_plane(Plane::RayOrigin).unwrap();
    let hits = pipeline.read_plane(Plane::Hit).unwrap();
    let first = pipeline.read_plane(Plane::FirstHit).unwrap();
    let normals = pipeline.read_plane(Plane::Normal).unwrap();
    let radiance = pipeline.read_plane(Plane::Radiance).unwrap();
    let throughput = pipeline.read_plane(Plane::Throughput).unwrap();

    let sky = SkyNode::default();
    let (mut misses, mut surface) = (0, 0);
    for i in 0..first.len() {
        if first[i][0] < 0.0 {
            misses += 1;
            let expected = sky.eval(v3(dirs[i]));
            let got = v3(radiance[i]);
            assert!((got - expected).abs().max_element() < 1e-3, "pixel {i}: {got} != {expected}");
            assert_eq!(throughput[i], [1.0, 1.0, 1.0, -1.0]);
        } else {
            surface += 1;
            assert!(first[i][1] >= 0.0, "pixel {i} hit without material");
            let n = v3(normals[i]);
            assert!((n.length() - 1.0).abs() < 1e-2, "pixel {i}: normal {n}");
            assert!(n.dot(CAMERA) > 0.0, "pixel {i}: normal {n} faces away from camera");
            // A continued path starts just off the hit point
            if hits[i][0] == -1.0 {
                let p = v3(origins[i]);
                assert!(n.dot(p.normalize()) > 0.95, "pixel {i}: normal {n} at {p}");
            }
        }
    }
    assert!(misses > 0 && surface > 0, "misses {misses} hits {surface}");
}

fn first_hit_at_center(ctx: &GpuContext, scene: &Scene) -> [f32; 4] {
    let settings = RenderSettings { max_depth: 1, ..Default::default() };
    let mut pipeline = compiled(ctx, settings, scene, 9, 9);
    pipeline.render_samples(1).unwrap();
    pipeline.read_plane(Plane::FirstHit).unwrap()[4 * 9 + 4]
}

#[test]
fn test_nearest_primitive_wins() {
    let Some(ctx) = context() else { return };
    let camera = CameraNode::pinhole(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 20.0);

    for near_first in [false, true] {
        let mut scene = Scene::new();
        let far_m = scene.add_material("far", Material::default());
        let near_m = scene.add_material("near", Material::default());
        let far = |s: &mut Scene| {
            s.add_analytic("far", AnalyticShape::Sphere { center: Vec3::ZERO, radius: 1.0 }, far_m)
        };
        let near = |s: &mut Scene| {
            s.add_sdf("near", SdfPrimitive::new(Vec3::new(0.0, 0.0, 2.0), SdfShape::Sphere { radius: 0.5 }, near_m))
        };
        let near_index = if near_first {
            let i = near(&mut scene);
            far(&mut scene);
            i
        } else {
            far(&mut scene);
            near(&mut scene)
        };
        scene.set_camera(camera.clone());

        let hit = first_hit_at_center(&ctx, &scene);
        assert!((hit[0] - 2.5).abs() < 1e-2, "distance {}", hit[0]);
        assert_eq!(hit[1], near_m as f32);
        assert_eq!(hit[2], near_index as f32);
    }
}

#[test]
fn test_equal_distance_keeps_first_declared() {
    let Some(ctx) = context() else { return };
    for (first_m, second_m) in [(0usize, 1usize), (1, 0)] {
        let mut scene = Scene::new();
        scene.add_material("a", Material::default());
        scene.add_material("b", Material::default());
        let shape = AnalyticShape::Sphere { center: Vec3::ZERO, radius: 1.0 };
        scene.add_analytic("first", shape.clone(), first_m);
        scene.add_analytic("second", shape, second_m);
        scene.set_camera(CameraNode::pinhole(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 20.0));

        let hit = first_hit_at_center(&ctx, &scene);
        assert_eq!(hit[1], first_m as f32);
        assert_eq!(hit[2], 0.0);
    }
}

#[test]
fn test_accumulation_is_mean_of_samples() {
    let Some(ctx) = context() else { return };
    let settings = RenderSettings { max_depth: 3, ..Default::default() };
    let mut pipeline = compiled(&ctx, settings, &sphere_scene(), 16, 12);

    let k = 5;
    let mut sum = vec![Vec3::ZERO; 16 * 12];
    for _ in 0..k {
        pipeline.render_samples(1).unwrap();
        let radiance = pipeline.read_plane(Plane::Radiance).unwrap();
        for (acc, r) in sum.iter_mut().zip(&radiance) {
            *acc += Vec3::new(display(r[0]), display(r[1]), display(r[2]));
        }
    }
    assert_eq!(pipeline.sample_count(), k);

    let image = pipeline.read_final().unwrap();
    for (i, (px, acc)) in image.iter().zip(&sum).enumerate() {
        let mean = *acc / k as f32;
        assert!((v3(*px) - mean).abs().max_element() < 1e-3, "pixel {i}: {:?} != {mean}", px);
        assert_eq!(px[3], 1.0);
    }
}

#[test]
fn test_restart_clears_before_next_sample() {
    let Some(ctx) = context() else { return };
    let settings = RenderSettings { max_depth: 2, max_samples: 4, ..Default::default() };
    let mut pipeline = compiled(&ctx, settings, &sphere_scene(), 16, 16);

    pipeline.render().unwrap();
    for _ in 0..6 {
        pipeline.pump().unwrap();
    }
    pipeline.restart().unwrap();
    assert_eq!(pipeline.sample_count(), 0);
    assert!(pipeline.read_final().unwrap().iter().all(|px| *px == [0.0; 4]));

    pipeline.run_until_idle().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert_eq!(pipeline.sample_count(), 4);
}

#[test]
fn test_stop_is_lossless() {
    let Some(ctx) = context() else { return };
    let settings = RenderSettings { max_depth: 2, ..Default::default() };
    let mut pipeline = compiled(&ctx, settings, &sphere_scene(), 8, 8);

    pipeline.render_samples(2).unwrap();
    pipeline.render().unwrap();
    pipeline.pump().unwrap();
    pipeline.stop();
    pipeline.run_until_idle().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Idle);
    let resumed_from = pipeline.sample_count();
    assert!(resumed_from >= 2);

    // Resuming continues the running mean
    assert_eq!(pipeline.render_samples(1).unwrap(), resumed_from + 1);
}

fn broken_scene() -> Scene {
    let mut broken = sphere_scene();
    broken.add_sdf("broken", SdfPrimitive::new(Vec3::ZERO, SdfShape::Custom { source: "return p.x +;".into() }, 0));
    broken
}

fn assert_all_error_color(pipeline: &RenderPipeline, color: [f32; 4], pixels: usize) {
    let image = pipeline.read_final().unwrap();
    assert_eq!(image.len(), pixels);
    assert!(image.iter().all(|px| *px == color), "first pixel {:?}", image[0]);
}

#[test]
fn test_malformed_fragment_invalidates() {
    let Some(ctx) = context() else { return };
    let broken = broken_scene();

    let settings = RenderSettings::default();
    let error_color = settings.error_color;
    let mut pipeline = RenderPipeline::new(ctx, settings);
    pipeline.resize_view(8, 8).unwrap();
    let err = pipeline.compile(&broken).unwrap_err();
    assert!(matches!(err, Error::Compile { .. }), "{err}");
    assert_eq!(pipeline.state(), PipelineState::Invalid);
    assert_eq!(pipeline.kernels().pending(), 0);
    assert!(pipeline.invalid_reason().is_some());
    assert_all_error_color(&pipeline, error_color, 64);
    assert_eq!(pipeline.kernels().state(KernelId::Intersect(1)), KernelState::Invalid);
    assert_eq!(pipeline.kernels().state(KernelId::Camera), KernelState::Compiled);
    assert!(pipeline.render().is_err());

    // A fixed scene recovers
    pipeline.compile(&sphere_scene()).unwrap();
    assert_eq!(pipeline.state(), PipelineState::Idle);

    // Same outcomes through the background compile
    pipeline.compile_async(&broken).unwrap();
    pipeline.run_until_idle().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Invalid);
    assert_eq!(pipeline.kernels().pending(), 0);
    assert_all_error_color(&pipeline, error_color, 64);

    pipeline.compile_async(&sphere_scene()).unwrap();
    pipeline.run_until_idle().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert_eq!(pipeline.kernels().pending(), 0);
    assert!(pipeline.last_compile_report().is_ok());
}

#[test]
fn test_error_color_survives_update_and_resize() {
    let Some(ctx) = context() else { return };
    let settings = RenderSettings { error_color: [1.0, 0.0, 1.0, 1.0], ..Default::default() };
    let mut pipeline = compiled(&ctx, settings, &sphere_scene(), 8, 8);
    pipeline.render_samples(1).unwrap();

    assert!(pipeline.compile(&broken_scene()).is_err());
    assert_all_error_color(&pipeline, [1.0, 0.0, 1.0, 1.0], 64);

    // Same structure, new parameters: still broken, so no upload
    let mut moved = broken_scene();
    for node in &mut moved.nodes {
        if let NodeKind::Sdf(prim) = &mut node.kind {
            prim.position += Vec3::new(0.1, 0.0, 0.0);
        }
    }
    assert!(pipeline.update_scene(&moved).is_err());
    assert_eq!(pipeline.state(), PipelineState::Invalid);
    assert_all_error_color(&pipeline, [1.0, 0.0, 1.0, 1.0], 64);

    pipeline.resize_view(10, 10).unwrap();
    assert_eq!(pipeline.state(), PipelineState::Invalid);
    assert_all_error_color(&pipeline, [1.0, 0.0, 1.0, 1.0], 100);

    // A fixed scene through update_scene recovers
    pipeline.update_scene(&sphere_scene()).unwrap();
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert_eq!(pipeline.render_samples(1).unwrap(), 1);
}

/// Pixels whose path is still flagged inside a medium after two bounces
/// through a glass ball filling the view.
fn still_inside_after_exit_bounce(ctx: &GpuContext, sdf: bool) -> usize {
    let mut scene = Scene::new();
    let glass = scene.add_material("glass", Material::glass(Vec3::ONE, 1.5, 0.0));
    if sdf {
        scene.add_sdf("ball", SdfPrimitive::new(Vec3::ZERO, SdfShape::Sphere { radius: 1.0 }, glass));
    } else {
        scene.add_analytic("ball", AnalyticShape::Sphere { center: Vec3::ZERO, radius: 1.0 }, glass);
    }
    scene.set_camera(CameraNode::pinhole(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, 10.0));

    let settings = RenderSettings { max_depth: 2, ..Default::default() };
    let mut pipeline = compiled(ctx, settings, &scene, 16, 16);
    pipeline.render_samples(1).unwrap();
    assert!(pipeline.read_plane(Plane::FirstHit).unwrap().iter().all(|h| h[1] >= 0.0));
    pipeline.read_plane(Plane::Absorption).unwrap().iter().filter(|a| a[3] > 0.0).count()
}

#[test]
fn test_refracted_rays_exit_sdf_primitives() {
    let Some(ctx) = context() else { return };
    let analytic = still_inside_after_exit_bounce(&ctx, false);
    let sdf = still_inside_after_exit_bounce(&ctx, true);
    assert!(analytic < 64, "analytic sphere: {analytic} of 256 inside");
    assert!(sdf <= analytic + 16, "sdf sphere: {sdf} inside, analytic {analytic}");
}

#[test]
fn test_update_scene_uploads_or_recompiles() {
    let Some(ctx) = context() else { return };
    let scene = sphere_scene();
    let mut pipeline = compiled(&ctx, RenderSettings::default(), &scene, 8, 8);
    let generation = pipeline.kernels().generation();
    pipeline.render_samples(2).unwrap();

    let mut moved = scene.clone();
    for node in &mut moved.nodes {
        if let NodeKind::Sdf(prim) = &mut node.kind {
            prim.position = Vec3::new(0.2, 0.1, 0.0);
        }
    }
    pipeline.update_scene(&moved).unwrap();
    assert_eq!(pipeline.kernels().generation(), generation);
    assert_eq!(pipeline.sample_count(), 0);

    let mut grown = moved.clone();
    grown.add_analytic("floor", AnalyticShape::Plane { height: -1.0 }, 0);
    pipeline.update_scene(&grown).unwrap();
    assert_eq!(pipeline.kernels().generation(), generation + 1);
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert_eq!(pipeline.render_samples(1).unwrap(), 1);
}

#[test]
fn test_resize_and_failed_allocation() {
    let Some(ctx) = context() else { return };
    let mut pipeline = compiled(&ctx, RenderSettings::default(), &sphere_scene(), 8, 8);
    pipeline.render_samples(2).unwrap();

    pipeline.resize_view(12, 10).unwrap();
    assert_eq!(pipeline.sample_count(), 0);
    assert_eq!(pipeline.read_final().unwrap().len(), 120);

    let err = pipeline.set_render_size(Some((1 << 15, 1 << 15))).unwrap_err();
    assert!(matches!(err, Error::Allocation { .. }), "{err}");
    assert_eq!(pipeline.render_dimensions(), (12, 10));
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert_eq!(pipeline.render_samples(1).unwrap(), 1);
    assert_eq!(pipeline.read_final().unwrap().len(), 120);
}

/// Reflected radiance at the origin (normal +y, viewed from +y) from a
/// uniformly emitting sphere, integrated over its solid angle on the host.
fn reference_sphere_light(m: &Material, center: Vec3, radius: f32, emission: f32) -> f32 {
    let d = center.length();
    let cos_max = (1.0 - (radius / d).powi(2)).sqrt();
    let basis = reference::onb(center / d);
    let pdf = 1.0 / (TWO_PI * (1.0 - cos_max));
    let mut rng = Rng::new(11);
    let n = 200_000;
    let mut sum = 0.0f64;
    for _ in 0..n {
        let l = basis * reference::uniform_sample_cap(rng.next_vec2(), cos_max);
        if l.y > 0.0 {
            let f = reference::disney_eval(m, Vec3::Y, Vec3::Y, l).x;
            sum += (f * emission * l.y / pdf) as f64;
        }
    }
    (sum / n as f64) as f32
}

#[test]
fn test_sphere_light_converges() {
    let Some(ctx) = context() else { return };
    let floor = Material::diffuse(Vec3::splat(0.8));
    let center = Vec3::new(0.0, 1.5, -1.5);
    let (radius, emission) = (0.2, 10.0);

    let mut scene = Scene::new();
    let floor_m = scene.add_material("floor", floor);
    let mut lamp = Material::diffuse(Vec3::ONE);
    lamp.emission_anisotropic = Vec3::splat(emission).extend(0.0);
    let lamp_m = scene.add_material("lamp", lamp);
    scene.add_analytic("floor", AnalyticShape::Plane { height: 0.0 }, floor_m);
    scene.add_analytic("lamp", AnalyticShape::Sphere { center, radius }, lamp_m);
    scene.set_camera(CameraNode::pinhole(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, 0.5));

    let settings = RenderSettings { max_depth: 2, background: [0.0, 0.0, 0.0, 1.0], seed: 5, ..Default::default() };
    let mut pipeline = compiled(&ctx, settings, &scene, 16, 16);

    let mut values = Vec::new();
    for _ in 0..64 {
        pipeline.render_samples(1).unwrap();
        values.extend(pipeline.read_plane(Plane::Radiance).unwrap().iter().map(|r| r[0] as f64));
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stderr = (var / n).sqrt();

    let expected = reference_sphere_light(&floor, center, radius, emission) as f64;
    let band = 4.0 * stderr + 0.03 * expected;
    assert!((mean - expected).abs() < band, "mean {mean} expected {expected} band {band}");
}

#[test]
fn test_worker_renders_to_budget() {
    let Some(ctx) = context() else { return };
    let settings = RenderSettings { max_samples: 3, max_depth: 2, ..Default::default() };
    let worker = RenderWorker::spawn(ctx, settings).unwrap();
    worker.resize(16, 16);
    worker.compile(sphere_scene());
    worker.render();

    let deadline = Instant::now() + Duration::from_secs(60);
    let mut samples = Vec::new();
    while samples.last() != Some(&2) && Instant::now() < deadline {
        match worker.rx.recv_timeout(Duration::from_millis(100)) {
            Ok(WorkerResult::Event(PipelineEvent::Progress(p))) => samples.push(p.sample_index),
            Ok(WorkerResult::Error(e)) => panic!("worker error: {e}"),
            _ => {}
        }
    }
    assert_eq!(samples, vec![0, 1, 2]);

    worker.send(WorkerCommand::ReadFinal);
    let image = loop {
        match worker.rx.recv_timeout(Duration::from_secs(10)) {
            Ok(WorkerResult::Image { width, height, samples, pixels }) => break (width, height, samples, pixels),
            Ok(_) => continue,
            Err(e) => panic!("no image: {e}"),
        }
    };
    assert_eq!((image.0, image.1, image.2), (16, 16, 3));
    assert_eq!(image.3.len(), 256);
}
