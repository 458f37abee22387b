//! Composed WGSL must parse and validate for every node kind.

use disney_bsdf::Material;
use glam::Vec3;

use sdf_tracer::scene::{AnalyticShape, CameraNode, Scene, SceneLayout, SdfPrimitive, SdfShape, SkyNode};
use sdf_tracer::settings::RenderSettings;
use sdf_tracer::shader::{compose, ShaderGroup};

fn validate(source: &str) -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;
    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
        .validate(&module)
        .map_err(|e| format!("{e:?}"))?;
    Ok(())
}

fn validate_scene(scene: &Scene) {
    let layout = SceneLayout::build(scene, &RenderSettings::default()).expect("layout");
    let composed = compose(scene, &layout);
    for group in ShaderGroup::ALL {
        if let Err(e) = validate(composed.source(group)) {
            panic!("{} group failed to validate:\n{e}", group.name());
        }
    }
}

fn sphere_scene() -> Scene {
    let mut scene = Scene::new();
    let m = scene.add_material("diffuse", Material::diffuse(Vec3::new(0.8, 0.3, 0.2)));
    scene.add_sdf("ball", SdfPrimitive::new(Vec3::ZERO, SdfShape::Sphere { radius: 1.0 }, m));
    scene.add_sun(Vec3::new(0.3, 1.0, 0.2), Vec3::splat(3.0));
    scene.set_sky(SkyNode::default());
    scene.set_camera(CameraNode::pinhole(Vec3::new(0.0, 1.0, 3.0), Vec3::ZERO, 60.0));
    scene
}

#[test]
fn test_sphere_scene_validates() {
    validate_scene(&sphere_scene());
}

#[test]
fn test_empty_scene_validates() {
    // No primitives, materials or lights: only camera and background
    validate_scene(&Scene::new());
}

#[test]
fn test_csg_scene_validates() {
    let mut scene = Scene::new();
    let floor = scene.add_material("floor", Material::plastic(Vec3::splat(0.7), 0.3));
    let metal = scene.add_material("metal", Material::metal(Vec3::new(0.9, 0.8, 0.5), 0.2));
    let glass = scene.add_material("glass", Material::glass(Vec3::ONE, 1.5, 0.05));
    let tinted = scene.add_custom_material(
        "tinted",
        Material::default(),
        "m.albedo = abs(n) * 0.8;\n    m.roughness = 0.1 + 0.5 * fract(p.y);",
    );

    scene.add_analytic("floor", AnalyticShape::Plane { height: -1.0 }, floor);
    let blob = SdfShape::Subtract(
        Box::new(SdfShape::SmoothUnion {
            a: Box::new(SdfShape::Cuboid { half_extents: Vec3::new(0.6, 0.4, 0.6), rounding: 0.05 }),
            b: Box::new(SdfShape::Translate {
                offset: Vec3::new(0.0, 0.5, 0.0),
                shape: Box::new(SdfShape::Torus { major: 0.7, minor: 0.15 }),
            }),
            k: 0.2,
        }),
        Box::new(SdfShape::Capsule { a: Vec3::new(-1.0, 0.0, 0.0), b: Vec3::new(1.0, 0.0, 0.0), radius: 0.2 }),
    );
    scene.add_sdf("blob", SdfPrimitive::new(Vec3::new(0.0, 0.2, 0.0), blob, metal));
    let lens = SdfShape::Intersect(
        Box::new(SdfShape::Sphere { radius: 0.8 }),
        Box::new(SdfShape::Translate { offset: Vec3::X, shape: Box::new(SdfShape::Sphere { radius: 0.8 }) }),
    );
    let mut prim = SdfPrimitive::new(Vec3::new(1.5, 0.0, 0.0), lens, glass);
    prim.steps = Some(128);
    prim.step_multiplier = Some(0.5);
    scene.add_sdf("lens", prim);
    let bumpy = SdfShape::Displace { shape: Box::new(SdfShape::Sphere { radius: 0.5 }), amplitude: 0.05, frequency: 8.0 };
    scene.add_sdf("bumpy", SdfPrimitive::new(Vec3::new(-1.5, 0.0, 0.0), bumpy, tinted));
    scene.add_sdf(
        "custom",
        SdfPrimitive::new(Vec3::new(0.0, 0.0, -2.0), SdfShape::Custom { source: "return length(p.xz) - 0.3;".into() }, tinted),
    );
    scene.add_analytic("dome", AnalyticShape::Dome { radius: 20.0, ceiling_material: Some(floor) }, floor);
    scene.set_camera(CameraNode::Isometric { origin: Vec3::new(4.0, 4.0, 4.0), look_at: Vec3::ZERO, fov: 5.0 });

    validate_scene(&scene);
}

#[test]
fn test_emissive_lights_validate() {
    let mut scene = sphere_scene();
    let mut lamp = Material::diffuse(Vec3::ONE);
    lamp.emission_anisotropic = Vec3::splat(8.0).extend(0.0);
    let lamp = scene.add_material("lamp", lamp);
    scene.add_analytic("lamp", AnalyticShape::Sphere { center: Vec3::new(0.0, 3.0, 0.0), radius: 0.25 }, lamp);
    scene.add_sdf("lamp2", SdfPrimitive::new(Vec3::new(2.0, 2.0, 0.0), SdfShape::Sphere { radius: 0.1 }, lamp));

    let layout = SceneLayout::build(&scene, &RenderSettings::default()).unwrap();
    assert_eq!(layout.light_count(), 3);
    validate_scene(&scene);
}

#[test]
fn test_malformed_custom_shape_fails_geometry_only() {
    let mut scene = sphere_scene();
    scene.add_sdf(
        "broken",
        SdfPrimitive::new(Vec3::ZERO, SdfShape::Custom { source: "return p.x +;".into() }, 0),
    );
    let layout = SceneLayout::build(&scene, &RenderSettings::default()).unwrap();
    let composed = compose(&scene, &layout);
    assert!(validate(composed.source(ShaderGroup::Geometry)).is_err());
    assert!(validate(composed.source(ShaderGroup::Camera)).is_ok());
    assert!(validate(composed.source(ShaderGroup::Shading)).is_ok());
}

#[test]
fn test_scene_json_roundtrip_composes_identically() {
    let scene = sphere_scene();
    let json = scene.to_json().unwrap();
    let parsed = Scene::from_json(&json).unwrap();
    let settings = RenderSettings::default();
    let a = compose(&scene, &SceneLayout::build(&scene, &settings).unwrap());
    let b = compose(&parsed, &SceneLayout::build(&parsed, &settings).unwrap());
    assert_eq!(a, b);
}
