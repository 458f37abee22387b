//! Index and constant-slot assignment for one compiled scene.

use std::collections::hash_map::DefaultHasher;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};

use disney_bsdf::MATERIAL_ROWS;

use super::node::*;
use super::Scene;
use crate::settings::RenderSettings;
use crate::util::{Error, Result};

/// Records per light in the lights buffer (after the count header).
pub const LIGHT_RECORD_STRIDE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Sun = 0,
    Sphere = 1,
}

/// Placement of one primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveLayout {
    /// Position in the scene's node list
    pub node: usize,
    /// Primitive index (declaration order among primitives)
    pub index: usize,
    /// First constant record of this primitive
    pub base: u32,
    /// Constant slots of the SDF tree's parameter rows, in pre-order
    pub param_slots: Vec<u32>,
    pub material: usize,
    pub steps: u32,
    pub step_multiplier: f32,
}

/// Stable indices and buffer contents derived from a [`Scene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLayout {
    pub constants: Vec<[f32; 4]>,
    pub lights: Vec<[f32; 4]>,
    pub primitives: Vec<PrimitiveLayout>,
    /// First constant record of each material
    pub materials: Vec<u32>,
    pub camera: u32,
    pub camera_kind: CameraNode,
    pub sky: Option<u32>,
    /// Hash of everything baked into generated source
    pub signature: u64,
}

impl SceneLayout {
    /// Walk the scene once, assigning indices and filling the buffers.
    #[tracing::instrument(skip_all, fields(nodes = scene.nodes.len()))]
    pub fn build(scene: &Scene, settings: &RenderSettings) -> Result<Self> {
        Self::validate(scene)?;

        let mut constants: Vec<[f32; 4]> = Vec::new();
        let mut push = |rows: &[[f32; 4]]| -> u32 {
            let slot = constants.len() as u32;
            constants.extend_from_slice(rows);
            slot
        };

        let camera_node = scene.camera().cloned().unwrap_or_default();
        let camera = push(&camera_node.rows());
        let sky = scene.sky().map(|s| push(&s.rows()));

        let mut materials = Vec::new();
        let mut material_params = Vec::new();
        for m in scene.materials() {
            materials.push(push(&m.params.rows()));
            material_params.push(m.params);
        }

        let mut primitives = Vec::new();
        let mut structure = String::new();
        let mut light_list: Vec<[f32; 4]> = Vec::new();

        for (node_index, node) in scene.nodes.iter().enumerate() {
            let _ = write!(structure, "{}:", node.kind.label());
            match &node.kind {
                NodeKind::Analytic(prim) => {
                    let (rows, tag): (Vec<[f32; 4]>, &str) = match &prim.shape {
                        AnalyticShape::Plane { height } => (vec![[*height, 0.0, 0.0, 0.0]], "plane"),
                        AnalyticShape::Sphere { center, radius } => (vec![center.extend(*radius).to_array()], "sphere"),
                        AnalyticShape::Dome { radius, ceiling_material } => {
                            let ceiling = ceiling_material.map_or(-1.0, |m| m as f32);
                            (vec![[*radius, ceiling, 0.0, 0.0]], "dome")
                        }
                    };
                    let base = push(&rows);
                    let _ = write!(structure, "{tag}/{}", prim.material);
                    if let AnalyticShape::Sphere { radius, .. } = &prim.shape {
                        let params = &material_params[prim.material];
                        if params.is_emissive() {
                            light_list.push([LightKind::Sphere as u32 as f32, base as f32, prim.material as f32, *radius]);
                            light_list.push(params.emission().extend(0.0).to_array());
                        }
                    }
                    primitives.push(PrimitiveLayout {
                        node: node_index,
                        index: primitives.len(),
                        base,
                        param_slots: Vec::new(),
                        material: prim.material,
                        steps: 0,
                        step_multiplier: 1.0,
                    });
                }
                NodeKind::Sdf(prim) => {
                    let base = push(&[prim.position.extend(0.0).to_array()]);
                    let param_slots = collect_slots(&prim.shape, &mut push);
                    let steps = prim.steps.unwrap_or(settings.default_steps).max(1);
                    let step_multiplier = prim
                        .step_multiplier
                        .filter(|m| *m > 0.0 && *m <= 1.0)
                        .unwrap_or(settings.default_step_multiplier);
                    prim.shape.structure(&mut structure);
                    let _ = write!(structure, "/{}/{steps}/{step_multiplier}", prim.material);

                    if let SdfShape::Sphere { radius } = &prim.shape {
                        let params = &material_params[prim.material];
                        if params.is_emissive() {
                            light_list.push([LightKind::Sphere as u32 as f32, base as f32, prim.material as f32, *radius]);
                            light_list.push(params.emission().extend(0.0).to_array());
                        }
                    }
                    primitives.push(PrimitiveLayout {
                        node: node_index,
                        index: primitives.len(),
                        base,
                        param_slots,
                        material: prim.material,
                        steps,
                        step_multiplier,
                    });
                }
                NodeKind::Material(m) => {
                    if let Some(custom) = &m.custom {
                        structure.push_str(custom);
                    }
                }
                NodeKind::Light(LightNode::Sun { direction, emission }) => {
                    let dir = direction.normalize_or_zero();
                    light_list.push([LightKind::Sun as u32 as f32, dir.x, dir.y, dir.z]);
                    light_list.push(emission.extend(0.0).to_array());
                }
                NodeKind::Camera(c) => {
                    let _ = write!(structure, "{}", if matches!(c, CameraNode::Pinhole { .. }) { "pinhole" } else { "iso" });
                }
                NodeKind::Sky(_) => {}
            }
            structure.push(';');
        }

        let light_count = light_list.len() / LIGHT_RECORD_STRIDE;
        let mut lights = Vec::with_capacity(1 + light_list.len());
        lights.push([light_count as f32, 0.0, 0.0, 0.0]);
        lights.extend(light_list);

        // Buffer sizes are fixed per compile.
        let _ = write!(structure, "rows:{MATERIAL_ROWS};lights:{light_count}");

        let mut hasher = DefaultHasher::new();
        structure.hash(&mut hasher);

        tracing::debug!(
            constants = constants.len(),
            lights = light_count,
            primitives = primitives.len(),
            "scene layout built"
        );

        Ok(Self {
            constants,
            lights,
            primitives,
            materials,
            camera,
            camera_kind: camera_node,
            sky,
            signature: hasher.finish(),
        })
    }

    /// Rebuild buffers for a scene whose structure has not changed.
    pub fn refresh(&self, scene: &Scene, settings: &RenderSettings) -> Result<Self> {
        let next = Self::build(scene, settings)?;
        if next.signature != self.signature || next.constants.len() != self.constants.len() {
            return Err(Error::LayoutMismatch);
        }
        Ok(next)
    }

    pub fn light_count(&self) -> usize {
        self.lights.first().map_or(0, |r| r[0] as usize)
    }

    /// Index of the record a uniform random number selects, as the kernels compute it.
    pub fn light_record_index(&self, rand: f32) -> Option<usize> {
        let count = self.light_count();
        if count == 0 {
            return None;
        }
        let pick = ((rand * count as f32).floor() as usize).min(count - 1);
        Some(1 + pick * LIGHT_RECORD_STRIDE)
    }

    fn validate(scene: &Scene) -> Result<()> {
        let material_count = scene.materials().count();
        let mut cameras = 0;
        let mut skies = 0;
        for node in &scene.nodes {
            let material = match &node.kind {
                NodeKind::Analytic(p) => {
                    if let AnalyticShape::Dome { ceiling_material: Some(c), .. } = &p.shape {
                        if *c >= material_count {
                            return Err(Error::scene(format!("'{}': ceiling material {c} out of range", node.name)));
                        }
                    }
                    Some(p.material)
                }
                NodeKind::Sdf(p) => Some(p.material),
                NodeKind::Camera(_) => {
                    cameras += 1;
                    None
                }
                NodeKind::Sky(_) => {
                    skies += 1;
                    None
                }
                _ => None,
            };
            if let Some(m) = material {
                if m >= material_count {
                    return Err(Error::scene(format!(
                        "'{}': material {m} out of range ({material_count} materials)",
                        node.name
                    )));
                }
            }
        }
        if cameras > 1 {
            return Err(Error::scene("more than one camera"));
        }
        if skies > 1 {
            return Err(Error::scene("more than one sky"));
        }
        Ok(())
    }
}

fn collect_slots(shape: &SdfShape, push: &mut impl FnMut(&[[f32; 4]]) -> u32) -> Vec<u32> {
    let mut slots = Vec::new();
    fn walk(shape: &SdfShape, push: &mut impl FnMut(&[[f32; 4]]) -> u32, slots: &mut Vec<u32>) {
        let rows = shape.own_rows();
        if !rows.is_empty() {
            slots.push(push(&rows));
        }
        for child in shape.children() {
            walk(child, push, slots);
        }
    }
    walk(shape, push, &mut slots);
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use disney_bsdf::Material;
    use glam::Vec3;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new();
        let grey = scene.add_material("grey", Material::default());
        let lamp = scene.add_material("lamp", Material::emissive(Vec3::splat(5.0)));
        scene.add_analytic("floor", AnalyticShape::Plane { height: 0.0 }, grey);
        scene.add_sdf("ball", SdfPrimitive::new(Vec3::Y, SdfShape::Sphere { radius: 0.5 }, grey));
        scene.add_sdf("lamp", SdfPrimitive::new(Vec3::new(0.0, 3.0, 0.0), SdfShape::Sphere { radius: 0.25 }, lamp));
        scene.add_sun(Vec3::new(0.0, 2.0, 0.0), Vec3::splat(2.0));
        scene.set_camera(CameraNode::pinhole(Vec3::new(0.0, 1.0, 3.0), Vec3::ZERO, 60.0));
        scene
    }

    #[test]
    fn test_light_packing() {
        let layout = SceneLayout::build(&sample_scene(), &RenderSettings::default()).unwrap();
        assert_eq!(layout.light_count(), 2);
        assert_eq!(layout.lights.len(), 1 + 2 * LIGHT_RECORD_STRIDE);

        // Sphere light: {type, position slot, material, radius}, {emission}
        let lamp_prim = &layout.primitives[2];
        assert_eq!(layout.lights[1], [1.0, lamp_prim.base as f32, 1.0, 0.25]);
        assert_eq!(layout.lights[2], [5.0, 5.0, 5.0, 0.0]);
        assert_eq!(layout.constants[lamp_prim.base as usize][1], 3.0);

        // Sun: {0, normalized direction}, {emission}
        assert_eq!(layout.lights[3], [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(layout.lights[4], [2.0, 2.0, 2.0, 0.0]);
    }

    #[test]
    fn test_light_record_index() {
        let layout = SceneLayout::build(&sample_scene(), &RenderSettings::default()).unwrap();
        assert_eq!(layout.light_record_index(0.0), Some(1));
        assert_eq!(layout.light_record_index(0.49), Some(1));
        assert_eq!(layout.light_record_index(0.5), Some(3));
        assert_eq!(layout.light_record_index(0.999_999), Some(3));

        let empty = SceneLayout::build(&Scene::new(), &RenderSettings::default()).unwrap();
        assert_eq!(empty.light_count(), 0);
        assert_eq!(empty.light_record_index(0.3), None);
    }

    #[test]
    fn test_slots_are_stable() {
        let settings = RenderSettings::default();
        let a = SceneLayout::build(&sample_scene(), &settings).unwrap();
        let b = SceneLayout::build(&sample_scene(), &settings).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.camera, 0);
        assert_eq!(a.materials, vec![3, 3 + MATERIAL_ROWS as u32]);
        assert_eq!(a.primitives[1].param_slots, vec![a.primitives[1].base + 1]);
        assert_eq!(a.primitives[1].steps, 70);
    }

    #[test]
    fn test_refresh_accepts_parameter_changes() {
        let settings = RenderSettings::default();
        let mut scene = sample_scene();
        let layout = SceneLayout::build(&scene, &settings).unwrap();

        scene.set_camera(CameraNode::pinhole(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, 45.0));
        let refreshed = layout.refresh(&scene, &settings).unwrap();
        assert_eq!(refreshed.constants[0], [1.0, 2.0, 3.0, 45.0]);

        scene.add_sdf("extra", SdfPrimitive::new(Vec3::ZERO, SdfShape::Sphere { radius: 1.0 }, 0));
        assert!(matches!(layout.refresh(&scene, &settings), Err(Error::LayoutMismatch)));
    }

    #[test]
    fn test_validation() {
        let mut scene = Scene::new();
        scene.add_analytic("floor", AnalyticShape::Plane { height: 0.0 }, 3);
        assert!(matches!(SceneLayout::build(&scene, &RenderSettings::default()), Err(Error::Scene(_))));

        let mut scene = Scene::new();
        scene.push("a", NodeKind::Camera(CameraNode::default()));
        scene.push("b", NodeKind::Camera(CameraNode::default()));
        assert!(SceneLayout::build(&scene, &RenderSettings::default()).is_err());
    }
}
