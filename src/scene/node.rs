//! Scene node types supplied by the scene builder.
//!
//! Every node is a tagged variant; one codegen routine turns the whole list
//! into generated functions plus static dispatch entries.

use disney_bsdf::Material;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A named scene node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Analytic(AnalyticPrimitive),
    Sdf(SdfPrimitive),
    Material(MaterialNode),
    Light(LightNode),
    Camera(CameraNode),
    Sky(SkyNode),
}

impl NodeKind {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Analytic(_) | Self::Sdf(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Analytic(_) => "analytic",
            Self::Sdf(_) => "sdf",
            Self::Material(_) => "material",
            Self::Light(_) => "light",
            Self::Camera(_) => "camera",
            Self::Sky(_) => "sky",
        }
    }
}

/// Closed-form primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticPrimitive {
    pub shape: AnalyticShape,
    #[serde(default)]
    pub material: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticShape {
    /// Infinite horizontal plane at `height`
    Plane { height: f32 },
    Sphere { center: Vec3, radius: f32 },
    /// Sphere seen from inside with a ground plane at y = 0
    Dome {
        radius: f32,
        #[serde(default)]
        ceiling_material: Option<usize>,
    },
}

/// Raymarched primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdfPrimitive {
    #[serde(default)]
    pub position: Vec3,
    pub shape: SdfShape,
    #[serde(default)]
    pub material: usize,
    /// Raymarch step budget; settings default when unset
    #[serde(default)]
    pub steps: Option<u32>,
    /// Fraction of the distance estimate advanced per step
    #[serde(default)]
    pub step_multiplier: Option<f32>,
}

impl SdfPrimitive {
    pub fn new(position: Vec3, shape: SdfShape, material: usize) -> Self {
        Self { position, shape, material, steps: None, step_multiplier: None }
    }
}

/// Distance expression tree evaluated in the primitive's local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdfShape {
    Sphere { radius: f32 },
    Cuboid {
        half_extents: Vec3,
        #[serde(default)]
        rounding: f32,
    },
    Torus { major: f32, minor: f32 },
    Capsule { a: Vec3, b: Vec3, radius: f32 },
    /// WGSL function body over `p: vec3<f32>` returning `f32`
    Custom { source: String },
    Translate { offset: Vec3, shape: Box<SdfShape> },
    Union(Box<SdfShape>, Box<SdfShape>),
    Intersect(Box<SdfShape>, Box<SdfShape>),
    Subtract(Box<SdfShape>, Box<SdfShape>),
    SmoothUnion { a: Box<SdfShape>, b: Box<SdfShape>, k: f32 },
    Displace { shape: Box<SdfShape>, amplitude: f32, frequency: f32 },
}

impl SdfShape {
    /// Constant records this node contributes, excluding children.
    pub fn own_rows(&self) -> Vec<[f32; 4]> {
        match self {
            Self::Sphere { radius } => vec![[*radius, 0.0, 0.0, 0.0]],
            Self::Cuboid { half_extents, rounding } => vec![half_extents.extend(*rounding).to_array()],
            Self::Torus { major, minor } => vec![[*major, *minor, 0.0, 0.0]],
            Self::Capsule { a, b, radius } => vec![a.extend(*radius).to_array(), b.extend(0.0).to_array()],
            Self::Translate { offset, .. } => vec![offset.extend(0.0).to_array()],
            Self::SmoothUnion { k, .. } => vec![[*k, 0.0, 0.0, 0.0]],
            Self::Displace { amplitude, frequency, .. } => vec![[*amplitude, *frequency, 0.0, 0.0]],
            Self::Custom { .. } | Self::Union(..) | Self::Intersect(..) | Self::Subtract(..) => Vec::new(),
        }
    }

    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&SdfShape> {
        match self {
            Self::Translate { shape, .. } | Self::Displace { shape, .. } => vec![shape.as_ref()],
            Self::Union(a, b) | Self::Intersect(a, b) | Self::Subtract(a, b) => vec![a.as_ref(), b.as_ref()],
            Self::SmoothUnion { a, b, .. } => vec![a.as_ref(), b.as_ref()],
            _ => Vec::new(),
        }
    }

    /// Pre-order traversal: a node's own rows precede its children's.
    pub fn collect_rows(&self, out: &mut Vec<[f32; 4]>) {
        out.extend(self.own_rows());
        for child in self.children() {
            child.collect_rows(out);
        }
    }

    /// Structural description that ignores parameter values.
    pub fn structure(&self, out: &mut String) {
        match self {
            Self::Custom { source } => {
                out.push_str("custom{");
                out.push_str(source);
                out.push('}');
            }
            other => {
                out.push_str(other.tag());
                out.push('(');
                for child in other.children() {
                    child.structure(out);
                    out.push(',');
                }
                out.push(')');
            }
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Cuboid { .. } => "cuboid",
            Self::Torus { .. } => "torus",
            Self::Capsule { .. } => "capsule",
            Self::Custom { .. } => "custom",
            Self::Translate { .. } => "translate",
            Self::Union(..) => "union",
            Self::Intersect(..) => "intersect",
            Self::Subtract(..) => "subtract",
            Self::SmoothUnion { .. } => "smooth_union",
            Self::Displace { .. } => "displace",
        }
    }
}

/// Material node: Disney parameters plus an optional WGSL snippet run after
/// they are loaded. The snippet sees `p`, `n` and may modify `m`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialNode {
    #[serde(default)]
    pub params: Material,
    #[serde(default)]
    pub custom: Option<String>,
}

impl MaterialNode {
    pub fn new(params: Material) -> Self {
        Self { params, custom: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightNode {
    /// Directional light with a small angular extent
    Sun { direction: Vec3, emission: Vec3 },
}

fn default_origin() -> Vec3 {
    Vec3::new(0.0, 0.0, -5.0)
}

fn default_fov() -> f32 {
    80.0
}

fn default_focal_distance() -> f32 {
    0.1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraNode {
    /// Perspective camera with thin-lens depth of field; `fov` in degrees
    Pinhole {
        #[serde(default = "default_origin")]
        origin: Vec3,
        #[serde(default)]
        look_at: Vec3,
        #[serde(default = "default_fov")]
        fov: f32,
        #[serde(default = "default_focal_distance")]
        focal_distance: f32,
        #[serde(default)]
        aperture: f32,
    },
    /// Parallel projection; `fov` acts as zoom
    Isometric {
        #[serde(default = "default_origin")]
        origin: Vec3,
        #[serde(default)]
        look_at: Vec3,
        #[serde(default = "default_fov")]
        fov: f32,
    },
}

impl Default for CameraNode {
    fn default() -> Self {
        Self::Pinhole {
            origin: default_origin(),
            look_at: Vec3::ZERO,
            fov: default_fov(),
            focal_distance: default_focal_distance(),
            aperture: 0.0,
        }
    }
}

impl CameraNode {
    pub fn pinhole(origin: Vec3, look_at: Vec3, fov: f32) -> Self {
        Self::Pinhole { origin, look_at, fov, focal_distance: default_focal_distance(), aperture: 0.0 }
    }

    /// Three records: (origin, fov), (look_at, aperture), (focal_distance).
    pub fn rows(&self) -> [[f32; 4]; 3] {
        match self {
            Self::Pinhole { origin, look_at, fov, focal_distance, aperture } => [
                origin.extend(*fov).to_array(),
                look_at.extend(*aperture).to_array(),
                [*focal_distance, 0.0, 0.0, 0.0],
            ],
            Self::Isometric { origin, look_at, fov } => [
                origin.extend(*fov).to_array(),
                look_at.extend(0.0).to_array(),
                [0.0; 4],
            ],
        }
    }
}

/// Procedural sky used as the background on ray miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyNode {
    pub sky_color: Vec3,
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
    pub horizon_color: Vec3,
}

impl Default for SkyNode {
    fn default() -> Self {
        Self {
            sky_color: Vec3::new(0.38, 0.6, 1.0),
            sun_direction: Vec3::new(0.243, 0.075, 0.512),
            sun_color: Vec3::splat(0.966),
            horizon_color: Vec3::new(0.852, 0.591, 0.367),
        }
    }
}

impl SkyNode {
    pub fn rows(&self) -> [[f32; 4]; 4] {
        [
            self.sky_color.extend(0.0).to_array(),
            self.sun_direction.extend(0.0).to_array(),
            self.sun_color.extend(0.0).to_array(),
            self.horizon_color.extend(0.0).to_array(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_preorder() {
        let shape = SdfShape::SmoothUnion {
            a: Box::new(SdfShape::Sphere { radius: 1.0 }),
            b: Box::new(SdfShape::Translate {
                offset: Vec3::X,
                shape: Box::new(SdfShape::Torus { major: 1.0, minor: 0.25 }),
            }),
            k: 0.3,
        };
        let mut rows = Vec::new();
        shape.collect_rows(&mut rows);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0][0], 0.3);
        assert_eq!(rows[1][0], 1.0);
        assert_eq!(rows[2], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(rows[3], [1.0, 0.25, 0.0, 0.0]);
    }

    #[test]
    fn test_structure_ignores_values() {
        let a = SdfShape::Sphere { radius: 1.0 };
        let b = SdfShape::Sphere { radius: 2.0 };
        let (mut sa, mut sb) = (String::new(), String::new());
        a.structure(&mut sa);
        b.structure(&mut sb);
        assert_eq!(sa, sb);

        let mut sc = String::new();
        SdfShape::Custom { source: "return length(p) - 1.0;".into() }.structure(&mut sc);
        assert_ne!(sa, sc);
    }

    #[test]
    fn test_node_json() {
        let json = r#"{
            "name": "ball",
            "kind": "sdf",
            "position": [0.0, 1.0, 0.0],
            "shape": { "sphere": { "radius": 0.5 } },
            "material": 1
        }"#;
        let node: SceneNode = serde_json::from_str(json).unwrap();
        let NodeKind::Sdf(sdf) = &node.kind else { panic!("expected sdf node") };
        assert_eq!(sdf.material, 1);
        assert_eq!(sdf.steps, None);
        assert!(node.kind.is_primitive());
    }

    #[test]
    fn test_camera_defaults() {
        let cam: CameraNode = serde_json::from_str(r#"{ "pinhole": {} }"#).unwrap();
        assert_eq!(cam, CameraNode::default());
        assert_eq!(cam.rows()[0][3], 80.0);
    }
}
