//! Scene description consumed by the tracer.
//!
//! The external scene builder hands over an ordered list of [`SceneNode`]s.
//! [`SceneLayout`] assigns stable indices and constant slots to them; the
//! shader composer and the buffer uploads both read that layout.

mod layout;
mod node;
mod sky;

pub use layout::{LightKind, PrimitiveLayout, SceneLayout, LIGHT_RECORD_STRIDE};
pub use node::*;
pub use sky::background;

use std::path::Path;

use disney_bsdf::Material;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::util::{Error, Result};

/// Ordered list of scene nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON scene description.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a JSON scene description from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Append a node, returning its position in the node list.
    pub fn push(&mut self, name: impl Into<String>, kind: NodeKind) -> usize {
        self.nodes.push(SceneNode { name: name.into(), kind });
        self.nodes.len() - 1
    }

    /// Add a material, returning its material index.
    pub fn add_material(&mut self, name: impl Into<String>, params: Material) -> usize {
        let index = self.materials().count();
        self.push(name, NodeKind::Material(MaterialNode::new(params)));
        index
    }

    /// Add a material with a custom WGSL snippet, returning its material index.
    pub fn add_custom_material(&mut self, name: impl Into<String>, params: Material, snippet: impl Into<String>) -> usize {
        let index = self.materials().count();
        self.push(
            name,
            NodeKind::Material(MaterialNode { params, custom: Some(snippet.into()) }),
        );
        index
    }

    /// Add a raymarched primitive, returning its primitive index.
    pub fn add_sdf(&mut self, name: impl Into<String>, prim: SdfPrimitive) -> usize {
        let index = self.primitives().count();
        self.push(name, NodeKind::Sdf(prim));
        index
    }

    /// Add an analytical primitive, returning its primitive index.
    pub fn add_analytic(&mut self, name: impl Into<String>, shape: AnalyticShape, material: usize) -> usize {
        let index = self.primitives().count();
        self.push(name, NodeKind::Analytic(AnalyticPrimitive { shape, material }));
        index
    }

    pub fn add_sun(&mut self, direction: Vec3, emission: Vec3) {
        self.push("sun", NodeKind::Light(LightNode::Sun { direction, emission }));
    }

    /// Replace the camera node, or add one.
    pub fn set_camera(&mut self, camera: CameraNode) {
        match self.nodes.iter_mut().find(|n| matches!(n.kind, NodeKind::Camera(_))) {
            Some(node) => node.kind = NodeKind::Camera(camera),
            None => {
                self.push("camera", NodeKind::Camera(camera));
            }
        }
    }

    /// Replace the sky node, or add one.
    pub fn set_sky(&mut self, sky: SkyNode) {
        match self.nodes.iter_mut().find(|n| matches!(n.kind, NodeKind::Sky(_))) {
            Some(node) => node.kind = NodeKind::Sky(sky),
            None => {
                self.push("sky", NodeKind::Sky(sky));
            }
        }
    }

    /// Primitive nodes in declaration order.
    pub fn primitives(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter().filter(|n| n.kind.is_primitive())
    }

    /// Material nodes in declaration order.
    pub fn materials(&self) -> impl Iterator<Item = &MaterialNode> {
        self.nodes.iter().filter_map(|n| match &n.kind {
            NodeKind::Material(m) => Some(m),
            _ => None,
        })
    }

    pub fn camera(&self) -> Option<&CameraNode> {
        self.nodes.iter().find_map(|n| match &n.kind {
            NodeKind::Camera(c) => Some(c),
            _ => None,
        })
    }

    pub fn sky(&self) -> Option<&SkyNode> {
        self.nodes.iter().find_map(|n| match &n.kind {
            NodeKind::Sky(s) => Some(s),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_indices() {
        let mut scene = Scene::new();
        let red = scene.add_material("red", Material::diffuse(Vec3::X));
        let blue = scene.add_material("blue", Material::diffuse(Vec3::Z));
        let floor = scene.add_analytic("floor", AnalyticShape::Plane { height: 0.0 }, red);
        let ball = scene.add_sdf("ball", SdfPrimitive::new(Vec3::Y, SdfShape::Sphere { radius: 1.0 }, blue));
        assert_eq!((red, blue), (0, 1));
        assert_eq!((floor, ball), (0, 1));
        assert_eq!(scene.primitives().count(), 2);
    }

    #[test]
    fn test_set_camera_replaces() {
        let mut scene = Scene::new();
        scene.set_camera(CameraNode::default());
        scene.set_camera(CameraNode::pinhole(Vec3::new(0.0, 1.0, 3.0), Vec3::ZERO, 60.0));
        assert_eq!(scene.nodes.len(), 1);
        assert!(matches!(scene.camera(), Some(CameraNode::Pinhole { fov, .. }) if *fov == 60.0));
    }

    #[test]
    fn test_json_roundtrip_file() {
        let mut scene = Scene::new();
        let m = scene.add_material("m", Material::default());
        scene.add_sdf("s", SdfPrimitive::new(Vec3::ZERO, SdfShape::Sphere { radius: 1.0 }, m));
        scene.set_sky(SkyNode::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, scene.to_json().unwrap()).unwrap();
        assert_eq!(Scene::load(&path).unwrap(), scene);
    }
}
