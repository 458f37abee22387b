//! Disney material parameters
//!
//! The packed layout is shared by the scene constant buffer and the
//! six material planes of the G-buffer.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Number of vec4 rows a [`Material`] occupies.
pub const MATERIAL_ROWS: usize = 6;

/// Disney principled material
///
/// Uses vec4 packing:
/// - rgb colors carry a scalar in alpha
/// - scalar params packed four at a time
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Albedo (rgb) and specular (a)
    pub albedo_specular: Vec4,
    /// Emission (rgb) and anisotropic (a)
    pub emission_anisotropic: Vec4,
    /// x=metallic, y=roughness, z=subsurface, w=specular_tint
    pub surface: Vec4,
    /// x=sheen, y=sheen_tint, z=clearcoat, w=clearcoat_gloss
    pub sheen_clearcoat: Vec4,
    /// x=transmission, yzw unused
    pub transmission: Vec4,
    /// x=ior, yzw=extinction
    pub ior_extinction: Vec4,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo_specular: Vec4::new(0.5, 0.5, 0.5, 0.5),
            emission_anisotropic: Vec4::ZERO,
            surface: Vec4::new(0.0, 0.5, 0.0, 0.0),
            sheen_clearcoat: Vec4::ZERO,
            transmission: Vec4::ZERO,
            ior_extinction: Vec4::new(1.45, 1.0, 1.0, 1.0),
        }
    }
}

impl Material {
    /// Create a diffuse material without a specular highlight
    pub fn diffuse(color: Vec3) -> Self {
        let mut m = Self::default();
        m.albedo_specular = color.extend(0.0);
        m
    }

    /// Create a plastic-like material
    pub fn plastic(color: Vec3, roughness: f32) -> Self {
        let mut m = Self::default();
        m.albedo_specular = color.extend(0.5);
        m.surface.y = roughness;
        m
    }

    /// Create a metallic material
    pub fn metal(color: Vec3, roughness: f32) -> Self {
        let mut m = Self::default();
        m.albedo_specular = color.extend(0.5);
        m.surface.x = 1.0;
        m.surface.y = roughness;
        m
    }

    /// Create a glass-like material
    pub fn glass(color: Vec3, ior: f32, roughness: f32) -> Self {
        let mut m = Self::default();
        m.albedo_specular = color.extend(0.5);
        m.surface.y = roughness;
        m.transmission.x = 1.0;
        m.ior_extinction.x = ior;
        m
    }

    /// Create an emitter
    pub fn emissive(emission: Vec3) -> Self {
        let mut m = Self::default();
        m.emission_anisotropic = emission.extend(0.0);
        m
    }

    pub fn albedo(&self) -> Vec3 {
        self.albedo_specular.truncate()
    }

    pub fn emission(&self) -> Vec3 {
        self.emission_anisotropic.truncate()
    }

    pub fn metallic(&self) -> f32 {
        self.surface.x
    }

    pub fn roughness(&self) -> f32 {
        self.surface.y
    }

    pub fn is_emissive(&self) -> bool {
        self.emission().max_element() > 0.0
    }

    /// Rows in constant-buffer order.
    pub fn rows(&self) -> [[f32; 4]; MATERIAL_ROWS] {
        [
            self.albedo_specular.to_array(),
            self.emission_anisotropic.to_array(),
            self.surface.to_array(),
            self.sheen_clearcoat.to_array(),
            self.transmission.to_array(),
            self.ior_extinction.to_array(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size() {
        assert_eq!(std::mem::size_of::<Material>(), MATERIAL_ROWS * 16);
    }

    #[test]
    fn test_defaults() {
        let m = Material::default();
        assert_eq!(m.albedo(), Vec3::splat(0.5));
        assert_eq!(m.albedo_specular.w, 0.5);
        assert_eq!(m.roughness(), 0.5);
        assert_eq!(m.ior_extinction, Vec4::new(1.45, 1.0, 1.0, 1.0));
        assert!(!m.is_emissive());
    }

    #[test]
    fn test_rows_match_bytes() {
        let m = Material::metal(Vec3::new(1.0, 0.8, 0.3), 0.2);
        let rows = m.rows();
        let flat: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&m));
        assert_eq!(flat, rows.as_flattened());
        assert_eq!(rows[2][0], 1.0);
    }

    #[test]
    fn test_serde_partial() {
        let m: Material = serde_json::from_str(r#"{"surface":[1.0,0.1,0.0,0.0]}"#).unwrap();
        assert_eq!(m.metallic(), 1.0);
        assert_eq!(m.albedo(), Vec3::splat(0.5));
    }
}
