//! Assembles the shared library and generated fragments into one WGSL
//! program per pass group.

use smallvec::SmallVec;

use super::{codegen, header, kernels};
use crate::scene::{Scene, SceneLayout};

/// A compilable unit; one shader module per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderGroup {
    /// Camera rays and accumulation
    Camera,
    /// One intersection kernel per primitive
    Geometry,
    /// Material resolve, direct light and path trace
    Shading,
}

impl ShaderGroup {
    pub const ALL: [ShaderGroup; 3] = [ShaderGroup::Camera, ShaderGroup::Geometry, ShaderGroup::Shading];

    pub fn name(self) -> &'static str {
        match self {
            ShaderGroup::Camera => "camera",
            ShaderGroup::Geometry => "geometry",
            ShaderGroup::Shading => "shading",
        }
    }
}

/// Pass identity; compiled pipelines are cached under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KernelId {
    Camera,
    Accumulate,
    Intersect(u32),
    Material,
    Direct,
    Trace,
}

impl KernelId {
    pub fn group(self) -> ShaderGroup {
        match self {
            KernelId::Camera | KernelId::Accumulate => ShaderGroup::Camera,
            KernelId::Intersect(_) => ShaderGroup::Geometry,
            KernelId::Material | KernelId::Direct | KernelId::Trace => ShaderGroup::Shading,
        }
    }

    pub fn entry_point(self) -> String {
        match self {
            KernelId::Camera => "camera_main".into(),
            KernelId::Accumulate => "accumulate_main".into(),
            KernelId::Intersect(i) => format!("intersect_{i}"),
            KernelId::Material => "material_main".into(),
            KernelId::Direct => "direct_main".into(),
            KernelId::Trace => "trace_main".into(),
        }
    }
}

impl std::fmt::Display for KernelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.entry_point())
    }
}

pub type KernelList = SmallVec<[KernelId; 8]>;

/// Source text per group plus the kernels each one exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedShaders {
    pub camera: String,
    pub geometry: String,
    pub shading: String,
    pub kernels: KernelList,
}

impl ComposedShaders {
    pub fn source(&self, group: ShaderGroup) -> &str {
        match group {
            ShaderGroup::Camera => &self.camera,
            ShaderGroup::Geometry => &self.geometry,
            ShaderGroup::Shading => &self.shading,
        }
    }

    pub fn kernels_in(&self, group: ShaderGroup) -> impl Iterator<Item = KernelId> + '_ {
        self.kernels.iter().copied().filter(move |k| k.group() == group)
    }
}

fn push_lib(out: &mut String, parts: &[&str]) {
    for part in parts {
        out.push_str(part);
        out.push('\n');
    }
}

/// Compose all groups for a scene. Output depends only on the node list and
/// its layout, so equal scenes produce byte-identical source.
#[tracing::instrument(skip_all, fields(primitives = layout.primitives.len()))]
pub fn compose(scene: &Scene, layout: &SceneLayout) -> ComposedShaders {
    use disney_bsdf::shader_lib;

    let planes = header::gbuffer_access();

    let mut camera = String::new();
    push_lib(&mut camera, &[shader_lib::COMMON, shader_lib::RANDOM, shader_lib::SAMPLING]);
    push_lib(&mut camera, &[header::BINDINGS, planes.as_str()]);
    camera.push_str(&codegen::camera(layout));
    push_lib(&mut camera, &[kernels::CAMERA_PASS, kernels::ACCUMULATE_PASS]);

    let mut geometry = String::new();
    push_lib(&mut geometry, &[shader_lib::COMMON, header::BINDINGS, planes.as_str(), header::RAY_SET, header::SDF_LIB]);
    for pl in &layout.primitives {
        geometry.push_str(&codegen::primitive(scene, pl));
        geometry.push_str(&codegen::intersect_entry(pl.index));
    }

    let mut shading = String::new();
    push_lib(&mut shading, &shader_lib::ALL);
    push_lib(&mut shading, &[header::BINDINGS, planes.as_str(), header::MATERIAL_IO, kernels::LIGHT_SAMPLING]);
    shading.push_str(&codegen::background(layout));
    shading.push_str(&codegen::materials(scene, layout));
    push_lib(&mut shading, &[kernels::MATERIAL_PASS, kernels::DIRECT_PASS, kernels::TRACE_PASS]);

    let mut kernels = KernelList::new();
    kernels.push(KernelId::Camera);
    kernels.push(KernelId::Accumulate);
    kernels.extend(layout.primitives.iter().map(|p| KernelId::Intersect(p.index as u32)));
    kernels.extend([KernelId::Material, KernelId::Direct, KernelId::Trace]);

    tracing::debug!(
        camera = camera.len(),
        geometry = geometry.len(),
        shading = shading.len(),
        "composed shader groups"
    );

    ComposedShaders { camera, geometry, shading, kernels }
}
