//! Disney principled BSDF for wgpu compute kernels
//!
//! WGSL sources for the shared shading library used by the path tracer
//! kernels, the packed [`Material`] parameter block, and a small CPU
//! reference of the sampling math used to validate estimators.
//!
//! ## References
//! - Burley, "Physically Based Shading at Disney" (2012)
//! - Burley, "Extending the Disney BRDF to a BSDF with Integrated Subsurface Scattering" (2015)
//!
//! ## Usage
//!
//! ```ignore
//! use disney_bsdf::{shader_lib, Material};
//!
//! let mut source = String::new();
//! for part in shader_lib::ALL {
//!     source.push_str(part);
//! }
//! let gold = Material::metal(glam::Vec3::new(1.0, 0.8, 0.3), 0.3);
//! ```

mod params;
pub mod reference;

pub use params::{Material, MATERIAL_ROWS};

/// Shader library modules, concatenated in dependency order by composers.
pub mod shader_lib {
    /// Constants, basis construction, face-forwarding.
    pub const COMMON: &str = include_str!("shaders/common.wgsl");
    /// PCG hash random stream.
    pub const RANDOM: &str = include_str!("shaders/random.wgsl");
    /// Hemisphere, sphere, disk and cap sampling plus the power heuristic.
    pub const SAMPLING: &str = include_str!("shaders/sampling.wgsl");
    /// Material struct and the Disney BSDF.
    pub const DISNEY: &str = include_str!("shaders/disney.wgsl");

    /// All modules in the order they must be concatenated.
    pub const ALL: [&str; 4] = [COMMON, RANDOM, SAMPLING, DISNEY];
}
