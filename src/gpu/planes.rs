//! G-buffer plane indices.
//!
//! Per-pixel records are `vec4<f32>` planes grouped into banks of
//! [`PLANES_PER_BANK`]. Each bank is its own storage buffer addressed
//! `slot * pixel_count + pixel`, so a single binding stays under
//! `max_storage_buffer_binding_size` up to 1920x1080 with default limits.
//! The WGSL `PLANE_*` constants are generated from [`Plane::ALL`] so both
//! sides agree on the numbering.

/// Planes stored together in one storage buffer.
pub const PLANES_PER_BANK: u32 = 4;

/// Storage buffers the planes are split across.
pub const BANK_COUNT: usize = Plane::COUNT.div_ceil(PLANES_PER_BANK as usize);

/// One vec4 plane of the G-buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Plane {
    /// xyz = ray origin
    RayOrigin = 0,
    /// xyz = normalized ray direction
    RayDir,
    /// (distance, material, primitive, 0)
    Hit,
    /// xyz = world-space normal at the hit
    Normal,
    ShadowOrigin,
    ShadowDir,
    /// (distance, material, primitive, 0) of the shadow ray
    ShadowHit,
    ShadowNormal,
    /// rgb = albedo, a = specular
    MatAlbedo,
    /// rgb = emission, a = anisotropic
    MatEmission,
    /// metallic, roughness, subsurface, specular tint
    MatSurface,
    /// sheen, sheen tint, clearcoat, clearcoat gloss
    MatSheen,
    /// xyz = sampled light direction, w = transmission
    MatTransmission,
    /// x = ior, yzw = extinction
    MatMedium,
    /// x = index of the sampled light record, -1 when none
    LightSample,
    /// rgb = next-event estimate for this bounce
    Direct,
    /// rgb = radiance gathered so far this sample
    Radiance,
    /// rgb = path throughput, w = pdf of the last BSDF sample (-1 after camera or specular)
    Throughput,
    /// rgb = absorption coefficient, w = 1 inside a medium
    Absorption,
    /// (distance, material, primitive, 0) of the camera ray
    FirstHit,
}

impl Plane {
    pub const COUNT: usize = 20;

    pub const ALL: [Plane; Self::COUNT] = [
        Plane::RayOrigin,
        Plane::RayDir,
        Plane::Hit,
        Plane::Normal,
        Plane::ShadowOrigin,
        Plane::ShadowDir,
        Plane::ShadowHit,
        Plane::ShadowNormal,
        Plane::MatAlbedo,
        Plane::MatEmission,
        Plane::MatSurface,
        Plane::MatSheen,
        Plane::MatTransmission,
        Plane::MatMedium,
        Plane::LightSample,
        Plane::Direct,
        Plane::Radiance,
        Plane::Throughput,
        Plane::Absorption,
        Plane::FirstHit,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    /// Storage buffer holding this plane.
    pub fn bank(self) -> usize {
        (self.index() / PLANES_PER_BANK) as usize
    }

    /// Position of this plane inside its bank.
    pub fn slot(self) -> u32 {
        self.index() % PLANES_PER_BANK
    }

    /// Name of the matching WGSL constant.
    pub fn wgsl_name(self) -> &'static str {
        match self {
            Plane::RayOrigin => "PLANE_RAY_ORIGIN",
            Plane::RayDir => "PLANE_RAY_DIR",
            Plane::Hit => "PLANE_HIT",
            Plane::Normal => "PLANE_NORMAL",
            Plane::ShadowOrigin => "PLANE_SHADOW_ORIGIN",
            Plane::ShadowDir => "PLANE_SHADOW_DIR",
            Plane::ShadowHit => "PLANE_SHADOW_HIT",
            Plane::ShadowNormal => "PLANE_SHADOW_NORMAL",
            Plane::MatAlbedo => "PLANE_MAT_ALBEDO",
            Plane::MatEmission => "PLANE_MAT_EMISSION",
            Plane::MatSurface => "PLANE_MAT_SURFACE",
            Plane::MatSheen => "PLANE_MAT_SHEEN",
            Plane::MatTransmission => "PLANE_MAT_TRANSMISSION",
            Plane::MatMedium => "PLANE_MAT_MEDIUM",
            Plane::LightSample => "PLANE_LIGHT_SAMPLE",
            Plane::Direct => "PLANE_DIRECT",
            Plane::Radiance => "PLANE_RADIANCE",
            Plane::Throughput => "PLANE_THROUGHPUT",
            Plane::Absorption => "PLANE_ABSORPTION",
            Plane::FirstHit => "PLANE_FIRST_HIT",
        }
    }
}

/// Plane triple an intersection kernel reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayPlanes {
    pub origin: Plane,
    pub direction: Plane,
    pub hit: Plane,
    pub normal: Plane,
}

impl RayPlanes {
    pub const PRIMARY: Self = Self {
        origin: Plane::RayOrigin,
        direction: Plane::RayDir,
        hit: Plane::Hit,
        normal: Plane::Normal,
    };

    pub const SHADOW: Self = Self {
        origin: Plane::ShadowOrigin,
        direction: Plane::ShadowDir,
        hit: Plane::ShadowHit,
        normal: Plane::ShadowNormal,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_in_order() {
        for (i, plane) in Plane::ALL.iter().enumerate() {
            assert_eq!(plane.index() as usize, i);
        }
    }

    #[test]
    fn test_banks_cover_planes() {
        let mut per_bank = [0u32; BANK_COUNT];
        for plane in Plane::ALL {
            assert!(plane.bank() < BANK_COUNT);
            assert_eq!(plane.bank() as u32 * PLANES_PER_BANK + plane.slot(), plane.index());
            per_bank[plane.bank()] += 1;
        }
        assert!(per_bank.iter().all(|&n| n > 0 && n <= PLANES_PER_BANK));
    }

    #[test]
    fn test_ray_sets_disjoint() {
        let p = RayPlanes::PRIMARY;
        let s = RayPlanes::SHADOW;
        for a in [p.origin, p.direction, p.hit, p.normal] {
            for b in [s.origin, s.direction, s.hit, s.normal] {
                assert_ne!(a, b);
            }
        }
    }
}
