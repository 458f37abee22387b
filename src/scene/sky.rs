//! Host-side evaluation of the background, matching the generated `background()`.

use glam::Vec3;

use super::node::SkyNode;

impl SkyNode {
    /// Sky radiance for a normalized direction.
    pub fn eval(&self, rd: Vec3) -> Vec3 {
        let sun_dir = self.sun_direction.normalize_or_zero();
        let sun = rd.dot(sun_dir).max(0.0);
        let hor = (1.0 - rd.y.max(0.0)).powf(3.0);
        let mut col = self.sky_color.lerp(self.sun_color, sun * 0.5);
        col = col.lerp(self.horizon_color, hor);
        let sun5 = sun.powf(5.0);
        col += 0.25 * Vec3::new(1.0, 0.7, 0.4) * sun5;
        col += 0.25 * Vec3::new(1.0, 0.8, 0.6) * sun5;
        col += 0.15 * Vec3::new(1.0, 0.9, 0.7) * sun.powf(512.0).max(0.25);
        col
    }
}

/// Background for a direction: the sky when present, otherwise a flat color.
pub fn background(sky: Option<&SkyNode>, flat: [f32; 4], rd: Vec3) -> Vec3 {
    match sky {
        Some(sky) => sky.eval(rd),
        None => Vec3::new(flat[0], flat[1], flat[2]),
    }
}
