use crate::app::{Camera, Vec3};

/// Top-down scale: one world unit along x/z maps to this many pixels.
pub const PIXELS_PER_WORLD: f32 = 16.0;

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Projects the x/z plane onto the screen with the camera at the centre and
/// +z pointing up.
pub fn world_to_screen_px(
    world: Vec3,
    camera: &Camera,
    viewport: Viewport,
    pixels_per_world: f32,
) -> (i32, i32) {
    let x = (world.x - camera.position.x) * pixels_per_world + viewport.width as f32 * 0.5;
    let y = viewport.height as f32 * 0.5 - (world.z - camera.position.z) * pixels_per_world;
    (x.round() as i32, y.round() as i32)
}

pub fn screen_to_world_px(
    screen_px: (f32, f32),
    camera: &Camera,
    viewport: Viewport,
    pixels_per_world: f32,
) -> Vec3 {
    let scale = if pixels_per_world.abs() > f32::EPSILON {
        pixels_per_world
    } else {
        PIXELS_PER_WORLD
    };
    Vec3 {
        x: (screen_px.0 - viewport.width as f32 * 0.5) / scale + camera.position.x,
        y: 0.0,
        z: (viewport.height as f32 * 0.5 - screen_px.1) / scale + camera.position.z,
    }
}
