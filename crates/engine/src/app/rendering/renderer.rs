use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{Entity, EntityId, EntityKind, SceneWorld};

use super::{world_to_screen_px, Viewport, MARKER_HALF_SIZE_PX, PIXELS_PER_WORLD};

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const WALL_COLOR: [u8; 4] = [96, 100, 112, 255];
const FLOOR_COLOR: [u8; 4] = [34, 38, 46, 255];
const DOOR_COLOR: [u8; 4] = [150, 104, 60, 255];
const DOOR_OPEN_COLOR: [u8; 4] = [84, 62, 40, 255];
const PROP_COLOR: [u8; 4] = [220, 220, 240, 255];
const PLAYER_COLOR: [u8; 4] = [80, 220, 255, 255];
const AGENT_COLOR: [u8; 4] = [255, 120, 120, 255];
const MARKER_COLOR: [u8; 4] = [140, 255, 140, 255];
const HIGHLIGHT_COLOR: [u8; 4] = [255, 210, 70, 255];
const HIGHLIGHT_HALF_SIZE_PX: i32 = 9;

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(
        &mut self,
        world: &SceneWorld,
        highlighted: Option<EntityId>,
        overlay_opacity: f32,
    ) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let viewport = self.viewport;
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        for entity in draw_order(world) {
            let (cx, cy) =
                world_to_screen_px(entity.transform.position, world.camera(), viewport, PIXELS_PER_WORLD);
            draw_square(
                frame,
                viewport.width,
                viewport.height,
                cx,
                cy,
                half_size_for_kind(entity.desc.kind),
                color_for_entity(entity),
            );
        }

        if let Some(entity) = highlighted.and_then(|id| world.find_entity(id)) {
            let (cx, cy) =
                world_to_screen_px(entity.transform.position, world.camera(), viewport, PIXELS_PER_WORLD);
            draw_square_outline(
                frame,
                viewport.width,
                cx,
                cy,
                HIGHLIGHT_HALF_SIZE_PX,
                HIGHLIGHT_COLOR,
            );
        }

        if overlay_opacity > 0.0 {
            for chunk in frame.chunks_exact_mut(4) {
                let color = [chunk[0], chunk[1], chunk[2], chunk[3]];
                chunk.copy_from_slice(&blend_toward_black(color, overlay_opacity));
            }
        }

        self.pixels.render()
    }
}

fn draw_order(world: &SceneWorld) -> impl Iterator<Item = &Entity> {
    let mut visible: Vec<&Entity> = world
        .entities()
        .iter()
        .filter(|entity| entity.visible)
        .collect();
    visible.sort_by_key(|entity| layer_for_kind(entity.desc.kind));
    visible.into_iter()
}

fn layer_for_kind(kind: EntityKind) -> u8 {
    match kind {
        EntityKind::Floor => 0,
        EntityKind::Wall | EntityKind::Door => 1,
        EntityKind::Prop | EntityKind::Marker => 2,
        EntityKind::Agent | EntityKind::Player => 3,
    }
}

fn half_size_for_kind(kind: EntityKind) -> i32 {
    match kind {
        EntityKind::Wall | EntityKind::Floor => 14,
        EntityKind::Door => 12,
        _ => MARKER_HALF_SIZE_PX,
    }
}

fn color_for_entity(entity: &Entity) -> [u8; 4] {
    match entity.desc.kind {
        EntityKind::Wall => WALL_COLOR,
        EntityKind::Floor => FLOOR_COLOR,
        EntityKind::Door if entity.collider_enabled => DOOR_COLOR,
        EntityKind::Door => DOOR_OPEN_COLOR,
        EntityKind::Prop => PROP_COLOR,
        EntityKind::Player => PLAYER_COLOR,
        EntityKind::Agent => AGENT_COLOR,
        EntityKind::Marker => MARKER_COLOR,
    }
}

fn blend_toward_black(color: [u8; 4], opacity: f32) -> [u8; 4] {
    let keep = 1.0 - opacity.clamp(0.0, 1.0);
    [
        (color[0] as f32 * keep).round() as u8,
        (color[1] as f32 * keep).round() as u8,
        (color[2] as f32 * keep).round() as u8,
        color[3],
    ]
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

fn draw_square(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    for y in (cy - half_size)..=(cy + half_size) {
        for x in (cx - half_size)..=(cx + half_size) {
            if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                continue;
            }
            write_pixel_rgba_clipped(frame, width as usize, x, y, color);
        }
    }
}

fn draw_square_outline(
    frame: &mut [u8],
    width: u32,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    let left = cx - half_size;
    let right = cx + half_size;
    let top = cy - half_size;
    let bottom = cy + half_size;

    for x in left..=right {
        write_pixel_rgba_clipped(frame, width as usize, x, top, color);
        write_pixel_rgba_clipped(frame, width as usize, x, bottom, color);
    }
    for y in top..=bottom {
        write_pixel_rgba_clipped(frame, width as usize, left, y, color);
        write_pixel_rgba_clipped(frame, width as usize, right, y, color);
    }
}
