use std::ops::{Add, Sub};

use super::assets::{ModelChoice, Primitive};
use super::hud::HudState;
use super::input::{ActionStates, InputAction, KeyPress};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Load(String),
    Quit,
}

impl SceneCommand {
    pub fn load(name: impl Into<String>) -> Self {
        Self::Load(name.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SceneCommand::None)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    interact_down: bool,
    key_presses: Vec<KeyPress>,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        interact_down: bool,
        key_presses: Vec<KeyPress>,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            interact_down,
            key_presses,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn interact_down(&self) -> bool {
        self.interact_down
    }

    pub fn key_presses(&self) -> &[KeyPress] {
        &self.key_presses
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_interact_down(mut self, interact_down: bool) -> Self {
        self.interact_down = interact_down;
        self
    }

    pub fn with_key_press(mut self, key: KeyPress) -> Self {
        self.key_presses.push(key);
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// World-space position. `y` is up; gameplay distances use the x/z plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn horizontal_distance(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn horizontal_length(self) -> f32 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub yaw_degrees: f32,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            yaw_degrees: 0.0,
        }
    }

    pub fn with_yaw(mut self, yaw_degrees: f32) -> Self {
        self.yaw_degrees = yaw_degrees;
        self
    }
}

pub const CAMERA_NEAR_CLIP: f32 = 0.1;
pub const CAMERA_FAR_CLIP: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub near_clip: f32,
    pub far_clip: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
            near_clip: CAMERA_NEAR_CLIP,
            far_clip: CAMERA_FAR_CLIP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub movement_locked: bool,
    pub cursor_locked: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            movement_locked: false,
            cursor_locked: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Wall,
    Floor,
    Door,
    Prop,
    Agent,
    Marker,
}

impl EntityKind {
    pub fn default_primitive(self) -> Primitive {
        match self {
            EntityKind::Floor => Primitive::Quad,
            EntityKind::Player | EntityKind::Agent => Primitive::Capsule,
            EntityKind::Marker => Primitive::Sphere,
            EntityKind::Wall | EntityKind::Door | EntityKind::Prop => Primitive::Cube,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDesc {
    pub name: String,
    pub kind: EntityKind,
    pub model: ModelChoice,
}

impl EntityDesc {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            model: ModelChoice::Fallback(kind.default_primitive()),
        }
    }

    pub fn with_model(mut self, model: ModelChoice) -> Self {
        self.model = model;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub desc: EntityDesc,
    pub transform: Transform,
    pub collider_enabled: bool,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Positioned-entity store shared by every scene.
///
/// Entities belong to whichever scene spawned them and are released in bulk on
/// teardown. Camera and control lock are global: they survive scene swaps and
/// each scene resets them during setup.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    camera: Camera,
    controls: ControlState,
}

impl SceneWorld {
    pub fn spawn(&mut self, desc: EntityDesc, transform: Transform) -> EntityId {
        let id = self.allocator.allocate();
        self.entities.push(Entity {
            id,
            desc,
            transform,
            collider_enabled: true,
            visible: true,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.entities.iter().any(|entity| entity.id == id) {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if self.pending_despawns.is_empty() {
            return;
        }
        self.pending_despawns.sort();
        self.pending_despawns.dedup();
        let pending = &self.pending_despawns;
        self.entities
            .retain(|entity| pending.binary_search(&entity.id).is_err());
        self.pending_despawns.clear();
    }

    /// Drops every entity and pending despawn, returning how many entities were released.
    pub fn release_all(&mut self) -> usize {
        let released = self.entities.len();
        self.entities.clear();
        self.pending_despawns.clear();
        released
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.desc.name == name)
    }

    pub fn set_collider_enabled(&mut self, id: EntityId, enabled: bool) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.collider_enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn set_visible(&mut self, id: EntityId, visible: bool) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.transform.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_yaw(&mut self, id: EntityId, yaw_degrees: f32) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.transform.yaw_degrees = yaw_degrees;
                true
            }
            None => false,
        }
    }

    pub fn position_of(&self, id: EntityId) -> Option<Vec3> {
        self.find_entity(id).map(|entity| entity.transform.position)
    }

    /// True when a solid entity other than `ignore` overlaps the unit cell around `point`.
    pub fn blocks_point(&self, point: Vec3, half_extent: f32, ignore: Option<EntityId>) -> bool {
        self.entities.iter().any(|entity| {
            Some(entity.id) != ignore
                && entity.collider_enabled
                && matches!(entity.desc.kind, EntityKind::Wall | EntityKind::Door)
                && (entity.transform.position.x - point.x).abs() < half_extent
                && (entity.transform.position.z - point.z).abs() < half_extent
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn reset_camera(&mut self) {
        self.camera = Camera::default();
    }

    pub fn controls(&self) -> ControlState {
        self.controls
    }

    pub fn set_controls_locked(&mut self, locked: bool) {
        self.controls.movement_locked = locked;
        self.controls.cursor_locked = !locked;
    }
}

pub trait Scene {
    fn setup(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn input(&mut self, _key: KeyPress, _world: &mut SceneWorld) -> SceneCommand {
        SceneCommand::None
    }
    /// Cancels timers and drops subsystem state. Entity release is done by the
    /// lifecycle right after this returns.
    fn cleanup(&mut self, _world: &mut SceneWorld) {}
    fn hud(&self) -> Option<&HudState> {
        None
    }
    fn overlay_opacity(&self) -> f32 {
        0.0
    }
    fn highlighted_entity(&self) -> Option<EntityId> {
        None
    }
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str) -> EntityDesc {
        EntityDesc::new(name, EntityKind::Prop)
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        let third = allocator.allocate();

        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
        assert_eq!(third.0, 2);
    }

    #[test]
    fn scene_world_spawn_and_despawn_updates_count() {
        let mut world = SceneWorld::default();
        let id = world.spawn(prop("crate"), Transform::default());
        assert_eq!(world.entity_count(), 1);

        assert!(world.despawn(id));
        assert_eq!(world.entity_count(), 1);
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
        assert!(!world.despawn(id));
    }

    #[test]
    fn scene_world_duplicate_pending_despawns_are_safe_and_idempotent() {
        let mut world = SceneWorld::default();
        let doomed = world.spawn(prop("doomed"), Transform::default());
        let survivor = world.spawn(prop("survivor"), Transform::at(Vec3::new(3.0, 0.0, 1.0)));

        assert!(world.despawn(doomed));
        assert!(world.despawn(doomed));
        world.apply_pending();

        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(doomed).is_none());
        assert!(world.find_entity(survivor).is_some());
    }

    #[test]
    fn release_all_keeps_global_camera_and_controls() {
        let mut world = SceneWorld::default();
        world.spawn(prop("a"), Transform::default());
        world.spawn(prop("b"), Transform::default());
        world.camera_mut().position = Vec3::new(1.0, 2.0, 3.0);
        world.set_controls_locked(true);

        assert_eq!(world.release_all(), 2);
        assert_eq!(world.release_all(), 0);
        assert_eq!(world.camera().position, Vec3::new(1.0, 2.0, 3.0));
        assert!(world.controls().movement_locked);
    }

    #[test]
    fn horizontal_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 50.0, 4.0);
        assert!((a.horizontal_distance(b) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn set_controls_locked_toggles_cursor_inverse() {
        let mut world = SceneWorld::default();
        world.set_controls_locked(true);
        assert_eq!(
            world.controls(),
            ControlState {
                movement_locked: true,
                cursor_locked: false
            }
        );
        world.set_controls_locked(false);
        assert_eq!(world.controls(), ControlState::default());
    }

    #[test]
    fn blocks_point_ignores_disabled_colliders() {
        let mut world = SceneWorld::default();
        let wall = world.spawn(
            EntityDesc::new("wall", EntityKind::Wall),
            Transform::at(Vec3::new(1.0, 0.0, 1.0)),
        );
        assert!(world.blocks_point(Vec3::new(1.2, 0.0, 0.8), 0.9, None));
        world.set_collider_enabled(wall, false);
        assert!(!world.blocks_point(Vec3::new(1.2, 0.0, 0.8), 0.9, None));
    }
}
