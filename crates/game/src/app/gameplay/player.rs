use escape_engine::{
    EntityDesc, EntityId, EntityKind, InputAction, InputSnapshot, SceneWorld, Transform, Vec3,
};

pub(crate) const WALK_SPEED_UNITS_PER_SECOND: f32 = 4.0;
pub(crate) const SPRINT_MULTIPLIER: f32 = 1.8;
pub(crate) const PLAYER_HALF_EXTENT: f32 = 0.35;
/// Player radius plus half a wall tile.
const COLLISION_REACH: f32 = PLAYER_HALF_EXTENT + crate::app::layout::TILE * 0.5;
pub(crate) const EYE_HEIGHT: f32 = 1.7;

/// First-person walker projected onto the x/z plane.
#[derive(Debug, Clone)]
pub(crate) struct PlayerController {
    entity: Option<EntityId>,
    spawn: Vec3,
    position: Vec3,
    speed: f32,
}

impl PlayerController {
    pub(crate) fn new(spawn: Vec3) -> Self {
        Self {
            entity: None,
            spawn,
            position: spawn,
            speed: WALK_SPEED_UNITS_PER_SECOND,
        }
    }

    pub(crate) fn spawn(&mut self, world: &mut SceneWorld) -> EntityId {
        let id = world.spawn(
            EntityDesc::new("player", EntityKind::Player),
            Transform::at(self.spawn),
        );
        self.entity = Some(id);
        self.position = self.spawn;
        self.sync_camera(world);
        id
    }

    #[cfg(test)]
    pub(crate) fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    pub(crate) fn position(&self) -> Vec3 {
        self.position
    }

    pub(crate) fn teleport(&mut self, position: Vec3, world: &mut SceneWorld) {
        self.position = position;
        if let Some(id) = self.entity {
            world.set_position(id, position);
        }
        self.sync_camera(world);
    }

    pub(crate) fn reset(&mut self, world: &mut SceneWorld) {
        self.teleport(self.spawn, world);
    }

    /// Moves along each axis separately so walls stop one axis while the
    /// other keeps sliding.
    pub(crate) fn update(&mut self, dt_seconds: f32, input: &InputSnapshot, world: &mut SceneWorld) -> Vec3 {
        if world.controls().movement_locked {
            return self.position;
        }

        let mut direction = Vec3::ZERO;
        if input.is_down(InputAction::MoveForward) {
            direction.z += 1.0;
        }
        if input.is_down(InputAction::MoveBack) {
            direction.z -= 1.0;
        }
        if input.is_down(InputAction::MoveLeft) {
            direction.x -= 1.0;
        }
        if input.is_down(InputAction::MoveRight) {
            direction.x += 1.0;
        }
        let length = direction.horizontal_length();
        if length <= f32::EPSILON {
            return self.position;
        }

        let mut speed = self.speed;
        if input.is_down(InputAction::Sprint) {
            speed *= SPRINT_MULTIPLIER;
        }
        let step = direction.scaled(speed * dt_seconds.max(0.0) / length);

        let mut next = self.position;
        let along_x = Vec3::new(next.x + step.x, next.y, next.z);
        if !world.blocks_point(along_x, COLLISION_REACH, self.entity) {
            next = along_x;
        }
        let along_z = Vec3::new(next.x, next.y, next.z + step.z);
        if !world.blocks_point(along_z, COLLISION_REACH, self.entity) {
            next = along_z;
        }

        self.teleport(next, world);
        self.position
    }

    fn sync_camera(&self, world: &mut SceneWorld) {
        let camera = world.camera_mut();
        camera.position = Vec3::new(self.position.x, self.position.y + EYE_HEIGHT, self.position.z);
    }
}
