use tracing::debug;

use crate::app::{SceneWorld, Vec3};

use super::prop::{InteractionContext, InteractionOutcome, PropEffect, PropHandle};
use super::state::GameState;

pub const DOOR_OPEN_DEGREES: f32 = 90.0;
pub const DOOR_SWING_SECONDS: f32 = 0.25;
/// Collision comes back slightly after a closing swing finishes.
pub const DOOR_COLLISION_RESTORE_SECONDS: f32 = 0.26;
pub const SLIDING_DOOR_DISTANCE: f32 = 1.22;
pub const SLIDING_DOOR_SECONDS: f32 = 0.7;
const SLIDING_COLLIDER_GRACE_SECONDS: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hinge {
    Left,
    Right,
}

impl Hinge {
    pub fn swing_sign(self) -> f32 {
        match self {
            Hinge::Left => 1.0,
            Hinge::Right => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Swing {
    from_yaw: f32,
    to_yaw: f32,
    elapsed: f32,
    restore_collider_at: Option<f32>,
}

impl Swing {
    fn finished(&self) -> bool {
        self.elapsed >= DOOR_SWING_SECONDS && self.restore_collider_at.is_none()
    }
}

/// Hinged door that swings open or closed. A toggle is refused while a swing
/// is in flight.
#[derive(Debug, Clone)]
pub struct Door {
    state: DoorState,
    hinge: Hinge,
    closed_yaw: f32,
    open_degrees: f32,
    locked: bool,
    swing: Option<Swing>,
}

impl Door {
    pub fn new(hinge: Hinge, closed_yaw: f32) -> Self {
        Self {
            state: DoorState::Closed,
            hinge,
            closed_yaw,
            open_degrees: DOOR_OPEN_DEGREES,
            locked: false,
            swing: None,
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn state(&self) -> DoorState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn in_transition(&self) -> bool {
        self.swing.is_some()
    }

    fn open_yaw(&self) -> f32 {
        self.closed_yaw + self.hinge.swing_sign() * self.open_degrees
    }
}

impl PropEffect for Door {
    fn interact(
        &mut self,
        handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if self.locked {
            ctx.hud.show_feedback("It's locked.");
            return InteractionOutcome::DoorLocked;
        }
        if self.swing.is_some() {
            debug!(entity = handle.entity.0, "door_toggle_rejected");
            return InteractionOutcome::DoorBusy;
        }

        let from_yaw = ctx
            .world
            .find_entity(handle.entity)
            .map(|entity| entity.transform.yaw_degrees)
            .unwrap_or(self.closed_yaw);
        match self.state {
            DoorState::Closed => {
                ctx.world.set_collider_enabled(handle.entity, false);
                self.swing = Some(Swing {
                    from_yaw,
                    to_yaw: self.open_yaw(),
                    elapsed: 0.0,
                    restore_collider_at: None,
                });
                self.state = DoorState::Open;
                InteractionOutcome::DoorOpening
            }
            DoorState::Open => {
                self.swing = Some(Swing {
                    from_yaw,
                    to_yaw: self.closed_yaw,
                    elapsed: 0.0,
                    restore_collider_at: Some(DOOR_COLLISION_RESTORE_SECONDS),
                });
                self.state = DoorState::Closed;
                InteractionOutcome::DoorClosing
            }
        }
    }

    fn action_label(&self, _handle: &PropHandle, _state: &GameState) -> String {
        if self.locked {
            return "Locked door".to_string();
        }
        match self.state {
            DoorState::Closed => "Open door".to_string(),
            DoorState::Open => "Close door".to_string(),
        }
    }

    fn tick(&mut self, handle: &mut PropHandle, dt_seconds: f32, world: &mut SceneWorld) {
        let Some(swing) = self.swing.as_mut() else {
            return;
        };
        swing.elapsed += dt_seconds.max(0.0);
        let t = (swing.elapsed / DOOR_SWING_SECONDS).min(1.0);
        world.set_yaw(handle.entity, swing.from_yaw + (swing.to_yaw - swing.from_yaw) * t);

        if let Some(restore_at) = swing.restore_collider_at {
            if swing.elapsed >= restore_at {
                world.set_collider_enabled(handle.entity, true);
                swing.restore_collider_at = None;
            }
        }
        if swing.finished() {
            self.swing = None;
        }
    }

    fn unlock(&mut self, _handle: &mut PropHandle, _world: &mut SceneWorld) -> bool {
        let was_locked = self.locked;
        self.locked = false;
        was_locked
    }
}

/// Door panel that slides sideways once, after being unlocked.
#[derive(Debug, Clone)]
pub struct SlidingDoor {
    origin: Vec3,
    direction: Vec3,
    distance: f32,
    elapsed: Option<f32>,
    collider_removed: bool,
}

impl SlidingDoor {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let length = direction.horizontal_length();
        let direction = if length > f32::EPSILON {
            Vec3::new(direction.x / length, 0.0, direction.z / length)
        } else {
            Vec3::new(1.0, 0.0, 0.0)
        };
        Self {
            origin,
            direction,
            distance: SLIDING_DOOR_DISTANCE,
            elapsed: None,
            collider_removed: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.elapsed.is_some()
    }

    fn start(&mut self, handle: &mut PropHandle) -> bool {
        if self.elapsed.is_some() {
            return false;
        }
        self.elapsed = Some(0.0);
        handle.enabled = false;
        true
    }
}

impl PropEffect for SlidingDoor {
    fn interact(
        &mut self,
        _handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if self.is_open() {
            return InteractionOutcome::AlreadyOpen;
        }
        ctx.hud.show_feedback("The door won't budge.");
        InteractionOutcome::DoorLocked
    }

    fn tick(&mut self, handle: &mut PropHandle, dt_seconds: f32, world: &mut SceneWorld) {
        let Some(elapsed) = self.elapsed.as_mut() else {
            return;
        };
        if self.collider_removed {
            return;
        }
        *elapsed += dt_seconds.max(0.0);
        let t = (*elapsed / SLIDING_DOOR_SECONDS).min(1.0);
        let position = self.origin + self.direction.scaled(self.distance * t);
        world.set_position(handle.entity, position);
        handle.position = position;
        if *elapsed >= SLIDING_DOOR_SECONDS + SLIDING_COLLIDER_GRACE_SECONDS {
            world.set_collider_enabled(handle.entity, false);
            self.collider_removed = true;
        }
    }

    fn unlock(&mut self, handle: &mut PropHandle, _world: &mut SceneWorld) -> bool {
        self.start(handle)
    }
}

/// Wall section that breaks exactly once.
#[derive(Debug, Clone, Default)]
pub struct BreakableWall {
    broken: bool,
}

impl BreakableWall {
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    fn smash(&mut self, handle: &mut PropHandle, world: &mut SceneWorld) -> bool {
        if self.broken {
            return false;
        }
        self.broken = true;
        handle.enabled = false;
        world.set_collider_enabled(handle.entity, false);
        world.set_visible(handle.entity, false);
        true
    }
}

impl PropEffect for BreakableWall {
    fn interact(
        &mut self,
        handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if self.smash(handle, ctx.world) {
            ctx.hud.show_feedback("The wall crumbles!");
            InteractionOutcome::Broken
        } else {
            InteractionOutcome::AlreadyBroken
        }
    }

    fn unlock(&mut self, handle: &mut PropHandle, world: &mut SceneWorld) -> bool {
        self.smash(handle, world)
    }
}
