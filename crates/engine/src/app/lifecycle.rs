use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{info, warn};

use super::hud::HudState;
use super::scene::{EntityId, InputSnapshot, Scene, SceneCommand, SceneWorld};

pub type SceneFactory = Box<dyn Fn() -> Box<dyn Scene>>;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("unknown scene `{name}` (registered: {registered})")]
    UnknownScene { name: String, registered: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unloaded,
    Active,
}

struct ActiveScene {
    name: String,
    scene: Box<dyn Scene>,
    is_active: bool,
}

/// Registry of scene factories plus the single live scene.
///
/// A swap tears the old scene down completely (deactivate, cleanup, release
/// entities, drop) before the next factory runs, so nothing scheduled by the
/// outgoing scene can observe or touch the incoming one.
#[derive(Default)]
pub struct SceneLifecycle {
    factories: BTreeMap<String, SceneFactory>,
    active: Option<ActiveScene>,
    world: SceneWorld,
    quit_requested: bool,
}

impl SceneLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Scene> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn registered_names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn state(&self) -> LifecycleState {
        match &self.active {
            Some(active) if active.is_active => LifecycleState::Active,
            _ => LifecycleState::Unloaded,
        }
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.name.as_str())
    }

    pub fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn load_scene(&mut self, name: &str) -> Result<(), SceneError> {
        if !self.is_registered(name) {
            return Err(self.unknown_scene(name));
        }
        self.teardown_active();

        let Some(factory) = self.factories.get(name) else {
            return Err(self.unknown_scene(name));
        };
        let mut scene = factory();
        scene.setup(&mut self.world);
        self.world.apply_pending();
        info!(
            scene = name,
            entity_count = self.world.entity_count(),
            "scene_loaded"
        );
        self.active = Some(ActiveScene {
            name: name.to_string(),
            scene,
            is_active: true,
        });
        Ok(())
    }

    /// Runs one fixed step: discrete keys first, then the scene update, then
    /// any resulting transition.
    pub fn tick(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if !active.is_active {
            return;
        }

        for key in input.key_presses() {
            let command = active.scene.input(*key, &mut self.world);
            if !command.is_none() {
                self.world.apply_pending();
                self.apply_command(command);
                return;
            }
        }

        let command = active.scene.update(fixed_dt_seconds, input, &mut self.world);
        self.world.apply_pending();
        self.apply_command(command);
    }

    pub fn shutdown(&mut self) {
        self.teardown_active();
    }

    pub fn hud(&self) -> Option<&HudState> {
        self.active.as_ref().and_then(|active| active.scene.hud())
    }

    pub fn overlay_opacity(&self) -> f32 {
        self.active
            .as_ref()
            .map(|active| active.scene.overlay_opacity())
            .unwrap_or(0.0)
    }

    pub fn highlighted_entity(&self) -> Option<EntityId> {
        self.active
            .as_ref()
            .and_then(|active| active.scene.highlighted_entity())
    }

    pub fn debug_title(&self) -> Option<String> {
        self.active
            .as_ref()
            .and_then(|active| active.scene.debug_title(&self.world))
    }

    fn apply_command(&mut self, command: SceneCommand) {
        match command {
            SceneCommand::None => {}
            SceneCommand::Quit => {
                info!("scene_quit_requested");
                self.quit_requested = true;
            }
            SceneCommand::Load(name) => {
                if let Err(error) = self.load_scene(&name) {
                    warn!(error = %error, "scene_transition_failed");
                }
            }
        }
    }

    fn unknown_scene(&self, name: &str) -> SceneError {
        let registered = self.registered_names().join(", ");
        warn!(scene = name, registered = %registered, "scene_unknown");
        SceneError::UnknownScene {
            name: name.to_string(),
            registered,
        }
    }

    fn teardown_active(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        active.is_active = false;
        active.scene.cleanup(&mut self.world);
        let released = self.world.release_all();
        info!(scene = %active.name, released, "scene_unloaded");
        drop(active);
    }
}
