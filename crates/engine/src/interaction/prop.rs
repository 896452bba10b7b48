use std::fmt;

use crate::app::{EntityId, HudState, KeyPress, SceneWorld, Vec3};

use super::keypad::KeypadOutcome;
use super::state::GameState;
use super::tasks::TaskGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractCategory {
    Door,
    TaskProp,
    Prop,
}

pub const DEFAULT_PRIORITY: [InteractCategory; 3] = [
    InteractCategory::Door,
    InteractCategory::TaskProp,
    InteractCategory::Prop,
];

/// Positioned, prompt-carrying part of an interactable. Effects mutate it
/// (disable after pickup, move a prop) through `&mut`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropHandle {
    pub entity: EntityId,
    pub position: Vec3,
    pub prompt: String,
    pub interact_distance: f32,
    pub enabled: bool,
    pub category: InteractCategory,
    pub task: Option<String>,
}

impl PropHandle {
    pub fn new(
        entity: EntityId,
        position: Vec3,
        prompt: impl Into<String>,
        interact_distance: f32,
        category: InteractCategory,
    ) -> Self {
        Self {
            entity,
            position,
            prompt: prompt.into(),
            interact_distance: interact_distance.max(0.0),
            enabled: true,
            category,
            task: None,
        }
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Horizontal distance to `player` when enabled and within range (inclusive).
    pub fn distance_if_in_range(&self, player: Vec3) -> Option<f32> {
        if !self.enabled {
            return None;
        }
        let distance = self.position.horizontal_distance(player);
        (distance <= self.interact_distance).then_some(distance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEvent {
    UnlockDoor(EntityId),
    ExitRequested,
    ExitUnlocked,
    ItemCollected(String),
    TaskCompleted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    TaskCompleted(String),
    AlreadyDone,
    AlreadyHolding,
    NotHolding,
    PrerequisitesIncomplete(Vec<String>),
    DoorOpening,
    DoorClosing,
    DoorBusy,
    DoorLocked,
    ModalOpened,
    AlreadySolved,
    KeyAcquired,
    AlreadyHaveKey,
    ItemCollected(String),
    MissingItems(Vec<String>),
    TreatmentApplied,
    ExitRequested,
    Broken,
    AlreadyBroken,
    Opened,
    AlreadyOpen,
    Moved,
    Flavor(String),
}

/// Everything an effect may touch. Borrowed from the owning scene for one call.
pub struct InteractionContext<'a> {
    pub state: &'a mut GameState,
    pub tasks: &'a mut TaskGraph,
    pub hud: &'a mut HudState,
    pub world: &'a mut SceneWorld,
    pub events: &'a mut Vec<InteractionEvent>,
}

impl InteractionContext<'_> {
    pub fn complete_task(&mut self, id: &str) -> bool {
        if !self.tasks.complete(id) {
            return false;
        }
        let (done, total) = self.tasks.progress();
        self.hud.set_progress(done, total);
        self.events.push(InteractionEvent::TaskCompleted(id.to_string()));
        true
    }
}

pub trait PropEffect: fmt::Debug {
    fn interact(
        &mut self,
        handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome;

    fn action_label(&self, handle: &PropHandle, _state: &GameState) -> String {
        handle.prompt.clone()
    }

    fn tick(&mut self, _handle: &mut PropHandle, _dt_seconds: f32, _world: &mut SceneWorld) {}

    fn modal_key(
        &mut self,
        _handle: &mut PropHandle,
        _key: KeyPress,
        _ctx: &mut InteractionContext<'_>,
    ) -> Option<KeypadOutcome> {
        None
    }

    /// Releases a lock held by this prop. Returns true when something changed.
    fn unlock(&mut self, _handle: &mut PropHandle, _world: &mut SceneWorld) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct Interactable {
    pub handle: PropHandle,
    effect: Box<dyn PropEffect>,
}

impl Interactable {
    pub fn new(handle: PropHandle, effect: impl PropEffect + 'static) -> Self {
        Self {
            handle,
            effect: Box::new(effect),
        }
    }

    pub fn label(&self, state: &GameState) -> String {
        self.effect.action_label(&self.handle, state)
    }

    pub fn interact(&mut self, ctx: &mut InteractionContext<'_>) -> InteractionOutcome {
        self.effect.interact(&mut self.handle, ctx)
    }

    pub fn tick(&mut self, dt_seconds: f32, world: &mut SceneWorld) {
        self.effect.tick(&mut self.handle, dt_seconds, world);
    }

    pub fn modal_key(
        &mut self,
        key: KeyPress,
        ctx: &mut InteractionContext<'_>,
    ) -> Option<KeypadOutcome> {
        self.effect.modal_key(&mut self.handle, key, ctx)
    }

    pub fn unlock(&mut self, world: &mut SceneWorld) -> bool {
        self.effect.unlock(&mut self.handle, world)
    }
}

#[derive(Debug, Default)]
pub struct PropSet {
    props: Vec<Interactable>,
}

impl PropSet {
    pub fn push(&mut self, prop: Interactable) -> usize {
        self.props.push(prop);
        self.props.len() - 1
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interactable> {
        self.props.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Interactable> {
        self.props.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Interactable> {
        self.props.get_mut(index)
    }

    pub fn find(&self, entity: EntityId) -> Option<&Interactable> {
        self.props.iter().find(|prop| prop.handle.entity == entity)
    }

    pub fn find_mut(&mut self, entity: EntityId) -> Option<&mut Interactable> {
        self.props
            .iter_mut()
            .find(|prop| prop.handle.entity == entity)
    }

    pub fn tick(&mut self, dt_seconds: f32, world: &mut SceneWorld) {
        for prop in &mut self.props {
            prop.tick(dt_seconds, world);
        }
    }

    pub fn unlock(&mut self, entity: EntityId, world: &mut SceneWorld) -> bool {
        self.find_mut(entity)
            .is_some_and(|prop| prop.unlock(world))
    }

    pub fn clear(&mut self) {
        self.props.clear();
    }
}
