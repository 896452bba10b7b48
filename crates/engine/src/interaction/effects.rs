use tracing::{debug, info};

use crate::app::Vec3;

use super::prop::{
    InteractionContext, InteractionEvent, InteractionOutcome, PropEffect, PropHandle,
};
use super::state::GameState;

/// Completes its bound task once; later uses only show a flavor line.
#[derive(Debug, Clone)]
pub struct HandwashStation {
    task: String,
}

impl HandwashStation {
    pub fn new(task: impl Into<String>) -> Self {
        Self { task: task.into() }
    }
}

impl PropEffect for HandwashStation {
    fn interact(
        &mut self,
        _handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if ctx.tasks.is_done(&self.task) {
            ctx.hud.show_feedback("Your hands are already clean.");
            return InteractionOutcome::AlreadyDone;
        }
        if ctx.complete_task(&self.task) {
            ctx.hud.show_feedback("Hands washed.");
            return InteractionOutcome::TaskCompleted(self.task.clone());
        }
        let missing = ctx.tasks.missing_prerequisites(&self.task);
        ctx.hud.show_feedback(format!("First: {}", missing.join(", ")));
        InteractionOutcome::PrerequisitesIncomplete(missing)
    }
}

/// Hands the player an item and completes the pickup task. Refuses while the
/// item is already held or once it has been delivered.
#[derive(Debug, Clone)]
pub struct SupplySource {
    pickup_task: String,
    delivery_task: String,
}

impl SupplySource {
    pub fn new(pickup_task: impl Into<String>, delivery_task: impl Into<String>) -> Self {
        Self {
            pickup_task: pickup_task.into(),
            delivery_task: delivery_task.into(),
        }
    }
}

impl PropEffect for SupplySource {
    fn interact(
        &mut self,
        _handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if ctx.state.holding_item {
            ctx.hud.show_feedback("You're already holding the medication.");
            return InteractionOutcome::AlreadyHolding;
        }
        if ctx.tasks.is_done(&self.delivery_task) || ctx.tasks.is_done(&self.pickup_task) {
            ctx.hud.show_feedback("Nothing left to pick up.");
            return InteractionOutcome::AlreadyDone;
        }
        if !ctx.tasks.can_complete(&self.pickup_task) {
            let missing = ctx.tasks.missing_prerequisites(&self.pickup_task);
            ctx.hud.show_feedback(format!("First: {}", missing.join(", ")));
            return InteractionOutcome::PrerequisitesIncomplete(missing);
        }

        ctx.state.holding_item = true;
        ctx.complete_task(&self.pickup_task);
        ctx.hud.show_feedback("Picked up the medication.");
        InteractionOutcome::TaskCompleted(self.pickup_task.clone())
    }

    fn action_label(&self, handle: &PropHandle, state: &GameState) -> String {
        if state.holding_item {
            "Holding medication".to_string()
        } else {
            handle.prompt.clone()
        }
    }
}

/// Consumes the held item and completes the final task. The two refusal
/// reasons stay distinct.
#[derive(Debug, Clone)]
pub struct DeliveryTarget {
    task: String,
}

impl DeliveryTarget {
    pub fn new(task: impl Into<String>) -> Self {
        Self { task: task.into() }
    }
}

impl PropEffect for DeliveryTarget {
    fn interact(
        &mut self,
        _handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if ctx.tasks.is_done(&self.task) {
            ctx.hud.show_feedback("The patient has already been treated.");
            return InteractionOutcome::AlreadyDone;
        }
        if !ctx.state.holding_item {
            ctx.hud.show_feedback("You need to bring the medication first.");
            return InteractionOutcome::NotHolding;
        }
        if !ctx.tasks.can_complete(&self.task) {
            let missing = ctx.tasks.missing_prerequisites(&self.task);
            ctx.hud
                .show_feedback(format!("Not yet. Still to do: {}", missing.join(", ")));
            return InteractionOutcome::PrerequisitesIncomplete(missing);
        }

        ctx.state.holding_item = false;
        ctx.complete_task(&self.task);
        let message = if ctx.tasks.all_done() {
            "All tasks complete. Well done!"
        } else {
            "Medication delivered."
        };
        ctx.hud.show_feedback(message);
        InteractionOutcome::TaskCompleted(self.task.clone())
    }
}

/// Shows its lines one after another, wrapping around.
#[derive(Debug, Clone)]
pub struct FlavorProp {
    lines: Vec<String>,
    next: usize,
}

impl FlavorProp {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            next: 0,
        }
    }
}

impl PropEffect for FlavorProp {
    fn interact(
        &mut self,
        _handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        let Some(line) = self.lines.get(self.next).cloned() else {
            return InteractionOutcome::Flavor(String::new());
        };
        self.next = (self.next + 1) % self.lines.len();
        ctx.hud.show_feedback(line.clone());
        InteractionOutcome::Flavor(line)
    }
}

/// Shifts its entity by a fixed offset the first time it is used.
#[derive(Debug, Clone)]
pub struct MovableProp {
    offset: Vec3,
    moved: bool,
    message: String,
}

impl MovableProp {
    pub fn new(offset: Vec3, message: impl Into<String>) -> Self {
        Self {
            offset,
            moved: false,
            message: message.into(),
        }
    }
}

impl PropEffect for MovableProp {
    fn interact(
        &mut self,
        handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if self.moved {
            return InteractionOutcome::AlreadyDone;
        }
        self.moved = true;
        handle.position = handle.position + self.offset;
        ctx.world.set_position(handle.entity, handle.position);
        ctx.hud.show_feedback(self.message.clone());
        InteractionOutcome::Moved
    }
}

/// Vent grate hiding the cell key. Prying it open cuts the player once.
#[derive(Debug, Clone, Default)]
pub struct KeySource;

impl PropEffect for KeySource {
    fn interact(
        &mut self,
        handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if ctx.state.has_key {
            ctx.hud.show_feedback("I already have the key.");
            return InteractionOutcome::AlreadyHaveKey;
        }
        if !ctx.state.injured {
            ctx.state.injured = true;
            debug!(entity = handle.entity.0, "player_injured");
        }
        ctx.state.has_key = true;
        ctx.events.push(InteractionEvent::ItemCollected("key".to_string()));
        ctx.hud
            .show_feedback("Ouch! I cut my hand on the grate... but I found a key.");
        info!(entity = handle.entity.0, "key_acquired");
        InteractionOutcome::KeyAcquired
    }

    fn action_label(&self, handle: &PropHandle, state: &GameState) -> String {
        if state.has_key {
            "Vent (empty)".to_string()
        } else {
            handle.prompt.clone()
        }
    }
}

/// Cell door. Asks the owning scene to run its exit sequence.
#[derive(Debug, Clone, Default)]
pub struct ExitDoor;

impl PropEffect for ExitDoor {
    fn interact(
        &mut self,
        _handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        ctx.events.push(InteractionEvent::ExitRequested);
        InteractionOutcome::ExitRequested
    }
}

/// Collectible lying in the world. Vanishes once picked up.
#[derive(Debug, Clone)]
pub struct ItemPickup {
    item: String,
}

impl ItemPickup {
    pub fn new(item: impl Into<String>) -> Self {
        Self { item: item.into() }
    }
}

impl PropEffect for ItemPickup {
    fn interact(
        &mut self,
        handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if !ctx.state.collect(self.item.clone()) {
            return InteractionOutcome::AlreadyDone;
        }
        handle.enabled = false;
        ctx.world.set_visible(handle.entity, false);
        ctx.world.set_collider_enabled(handle.entity, false);
        ctx.events
            .push(InteractionEvent::ItemCollected(self.item.clone()));
        ctx.hud.show_feedback(format!("Picked up {}.", self.item));
        InteractionOutcome::ItemCollected(self.item.clone())
    }
}

/// Applies treatment once every required item is collected, which unlocks the
/// way out.
#[derive(Debug, Clone)]
pub struct TreatmentStation {
    required: Vec<String>,
}

impl TreatmentStation {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

impl PropEffect for TreatmentStation {
    fn interact(
        &mut self,
        _handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if ctx.state.treatment_applied {
            ctx.hud.show_feedback("The patient is stable.");
            return InteractionOutcome::AlreadyDone;
        }
        let missing = ctx.state.missing_items(self.required.as_slice());
        if !missing.is_empty() {
            ctx.hud.show_feedback(format!("Still missing: {}", missing.join(", ")));
            return InteractionOutcome::MissingItems(missing);
        }

        ctx.state.treatment_applied = true;
        ctx.state.exit_unlocked = true;
        ctx.events.push(InteractionEvent::ExitUnlocked);
        ctx.hud
            .show_feedback("Treatment applied. The patient is stable. Find a way out!");
        info!(items = self.required.len(), "treatment_applied");
        InteractionOutcome::TreatmentApplied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{EntityDesc, EntityKind, HudState, SceneWorld, Transform};
    use crate::interaction::{InteractCategory, Task, TaskGraph};

    struct Fixture {
        world: SceneWorld,
        state: GameState,
        tasks: TaskGraph,
        hud: HudState,
        events: Vec<InteractionEvent>,
    }

    impl Fixture {
        fn clinic() -> Self {
            let tasks = TaskGraph::new(vec![
                Task::new("wash", "Wash hands"),
                Task::new("pickup", "Pick up medication").requires(["wash"]),
                Task::new("deliver", "Give medication to patient").requires(["wash", "pickup"]),
            ])
            .expect("graph");
            Self {
                world: SceneWorld::default(),
                state: GameState::default(),
                tasks,
                hud: HudState::default(),
                events: Vec::new(),
            }
        }

        fn ctx(&mut self) -> InteractionContext<'_> {
            InteractionContext {
                state: &mut self.state,
                tasks: &mut self.tasks,
                hud: &mut self.hud,
                world: &mut self.world,
                events: &mut self.events,
            }
        }

        fn handle(&mut self, name: &str) -> PropHandle {
            let entity = self
                .world
                .spawn(EntityDesc::new(name, EntityKind::Prop), Transform::default());
            PropHandle::new(entity, Vec3::ZERO, name, 2.0, InteractCategory::TaskProp)
        }
    }

    #[test]
    fn clinic_chain_completes_in_order() {
        let mut fx = Fixture::clinic();
        let mut sink = fx.handle("sink");
        let mut cart = fx.handle("cart");
        let mut patient = fx.handle("patient");
        let mut wash = HandwashStation::new("wash");
        let mut supply = SupplySource::new("pickup", "deliver");
        let mut deliver = DeliveryTarget::new("deliver");

        assert_eq!(
            supply.interact(&mut cart, &mut fx.ctx()),
            InteractionOutcome::PrerequisitesIncomplete(vec!["Wash hands".to_string()])
        );
        assert_eq!(
            wash.interact(&mut sink, &mut fx.ctx()),
            InteractionOutcome::TaskCompleted("wash".to_string())
        );
        assert_eq!(wash.interact(&mut sink, &mut fx.ctx()), InteractionOutcome::AlreadyDone);
        assert_eq!(
            supply.interact(&mut cart, &mut fx.ctx()),
            InteractionOutcome::TaskCompleted("pickup".to_string())
        );
        assert_eq!(supply.interact(&mut cart, &mut fx.ctx()), InteractionOutcome::AlreadyHolding);
        assert_eq!(
            deliver.interact(&mut patient, &mut fx.ctx()),
            InteractionOutcome::TaskCompleted("deliver".to_string())
        );
        assert!(!fx.state.holding_item);
        assert_eq!(fx.tasks.progress(), (3, 3));
        assert_eq!(fx.hud.progress_text().as_deref(), Some("Progress: 3/3"));
        assert_eq!(supply.interact(&mut cart, &mut fx.ctx()), InteractionOutcome::AlreadyDone);
    }

    #[test]
    fn delivery_distinguishes_not_holding_from_missing_prerequisites() {
        let mut fx = Fixture::clinic();
        let mut patient = fx.handle("patient");
        let mut deliver = DeliveryTarget::new("deliver");

        assert_eq!(deliver.interact(&mut patient, &mut fx.ctx()), InteractionOutcome::NotHolding);
        assert_eq!(fx.hud.feedback(), Some("You need to bring the medication first."));

        fx.state.holding_item = true;
        assert_eq!(
            deliver.interact(&mut patient, &mut fx.ctx()),
            InteractionOutcome::PrerequisitesIncomplete(vec![
                "Wash hands".to_string(),
                "Pick up medication".to_string()
            ])
        );
        assert!(fx.state.holding_item);
        assert_eq!(fx.tasks.progress(), (0, 3));
    }

    #[test]
    fn flavor_lines_cycle() {
        let mut fx = Fixture::clinic();
        let mut handle = fx.handle("watch");
        let mut prop = FlavorProp::new(["tick", "tock"]);
        let lines: Vec<_> = (0..3)
            .map(|_| prop.interact(&mut handle, &mut fx.ctx()))
            .collect();
        assert_eq!(
            lines,
            vec![
                InteractionOutcome::Flavor("tick".to_string()),
                InteractionOutcome::Flavor("tock".to_string()),
                InteractionOutcome::Flavor("tick".to_string()),
            ]
        );
    }

    #[test]
    fn key_source_injures_once_and_grants_key_once() {
        let mut fx = Fixture::clinic();
        let mut vent = fx.handle("vent");
        let mut key = KeySource;

        assert_eq!(key.interact(&mut vent, &mut fx.ctx()), InteractionOutcome::KeyAcquired);
        assert!(fx.state.has_key && fx.state.injured);
        assert_eq!(key.interact(&mut vent, &mut fx.ctx()), InteractionOutcome::AlreadyHaveKey);
        assert_eq!(fx.hud.feedback(), Some("I already have the key."));
        assert_eq!(key.action_label(&vent, &fx.state), "Vent (empty)");
    }

    #[test]
    fn pickups_and_treatment_unlock_exit() {
        let mut fx = Fixture::clinic();
        let mut station_handle = fx.handle("bed");
        let mut gauze_handle = fx.handle("gauze");
        let mut station = TreatmentStation::new(["gauze", "tourniquet"]);
        let mut gauze = ItemPickup::new("gauze");

        assert_eq!(
            station.interact(&mut station_handle, &mut fx.ctx()),
            InteractionOutcome::MissingItems(vec!["gauze".to_string(), "tourniquet".to_string()])
        );
        assert_eq!(
            gauze.interact(&mut gauze_handle, &mut fx.ctx()),
            InteractionOutcome::ItemCollected("gauze".to_string())
        );
        assert!(!gauze_handle.enabled);
        assert!(!fx.world.find_entity(gauze_handle.entity).expect("gauze").visible);

        fx.state.collect("tourniquet");
        assert_eq!(
            station.interact(&mut station_handle, &mut fx.ctx()),
            InteractionOutcome::TreatmentApplied
        );
        assert!(fx.state.exit_unlocked);
        assert!(fx.events.contains(&InteractionEvent::ExitUnlocked));
    }

    #[test]
    fn movable_prop_moves_only_once() {
        let mut fx = Fixture::clinic();
        let mut handle = fx.handle("bed");
        let mut bed = MovableProp::new(Vec3::new(1.0, 0.0, 0.0), "You push the bed aside.");

        assert_eq!(bed.interact(&mut handle, &mut fx.ctx()), InteractionOutcome::Moved);
        assert_eq!(bed.interact(&mut handle, &mut fx.ctx()), InteractionOutcome::AlreadyDone);
        assert_eq!(fx.world.position_of(handle.entity), Some(Vec3::new(1.0, 0.0, 0.0)));
    }
}
