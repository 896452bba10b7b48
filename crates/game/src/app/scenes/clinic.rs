use escape_engine::{
    AssetResolver, DeliveryTarget, Door, EntityId, EntityKind, HandwashStation, HudState,
    InputSnapshot, InteractCategory, Interactable, InteractionEvent, KeyPress, PropHandle, Scene,
    SceneCommand, SceneWorld, SupplySource, Task, TaskGraph, TaskGraphError, Transform, Vec3,
};
use tracing::{info, warn};

use super::{
    debug_title, spawn_model, spawn_walls, SceneResources, CELL, CLINIC, LEVEL_ERROR_BANNER,
    LEVEL_ERROR_SECONDS,
};
use crate::app::gameplay::{PlayerController, Room};
use crate::app::layout::{LayoutError, LevelLayout};

pub(crate) const WASH: &str = "wash";
pub(crate) const PICKUP: &str = "pickup";
pub(crate) const DELIVER: &str = "deliver";

const GRID: [&str; 9] = [
    "###########",
    "#.........#",
    "#.........#",
    "#.........#",
    "#####.#####",
    "#.........#",
    "#.........#",
    "#.........#",
    "###########",
];
const SPAWNS: [(&str, (usize, usize)); 4] = [
    ("sink", (2, 2)),
    ("med_cart", (7, 2)),
    ("patient", (3, 6)),
    ("player", (5, 2)),
];
const DOORS: [(usize, usize); 1] = [(5, 4)];

const SINK_RANGE: f32 = 3.2;
const CART_RANGE: f32 = 2.6;
const PATIENT_RANGE: f32 = 2.2;
const DOOR_RANGE: f32 = 2.4;
const COMPLETE_MESSAGE: &str = "All tasks complete! Press Enter to continue";

pub(crate) fn clinic_tasks() -> Result<TaskGraph, TaskGraphError> {
    TaskGraph::new(vec![
        Task::new(WASH, "Wash your hands"),
        Task::new(PICKUP, "Pick up the medication").requires([WASH]),
        Task::new(DELIVER, "Deliver the medication to the patient").requires([WASH, PICKUP]),
    ])
}

pub(crate) fn clinic_layout() -> Result<LevelLayout, LayoutError> {
    LevelLayout::new(&GRID, &SPAWNS, &DOORS)
}

/// Ward round: wash, pick up the medication, deliver it. Doors come from the
/// layout's door cells.
#[derive(Debug)]
pub(crate) struct ClinicScene {
    resources: SceneResources,
    assets: AssetResolver,
    room: Room,
    player: PlayerController,
}

impl ClinicScene {
    pub(crate) fn new(resources: SceneResources) -> Self {
        let assets = resources.asset_resolver();
        Self {
            resources,
            assets,
            room: Room::default(),
            player: PlayerController::new(Vec3::ZERO),
        }
    }

    fn level_failed(&mut self, error: &dyn std::fmt::Display) {
        warn!(scene = CLINIC, error = %error, "level_setup_failed");
        self.room
            .hud
            .show_banner(LEVEL_ERROR_BANNER, LEVEL_ERROR_SECONDS);
    }

    fn spawn_props(&mut self, world: &mut SceneWorld, layout: &LevelLayout) {
        if let Some(position) = prop_position(layout, "sink") {
            let entity = self.spawn_prop(world, "sink", position, &["sink.glb", "sink.obj"]);
            self.room.props.push(Interactable::new(
                PropHandle::new(entity, position, "Wash hands", SINK_RANGE, InteractCategory::TaskProp)
                    .with_task(WASH),
                HandwashStation::new(WASH),
            ));
        }
        if let Some(position) = prop_position(layout, "med_cart") {
            let entity = self.spawn_prop(world, "med_cart", position, &["cart.glb", "cart.obj"]);
            self.room.props.push(Interactable::new(
                PropHandle::new(
                    entity,
                    position,
                    "Pick up medication",
                    CART_RANGE,
                    InteractCategory::TaskProp,
                )
                .with_task(PICKUP),
                SupplySource::new(PICKUP, DELIVER),
            ));
        }
        if let Some(position) = prop_position(layout, "patient") {
            let entity = self.spawn_prop(world, "patient", position, &["patient.glb", "bed.glb"]);
            self.room.props.push(Interactable::new(
                PropHandle::new(
                    entity,
                    position,
                    "Give medication",
                    PATIENT_RANGE,
                    InteractCategory::TaskProp,
                )
                .with_task(DELIVER),
                DeliveryTarget::new(DELIVER),
            ));
        }

        for placement in layout.door_placements() {
            let entity = spawn_model(
                world,
                &mut self.assets,
                "door",
                EntityKind::Door,
                Transform::at(placement.position).with_yaw(placement.yaw_degrees),
                &["door.glb", "door.obj"],
            );
            self.room.props.push(Interactable::new(
                PropHandle::new(
                    entity,
                    placement.position,
                    "Open door",
                    DOOR_RANGE,
                    InteractCategory::Door,
                ),
                Door::new(placement.hinge, placement.yaw_degrees),
            ));
        }
    }

    fn spawn_prop(
        &mut self,
        world: &mut SceneWorld,
        name: &str,
        position: Vec3,
        candidates: &[&str],
    ) -> EntityId {
        spawn_model(
            world,
            &mut self.assets,
            name,
            EntityKind::Prop,
            Transform::at(position),
            candidates,
        )
    }

    fn finished(&self) -> bool {
        !self.room.tasks.is_empty() && self.room.tasks.all_done()
    }

    fn refresh_status(&mut self) {
        if self.finished() {
            self.room.hud.set_status(None);
            self.room.hud.set_center(Some(COMPLETE_MESSAGE.to_string()));
            if !self.room.state.level_completed {
                self.room.state.level_completed = true;
                info!(scene = CLINIC, "level_complete");
            }
            return;
        }
        let status = self
            .room
            .tasks
            .next_incomplete()
            .map(|task| format!("Task: {}", task.title()));
        self.room.hud.set_status(status);
    }
}

fn prop_position(layout: &LevelLayout, name: &str) -> Option<Vec3> {
    let position = layout.spawn_position(name);
    if position.is_none() {
        warn!(scene = CLINIC, prop = name, "prop_spawn_missing");
    }
    position
}

impl Scene for ClinicScene {
    fn setup(&mut self, world: &mut SceneWorld) {
        world.reset_camera();
        world.set_controls_locked(false);
        self.room.clear();

        match clinic_tasks() {
            Ok(tasks) => self.room = Room::new(tasks),
            Err(error) => self.level_failed(&error),
        }
        self.room
            .apply_title_overrides(&self.resources.levels_dir, CLINIC);

        let layout = match clinic_layout() {
            Ok(layout) => layout,
            Err(error) => {
                self.level_failed(&error);
                return;
            }
        };
        let walls = spawn_walls(world, &layout);
        self.spawn_props(world, &layout);

        self.player = PlayerController::new(layout.player_spawn().unwrap_or(Vec3::ZERO));
        self.player.spawn(world);
        self.refresh_status();
        info!(scene = CLINIC, walls, props = self.room.props.len(), "clinic_ready");
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let position = self.player.update(fixed_dt_seconds, input, world);
        self.room
            .step(fixed_dt_seconds, position, input.interact_down(), world);
        for event in self.room.take_events() {
            if let InteractionEvent::TaskCompleted(task) = event {
                info!(scene = CLINIC, task = %task, "task_completed");
            }
        }
        self.refresh_status();
        SceneCommand::None
    }

    fn input(&mut self, key: KeyPress, _world: &mut SceneWorld) -> SceneCommand {
        match key {
            KeyPress::Cancel => SceneCommand::Quit,
            KeyPress::Confirm if self.finished() => SceneCommand::load(CELL),
            _ => SceneCommand::None,
        }
    }

    fn cleanup(&mut self, _world: &mut SceneWorld) {
        self.room.clear();
    }

    fn hud(&self) -> Option<&HudState> {
        Some(&self.room.hud)
    }

    fn highlighted_entity(&self) -> Option<EntityId> {
        self.room.highlighted()
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        debug_title(CLINIC, world)
    }
}
