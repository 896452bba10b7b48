use escape_engine::{
    AssetResolver, EntityId, EntityKind, ExitAttempt, ExitDoor, ExitSequence, FlavorProp,
    HudState, InputSnapshot, InteractCategory, Interactable, InteractionEvent, InteractionOutcome,
    KeyPress, KeySource, MovableProp, NoteOverlay, PropEffect, PropHandle, Scene, SceneCommand,
    SceneWorld, Transform, Vec3,
};
use tracing::{debug, info, warn};

use super::{
    debug_title, spawn_model, spawn_walls, SceneResources, CELL, LEVEL_ERROR_BANNER,
    LEVEL_ERROR_SECONDS, YARD,
};
use crate::app::gameplay::{PlayerController, Room};
use crate::app::layout::{LayoutError, LevelLayout};

const GRID: [&str; 5] = [
    "#######",
    "#.....#",
    "#.....#",
    "#.....#",
    "###.###",
];
const SPAWNS: [(&str, (usize, usize)); 7] = [
    ("bed", (1, 1)),
    ("vent", (1, 1)),
    ("poster", (3, 1)),
    ("sink", (5, 1)),
    ("watch", (5, 3)),
    ("door", (3, 4)),
    ("player", (3, 2)),
];

const CELL_RANGE: f32 = 1.9;
const BED_OFFSET: Vec3 = Vec3::new(0.0, 0.1, -1.5);

const WATCHER_NOTE: &str = "Prisoner, you have been assigned to Cell Block A.

Your objective is simple:
- Find the key hidden in this cell
- Something about the laundry room
- Something about the outside
- Do not attempt to escape through other means

Look carefully.

Good luck. You'll need it.

- W";

pub(crate) fn cell_layout() -> Result<LevelLayout, LayoutError> {
    LevelLayout::new(&GRID, &SPAWNS, &[])
}

/// Locked prison cell. The key sits in a vent under the bed; the cell door
/// runs the exit sequence once the key is in hand.
#[derive(Debug)]
pub(crate) struct CellScene {
    assets: AssetResolver,
    room: Room,
    player: PlayerController,
    exit: ExitSequence,
    note: NoteOverlay,
    reading: bool,
    swallow_interact: bool,
    bed: Option<EntityId>,
    vent: Option<EntityId>,
}

impl CellScene {
    pub(crate) fn new(resources: SceneResources) -> Self {
        Self {
            assets: resources.asset_resolver(),
            room: Room::default(),
            player: PlayerController::new(Vec3::ZERO),
            exit: ExitSequence::new(YARD),
            note: NoteOverlay::default(),
            reading: false,
            swallow_interact: false,
            bed: None,
            vent: None,
        }
    }

    fn place(
        &mut self,
        world: &mut SceneWorld,
        layout: &LevelLayout,
        name: &str,
        prompt: &str,
        category: InteractCategory,
        effect: impl PropEffect + 'static,
    ) -> Option<EntityId> {
        let kind = match category {
            InteractCategory::Door => EntityKind::Door,
            InteractCategory::TaskProp | InteractCategory::Prop => EntityKind::Prop,
        };
        let Some(position) = layout.spawn_position(name) else {
            warn!(scene = CELL, prop = name, "prop_spawn_missing");
            return None;
        };
        let candidates = [format!("{name}.glb"), format!("{name}.obj")];
        let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
        let entity = spawn_model(
            world,
            &mut self.assets,
            name,
            kind,
            Transform::at(position),
            &candidates,
        );
        self.room.props.push(Interactable::new(
            PropHandle::new(entity, position, prompt, CELL_RANGE, category),
            effect,
        ));
        Some(entity)
    }

    fn spawn_props(&mut self, world: &mut SceneWorld, layout: &LevelLayout) {
        self.bed = self.place(
            world,
            layout,
            "bed",
            "Move the bed",
            InteractCategory::Prop,
            MovableProp::new(BED_OFFSET, "Moved the bed! I can see something underneath..."),
        );
        self.vent = self.place(
            world,
            layout,
            "vent",
            "Pry the grate",
            InteractCategory::Prop,
            KeySource,
        );
        if let Some(vent) = self.vent {
            world.set_visible(vent, false);
            if let Some(prop) = self.room.props.find_mut(vent) {
                prop.handle.enabled = false;
            }
        }
        self.place(
            world,
            layout,
            "sink",
            "Inspect the sink",
            InteractCategory::Prop,
            FlavorProp::new([
                "Feels hollow behind, but I can't move it.",
                "Rusty and noisy. Better not force it.",
                "Doesn't seem like the exit...",
            ]),
        );
        self.place(
            world,
            layout,
            "watch",
            "Inspect the watch",
            InteractCategory::Prop,
            FlavorProp::new([
                "Looks like a regular watch.",
                "Hey, a watch!",
                "It looks familiar...",
            ]),
        );
        self.place(
            world,
            layout,
            "poster",
            "Inspect the poster",
            InteractCategory::Prop,
            FlavorProp::new([
                "It's a poster about science.",
                "Why is this poster here?",
                "Wow, my favorite game!",
            ]),
        );
        self.place(
            world,
            layout,
            "door",
            "Try to open the door",
            InteractCategory::Door,
            ExitDoor,
        );
    }

    /// The moved bed uncovers the vent.
    fn reveal_vent(&mut self, world: &mut SceneWorld) {
        if let Some(prop) = self.bed.and_then(|bed| self.room.props.find_mut(bed)) {
            prop.handle.enabled = false;
        }
        if let Some(vent) = self.vent {
            world.set_visible(vent, true);
            if let Some(prop) = self.room.props.find_mut(vent) {
                prop.handle.enabled = true;
            }
        }
    }

    fn sync_note(&mut self, world: &mut SceneWorld) {
        if self.note.is_visible() {
            self.room
                .hud
                .set_center(Some(one_line(&self.note.visible_text())));
            return;
        }
        if self.reading {
            self.reading = false;
            self.room.hud.set_center(None);
            if !self.room.state.is_fading {
                world.set_controls_locked(false);
            }
            debug!(scene = CELL, "note_dismissed");
        }
    }

    /// A held interact key that dismissed the note must be released before it
    /// counts as an interaction.
    fn interact_gate(&mut self, interact_down: bool) -> bool {
        if !interact_down {
            self.swallow_interact = false;
        }
        interact_down && !self.swallow_interact && !self.note.is_visible()
    }

    fn start_exit(&mut self, world: &mut SceneWorld) {
        match self
            .exit
            .open_door_sequence(&mut self.room.state, &mut self.room.hud, world)
        {
            ExitAttempt::Started => info!(scene = CELL, next = YARD, "cell_escaped"),
            ExitAttempt::Locked => debug!(scene = CELL, "cell_door_locked"),
            ExitAttempt::AlreadyRunning => {}
        }
    }
}

fn one_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Scene for CellScene {
    fn setup(&mut self, world: &mut SceneWorld) {
        world.reset_camera();
        world.set_controls_locked(false);
        self.room.clear();
        self.exit.cancel();
        self.bed = None;
        self.vent = None;

        let layout = match cell_layout() {
            Ok(layout) => layout,
            Err(error) => {
                warn!(scene = CELL, error = %error, "level_setup_failed");
                self.room
                    .hud
                    .show_banner(LEVEL_ERROR_BANNER, LEVEL_ERROR_SECONDS);
                return;
            }
        };
        spawn_walls(world, &layout);
        self.spawn_props(world, &layout);
        self.player = PlayerController::new(layout.player_spawn().unwrap_or(Vec3::ZERO));
        self.player.spawn(world);

        self.note.show(WATCHER_NOTE);
        self.reading = true;
        world.set_controls_locked(true);
        info!(scene = CELL, props = self.room.props.len(), "cell_ready");
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        self.note.tick(fixed_dt_seconds);
        self.sync_note(world);

        let interact = self.interact_gate(input.interact_down());
        let position = self.player.update(fixed_dt_seconds, input, world);
        let outcome = self
            .room
            .step(fixed_dt_seconds, position, interact, world);
        if outcome == Some(InteractionOutcome::Moved) {
            self.reveal_vent(world);
        }

        for event in self.room.take_events() {
            match event {
                InteractionEvent::ExitRequested => self.start_exit(world),
                InteractionEvent::ItemCollected(item) => {
                    info!(scene = CELL, item = %item, "item_collected")
                }
                _ => {}
            }
        }

        self.exit
            .update(fixed_dt_seconds, &mut self.room.hud)
            .unwrap_or(SceneCommand::None)
    }

    fn input(&mut self, key: KeyPress, _world: &mut SceneWorld) -> SceneCommand {
        if self.note.handle_key(key) {
            self.swallow_interact = true;
            return SceneCommand::None;
        }
        match key {
            KeyPress::Cancel => SceneCommand::Quit,
            _ => SceneCommand::None,
        }
    }

    fn cleanup(&mut self, _world: &mut SceneWorld) {
        let dropped = self.exit.cancel();
        debug!(scene = CELL, dropped, "exit_sequence_cancelled");
        self.note.dismiss();
        self.reading = false;
        self.room.clear();
    }

    fn hud(&self) -> Option<&HudState> {
        Some(&self.room.hud)
    }

    fn overlay_opacity(&self) -> f32 {
        self.exit.opacity()
    }

    fn highlighted_entity(&self) -> Option<EntityId> {
        self.room.highlighted()
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        debug_title(CELL, world)
    }
}
