use escape_engine::{
    AssetResolver, BreakableWall, EntityId, EntityKind, FadeController, HudState, InputSnapshot,
    InteractCategory, Interactable, InteractionEvent, ItemPickup, KeyPress, PropEffect,
    PropHandle, Scene, SceneCommand, SceneWorld, SlidingDoor, Transform, TreatmentStation, Vec3,
};
use tracing::{debug, info, warn};

use super::{
    debug_title, spawn_model, spawn_walls, SceneResources, LEVEL_ERROR_BANNER,
    LEVEL_ERROR_SECONDS, TRAUMA, VAULT,
};
use crate::app::gameplay::{
    Countdown, CountdownTick, PlayerController, Room, TRAUMA_COUNTDOWN_SECONDS,
};
use crate::app::layout::{LayoutError, LevelLayout};

const GRID: [&str; 5] = [
    "###############",
    "#.........#...#",
    "..............#",
    "#.........#...#",
    "###############",
];
const SPAWNS: [(&str, (usize, usize)); 7] = [
    ("exit", (0, 2)),
    ("office_door", (10, 2)),
    ("station", (12, 2)),
    ("gloves", (4, 3)),
    ("syringe", (1, 1)),
    ("bandages", (7, 1)),
    ("player", (2, 2)),
];

pub(crate) const REQUIRED_ITEMS: [&str; 3] = ["gloves", "syringe", "bandages"];

const ITEM_RANGE: f32 = 1.6;
const DOOR_RANGE: f32 = 2.0;
const STATION_RANGE: f32 = 2.0;
/// How far past the exit tile centre counts as having left the ward.
const EXIT_CROSSING: f32 = 0.6;
const VICTORY_FADE_SECONDS: f32 = 1.3;
const OFFICE_BANNER_SECONDS: f32 = 2.0;
const GAME_OVER_MESSAGE: &str = "You bled out... GAME OVER. Press R to restart";
const VICTORY_MESSAGE: &str = "LEVEL COMPLETE! Press Enter to continue";

pub(crate) fn trauma_layout() -> Result<LevelLayout, LayoutError> {
    LevelLayout::new(&GRID, &SPAWNS, &[])
}

/// Bleeding out against the clock: gather three supplies, unlock the office,
/// apply the tourniquet, then leave through the wall it opens.
#[derive(Debug)]
pub(crate) struct TraumaScene {
    assets: AssetResolver,
    room: Room,
    player: PlayerController,
    countdown: Countdown,
    fade: FadeController<String>,
    exit: Option<Vec3>,
    exit_wall: Option<EntityId>,
    exit_door: Option<EntityId>,
    office_door: Option<EntityId>,
    victory_shown: bool,
}

impl TraumaScene {
    pub(crate) fn new(resources: SceneResources) -> Self {
        Self {
            assets: resources.asset_resolver(),
            room: Room::default(),
            player: PlayerController::new(Vec3::ZERO),
            countdown: Countdown::new(TRAUMA_COUNTDOWN_SECONDS),
            fade: FadeController::new(),
            exit: None,
            exit_wall: None,
            exit_door: None,
            office_door: None,
            victory_shown: false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &mut self,
        world: &mut SceneWorld,
        layout: &LevelLayout,
        spawn: &str,
        kind: EntityKind,
        prompt: &str,
        range: f32,
        category: InteractCategory,
        effect: impl PropEffect + 'static,
    ) -> Option<EntityId> {
        let Some(position) = layout.spawn_position(spawn) else {
            warn!(scene = TRAUMA, prop = spawn, "prop_spawn_missing");
            return None;
        };
        let candidates = [format!("{spawn}.glb"), format!("{spawn}.obj")];
        let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
        let entity = spawn_model(
            world,
            &mut self.assets,
            spawn,
            kind,
            Transform::at(position),
            &candidates,
        );
        self.room.props.push(Interactable::new(
            PropHandle::new(entity, position, prompt, range, category),
            effect,
        ));
        Some(entity)
    }

    fn spawn_props(&mut self, world: &mut SceneWorld, layout: &LevelLayout) {
        for item in REQUIRED_ITEMS {
            self.place(
                world,
                layout,
                item,
                EntityKind::Prop,
                &format!("Pick up {item}"),
                ITEM_RANGE,
                InteractCategory::Prop,
                ItemPickup::new(item),
            );
        }
        self.place(
            world,
            layout,
            "station",
            EntityKind::Prop,
            "Apply tourniquet",
            STATION_RANGE,
            InteractCategory::Prop,
            TreatmentStation::new(REQUIRED_ITEMS),
        );

        self.exit = layout.spawn_position("exit");
        let office = layout.spawn_position("office_door").unwrap_or(Vec3::ZERO);
        self.office_door = self.place(
            world,
            layout,
            "office_door",
            EntityKind::Door,
            "Office",
            DOOR_RANGE,
            InteractCategory::Door,
            SlidingDoor::new(office, Vec3::new(0.0, 0.0, 1.0)),
        );
        self.exit_wall = self.place(
            world,
            layout,
            "exit",
            EntityKind::Wall,
            "Cracked wall",
            DOOR_RANGE,
            InteractCategory::Prop,
            BreakableWall::default(),
        );
        if let Some(wall) = self.exit_wall {
            if let Some(prop) = self.room.props.find_mut(wall) {
                prop.handle.enabled = false;
            }
        }
        self.exit_door = self.place(
            world,
            layout,
            "exit",
            EntityKind::Door,
            "Exit",
            DOOR_RANGE,
            InteractCategory::Door,
            SlidingDoor::new(self.exit.unwrap_or(Vec3::ZERO), Vec3::new(0.0, 0.0, -1.0)),
        );
    }

    fn sync_items(&mut self, world: &mut SceneWorld) {
        let missing = self.room.state.missing_items(&REQUIRED_ITEMS);
        self.room
            .hud
            .set_progress(REQUIRED_ITEMS.len() - missing.len(), REQUIRED_ITEMS.len());
        if !missing.is_empty() {
            return;
        }
        if let Some(door) = self.office_door {
            if self.room.props.unlock(door, world) {
                self.room
                    .hud
                    .show_banner("The office door slides open.", OFFICE_BANNER_SECONDS);
                info!(scene = TRAUMA, "office_unlocked");
            }
        }
    }

    fn open_exit(&mut self, world: &mut SceneWorld) {
        self.countdown.stop();
        self.room
            .hud
            .set_status(Some("Tourniquet applied. Get to the exit!".to_string()));
        for entity in [self.exit_wall, self.exit_door].into_iter().flatten() {
            self.room.props.unlock(entity, world);
        }
        info!(scene = TRAUMA, "exit_unlocked");
    }

    fn bleed_out(&mut self, world: &mut SceneWorld) {
        self.room.state.game_over = true;
        world.set_controls_locked(true);
        self.room.hud.set_status(Some(self.countdown.display()));
        self.room
            .hud
            .set_center(Some(GAME_OVER_MESSAGE.to_string()));
        info!(scene = TRAUMA, "countdown_expired");
    }

    fn crossed_exit(&self, position: Vec3) -> bool {
        self.room.state.treatment_applied
            && self
                .exit
                .is_some_and(|exit| position.x <= exit.x + EXIT_CROSSING)
    }

    fn leave_ward(&mut self, world: &mut SceneWorld) {
        self.room.state.level_completed = true;
        self.room.state.is_fading = true;
        world.set_controls_locked(true);
        self.fade
            .fade_to_black(VICTORY_FADE_SECONDS, Some(VICTORY_MESSAGE.to_string()));
        info!(scene = TRAUMA, "ward_escaped");
    }
}

impl Scene for TraumaScene {
    fn setup(&mut self, world: &mut SceneWorld) {
        world.reset_camera();
        world.set_controls_locked(false);
        self.room.clear();
        self.fade.cancel();
        self.countdown.restart();
        self.victory_shown = false;

        let layout = match trauma_layout() {
            Ok(layout) => layout,
            Err(error) => {
                warn!(scene = TRAUMA, error = %error, "level_setup_failed");
                self.countdown.stop();
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

        self.room.hud.set_status(Some(self.countdown.display()));
        self.sync_items(world);
        info!(
            scene = TRAUMA,
            seconds = TRAUMA_COUNTDOWN_SECONDS,
            "trauma_ready"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        match self.countdown.tick(fixed_dt_seconds) {
            CountdownTick::Running => self.room.hud.set_status(Some(self.countdown.display())),
            CountdownTick::Expired if !self.room.state.treatment_applied => self.bleed_out(world),
            CountdownTick::Expired | CountdownTick::Idle => {}
        }

        let position = self.player.update(fixed_dt_seconds, input, world);
        self.room
            .step(fixed_dt_seconds, position, input.interact_down(), world);

        for event in self.room.take_events() {
            match event {
                InteractionEvent::ItemCollected(item) => {
                    debug!(scene = TRAUMA, item = %item, "item_collected");
                    self.sync_items(world);
                }
                InteractionEvent::ExitUnlocked => self.open_exit(world),
                _ => {}
            }
        }

        if !self.room.state.level_completed && !self.room.state.game_over && self.crossed_exit(position) {
            self.leave_ward(world);
        }

        if let Some(message) = self.fade.update(fixed_dt_seconds) {
            self.room.hud.set_status(None);
            self.room.hud.set_center(Some(message));
            self.victory_shown = true;
        }
        SceneCommand::None
    }

    fn input(&mut self, key: KeyPress, _world: &mut SceneWorld) -> SceneCommand {
        match key {
            KeyPress::Cancel => SceneCommand::Quit,
            KeyPress::Restart if self.room.state.game_over => {
                info!(scene = TRAUMA, "trauma_restarted");
                SceneCommand::load(TRAUMA)
            }
            KeyPress::Confirm if self.victory_shown => SceneCommand::load(VAULT),
            _ => SceneCommand::None,
        }
    }

    fn cleanup(&mut self, _world: &mut SceneWorld) {
        self.countdown.stop();
        self.fade.cancel();
        self.room.clear();
    }

    fn hud(&self) -> Option<&HudState> {
        Some(&self.room.hud)
    }

    fn overlay_opacity(&self) -> f32 {
        self.fade.opacity()
    }

    fn highlighted_entity(&self) -> Option<EntityId> {
        self.room.highlighted()
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        debug_title(TRAUMA, world)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{detached_resources, press_interact, run_for, TICK};
    use super::*;
    use escape_engine::InputAction;

    fn loaded() -> (TraumaScene, SceneWorld) {
        let mut world = SceneWorld::default();
        let mut scene = TraumaScene::new(detached_resources());
        scene.setup(&mut world);
        (scene, world)
    }

    fn spawn_of(name: &str) -> Vec3 {
        trauma_layout()
            .expect("layout")
            .spawn_position(name)
            .expect("spawn")
    }

    fn use_prop(scene: &mut TraumaScene, world: &mut SceneWorld, name: &str, offset: Vec3) {
        scene.player.teleport(spawn_of(name) + offset, world);
        press_interact(scene, world);
    }

    fn collect_everything(scene: &mut TraumaScene, world: &mut SceneWorld) {
        for item in REQUIRED_ITEMS {
            use_prop(scene, world, item, Vec3::new(0.5, 0.0, 0.0));
        }
    }

    #[test]
    fn ward_starts_with_a_full_clock_and_nothing_collected() {
        let (scene, world) = loaded();
        assert_eq!(scene.room.hud.status(), Some("Time: 30s"));
        assert_eq!(scene.room.hud.progress_text().as_deref(), Some("Progress: 0/3"));
        let wall = scene.exit_wall.expect("wall");
        assert!(world.find_entity(wall).expect("wall entity").collider_enabled);
    }

    #[test]
    fn office_stays_shut_until_every_item_is_collected() {
        let (mut scene, mut world) = loaded();
        use_prop(&mut scene, &mut world, "office_door", Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(scene.room.hud.feedback(), Some("The door won't budge."));

        collect_everything(&mut scene, &mut world);
        assert_eq!(scene.room.hud.progress_text().as_deref(), Some("Progress: 3/3"));
        assert_eq!(scene.room.hud.banner(), Some("The office door slides open."));

        run_for(&mut scene, &mut world, 1.0);
        let door = scene.office_door.expect("door");
        assert!(!world.find_entity(door).expect("door entity").collider_enabled);
    }

    #[test]
    fn station_lists_missing_items() {
        let (mut scene, mut world) = loaded();
        use_prop(&mut scene, &mut world, "gloves", Vec3::new(0.5, 0.0, 0.0));
        use_prop(&mut scene, &mut world, "station", Vec3::new(-0.8, 0.0, 0.0));
        assert_eq!(
            scene.room.hud.feedback(),
            Some("Still missing: syringe, bandages")
        );
        assert!(!scene.room.state.treatment_applied);
    }

    #[test]
    fn treatment_opens_the_exit_and_crossing_it_wins() {
        let (mut scene, mut world) = loaded();
        collect_everything(&mut scene, &mut world);
        use_prop(&mut scene, &mut world, "station", Vec3::new(-0.8, 0.0, 0.0));
        assert!(scene.room.state.treatment_applied);
        assert!(!scene.countdown.is_running());

        let wall = scene.exit_wall.expect("wall");
        assert!(!world.find_entity(wall).expect("wall entity").collider_enabled);
        run_for(&mut scene, &mut world, 1.0);
        let door = scene.exit_door.expect("exit door");
        assert!(!world.find_entity(door).expect("exit door entity").collider_enabled);

        let west = InputSnapshot::empty().with_action_down(InputAction::MoveLeft, true);
        scene.player.teleport(spawn_of("exit") + Vec3::new(2.0, 0.0, 0.0), &mut world);
        for _ in 0..60 {
            scene.update(TICK, &west, &mut world);
        }
        assert!(scene.room.state.level_completed);

        run_for(&mut scene, &mut world, 1.5);
        assert_eq!(scene.room.hud.center(), Some(VICTORY_MESSAGE));
        assert_eq!(scene.input(KeyPress::Confirm, &mut world), SceneCommand::load(VAULT));
    }

    #[test]
    fn running_out_of_time_is_game_over_until_restart() {
        let (mut scene, mut world) = loaded();
        scene.countdown = Countdown::new(0.5);
        assert_eq!(scene.input(KeyPress::Restart, &mut world), SceneCommand::None);

        run_for(&mut scene, &mut world, 0.6);
        assert!(scene.room.state.game_over);
        assert!(world.controls().movement_locked);
        assert_eq!(scene.room.hud.center(), Some(GAME_OVER_MESSAGE));
        assert_eq!(scene.room.hud.status(), Some("Time: 0s"));

        assert_eq!(
            scene.input(KeyPress::Restart, &mut world),
            SceneCommand::load(TRAUMA)
        );
    }

    #[test]
    fn treated_patient_survives_the_clock() {
        let (mut scene, mut world) = loaded();
        collect_everything(&mut scene, &mut world);
        use_prop(&mut scene, &mut world, "station", Vec3::new(-0.8, 0.0, 0.0));
        run_for(&mut scene, &mut world, TRAUMA_COUNTDOWN_SECONDS + 1.0);
        assert!(!scene.room.state.game_over);
    }
}
