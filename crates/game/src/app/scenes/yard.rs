use escape_engine::{
    AssetResolver, EntityId, EntityKind, FadeController, HudState, InputSnapshot, KeyPress, Scene,
    SceneCommand, SceneWorld, Transform, Vec3,
};
use tracing::{debug, info, warn};

use super::{
    debug_title, spawn_model, spawn_walls, SceneResources, LEVEL_ERROR_BANNER,
    LEVEL_ERROR_SECONDS, TRAUMA, YARD,
};
use crate::app::gameplay::{yard_route, PatrolAgent, PlayerController, Room};
use crate::app::layout::{LayoutError, LevelLayout};

const GRID: [&str; 21] = [
    "###########################",
    "#.........................#",
    "#.........................#",
    "#.........................#",
    "#.........................#",
    "#.........................#",
    "#..................#......#",
    "#.........................#",
    "#.........................#",
    "#.........................#",
    "#.........................#",
    "#.........................#",
    "#.........................#",
    "#..................#......#",
    "#.........................#",
    "#.........................#",
    "#.........................#",
    "#.........................#",
    "#.........................#",
    "#.........................#",
    "###########################",
];
const SPAWNS: [(&str, (usize, usize)); 2] = [("player", (2, 9)), ("gate", (25, 9))];

const GATE_RADIUS: f32 = 1.5;
const GATE_FADE_SECONDS: f32 = 1.3;
const GATE_BANNER_SECONDS: f32 = 1.3;
const OBJECTIVE: &str = "Reach the gate. Stay away from the guard.";
const CAUGHT_MESSAGE: &str = "CAUGHT! Press R to restart";

pub(crate) fn yard_layout() -> Result<LevelLayout, LayoutError> {
    LevelLayout::new(&GRID, &SPAWNS, &[])
}

/// Exercise yard crossed under a patrolling guard. Getting caught is a game
/// over until the player restarts; reaching the gate fades into the ward.
#[derive(Debug)]
pub(crate) struct YardScene {
    assets: AssetResolver,
    room: Room,
    player: PlayerController,
    guard: PatrolAgent,
    gate: Option<Vec3>,
    fade: FadeController<String>,
}

impl YardScene {
    pub(crate) fn new(resources: SceneResources) -> Self {
        Self {
            assets: resources.asset_resolver(),
            room: Room::default(),
            player: PlayerController::new(Vec3::ZERO),
            guard: PatrolAgent::new(yard_route()),
            gate: None,
            fade: FadeController::new(),
        }
    }

    fn catch_player(&mut self, position: Vec3, world: &mut SceneWorld) {
        self.room.state.game_over = true;
        world.set_controls_locked(true);
        self.room.hud.set_center(Some(CAUGHT_MESSAGE.to_string()));
        info!(
            scene = YARD,
            x = position.x,
            z = position.z,
            "player_caught"
        );
    }

    fn restart(&mut self, world: &mut SceneWorld) {
        self.player.reset(world);
        self.guard.reset(world);
        self.room.state.game_over = false;
        self.room.hud.set_center(None);
        world.set_controls_locked(false);
        info!(scene = YARD, "yard_restarted");
    }

    fn reach_gate(&mut self, world: &mut SceneWorld) {
        self.room.state.level_completed = true;
        self.room.state.is_fading = true;
        world.set_controls_locked(true);
        self.room
            .hud
            .show_banner("You slipped past the guard!", GATE_BANNER_SECONDS);
        self.fade
            .fade_to_black(GATE_FADE_SECONDS, Some(TRAUMA.to_string()));
        info!(scene = YARD, next = TRAUMA, "gate_reached");
    }

    fn settled(&self) -> bool {
        self.room.state.game_over || self.room.state.is_fading
    }
}

impl Scene for YardScene {
    fn setup(&mut self, world: &mut SceneWorld) {
        world.reset_camera();
        world.set_controls_locked(false);
        self.room.clear();
        self.fade.cancel();
        self.gate = None;

        let layout = match yard_layout() {
            Ok(layout) => layout,
            Err(error) => {
                warn!(scene = YARD, error = %error, "level_setup_failed");
                self.room
                    .hud
                    .show_banner(LEVEL_ERROR_BANNER, LEVEL_ERROR_SECONDS);
                return;
            }
        };
        spawn_walls(world, &layout);
        self.gate = layout.spawn_position("gate");
        if let Some(gate) = self.gate {
            spawn_model(
                world,
                &mut self.assets,
                "gate",
                EntityKind::Marker,
                Transform::at(gate),
                &["gate.glb", "gate.obj"],
            );
        }

        self.player = PlayerController::new(layout.player_spawn().unwrap_or(Vec3::ZERO));
        self.player.spawn(world);
        self.guard = PatrolAgent::new(yard_route());
        self.guard.spawn(world);
        self.room.hud.set_status(Some(OBJECTIVE.to_string()));
        info!(scene = YARD, "yard_ready");
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let position = self.player.update(fixed_dt_seconds, input, world);

        if !self.settled() {
            self.guard.update(fixed_dt_seconds, world);
            if self.guard.catches(position) {
                self.catch_player(position, world);
            } else if self
                .gate
                .is_some_and(|gate| gate.horizontal_distance(position) <= GATE_RADIUS)
            {
                self.reach_gate(world);
            }
        }

        self.room
            .step(fixed_dt_seconds, position, input.interact_down(), world);
        self.fade
            .update(fixed_dt_seconds)
            .map(SceneCommand::Load)
            .unwrap_or(SceneCommand::None)
    }

    fn input(&mut self, key: KeyPress, world: &mut SceneWorld) -> SceneCommand {
        match key {
            KeyPress::Cancel => SceneCommand::Quit,
            KeyPress::Restart if self.room.state.game_over => {
                self.restart(world);
                SceneCommand::None
            }
            _ => SceneCommand::None,
        }
    }

    fn cleanup(&mut self, _world: &mut SceneWorld) {
        self.fade.cancel();
        self.room.clear();
        debug!(scene = YARD, "yard_cleaned_up");
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
        debug_title(YARD, world)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{forward, run_for, run_until_command, TICK};
    use super::*;

    fn loaded() -> (YardScene, SceneWorld) {
        let mut world = SceneWorld::default();
        let mut scene = YardScene::new(super::super::test_support::detached_resources());
        scene.setup(&mut world);
        (scene, world)
    }

    #[test]
    fn spawn_is_out_of_the_guards_reach() {
        let (mut scene, mut world) = loaded();
        run_for(&mut scene, &mut world, 2.0);
        assert!(!scene.room.state.game_over);
        assert!(world.find_by_name("guard").is_some());
        assert_eq!(scene.room.hud.status(), Some(OBJECTIVE));
    }

    #[test]
    fn getting_close_to_the_guard_ends_the_run_until_restart() {
        let (mut scene, mut world) = loaded();
        let guard = scene.guard.position();
        scene
            .player
            .teleport(guard + Vec3::new(3.0, 0.0, 0.0), &mut world);
        scene.update(TICK, &forward(), &mut world);
        assert!(scene.room.state.game_over);
        assert!(world.controls().movement_locked);
        assert_eq!(scene.room.hud.center(), Some(CAUGHT_MESSAGE));

        let frozen = scene.player.position();
        scene.update(TICK, &forward(), &mut world);
        assert_eq!(scene.player.position(), frozen);

        assert_eq!(scene.input(KeyPress::Restart, &mut world), SceneCommand::None);
        assert!(!scene.room.state.game_over);
        assert!(scene.room.hud.center().is_none());
        let spawn = yard_layout().expect("layout").player_spawn().expect("spawn");
        assert_eq!(scene.player.position(), spawn);
        assert_eq!(scene.guard.position(), yard_route()[0]);
    }

    #[test]
    fn restart_is_ignored_while_playing() {
        let (mut scene, mut world) = loaded();
        let guard_before = scene.guard.position();
        run_for(&mut scene, &mut world, 0.5);
        let moved = scene.guard.position();
        assert_ne!(moved, guard_before);
        scene.input(KeyPress::Restart, &mut world);
        assert_eq!(scene.guard.position(), moved);
    }

    #[test]
    fn reaching_the_gate_fades_into_the_ward() {
        let (mut scene, mut world) = loaded();
        let gate = scene.gate.expect("gate");
        scene
            .player
            .teleport(gate + Vec3::new(-1.0, 0.0, 0.0), &mut world);
        let command = run_until_command(&mut scene, &mut world, 3.0);
        assert_eq!(command, SceneCommand::load(TRAUMA));
        assert!(scene.room.state.level_completed);
        assert_eq!(scene.overlay_opacity(), 1.0);
    }
}
