use escape_engine::{
    AssetResolver, CodeLock, Door, EntityId, EntityKind, FadeController, FlavorProp, HudState,
    InputSnapshot, InteractCategory, Interactable, InteractionOutcome, KeyPress, KeypadOutcome,
    PropEffect, PropHandle, Scene, SceneCommand, SceneWorld, Transform, Vec3,
};
use tracing::{debug, info, warn};

use super::{
    debug_title, spawn_model, spawn_walls, SceneResources, CLINIC, LEVEL_ERROR_BANNER,
    LEVEL_ERROR_SECONDS, VAULT,
};
use crate::app::gameplay::{PlayerController, Room};
use crate::app::layout::{LayoutError, LevelLayout};

const GRID: [&str; 14] = [
    "#########",
    "#.......#",
    "#.......#",
    "#.......#",
    "####.####",
    "#.......#",
    "#.......#",
    "#.......#",
    "#.......#",
    "#.......#",
    "#.......#",
    "#.......#",
    "#.......#",
    "#########",
];
const SPAWNS: [(&str, (usize, usize)); 6] = [
    ("player", (4, 11)),
    ("keypad", (7, 6)),
    ("hint", (1, 9)),
    ("simon", (1, 6)),
    ("colors", (7, 10)),
    ("portal", (4, 2)),
];
const DOORS: [(usize, usize); 1] = [(4, 4)];

pub(crate) const VAULT_CODE: [u8; 3] = [7, 3, 1];

const PROP_RANGE: f32 = 2.0;
const DOOR_RANGE: f32 = 2.4;
const PORTAL_RADIUS: f32 = 2.0;
const PORTAL_FADE_SECONDS: f32 = 0.6;
const RESET_FEEDBACK_SECONDS: f32 = 1.5;
const KEYPAD_HELP: &str = "0-9 type, Backspace erase, Enter confirm, Esc close";
const END_MESSAGE: &str = "...you wake up with a start... It was only a dream.";
const END_HINT: &str = "Press Enter to play again or Esc to quit";

pub(crate) fn vault_layout() -> Result<LevelLayout, LayoutError> {
    LevelLayout::new(&GRID, &SPAWNS, &DOORS)
}

fn keypad_prompt(display: &str) -> Vec<String> {
    let code = if display.is_empty() { "_" } else { display };
    vec![format!("Code: {code}"), KEYPAD_HELP.to_string()]
}

/// Final room. A three-digit keypad unlocks the vault door; the portal behind
/// it fades out to the ending.
#[derive(Debug)]
pub(crate) struct VaultScene {
    assets: AssetResolver,
    room: Room,
    player: PlayerController,
    fade: FadeController<String>,
    portal_spawn: Option<Vec3>,
    portal: Option<Vec3>,
    ended: bool,
}

impl VaultScene {
    pub(crate) fn new(resources: SceneResources) -> Self {
        Self {
            assets: resources.asset_resolver(),
            room: Room::default(),
            player: PlayerController::new(Vec3::ZERO),
            fade: FadeController::new(),
            portal_spawn: None,
            portal: None,
            ended: false,
        }
    }

    fn spawn_prop(
        &mut self,
        world: &mut SceneWorld,
        layout: &LevelLayout,
        name: &str,
        prompt: &str,
        effect: impl PropEffect + 'static,
    ) -> Option<EntityId> {
        let Some(position) = layout.spawn_position(name) else {
            warn!(scene = VAULT, prop = name, "prop_spawn_missing");
            return None;
        };
        let model = format!("{name}.glb");
        let entity = spawn_model(
            world,
            &mut self.assets,
            name,
            EntityKind::Prop,
            Transform::at(position),
            &[model.as_str()],
        );
        self.room.props.push(Interactable::new(
            PropHandle::new(entity, position, prompt, PROP_RANGE, InteractCategory::Prop),
            effect,
        ));
        Some(entity)
    }

    fn spawn_props(&mut self, world: &mut SceneWorld, layout: &LevelLayout) {
        let mut vault_door = None;
        for placement in layout.door_placements() {
            let entity = spawn_model(
                world,
                &mut self.assets,
                "vault_door",
                EntityKind::Door,
                Transform::at(placement.position).with_yaw(placement.yaw_degrees),
                &["vault_door.glb", "door.glb"],
            );
            self.room.props.push(Interactable::new(
                PropHandle::new(
                    entity,
                    placement.position,
                    "Open door",
                    DOOR_RANGE,
                    InteractCategory::Door,
                ),
                Door::new(placement.hinge, placement.yaw_degrees).locked(),
            ));
            vault_door.get_or_insert(entity);
        }

        let mut keypad = CodeLock::new(&VAULT_CODE);
        if let Some(door) = vault_door {
            keypad = keypad.paired_with(door);
        } else {
            warn!(scene = VAULT, "keypad_without_door");
        }
        self.spawn_prop(world, layout, "keypad", "Use keypad", keypad);
        self.spawn_prop(
            world,
            layout,
            "hint",
            "Read the note",
            FlavorProp::new(["Hint: \"731\""]),
        );
        self.spawn_prop(
            world,
            layout,
            "simon",
            "Play Simon",
            FlavorProp::new(["Simon is out of order. Use the keypad."]),
        );
        self.spawn_prop(
            world,
            layout,
            "colors",
            "Inspect the color panel",
            FlavorProp::new(["Colors: not required. Use the keypad."]),
        );
    }

    fn handle_keypad(&mut self, outcome: KeypadOutcome, world: &mut SceneWorld) {
        match outcome {
            KeypadOutcome::Edited(display) => self.room.hud.set_prompt(keypad_prompt(&display)),
            KeypadOutcome::Mismatch => self.room.hud.set_prompt(keypad_prompt("")),
            KeypadOutcome::Solved => {
                self.room.hud.clear_prompt();
                self.open_portal(world);
            }
            KeypadOutcome::Closed => self.room.hud.clear_prompt(),
            KeypadOutcome::Ignored => {}
        }
    }

    fn open_portal(&mut self, world: &mut SceneWorld) {
        if self.portal.is_some() {
            return;
        }
        let Some(position) = self.portal_spawn else {
            warn!(scene = VAULT, "portal_spawn_missing");
            return;
        };
        spawn_model(
            world,
            &mut self.assets,
            "portal",
            EntityKind::Marker,
            Transform::at(position),
            &["portal.glb"],
        );
        self.portal = Some(position);
        info!(scene = VAULT, "portal_opened");
    }

    fn enter_portal(&mut self, world: &mut SceneWorld) {
        self.room.state.level_completed = true;
        self.room.state.is_fading = true;
        world.set_controls_locked(true);
        self.fade
            .fade_to_black(PORTAL_FADE_SECONDS, Some(END_MESSAGE.to_string()));
        info!(scene = VAULT, "portal_entered");
    }

    fn in_portal(&self, position: Vec3) -> bool {
        self.portal
            .is_some_and(|portal| portal.horizontal_distance(position) <= PORTAL_RADIUS)
    }
}

impl Scene for VaultScene {
    fn setup(&mut self, world: &mut SceneWorld) {
        world.reset_camera();
        world.set_controls_locked(false);
        self.room.clear();
        self.fade.cancel();
        self.portal = None;
        self.ended = false;

        let layout = match vault_layout() {
            Ok(layout) => layout,
            Err(error) => {
                warn!(scene = VAULT, error = %error, "level_setup_failed");
                self.room
                    .hud
                    .show_banner(LEVEL_ERROR_BANNER, LEVEL_ERROR_SECONDS);
                return;
            }
        };
        spawn_walls(world, &layout);
        self.portal_spawn = layout.spawn_position("portal");
        self.spawn_props(world, &layout);
        self.player = PlayerController::new(layout.player_spawn().unwrap_or(Vec3::ZERO));
        self.player.spawn(world);
        info!(scene = VAULT, props = self.room.props.len(), "vault_ready");
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let position = self.player.update(fixed_dt_seconds, input, world);
        let outcome = self
            .room
            .step(fixed_dt_seconds, position, input.interact_down(), world);
        if outcome == Some(InteractionOutcome::ModalOpened) {
            self.room.hud.set_prompt(keypad_prompt(""));
        }
        self.room.take_events();

        if !self.room.state.is_fading && self.in_portal(position) {
            self.enter_portal(world);
        }
        if let Some(message) = self.fade.update(fixed_dt_seconds) {
            self.room.hud.set_center(Some(message));
            self.room.hud.set_status(Some(END_HINT.to_string()));
            self.ended = true;
            info!(scene = VAULT, "game_finished");
        }
        SceneCommand::None
    }

    fn input(&mut self, key: KeyPress, world: &mut SceneWorld) -> SceneCommand {
        if self.room.state.modal.is_some() {
            if let Some(outcome) = self.room.route_key(key, world) {
                self.handle_keypad(outcome, world);
            }
            return SceneCommand::None;
        }
        match key {
            KeyPress::Cancel => SceneCommand::Quit,
            KeyPress::Confirm if self.ended => SceneCommand::load(CLINIC),
            KeyPress::Restart if !self.room.state.is_fading => {
                self.player.reset(world);
                self.room
                    .hud
                    .show_feedback_for("Position reset!", RESET_FEEDBACK_SECONDS);
                debug!(scene = VAULT, "position_reset");
                SceneCommand::None
            }
            _ => SceneCommand::None,
        }
    }

    fn cleanup(&mut self, _world: &mut SceneWorld) {
        self.fade.cancel();
        self.room.clear();
        self.portal = None;
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
        debug_title(VAULT, world)
    }
}
