use tracing::{debug, info};

use crate::app::{FadeController, HudState, SceneCommand, SceneWorld, SequenceRunner};

use super::state::GameState;

pub const EXIT_DOOR_BANNER_SECONDS: f32 = 1.1;
pub const EXIT_LEVEL_BANNER_SECONDS: f32 = 1.3;
pub const EXIT_FADE_SECONDS: f32 = 1.3;

const FIRST_BANNER_DELAY_SECONDS: f32 = 0.05;
const SECOND_BANNER_DELAY_SECONDS: f32 = 1.15;
const FADE_DELAY_SECONDS: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitBeat {
    DoorBanner,
    LevelBanner,
    FadeOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitAttempt {
    Started,
    Locked,
    AlreadyRunning,
}

/// Door banner, level banner, fade to black, then hand-off to the next scene.
#[derive(Debug)]
pub struct ExitSequence {
    next_scene: String,
    door_banner: String,
    level_banner: String,
    beats: SequenceRunner<ExitBeat>,
    fade: FadeController<String>,
}

impl ExitSequence {
    pub fn new(next_scene: impl Into<String>) -> Self {
        Self {
            next_scene: next_scene.into(),
            door_banner: "Door opened! You managed to escape the cell.".to_string(),
            level_banner: "Level 1 completed!".to_string(),
            beats: SequenceRunner::new(),
            fade: FadeController::new(),
        }
    }

    pub fn with_banners(mut self, door: impl Into<String>, level: impl Into<String>) -> Self {
        self.door_banner = door.into();
        self.level_banner = level.into();
        self
    }

    pub fn opacity(&self) -> f32 {
        self.fade.opacity()
    }

    pub fn is_running(&self) -> bool {
        self.beats.is_active() || self.fade.is_running()
    }

    pub fn open_door_sequence(
        &mut self,
        state: &mut GameState,
        hud: &mut HudState,
        world: &mut SceneWorld,
    ) -> ExitAttempt {
        if state.level_completed || state.is_fading {
            debug!("exit_sequence_already_running");
            return ExitAttempt::AlreadyRunning;
        }
        if !state.has_key {
            hud.show_feedback("Locked. I need a key.");
            return ExitAttempt::Locked;
        }

        state.level_completed = true;
        state.is_fading = true;
        world.set_controls_locked(true);
        hud.clear_prompt();
        self.beats.start([
            (FIRST_BANNER_DELAY_SECONDS, ExitBeat::DoorBanner),
            (SECOND_BANNER_DELAY_SECONDS, ExitBeat::LevelBanner),
            (FADE_DELAY_SECONDS, ExitBeat::FadeOut),
        ]);
        info!(next_scene = %self.next_scene, "exit_sequence_started");
        ExitAttempt::Started
    }

    /// Advances banners and fade. Returns the scene hand-off once the fade
    /// has fully covered the screen.
    pub fn update(&mut self, dt_seconds: f32, hud: &mut HudState) -> Option<SceneCommand> {
        for beat in self.beats.advance(dt_seconds) {
            match beat {
                ExitBeat::DoorBanner => {
                    hud.show_banner(self.door_banner.clone(), EXIT_DOOR_BANNER_SECONDS)
                }
                ExitBeat::LevelBanner => {
                    hud.show_banner(self.level_banner.clone(), EXIT_LEVEL_BANNER_SECONDS)
                }
                ExitBeat::FadeOut => {
                    self.fade
                        .fade_to_black(EXIT_FADE_SECONDS, Some(self.next_scene.clone()));
                }
            }
        }
        self.fade.update(dt_seconds).map(SceneCommand::Load)
    }

    pub fn cancel(&mut self) -> usize {
        self.fade.cancel();
        self.beats.cancel()
    }
}
