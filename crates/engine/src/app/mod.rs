mod assets;
mod fade;
mod hud;
mod input;
mod lifecycle;
mod loop_runner;
mod narrative;
mod rendering;
mod scene;
mod sequence;

pub use assets::{resolve_model, AssetResolver, ModelChoice, Primitive};
pub use fade::{FadeController, FadeDirection, FadePhase, MIN_FADE_SECONDS};
pub use hud::{HudState, TimedMessage, FEEDBACK_SECONDS_DEFAULT};
pub use input::{InputAction, KeyPress};
pub use lifecycle::{LifecycleState, SceneError, SceneFactory, SceneLifecycle};
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use narrative::{
    NoteOverlay, NOTE_AUTO_DISMISS_SECONDS, NOTE_START_DELAY_SECONDS, TYPEWRITER_SECONDS_PER_CHAR,
};
pub use rendering::{screen_to_world_px, world_to_screen_px, Renderer, Viewport, PIXELS_PER_WORLD};
pub use scene::{
    Camera, ControlState, Entity, EntityDesc, EntityId, EntityKind, InputSnapshot, Scene,
    SceneCommand, SceneWorld, Transform, Vec3,
};
pub use sequence::SequenceRunner;
