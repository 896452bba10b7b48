use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod interaction;

pub use app::{
    resolve_model, run_app, screen_to_world_px, world_to_screen_px, AppError, AssetResolver,
    Camera, ControlState, Entity, EntityDesc, EntityId, EntityKind, FadeController,
    FadeDirection, FadePhase, HudState, InputAction, InputSnapshot, KeyPress, LifecycleState,
    LoopConfig, ModelChoice, NoteOverlay, Primitive, Renderer, Scene, SceneCommand, SceneError,
    SceneFactory, SceneLifecycle, SceneWorld, SequenceRunner, TimedMessage, Transform, Vec3,
    Viewport, FEEDBACK_SECONDS_DEFAULT, PIXELS_PER_WORLD, SLOW_FRAME_ENV_VAR,
};
pub use interaction::{
    BreakableWall, CodeLock, DeliveryTarget, Door, DoorState, ExitAttempt, ExitBeat, ExitDoor,
    ExitSequence, FlavorProp, GameState, HandwashStation, Hinge, InteractCategory,
    Interactable, InteractionContext, InteractionDispatcher, InteractionEvent,
    InteractionOutcome, ItemPickup, KeySource, KeypadOutcome, MovableProp, PropEffect,
    PropHandle, PropSet, ProximityResolver, ProximityTarget, SlidingDoor, SupplySource, Task,
    TaskGraph, TaskGraphError, TreatmentStation, UnresolvedPrerequisite, DEFAULT_PRIORITY,
};

pub const ROOT_ENV_VAR: &str = "ESCAPE_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub levels_dir: PathBuf,
    pub assets_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "ESCAPE_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or levels/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or levels/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/escape-rooms\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(paths_for_root(root))
}

pub fn paths_for_root(root: PathBuf) -> AppPaths {
    let levels_dir = root.join("levels");
    let assets_dir = root.join("assets");
    AppPaths {
        root,
        levels_dir,
        assets_dir,
    }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_levels = path.join("levels").is_dir();

    cargo_toml && (has_crates || has_levels)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let cwd = env::current_dir().expect("cwd");
        assert!(!is_repo_marker(&cwd.join("definitely_not_a_marker")));
    }

    #[test]
    fn repo_marker_accepts_cargo_toml_with_levels_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Cargo.toml"), "[workspace]\n").expect("write");
        assert!(!is_repo_marker(dir.path()));

        fs::create_dir(dir.path().join("levels")).expect("mkdir");
        assert!(is_repo_marker(dir.path()));
    }

    #[test]
    fn paths_for_root_joins_levels_and_assets() {
        let paths = paths_for_root(PathBuf::from("/tmp/escape"));
        assert_eq!(paths.levels_dir, PathBuf::from("/tmp/escape/levels"));
        assert_eq!(paths.assets_dir, PathBuf::from("/tmp/escape/assets"));
    }
}
