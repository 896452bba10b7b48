use escape_engine::{paths_for_root, resolve_app_paths, AppPaths, LoopConfig, SceneLifecycle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::scenes::{self, SceneResources, DEFAULT_START_SCENE};

const START_SCENE_ENV_VAR: &str = "ESCAPE_START_SCENE";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) lifecycle: SceneLifecycle,
    pub(crate) start_scene: String,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Escape Rooms Startup ===");

    let paths = app_paths();
    info!(
        root = %paths.root.display(),
        levels = %paths.levels_dir.display(),
        "paths_resolved"
    );

    let resources = SceneResources::from_paths(&paths);
    let mut lifecycle = SceneLifecycle::new();
    scenes::register_all(&mut lifecycle, &resources);

    let start_scene = start_scene_from(std::env::var(START_SCENE_ENV_VAR).ok(), &lifecycle);
    AppWiring {
        config: LoopConfig::default(),
        lifecycle,
        start_scene,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn app_paths() -> AppPaths {
    match resolve_app_paths() {
        Ok(paths) => paths,
        Err(error) => {
            warn!(error = %error, "root_not_resolved_using_cwd");
            paths_for_root(std::env::current_dir().unwrap_or_default())
        }
    }
}

/// Unknown or blank names fall back to the first room so a typo in the
/// environment never blocks startup.
fn start_scene_from(raw: Option<String>, lifecycle: &SceneLifecycle) -> String {
    let Some(name) = raw.map(|value| value.trim().to_string()) else {
        return DEFAULT_START_SCENE.to_string();
    };
    if name.is_empty() {
        return DEFAULT_START_SCENE.to_string();
    }
    if !lifecycle.is_registered(&name) {
        warn!(
            env_var = START_SCENE_ENV_VAR,
            scene = %name,
            fallback = DEFAULT_START_SCENE,
            "unknown_start_scene"
        );
        return DEFAULT_START_SCENE.to_string();
    }
    name
}
