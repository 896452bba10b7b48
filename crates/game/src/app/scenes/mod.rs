use std::path::PathBuf;

use escape_engine::{
    AppPaths, AssetResolver, EntityDesc, EntityId, EntityKind, SceneLifecycle, SceneWorld,
    Transform,
};

use super::layout::LevelLayout;

mod cell;
mod clinic;
mod trauma;
mod vault;
mod yard;

pub(crate) use cell::CellScene;
pub(crate) use clinic::ClinicScene;
pub(crate) use trauma::TraumaScene;
pub(crate) use vault::VaultScene;
pub(crate) use yard::YardScene;

pub(crate) const CLINIC: &str = "clinic";
pub(crate) const CELL: &str = "cell";
pub(crate) const YARD: &str = "yard";
pub(crate) const TRAUMA: &str = "trauma";
pub(crate) const VAULT: &str = "vault";

pub(crate) const DEFAULT_START_SCENE: &str = CLINIC;
pub(crate) const LEVEL_ERROR_BANNER: &str = "Error loading level";
pub(crate) const LEVEL_ERROR_SECONDS: f32 = 4.0;

/// Directories a scene reads from while it sets itself up.
#[derive(Debug, Clone)]
pub(crate) struct SceneResources {
    pub(crate) levels_dir: PathBuf,
    pub(crate) assets_dir: PathBuf,
}

impl SceneResources {
    pub(crate) fn from_paths(paths: &AppPaths) -> Self {
        Self {
            levels_dir: paths.levels_dir.clone(),
            assets_dir: paths.assets_dir.clone(),
        }
    }

    pub(crate) fn asset_resolver(&self) -> AssetResolver {
        AssetResolver::new(Some(self.assets_dir.clone()))
    }
}

pub(crate) fn register_all(lifecycle: &mut SceneLifecycle, resources: &SceneResources) {
    let shared = resources.clone();
    lifecycle.register(CLINIC, move || Box::new(ClinicScene::new(shared.clone())));
    let shared = resources.clone();
    lifecycle.register(CELL, move || Box::new(CellScene::new(shared.clone())));
    let shared = resources.clone();
    lifecycle.register(YARD, move || Box::new(YardScene::new(shared.clone())));
    let shared = resources.clone();
    lifecycle.register(TRAUMA, move || Box::new(TraumaScene::new(shared.clone())));
    let shared = resources.clone();
    lifecycle.register(VAULT, move || Box::new(VaultScene::new(shared.clone())));
}

pub(crate) fn spawn_walls(world: &mut SceneWorld, layout: &LevelLayout) -> usize {
    let walls = layout.wall_positions();
    for position in &walls {
        world.spawn(EntityDesc::new("wall", EntityKind::Wall), Transform::at(*position));
    }
    walls.len()
}

/// Spawns an entity whose model is the first candidate found under the
/// assets directory, or the kind's primitive.
pub(crate) fn spawn_model(
    world: &mut SceneWorld,
    assets: &mut AssetResolver,
    name: &str,
    kind: EntityKind,
    transform: Transform,
    candidates: &[&str],
) -> EntityId {
    let model = assets.resolve(name, candidates, kind.default_primitive());
    world.spawn(EntityDesc::new(name, kind).with_model(model), transform)
}

pub(crate) fn debug_title(scene: &str, world: &SceneWorld) -> Option<String> {
    Some(format!("{scene} | entities: {}", world.entity_count()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use escape_engine::{paths_for_root, InputAction, InputSnapshot, Scene, SceneCommand, SceneWorld};

    use super::SceneResources;

    pub(crate) const TICK: f32 = 1.0 / 60.0;

    pub(crate) fn detached_resources() -> SceneResources {
        SceneResources::from_paths(&paths_for_root(PathBuf::from("escape-test-missing-root")))
    }

    pub(crate) fn idle() -> InputSnapshot {
        InputSnapshot::empty()
    }

    pub(crate) fn forward() -> InputSnapshot {
        InputSnapshot::empty().with_action_down(InputAction::MoveForward, true)
    }

    /// One frame with the interact key held, then one with it released.
    pub(crate) fn press_interact(scene: &mut dyn Scene, world: &mut SceneWorld) -> SceneCommand {
        let command = scene.update(TICK, &InputSnapshot::empty().with_interact_down(true), world);
        world.apply_pending();
        if !command.is_none() {
            return command;
        }
        let command = scene.update(TICK, &idle(), world);
        world.apply_pending();
        command
    }

    /// Idle frames until a command other than `None` comes back.
    pub(crate) fn run_until_command(
        scene: &mut dyn Scene,
        world: &mut SceneWorld,
        seconds: f32,
    ) -> SceneCommand {
        let frames = (seconds / TICK).ceil() as usize;
        for _ in 0..frames {
            let command = scene.update(TICK, &idle(), world);
            world.apply_pending();
            if !command.is_none() {
                return command;
            }
        }
        SceneCommand::None
    }

    pub(crate) fn run_for(scene: &mut dyn Scene, world: &mut SceneWorld, seconds: f32) {
        let frames = (seconds / TICK).ceil() as usize;
        for _ in 0..frames {
            scene.update(TICK, &idle(), world);
            world.apply_pending();
        }
    }
}
