use std::path::Path;

use escape_engine::{
    EntityId, GameState, HudState, InteractionContext, InteractionDispatcher, InteractionEvent,
    InteractionOutcome, KeyPress, KeypadOutcome, PropSet, ProximityResolver, ProximityTarget,
    SceneWorld, TaskGraph, Vec3,
};
use tracing::{info, warn};

use crate::app::overrides::load_title_overrides;

const INTERACT_KEY_LABEL: &str = "E";
const OVERRIDES_ERROR_SECONDS: f32 = 4.0;

/// Interaction subsystems owned by one scene: flags, tasks, HUD, props and
/// the per-frame resolver/dispatcher pair.
#[derive(Debug, Default)]
pub(crate) struct Room {
    pub(crate) state: GameState,
    pub(crate) tasks: TaskGraph,
    pub(crate) hud: HudState,
    pub(crate) props: PropSet,
    resolver: ProximityResolver,
    dispatcher: InteractionDispatcher,
    target: Option<ProximityTarget>,
    events: Vec<InteractionEvent>,
}

impl Room {
    pub(crate) fn new(tasks: TaskGraph) -> Self {
        let mut room = Self {
            tasks,
            ..Self::default()
        };
        room.sync_progress();
        room
    }

    pub(crate) fn sync_progress(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let (done, total) = self.tasks.progress();
        self.hud.set_progress(done, total);
    }

    /// Applies `<levels>/<scene>.titles.json` when present. Failures leave the
    /// default titles and surface a message instead.
    pub(crate) fn apply_title_overrides(&mut self, levels_dir: &Path, scene: &str) {
        match load_title_overrides(levels_dir, scene) {
            Ok(Some(overrides)) => {
                let applied = self.tasks.apply_title_overrides(&overrides.tasks);
                info!(scene, applied, "title_overrides_applied");
            }
            Ok(None) => {}
            Err(error) => {
                warn!(scene, error = %error, "title_overrides_failed");
                self.hud
                    .show_banner("Error loading level", OVERRIDES_ERROR_SECONDS);
            }
        }
    }

    pub(crate) fn target(&self) -> Option<&ProximityTarget> {
        self.target.as_ref()
    }

    pub(crate) fn highlighted(&self) -> Option<EntityId> {
        self.target.as_ref().map(|target| target.entity)
    }

    /// Proximity resolution, interaction dispatch, prop animation, then HUD
    /// expiry. Returns the outcome of an interaction that fired this frame.
    pub(crate) fn step(
        &mut self,
        dt_seconds: f32,
        player: Vec3,
        interact_down: bool,
        world: &mut SceneWorld,
    ) -> Option<InteractionOutcome> {
        self.target = if self.state.interaction_blocked() {
            None
        } else {
            self.resolver
                .resolve(player, &self.props, &self.tasks, &self.state)
        };

        let mut ctx = InteractionContext {
            state: &mut self.state,
            tasks: &mut self.tasks,
            hud: &mut self.hud,
            world: &mut *world,
            events: &mut self.events,
        };
        let outcome = self.dispatcher.dispatch(
            self.target.as_ref(),
            interact_down,
            &mut self.props,
            &mut ctx,
        );
        if outcome.is_some() {
            self.target = self
                .resolver
                .resolve(player, &self.props, &self.tasks, &self.state);
        }

        self.props.tick(dt_seconds, world);
        self.hud.tick(dt_seconds);
        self.refresh_prompt();
        outcome
    }

    pub(crate) fn route_key(&mut self, key: KeyPress, world: &mut SceneWorld) -> Option<KeypadOutcome> {
        let mut ctx = InteractionContext {
            state: &mut self.state,
            tasks: &mut self.tasks,
            hud: &mut self.hud,
            world,
            events: &mut self.events,
        };
        self.dispatcher.route_key(key, &mut self.props, &mut ctx)
    }

    pub(crate) fn take_events(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.events)
    }

    fn refresh_prompt(&mut self) {
        if self.state.modal.is_some() {
            return;
        }
        match &self.target {
            Some(target) => self
                .hud
                .set_prompt(vec![format!("{INTERACT_KEY_LABEL} - {}", target.label)]),
            None => self.hud.clear_prompt(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.props.clear();
        self.state.reset();
        self.hud.clear();
        self.target = None;
        self.events.clear();
        self.dispatcher = InteractionDispatcher::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escape_engine::{
        EntityDesc, EntityKind, HandwashStation, InteractCategory, Interactable, PropHandle, Task,
        Transform,
    };

    fn sink_room(world: &mut SceneWorld) -> Room {
        let tasks = TaskGraph::new(vec![Task::new("wash", "Wash hands")]).expect("graph");
        let mut room = Room::new(tasks);
        let sink = world.spawn(EntityDesc::new("sink", EntityKind::Prop), Transform::default());
        room.props.push(Interactable::new(
            PropHandle::new(sink, Vec3::ZERO, "Wash hands", 3.2, InteractCategory::TaskProp)
                .with_task("wash"),
            HandwashStation::new("wash"),
        ));
        room
    }

    #[test]
    fn prompt_follows_target_and_clears_after_completion() {
        let mut world = SceneWorld::default();
        let mut room = sink_room(&mut world);
        assert_eq!(room.hud.progress_text().as_deref(), Some("Progress: 0/1"));

        room.step(0.016, Vec3::new(10.0, 0.0, 0.0), false, &mut world);
        assert!(room.hud.prompt_lines().is_empty());

        room.step(0.016, Vec3::new(1.0, 0.0, 0.0), false, &mut world);
        assert_eq!(room.hud.prompt_lines(), ["E - Wash hands".to_string()]);

        let outcome = room.step(0.016, Vec3::new(1.0, 0.0, 0.0), true, &mut world);
        assert_eq!(outcome, Some(InteractionOutcome::TaskCompleted("wash".to_string())));
        assert!(room.hud.prompt_lines().is_empty());
        assert_eq!(room.hud.progress_text().as_deref(), Some("Progress: 1/1"));
        assert_eq!(
            room.take_events(),
            vec![InteractionEvent::TaskCompleted("wash".to_string())]
        );
    }

    #[test]
    fn bad_override_file_keeps_titles_and_shows_banner() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("clinic.titles.json"), "{ not json").expect("write");
        let mut world = SceneWorld::default();
        let mut room = sink_room(&mut world);

        room.apply_title_overrides(dir.path(), "clinic");
        assert_eq!(room.tasks.get("wash").map(|task| task.title()), Some("Wash hands"));
        assert_eq!(room.hud.banner(), Some("Error loading level"));
    }

    #[test]
    fn override_file_renames_tasks() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("clinic.titles.json"),
            r#"{ "tasks": { "wash": "Scrub in" } }"#,
        )
        .expect("write");
        let mut world = SceneWorld::default();
        let mut room = sink_room(&mut world);

        room.apply_title_overrides(dir.path(), "clinic");
        assert_eq!(room.tasks.get("wash").map(|task| task.title()), Some("Scrub in"));
    }
}
