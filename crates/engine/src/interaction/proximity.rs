use crate::app::{EntityId, Vec3};

use super::prop::{InteractCategory, PropSet, DEFAULT_PRIORITY};
use super::state::GameState;
use super::tasks::TaskGraph;

#[derive(Debug, Clone, PartialEq)]
pub struct ProximityTarget {
    pub index: usize,
    pub entity: EntityId,
    pub category: InteractCategory,
    pub label: String,
    pub distance: f32,
}

/// Picks the single actionable interactable for this frame.
///
/// Categories are scanned in priority order and the first category with a
/// hit ends the scan. Doors resolve to the first in-range door in insertion
/// order; task props only qualify when bound to the next incomplete task;
/// generic props resolve to the nearest in range.
#[derive(Debug, Clone)]
pub struct ProximityResolver {
    priority: Vec<InteractCategory>,
}

impl Default for ProximityResolver {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY.to_vec(),
        }
    }
}

impl ProximityResolver {
    pub fn with_priority(priority: Vec<InteractCategory>) -> Self {
        Self { priority }
    }

    pub fn resolve(
        &self,
        player: Vec3,
        props: &PropSet,
        tasks: &TaskGraph,
        state: &GameState,
    ) -> Option<ProximityTarget> {
        let next_task = tasks.next_incomplete().map(|task| task.id());

        for category in &self.priority {
            let mut candidates = props
                .iter()
                .enumerate()
                .filter(|(_, prop)| prop.handle.category == *category)
                .filter(|(_, prop)| match category {
                    InteractCategory::TaskProp => match prop.handle.task.as_deref() {
                        Some(task) => Some(task) == next_task,
                        None => true,
                    },
                    _ => true,
                })
                .filter_map(|(index, prop)| {
                    prop.handle
                        .distance_if_in_range(player)
                        .map(|distance| (index, prop, distance))
                });

            let hit = match category {
                InteractCategory::Door => candidates.next(),
                _ => candidates.min_by(|a, b| a.2.total_cmp(&b.2)),
            };

            if let Some((index, prop, distance)) = hit {
                return Some(ProximityTarget {
                    index,
                    entity: prop.handle.entity,
                    category: *category,
                    label: prop.label(state),
                    distance,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{HudState, SceneWorld};
    use crate::interaction::effects::{FlavorProp, HandwashStation};
    use crate::interaction::{Door, Hinge, Interactable, PropHandle, Task};

    fn clinic_tasks() -> TaskGraph {
        TaskGraph::new(vec![
            Task::new("wash", "Wash hands"),
            Task::new("pickup", "Pick up medication").requires(["wash"]),
        ])
        .expect("graph")
    }

    fn sink_at(x: f32) -> Interactable {
        Interactable::new(
            PropHandle::new(
                EntityId(1),
                Vec3::new(x, 0.0, 0.0),
                "Wash hands",
                3.2,
                InteractCategory::TaskProp,
            )
            .with_task("wash"),
            HandwashStation::new("wash"),
        )
    }

    #[test]
    fn sink_out_of_range_then_in_range() {
        let mut props = PropSet::default();
        props.push(sink_at(0.0));
        let tasks = clinic_tasks();
        let state = GameState::default();
        let resolver = ProximityResolver::default();

        assert_eq!(
            resolver.resolve(Vec3::new(3.5, 0.0, 0.0), &props, &tasks, &state),
            None
        );
        let target = resolver
            .resolve(Vec3::new(3.0, 1.7, 0.0), &props, &tasks, &state)
            .expect("sink in range");
        assert_eq!(target.entity, EntityId(1));
        assert_eq!(target.label, "Wash hands");
    }

    #[test]
    fn resolved_target_is_never_beyond_its_distance() {
        let mut props = PropSet::default();
        for (index, range) in [1.0_f32, 2.0, 2.6, 3.2].into_iter().enumerate() {
            props.push(Interactable::new(
                PropHandle::new(
                    EntityId(index as u64),
                    Vec3::new(index as f32 * 1.5, 0.0, 0.0),
                    "look",
                    range,
                    InteractCategory::Prop,
                ),
                FlavorProp::new(["..."]),
            ));
        }
        let tasks = TaskGraph::default();
        let state = GameState::default();
        let resolver = ProximityResolver::default();

        for step in 0..80 {
            let player = Vec3::new(-2.0 + step as f32 * 0.15, 0.0, 0.7);
            if let Some(target) = resolver.resolve(player, &props, &tasks, &state) {
                let prop = props.get(target.index).expect("prop");
                assert!(prop.handle.position.horizontal_distance(player) <= prop.handle.interact_distance);
            }
        }
    }

    #[test]
    fn only_prop_for_next_incomplete_task_is_eligible() {
        let mut props = PropSet::default();
        props.push(Interactable::new(
            PropHandle::new(
                EntityId(7),
                Vec3::ZERO,
                "Pick up medication",
                2.6,
                InteractCategory::TaskProp,
            )
            .with_task("pickup"),
            FlavorProp::new(["cart"]),
        ));
        let mut tasks = clinic_tasks();
        let state = GameState::default();
        let resolver = ProximityResolver::default();

        assert_eq!(resolver.resolve(Vec3::ZERO, &props, &tasks, &state), None);
        tasks.complete("wash");
        assert_eq!(
            resolver
                .resolve(Vec3::ZERO, &props, &tasks, &state)
                .map(|target| target.entity),
            Some(EntityId(7))
        );
    }

    #[test]
    fn first_door_in_range_wins_over_closer_props() {
        let mut world = SceneWorld::default();
        let mut props = PropSet::default();
        props.push(Interactable::new(
            PropHandle::new(EntityId(1), Vec3::new(0.5, 0.0, 0.0), "poster", 2.0, InteractCategory::Prop),
            FlavorProp::new(["A poster."]),
        ));
        for (id, x) in [(2, 2.0_f32), (3, 1.0)] {
            props.push(Interactable::new(
                PropHandle::new(EntityId(id), Vec3::new(x, 0.0, 0.0), "Open door", 2.4, InteractCategory::Door),
                Door::new(Hinge::Left, 0.0),
            ));
        }
        let tasks = TaskGraph::default();
        let state = GameState::default();
        let resolver = ProximityResolver::default();

        let target = resolver
            .resolve(Vec3::ZERO, &props, &tasks, &state)
            .expect("door");
        assert_eq!(target.entity, EntityId(2));
        assert_eq!(target.category, InteractCategory::Door);

        let mut hud = HudState::default();
        let mut tasks = tasks;
        let mut state = state;
        let mut events = Vec::new();
        let mut ctx = crate::interaction::InteractionContext {
            state: &mut state,
            tasks: &mut tasks,
            hud: &mut hud,
            world: &mut world,
            events: &mut events,
        };
        props.get_mut(target.index).expect("door").interact(&mut ctx);
        let relabeled = resolver
            .resolve(Vec3::ZERO, &props, ctx.tasks, ctx.state)
            .expect("door");
        assert_eq!(relabeled.label, "Close door");
    }

    #[test]
    fn generic_props_pick_nearest() {
        let mut props = PropSet::default();
        for (id, x) in [(1, 1.5_f32), (2, 0.5), (3, 1.0)] {
            props.push(Interactable::new(
                PropHandle::new(EntityId(id), Vec3::new(x, 0.0, 0.0), "look", 1.9, InteractCategory::Prop),
                FlavorProp::new(["..."]),
            ));
        }
        let target = ProximityResolver::default()
            .resolve(Vec3::ZERO, &props, &TaskGraph::default(), &GameState::default())
            .expect("prop");
        assert_eq!(target.entity, EntityId(2));
    }
}
