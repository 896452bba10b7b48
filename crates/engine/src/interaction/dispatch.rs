use tracing::debug;

use crate::app::KeyPress;

use super::keypad::KeypadOutcome;
use super::prop::{InteractionContext, InteractionEvent, InteractionOutcome, PropSet};
use super::proximity::ProximityTarget;

/// Turns the held interact key into single presses and routes them to the
/// resolved target.
///
/// The only state kept across frames is whether the key is still held. Every
/// press edge latches, including one swallowed by a blocked state or an empty
/// target, so a key held through a fade never fires when the fade ends.
#[derive(Debug, Clone, Default)]
pub struct InteractionDispatcher {
    pressing: bool,
}

impl InteractionDispatcher {
    pub fn is_pressing(&self) -> bool {
        self.pressing
    }

    pub fn dispatch(
        &mut self,
        target: Option<&ProximityTarget>,
        interact_down: bool,
        props: &mut PropSet,
        ctx: &mut InteractionContext<'_>,
    ) -> Option<InteractionOutcome> {
        if !interact_down {
            self.pressing = false;
            return None;
        }
        if self.pressing {
            return None;
        }
        self.pressing = true;
        if ctx.state.interaction_blocked() {
            debug!(
                modal = ctx.state.modal.is_some(),
                fading = ctx.state.is_fading,
                game_over = ctx.state.game_over,
                "interaction_blocked"
            );
            return None;
        }

        let target = target?;
        let prop = props.get_mut(target.index)?;
        if !prop.handle.enabled {
            return None;
        }

        let first_event = ctx.events.len();
        let outcome = prop.interact(ctx);
        debug!(
            entity = target.entity.0,
            label = %target.label,
            outcome = ?outcome,
            "interaction_dispatched"
        );
        apply_unlocks(props, ctx, first_event);
        Some(outcome)
    }

    /// Sends a discrete key to the prop whose modal currently owns input.
    pub fn route_key(
        &mut self,
        key: KeyPress,
        props: &mut PropSet,
        ctx: &mut InteractionContext<'_>,
    ) -> Option<KeypadOutcome> {
        let modal = ctx.state.modal?;
        let Some(prop) = props.find_mut(modal) else {
            debug!(entity = modal.0, "modal_owner_missing");
            ctx.state.modal = None;
            ctx.world.set_controls_locked(false);
            return None;
        };
        let first_event = ctx.events.len();
        let outcome = prop.modal_key(key, ctx);
        apply_unlocks(props, ctx, first_event);
        outcome
    }
}

fn apply_unlocks(props: &mut PropSet, ctx: &mut InteractionContext<'_>, first_event: usize) {
    for event in ctx.events.iter().skip(first_event) {
        if let InteractionEvent::UnlockDoor(door) = event {
            if props.unlock(*door, ctx.world) {
                debug!(entity = door.0, "door_unlocked");
            }
        }
    }
}
