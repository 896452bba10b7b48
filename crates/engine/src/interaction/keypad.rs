use tracing::{debug, info};

use crate::app::{EntityId, KeyPress};

use super::prop::{
    InteractionContext, InteractionEvent, InteractionOutcome, PropEffect, PropHandle,
};
use super::state::GameState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeypadOutcome {
    Edited(String),
    Solved,
    Mismatch,
    Closed,
    Ignored,
}

/// Numeric code lock with a modal entry pad.
///
/// While the pad is open it owns input: the player cannot move and proximity
/// interaction is suspended. A correct code unlocks the paired door.
#[derive(Debug, Clone)]
pub struct CodeLock {
    expected: Vec<u8>,
    buffer: Vec<u8>,
    solved: bool,
    modal_open: bool,
    paired_door: Option<EntityId>,
}

impl CodeLock {
    pub fn new(expected: &[u8]) -> Self {
        Self {
            expected: expected.to_vec(),
            buffer: Vec::new(),
            solved: false,
            modal_open: false,
            paired_door: None,
        }
    }

    pub fn paired_with(mut self, door: EntityId) -> Self {
        self.paired_door = Some(door);
        self
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn is_open(&self) -> bool {
        self.modal_open
    }

    pub fn display(&self) -> String {
        self.buffer.iter().map(|digit| char::from(b'0' + digit)).collect()
    }

    fn max_len(&self) -> usize {
        self.expected.len().max(1)
    }

    fn close(&mut self, ctx: &mut InteractionContext<'_>) {
        self.modal_open = false;
        ctx.state.modal = None;
        ctx.world.set_controls_locked(false);
    }
}

impl PropEffect for CodeLock {
    fn interact(
        &mut self,
        handle: &mut PropHandle,
        ctx: &mut InteractionContext<'_>,
    ) -> InteractionOutcome {
        if self.solved {
            ctx.hud.show_feedback("The keypad is already unlocked.");
            return InteractionOutcome::AlreadySolved;
        }
        self.buffer.clear();
        self.modal_open = true;
        ctx.state.modal = Some(handle.entity);
        ctx.world.set_controls_locked(true);
        InteractionOutcome::ModalOpened
    }

    fn action_label(&self, handle: &PropHandle, _state: &GameState) -> String {
        if self.solved {
            "Keypad (unlocked)".to_string()
        } else {
            handle.prompt.clone()
        }
    }

    fn modal_key(
        &mut self,
        handle: &mut PropHandle,
        key: KeyPress,
        ctx: &mut InteractionContext<'_>,
    ) -> Option<KeypadOutcome> {
        if !self.modal_open {
            return None;
        }
        let outcome = match key {
            KeyPress::Digit(digit) => {
                if self.buffer.len() < self.max_len() {
                    self.buffer.push(digit);
                }
                KeypadOutcome::Edited(self.display())
            }
            KeyPress::Backspace => {
                self.buffer.pop();
                KeypadOutcome::Edited(self.display())
            }
            KeyPress::Confirm => {
                if self.buffer == self.expected {
                    self.solved = true;
                    self.buffer.clear();
                    self.close(ctx);
                    if let Some(door) = self.paired_door {
                        ctx.events.push(InteractionEvent::UnlockDoor(door));
                    }
                    ctx.hud.show_feedback("Access granted.");
                    info!(entity = handle.entity.0, "keypad_solved");
                    KeypadOutcome::Solved
                } else {
                    self.buffer.clear();
                    ctx.hud.show_feedback("Incorrect code");
                    debug!(entity = handle.entity.0, "keypad_mismatch");
                    KeypadOutcome::Mismatch
                }
            }
            KeyPress::Cancel => {
                self.buffer.clear();
                self.close(ctx);
                KeypadOutcome::Closed
            }
            KeyPress::Restart | KeyPress::Interact | KeyPress::Other => KeypadOutcome::Ignored,
        };
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{EntityDesc, EntityKind, HudState, SceneWorld, Transform, Vec3};
    use crate::interaction::{Door, Hinge, InteractCategory, Interactable, PropSet, TaskGraph};

    fn press_all(
        props: &mut PropSet,
        index: usize,
        keys: &[KeyPress],
        ctx: &mut InteractionContext<'_>,
    ) -> Vec<KeypadOutcome> {
        let prop = props.get_mut(index).expect("keypad");
        keys.iter()
            .filter_map(|key| prop.modal_key(*key, ctx))
            .collect()
    }

    #[test]
    fn wrong_code_clears_buffer_and_right_code_unlocks_paired_door() {
        let mut world = SceneWorld::default();
        let door_entity = world.spawn(EntityDesc::new("vault_door", EntityKind::Door), Transform::default());
        let pad_entity = world.spawn(EntityDesc::new("keypad", EntityKind::Prop), Transform::default());
        let mut props = PropSet::default();
        let door_index = props.push(Interactable::new(
            PropHandle::new(door_entity, Vec3::ZERO, "Open door", 2.4, InteractCategory::Door),
            Door::new(Hinge::Left, 0.0).locked(),
        ));
        let pad_index = props.push(Interactable::new(
            PropHandle::new(pad_entity, Vec3::ZERO, "Use keypad", 2.0, InteractCategory::Prop),
            CodeLock::new(&[7, 3, 1]).paired_with(door_entity),
        ));

        let mut state = GameState::default();
        let mut tasks = TaskGraph::default();
        let mut hud = HudState::default();
        let mut events = Vec::new();
        let mut ctx = InteractionContext {
            state: &mut state,
            tasks: &mut tasks,
            hud: &mut hud,
            world: &mut world,
            events: &mut events,
        };

        let opened = props.get_mut(pad_index).expect("keypad").interact(&mut ctx);
        assert_eq!(opened, InteractionOutcome::ModalOpened);
        assert_eq!(ctx.state.modal, Some(pad_entity));
        assert!(ctx.world.controls().movement_locked);

        let wrong = press_all(
            &mut props,
            pad_index,
            &[KeyPress::Digit(7), KeyPress::Digit(3), KeyPress::Digit(0), KeyPress::Confirm],
            &mut ctx,
        );
        assert_eq!(wrong.last(), Some(&KeypadOutcome::Mismatch));
        assert_eq!(ctx.hud.feedback(), Some("Incorrect code"));
        assert!(ctx.state.modal.is_some());

        let right = press_all(
            &mut props,
            pad_index,
            &[
                KeyPress::Digit(7),
                KeyPress::Digit(3),
                KeyPress::Digit(9),
                KeyPress::Backspace,
                KeyPress::Digit(1),
                KeyPress::Confirm,
            ],
            &mut ctx,
        );
        assert_eq!(right[2], KeypadOutcome::Edited("739".to_string()));
        assert_eq!(right[3], KeypadOutcome::Edited("73".to_string()));
        assert_eq!(right.last(), Some(&KeypadOutcome::Solved));
        assert_eq!(ctx.state.modal, None);
        assert!(!ctx.world.controls().movement_locked);
        assert_eq!(ctx.events.as_slice(), &[InteractionEvent::UnlockDoor(door_entity)]);

        assert!(props.unlock(door_entity, ctx.world));
        let door = props.get_mut(door_index).expect("door");
        assert_eq!(door.interact(&mut ctx), InteractionOutcome::DoorOpening);
    }

    #[test]
    fn digits_beyond_code_length_are_dropped() {
        let mut lock = CodeLock::new(&[1, 2]);
        let mut handle = PropHandle::new(EntityId(1), Vec3::ZERO, "Use keypad", 2.0, InteractCategory::Prop);
        let mut world = SceneWorld::default();
        let mut state = GameState::default();
        let mut tasks = TaskGraph::default();
        let mut hud = HudState::default();
        let mut events = Vec::new();
        let mut ctx = InteractionContext {
            state: &mut state,
            tasks: &mut tasks,
            hud: &mut hud,
            world: &mut world,
            events: &mut events,
        };

        assert_eq!(lock.modal_key(&mut handle, KeyPress::Digit(1), &mut ctx), None);
        lock.interact(&mut handle, &mut ctx);
        for digit in [1, 2, 3] {
            lock.modal_key(&mut handle, KeyPress::Digit(digit), &mut ctx);
        }
        assert_eq!(lock.display(), "12");
        assert_eq!(
            lock.modal_key(&mut handle, KeyPress::Cancel, &mut ctx),
            Some(KeypadOutcome::Closed)
        );
        assert!(!lock.is_open());
        assert_eq!(ctx.state.modal, None);
    }
}
