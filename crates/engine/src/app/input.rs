#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    Sprint,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Sprint => 4,
        }
    }
}

/// Discrete key-press events delivered once per physical press.
///
/// Modal text entry (the keypad) and one-shot commands (restart, cancel)
/// consume these; the interact key is additionally exposed as held state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPress {
    Digit(u8),
    Backspace,
    Confirm,
    Cancel,
    Restart,
    Interact,
    Other,
}

impl KeyPress {
    pub fn digit(value: u8) -> Option<Self> {
        (value <= 9).then_some(KeyPress::Digit(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_states_track_each_action_independently() {
        let mut states = ActionStates::default();
        states.set(InputAction::MoveForward, true);
        states.set(InputAction::Sprint, true);
        states.set(InputAction::Sprint, false);

        assert!(states.is_down(InputAction::MoveForward));
        assert!(!states.is_down(InputAction::Sprint));
        assert!(!states.is_down(InputAction::MoveBack));
    }

    #[test]
    fn digit_constructor_rejects_out_of_range() {
        assert_eq!(KeyPress::digit(7), Some(KeyPress::Digit(7)));
        assert_eq!(KeyPress::digit(10), None);
    }
}
