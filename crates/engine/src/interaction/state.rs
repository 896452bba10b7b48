use std::collections::BTreeSet;

use crate::app::EntityId;

/// Per-scene gameplay flags. Owned by the active scene and rebuilt on reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    pub holding_item: bool,
    pub has_key: bool,
    pub treatment_applied: bool,
    pub exit_unlocked: bool,
    pub collected: BTreeSet<String>,
    pub level_completed: bool,
    pub is_fading: bool,
    pub injured: bool,
    pub game_over: bool,
    /// Entity whose modal (keypad) currently owns input.
    pub modal: Option<EntityId>,
}

impl GameState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn interaction_blocked(&self) -> bool {
        self.modal.is_some() || self.is_fading || self.game_over
    }

    pub fn collect(&mut self, item: impl Into<String>) -> bool {
        self.collected.insert(item.into())
    }

    pub fn missing_items<S: AsRef<str>>(&self, required: &[S]) -> Vec<String> {
        required
            .iter()
            .map(|item| -> &str { item.as_ref() })
            .filter(|item| !self.collected.contains(*item))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_items_preserves_required_order() {
        let mut state = GameState::default();
        state.collect("gauze");
        assert_eq!(
            state.missing_items(&["tourniquet", "gauze", "scissors"]),
            vec!["tourniquet".to_string(), "scissors".to_string()]
        );
    }

    #[test]
    fn modal_fade_and_game_over_block_interaction() {
        let mut state = GameState::default();
        assert!(!state.interaction_blocked());
        state.modal = Some(EntityId(4));
        assert!(state.interaction_blocked());
        state.reset();
        state.is_fading = true;
        assert!(state.interaction_blocked());
        state.reset();
        state.game_over = true;
        assert!(state.interaction_blocked());
    }
}
