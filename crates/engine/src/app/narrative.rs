use super::input::KeyPress;

pub const TYPEWRITER_SECONDS_PER_CHAR: f32 = 0.05;
pub const NOTE_START_DELAY_SECONDS: f32 = 0.5;
pub const NOTE_AUTO_DISMISS_SECONDS: f32 = 15.0;

/// Intro note revealed one character at a time. Any key dismisses it.
#[derive(Debug, Clone, Default)]
pub struct NoteOverlay {
    text: Vec<char>,
    elapsed_seconds: f32,
    visible: bool,
}

impl NoteOverlay {
    pub fn show(&mut self, text: &str) {
        self.text = text.chars().collect();
        self.elapsed_seconds = 0.0;
        self.visible = true;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn tick(&mut self, dt_seconds: f32) {
        if !self.visible {
            return;
        }
        self.elapsed_seconds += dt_seconds.max(0.0);
        if self.elapsed_seconds >= NOTE_AUTO_DISMISS_SECONDS {
            self.dismiss();
        }
    }

    pub fn revealed_chars(&self) -> usize {
        if !self.visible {
            return 0;
        }
        let typing = (self.elapsed_seconds - NOTE_START_DELAY_SECONDS).max(0.0);
        let count = (typing / TYPEWRITER_SECONDS_PER_CHAR).floor() as usize;
        count.min(self.text.len())
    }

    pub fn visible_text(&self) -> String {
        self.text[..self.revealed_chars()].iter().collect()
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.visible && self.revealed_chars() == self.text.len()
    }

    /// Returns true when the key was consumed by the note.
    pub fn handle_key(&mut self, _key: KeyPress) -> bool {
        if !self.visible {
            return false;
        }
        self.dismiss();
        true
    }

    pub fn dismiss(&mut self) {
        self.visible = false;
        self.elapsed_seconds = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveal_waits_for_start_delay_then_types() {
        let mut note = NoteOverlay::default();
        note.show("Escape");
        note.tick(0.4);
        assert_eq!(note.visible_text(), "");
        note.tick(0.22);
        assert_eq!(note.visible_text(), "Es");
        note.tick(5.0);
        assert!(note.is_fully_revealed());
        assert_eq!(note.visible_text(), "Escape");
    }

    #[test]
    fn any_key_dismisses_and_is_consumed_once() {
        let mut note = NoteOverlay::default();
        note.show("Note");
        assert!(note.handle_key(KeyPress::Digit(3)));
        assert!(!note.is_visible());
        assert!(!note.handle_key(KeyPress::Interact));
    }

    #[test]
    fn auto_dismisses_after_timeout() {
        let mut note = NoteOverlay::default();
        note.show("Note");
        note.tick(14.9);
        assert!(note.is_visible());
        note.tick(0.2);
        assert!(!note.is_visible());
    }
}
