pub const FEEDBACK_SECONDS_DEFAULT: f32 = 1.2;

#[derive(Debug, Clone, PartialEq)]
pub struct TimedMessage {
    pub text: String,
    pub remaining_seconds: f32,
}

impl TimedMessage {
    fn new(text: impl Into<String>, seconds: f32) -> Self {
        Self {
            text: text.into(),
            remaining_seconds: seconds.max(0.0),
        }
    }
}

/// Write-only projection of what the player should see this frame.
#[derive(Debug, Clone, Default)]
pub struct HudState {
    prompt: Vec<String>,
    progress: Option<(usize, usize)>,
    feedback: Option<TimedMessage>,
    banner: Option<TimedMessage>,
    status: Option<String>,
    center: Option<String>,
}

impl HudState {
    pub fn set_prompt(&mut self, lines: Vec<String>) {
        self.prompt = lines;
    }

    pub fn clear_prompt(&mut self) {
        self.prompt.clear();
    }

    pub fn prompt_lines(&self) -> &[String] {
        &self.prompt
    }

    pub fn set_progress(&mut self, done: usize, total: usize) {
        self.progress = Some((done, total));
    }

    pub fn progress_text(&self) -> Option<String> {
        self.progress
            .map(|(done, total)| format!("Progress: {done}/{total}"))
    }

    pub fn show_feedback(&mut self, text: impl Into<String>) {
        self.show_feedback_for(text, FEEDBACK_SECONDS_DEFAULT);
    }

    pub fn show_feedback_for(&mut self, text: impl Into<String>, seconds: f32) {
        self.feedback = Some(TimedMessage::new(text, seconds));
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_ref().map(|message| message.text.as_str())
    }

    pub fn show_banner(&mut self, text: impl Into<String>, seconds: f32) {
        self.banner = Some(TimedMessage::new(text, seconds));
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_ref().map(|message| message.text.as_str())
    }

    pub fn set_status(&mut self, status: Option<String>) {
        self.status = status;
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_center(&mut self, center: Option<String>) {
        self.center = center;
    }

    pub fn center(&self) -> Option<&str> {
        self.center.as_deref()
    }

    pub fn tick(&mut self, dt_seconds: f32) {
        for slot in [&mut self.feedback, &mut self.banner] {
            let expired = slot.as_mut().is_some_and(|message| {
                message.remaining_seconds -= dt_seconds;
                message.remaining_seconds <= 0.0
            });
            if expired {
                *slot = None;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Single-line rendering used for the window title.
    pub fn title_line(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(center) = self.center() {
            parts.push(center.to_string());
        }
        if let Some(banner) = self.banner() {
            parts.push(banner.to_string());
        }
        if let Some(feedback) = self.feedback() {
            parts.push(feedback.to_string());
        }
        parts.extend(self.prompt.iter().cloned());
        if let Some(progress) = self.progress_text() {
            parts.push(progress);
        }
        if let Some(status) = self.status() {
            parts.push(status.to_string());
        }
        parts.join(" | ")
    }
}
