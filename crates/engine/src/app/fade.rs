use tracing::debug;

pub const MIN_FADE_SECONDS: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    ToOpaque,
    ToClear,
}

impl FadeDirection {
    pub fn sign(self) -> f32 {
        match self {
            FadeDirection::ToOpaque => 1.0,
            FadeDirection::ToClear => -1.0,
        }
    }

    fn target(self) -> f32 {
        match self {
            FadeDirection::ToOpaque => 1.0,
            FadeDirection::ToClear => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadePhase {
    Idle,
    Running(FadeDirection),
}

/// Single full-screen overlay whose opacity moves linearly toward 0 or 1.
///
/// The completion token is owned by the controller and handed back exactly
/// once when the bound is reached. Starting a fade while one is running is
/// ignored and the new token is dropped.
#[derive(Debug)]
pub struct FadeController<A> {
    opacity: f32,
    phase: FadePhase,
    duration_seconds: f32,
    on_complete: Option<A>,
}

impl<A> Default for FadeController<A> {
    fn default() -> Self {
        Self {
            opacity: 0.0,
            phase: FadePhase::Idle,
            duration_seconds: MIN_FADE_SECONDS,
            on_complete: None,
        }
    }
}

impl<A> FadeController<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = clamp_opacity(opacity);
        self
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn phase(&self) -> FadePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, FadePhase::Running(_))
    }

    pub fn start(
        &mut self,
        direction: FadeDirection,
        duration_seconds: f32,
        on_complete: Option<A>,
    ) -> bool {
        if self.is_running() {
            debug!(?direction, "fade_start_rejected");
            return false;
        }
        self.phase = FadePhase::Running(direction);
        self.duration_seconds = normalize_fade_duration(duration_seconds);
        self.on_complete = on_complete;
        true
    }

    pub fn fade_to_black(&mut self, duration_seconds: f32, on_complete: Option<A>) -> bool {
        self.start(FadeDirection::ToOpaque, duration_seconds, on_complete)
    }

    /// Fades from black. A fully clear overlay is first forced opaque so the
    /// fade is visible.
    pub fn fade_in(&mut self, duration_seconds: f32, on_complete: Option<A>) -> bool {
        if self.is_running() {
            debug!("fade_start_rejected");
            return false;
        }
        if self.opacity <= 0.0 {
            self.opacity = 1.0;
        }
        self.start(FadeDirection::ToClear, duration_seconds, on_complete)
    }

    pub fn update(&mut self, dt_seconds: f32) -> Option<A> {
        let FadePhase::Running(direction) = self.phase else {
            return None;
        };
        let dt = if dt_seconds.is_finite() {
            dt_seconds.max(0.0)
        } else {
            0.0
        };

        self.opacity =
            clamp_opacity(self.opacity + dt / self.duration_seconds * direction.sign());
        let reached = match direction {
            FadeDirection::ToOpaque => self.opacity >= 1.0,
            FadeDirection::ToClear => self.opacity <= 0.0,
        };
        if !reached {
            return None;
        }

        self.opacity = direction.target();
        self.phase = FadePhase::Idle;
        self.on_complete.take()
    }

    pub fn cancel(&mut self) {
        self.phase = FadePhase::Idle;
        self.on_complete = None;
    }
}

fn normalize_fade_duration(duration_seconds: f32) -> f32 {
    if duration_seconds.is_finite() {
        duration_seconds.max(MIN_FADE_SECONDS)
    } else {
        MIN_FADE_SECONDS
    }
}

fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_finite() {
        opacity.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
