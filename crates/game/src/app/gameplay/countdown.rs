pub(crate) const TRAUMA_COUNTDOWN_SECONDS: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CountdownTick {
    Running,
    Expired,
    Idle,
}

/// Level timer shown as whole seconds, rounded up.
#[derive(Debug, Clone)]
pub(crate) struct Countdown {
    duration_seconds: f32,
    remaining_seconds: f32,
    running: bool,
}

impl Countdown {
    pub(crate) fn new(duration_seconds: f32) -> Self {
        let duration_seconds = duration_seconds.max(0.0);
        Self {
            duration_seconds,
            remaining_seconds: duration_seconds,
            running: true,
        }
    }

    pub(crate) fn remaining_seconds(&self) -> f32 {
        self.remaining_seconds
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn stop(&mut self) {
        self.running = false;
    }

    pub(crate) fn restart(&mut self) {
        self.remaining_seconds = self.duration_seconds;
        self.running = true;
    }

    /// Reports `Expired` exactly once, on the tick that reaches zero.
    pub(crate) fn tick(&mut self, dt_seconds: f32) -> CountdownTick {
        if !self.running {
            return CountdownTick::Idle;
        }
        self.remaining_seconds = (self.remaining_seconds - dt_seconds.max(0.0)).max(0.0);
        if self.remaining_seconds <= 0.0 {
            self.running = false;
            return CountdownTick::Expired;
        }
        CountdownTick::Running
    }

    pub(crate) fn display(&self) -> String {
        format!("Time: {}s", self.remaining_seconds.ceil() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_rounds_up() {
        let mut countdown = Countdown::new(30.0);
        assert_eq!(countdown.display(), "Time: 30s");
        countdown.tick(0.25);
        assert_eq!(countdown.display(), "Time: 30s");
        countdown.tick(1.0);
        assert_eq!(countdown.display(), "Time: 29s");
    }

    #[test]
    fn expires_once() {
        let mut countdown = Countdown::new(1.0);
        let ticks: Vec<_> = (0..4).map(|_| countdown.tick(0.5)).collect();
        assert_eq!(
            ticks,
            vec![
                CountdownTick::Running,
                CountdownTick::Expired,
                CountdownTick::Idle,
                CountdownTick::Idle
            ]
        );
        assert_eq!(countdown.display(), "Time: 0s");
    }

    #[test]
    fn stopped_timer_never_expires() {
        let mut countdown = Countdown::new(1.0);
        countdown.stop();
        assert_eq!(countdown.tick(5.0), CountdownTick::Idle);
        countdown.restart();
        assert!(countdown.is_running());
        assert_eq!(countdown.remaining_seconds(), 1.0);
    }
}
