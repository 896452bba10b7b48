use std::collections::VecDeque;

use tracing::debug;

/// Non-blocking queue of timed actions consumed against accumulated frame time.
///
/// Steps are given as `(delay_from_prior_step, action)`. Each step fires once,
/// in order, on the first `advance` whose accumulated time reaches its
/// cumulative offset. A start request while a run is active is rejected.
#[derive(Debug)]
pub struct SequenceRunner<A> {
    steps: VecDeque<(f32, A)>,
    elapsed: f32,
    active: bool,
}

impl<A> Default for SequenceRunner<A> {
    fn default() -> Self {
        Self {
            steps: VecDeque::new(),
            elapsed: 0.0,
            active: false,
        }
    }
}

impl<A> SequenceRunner<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start<I>(&mut self, steps: I) -> bool
    where
        I: IntoIterator<Item = (f32, A)>,
    {
        if self.active {
            debug!(pending = self.steps.len(), "sequence_start_rejected");
            return false;
        }

        let mut offset = 0.0_f32;
        self.steps = steps
            .into_iter()
            .map(|(delay, action)| {
                offset += sanitize_delay(delay);
                (offset, action)
            })
            .collect();
        self.elapsed = 0.0;
        self.active = !self.steps.is_empty();
        true
    }

    pub fn advance(&mut self, dt_seconds: f32) -> Vec<A> {
        if !self.active {
            return Vec::new();
        }
        if dt_seconds.is_finite() && dt_seconds > 0.0 {
            self.elapsed += dt_seconds;
        }

        let mut due = Vec::new();
        while self
            .steps
            .front()
            .is_some_and(|(offset, _)| *offset <= self.elapsed)
        {
            if let Some((_, action)) = self.steps.pop_front() {
                due.push(action);
            }
        }
        if self.steps.is_empty() {
            self.active = false;
        }
        due
    }

    /// Drops every pending step, returning how many were discarded.
    pub fn cancel(&mut self) -> usize {
        let dropped = self.steps.len();
        self.steps.clear();
        self.elapsed = 0.0;
        self.active = false;
        dropped
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pending(&self) -> usize {
        self.steps.len()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

fn sanitize_delay(delay: f32) -> f32 {
    if delay.is_finite() {
        delay.max(0.0)
    } else {
        0.0
    }
}
