use std::collections::HashSet;
use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::StartupError;

use super::input::ActionStates;
use super::{InputAction, InputSnapshot, KeyPress, Renderer, SceneError, SceneLifecycle};

pub const SLOW_FRAME_ENV_VAR: &str = "ESCAPE_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Escape Rooms".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            simulated_slow_frame_ms: 0,
            max_render_fps: Some(120),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load start scene: {0}")]
    StartScene(#[from] SceneError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    mut lifecycle: SceneLifecycle,
    start_scene: &str,
) -> Result<(), AppError> {
    lifecycle.load_scene(start_scene)?;

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::new(config.window_width, config.window_height);

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    input_collector.set_window_size(new_size.width, new_size.height);
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    input_collector.set_window_size(size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector
                        .handle_physical_key(event.physical_key, event.state == ElementState::Pressed);
                }
                WindowEvent::RedrawRequested => {
                    if slow_frame_delay > Duration::ZERO {
                        // Debug perturbation only; not the FPS cap.
                        thread::sleep(slow_frame_delay);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    accumulator = accumulator.saturating_add(clamped_frame_dt);

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        lifecycle.tick(fixed_dt_seconds, &input_snapshot);
                        if lifecycle.quit_requested() {
                            info!(reason = "scene_quit", "shutdown_requested");
                            window_target.exit();
                            break;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    if let Err(error) = renderer.render_world(
                        lifecycle.world(),
                        lifecycle.highlighted_entity(),
                        lifecycle.overlay_opacity(),
                    ) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = compose_title(
                        lifecycle.debug_title(),
                        lifecycle.hud().map(|hud| hud.title_line()),
                    );
                    if next_title != last_applied_title {
                        match &next_title {
                            Some(title) => window.set_title(title),
                            None => window.set_title(&config.window_title),
                        }
                        last_applied_title = next_title;
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                lifecycle.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn compose_title(debug_title: Option<String>, hud_line: Option<String>) -> Option<String> {
    let hud_line = hud_line.filter(|line| !line.is_empty());
    match (debug_title, hud_line) {
        (Some(debug), Some(hud)) => Some(format!("{debug} | {hud}")),
        (Some(debug), None) => Some(debug),
        (None, Some(hud)) => Some(hud),
        (None, None) => None,
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
    keys_down: HashSet<KeyCode>,
    interact_is_down: bool,
    pending_presses: Vec<KeyPress>,
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        self.update_action_state(code, is_pressed);

        if code == KeyCode::KeyE {
            self.interact_is_down = is_pressed;
        }

        if is_pressed {
            if self.keys_down.insert(code) {
                if let Some(press) = key_press_for_code(code) {
                    self.pending_presses.push(press);
                }
            }
        } else {
            self.keys_down.remove(&code);
        }
    }

    fn update_action_state(&mut self, code: KeyCode, is_pressed: bool) {
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.action_states.set(InputAction::MoveForward, is_pressed);
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.action_states.set(InputAction::MoveBack, is_pressed);
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.action_states.set(InputAction::MoveLeft, is_pressed);
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.action_states.set(InputAction::MoveRight, is_pressed);
            }
            KeyCode::ShiftLeft | KeyCode::ShiftRight => {
                self.action_states.set(InputAction::Sprint, is_pressed);
            }
            _ => {}
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        InputSnapshot::new(
            self.quit_requested,
            self.action_states,
            self.interact_is_down,
            std::mem::take(&mut self.pending_presses),
            self.window_width,
            self.window_height,
        )
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }
}

fn key_press_for_code(code: KeyCode) -> Option<KeyPress> {
    let press = match code {
        KeyCode::Digit0 | KeyCode::Numpad0 => KeyPress::Digit(0),
        KeyCode::Digit1 | KeyCode::Numpad1 => KeyPress::Digit(1),
        KeyCode::Digit2 | KeyCode::Numpad2 => KeyPress::Digit(2),
        KeyCode::Digit3 | KeyCode::Numpad3 => KeyPress::Digit(3),
        KeyCode::Digit4 | KeyCode::Numpad4 => KeyPress::Digit(4),
        KeyCode::Digit5 | KeyCode::Numpad5 => KeyPress::Digit(5),
        KeyCode::Digit6 | KeyCode::Numpad6 => KeyPress::Digit(6),
        KeyCode::Digit7 | KeyCode::Numpad7 => KeyPress::Digit(7),
        KeyCode::Digit8 | KeyCode::Numpad8 => KeyPress::Digit(8),
        KeyCode::Digit9 | KeyCode::Numpad9 => KeyPress::Digit(9),
        KeyCode::Backspace => KeyPress::Backspace,
        KeyCode::Enter | KeyCode::NumpadEnter => KeyPress::Confirm,
        KeyCode::Escape => KeyPress::Cancel,
        KeyCode::KeyR => KeyPress::Restart,
        KeyCode::KeyE => KeyPress::Interact,
        KeyCode::KeyW
        | KeyCode::KeyA
        | KeyCode::KeyS
        | KeyCode::KeyD
        | KeyCode::ArrowUp
        | KeyCode::ArrowDown
        | KeyCode::ArrowLeft
        | KeyCode::ArrowRight
        | KeyCode::ShiftLeft
        | KeyCode::ShiftRight => return None,
        _ => KeyPress::Other,
    };
    Some(press)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut InputCollector, code: KeyCode) {
        input.handle_physical_key(PhysicalKey::Code(code), true);
    }

    fn release(input: &mut InputCollector, code: KeyCode) {
        input.handle_physical_key(PhysicalKey::Code(code), false);
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn digit_press_is_delivered_for_single_tick() {
        let mut input = InputCollector::new(1280, 720);
        press(&mut input, KeyCode::Digit7);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert_eq!(first.key_presses(), &[KeyPress::Digit(7)]);
        assert!(second.key_presses().is_empty());
    }

    #[test]
    fn held_key_does_not_repeat_press_events() {
        let mut input = InputCollector::default();

        press(&mut input, KeyCode::Enter);
        let first = input.snapshot_for_tick();
        press(&mut input, KeyCode::Enter);
        let second = input.snapshot_for_tick();
        release(&mut input, KeyCode::Enter);
        press(&mut input, KeyCode::Enter);
        let third = input.snapshot_for_tick();

        assert_eq!(first.key_presses(), &[KeyPress::Confirm]);
        assert!(second.key_presses().is_empty());
        assert_eq!(third.key_presses(), &[KeyPress::Confirm]);
    }

    #[test]
    fn interact_key_reports_held_state_and_single_press() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyE);
        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();
        release(&mut input, KeyCode::KeyE);
        let third = input.snapshot_for_tick();

        assert!(first.interact_down());
        assert_eq!(first.key_presses(), &[KeyPress::Interact]);
        assert!(second.interact_down());
        assert!(second.key_presses().is_empty());
        assert!(!third.interact_down());
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_actions_without_key_events() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyW);
        press(&mut input, KeyCode::ArrowLeft);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveForward));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(snapshot.key_presses().is_empty());
    }

    #[test]
    fn key_release_clears_action_state() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyD);
        release(&mut input, KeyCode::KeyD);

        let snapshot = input.snapshot_for_tick();
        assert!(!snapshot.is_down(InputAction::MoveRight));
    }

    #[test]
    fn keypad_keys_map_to_modal_events() {
        assert_eq!(key_press_for_code(KeyCode::Numpad3), Some(KeyPress::Digit(3)));
        assert_eq!(key_press_for_code(KeyCode::Backspace), Some(KeyPress::Backspace));
        assert_eq!(key_press_for_code(KeyCode::Escape), Some(KeyPress::Cancel));
        assert_eq!(key_press_for_code(KeyCode::KeyR), Some(KeyPress::Restart));
        assert_eq!(key_press_for_code(KeyCode::KeyQ), Some(KeyPress::Other));
        assert_eq!(key_press_for_code(KeyCode::ShiftLeft), None);
    }

    #[test]
    fn snapshot_carries_window_size_and_quit() {
        let mut input = InputCollector::new(1280, 720);
        input.mark_quit_requested();
        let snapshot = input.snapshot_for_tick();

        assert_eq!(snapshot.window_size(), (1280, 720));
        assert!(snapshot.quit_requested());
    }

    #[test]
    fn compose_title_prefers_both_parts() {
        assert_eq!(
            compose_title(Some("clinic".into()), Some("Progress: 0/3".into())).as_deref(),
            Some("clinic | Progress: 0/3")
        );
        assert_eq!(compose_title(None, Some(String::new())), None);
    }

    #[test]
    fn target_frame_duration_none_when_cap_off() {
        assert_eq!(target_frame_duration(None), None);
    }

    #[test]
    fn target_frame_duration_for_60hz_is_expected() {
        let duration = target_frame_duration(Some(60)).expect("duration");
        assert!((duration.as_secs_f64() - (1.0 / 60.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(20), target_frame_duration(Some(60)));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), target_frame_duration(Some(60)));
        assert!(sleep > Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
    }
}
