//! Frame scheduling: target FPS pacing, the control-state machine, and the
//! live refcount.
//!
//! The scheduler never sleeps or spawns anything itself; the engine's loop
//! asks it what is due and reports frame boundaries with explicit
//! timestamps, which keeps every transition unit-testable.

use std::time::{Duration, Instant};

use crate::error::{Result, WeftError};
use crate::tree::Tree;

/// Scheduler control states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlState {
    /// No frames scheduled.
    Idle,
    /// Frames run because the live refcount is positive.
    AutoStarted,
    /// The user requested continuous running; the live count is ignored.
    ExplicitStarted,
    /// The user paused; nothing runs until an explicit start.
    ExplicitPaused,
    /// Terminal state; no further frames.
    ExplicitStopped,
}

/// A per-frame callback. Runs on the frame task after animation one-shots.
pub type FrameCallback = Box<dyn FnMut(&mut Tree, Duration)>;
/// A one-shot animation-frame callback. Runs before frame callbacks.
pub type AnimationCallback = Box<dyn FnOnce(&mut Tree, Duration)>;

/// Cooperative frame scheduler.
pub struct FrameScheduler {
    target_fps: u32,
    target_frame_time: Duration,
    state: ControlState,
    live_requests: u32,
    last_frame: Option<Instant>,
    last_delta: Duration,
    frame_count: u64,
    current_fps: f32,
    rendering: bool,
    immediate_rerender: bool,
    one_shot_pending: bool,
    frame_callbacks: Vec<FrameCallback>,
    animation_requests: Vec<AnimationCallback>,
}

impl FrameScheduler {
    /// Create a scheduler targeting the given frames per second.
    pub fn new(target_fps: u32) -> Self {
        let fps = target_fps.max(1);
        Self {
            target_fps: fps,
            target_frame_time: Duration::from_secs_f64(1.0 / f64::from(fps)),
            state: ControlState::Idle,
            live_requests: 0,
            last_frame: None,
            last_delta: Duration::ZERO,
            frame_count: 0,
            current_fps: 0.0,
            rendering: false,
            immediate_rerender: false,
            one_shot_pending: false,
            frame_callbacks: Vec::new(),
            animation_requests: Vec::new(),
        }
    }

    /// The current control state.
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// The configured frame rate.
    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// The frame budget derived from the target frame rate.
    pub fn target_frame_time(&self) -> Duration {
        self.target_frame_time
    }

    /// Change the target frame rate.
    pub fn set_target_fps(&mut self, fps: u32) {
        self.target_fps = fps.max(1);
        self.target_frame_time = Duration::from_secs_f64(1.0 / f64::from(self.target_fps));
    }

    /// Frames completed since creation.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Measured frame rate over the last frame.
    pub fn current_fps(&self) -> f32 {
        self.current_fps
    }

    /// Whether continuous frames are scheduled.
    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            ControlState::AutoStarted | ControlState::ExplicitStarted
        )
    }

    /// Current live request count.
    pub fn live_requests(&self) -> u32 {
        self.live_requests
    }

    /// A subtree became live: on the 0 -> 1 edge in IDLE the loop
    /// auto-starts.
    pub fn request_live(&mut self) {
        self.live_requests += 1;
        if self.live_requests == 1 && self.state == ControlState::Idle {
            tracing::debug!("live refcount 0 -> 1; auto-starting");
            self.state = ControlState::AutoStarted;
        }
    }

    /// A live subtree went away: on the 1 -> 0 edge an auto-started loop
    /// goes idle.
    pub fn drop_live(&mut self) {
        self.live_requests = self.live_requests.saturating_sub(1);
        if self.live_requests == 0 && self.state == ControlState::AutoStarted {
            tracing::debug!("live refcount 1 -> 0; pausing auto loop");
            self.state = ControlState::Idle;
        }
    }

    /// Explicitly run continuously, regardless of the live count.
    pub fn start(&mut self) {
        if self.state == ControlState::ExplicitStopped {
            tracing::warn!("start() after stop(); ignoring");
            return;
        }
        self.state = ControlState::ExplicitStarted;
    }

    /// Explicitly pause; no frames until the next `start`.
    pub fn pause(&mut self) {
        if self.state == ControlState::ExplicitStopped {
            return;
        }
        self.state = ControlState::ExplicitPaused;
    }

    /// Stop for good and release scheduling state.
    pub fn stop(&mut self) {
        self.state = ControlState::ExplicitStopped;
        self.one_shot_pending = false;
        self.immediate_rerender = false;
        self.frame_callbacks.clear();
        self.animation_requests.clear();
    }

    /// Schedule exactly one frame on the next tick if nothing is running.
    /// A no-op while the loop runs, is paused, or is stopped.
    pub fn request_render(&mut self) {
        match self.state {
            ControlState::Idle => self.one_shot_pending = true,
            ControlState::AutoStarted | ControlState::ExplicitStarted => {}
            ControlState::ExplicitPaused | ControlState::ExplicitStopped => {}
        }
    }

    /// Ask for another frame immediately after the current one completes.
    pub fn request_immediate_rerender(&mut self) {
        self.immediate_rerender = true;
    }

    /// Register a per-frame callback.
    pub fn add_frame_callback(&mut self, callback: FrameCallback) {
        self.frame_callbacks.push(callback);
    }

    /// Register a one-shot animation callback for the next frame.
    pub fn request_animation_frame(&mut self, callback: AnimationCallback) {
        self.animation_requests.push(callback);
    }

    /// Whether a frame should run at `now`.
    pub fn frame_due(&self, now: Instant) -> bool {
        if self.rendering || self.state == ControlState::ExplicitStopped {
            return false;
        }
        if self.one_shot_pending {
            return true;
        }
        if !self.is_running() {
            return false;
        }
        match self.last_frame {
            Some(last) => now.saturating_duration_since(last) >= self.target_frame_time,
            None => true,
        }
    }

    /// When the loop should next wake, if ever.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        if self.state == ControlState::ExplicitStopped {
            return None;
        }
        if self.one_shot_pending {
            return Some(now);
        }
        if !self.is_running() {
            return None;
        }
        match self.last_frame {
            Some(last) => {
                let next = last + self.target_frame_time;
                // Frame pacing never sleeps less than a millisecond.
                Some(next.max(now + Duration::from_millis(1)).min(now + self.target_frame_time))
            }
            None => Some(now),
        }
    }

    /// Begin a frame. Re-entrant rendering is an invariant violation.
    pub fn begin_frame(&mut self, now: Instant) -> Result<Duration> {
        if self.rendering {
            return Err(WeftError::InvariantViolation(
                "re-entrant frame render".into(),
            ));
        }
        self.rendering = true;
        let dt = match self.last_frame {
            Some(last) => now.saturating_duration_since(last),
            None => self.target_frame_time,
        };
        self.last_delta = dt;
        Ok(dt)
    }

    /// Run animation one-shots, then frame callbacks, in order.
    pub fn run_frame_hooks(&mut self, tree: &mut Tree, dt: Duration) {
        for hook in self.animation_requests.drain(..) {
            hook(tree, dt);
        }
        for callback in &mut self.frame_callbacks {
            callback(tree, dt);
        }
    }

    /// Finish a frame: update statistics and consume the one-shot flag.
    /// An immediate-rerender request schedules the next frame at once.
    pub fn end_frame(&mut self, now: Instant) {
        self.rendering = false;
        self.one_shot_pending = false;
        self.frame_count += 1;
        if self.last_delta > Duration::ZERO {
            self.current_fps = 1.0 / self.last_delta.as_secs_f32();
        }
        self.last_frame = Some(now);
        if self.immediate_rerender {
            self.immediate_rerender = false;
            if self.state != ControlState::ExplicitStopped {
                self.one_shot_pending = true;
            }
        }
    }
}
