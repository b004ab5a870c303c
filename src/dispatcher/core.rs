//! Control command dispatcher.
//!
//! Turns UI gestures into a bounded-rate stream of [`ControlCommand`]s.
//!
//! ```text
//!            press(a)                      release / disable
//! ┌──────┐ ──────────► ┌──────────────┐ ─────────────────► ┌──────┐
//! │ Idle │             │ Repeating(a) │   emits `stop`     │ Idle │
//! └──────┘             └──────────────┘                    └──────┘
//!                        │  ▲
//!                        └──┘ every period: emits `a`
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::identifiers::CameraId;
use crate::link::ConnectionStatus;
use crate::protocol::{Action, Axis, ControlCommand, SLIDER_MAX};

use super::CommandSink;
use super::levels::SliderLevels;
use super::session::DispatchSession;

// ============================================================================
// Constants
// ============================================================================

/// Default interval between repeated commands of a held gesture.
pub const DEFAULT_REPEAT_PERIOD: Duration = Duration::from_millis(100);

// ============================================================================
// DispatcherOptions
// ============================================================================

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherOptions {
    /// Interval between repeated commands.
    pub period: Duration,
    /// Camera addressed by every command.
    pub camera: CameraId,
}

impl DispatcherOptions {
    /// Creates options with the default period and camera.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            period: DEFAULT_REPEAT_PERIOD,
            camera: CameraId::default(),
        }
    }

    /// Sets the repeat period.
    #[inline]
    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Sets the target camera.
    #[inline]
    #[must_use]
    pub fn with_camera(mut self, camera: impl Into<CameraId>) -> Self {
        self.camera = camera.into();
        self
    }
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Converts presses, releases and slider moves into control commands.
///
/// At most one gesture repeats at a time. Releasing it, disabling the
/// dispatcher or dropping it emits exactly one `stop`, and no command of the
/// released gesture follows that `stop`.
///
/// Commands are handed to the sink while the dispatcher lock is held; a sink
/// must not call back into the dispatcher.
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    sink: Arc<dyn CommandSink>,
    options: DispatcherOptions,
    runtime: Handle,
    state: Mutex<DispatchState>,
}

struct DispatchState {
    enabled: bool,
    session: Option<DispatchSession>,
    generation: u64,
    levels: SliderLevels,
    follower: Option<JoinHandle<()>>,
}

// ============================================================================
// Construction
// ============================================================================

impl Dispatcher {
    /// Creates an enabled dispatcher with default options.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if called outside a tokio runtime.
    pub fn new(sink: Arc<dyn CommandSink>) -> Result<Self> {
        Self::with_options(sink, DispatcherOptions::default())
    }

    /// Creates an enabled dispatcher.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the period is zero
    /// - [`Error::Config`] if called outside a tokio runtime
    pub fn with_options(sink: Arc<dyn CommandSink>, options: DispatcherOptions) -> Result<Self> {
        if options.period.is_zero() {
            return Err(Error::config("Dispatcher period must be greater than zero"));
        }

        let runtime = Handle::try_current()
            .map_err(|_| Error::config("Dispatcher must be created inside a tokio runtime"))?;

        Ok(Self {
            inner: Arc::new(DispatcherInner {
                sink,
                options,
                runtime,
                state: Mutex::new(DispatchState {
                    enabled: true,
                    session: None,
                    generation: 0,
                    levels: SliderLevels::centered(),
                    follower: None,
                }),
            }),
        })
    }

    /// Returns the options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &DispatcherOptions {
        &self.inner.options
    }
}

// ============================================================================
// Held Gestures
// ============================================================================

impl Dispatcher {
    /// Starts repeating `action`.
    ///
    /// Emits `action` at once, then every period until released. A gesture
    /// already held is cancelled first, without a `stop`. No-op returning
    /// `false` while disabled.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `action` is one-shot (`stop`, `reset`,
    /// `preset/home`); use [`fire`](Self::fire) for those.
    pub fn press(&self, action: Action) -> Result<bool> {
        if !action.is_continuous() {
            return Err(Error::invalid_argument(format!(
                "{action} cannot be held; use fire()"
            )));
        }

        let mut state = self.inner.state.lock();
        if !state.enabled {
            trace!(%action, "Press ignored while disabled");
            return Ok(false);
        }

        if let Some(mut previous) = state.session.take() {
            previous.cancel();
            debug!(previous = %previous.action, next = %action, "Gesture replaced");
        }

        state.generation += 1;
        let generation = state.generation;

        self.inner.emit(ControlCommand::new(action, self.inner.options.camera.clone()));

        let task = self.inner.runtime.spawn(repeat(
            Arc::downgrade(&self.inner),
            generation,
            self.inner.options.period,
        ));
        state.session = Some(DispatchSession::new(action, generation, task));

        debug!(%action, "Gesture pressed");
        Ok(true)
    }

    /// Ends the held gesture and emits one `stop`.
    ///
    /// Returns `false`, emitting nothing, if no gesture is held.
    pub fn release(&self) -> bool {
        let mut state = self.inner.state.lock();
        self.inner.stop_session(&mut state, "released")
    }

    /// Returns the held action, if any.
    #[must_use]
    pub fn active_action(&self) -> Option<Action> {
        self.inner
            .state
            .lock()
            .session
            .as_ref()
            .filter(|session| session.is_active())
            .map(|session| session.action)
    }
}

// ============================================================================
// One-Shot and Proportional Commands
// ============================================================================

impl Dispatcher {
    /// Emits a single command. No-op returning `false` while disabled.
    pub fn fire(&self, action: Action) -> bool {
        let state = self.inner.state.lock();
        if !state.enabled {
            return false;
        }

        self.inner.emit(ControlCommand::new(action, self.inner.options.camera.clone()));
        true
    }

    /// Moves the slider of `axis` to `level`.
    ///
    /// Above the midpoint emits the axis' positive action carrying `level`,
    /// below emits the negative action, and the midpoint emits nothing.
    /// Every call re-evaluates, even if the level did not change. No-op
    /// while disabled.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `level` exceeds 100.
    pub fn set_level(&self, axis: Axis, level: u8) -> Result<Option<Action>> {
        if level > SLIDER_MAX {
            return Err(Error::invalid_argument(format!(
                "{axis} level {level} outside 0..={SLIDER_MAX}"
            )));
        }

        let mut state = self.inner.state.lock();
        if !state.enabled {
            return Ok(None);
        }

        state.levels.set(axis, level);
        let action = axis.action_for(level);

        if let Some(action) = action {
            self.inner.emit(ControlCommand::with_value(
                action,
                self.inner.options.camera.clone(),
                level,
            ));
        }
        Ok(action)
    }

    /// Returns the slider level of `axis`.
    #[must_use]
    pub fn level(&self, axis: Axis) -> u8 {
        self.inner.state.lock().levels.get(axis)
    }

    /// Recentres every slider and emits `reset`. No-op returning `false`
    /// while disabled.
    pub fn reset(&self) -> bool {
        let mut state = self.inner.state.lock();
        if !state.enabled {
            return false;
        }

        state.levels = SliderLevels::centered();
        self.inner.emit(ControlCommand::new(
            Action::Reset,
            self.inner.options.camera.clone(),
        ));
        true
    }
}

// ============================================================================
// Enable / Disable
// ============================================================================

impl Dispatcher {
    /// Enables or disables the dispatcher.
    ///
    /// Disabling stops a held gesture with a `stop` command.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.set_enabled(enabled);
    }

    /// Returns `true` if commands are emitted.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Keeps the enabled flag in sync with a link status.
    ///
    /// Enabled while connected, disabled otherwise. Replaces any previous
    /// follower.
    pub fn follow(&self, mut status: watch::Receiver<ConnectionStatus>) {
        let weak = Arc::downgrade(&self.inner);

        let task = self.inner.runtime.spawn(async move {
            loop {
                let connected = status.borrow_and_update().is_connected();
                match weak.upgrade() {
                    Some(inner) => inner.set_enabled(connected),
                    None => break,
                }
                if status.changed().await.is_err() {
                    break;
                }
            }
        });

        if let Some(previous) = self.inner.state.lock().follower.replace(task) {
            previous.abort();
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        if let Some(follower) = state.follower.take() {
            follower.abort();
        }
        self.inner.stop_session(&mut state, "dropped");
    }
}

// ============================================================================
// DispatcherInner
// ============================================================================

impl DispatcherInner {
    /// Hands a command to the sink.
    fn emit(&self, command: ControlCommand) {
        trace!(%command, "Dispatch");
        self.sink.send_command(&command);
    }

    /// Cancels the held gesture and emits `stop`.
    fn stop_session(&self, state: &mut DispatchState, reason: &'static str) -> bool {
        let Some(mut session) = state.session.take() else {
            return false;
        };

        session.cancel();
        self.emit(ControlCommand::stop(self.options.camera.clone()));
        debug!(action = %session.action, reason, "Gesture stopped");
        true
    }

    fn set_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        if state.enabled == enabled {
            return;
        }

        state.enabled = enabled;
        if enabled {
            info!("Dispatcher enabled");
        } else {
            info!("Dispatcher disabled");
            self.stop_session(&mut state, "disabled");
        }
    }

    /// Emits the held action if `generation` is still current.
    ///
    /// Returns `false` once the session is gone.
    fn tick(&self, generation: u64) -> bool {
        let state = self.state.lock();
        match &state.session {
            Some(session) if session.accepts_tick(generation) => {
                self.emit(ControlCommand::new(session.action, self.options.camera.clone()));
                true
            }
            _ => false,
        }
    }
}

/// Repeat task of one session.
async fn repeat(inner: Weak<DispatcherInner>, generation: u64, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(inner) = inner.upgrade() else {
            break;
        };
        if !inner.tick(generation) {
            break;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::sleep;

    #[derive(Default)]
    struct RecordingSink {
        commands: Mutex<Vec<ControlCommand>>,
    }

    impl RecordingSink {
        fn actions(&self) -> Vec<Action> {
            self.commands.lock().iter().map(ControlCommand::action).collect()
        }

        fn take(&self) -> Vec<Action> {
            let actions = self.actions();
            self.commands.lock().clear();
            actions
        }
    }

    impl CommandSink for RecordingSink {
        fn send_command(&self, command: &ControlCommand) {
            self.commands.lock().push(command.clone());
        }
    }

    fn setup() -> (Dispatcher, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(sink.clone()).expect("dispatcher");
        (dispatcher, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_repeats_then_single_stop() {
        let (dispatcher, sink) = setup();

        assert!(dispatcher.press(Action::TiltUp).expect("press"));
        sleep(Duration::from_millis(350)).await;

        assert_eq!(sink.take(), vec![Action::TiltUp; 4]);

        assert!(dispatcher.release());
        sleep(Duration::from_millis(500)).await;

        assert_eq!(sink.take(), vec![Action::Stop]);
        assert_eq!(dispatcher.active_action(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_before_first_tick() {
        let (dispatcher, sink) = setup();

        dispatcher.press(Action::MoveLeft).expect("press");
        sleep(Duration::from_millis(10)).await;
        dispatcher.release();
        sleep(Duration::from_millis(300)).await;

        assert_eq!(sink.actions(), vec![Action::MoveLeft, Action::Stop]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_when_idle_emits_nothing() {
        let (dispatcher, sink) = setup();
        assert!(!dispatcher.release());
        assert!(sink.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_press_cancels_previous() {
        let (dispatcher, sink) = setup();

        dispatcher.press(Action::PanLeft).expect("press");
        sleep(Duration::from_millis(150)).await;
        dispatcher.press(Action::PanRight).expect("press");
        sleep(Duration::from_millis(250)).await;
        dispatcher.release();

        let actions = sink.actions();
        let first_right = actions
            .iter()
            .position(|a| *a == Action::PanRight)
            .expect("pan_right emitted");

        assert!(actions[first_right..].iter().all(|a| *a != Action::PanLeft));
        assert_eq!(actions.iter().filter(|a| **a == Action::Stop).count(), 1);
        assert_eq!(actions.last(), Some(&Action::Stop));
        assert_eq!(&actions[..first_right], &[Action::PanLeft, Action::PanLeft]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_forces_stop() {
        let (dispatcher, sink) = setup();

        dispatcher.press(Action::ZoomIn).expect("press");
        sleep(Duration::from_millis(120)).await;
        dispatcher.set_enabled(false);
        sleep(Duration::from_millis(300)).await;

        assert_eq!(sink.take(), vec![Action::ZoomIn, Action::ZoomIn, Action::Stop]);

        assert!(!dispatcher.press(Action::ZoomIn).expect("press"));
        assert!(!dispatcher.fire(Action::Stop));
        assert!(!dispatcher.reset());
        assert_eq!(dispatcher.set_level(Axis::Zoom, 90).expect("level"), None);
        assert!(sink.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_actions_cannot_be_held() {
        let (dispatcher, sink) = setup();
        for action in [Action::Stop, Action::Reset, Action::PresetHome] {
            assert!(dispatcher.press(action).is_err());
        }
        assert!(sink.actions().is_empty());
    }

    #[tokio::test]
    async fn test_slider_levels() {
        let (dispatcher, sink) = setup();

        assert_eq!(dispatcher.set_level(Axis::Tilt, 50).expect("level"), None);
        assert_eq!(
            dispatcher.set_level(Axis::Tilt, 80).expect("level"),
            Some(Action::TiltUp)
        );
        assert_eq!(
            dispatcher.set_level(Axis::Pan, 10).expect("level"),
            Some(Action::PanLeft)
        );
        assert_eq!(
            dispatcher.set_level(Axis::Pan, 10).expect("level"),
            Some(Action::PanLeft)
        );

        let commands = sink.commands.lock().clone();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].value(), Some(80));
        assert_eq!(commands[1].action(), Action::PanLeft);
        assert_eq!(commands[1].value(), Some(10));

        assert_eq!(dispatcher.level(Axis::Tilt), 80);
        assert!(dispatcher.set_level(Axis::Zoom, 101).is_err());
    }

    #[tokio::test]
    async fn test_reset_recentres() {
        let (dispatcher, sink) = setup();
        dispatcher.set_level(Axis::Zoom, 70).expect("level");

        assert!(dispatcher.reset());
        assert_eq!(dispatcher.level(Axis::Zoom), 50);
        assert_eq!(sink.actions().last(), Some(&Action::Reset));
    }

    #[tokio::test]
    async fn test_fire_targets_configured_camera() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::with_options(
            sink.clone(),
            DispatcherOptions::new().with_camera("local_camera_left"),
        )
        .expect("dispatcher");

        assert!(dispatcher.fire(Action::PresetHome));
        let commands = sink.commands.lock();
        assert_eq!(commands[0].target_id().as_str(), "local_camera_left");
        assert_eq!(commands[0].action(), Action::PresetHome);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_held_gesture() {
        let (dispatcher, sink) = setup();
        dispatcher.press(Action::MoveUp).expect("press");
        drop(dispatcher);
        sleep(Duration::from_millis(300)).await;

        assert_eq!(sink.actions(), vec![Action::MoveUp, Action::Stop]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_tracks_status() {
        let (dispatcher, sink) = setup();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);

        dispatcher.follow(status_rx);
        sleep(Duration::from_millis(1)).await;
        assert!(!dispatcher.is_enabled());

        status_tx.send_replace(ConnectionStatus::Connected);
        sleep(Duration::from_millis(1)).await;
        assert!(dispatcher.is_enabled());

        dispatcher.press(Action::MoveDown).expect("press");
        status_tx.send_replace(ConnectionStatus::Disconnected);
        sleep(Duration::from_millis(1)).await;

        assert!(!dispatcher.is_enabled());
        assert_eq!(sink.actions(), vec![Action::MoveDown, Action::Stop]);
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let sink = Arc::new(RecordingSink::default());
        assert!(Dispatcher::new(sink).is_err());
    }

    #[tokio::test]
    async fn test_zero_period_rejected() {
        let sink = Arc::new(RecordingSink::default());
        let options = DispatcherOptions::new().with_period(Duration::ZERO);
        assert!(Dispatcher::with_options(sink, options).is_err());
    }
}
