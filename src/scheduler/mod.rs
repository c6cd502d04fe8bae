//! Debounced triggering of inspection passes.
//!
//! A background thread watches for change notifications and, once the quiet
//! period has elapsed, posts exactly one [`PassRequest`] to the UI side. New
//! passes are suppressed until that request completes.

use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::config::HunterConfig;
use crate::state::{StateMachine, TriggerEvent, TriggerState};

mod worker;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(120);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Added to the debounce deadline so the wakeup lands after it, not on it.
const DEADLINE_SLACK: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTiming {
    pub debounce: Duration,
    /// Upper bound on how long the worker sleeps with nothing to do.
    pub poll_interval: Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl From<&HunterConfig> for SchedulerTiming {
    fn from(config: &HunterConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollOutcome {
    Fire,
    Sleep(Duration),
}

#[derive(Debug)]
struct SchedulerCore {
    machine: StateMachine,
    last_change: Instant,
    follow_up: bool,
    instant_mode: bool,
    abort: bool,
    /// Bumped whenever in-flight passes stop counting (toggle-off, reset).
    generation: u64,
    timing: SchedulerTiming,
}

impl SchedulerCore {
    fn new(timing: SchedulerTiming, instant_mode: bool, now: Instant) -> Self {
        Self {
            machine: StateMachine::new(),
            last_change: now,
            follow_up: false,
            instant_mode,
            abort: false,
            generation: 0,
            timing,
        }
    }

    fn state(&self) -> TriggerState {
        self.machine.state()
    }

    fn apply(&mut self, event: TriggerEvent) {
        if let Err(err) = self.machine.transition(event) {
            debug!(%err, "trigger event ignored");
        }
    }

    /// Record a change. Implicit changes (selection moves) only count in
    /// instant mode. Returns true when the worker should re-check its deadline.
    fn change(&mut self, now: Instant, explicit: bool) -> bool {
        if !explicit && !self.instant_mode {
            return false;
        }
        if self.state() == TriggerState::Suppressed {
            if self.instant_mode {
                self.follow_up = true;
            }
            return false;
        }
        self.apply(TriggerEvent::Changed);
        self.last_change = now;
        true
    }

    fn poll(&mut self, now: Instant) -> PollOutcome {
        if self.state() != TriggerState::ArmedPending {
            return PollOutcome::Sleep(self.timing.poll_interval);
        }
        let quiet = now.saturating_duration_since(self.last_change);
        if quiet >= self.timing.debounce {
            self.apply(TriggerEvent::QuietElapsed);
            return PollOutcome::Fire;
        }
        let remaining = self.timing.debounce - quiet + DEADLINE_SLACK;
        PollOutcome::Sleep(remaining.min(self.timing.poll_interval))
    }

    /// Returns true when a follow-up pass was armed. Completions of passes
    /// posted before the last toggle-off are ignored.
    fn complete(&mut self, now: Instant, generation: u64) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale pass completion ignored");
            return false;
        }
        if self.state() != TriggerState::Suppressed {
            return false;
        }
        self.apply(TriggerEvent::PassCompleted);
        if std::mem::take(&mut self.follow_up) {
            self.apply(TriggerEvent::Changed);
            self.last_change = now;
            return true;
        }
        false
    }

    fn toggle_off(&mut self) {
        self.apply(TriggerEvent::ToggleOff);
        self.follow_up = false;
        self.generation = self.generation.wrapping_add(1);
    }

    fn reset(&mut self, now: Instant) {
        self.machine = StateMachine::new();
        self.follow_up = false;
        self.generation = self.generation.wrapping_add(1);
        self.abort = false;
        self.last_change = now;
    }
}

#[derive(Debug)]
struct Shared {
    core: Mutex<SchedulerCore>,
    wake: Condvar,
}

impl Shared {
    fn finish_pass(&self, generation: u64) {
        let armed = self.core.lock().complete(Instant::now(), generation);
        if armed {
            self.wake.notify_all();
        }
    }
}

/// One pass the UI side should run now.
///
/// Completing it (explicitly or by dropping it) lets the scheduler arm again.
#[derive(Debug)]
pub struct PassRequest {
    shared: Option<Arc<Shared>>,
    generation: u64,
}

impl PassRequest {
    fn new(shared: Arc<Shared>, generation: u64) -> Self {
        Self {
            shared: Some(shared),
            generation,
        }
    }

    pub fn complete(mut self) {
        if let Some(shared) = self.shared.take() {
            shared.finish_pass(self.generation);
        }
    }
}

impl Drop for PassRequest {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.finish_pass(self.generation);
        }
    }
}

/// Runs passes on the thread that owns the editor state.
pub trait UiExecutor: Send + Sync {
    fn post(&self, pass: PassRequest);
}

#[derive(Debug, Clone)]
pub struct ChannelExecutor {
    sender: mpsc::Sender<PassRequest>,
}

impl UiExecutor for ChannelExecutor {
    fn post(&self, pass: PassRequest) {
        if self.sender.send(pass).is_err() {
            warn!("pass queue closed; dropping pass request");
        }
    }
}

/// Receiving end of a [`ChannelExecutor`], drained by the UI loop.
#[derive(Debug)]
pub struct PassQueue {
    receiver: mpsc::Receiver<PassRequest>,
}

impl PassQueue {
    pub fn try_next(&self) -> Option<PassRequest> {
        self.receiver.try_recv().ok()
    }

    pub fn next_timeout(&self, timeout: Duration) -> Option<PassRequest> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

pub fn channel_executor() -> (ChannelExecutor, PassQueue) {
    let (sender, receiver) = mpsc::channel();
    (ChannelExecutor { sender }, PassQueue { receiver })
}

pub struct TriggerScheduler {
    shared: Arc<Shared>,
    executor: Arc<dyn UiExecutor>,
    worker: Option<JoinHandle<()>>,
}

impl TriggerScheduler {
    pub fn new(timing: SchedulerTiming, instant_mode: bool, executor: Arc<dyn UiExecutor>) -> Self {
        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(SchedulerCore::new(timing, instant_mode, Instant::now())),
                wake: Condvar::new(),
            }),
            executor,
            worker: None,
        }
    }

    pub fn start(&mut self) -> io::Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        self.shared.core.lock().abort = false;
        let handle = worker::spawn(Arc::clone(&self.shared), Arc::clone(&self.executor))?;
        self.worker = Some(handle);
        Ok(())
    }

    pub fn stop(&mut self) {
        {
            let mut core = self.shared.core.lock();
            core.abort = true;
            core.toggle_off();
        }
        self.shared.wake.notify_all();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("trigger worker panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// A selection moved. Only arms the trigger in instant mode.
    pub fn notify_selection_changed(&self) {
        self.change(false);
    }

    /// Ask for a pass regardless of instant mode.
    pub fn request_pass(&self) {
        self.change(true);
    }

    pub fn set_instant_mode(&self, enabled: bool) {
        let wake = {
            let mut core = self.shared.core.lock();
            core.instant_mode = enabled;
            if enabled {
                core.change(Instant::now(), true)
            } else {
                core.toggle_off();
                true
            }
        };
        if wake {
            self.shared.wake.notify_all();
        }
    }

    pub fn toggle_instant_mode(&self) -> bool {
        let enabled = !self.instant_mode();
        self.set_instant_mode(enabled);
        enabled
    }

    pub fn instant_mode(&self) -> bool {
        self.shared.core.lock().instant_mode
    }

    pub fn state(&self) -> TriggerState {
        self.shared.core.lock().state()
    }

    fn change(&self, explicit: bool) {
        let wake = self.shared.core.lock().change(Instant::now(), explicit);
        if wake {
            self.shared.wake.notify_all();
        }
    }
}

impl Drop for TriggerScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMING: SchedulerTiming = SchedulerTiming {
        debounce: Duration::from_millis(120),
        poll_interval: Duration::from_millis(500),
    };

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn burst_of_changes_fires_once_after_quiet_period() {
        let t0 = Instant::now();
        let mut core = SchedulerCore::new(TIMING, false, t0);

        for offset in [0, 30, 60] {
            assert!(core.change(t0 + ms(offset), true));
        }
        assert_eq!(core.state(), TriggerState::ArmedPending);
        assert_eq!(core.poll(t0 + ms(100)), PollOutcome::Sleep(ms(81)));
        assert_eq!(core.poll(t0 + ms(180)), PollOutcome::Fire);
        assert_eq!(core.state(), TriggerState::Suppressed);
        assert_eq!(core.poll(t0 + ms(400)), PollOutcome::Sleep(TIMING.poll_interval));
    }

    #[test]
    fn idle_poll_sleeps_for_poll_interval() {
        let t0 = Instant::now();
        let mut core = SchedulerCore::new(TIMING, false, t0);
        assert_eq!(core.poll(t0 + ms(1_000)), PollOutcome::Sleep(TIMING.poll_interval));
    }

    #[test]
    fn selection_changes_need_instant_mode() {
        let t0 = Instant::now();
        let mut core = SchedulerCore::new(TIMING, false, t0);
        assert!(!core.change(t0, false));
        assert_eq!(core.state(), TriggerState::Idle);

        core.instant_mode = true;
        assert!(core.change(t0, false));
        assert_eq!(core.state(), TriggerState::ArmedPending);
    }

    #[test]
    fn changes_while_suppressed_coalesce_into_one_follow_up() {
        let t0 = Instant::now();
        let mut core = SchedulerCore::new(TIMING, true, t0);
        core.change(t0, false);
        assert_eq!(core.poll(t0 + ms(130)), PollOutcome::Fire);

        for offset in [140, 150, 160] {
            assert!(!core.change(t0 + ms(offset), false));
        }
        assert_eq!(core.state(), TriggerState::Suppressed);

        assert!(core.complete(t0 + ms(200), core.generation));
        assert_eq!(core.state(), TriggerState::ArmedPending);
        assert_eq!(core.poll(t0 + ms(330)), PollOutcome::Fire);
        assert!(!core.complete(t0 + ms(340), core.generation));
        assert_eq!(core.state(), TriggerState::Idle);
    }

    #[test]
    fn changes_while_suppressed_are_dropped_without_instant_mode() {
        let t0 = Instant::now();
        let mut core = SchedulerCore::new(TIMING, false, t0);
        core.change(t0, true);
        assert_eq!(core.poll(t0 + ms(130)), PollOutcome::Fire);

        core.change(t0 + ms(140), true);

        assert!(!core.complete(t0 + ms(200), core.generation));
        assert_eq!(core.state(), TriggerState::Idle);
    }

    #[test]
    fn toggle_off_discards_pending_work() {
        let t0 = Instant::now();
        let mut core = SchedulerCore::new(TIMING, true, t0);
        core.change(t0, true);
        core.toggle_off();
        assert_eq!(core.state(), TriggerState::Idle);
        assert_eq!(core.poll(t0 + ms(500)), PollOutcome::Sleep(TIMING.poll_interval));
        assert!(!core.complete(t0 + ms(600), core.generation));
    }

    #[test]
    fn completion_from_before_toggle_off_is_ignored() {
        let t0 = Instant::now();
        let mut core = SchedulerCore::new(TIMING, true, t0);
        core.change(t0, true);
        assert_eq!(core.poll(t0 + ms(130)), PollOutcome::Fire);
        let stale = core.generation;

        core.toggle_off();
        core.change(t0 + ms(140), true);
        assert_eq!(core.poll(t0 + ms(270)), PollOutcome::Fire);
        let current = core.generation;
        assert_ne!(stale, current);

        assert!(!core.complete(t0 + ms(280), stale));
        assert_eq!(core.state(), TriggerState::Suppressed);
        assert!(!core.complete(t0 + ms(290), current));
        assert_eq!(core.state(), TriggerState::Idle);
    }

    #[test]
    fn stale_pass_cannot_release_a_newer_one() {
        let (executor, queue) = channel_executor();
        let timing = SchedulerTiming {
            debounce: ms(20),
            poll_interval: ms(200),
        };
        let mut scheduler = TriggerScheduler::new(timing, false, Arc::new(executor));
        scheduler.start().expect("start worker");

        scheduler.request_pass();
        let first = queue.next_timeout(Duration::from_secs(2)).expect("first pass");
        scheduler.set_instant_mode(false);
        scheduler.set_instant_mode(true);
        let second = queue.next_timeout(Duration::from_secs(2)).expect("second pass");

        first.complete();
        assert_eq!(scheduler.state(), TriggerState::Suppressed);
        assert!(queue.next_timeout(ms(150)).is_none());

        second.complete();
        assert_eq!(scheduler.state(), TriggerState::Idle);
        scheduler.stop();
    }

    #[test]
    fn scheduler_posts_a_single_pass_for_a_burst() {
        let (executor, queue) = channel_executor();
        let timing = SchedulerTiming {
            debounce: ms(20),
            poll_interval: ms(200),
        };
        let mut scheduler = TriggerScheduler::new(timing, false, Arc::new(executor));
        scheduler.start().expect("start worker");

        for _ in 0..5 {
            scheduler.request_pass();
        }

        let pass = queue.next_timeout(Duration::from_secs(2)).expect("one pass");
        assert_eq!(scheduler.state(), TriggerState::Suppressed);
        assert!(queue.next_timeout(ms(150)).is_none());

        pass.complete();
        assert_eq!(scheduler.state(), TriggerState::Idle);

        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn follow_up_pass_arrives_after_completion() {
        let (executor, queue) = channel_executor();
        let timing = SchedulerTiming {
            debounce: ms(20),
            poll_interval: ms(200),
        };
        let mut scheduler = TriggerScheduler::new(timing, true, Arc::new(executor));
        scheduler.start().expect("start worker");

        scheduler.request_pass();
        let first = queue.next_timeout(Duration::from_secs(2)).expect("first pass");
        for _ in 0..3 {
            scheduler.notify_selection_changed();
        }
        assert!(queue.next_timeout(ms(100)).is_none());

        drop(first);
        let second = queue
            .next_timeout(Duration::from_secs(2))
            .expect("follow-up pass");
        second.complete();
        assert!(queue.next_timeout(ms(100)).is_none());

        scheduler.stop();
    }

    #[test]
    fn stop_resets_state_for_restart() {
        let (executor, queue) = channel_executor();
        let timing = SchedulerTiming {
            debounce: ms(10),
            poll_interval: ms(50),
        };
        let mut scheduler = TriggerScheduler::new(timing, false, Arc::new(executor));
        scheduler.start().expect("start worker");
        scheduler.request_pass();
        scheduler.stop();
        assert_eq!(scheduler.state(), TriggerState::Idle);
        while let Some(pass) = queue.try_next() {
            pass.complete();
        }

        scheduler.start().expect("restart worker");
        scheduler.request_pass();
        let pass = queue
            .next_timeout(Duration::from_secs(2))
            .expect("pass after restart");
        pass.complete();
        scheduler.stop();
    }

    #[test]
    fn disabling_instant_mode_returns_to_idle() {
        let (executor, _queue) = channel_executor();
        let scheduler = TriggerScheduler::new(TIMING, false, Arc::new(executor));

        assert!(scheduler.toggle_instant_mode());
        assert_eq!(scheduler.state(), TriggerState::ArmedPending);
        assert!(!scheduler.toggle_instant_mode());
        assert_eq!(scheduler.state(), TriggerState::Idle);
    }
}
