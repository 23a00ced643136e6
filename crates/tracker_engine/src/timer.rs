//! Timer plumbing for the driver.
//!
//! The core only names timers; a [`TimerSource`] makes them tick and the
//! [`TimerRegistry`] owns one cancellation guard per armed timer. Dropping a
//! guard stops its timer, so clearing or dropping the registry releases every
//! outstanding timer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracker_core::{Msg, Schedule, TimerId, TimerKind};
use tracker_logging::tracker_trace;

/// Shortest period a repeating timer ticks at.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Delivers `Msg::TimerFired` for armed timers until their token is cancelled.
pub trait TimerSource: Send + Sync {
    fn arm(
        &self,
        timer: TimerId,
        schedule: Schedule,
        cancel: CancellationToken,
        fired: UnboundedSender<Msg>,
    );
}

/// Real-time timers backed by tokio tasks. Must be used inside a runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimerSource;

impl TimerSource for TokioTimerSource {
    fn arm(
        &self,
        timer: TimerId,
        schedule: Schedule,
        cancel: CancellationToken,
        fired: UnboundedSender<Msg>,
    ) {
        tokio::spawn(async move {
            match schedule {
                Schedule::Once(delay) => {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = sleep(delay) => {
                            let _ = fired.send(Msg::TimerFired(timer));
                        }
                    }
                }
                Schedule::Repeating(period) => {
                    let period = period.max(MIN_PERIOD);
                    let mut ticks = interval_at(Instant::now() + period, period);
                    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = ticks.tick() => {
                                if fired.send(Msg::TimerFired(timer)).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        });
    }
}

#[derive(Debug)]
struct ManualTimer {
    timer: TimerId,
    schedule: Schedule,
    cancel: CancellationToken,
    fired: UnboundedSender<Msg>,
}

/// Timers that only fire when told to. Lets drivers be stepped
/// deterministically.
#[derive(Debug, Clone, Default)]
pub struct ManualTimerSource {
    timers: Arc<Mutex<Vec<ManualTimer>>>,
}

impl ManualTimerSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers that are armed and not cancelled, oldest first.
    pub fn armed(&self) -> Vec<(TimerId, Schedule)> {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        timers.retain(|entry| !entry.cancel.is_cancelled());
        timers
            .iter()
            .map(|entry| (entry.timer, entry.schedule))
            .collect()
    }

    /// Sends one fire for `timer`. One-shot timers are consumed. Returns
    /// false when the timer is unknown or cancelled.
    pub fn fire(&self, timer: TimerId) -> bool {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        timers.retain(|entry| !entry.cancel.is_cancelled());
        let Some(index) = timers.iter().position(|entry| entry.timer == timer) else {
            return false;
        };
        let sent = timers[index].fired.send(Msg::TimerFired(timer)).is_ok();
        if matches!(timers[index].schedule, Schedule::Once(_)) {
            timers.remove(index);
        }
        sent
    }
}

impl TimerSource for ManualTimerSource {
    fn arm(
        &self,
        timer: TimerId,
        schedule: Schedule,
        cancel: CancellationToken,
        fired: UnboundedSender<Msg>,
    ) {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ManualTimer {
                timer,
                schedule,
                cancel,
                fired,
            });
    }
}

#[derive(Debug)]
struct ArmedTimer {
    kind: TimerKind,
    once: bool,
    _guard: DropGuard,
}

/// Cancellation guards for every timer the driver has armed.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    armed: HashMap<TimerId, ArmedTimer>,
}

impl TimerRegistry {
    pub fn arm(
        &mut self,
        source: &dyn TimerSource,
        timer: TimerId,
        kind: TimerKind,
        schedule: Schedule,
        fired: UnboundedSender<Msg>,
    ) {
        let token = CancellationToken::new();
        source.arm(timer, schedule, token.clone(), fired);
        let once = matches!(schedule, Schedule::Once(_));
        tracker_trace!("armed {:?} timer {} ({:?})", kind, timer, schedule);
        self.armed.insert(
            timer,
            ArmedTimer {
                kind,
                once,
                _guard: token.drop_guard(),
            },
        );
    }

    /// Stops `timer`. Unknown ids are ignored.
    pub fn cancel(&mut self, timer: TimerId) -> bool {
        match self.armed.remove(&timer) {
            Some(entry) => {
                tracker_trace!("cancelled {:?} timer {}", entry.kind, timer);
                true
            }
            None => false,
        }
    }

    /// Forgets a one-shot timer once its fire has been delivered.
    pub fn fired(&mut self, timer: TimerId) {
        if self.armed.get(&timer).is_some_and(|entry| entry.once) {
            self.armed.remove(&timer);
        }
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    pub fn clear(&mut self) {
        self.armed.clear();
    }
}
