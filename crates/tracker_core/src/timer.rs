use std::time::Duration;

use crate::state::UiState;
use crate::{Effect, TrackerConfig};

/// Identifier of one armed timer. Never reused within an [`crate::AppState`].
pub type TimerId = u64;

/// What a timer drives; used by the driver for logging and by tests to find
/// a particular timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    PollTick,
    FinishDelay,
    SafetyTimeout,
    PreviewTick,
    PreviewReveal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Repeating(Duration),
    Once(Duration),
}

/// Mutable surroundings a controller works against while handling a message.
pub(crate) struct Context<'a> {
    pub config: &'a TrackerConfig,
    pub ui: &'a mut UiState,
    pub effects: &'a mut Vec<Effect>,
    pub next_timer: &'a mut TimerId,
}

/// Holds at most one armed timer. Arming a slot releases whatever it held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimerSlot {
    kind: TimerKind,
    armed: Option<TimerId>,
}

impl TimerSlot {
    pub fn new(kind: TimerKind) -> Self {
        Self { kind, armed: None }
    }

    pub fn arm(&mut self, schedule: Schedule, cx: &mut Context<'_>) -> TimerId {
        self.release(cx);
        *cx.next_timer += 1;
        let timer = *cx.next_timer;
        cx.effects.push(Effect::ArmTimer {
            timer,
            kind: self.kind,
            schedule,
        });
        self.armed = Some(timer);
        timer
    }

    /// Cancels the armed timer, if any. Safe to call repeatedly.
    pub fn release(&mut self, cx: &mut Context<'_>) -> bool {
        match self.armed.take() {
            Some(timer) => {
                cx.effects.push(Effect::CancelTimer { timer });
                true
            }
            None => false,
        }
    }

    pub fn owns(&self, timer: TimerId) -> bool {
        self.armed == Some(timer)
    }

    /// Consumes the firing of a one-shot timer. A fire for any other id is stale.
    pub fn take_fired(&mut self, timer: TimerId) -> bool {
        if self.owns(timer) {
            self.armed = None;
            true
        } else {
            false
        }
    }

    pub fn armed(&self) -> Option<TimerId> {
        self.armed
    }
}
