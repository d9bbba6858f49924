use std::fmt::{Display, Formatter};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::domain::{CELEBRATION_MESSAGES, Task, TaskLog, to_millis};
use crate::error::{Error, Result};
use crate::logs::LogStore;
use crate::selector::pick_next;
use crate::storage::KeyValueStore;

pub const DEFAULT_RESET_DELAY_MS: i64 = 2_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
    /// Held only while the completion is being written.
    Completing,
    Completed,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionState::Idle => "idle",
            SessionState::Active => "active",
            SessionState::Completing => "completing",
            SessionState::Completed => "completed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(Task),
    NothingAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub log: TaskLog,
    pub message: String,
}

/// Read-only view handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub active_task: Option<Task>,
    pub feedback_message: String,
}

/// One pick-through-completion cycle. Owned by the caller; nothing here is
/// persisted.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    active_task: Option<Task>,
    feedback_message: String,
    reset_at: Option<DateTime<Utc>>,
    reset_delay: Duration,
    celebrations: Vec<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEFAULT_RESET_DELAY_MS))
    }
}

impl Session {
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            state: SessionState::Idle,
            active_task: None,
            feedback_message: String::new(),
            reset_at: None,
            reset_delay,
            celebrations: CELEBRATION_MESSAGES.iter().map(|msg| msg.to_string()).collect(),
        }
    }

    /// Replaces the celebratory pool; an empty list keeps the built-in one.
    pub fn with_celebrations(mut self, celebrations: Vec<String>) -> Self {
        if !celebrations.is_empty() {
            self.celebrations = celebrations;
        }
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.active_task.as_ref()
    }

    pub fn feedback_message(&self) -> &str {
        &self.feedback_message
    }

    pub fn reset_deadline(&self) -> Option<DateTime<Utc>> {
        self.reset_at
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            active_task: self.active_task.clone(),
            feedback_message: self.feedback_message.clone(),
        }
    }

    /// idle -> active. Also accepted while a reset is pending, in which case
    /// the pending reset is dropped first.
    pub fn pick<R: Rng + ?Sized>(&mut self, tasks: &[Task], rng: &mut R) -> Result<PickOutcome> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Completed => {
                self.cancel_reset();
                self.enter_idle();
            }
            state => return Err(self.reject("pick", state)),
        }

        // A reset clears the active task, so a fresh cycle may offer the task
        // that was just completed.
        let previous = self.active_task.as_ref().map(|task| task.id.clone());
        match pick_next(tasks, previous.as_deref(), rng) {
            Some(task) => {
                let task = task.clone();
                self.activate(task.clone());
                Ok(PickOutcome::Picked(task))
            }
            None => {
                debug!("no active tasks to pick from");
                Ok(PickOutcome::NothingAvailable)
            }
        }
    }

    /// active -> active with a different task when one exists. If every task
    /// has since been deactivated the current one stays on screen.
    pub fn skip<R: Rng + ?Sized>(&mut self, tasks: &[Task], rng: &mut R) -> Result<PickOutcome> {
        if self.state != SessionState::Active {
            return Err(self.reject("skip", self.state));
        }

        let current = self.active_task.as_ref().map(|task| task.id.clone());
        match pick_next(tasks, current.as_deref(), rng) {
            Some(task) => {
                let task = task.clone();
                self.activate(task.clone());
                Ok(PickOutcome::Picked(task))
            }
            None => Ok(PickOutcome::NothingAvailable),
        }
    }

    /// active -> completed. Writes exactly one log entry and arms the reset
    /// deadline. A failed write still completes the session; the error is
    /// returned after the transition.
    pub fn complete<R: Rng + ?Sized>(
        &mut self,
        logs: &mut LogStore,
        store: &mut dyn KeyValueStore,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Completion> {
        if self.state != SessionState::Active {
            return Err(self.reject("complete", self.state));
        }
        let Some(task_id) = self.active_task.as_ref().map(|task| task.id.clone()) else {
            return Err(self.reject("complete", self.state));
        };

        self.state = SessionState::Completing;
        let written = logs.append(store, rng, &task_id, to_millis(now));

        let message = self
            .celebrations
            .choose(rng)
            .cloned()
            .unwrap_or_default();
        self.feedback_message = message.clone();
        self.state = SessionState::Completed;
        self.reset_at = Some(
            now.checked_add_signed(self.reset_delay)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );
        debug!(%task_id, reset_at = ?self.reset_at, "session completed");

        Ok(Completion {
            log: written?,
            message,
        })
    }

    /// Fires the completed -> idle transition once its deadline has passed.
    /// Returns whether the session was reset.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        match self.reset_at {
            Some(deadline) if self.state == SessionState::Completed && now >= deadline => {
                self.reset_at = None;
                self.enter_idle();
                debug!("session reset to idle");
                true
            }
            _ => false,
        }
    }

    /// Drops a pending reset without touching the rest of the session.
    pub fn cancel_reset(&mut self) -> bool {
        self.reset_at.take().is_some()
    }

    fn activate(&mut self, task: Task) {
        debug!(id = %task.id, "session active");
        self.active_task = Some(task);
        self.feedback_message.clear();
        self.state = SessionState::Active;
    }

    fn enter_idle(&mut self) {
        self.state = SessionState::Idle;
        self.active_task = None;
        self.feedback_message.clear();
    }

    fn reject(&self, action: &'static str, state: SessionState) -> Error {
        warn!(action, %state, "rejected session transition");
        Error::InvalidTransition { action, state }
    }
}
