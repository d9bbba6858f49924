use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::domain::{Task, TaskLog, Theme};
use crate::error::{Error, Result};
use crate::logs::LogStore;
use crate::session::{Completion, PickOutcome, Session, SessionSnapshot};
use crate::storage::{KeyValueStore, StorageError, THEME_KEY, load_json, save_json};
use crate::tasks::TaskStore;

/// What the home view needs to draw the current card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCard {
    pub task: Task,
    pub last_completed_at: Option<i64>,
}

/// Everything the rendering layer talks to: the stores, the single session,
/// the storage handle and the random source.
pub struct OneThing<S, R = StdRng> {
    store: S,
    tasks: TaskStore,
    logs: LogStore,
    session: Session,
    theme: Option<Theme>,
    rng: R,
}

impl<S: KeyValueStore> OneThing<S, StdRng> {
    pub fn open(store: S, session: Session) -> Result<Self> {
        Self::with_rng(store, session, StdRng::from_entropy())
    }
}

impl<S: KeyValueStore, R: Rng> OneThing<S, R> {
    pub fn with_rng(mut store: S, session: Session, rng: R) -> Result<Self> {
        let tasks = TaskStore::load(&mut store)?;
        let logs = LogStore::load(&store)?;
        let theme = load_theme(&store)?;
        info!(
            tasks = tasks.tasks().len(),
            logs = logs.logs().len(),
            "opened store"
        );

        Ok(Self {
            store,
            tasks,
            logs,
            session,
            theme,
            rng,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        self.tasks.tasks()
    }

    pub fn logs(&self) -> &[TaskLog] {
        self.logs.logs()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.task(id)
    }

    pub fn active_count(&self) -> usize {
        self.tasks.active_count()
    }

    /// Re-reads the task list from storage.
    pub fn load_tasks(&mut self) -> Result<&[Task]> {
        self.tasks = TaskStore::load(&mut self.store)?;
        Ok(self.tasks.tasks())
    }

    /// Re-reads the completion history from storage.
    pub fn load_logs(&mut self) -> Result<&[TaskLog]> {
        self.logs = LogStore::load(&self.store)?;
        Ok(self.logs.logs())
    }

    pub fn add_task(&mut self, title: &str, icon: &str) -> Result<Task> {
        self.tasks.add(&mut self.store, &mut self.rng, title, icon)
    }

    pub fn set_task_active(&mut self, id: &str, active: bool) -> Result<()> {
        self.tasks.set_active(&mut self.store, id, active)
    }

    /// Flips the active flag and returns the new value.
    pub fn toggle_task_active(&mut self, id: &str) -> Result<bool> {
        let active = !self
            .tasks
            .task(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?
            .is_active;
        self.set_task_active(id, active)?;
        Ok(active)
    }

    pub fn remove_task(&mut self, id: &str) -> Result<Option<Task>> {
        self.tasks.remove(&mut self.store, id)
    }

    pub fn pick(&mut self) -> Result<PickOutcome> {
        self.session.pick(self.tasks.tasks(), &mut self.rng)
    }

    pub fn skip(&mut self) -> Result<PickOutcome> {
        self.session.skip(self.tasks.tasks(), &mut self.rng)
    }

    pub fn complete(&mut self) -> Result<Completion> {
        self.complete_at(Utc::now())
    }

    pub fn complete_at(&mut self, now: DateTime<Utc>) -> Result<Completion> {
        self.session
            .complete(&mut self.logs, &mut self.store, &mut self.rng, now)
    }

    /// Drives the timed reset. Call regularly from the event loop.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Utc::now())
    }

    pub fn tick_at(&mut self, now: DateTime<Utc>) -> bool {
        self.session.tick(now)
    }

    /// Drops any pending reset; used on teardown.
    pub fn cancel_reset(&mut self) -> bool {
        self.session.cancel_reset()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_state(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn last_completed_at(&self, task_id: &str) -> Option<i64> {
        self.logs.last_completed_at(task_id)
    }

    pub fn recent_logs(&self, limit: usize) -> Vec<&TaskLog> {
        self.logs.recent(limit)
    }

    pub fn current_card(&self) -> Option<TaskCard> {
        self.session.active_task().map(|task| TaskCard {
            task: task.clone(),
            last_completed_at: self.last_completed_at(&task.id),
        })
    }

    /// Stored preference; `None` means follow the system.
    pub fn theme(&self) -> Option<Theme> {
        self.theme
    }

    pub fn effective_theme(&self, system_dark: bool) -> Theme {
        self.theme.unwrap_or(if system_dark { Theme::Dark } else { Theme::Light })
    }

    pub fn toggle_theme(&mut self, system_dark: bool) -> Result<Theme> {
        let next = self.effective_theme(system_dark).toggled();
        self.theme = Some(next);
        save_json(&mut self.store, THEME_KEY, next.as_str())?;
        Ok(next)
    }
}

fn load_theme(store: &dyn KeyValueStore) -> Result<Option<Theme>, StorageError> {
    let Some(raw) = load_json::<String>(store, THEME_KEY)? else {
        return Ok(None);
    };

    let theme = Theme::parse(&raw);
    if theme.is_none() {
        warn!(value = %raw.trim(), "ignoring unknown theme preference");
    }
    Ok(theme)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::domain::{Task, Theme};
    use crate::session::{PickOutcome, Session, SessionState};
    use crate::storage::{KeyValueStore, MemoryStore, TASKS_KEY, THEME_KEY, save_json};

    use super::OneThing;

    fn open(store: MemoryStore) -> OneThing<MemoryStore> {
        OneThing::with_rng(store, Session::default(), StdRng::seed_from_u64(21)).unwrap()
    }

    #[test]
    fn opens_with_defaults_on_first_run() {
        let app = open(MemoryStore::new());
        assert_eq!(app.tasks().len(), 8);
        assert!(app.logs().is_empty());
        assert!(app.store().get(TASKS_KEY).unwrap().is_some());
        assert_eq!(app.theme(), None);
    }

    #[test]
    fn card_carries_last_completion() {
        let mut store = MemoryStore::new();
        save_json(&mut store, TASKS_KEY, &vec![Task::new("1", "Breathe", "🌬️", true)]).unwrap();
        let mut app = open(store);

        app.pick().unwrap();
        assert_eq!(app.current_card().unwrap().last_completed_at, None);

        let now = Utc::now();
        let completion = app.complete_at(now).unwrap();
        assert_eq!(app.last_completed_at("1"), Some(completion.log.completed_at));
        assert_eq!(
            app.current_card().unwrap().last_completed_at,
            Some(now.timestamp_millis())
        );

        assert!(app.tick_at(now + Duration::seconds(3)));
        assert_eq!(app.current_card(), None);
        assert_eq!(app.session_state().state, SessionState::Idle);
    }

    #[test]
    fn reload_reads_back_persisted_state() {
        let mut app = open(MemoryStore::new());
        let added = app.add_task("Call a friend", "📞").unwrap();
        app.set_task_active("1", false).unwrap();
        app.pick().unwrap();
        app.complete().unwrap();

        let reopened = open(app.store().clone());
        assert_eq!(reopened.tasks(), app.tasks());
        assert_eq!(reopened.logs(), app.logs());
        assert_eq!(reopened.task(&added.id).map(|task| task.title.as_str()), Some("Call a friend"));
    }

    #[test]
    fn toggle_task_flips_flag() {
        let mut app = open(MemoryStore::new());
        assert!(!app.toggle_task_active("4").unwrap());
        assert!(app.toggle_task_active("4").unwrap());
        assert!(app.toggle_task_active("nope").is_err());
    }

    #[test]
    fn active_count_tracks_toggles() {
        let mut app = open(MemoryStore::new());
        assert_eq!(app.active_count(), 8);
        app.set_task_active("2", false).unwrap();
        app.set_task_active("5", false).unwrap();
        assert_eq!(app.active_count(), 6);
    }

    #[test]
    fn everything_inactive_keeps_session_idle() {
        let mut app = open(MemoryStore::new());
        let ids = app.tasks().iter().map(|task| task.id.clone()).collect::<Vec<_>>();
        for id in ids {
            app.set_task_active(&id, false).unwrap();
        }

        assert_eq!(app.pick().unwrap(), PickOutcome::NothingAvailable);
        assert_eq!(app.session_state().state, SessionState::Idle);
    }

    #[test]
    fn theme_toggle_persists_and_follows_system_until_set() {
        let mut app = open(MemoryStore::new());
        assert_eq!(app.effective_theme(true), Theme::Dark);
        assert_eq!(app.effective_theme(false), Theme::Light);

        assert_eq!(app.toggle_theme(true).unwrap(), Theme::Light);
        assert_eq!(app.store().get(THEME_KEY).unwrap().as_deref(), Some("\"light\""));
        assert_eq!(app.effective_theme(true), Theme::Light);

        let reopened = open(app.store().clone());
        assert_eq!(reopened.theme(), Some(Theme::Light));
    }

    #[test]
    fn unknown_theme_value_is_ignored() {
        let mut store = MemoryStore::new();
        store.set(THEME_KEY, "\"sepia\"").unwrap();
        assert_eq!(open(store).theme(), None);
    }
}
