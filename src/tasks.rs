use rand::Rng;
use tracing::{debug, info};

use crate::domain::{DEFAULT_ICON, Task, default_tasks, generate_unique_id};
use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, TASKS_KEY, load_json, save_json};

/// Ordered, persisted list of user tasks. Insertion order is display order.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Loads the persisted list. On first run the built-in defaults are
    /// written back immediately.
    pub fn load(store: &mut dyn KeyValueStore) -> Result<Self> {
        if let Some(tasks) = load_json::<Vec<Task>>(store, TASKS_KEY)? {
            debug!(count = tasks.len(), "loaded tasks");
            return Ok(Self { tasks });
        }

        info!("no stored tasks, seeding defaults");
        let seeded = Self {
            tasks: default_tasks(),
        };
        seeded.persist(store)?;
        Ok(seeded)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_active).count()
    }

    pub fn add<R: Rng + ?Sized>(
        &mut self,
        store: &mut dyn KeyValueStore,
        rng: &mut R,
        title: &str,
        icon: &str,
    ) -> Result<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("task title is required".to_string()));
        }

        let icon = match icon.trim() {
            "" => DEFAULT_ICON,
            icon => icon,
        };

        let id = generate_unique_id(rng, self.tasks.iter().map(|task| task.id.as_str()));
        let task = Task::new(id, title, icon, true);
        self.tasks.push(task.clone());
        info!(id = %task.id, title = %task.title, "added task");

        self.persist(store)?;
        Ok(task)
    }

    pub fn set_active(&mut self, store: &mut dyn KeyValueStore, id: &str, active: bool) -> Result<()> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        task.is_active = active;
        info!(%id, active, "updated task");
        self.persist(store)
    }

    /// Removes the task if present. Logs that reference it are left alone.
    pub fn remove(&mut self, store: &mut dyn KeyValueStore, id: &str) -> Result<Option<Task>> {
        let removed = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .map(|index| self.tasks.remove(index));

        match &removed {
            Some(task) => info!(%id, title = %task.title, "removed task"),
            None => debug!(%id, "remove requested for unknown task"),
        }

        self.persist(store)?;
        Ok(removed)
    }

    fn persist(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        save_json(store, TASKS_KEY, &self.tasks)?;
        Ok(())
    }
}
