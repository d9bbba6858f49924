use rand::Rng;
use tracing::{debug, info};

use crate::domain::{TaskLog, generate_unique_id};
use crate::error::Result;
use crate::storage::{KeyValueStore, LOGS_KEY, load_json, save_json};

/// Append-only completion history.
#[derive(Debug, Clone, Default)]
pub struct LogStore {
    logs: Vec<TaskLog>,
}

impl LogStore {
    pub fn from_logs(logs: Vec<TaskLog>) -> Self {
        Self { logs }
    }

    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let logs = load_json::<Vec<TaskLog>>(store, LOGS_KEY)?.unwrap_or_default();
        debug!(count = logs.len(), "loaded logs");
        Ok(Self { logs })
    }

    pub fn logs(&self) -> &[TaskLog] {
        &self.logs
    }

    /// Records a completion. The entry is kept in memory even when the write
    /// fails, in which case the persistence error is returned.
    pub fn append<R: Rng + ?Sized>(
        &mut self,
        store: &mut dyn KeyValueStore,
        rng: &mut R,
        task_id: &str,
        completed_at: i64,
    ) -> Result<TaskLog> {
        let id = generate_unique_id(rng, self.logs.iter().map(|log| log.id.as_str()));
        let log = TaskLog {
            id,
            task_id: task_id.to_string(),
            completed_at,
        };
        self.logs.push(log.clone());
        info!(task_id, completed_at, "recorded completion");

        save_json(store, LOGS_KEY, &self.logs)?;
        Ok(log)
    }

    /// Latest completion for `task_id`; on equal timestamps the later entry wins.
    pub fn most_recent_for(&self, task_id: &str) -> Option<&TaskLog> {
        self.logs
            .iter()
            .filter(|log| log.task_id == task_id)
            .fold(None, |best: Option<&TaskLog>, log| match best {
                Some(best) if best.completed_at > log.completed_at => Some(best),
                _ => Some(log),
            })
    }

    pub fn last_completed_at(&self, task_id: &str) -> Option<i64> {
        self.most_recent_for(task_id).map(|log| log.completed_at)
    }

    /// Most recent completions first.
    pub fn recent(&self, limit: usize) -> Vec<&TaskLog> {
        let mut rows = self.logs.iter().enumerate().collect::<Vec<_>>();
        rows.sort_by(|(left_index, left), (right_index, right)| {
            right
                .completed_at
                .cmp(&left.completed_at)
                .then_with(|| right_index.cmp(left_index))
        });
        rows.into_iter().take(limit).map(|(_, log)| log).collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::domain::TaskLog;
    use crate::storage::MemoryStore;

    use super::LogStore;

    fn log(id: &str, task_id: &str, completed_at: i64) -> TaskLog {
        TaskLog {
            id: id.to_string(),
            task_id: task_id.to_string(),
            completed_at,
        }
    }

    #[test]
    fn empty_store_loads_no_logs() {
        let store = MemoryStore::new();
        assert!(LogStore::load(&store).unwrap().logs().is_empty());
    }

    #[test]
    fn append_persists_full_history() {
        let mut store = MemoryStore::new();
        let mut rng = StdRng::seed_from_u64(11);
        let mut logs = LogStore::default();

        let first = logs.append(&mut store, &mut rng, "1", 1_000).unwrap();
        let second = logs.append(&mut store, &mut rng, "2", 2_000).unwrap();
        assert_ne!(first.id, second.id);

        let reloaded = LogStore::load(&store).unwrap();
        assert_eq!(reloaded.logs(), &[first, second]);
    }

    #[test]
    fn most_recent_picks_max_timestamp() {
        let logs = LogStore::from_logs(vec![
            log("a", "1", 500),
            log("b", "1", 900),
            log("c", "2", 2_000),
            log("d", "1", 700),
        ]);

        assert_eq!(logs.most_recent_for("1").map(|log| log.id.as_str()), Some("b"));
        assert_eq!(logs.last_completed_at("2"), Some(2_000));
        assert_eq!(logs.last_completed_at("3"), None);
    }

    #[test]
    fn equal_timestamps_resolve_to_last_inserted() {
        let logs = LogStore::from_logs(vec![log("a", "1", 500), log("b", "1", 500)]);
        assert_eq!(logs.most_recent_for("1").map(|log| log.id.as_str()), Some("b"));
    }

    #[test]
    fn recent_orders_newest_first() {
        let logs = LogStore::from_logs(vec![
            log("a", "1", 100),
            log("b", "2", 300),
            log("c", "3", 200),
        ]);
        let ids = logs.recent(2).into_iter().map(|log| log.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
