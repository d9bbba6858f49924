use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use one_thing::storage::{TASKS_KEY, save_json};
use one_thing::{
    Error, FileStore, KeyValueStore, MemoryStore, OneThing, PickOutcome, Session, SessionState, Task,
};
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

fn open<S: KeyValueStore>(store: S, seed: u64) -> OneThing<S> {
    OneThing::with_rng(store, Session::default(), StdRng::seed_from_u64(seed))
        .expect("store should open")
}

fn seeded_store(tasks: &[Task]) -> MemoryStore {
    let mut store = MemoryStore::new();
    save_json(&mut store, TASKS_KEY, tasks).expect("seed tasks");
    store
}

#[test]
fn breathe_scenario_runs_through_a_full_session() {
    let store = seeded_store(&[Task::new("1", "Breathe", "🌬️", true)]);
    let mut app = open(store, 1);
    let now = Utc.with_ymd_and_hms(2026, 2, 3, 7, 30, 0).unwrap();

    assert_eq!(app.last_completed_at("1"), None);

    let picked = app.pick().expect("pick from idle");
    assert_eq!(picked, PickOutcome::Picked(Task::new("1", "Breathe", "🌬️", true)));
    let state = app.session_state();
    assert_eq!(state.state, SessionState::Active);
    assert_eq!(state.active_task.map(|task| task.id), Some("1".to_string()));

    let completion = app.complete_at(now).expect("complete from active");
    assert_eq!(app.logs().len(), 1);
    assert_eq!(completion.log.task_id, "1");
    assert_eq!(app.session_state().state, SessionState::Completed);
    assert_eq!(app.last_completed_at("1"), Some(now.timestamp_millis()));

    assert!(app.tick_at(now + Duration::milliseconds(2_500)));
    let state = app.session_state();
    assert_eq!(state.state, SessionState::Idle);
    assert_eq!(state.active_task, None);
    assert_eq!(state.feedback_message, "");
}

#[test]
fn whitespace_title_is_rejected_and_list_unchanged() {
    let mut app = open(MemoryStore::new(), 2);
    let before = app.tasks().to_vec();

    let err = app.add_task("  ", "").expect_err("blank title must fail");
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(app.tasks(), before.as_slice());
    assert_eq!(app.load_tasks().unwrap(), before.as_slice());
}

#[test]
fn skipping_between_two_tasks_alternates() {
    let store = seeded_store(&[
        Task::new("a", "First", "1️⃣", true),
        Task::new("b", "Second", "2️⃣", true),
    ]);
    let mut app = open(store, 3);

    let PickOutcome::Picked(first) = app.pick().unwrap() else {
        panic!("two tasks are active");
    };

    let mut previous = first.id;
    let mut seen = HashSet::new();
    for _ in 0..100 {
        let PickOutcome::Picked(next) = app.skip().unwrap() else {
            panic!("skip should always find the other task");
        };
        assert_ne!(next.id, previous);
        seen.insert(next.id.clone());
        previous = next.id;
    }
    assert_eq!(seen.len(), 2);
}

#[test]
fn logs_survive_task_deletion() {
    let mut app = open(MemoryStore::new(), 4);
    let store_tasks = app.tasks().to_vec();
    for task in &store_tasks[1..] {
        app.set_task_active(&task.id, false).unwrap();
    }

    app.pick().unwrap();
    app.complete().unwrap();
    app.remove_task(&store_tasks[0].id).unwrap();

    let reopened = open(app.store().clone(), 5);
    assert_eq!(reopened.logs().len(), 1);
    assert!(reopened.task(&store_tasks[0].id).is_none());
    assert!(reopened.last_completed_at(&store_tasks[0].id).is_some());
}

#[test]
fn file_store_persists_across_launches() {
    let dir = TempDir::new().unwrap();

    let added_id = {
        let mut app = open(FileStore::new(dir.path()), 6);
        let added = app.add_task("Water the plants", "🪴").unwrap();
        app.set_task_active("2", false).unwrap();
        app.pick().unwrap();
        app.complete().unwrap();
        app.toggle_theme(false).unwrap();
        added.id
    };

    let app = open(FileStore::new(dir.path()), 7);
    assert_eq!(app.tasks().len(), 9);
    assert_eq!(app.tasks().last().map(|task| task.id.clone()), Some(added_id));
    assert!(!app.task("2").unwrap().is_active);
    assert_eq!(app.logs().len(), 1);
    assert_eq!(app.session_state().state, SessionState::Idle);
    assert_eq!(app.theme(), Some(one_thing::Theme::Dark));
}

#[test]
fn corrupt_task_record_is_reported() {
    let mut store = MemoryStore::new();
    store.set(TASKS_KEY, "[{\"id\":").unwrap();

    let err = OneThing::with_rng(store, Session::default(), StdRng::seed_from_u64(8))
        .err()
        .expect("corrupt data must not load");
    assert!(matches!(err, Error::Persistence(_)));
}
