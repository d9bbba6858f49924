//! Core of a "do one small thing" habit nudge: a curated task list, an
//! append-only completion log, a no-immediate-repeat random picker and the
//! idle → active → completed session that ties them together.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod logs;
pub mod paths;
pub mod selector;
pub mod session;
pub mod storage;
pub mod tasks;

pub use app::{OneThing, TaskCard};
pub use domain::{Task, TaskLog, Theme};
pub use error::{Error, Result};
pub use session::{Completion, PickOutcome, Session, SessionSnapshot, SessionState};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
