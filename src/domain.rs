use chrono::{DateTime, Local, TimeZone, Utc};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};

const ID_LEN: usize = 8;

pub const DEFAULT_ICON: &str = "✨";

pub const CELEBRATION_MESSAGES: [&str; 6] = [
    "Nicely done",
    "That was great",
    "Another good day",
    "Take a breather",
    "This matters",
    "Enjoy the moment",
];

/// A user-defined candidate activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub is_active: bool,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        icon: impl Into<String>,
        is_active: bool,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            icon: icon.into(),
            is_active,
        }
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.icon, self.title)
    }
}

/// One completed occurrence of a task. `task_id` is a plain back-reference:
/// the log outlives the task it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLog {
    pub id: String,
    pub task_id: String,
    /// Milliseconds since the Unix epoch.
    pub completed_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// The first-run task list.
pub fn default_tasks() -> Vec<Task> {
    [
        ("1", "Breathe deeply for a minute", "🌬️"),
        ("2", "Drink half a glass of warm water", "🍵"),
        ("3", "Stare out of the window", "🌳"),
        ("4", "Plug your phone in", "🔋"),
        ("5", "Throw away three things on your desk", "🗑️"),
        ("6", "Close your eyes for a while", "😌"),
        ("7", "Have a good stretch", "🙆"),
        ("8", "Splash water on your face", "💧"),
    ]
    .into_iter()
    .map(|(id, title, icon)| Task::new(id, title, icon, true))
    .collect()
}

pub fn generate_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

/// Generates an id that does not collide with any of `taken`.
pub fn generate_unique_id<'a, R, I>(rng: &mut R, taken: I) -> String
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = &'a str> + Clone,
{
    loop {
        let id = generate_id(rng);
        if !taken.clone().into_iter().any(|existing| existing == id) {
            return id;
        }
    }
}

pub fn to_millis(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// Human-readable recency of a completion, e.g. `3 h ago 14:05`.
pub fn format_last_done(completed_at: i64, now: DateTime<Utc>) -> String {
    format_last_done_in(completed_at, now, &Local)
}

pub fn format_last_done_in<Tz: TimeZone>(completed_at: i64, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(done) = DateTime::from_timestamp_millis(completed_at) else {
        return "unknown".to_string();
    };

    let diff = (now.timestamp_millis() - completed_at).max(0);
    let minutes = diff / 60_000;
    let hours = diff / 3_600_000;
    let days = diff / 86_400_000;

    let local = done.with_timezone(tz);
    let clock = local.format("%H:%M").to_string();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} min ago")
    } else if hours < 24 {
        format!("{hours} h ago {clock}")
    } else if days == 1 {
        format!("yesterday {clock}")
    } else if days < 30 {
        format!("{days} days ago {clock}")
    } else {
        format!("{} {clock}", local.format("%Y-%m-%d"))
    }
}
