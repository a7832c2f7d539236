use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;

/// Matches a clock time anywhere in a line: `9:00`, `13:30`, `9:00 AM - ...`.
/// ASCII digits only; `\d` in `regex` would also accept other scripts.
pub(crate) static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{1,2}:[0-9]{2}").unwrap());

static STRICT_CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<hour>[0-9]{1,2}):(?P<minute>[0-9]{2})\s*$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    /// Wall-clock time of day, 24-hour `H:MM` or `HH:MM`.
    pub time: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(title: impl Into<String>, time: impl Into<String>, date: NaiveDate) -> Self {
        Self::with_id(Uuid::new_v4(), title, time, date)
    }

    pub fn with_id(
        id: Uuid,
        title: impl Into<String>,
        time: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            time: time.into(),
            date,
            completed: false,
        }
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }

    /// Minutes since midnight. Parts that fail to parse count as zero.
    pub fn minutes(&self) -> u32 {
        let mut parts = self.time.split(':');
        let hours = parts
            .next()
            .and_then(|h| h.trim().parse::<u32>().ok())
            .unwrap_or(0);
        let minutes = parts
            .next()
            .and_then(|m| m.trim().parse::<u32>().ok())
            .unwrap_or(0);
        hours.saturating_mul(60).saturating_add(minutes)
    }

    pub fn hour(&self) -> u32 {
        self.minutes() / 60
    }
}

/// Sort tasks ascending by time of day. Ties keep their collection order.
pub fn sort_by_time(tasks: &mut [Task]) {
    tasks.sort_by_key(Task::minutes);
}

pub fn sorted_by_time(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sort_by_time(&mut sorted);
    sorted
}

/// Returns true if `s` contains a clock time anywhere.
pub fn is_clock_time(s: &str) -> bool {
    CLOCK_RE.is_match(s)
}

/// Parse a strict `HH:MM` value into (hour, minute).
pub fn parse_clock(s: &str) -> Option<(u32, u32)> {
    let caps = STRICT_CLOCK_RE.captures(s)?;
    let hour: u32 = caps["hour"].parse().ok()?;
    let minute: u32 = caps["minute"].parse().ok()?;
    if hour < 24 && minute < 60 {
        Some((hour, minute))
    } else {
        None
    }
}

pub fn format_clock(hour: u32, minute: u32) -> String {
    format!("{:02}:{:02}", hour, minute)
}
