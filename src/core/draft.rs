use chrono::NaiveDate;
use thiserror::Error;

use super::task::{format_clock, parse_clock, Task};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),
}

/// Editable form of a task, as entered in the add/edit dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub time: String,
    pub date: NaiveDate,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, time: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            time: time.into(),
            date,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self::new(task.title.clone(), task.time.clone(), task.date)
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        self.normalized().map(|_| ())
    }

    /// Build a new task with a fresh id.
    pub fn into_task(self) -> Result<Task, DraftError> {
        let (title, time) = self.normalized()?;
        Ok(Task::new(title, time, self.date))
    }

    /// Apply the draft on top of `task`, keeping its id and completion flag.
    pub fn apply_to(&self, task: &Task) -> Result<Task, DraftError> {
        let (title, time) = self.normalized()?;
        Ok(Task {
            id: task.id,
            title,
            time,
            date: self.date,
            completed: task.completed,
        })
    }

    fn normalized(&self) -> Result<(String, String), DraftError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DraftError::EmptyTitle);
        }
        let (hour, minute) =
            parse_clock(&self.time).ok_or_else(|| DraftError::InvalidTime(self.time.clone()))?;
        Ok((title.to_string(), format_clock(hour, minute)))
    }
}

/// Accumulates the free-text plan request, typed or dictated in fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanPrompt {
    text: String,
}

impl PlanPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Append a recognized speech fragment.
    pub fn push_fragment(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        if !self.text.is_empty() && !self.text.ends_with(' ') {
            self.text.push(' ');
        }
        self.text.push_str(fragment);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The trimmed prompt, or `None` when there is nothing to submit.
    pub fn submit(&self) -> Option<String> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn empty_title_rejected() {
        let draft = TaskDraft::new("   ", "09:00", day());
        assert_eq!(draft.validate(), Err(DraftError::EmptyTitle));
    }

    #[test]
    fn bad_time_rejected() {
        let draft = TaskDraft::new("Run", "25:00", day());
        assert_eq!(
            draft.into_task(),
            Err(DraftError::InvalidTime("25:00".to_string()))
        );
    }

    #[test]
    fn into_task_trims_and_pads() {
        let task = TaskDraft::new("  Run  ", "7:05", day()).into_task().unwrap();
        assert_eq!(task.title, "Run");
        assert_eq!(task.time, "07:05");
        assert!(!task.completed);
    }

    #[test]
    fn apply_keeps_identity() {
        let mut original = Task::new("Run", "07:00", day());
        original.completed = true;
        let mut draft = TaskDraft::from_task(&original);
        draft.title = "Long run".to_string();
        draft.time = "06:30".to_string();

        let edited = draft.apply_to(&original).unwrap();
        assert_eq!(edited.id, original.id);
        assert!(edited.completed);
        assert_eq!(edited.title, "Long run");
        assert_eq!(edited.time, "06:30");
    }

    #[test]
    fn prompt_fragments_join_with_space() {
        let mut prompt = PlanPrompt::new("Work in the morning");
        prompt.push_fragment("gym at six");
        prompt.push_fragment("  ");
        assert_eq!(prompt.as_str(), "Work in the morning gym at six");
        assert_eq!(prompt.submit().as_deref(), Some("Work in the morning gym at six"));
    }

    #[test]
    fn blank_prompt_not_submitted() {
        let prompt = PlanPrompt::new("   ");
        assert!(prompt.is_blank());
        assert_eq!(prompt.submit(), None);
    }
}
