use std::fmt;
use std::str::FromStr;

use super::task::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl TaskStats {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total: tasks.len(),
            completed,
            pending: tasks.len() - completed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            other => Err(format!("unknown status filter: {}", other)),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Vec<Task> {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut done = Task::new("Done", "08:00", day);
        done.completed = true;
        vec![done, Task::new("Open", "09:00", day), Task::new("Open 2", "10:00", day)]
    }

    #[test]
    fn counts() {
        let stats = TaskStats::of(&sample());
        assert_eq!(stats, TaskStats { total: 3, completed: 1, pending: 2 });
        assert_eq!(TaskStats::of(&[]), TaskStats::default());
    }

    #[test]
    fn filter() {
        let tasks = sample();
        let pending: Vec<_> = tasks.iter().filter(|t| StatusFilter::Pending.matches(t)).collect();
        assert_eq!(pending.len(), 2);
        assert_eq!("Completed".parse::<StatusFilter>(), Ok(StatusFilter::Completed));
        assert!("later".parse::<StatusFilter>().is_err());
        assert!("done".parse::<StatusFilter>().is_err());
    }
}
