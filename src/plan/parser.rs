use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::core::task::{Task, CLOCK_RE};

/// A schedule line recognized in a generated plan, before it becomes a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTask {
    pub title: String,
    pub time: String,
}

/// Wrap the user's request in the schedule-format instructions sent to the model.
pub fn compose_prompt(user_prompt: &str) -> String {
    format!(
        "Create a detailed schedule for the following plan: {}. \
         Format each task with a specific time (e.g., \"9:00 AM - Morning routine\"). \
         Focus only on actionable tasks, no introductory text. \
         Do not use asterisks or other special characters.",
        user_prompt.trim()
    )
}

/// Extract time-stamped lines from a generated plan.
///
/// Blank lines and lines without a clock time are narration and get dropped.
/// Emphasis markers are stripped from the title; the first clock time in the
/// cleaned line becomes the task time.
pub fn parse_plan(response: &str) -> Vec<PlannedTask> {
    response
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| CLOCK_RE.is_match(line))
        .filter_map(|line| {
            let title = line.replace('*', "").trim().to_string();
            // Removing '*' never splits a match, so this always finds one.
            let time = CLOCK_RE.find(&title)?.as_str().to_string();
            Some(PlannedTask { title, time })
        })
        .collect()
}

/// Turn planned lines into tasks for `date`, with ids unused by `existing`
/// and unique within the batch.
pub fn into_tasks(planned: Vec<PlannedTask>, date: NaiveDate, existing: &HashSet<Uuid>) -> Vec<Task> {
    let mut taken: HashSet<Uuid> = HashSet::with_capacity(planned.len());
    planned
        .into_iter()
        .map(|p| {
            let mut id = Uuid::new_v4();
            while existing.contains(&id) || taken.contains(&id) {
                id = Uuid::new_v4();
            }
            taken.insert(id);
            Task::with_id(id, p.title, p.time, date)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_timed_lines() {
        let response = "9:00 AM - Stretch\n*Lunch at noon*\n13:30 - Review notes\nHave a great day!";
        let planned = parse_plan(response);
        assert_eq!(
            planned,
            vec![
                PlannedTask {
                    title: "9:00 AM - Stretch".to_string(),
                    time: "9:00".to_string(),
                },
                PlannedTask {
                    title: "13:30 - Review notes".to_string(),
                    time: "13:30".to_string(),
                },
            ]
        );
    }

    #[test]
    fn strips_emphasis_and_whitespace() {
        let planned = parse_plan("  **10:15** - *Deep work*  \n\n\n");
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].title, "10:15 - Deep work");
        assert_eq!(planned[0].time, "10:15");
    }

    #[test]
    fn first_time_wins() {
        let planned = parse_plan("14:00 - 15:30 Meetings");
        assert_eq!(planned[0].time, "14:00");
    }

    #[test]
    fn narration_only_yields_nothing() {
        assert!(parse_plan("Here is your plan!\n\nEnjoy.").is_empty());
        assert!(parse_plan("").is_empty());
    }

    #[test]
    fn ignores_non_ascii_digits() {
        let planned = parse_plan("٩:٣٠ - Tea\n９:００ - Walk\nNarration\n10:00 - Read");
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].time, "10:00");
    }

    #[test]
    fn handles_crlf() {
        let planned = parse_plan("8:00 - Breakfast\r\n9:00 - Walk\r\n");
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[1].title, "9:00 - Walk");
    }

    #[test]
    fn prompt_embeds_request() {
        let prompt = compose_prompt("  gym then groceries ");
        assert!(prompt.contains("following plan: gym then groceries."));
        assert!(prompt.contains("Do not use asterisks"));
    }

    #[test]
    fn batch_ids_are_fresh() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let existing: HashSet<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let tasks = into_tasks(parse_plan("8:00 a\n9:00 b\n10:00 c"), date, &existing);
        let ids: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.is_disjoint(&existing));
        assert!(tasks.iter().all(|t| t.date == date && !t.completed));
    }
}
