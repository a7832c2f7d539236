use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};

use super::task::{sorted_by_time, Task};

/// The seven days of the week containing `date`, starting on Sunday.
pub fn week_of(date: NaiveDate) -> [NaiveDate; 7] {
    let start = date - Duration::days(date.weekday().num_days_from_sunday() as i64);
    std::array::from_fn(|i| start + Duration::days(i as i64))
}

pub fn hour_label(hour: u32) -> String {
    format!("{:02}:00", hour)
}

/// One label per hour of the day: `00:00` through `23:00`.
pub fn hour_slots() -> Vec<String> {
    (0..24).map(hour_label).collect()
}

/// Tasks starting within `hour`, in collection order.
pub fn tasks_in_hour(tasks: &[Task], hour: u32) -> Vec<&Task> {
    tasks.iter().filter(|t| t.hour() == hour).collect()
}

/// Time-sorted tasks grouped by the hour they start in. Empty hours are omitted.
pub fn group_by_hour(tasks: &[Task]) -> BTreeMap<u32, Vec<Task>> {
    let mut grouped: BTreeMap<u32, Vec<Task>> = BTreeMap::new();
    for task in sorted_by_time(tasks) {
        grouped.entry(task.hour()).or_default().push(task);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2026-03-04 is a Wednesday
        let week = week_of(d(2026, 3, 4));
        assert_eq!(week[0], d(2026, 3, 1));
        assert_eq!(week[0].weekday(), Weekday::Sun);
        assert_eq!(week[6], d(2026, 3, 7));
        assert!(week.contains(&d(2026, 3, 4)));
    }

    #[test]
    fn week_of_sunday_is_itself() {
        assert_eq!(week_of(d(2026, 3, 1))[0], d(2026, 3, 1));
    }

    #[test]
    fn slots_cover_the_day() {
        let slots = hour_slots();
        assert_eq!(slots.len(), 24);
        assert_eq!(slots[0], "00:00");
        assert_eq!(slots[23], "23:00");
    }

    #[test]
    fn grouping_by_hour() {
        let day = d(2026, 3, 2);
        let tasks = vec![
            Task::new("Standup", "9:45", day),
            Task::new("Email", "9:05", day),
            Task::new("Lunch", "12:30", day),
        ];
        let grouped = group_by_hour(&tasks);
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![9, 12]);
        let nine: Vec<&str> = grouped[&9].iter().map(|t| t.title.as_str()).collect();
        assert_eq!(nine, vec!["Email", "Standup"]);

        let in_nine: Vec<&str> = tasks_in_hour(&tasks, 9).iter().map(|t| t.title.as_str()).collect();
        assert_eq!(in_nine, vec!["Standup", "Email"]);
        assert!(tasks_in_hour(&tasks, 3).is_empty());
    }
}
