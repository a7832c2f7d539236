pub mod calendar;
pub mod draft;
pub mod stats;
pub mod task;
