pub mod parser;

pub use parser::{compose_prompt, into_tasks, parse_plan, PlannedTask};
