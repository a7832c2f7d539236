use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use dayplan::ai::keyring::ApiKeyVault;
use dayplan::ai::{ChatClient, PlanGenerator};
use dayplan::config::{self, DayplanConfig, API_KEY_ENV};
use dayplan::core::calendar::{group_by_hour, hour_label, week_of};
use dayplan::core::draft::{PlanPrompt, TaskDraft};
use dayplan::core::stats::{StatusFilter, TaskStats};
use dayplan::core::task::{sorted_by_time, Task};
use dayplan::storage::{JsonDirStore, KeyValueStore};
use dayplan::PlanStore;

#[derive(Parser)]
#[command(name = "dayplan", version, about = "Plan your day, by hand or with an AI-generated schedule")]
struct Cli {
    /// Config file (defaults to ~/.config/dayplan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Local(LocalCommand),
    /// Generate today's plan from a free-text request
    Plan {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// Save the API key in the system keyring
    SetKey { key: String },
    /// Remove the API key from the system keyring
    ForgetKey,
    /// Check that the configured API key works
    TestKey,
}

/// Commands that only touch local state.
#[derive(Subcommand)]
enum LocalCommand {
    /// List tasks for a day, sorted by time
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Show every stored task regardless of date
        #[arg(long)]
        all: bool,
    },
    /// Add a task
    Add {
        /// Time of day, HH:MM
        time: String,
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Edit a task's title, time or date
    Edit {
        /// Task id or unique id prefix
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Mark a task done, or not done
    Toggle {
        /// Task id or unique id prefix
        id: String,
    },
    /// Show the week containing a day
    Week {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show a day's tasks grouped by hour
    Timeline {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Completed and pending counts
    Stats {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

/// Set up logging to the systemd user journal (`journalctl --user -t dayplan -f`).
/// Dayplan targets log at info/debug (per config), everything else at warn.
fn init_logging() {
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("dayplan") {
                let max = if dayplan::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("dayplan".to_string()),
        Err(e) => {
            eprintln!("dayplan: journal unavailable, logging disabled ({})", e);
            return;
        }
    };

    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so dayplan debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

/// Environment first, then the keyring.
async fn resolve_api_key() -> Option<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            return Some(key);
        }
    }
    let loaded = match ApiKeyVault::open().await {
        Ok(vault) => vault.load().await,
        Err(e) => Err(e),
    };
    match loaded {
        Ok(key) => key,
        Err(e) => {
            log::warn!("Could not read API key from keyring: {}", e);
            None
        }
    }
}

async fn chat_client(config: &DayplanConfig) -> Result<Option<ChatClient>, Box<dyn std::error::Error>> {
    match resolve_api_key().await {
        Some(key) => Ok(Some(ChatClient::new(key, config.chat_settings())?)),
        None => Ok(None),
    }
}

/// Find a task by full id or unique id prefix.
fn resolve_id(tasks: &[Task], needle: &str) -> Result<Uuid, String> {
    if let Ok(id) = Uuid::parse_str(needle) {
        return Ok(id);
    }
    let needle = needle.to_ascii_lowercase();
    let matches: Vec<Uuid> = tasks
        .iter()
        .filter(|t| t.id.to_string().starts_with(&needle))
        .map(|t| t.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(format!("no task matches {}", needle)),
        _ => Err(format!("{} matches {} tasks, use more of the id", needle, matches.len())),
    }
}

fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

fn print_task(task: &Task) {
    let mark = if task.completed { "x" } else { " " };
    println!("  [{}] {:>5}  {}  ({})", mark, task.time, task.title, short_id(&task.id));
}

fn print_stats(stats: TaskStats) {
    println!(
        "{} tasks, {} completed, {} pending",
        stats.total, stats.completed, stats.pending
    );
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = DayplanConfig::load(&config_path)?;

    dayplan::set_debug_logging(config.debug_logging || cli.debug);
    init_logging();

    let storage = JsonDirStore::new(&config.data_directory);

    match cli.command {
        Command::SetKey { key } => {
            if key.trim().is_empty() {
                return Err("API key is empty".into());
            }
            ApiKeyVault::open().await?.store(&key).await?;
            println!("API key saved");
        }
        Command::ForgetKey => {
            let removed = ApiKeyVault::open().await?.forget().await?;
            println!("Removed {} stored API key(s)", removed);
        }
        Command::TestKey => match chat_client(&config).await? {
            Some(client) => println!("{}", client.test_api_key().await?),
            None => return Err(format!("no API key: set {} or run `dayplan set-key`", API_KEY_ENV).into()),
        },
        Command::Plan { prompt } => {
            let prompt = PlanPrompt::new(prompt.join(" "));
            let Some(prompt) = prompt.submit() else {
                return Err("plan request is empty".into());
            };
            let store = PlanStore::open(chat_client(&config).await?, storage);
            let before = store.tasks().len();
            store.generate_day_plan(&prompt).await;
            if let Some(error) = store.error() {
                return Err(error.into());
            }
            let tasks = store.tasks();
            let added = &tasks[before..];
            println!("Added {} tasks for {}", added.len(), today());
            for task in sorted_by_time(added) {
                print_task(&task);
            }
        }
        Command::Local(command) => {
            run_offline(command, PlanStore::open(None::<ChatClient>, storage))?
        }
    }

    Ok(())
}

fn run_offline<G: PlanGenerator, S: KeyValueStore>(
    command: LocalCommand,
    store: PlanStore<G, S>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        LocalCommand::List { date, status, all } => {
            let tasks = if all {
                store.tasks()
            } else {
                store.tasks_by_date(date.unwrap_or_else(today))
            };
            let shown: Vec<Task> = tasks.into_iter().filter(|t| status.matches(t)).collect();
            for task in sorted_by_time(&shown) {
                print_task(&task);
            }
            print_stats(TaskStats::of(&shown));
        }
        LocalCommand::Add { time, title, date } => {
            let task = TaskDraft::new(title.join(" "), time, date.unwrap_or_else(today)).into_task()?;
            println!("Added {}", short_id(&task.id));
            store.add_task(task);
        }
        LocalCommand::Edit { id, title, time, date } => {
            let tasks = store.tasks();
            let id = resolve_id(&tasks, &id)?;
            let Some(current) = tasks.iter().find(|t| t.id == id) else {
                return Err(format!("no task {}", id).into());
            };
            let mut draft = TaskDraft::from_task(current);
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(time) = time {
                draft.time = time;
            }
            if let Some(date) = date {
                draft.date = date;
            }
            let edited = draft.apply_to(current)?;
            store.update_task(id, edited);
        }
        LocalCommand::Toggle { id } => {
            let id = resolve_id(&store.tasks(), &id)?;
            if !store.toggle_task(id) {
                return Err(format!("no task {}", id).into());
            }
        }
        LocalCommand::Week { date } => {
            let selected = date.unwrap_or_else(today);
            for day in week_of(selected) {
                let marker = if day == selected { "*" } else { " " };
                println!("{} {}", marker, day.format("%a %d %b"));
                for task in sorted_by_time(&store.tasks_by_date(day)) {
                    print_task(&task);
                }
            }
        }
        LocalCommand::Timeline { date } => {
            let date = date.unwrap_or_else(today);
            println!("{}", date.format("%A, %B %-d"));
            for (hour, tasks) in group_by_hour(&store.tasks_by_date(date)) {
                println!("{}", hour_label(hour));
                for task in &tasks {
                    print_task(task);
                }
            }
        }
        LocalCommand::Stats { date } => {
            let tasks = match date {
                Some(date) => store.tasks_by_date(date),
                None => store.tasks(),
            };
            print_stats(TaskStats::of(&tasks));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn resolves_unique_prefix() {
        let a = Task::with_id(
            Uuid::parse_str("aaaa0000-0000-4000-8000-000000000000").unwrap(),
            "A",
            "08:00",
            day(),
        );
        let b = Task::with_id(
            Uuid::parse_str("aabb0000-0000-4000-8000-000000000000").unwrap(),
            "B",
            "09:00",
            day(),
        );
        let tasks = vec![a.clone(), b];
        assert_eq!(resolve_id(&tasks, "aaaa"), Ok(a.id));
        assert!(resolve_id(&tasks, "aa").is_err());
        assert!(resolve_id(&tasks, "ff").is_err());
        assert_eq!(resolve_id(&tasks, &a.id.to_string()), Ok(a.id));
    }

    #[test]
    fn cli_parses_status_and_date() {
        let cli = Cli::try_parse_from(["dayplan", "list", "--date", "2026-03-02", "--status", "pending"]).unwrap();
        match cli.command {
            Command::Local(LocalCommand::List { date, status, all }) => {
                assert_eq!(date, Some(day()));
                assert_eq!(status, StatusFilter::Pending);
                assert!(!all);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn remote_and_local_commands_both_parse() {
        let cli = Cli::try_parse_from(["dayplan", "plan", "gym", "then", "groceries"]).unwrap();
        assert!(matches!(cli.command, Command::Plan { ref prompt } if prompt.len() == 3));

        let cli = Cli::try_parse_from(["dayplan", "toggle", "ab12"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Local(LocalCommand::Toggle { ref id }) if id == "ab12"
        ));

        let cli = Cli::try_parse_from(["dayplan", "forget-key"]).unwrap();
        assert!(matches!(cli.command, Command::ForgetKey));
    }
}
