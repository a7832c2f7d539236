use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::ai::PlanGenerator;
use crate::core::task::Task;
use crate::plan::{compose_prompt, into_tasks, parse_plan};
use crate::storage::{KeyValueStore, STORE_KEY};

/// Message shown when plan generation fails for any reason.
pub const GENERATE_FAILED: &str = "Failed to generate plan";

const STATE_VERSION: u32 = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanState {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub loading: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// On-disk envelope for the persisted state.
#[derive(Debug, Deserialize)]
struct Persisted {
    state: PlanState,
    #[serde(default)]
    version: u32,
}

/// Single owner of the task list. Views read snapshots or subscribe for
/// changes; every mutation goes through here and is written back to storage.
pub struct PlanStore<G, S> {
    generator: G,
    storage: S,
    state: watch::Sender<PlanState>,
}

impl<G: PlanGenerator, S: KeyValueStore> PlanStore<G, S> {
    /// Open the store, restoring tasks persisted under [`STORE_KEY`].
    pub fn open(generator: G, storage: S) -> Self {
        let tasks = load_tasks(&storage);
        log::debug!("Opened plan store with {} tasks", tasks.len());
        let (state, _) = watch::channel(PlanState {
            tasks,
            loading: false,
            error: None,
        });
        Self {
            generator,
            storage,
            state,
        }
    }

    pub fn snapshot(&self) -> PlanState {
        self.state.borrow().clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.borrow().tasks.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Observe state changes. Receivers see the latest state, not every step.
    pub fn subscribe(&self) -> watch::Receiver<PlanState> {
        self.state.subscribe()
    }

    pub fn add_task(&self, task: Task) {
        log::debug!("Adding task {} at {}", task.id, task.time);
        self.mutate(|s| {
            s.tasks.push(task);
            true
        });
    }

    /// Replace the task with `id`. Unknown ids are ignored; the stored task
    /// keeps `id` whatever the replacement carries.
    pub fn update_task(&self, id: Uuid, mut task: Task) -> bool {
        task.id = id;
        let changed = self.mutate(|s| match s.tasks.iter_mut().find(|t| t.id == id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        });
        if !changed {
            log::debug!("update_task: no task {}", id);
        }
        changed
    }

    /// Flip completion on the task with `id`. Unknown ids are ignored.
    pub fn toggle_task(&self, id: Uuid) -> bool {
        let changed = self.mutate(|s| match s.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.toggle();
                true
            }
            None => false,
        });
        if !changed {
            log::debug!("toggle_task: no task {}", id);
        }
        changed
    }

    /// Tasks on `date`, in collection order.
    pub fn tasks_by_date(&self, date: NaiveDate) -> Vec<Task> {
        self.state
            .borrow()
            .tasks
            .iter()
            .filter(|t| t.date == date)
            .cloned()
            .collect()
    }

    pub fn clear_error(&self) {
        self.mutate(|s| s.error.take().is_some());
    }

    /// Generate a plan for today from a free-text request.
    pub async fn generate_day_plan(&self, prompt: &str) {
        let today = chrono::Local::now().date_naive();
        self.generate_day_plan_on(prompt, today).await;
    }

    /// Ask the generator for a schedule and append the parsed tasks under
    /// `date`. On failure the task list is left untouched and `error` is set.
    ///
    /// Overlapping calls are not serialized; each applies its own batch when
    /// its response arrives.
    pub async fn generate_day_plan_on(&self, prompt: &str, date: NaiveDate) {
        self.mutate(|s| {
            s.loading = true;
            s.error = None;
            true
        });

        let composed = compose_prompt(prompt);
        log::info!("Generating day plan for {}", date);

        match self.generator.generate(&composed).await {
            Ok(response) => {
                let planned = parse_plan(&response);
                self.mutate(|s| {
                    let existing: HashSet<Uuid> = s.tasks.iter().map(|t| t.id).collect();
                    let generated = into_tasks(planned, date, &existing);
                    log::info!("Plan generated {} tasks for {}", generated.len(), date);
                    s.tasks.extend(generated);
                    s.loading = false;
                    true
                });
            }
            Err(e) => {
                log::error!("Plan generation failed: {}", e);
                self.mutate(|s| {
                    s.error = Some(GENERATE_FAILED.to_string());
                    s.loading = false;
                    true
                });
            }
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut PlanState) -> bool) -> bool {
        let changed = self.state.send_if_modified(f);
        if changed {
            self.persist();
        }
        changed
    }

    fn persist(&self) {
        let json = {
            let state = self.state.borrow();
            let persisted = PersistedRef {
                state: &*state,
                version: STATE_VERSION,
            };
            serde_json::to_string(&persisted)
        };
        match json {
            Ok(json) => {
                if let Err(e) = self.storage.set(STORE_KEY, &json) {
                    log::error!("Failed to save plan store: {}", e);
                }
            }
            Err(e) => log::error!("Failed to serialize plan store: {}", e),
        }
    }
}

#[derive(Serialize)]
struct PersistedRef<'a> {
    state: &'a PlanState,
    version: u32,
}

/// Only tasks survive a restart; loading and error always start cleared.
fn load_tasks(storage: &impl KeyValueStore) -> Vec<Task> {
    let raw = match storage.get(STORE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::error!("Failed to read plan store: {}", e);
            return Vec::new();
        }
    };
    match serde_json::from_str::<Persisted>(&raw) {
        Ok(persisted) => {
            if persisted.version != STATE_VERSION {
                log::warn!(
                    "Plan store version {} differs from {}, loading anyway",
                    persisted.version,
                    STATE_VERSION
                );
            }
            persisted.state.tasks
        }
        Err(e) => {
            log::warn!("Discarding unreadable plan store: {}", e);
            Vec::new()
        }
    }
}
