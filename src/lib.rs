pub mod ai;
pub mod config;
pub mod core;
pub mod plan;
pub mod storage;
pub mod store;

use std::sync::atomic::{AtomicBool, Ordering};

pub use store::{PlanState, PlanStore};

/// Whether debug logging is active, shared between the logger filter and the config.
static DEBUG_LOGGING: AtomicBool = AtomicBool::new(false);

pub fn set_debug_logging(enabled: bool) {
    DEBUG_LOGGING.store(enabled, Ordering::Relaxed);
}

pub fn debug_logging() -> bool {
    DEBUG_LOGGING.load(Ordering::Relaxed)
}
