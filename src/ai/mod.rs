pub mod client;
pub mod keyring;

pub use client::{ChatClient, ChatSettings, GenerateError, PlanGenerator};
