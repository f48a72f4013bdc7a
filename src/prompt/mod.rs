//! Prompts for each clinical analysis task.

pub mod build;
pub mod history;
pub mod task;
pub mod utils;

pub use build::{build_prompts, PromptSet};
pub use history::{instructions_markdown, PatientHistory, HISTORY_SECTIONS};
pub use task::TaskLabel;
pub use utils::{Error, SYSTEM_IDENTITY};
