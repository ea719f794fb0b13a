pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use config::{prepare_launch, LaunchState, APP_VERSION};
pub use db::{Database, NewSnippet, Snippet};
pub use error::{AppError, AppResult};
pub use services::snippets::SnippetStore;
pub use services::updater::{UpdateChecker, UpdateStatus};
