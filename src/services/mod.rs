pub mod snippets;
pub mod updater;
