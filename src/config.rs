use std::path::PathBuf;

use chrono::Local;
use directories::BaseDirs;
use tracing::info;

use crate::db::Database;
use crate::error::{AppError, AppResult};

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const VAULT_DIR_NAME: &str = ".snipvault";
const DB_FILE_NAME: &str = "snipvault.db";

/// Per-user vault directory under the home directory.
pub fn vault_dir() -> AppResult<PathBuf> {
    let base = BaseDirs::new()
        .ok_or_else(|| AppError::Internal("could not resolve the user home directory".to_string()))?;
    Ok(base.home_dir().join(VAULT_DIR_NAME))
}

pub fn db_path() -> AppResult<PathBuf> {
    Ok(vault_dir()?.join(DB_FILE_NAME))
}

/// Everything the UI layer needs to know right after the vault is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchState {
    pub show_release_notes: bool,
    pub hotkey: String,
    pub theme: String,
}

/// Runs the per-launch configuration pass: loads the stored preferences and
/// decides whether this launch is the first one on a new version, in which
/// case the release notes should be shown once and the release record is
/// rewritten.
pub fn prepare_launch(db: &Database) -> AppResult<LaunchState> {
    prepare_launch_as(db, APP_VERSION)
}

fn prepare_launch_as(db: &Database, current_version: &str) -> AppResult<LaunchState> {
    let today = Local::now().format("%Y-%m-%d").to_string();

    let show_release_notes = match db.release_record()? {
        Some(record) if record.version == current_version => false,
        Some(record) => {
            info!(
                "version changed from {} to {current_version}",
                record.version
            );
            db.set_release_record(current_version, &today)?;
            true
        }
        // First launch: seed the record, nothing to announce yet.
        None => {
            db.set_release_record(current_version, &today)?;
            false
        }
    };

    Ok(LaunchState {
        show_release_notes,
        hotkey: db.hotkey()?,
        theme: db.default_theme()?,
    })
}

/// Validates and canonicalizes a popup hotkey, then stores it. Accepted form
/// is one or more modifiers followed by a key, joined with `+`.
pub fn set_hotkey(db: &Database, input: &str) -> AppResult<String> {
    let canonical = validate_hotkey(input)?;
    db.set_hotkey(&canonical)?;
    Ok(canonical)
}

pub fn validate_hotkey(input: &str) -> AppResult<String> {
    let parts: Vec<&str> = input
        .split('+')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.len() < 2 {
        return Err(AppError::InvalidInput(
            "hotkey must include at least one modifier and one key".to_string(),
        ));
    }

    let mut canonical = Vec::with_capacity(parts.len());
    for part in &parts[..parts.len() - 1] {
        let modifier = match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => "Ctrl",
            "alt" => "Alt",
            "shift" => "Shift",
            "super" | "meta" | "cmd" => "Super",
            other => {
                return Err(AppError::InvalidInput(format!(
                    "unsupported modifier '{other}'"
                )))
            }
        };
        canonical.push(modifier.to_string());
    }

    let key = parts[parts.len() - 1];
    if key.chars().count() == 1 {
        canonical.push(key.to_ascii_uppercase());
    } else {
        canonical.push(key.to_string());
    }

    Ok(canonical.join("+"))
}
