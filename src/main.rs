use std::process::ExitCode;
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use snipvault::services::updater::UpdateStatus;
use snipvault::{config, Database, SnippetStore, UpdateChecker};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .compact()
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("startup failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> snipvault::AppResult<()> {
    let db_path = config::db_path()?;
    let db = Arc::new(Database::open(&db_path)?);

    let launch = config::prepare_launch(&db)?;
    info!(
        "vault ready at {} (theme {}, hotkey {})",
        db_path.display(),
        launch.theme,
        launch.hotkey
    );
    if launch.show_release_notes {
        info!("updated to version {}, release notes pending", config::APP_VERSION);
    }

    let store = SnippetStore::new(db);
    let types = store.types(false)?;
    info!(
        "{} snippet types, {} active snippets",
        types.len(),
        store.list(None, false)?.len()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| snipvault::AppError::Internal(err.to_string()))?;

    let checker = UpdateChecker::new()?;
    match runtime.block_on(checker.check(config::APP_VERSION)) {
        UpdateStatus::UpdateAvailable(release) => {
            info!("update available: {}", release.version);
            if !release.notes.is_empty() {
                info!("release notes:\n{}", release.notes);
            }
        }
        UpdateStatus::UpToDate => info!("running the latest version"),
    }

    Ok(())
}
