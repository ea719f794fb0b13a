use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

const RELEASES_URL: &str = "https://api.github.com/repos/snipvault/snipvault/releases";
const USER_AGENT: &str = "Mozilla/5.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("release feed was empty")]
    EmptyFeed,
}

#[derive(Debug, Deserialize)]
struct GhRelease {
    tag_name: String,
    body: Option<String>,
    #[serde(default)]
    assets: Vec<GhAsset>,
}

#[derive(Debug, Deserialize)]
struct GhAsset {
    browser_download_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub version: String,
    pub notes: String,
    /// Download URL of the first published asset. Fetching and running the
    /// installer is left to the platform shell.
    pub installer_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate,
    UpdateAvailable(ReleaseInfo),
}

/// Queries the published release list to find out whether a newer version
/// exists. Network trouble is never fatal: `check` degrades to `UpToDate`.
pub struct UpdateChecker {
    client: reqwest::Client,
    releases_url: String,
}

impl UpdateChecker {
    pub fn new() -> Result<Self, UpdateError> {
        Self::with_releases_url(RELEASES_URL)
    }

    pub fn with_releases_url(url: impl Into<String>) -> Result<Self, UpdateError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            releases_url: url.into(),
        })
    }

    /// Fetches the newest published release.
    pub async fn latest_release(&self) -> Result<ReleaseInfo, UpdateError> {
        let releases: Vec<GhRelease> = self
            .client
            .get(&self.releases_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let latest = releases.into_iter().next().ok_or(UpdateError::EmptyFeed)?;
        Ok(ReleaseInfo {
            version: latest.tag_name,
            notes: latest.body.unwrap_or_default(),
            installer_url: latest
                .assets
                .into_iter()
                .next()
                .map(|asset| asset.browser_download_url),
        })
    }

    /// Compares the newest release against the running version. Any failure
    /// along the way reports `UpToDate` so a broken network never blocks
    /// the application.
    pub async fn check(&self, current_version: &str) -> UpdateStatus {
        match self.latest_release().await {
            Ok(latest) if version_newer(&latest.version, current_version) => {
                UpdateStatus::UpdateAvailable(latest)
            }
            Ok(_) => UpdateStatus::UpToDate,
            Err(err) => {
                warn!("update check failed, assuming up to date: {err}");
                UpdateStatus::UpToDate
            }
        }
    }
}

fn parse_version(version: &str) -> Option<Vec<u64>> {
    let trimmed = version.trim().trim_start_matches(['v', 'V']);
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// True only when both versions parse as dotted numeric components and the
/// latest compares greater. Missing components count as zero.
fn version_newer(latest: &str, current: &str) -> bool {
    let (Some(mut latest), Some(mut current)) = (parse_version(latest), parse_version(current))
    else {
        return false;
    };

    let width = latest.len().max(current.len());
    latest.resize(width, 0);
    current.resize(width, 0);
    latest > current
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn checker_for(server: &MockServer) -> UpdateChecker {
        UpdateChecker::with_releases_url(format!("{}/releases", server.uri())).expect("checker")
    }

    #[tokio::test]
    async fn parses_latest_release_from_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "tag_name": "v0.5.0",
                    "body": "- faster search\n- bug fixes",
                    "assets": [
                        {"browser_download_url": "https://example.com/installer-0.5.0.exe"}
                    ]
                },
                {"tag_name": "v0.4.0", "body": "older", "assets": []}
            ])))
            .mount(&server)
            .await;

        let latest = checker_for(&server).await.latest_release().await.expect("release");
        assert_eq!(latest.version, "v0.5.0");
        assert_eq!(latest.notes, "- faster search\n- bug fixes");
        assert_eq!(
            latest.installer_url.as_deref(),
            Some("https://example.com/installer-0.5.0.exe")
        );
    }

    #[tokio::test]
    async fn check_reports_update_for_newer_release() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"tag_name": "v0.5.0", "body": "notes", "assets": []}
            ])))
            .mount(&server)
            .await;

        let status = checker_for(&server).await.check("0.4.0").await;
        match status {
            UpdateStatus::UpdateAvailable(release) => assert_eq!(release.version, "v0.5.0"),
            UpdateStatus::UpToDate => panic!("expected an update"),
        }
    }

    #[tokio::test]
    async fn check_is_quiet_when_current_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"tag_name": "v0.4.0", "body": "notes", "assets": []}
            ])))
            .mount(&server)
            .await;

        let status = checker_for(&server).await.check("0.4.0").await;
        assert_eq!(status, UpdateStatus::UpToDate);
    }

    #[tokio::test]
    async fn server_error_degrades_to_up_to_date() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let status = checker_for(&server).await.check("0.4.0").await;
        assert_eq!(status, UpdateStatus::UpToDate);
    }

    #[tokio::test]
    async fn empty_feed_degrades_to_up_to_date() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let checker = checker_for(&server).await;
        assert!(matches!(
            checker.latest_release().await,
            Err(UpdateError::EmptyFeed)
        ));
        assert_eq!(checker.check("0.4.0").await, UpdateStatus::UpToDate);
    }

    #[test]
    fn version_comparison_handles_prefixes_and_widths() {
        assert!(version_newer("v0.5.0", "0.4.0"));
        assert!(version_newer("1.0", "0.9.9"));
        assert!(version_newer("0.4.1", "0.4"));
        assert!(!version_newer("0.4.0", "0.4.0"));
        assert!(!version_newer("0.3.9", "0.4.0"));
        assert!(!version_newer("nightly", "0.4.0"));
        assert!(!version_newer("0.5.0", "unknown"));
    }
}
