//! Typed records and a blocking client for the GitHub Actions REST API.
//!
//! API responses are decoded once, at this boundary, into the record types
//! below; a malformed response fails fast with a decode error rather than
//! being passed around as loose JSON.

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::Credentials;
use crate::error::Error;

/// Root of the GitHub REST API.
pub const API_ROOT: &str = "https://api.github.com";

/// Branch whose workflow runs are searched for release artifacts.
pub const RELEASE_BRANCH: &str = "master";

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github.v3+json";

const USER_AGENT: &str = concat!("katana-artifacts/", env!("CARGO_PKG_VERSION"));

/// The head commit of a workflow run. Only the message is consulted, for the
/// "found artifacts at commit" report.
#[derive(Debug, Deserialize, Clone)]
pub struct HeadCommit {
    pub message: String,
}

/// One completed execution of a CI workflow, from the GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowRun {
    pub id: u64,
    pub head_branch: String,
    pub status: String,
    pub head_commit: HeadCommit,
    pub artifacts_url: String,
}

#[derive(Debug, Deserialize)]
struct RunsPage {
    workflow_runs: Vec<WorkflowRun>,
}

/// A named, downloadable file bundle produced by a workflow run.
///
/// Only `name` and `archive_download_url` drive behaviour; the remaining
/// fields are carried so the `list` command can re-emit the full record.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Artifact {
    pub id: u64,
    pub name: String,
    pub size_in_bytes: u64,
    pub url: String,
    pub archive_download_url: String,
    pub expired: bool,
    pub created_at: Option<String>,
    pub expires_at: Option<String>,
    pub updated_at: Option<String>,
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[derive(Debug, Deserialize)]
struct ArtifactsPage {
    artifacts: Vec<Artifact>,
}

/// The slice of the GitHub Actions API this crate consumes. The locator and
/// the paginated listing are generic over this trait so tests can substitute
/// a fake without a network.
pub trait ActionsApi {
    /// Successful workflow runs on [`RELEASE_BRANCH`], newest first. The API
    /// ordering is trusted and not re-sorted.
    fn list_runs(&self, repo: &str) -> Result<Vec<WorkflowRun>, Error>;

    /// The artifacts produced by one workflow run, in listing order.
    fn run_artifacts(&self, run: &WorkflowRun) -> Result<Vec<Artifact>, Error>;

    /// One page of the repository-wide artifact listing. Page size is
    /// determined by the API; an empty page marks the end.
    fn artifacts_page(&self, repo: &str, page: u32) -> Result<Vec<Artifact>, Error>;
}

/// A blocking GitHub API client authenticated with HTTP Basic credentials.
pub struct GithubClient {
    http: reqwest::blocking::Client,
    credentials: Credentials,
}

impl GithubClient {
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, credentials })
    }

    fn get_json(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        self.http
            .get(url)
            .header(header::ACCEPT, ACCEPT_GITHUB_JSON)
            .basic_auth(&self.credentials.username, Some(&self.credentials.token))
    }

    /// Request an artifact's archive download. The response body streams; the
    /// caller is responsible for spooling it somewhere seekable.
    pub fn download(&self, artifact: &Artifact) -> Result<reqwest::blocking::Response, Error> {
        debug!("requesting download from {}", artifact.archive_download_url);
        let response = self
            .http
            .get(&artifact.archive_download_url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.token))
            .send()?
            .error_for_status()?;
        info!("requested download for artifact {artifact}");
        Ok(response)
    }
}

impl ActionsApi for GithubClient {
    fn list_runs(&self, repo: &str) -> Result<Vec<WorkflowRun>, Error> {
        let url = format!("{API_ROOT}/repos/{repo}/actions/runs");
        debug!("fetching workflow runs from {url}");
        let page: RunsPage = self
            .get_json(&url)
            .query(&[("branch", RELEASE_BRANCH), ("status", "success")])
            .send()?
            .error_for_status()?
            .json()?;
        info!("fetched {} workflow run(s) from {url}", page.workflow_runs.len());
        Ok(page.workflow_runs)
    }

    fn run_artifacts(&self, run: &WorkflowRun) -> Result<Vec<Artifact>, Error> {
        debug!("fetching artifacts for run {} from {}", run.id, run.artifacts_url);
        let page: ArtifactsPage = self
            .get_json(&run.artifacts_url)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(page.artifacts)
    }

    fn artifacts_page(&self, repo: &str, page: u32) -> Result<Vec<Artifact>, Error> {
        let url = format!("{API_ROOT}/repos/{repo}/actions/artifacts");
        debug!("fetching artifact listing page {page} from {url}");
        let listing: ArtifactsPage = self
            .get_json(&url)
            .query(&[("page", page)])
            .send()?
            .error_for_status()?
            .json()?;
        Ok(listing.artifacts)
    }
}

/// Collect the repository-wide artifact listing, paging from index zero until
/// an empty page or until `limit` records have been collected. A negative
/// `limit` means unlimited; the final page is truncated if it would overshoot.
pub fn paged_artifacts<A: ActionsApi>(
    api: &A,
    repo: &str,
    limit: i64,
) -> Result<Vec<Artifact>, Error> {
    let mut collected = Vec::new();
    let mut page = 0u32;
    loop {
        let batch = api.artifacts_page(repo, page)?;
        if batch.is_empty() {
            break;
        }
        if limit >= 0 {
            let remaining = limit as usize - collected.len();
            if batch.len() >= remaining {
                collected.extend(batch.into_iter().take(remaining));
                break;
            }
        }
        collected.extend(batch);
        page += 1;
    }
    Ok(collected)
}
