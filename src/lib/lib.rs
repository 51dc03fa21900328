//! Retrieve Katana CI artifacts from GitHub Actions and republish them.
//!
//! The library drives the three things the `katana-artifacts` binary exposes:
//!
//! - locating the most recent successful `master` run that produced the conda
//!   package artifacts ([`locate::find_artifacts`]),
//! - downloading and unpacking a single artifact archive
//!   ([`fetch::download_and_unpack`]),
//! - assembling and optionally running the `anaconda upload` command for the
//!   unpacked packages ([`publish::publish`]).
//!
//! All network I/O is synchronous and blocking via [`reqwest::blocking`].
//! Nothing is retried and nothing is cleaned up automatically: the publish
//! pipeline deliberately leaves its temporary directory behind and prints the
//! path so the caller can inspect or delete it.
//!
//! Credentials are resolved from the environment once, up front, and passed
//! explicitly through [`github::GithubClient`]; a missing credential pair is a
//! normal outcome ([`auth::Credentials::from_env`] returns [`None`]), not an
//! error.

pub mod auth;
mod error;
pub mod fetch;
pub mod github;
pub mod locate;
pub mod publish;

#[doc(inline)]
pub use crate::error::Error;
