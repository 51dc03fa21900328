use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory, Parser};

use katana_artifacts::auth::Credentials;
use katana_artifacts::github::{self, GithubClient};
use katana_artifacts::publish::{self, PublishOptions, SystemRunner};

use anstyle::AnsiColor::*;
use anstyle::Effects;
use anstyle::Style;

const HEADER: Style = Green.on_default().effects(Effects::BOLD);
const USAGE: Style = Green.on_default().effects(Effects::BOLD);
const LITERAL: Style = Cyan.on_default().effects(Effects::BOLD);
const PLACEHOLDER: Style = Cyan.on_default();
const ERROR: Style = Red.on_default().effects(Effects::BOLD);
const VALID: Style = Cyan.on_default().effects(Effects::BOLD);
const INVALID: Style = Yellow.on_default().effects(Effects::BOLD);

const APP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(HEADER)
    .usage(USAGE)
    .literal(LITERAL)
    .placeholder(PLACEHOLDER)
    .error(ERROR)
    .valid(VALID)
    .invalid(INVALID);

const DEFAULT_REPO: &str = "katanagraph/katana";

const MISSING_CREDENTIALS_HELP: &str = "This command requires GITHUB_USERNAME and either \
     GITHUB_PASSWORD or GITHUB_TOKEN to be set to valid GitHub credentials.";

#[derive(Debug, Parser)]
#[command(name = "katana-artifacts")]
#[command(about = "Download Katana CI artifacts from GitHub Actions and optionally republish them")]
#[command(long_about = None)]
#[command(version)]
#[command(styles = APP_STYLING)]
#[command(term_width = 80)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Download python artifacts and optionally upload them to anaconda
    Python {
        /// Upload the packages in the artifacts to anaconda. Requires you to be
        /// logged into anaconda.
        #[arg(long, short = 'p')]
        upload_pkgs: bool,

        /// Upload the documentation in the artifacts. This is not yet
        /// implemented.
        #[arg(long, short = 'd')]
        upload_docs: bool,

        /// Leave the downloaded and unpacked artifacts in the temporary
        /// directory for other uses.
        #[arg(long, short = 'l')]
        leave: bool,

        /// Repo to query
        #[arg(long, value_name = "OWNER/NAME", default_value = DEFAULT_REPO)]
        repo: String,
    },
    /// List artifacts in a repo
    List {
        /// Repo to query
        #[arg(long, value_name = "OWNER/NAME", default_value = DEFAULT_REPO)]
        repo: String,

        /// Limit output to a number of entries. Values less than zero mean no
        /// limit.
        #[arg(long, default_value_t = 500, allow_negative_numbers = true)]
        limit: i64,
    },
}

fn print_help() {
    drop(Args::command().print_help());
    println!();
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let Some(command) = args.command else {
        print_help();
        return ExitCode::from(1);
    };

    match run(command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::List { repo, limit } => run_list(&repo, limit),
        Command::Python {
            upload_pkgs,
            upload_docs,
            leave,
            repo,
        } => run_python(PublishOptions {
            repo,
            upload_pkgs,
            upload_docs,
            leave,
        }),
    }
}

fn resolve_credentials() -> Option<Credentials> {
    let credentials = Credentials::from_env();
    if credentials.is_none() {
        println!("{MISSING_CREDENTIALS_HELP}");
    }
    credentials
}

fn run_list(repo: &str, limit: i64) -> anyhow::Result<ExitCode> {
    let Some(credentials) = resolve_credentials() else {
        return Ok(ExitCode::from(2));
    };
    let client = GithubClient::new(credentials)?;
    let artifacts = github::paged_artifacts(&client, repo, limit)
        .with_context(|| format!("failed to list artifacts in {repo}"))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&artifacts).context("failed to render artifact listing")?
    );
    Ok(ExitCode::SUCCESS)
}

fn run_python(options: PublishOptions) -> anyhow::Result<ExitCode> {
    // Without at least one of the flags the run would have no observable
    // effect, so abort before any network call.
    if !options.upload_pkgs && !options.upload_docs && !options.leave {
        println!(
            "Aborting because the downloaded artifacts would not be uploaded or left for other uses."
        );
        println!();
        print_help();
        return Ok(ExitCode::from(1));
    }

    let Some(credentials) = resolve_credentials() else {
        return Ok(ExitCode::from(2));
    };
    let client = GithubClient::new(credentials)?;
    publish::publish(&client, &options, &mut SystemRunner)
        .with_context(|| format!("failed to publish artifacts from {}", options.repo))?;
    Ok(ExitCode::SUCCESS)
}
