//! Download the located artifacts and republish the conda packages.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::{debug, info};

use crate::error::Error;
use crate::fetch::download_and_unpack;
use crate::github::GithubClient;
use crate::locate;

/// The external tool packages are uploaded with.
pub const UPLOAD_TOOL: &str = "anaconda";
/// The anaconda.org organization packages are uploaded to.
pub const UPLOAD_ORG: &str = "KatanaGraph";
/// The label packages are uploaded under.
pub const UPLOAD_LABEL: &str = "dev";

const PKGS_DIR_NAME: &str = "galois-pkgs";
const DOCS_DIR_NAME: &str = "galois-docs";

/// Flags selected for one publish run.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub repo: String,
    pub upload_pkgs: bool,
    pub upload_docs: bool,
    pub leave: bool,
}

/// An external upload invocation, kept as plain program + arguments so it can
/// be printed verbatim for manual reuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCommand {
    program: String,
    args: Vec<String>,
}

impl UploadCommand {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl std::fmt::Display for UploadCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Build the `anaconda upload` command for the given package files.
pub fn upload_command(packages: &[PathBuf]) -> UploadCommand {
    let mut args = vec![
        "upload".to_string(),
        "-u".to_string(),
        UPLOAD_ORG.to_string(),
        "--label".to_string(),
        UPLOAD_LABEL.to_string(),
    ];
    args.extend(packages.iter().map(|p| p.display().to_string()));
    UploadCommand {
        program: UPLOAD_TOOL.to_string(),
        args,
    }
}

/// Runs external upload commands. Injected so tests can record argument lists
/// without touching a real registry.
pub trait CommandRunner {
    fn run(&mut self, command: &UploadCommand) -> io::Result<ExitStatus>;
}

/// Runs upload commands as real child processes, inheriting stdio.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &UploadCommand) -> io::Result<ExitStatus> {
        Command::new(command.program()).args(command.args()).status()
    }
}

/// Enumerate `*.tar.bz2` files exactly one directory level below `pkgs_dir`,
/// which is how conda lays out per-platform package subdirectories. A missing
/// packages directory yields an empty list. Results are sorted for stable
/// output.
pub fn find_packages(pkgs_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut packages = Vec::new();
    let entries = match fs::read_dir(pkgs_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(packages),
        Err(err) => return Err(err),
    };
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        for file in fs::read_dir(entry.path())? {
            let path = file?.path();
            if path
                .file_name()
                .and_then(OsStr::to_str)
                .is_some_and(|name| name.ends_with(".tar.bz2"))
            {
                packages.push(path);
            }
        }
    }
    packages.sort();
    Ok(packages)
}

/// Invoke the upload tool once. Returns whether the downloaded files should be
/// left on disk: a non-zero exit forces leave-mode so the user can retry the
/// printed command by hand. Failing to spawn the tool at all is fatal.
fn run_upload<R: CommandRunner>(runner: &mut R, command: &UploadCommand) -> Result<bool, Error> {
    info!("running {command}");
    let status = runner.run(command)?;
    if status.success() {
        Ok(false)
    } else {
        println!();
        println!("An upload failed, leaving downloaded files: {command} exited with {status}");
        println!();
        Ok(true)
    }
}

/// Filesystem layout of one publish run: a fresh temporary root with the
/// package and documentation destinations below it.
#[derive(Debug)]
struct PublishDirs {
    root: PathBuf,
    pkgs_dir: PathBuf,
    docs_dir: PathBuf,
}

impl PublishDirs {
    fn fresh() -> io::Result<Self> {
        let root = tempfile::tempdir()?.keep();
        let pkgs_dir = root.join(PKGS_DIR_NAME);
        let docs_dir = root.join(DOCS_DIR_NAME);
        Ok(Self {
            root,
            pkgs_dir,
            docs_dir,
        })
    }
}

/// The upload-and-report stage of the publish pipeline, after everything has
/// been downloaded. Returns whether the leave report was printed.
///
/// A failed package upload forces leave-mode and also suppresses the docs
/// branch entirely: the run falls through to the leave report and succeeds,
/// so the user gets the reusable command instead of a second failure. Only
/// when the package upload did not fail does a docs-upload request surface
/// [`Error::DocsUploadUnsupported`], which skips the leave report.
fn upload_and_report<R: CommandRunner>(
    runner: &mut R,
    options: &PublishOptions,
    dirs: &PublishDirs,
    packages: &[PathBuf],
) -> Result<bool, Error> {
    let command = upload_command(packages);
    let mut leave = options.leave;
    let mut upload_failed = false;

    if options.upload_pkgs {
        upload_failed = run_upload(runner, &command)?;
        leave |= upload_failed;
    }

    if options.upload_docs && !upload_failed {
        return Err(Error::DocsUploadUnsupported);
    }

    if leave {
        println!("Upload packages with:");
        println!();
        println!("{command}");
        println!();
        println!(
            "This script leaves the downloaded katana-python documentation in: {}",
            dirs.docs_dir.display()
        );
        println!(
            "This script leaves the downloaded conda packages in: {}",
            dirs.pkgs_dir.display()
        );
        println!(
            "To clean up after this script, delete: {}",
            dirs.root.display()
        );
    }

    Ok(leave)
}

/// The full publish pipeline: locate artifacts, download and unpack them into
/// a fresh temporary directory, optionally upload the packages, and report
/// where everything was left.
///
/// The temporary directory is never removed by this function; cleanup is the
/// user's responsibility and the path is printed when files are left behind.
pub fn publish<R: CommandRunner>(
    client: &GithubClient,
    options: &PublishOptions,
    runner: &mut R,
) -> Result<(), Error> {
    let selection = locate::find_artifacts(client, &options.repo)?;

    let dirs = PublishDirs::fresh()?;
    debug!("unpacking artifacts under {}", dirs.root.display());

    download_and_unpack(client, selection.linux_pkgs.as_ref(), &dirs.pkgs_dir)?;
    download_and_unpack(client, selection.macos_pkgs.as_ref(), &dirs.pkgs_dir)?;
    download_and_unpack(client, selection.docs.as_ref(), &dirs.docs_dir)?;

    let packages = find_packages(&dirs.pkgs_dir)?;
    let names: Vec<String> = packages
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    println!("Downloaded packages: {}", names.join(", "));

    upload_and_report(runner, options, &dirs, &packages)?;
    Ok(())
}



#[cfg(test)]
mod test_run_upload {
    use std::os::unix::process::ExitStatusExt as _;

    use super::*;

    /// Records invocations and reports a fixed wait status.
    struct FakeRunner {
        raw_status: i32,
        calls: Vec<UploadCommand>,
    }

    impl CommandRunner for FakeRunner {
        fn run(&mut self, command: &UploadCommand) -> io::Result<ExitStatus> {
            self.calls.push(command.clone());
            Ok(ExitStatus::from_raw(self.raw_status))
        }
    }

    #[test]
    fn successful_upload_does_not_force_leave() {
        let mut runner = FakeRunner {
            raw_status: 0,
            calls: Vec::new(),
        };
        let command = upload_command(&[PathBuf::from("/tmp/pkgs/linux-64/a.tar.bz2")]);
        assert!(!run_upload(&mut runner, &command).unwrap());
        assert_eq!(runner.calls, vec![command]);
    }

    #[test]
    fn failed_upload_forces_leave() {
        // Raw wait status 256 is exit code 1.
        let mut runner = FakeRunner {
            raw_status: 256,
            calls: Vec::new(),
        };
        let command = upload_command(&[PathBuf::from("/tmp/pkgs/linux-64/a.tar.bz2")]);
        assert!(run_upload(&mut runner, &command).unwrap());
    }

    #[test]
    fn spawn_failure_is_fatal() {
        struct NoSuchTool;
        impl CommandRunner for NoSuchTool {
            fn run(&mut self, _: &UploadCommand) -> io::Result<ExitStatus> {
                Err(io::Error::from(io::ErrorKind::NotFound))
            }
        }
        let command = upload_command(&[]);
        assert!(matches!(
            run_upload(&mut NoSuchTool, &command),
            Err(Error::Io(_))
        ));
    }
}
