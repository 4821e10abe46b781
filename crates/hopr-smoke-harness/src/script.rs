//! Invocation of the external cluster bootstrap script
//!
//! The script owns everything about materialising the nodes. The harness
//! only relies on its contract: `--skip-cleanup` performs setup,
//! `--just-cleanup` performs teardown, and failure is a non-zero exit.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, warn};

use crate::error::{HarnessError, Phase, Result};

/// Location of the bootstrap script relative to the repository root
pub const DEFAULT_SCRIPT: &str = "./scripts/fixture_local_test_setup.sh";

/// Flag asking the script to set the cluster up and leave it running
pub const SETUP_FLAG: &str = "--skip-cleanup";

/// Flag asking the script to tear an existing cluster down
pub const CLEANUP_FLAG: &str = "--just-cleanup";

/// Setup and teardown of a cluster
pub trait ClusterScript {
    /// Bring the cluster up, writing combined output to `log_path`
    fn setup(&self, log_path: &Path) -> Result<()>;

    /// Tear the cluster down
    fn cleanup(&self) -> Result<()>;
}

/// Runs the bootstrap script as a blocking subprocess
#[derive(Debug, Clone)]
pub struct ShellScript {
    path: PathBuf,
    interpreter: Option<PathBuf>,
    working_dir: Option<PathBuf>,
}

impl Default for ShellScript {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT)
    }
}

impl ShellScript {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            interpreter: None,
            working_dir: None,
        }
    }

    /// Run the script through `interpreter` instead of executing it directly
    pub fn with_interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }

    /// Run the script from `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn command(&self, flag: &str) -> Command {
        let mut cmd = match &self.interpreter {
            Some(interpreter) => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(&self.path);
                cmd
            }
            None => Command::new(&self.path),
        };
        cmd.arg(flag).stdin(Stdio::null());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(&self, phase: Phase) -> impl FnOnce(std::io::Error) -> HarnessError + '_ {
        move |source| HarnessError::Spawn {
            phase,
            script: self.path.clone(),
            source,
        }
    }
}

fn check_status(phase: Phase, status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(HarnessError::ScriptFailed { phase, status })
    }
}

impl ClusterScript for ShellScript {
    fn setup(&self, log_path: &Path) -> Result<()> {
        let log_error = |source| HarnessError::LogFile {
            path: log_path.to_path_buf(),
            source,
        };
        let stdout = File::create(log_path).map_err(log_error)?;
        let stderr = stdout.try_clone().map_err(log_error)?;

        debug!("Running {} {}", self.path.display(), SETUP_FLAG);
        let status = self
            .command(SETUP_FLAG)
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status()
            .map_err(self.spawn_error(Phase::Setup))?;

        check_status(Phase::Setup, status)
    }

    fn cleanup(&self) -> Result<()> {
        debug!("Running {} {}", self.path.display(), CLEANUP_FLAG);
        let output = self
            .command(CLEANUP_FLAG)
            .output()
            .map_err(self.spawn_error(Phase::Teardown))?;

        if !output.status.success() {
            warn!(
                "Cleanup script failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        check_status(Phase::Teardown, output.status)
    }
}
