//! Harness-specific error types

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Phase of the cluster lifecycle a script invocation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Teardown,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Teardown => write!(f, "teardown"),
        }
    }
}

/// Errors raised by the cluster fixture and probes
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The bootstrap script could not be started
    #[error("Failed to spawn {script} for {phase}: {source}")]
    Spawn {
        phase: Phase,
        script: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bootstrap script exited unsuccessfully
    #[error("Cluster {phase} script exited with {status}")]
    ScriptFailed { phase: Phase, status: ExitStatus },

    /// The setup log file could not be created
    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Setup failed and the cleanup that followed failed as well
    #[error("{setup}; cleanup after failed setup also failed: {teardown}")]
    SetupAndTeardown {
        setup: Box<HarnessError>,
        teardown: Box<HarnessError>,
    },

    /// A socket did not become reachable in time
    #[error("{address}:{port} not reachable after {waited:?}")]
    Timeout {
        address: String,
        port: u16,
        waited: Duration,
    },
}

impl HarnessError {
    /// Lifecycle phase the error originated from, if any
    pub fn phase(&self) -> Option<Phase> {
        match self {
            HarnessError::Spawn { phase, .. } | HarnessError::ScriptFailed { phase, .. } => {
                Some(*phase)
            }
            HarnessError::LogFile { .. } => Some(Phase::Setup),
            HarnessError::SetupAndTeardown { .. } => Some(Phase::Setup),
            HarnessError::Timeout { .. } => None,
        }
    }
}

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;
