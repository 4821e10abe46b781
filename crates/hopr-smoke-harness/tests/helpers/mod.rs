//! Scripted stand-ins for the cluster bootstrap script
//!
//! Each fake script appends the flag it was called with to `calls.txt`,
//! prints one line to stdout and one to stderr, and exits with the code
//! configured for that phase.

use std::fs;
use std::path::{Path, PathBuf};

use hopr_smoke_harness::{ClusterFixture, FixtureConfig, ShellScript};
use tempfile::TempDir;

pub struct FakeScript {
    pub dir: TempDir,
    pub script: PathBuf,
}

impl FakeScript {
    /// Write a fake bootstrap script with the given exit codes
    pub fn new(setup_exit: i32, cleanup_exit: i32) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let script = dir.path().join("fixture_local_test_setup.sh");
        let calls = dir.path().join("calls.txt");

        let body = format!(
            r#"#!/bin/sh
echo "$1" >> "{calls}"
echo "stdout from $1"
echo "stderr from $1" >&2
case "$1" in
  --skip-cleanup) exit {setup_exit} ;;
  --just-cleanup) exit {cleanup_exit} ;;
  *) exit 64 ;;
esac
"#,
            calls = calls.display(),
        );
        fs::write(&script, body).expect("Failed to write fake script");

        Self { dir, script }
    }

    /// Shell runner for the fake script, run through `sh`
    pub fn shell(&self) -> ShellScript {
        ShellScript::new(&self.script)
            .with_interpreter("sh")
            .with_working_dir(self.dir.path())
    }

    /// Fixture writing its logs next to the script
    pub fn fixture(&self) -> ClusterFixture<ShellScript> {
        ClusterFixture::with_script(
            self.shell(),
            FixtureConfig {
                log_dir: self.dir.path().to_path_buf(),
            },
        )
    }

    /// Flags the script has been invoked with, in order
    pub fn calls(&self) -> Vec<String> {
        read_lines(&self.dir.path().join("calls.txt"))
    }

    pub fn log_path(&self, module: &str) -> PathBuf {
        self.dir.path().join(format!("hopr-smoke-{}.log", module))
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => content.lines().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("hopr_smoke_harness=debug")
        .with_test_writer()
        .try_init();
}
