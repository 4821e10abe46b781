//! Cluster lifecycle fixture
//!
//! Brings the 7 node cluster up through the bootstrap script, hands the
//! topology to the test, and tears the cluster down on every exit path:
//! - normal completion ([`ClusterGuard::release`] or [`ClusterFixture::run`])
//! - a panicking test body
//! - a failed setup (cleanup still runs before the error is returned)
//! - a guard dropped without being released
//!
//! The cluster is scoped to one test module at a time. Tests of the same
//! module running on parallel threads share a single setup; the last guard
//! to go away runs the single teardown. A different module blocks in
//! [`ClusterFixture::acquire`] until the current one has torn down, since
//! every cluster binds the same fixed ports.
//!
//! A teardown failure is an error of its own and is never downgraded to a
//! warning, except while a test panic is already unwinding, where it is
//! logged instead.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use hopr_smoke_core::{nodes, NodeConfig};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info};

use crate::error::{HarnessError, Result};
use crate::script::{ClusterScript, ShellScript};

/// Directory the setup logs are written to
pub const DEFAULT_LOG_DIR: &str = "/tmp";

/// Reduce a `module_path!()` to the name used in the setup log file.
///
/// The crate name is dropped and the remaining segments are joined with
/// `_`, so `a::tests` and `b::tests` of one crate get distinct logs.
pub fn module_log_name(module_path: &str) -> String {
    match module_path.split_once("::") {
        Some((_, rest)) => rest.replace("::", "_"),
        None => module_path.to_string(),
    }
}

/// Log file name for the calling module
#[macro_export]
macro_rules! smoke_module {
    () => {
        $crate::fixture::module_log_name(module_path!())
    };
}

/// Where the fixture writes its logs
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub log_dir: PathBuf,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl FixtureConfig {
    /// Setup log path for a test module: `<log_dir>/hopr-smoke-<module>.log`
    pub fn log_path(&self, module: &str) -> PathBuf {
        self.log_dir.join(format!("hopr-smoke-{}.log", module))
    }
}

/// Module currently holding the cluster
#[derive(Debug, Default)]
struct Scope {
    module: Option<String>,
    holders: usize,
}

/// Provider of a running 7 node cluster
pub struct ClusterFixture<S: ClusterScript = ShellScript> {
    script: S,
    config: FixtureConfig,
    scope: Mutex<Scope>,
    torn_down: Condvar,
}

impl ClusterFixture<ShellScript> {
    /// Fixture driving `./scripts/fixture_local_test_setup.sh`
    pub fn new() -> Self {
        Self::with_script(ShellScript::default(), FixtureConfig::default())
    }

    /// Process-wide fixture shared by every test of the binary
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<ClusterFixture> = OnceLock::new();
        SHARED.get_or_init(Self::new)
    }
}

impl Default for ClusterFixture<ShellScript> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ClusterScript> ClusterFixture<S> {
    pub fn with_script(script: S, config: FixtureConfig) -> Self {
        Self {
            script,
            config,
            scope: Mutex::new(Scope::default()),
            torn_down: Condvar::new(),
        }
    }

    pub fn script(&self) -> &S {
        &self.script
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// Module the cluster is currently set up for, if any
    pub fn active_module(&self) -> Option<String> {
        self.scope.lock().module.clone()
    }

    /// Join the cluster on behalf of `module`, setting it up if needed.
    ///
    /// The first acquirer of a module runs setup; later acquirers of the
    /// same module reuse the running cluster. Acquiring for another module
    /// blocks until the current one is torn down, so a thread must not
    /// acquire a second module while it still holds a guard.
    ///
    /// If setup fails the cluster is still cleaned up before the setup
    /// error is returned.
    pub fn acquire(&self, module: &str) -> Result<ClusterGuard<'_, S>> {
        let mut scope = self.scope.lock();
        while let Some(active) = scope.module.as_deref() {
            if active == module {
                break;
            }
            debug!("Module {} waits for {} to release the cluster", module, active);
            self.torn_down.wait(&mut scope);
        }

        let log_path = self.config.log_path(module);
        if scope.holders == 0 {
            self.setup(&log_path)?;
            scope.module = Some(module.to_string());
        } else {
            debug!("Module {} joins the running cluster", module);
        }
        scope.holders += 1;

        Ok(ClusterGuard {
            fixture: self,
            log_path,
            released: false,
        })
    }

    /// Run `body` against the module's cluster, leaving it once done.
    ///
    /// A panicking body still triggers teardown; the panic is resumed once
    /// teardown has finished.
    pub fn run<F, T>(&self, module: &str, body: F) -> Result<T>
    where
        F: FnOnce(&'static [NodeConfig]) -> T,
    {
        let guard = self.acquire(module)?;
        let nodes = guard.nodes();

        match panic::catch_unwind(AssertUnwindSafe(|| body(nodes))) {
            Ok(value) => {
                guard.release()?;
                Ok(value)
            }
            Err(payload) => {
                if let Err(e) = guard.release() {
                    error!("Cluster teardown failed after test panic: {}", e);
                }
                panic::resume_unwind(payload)
            }
        }
    }

    fn setup(&self, log_path: &Path) -> Result<()> {
        info!("Creating a 7 node cluster from source");
        info!("Setup log: {}", log_path.display());

        match self.script.setup(log_path) {
            Ok(()) => Ok(()),
            Err(setup) => match self.teardown() {
                Ok(()) => Err(setup),
                Err(teardown) => Err(HarnessError::SetupAndTeardown {
                    setup: Box::new(setup),
                    teardown: Box::new(teardown),
                }),
            },
        }
    }

    fn teardown(&self) -> Result<()> {
        info!("Tearing down the 7 node cluster from source");
        self.script.cleanup()
    }

    /// Drop one holder, tearing the cluster down when it was the last
    fn leave(&self) -> Result<()> {
        let mut scope = self.scope.lock();
        scope.holders = scope.holders.saturating_sub(1);
        if scope.holders > 0 {
            return Ok(());
        }

        let result = self.teardown();
        scope.module = None;
        self.torn_down.notify_all();
        result
    }
}

/// A share of the running cluster; the last one released or dropped tears
/// it down
pub struct ClusterGuard<'a, S: ClusterScript> {
    fixture: &'a ClusterFixture<S>,
    log_path: PathBuf,
    released: bool,
}

impl<S: ClusterScript> ClusterGuard<'_, S> {
    /// Topology of the running cluster
    pub fn nodes(&self) -> &'static [NodeConfig] {
        nodes()
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Leave the cluster, reporting teardown failures
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.fixture.leave()
    }
}

impl<S: ClusterScript> Drop for ClusterGuard<'_, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.fixture.leave() {
            if std::thread::panicking() {
                error!("Cluster teardown failed during unwind: {}", e);
            } else {
                panic!("Cluster teardown failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Phase;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingScript {
        calls: Mutex<Vec<String>>,
        fail_setup: bool,
        fail_cleanup: bool,
    }

    impl RecordingScript {
        fn failure(phase: Phase) -> HarnessError {
            HarnessError::Spawn {
                phase,
                script: PathBuf::from("recording"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "scripted failure"),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn cleanups(&self) -> usize {
            self.calls().iter().filter(|c| *c == "cleanup").count()
        }
    }

    impl ClusterScript for RecordingScript {
        fn setup(&self, log_path: &Path) -> Result<()> {
            self.calls
                .lock()
                .push(format!("setup {}", log_path.display()));
            if self.fail_setup {
                Err(Self::failure(Phase::Setup))
            } else {
                Ok(())
            }
        }

        fn cleanup(&self) -> Result<()> {
            self.calls.lock().push("cleanup".to_string());
            if self.fail_cleanup {
                Err(Self::failure(Phase::Teardown))
            } else {
                Ok(())
            }
        }
    }

    fn fixture(script: RecordingScript) -> ClusterFixture<RecordingScript> {
        ClusterFixture::with_script(script, FixtureConfig::default())
    }

    #[test]
    fn test_module_log_name() {
        assert_eq!(
            module_log_name("hopr_smoke_harness::fixture::tests"),
            "fixture_tests"
        );
        assert_eq!(module_log_name("test_integration"), "test_integration");
        assert_eq!(smoke_module!(), "fixture_tests");
    }

    #[test]
    fn test_module_log_names_do_not_collide() {
        let a = module_log_name("smoke::channels::tests");
        let b = module_log_name("smoke::redeem::tests");
        assert_ne!(a, b);
        assert_eq!(a, "channels_tests");
        assert_eq!(b, "redeem_tests");
    }

    #[test]
    fn test_log_path() {
        let config = FixtureConfig::default();
        assert_eq!(
            config.log_path("test_stress"),
            PathBuf::from("/tmp/hopr-smoke-test_stress.log")
        );
    }

    #[test]
    fn test_run_success_tears_down_once() {
        let fixture = fixture(RecordingScript::default());
        let count = fixture.run("test_stress", |nodes| nodes.len()).unwrap();

        assert_eq!(count, 7);
        assert_eq!(
            fixture.script().calls(),
            vec!["setup /tmp/hopr-smoke-test_stress.log", "cleanup"]
        );
        assert_eq!(fixture.active_module(), None);
    }

    #[test]
    fn test_panicking_body_tears_down_once() {
        let fixture = fixture(RecordingScript::default());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            fixture.run("test_stress", |_| panic!("test body failed"))
        }));

        assert!(outcome.is_err());
        assert_eq!(fixture.script().cleanups(), 1);
    }

    #[test]
    fn test_failed_setup_still_tears_down() {
        let fixture = fixture(RecordingScript {
            fail_setup: true,
            ..Default::default()
        });

        let err = fixture.run("test_stress", |_| ()).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Setup));
        assert_eq!(fixture.script().cleanups(), 1);
        assert_eq!(fixture.active_module(), None);
    }

    #[test]
    fn test_failed_setup_and_cleanup_reports_both() {
        let fixture = fixture(RecordingScript {
            fail_setup: true,
            fail_cleanup: true,
            ..Default::default()
        });

        let err = fixture.acquire("test_stress").err().unwrap();
        assert!(matches!(err, HarnessError::SetupAndTeardown { .. }));
        assert_eq!(fixture.script().cleanups(), 1);
    }

    #[test]
    fn test_release_reports_teardown_failure() {
        let fixture = fixture(RecordingScript {
            fail_cleanup: true,
            ..Default::default()
        });

        let guard = fixture.acquire("test_stress").unwrap();
        let err = guard.release().unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Teardown));
        assert_eq!(fixture.script().cleanups(), 1);
    }

    #[test]
    fn test_drop_tears_down() {
        let fixture = fixture(RecordingScript::default());
        {
            let guard = fixture.acquire("test_stress").unwrap();
            assert_eq!(guard.nodes().len(), 7);
        }
        assert_eq!(fixture.script().cleanups(), 1);
    }

    #[test]
    fn test_drop_panics_on_teardown_failure() {
        let fixture = fixture(RecordingScript {
            fail_cleanup: true,
            ..Default::default()
        });

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = fixture.acquire("test_stress").unwrap();
        }));
        assert!(outcome.is_err());
        assert_eq!(fixture.script().cleanups(), 1);
    }

    #[test]
    fn test_teardown_failure_does_not_replace_body_panic() {
        let fixture = fixture(RecordingScript {
            fail_cleanup: true,
            ..Default::default()
        });

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            fixture.run("test_stress", |_| panic!("test body failed"))
        }));

        let payload = outcome.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"test body failed"));
        assert_eq!(fixture.script().cleanups(), 1);
    }

    #[test]
    fn test_same_module_shares_one_cluster() {
        let fixture = fixture(RecordingScript::default());
        let barrier = Barrier::new(2);

        thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    fixture
                        .run("same_module", |_| {
                            barrier.wait();
                        })
                        .unwrap()
                });
            }
        });

        assert_eq!(
            fixture.script().calls(),
            vec!["setup /tmp/hopr-smoke-same_module.log", "cleanup"]
        );
    }

    #[test]
    fn test_last_guard_tears_down() {
        let fixture = fixture(RecordingScript::default());
        let first = fixture.acquire("test_stress").unwrap();
        let second = fixture.acquire("test_stress").unwrap();

        first.release().unwrap();
        assert_eq!(fixture.script().cleanups(), 0);
        assert_eq!(fixture.active_module().as_deref(), Some("test_stress"));

        drop(second);
        assert_eq!(fixture.script().cleanups(), 1);
        assert_eq!(fixture.active_module(), None);
    }

    #[test]
    fn test_other_module_waits_for_teardown() {
        let fixture = fixture(RecordingScript::default());
        let guard = fixture.acquire("module_a").unwrap();

        thread::scope(|s| {
            let waiter = s.spawn(|| fixture.run("module_b", |_| ()).unwrap());

            thread::sleep(Duration::from_millis(100));
            assert_eq!(
                fixture.script().calls(),
                vec!["setup /tmp/hopr-smoke-module_a.log"]
            );

            guard.release().unwrap();
            waiter.join().unwrap();
        });

        assert_eq!(
            fixture.script().calls(),
            vec![
                "setup /tmp/hopr-smoke-module_a.log",
                "cleanup",
                "setup /tmp/hopr-smoke-module_b.log",
                "cleanup",
            ]
        );
    }

    #[test]
    fn test_setup_retried_after_failure() {
        let fixture = fixture(RecordingScript {
            fail_setup: true,
            ..Default::default()
        });

        assert!(fixture.acquire("test_stress").is_err());
        assert!(fixture.acquire("test_stress").is_err());
        assert_eq!(fixture.script().cleanups(), 2);
        assert_eq!(fixture.active_module(), None);
    }
}
