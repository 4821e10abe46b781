//! Stress test configuration
//!
//! The stress suite is parameterised through five command line flags. Since
//! `cargo test` owns the argv of test binaries, every flag can also be set
//! through a `HOPR_STRESS_*` environment variable. Flags take precedence over
//! environment variables, which take precedence over the defaults.
//!
//! Values are passed through as given: counts are only required to be
//! integers and the API URL is not validated. Consuming tests decide what
//! is acceptable.

use clap::{Args, Parser};
use serde::{Deserialize, Serialize};

use crate::topology::{node, DEFAULT_API_TOKEN, LOCALHOST};

pub const DEFAULT_SEQ_REQUEST_COUNT: u64 = 200;
pub const DEFAULT_PAR_REQUEST_COUNT: u64 = 200;
pub const DEFAULT_MINIMUM_PEER_COUNT: u64 = 3;

/// Node whose API the stress test targets by default
pub const DEFAULT_TESTED_NODE: &str = "1";

fn default_tested_api() -> String {
    let api_port = node(DEFAULT_TESTED_NODE).map(|n| n.api_port).unwrap_or(13301);
    format!("http://{}:{}", LOCALHOST, api_port)
}

/// Stress test flags, flattenable into any clap command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StressArgs {
    /// Number of sequential requests in the stress test
    #[arg(
        long = "stress-seq-request-count",
        env = "HOPR_STRESS_SEQ_REQUEST_COUNT",
        default_value_t = DEFAULT_SEQ_REQUEST_COUNT
    )]
    pub seq_request_count: u64,

    /// Number of parallel requests in the stress test
    #[arg(
        long = "stress-par-request-count",
        env = "HOPR_STRESS_PAR_REQUEST_COUNT",
        default_value_t = DEFAULT_PAR_REQUEST_COUNT
    )]
    pub par_request_count: u64,

    /// The API towards which the stress test is performed
    #[arg(
        long = "stress-tested-api",
        env = "HOPR_STRESS_TESTED_API",
        default_value_t = default_tested_api()
    )]
    pub tested_api: String,

    /// The token for the stress tested API
    #[arg(
        long = "stress-tested-api-token",
        env = "HOPR_STRESS_TESTED_API_TOKEN",
        default_value = DEFAULT_API_TOKEN
    )]
    pub tested_api_token: String,

    /// The minimum peer count to start the stress test
    #[arg(
        long = "stress-minimum-peer-count",
        env = "HOPR_STRESS_MINIMUM_PEER_COUNT",
        default_value_t = DEFAULT_MINIMUM_PEER_COUNT
    )]
    pub minimum_peer_count: u64,
}

/// Standalone parser used when the flags are not embedded in another command
#[derive(Parser, Debug)]
#[command(name = "stress-options", no_binary_name = true)]
struct StressCommand {
    #[command(flatten)]
    stress: StressArgs,
}

/// Resolved stress test parameters handed to test bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StressConfig {
    pub stress_seq_request_count: u64,
    pub stress_par_request_count: u64,
    pub stress_tested_api: String,
    pub stress_tested_api_token: String,
    pub stress_minimum_peer_count: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            stress_seq_request_count: DEFAULT_SEQ_REQUEST_COUNT,
            stress_par_request_count: DEFAULT_PAR_REQUEST_COUNT,
            stress_tested_api: default_tested_api(),
            stress_tested_api_token: DEFAULT_API_TOKEN.to_string(),
            stress_minimum_peer_count: DEFAULT_MINIMUM_PEER_COUNT,
        }
    }
}

impl From<StressArgs> for StressConfig {
    fn from(args: StressArgs) -> Self {
        Self {
            stress_seq_request_count: args.seq_request_count,
            stress_par_request_count: args.par_request_count,
            stress_tested_api: args.tested_api,
            stress_tested_api_token: args.tested_api_token,
            stress_minimum_peer_count: args.minimum_peer_count,
        }
    }
}

impl StressConfig {
    /// Resolve the configuration from flags (without a program name),
    /// falling back to environment variables and then defaults
    pub fn resolve<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let command = StressCommand::try_parse_from(args)?;
        Ok(command.stress.into())
    }

    /// Resolve the configuration from environment variables and defaults only
    pub fn from_env() -> Result<Self, clap::Error> {
        Self::resolve(std::iter::empty::<String>())
    }
}
