//! # ActivityPub Conformance Runner
//!
//! Runs the standard conformance suite against a remote server.
//!
//! ## Usage
//! ```bash
//! # Identifiers on the command line
//! ap-test --actor-id https://social.example/users/alice \
//!     --object-id https://social.example/notes/1
//!
//! # Or from a config file, stopping at the first failure
//! ap-test --config ap-test.toml --fail-fast
//! ```
//!
//! ## Config file
//! ```toml
//! [test_config]
//! user = "alice@social.example"   # or: server = "https://social.example"
//!
//! [test_config.resources]
//! object_id = "/notes/1"
//! deleted_object_id = "/notes/2"
//! use_tombstone = true
//!
//! [transport]
//! timeout = 10000                 # milliseconds
//! ```
//!
//! Command-line values win over the config file. Exit status is 0 when every
//! test that ran passed, 1 when any failed and 2 for configuration problems.

use anyhow::{Context, Result, bail};
use ap_testsuite::prelude::*;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ap-test", author, version, about = "ActivityPub server conformance checks", long_about = None)]
struct Args {
    /// Actor to dereference, along with its outbox
    #[arg(long)]
    actor_id: Option<String>,

    /// Object that must be served under both content negotiations
    #[arg(long)]
    object_id: Option<String>,

    /// Object that has been deleted
    #[arg(long)]
    deleted_object_id: Option<String>,

    /// Object that never existed
    #[arg(long)]
    invalid_object_id: Option<String>,

    /// Object that is not publicly visible
    #[arg(long)]
    private_object_id: Option<String>,

    /// Deleted objects answer 410 Gone instead of 404
    #[arg(long)]
    use_tombstone: bool,

    /// Private objects answer 403 Forbidden instead of 404
    #[arg(long)]
    use_forbidden: bool,

    /// TOML config file with a [test_config] table
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop at the first failing test
    #[arg(long)]
    fail_fast: bool,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl ParamSource for Args {
    fn lookup(&self, param: Parameter) -> Option<toml::Value> {
        let id = |value: &Option<String>| value.clone().map(toml::Value::from);
        // An absent switch leaves the parameter to the config file
        let flag = |value: bool| value.then_some(toml::Value::Boolean(true));

        match param {
            Parameter::ActorId => id(&self.actor_id),
            Parameter::ObjectId => id(&self.object_id),
            Parameter::DeletedObjectId => id(&self.deleted_object_id),
            Parameter::InvalidObjectId => id(&self.invalid_object_id),
            Parameter::PrivateObjectId => id(&self.private_object_id),
            Parameter::UseTombstone => flag(self.use_tombstone),
            Parameter::UseForbidden => flag(self.use_forbidden),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

/// Parts of the config file the runner reads itself
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    #[serde(default)]
    transport: TransportConfig,
}

/// A parsed config file
struct ConfigFile {
    document: toml::Table,
    settings: FileSettings,
}

fn read_config(path: &Path) -> Result<ConfigFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let document = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    let settings = toml::from_str(&text).context("Invalid [transport] section")?;
    Ok(ConfigFile { document, settings })
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = args.config.as_deref().map(read_config).transpose()?;

    let mut transport_config = config
        .as_ref()
        .map(|config| config.settings.transport.clone())
        .unwrap_or_default();
    if let Some(secs) = args.timeout {
        transport_config = transport_config.with_timeout(Duration::from_secs(secs));
    }
    let transport = HttpTransport::new(&transport_config)?;

    let mut ctx = TestContext::new();
    let mut any_arg = ctx
        .load_direct(&args)
        .context("Invalid command-line parameter")?;
    if let Some(config) = &config {
        any_arg |= ctx
            .load_config(&config.document, &transport)
            .await
            .context("Invalid config file")?;
    }
    if !any_arg {
        bail!("No configuration supplied; pass identifiers as flags or use --config");
    }

    info!("Running {} tests", standard_suite().len());
    let report = Runner::new()
        .fail_fast(args.fail_fast)
        .run(&standard_suite(), &ctx, &transport)
        .await;

    print_summary(&report);
    Ok(exit_code(&report))
}

fn print_summary(report: &RunReport) {
    println!();
    println!(
        "{} passed, {} failed, {} skipped",
        report.passed().len(),
        report.failed().len(),
        report.skipped().len()
    );
    for name in report.failed() {
        println!("  FAILED {}", name);
    }
    if let Some(name) = report.aborted_by() {
        println!("Stopped after {} (--fail-fast)", name);
    }
}

fn exit_code(report: &RunReport) -> ExitCode {
    if report.failed().is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
