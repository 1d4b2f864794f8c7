//! branch-reset - App Center branch build reset
//!
//! Cancels the branch's in-progress build, re-clones its build configuration
//! from a reference branch and starts a fresh build.
//!
//! Inputs come from flags or from the `INPUT_*` variables a GitHub Actions
//! runner sets for a step, so the binary can run as an action as-is. The new
//! build id is written to `$GITHUB_OUTPUT` as `build_id`; a failure is
//! reported as an `::error::` workflow command and a non-zero exit code.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use appcenter_client::{ApiToken, AppCenterClient, AppCenterConfig, DEFAULT_API_URL};
use branch_reset_core::{ActionsReporter, Reporter, ResetOrchestrator, RunParams};
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "branch-reset")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Cancel, re-configure and restart the App Center build of a branch",
    long_about = None
)]
struct Cli {
    /// App Center API token (falls back to APPCENTER_TOKEN)
    #[arg(long, env = "INPUT_APPCENTER_TOKEN", hide_env_values = true,
          value_parser = NonEmptyStringValueParser::new())]
    token: Option<String>,

    /// App owner (user or organization name)
    #[arg(long, env = "INPUT_APPCENTER_USER", value_parser = NonEmptyStringValueParser::new())]
    owner: String,

    /// App name
    #[arg(long, env = "INPUT_APPCENTER_APP", value_parser = NonEmptyStringValueParser::new())]
    app: String,

    /// Branch to reset and rebuild
    #[arg(long, env = "INPUT_BRANCH_NAME", value_parser = NonEmptyStringValueParser::new())]
    branch: String,

    /// Branch whose build configuration is cloned
    #[arg(long, env = "INPUT_SETTINGS_BRANCH_NAME",
          value_parser = NonEmptyStringValueParser::new())]
    settings_branch: String,

    /// App Center API root
    #[arg(long, env = "APPCENTER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

/// Resolve the run inputs and build the client.
///
/// The token given on the command line wins over the one in `config`.
fn prepare(cli: &Cli, config: AppCenterConfig) -> Result<(AppCenterClient, RunParams)> {
    let config = AppCenterConfig {
        base_url: cli.api_url.clone(),
        ..config
    };
    let token = cli
        .token
        .as_deref()
        .map(ApiToken::new)
        .or_else(|| config.token.clone())
        .context("No API token: set --token, INPUT_APPCENTER_TOKEN or APPCENTER_TOKEN")?;

    let params = RunParams::new(
        token.expose(),
        &cli.owner,
        &cli.app,
        &cli.branch,
        &cli.settings_branch,
    );
    let client = AppCenterClient::new(config).context("Failed to create App Center client")?;
    Ok((client, params))
}

/// Run the reset and report its outcome. Returns whether it succeeded.
async fn execute(cli: &Cli, config: AppCenterConfig, reporter: Arc<dyn Reporter>) -> bool {
    let (client, params) = match prepare(cli, config) {
        Ok(prepared) => prepared,
        Err(err) => {
            let reason = format!("{err:#}");
            error!(error = %reason, "Run setup failed");
            reporter.fail(&format!("❌ The flow has failed. {reason}"));
            return false;
        }
    };

    let orchestrator = ResetOrchestrator::new(Arc::new(client), reporter);
    orchestrator.run(&params).await.outcome.is_success()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    branch_reset_core::init_tracing(cli.json, level);

    let reporter = ActionsReporter::from_env();
    if let Some(path) = reporter.output_path() {
        info!(output = %path.display(), "Writing step outputs to runner file");
    }

    if execute(&cli, AppCenterConfig::from_env(), Arc::new(reporter)).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
