//! warden - endpoint を 1 件読み込んで autonomous analysis を走らせる CLI
//!
//! Usage:
//!   warden analyze endpoint.json                     # plan だけ作る（承認待ち）
//!   warden analyze endpoint.json --auto-execute      # risk gate を通れば実行
//!   warden analyze endpoint.json --approve --offline # fallback plan を即承認して実行
//!   warden tools                                     # 登録済み tool 一覧

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::error;
use tracing_subscriber::EnvFilter;

use warden_core::tools::BUILTIN_TOOLS;
use warden_core::{AnalysisOutcome, DecisionEngine, EngineBuilder, EngineConfig, UserContext};

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Autonomous security analysis of API endpoints")]
struct Cli {
    /// Ignore any configured LLM and use the fallback plan
    #[arg(long, global = true, env = "WARDEN_OFFLINE")]
    offline: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan (and optionally run) an analysis of one endpoint
    Analyze {
        /// JSON file describing the endpoint
        endpoint: PathBuf,

        #[arg(long, default_value = "cli")]
        user: String,

        #[arg(long, default_value = "default")]
        project: String,

        /// JSON file with a full user context (overrides --user / --project)
        #[arg(long)]
        context: Option<PathBuf>,

        /// Execute immediately when the plan does not need approval
        #[arg(long)]
        auto_execute: bool,

        /// Approve a plan that is awaiting approval and execute it
        #[arg(long)]
        approve: bool,
    },

    /// List registered tools
    Tools,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "warden failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let engine = build_engine(cli.offline)?;

    match cli.command {
        Command::Tools => {
            for (name, description) in engine.tool_descriptions() {
                println!("{name:<32} {description}");
            }
        }
        Command::Analyze {
            endpoint,
            user,
            project,
            context,
            auto_execute,
            approve,
        } => {
            let endpoint_data: serde_json::Value = read_json(&endpoint)?;
            let user = match context {
                Some(path) => read_json::<UserContext>(&path)?,
                None => UserContext::new(user, project),
            };
            analyze(&engine, endpoint_data, &user, auto_execute, approve).await?;
        }
    }
    Ok(())
}

fn build_engine(offline: bool) -> Result<DecisionEngine> {
    let mut config = EngineConfig::from_env().context("loading configuration")?;
    if offline {
        config = config.offline();
    }
    let engine = EngineBuilder::from_config(config)?
        .with_builtin_tools()?
        .expect_tools(&BUILTIN_TOOLS)
        .build()?;
    Ok(engine)
}

async fn analyze(
    engine: &DecisionEngine,
    endpoint_data: serde_json::Value,
    user: &UserContext,
    auto_execute: bool,
    approve: bool,
) -> Result<()> {
    let outcome = engine
        .autonomous_security_analysis(endpoint_data.clone(), user, auto_execute)
        .await?;

    let output = match &outcome {
        AnalysisOutcome::AwaitingApproval { plan_id, .. } if approve => {
            let plan_id = *plan_id;
            let ctx = user.to_decision_context(endpoint_data, engine.tool_names());
            let results = engine.approve_plan(plan_id, &ctx).await?;
            let analytics = engine.get_execution_analytics(&user.user_id).await;
            json!({
                "outcome": outcome,
                "approved_results": results,
                "analytics": analytics,
            })
        }
        _ => serde_json::to_value(&outcome)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
