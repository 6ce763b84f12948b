//! EAP Quality Gate CLI
//!
//! Usage:
//!   eap-quality evaluate --eap-version 2.1.0-eap-3 --external-status SUCCESS --internal-status SUCCESS
//!   eap-quality evaluate --policy quality.toml -p external.samples.total=40 --json-out summary.json
//!   eap-quality evaluate --blocked "agent pool offline"
//!   eap-quality verify target/quality
//!   eap-quality policy --policy quality.toml

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};

use eap_quality_core::domain::context::{
    EXTERNAL_BUILD_ID, EXTERNAL_STATUS, EXTERNAL_STATUS_TEXT, INTERNAL_BUILD_ID, INTERNAL_STATUS,
    INTERNAL_STATUS_TEXT,
};
use eap_quality_core::{
    default_gates, read_report_artifact, render_text_report, write_report_artifact, GateContext,
    JsonSummary, NotificationPayload, PolicyOverrides, QualityGate, QualityGateEngine,
    QualityPolicy, QualityReport,
};

/// EAP Quality Gate - release verdicts from validation pipelines
#[derive(Parser)]
#[command(name = "eap-quality")]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the quality gates and print the release verdict
    Evaluate(EvaluateArgs),

    /// Verify a stored report against its digest
    Verify {
        /// Directory holding quality-report.json and quality-report.digest
        dir: PathBuf,
    },

    /// Print the effective policy as TOML
    Policy {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args)]
struct PolicyArgs {
    /// TOML policy file
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Minimum overall score for PASSED
    #[arg(long, env = "MIN_SCORE")]
    min_score: Option<u32>,

    /// Maximum total critical issues for PASSED
    #[arg(long, env = "MAX_CRITICAL")]
    max_critical: Option<usize>,

    /// Score a gate starts from before penalties
    #[arg(long, env = "BASE_SCORE")]
    base_score: Option<i32>,

    /// Weight of the external validation gate
    #[arg(long, env = "EXTERNAL_WEIGHT")]
    external_weight: Option<i32>,

    /// Weight of the internal validation gate
    #[arg(long, env = "INTERNAL_WEIGHT")]
    internal_weight: Option<i32>,
}

#[derive(clap::Args)]
struct EvaluateArgs {
    /// EAP version under evaluation
    #[arg(long, env = "EAP_VERSION", default_value = "unknown")]
    eap_version: String,

    /// Identifier of the build that triggered the evaluation
    #[arg(long, default_value = "")]
    trigger_build: String,

    /// Branch under evaluation
    #[arg(long, default_value = "master")]
    branch: String,

    /// CI environment label
    #[arg(long, default_value = "ci")]
    environment: String,

    /// Extra signal, repeatable (KEY=VALUE)
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// JSON object of extra signals
    #[arg(long)]
    params_file: Option<PathBuf>,

    /// Terminal status of the external validation pipeline
    #[arg(long, env = "EXTERNAL_STATUS")]
    external_status: Option<String>,

    /// Status text of the external validation pipeline
    #[arg(long, env = "EXTERNAL_STATUS_TEXT")]
    external_status_text: Option<String>,

    /// Build id of the external validation pipeline
    #[arg(long, env = "EXTERNAL_BUILD_ID")]
    external_build_id: Option<String>,

    /// Terminal status of the internal validation pipeline
    #[arg(long, env = "INTERNAL_STATUS")]
    internal_status: Option<String>,

    /// Status text of the internal validation pipeline
    #[arg(long, env = "INTERNAL_STATUS_TEXT")]
    internal_status_text: Option<String>,

    /// Build id of the internal validation pipeline
    #[arg(long, env = "INTERNAL_BUILD_ID")]
    internal_build_id: Option<String>,

    #[command(flatten)]
    policy: PolicyArgs,

    /// Report format written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write the JSON summary to this file
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// Write the chat notification payload to this file
    #[arg(long)]
    notification_out: Option<PathBuf>,

    /// Store the full report with its digest in this directory
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Evaluate gates on the blocking pool concurrently
    #[arg(long)]
    concurrent: bool,

    /// Skip evaluation and report BLOCKED with this reason
    #[arg(long)]
    blocked: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    eap_quality_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Evaluate(args) => cmd_evaluate(args).await,
        Commands::Verify { dir } => cmd_verify(&dir).map(|_| ExitCode::SUCCESS),
        Commands::Policy { policy } => cmd_policy(&policy).map(|_| ExitCode::SUCCESS),
    }
}

async fn cmd_evaluate(args: EvaluateArgs) -> Result<ExitCode> {
    let policy = load_policy(&args.policy)?;
    let context = build_context(&args, &policy)?;
    let engine = QualityGateEngine::default();

    let report = if let Some(reason) = args.blocked.as_deref() {
        info!(reason, "evaluation blocked");
        engine.blocked_report(&context, reason)
    } else if args.concurrent {
        let gates: Vec<Arc<dyn QualityGate>> =
            default_gates(&policy).into_iter().map(Arc::from).collect();
        engine.evaluate_all_concurrent(&gates, &context).await
    } else {
        engine.evaluate_all(&default_gates(&policy), &context)
    };

    emit_outputs(&args, &report)?;

    info!(
        status = %report.overall_status,
        score = report.overall_score,
        "verdict"
    );
    Ok(ExitCode::from(report.exit_code() as u8))
}

fn cmd_verify(dir: &Path) -> Result<()> {
    let report = read_report_artifact(dir)
        .with_context(|| format!("Failed to verify report in {}", dir.display()))?;

    println!("✓ Report digest verified");
    println!("  EAP version: {}", report.version);
    println!("  Status:      {}", report.overall_status);
    println!("  Score:       {}/100", report.overall_score);
    println!("  Generated:   {}", report.generated_at.to_rfc3339());
    Ok(())
}

fn cmd_policy(args: &PolicyArgs) -> Result<()> {
    let policy = load_policy(args)?;
    let rendered = policy
        .to_toml_string()
        .context("Failed to render policy")?;
    print!("{}", rendered);
    Ok(())
}

fn load_policy(args: &PolicyArgs) -> Result<QualityPolicy> {
    let base = match &args.policy {
        Some(path) => QualityPolicy::load(path)
            .with_context(|| format!("Failed to load policy {}", path.display()))?,
        None => QualityPolicy::default(),
    };

    let policy = base.apply(&PolicyOverrides {
        min_score: args.min_score,
        max_critical: args.max_critical,
        base_score: args.base_score,
        external_weight: args.external_weight,
        internal_weight: args.internal_weight,
    });
    policy.validate().context("Invalid quality policy")?;
    Ok(policy)
}

fn build_context(args: &EvaluateArgs, policy: &QualityPolicy) -> Result<GateContext> {
    let mut context = GateContext::new(&args.eap_version)
        .with_trigger_build(&args.trigger_build)
        .with_branch(&args.branch)
        .with_environment(&args.environment)
        .with_thresholds(policy.thresholds.clone())
        .with_scoring_config(policy.scoring.clone());

    if let Some(path) = &args.params_file {
        for (key, value) in read_params_file(path)? {
            context = context.with_parameter(key, value);
        }
    }
    for (key, value) in &args.params {
        context = context.with_parameter(key, value);
    }

    // Dedicated flags win over generic parameters.
    let signals = [
        (EXTERNAL_STATUS, &args.external_status),
        (EXTERNAL_STATUS_TEXT, &args.external_status_text),
        (EXTERNAL_BUILD_ID, &args.external_build_id),
        (INTERNAL_STATUS, &args.internal_status),
        (INTERNAL_STATUS_TEXT, &args.internal_status_text),
        (INTERNAL_BUILD_ID, &args.internal_build_id),
    ];
    for (key, value) in signals {
        if let Some(value) = value {
            context = context.with_parameter(key, value);
        }
    }

    Ok(context)
}

fn read_params_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let values: BTreeMap<String, serde_json::Value> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON object", path.display()))?;

    Ok(values
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

fn emit_outputs(args: &EvaluateArgs, report: &QualityReport) -> Result<()> {
    let summary = JsonSummary::from_report(report);

    match args.format {
        OutputFormat::Text => print!("{}", render_text_report(report)),
        OutputFormat::Json => println!("{}", summary.to_json_pretty()?),
    }

    if let Some(path) = &args.json_out {
        std::fs::write(path, summary.to_json_pretty()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "json summary written");
    }

    if let Some(path) = &args.notification_out {
        let payload = NotificationPayload::from_report(report);
        std::fs::write(path, serde_json::to_string_pretty(&payload)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "notification payload written");
    }

    if let Some(dir) = &args.artifacts_dir {
        let path = write_report_artifact(report, dir)
            .with_context(|| format!("Failed to store report in {}", dir.display()))?;
        info!(path = %path.display(), "report artifact stored");
    }

    Ok(())
}

fn parse_param(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got '{}'", raw);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("parameter key must not be empty");
    }
    Ok((key.to_string(), value.to_string()))
}
