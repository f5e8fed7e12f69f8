//! Hawkular datasource CLI entry point.
//!
//! Plays the dashboard host for manual use: `query`, `test`, `metrics` and
//! `annotations` call the matching datasource hook against the backend
//! configured in `config.toml` and print the result as JSON on stdout.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use hawkular_datasource::config::{default_config_path, load_config, Config};
use hawkular_datasource::transport::reqwest_executor::ReqwestExecutor;
use hawkular_datasource::types::{
    MetricFindOptions, MetricKind, QueryOptions, Target, TimeRange,
};
use hawkular_datasource::variables::TemplateVariables;
use hawkular_datasource::HawkularDatasource;

/// Default query window when `--from` is not given.
const DEFAULT_WINDOW_MS: i64 = 3_600_000;

/// Query a Hawkular metrics backend the way a dashboard would.
#[derive(Parser)]
#[command(name = "hawkular-datasource", version, about)]
struct Cli {
    /// Config file (default: ~/.hawkular-datasource/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write JSON logs to this directory (daily rotation).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Query datapoints for one or more targets.
    Query {
        /// Metric id, may contain `$name` placeholders. Repeatable.
        #[arg(long = "target", required = true)]
        targets: Vec<String>,
        /// Metric kind of every target.
        #[arg(long, default_value = "gauge")]
        kind: MetricKind,
        /// Query rate-of-change instead of raw values.
        #[arg(long)]
        rate: bool,
        /// Range start, epoch milliseconds (default: one hour before `--to`).
        #[arg(long)]
        from: Option<i64>,
        /// Range end, epoch milliseconds (default: now).
        #[arg(long)]
        to: Option<i64>,
        /// Variable assignment `name=v1,v2` or `name={v1,v2}`. Repeatable.
        #[arg(long = "var")]
        vars: Vec<String>,
    },
    /// Check connectivity against the backend status endpoint.
    Test,
    /// List metric ids of a kind.
    Metrics {
        /// Metric kind to list.
        #[arg(long, default_value = "gauge")]
        kind: MetricKind,
    },
    /// Forward an annotation query.
    Annotations {
        /// JSON body sent to the annotations endpoint.
        #[arg(long, default_value = "{}")]
        body: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let _logging_guard = match &cli.log_dir {
        Some(dir) => Some(hawkular_datasource::logging::init_file(dir, "info")?),
        None => {
            hawkular_datasource::logging::init_cli("warn");
            None
        }
    };

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    debug!(config = %config_path.display(), url = %config.datasource.url, "config loaded");

    match cli.command {
        Command::Query {
            targets,
            kind,
            rate,
            from,
            to,
            vars,
        } => handle_query(&config, targets, kind, rate, from, to, &vars).await,
        Command::Test => handle_test(&config).await,
        Command::Metrics { kind } => handle_metrics(&config, kind).await,
        Command::Annotations { body } => handle_annotations(&config, &body).await,
    }
}

/// Build a datasource from config plus extra variable assignments.
fn build_datasource(config: &Config, vars: &[String]) -> anyhow::Result<HawkularDatasource> {
    let mut variables = config.template_variables();
    for assignment in vars {
        let (name, values) = TemplateVariables::parse_assignment(assignment)
            .with_context(|| format!("invalid variable assignment {assignment:?}"))?;
        variables.insert(name, values);
    }

    let executor = ReqwestExecutor::new(config.http.timeout())
        .context("failed to build HTTP client")?;

    Ok(HawkularDatasource::new(
        config.datasource.clone(),
        Arc::new(executor),
        Arc::new(variables),
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

/// Run a panel query and print the series.
async fn handle_query(
    config: &Config,
    targets: Vec<String>,
    kind: MetricKind,
    rate: bool,
    from: Option<i64>,
    to: Option<i64>,
    vars: &[String],
) -> anyhow::Result<()> {
    let datasource = build_datasource(config, vars)?;

    let to = to.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let from = from.unwrap_or_else(|| to.saturating_sub(DEFAULT_WINDOW_MS));
    if from > to {
        anyhow::bail!("--from ({from}) must not be after --to ({to})");
    }

    let options = QueryOptions {
        range: TimeRange { from, to },
        targets: targets
            .into_iter()
            .map(|name| Target::new(name, kind, rate))
            .collect(),
    };

    let response = datasource.query(&options).await.context("query failed")?;
    info!(series = response.data.len(), "query complete");
    print_json(&response)
}

/// Run the connectivity check.
async fn handle_test(config: &Config) -> anyhow::Result<()> {
    let datasource = build_datasource(config, &[])?;
    match datasource
        .test_datasource()
        .await
        .context("status check failed")?
    {
        Some(result) => print_json(&result),
        None => anyhow::bail!("data source at {} is not healthy", config.datasource.url),
    }
}

/// List metrics of a kind.
async fn handle_metrics(config: &Config, kind: MetricKind) -> anyhow::Result<()> {
    let datasource = build_datasource(config, &[])?;
    let metrics = datasource
        .metric_find_query(&MetricFindOptions { kind })
        .await
        .context("metric listing failed")?;
    print_json(&metrics)
}

/// Forward an annotation query.
async fn handle_annotations(config: &Config, body: &str) -> anyhow::Result<()> {
    let options: serde_json::Value =
        serde_json::from_str(body).context("--body must be valid JSON")?;
    let datasource = build_datasource(config, &[])?;
    let annotations = datasource
        .annotation_query(&options)
        .await
        .context("annotation query failed")?;
    print_json(&annotations)
}
