use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use prvelocity::report::{render, OutputFormat};
use prvelocity::{
    AnalysisPipeline, Config, GitHubClient, JsonStore, MetricsBackend, PipelineConfig, VmExporter,
};

const THRESHOLD_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Parser, Debug)]
#[command(name = "prvelocity")]
#[command(version)]
#[command(about = "Scrape pull request velocity metrics into VictoriaMetrics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, aggregate and push metrics for the configured repositories
    Run(RunArgs),
    /// Print the last execution timestamp recorded in the backend
    LastExec,
    /// Render a report from a previous JSON dump
    Report {
        /// Directory holding metrics_*.json files
        #[arg(long)]
        dump_dir: PathBuf,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Repositories to analyze (owner/name), overrides GITHUB_REPOSITORIES
    #[arg(short, long = "repo")]
    repos: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for JSON dumps of the results
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Do not push anything to the metrics backend
    #[arg(long)]
    no_push: bool,

    /// Skip PRs last updated before this UTC time ("YYYY-MM-DD HH:MM:SS")
    #[arg(long, value_parser = parse_threshold, conflicts_with = "resume")]
    scrape_threshold: Option<DateTime<Utc>>,

    /// Only scrape PRs updated since the last recorded execution
    #[arg(long)]
    resume: bool,
}

fn parse_threshold(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(s, THRESHOLD_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("expected \"YYYY-MM-DD HH:MM:SS\": {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("prvelocity=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::LastExec => {
            let config = Config::from_env()?;
            let exporter = VmExporter::new(&config.backend)?;
            match exporter.query_last_exec_timestamp().await? {
                Some(ts) => println!("{}", ts.format(THRESHOLD_FORMAT)),
                None => println!("No previous execution recorded"),
            }
            Ok(())
        }
        Command::Report { dump_dir, format } => {
            let results = JsonStore::new(&dump_dir)?.load_all()?;
            if results.is_empty() {
                anyhow::bail!("No results found in {}", dump_dir.display());
            }
            println!("{}", render(&results, format)?);
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if !args.repos.is_empty() {
        config.repositories = args
            .repos
            .iter()
            .map(|r| r.parse())
            .collect::<prvelocity::Result<Vec<_>>>()?;
    }

    let github = GitHubClient::new(&config.github)?;
    let exporter = VmExporter::new(&config.backend)?;

    let mut pipeline_config = PipelineConfig::from(&config);
    pipeline_config.scrape_threshold = args.scrape_threshold;

    if args.resume {
        match exporter.query_last_exec_timestamp().await? {
            Some(last) => {
                tracing::info!("Resuming from last execution at {}", last);
                pipeline_config.scrape_threshold = Some(last);
            }
            None => tracing::info!("No previous execution recorded, scraping everything"),
        }
    }

    let mut pipeline = AnalysisPipeline::new(github, pipeline_config);
    if !args.no_push {
        pipeline = pipeline.with_backend(exporter);
    }

    tracing::info!("Analyzing {} repositories", config.repositories.len());
    let results = pipeline.run().await?;

    let output = render(&results, args.format)?;
    if let Some(ref path) = args.output {
        std::fs::write(path, &output)?;
        tracing::info!("Output written to: {}", path.display());
    } else {
        println!("{}", output);
    }

    if let Some(dir) = args.dump_dir {
        JsonStore::new(dir)?.save_all(&results)?;
    }

    Ok(())
}
