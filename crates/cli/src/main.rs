use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use qualstat_cli::listen::ListenAddr;
use qualstat_cli::{load_snapshot, router, AppConfig, AppState, FileProjectStore, HttpNumericService};
use qualstat_engine::{dispatch, prepare};
use qualstat_protocol::{test_request_schema, TestRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "qualstat")]
#[command(about = "Chi-square testing for coded qualitative data", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./qualstat.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the table and print the assumption report
    Validate(LocalArgs),

    /// Build the table and run it through the numeric service
    Run(RunArgs),

    /// Serve the test API over HTTP (POST /chi-square)
    ServeHttp(ServeArgs),

    /// Print the JSON schema of a test request
    Schema,
}

#[derive(Args)]
struct LocalArgs {
    /// Project snapshot (JSON)
    #[arg(long)]
    project: PathBuf,

    /// Test request (JSON)
    #[arg(long)]
    request: PathBuf,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    local: LocalArgs,

    /// Numeric service endpoint (overrides config)
    #[arg(long)]
    service_url: Option<String>,
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address, e.g. 127.0.0.1:8080 (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Directory of <projectId>.json snapshots (overrides config)
    #[arg(long)]
    projects: Option<PathBuf>,

    /// Numeric service endpoint (overrides config)
    #[arg(long)]
    service_url: Option<String>,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_env()?;

    match cli.command {
        Commands::Validate(args) => run_validate(args)?,
        Commands::Run(args) => {
            if let Some(url) = args.service_url.clone() {
                config.service.endpoint = url;
            }
            check_config(&config)?;
            run_test(args.local, &config).await?;
        }
        Commands::ServeHttp(args) => {
            if let Some(url) = args.service_url.clone() {
                config.service.endpoint = url;
            }
            if let Some(dir) = args.projects.clone() {
                config.store.root = dir;
            }
            if let Some(bind) = args.bind.clone() {
                config.server.bind = bind;
            }
            check_config(&config)?;
            serve_http(&config, args.public).await?;
        }
        Commands::Schema => print_json(&test_request_schema()?)?,
    }

    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    config
        .validate()
        .map_err(|msg| anyhow::anyhow!("Invalid configuration: {msg}"))
}

fn read_request(path: &Path) -> Result<TestRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid test request {}", path.display()))
}

fn run_validate(args: LocalArgs) -> Result<()> {
    let mut request = read_request(&args.request)?;
    request.validate_only = true;
    let project = load_snapshot(&args.project)?;
    let prepared = prepare(&request, &project)?;
    let report = prepared.validate();
    if !report.can_proceed {
        log::warn!("assumption checks raised warnings; see expectedFrequency");
    }
    print_json(&report)
}

async fn run_test(args: LocalArgs, config: &AppConfig) -> Result<()> {
    let mut request = read_request(&args.request)?;
    request.validate_only = false;
    let project = load_snapshot(&args.project)?;
    let service = HttpNumericService::new(&config.service)?;
    log::info!("running {} against {}", request.subtype, service.endpoint());
    let outcome = dispatch(&request, &project, &service).await?;
    print_json(&outcome.into_json()?)
}

async fn serve_http(config: &AppConfig, public: bool) -> Result<()> {
    let listen = ListenAddr::resolve(&config.server, public).await?;

    let state = AppState {
        store: Arc::new(FileProjectStore::new(config.store.root.clone())),
        service: Arc::new(HttpNumericService::new(&config.service)?),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(listen.addr).await?;
    log::info!(
        "projects from {}, numeric service at {}",
        config.store.root.display(),
        config.service.endpoint
    );
    println!("Serving test API on http://{}/chi-square", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
