//! shopify-wc-migrate CLI - Shopify to WooCommerce store migration.

use clap::{Parser, Subcommand};
use shopify_wc_migrate::{Config, MigrateError, MigrationPlan, Orchestrator, RunMode};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "shopify-wc-migrate")]
#[command(about = "Shopify to WooCommerce store migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Override the correlation store path from the config file
    #[arg(long)]
    correlation_file: Option<PathBuf>,

    /// Output the JSON report to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the migration (or simulate it with --dry-run)
    Run {
        /// Compute and report every decision without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Migrate a single entity kind (category, product, customer,
        /// order, coupon, page) instead of the full plan
        #[arg(long)]
        only: Option<String>,
    },

    /// Test API connections on both sides
    HealthCheck,

    /// Write a starter configuration file
    Init {
        /// Output path for configuration file [default: config.yaml]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, MigrateError> {
    let cli = Cli::parse();

    // Handle init separately (doesn't need an existing config)
    if let Commands::Init { output, force } = &cli.command {
        let output = output.clone().unwrap_or_else(|| PathBuf::from("config.yaml"));
        if output.exists() && !*force {
            return Err(MigrateError::Config(format!(
                "{} already exists (use --force to overwrite)",
                output.display()
            )));
        }
        std::fs::write(&output, STARTER_CONFIG)?;
        println!("Wrote starter configuration to {}", output.display());
        return Ok(ExitCode::SUCCESS);
    }

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);
    if let Some(ref path) = cli.correlation_file {
        config.migration.correlation_file = path.to_string_lossy().into_owned();
    }

    match cli.command {
        Commands::Init { .. } => unreachable!(), // Handled above
        Commands::Run { dry_run, only } => {
            let plan = match only {
                Some(ref kind) => MigrationPlan::single(parse_kind(kind)?),
                None => MigrationPlan::default(),
            };
            let mode = if dry_run { RunMode::DryRun } else { RunMode::Apply };

            let cancel = setup_signal_handler();
            let orchestrator = Orchestrator::new(config)?;
            let report = orchestrator.run(&plan, mode, cancel).await?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                println!("\n{}", report.summary());
            }

            let code = match report.status.as_str() {
                "completed" => ExitCode::SUCCESS,
                "aborted" => ExitCode::from(3),
                "cancelled" => ExitCode::from(130),
                _ => ExitCode::from(1),
            };
            Ok(code)
        }

        Commands::HealthCheck => {
            let orchestrator = Orchestrator::new(config)?;
            let result = orchestrator.health_check().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (Shopify): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target (WooCommerce): {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if result.healthy {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }
    }
}

fn parse_kind(kind: &str) -> Result<shopify_wc_migrate::EntityKind, MigrateError> {
    use shopify_wc_migrate::EntityKind;
    match kind {
        "category" | "categories" => Ok(EntityKind::Category),
        "product" | "products" => Ok(EntityKind::Product),
        "customer" | "customers" => Ok(EntityKind::Customer),
        "order" | "orders" => Ok(EntityKind::Order),
        "coupon" | "coupons" => Ok(EntityKind::Coupon),
        "page" | "pages" => Ok(EntityKind::Page),
        other => Err(MigrateError::Config(format!(
            "unknown entity kind '{}' (expected category, product, customer, order, coupon or page)",
            other
        ))),
    }
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Setup signal handlers for graceful shutdown. In-flight writes finish and
/// record their correlation entries before the run stops, so a resumed run
/// picks up exactly where this one ended.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    let token_int = cancel_token.clone();
    tokio::spawn(async move {
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to setup SIGINT handler");
        sigint.recv().await;
        eprintln!("\nReceived SIGINT. Finishing in-flight writes...");
        token_int.cancel();
    });

    let token_term = cancel_token.clone();
    tokio::spawn(async move {
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
        sigterm.recv().await;
        eprintln!("\nReceived SIGTERM. Finishing in-flight writes...");
        token_term.cancel();
    });

    cancel_token
}

#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to setup Ctrl-C handler");
        eprintln!("\nReceived Ctrl-C. Finishing in-flight writes...");
        token.cancel();
    });

    cancel_token
}

const STARTER_CONFIG: &str = r#"# shopify-wc-migrate configuration

source:
  # Shopify store URL
  store_url: https://your-store.myshopify.com
  # Admin API access token (shpat_...)
  access_token: ""
  # Admin API version
  api_version: "2023-10"

target:
  # WooCommerce site URL
  url: https://your-shop.example.com
  # REST API consumer key/secret (WooCommerce > Settings > Advanced > REST API)
  consumer_key: ""
  consumer_secret: ""

migration:
  # Entities fetched per source page (1-250)
  page_size: 100
  # Concurrent write workers per phase
  workers: 4
  # Delay between API requests, in milliseconds
  request_delay_ms: 500
  # Retry attempts for rate-limited or failed requests
  max_retries: 3
  # Durable source-to-target id map; delete it to force a full re-migration
  correlation_file: correlation.json
"#;
