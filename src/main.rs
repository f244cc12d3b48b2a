use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use walletwatch::{
    cache::{CacheConfig, TokenMetadataCache},
    config::{load_config_from_path, validate_address, CONFIG_FILE_PATH},
    logger::{self, LogTag, LoggerConfig},
    monitor::{Monitor, MonitorSettings},
    portfolio::{AlertEngine, ConsoleObserver, ReportVerbosity},
    pricing::{JupiterPriceClient, PriceService},
    reports::{AlertLogSink, CsvSink},
    utils::{format_address_short, ShutdownSignal},
    wallet::HeliusClient,
};

/// Multi-wallet Solana portfolio monitor
#[derive(Parser, Debug)]
#[command(name = "walletwatch", version, about)]
struct Args {
    /// Monitor a single wallet address
    #[arg(long, value_name = "ADDR", conflicts_with = "all")]
    wallet: Option<String>,

    /// Monitor every wallet in the config file (default)
    #[arg(long)]
    all: bool,

    /// Config file path
    #[arg(long, value_name = "PATH", default_value = CONFIG_FILE_PATH)]
    config: PathBuf,

    /// Take one snapshot and exit
    #[arg(long)]
    once: bool,

    /// Override the polling interval
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Warnings and alerts only
    #[arg(long, conflicts_with = "verbose")]
    quiet: bool,

    #[arg(long)]
    verbose: bool,

    /// Enable debug logging for tags (e.g. sources,pricing)
    #[arg(long, value_name = "TAGS", value_delimiter = ',')]
    debug: Vec<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        logger::error(LogTag::System, &format!("{:#}", e));
        logger::shutdown();
        std::process::exit(1);
    }
    logger::shutdown();
}

async fn run() -> Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    logger::init(LoggerConfig::from_flags(args.quiet, args.verbose, &args.debug), None)
        .context("Failed to initialize logger")?;

    let mut config = load_config_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(secs) = args.interval {
        config.monitor.interval_secs = secs.max(1);
    }

    let log_path = config.reports.log_path();
    logger::set_log_file(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let mut settings = MonitorSettings::from_config(&config);
    if let Some(wallet) = args.wallet.as_ref().filter(|_| !args.all) {
        validate_address(wallet)?;
        settings.wallets = vec![wallet.clone()];
    }
    if settings.wallets.is_empty() {
        bail!("No wallets to monitor: pass --wallet <ADDR> or add [[wallets]] to {}", args.config.display());
    }

    logger::info(
        LogTag::System,
        &format!(
            "walletwatch starting: {} wallet(s) [{}]",
            settings.wallets.len(),
            settings.wallets
                .iter()
                .map(|w| {
                    let label = config.wallet_label(w);
                    if label == w.as_str() { format_address_short(w) } else { label.to_string() }
                })
                .collect::<Vec<_>>()
                .join(", ")
        )
    );

    let balances = Arc::new(HeliusClient::from_config(&config.sources).context("Failed to create balance client")?);
    let oracle = Arc::new(JupiterPriceClient::new(&config.pricing).context("Failed to create price client")?);

    let metadata = Arc::new(TokenMetadataCache::new(CacheConfig::token_metadata(&config.metadata)));
    let prices = PriceService::new(oracle, &config.pricing).with_metadata_cache(metadata.clone());

    let verbosity = if args.quiet { ReportVerbosity::Summary } else { ReportVerbosity::Full };
    let csv = CsvSink::open(&config.reports.csv_path()).context("Failed to open CSV report")?;
    let alert_log = AlertLogSink::open(&config.reports.alert_path()).context("Failed to open alert log")?;

    let mut monitor = Monitor::new(
        settings,
        AlertEngine::new(&config.alerts),
        balances,
        prices,
        metadata,
        Arc::new(ConsoleObserver::new(verbosity))
    )
        .with_csv_sink(csv)
        .with_alert_log(alert_log);

    let shutdown = Arc::new(ShutdownSignal::new());
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        logger::info(LogTag::System, "Shutdown signal received");
        signal.trigger();
    })
    .context("Failed to install Ctrl-C handler")?;

    let report = monitor.bootstrap(&shutdown).await.context("Initial snapshot failed")?;
    logger::info(
        LogTag::System,
        &format!("Initial snapshot: {} tokens valued", report.valued)
    );

    if args.once || shutdown.is_triggered() {
        monitor.flush_sinks();
        return Ok(());
    }

    monitor.run(shutdown).await?;
    logger::info(LogTag::System, "walletwatch stopped");
    Ok(())
}
