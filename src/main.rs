mod cli;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use reflex::backends::HttpProber;
use reflex::sink::{ConsoleSink, FileSink};
use reflex::source::{JobSource, LineSource};
use reflex::{ReflexError, ScanManager};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        if e.is_fatal() {
            eprintln!("{}", cli::USAGE_HINT);
        }
        std::process::exit(1);
    }
}

fn init_tracing(cli: &cli::Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,reflex={}", cli.log_level())));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if cli.json_logs {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

async fn run(cli: cli::Cli) -> Result<(), ReflexError> {
    let source: Box<dyn JobSource> = match &cli.file {
        Some(path) => Box::new(LineSource::open(path).await?),
        None => Box::new(LineSource::stdin()?),
    };

    let prober = HttpProber::new(cli.prober_config())?;
    let manager = ScanManager::builder()
        .with_prober(prober)
        .with_config(cli.manager_config())
        .with_sink(open_sink(&cli).await)
        .build()?;

    let summary = manager.run(source).await?;

    tracing::debug!(
        submitted = summary.jobs_submitted,
        skipped = summary.jobs_skipped,
        requeued = summary.requeues_scheduled,
        rate_limited = summary.rate_limited,
        transport_errors = summary.transport_errors,
        times_paused = summary.times_paused,
        "Run totals"
    );

    Ok(())
}

/// Findings always go to stdout; the output file is added when it opens.
async fn open_sink(cli: &cli::Cli) -> ConsoleSink {
    match FileSink::open(&cli.output).await {
        Ok(file) => ConsoleSink::new().with_inner(Arc::new(file)),
        Err(e) => {
            tracing::error!(error = %e, "Continuing without an output file");
            ConsoleSink::new()
        }
    }
}
