use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use reflex::backends::{parse_header, HttpProberConfig};
use reflex::circuit_breaker::CircuitBreakerConfig;
use reflex::manager::{RequeueConfig, ScanManagerConfig};

pub const USAGE_HINT: &str = "Usage: cat urls.txt | reflex -H 'X-Bug-Bounty: me'  or  reflex -f urls.txt";

#[derive(Parser, Debug)]
#[command(
    name = "reflex",
    version,
    about = "Finds query parameters whose values are reflected into the response body",
    after_help = USAGE_HINT
)]
pub struct Cli {
    /// Number of concurrent workers
    #[arg(short = 't', long = "threads", default_value_t = 20)]
    pub threads: usize,

    /// File containing URLs, one per line (defaults to stdin)
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Output file, appended to
    #[arg(short = 'o', long = "output", default_value = "reflections.txt")]
    pub output: PathBuf,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Custom header, repeatable (e.g. -H 'Key: Value')
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Consecutive 403 answers that pause every worker
    #[arg(long, default_value_t = 10)]
    pub threshold: u32,

    /// Pause length in seconds once the threshold is hit
    #[arg(long, default_value_t = 60)]
    pub cooldown: u64,

    /// Upper bound of the random delay before a 403'd URL is retried, in ms
    #[arg(long = "jitter-ms", default_value_t = 2000)]
    pub jitter_ms: u64,

    /// Capacity of the job queue
    #[arg(long = "queue-capacity", default_value_t = 1000)]
    pub queue_capacity: usize,

    /// Emit logs as JSON
    #[arg(long = "json-logs")]
    pub json_logs: bool,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Malformed `-H` entries are skipped with a warning.
    pub fn prober_config(&self) -> HttpProberConfig {
        let mut config = HttpProberConfig::new().with_timeout(Duration::from_secs(self.timeout));

        for raw in &self.headers {
            match parse_header(raw) {
                Ok((name, value)) => config = config.with_header(name, value),
                Err(e) => tracing::warn!(error = %e, "Ignoring header"),
            }
        }

        config
    }

    pub fn manager_config(&self) -> ScanManagerConfig {
        ScanManagerConfig::new()
            .with_workers(self.threads)
            .with_queue_capacity(self.queue_capacity)
            .with_requeue(
                RequeueConfig::new().with_max_jitter(Duration::from_millis(self.jitter_ms)),
            )
            .with_breaker(
                CircuitBreakerConfig::new()
                    .with_failure_threshold(self.threshold)
                    .with_cooldown(Duration::from_secs(self.cooldown)),
            )
    }
}
