//! Operator binary for the instrumented cache.
//!
//! # Commands
//! - `check --config <file>`: load, validate and print the resolved settings
//! - `run --config <file>`: drive a mixed workload through the facade from
//!   several threads, logging every span as it closes. Latency samples go to
//!   an in-process [`LatencySummary`] recorder, printed per method and status
//!   once the workload finishes
//!
//! # Startup Sequence
//! ```text
//! 1. Parse CLI
//! 2. Load configuration (load_config → validate_config)
//! 3. Initialize logging from [observability]
//! 4. Install the latency summary recorder and describe metrics
//! 5. Build MemoryCache + TraceOptions → InstrumentedCache
//! 6. Run the workload and print the latency summary
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use instrumented_cache::config::{load_config, CacheConfig};
use instrumented_cache::observability::{describe_metrics, logging, LatencySummary};
use instrumented_cache::{CallContext, InstrumentedCache, MemoryCache, Ttl};

#[derive(Parser)]
#[command(name = "instrumented-cache")]
#[command(about = "Traced and metered in-memory cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and print the resolved settings
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run a synthetic workload through the instrumented cache and print
    /// latency per method and status
    Run {
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long, default_value_t = 4)]
        threads: usize,

        #[arg(short, long, default_value_t = 1000)]
        ops: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            print_resolved(&config)?;
        }
        Commands::Run { config, threads, ops } => {
            let config = load_config(&config)?;
            logging::init_logging(&config.observability);
            let summary = LatencySummary::new();
            metrics::set_global_recorder(summary.clone())
                .map_err(|_| "a metrics recorder is already installed")?;
            describe_metrics();
            run_workload(&config, threads, ops)?;
            print_summary(&summary)?;
        }
    }

    Ok(())
}

fn print_resolved(config: &CacheConfig) -> Result<(), Box<dyn std::error::Error>> {
    let options = config.tracing.to_options()?;
    let resolved = serde_json::json!({
        "engine": config.engine,
        "tracing": {
            "instance_name": options.instance_name(),
            "allow_root": options.allow_root(),
            "sampler": format!("{:?}", options.sampler()),
            "operations": options.traced_operations().map(|op| op.name()).collect::<Vec<_>>(),
            "default_attributes": options.default_attributes(),
        },
        "observability": config.observability,
    });
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

fn print_summary(summary: &LatencySummary) -> Result<(), Box<dyn std::error::Error>> {
    let report = serde_json::json!({
        "samples": summary.total(),
        "latency": summary.rows(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_workload(config: &CacheConfig, threads: usize, ops: usize) -> Result<(), Box<dyn std::error::Error>> {
    let cache: Arc<InstrumentedCache<MemoryCache>> = Arc::new(InstrumentedCache::from_config(config)?);
    tracing::info!(
        instance = cache.options().instance_name(),
        threads,
        ops,
        "workload starting"
    );

    let started = Instant::now();
    let mut workers = Vec::with_capacity(threads);
    for worker in 0..threads {
        let cache = cache.clone();
        let handle = thread::Builder::new()
            .name(format!("worker-{worker}"))
            .spawn(move || drive(&cache, worker, ops))?;
        workers.push(handle);
    }

    let mut errors = 0;
    for handle in workers {
        errors += handle.join().map_err(|_| "worker thread panicked")?;
    }

    let ctx = CallContext::background();
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        items = cache.item_count(&ctx),
        errors,
        "workload finished"
    );
    Ok(())
}

/// One worker's share of the workload. Returns the number of failed calls.
fn drive(cache: &InstrumentedCache, worker: usize, ops: usize) -> usize {
    let span = tracing::info_span!("worker", id = worker);
    let _guard = span.enter();
    let ctx = CallContext::current();
    let mut errors = 0;

    for i in 0..ops {
        let key = format!("key-{}", fastrand::usize(..64));
        let failed = match i % 8 {
            0 => {
                cache.set(&ctx, &key, 0_u64, Ttl::After(Duration::from_millis(fastrand::u64(50..500))));
                false
            }
            1 => cache.add(&ctx, &key, 0_u64, Ttl::Default).is_err(),
            2 => cache.increment_u64(&ctx, &key, 1).is_err(),
            3 => cache.increment(&ctx, &key, 2).is_err(),
            4 => cache.replace(&ctx, &key, worker as u64, Ttl::Default).is_err(),
            5 => {
                cache.delete(&ctx, &key);
                false
            }
            6 => {
                cache.get_with_expiration(&ctx, &key);
                false
            }
            _ => {
                cache.get(&ctx, &key);
                false
            }
        };
        if failed {
            errors += 1;
        }
    }

    tracing::debug!(worker, errors, "worker done");
    errors
}
