use std::time::Instant;
use clap::Parser;
use log::{error, info};
use plrucache::config::SimulationConfig;
use plrucache::memory::BackingStore;
use plrucache::patterns::DEFAULT_SEED;
use plrucache::simulator::{SimulationResult, Simulator};

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(name = "plrusim")]
#[command(about = "4-way set-associative cache simulator with Pseudo-LRU replacement", long_about = None)]
struct Args {
    /// JSON simulation configuration. Runs the built-in experiment when omitted
    config: Option<String>,

    /// Print the result as JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Seed for random patterns which don't set their own
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let start = Instant::now();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {path}");
            SimulationConfig::from_path(path).map_err(|e| format!("Couldn't load the config file at path {path}: {e}"))?
        }
        None => SimulationConfig::default(),
    }
    .with_default_seed(args.seed);

    let memory = BackingStore::new(config.memory_size);
    let mut simulator = Simulator::new(&config, &memory).map_err(|e| {
        error!("Invalid cache configuration: {e}");
        format!("Couldn't build the caches: {e}")
    })?;
    let result = simulator
        .run(&config.patterns)
        .map_err(|e| format!("Simulation failed: {e}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(result).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    } else {
        print_report(result);
    }

    if args.performance {
        let simulation_time = simulator.get_execution_time();
        let total_time = start.elapsed();
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes configuration and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. Pass --release to cargo run for timings");
        println!("Parsed input configuration: {config:?}");
        let uninitialised_lines = simulator.get_uninitialised_line_counts();
        let formatted = config.caches
            .iter()
            .map(|c| c.name.clone())
            .zip(uninitialised_lines.iter())
            .map(|(name, count)| format!("{name}: {}", *count))
            .collect::<Vec<_>>()
            .join(", ");
        println!("Uninitialised cache lines by cache: ({formatted})");
        println!("Total uninitialised cache lines: {}", uninitialised_lines.iter().sum::<u64>())
    }
    Ok(())
}

fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:.2}%", rate * 100.0),
        None => "n/a".to_string(),
    }
}

fn print_report(result: &SimulationResult) {
    for cache in &result.caches {
        println!("Cache {}", cache.name);
        for pattern in &cache.patterns {
            println!(
                "  {}: Hits: {}, Misses: {}, Hit Rate: {}",
                pattern.name,
                pattern.hits,
                pattern.misses,
                format_rate(pattern.hit_rate)
            );
        }
        println!("  Overall Hit Rate: {}", format_rate(cache.overall_hit_rate));
    }
}
