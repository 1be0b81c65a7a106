//! Command-line driver (C10, §6, §10.4): parses the CLI surface, wires the
//! façade, and reports results through `log`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use hskernel::facade::{self, Config};
use hskernel::formula::Formula;
use hskernel::store::JsonFileStore;

/// Kernel extraction and branch-and-bound hitting-set tree search over a
/// propositional knowledge base.
#[derive(Parser)]
#[command(name = "hskernel", version, about)]
struct Cli {
    /// Dataset file path, or dataset name in the record store.
    dataset_name: String,

    /// 0 = plain enumeration, 1 = fixed cost, 2 = unique random, 3 = inconsistency-derived.
    strategy_param: u8,

    /// Expand-shrink window size.
    #[arg(long = "sw-size", default_value_t = 1)]
    sw_size: usize,

    /// Use the divide-and-conquer shrink variant (expand-shrink only).
    #[arg(short = 'd', long = "divide-conquer")]
    divide_and_conquer: bool,

    /// The query formula.
    #[arg(long)]
    alpha: String,

    /// Use expand-shrink kernel extraction.
    #[arg(short, long)]
    kernel: bool,

    /// Use shrink-expand (remainder-based) kernel extraction.
    #[arg(short, long)]
    remainder: bool,

    /// Append an execution record to the record store.
    #[arg(long = "log-db")]
    log_db: bool,

    #[arg(long = "solver-path", default_value = "solver")]
    solver_path: PathBuf,

    #[arg(long = "im-path", default_value = "im")]
    im_path: PathBuf,

    #[arg(long = "store-path", default_value = "./records.json")]
    store_path: PathBuf,

    /// Wall-clock deadline for the whole search. No deadline if omitted.
    #[arg(long = "timeout-secs")]
    timeout_secs: Option<u64>,

    /// Seed for strategy 2 (unique random costs).
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> ExitCode {
    if simple_logger::init_with_level(log::Level::Info).is_err() {
        eprintln!("warning: failed to initialise logger");
    }

    let cli = Cli::parse();

    let alpha = match Formula::parse(&cli.alpha) {
        Ok(f) => f,
        Err(e) => {
            error!("invalid --alpha formula: {e}");
            return ExitCode::FAILURE;
        }
    };

    let dataset_path = PathBuf::from(&cli.dataset_name);
    let dataset_path = dataset_path.is_file().then_some(dataset_path);

    let config = Config {
        dataset_name: cli.dataset_name,
        dataset_path,
        strategy_param: cli.strategy_param,
        window_size: cli.sw_size,
        divide_and_conquer: cli.divide_and_conquer,
        alpha,
        use_kernel: cli.kernel,
        use_remainder: cli.remainder,
        log_db: cli.log_db,
        solver_path: cli.solver_path,
        im_path: cli.im_path,
        random_seed: cli.seed,
        timeout: cli.timeout_secs.map(Duration::from_secs),
    };

    let store = JsonFileStore::new(&cli.store_path);

    match facade::run(&config, Some(&store)) {
        Ok(report) => {
            info!(
                "completed in {:?}: {} kernels, {} branches, depth {}, {} pruned, boundary {}, hitting set {:?}",
                report.execution_time,
                report.kernel_count,
                report.branch_count,
                report.tree_depth,
                report.pruned_count,
                report.boundary,
                report.optimal_hitting_set,
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
