//! `stylemap` binary: map a stylesheet onto a design tree from the shell.
//!
//! Reads the design JSON and the stylesheet from files, runs the enhancement
//! through the worker, and prints the result as JSON (or as a text report
//! with `--report`). Exits non-zero on hard failures.

use stylemap_cli::cache::{CachedEnhancer, ResultCache};
use stylemap_cli::config::{Command, USAGE, parse_args, read_input};
use stylemap_cli::error::CliError;
use stylemap_cli::worker::{DEFAULT_QUEUE_CAPACITY, EnhanceWorker};
use stylemap_core::render_report;

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("stylemap error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    let config = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            print!("{USAGE}");
            return Ok(());
        }
        Command::Run(config) => config,
    };

    let options = config.enhance_options()?;
    let tree_json = read_input(&config.tree)?;
    let style_text = read_input(&config.css)?;
    log::debug!(
        "enhancing {} with {} ({} strategy)",
        config.tree.display(),
        config.css.display(),
        options.mapping_strategy
    );

    let (handle, worker) = EnhanceWorker::spawn(DEFAULT_QUEUE_CAPACITY);
    let enhancer = CachedEnhancer::new(handle, ResultCache::default());
    let result = enhancer.enhance(&tree_json, &style_text, &options).await?;

    // Dropping the last handle lets the worker drain and stop.
    drop(enhancer);
    if let Err(e) = worker.await {
        log::warn!("enhancement worker did not stop cleanly: {e}");
    }

    if config.report {
        print!("{}", render_report(&result));
    } else if config.pretty {
        println!("{}", serde_json::to_string_pretty(&*result)?);
    } else {
        println!("{}", serde_json::to_string(&*result)?);
    }
    Ok(())
}
