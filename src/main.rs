mod config;
mod models;
mod overview;
mod run;
mod session;
mod store;
mod ui;

use std::sync::Arc;

use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    // Help and version must work before any token is configured.
    match args.get(1).map(String::as_str) {
        Some("--help" | "-h" | "help") => {
            run::cli::print_usage();
            return Ok(());
        }
        Some("--version" | "-V" | "version") => {
            println!("expenseflow {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let config = config::Config::load()?;
    let store: Arc<dyn store::ExpenseStore> =
        Arc::new(store::HttpStore::new(&config.base_url, &config.token)?);

    match args.len() {
        1 => run::as_tui(store),
        2.. => run::as_cli(&args, store.as_ref()),
        _ => {
            eprintln!("Usage: expenseflow [command]");
            Ok(())
        }
    }
}
