pub mod blog;
mod cli;
pub mod date_ago;
pub mod scramble;
pub mod settings;
pub mod storage;
mod utils;

use clap::Parser;

pub use utils::logging::init_logging;

pub fn run() -> anyhow::Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    init_logging();

    let args = cli::Cli::parse();
    log::debug!("folio starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(cli::dispatch(args))
}
