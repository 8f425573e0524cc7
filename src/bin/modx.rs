use clap::Parser;
use colored::*;
use modx::{
    cli::{Cli, dispatcher},
    system::executor::SystemRunner,
};

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    log::debug!("CLI args parsed: {:?}", cli);

    // Every handler error surfaces here, with its whole context chain on one line.
    if let Err(e) = dispatcher::dispatch(cli.args, &SystemRunner::new()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}
