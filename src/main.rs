mod cli;
mod core;
mod repl;
mod tui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    let args = Cli::parse();
    let interactive = matches!(args.command, None | Some(Commands::Shell));
    init_tracing(args.global.verbose, interactive);

    let config = args.global.to_config();
    let result = match args.command {
        None | Some(Commands::Shell) => tui::run(config),
        Some(Commands::Repl) => repl::run(&config),
        Some(command) => cli::execute(command, &config),
    };

    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over `-v`. The terminal UI stays silent by default so log
/// lines do not tear the alternate screen.
fn init_tracing(verbose: u8, interactive: bool) {
    let default = match (interactive, verbose) {
        (true, _) => "off",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
