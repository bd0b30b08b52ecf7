//! health - repository health scoring CLI

use clap::Parser;
use repo_health::cli::{self, exit_codes, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::FATAL
            } else {
                exit_codes::OK
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // RUST_LOG wins; otherwise --log-level, raised by --verbose / VERBOSE
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let code = match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            exit_codes::FATAL
        }
    };
    std::process::exit(code);
}
