mod cli;

use clap::Parser;
use cli::args::Cli;
use cli::runner::run_cli;
use std::{env, process};

fn main() {
    let args = Cli::parse();

    if args.verbose == 1 {
        env::set_var("RUST_LOG", "debug");
    } else if args.verbose > 1 {
        env::set_var("RUST_LOG", "trace");
    } else if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let exit_code = match run_cli(args) {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{:#}", e);
            1
        }
    };

    process::exit(exit_code);
}
