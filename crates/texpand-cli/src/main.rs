mod cli;
mod commands;

use clap::Parser;
use cli::Texpand;
use commands::handle_command;
use std::process;

fn main() {
    let args = Texpand::parse();

    if let Err(e) = handle_command(args.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
