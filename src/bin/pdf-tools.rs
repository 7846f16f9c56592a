//! PDF Tools CLI
//!
//! Merge, watermark and rasterize PDF documents from the command line.

use std::process;

use tracing::{debug, Level};

use pdf_tools::{Cli, Error};

fn main() {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        // Help, version and malformed values: clap prints and picks the exit code
        Err(Error::Usage(e)) => e.exit(),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    init_logging(cli.verbose);

    let Some(command) = cli.into_command() else {
        debug!("no command given, nothing to do");
        return;
    };

    match command.run() {
        Ok(report) => println!("{}", report),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Log to stderr so stdout only carries the confirmation line
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
