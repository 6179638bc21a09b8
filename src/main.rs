// Entrypoint for the reminders CLI.
// - Keeps `main` small: parse top-level flags, build the dispatcher and
//   hand it the remaining arguments.
// - Any failure is printed on stdout and exits with status 2.

use clap::Parser;
use reminders_cli::cli::{Cli, Switch};
use std::io::{self, Write};
use std::path::Path;
use std::process;
use tracing::level_filters::LevelFilter;

const EXIT_FAILURE: i32 = 2;

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let program = std::env::args()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reminders-cli".into());

    let result = run(&cli, &program, &mut io::stdout().lock());
    if let Err(err) = result {
        println!("cmd switch error: {err:#}");
        process::exit(EXIT_FAILURE);
    }
}

fn run(cli: &Cli, program: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let switch = Switch::new(&cli.backend)?.raw(cli.raw);
    if cli.help || cli.command.is_empty() {
        return switch.help(program, out);
    }
    switch.run(program, &cli.command, out)
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(filter)
        .with_target(false)
        .init();
}
