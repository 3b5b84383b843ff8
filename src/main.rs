use clap::{ArgAction, Parser};
use cfdump::{FsStorage, InspectOptions, Inspector, ProbePolicy};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cfdump", version, about = "Verify and dump changefile containers")]
struct Cli {
    /// Changefiles to inspect, in order
    #[arg(required = true, num_args = 1..)]
    files: Vec<PathBuf>,
    /// Print one JSON report per file instead of the text listing
    #[arg(long)]
    json: bool,
    /// Print block status lines but not the byte listing
    #[arg(long)]
    no_hexdump: bool,
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn setup_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let default = format!("{}={}", env!("CARGO_PKG_NAME"), level);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Name used to prefix open failures; argv[0] need not be UTF-8.
fn program_name(arg0: Option<OsString>) -> String {
    arg0.map(|a| a.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").into())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    let options = InspectOptions {
        probe:   ProbePolicy::default(),
        hexdump: !cli.no_hexdump,
        json:    cli.json,
    };
    let inspector = Inspector::new(FsStorage, options);

    let prog = program_name(std::env::args_os().next());
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut err = stderr.lock();

    let status = inspector.run(&prog, &cli.files, &mut out, &mut err);
    if let Err(e) = out.flush() {
        let _ = writeln!(err, "{prog}: {e}");
    }

    log::debug!(
        "{} of {} file(s) inspected, exit {}{}",
        status.reports.len(),
        status.attempted,
        status.exit_code,
        if status.halted { " (halted)" } else { "" }
    );
    ExitCode::from(status.exit_code)
}
