//! Development supervisor: restart a command when source files change.
//!
//! ```bash
//! gantry-watch --dir src --ext rs,html -- cargo run
//! ```

use clap::Parser;
use gantry::monitor::{watch_and_restart, MonitorOptions};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "gantry-watch", about = "Restart a command when watched files change")]
struct Args {
    /// Directory to watch recursively
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Comma-separated file extensions that trigger a restart
    #[arg(long, default_value = "rs")]
    ext: String,

    /// Debounce window in milliseconds
    #[arg(long, default_value_t = 500)]
    debounce_ms: u64,

    /// Command to supervise
    #[arg(trailing_var_arg = true, required = true)]
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    gantry::logging::init();
    let args = Args::parse();
    let mut opts = MonitorOptions::new(args.dir, args.command);
    opts.extensions = args
        .ext
        .split(',')
        .map(|e| e.trim().trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .collect();
    opts.debounce = Duration::from_millis(args.debounce_ms);
    watch_and_restart(opts)
}
