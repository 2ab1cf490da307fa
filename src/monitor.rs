//! File-watcher-triggered process restart.
//!
//! Watches a directory tree and restarts the supervised child command
//! whenever a file with one of the configured extensions changes. Intended
//! for development: run the application under `gantry-watch` and edits to
//! source or template files take effect on the next request.

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Supervision options.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Directory watched recursively.
    pub watch_dir: PathBuf,
    /// File extensions (without dot) that trigger a restart.
    pub extensions: Vec<String>,
    /// Child command line: program followed by its arguments.
    pub command: Vec<String>,
    /// Events closer together than this collapse into one restart.
    pub debounce: Duration,
}

impl MonitorOptions {
    pub fn new(watch_dir: impl Into<PathBuf>, command: Vec<String>) -> Self {
        Self {
            watch_dir: watch_dir.into(),
            extensions: vec!["rs".to_string()],
            command,
            debounce: Duration::from_millis(500),
        }
    }
}

/// Whether a changed path should trigger a restart.
fn is_relevant(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

fn start_child(command: &[String]) -> std::io::Result<Child> {
    info!(command = %command.join(" "), "Start process");
    Command::new(&command[0]).args(&command[1..]).spawn()
}

fn kill_child(child: &mut Child) {
    info!(pid = child.id(), "Kill process");
    if let Err(e) = child.kill() {
        warn!(error = %e, "Failed to kill child process");
    }
    match child.wait() {
        Ok(status) => info!(code = ?status.code(), "Process ended"),
        Err(e) => warn!(error = %e, "Failed to reap child process"),
    }
}

/// Supervise `command`, restarting it when watched files change.
///
/// Blocks forever (the development loop); returns only on watcher or spawn
/// failure.
pub fn watch_and_restart(opts: MonitorOptions) -> anyhow::Result<()> {
    anyhow::ensure!(!opts.command.is_empty(), "empty supervised command");

    let (tx, rx) = mpsc::channel::<PathBuf>();
    let extensions = opts.extensions.clone();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    for path in event.paths {
                        if is_relevant(&path, &extensions) {
                            let _ = tx.send(path);
                        }
                    }
                }
            }
            Err(e) => error!(error = %e, "Watch error"),
        },
        Config::default(),
    )?;
    watcher.watch(&opts.watch_dir, RecursiveMode::Recursive)?;
    info!(dir = %opts.watch_dir.display(), "Watching directory");

    let mut child = start_child(&opts.command)?;
    loop {
        let path = rx.recv()?;
        // Editors save in bursts; drain the burst before restarting.
        std::thread::sleep(opts.debounce);
        while rx.try_recv().is_ok() {}
        info!(path = %path.display(), "Source file changed");
        kill_child(&mut child);
        child = start_child(&opts.command)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_relevant_matches_extension() {
        let exts = vec!["rs".to_string(), "html".to_string()];
        assert!(is_relevant(Path::new("src/app.rs"), &exts));
        assert!(is_relevant(Path::new("templates/index.html"), &exts));
        assert!(!is_relevant(Path::new("notes.txt"), &exts));
        assert!(!is_relevant(Path::new("Makefile"), &exts));
    }
}
