use anyhow::{Context, Result};
use colored::Colorize;
use log::{debug, warn};
use notify_debouncer_mini::notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::diagram::OutlineRenderer;
use crate::protocol::FileId;
use crate::runtime::{self, Command, Runtime, RuntimeUpdate};
use crate::session::Session;
use crate::sync::SyncEvent;
use crate::transport::WsConnector;

const WATCH_DEBOUNCE: Duration = Duration::from_millis(300);

pub fn run(file: PathBuf, file_id: String, server: Option<String>, quiet: bool) -> Result<()> {
    let initial = super::read_markdown(&file)?;
    let file = file
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", file.display()))?;
    let dir = file
        .parent()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("{} has no parent directory", file.display()))?;

    let config = Config::load_or_default();
    let url = server.unwrap_or_else(|| config.server_url().to_string());
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (commands_tx, commands) = mpsc::unbounded_channel();
    let (updates_tx, mut updates) = mpsc::unbounded_channel();

    let watched = file.clone();
    let watcher_tx = commands_tx.clone();
    let mut debouncer = new_debouncer(WATCH_DEBOUNCE, move |result: DebounceEventResult| {
        match result {
            Ok(events) => {
                if !events.iter().any(|e| e.path == watched) {
                    return;
                }
                match std::fs::read_to_string(&watched) {
                    Ok(content) => {
                        debug!("{} changed ({} bytes)", watched.display(), content.len());
                        let _ = watcher_tx.send(Command::Edit(content));
                    }
                    Err(e) => warn!("Failed to read {}: {e}", watched.display()),
                }
            }
            Err(e) => warn!("Watch error: {e}"),
        }
    })
    .context("Failed to create file watcher")?;
    debouncer
        .watcher()
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;

    println!(
        "Watching {} -> {} on {}",
        file.display().to_string().bold(),
        file_id.bold(),
        url.dimmed()
    );

    let session = Session::new(FileId::new(file_id), config.session_config()).with_file_name(name);
    let runtime = Runtime::new(WsConnector::new(url), OutlineRenderer, config.runtime_config())
        .with_updates(updates_tx);

    runtime::block_on(async move {
        let reporter = async {
            let mut pushed_initial = false;
            while let Some(update) = updates.recv().await {
                // The snapshot wins over anything sent before it, so the
                // file's content goes out once the snapshot is in
                if !pushed_initial
                    && matches!(update, RuntimeUpdate::Sync(SyncEvent::DeckReplaced(_)))
                {
                    pushed_initial = true;
                    let _ = commands_tx.send(Command::Edit(initial.clone()));
                }
                if quiet {
                    continue;
                }
                if let Some(line) = super::describe(&update) {
                    println!("  {line}");
                }
            }
        };
        let (result, ()) = tokio::join!(runtime.run(session, commands), reporter);
        result.map(|_| ())
    })??;
    drop(debouncer);
    Ok(())
}
