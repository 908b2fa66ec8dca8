use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::diagram::OutlineRenderer;
use crate::presenter::PresenterInput;
use crate::protocol::FileId;
use crate::runtime::{self, Command, Runtime, RuntimeConfig, RuntimeUpdate};
use crate::session::Session;
use crate::sync::SyncEvent;
use crate::transport::MemoryHub;

const STEP: Duration = Duration::from_millis(150);

fn key(k: &str) -> Command {
    Command::Presenter(PresenterInput::Key {
        key: k.to_string(),
        text_input_focused: false,
    })
}

/// Wait until a client has its first deck.
async fn ready(updates: &mut mpsc::UnboundedReceiver<RuntimeUpdate>) {
    while let Some(update) = updates.recv().await {
        if matches!(update, RuntimeUpdate::Sync(SyncEvent::DeckReplaced(_))) {
            return;
        }
    }
}

pub fn run(file: &Path) -> Result<()> {
    let content = super::read_markdown(file)?;
    let config = Config::load_or_default();
    let hub = MemoryHub::new();
    let file_id = FileId::new("demo");
    hub.insert_document(file_id.clone(), content.clone());

    let runtime_config = RuntimeConfig {
        max_attempts: Some(1),
        ..config.runtime_config()
    };

    let (presenter_tx, presenter_rx) = mpsc::unbounded_channel();
    let (presenter_updates_tx, mut presenter_updates) = mpsc::unbounded_channel();
    let presenter = Runtime::new(hub.clone(), OutlineRenderer, runtime_config)
        .with_updates(presenter_updates_tx)
        .run(Session::new(file_id.clone(), config.session_config()), presenter_rx);

    let (follower_tx, follower_rx) = mpsc::unbounded_channel();
    let (follower_updates_tx, mut follower_updates) = mpsc::unbounded_channel();
    let follower = Runtime::new(hub.clone(), OutlineRenderer, runtime_config)
        .with_updates(follower_updates_tx)
        .run(Session::new(file_id, config.session_config()), follower_rx);

    runtime::block_on(async move {
        let script = async {
            ready(&mut presenter_updates).await;
            ready(&mut follower_updates).await;
            println!("{} both clients joined", "demo:".bold());

            for k in ["ArrowRight", "ArrowRight", "ArrowLeft", "End", "d"] {
                println!("{} presenter presses {}", "demo:".bold(), k.cyan());
                let _ = presenter_tx.send(key(k));
                tokio::time::sleep(STEP).await;
                drain("follower", &mut follower_updates);
            }

            println!("{} presenter appends a slide", "demo:".bold());
            let _ = presenter_tx.send(Command::Edit(format!(
                "{}\n\n---\n\n# Added live\n\nTyped during the demo.",
                content.trim_end()
            )));
            tokio::time::sleep(config.sync_config().debounce + STEP * 2).await;
            drain("presenter", &mut presenter_updates);
            drain("follower", &mut follower_updates);

            let _ = presenter_tx.send(Command::Quit);
            let _ = follower_tx.send(Command::Quit);
        };
        let (presenter, follower, ()) = tokio::join!(presenter, follower, script);
        let (presenter, follower) = (presenter?, follower?);
        println!(
            "{} presenter on slide {}, follower on slide {} of {}",
            "done:".green().bold(),
            presenter.current_slide() + 1,
            follower.current_slide() + 1,
            follower.presenter().slide_count()
        );
        anyhow::Ok(())
    })?
}

fn drain(who: &str, updates: &mut mpsc::UnboundedReceiver<RuntimeUpdate>) {
    while let Ok(update) = updates.try_recv() {
        if let Some(line) = super::describe(&update) {
            println!("  {} {line}", format!("{who}:").dimmed());
        }
    }
}
