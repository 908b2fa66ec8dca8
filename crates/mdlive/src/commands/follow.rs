use anyhow::Result;
use colored::Colorize;
use std::io::BufRead;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::diagram::{OutlineRenderer, Theme};
use crate::presenter::PresenterInput;
use crate::protocol::FileId;
use crate::runtime::{self, Command, Runtime, RuntimeUpdate};
use crate::session::Session;
use crate::sync::SyncEvent;
use crate::transport::WsConnector;

pub fn run(file_id: String, server: Option<String>) -> Result<()> {
    let config = Config::load_or_default();
    let url = server.unwrap_or_else(|| config.server_url().to_string());
    println!("Following {} on {}", file_id.bold(), url.dimmed());
    println!(
        "  {}",
        "Enter: next, p: previous, 1-9: jump, d: theme, q: quit".dimmed()
    );

    let session = Session::new(FileId::new(file_id), config.session_config());
    let (updates_tx, mut updates) = mpsc::unbounded_channel();
    let (commands_tx, commands) = mpsc::unbounded_channel();
    // stdin may close early; the channel stays open until `q`
    let _keep_open = commands_tx.clone();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if commands_tx.send(command_for_line(&line)).is_err() {
                break;
            }
        }
    });
    let runtime = Runtime::new(WsConnector::new(url), OutlineRenderer, config.runtime_config())
        .with_updates(updates_tx);

    runtime::block_on(async move {
        let printer = async {
            let mut titles: Vec<String> = Vec::new();
            while let Some(update) = updates.recv().await {
                match &update {
                    RuntimeUpdate::Sync(SyncEvent::DeckReplaced(deck)) => {
                        titles = deck.iter().map(|s| s.title.clone()).collect();
                    }
                    RuntimeUpdate::Sync(SyncEvent::PageChanged(page)) => {
                        if let Some(title) = titles.get(*page) {
                            println!(
                                "  {} {}",
                                format!("[{}/{}]", page + 1, titles.len()).cyan(),
                                title.bold()
                            );
                            continue;
                        }
                    }
                    RuntimeUpdate::ThemeChanged(theme) => remember_theme(*theme),
                    _ => {}
                }
                if let Some(line) = super::describe(&update) {
                    println!("  {line}");
                }
            }
        };
        let (result, ()) = tokio::join!(runtime.run(session, commands), printer);
        result.map(|_| ())
    })?
}

/// One typed line. Anything unrecognised is passed on as a key name, so
/// `Home`, `End` and digits work as they do in the browser.
fn command_for_line(line: &str) -> Command {
    let key = match line.trim() {
        "q" | "quit" => return Command::Quit,
        "" | "n" => "ArrowRight",
        "p" => "ArrowLeft",
        other => other,
    };
    Command::Presenter(PresenterInput::Key {
        key: key.to_string(),
        text_input_focused: false,
    })
}

fn remember_theme(theme: Theme) {
    let mut config = Config::load_or_default();
    config.set_theme(theme);
    if let Err(e) = config.save() {
        log::warn!("Could not save theme: {e}");
    }
}
