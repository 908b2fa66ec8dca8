pub mod check;
pub mod completion;
pub mod config;
pub mod demo;
pub mod follow;
pub mod highlight;
pub mod recent;
pub mod slides;
pub mod validate;
pub mod watch;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use crate::runtime::RuntimeUpdate;
use crate::sync::SyncEvent;

pub(crate) fn read_markdown(file: &Path) -> Result<String> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

/// One-line description of a runtime update, `None` for noise.
pub(crate) fn describe(update: &RuntimeUpdate) -> Option<String> {
    match update {
        RuntimeUpdate::Connected => Some(format!("{}", "connected".green())),
        RuntimeUpdate::Disconnected => Some(format!("{}", "disconnected".red())),
        RuntimeUpdate::Sync(SyncEvent::Joined(id)) => Some(format!("joined {}", id.to_string().bold())),
        RuntimeUpdate::Sync(SyncEvent::DeckReplaced(deck)) => {
            Some(format!("deck: {} slide(s)", deck.len()))
        }
        RuntimeUpdate::Sync(SyncEvent::ContentReplaced(content)) => {
            Some(format!("content replaced by server ({} bytes)", content.len()))
        }
        RuntimeUpdate::Sync(SyncEvent::PageChanged(page)) => {
            Some(format!("page -> {}", (page + 1).to_string().cyan()))
        }
        RuntimeUpdate::RenderFinished { slide, ok } => Some(format!(
            "diagram on slide {} {}",
            slide + 1,
            if *ok { "rendered".green() } else { "failed".red() }
        )),
        RuntimeUpdate::ThemeChanged(theme) => Some(format!("theme -> {}", theme.to_string().cyan())),
        RuntimeUpdate::Editor(_) => None,
    }
}
