use anyhow::Result;
use colored::Colorize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::api::HttpApi;
use crate::config::Config;
use crate::recent::RecentFiles;

pub fn run(prune: bool) -> Result<()> {
    let mut recent = RecentFiles::load()?;
    if prune {
        let api = HttpApi::new(Config::load_or_default().http_url());
        let removed = recent.prune(&api);
        recent.save()?;
        println!("Removed {removed} stale entr{}", if removed == 1 { "y" } else { "ies" });
    }

    if recent.is_empty() {
        println!("{}", "No recent presentations".dimmed());
        return Ok(());
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    for entry in recent.entries() {
        println!(
            "  {}  {}  {}",
            entry.file_id.to_string().cyan(),
            entry.filename.bold(),
            age(now.saturating_sub(entry.uploaded_at)).dimmed()
        );
    }
    Ok(())
}

fn age(secs: u64) -> String {
    match secs {
        0..60 => "just now".to_string(),
        60..3600 => format!("{}m ago", secs / 60),
        3600..86400 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86400),
    }
}
