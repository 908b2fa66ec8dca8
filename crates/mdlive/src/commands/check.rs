use anyhow::Result;
use colored::Colorize;

use crate::api::{HttpApi, PresentationApi};
use crate::config::Config;
use crate::parser::{self, SlideDeck};
use crate::protocol::FileId;
use crate::recent::{RecentEntry, RecentFiles};

pub fn run(file_id: &str) -> Result<()> {
    let config = Config::load_or_default();
    let api = HttpApi::new(config.http_url());
    let file_id = FileId::new(file_id);
    let check = api.check(&file_id)?;
    if !check.exists {
        println!("{} {file_id} not found on {}", "missing".red().bold(), config.http_url());
        return Ok(());
    }

    let filename = check.filename.unwrap_or_else(|| "untitled.md".to_string());
    println!(
        "{} {} ({} slide(s))",
        "found".green().bold(),
        filename.bold(),
        check.slide_count.unwrap_or(0)
    );
    match fetch_deck(&api, &file_id) {
        Ok(deck) => {
            for slide in deck.iter() {
                let marker = if slide.has_diagram() { " [diagram]" } else { "" };
                println!(
                    "  {:>3}. {}{}",
                    slide.index + 1,
                    slide.title,
                    marker.dimmed()
                );
            }
        }
        Err(e) => log::warn!("Could not fetch slides: {e}"),
    }

    let mut recent = RecentFiles::load()?;
    recent.add(RecentEntry::new(file_id, filename));
    recent.save()?;
    Ok(())
}

/// The server's slides, or a local split of its markdown when it sent none.
fn fetch_deck(api: &impl PresentationApi, file_id: &FileId) -> Result<SlideDeck> {
    let markdown = api.markdown(file_id)?;
    if markdown.slides.is_empty() {
        return Ok(parser::segment_deck(&markdown.content));
    }
    Ok(SlideDeck::new(markdown.slides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CheckResponse, MarkdownResponse};
    use crate::error::ApiError;

    struct FakeApi;

    impl PresentationApi for FakeApi {
        fn check(&self, _file_id: &FileId) -> Result<CheckResponse, ApiError> {
            Ok(CheckResponse {
                exists: true,
                filename: Some("talk.md".to_string()),
                slide_count: Some(2),
            })
        }

        fn markdown(&self, file_id: &FileId) -> Result<MarkdownResponse, ApiError> {
            match file_id.as_str() {
                "raw" => Ok(MarkdownResponse {
                    content: "# Hello\n\n---\n\n# World".to_string(),
                    slides: Vec::new(),
                }),
                "rendered" => Ok(MarkdownResponse {
                    content: String::new(),
                    slides: parser::segment("# Server side"),
                }),
                other => Err(ApiError::NotFound(other.to_string())),
            }
        }
    }

    #[test]
    fn test_fetch_deck_prefers_server_slides() {
        let deck = fetch_deck(&FakeApi, &FileId::new("rendered")).unwrap();
        assert_eq!(deck.len(), 1);
        assert_eq!(deck[0].title, "Server side");
    }

    #[test]
    fn test_fetch_deck_splits_raw_markdown() {
        let deck = fetch_deck(&FakeApi, &FileId::new("raw")).unwrap();
        let titles: Vec<&str> = deck.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Hello", "World"]);
    }

    #[test]
    fn test_fetch_deck_missing_document() {
        assert!(fetch_deck(&FakeApi, &FileId::new("nope")).is_err());
    }
}
