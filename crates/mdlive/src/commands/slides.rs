use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::parser;

pub fn run(file: &Path) -> Result<()> {
    let content = super::read_markdown(file)?;
    let deck = parser::segment_deck(&content);
    if deck.is_empty() {
        println!("{}", "No slides".dimmed());
        return Ok(());
    }
    for slide in deck.iter() {
        let mut markers = Vec::new();
        if slide.has_diagram() {
            markers.push("diagram".magenta().to_string());
        }
        if slide.notes.is_some() {
            markers.push("notes".yellow().to_string());
        }
        let markers = if markers.is_empty() {
            String::new()
        } else {
            format!(" [{}]", markers.join(", "))
        };
        println!(
            "{:>3}  {}{markers}",
            (slide.index + 1).to_string().dimmed(),
            slide.title.bold()
        );
    }
    println!("\n{} slide(s)", deck.len());
    Ok(())
}
