pub mod preview;
pub mod splitter;

use std::ops::Deref;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fence language that marks a diagram block.
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

const TITLE_MAX_CHARS: usize = 50;

static DIAGRAM_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?s)```{DIAGRAM_LANGUAGE}[ \t]*\n(?:(.*?)\n)??[ \t]*```")).unwrap()
});
static NOTES_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!-- notes -->(.*?)(?:<!-- /notes -->|$)").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]+(.+)$").unwrap());
static TITLE_BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static TITLE_ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static TITLE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.+?)`").unwrap());
static TITLE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.+?)\]\(.*?\)").unwrap());

/// One rendering unit derived from a separator-delimited chunk.
///
/// The same shape travels on the wire, so the server's canonical slides and
/// the local preview are interchangeable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub html: String,
    #[serde(default, rename = "mermaid")]
    pub diagram: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub title: String,
}

impl Slide {
    pub fn has_diagram(&self) -> bool {
        self.diagram.is_some()
    }
}

/// An immutable, shareable slide sequence.
///
/// Decks are never edited in place: a new document produces a new deck and the
/// old one is swapped out whole, so readers never see a half-built list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideDeck(Arc<[Slide]>);

impl SlideDeck {
    /// Build a deck, renumbering slides and normalizing empty notes to `None`.
    pub fn new(slides: Vec<Slide>) -> Self {
        let slides: Vec<Slide> = slides
            .into_iter()
            .enumerate()
            .map(|(index, mut slide)| {
                slide.index = index;
                if slide.notes.as_deref().is_some_and(|n| n.trim().is_empty()) {
                    slide.notes = None;
                }
                slide
            })
            .collect();
        Self(slides.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn to_vec(&self) -> Vec<Slide> {
        self.0.to_vec()
    }
}

impl Deref for SlideDeck {
    type Target = [Slide];

    fn deref(&self) -> &[Slide] {
        &self.0
    }
}

impl From<Vec<Slide>> for SlideDeck {
    fn from(slides: Vec<Slide>) -> Self {
        Self::new(slides)
    }
}

/// Segment a markdown document into slides.
///
/// Pure and deterministic. Empty chunks are dropped before indices are
/// assigned, so callers must not map separators to slides one to one.
pub fn segment(markdown: &str) -> Vec<Slide> {
    splitter::split(markdown)
        .into_iter()
        .enumerate()
        .map(|(index, raw)| build_slide(index, raw))
        .collect()
}

/// Segment straight into a deck.
pub fn segment_deck(markdown: &str) -> SlideDeck {
    SlideDeck::new(segment(markdown))
}

fn build_slide(index: usize, raw: String) -> Slide {
    let (body, notes) = extract_notes(&raw);
    let (body, diagram) = extract_diagram(&body);
    let title = slide_title(&body);
    let html = preview::to_markup(&body);
    let notes = notes.map(|n| preview::to_markup(&n));

    Slide {
        index,
        html,
        diagram,
        notes,
        raw,
        title,
    }
}

/// Split speaker notes (`<!-- notes -->` up to `<!-- /notes -->` or the end
/// of the slide) from the body.
pub fn extract_notes(raw: &str) -> (String, Option<String>) {
    let Some(caps) = NOTES_BLOCK.captures(raw) else {
        return (raw.to_string(), None);
    };
    let notes = caps[1].trim().to_string();
    let body = NOTES_BLOCK.replace(raw, "").trim().to_string();
    let notes = (!notes.is_empty()).then_some(notes);
    (body, notes)
}

/// Pull the first mermaid fence out of the body, keeping its text verbatim.
pub fn extract_diagram(body: &str) -> (String, Option<String>) {
    let Some(caps) = DIAGRAM_BLOCK.captures(body) else {
        return (body.to_string(), None);
    };
    // An empty fence has no body group
    let diagram = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let body = DIAGRAM_BLOCK.replace(body, "").trim().to_string();
    (body, Some(diagram))
}

/// Title of a slide: the first heading, else the first plain line with its
/// inline formatting stripped, else "Untitled".
pub fn slide_title(body: &str) -> String {
    if let Some(caps) = HEADING.captures(body) {
        return caps[1].trim().to_string();
    }

    let mut in_fence = false;
    for line in body.lines() {
        let line = line.trim();
        if line.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || line.is_empty() || line.starts_with('<') {
            continue;
        }
        let line = TITLE_BOLD.replace_all(line, "$1");
        let line = TITLE_ITALIC.replace_all(&line, "$1");
        let line = TITLE_CODE.replace_all(&line, "$1");
        let line = TITLE_LINK.replace_all(&line, "$1");

        if line.chars().count() > TITLE_MAX_CHARS {
            let truncated: String = line.chars().take(TITLE_MAX_CHARS).collect();
            return format!("{truncated}...");
        }
        return line.into_owned();
    }

    "Untitled".to_string()
}
