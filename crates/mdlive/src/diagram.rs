//! Seam to the diagram rendering library.
//!
//! Rendering is asynchronous and may finish after the slide it belongs to has
//! been replaced, so every request carries the deck generation it was issued
//! for and stale completions are discarded by the presenter.

use std::fmt;
use std::str::FromStr;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::highlight::escape_html;
use crate::viewport::ViewBox;

/// A rendered diagram as it appears once mounted.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramSurface {
    pub svg: String,
    /// The root element's `viewBox`, when present.
    pub view_box: Option<ViewBox>,
    /// Bounding box of the drawn content.
    pub bbox: ViewBox,
    /// Rendered size in pixels, before any zoom.
    pub pixel_width: f64,
    pub pixel_height: f64,
}

/// Colour scheme of the presenter. Diagrams are drawn to match it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Theme name understood by the diagram library.
    pub fn renderer_theme(self) -> &'static str {
        match self {
            Self::Light => "default",
            Self::Dark => "dark",
        }
    }

    fn ink(self) -> &'static str {
        match self {
            Self::Light => "#1f2328",
            Self::Dark => "#e6edf3",
        }
    }

    fn paper(self) -> &'static str {
        match self {
            Self::Light => "#ffffff",
            Self::Dark => "#0d1117",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

pub trait DiagramRenderer {
    fn render(
        &self,
        source: &str,
        theme: Theme,
    ) -> BoxFuture<'static, Result<DiagramSurface, RenderError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub slide: usize,
    pub generation: u64,
    pub source: String,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub slide: usize,
    pub generation: u64,
    pub result: Result<DiagramSurface, RenderError>,
}

/// Render a request to completion, tagging the result with its origin.
pub async fn run_request<R: DiagramRenderer + ?Sized>(
    renderer: &R,
    request: RenderRequest,
) -> RenderOutcome {
    let result = renderer.render(&request.source, request.theme).await;
    RenderOutcome {
        slide: request.slide,
        generation: request.generation,
        result,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DiagramState {
    /// Slide has no diagram.
    #[default]
    None,
    /// Diagram present but not requested yet.
    Unrendered,
    Rendering,
    Ready,
    /// Shown as an inline error panel in place of the diagram.
    Failed(String),
}

const KNOWN_KINDS: &[&str] = &[
    "graph",
    "flowchart",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "stateDiagram-v2",
    "erDiagram",
    "journey",
    "gantt",
    "pie",
    "mindmap",
    "timeline",
    "gitGraph",
    "quadrantChart",
];

const LINE_HEIGHT: f64 = 20.0;
const CHAR_WIDTH: f64 = 8.0;
const PADDING: f64 = 16.0;

/// Renders the diagram source as a plain text listing inside an SVG.
///
/// Checks the diagram kind on the first line so authoring mistakes surface
/// as render failures, the way a real renderer reports syntax errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineRenderer;

impl OutlineRenderer {
    pub fn render_sync(source: &str, theme: Theme) -> Result<DiagramSurface, RenderError> {
        let lines: Vec<&str> = source
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with("%%"))
            .collect();
        let Some(first) = lines.first() else {
            return Err(RenderError::Syntax("No diagram type detected".to_string()));
        };
        let kind = first.split_whitespace().next().unwrap_or_default();
        if !KNOWN_KINDS.contains(&kind) {
            return Err(RenderError::Syntax(format!("Unknown diagram type: {kind}")));
        }

        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let width = longest as f64 * CHAR_WIDTH + PADDING * 2.0;
        let height = lines.len() as f64 * LINE_HEIGHT + PADDING * 2.0;

        let (ink, paper) = (theme.ink(), theme.paper());
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" data-theme="{theme}">"#
        );
        svg.push_str(&format!(
            r#"<rect width="{width}" height="{height}" fill="{paper}"/>"#
        ));
        for (i, line) in lines.iter().enumerate() {
            let y = PADDING + (i as f64 + 1.0) * LINE_HEIGHT - 5.0;
            svg.push_str(&format!(
                r#"<text x="{PADDING}" y="{y}" font-family="monospace" fill="{ink}">{}</text>"#,
                escape_html(line)
            ));
        }
        svg.push_str("</svg>");

        let bbox = ViewBox::new(0.0, 0.0, width, height);
        Ok(DiagramSurface {
            svg,
            view_box: Some(bbox),
            bbox,
            pixel_width: width,
            pixel_height: height,
        })
    }
}

impl DiagramRenderer for OutlineRenderer {
    fn render(
        &self,
        source: &str,
        theme: Theme,
    ) -> BoxFuture<'static, Result<DiagramSurface, RenderError>> {
        futures::future::ready(Self::render_sync(source, theme)).boxed()
    }
}
