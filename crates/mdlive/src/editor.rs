//! Markdown editor: buffer, selection, shortcuts and the side preview.

use std::time::Instant;

use log::debug;

use crate::highlight::highlight;
use crate::parser::{self, Slide, SlideDeck};
use crate::sync::{SaveStatus, SyncClient};
use crate::viewport::Modifiers;

pub const SLIDE_BREAK: &str = "\n\n---\n\n";
pub const INDENT: &str = "  ";
pub const EMPTY_PREVIEW: &str = "No slides yet. Start typing!";
pub const DEFAULT_DOWNLOAD_NAME: &str = "presentation.md";

/// Something the host must do in response to a shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// The buffer changed and a save was scheduled.
    Edited,
    /// Explicit save; `queued` is false when nothing could be sent.
    Saved { queued: bool },
    Download { filename: String, content: String },
    PreviewToggled(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorPreview {
    pub visible: bool,
    /// One "Slide N" entry per slide.
    pub options: Vec<String>,
    pub selected: usize,
    pub slide: Option<Slide>,
    /// Shown instead of a slide when the deck is empty.
    pub placeholder: Option<&'static str>,
}

pub struct Editor {
    buffer: String,
    /// Byte offsets, always on char boundaries, `start <= end`.
    selection: (usize, usize),
    file_name: Option<String>,
    preview_visible: bool,
    preview_deck: SlideDeck,
    preview_index: usize,
    notice: Option<&'static str>,
}

impl Editor {
    pub fn new(content: impl Into<String>) -> Self {
        let buffer = content.into();
        let preview_deck = parser::segment_deck(&buffer);
        Self {
            buffer,
            selection: (0, 0),
            file_name: None,
            preview_visible: true,
            preview_deck,
            preview_index: 0,
            notice: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn selection(&self) -> (usize, usize) {
        self.selection
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.selection = (
            clamp_to_boundary(&self.buffer, start),
            clamp_to_boundary(&self.buffer, end),
        );
    }

    pub fn selected_text(&self) -> &str {
        &self.buffer[self.selection.0..self.selection.1]
    }

    /// Replace the whole buffer with typed text.
    pub fn input(&mut self, text: impl Into<String>, now: Instant, sync: &mut SyncClient) {
        self.buffer = text.into();
        let (start, end) = self.selection;
        self.set_selection(start, end);
        self.changed(now, sync);
    }

    fn changed(&mut self, now: Instant, sync: &mut SyncClient) {
        self.notice = None;
        sync.local_edit(self.buffer.clone(), now);
    }

    fn splice(&mut self, start: usize, end: usize, insert: &str) {
        self.buffer.replace_range(start..end, insert);
    }

    /// Wrap the selection in `before`/`after`. With nothing selected the
    /// markers are inserted and the cursor lands between them.
    pub fn insert_markdown(
        &mut self,
        before: &str,
        after: &str,
        now: Instant,
        sync: &mut SyncClient,
    ) {
        let (start, end) = self.selection;
        let selected = self.buffer[start..end].to_string();
        let wrapped = format!("{before}{selected}{after}");
        self.splice(start, end, &wrapped);
        self.selection = if selected.is_empty() {
            (start + before.len(), start + before.len())
        } else {
            (start, start + wrapped.len())
        };
        self.changed(now, sync);
    }

    pub fn insert_slide_break(&mut self, now: Instant, sync: &mut SyncClient) {
        let at = self.selection.1;
        self.splice(at, at, SLIDE_BREAK);
        let cursor = at + SLIDE_BREAK.len();
        self.selection = (cursor, cursor);
        self.changed(now, sync);
    }

    /// Tab: two spaces in place of the selection.
    pub fn indent(&mut self, now: Instant, sync: &mut SyncClient) {
        let (start, end) = self.selection;
        self.splice(start, end, INDENT);
        let cursor = start + INDENT.len();
        self.selection = (cursor, cursor);
        self.changed(now, sync);
    }

    /// The server's snapshot won; nothing is sent back.
    pub fn apply_remote_content(&mut self, content: impl Into<String>) {
        self.buffer = content.into();
        let (start, end) = self.selection;
        self.set_selection(start, end);
        debug!("Editor buffer replaced by server content");
    }

    /// Handle a key press. Returns `None` for keys the editor doesn't own.
    pub fn key(
        &mut self,
        key: &str,
        mods: Modifiers,
        now: Instant,
        sync: &mut SyncClient,
    ) -> Option<EditorAction> {
        if !(mods.ctrl || mods.meta) {
            if key == "Tab" {
                self.indent(now, sync);
                return Some(EditorAction::Edited);
            }
            return None;
        }
        match key {
            "s" => Some(EditorAction::Saved {
                queued: sync.save_now(now),
            }),
            "d" => Some(self.download()),
            "p" => Some(EditorAction::PreviewToggled(self.toggle_preview())),
            "b" => {
                self.insert_markdown("**", "**", now, sync);
                Some(EditorAction::Edited)
            }
            "i" => {
                self.insert_markdown("*", "*", now, sync);
                Some(EditorAction::Edited)
            }
            "k" => {
                self.insert_markdown("[", "](url)", now, sync);
                Some(EditorAction::Edited)
            }
            "Enter" => {
                self.insert_slide_break(now, sync);
                Some(EditorAction::Edited)
            }
            _ => None,
        }
    }

    pub fn download(&mut self) -> EditorAction {
        self.notice = Some("Downloaded");
        EditorAction::Download {
            filename: self
                .file_name
                .clone()
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string()),
            content: self.buffer.clone(),
        }
    }

    pub fn toggle_preview(&mut self) -> bool {
        self.preview_visible = !self.preview_visible;
        self.preview_visible
    }

    pub fn set_preview_deck(&mut self, deck: SlideDeck) {
        self.preview_deck = deck;
        self.clamp_preview_index();
    }

    /// Pick a preview slide from a fresh local segmentation of the buffer.
    pub fn select_slide(&mut self, index: usize) -> Option<&Slide> {
        self.preview_deck = parser::segment_deck(&self.buffer);
        self.preview_index = index;
        self.clamp_preview_index();
        self.preview_deck.get(self.preview_index)
    }

    /// Follow the presenter's position.
    pub fn apply_remote_page(&mut self, page: usize) {
        self.preview_index = page;
        self.clamp_preview_index();
    }

    pub fn preview_index(&self) -> usize {
        self.preview_index
    }

    fn clamp_preview_index(&mut self) {
        self.preview_index = self
            .preview_index
            .min(self.preview_deck.len().saturating_sub(1));
    }

    pub fn preview(&self) -> EditorPreview {
        EditorPreview {
            visible: self.preview_visible,
            options: (1..=self.preview_deck.len())
                .map(|n| format!("Slide {n}"))
                .collect(),
            selected: self.preview_index,
            slide: self.preview_deck.get(self.preview_index).cloned(),
            placeholder: self.preview_deck.is_empty().then_some(EMPTY_PREVIEW),
        }
    }

    /// Backdrop markup. The trailing newline keeps the last line's height
    /// in step with the text area.
    pub fn highlighted(&self) -> String {
        let mut out = highlight(&self.buffer);
        out.push('\n');
        out
    }

    pub fn status_label(&self, status: SaveStatus) -> &'static str {
        match (self.notice, status) {
            (Some(notice), SaveStatus::Saved) => notice,
            _ => status.label(),
        }
    }
}

fn clamp_to_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
