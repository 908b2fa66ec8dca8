//! One client's view of one document for the lifetime of a connection.
//!
//! A [`Session`] owns the [`SyncClient`] and both controllers and is the only
//! place where their outputs meet: inbound sync events are applied to the
//! presenter and editor, and presenter effects are turned into outbound
//! messages or render requests.

use std::time::Instant;

use log::debug;

use crate::diagram::{RenderOutcome, RenderRequest, Theme};
use crate::editor::{Editor, EditorAction};
use crate::error::PresenterError;
use crate::parser::SlideDeck;
use crate::presenter::{Presenter, PresenterConfig, PresenterEffect, PresenterInput};
use crate::protocol::{ClientMessage, FileId, ServerMessage};
use crate::sync::{SyncClient, SyncConfig, SyncEvent};
use crate::viewport::Modifiers;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionConfig {
    pub sync: SyncConfig,
    pub presenter: PresenterConfig,
}

pub struct Session {
    sync: SyncClient,
    presenter: Presenter,
    editor: Editor,
    renders: Vec<RenderRequest>,
    editor_requested: bool,
    theme_change: Option<Theme>,
    closed: bool,
}

impl Session {
    pub fn new(file_id: FileId, config: SessionConfig) -> Self {
        Self {
            sync: SyncClient::new(file_id, config.sync),
            presenter: Presenter::new(SlideDeck::empty(), config.presenter),
            editor: Editor::new(""),
            renders: Vec::new(),
            editor_requested: false,
            theme_change: None,
            closed: false,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.editor = self.editor.with_file_name(name);
        self
    }

    pub fn file_id(&self) -> &FileId {
        self.sync.file_id()
    }

    pub fn sync(&self) -> &SyncClient {
        &self.sync
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// 0-based index of the slide this client shows.
    pub fn current_slide(&self) -> usize {
        self.presenter.current()
    }

    pub fn connecting(&mut self) {
        self.sync.begin_connect();
    }

    pub fn connected(&mut self) {
        self.sync.on_connected();
    }

    /// Renders that were running died with the connection and are queued
    /// again for the active slide.
    pub fn disconnected(&mut self) {
        self.sync.on_disconnected();
        self.renders.clear();
        self.presenter.abandon_renders();
        self.route_effects();
    }

    /// Apply one inbound message to every component.
    pub fn dispatch(&mut self, message: ServerMessage) -> Vec<SyncEvent> {
        let events = self.sync.handle(message);
        for event in &events {
            match event {
                SyncEvent::Joined(_) => {}
                SyncEvent::ContentReplaced(content) => {
                    self.editor.apply_remote_content(content.as_str());
                }
                SyncEvent::DeckReplaced(deck) => {
                    self.presenter.replace_deck(deck.clone());
                    self.editor.set_preview_deck(deck.clone());
                }
                SyncEvent::PageChanged(page) => {
                    self.presenter.apply_remote_page(*page);
                    self.editor.apply_remote_page(*page);
                }
            }
        }
        self.route_effects();
        events
    }

    pub fn presenter_input(&mut self, input: PresenterInput) -> Result<(), PresenterError> {
        let result = self.presenter.handle(input);
        self.route_effects();
        result
    }

    /// Run a presenter operation and route whatever it emitted.
    pub fn with_presenter<T>(&mut self, f: impl FnOnce(&mut Presenter) -> T) -> T {
        let out = f(&mut self.presenter);
        self.route_effects();
        out
    }

    fn route_effects(&mut self) {
        for effect in self.presenter.take_effects() {
            match effect {
                PresenterEffect::Broadcast(page) => {
                    if !self.sync.broadcast_page(page) {
                        debug!("Not broadcasting page {page} while disconnected");
                    }
                    self.editor.apply_remote_page(page);
                }
                PresenterEffect::Render(request) => self.renders.push(request),
                PresenterEffect::OpenEditor => self.editor_requested = true,
                PresenterEffect::ThemeChanged(theme) => self.theme_change = Some(theme),
            }
        }
    }

    pub fn edit(&mut self, text: impl Into<String>, now: Instant) {
        self.editor.input(text, now, &mut self.sync);
    }

    pub fn editor_key(&mut self, key: &str, mods: Modifiers, now: Instant) -> Option<EditorAction> {
        self.editor.key(key, mods, now, &mut self.sync)
    }

    pub fn with_editor<T>(&mut self, f: impl FnOnce(&mut Editor, &mut SyncClient) -> T) -> T {
        f(&mut self.editor, &mut self.sync)
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        self.sync.poll(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.sync.next_deadline()
    }

    pub fn take_outbox(&mut self) -> Vec<ClientMessage> {
        self.sync.drain_outbox()
    }

    pub fn take_render_requests(&mut self) -> Vec<RenderRequest> {
        std::mem::take(&mut self.renders)
    }

    pub fn complete_render(&mut self, outcome: RenderOutcome) -> bool {
        self.presenter.complete_render(outcome)
    }

    /// True once after the presenter asked for the editor.
    pub fn take_editor_request(&mut self) -> bool {
        std::mem::take(&mut self.editor_requested)
    }

    /// The theme picked since the last call, if it changed.
    pub fn take_theme_change(&mut self) -> Option<Theme> {
        self.theme_change.take()
    }

    /// End the session. Returns the messages still to be sent, ending with
    /// `leave_presentation` when connected. The pending edit is dropped and
    /// every viewport released.
    pub fn teardown(&mut self) -> Vec<ClientMessage> {
        if self.closed {
            return Vec::new();
        }
        self.closed = true;
        self.sync.leave();
        let flush = self.sync.drain_outbox();
        self.sync.on_disconnected();
        self.presenter.release_diagrams();
        self.renders.clear();
        debug!("Session for {} torn down", self.sync.file_id());
        flush
    }
}
