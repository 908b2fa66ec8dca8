//! Client side of the document synchronization protocol.
//!
//! [`SyncClient`] is a plain state machine: it never touches a socket or a
//! clock. Callers hand it the current [`Instant`], feed it inbound
//! [`ServerMessage`]s, and drain outbound [`ClientMessage`]s from its outbox.
//! The runtime wakes it again at [`SyncClient::next_deadline`].

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, info, trace};

use crate::parser::{self, Slide, SlideDeck};
use crate::protocol::{ClientMessage, FileId, ServerMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period after the last keystroke before content is sent.
    pub debounce: Duration,
    /// Minimum spacing between two content sends.
    pub in_flight: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            in_flight: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    /// Connected and joined, nothing sent yet.
    Joined,
    /// Local edits waiting for the debounce to expire.
    Editing,
    Idle,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Joined | Self::Editing | Self::Idle)
    }
}

/// What the save indicator shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Editing,
    Saving,
    Disconnected,
}

impl SaveStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Saved => "Saved",
            Self::Editing => "Editing...",
            Self::Saving => "Saving...",
            Self::Disconnected => "Disconnected",
        }
    }
}

/// Effects of an inbound message that the controllers must apply.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Joined(FileId),
    /// The server's content won; the editor buffer must be replaced.
    ContentReplaced(String),
    DeckReplaced(SlideDeck),
    PageChanged(usize),
}

/// Local copy of the document text plus whether it holds unsent edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentCache {
    content: String,
    dirty: bool,
}

impl DocumentCache {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            dirty: false,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn edit(&mut self, content: String) {
        self.content = content;
        self.dirty = true;
    }

    fn replace(&mut self, content: String) {
        self.content = content;
        self.dirty = false;
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

pub struct SyncClient {
    file_id: FileId,
    config: SyncConfig,
    state: ConnectionState,
    status: SaveStatus,
    cache: DocumentCache,
    server_content: Option<String>,
    deck: Option<SlideDeck>,
    /// Debounce deadline of the pending edit, if any.
    pending: Option<Instant>,
    in_flight_until: Option<Instant>,
    outbox: VecDeque<ClientMessage>,
}

impl SyncClient {
    pub fn new(file_id: FileId, config: SyncConfig) -> Self {
        Self {
            file_id,
            config,
            state: ConnectionState::Disconnected,
            status: SaveStatus::Disconnected,
            cache: DocumentCache::default(),
            server_content: None,
            deck: None,
            pending: None,
            in_flight_until: None,
            outbox: VecDeque::new(),
        }
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn content(&self) -> &str {
        self.cache.content()
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Last content the server confirmed, if any arrived.
    pub fn server_content(&self) -> Option<&str> {
        self.server_content.as_deref()
    }

    pub fn has_pending_edit(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deck(&self) -> Option<&SlideDeck> {
        self.deck.as_ref()
    }

    pub fn begin_connect(&mut self) {
        info!("Connecting ({})", self.file_id);
        self.state = ConnectionState::Connecting;
    }

    /// The transport is up: join the room and ask for a full snapshot.
    pub fn on_connected(&mut self) {
        info!("Connected, joining {}", self.file_id);
        self.state = ConnectionState::Joined;
        self.status = SaveStatus::Saved;
        self.pending = None;
        self.in_flight_until = None;
        self.outbox.clear();
        self.outbox.push_back(ClientMessage::JoinPresentation {
            file_id: self.file_id.clone(),
        });
        self.outbox.push_back(ClientMessage::RequestSync {
            file_id: self.file_id.clone(),
        });
    }

    /// Drops everything not yet sent. Reconnecting starts over with a full
    /// join and snapshot.
    pub fn on_disconnected(&mut self) {
        if self.state != ConnectionState::Disconnected {
            info!("Disconnected from {}", self.file_id);
        }
        self.state = ConnectionState::Disconnected;
        self.status = SaveStatus::Disconnected;
        if self.pending.take().is_some() {
            debug!("Dropping pending edit on disconnect");
        }
        self.cache.mark_clean();
        self.in_flight_until = None;
        self.outbox.clear();
    }

    /// Record a local edit and (re)arm the debounce timer.
    pub fn local_edit(&mut self, content: impl Into<String>, now: Instant) {
        self.cache.edit(content.into());
        self.pending = Some(now + self.config.debounce);
        if self.is_connected() {
            self.state = ConnectionState::Editing;
            self.status = SaveStatus::Editing;
        }
        trace!("Edit, send due in {:?}", self.config.debounce);
    }

    /// Send the pending edit if its deadline has passed. Returns whether an
    /// `update_content` was queued.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.is_connected() {
            return false;
        }
        let Some(due) = self.pending else {
            return false;
        };
        if due > now {
            return false;
        }
        if let Some(until) = self.in_flight_until {
            if until > now {
                // Deferred, not dropped: next_deadline points at the window close
                debug!("Send suppressed, previous update still in flight");
                return false;
            }
        }
        self.send_content(now);
        true
    }

    /// Explicit save: bypass the debounce. The in-flight window still applies.
    pub fn save_now(&mut self, now: Instant) -> bool {
        if !self.is_connected() {
            return false;
        }
        if self.pending.is_none() && !self.cache.is_dirty() {
            return false;
        }
        self.pending = Some(now);
        self.poll(now)
    }

    fn send_content(&mut self, now: Instant) {
        debug!(
            "Sending update_content ({} bytes)",
            self.cache.content().len()
        );
        self.outbox.push_back(ClientMessage::UpdateContent {
            file_id: self.file_id.clone(),
            content: self.cache.content().to_string(),
        });
        self.cache.mark_clean();
        self.pending = None;
        self.in_flight_until = Some(now + self.config.in_flight);
        self.status = SaveStatus::Saving;
        self.state = ConnectionState::Idle;
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.is_connected() {
            return None;
        }
        let due = self.pending?;
        Some(match self.in_flight_until {
            Some(until) if until > due => until,
            _ => due,
        })
    }

    /// Queue a position broadcast. Returns false while disconnected.
    pub fn broadcast_page(&mut self, page: usize) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.outbox.push_back(ClientMessage::ChangePage {
            file_id: self.file_id.clone(),
            page,
        });
        true
    }

    pub fn leave(&mut self) {
        if self.is_connected() {
            self.outbox.push_back(ClientMessage::LeavePresentation {
                file_id: self.file_id.clone(),
            });
        }
    }

    pub fn drain_outbox(&mut self) -> Vec<ClientMessage> {
        self.outbox.drain(..).collect()
    }

    /// Apply one inbound message. Messages must be fed in arrival order.
    pub fn handle(&mut self, message: ServerMessage) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        match message {
            ServerMessage::Joined { file_id } => {
                info!("Joined {file_id}");
                events.push(SyncEvent::Joined(file_id));
            }
            ServerMessage::SyncData { content, slides } => {
                // An empty snapshot never clears the local buffer
                if let Some(content) = content.filter(|c| !c.is_empty()) {
                    if content != self.cache.content() {
                        if self.pending.take().is_some() {
                            debug!("Server snapshot wins over pending edit");
                        }
                        self.cache.replace(content.clone());
                        events.push(SyncEvent::ContentReplaced(content.clone()));
                    }
                    self.server_content = Some(content);
                }
                if let Some(slides) = slides {
                    events.push(SyncEvent::DeckReplaced(self.replace_deck(slides)));
                }
                if self.pending.is_none() && self.is_connected() {
                    self.status = SaveStatus::Saved;
                }
            }
            ServerMessage::ContentUpdated { slides, content } => {
                if content.is_some() {
                    self.server_content = content;
                }
                events.push(SyncEvent::DeckReplaced(self.replace_deck(slides)));
                if self.pending.is_none() && self.is_connected() {
                    self.status = SaveStatus::Saved;
                }
            }
            ServerMessage::PageChanged { page } => {
                events.push(SyncEvent::PageChanged(page));
            }
        }
        events
    }

    fn replace_deck(&mut self, slides: Vec<Slide>) -> SlideDeck {
        let deck = SlideDeck::new(slides);
        debug!("Deck replaced ({} slides)", deck.len());
        self.deck = Some(deck.clone());
        deck
    }

    /// The server's deck, or a local segmentation of the cached content when
    /// no deck has arrived yet.
    pub fn preview_slides(&self) -> SlideDeck {
        match &self.deck {
            Some(deck) => deck.clone(),
            None => parser::segment_deck(self.cache.content()),
        }
    }
}
