//! In-process room server.
//!
//! Keeps the authoritative copy of each document and fans messages out the
//! same way the real server does: `content_updated` goes to every member of
//! the room including the sender, `page_changed` to everyone but the sender,
//! and `sync_data` only to the client that asked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace};
use tokio::sync::mpsc;

use super::{Connector, Transport};
use crate::error::TransportError;
use crate::parser::{self, Slide};
use crate::protocol::{ClientMessage, FileId, ServerMessage, TransportEvent};

type PeerId = u64;

#[derive(Debug, Clone, PartialEq)]
struct StoredDocument {
    content: String,
    slides: Vec<Slide>,
}

struct Peer {
    tx: mpsc::UnboundedSender<ServerMessage>,
    room: Option<FileId>,
}

#[derive(Default)]
struct HubState {
    next_peer: PeerId,
    peers: HashMap<PeerId, Peer>,
    documents: HashMap<FileId, StoredDocument>,
}

impl HubState {
    fn deliver(&self, peer: PeerId, message: ServerMessage) {
        if let Some(p) = self.peers.get(&peer) {
            // A closed receiver only means the peer is going away
            let _ = p.tx.send(message);
        }
    }

    fn room_members(&self, room: &FileId) -> Vec<PeerId> {
        let mut members: Vec<PeerId> = self
            .peers
            .iter()
            .filter(|(_, p)| p.room.as_ref() == Some(room))
            .map(|(id, _)| *id)
            .collect();
        members.sort_unstable();
        members
    }

    fn handle(&mut self, from: PeerId, message: ClientMessage) {
        trace!("hub <- peer {from}: {}", message.event_name());
        match message {
            ClientMessage::JoinPresentation { file_id } => {
                if let Some(peer) = self.peers.get_mut(&from) {
                    peer.room = Some(file_id.clone());
                }
                self.deliver(from, ServerMessage::Joined { file_id });
            }
            ClientMessage::LeavePresentation { file_id } => {
                if let Some(peer) = self.peers.get_mut(&from) {
                    if peer.room.as_ref() == Some(&file_id) {
                        peer.room = None;
                    }
                }
            }
            ClientMessage::RequestSync { file_id } => {
                if let Some(doc) = self.documents.get(&file_id) {
                    let reply = ServerMessage::SyncData {
                        content: Some(doc.content.clone()),
                        slides: Some(doc.slides.clone()),
                    };
                    self.deliver(from, reply);
                }
            }
            ClientMessage::UpdateContent { file_id, content } => {
                let Some(doc) = self.documents.get_mut(&file_id) else {
                    debug!("hub: update for unknown document {file_id}");
                    return;
                };
                doc.slides = parser::segment(&content);
                doc.content = content;
                let update = ServerMessage::ContentUpdated {
                    slides: doc.slides.clone(),
                    content: Some(doc.content.clone()),
                };
                for member in self.room_members(&file_id) {
                    self.deliver(member, update.clone());
                }
            }
            ClientMessage::ChangePage { file_id, page } => {
                for member in self.room_members(&file_id) {
                    if member != from {
                        self.deliver(member, ServerMessage::PageChanged { page });
                    }
                }
            }
        }
    }
}

/// Shared handle to the in-memory server. Cloning shares the same rooms.
#[derive(Clone, Default)]
pub struct MemoryHub {
    state: Arc<Mutex<HubState>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a document, as an upload would.
    pub fn insert_document(&self, file_id: FileId, content: impl Into<String>) {
        let content = content.into();
        let slides = parser::segment(&content);
        self.lock()
            .documents
            .insert(file_id, StoredDocument { content, slides });
    }

    pub fn content(&self, file_id: &FileId) -> Option<String> {
        self.lock().documents.get(file_id).map(|d| d.content.clone())
    }

    pub fn slides(&self, file_id: &FileId) -> Option<Vec<Slide>> {
        self.lock().documents.get(file_id).map(|d| d.slides.clone())
    }

    pub fn peer_count(&self) -> usize {
        self.lock().peers.len()
    }

    /// Open a new client connection.
    pub fn open(&self) -> MemoryTransport {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let id = state.next_peer;
        state.next_peer += 1;
        state.peers.insert(id, Peer { tx, room: None });
        debug!("hub: peer {id} connected");
        MemoryTransport {
            id,
            hub: self.clone(),
            rx,
            closed: false,
        }
    }

    /// Drop every connection, as a server restart would.
    pub fn disconnect_all(&self) {
        self.lock().peers.clear();
    }

    fn remove_peer(&self, id: PeerId) {
        if self.lock().peers.remove(&id).is_some() {
            debug!("hub: peer {id} disconnected");
        }
    }
}

impl Connector for MemoryHub {
    type Transport = MemoryTransport;

    async fn connect(&mut self) -> Result<MemoryTransport, TransportError> {
        Ok(self.open())
    }
}

/// One client's end of a [`MemoryHub`] connection.
pub struct MemoryTransport {
    id: PeerId,
    hub: MemoryHub,
    rx: mpsc::UnboundedReceiver<ServerMessage>,
    closed: bool,
}

impl MemoryTransport {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Non-blocking receive, handy for tests that step the hub by hand.
    pub fn try_recv(&mut self) -> Option<ServerMessage> {
        self.rx.try_recv().ok()
    }
}

impl Transport for MemoryTransport {
    async fn send(&mut self, message: ClientMessage) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let mut state = self.hub.lock();
        if !state.peers.contains_key(&self.id) {
            return Err(TransportError::Closed);
        }
        state.handle(self.id, message);
        Ok(())
    }

    async fn recv(&mut self) -> TransportEvent {
        if self.closed {
            return TransportEvent::Disconnected;
        }
        match self.rx.recv().await {
            Some(message) => TransportEvent::Message(message),
            None => {
                self.closed = true;
                TransportEvent::Disconnected
            }
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        self.hub.remove_peer(self.id);
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.hub.remove_peer(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub_with_doc() -> (MemoryHub, FileId) {
        let hub = MemoryHub::new();
        let id = FileId::new("doc");
        hub.insert_document(id.clone(), "A\n\n---\n\nB");
        (hub, id)
    }

    #[tokio::test]
    async fn test_join_and_sync() {
        let (hub, id) = hub_with_doc();
        let mut client = hub.open();
        client
            .send(ClientMessage::JoinPresentation {
                file_id: id.clone(),
            })
            .await
            .unwrap();
        client
            .send(ClientMessage::RequestSync {
                file_id: id.clone(),
            })
            .await
            .unwrap();

        assert_eq!(
            client.try_recv(),
            Some(ServerMessage::Joined {
                file_id: id.clone()
            })
        );
        let Some(ServerMessage::SyncData { content, slides }) = client.try_recv() else {
            panic!("expected sync_data");
        };
        assert_eq!(content.as_deref(), Some("A\n\n---\n\nB"));
        assert_eq!(slides.map(|s| s.len()), Some(2));
    }

    #[tokio::test]
    async fn test_content_updated_includes_sender() {
        let (hub, id) = hub_with_doc();
        let mut a = hub.open();
        let mut b = hub.open();
        for t in [&mut a, &mut b] {
            t.send(ClientMessage::JoinPresentation {
                file_id: id.clone(),
            })
            .await
            .unwrap();
            t.try_recv();
        }

        a.send(ClientMessage::UpdateContent {
            file_id: id.clone(),
            content: "X\n\n---\n\nY\n\n---\n\nZ".to_string(),
        })
        .await
        .unwrap();

        for t in [&mut a, &mut b] {
            let Some(ServerMessage::ContentUpdated { slides, .. }) = t.try_recv() else {
                panic!("expected content_updated for peer {}", t.id());
            };
            assert_eq!(slides.len(), 3);
        }
        assert_eq!(hub.slides(&id).map(|s| s.len()), Some(3));
    }

    #[tokio::test]
    async fn test_page_changed_excludes_sender() {
        let (hub, id) = hub_with_doc();
        let mut a = hub.open();
        let mut b = hub.open();
        let mut outsider = hub.open();
        for t in [&mut a, &mut b] {
            t.send(ClientMessage::JoinPresentation {
                file_id: id.clone(),
            })
            .await
            .unwrap();
            t.try_recv();
        }

        a.send(ClientMessage::ChangePage {
            file_id: id.clone(),
            page: 1,
        })
        .await
        .unwrap();

        assert_eq!(a.try_recv(), None);
        assert_eq!(b.try_recv(), Some(ServerMessage::PageChanged { page: 1 }));
        assert_eq!(outsider.try_recv(), None);
    }

    #[tokio::test]
    async fn test_disconnect_all_closes_transports() {
        let (hub, _) = hub_with_doc();
        let mut client = hub.open();
        assert_eq!(hub.peer_count(), 1);
        hub.disconnect_all();
        assert_eq!(client.recv().await, TransportEvent::Disconnected);
        assert!(client.send(ClientMessage::RequestSync { file_id: "doc".into() }).await.is_err());
    }

    #[test]
    fn test_drop_removes_peer() {
        let hub = MemoryHub::new();
        let client = hub.open();
        assert_eq!(hub.peer_count(), 1);
        drop(client);
        assert_eq!(hub.peer_count(), 0);
    }
}
