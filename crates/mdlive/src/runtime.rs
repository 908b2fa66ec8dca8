//! Event loop that drives a [`Session`] over a live connection.
//!
//! Everything runs on one thread. Each turn races four sources: the
//! transport, local commands, the sync client's next deadline and pending
//! diagram renders. Whatever wins is applied to the session, then the
//! session's outbox is flushed before the next turn.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::diagram::{DiagramRenderer, RenderOutcome, Theme, run_request};
use crate::editor::EditorAction;
use crate::presenter::PresenterInput;
use crate::protocol::TransportEvent;
use crate::session::Session;
use crate::sync::SyncEvent;
use crate::transport::{Connector, Transport};
use crate::viewport::Modifiers;

/// A local action fed into the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the editor buffer, as typing would.
    Edit(String),
    EditorKey { key: String, mods: Modifiers },
    Presenter(PresenterInput),
    SaveNow,
    /// Leave the room and stop the loop.
    Quit,
}

/// What happened, for whoever is watching the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeUpdate {
    Connected,
    Disconnected,
    Sync(SyncEvent),
    Editor(EditorAction),
    RenderFinished { slide: usize, ok: bool },
    ThemeChanged(Theme),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// First reconnect delay; doubles per failed attempt.
    pub reconnect: Duration,
    pub max_reconnect: Duration,
    /// Give up after this many consecutive failed connects.
    pub max_attempts: Option<u32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            reconnect: Duration::from_millis(1000),
            max_reconnect: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

/// Outcome of one `select!` turn.
enum Wake {
    Transport(TransportEvent),
    Command(Option<Command>),
    Deadline,
    Rendered(RenderOutcome),
}

pub struct Runtime<C, R> {
    connector: C,
    renderer: R,
    config: RuntimeConfig,
    updates: Option<mpsc::UnboundedSender<RuntimeUpdate>>,
}

impl<C: Connector, R: DiagramRenderer> Runtime<C, R> {
    pub fn new(connector: C, renderer: R, config: RuntimeConfig) -> Self {
        Self {
            connector,
            renderer,
            config,
            updates: None,
        }
    }

    pub fn with_updates(mut self, updates: mpsc::UnboundedSender<RuntimeUpdate>) -> Self {
        self.updates = Some(updates);
        self
    }

    fn notify(&self, update: RuntimeUpdate) {
        if let Some(tx) = &self.updates {
            // Nobody listening is fine
            let _ = tx.send(update);
        }
    }

    /// Run until [`Command::Quit`] arrives or the command channel closes.
    /// Returns the torn-down session.
    pub async fn run(
        mut self,
        mut session: Session,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) -> Result<Session> {
        let mut failures = 0u32;
        loop {
            session.connecting();
            let transport = match self.connector.connect().await {
                Ok(transport) => transport,
                Err(e) => {
                    failures += 1;
                    if self.config.max_attempts.is_some_and(|max| failures >= max) {
                        bail!("Giving up after {failures} failed connection attempts: {e}");
                    }
                    let delay = self.backoff(failures);
                    warn!("Connection failed ({e}), retrying in {delay:?}");
                    session.disconnected();
                    self.notify(RuntimeUpdate::Disconnected);
                    if !self.wait_offline(&mut session, &mut commands, delay).await {
                        session.teardown();
                        return Ok(session);
                    }
                    continue;
                }
            };
            failures = 0;
            session.connected();
            self.notify(RuntimeUpdate::Connected);

            if self.serve(&mut session, transport, &mut commands).await? {
                return Ok(session);
            }
            session.disconnected();
            self.notify(RuntimeUpdate::Disconnected);
            let delay = self.backoff(1);
            if !self.wait_offline(&mut session, &mut commands, delay).await {
                session.teardown();
                return Ok(session);
            }
        }
    }

    fn backoff(&self, failures: u32) -> Duration {
        let factor = 1u32 << failures.saturating_sub(1).min(16);
        self.config
            .reconnect
            .saturating_mul(factor)
            .min(self.config.max_reconnect)
    }

    /// Sleep out a reconnect delay while still taking commands. Returns
    /// false when the loop should stop.
    async fn wait_offline(
        &self,
        session: &mut Session,
        commands: &mut mpsc::UnboundedReceiver<Command>,
        delay: Duration,
    ) -> bool {
        let wake = tokio::time::Instant::now() + delay;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(wake) => return true,
                command = commands.recv() => match command {
                    None | Some(Command::Quit) => return false,
                    Some(command) => self.apply(session, command),
                },
            }
        }
    }

    /// Serve one connection. Returns `Ok(true)` when the session ended on
    /// request, `Ok(false)` when the connection dropped.
    async fn serve<T: Transport>(
        &self,
        session: &mut Session,
        mut transport: T,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> Result<bool> {
        let mut renders: FuturesUnordered<LocalBoxFuture<'_, RenderOutcome>> =
            FuturesUnordered::new();
        loop {
            for message in session.take_outbox() {
                if let Err(e) = transport.send(message).await {
                    warn!("Send failed: {e}");
                    return Ok(false);
                }
            }
            for request in session.take_render_requests() {
                debug!("Rendering diagram for slide {}", request.slide);
                renders.push(run_request(&self.renderer, request).boxed_local());
            }

            let deadline = session
                .next_deadline()
                .map(tokio::time::Instant::from_std)
                .unwrap_or_else(|| tokio::time::Instant::now() + Duration::from_secs(3600));
            let has_deadline = session.next_deadline().is_some();

            let wake = tokio::select! {
                event = transport.recv() => Wake::Transport(event),
                command = commands.recv() => Wake::Command(command),
                _ = tokio::time::sleep_until(deadline), if has_deadline => Wake::Deadline,
                Some(outcome) = renders.next(), if !renders.is_empty() => Wake::Rendered(outcome),
            };

            match wake {
                Wake::Transport(TransportEvent::Message(message)) => {
                    for event in session.dispatch(message) {
                        self.notify(RuntimeUpdate::Sync(event));
                    }
                }
                Wake::Transport(TransportEvent::Disconnected) => {
                    info!("Connection to server lost");
                    return Ok(false);
                }
                Wake::Command(None | Some(Command::Quit)) => {
                    let flush = session.teardown();
                    for message in flush {
                        transport
                            .send(message)
                            .await
                            .context("Failed to leave the presentation")?;
                    }
                    transport.close().await;
                    return Ok(true);
                }
                Wake::Command(Some(command)) => self.apply(session, command),
                Wake::Deadline => {
                    session.poll(Instant::now());
                }
                Wake::Rendered(outcome) => {
                    let slide = outcome.slide;
                    let ok = outcome.result.is_ok();
                    if session.complete_render(outcome) {
                        self.notify(RuntimeUpdate::RenderFinished { slide, ok });
                    }
                }
            }
        }
    }

    fn apply(&self, session: &mut Session, command: Command) {
        let now = Instant::now();
        match command {
            Command::Edit(text) => session.edit(text, now),
            Command::EditorKey { key, mods } => {
                if let Some(action) = session.editor_key(&key, mods, now) {
                    self.notify(RuntimeUpdate::Editor(action));
                }
            }
            Command::Presenter(input) => {
                if let Err(e) = session.presenter_input(input) {
                    warn!("{e}");
                }
                if let Some(theme) = session.take_theme_change() {
                    self.notify(RuntimeUpdate::ThemeChanged(theme));
                }
            }
            Command::SaveNow => {
                session.with_editor(|_, sync| sync.save_now(now));
            }
            Command::Quit => {}
        }
    }
}

/// Run a future to completion on a fresh single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
