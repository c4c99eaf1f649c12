//! Session Actor - Conversation Orchestrator
//!
//! Information Hiding:
//! - Caches, message log, busy and readiness flags owned by a single task
//! - Network round trips and reveals run as spawned tasks that report back
//!   through internal channels, so every state change happens on the actor
//! - Results tagged with an outdated session epoch are dropped

use crate::actors::messages::*;
use crate::actors::presenter::{Presenter, RevealHandle};
use crate::config::Settings;
use crate::core::{HttpTransport, IndexOutcome, IndexingClient, QueryClient, Transport};
use crate::error::SessionError;
use crate::extract::{ExtractedPage, PageExtractor};
use crate::storage::FingerprintCache;
use std::sync::Arc;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tokio::sync::{oneshot, watch};

/// Shown in the assistant placeholder until the first word is revealed.
pub const PLACEHOLDER_GLYPH: &str = "●";
/// Replaces the placeholder when a turn fails.
pub const FAILURE_TEXT: &str = "NEURAL_LINK_ERROR: Unable to process request.";

#[derive(Clone)]
pub struct SessionHandle {
    sender: Sender<SessionMessage>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&settings)?;
        Ok(Self::with_transport(settings, Arc::new(transport)))
    }

    pub fn with_transport(settings: Settings, transport: Arc<dyn Transport>) -> Self {
        let buffer_size = settings.system.channel_buffer_size.max(1);
        let (sender, receiver) = channel(buffer_size);
        let (completion_tx, completion_rx) = channel(buffer_size);
        let (reveal_tx, reveal_rx) = channel(buffer_size);
        let (view_tx, view_rx) = watch::channel(SessionView::default());

        let actor = SessionActor {
            indexing: IndexingClient::new(transport.clone()),
            query: QueryClient::new(transport),
            presenter: Presenter::new(settings.reveal_tick()),
            cache: FingerprintCache::new(),
            messages: Vec::new(),
            next_id: 1,
            epoch: 0,
            busy: false,
            ready: false,
            page_id: None,
            pending_analysis: None,
            active_reveal: None,
            completion_tx,
            reveal_tx,
            view_tx,
        };
        tokio::spawn(session_actor(receiver, completion_rx, reveal_rx, actor));

        Self {
            sender,
            view: view_rx,
        }
    }

    async fn send_message(&self, message: SessionMessage) -> Result<(), SessionError> {
        self.sender
            .send(message)
            .await
            .map_err(|e| SessionError::ActorUnavailable(e.to_string()))
    }

    /// Index the page and, on success, make it the page questions are asked about.
    pub async fn analyze_page(&self, page: ExtractedPage) -> Result<IndexOutcome, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send_message(SessionMessage::AnalyzePage { page, response: tx })
            .await?;
        rx.await
            .map_err(|e| SessionError::ActorUnavailable(e.to_string()))?
    }

    pub async fn analyze_with(&self, extractor: &dyn PageExtractor) -> anyhow::Result<IndexOutcome> {
        let page = extractor.extract().await?;
        Ok(self.analyze_page(page).await?)
    }

    /// Returns `false` when the question was ignored (not ready, blank, or a turn in flight).
    pub async fn submit_question(&self, question: impl Into<String>) -> Result<bool, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send_message(SessionMessage::SubmitQuestion {
            question: question.into(),
            response: tx,
        })
        .await?;
        rx.await
            .map_err(|e| SessionError::ActorUnavailable(e.to_string()))
    }

    pub async fn reset(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send_message(SessionMessage::Reset { response: tx }).await?;
        rx.await
            .map_err(|e| SessionError::ActorUnavailable(e.to_string()))
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Resolves once no chat turn is in flight.
    pub async fn wait_idle(&self) -> Result<SessionView, SessionError> {
        let mut view = self.view.clone();
        let idle = view
            .wait_for(|v| !v.busy)
            .await
            .map_err(|e| SessionError::ActorUnavailable(e.to_string()))?;
        Ok(idle.clone())
    }

    /// Text for the copy-to-clipboard action.
    pub fn message_text(&self, id: u64) -> Option<String> {
        self.view
            .borrow()
            .messages
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.text.clone())
    }

    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.send_message(SessionMessage::Shutdown).await
    }
}

struct PendingAnalysis {
    ticket: Ticket,
    response: oneshot::Sender<Result<IndexOutcome, SessionError>>,
}

struct SessionActor {
    indexing: IndexingClient,
    query: QueryClient,
    presenter: Presenter,
    cache: FingerprintCache,
    messages: Vec<Message>,
    next_id: u64,
    epoch: u64,
    busy: bool,
    ready: bool,
    page_id: Option<String>,
    pending_analysis: Option<PendingAnalysis>,
    active_reveal: Option<RevealHandle>,
    completion_tx: Sender<Completion>,
    reveal_tx: Sender<RevealEvent>,
    view_tx: watch::Sender<SessionView>,
}

async fn session_actor(
    mut receiver: Receiver<SessionMessage>,
    mut completions: Receiver<Completion>,
    mut reveals: Receiver<RevealEvent>,
    mut actor: SessionActor,
) {
    tracing::info!("[SessionActor] Session actor started");

    loop {
        tokio::select! {
            message = receiver.recv() => match message {
                Some(SessionMessage::Shutdown) => {
                    tracing::info!("[SessionActor] Received shutdown signal");
                    break;
                }
                Some(message) => actor.handle_message(message),
                None => {
                    tracing::info!("[SessionActor] Channel closed, shutting down");
                    break;
                }
            },
            Some(completion) = completions.recv() => actor.handle_completion(completion),
            Some(event) = reveals.recv() => actor.handle_reveal(event),
        }
    }

    actor.cancel_reveal();
}

impl SessionActor {
    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::AnalyzePage { page, response } => self.start_analysis(page, response),
            SessionMessage::SubmitQuestion { question, response } => {
                let accepted = self.start_turn(question);
                let _ = response.send(accepted);
            }
            SessionMessage::Reset { response } => {
                self.reset();
                let _ = response.send(());
            }
            SessionMessage::Shutdown => {}
        }
    }

    fn start_analysis(
        &mut self,
        page: ExtractedPage,
        response: oneshot::Sender<Result<IndexOutcome, SessionError>>,
    ) {
        if self.pending_analysis.is_some() {
            let _ = response.send(Err(SessionError::AnalysisInProgress));
            return;
        }
        if page.is_empty() {
            tracing::warn!("[SessionActor] Ignoring extraction without url or text");
            let _ = response.send(Err(SessionError::EmptyPage));
            return;
        }

        if let Some(outcome) = IndexingClient::lookup(&self.cache, &page.url) {
            self.activate_page(&page.url);
            let _ = response.send(Ok(outcome));
            return;
        }

        let ticket = Ticket {
            epoch: self.epoch,
            page_id: page.url.clone(),
        };
        self.pending_analysis = Some(PendingAnalysis {
            ticket: ticket.clone(),
            response,
        });
        // questions wait until the page being analyzed is indexed
        if self.page_id.as_deref() != Some(page.url.as_str()) {
            self.ready = false;
        }
        self.publish();

        let client = self.indexing.clone();
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = client.submit(&page.url, &page.text).await;
            let _ = completion_tx.send(Completion::Index { ticket, result }).await;
        });
    }

    fn start_turn(&mut self, question: String) -> bool {
        let page_id = match (&self.page_id, self.ready) {
            (Some(page_id), true) => page_id.clone(),
            _ => {
                tracing::debug!("[SessionActor] Question ignored: no indexed page");
                return false;
            }
        };
        if question.trim().is_empty() || self.busy {
            tracing::debug!("[SessionActor] Question ignored: blank or turn in flight");
            return false;
        }

        self.push_message(Role::User, question.clone(), false);
        let placeholder_id = self.push_message(Role::Assistant, PLACEHOLDER_GLYPH.to_string(), true);
        self.busy = true;
        self.publish();

        if let Some(cached) = QueryClient::lookup(&self.cache, &page_id, &question) {
            self.start_reveal(cached, placeholder_id);
            return true;
        }

        let ticket = Ticket {
            epoch: self.epoch,
            page_id: page_id.clone(),
        };
        let client = self.query.clone();
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = client.fetch(&page_id, &question).await;
            let _ = completion_tx
                .send(Completion::Chat {
                    ticket,
                    placeholder_id,
                    question,
                    result,
                })
                .await;
        });

        true
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Index { ticket, result } => self.finish_analysis(ticket, result),
            Completion::Chat {
                ticket,
                placeholder_id,
                question,
                result,
            } => self.finish_turn(ticket, placeholder_id, question, result),
        }
    }

    fn finish_analysis(&mut self, ticket: Ticket, result: Result<serde_json::Value, SessionError>) {
        let pending = match self.pending_analysis.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                self.pending_analysis = other;
                tracing::debug!(
                    "[SessionActor] Discarding stale index result for '{}'",
                    ticket.page_id
                );
                return;
            }
        };

        let outcome = result.map(|ack| {
            IndexingClient::record(&mut self.cache, &ticket.page_id);
            tracing::info!("[SessionActor] Indexed '{}'", ticket.page_id);
            IndexOutcome::Indexed(ack)
        });

        match &outcome {
            Ok(_) => self.activate_page(&ticket.page_id),
            Err(e) => {
                tracing::warn!("[SessionActor] Analysis of '{}' failed: {}", ticket.page_id, e);
                self.ready = self
                    .page_id
                    .as_deref()
                    .map(|p| self.cache.has_indexed(p))
                    .unwrap_or(false);
                self.publish();
            }
        }
        let _ = pending.response.send(outcome);
    }

    fn finish_turn(
        &mut self,
        ticket: Ticket,
        placeholder_id: u64,
        question: String,
        result: Result<crate::core::ChatReply, SessionError>,
    ) {
        if !self.is_current(&ticket) {
            tracing::debug!(
                "[SessionActor] Discarding stale chat result for message {}",
                placeholder_id
            );
            return;
        }

        match result {
            Ok(reply) => {
                QueryClient::record(&mut self.cache, &ticket.page_id, &question, &reply);
                self.start_reveal(reply.into_text(), placeholder_id);
            }
            Err(e) => {
                tracing::error!("[SessionActor] Chat error: {}", e);
                if let Some(message) = self.find_message(placeholder_id) {
                    message.text = FAILURE_TEXT.to_string();
                    message.is_typing = false;
                }
                self.busy = false;
                self.publish();
            }
        }
    }

    /// The placeholder keeps its glyph and typing flag until the first word lands.
    fn start_reveal(&mut self, text: String, placeholder_id: u64) {
        self.cancel_reveal();
        let handle = self
            .presenter
            .reveal(&text, placeholder_id, self.reveal_tx.clone());
        self.active_reveal = Some(handle);
    }

    fn handle_reveal(&mut self, event: RevealEvent) {
        let is_active = self
            .active_reveal
            .as_ref()
            .map(|h| h.message_id() == event.message_id())
            .unwrap_or(false);
        if !is_active {
            tracing::debug!(
                "[SessionActor] Dropping reveal event for inactive message {}",
                event.message_id()
            );
            return;
        }

        match event {
            RevealEvent::Progress { message_id, visible } => {
                if let Some(message) = self.find_message(message_id) {
                    message.text = visible;
                    message.is_typing = false;
                }
            }
            RevealEvent::Finished { message_id, text } => {
                if let Some(message) = self.find_message(message_id) {
                    message.text = text;
                    message.is_typing = false;
                }
                self.active_reveal = None;
                self.busy = false;
            }
        }
        self.publish();
    }

    /// Switching to another page starts a fresh conversation; caches survive.
    fn activate_page(&mut self, page_id: &str) {
        if self.page_id.as_deref() != Some(page_id) {
            if self.page_id.is_some() {
                tracing::info!("[SessionActor] Switching conversation to '{}'", page_id);
                self.epoch += 1;
                self.cancel_reveal();
                self.messages.clear();
                self.busy = false;
            }
            self.page_id = Some(page_id.to_string());
        }
        self.ready = true;
        self.publish();
    }

    fn reset(&mut self) {
        tracing::info!("[SessionActor] SESSION_WIPED");
        self.epoch += 1;
        self.cancel_reveal();
        self.cache.reset();
        self.messages.clear();
        self.busy = false;
        self.ready = false;
        self.page_id = None;
        if let Some(pending) = self.pending_analysis.take() {
            let _ = pending.response.send(Err(SessionError::SessionReset));
        }
        self.publish();
    }

    fn cancel_reveal(&mut self) {
        if let Some(handle) = self.active_reveal.take() {
            handle.cancel();
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.epoch == self.epoch && self.page_id.as_deref() == Some(ticket.page_id.as_str())
    }

    fn push_message(&mut self, role: Role, text: String, is_typing: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role,
            text,
            is_typing,
        });
        id
    }

    fn find_message(&mut self, id: u64) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    fn publish(&self) {
        self.view_tx.send_replace(SessionView {
            messages: self.messages.clone(),
            busy: self.busy,
            ready: self.ready,
            analyzing: self.pending_analysis.is_some(),
            page_id: self.page_id.clone(),
        });
    }
}
