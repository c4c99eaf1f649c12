use crate::core::{ChatReply, IndexOutcome};
use crate::error::SessionError;
use crate::extract::ExtractedPage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub text: String,
    pub is_typing: bool,
}

/// What the UI renders; republished after every state change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub messages: Vec<Message>,
    pub busy: bool,
    pub ready: bool,
    pub analyzing: bool,
    pub page_id: Option<String>,
}

impl SessionView {
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
    }
}

/// Commands accepted by the session actor.
#[derive(Debug)]
pub enum SessionMessage {
    AnalyzePage {
        page: ExtractedPage,
        response: oneshot::Sender<Result<IndexOutcome, SessionError>>,
    },
    SubmitQuestion {
        question: String,
        response: oneshot::Sender<bool>,
    },
    Reset {
        response: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Session epoch and page in effect when a request was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub epoch: u64,
    pub page_id: String,
}

/// Results of work running outside the actor task.
#[derive(Debug)]
pub enum Completion {
    Index {
        ticket: Ticket,
        result: Result<Value, SessionError>,
    },
    Chat {
        ticket: Ticket,
        placeholder_id: u64,
        question: String,
        result: Result<ChatReply, SessionError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEvent {
    Progress { message_id: u64, visible: String },
    Finished { message_id: u64, text: String },
}

impl RevealEvent {
    pub fn message_id(&self) -> u64 {
        match self {
            RevealEvent::Progress { message_id, .. } => *message_id,
            RevealEvent::Finished { message_id, .. } => *message_id,
        }
    }
}
