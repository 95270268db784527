//! State of the one live conversation with the backend.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Open,
    Closed,
    Failed,
}

impl LinkState {
    pub fn label(self) -> &'static str {
        match self {
            LinkState::Connecting => "connecting",
            LinkState::Open => "online",
            LinkState::Closed => "disconnected",
            LinkState::Failed => "offline",
        }
    }
}

/// Whether an assistant reply is currently being revealed.
///
/// While `Receiving`, incoming frames extend the last assistant message
/// instead of starting a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyState {
    #[default]
    Idle,
    Receiving,
}

#[derive(Debug)]
pub struct Session {
    pub generation: u64,
    pub conversation_id: Option<String>,
    pub link: LinkState,
    pub reply: ReplyState,
    outbound: Option<mpsc::UnboundedSender<String>>,
    cancel_token: CancellationToken,
}

impl Session {
    pub fn connecting(generation: u64, cancel_token: CancellationToken) -> Self {
        Self {
            generation,
            conversation_id: None,
            link: LinkState::Connecting,
            reply: ReplyState::Idle,
            outbound: None,
            cancel_token,
        }
    }

    pub fn mark_open(&mut self, conversation_id: String, outbound: mpsc::UnboundedSender<String>) {
        self.conversation_id = Some(conversation_id);
        self.outbound = Some(outbound);
        self.link = LinkState::Open;
    }

    pub fn mark_closed(&mut self) {
        self.outbound = None;
        self.reply = ReplyState::Idle;
        self.link = LinkState::Closed;
    }

    pub fn mark_failed(&mut self) {
        self.outbound = None;
        self.reply = ReplyState::Idle;
        self.link = LinkState::Failed;
    }

    pub fn is_open(&self) -> bool {
        self.link == LinkState::Open && self.outbound.is_some()
    }

    /// A session that is connecting or open; opening the panel again reuses it.
    pub fn is_live(&self) -> bool {
        matches!(self.link, LinkState::Connecting | LinkState::Open)
    }

    pub fn is_receiving(&self) -> bool {
        self.reply == ReplyState::Receiving
    }

    /// Queue one outgoing frame. Returns false if the stream is not open.
    pub fn send(&mut self, text: &str) -> bool {
        if self.link != LinkState::Open {
            return false;
        }
        let Some(outbound) = self.outbound.as_ref() else {
            return false;
        };
        if outbound.send(text.to_string()).is_err() {
            debug!(generation = self.generation, "socket task gone; marking closed");
            self.mark_closed();
            return false;
        }
        true
    }

    /// Tear down the socket task. Further events for this generation are stale.
    pub fn cancel(&mut self) {
        self.cancel_token.cancel();
        self.outbound = None;
        self.reply = ReplyState::Idle;
    }
}
