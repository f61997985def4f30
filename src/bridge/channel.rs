//! Message channel between contexts
//!
//! Fire-and-forget and in order per direction. A send only enqueues the
//! envelope; the receiving context picks it up on its next pump.

use super::protocol::{self, AgentMessage, HostMessage};
use crate::utils::Result;
use crate::utils::error::BridgeError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::mpsc::error::TryRecvError;

/// Sending half of a channel carrying `M`
pub struct Outbox<M> {
    sender: UnboundedSender<String>,
    _message: PhantomData<fn(M)>,
}

impl<M> Clone for Outbox<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            _message: PhantomData,
        }
    }
}

impl<M: Serialize> Outbox<M> {
    /// Encode and enqueue a message
    pub fn post(&self, message: &M) -> Result<()> {
        self.post_raw(protocol::encode(message)?)
    }
}

impl<M> Outbox<M> {
    /// Enqueue an already encoded envelope
    pub fn post_raw(&self, envelope: String) -> Result<()> {
        self.sender
            .send(envelope)
            .map_err(|_| BridgeError::Closed.into())
    }

    /// Whether the receiving side is gone
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Receiving half of a channel carrying `M`
pub struct Inbox<M> {
    receiver: UnboundedReceiver<String>,
    _message: PhantomData<fn() -> M>,
}

impl<M: DeserializeOwned> Inbox<M> {
    /// Next envelope, decoded. `None` when nothing is queued.
    pub fn try_next(&mut self) -> Option<Result<M>> {
        match self.receiver.try_recv() {
            Ok(envelope) => Some(protocol::decode(&envelope)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Everything currently queued, in arrival order
    pub fn drain(&mut self) -> Vec<Result<M>> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

/// Create a channel carrying `M`
pub fn channel<M>() -> (Outbox<M>, Inbox<M>) {
    let (sender, receiver) = unbounded_channel();
    (
        Outbox {
            sender,
            _message: PhantomData,
        },
        Inbox {
            receiver,
            _message: PhantomData,
        },
    )
}

/// What an agent is handed when it is injected into a frame
pub struct AgentLink {
    /// Commands from the Host
    pub inbox: Inbox<HostMessage>,
    /// Replies and events to the Host
    pub outbox: Outbox<AgentMessage>,
}
