//! Host ↔ Agent message bridge
//!
//! The two contexts never share memory; everything crosses as a typed
//! message over a [`channel`].

mod channel;
mod protocol;

pub use channel::{AgentLink, Inbox, Outbox, channel};
pub use protocol::{
    AgentMessage, ConsoleMethod, EvalOutcome, EvalResult, HostMessage, RequestId, SelectionEvent,
    decode, encode,
};
