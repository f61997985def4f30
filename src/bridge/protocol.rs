//! Wire protocol between the Host Controller and the Embedded Agent.
//!
//! Messages travel as JSON envelopes tagged by `type`. Each side decodes
//! at a single dispatch point; envelopes with an unknown tag fail to
//! decode and are dropped there.

use crate::utils::Result;
use crate::utils::error::BridgeError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlates a `consoleCommand` with its result
pub type RequestId = u64;

/// Console severity captured from the embedded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleMethod {
    Log,
    Error,
    Warn,
    Info,
}

impl ConsoleMethod {
    /// Every instrumented console method
    pub const ALL: [ConsoleMethod; 4] = [Self::Log, Self::Error, Self::Warn, Self::Info];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleMethod::Log => "log",
            ConsoleMethod::Error => "error",
            ConsoleMethod::Warn => "warn",
            ConsoleMethod::Info => "info",
        }
    }
}

impl fmt::Display for ConsoleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host → Agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// Evaluate `code` in the agent's global scope
    ConsoleCommand { id: RequestId, code: String },
    /// Turn the element picker on or off
    SetInspectMode { enabled: bool },
}

/// Agent → Host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AgentMessage {
    /// A console call made inside the frame
    Console {
        method: ConsoleMethod,
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<u64>,
    },
    /// Successful evaluation, value converted with `String(value)`
    ConsoleResult { id: RequestId, result: String },
    /// Evaluation threw; `error` is the exception message
    ConsoleError { id: RequestId, error: String },
    /// An element was picked in inspect mode
    ElementSelected { html: String, path: String },
}

/// Outcome of one evaluation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalOutcome {
    Success(String),
    Failure(String),
}

/// Settled evaluation request as seen by the Host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalResult {
    pub id: RequestId,
    pub outcome: EvalOutcome,
}

impl EvalResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, EvalOutcome::Success(_))
    }
}

/// Element picked in inspect mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    /// Serialized outer HTML
    pub markup: String,
    /// Structural locator
    pub path: String,
}

/// Serialize a message into an envelope
pub fn encode<M: Serialize>(message: &M) -> Result<String> {
    serde_json::to_string(message).map_err(|e| BridgeError::Encode(e.to_string()).into())
}

/// Decode an envelope; unknown tags and malformed payloads are errors
pub fn decode<M: DeserializeOwned>(envelope: &str) -> Result<M> {
    serde_json::from_str(envelope).map_err(|e| BridgeError::Decode(e.to_string()).into())
}
