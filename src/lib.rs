//! # Framescope - devtools for an embedded frame
//!
//! A Host Controller loads pages into an embedded frame and drives an
//! agent injected into each loaded document. The two sides never share
//! state; they talk over a typed message channel.
//!
//! ## Architecture
//!
//! - **host**: address bar, history, panels, frame lifecycle coordination
//! - **agent**: console instrumentation, evaluator, element picker
//! - **bridge**: message protocol and channel between Host and agent
//! - **frame**: one loaded document instance and its loaders
//! - **devtools**: console, elements, network panels and the same-page overlay
//! - **renderer**: DOM, HTML parsing and serialization
//! - **js_engine**: JavaScript runtime integration
//! - **storage**: per-origin storage areas
//! - **utils**: Shared utilities and error types

pub mod agent;
pub mod bridge;
pub mod devtools;
pub mod frame;
pub mod host;
pub mod js_engine;
pub mod renderer;
pub mod storage;
pub mod utils;

// Re-export main types for convenience
pub use frame::{Frame, FrameLoader, HttpLoader, LoadedPage, StaticLoader};
pub use host::{Host, HostConfig};
pub use utils::error::{FramescopeError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Framescope";
