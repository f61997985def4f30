//! Frame lifecycle coordination
//!
//! Runs after every completed load of the embedded frame. The previous
//! document's agent died with it, so nothing from the old session is
//! assumed to survive.

use super::Host;
use crate::agent;
use crate::bridge::{AgentLink, HostMessage, channel};
use crate::devtools::PanelTab;
use crate::utils::Result;
use crate::utils::error::AccessError;

/// Bring the Host in line with a freshly loaded document
///
/// `always_inject` is set for the first load from the start page, which
/// is instrumented regardless of the persistence setting.
pub(super) fn on_frame_load(host: &mut Host, always_inject: bool) {
    if let Some(frame) = &host.frame {
        host.address = frame.url().to_string();
    }

    if always_inject || host.settings.persist_session {
        if let Err(e) = host.inject_agent() {
            log::warn!("agent not injected into {}: {}", host.address, e);
        }
    } else {
        log::debug!("session persistence off, {} left uninstrumented", host.address);
    }

    if host.panel.active_tab() == PanelTab::Elements {
        if let Err(e) = host.refresh_dom_tree() {
            log::debug!("element tree not refreshed: {}", e);
        }
    }

    if host.settings.enable_storage {
        let kind = host.storage_kind;
        if let Err(e) = host.load_storage_data(kind) {
            log::debug!("storage view not refreshed: {}", e);
        }
    }

    if let Err(e) = host.view_page_source() {
        log::debug!("page source not refreshed: {}", e);
    }
}

/// Hand a new agent its own command queue; replies share the Host's inbox
pub(super) fn inject_agent(host: &mut Host) -> Result<bool> {
    host.check_access()?;
    let frame = host.frame.as_mut().ok_or(AccessError::FrameNotLoaded)?;

    let (commands, inbox) = channel::<HostMessage>();
    let link = AgentLink {
        inbox,
        outbox: host.agent_outbox.clone(),
    };
    let injected = agent::inject(frame, link)?;
    if injected {
        host.commands = Some(commands);
    }
    Ok(injected)
}
