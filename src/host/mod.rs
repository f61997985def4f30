//! Host Controller
//!
//! Owns the embedded frame and everything shown around it: the address
//! bar and history, the devtools panel, the Host side of the console
//! and inspector bridges, and the storage viewer. The Host never calls
//! into the agent; it only posts messages and reacts to replies on
//! [`Host::pump`].

mod config;
mod lifecycle;
mod settings;

pub use config::HostConfig;
pub use settings::{FileStore, KeyValueStore, MemoryStore, SETTINGS_KEY, Settings};

use crate::bridge::{
    AgentMessage, EvalOutcome, EvalResult, HostMessage, Inbox, Outbox, RequestId, SelectionEvent,
    channel,
};
use crate::devtools::{
    Console, ConsoleMessage, DevToolsPanel, DomInspector, MessageOrigin, NetworkInspector, PanelTab,
    Theme,
};
use crate::frame::{ClickOutcome, Frame, FrameLoader};
use crate::renderer::{NodeId, format_html, outer_html};
use crate::storage::{StorageKind, StorageRegistry};
use crate::utils::error::AccessError;
use crate::utils::{FramescopeError, Result};
use std::collections::HashMap;
use std::time::Instant;
use url::Url;

/// Address shown when no document is loaded
pub const BLANK_ADDRESS: &str = "about:blank";

/// Turn user input into a loadable URL
///
/// Input without an `http`/`https`/`file` scheme gets `https://` prepended.
pub fn normalize_address(input: &str) -> Result<Url> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FramescopeError::InvalidUrl("empty address".to_string()));
    }
    let candidate = if ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| input.starts_with(scheme))
    {
        input.to_string()
    } else {
        format!("https://{}", input)
    };
    Url::parse(&candidate).map_err(|e| FramescopeError::InvalidUrl(format!("{}: {}", input, e)))
}

/// The Host Controller
pub struct Host {
    config: HostConfig,
    loader: Box<dyn FrameLoader>,
    registry: StorageRegistry,
    frame: Option<Frame>,
    address: String,
    history: Vec<Url>,
    history_index: usize,
    inbox: Inbox<AgentMessage>,
    agent_outbox: Outbox<AgentMessage>,
    commands: Option<Outbox<HostMessage>>,
    pending: HashMap<RequestId, Instant>,
    next_request: RequestId,
    results: Vec<EvalResult>,
    console: Console,
    dom_inspector: DomInspector,
    network: NetworkInspector,
    panel: DevToolsPanel,
    settings: Settings,
    store: Box<dyn KeyValueStore>,
    storage_kind: StorageKind,
    storage_rows: Vec<(String, String)>,
    page_source: String,
}

impl Host {
    pub fn new(
        config: HostConfig,
        loader: impl FrameLoader + 'static,
        store: impl KeyValueStore + 'static,
    ) -> Self {
        let settings = Settings::load(&store);
        let (agent_outbox, inbox) = channel::<AgentMessage>();
        Self {
            dom_inspector: DomInspector::new(config.dom_tree_limit),
            panel: DevToolsPanel::new(settings.theme),
            config,
            loader: Box::new(loader),
            registry: StorageRegistry::new(),
            frame: None,
            address: BLANK_ADDRESS.to_string(),
            history: Vec::new(),
            history_index: 0,
            inbox,
            agent_outbox,
            commands: None,
            pending: HashMap::new(),
            next_request: 1,
            results: Vec::new(),
            console: Console::new(),
            network: NetworkInspector::new(),
            settings,
            store: Box::new(store),
            storage_kind: StorageKind::Local,
            storage_rows: Vec::new(),
            page_source: String::new(),
        }
    }

    /// Default configuration with in-memory settings
    pub fn with_loader(loader: impl FrameLoader + 'static) -> Self {
        Self::new(HostConfig::default(), loader, MemoryStore::new())
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Address bar contents
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn frame_mut(&mut self) -> Option<&mut Frame> {
        self.frame.as_mut()
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn dom_inspector(&self) -> &DomInspector {
        &self.dom_inspector
    }

    pub fn network(&self) -> &NetworkInspector {
        &self.network
    }

    pub fn panel(&self) -> &DevToolsPanel {
        &self.panel
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Every settled evaluation, in settlement order
    pub fn eval_results(&self) -> &[EvalResult] {
        &self.results
    }

    /// Console commands still waiting for a reply
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.storage_kind
    }

    pub fn storage_rows(&self) -> &[(String, String)] {
        &self.storage_rows
    }

    pub fn page_source(&self) -> &str {
        &self.page_source
    }

    // --- navigation ---

    /// Open an address from the start page; always instruments the frame
    pub fn open(&mut self, address: &str) -> Result<()> {
        let url = normalize_address(address)?;
        self.visit(url, true)
    }

    /// Open the configured home page
    pub fn open_home(&mut self) -> Result<()> {
        let home = self.config.home_url.clone();
        self.open(&home)
    }

    /// Navigate the frame from the address bar; blank input is ignored
    pub fn navigate(&mut self, address: &str) -> Result<()> {
        if address.trim().is_empty() {
            return Ok(());
        }
        let url = normalize_address(address)?;
        self.visit(url, false)
    }

    /// Load the current document again
    pub fn reload(&mut self) -> Result<()> {
        let url = self
            .frame
            .as_ref()
            .map(|f| f.url().clone())
            .ok_or(AccessError::FrameNotLoaded)?;
        self.load(url, false)
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty() && self.history_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.history_index + 1 < self.history.len()
    }

    /// Step back in history; `false` when there is nothing to go back to
    pub fn back(&mut self) -> Result<bool> {
        if !self.can_go_back() {
            return Ok(false);
        }
        let index = self.history_index - 1;
        self.load(self.history[index].clone(), false)?;
        self.history_index = index;
        Ok(true)
    }

    /// Step forward in history
    pub fn forward(&mut self) -> Result<bool> {
        if !self.can_go_forward() {
            return Ok(false);
        }
        let index = self.history_index + 1;
        self.load(self.history[index].clone(), false)?;
        self.history_index = index;
        Ok(true)
    }

    /// Unload the frame
    pub fn close(&mut self) {
        self.fail_pending("frame closed");
        self.commands = None;
        self.frame = None;
        self.dom_inspector.reset();
        self.address = BLANK_ADDRESS.to_string();
        self.storage_rows.clear();
        self.page_source.clear();
        log::info!("frame closed");
    }

    fn visit(&mut self, url: Url, always_inject: bool) -> Result<()> {
        self.load(url, always_inject)?;
        if let Some(frame) = &self.frame {
            if !self.history.is_empty() {
                self.history.truncate(self.history_index + 1);
            }
            self.history.push(frame.url().clone());
            self.history_index = self.history.len() - 1;
        }
        Ok(())
    }

    fn load(&mut self, url: Url, always_inject: bool) -> Result<()> {
        let started = Instant::now();
        let page = match self.loader.load(&url) {
            Ok(page) => page,
            Err(e) => {
                if self.settings.enable_network {
                    self.network
                        .record_failure(url.as_str(), &e.to_string(), started.elapsed());
                }
                self.console.error(format!("Failed to load {}: {}", url, e));
                return Err(e);
            }
        };
        if self.settings.enable_network {
            self.network
                .record_complete(page.url.as_str(), page.status, page.html.len(), started.elapsed());
        }

        let storage = self.registry.for_url(&page.url);
        let frame = Frame::load(page, storage).inspect_err(|e| {
            self.console.error(format!("Failed to render {}: {}", url, e));
        })?;

        self.fail_pending("frame navigated");
        self.commands = None;
        self.dom_inspector.reset();
        self.frame = Some(frame);
        log::info!("loaded {}", url);

        lifecycle::on_frame_load(self, always_inject);
        Ok(())
    }

    // --- access ---

    /// Whether the Host may touch the frame's document directly
    fn check_access(&self) -> Result<()> {
        let frame = self.frame.as_ref().ok_or(AccessError::FrameNotLoaded)?;
        if let Some(host) = &self.config.host_origin {
            let origin = frame.url().origin().ascii_serialization();
            if host.trim_end_matches('/') != origin {
                return Err(AccessError::CrossOrigin {
                    host: host.clone(),
                    frame: origin,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Log a failed cross-context operation and hand the error back
    fn access_failed(&mut self, err: FramescopeError) -> FramescopeError {
        self.console.error(format!("Error: {}", err));
        err
    }

    /// Instrument the current frame (no-op if it already is)
    pub fn inject_agent(&mut self) -> Result<bool> {
        lifecycle::inject_agent(self).map_err(|e| self.access_failed(e))
    }

    // --- console bridge ---

    /// Submit code for evaluation in the frame
    pub fn run_console_code(&mut self, code: &str) -> Result<Option<RequestId>> {
        if code.trim().is_empty() {
            return Ok(None);
        }

        let id = self.next_request;
        self.next_request += 1;
        let message = HostMessage::ConsoleCommand {
            id,
            code: code.to_string(),
        };
        let posted = match &self.commands {
            Some(commands) => commands.post(&message),
            None => Err(AccessError::NoSession.into()),
        };
        posted.map_err(|e| self.access_failed(e))?;

        self.console.log(format!("> {}", code));
        self.pending
            .insert(id, Instant::now() + self.config.eval_timeout);
        Ok(Some(id))
    }

    /// Single dispatch point for agent messages; returns how many were handled
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(received) = self.inbox.try_next() {
            match received {
                Ok(message) => {
                    self.dispatch(message);
                    handled += 1;
                }
                Err(e) => log::warn!("host dropped message: {}", e),
            }
        }
        handled
    }

    fn dispatch(&mut self, message: AgentMessage) {
        match message {
            AgentMessage::Console {
                method,
                args,
                timestamp,
            } => {
                if !self.settings.enable_console {
                    return;
                }
                let mut entry = ConsoleMessage::new(method.into(), MessageOrigin::Agent, args.join(" "));
                if let Some(timestamp) = timestamp {
                    entry = entry.at(timestamp);
                }
                self.console.push(entry);
            }
            AgentMessage::ConsoleResult { id, result } => self.settle(EvalResult {
                id,
                outcome: EvalOutcome::Success(result),
            }),
            AgentMessage::ConsoleError { id, error } => self.settle(EvalResult {
                id,
                outcome: EvalOutcome::Failure(error),
            }),
            AgentMessage::ElementSelected { html, path } => {
                self.console.info(format!("Selected: {}", path));
                self.dom_inspector.select(SelectionEvent { markup: html, path });
            }
        }
    }

    fn settle(&mut self, result: EvalResult) {
        if self.pending.remove(&result.id).is_none() {
            log::debug!("dropping result for settled or unknown request {}", result.id);
            return;
        }
        match &result.outcome {
            EvalOutcome::Success(value) => self.console.log(format!("Result: {}", value)),
            EvalOutcome::Failure(message) => self.console.error(format!("Error: {}", message)),
        }
        self.results.push(result);
    }

    fn fail_pending(&mut self, reason: &str) {
        let mut ids: Vec<_> = self.pending.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            self.settle(EvalResult {
                id,
                outcome: EvalOutcome::Failure(reason.to_string()),
            });
        }
    }

    /// Fail every request whose deadline is at or before `now`
    pub fn expire_pending(&mut self, now: Instant) -> usize {
        let mut overdue: Vec<_> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        overdue.sort_unstable();

        let message = format!(
            "evaluation timed out after {} ms",
            self.config.eval_timeout.as_millis()
        );
        for id in &overdue {
            self.settle(EvalResult {
                id: *id,
                outcome: EvalOutcome::Failure(message.clone()),
            });
        }
        overdue.len()
    }

    /// One turn of both event loops: agent, then Host, then timeouts
    pub fn tick(&mut self) {
        if let Some(frame) = self.frame.as_mut() {
            frame.pump();
        }
        self.pump();
        self.expire_pending(Instant::now());
    }

    pub fn clear_console(&mut self) {
        self.console.clear();
    }

    // --- inspector bridge ---

    /// Text of the inspect button
    pub fn inspect_label(&self) -> &'static str {
        self.dom_inspector.button_label()
    }

    /// Flip inspect mode; returns the new state
    pub fn toggle_inspect(&mut self) -> Result<bool> {
        let enabled = !self.dom_inspector.is_inspecting();
        self.set_inspect(enabled)?;
        Ok(enabled)
    }

    /// Enter or leave inspect mode; a request for the current state does nothing
    pub fn set_inspect(&mut self, enabled: bool) -> Result<()> {
        if self.dom_inspector.is_inspecting() == enabled {
            return Ok(());
        }
        if enabled && !self.settings.enable_inspector {
            self.console.warn("Inspector is disabled in settings");
            return Err(FramescopeError::CapabilityDenied(
                "inspector disabled".to_string(),
            ));
        }

        let posted = match &self.commands {
            Some(commands) => commands.post(&HostMessage::SetInspectMode { enabled }),
            None => Err(AccessError::NoSession.into()),
        };
        posted.map_err(|e| self.access_failed(e))?;
        self.dom_inspector.set_inspecting(enabled);
        Ok(())
    }

    /// Click an element in the frame, following links
    pub fn click(&mut self, node: NodeId) -> Result<ClickOutcome> {
        let frame = self.frame.as_mut().ok_or(AccessError::FrameNotLoaded)?;
        let outcome = frame.click(node)?;
        if let ClickOutcome::Navigate(url) = &outcome {
            self.visit(url.clone(), false)?;
        }
        Ok(outcome)
    }

    /// Move the pointer inside the frame
    pub fn hover(&mut self, node: Option<NodeId>) {
        if let Some(frame) = self.frame.as_mut() {
            frame.hover(node);
        }
    }

    /// Rebuild the element tree from the frame's document
    pub fn refresh_dom_tree(&mut self) -> Result<()> {
        self.check_access().map_err(|e| self.access_failed(e))?;
        if let Some(frame) = &self.frame {
            self.dom_inspector.set_tree(frame.document());
        }
        Ok(())
    }

    /// Formatted outer HTML of the frame's document element
    pub fn view_page_source(&mut self) -> Result<&str> {
        self.check_access().map_err(|e| self.access_failed(e))?;
        let source = self
            .frame
            .as_ref()
            .and_then(|f| f.document().document_element().map(outer_html))
            .unwrap_or_default();
        self.page_source = format_html(&source);
        Ok(&self.page_source)
    }

    // --- storage viewer ---

    /// List the entries of one storage area of the frame's origin
    pub fn load_storage_data(&mut self, kind: StorageKind) -> Result<&[(String, String)]> {
        self.storage_kind = kind;
        let rows = self.check_access().map(|()| {
            self.frame
                .as_ref()
                .map(|f| f.storage().entries(kind))
                .unwrap_or_default()
        });
        match rows {
            Ok(rows) => self.storage_rows = rows,
            Err(e) => {
                self.storage_rows.clear();
                return Err(self.access_failed(e));
            }
        }
        Ok(&self.storage_rows)
    }

    /// Remove every entry of a storage area; cookies cannot be cleared
    pub fn clear_storage(&mut self, kind: StorageKind) -> Result<()> {
        if kind == StorageKind::Cookies {
            self.console
                .warn("Clearing cookies is not supported from the dev tools");
            return Err(FramescopeError::CapabilityDenied(
                "cookies cannot be cleared".to_string(),
            ));
        }

        self.check_access().map_err(|e| self.access_failed(e))?;
        if let Some(frame) = &self.frame {
            let storage = frame.storage();
            match kind {
                StorageKind::Local => storage.local.clear(),
                StorageKind::Session => storage.session.clear(),
                StorageKind::Cookies => {}
            }
        }
        self.console.info(format!("{} cleared", kind));
        self.load_storage_data(kind)?;
        Ok(())
    }

    // --- panel ---

    pub fn show_devtools(&mut self) {
        self.panel.show();
    }

    pub fn close_devtools(&mut self) {
        self.panel.close();
    }

    pub fn toggle_devtools(&mut self) -> bool {
        self.panel.toggle()
    }

    pub fn switch_tab(&mut self, tab: PanelTab) {
        self.panel.switch_tab(tab);
    }

    /// Apply and persist a theme
    pub fn change_theme(&mut self, theme: Theme) -> Result<()> {
        self.panel.set_theme(theme);
        self.update_settings(|s| s.theme = theme)
    }

    /// Change settings and persist them
    pub fn update_settings(&mut self, change: impl FnOnce(&mut Settings)) -> Result<()> {
        change(&mut self.settings);
        self.panel.set_theme(self.settings.theme);
        self.settings.save(self.store.as_mut()).inspect_err(|e| {
            log::warn!("failed to save settings: {}", e);
        })
    }

    /// Flip network recording; returns the new state
    pub fn toggle_network_recording(&mut self) -> bool {
        let recording = self.network.toggle_recording();
        if recording {
            self.console.info("Network recording started");
        } else {
            self.console.info("Network recording stopped");
        }
        recording
    }

    pub fn clear_network_logs(&mut self) {
        self.network.clear();
    }
}
