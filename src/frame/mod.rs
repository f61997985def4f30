//! The embedded frame
//!
//! A [`Frame`] is one loaded document instance: the parsed DOM, a fresh
//! JavaScript context, the origin's storage handles and whatever agent
//! session was injected into it. Navigation never mutates a frame; it
//! replaces it, which drops every piece of instrumentation with it.

mod events;
mod loader;

pub use events::{ClickEvent, ClickHandler, EventListeners, ListenerId};
pub use loader::{FrameLoader, HttpLoader, LoadedPage, StaticLoader};

#[cfg(test)]
pub use loader::MockFrameLoader;

use crate::agent::FrameSession;
use crate::js_engine::{JsRuntime, JsValue, PageGlobals, init_web_apis};
use crate::renderer::{Document, HtmlParser, NodeId};
use crate::storage::OriginStorage;
use crate::utils::Result;
use crate::utils::error::RenderError;
use std::collections::HashSet;
use url::Url;

/// What the browser does after a click has been dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A listener prevented the default action
    Intercepted,
    /// The click landed in a link; the frame should navigate
    Navigate(Url),
    /// Nothing further happens
    NoAction,
}

/// One loaded document instance of the embedded frame
pub struct Frame {
    url: Url,
    status: u16,
    document: Document,
    runtime: JsRuntime,
    storage: OriginStorage,
    listeners: EventListeners,
    hovered: Option<NodeId>,
    markers: HashSet<&'static str>,
    session: Option<FrameSession>,
}

impl Frame {
    /// Build a frame from a fetched page and run its inline scripts
    pub fn load(page: LoadedPage, storage: OriginStorage) -> Result<Self> {
        let document = HtmlParser::new().parse(&page.html)?;

        for header in &page.set_cookies {
            storage.cookies.set_from_header(header);
        }

        let mut runtime = JsRuntime::new();
        init_web_apis(
            &mut runtime,
            &PageGlobals {
                url: &page.url,
                title: &document.title(),
                storage: &storage,
            },
        )?;

        let mut frame = Self {
            url: page.url,
            status: page.status,
            document,
            runtime,
            storage,
            listeners: EventListeners::new(),
            hovered: None,
            markers: HashSet::new(),
            session: None,
        };
        frame.run_inline_scripts();
        Ok(frame)
    }

    fn run_inline_scripts(&mut self) {
        for (index, script) in self.document.inline_scripts().iter().enumerate() {
            if let Err(e) = self.runtime.execute(script) {
                log::debug!("script #{} in {} failed: {}", index, self.url, e);
            }
        }
    }

    /// Current location
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Status the document was served with
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub(crate) fn runtime_mut(&mut self) -> &mut JsRuntime {
        &mut self.runtime
    }

    pub(crate) fn listeners_mut(&mut self) -> &mut EventListeners {
        &mut self.listeners
    }

    /// Storage areas of this document's origin
    pub fn storage(&self) -> &OriginStorage {
        &self.storage
    }

    /// Number of registered click listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Run a script in the page's own context (the page's scripts, not the agent)
    pub fn run_script(&mut self, code: &str) -> Result<JsValue> {
        self.runtime.execute(code)
    }

    /// Whether a global binding is present in the page context
    pub fn has_global(&mut self, name: &str) -> bool {
        self.runtime.has_global(name)
    }

    /// Set a page marker; returns false if it was already set
    pub fn set_marker(&mut self, marker: &'static str) -> bool {
        self.markers.insert(marker)
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.contains(marker)
    }

    /// Whether an agent session is installed
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub(crate) fn session(&self) -> Option<&FrameSession> {
        self.session.as_ref()
    }

    pub(crate) fn install_session(&mut self, session: FrameSession) {
        self.session = Some(session);
    }

    /// Whether the inspector's own hover style is installed in the document
    ///
    /// Page stylesheets never count, even when they carry a hover rule.
    pub fn hover_rule_active(&self) -> bool {
        self.session()
            .and_then(FrameSession::installed_inspector)
            .is_some_and(|installed| self.document.get(installed.style_node).is_some())
    }

    /// Move the pointer over an element (or off the document)
    pub fn hover(&mut self, node: Option<NodeId>) {
        self.hovered = node.filter(|id| self.document.get(*id).is_some());
    }

    /// Element currently showing the hover affordance
    pub fn highlighted(&self) -> Option<NodeId> {
        self.hovered.filter(|_| self.hover_rule_active())
    }

    /// Click an element
    pub fn click(&mut self, target: NodeId) -> Result<ClickOutcome> {
        if self.document.get(target).is_none() {
            return Err(RenderError::NodeNotFound(target).into());
        }

        let mut event = ClickEvent::new(target);
        self.listeners.dispatch(&self.document, &mut event);
        if event.default_prevented() {
            return Ok(ClickOutcome::Intercepted);
        }

        let href = self.document.ancestry(target).and_then(|chain| {
            chain
                .iter()
                .rev()
                .filter(|n| n.has_tag("a"))
                .find_map(|n| n.as_element().and_then(|e| e.get_attribute("href")))
                .map(str::to_string)
        });
        match href.and_then(|h| self.url.join(&h).ok()) {
            Some(url) => Ok(ClickOutcome::Navigate(url)),
            None => Ok(ClickOutcome::NoAction),
        }
    }

    /// Process messages queued for the injected agent
    pub fn pump(&mut self) -> usize {
        let Some(mut session) = self.session.take() else {
            return 0;
        };
        let handled = session.pump(self);
        self.session = Some(session);
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{AgentLink, AgentMessage, HostMessage, channel};
    use crate::renderer::Node;

    fn frame(html: &str) -> Frame {
        let url = Url::parse("https://example.com/start").unwrap();
        Frame::load(LoadedPage::new(url, html), OriginStorage::default()).unwrap()
    }

    #[test]
    fn test_inline_scripts_run_in_order() {
        let mut f = frame(
            "<script>var order = ['a'];</script><script>throw new Error('x')</script><script>order.push('b');</script>",
        );
        assert_eq!(
            f.run_script("order.join(',')").unwrap(),
            JsValue::String("a,b".into())
        );
    }

    #[test]
    fn test_set_cookie_headers_reach_jar() {
        let url = Url::parse("https://example.com/").unwrap();
        let storage = OriginStorage::default();
        let page = LoadedPage::new(url, "").with_cookie("sid=1; Path=/");
        let f = Frame::load(page, storage.clone()).unwrap();
        assert_eq!(f.storage().cookies.cookie_string(), "sid=1");
        assert_eq!(storage.cookies.len(), 1);
    }

    #[test]
    fn test_click_follows_links() {
        let mut f = frame(r#"<a href="/next"><span id="inner">go</span></a><p id="plain">x</p>"#);
        let inner = f.document().get_element_by_id("inner").unwrap().id;
        let plain = f.document().get_element_by_id("plain").unwrap().id;
        assert_eq!(
            f.click(inner).unwrap(),
            ClickOutcome::Navigate(Url::parse("https://example.com/next").unwrap())
        );
        assert_eq!(f.click(plain).unwrap(), ClickOutcome::NoAction);
        assert!(f.click(u64::MAX).is_err());
    }

    #[test]
    fn test_listener_can_intercept() {
        let mut f = frame(r#"<a id="l" href="/next">go</a>"#);
        let link = f.document().get_element_by_id("l").unwrap().id;
        f.listeners_mut()
            .add_click(true, Box::new(|_, e| e.prevent_default()));
        assert_eq!(f.click(link).unwrap(), ClickOutcome::Intercepted);
    }

    #[test]
    fn test_highlight_requires_inspector() {
        let mut f = frame("<style>*:hover { color: red }</style><p id='p'>x</p>");
        let p = f.document().get_element_by_id("p").unwrap().id;
        f.hover(Some(p));
        assert!(!f.hover_rule_active());
        assert_eq!(f.highlighted(), None);

        let head = f.document().head().unwrap().id;
        let style = Node::element("style").with_child(Node::text("*:hover { outline: 1px }"));
        f.document_mut().append_child(head, style);
        assert_eq!(f.highlighted(), None);

        let (commands, inbox) = channel::<HostMessage>();
        let (outbox, _replies) = channel::<AgentMessage>();
        assert!(crate::agent::inject(&mut f, AgentLink { inbox, outbox }).unwrap());
        assert_eq!(f.highlighted(), None);

        commands
            .post(&HostMessage::SetInspectMode { enabled: true })
            .unwrap();
        f.pump();
        assert!(f.hover_rule_active());
        assert_eq!(f.highlighted(), Some(p));

        f.hover(Some(u64::MAX));
        assert_eq!(f.highlighted(), None);

        f.hover(Some(p));
        commands
            .post(&HostMessage::SetInspectMode { enabled: false })
            .unwrap();
        f.pump();
        assert_eq!(f.highlighted(), None);
    }

    #[test]
    fn test_markers() {
        let mut f = frame("");
        assert!(f.set_marker("devToolsInjected"));
        assert!(!f.set_marker("devToolsInjected"));
        assert!(f.has_marker("devToolsInjected"));
    }
}
