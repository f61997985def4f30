//! Developer tools panels
//!
//! Host-side surfaces of the tools:
//! - Console: output from both the Host and the embedded agent
//! - DOM Inspector: flat element tree and picked element
//! - Network Inspector: frame loads while recording
//! - Overlay: the same-page console used by the bookmarklet

mod console;
mod dom_inspector;
mod network_inspector;
mod overlay;

pub use console::{Console, ConsoleMessage, HOST_LOG_TARGET, LogLevel, MessageOrigin};
pub use dom_inspector::{DomInspector, DomTreeRow, INSPECT_LABEL, STOP_INSPECT_LABEL};
pub use network_inspector::{NetworkInspector, NetworkRequest, RequestStatus};
pub use overlay::{INJECTED_MARKER, Overlay, OverlayLine};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Panel tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelTab {
    Console,
    Elements,
    Network,
    Storage,
    Sources,
}

impl PanelTab {
    pub const ALL: [PanelTab; 5] = [
        Self::Console,
        Self::Elements,
        Self::Network,
        Self::Storage,
        Self::Sources,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PanelTab::Console => "console",
            PanelTab::Elements => "elements",
            PanelTab::Network => "network",
            PanelTab::Storage => "storage",
            PanelTab::Sources => "sources",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for PanelTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour scheme of the panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Chrome,
}

impl Theme {
    /// CSS custom properties applied to the shell for this theme
    pub fn css_variables(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Theme::Dark => &[
                ("--background-color", "#1e1e1e"),
                ("--surface-color", "#252526"),
                ("--text-color", "#cccccc"),
            ],
            Theme::Light => &[
                ("--background-color", "#f5f5f5"),
                ("--surface-color", "#ffffff"),
                ("--text-color", "#333333"),
            ],
            Theme::Chrome => &[
                ("--background-color", "#ffffff"),
                ("--surface-color", "#f8f9fa"),
                ("--text-color", "#202124"),
                ("--primary-color", "#1a73e8"),
            ],
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            "chrome" => Some(Theme::Chrome),
            _ => None,
        }
    }
}

/// Panel chrome: visibility, active tab, theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevToolsPanel {
    open: bool,
    active_tab: PanelTab,
    theme: Theme,
}

impl DevToolsPanel {
    pub fn new(theme: Theme) -> Self {
        Self {
            open: false,
            active_tab: PanelTab::Console,
            theme,
        }
    }

    pub fn show(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Returns whether the panel is now open
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn switch_tab(&mut self, tab: PanelTab) {
        self.active_tab = tab;
    }

    pub fn active_tab(&self) -> PanelTab {
        self.active_tab
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Current theme as an inline style declaration list
    pub fn style(&self) -> String {
        self.theme
            .css_variables()
            .iter()
            .map(|(name, value)| format!("{}: {};", name, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for DevToolsPanel {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

/// `javascript:` URL that loads the overlay script from `origin`
pub fn create_bookmarklet(origin: &str) -> String {
    let code = format!(
        "
            javascript:(function(){{
                var script=document.createElement('script');
                script.src='{}/devtools-injector.js';
                document.head.appendChild(script);
            }})();
        ",
        origin.trim_end_matches('/')
    );
    code.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_toggle_and_tabs() {
        let mut panel = DevToolsPanel::default();
        assert!(!panel.is_open());
        assert!(panel.toggle());
        panel.close();
        assert!(!panel.is_open());

        panel.switch_tab(PanelTab::parse("Elements").unwrap());
        assert_eq!(panel.active_tab(), PanelTab::Elements);
        assert_eq!(PanelTab::parse("profiler"), None);
    }

    #[test]
    fn test_theme_variables() {
        let mut panel = DevToolsPanel::default();
        assert_eq!(
            panel.style(),
            "--background-color: #1e1e1e; --surface-color: #252526; --text-color: #cccccc;"
        );
        panel.set_theme(Theme::Chrome);
        assert!(panel.style().ends_with("--primary-color: #1a73e8;"));
        assert_eq!(Theme::parse(" LIGHT "), Some(Theme::Light));
    }

    #[test]
    fn test_bookmarklet_is_single_line() {
        assert_eq!(
            create_bookmarklet("http://localhost:8080/"),
            "javascript:(function(){ var script=document.createElement('script'); \
             script.src='http://localhost:8080/devtools-injector.js'; \
             document.head.appendChild(script); })();"
        );
    }
}
