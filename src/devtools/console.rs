//! Host console surface

use crate::bridge::ConsoleMethod;
use crate::utils::{clock_time, now_millis};
use std::collections::VecDeque;

/// Log target every recorded entry is mirrored to
pub const HOST_LOG_TARGET: &str = "framescope::host";

/// Log level for console messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Log,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Get the display string for the log level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Log => "LOG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn as_log_level(&self) -> log::Level {
        match self {
            LogLevel::Log | LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

impl From<ConsoleMethod> for LogLevel {
    fn from(method: ConsoleMethod) -> Self {
        match method {
            ConsoleMethod::Log => LogLevel::Log,
            ConsoleMethod::Info => LogLevel::Info,
            ConsoleMethod::Warn => LogLevel::Warn,
            ConsoleMethod::Error => LogLevel::Error,
        }
    }
}

/// Which context produced a console entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    Host,
    Agent,
}

/// A console message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleMessage {
    pub level: LogLevel,
    pub origin: MessageOrigin,
    pub message: String,
    pub timestamp: u64,
}

impl ConsoleMessage {
    /// Create a new console message stamped with the current time
    pub fn new(level: LogLevel, origin: MessageOrigin, message: impl Into<String>) -> Self {
        Self {
            level,
            origin,
            message: message.into(),
            timestamp: now_millis(),
        }
    }

    /// Override the timestamp (agent entries carry their own)
    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// `[HH:MM:SS] message`
    pub fn render(&self) -> String {
        format!("[{}] {}", clock_time(self.timestamp), self.message)
    }
}

/// Console output shown in the panel
pub struct Console {
    messages: VecDeque<ConsoleMessage>,
    max_messages: usize,
    filter_level: Option<LogLevel>,
}

impl Console {
    /// Create a new console
    pub fn new() -> Self {
        Self {
            messages: VecDeque::new(),
            max_messages: 1000,
            filter_level: None,
        }
    }

    /// Log a message
    pub fn log(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::new(LogLevel::Log, MessageOrigin::Host, message));
    }

    /// Log an info message
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::new(LogLevel::Info, MessageOrigin::Host, message));
    }

    /// Log a warning message
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::new(LogLevel::Warn, MessageOrigin::Host, message));
    }

    /// Log an error message
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::new(LogLevel::Error, MessageOrigin::Host, message));
    }

    /// Record an entry and mirror it to the log facade
    pub fn push(&mut self, message: ConsoleMessage) {
        log::log!(
            target: HOST_LOG_TARGET,
            message.level.as_log_level(),
            "[{:?}] {}",
            message.origin,
            message.message
        );
        if self.messages.len() >= self.max_messages {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Clear all messages
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Get all messages
    pub fn messages(&self) -> impl Iterator<Item = &ConsoleMessage> {
        self.messages
            .iter()
            .filter(|m| self.filter_level.map(|f| m.level == f).unwrap_or(true))
    }

    /// Rendered lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.messages().map(ConsoleMessage::render).collect()
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&ConsoleMessage> {
        self.messages.back()
    }

    /// Get message count
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Set filter level
    pub fn set_filter(&mut self, level: Option<LogLevel>) {
        self.filter_level = level;
    }

    /// Set max messages
    pub fn set_max_messages(&mut self, max: usize) {
        self.max_messages = max;
        while self.messages.len() > max {
            self.messages.pop_front();
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_levels() {
        let mut console = Console::new();
        console.log("log");
        console.info("info");
        console.warn("warn");
        console.error("error");
        assert_eq!(console.message_count(), 4);
        assert!(console.messages().all(|m| m.origin == MessageOrigin::Host));
    }

    #[test]
    fn test_console_max_messages() {
        let mut console = Console::new();
        console.set_max_messages(3);
        for i in 0..5 {
            console.log(format!("Message {}", i));
        }
        assert_eq!(console.message_count(), 3);
        assert_eq!(console.messages().next().unwrap().message, "Message 2");
    }

    #[test]
    fn test_render_and_filter() {
        let mut console = Console::new();
        console.push(ConsoleMessage::new(LogLevel::Warn, MessageOrigin::Agent, "careful").at(3_723_000));
        console.info("fine");
        console.set_filter(Some(LogLevel::Warn));
        assert_eq!(console.lines(), vec!["[01:02:03] careful".to_string()]);
        console.clear();
        assert!(console.last().is_none());
    }

    #[test]
    fn test_method_maps_to_level() {
        assert_eq!(LogLevel::from(ConsoleMethod::Error), LogLevel::Error);
        assert_eq!(LogLevel::from(ConsoleMethod::Log).as_str(), "LOG");
    }
}
