//! Network panel: a log of frame loads while recording

use std::time::Duration;

/// Request status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Complete,
    Failed,
}

/// A recorded document load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRequest {
    pub id: u64,
    pub url: String,
    pub method: &'static str,
    pub status: RequestStatus,
    pub status_code: Option<u16>,
    pub response_size: usize,
    pub duration: Duration,
    pub error_message: Option<String>,
}

impl NetworkRequest {
    /// One log line: `GET 200 https://… (1234 B, 12 ms)`
    pub fn render(&self) -> String {
        match self.status {
            RequestStatus::Complete => format!(
                "{} {} {} ({} B, {} ms)",
                self.method,
                self.status_code.unwrap_or_default(),
                self.url,
                self.response_size,
                self.duration.as_millis()
            ),
            RequestStatus::Failed => format!(
                "{} {} failed: {}",
                self.method,
                self.url,
                self.error_message.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Network Inspector for frame loads
pub struct NetworkInspector {
    requests: Vec<NetworkRequest>,
    next_id: u64,
    recording: bool,
}

impl NetworkInspector {
    /// Create a new network inspector (not recording)
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            next_id: 1,
            recording: false,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Flip recording; returns the new state
    pub fn toggle_recording(&mut self) -> bool {
        self.recording = !self.recording;
        self.recording
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Record a completed load; ignored unless recording
    pub fn record_complete(&mut self, url: &str, status_code: u16, response_size: usize, duration: Duration) {
        if !self.recording {
            return;
        }
        let id = self.next_id();
        self.requests.push(NetworkRequest {
            id,
            url: url.to_string(),
            method: "GET",
            status: RequestStatus::Complete,
            status_code: Some(status_code),
            response_size,
            duration,
            error_message: None,
        });
    }

    /// Record a failed load; ignored unless recording
    pub fn record_failure(&mut self, url: &str, error: &str, duration: Duration) {
        if !self.recording {
            return;
        }
        let id = self.next_id();
        self.requests.push(NetworkRequest {
            id,
            url: url.to_string(),
            method: "GET",
            status: RequestStatus::Failed,
            status_code: None,
            response_size: 0,
            duration,
            error_message: Some(error.to_string()),
        });
    }

    /// Get all requests
    pub fn requests(&self) -> &[NetworkRequest] {
        &self.requests
    }

    /// Clear all requests
    pub fn clear(&mut self) {
        self.requests.clear();
    }

    /// Get total request count
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Get total transferred size
    pub fn total_size(&self) -> usize {
        self.requests.iter().map(|r| r.response_size).sum()
    }
}

impl Default for NetworkInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_records_while_recording() {
        let mut inspector = NetworkInspector::new();
        inspector.record_complete("https://a.test/", 200, 10, Duration::from_millis(3));
        assert_eq!(inspector.request_count(), 0);

        assert!(inspector.toggle_recording());
        inspector.record_complete("https://a.test/", 200, 10, Duration::from_millis(3));
        inspector.record_failure("https://b.test/", "refused", Duration::ZERO);
        assert_eq!(inspector.request_count(), 2);
        assert_eq!(inspector.total_size(), 10);
        assert_eq!(inspector.requests()[0].render(), "GET 200 https://a.test/ (10 B, 3 ms)");
        assert_eq!(inspector.requests()[1].render(), "GET https://b.test/ failed: refused");

        inspector.clear();
        assert_eq!(inspector.request_count(), 0);
        assert!(!inspector.toggle_recording());
    }
}
