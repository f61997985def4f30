//! Page loaders feeding the embedded frame

use crate::utils::Result;
use crate::utils::error::NetworkError;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// A fetched document, ready to be turned into a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPage {
    /// Final address after redirects
    pub url: Url,
    /// HTTP-like status; local sources report 200
    pub status: u16,
    /// Markup
    pub html: String,
    /// Raw `Set-Cookie` values
    pub set_cookies: Vec<String>,
}

impl LoadedPage {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            status: 200,
            html: html.into(),
            set_cookies: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, set_cookie: impl Into<String>) -> Self {
        self.set_cookies.push(set_cookie.into());
        self
    }
}

/// The frame-loading facility
#[cfg_attr(test, mockall::automock)]
pub trait FrameLoader {
    /// Fetch the document at `url`
    fn load(&self, url: &Url) -> Result<LoadedPage>;
}

/// In-memory pages, keyed by URL
#[derive(Debug, Default, Clone)]
pub struct StaticLoader {
    pages: HashMap<String, LoadedPage>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `html` under `url`
    pub fn insert(&mut self, url: &str, html: &str) -> Result<()> {
        let parsed = Url::parse(url).map_err(|e| crate::FramescopeError::InvalidUrl(format!("{}: {}", url, e)))?;
        self.pages
            .insert(parsed.as_str().to_string(), LoadedPage::new(parsed, html));
        Ok(())
    }

    /// Register a full page
    pub fn insert_page(&mut self, page: LoadedPage) {
        self.pages.insert(page.url.as_str().to_string(), page);
    }

    /// Builder-style registration for tests and demos
    pub fn with_page(mut self, url: &str, html: &str) -> Result<Self> {
        self.insert(url, html)?;
        Ok(self)
    }
}

impl FrameLoader for StaticLoader {
    fn load(&self, url: &Url) -> Result<LoadedPage> {
        if url.scheme() == "file" {
            return load_file(url);
        }
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| NetworkError::NotFound(url.to_string()).into())
    }
}

/// Network loader backed by a blocking reqwest client
pub struct HttpLoader {
    client: reqwest::blocking::Client,
}

impl HttpLoader {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("Framescope/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NetworkError::Request {
                url: String::new(),
                reason: format!("failed to create client: {}", e),
            })?;
        Ok(Self { client })
    }
}

impl FrameLoader for HttpLoader {
    fn load(&self, url: &Url) -> Result<LoadedPage> {
        match url.scheme() {
            "file" => return load_file(url),
            "http" | "https" => {}
            other => {
                return Err(NetworkError::Request {
                    url: url.to_string(),
                    reason: format!("unsupported scheme {}", other),
                }
                .into());
            }
        }

        let request_failed = |e: reqwest::Error| NetworkError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url.clone()).send().map_err(request_failed)?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let set_cookies = response
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let html = response.text().map_err(request_failed)?;

        log::debug!("fetched {} ({} bytes, status {})", final_url, html.len(), status);
        Ok(LoadedPage {
            url: final_url,
            status,
            html,
            set_cookies,
        })
    }
}

fn load_file(url: &Url) -> Result<LoadedPage> {
    let path = url
        .to_file_path()
        .map_err(|_| NetworkError::NotFound(url.to_string()))?;
    let html = std::fs::read_to_string(&path)?;
    Ok(LoadedPage::new(url.clone(), html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FramescopeError;
    use std::io::Write;

    #[test]
    fn test_static_loader() {
        let loader = StaticLoader::new()
            .with_page("https://example.com/", "<p>hi</p>")
            .unwrap();
        let page = loader.load(&Url::parse("https://example.com").unwrap()).unwrap();
        assert_eq!(page.html, "<p>hi</p>");
        assert_eq!(page.status, 200);

        let err = loader
            .load(&Url::parse("https://example.com/missing").unwrap())
            .unwrap_err();
        assert!(matches!(err, FramescopeError::Network(NetworkError::NotFound(_))));
    }

    #[test]
    fn test_file_urls_read_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        write!(file, "<h1>local</h1>").unwrap();
        let url = Url::from_file_path(file.path()).unwrap();
        let page = StaticLoader::new().load(&url).unwrap();
        assert_eq!(page.html, "<h1>local</h1>");
    }

    #[test]
    fn test_http_loader_rejects_other_schemes() {
        let loader = HttpLoader::new().unwrap();
        let err = loader.load(&Url::parse("ftp://example.com/").unwrap()).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme ftp"));
    }
}
