//! Per-origin storage areas
//!
//! Each origin owns a `localStorage` area, a `sessionStorage` area and a
//! cookie string. Handles are cheap clones sharing the same data, so the
//! frame's JavaScript bindings and the Host's storage viewer observe the
//! same state.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};
use url::Url;

/// Which storage area the viewer targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Local,
    Session,
    Cookies,
}

impl StorageKind {
    /// Name as shown in the storage type selector
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Local => "localStorage",
            StorageKind::Session => "sessionStorage",
            StorageKind::Cookies => "cookies",
        }
    }

    /// Parse a selector value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "localStorage" | "local" => Some(Self::Local),
            "sessionStorage" | "session" => Some(Self::Session),
            "cookies" | "cookie" => Some(Self::Cookies),
            _ => None,
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key-value storage area (Web Storage semantics)
#[derive(Debug, Default, Clone)]
pub struct StorageArea {
    data: Arc<Mutex<BTreeMap<String, String>>>,
}

impl StorageArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.data.lock().ok()?.get(key).cloned()
    }

    pub fn set_item(&self, key: &str, value: &str) {
        if let Ok(mut data) = self.data.lock() {
            data.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove_item(&self, key: &str) {
        if let Ok(mut data) = self.data.lock() {
            data.remove(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut data) = self.data.lock() {
            data.clear();
        }
    }

    pub fn length(&self) -> usize {
        self.data.lock().map(|d| d.len()).unwrap_or(0)
    }

    /// Key at position `index` in key order
    pub fn key(&self, index: usize) -> Option<String> {
        self.data.lock().ok()?.keys().nth(index).cloned()
    }

    /// Snapshot of all entries in key order
    pub fn entries(&self) -> Vec<(String, String)> {
        self.data
            .lock()
            .map(|d| d.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

/// The `document.cookie` string of an origin
#[derive(Debug, Default, Clone)]
pub struct CookieJar {
    pairs: Arc<Mutex<Vec<(String, String)>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cookie, replacing one with the same name
    pub fn set(&self, name: &str, value: &str) {
        if let Ok(mut pairs) = self.pairs.lock() {
            match pairs.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => pairs.push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Store the `name=value` part of a `Set-Cookie` header
    pub fn set_from_header(&self, header: &str) {
        let pair = header.split(';').next().unwrap_or_default();
        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                self.set(name, value.trim());
            }
        }
    }

    /// `name=value; name2=value2`
    pub fn cookie_string(&self) -> String {
        self.pairs
            .lock()
            .map(|p| {
                p.iter()
                    .map(|(n, v)| format!("{}={}", n, v))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default()
    }

    /// Entries as the viewer lists them: the cookie string split on `;`
    pub fn entries(&self) -> Vec<(String, String)> {
        parse_cookie_string(&self.cookie_string())
    }

    pub fn len(&self) -> usize {
        self.pairs.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split a cookie string into `(name, value)` pairs
pub fn parse_cookie_string(cookie: &str) -> Vec<(String, String)> {
    cookie
        .split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| match c.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (c.to_string(), String::new()),
        })
        .collect()
}

/// All storage belonging to one origin
#[derive(Debug, Default, Clone)]
pub struct OriginStorage {
    pub local: StorageArea,
    pub session: StorageArea,
    pub cookies: CookieJar,
}

impl OriginStorage {
    /// Entries of one area
    pub fn entries(&self, kind: StorageKind) -> Vec<(String, String)> {
        match kind {
            StorageKind::Local => self.local.entries(),
            StorageKind::Session => self.session.entries(),
            StorageKind::Cookies => self.cookies.entries(),
        }
    }
}

/// Storage for every origin the frame has visited
#[derive(Debug, Default)]
pub struct StorageRegistry {
    origins: HashMap<String, OriginStorage>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage handles for the origin of `url`, created on first use
    pub fn for_url(&mut self, url: &Url) -> OriginStorage {
        self.origins
            .entry(origin_key(url))
            .or_default()
            .clone()
    }

    /// Number of origins with storage
    pub fn origin_count(&self) -> usize {
        self.origins.len()
    }
}

/// Serialized origin used as the storage key
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}
