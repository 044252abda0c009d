//! Static mapping from service names to base URLs.

use std::collections::HashMap;

use vigil_common::ServiceName;

/// Where each known service can be reached
#[derive(Debug, Clone, Default)]
pub struct PeerDirectory {
    peers: HashMap<ServiceName, String>,
}

impl PeerDirectory {
    /// Build from `name -> base URL` pairs. Trailing slashes are dropped.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ServiceName>,
        V: AsRef<str>,
    {
        let peers = entries
            .into_iter()
            .map(|(name, url)| (name.into(), url.as_ref().trim_end_matches('/').to_string()))
            .collect();
        Self { peers }
    }

    pub fn base_url(&self, service: &ServiceName) -> Option<&str> {
        self.peers.get(service).map(String::as_str)
    }

    /// Full URL of `path` on `service`, if the service is known
    pub fn endpoint(&self, service: &ServiceName, path: &str) -> Option<String> {
        self.base_url(service).map(|base| format!("{}{}", base, path))
    }

    /// Known service names, sorted
    pub fn names(&self) -> Vec<ServiceName> {
        let mut names: Vec<_> = self.peers.keys().cloned().collect();
        names.sort();
        names
    }
}
