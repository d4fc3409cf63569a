//! Access to the remote store's list/rename/move API.
//!
//! [`RemoteStore`] is the seam the scanner and the orchestrator talk to;
//! [`PanClient`] is the HTTP implementation. Reads retry on transient
//! failures, writes never do.

pub mod envelope;
pub mod http;
pub mod retry;

use async_trait::async_trait;

use crate::error::Error;
use crate::model::RemoteNode;

pub use http::PanClient;
pub use retry::RetryPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<RemoteNode>,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_children(&self, directory_id: &str) -> Result<Listing, Error>;

    async fn rename(&self, id: &str, new_name: &str) -> Result<(), Error>;

    /// Relocate every id in one call. The call succeeds or fails as a whole.
    async fn move_files(&self, ids: &[String], destination_id: &str) -> Result<(), Error>;
}

/// Session cookie. Only cookies carrying a `ctoken` are accepted.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn from_cookie(cookie: &str) -> Option<Self> {
        let cookie = cookie.trim();
        let has_token = cookie
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(key, value)| key == "ctoken" && !value.is_empty());
        has_token.then(|| Credential(cookie.to_string()))
    }

    pub fn header_value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
