use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, REFERER, USER_AGENT};
use reqwest::RequestBuilder;
use serde_json::json;
use std::fmt;
use tracing::debug;

use crate::config::{ApiConfig, AppConfig};
use crate::error::Error;

use super::envelope::{parse_listing, parse_write_result};
use super::{Credential, Listing, RemoteStore, RetryPolicy};

const ACCEPT_JSON: &str = "application/json, text/plain, */*";

pub struct PanClient {
    http: reqwest::Client,
    api: ApiConfig,
    retry: RetryPolicy,
    credential: Option<Credential>,
}

impl fmt::Debug for PanClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanClient")
            .field("list_endpoint", &self.api.list_endpoint)
            .field("retry", &self.retry)
            .field("has_credential", &self.credential.is_some())
            .finish()
    }
}

impl PanClient {
    /// A client without a usable cookie can be built; each call then fails
    /// with [`Error::MissingCredential`] before touching the network.
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            api: config.api.clone(),
            retry: RetryPolicy::from(&config.retry),
            credential: Credential::from_cookie(&config.cookie),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn credential(&self) -> Result<&Credential, Error> {
        self.credential.as_ref().ok_or(Error::MissingCredential)
    }

    fn with_headers(&self, request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        request
            .header(ACCEPT, ACCEPT_JSON)
            .header(COOKIE, credential.header_value())
            .header(REFERER, &self.api.referer)
            .header(USER_AGENT, &self.api.user_agent)
    }

    fn write_query(&self) -> [(&'static str, &str); 3] {
        [
            ("pr", self.api.pr.as_str()),
            ("fr", self.api.fr.as_str()),
            ("uc_param_str", ""),
        ]
    }

    async fn list_once(&self, directory_id: &str, credential: &Credential) -> Result<Listing, Error> {
        let page_size = self.api.page_size.to_string();
        let request = self
            .http
            .get(&self.api.list_endpoint)
            .query(&[
                ("pdir_fid", directory_id),
                ("_size", page_size.as_str()),
                ("_sort", self.api.sort.as_str()),
                ("pr", self.api.pr.as_str()),
                ("fr", self.api.fr.as_str()),
            ])
            .timeout(self.api.list_timeout());

        let response = self.with_headers(request, credential).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(status.as_u16()));
        }
        let text = response.text().await?;
        parse_listing(&text, directory_id)
    }

    async fn post_write(
        &self,
        endpoint: &str,
        body: serde_json::Value,
        credential: &Credential,
    ) -> Result<(), Error> {
        let request = self
            .http
            .post(endpoint)
            .query(&self.write_query())
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .timeout(self.api.write_timeout());

        let response = self.with_headers(request, credential).send().await?;
        let status = response.status();
        let text = response.text().await?;
        match parse_write_result(&text) {
            Err(Error::MalformedResponse(_)) if !status.is_success() => {
                Err(Error::HttpStatus(status.as_u16()))
            }
            result => result,
        }
    }
}

#[async_trait]
impl RemoteStore for PanClient {
    async fn list_children(&self, directory_id: &str) -> Result<Listing, Error> {
        let credential = self.credential()?;
        debug!("Listing directory {}", directory_id);
        let label = format!("Listing {}", directory_id);
        self.retry
            .run(&label, || self.list_once(directory_id, credential))
            .await
    }

    async fn rename(&self, id: &str, new_name: &str) -> Result<(), Error> {
        let credential = self.credential()?;
        debug!("Renaming {} to {}", id, new_name);
        let body = json!({ "fid": id, "file_name": new_name });
        self.post_write(&self.api.rename_endpoint, body, credential)
            .await
    }

    async fn move_files(&self, ids: &[String], destination_id: &str) -> Result<(), Error> {
        let credential = self.credential()?;
        debug!("Moving {} files to {}", ids.len(), destination_id);
        let body = json!({
            "action": "move",
            "filelist": ids,
            "to_pdir_fid": destination_id,
        });
        self.post_write(&self.api.move_endpoint, body, credential)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn unreachable_config(cookie: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.cookie = cookie.to_string();
        config.api.list_endpoint = "http://127.0.0.1:9/list".to_string();
        config.api.rename_endpoint = "http://127.0.0.1:9/rename".to_string();
        config.api.move_endpoint = "http://127.0.0.1:9/move".to_string();
        config
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_request() {
        let client = PanClient::new(&unreachable_config("")).unwrap();
        assert!(matches!(
            client.list_children("abc").await,
            Err(Error::MissingCredential)
        ));
        assert!(matches!(
            client.rename("abc", "1-a.mp4").await,
            Err(Error::MissingCredential)
        ));
        assert!(matches!(
            client.move_files(&["abc".to_string()], "dest").await,
            Err(Error::MissingCredential)
        ));
    }

    /// Accepts connections on a local port and drops them unanswered,
    /// counting each one.
    fn closing_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(stream);
            }
        });
        (base, accepted)
    }

    fn closing_config(base: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.cookie = "ctoken=t".to_string();
        config.api.list_endpoint = format!("{}/list", base);
        config.api.rename_endpoint = format!("{}/rename", base);
        config.api.move_endpoint = format!("{}/move", base);
        config
    }

    fn fast_client(base: &str) -> PanClient {
        PanClient::new(&closing_config(base))
            .unwrap()
            .with_retry(RetryPolicy {
                base_delay: Duration::from_millis(5),
                ..RetryPolicy::default()
            })
    }

    #[tokio::test]
    async fn rename_is_sent_once() {
        let (base, accepted) = closing_server();
        let client = fast_client(&base);

        let err = client.rename("abc", "1-a.mp4").await.unwrap_err();

        assert!(err.is_transient(), "unexpected {:?}", err);
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn move_is_sent_once() {
        let (base, accepted) = closing_server();
        let client = fast_client(&base);

        let err = client
            .move_files(&["abc".to_string(), "def".to_string()], "dest-folder-1")
            .await
            .unwrap_err();

        assert!(err.is_transient(), "unexpected {:?}", err);
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn listing_is_retried_three_times() {
        let (base, accepted) = closing_server();
        let client = fast_client(&base);

        let err = client.list_children("abc").await.unwrap_err();

        assert!(err.is_transient(), "unexpected {:?}", err);
        assert_eq!(accepted.load(Ordering::SeqCst), 4);
    }
}
