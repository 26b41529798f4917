//! Loading prior messages for a session.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::Url;
use tracing::debug;

use crate::error::ChatError;
use crate::protocol::{HistoryRecord, InboundMessage};

/// Where the client gets the backlog for a freshly opened session.
///
/// The returned future is spawned onto the runtime, so it must own everything
/// it needs.
pub trait HistorySource {
    fn fetch(&self, session_id: &str) -> HistoryFuture;
}

pub type HistoryFuture = BoxFuture<'static, Result<Vec<InboundMessage>, ChatError>>;

/// Configuration for [`HttpHistory`].
#[derive(Debug, Clone)]
pub struct HttpHistoryConfig {
    /// Base URL of the site (e.g. `http://127.0.0.1:5000`).
    pub base_url: String,
    /// TCP connection timeout.
    pub connect_timeout: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl HttpHistoryConfig {
    /// - connect_timeout: 3 s
    /// - request_timeout: 10 s
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// `GET {base_url}/api/chat/messages/{session_id}` over reqwest.
#[derive(Debug, Clone)]
pub struct HttpHistory {
    config: HttpHistoryConfig,
    client: reqwest::Client,
}

impl HttpHistory {
    pub fn builder(base_url: impl Into<String>) -> HttpHistoryBuilder {
        HttpHistoryBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Full URL of the history endpoint for `session_id`.
    ///
    /// The id is appended as a single percent-encoded path segment, so `/`,
    /// `?` and `#` inside it stay part of the id.
    pub fn messages_url(&self, session_id: &str) -> Result<Url, ChatError> {
        let base = &self.config.base_url;
        let mut url = Url::parse(base).map_err(|e| ChatError::Connect {
            url: base.clone(),
            detail: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|()| ChatError::Connect {
                url: base.clone(),
                detail: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(["api", "chat", "messages", session_id]);
        Ok(url)
    }
}

impl HistorySource for HttpHistory {
    fn fetch(&self, session_id: &str) -> HistoryFuture {
        let target = self.messages_url(session_id);
        let client = self.client.clone();
        async move {
            let target = target?;
            let url = target.to_string();
            debug!(url = %url, "fetching chat history");
            let resp = client.get(target).send().await.map_err(|e| ChatError::Connect {
                url: url.clone(),
                detail: e.to_string(),
            })?;

            if !resp.status().is_success() {
                return Err(ChatError::Http {
                    status: resp.status().as_u16(),
                    url,
                });
            }

            let bytes = resp.bytes().await.map_err(|e| ChatError::Connect {
                url: url.clone(),
                detail: e.to_string(),
            })?;

            let records: Vec<HistoryRecord> =
                serde_json::from_slice(&bytes).map_err(|e| ChatError::decode("history body", e))?;
            Ok(records.into_iter().map(InboundMessage::from).collect())
        }
        .boxed()
    }
}

/// Builder for [`HttpHistory`].
pub struct HttpHistoryBuilder {
    config: HttpHistoryConfig,
}

impl HttpHistoryBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: HttpHistoryConfig::new(base_url),
        }
    }

    /// Override the TCP connect timeout (default 3 s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Override the per-request timeout (default 10 s).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> HttpHistory {
        // reqwest::Client::builder() can fail in extreme environments;
        // fall back to a default client instead of panicking.
        let client = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout)
            .build()
            .unwrap_or_default();

        HttpHistory {
            config: self.config,
            client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let h = HttpHistory::builder("http://127.0.0.1:5000").build();
        assert_eq!(h.base_url(), "http://127.0.0.1:5000");
        assert_eq!(h.config.connect_timeout, Duration::from_secs(3));
        assert_eq!(h.config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_overrides_timeouts() {
        let h = HttpHistory::builder("http://x")
            .connect_timeout(Duration::from_millis(250))
            .request_timeout(Duration::from_secs(2))
            .build();
        assert_eq!(h.config.connect_timeout, Duration::from_millis(250));
        assert_eq!(h.config.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_messages_url() {
        let h = HttpHistory::builder("http://127.0.0.1:5000").build();
        assert_eq!(
            h.messages_url("ord-42").unwrap().as_str(),
            "http://127.0.0.1:5000/api/chat/messages/ord-42"
        );
    }

    #[test]
    fn test_messages_url_trims_trailing_slash() {
        let h = HttpHistory::builder("http://127.0.0.1:5000/").build();
        assert_eq!(
            h.messages_url("7").unwrap().as_str(),
            "http://127.0.0.1:5000/api/chat/messages/7"
        );
    }

    #[test]
    fn test_messages_url_keeps_reserved_characters_in_one_segment() {
        let h = HttpHistory::builder("http://127.0.0.1:5000").build();
        let url = h.messages_url("ord#42").unwrap();
        assert_eq!(url.path(), "/api/chat/messages/ord%2342");
        assert!(url.fragment().is_none());
        assert_eq!(
            h.messages_url("a/b?c").unwrap().path(),
            "/api/chat/messages/a%2Fb%3Fc"
        );
    }

    #[test]
    fn test_messages_url_keeps_base_path_prefix() {
        let h = HttpHistory::builder("http://127.0.0.1:5000/shop/").build();
        assert_eq!(
            h.messages_url("7").unwrap().path(),
            "/shop/api/chat/messages/7"
        );
    }

    #[test]
    fn test_messages_url_rejects_unparseable_base() {
        let h = HttpHistory::builder("not a url").build();
        assert!(matches!(h.messages_url("7"), Err(ChatError::Connect { .. })));
    }
}
