//! HTTP Content Backend
//!
//! [`ContentApi`] over the Hal's Hotline REST server.
//!
//! # Endpoints
//!
//! - `GET /articles`, `/podcasts`, `/products`, `/businesses`, `/feed`, `/hotline`
//! - `POST /hotline` - new voice message
//! - `POST /podcasts/{id}/play` - play-count increment
//!
//! Requests are never retried; failures are logged and returned.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::traits::{ContentApi, PlayCountSink};
use super::types::{
    Article, Business, FeedItem, HotlineEntry, HotlineSubmission, Podcast, Product,
};
use crate::config::{ClientConfig, DEFAULT_API_URL};
use crate::error::ApiError;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// REST client
#[derive(Clone, Debug)]
pub struct HttpContentApi {
    /// Base URL without trailing slash (`http://host:3000/api`)
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpContentApi {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "HTTP client builder failed, using defaults");
                reqwest::Client::new()
            });

        Self {
            base_url,
            http_client,
        }
    }

    /// Create from loaded configuration
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.api_base_url.clone(), config.request_timeout)
    }

    /// Base URL requests are issued against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|source| Self::log(ApiError::Network { url: url.clone(), source }))?;

        let body = Self::check_status(&url, response)?
            .bytes()
            .await
            .map_err(|source| Self::log(ApiError::Network { url: url.clone(), source }))?;

        serde_json::from_slice(&body).map_err(|e| {
            Self::log(ApiError::Decode {
                url,
                reason: e.to_string(),
            })
        })
    }

    async fn post_json<B: serde::Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST");

        let mut request = self.http_client.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| Self::log(ApiError::Network { url: url.clone(), source }))?;

        Self::check_status(&url, response).map(|_| ())
    }

    fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(Self::log(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }))
        }
    }

    fn log(error: ApiError) -> ApiError {
        tracing::error!(error = %error, "Content request failed");
        error
    }
}

impl Default for HttpContentApi {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT)
    }
}

#[async_trait]
impl PlayCountSink for HttpContentApi {
    async fn record_play(&self, podcast_id: u64) -> Result<(), ApiError> {
        self.post_json::<()>(&format!("/podcasts/{podcast_id}/play"), None)
            .await
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn articles(&self) -> Result<Vec<Article>, ApiError> {
        self.get_json("/articles").await
    }

    async fn podcasts(&self) -> Result<Vec<Podcast>, ApiError> {
        self.get_json("/podcasts").await
    }

    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("/products").await
    }

    async fn businesses(&self) -> Result<Vec<Business>, ApiError> {
        self.get_json("/businesses").await
    }

    async fn feed(&self) -> Result<Vec<FeedItem>, ApiError> {
        self.get_json("/feed").await
    }

    async fn hotline_history(&self) -> Result<Vec<HotlineEntry>, ApiError> {
        self.get_json("/hotline").await
    }

    async fn submit_hotline(&self, submission: &HotlineSubmission) -> Result<(), ApiError> {
        self.post_json("/hotline", Some(submission)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the request head
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (format!("http://{addr}/api"), handle)
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpContentApi::new("http://localhost:3000/api/", Duration::from_secs(5));
        assert_eq!(api.base_url(), "http://localhost:3000/api");
        assert_eq!(api.url("/podcasts"), "http://localhost:3000/api/podcasts");
    }

    #[tokio::test]
    async fn test_podcasts_decoded() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"id":1,"title":"Ep 1","description":"d","host":"Hal","audioUrl":"/a.mp3","duration":"10:00","createdAt":"2026-01-01"}]"#,
        )
        .await;

        let api = HttpContentApi::new(base, Duration::from_secs(5));
        let podcasts = api.podcasts().await.unwrap();
        assert_eq!(podcasts.len(), 1);
        assert_eq!(podcasts[0].host, "Hal");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/podcasts "));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let (base, _server) = serve_once("500 Internal Server Error", "{}").await;

        let api = HttpContentApi::new(base, Duration::from_secs(5));
        let err = api.articles().await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_body_not_an_array() {
        let (base, _server) = serve_once("200 OK", r#"{"error":"nope"}"#).await;

        let api = HttpContentApi::new(base, Duration::from_secs(5));
        let err = api.businesses().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_record_play_posts_to_podcast() {
        let (base, server) = serve_once("200 OK", "{}").await;

        let api = HttpContentApi::new(base, Duration::from_secs(5));
        api.record_play(42).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/podcasts/42/play "));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpContentApi::new(format!("http://{addr}/api"), Duration::from_secs(5));
        let err = api.feed().await.unwrap_err();
        assert!(err.is_transport());
    }
}
