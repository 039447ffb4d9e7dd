pub mod gateway;

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use http::Extensions;
use log::{debug, log_enabled, trace, warn};
use reqwest::{Client, Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use serde::{de::DeserializeOwned, Deserialize};
use tokio::sync::{Semaphore, SemaphorePermit};

pub use gateway::GatewayClient;

use crate::{
    error::{Error, Result},
    form::NewPublication,
    model::{Comment, Publication},
};

/// The backend calls the feed and comment controllers rely on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedApi: Send + Sync {
    async fn list_publications(&self) -> Result<Vec<Publication>>;
    async fn create_publication(&self, publication: NewPublication) -> Result<Publication>;
    async fn delete_publication(&self, publication_id: &str) -> Result<()>;
    async fn toggle_like(&self, publication_id: &str) -> Result<()>;
    async fn get_comments(&self, publication_id: &str) -> Result<Vec<Comment>>;
    async fn add_comment(&self, publication_id: &str, text: &str) -> Result<()>;
    async fn delete_comment(&self, publication_id: &str, comment_id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    semaphore: Arc<Semaphore>,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, limit: usize) -> Self {
        Self {
            client: Client::new(),
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn client(&self) -> (ClientWithMiddleware, SemaphorePermit<'_>) {
        let semaphore = self
            .semaphore
            .acquire()
            .await
            .expect("request limiter is never closed");
        let client = ClientBuilder::new(self.client.clone())
            .with(RequestLog)
            .build();
        (client, semaphore)
    }
}

/// Logs every request with its status and timing.
struct RequestLog;

#[async_trait]
impl Middleware for RequestLog {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        let now = Instant::now();

        let result = next.run(req, extensions).await;
        match &result {
            Ok(response) => debug!(
                "{} {} -> {} ({} ms)",
                method,
                url,
                response.status(),
                now.elapsed().as_millis()
            ),
            Err(e) => warn!("{} {} failed: {}", method, url, e),
        }
        result
    }
}

#[derive(Deserialize, Debug, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Turn any non-2xx response into `Error::Request`, keeping the server message when it sent one.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let bytes = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .filter(|m| !m.trim().is_empty());
    Err(Error::Request { status, message })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    if log_enabled!(log::Level::Trace) {
        trace!("{}", String::from_utf8_lossy(&bytes));
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Percent-encode one path segment.
fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_without_double_slash() {
        let client = ApiClient::new("http://localhost:3000/", 5);
        assert_eq!(client.url("/publications"), "http://localhost:3000/publications");
    }

    #[test]
    fn encodes_ids() {
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
