//! Bounded http retrieval shared by every strategy

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use futures::StreamExt;
use reqwest::header::ACCEPT;
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, instrument};
use url::Url;

use crate::config::Config;
use crate::error::*;
use crate::validator::{self, ImageMeta};

const PAGE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/png,image/jpeg,image/*;q=0.8,*/*;q=0.5";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Page,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Network(String),
    #[error("http status {0}")]
    Status(u16),
    #[error("response exceeds {limit} bytes")]
    SizeExceeded { limit: usize },
}

impl From<FetchError> for Failure {
    fn from(e: FetchError) -> Self {
        let reason = match e {
            FetchError::Timeout => FailureReason::FetchTimeout,
            FetchError::Network(_) => FailureReason::FetchNetworkError,
            FetchError::Status(_) => FailureReason::FetchStatusError,
            FetchError::SizeExceeded { .. } => FailureReason::FetchSizeExceeded,
        };
        Failure::new(reason, e.to_string())
    }
}

/// Retrieved body
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Final url after redirects
    pub url: Url,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl Fetched {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Http client with per-kind timeouts and byte caps
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    page_timeout: Duration,
    image_timeout: Duration,
    max_page_bytes: usize,
    max_image_bytes: usize,
    probe_bytes: usize,
    /// Shared by clones, so one permit is one open request
    connections: Arc<Semaphore>,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .connect_timeout(config.page_timeout().min(config.image_timeout()));
        for (host, addr) in &config.host_overrides {
            builder = builder.resolve(host, *addr);
        }

        Ok(Self {
            client: builder.build()?,
            page_timeout: config.page_timeout(),
            image_timeout: config.image_timeout(),
            max_page_bytes: config.max_page_bytes,
            max_image_bytes: config.max_image_bytes,
            probe_bytes: config.probe_bytes,
            connections: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    fn bounds(&self, kind: FetchKind) -> (Duration, usize) {
        match kind {
            FetchKind::Page => (self.page_timeout, self.max_page_bytes),
            FetchKind::Image => (self.image_timeout, self.max_image_bytes),
        }
    }

    /// Fetch a whole body within the timeout and byte cap of `kind`
    #[instrument(level = "debug", skip(self, url), fields(url = %url))]
    pub async fn fetch(
        &self,
        url: &Url,
        kind: FetchKind,
    ) -> std::result::Result<Fetched, FetchError> {
        let (timeout, limit) = self.bounds(kind);
        let fetched = tokio::time::timeout(timeout, async {
            // never closed, so acquiring only waits
            let _permit = self.connections.acquire().await.ok();
            let response = self.send(url, kind).await?;
            let final_url = response.url().clone();
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let bytes = read_capped(response, limit).await?;
            Ok::<_, FetchError>(Fetched {
                url: final_url,
                bytes,
                content_type,
            })
        })
        .await
        .map_err(|_| FetchError::Timeout)??;

        debug!(bytes = fetched.bytes.len(), "fetched");
        Ok(fetched)
    }

    /// Read only as much of an image as needed to learn its dimensions
    #[instrument(level = "debug", skip(self, url), fields(url = %url))]
    pub async fn probe_dimensions(&self, url: &Url) -> std::result::Result<ImageMeta, Failure> {
        let timeout = self.image_timeout;
        tokio::time::timeout(timeout, async {
            let _permit = self.connections.acquire().await.ok();
            let response = self.send(url, FetchKind::Image).await?;
            let mut stream = response.bytes_stream();
            let mut head = Vec::new();
            while let Some(chunk) = stream.next().await {
                head.extend_from_slice(&chunk.map_err(map_transport)?);
                if let Ok(meta) = validator::peek_dimensions(&head) {
                    return Ok::<_, Failure>(meta);
                }
                if head.len() >= self.probe_bytes {
                    break;
                }
            }
            // dropping the stream abandons the rest of the body
            validator::peek_dimensions(&head).map_err(Failure::from)
        })
        .await
        .map_err(|_| Failure::from(FetchError::Timeout))?
    }

    async fn send(
        &self,
        url: &Url,
        kind: FetchKind,
    ) -> std::result::Result<reqwest::Response, FetchError> {
        let accept = match kind {
            FetchKind::Page => PAGE_ACCEPT,
            FetchKind::Image => IMAGE_ACCEPT,
        };
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

async fn read_capped(
    response: reqwest::Response,
    limit: usize,
) -> std::result::Result<Vec<u8>, FetchError> {
    if let Some(len) = response.content_length()
        && len > limit as u64
    {
        return Err(FetchError::SizeExceeded { limit });
    }

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_transport)?;
        if body.len() + chunk.len() > limit {
            return Err(FetchError::SizeExceeded { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Normalize transport errors, keeping the innermost cause as detail
fn map_transport(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        return FetchError::Timeout;
    }
    if let Some(status) = e.status() {
        return FetchError::Status(status.as_u16());
    }
    if e.is_redirect() {
        return FetchError::Network("too many redirects".to_string());
    }

    let mut detail = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        detail = format!("{detail}: {cause}");
        source = cause.source();
    }
    FetchError::Network(detail)
}
