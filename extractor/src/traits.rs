//! Strategy traits

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::config::Config;
use crate::error::*;
use crate::fetch::{FetchKind, Fetcher};
use crate::models::*;
use crate::strategies::page::PageDocument;
use crate::validator::{self, ImageMeta};

/// Image located and validated by a strategy, not yet persisted
#[derive(Debug, Clone)]
pub struct Found {
    pub image_url: String,
    /// Where in the source the image came from, e.g. `meta[property=og:image]`
    pub source: String,
    pub meta: ImageMeta,
    pub bytes: Vec<u8>,
}

/// Strategy
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Try to locate a preview image for the target
    async fn attempt(
        &self,
        target: &UrlTarget,
        ctx: &AttemptContext,
    ) -> std::result::Result<Found, Failure>;
}

/// Strategy metadata, implemented by `#[derive(Registered)]`
pub(crate) trait StrategyRegistry: Strategy {
    /// Report key
    fn name() -> &'static str;

    fn family() -> Family;

    /// Whether the strategy runs for this classification
    fn applies(platform: &PlatformMatch) -> bool;

    /// Boxed strategy
    #[allow(clippy::new_ret_no_self)]
    fn new() -> Box<dyn Strategy>;
}

/// Read-only state handed to every attempt of one run
#[derive(Clone)]
pub struct AttemptContext {
    pub fetcher: Fetcher,
    pub config: Arc<Config>,
    pub platform: PlatformMatch,
    page: Option<Arc<std::result::Result<PageDocument, Failure>>>,
}

impl AttemptContext {
    pub fn new(fetcher: Fetcher, config: Arc<Config>, platform: PlatformMatch) -> Self {
        Self {
            fetcher,
            config,
            platform,
            page: None,
        }
    }

    /// Attach the shared page, fetched once per run
    pub fn with_page(mut self, page: Arc<std::result::Result<PageDocument, Failure>>) -> Self {
        self.page = Some(page);
        self
    }

    /// Shared page document, or the failure that prevented fetching it
    pub fn page(&self) -> std::result::Result<&PageDocument, Failure> {
        match self.page.as_deref() {
            Some(Ok(page)) => Ok(page),
            Some(Err(failure)) => Err(failure.clone()),
            None => Err(Failure::parse("page was not fetched for this run")),
        }
    }

    /// Download an image and run it through the validator
    pub async fn download_image(
        &self,
        url: &Url,
        source: impl Into<String>,
    ) -> std::result::Result<Found, Failure> {
        let fetched = self.fetcher.fetch(url, FetchKind::Image).await?;
        let meta = validator::validate(&fetched.bytes, self.config.min_image_dimension)?;
        Ok(Found {
            image_url: url.to_string(),
            source: source.into(),
            meta,
            bytes: fetched.bytes,
        })
    }
}
