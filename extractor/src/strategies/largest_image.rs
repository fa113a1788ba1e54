//! Largest inline image fallback

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use registry::Registered;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::debug;
use url::Url;

use crate::error::*;
use crate::models::*;
use crate::strategies::page::PageDocument;
use crate::traits::{AttemptContext, Found, Strategy};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    url: Url,
    /// Declared `width`/`height` attributes
    declared: Option<(u32, u32)>,
}

/// Inline image with the greatest pixel area
///
/// Dimensions come from a partial read of each candidate. Declared
/// attributes only stand in when the image was served but its header
/// could not be read. A candidate that cannot be fetched is dropped.
#[derive(Registered)]
#[strategy(name = "largest_image")]
pub struct LargestImage {}

impl LargestImage {
    /// Resolved, de-duplicated `<img>` references in document order
    fn candidates(page: &PageDocument, limit: usize) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = Vec::new();
        for img in &page.images {
            let Some(url) = page.resolve(&img.src) else {
                continue;
            };
            if url.path().to_ascii_lowercase().ends_with(".svg")
                || out.iter().any(|c| c.url == url)
            {
                continue;
            }
            out.push(Candidate {
                url,
                declared: img.width.zip(img.height),
            });
            if out.len() >= limit {
                break;
            }
        }
        out
    }

    /// Index of the largest area, first one on ties
    fn pick(areas: &[Option<u64>]) -> Option<usize> {
        let mut best: Option<(usize, u64)> = None;
        for (i, area) in areas.iter().enumerate() {
            if let Some(area) = *area
                && best.is_none_or(|(_, b)| area > b)
            {
                best = Some((i, area));
            }
        }
        best.map(|(i, _)| i)
    }
}

#[async_trait]
impl Strategy for LargestImage {
    async fn attempt(
        &self,
        _target: &UrlTarget,
        ctx: &AttemptContext,
    ) -> std::result::Result<Found, Failure> {
        let page = ctx.page()?;
        let candidates = Self::candidates(page, ctx.config.max_image_candidates);
        if candidates.is_empty() {
            return Err(Failure::parse("no inline images on page"));
        }

        let mut probes = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            probes.push(ctx.fetcher.probe_dimensions(&candidate.url));
        }
        // buffered keeps document order whatever finishes first, the
        // fetcher bounds open connections
        let probes: Vec<_> = stream::iter(probes)
            .buffered(ctx.config.worker_limit)
            .collect()
            .await;

        let mut last_failure = None;
        let areas: Vec<Option<u64>> = candidates
            .iter()
            .zip(probes)
            .map(|(candidate, probe)| match probe {
                Ok(meta) => Some(meta.area()),
                Err(failure) => {
                    debug!(url = %candidate.url, %failure, "dimensions unknown");
                    let served = failure.reason == FailureReason::InvalidImage;
                    last_failure = Some(failure);
                    candidate
                        .declared
                        .filter(|_| served)
                        .map(|(w, h)| u64::from(w) * u64::from(h))
                }
            })
            .collect();

        let Some(index) = Self::pick(&areas) else {
            return Err(last_failure
                .unwrap_or_else(|| Failure::parse("no inline image with known dimensions")));
        };
        let chosen = &candidates[index];
        debug!(url = %chosen.url, area = ?areas[index], of = candidates.len(), "largest image");

        ctx.download_image(&chosen.url, format!("img #{} of {}", index + 1, candidates.len()))
            .await
    }
}
