//! oEmbed lookup shared by platform strategies

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::*;
use crate::fetch::FetchKind;
use crate::traits::{AttemptContext, Found};

/// The only oEmbed field we read
#[derive(Debug, Deserialize)]
struct OembedResponse {
    thumbnail_url: Option<String>,
}

/// Ask an oEmbed endpoint for the advertised thumbnail and download it
pub(crate) async fn thumbnail(
    ctx: &AttemptContext,
    endpoint: &str,
    params: &[(&str, &str)],
) -> std::result::Result<Found, Failure> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| Failure::parse(format!("bad oembed endpoint {endpoint}: {e}")))?;
    url.query_pairs_mut().extend_pairs(params);

    let fetched = ctx.fetcher.fetch(&url, FetchKind::Page).await?;
    let response: OembedResponse = serde_json::from_slice(&fetched.bytes)
        .map_err(|e| Failure::parse(format!("malformed oembed response: {e}")))?;

    let thumbnail = response
        .thumbnail_url
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Failure::parse("oembed response has no thumbnail_url"))?;
    let image_url = fetched
        .url
        .join(thumbnail.trim())
        .map_err(|e| Failure::parse(format!("bad thumbnail_url {thumbnail:?}: {e}")))?;

    debug!(%image_url, "oembed thumbnail");
    ctx.download_image(&image_url, "oembed thumbnail_url").await
}
