//! YouTube static thumbnails

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use registry::Registered;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::*;
use crate::models::*;
use crate::traits::{AttemptContext, Found, Strategy};

/// Best quality first; `maxresdefault` is missing for many older uploads
const VARIANTS: [&str; 5] = [
    "maxresdefault",
    "sddefault",
    "hqdefault",
    "mqdefault",
    "default",
];

/// Static thumbnail built from the video id
#[derive(Registered)]
#[strategy(name = "youtube_static", platform = "youtube")]
pub struct YoutubeStatic {}

impl YoutubeStatic {
    fn variant_url(base: &str, id: &str, variant: &str) -> std::result::Result<Url, Failure> {
        let raw = format!("{}/vi/{id}/{variant}.jpg", base.trim_end_matches('/'));
        Url::parse(&raw).map_err(|e| Failure::parse(format!("bad thumbnail url {raw}: {e}")))
    }
}

#[async_trait]
impl Strategy for YoutubeStatic {
    async fn attempt(
        &self,
        _target: &UrlTarget,
        ctx: &AttemptContext,
    ) -> std::result::Result<Found, Failure> {
        let id = ctx.platform.video_id.as_deref().ok_or_else(|| {
            Failure::new(FailureReason::UnsupportedPlatform, "no youtube video id")
        })?;
        let base = &ctx.config.endpoints.youtube_thumbnail_base;

        let mut last = None;
        for variant in VARIANTS {
            let url = Self::variant_url(base, id, variant)?;
            match ctx.download_image(&url, format!("static {variant}.jpg")).await {
                Ok(found) => return Ok(found),
                Err(failure) => {
                    debug!(variant, %failure, "variant unavailable");
                    last = Some(failure);
                }
            }
        }

        Err(last.unwrap_or_else(|| Failure::parse("no thumbnail variant available")))
    }
}
