//! Dailymotion oEmbed

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use registry::Registered;

use async_trait::async_trait;

use crate::error::*;
use crate::models::*;
use crate::strategies::oembed;
use crate::traits::{AttemptContext, Found, Strategy};

#[derive(Registered)]
#[strategy(name = "dailymotion_oembed", platform = "dailymotion")]
pub struct DailymotionOembed {}

#[async_trait]
impl Strategy for DailymotionOembed {
    async fn attempt(
        &self,
        _target: &UrlTarget,
        ctx: &AttemptContext,
    ) -> std::result::Result<Found, Failure> {
        let id = ctx.platform.video_id.as_deref().ok_or_else(|| {
            Failure::new(FailureReason::UnsupportedPlatform, "no dailymotion video id")
        })?;
        let video = format!("https://www.dailymotion.com/video/{id}");
        oembed::thumbnail(
            ctx,
            &ctx.config.endpoints.dailymotion_oembed,
            &[("url", &video), ("format", "json")],
        )
        .await
    }
}
