//! Vimeo oEmbed

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
#[strategy(name = "vimeo_oembed", platform = "vimeo")]
pub struct VimeoOembed {}

#[async_trait]
impl Strategy for VimeoOembed {
    async fn attempt(
        &self,
        _target: &UrlTarget,
        ctx: &AttemptContext,
    ) -> std::result::Result<Found, Failure> {
        let id = ctx.platform.video_id.as_deref().ok_or_else(|| {
            Failure::new(FailureReason::UnsupportedPlatform, "no vimeo video id")
        })?;
        let video = format!("https://vimeo.com/{id}");
        oembed::thumbnail(ctx, &ctx.config.endpoints.vimeo_oembed, &[("url", &video)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use httpmock::prelude::*;

    fn vimeo() -> PlatformMatch {
        PlatformMatch::new(Platform::Vimeo, Some("76979871".to_string()))
    }

    #[tokio::test]
    async fn test_thumbnail_url() {
        let server = MockServer::start_async().await;
        let oembed = server
            .mock_async(|when, then| {
                when.path("/api/oembed.json")
                    .query_param("url", "https://vimeo.com/76979871");
                then.status(200).json_body(serde_json::json!({
                    "type": "video",
                    "title": "The New Vimeo Player",
                    "thumbnail_url": "/thumbs/76979871_640.jpg",
                    "thumbnail_width": 640,
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/thumbs/76979871_640.jpg");
                then.status(200).body(jpeg(640, 360));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let ctx = context(config(&server.base_url(), dir.path()), vimeo());
        let found = VimeoOembed {}
            .attempt(&target("https://vimeo.com/76979871"), &ctx)
            .await
            .unwrap();

        oembed.assert_async().await;
        assert_eq!(found.image_url, server.url("/thumbs/76979871_640.jpg"));
        assert_eq!(found.source, "oembed thumbnail_url");
    }

    #[tokio::test]
    async fn test_missing_field_is_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/api/oembed.json");
                then.status(200).json_body(serde_json::json!({"type": "video"}));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let ctx = context(config(&server.base_url(), dir.path()), vimeo());
        let failure = VimeoOembed {}
            .attempt(&target("https://vimeo.com/76979871"), &ctx)
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::ParseError);
    }

    #[tokio::test]
    async fn test_endpoint_status_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/api/oembed.json");
                then.status(403);
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let ctx = context(config(&server.base_url(), dir.path()), vimeo());
        let failure = VimeoOembed {}
            .attempt(&target("https://vimeo.com/76979871"), &ctx)
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::FetchStatusError);
    }
}
