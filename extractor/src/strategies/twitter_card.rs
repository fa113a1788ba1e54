//! Twitter Card `twitter:image`

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
use crate::strategies::page::MetaTag;
use crate::traits::{AttemptContext, Found, Strategy};

// preferred key first
const KEYS: [&str; 2] = ["twitter:image", "twitter:image:src"];

#[derive(Registered)]
#[strategy(name = "twitter_card")]
pub struct TwitterCard {}

impl TwitterCard {
    // publishers mix up `name` and `property`
    fn matches(meta: &MetaTag, key: &str) -> bool {
        meta.has_name(key) || meta.has_property(key)
    }
}

#[async_trait]
impl Strategy for TwitterCard {
    async fn attempt(
        &self,
        _target: &UrlTarget,
        ctx: &AttemptContext,
    ) -> std::result::Result<Found, Failure> {
        let page = ctx.page()?;
        let (key, content) = KEYS
            .iter()
            .find_map(|key| {
                page.meta_content(|m| Self::matches(m, key))
                    .map(|content| (*key, content))
            })
            .ok_or_else(|| Failure::parse("no twitter:image meta tag"))?;
        let url = page
            .resolve(content)
            .ok_or_else(|| Failure::parse(format!("unresolvable {key} {content:?}")))?;

        ctx.download_image(&url, format!("meta[name={key}]")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_prefers_twitter_image_over_src() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/card.png");
                then.status(200).body(png(300, 157));
            })
            .await;

        let html = r#"<head>
            <meta name="twitter:image:src" content="/legacy.png">
            <meta name="twitter:image" content="/card.png">
        </head>"#;
        let dir = tempfile::tempdir().unwrap();
        let ctx = page_context(config(&server.base_url(), dir.path()), &server.url("/"), html);
        let found = TwitterCard {}
            .attempt(&target(&server.url("/")), &ctx)
            .await
            .unwrap();
        assert_eq!(found.image_url, server.url("/card.png"));
        assert_eq!(found.source, "meta[name=twitter:image]");
    }

    #[tokio::test]
    async fn test_src_fallback_and_property_attribute() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/legacy.png");
                then.status(200).body(png(300, 157));
            })
            .await;

        let html = r#"<meta property="twitter:image:src" content="legacy.png">"#;
        let dir = tempfile::tempdir().unwrap();
        let ctx = page_context(config(&server.base_url(), dir.path()), &server.url("/"), html);
        let found = TwitterCard {}
            .attempt(&target(&server.url("/")), &ctx)
            .await
            .unwrap();
        assert_eq!(found.source, "meta[name=twitter:image:src]");
    }

    #[tokio::test]
    async fn test_image_too_small() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/pixel.png");
                then.status(200).body(png(1, 1));
            })
            .await;

        let html = r#"<meta name="twitter:image" content="/pixel.png">"#;
        let dir = tempfile::tempdir().unwrap();
        let ctx = page_context(config(&server.base_url(), dir.path()), &server.url("/"), html);
        let failure = TwitterCard {}
            .attempt(&target(&server.url("/")), &ctx)
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::InvalidImage);
    }
}
