//! OpenGraph `og:image`

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
use crate::traits::{AttemptContext, Found, Strategy};

/// First `og:image` in source order
#[derive(Registered)]
#[strategy(name = "opengraph")]
pub struct OpenGraph {}

#[async_trait]
impl Strategy for OpenGraph {
    async fn attempt(
        &self,
        _target: &UrlTarget,
        ctx: &AttemptContext,
    ) -> std::result::Result<Found, Failure> {
        let page = ctx.page()?;
        let content = page
            .meta_content(|m| m.has_property("og:image"))
            .ok_or_else(|| Failure::parse("no og:image meta tag"))?;
        let url = page
            .resolve(content)
            .ok_or_else(|| Failure::parse(format!("unresolvable og:image {content:?}")))?;

        ctx.download_image(&url, "meta[property=og:image]").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_first_og_image_wins() {
        let server = MockServer::start_async().await;
        let first = server
            .mock_async(|when, then| {
                when.path("/img/cover.jpg");
                then.status(200).body(jpeg(200, 100));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.path("/img/large.jpg");
                then.status(200).body(jpeg(1200, 600));
            })
            .await;

        let html = r#"<html><head>
            <meta property="og:title" content="Post">
            <meta property="og:image" content="/img/cover.jpg">
            <meta property="og:image" content="/img/large.jpg">
        </head></html>"#;
        let dir = tempfile::tempdir().unwrap();
        let ctx = page_context(config(&server.base_url(), dir.path()), &server.url("/post"), html);
        let found = OpenGraph {}
            .attempt(&target(&server.url("/post")), &ctx)
            .await
            .unwrap();

        assert_eq!(found.image_url, server.url("/img/cover.jpg"));
        assert_eq!(found.source, "meta[property=og:image]");
        first.assert_async().await;
        second.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_missing_tag() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = page_context(
            config("http://127.0.0.1:1", dir.path()),
            "https://example.com/",
            r#"<html><head><meta name="twitter:image" content="x.png"></head></html>"#,
        );
        let failure = OpenGraph {}
            .attempt(&target("https://example.com/"), &ctx)
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::ParseError);
        assert_eq!(failure.detail, "no og:image meta tag");
    }

    #[tokio::test]
    async fn test_tag_found_but_image_missing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/gone.jpg");
                then.status(404);
            })
            .await;

        let html = r#"<meta property="og:image" content="/gone.jpg">"#;
        let dir = tempfile::tempdir().unwrap();
        let ctx = page_context(config(&server.base_url(), dir.path()), &server.url("/"), html);
        let failure = OpenGraph {}
            .attempt(&target(&server.url("/")), &ctx)
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::FetchStatusError);
    }

    #[tokio::test]
    async fn test_page_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let config = config("http://127.0.0.1:1", dir.path());
        let page = Failure::new(FailureReason::FetchNetworkError, "connection refused");
        let ctx =
            context(config, PlatformMatch::generic()).with_page(std::sync::Arc::new(Err(page)));
        let failure = OpenGraph {}
            .attempt(&target("https://example.com/"), &ctx)
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::FetchNetworkError);
    }
}
