//! Shared page document

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static META_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").unwrap());

static SCRIPT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("script[type]").unwrap());

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

static BASE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("base[href]").unwrap());

/// `<meta>` attributes relevant to preview images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    pub property: Option<String>,
    pub name: Option<String>,
    pub content: Option<String>,
}

impl MetaTag {
    fn is(value: &Option<String>, key: &str) -> bool {
        value
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(key))
    }

    pub fn has_property(&self, key: &str) -> bool {
        Self::is(&self.property, key)
    }

    pub fn has_name(&self, key: &str) -> bool {
        Self::is(&self.name, key)
    }
}

/// `<img>` reference in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub src: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Fetched page reduced to what the generic strategies read
///
/// Parsed once per run and shared read-only between strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    /// Final page url after redirects
    pub url: Url,
    /// Base for relative references, `<base href>` when present
    pub base: Url,
    pub metas: Vec<MetaTag>,
    /// Raw bodies of `application/ld+json` scripts
    pub structured_data: Vec<String>,
    pub images: Vec<InlineImage>,
}

impl PageDocument {
    pub fn parse(url: Url, content: &str) -> Self {
        let document = Html::parse_document(content);

        let base = document
            .select(&BASE_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| url.join(href.trim()).ok())
            .unwrap_or_else(|| url.clone());

        let metas = document
            .select(&META_SELECTOR)
            .map(|el| MetaTag {
                property: attr(&el, "property"),
                name: attr(&el, "name"),
                content: attr(&el, "content"),
            })
            .collect();

        let structured_data = document
            .select(&SCRIPT_SELECTOR)
            .filter(|el| {
                el.value()
                    .attr("type")
                    .and_then(|t| t.split(';').next())
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
            })
            .map(|el| el.text().collect::<String>())
            .filter(|body| !body.trim().is_empty())
            .collect();

        let images = document
            .select(&IMG_SELECTOR)
            .filter_map(|el| {
                let src = attr(&el, "src").or_else(|| attr(&el, "data-src"))?;
                Some(InlineImage {
                    src,
                    width: attr(&el, "width").and_then(|w| parse_dimension(&w)),
                    height: attr(&el, "height").and_then(|h| parse_dimension(&h)),
                })
            })
            .collect();

        Self {
            url,
            base,
            metas,
            structured_data,
            images,
        }
    }

    /// Content of the first meta tag matching `pred`, in source order
    pub fn meta_content(&self, pred: impl Fn(&MetaTag) -> bool) -> Option<&str> {
        self.metas
            .iter()
            .filter(|m| pred(m))
            .find_map(|m| m.content.as_deref())
    }

    /// Resolve a possibly relative reference against the page
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        let reference = reference.trim();
        if reference.is_empty() || reference.starts_with("data:") {
            return None;
        }
        self.base
            .join(reference)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
    }
}

fn attr(el: &ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `"640"`, `"640px"`
fn parse_dimension(value: &str) -> Option<u32> {
    value
        .trim()
        .trim_end_matches("px")
        .trim()
        .parse::<u32>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(content: &str) -> PageDocument {
        PageDocument::parse(Url::parse("https://example.com/articles/post").unwrap(), content)
    }

    #[test]
    fn test_collects_metas_scripts_images() {
        let doc = page(
            r#"
            <html><head>
                <meta property="og:image" content=" /cover.jpg ">
                <meta name="twitter:image" content="https://cdn.example.com/card.png">
                <meta charset="utf-8">
                <script type="application/ld+json">{"image": "a.png"}</script>
                <script type="text/javascript">var x = 1;</script>
                <script type="application/ld+json; charset=utf-8">[]</script>
            </head><body>
                <img src="one.png" width="640px" height="360">
                <img data-src="lazy.png">
                <img alt="no source">
            </body></html>"#,
        );

        assert_eq!(doc.metas.len(), 3);
        assert_eq!(
            doc.meta_content(|m| m.has_property("og:image")),
            Some("/cover.jpg")
        );
        assert_eq!(doc.structured_data.len(), 2);
        assert_eq!(
            doc.images,
            vec![
                InlineImage {
                    src: "one.png".into(),
                    width: Some(640),
                    height: Some(360),
                },
                InlineImage {
                    src: "lazy.png".into(),
                    width: None,
                    height: None,
                },
            ]
        );
    }

    #[test]
    fn test_resolve() {
        let doc = page("<html></html>");
        assert_eq!(
            doc.resolve("/cover.jpg").unwrap().as_str(),
            "https://example.com/cover.jpg"
        );
        assert_eq!(
            doc.resolve("img/a.png").unwrap().as_str(),
            "https://example.com/articles/img/a.png"
        );
        assert_eq!(
            doc.resolve("//cdn.example.com/x.png").unwrap().as_str(),
            "https://cdn.example.com/x.png"
        );
        assert!(doc.resolve("data:image/png;base64,AAAA").is_none());
        assert!(doc.resolve("javascript:void(0)").is_none());
    }

    #[test]
    fn test_base_href() {
        let doc = page(
            r#"<html><head><base href="https://static.example.net/assets/"></head></html>"#,
        );
        assert_eq!(
            doc.resolve("a.png").unwrap().as_str(),
            "https://static.example.net/assets/a.png"
        );
    }

    #[test]
    fn test_tolerates_malformed_html() {
        let doc = page(
            r#"<html><head><meta property="og:image" content="x.jpg">
               <body><div><p><img src="y.png"></div></span>"#,
        );
        assert_eq!(doc.meta_content(|m| m.has_property("og:image")), Some("x.jpg"));
        assert_eq!(doc.images.len(), 1);
    }
}
