//! Test fixtures

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use url::Url;

use crate::config::{Config, Endpoints};
use crate::fetch::Fetcher;
use crate::models::*;
use crate::strategies::page::PageDocument;
use crate::traits::AttemptContext;

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    // gradient so the encoded body is not trivially small
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, format)
        .unwrap();
    out.into_inner()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

/// Short timeouts and every platform endpoint pointed at `base`
pub fn config(base: &str, output_dir: &Path) -> Config {
    Config {
        output_dir: output_dir.to_path_buf(),
        deadline_ms: 5_000,
        strategy_timeout_ms: 4_000,
        page_timeout_ms: 2_000,
        image_timeout_ms: 2_000,
        min_image_dimension: 16,
        endpoints: Endpoints {
            youtube_thumbnail_base: base.to_string(),
            vimeo_oembed: format!("{base}/api/oembed.json"),
            dailymotion_oembed: format!("{base}/services/oembed"),
        },
        ..Config::default()
    }
}

pub fn context(config: Config, platform: PlatformMatch) -> AttemptContext {
    let fetcher = Fetcher::new(&config).unwrap();
    AttemptContext::new(fetcher, Arc::new(config), platform)
}

/// Generic-strategy context over an already fetched page
pub fn page_context(config: Config, page_url: &str, html: &str) -> AttemptContext {
    let page = PageDocument::parse(Url::parse(page_url).unwrap(), html);
    context(config, PlatformMatch::generic()).with_page(Arc::new(Ok(page)))
}

pub fn target(url: &str) -> UrlTarget {
    UrlTarget::parse(url).unwrap()
}
