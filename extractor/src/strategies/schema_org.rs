//! Schema.org JSON-LD images

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use registry::Registered;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::*;
use crate::models::*;
use crate::traits::{AttemptContext, Found, Strategy};

/// Nesting followed below each block root
const MAX_DEPTH: usize = 8;

/// Fields holding an image reference inside `ImageObject`
const IMAGE_OBJECT_FIELDS: [&str; 3] = ["url", "contentUrl", "thumbnailUrl"];

#[derive(Registered)]
#[strategy(name = "schema_org")]
pub struct SchemaOrg {}

impl SchemaOrg {
    /// Image references of every block, in discovery order
    fn candidates(blocks: &[String]) -> std::result::Result<Vec<String>, Failure> {
        if blocks.is_empty() {
            return Err(Failure::parse("no structured data blocks"));
        }

        let mut out = Vec::new();
        let mut last_error = None;
        let mut parsed = 0;
        for block in blocks {
            match serde_json::from_str::<Value>(block.trim()) {
                Ok(value) => {
                    parsed += 1;
                    collect(&value, 0, &mut out);
                }
                Err(e) => {
                    debug!(error = %e, "skipping malformed json-ld block");
                    last_error = Some(e);
                }
            }
        }

        if parsed == 0
            && let Some(e) = last_error
        {
            return Err(Failure::parse(format!("malformed structured data: {e}")));
        }
        if out.is_empty() {
            return Err(Failure::parse("no image in structured data"));
        }
        Ok(out)
    }
}

fn collect(value: &Value, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect(item, depth + 1, out)),
        Value::Object(map) => {
            if let Some(image) = map.get("image") {
                image_refs(image, out);
            }
            if has_type(map, "VideoObject")
                && let Some(thumbnail) = map.get("thumbnailUrl")
            {
                image_refs(thumbnail, out);
            }
            if has_type(map, "ImageObject") {
                for field in IMAGE_OBJECT_FIELDS {
                    if let Some(v) = map.get(field) {
                        image_refs(v, out);
                    }
                }
            }
            if let Some(graph) = map.get("@graph") {
                collect(graph, depth + 1, out);
            }
            // entities nested under other keys, e.g. `video` or `mainEntity`, in document order
            for (key, nested) in map {
                if key != "@graph" && (nested.is_object() || nested.is_array()) {
                    collect(nested, depth + 1, out);
                }
            }
        }
        _ => {}
    }
}

/// `"a.jpg"`, `["a.jpg", ...]` or `{"url": "a.jpg"}`
fn image_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
        Value::Array(items) => items.iter().for_each(|item| image_refs(item, out)),
        Value::Object(map) => {
            for field in IMAGE_OBJECT_FIELDS {
                if let Some(Value::String(s)) = map.get(field)
                    && !s.trim().is_empty()
                {
                    out.push(s.trim().to_string());
                }
            }
        }
        _ => {}
    }
}

fn has_type(map: &Map<String, Value>, name: &str) -> bool {
    match map.get("@type") {
        Some(Value::String(t)) => t == name,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(name)),
        _ => false,
    }
}

#[async_trait]
impl Strategy for SchemaOrg {
    async fn attempt(
        &self,
        _target: &UrlTarget,
        ctx: &AttemptContext,
    ) -> std::result::Result<Found, Failure> {
        let page = ctx.page()?;
        let candidates = Self::candidates(&page.structured_data)?;
        let url = candidates
            .iter()
            .find_map(|c| page.resolve(c))
            .ok_or_else(|| Failure::parse("no resolvable image in structured data"))?;

        ctx.download_image(&url, "script[type=application/ld+json]").await
    }
}
