//! Acquisition target and its classification

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::constants::MIN_URL_LEN;
use crate::error::*;

/// Parsed input url, immutable for the whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlTarget {
    pub raw: String,
    pub url: Url,
    /// Lowercased host
    pub host: String,
}

impl UrlTarget {
    /// Parse user input, adding `https://` when no scheme is given
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        if raw.len() < MIN_URL_LEN {
            return Err(Error::InvalidUrl(format!("too short: {raw:?}")));
        }

        let has_scheme = raw
            .split_once("://")
            .is_some_and(|(scheme, _)| !scheme.is_empty() && !scheme.contains(['/', '.', '?']));
        let normalized = if has_scheme {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };

        let url = Url::parse(&normalized).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme {}: {raw}",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidUrl(format!("missing host: {raw}")))?
            .to_lowercase();

        Ok(Self {
            raw: raw.to_string(),
            url,
            host,
        })
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    /// Non-empty path segments
    pub fn segments(&self) -> Vec<&str> {
        self.url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default()
    }

    /// First value of a query parameter
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Host with port, as shown in the report
    pub fn domain(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{port}", self.host),
            None => self.host.clone(),
        }
    }
}

/// Known host platforms
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Vimeo,
    Dailymotion,
    Facebook,
    Instagram,
    Twitter,
    #[default]
    Generic,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Vimeo => "vimeo",
            Platform::Dailymotion => "dailymotion",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Generic => "generic",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "youtube" => Ok(Platform::Youtube),
            "vimeo" => Ok(Platform::Vimeo),
            "dailymotion" => Ok(Platform::Dailymotion),
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "twitter" | "x" => Ok(Platform::Twitter),
            "generic" => Ok(Platform::Generic),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Classification of a target
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformMatch {
    pub platform: Platform,
    /// Native video id, absent when it could not be extracted
    pub video_id: Option<String>,
}

impl PlatformMatch {
    pub fn generic() -> Self {
        Self::default()
    }

    pub fn new(platform: Platform, video_id: Option<String>) -> Self {
        Self { platform, video_id }
    }

    /// Platform strategies for `tag` may run: platform matches and an id is known
    pub fn supports(&self, tag: &str) -> bool {
        self.platform.as_str() == tag && self.video_id.is_some()
    }
}

impl fmt::Display for PlatformMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.video_id {
            Some(id) => write!(f, "{} ({id})", self.platform),
            None => write!(f, "{}", self.platform),
        }
    }
}

/// Strategy family, platform strategies are ordered first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Platform,
    Generic,
}
