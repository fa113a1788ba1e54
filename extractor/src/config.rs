//! Acquisition configuration

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_USER_AGENT;
use crate::error::*;

/// Public platform endpoints, overridable for mirrors and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Static thumbnails live under `<base>/vi/<id>/<variant>.jpg`
    pub youtube_thumbnail_base: String,
    pub vimeo_oembed: String,
    pub dailymotion_oembed: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            youtube_thumbnail_base: "https://img.youtube.com".to_string(),
            vimeo_oembed: "https://vimeo.com/api/oembed.json".to_string(),
            dailymotion_oembed: "https://www.dailymotion.com/services/oembed".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    pub user_agent: String,
    /// Budget of the whole run
    pub deadline_ms: u64,
    /// Budget of a single strategy, strictly below `deadline_ms`
    pub strategy_timeout_ms: u64,
    pub page_timeout_ms: u64,
    pub image_timeout_ms: u64,
    pub max_page_bytes: usize,
    pub max_image_bytes: usize,
    /// Bytes read at most when probing image dimensions
    pub probe_bytes: usize,
    pub max_redirects: usize,
    /// Strategies running at the same time
    pub worker_limit: usize,
    /// Http requests open at the same time, across all strategies
    pub max_connections: usize,
    /// Smallest accepted width and height
    pub min_image_dimension: u32,
    pub max_image_candidates: usize,
    pub endpoints: Endpoints,
    /// Pin hosts to fixed addresses, bypassing DNS
    pub host_overrides: BTreeMap<String, SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("thumbnails"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            deadline_ms: 30_000,
            strategy_timeout_ms: 20_000,
            page_timeout_ms: 10_000,
            image_timeout_ms: 10_000,
            max_page_bytes: 5 * 1024 * 1024,
            max_image_bytes: 10 * 1024 * 1024,
            probe_bytes: 64 * 1024,
            max_redirects: 5,
            worker_limit: 4,
            max_connections: 8,
            min_image_dimension: 16,
            max_image_candidates: 20,
            endpoints: Endpoints::default(),
            host_overrides: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.strategy_timeout_ms >= self.deadline_ms {
            return Err(Error::Config(format!(
                "strategy timeout ({}ms) must be shorter than the deadline ({}ms)",
                self.strategy_timeout_ms, self.deadline_ms
            )));
        }
        if self.page_timeout_ms > self.strategy_timeout_ms
            || self.image_timeout_ms > self.strategy_timeout_ms
        {
            return Err(Error::Config(
                "page and image timeouts must not exceed the strategy timeout".to_string(),
            ));
        }
        if self.page_timeout_ms == 0 || self.image_timeout_ms == 0 {
            return Err(Error::Config("timeouts must be non-zero".to_string()));
        }
        if self.worker_limit == 0 {
            return Err(Error::Config("worker limit must be at least 1".to_string()));
        }
        if self.max_connections == 0 {
            return Err(Error::Config("connection limit must be at least 1".to_string()));
        }
        if self.max_page_bytes == 0 || self.max_image_bytes == 0 || self.probe_bytes == 0 {
            return Err(Error::Config("byte caps must be non-zero".to_string()));
        }
        Ok(())
    }
}
