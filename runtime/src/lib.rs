//! Host-side support for thumbnail acquisition

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::path::{Path, PathBuf};

use extractor::Config;
use extractor::error;
use extractor::models::{AcquisitionReport, Platform, SelectionPolicy};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Acquire(#[from] error::Error),
}

/// Fields the bot stores for a linked video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRecord {
    pub path_or_url: String,
    pub platform: Platform,
    pub video_id: Option<String>,
    /// Chosen thumbnail, absent when every strategy failed
    pub thumbnail_path: Option<PathBuf>,
}

/// Output handed back to the caller after `acquire`
#[derive(Debug, Serialize)]
pub struct AcquireOutput {
    pub success: bool,
    pub error: Option<String>,
    pub record: Option<VideoRecord>,
    pub report: Option<AcquisitionReport>,
}

impl AcquireOutput {
    /// Build the record, keeping the thumbnail `policy` picks
    pub fn new(res: error::Result<AcquisitionReport>, policy: &SelectionPolicy) -> Self {
        match res {
            Ok(report) => {
                let record = VideoRecord {
                    path_or_url: report.url.clone(),
                    platform: report.platform.platform,
                    video_id: report.platform.video_id.clone(),
                    thumbnail_path: report.select(policy).map(|t| t.path.clone()),
                };
                AcquireOutput {
                    // zero successes is an expected outcome, not an error
                    success: report.is_success(),
                    error: None,
                    record: Some(record),
                    report: Some(report),
                }
            }
            Err(e) => AcquireOutput {
                success: false,
                error: Some(e.to_string()),
                record: None,
                report: None,
            },
        }
    }
}

impl From<error::Result<AcquisitionReport>> for AcquireOutput {
    fn from(res: error::Result<AcquisitionReport>) -> Self {
        Self::new(res, &SelectionPolicy::default())
    }
}

/// Read a TOML config, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<Config, RuntimeError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let content = std::fs::read_to_string(path).map_err(|source| RuntimeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Shrink the overall deadline, pulling the inner timeouts below it
pub fn with_deadline(mut config: Config, secs: u64) -> Config {
    config.deadline_ms = secs.saturating_mul(1_000);
    if config.strategy_timeout_ms >= config.deadline_ms {
        config.strategy_timeout_ms = config.deadline_ms * 3 / 4;
    }
    config.page_timeout_ms = config.page_timeout_ms.min(config.strategy_timeout_ms);
    config.image_timeout_ms = config.image_timeout_ms.min(config.strategy_timeout_ms);
    config
}
