//! Acquisition report

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::{Family, PlatformMatch, UrlTarget};
use crate::error::*;
use crate::validator::{ImageFormat, ImageMeta};

const BANNER_WIDTH: usize = 60;

/// Image persisted for a successful strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedThumbnail {
    /// Content-derived key, also the file stem
    pub key: String,
    pub strategy: String,
    pub path: PathBuf,
    pub size: u64,
    pub format: ImageFormat,
}

/// Successful attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acquired {
    pub image_url: String,
    pub source: String,
    pub meta: ImageMeta,
    pub thumbnail: SavedThumbnail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyStatus {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for StrategyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyStatus::Success => f.write_str("✅ Success"),
            StrategyStatus::Failed => f.write_str("❌ Failed"),
            StrategyStatus::Skipped => f.write_str("⏭ Skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StrategyOutcome {
    Success(Acquired),
    Failed(Failure),
    Skipped { reason: FailureReason },
}

/// Outcome of one registered strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub name: String,
    pub family: Family,
    pub outcome: StrategyOutcome,
}

impl StrategyResult {
    pub fn success(name: &str, family: Family, acquired: Acquired) -> Self {
        Self {
            name: name.to_string(),
            family,
            outcome: StrategyOutcome::Success(acquired),
        }
    }

    pub fn failed(name: &str, family: Family, failure: Failure) -> Self {
        Self {
            name: name.to_string(),
            family,
            outcome: StrategyOutcome::Failed(failure),
        }
    }

    pub fn skipped(name: &str, family: Family) -> Self {
        Self {
            name: name.to_string(),
            family,
            outcome: StrategyOutcome::Skipped {
                reason: FailureReason::UnsupportedPlatform,
            },
        }
    }

    pub fn status(&self) -> StrategyStatus {
        match self.outcome {
            StrategyOutcome::Success(_) => StrategyStatus::Success,
            StrategyOutcome::Failed(_) => StrategyStatus::Failed,
            StrategyOutcome::Skipped { .. } => StrategyStatus::Skipped,
        }
    }

    /// Failure reason for failed and skipped results
    pub fn reason(&self) -> Option<FailureReason> {
        match &self.outcome {
            StrategyOutcome::Success(_) => None,
            StrategyOutcome::Failed(failure) => Some(failure.reason),
            StrategyOutcome::Skipped { reason } => Some(*reason),
        }
    }

    pub fn thumbnail(&self) -> Option<&SavedThumbnail> {
        match &self.outcome {
            StrategyOutcome::Success(acquired) => Some(&acquired.thumbnail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    /// Strategies actually attempted (not skipped)
    pub methods_tested: usize,
    pub successful: usize,
    pub thumbnails_generated: usize,
}

/// Which saved thumbnail the caller keeps when several strategies succeed
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// First success in registry order
    #[default]
    RegistryOrder,
    /// First success among the named strategies, then registry order
    Preferred(Vec<String>),
}

/// Full record of one acquisition run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionReport {
    pub url: String,
    pub domain: String,
    pub platform: PlatformMatch,
    /// One entry per registered strategy, in registry order
    pub results: Vec<StrategyResult>,
    pub thumbnails: Vec<SavedThumbnail>,
    pub counts: ReportCounts,
}

impl AcquisitionReport {
    pub fn new(target: &UrlTarget, platform: PlatformMatch, results: Vec<StrategyResult>) -> Self {
        let thumbnails: Vec<SavedThumbnail> =
            results.iter().filter_map(|r| r.thumbnail().cloned()).collect();
        let counts = ReportCounts {
            methods_tested: results
                .iter()
                .filter(|r| r.status() != StrategyStatus::Skipped)
                .count(),
            successful: results
                .iter()
                .filter(|r| r.status() == StrategyStatus::Success)
                .count(),
            thumbnails_generated: thumbnails.len(),
        };

        Self {
            url: target.url.to_string(),
            domain: target.domain(),
            platform,
            results,
            thumbnails,
            counts,
        }
    }

    pub fn successful_methods(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|r| r.status() == StrategyStatus::Success)
            .map(|r| r.name.as_str())
    }

    pub fn result(&self, name: &str) -> Option<&StrategyResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn is_success(&self) -> bool {
        self.counts.successful > 0
    }

    /// Pick the thumbnail to keep
    pub fn select(&self, policy: &SelectionPolicy) -> Option<&SavedThumbnail> {
        if let SelectionPolicy::Preferred(names) = policy {
            for name in names {
                if let Some(thumbnail) = self.result(name).and_then(StrategyResult::thumbnail) {
                    return Some(thumbnail);
                }
            }
        }
        self.thumbnails.first()
    }
}

impl fmt::Display for AcquisitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let banner = "=".repeat(BANNER_WIDTH);
        writeln!(f, "{banner}")?;
        writeln!(f, "URL Thumbnail Results for: {}", self.url)?;
        writeln!(f, "{banner}")?;
        writeln!(f)?;
        writeln!(f, "Domain: {}", self.domain)?;
        writeln!(f, "Platform: {}", self.platform)?;
        writeln!(f, "Methods tested: {}", self.counts.methods_tested)?;
        writeln!(f, "Successful methods: {}", self.counts.successful)?;
        writeln!(f, "Thumbnails generated: {}", self.counts.thumbnails_generated)?;

        if self.is_success() {
            writeln!(f)?;
            writeln!(f, "Successful methods:")?;
            for name in self.successful_methods() {
                writeln!(f, "  - {name}")?;
            }
            writeln!(f)?;
            writeln!(f, "Generated thumbnails:")?;
            for thumbnail in &self.thumbnails {
                writeln!(f, "  - {}: {}", thumbnail.strategy, thumbnail.path.display())?;
            }
        } else {
            writeln!(f)?;
            writeln!(f, "No successful methods found.")?;
        }

        writeln!(f)?;
        writeln!(f, "Detailed Method Results:")?;
        writeln!(f, "{}", "-".repeat(BANNER_WIDTH))?;
        for result in &self.results {
            match &result.outcome {
                StrategyOutcome::Success(acquired) => {
                    writeln!(f, "  {}: {} ({})", result.name, result.status(), acquired.source)?
                }
                StrategyOutcome::Failed(failure) => {
                    writeln!(f, "  {}: {} ({failure})", result.name, result.status())?
                }
                StrategyOutcome::Skipped { reason } => {
                    writeln!(f, "  {}: {} ({reason})", result.name, result.status())?
                }
            }
        }
        writeln!(f, "{banner}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;

    fn acquired(strategy: &str, key: &str) -> Acquired {
        Acquired {
            image_url: format!("https://img.example.com/{key}.png"),
            source: "test".into(),
            meta: ImageMeta {
                format: ImageFormat::Png,
                width: 640,
                height: 360,
            },
            thumbnail: SavedThumbnail {
                key: format!("{key}_{strategy}"),
                strategy: strategy.into(),
                path: PathBuf::from(format!("/tmp/{key}_{strategy}.png")),
                size: 42,
                format: ImageFormat::Png,
            },
        }
    }

    fn report() -> AcquisitionReport {
        let target = UrlTarget::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        let platform = PlatformMatch::new(Platform::Youtube, Some("dQw4w9WgXcQ".into()));
        let results = vec![
            StrategyResult::success(
                "youtube_static",
                Family::Platform,
                acquired("youtube_static", "aa"),
            ),
            StrategyResult::skipped("vimeo_oembed", Family::Platform),
            StrategyResult::failed(
                "opengraph",
                Family::Generic,
                Failure::parse("no og:image meta tag"),
            ),
            StrategyResult::success(
                "twitter_card",
                Family::Generic,
                acquired("twitter_card", "bb"),
            ),
        ];
        AcquisitionReport::new(&target, platform, results)
    }

    #[test]
    fn test_counts() {
        let report = report();
        assert_eq!(
            report.counts,
            ReportCounts {
                methods_tested: 3,
                successful: 2,
                thumbnails_generated: 2,
            }
        );
        assert_eq!(
            report.successful_methods().collect::<Vec<_>>(),
            vec!["youtube_static", "twitter_card"]
        );
    }

    #[test]
    fn test_select() {
        let report = report();
        assert_eq!(
            report.select(&SelectionPolicy::RegistryOrder).unwrap().strategy,
            "youtube_static"
        );
        let preferred = SelectionPolicy::Preferred(vec!["opengraph".into(), "twitter_card".into()]);
        assert_eq!(report.select(&preferred).unwrap().strategy, "twitter_card");
        let missing = SelectionPolicy::Preferred(vec!["schema_org".into()]);
        assert_eq!(report.select(&missing).unwrap().strategy, "youtube_static");
    }

    #[test]
    fn test_render() {
        let text = report().to_string();
        assert!(text.starts_with(&"=".repeat(BANNER_WIDTH)));
        assert!(text.contains("Domain: www.youtube.com"));
        assert!(text.contains("Methods tested: 3"));
        assert!(text.contains("  - youtube_static: /tmp/aa_youtube_static.png"));
        assert!(text.contains("  vimeo_oembed: ⏭ Skipped (unsupported platform)"));
        assert!(text.contains("  opengraph: ❌ Failed (parse error: no og:image meta tag)"));
        assert!(text.trim_end().ends_with(&"=".repeat(BANNER_WIDTH)));
    }

    #[test]
    fn test_render_without_success() {
        let target = UrlTarget::parse("https://example.com").unwrap();
        let results = vec![StrategyResult::failed(
            "opengraph",
            Family::Generic,
            Failure::new(FailureReason::FetchNetworkError, "connection refused"),
        )];
        let report = AcquisitionReport::new(&target, PlatformMatch::generic(), results);
        let text = report.to_string();
        assert!(text.contains("Successful methods: 0"));
        assert!(text.contains("No successful methods found."));
        assert!(report.select(&SelectionPolicy::default()).is_none());
    }
}
