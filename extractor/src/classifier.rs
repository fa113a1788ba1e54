//! Url classifier

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::*;

// 11 character youtube id
static YOUTUBE_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

// dailymotion ids may carry a `_slug` suffix
static DAILYMOTION_ID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z0-9]+)").unwrap());

static DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

// instagram shortcodes
static SHORTCODE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

struct PlatformRule {
    platform: Platform,
    domains: &'static [&'static str],
    extract_id: fn(&UrlTarget) -> Option<String>,
}

static RULES: &[PlatformRule] = &[
    PlatformRule {
        platform: Platform::Youtube,
        domains: &["youtube.com", "youtu.be", "youtube-nocookie.com"],
        extract_id: youtube_id,
    },
    PlatformRule {
        platform: Platform::Vimeo,
        domains: &["vimeo.com"],
        extract_id: vimeo_id,
    },
    PlatformRule {
        platform: Platform::Dailymotion,
        domains: &["dailymotion.com", "dai.ly"],
        extract_id: dailymotion_id,
    },
    PlatformRule {
        platform: Platform::Facebook,
        domains: &["facebook.com", "fb.com", "fb.watch"],
        extract_id: facebook_id,
    },
    PlatformRule {
        platform: Platform::Instagram,
        domains: &["instagram.com", "instagr.am"],
        extract_id: instagram_id,
    },
    PlatformRule {
        platform: Platform::Twitter,
        domains: &["twitter.com", "x.com"],
        extract_id: twitter_id,
    },
];

/// Classify a target by host, extracting the native video id when possible
///
/// Never fails: unknown hosts are `generic`, a known host without a
/// recognizable id keeps its platform tag with no id.
pub fn classify(target: &UrlTarget) -> PlatformMatch {
    for rule in RULES {
        if host_matches(&target.host, rule.domains) {
            return PlatformMatch::new(rule.platform, (rule.extract_id)(target));
        }
    }
    PlatformMatch::generic()
}

/// Exact or dot-suffix match
fn host_matches(host: &str, domains: &[&str]) -> bool {
    let host = host.trim_end_matches('.');
    domains.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

fn segment_after<'a>(segments: &[&'a str], marker: &str) -> Option<&'a str> {
    segments
        .iter()
        .position(|s| *s == marker)
        .and_then(|i| segments.get(i + 1))
        .copied()
}

fn youtube_id(target: &UrlTarget) -> Option<String> {
    let segments = target.segments();
    let candidate = if target.host.ends_with("youtu.be") {
        segments.first().map(|s| s.to_string())
    } else if segments.first() == Some(&"watch") {
        target.query_param("v")
    } else {
        ["embed", "shorts", "v", "live"]
            .iter()
            .find_map(|marker| segment_after(&segments, marker))
            .map(str::to_string)
    };
    candidate.filter(|id| YOUTUBE_ID_REGEX.is_match(id))
}

fn vimeo_id(target: &UrlTarget) -> Option<String> {
    target
        .segments()
        .into_iter()
        .find(|s| DIGITS_REGEX.is_match(s))
        .map(str::to_string)
}

fn dailymotion_id(target: &UrlTarget) -> Option<String> {
    let segments = target.segments();
    let raw = if target.host.ends_with("dai.ly") {
        segments.first().copied()
    } else {
        segment_after(&segments, "video")
    }?;
    DAILYMOTION_ID_REGEX
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn facebook_id(target: &UrlTarget) -> Option<String> {
    let segments = target.segments();
    if target.host.ends_with("fb.watch") {
        return segments.first().map(|s| s.to_string());
    }
    if segments.first() == Some(&"watch") {
        return target.query_param("v").filter(|v| DIGITS_REGEX.is_match(v));
    }
    segment_after(&segments, "videos")
        .filter(|s| DIGITS_REGEX.is_match(s))
        .map(str::to_string)
}

fn instagram_id(target: &UrlTarget) -> Option<String> {
    let segments = target.segments();
    ["p", "tv", "reel"]
        .iter()
        .find_map(|marker| segment_after(&segments, marker))
        .filter(|s| SHORTCODE_REGEX.is_match(s))
        .map(str::to_string)
}

fn twitter_id(target: &UrlTarget) -> Option<String> {
    segment_after(&target.segments(), "status")
        .filter(|s| DIGITS_REGEX.is_match(s))
        .map(str::to_string)
}
