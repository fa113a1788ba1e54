//! Multi-strategy thumbnail acquisition

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

pub mod classifier;
pub mod config;
mod factory;
pub mod fetch;
pub mod models;
pub mod orchestrator;
pub mod storage;
pub mod strategies;
mod traits;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::classify;
pub use config::Config;
pub use factory::{Registry, RegistryItem};
pub use orchestrator::{Acquirer, acquire};
pub use traits::{AttemptContext, Found, Strategy};

pub(crate) mod constants {
    //! Constants

    /// Browser-like user agent, some hosts refuse obvious bots
    pub const DEFAULT_USER_AGENT: &str = concat!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
        "AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
    );

    /// Shortest input accepted as a url ("h://x")
    pub const MIN_URL_LEN: usize = 5;
}

pub mod error {
    //! Error types

    use serde::{Deserialize, Serialize};
    use std::fmt;

    pub type Result<T> = std::result::Result<T, Error>;

    /// Hard failure of a whole acquisition run
    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("invalid url: {0}")]
        InvalidUrl(String),
        #[error("invalid configuration: {0}")]
        Config(String),
        #[error("http client error: {0}")]
        Client(#[from] reqwest::Error),
        #[error("io error: {0}")]
        Io(#[from] std::io::Error),
    }

    /// Why a strategy did not produce a thumbnail
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FailureReason {
        UnsupportedPlatform,
        FetchTimeout,
        FetchNetworkError,
        FetchStatusError,
        FetchSizeExceeded,
        ParseError,
        InvalidImage,
        StorageError,
        Aborted,
    }

    impl fmt::Display for FailureReason {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let text = match self {
                FailureReason::UnsupportedPlatform => "unsupported platform",
                FailureReason::FetchTimeout => "timeout",
                FailureReason::FetchNetworkError => "network error",
                FailureReason::FetchStatusError => "http status error",
                FailureReason::FetchSizeExceeded => "size limit exceeded",
                FailureReason::ParseError => "parse error",
                FailureReason::InvalidImage => "invalid image",
                FailureReason::StorageError => "storage error",
                FailureReason::Aborted => "aborted",
            };
            f.write_str(text)
        }
    }

    /// Failure of one strategy step
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
    #[error("{reason}: {detail}")]
    pub struct Failure {
        pub reason: FailureReason,
        pub detail: String,
    }

    impl Failure {
        pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
            Self {
                reason,
                detail: detail.into(),
            }
        }

        pub fn parse(detail: impl Into<String>) -> Self {
            Self::new(FailureReason::ParseError, detail)
        }

        pub fn timeout(detail: impl Into<String>) -> Self {
            Self::new(FailureReason::FetchTimeout, detail)
        }
    }
}
