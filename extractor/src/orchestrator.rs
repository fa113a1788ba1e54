//! Acquisition runs

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::classifier::classify;
use crate::config::Config;
use crate::error::*;
use crate::factory::{Registry, RegistryItem};
use crate::fetch::{FetchKind, Fetcher};
use crate::models::*;
use crate::storage::{FsStore, ThumbnailStore};
use crate::strategies::page::PageDocument;
use crate::traits::AttemptContext;

const DEADLINE_DETAIL: &str = "overall deadline exceeded";

type Page = Arc<std::result::Result<PageDocument, Failure>>;

/// Runs the registry against urls
///
/// Holds no per-run state; one acquirer can serve concurrent runs.
#[derive(Clone)]
pub struct Acquirer {
    registry: Arc<Registry>,
    fetcher: Fetcher,
    store: Arc<dyn ThumbnailStore>,
    config: Arc<Config>,
}

impl Acquirer {
    /// Built-in strategies, files under `config.output_dir`
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(FsStore::new(config.output_dir.clone()));
        Self::with_parts(config, Registry::builtin(), store)
    }

    pub fn with_parts(
        config: Config,
        registry: Registry,
        store: Arc<dyn ThumbnailStore>,
    ) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(&config)?;
        Ok(Self {
            registry: Arc::new(registry),
            fetcher,
            store,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run every applicable strategy and build the report
    ///
    /// Only an unusable url is an error. Every strategy outcome, including
    /// timeouts and storage problems, ends up in the report in registry order.
    #[instrument(skip(self), fields(deadline_ms = self.config.deadline_ms))]
    pub async fn acquire(&self, url: &str) -> Result<AcquisitionReport> {
        let target = Arc::new(UrlTarget::parse(url)?);
        let platform = classify(&target);
        info!(%platform, "classified");

        let deadline = Instant::now() + self.config.deadline();
        let semaphore = Arc::new(Semaphore::new(self.config.worker_limit));
        let ctx = AttemptContext::new(
            self.fetcher.clone(),
            Arc::clone(&self.config),
            platform.clone(),
        );

        let mut slots: Vec<Option<StrategyResult>> = vec![None; self.registry.len()];
        let mut tasks = JoinSet::new();
        let mut generic = Vec::new();

        for (index, item) in self.registry.iter().enumerate() {
            if !item.applies(&platform) {
                debug!(strategy = item.name, "not applicable");
                slots[index] = Some(StrategyResult::skipped(item.name, item.family));
                continue;
            }
            match item.family {
                Family::Platform => {
                    self.spawn(&mut tasks, index, item, &target, ctx.clone(), &semaphore)
                }
                Family::Generic => generic.push((index, item)),
            }
        }

        // platform attempts are already in flight while the page loads
        if !generic.is_empty() {
            let page = self.fetch_page(&target, deadline).await;
            let ctx = ctx.with_page(page);
            for (index, item) in generic {
                self.spawn(&mut tasks, index, item, &target, ctx.clone(), &semaphore);
            }
        }

        let mut deadline_hit = false;
        while !tasks.is_empty() {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, result)))) => slots[index] = Some(result),
                Ok(Some(Err(e))) => warn!(error = %e, "strategy task failed"),
                Ok(None) => break,
                Err(_) => {
                    warn!(pending = tasks.len(), "deadline reached, aborting strategies");
                    tasks.abort_all();
                    deadline_hit = true;
                    break;
                }
            }
        }

        let results: Vec<StrategyResult> = self
            .registry
            .iter()
            .zip(slots)
            .map(|(item, slot)| {
                slot.unwrap_or_else(|| {
                    let failure = if deadline_hit {
                        Failure::timeout(DEADLINE_DETAIL)
                    } else {
                        Failure::new(FailureReason::Aborted, "strategy ended without a result")
                    };
                    StrategyResult::failed(item.name, item.family, failure)
                })
            })
            .collect();

        let report = AcquisitionReport::new(&target, platform, results);
        info!(
            tested = report.counts.methods_tested,
            successful = report.counts.successful,
            thumbnails = report.counts.thumbnails_generated,
            "acquisition finished"
        );
        Ok(report)
    }

    /// Fetch and parse the page once for every generic strategy
    async fn fetch_page(&self, target: &UrlTarget, deadline: Instant) -> Page {
        let fetched = tokio::time::timeout_at(deadline, async {
            self.fetcher.fetch(&target.url, FetchKind::Page).await
        })
        .await;

        let page = match fetched {
            Ok(Ok(fetched)) => {
                debug!(url = %fetched.url, bytes = fetched.bytes.len(), "page fetched");
                Ok(PageDocument::parse(fetched.url.clone(), &fetched.text()))
            }
            Ok(Err(e)) => {
                warn!(error = %e, "page fetch failed");
                Err(Failure::from(e))
            }
            Err(_) => Err(Failure::timeout(DEADLINE_DETAIL)),
        };
        Arc::new(page)
    }

    fn spawn(
        &self,
        tasks: &mut JoinSet<(usize, StrategyResult)>,
        index: usize,
        item: &RegistryItem,
        target: &Arc<UrlTarget>,
        ctx: AttemptContext,
        semaphore: &Arc<Semaphore>,
    ) {
        let strategy = item.create();
        let (name, family) = (item.name, item.family);
        let target = Arc::clone(target);
        let semaphore = Arc::clone(semaphore);
        let store = Arc::clone(&self.store);
        let timeout = self.config.strategy_timeout();

        tasks.spawn(async move {
            // the semaphore is never closed
            let _permit = semaphore.acquire_owned().await.ok();
            let started = Instant::now();

            let attempt = AssertUnwindSafe(strategy.attempt(&target, &ctx)).catch_unwind();
            let attempt = match tokio::time::timeout(timeout, attempt).await {
                Ok(Ok(attempt)) => attempt,
                Ok(Err(panic)) => Err(Failure::new(
                    FailureReason::Aborted,
                    panic_message(&*panic),
                )),
                Err(_) => Err(Failure::timeout(format!(
                    "strategy exceeded {}ms",
                    timeout.as_millis()
                ))),
            };

            let result = match attempt {
                Ok(found) => match store.save(name, &found.bytes, &found.meta).await {
                    Ok(thumbnail) => StrategyResult::success(
                        name,
                        family,
                        Acquired {
                            image_url: found.image_url,
                            source: found.source,
                            meta: found.meta,
                            thumbnail,
                        },
                    ),
                    Err(e) => StrategyResult::failed(name, family, e.into()),
                },
                Err(failure) => StrategyResult::failed(name, family, failure),
            };

            debug!(
                strategy = name,
                status = ?result.status(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "strategy finished"
            );
            (index, result)
        });
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    match panic.downcast_ref::<&str>() {
        Some(msg) => format!("strategy panicked: {msg}"),
        None => match panic.downcast_ref::<String>() {
            Some(msg) => format!("strategy panicked: {msg}"),
            None => "strategy panicked".to_string(),
        },
    }
}

/// One-shot acquisition with the built-in strategies
pub async fn acquire(url: &str, config: Config) -> Result<AcquisitionReport> {
    Acquirer::new(config)?.acquire(url).await
}
