use futures::stream::{self, StreamExt};

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{AggregatorConfig, RunResult};
use crate::social::PluginRegistry;

/// Max aggregator configs fetched at once by [`Aggregator::run_all`].
const MAX_CONCURRENT_RUNS: usize = 4;

/// Runs stored aggregator configs: fetch, normalize, upsert.
pub struct Aggregator<'a> {
    registry: &'a PluginRegistry,
    repository: &'a Repository,
}

impl<'a> Aggregator<'a> {
    pub fn new(registry: &'a PluginRegistry, repository: &'a Repository) -> Self {
        Self {
            registry,
            repository,
        }
    }

    /// Runs one config to completion.
    ///
    /// Connector setup, authentication and the provider query are all-or-nothing
    /// and come back as `Err`. Anything that goes wrong with a single post is
    /// logged and counted in the returned [`RunResult`] instead.
    pub async fn run(&self, config: &AggregatorConfig) -> Result<RunResult> {
        let mut source = self.registry.connector(config.social_plugin)?;
        tracing::debug!("Running {} against {}", config.slug, source.plugin());
        source.connect().await?;
        let normalized = source.collect(&config.query).await?;

        let mut result = RunResult::default();
        for item in normalized {
            let record = match item {
                Ok(Some(record)) => record,
                Ok(None) => {
                    result.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Skipping post from {}: {}", config.slug, e);
                    result.failed += 1;
                    continue;
                }
            };

            let slug = record.slug.clone();
            match self
                .repository
                .upsert_resource(
                    record,
                    config.social_plugin.as_str(),
                    &config.query,
                    &config.feed_ids,
                )
                .await
            {
                Ok(outcome) => result.record(outcome),
                Err(AppError::UniquenessConflict(msg)) => {
                    tracing::warn!("Skipping {}: {}", slug, msg);
                    result.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to store {}: {}", slug, e);
                    result.failed += 1;
                }
            }
        }

        tracing::info!(
            "Aggregator {}: {} created, {} refreshed, {} unchanged, {} skipped, {} failed",
            config.slug,
            result.created,
            result.refreshed,
            result.unchanged,
            result.skipped,
            result.failed
        );
        Ok(result)
    }

    /// Runs several configs concurrently. One config failing does not affect
    /// the others; results come back in completion order.
    pub async fn run_all(
        &self,
        configs: Vec<AggregatorConfig>,
    ) -> Vec<(AggregatorConfig, Result<RunResult>)> {
        stream::iter(configs)
            .map(|config| async move {
                let result = self.run(&config).await;
                if let Err(e) = &result {
                    tracing::warn!("Aggregator {} failed: {}", config.slug, e);
                }
                (config, result)
            })
            .buffer_unordered(MAX_CONCURRENT_RUNS)
            .collect()
            .await
    }
}
