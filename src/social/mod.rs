//! Social network connectors.
//!
//! A connector authenticates against one provider and fetches its raw posts;
//! the matching [`Normalizer`] turns those posts into [`CanonicalRecord`]s.
//! Any type implementing both is usable as a [`SocialSource`], which is what
//! the [`PluginRegistry`] hands out to the aggregator.

mod facebook;
#[cfg(test)]
pub(crate) mod mock_graph;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{Config, PluginSettings};
use crate::error::{AppError, Result};
use crate::models::{CanonicalRecord, SocialPlugin};

pub use facebook::FacebookFanpage;

#[async_trait]
pub trait Connector: Send + Sync {
    type Post: Send;

    const PLUGIN: SocialPlugin;

    /// Opens a session with the provider using the application credentials.
    async fn authenticate(&mut self) -> Result<()>;

    /// Runs `query` against the provider and returns its posts in order.
    async fn search(&self, query: &str) -> Result<Vec<Self::Post>>;
}

pub trait Normalizer {
    type Post;

    /// `Ok(None)` means the post is intentionally not surfaced.
    fn normalize(&self, post: Self::Post) -> Result<Option<CanonicalRecord>>;
}

/// Object-safe view of a connector paired with its normalizer.
#[async_trait]
pub trait SocialSource: Send + Sync {
    fn plugin(&self) -> SocialPlugin;

    async fn connect(&mut self) -> Result<()>;

    /// One entry per provider post, in provider order.
    async fn collect(&self, query: &str) -> Result<Vec<Result<Option<CanonicalRecord>>>>;
}

#[async_trait]
impl<T> SocialSource for T
where
    T: Connector + Normalizer<Post = <T as Connector>::Post>,
{
    fn plugin(&self) -> SocialPlugin {
        T::PLUGIN
    }

    async fn connect(&mut self) -> Result<()> {
        self.authenticate().await
    }

    async fn collect(&self, query: &str) -> Result<Vec<Result<Option<CanonicalRecord>>>> {
        let posts = self.search(query).await?;
        Ok(posts.into_iter().map(|post| self.normalize(post)).collect())
    }
}

/// Configured social plugins, built once at start-up.
pub struct PluginRegistry {
    plugins: BTreeMap<SocialPlugin, PluginSettings>,
    client: Client,
}

impl PluginRegistry {
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut plugins = BTreeMap::new();
        for (key, settings) in &config.plugins {
            let plugin: SocialPlugin = key
                .parse()
                .map_err(|_| AppError::Config(format!("unknown plugin in config: {}", key)))?;
            if let Some(api_url) = &settings.api_url {
                url::Url::parse(api_url).map_err(|e| {
                    AppError::Config(format!("invalid api_url for {}: {}", key, e))
                })?;
            }
            plugins.insert(plugin, settings.clone());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("social-aggregator/1.0")
            .build()?;

        Ok(Self { plugins, client })
    }

    /// Plugins with their display names, for editor choices.
    pub fn choices(&self) -> Vec<(SocialPlugin, &str)> {
        self.plugins
            .iter()
            .map(|(plugin, settings)| (*plugin, settings.name.as_str()))
            .collect()
    }

    pub fn contains(&self, plugin: SocialPlugin) -> bool {
        self.plugins.contains_key(&plugin)
    }

    /// A fresh, unauthenticated connector for `plugin`.
    pub fn connector(&self, plugin: SocialPlugin) -> Result<Box<dyn SocialSource>> {
        let settings = self
            .plugins
            .get(&plugin)
            .ok_or_else(|| AppError::UnknownPlugin(plugin.to_string()))?;

        let source: Box<dyn SocialSource> = match plugin {
            SocialPlugin::FacebookFanpage => {
                Box::new(FacebookFanpage::new(self.client.clone(), settings))
            }
        };
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_configured_plugins() {
        let registry = PluginRegistry::from_config(&Config::default()).unwrap();
        let choices = registry.choices();
        assert_eq!(
            choices,
            vec![(SocialPlugin::FacebookFanpage, "Facebook Fanpage")]
        );
        assert!(registry.contains(SocialPlugin::FacebookFanpage));
        let source = registry.connector(SocialPlugin::FacebookFanpage).unwrap();
        assert_eq!(source.plugin(), SocialPlugin::FacebookFanpage);
    }

    #[test]
    fn unconfigured_plugin_has_no_connector() {
        let mut config = Config::default();
        config.plugins.clear();
        let registry = PluginRegistry::from_config(&config).unwrap();
        assert!(!registry.contains(SocialPlugin::FacebookFanpage));
        assert!(matches!(
            registry.connector(SocialPlugin::FacebookFanpage),
            Err(AppError::UnknownPlugin(_))
        ));
    }

    #[test]
    fn unknown_plugin_key_is_a_config_error() {
        let mut config = Config::default();
        let settings = config.plugins["facebook_fanpage"].clone();
        config.plugins.insert("myspace".to_string(), settings);
        assert!(matches!(
            PluginRegistry::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn invalid_api_url_is_a_config_error() {
        let mut config = Config::default();
        if let Some(settings) = config.plugins.get_mut("facebook_fanpage") {
            settings.api_url = Some("not a url".to_string());
        }
        assert!(matches!(
            PluginRegistry::from_config(&config),
            Err(AppError::Config(_))
        ));
    }
}
