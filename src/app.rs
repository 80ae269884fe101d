use std::path::Path;

use crate::aggregator::Aggregator;
use crate::cli::{AggregatorCommand, Command, FeedCommand};
use crate::config::{ensure_choice, Config};
use crate::db::{Repository, TAG_SEPARATOR};
use crate::error::{AppError, Result};
use crate::models::{
    slugify, validate_image_size, AggregatorConfig, Feed, ImageRef, NewAggregator, NewFeed,
    Resource, ResourceCuration, ResourceFilter, SocialPlugin,
};
use crate::render::{OutputFormat, Renderer};
use crate::social::PluginRegistry;

pub struct App {
    config: Config,
    repository: Repository,
    registry: PluginRegistry,
    renderer: Renderer,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        let registry = PluginRegistry::from_config(&config)?;
        let renderer = Renderer::from_config(&config)?;

        Ok(Self {
            config,
            repository,
            registry,
            renderer,
        })
    }

    pub async fn handle_command(&self, command: Command) -> Result<()> {
        match command {
            Command::Feed(FeedCommand::Add { name, slug }) => {
                let feed = self.add_feed(&name, slug.as_deref()).await?;
                println!("Created feed {} ({})", feed.name, feed.slug);
            }

            Command::Feed(FeedCommand::Rename { slug, name }) => {
                self.repository.rename_feed(&slug, &name).await?;
                println!("Renamed feed {} to {}", slug, name);
            }

            Command::Feed(FeedCommand::List) => {
                for feed in self.repository.get_all_feeds().await? {
                    println!("{}\t{}\t{}", feed.slug, feed.name, feed.creation_date);
                }
            }

            Command::Aggregator(AggregatorCommand::Add {
                name,
                query,
                plugin,
                feeds,
                slug,
            }) => {
                let aggregator = self
                    .add_aggregator(&name, &query, &plugin, feeds, slug.as_deref())
                    .await?;
                println!(
                    "Created aggregator {} ({} on {})",
                    aggregator.slug, aggregator.query, aggregator.social_plugin
                );
            }

            Command::Aggregator(AggregatorCommand::List) => {
                for aggregator in self.repository.get_all_aggregators().await? {
                    println!(
                        "{}\t{}\t{}\t{}",
                        aggregator.slug, aggregator.name, aggregator.social_plugin, aggregator.query
                    );
                }
            }

            Command::Plugins => {
                for (plugin, name) in self.registry.choices() {
                    println!("{}\t{}", plugin, name);
                }
            }

            Command::Run { slugs, all } => {
                self.run_aggregators(&slugs, all).await?;
            }

            Command::List { feed, page, format } => {
                println!("{}", self.list(feed.as_deref(), page, format).await?);
            }

            Command::RenderFeed { slug } => {
                let resources = self.repository.list_by_feed(&slug).await?;
                println!("{}", self.renderer.feed_markup(&resources));
            }

            Command::Resources {
                feed,
                social_type,
                activated,
                updated,
            } => {
                if let Some(social_type) = &social_type {
                    ensure_choice("social_type", social_type, &self.config.social_types())?;
                }
                let resources = self
                    .repository
                    .list_resources(ResourceFilter {
                        social_type,
                        feed_slug: feed,
                        activate: activated,
                        updated,
                    })
                    .await?;
                for resource in resources {
                    println!(
                        "{}\t{}\t{}\t{}\t{}\tactivate={}\tupdated={}",
                        resource.slug,
                        resource.author,
                        resource.priority,
                        resource.social_type,
                        resource.resource_date,
                        resource.activate,
                        resource.updated
                    );
                }
            }

            Command::Activate { slugs } => {
                let count = self.repository.set_activation(&slugs, true).await?;
                println!("Activated {} resources", count);
            }

            Command::Deactivate { slugs } => {
                let count = self.repository.set_activation(&slugs, false).await?;
                println!("Deactivated {} resources", count);
            }

            Command::Duplicate { slugs } => {
                for slug in slugs {
                    let copy = self
                        .repository
                        .duplicate_resource(&slug, self.config.max_duplicate_attempts)
                        .await?;
                    println!("Duplicated {} as {}", slug, copy.slug);
                }
            }

            Command::Curate {
                slug,
                priority,
                favorite,
                language,
                short_description,
                view_size,
                text_display,
                button_label,
                button_color,
                background_color,
                new_page,
                tags,
                clear_tags,
            } => {
                let tags = if clear_tags {
                    Some(Vec::new())
                } else if tags.is_empty() {
                    None
                } else {
                    Some(tags)
                };
                let curation = ResourceCuration {
                    priority,
                    favorite,
                    language,
                    short_description,
                    view_size,
                    text_display,
                    button_label,
                    button_color,
                    background_color,
                    new_page,
                    tags,
                };
                let resource = self.curate(&slug, curation).await?;
                println!("Updated {}", resource.slug);
            }

            Command::SetImage {
                slug,
                path,
                thumbnail,
            } => {
                self.set_image(&slug, &path, thumbnail).await?;
                println!("Attached {:?} to {}", path, slug);
            }
        }

        Ok(())
    }

    async fn add_feed(&self, name: &str, slug: Option<&str>) -> Result<Feed> {
        let feed = NewFeed::new(name, slug);
        if feed.slug.is_empty() {
            return Err(AppError::Validation(format!(
                "cannot derive a slug from {:?}",
                name
            )));
        }
        self.repository.insert_feed(feed).await
    }

    async fn add_aggregator(
        &self,
        name: &str,
        query: &str,
        plugin: &str,
        feed_slugs: Vec<String>,
        slug: Option<&str>,
    ) -> Result<AggregatorConfig> {
        let social_plugin: SocialPlugin = plugin.parse()?;
        if !self.registry.contains(social_plugin) {
            return Err(AppError::UnknownPlugin(plugin.to_string()));
        }
        if query.trim().is_empty() {
            return Err(AppError::Validation("query must not be empty".to_string()));
        }
        if feed_slugs.is_empty() {
            return Err(AppError::Validation(
                "an aggregator needs at least one feed".to_string(),
            ));
        }
        let slug = slug.map(str::to_string).unwrap_or_else(|| slugify(name));
        if slug.is_empty() {
            return Err(AppError::Validation(format!(
                "cannot derive a slug from {:?}",
                name
            )));
        }

        self.repository
            .insert_aggregator(NewAggregator {
                name: name.to_string(),
                query: query.to_string(),
                social_plugin,
                slug,
                feed_slugs,
            })
            .await
    }

    async fn run_aggregators(&self, slugs: &[String], all: bool) -> Result<()> {
        let configs = if all {
            self.repository.get_all_aggregators().await?
        } else {
            let mut configs = Vec::with_capacity(slugs.len());
            for slug in slugs {
                let config = self
                    .repository
                    .get_aggregator(slug)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("aggregator {}", slug)))?;
                configs.push(config);
            }
            configs
        };

        let total = configs.len();
        let aggregator = Aggregator::new(&self.registry, &self.repository);
        let mut failures = 0;
        for (config, result) in aggregator.run_all(configs).await {
            match result {
                Ok(summary) => println!(
                    "{}: {} created, {} refreshed, {} unchanged, {} skipped, {} failed",
                    config.slug,
                    summary.created,
                    summary.refreshed,
                    summary.unchanged,
                    summary.skipped,
                    summary.failed
                ),
                Err(e) => {
                    failures += 1;
                    println!("{}: run failed: {}", config.slug, e);
                }
            }
        }

        if failures > 0 {
            return Err(anyhow::anyhow!("{} of {} aggregator runs failed", failures, total).into());
        }
        Ok(())
    }

    async fn list(&self, feed: Option<&str>, page: usize, format: OutputFormat) -> Result<String> {
        let page = self
            .repository
            .list_activated(feed, page, self.config.pagination)
            .await?;
        self.renderer.render_page(&page, format)
    }

    async fn curate(&self, slug: &str, curation: ResourceCuration) -> Result<Resource> {
        if let Some(view_size) = &curation.view_size {
            ensure_choice("view_size", view_size, &self.config.view_sizes)?;
        }
        if let Some(text_display) = &curation.text_display {
            ensure_choice("text_display", text_display, &self.config.text_displays)?;
        }
        if let Some(button_color) = &curation.button_color {
            ensure_choice("button_color", button_color, &self.config.button_colors)?;
        }
        if let Some(language) = &curation.language {
            if language.chars().count() > 2 {
                return Err(AppError::Validation(format!(
                    "language must be a two letter code, got {:?}",
                    language
                )));
            }
        }
        if let Some(tags) = &curation.tags {
            if let Some(tag) = tags.iter().find(|tag| tag.contains(TAG_SEPARATOR)) {
                return Err(AppError::Validation(format!(
                    "tag {:?} contains a control character",
                    tag
                )));
            }
        }
        self.repository.update_curation(slug, curation).await
    }

    async fn set_image(&self, slug: &str, path: &Path, thumbnail: bool) -> Result<()> {
        let size_bytes = std::fs::metadata(path)?.len();
        validate_image_size(size_bytes, self.config.resource_image_size_kb)?;
        let path = std::fs::canonicalize(path)?;
        self.repository
            .set_image(
                slug,
                ImageRef {
                    path: path.to_string_lossy().to_string(),
                    size_bytes,
                },
                thumbnail,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CanonicalRecord;
    use chrono::{TimeZone, Utc};

    async fn app_with(config: Config) -> App {
        App::new(Config {
            db_path: ":memory:".to_string(),
            ..config
        })
        .await
        .unwrap()
    }

    async fn seed_resource(app: &App) {
        app.repository
            .upsert_resource(
                CanonicalRecord {
                    social_id: "1".to_string(),
                    name: "fb fanpage 1".to_string(),
                    slug: "fb_fanpage_1".to_string(),
                    resource_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                    description: "hello".to_string(),
                    media_url: String::new(),
                    media_url_type: String::new(),
                    author: "A".to_string(),
                },
                "facebook_fanpage",
                "somepage",
                &[],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn aggregator_needs_a_registered_plugin() {
        let mut config = Config::default();
        config.plugins.clear();
        let app = app_with(config).await;
        app.add_feed("News", None).await.unwrap();

        let err = app
            .add_aggregator("Page", "somepage", "facebook_fanpage", vec!["news".into()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownPlugin(_)));

        let err = app
            .add_aggregator("Page", "somepage", "myspace", vec!["news".into()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownPlugin(_)));
    }

    #[tokio::test]
    async fn aggregator_slug_defaults_to_name() {
        let app = app_with(Config::default()).await;
        app.add_feed("News", None).await.unwrap();
        let aggregator = app
            .add_aggregator("My Page", "somepage", "facebook_fanpage", vec!["news".into()], None)
            .await
            .unwrap();
        assert_eq!(aggregator.slug, "my-page");
        assert_eq!(aggregator.feed_ids.len(), 1);
    }

    #[tokio::test]
    async fn curate_rejects_unknown_choices() {
        let app = app_with(Config::default()).await;
        seed_resource(&app).await;

        let err = app
            .curate(
                "fb_fanpage_1",
                ResourceCuration {
                    view_size: Some("huge".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let resource = app
            .curate(
                "fb_fanpage_1",
                ResourceCuration {
                    view_size: Some("large".to_string()),
                    language: Some("fr".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(resource.view_size, "large");
        assert_eq!(resource.language, "fr");
        assert!(resource.updated);
    }

    #[tokio::test]
    async fn curate_rejects_tags_with_separator() {
        let app = app_with(Config::default()).await;
        seed_resource(&app).await;

        let err = app
            .curate(
                "fb_fanpage_1",
                ResourceCuration {
                    tags: Some(vec!["a\u{1f}b".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let resource = app
            .curate(
                "fb_fanpage_1",
                ResourceCuration {
                    tags: Some(vec!["a b".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(resource.tags, vec!["a b".to_string()]);
    }

    #[tokio::test]
    async fn set_image_enforces_size_cap() {
        let app = app_with(Config {
            resource_image_size_kb: 1,
            ..Config::default()
        })
        .await;
        seed_resource(&app).await;
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.png");
        let large = dir.path().join("large.png");
        std::fs::write(&small, vec![0u8; 512]).unwrap();
        std::fs::write(&large, vec![0u8; 4096]).unwrap();

        app.set_image("fb_fanpage_1", &small, false).await.unwrap();
        let err = app
            .set_image("fb_fanpage_1", &large, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let resource = app.repository.get_resource("fb_fanpage_1").await.unwrap().unwrap();
        assert_eq!(resource.image.unwrap().size_bytes, 512);
    }

    #[tokio::test]
    async fn list_uses_configured_page_size() {
        let app = app_with(Config {
            pagination: 1,
            ..Config::default()
        })
        .await;
        seed_resource(&app).await;
        app.repository
            .set_activation(&["fb_fanpage_1".to_string()], true)
            .await
            .unwrap();

        let json = app.list(None, 1, OutputFormat::Json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["items"][0]["slug"], "fb_fanpage_1");
        assert!(matches!(
            app.list(None, 2, OutputFormat::Json).await,
            Err(AppError::NotFound(_))
        ));
    }
}
