use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::render::FormatterKind;

/// A selectable value with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub key: String,
    pub label: String,
}

impl Choice {
    fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

/// Application credentials and endpoint for one social plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSettings {
    pub name: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub app_secret: String,
    /// Override of the provider's API root, mostly useful against a mock.
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Templates {
    pub view: Option<PathBuf>,
    pub tag: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_pagination")]
    pub pagination: usize,

    /// Maximum image size in kilobytes, 0 disables the check.
    #[serde(default)]
    pub resource_image_size_kb: u64,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_max_duplicate_attempts")]
    pub max_duplicate_attempts: u32,

    #[serde(default)]
    pub formatter: FormatterKind,

    #[serde(default)]
    pub templates: Templates,

    #[serde(default = "default_plugins")]
    pub plugins: BTreeMap<String, PluginSettings>,

    #[serde(default = "default_base_media_types")]
    pub base_media_types: Vec<Choice>,

    #[serde(default = "default_media_url_types")]
    pub media_url_types: Vec<Choice>,

    #[serde(default = "default_view_sizes")]
    pub view_sizes: Vec<Choice>,

    #[serde(default = "default_text_displays")]
    pub text_displays: Vec<Choice>,

    #[serde(default = "default_button_colors")]
    pub button_colors: Vec<Choice>,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("social-aggregator");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("resources.db").to_string_lossy().to_string()
}

fn default_pagination() -> usize {
    10
}

fn default_http_timeout() -> u64 {
    30
}

fn default_max_duplicate_attempts() -> u32 {
    100
}

fn default_plugins() -> BTreeMap<String, PluginSettings> {
    let mut plugins = BTreeMap::new();
    plugins.insert(
        "facebook_fanpage".to_string(),
        PluginSettings {
            name: "Facebook Fanpage".to_string(),
            app_id: String::new(),
            app_secret: String::new(),
            api_url: None,
        },
    );
    plugins
}

fn default_base_media_types() -> Vec<Choice> {
    vec![
        Choice::new("edsa_article", "Article"),
        Choice::new("edsa_video", "Video"),
        Choice::new("edsa_image", "Image"),
    ]
}

fn default_media_url_types() -> Vec<Choice> {
    vec![
        Choice::new("url", "Url"),
        Choice::new("image", "Image"),
        Choice::new("video", "Video"),
    ]
}

fn default_view_sizes() -> Vec<Choice> {
    vec![
        Choice::new("default", "Default"),
        Choice::new("small", "Small"),
        Choice::new("medium", "Medium"),
        Choice::new("large", "Large"),
    ]
}

fn default_text_displays() -> Vec<Choice> {
    vec![
        Choice::new("default", "Default"),
        Choice::new("bottom", "Bottom"),
        Choice::new("top", "Top"),
    ]
}

fn default_button_colors() -> Vec<Choice> {
    vec![
        Choice::new("black", "Black"),
        Choice::new("white", "White"),
        Choice::new("primary", "Primary"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            pagination: default_pagination(),
            resource_image_size_kb: 0,
            http_timeout_secs: default_http_timeout(),
            max_duplicate_attempts: default_max_duplicate_attempts(),
            formatter: FormatterKind::default(),
            templates: Templates::default(),
            plugins: default_plugins(),
            base_media_types: default_base_media_types(),
            media_url_types: default_media_url_types(),
            view_sizes: default_view_sizes(),
            text_displays: default_text_displays(),
            button_colors: default_button_colors(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("social-aggregator")
            .join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if self.pagination == 0 {
            return Err(AppError::Config("pagination must be at least 1".to_string()));
        }
        if self.max_duplicate_attempts == 0 {
            return Err(AppError::Config(
                "max_duplicate_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Every accepted `social_type`: base media types followed by plugins.
    pub fn social_types(&self) -> Vec<Choice> {
        self.base_media_types
            .iter()
            .cloned()
            .chain(
                self.plugins
                    .iter()
                    .map(|(key, plugin)| Choice::new(key, &plugin.name)),
            )
            .collect()
    }
}

/// Fails unless `value` is the key of one of `choices`.
pub fn ensure_choice(field: &str, value: &str, choices: &[Choice]) -> Result<()> {
    if choices.iter().any(|c| c.key == value) {
        Ok(())
    } else {
        let keys: Vec<&str> = choices.iter().map(|c| c.key.as_str()).collect();
        Err(AppError::Validation(format!(
            "{} must be one of [{}], got {:?}",
            field,
            keys.join(", "),
            value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
db_path = "/tmp/x.db"
pagination = 25
formatter = "compact"

[plugins.facebook_fanpage]
name = "FB"
app_id = "123"
app_secret = "s3cret"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.db_path, "/tmp/x.db");
        assert_eq!(config.pagination, 25);
        assert_eq!(config.formatter, FormatterKind::Compact);
        assert_eq!(config.max_duplicate_attempts, 100);
        assert_eq!(config.plugins["facebook_fanpage"].app_id, "123");
        assert!(config.plugins["facebook_fanpage"].api_url.is_none());
    }

    #[test]
    fn zero_pagination_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "pagination = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.resource_image_size_kb = 512;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.resource_image_size_kb, 512);
        assert_eq!(loaded.view_sizes, config.view_sizes);
    }

    #[test]
    fn social_types_list_plugins_after_base_types() {
        let config = Config::default();
        let keys: Vec<String> = config.social_types().into_iter().map(|c| c.key).collect();
        assert_eq!(
            keys,
            vec!["edsa_article", "edsa_video", "edsa_image", "facebook_fanpage"]
        );
    }

    #[test]
    fn ensure_choice_names_the_field() {
        let config = Config::default();
        assert!(ensure_choice("view_size", "large", &config.view_sizes).is_ok());
        let err = ensure_choice("view_size", "huge", &config.view_sizes).unwrap_err();
        assert!(err.to_string().contains("view_size"));
    }
}
