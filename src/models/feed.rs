use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const SLUG_MAX_LEN: usize = 100;

static NON_SLUG: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFeed {
    pub name: String,
    pub slug: String,
}

impl NewFeed {
    /// Builds a feed, deriving the slug from the name when none is given.
    pub fn new(name: &str, slug: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.map(str::to_string).unwrap_or_else(|| slugify(name)),
        }
    }
}

/// Lowercases `value` and collapses every run of other characters to `-`.
pub fn slugify(value: &str) -> String {
    let re = NON_SLUG.get_or_init(|| Regex::new(r"[^a-z0-9_]+").expect("static regex"));
    let lowered = value.to_lowercase();
    let slug = re.replace_all(&lowered, "-");
    slug.trim_matches('-').chars().take(SLUG_MAX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("  Latest News!! 2024 "), "latest-news-2024");
        assert_eq!(slugify("fb_fanpage"), "fb_fanpage");
        assert_eq!(slugify("Été / Summer"), "t-summer");
    }

    #[test]
    fn slugify_caps_length() {
        assert_eq!(slugify(&"a".repeat(300)).len(), SLUG_MAX_LEN);
    }

    #[test]
    fn new_feed_keeps_explicit_slug() {
        assert_eq!(NewFeed::new("World News", None).slug, "world-news");
        assert_eq!(NewFeed::new("World News", Some("news")).slug, "news");
    }
}
