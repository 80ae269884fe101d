use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Social sources a connector exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlugin {
    FacebookFanpage,
}

impl SocialPlugin {
    pub const ALL: [SocialPlugin; 1] = [SocialPlugin::FacebookFanpage];

    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPlugin::FacebookFanpage => "facebook_fanpage",
        }
    }
}

impl fmt::Display for SocialPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocialPlugin {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SocialPlugin::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AppError::UnknownPlugin(s.to_string()))
    }
}

/// A stored definition of a recurring fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub id: i64,
    pub name: String,
    pub query: String,
    pub social_plugin: SocialPlugin,
    pub slug: String,
    pub creation_date: DateTime<Utc>,
    pub feed_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct NewAggregator {
    pub name: String,
    pub query: String,
    pub social_plugin: SocialPlugin,
    pub slug: String,
    pub feed_slugs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_names_round_trip_through_str() {
        for plugin in SocialPlugin::ALL {
            assert_eq!(plugin.as_str().parse::<SocialPlugin>().unwrap(), plugin);
        }
    }

    #[test]
    fn unknown_plugin_name_is_an_error() {
        assert!(matches!(
            "twitter".parse::<SocialPlugin>(),
            Err(AppError::UnknownPlugin(name)) if name == "twitter"
        ));
    }

    #[test]
    fn plugin_serializes_as_its_key() {
        let json = serde_json::to_string(&SocialPlugin::FacebookFanpage).unwrap();
        assert_eq!(json, "\"facebook_fanpage\"");
    }
}
