use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::config::PluginSettings;
use crate::error::{AppError, Result};
use crate::models::{CanonicalRecord, SocialPlugin};

use super::{Connector, Normalizer};

const GRAPH_API_URL: &str = "https://graph.facebook.com";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+0000";

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct PostsResponse {
    #[serde(default)]
    data: Vec<FanpagePost>,
}

/// A post as returned by the Graph API `posts` edge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FanpagePost {
    pub id: Option<String>,
    pub message: Option<String>,
    pub link: Option<String>,
    pub created_time: Option<String>,
    pub from: Option<Actor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Actor {
    pub name: Option<String>,
}

/// Public posts of a Facebook page, authenticated with an app token.
pub struct FacebookFanpage {
    client: Client,
    api_url: String,
    app_id: String,
    app_secret: String,
    access_token: Option<String>,
}

impl FacebookFanpage {
    pub fn new(client: Client, settings: &PluginSettings) -> Self {
        let api_url = settings
            .api_url
            .as_deref()
            .unwrap_or(GRAPH_API_URL)
            .trim_end_matches('/')
            .to_string();
        Self {
            client,
            api_url,
            app_id: settings.app_id.clone(),
            app_secret: settings.app_secret.clone(),
            access_token: None,
        }
    }
}

#[async_trait]
impl Connector for FacebookFanpage {
    type Post = FanpagePost;

    const PLUGIN: SocialPlugin = SocialPlugin::FacebookFanpage;

    async fn authenticate(&mut self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/oauth/access_token", self.api_url))
            .query(&[
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Authentication(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Authentication(format!(
                "token request rejected: HTTP {}: {}",
                status, error_text
            )));
        }

        let token: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Authentication(format!("unexpected token payload: {}", e)))?;

        self.access_token = Some(token.access_token);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<FanpagePost>> {
        let token = self.access_token.as_deref().ok_or_else(|| {
            AppError::Authentication("search attempted before authenticate".to_string())
        })?;

        let response = self
            .client
            .get(posts_url(&self.api_url, query))
            .query(&[("access_token", token)])
            .send()
            .await
            .map_err(|e| AppError::Provider(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Provider(format!(
                "posts of {} failed: HTTP {}",
                query, status
            )));
        }

        let payload: PostsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("malformed posts payload: {}", e)))?;

        tracing::debug!("Fetched {} posts for {}", payload.data.len(), query);
        Ok(payload.data)
    }
}

impl Normalizer for FacebookFanpage {
    type Post = FanpagePost;

    fn normalize(&self, post: FanpagePost) -> Result<Option<CanonicalRecord>> {
        let Some(id) = post.id.filter(|id| !id.is_empty()) else {
            tracing::debug!("Skipping post without id");
            return Ok(None);
        };

        // Image or link only posts are not surfaced
        let Some(message) = post.message.filter(|m| !m.trim().is_empty()) else {
            tracing::debug!("Skipping post {} without text", id);
            return Ok(None);
        };

        let resource_date = parse_created_time(post.created_time.as_deref().unwrap_or(""))?;

        let author = post
            .from
            .and_then(|actor| actor.name)
            .ok_or_else(|| AppError::Normalization(format!("post {} has no author", id)))?;

        let (media_url, media_url_type) = match post.link {
            Some(link) if !link.is_empty() => (link, "url".to_string()),
            _ => (String::new(), String::new()),
        };

        Ok(Some(CanonicalRecord {
            name: format!("fb fanpage {}", id),
            slug: format!("fb_fanpage_{}", id),
            social_id: id,
            resource_date,
            description: message,
            media_url,
            media_url_type,
            author,
        }))
    }
}

fn parse_created_time(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| AppError::MalformedTimestamp {
            value: value.to_string(),
            format: DATETIME_FORMAT,
        })
}

/// Posts edge of `query`. A query may name a nested node (`123/feed`), so
/// each path segment is encoded on its own.
fn posts_url(api_url: &str, query: &str) -> String {
    let path = query
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}/posts", api_url, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::mock_graph::{self, MockGraph};
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn posts_url_keeps_path_segments() {
        assert_eq!(
            posts_url("https://graph.example", "123/feed"),
            "https://graph.example/123/feed/posts"
        );
        assert_eq!(
            posts_url("https://graph.example", "my page?x"),
            "https://graph.example/my%20page%3Fx/posts"
        );
    }

    fn connector(api_url: Option<String>, secret: &str) -> FacebookFanpage {
        FacebookFanpage::new(
            Client::new(),
            &PluginSettings {
                name: "Facebook Fanpage".to_string(),
                app_id: mock_graph::APP_ID.to_string(),
                app_secret: secret.to_string(),
                api_url,
            },
        )
    }

    fn post(value: serde_json::Value) -> FanpagePost {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn normalizes_text_post() {
        let fb = connector(None, "x");
        let record = fb
            .normalize(post(json!({
                "id": "1",
                "message": "hello",
                "created_time": "2024-01-01T00:00:00+0000",
                "from": {"name": "A"}
            })))
            .unwrap()
            .unwrap();

        assert_eq!(record.social_id, "1");
        assert_eq!(record.slug, "fb_fanpage_1");
        assert_eq!(record.name, "fb fanpage 1");
        assert_eq!(record.description, "hello");
        assert_eq!(record.author, "A");
        assert_eq!(record.media_url, "");
        assert_eq!(record.media_url_type, "");
        assert_eq!(
            record.resource_date,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn link_becomes_url_media() {
        let fb = connector(None, "x");
        let record = fb
            .normalize(post(json!({
                "id": "7",
                "message": "see this",
                "link": "http://x",
                "created_time": "2024-03-05T10:20:30+0000",
                "from": {"name": "B"}
            })))
            .unwrap()
            .unwrap();
        assert_eq!(record.media_url, "http://x");
        assert_eq!(record.media_url_type, "url");
    }

    #[test]
    fn textless_posts_are_skipped() {
        let fb = connector(None, "x");
        for value in [
            json!({"id": "2", "link": "http://x", "created_time": "2024-01-01T00:00:00+0000", "from": {"name": "B"}}),
            json!({"id": "3", "message": "   ", "created_time": "2024-01-01T00:00:00+0000", "from": {"name": "B"}}),
            json!({"id": "4"}),
        ] {
            assert!(fb.normalize(post(value)).unwrap().is_none());
        }
    }

    #[test]
    fn posts_without_id_are_skipped() {
        let fb = connector(None, "x");
        let normalized = fb
            .normalize(post(json!({"message": "orphan", "from": {"name": "A"}})))
            .unwrap();
        assert!(normalized.is_none());
    }

    #[test]
    fn malformed_timestamp_is_reported() {
        let fb = connector(None, "x");
        let err = fb
            .normalize(post(json!({
                "id": "5",
                "message": "hi",
                "created_time": "2024-01-01 00:00:00",
                "from": {"name": "A"}
            })))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::MalformedTimestamp { ref value, .. } if value == "2024-01-01 00:00:00"
        ));
    }

    #[test]
    fn missing_author_is_a_normalization_error() {
        let fb = connector(None, "x");
        let err = fb
            .normalize(post(json!({
                "id": "6",
                "message": "hi",
                "created_time": "2024-01-01T00:00:00+0000"
            })))
            .unwrap_err();
        assert!(matches!(err, AppError::Normalization(_)));
    }

    #[tokio::test]
    async fn authenticates_and_searches() {
        let graph = MockGraph::default();
        graph.set_posts(
            "somepage",
            json!([{"id": "1", "message": "hello", "created_time": "2024-01-01T00:00:00+0000", "from": {"name": "A"}}]),
        );
        let (url, server) = mock_graph::spawn(graph.clone()).await;

        let mut fb = connector(Some(url), mock_graph::APP_SECRET);
        fb.authenticate().await.unwrap();
        let posts = fb.search("somepage").await.unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id.as_deref(), Some("1"));
        assert_eq!(graph.token_requests(), 1);
        server.abort();
    }

    #[tokio::test]
    async fn rejected_credentials_fail_authentication() {
        let (url, server) = mock_graph::spawn(MockGraph::default()).await;

        let mut fb = connector(Some(url), "wrong");
        let err = fb.authenticate().await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        server.abort();
    }

    #[tokio::test]
    async fn unreachable_provider_fails_authentication() {
        let mut fb = connector(Some("http://127.0.0.1:9".to_string()), "x");
        assert!(matches!(
            fb.authenticate().await,
            Err(AppError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn search_requires_a_session() {
        let fb = connector(None, "x");
        assert!(matches!(
            fb.search("somepage").await,
            Err(AppError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn provider_failures_are_provider_errors() {
        let graph = MockGraph::default();
        graph.set_raw_posts("broken", "{not json");
        let (url, server) = mock_graph::spawn(graph).await;

        let mut fb = connector(Some(url), mock_graph::APP_SECRET);
        fb.authenticate().await.unwrap();

        assert!(matches!(
            fb.search("unknownpage").await,
            Err(AppError::Provider(msg)) if msg.contains("404")
        ));
        assert!(matches!(
            fb.search("broken").await,
            Err(AppError::Provider(_))
        ));
        server.abort();
    }
}
