use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{
    AggregatorConfig, CanonicalRecord, Feed, ImageRef, NewAggregator, NewFeed, Page, Resource,
    ResourceCuration, ResourceFilter, SocialPlugin, UpsertOutcome,
};

use super::schema::SCHEMA;

/// Joins tags and feed slugs in a single column; never valid inside a tag.
pub const TAG_SEPARATOR: char = '\u{1f}';

const RESOURCE_COLUMNS: &str = r#"r.id, r.slug, r.name, r.description, r.short_description,
    r.image_path, r.image_size, r.thumbnail_path, r.thumbnail_size, r.media_url,
    r.media_url_type, r.priority, r.activate, r.author, r.language, r.resource_date,
    r.social_id, r.social_type, r.query, r.favorite, r.view_size, r.text_display,
    r.button_label, r.button_color, r.background_color, r.new_page, r.creation_date,
    r.update_date, r.updated,
    (SELECT GROUP_CONCAT(tag, char(31)) FROM resource_tags WHERE resource_id = r.id) AS tags,
    (SELECT GROUP_CONCAT(f.slug, char(31)) FROM resource_feeds rf
        JOIN feeds f ON f.id = rf.feed_id WHERE rf.resource_id = r.id) AS feed_slugs"#;

const IN_FEED: &str = r#"EXISTS (SELECT 1 FROM resource_feeds rf JOIN feeds f ON f.id = rf.feed_id
    WHERE rf.resource_id = r.id AND f.slug = ?1)"#;

enum AggregatorInsert {
    Created(i64, Vec<i64>),
    MissingFeed(String),
    SlugTaken,
}

enum DuplicateStep {
    Missing,
    Exhausted,
    Created(String),
}

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::with_connection(conn).await
    }

    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Feed operations

    pub async fn insert_feed(&self, feed: NewFeed) -> Result<Feed> {
        let slug = feed.slug.clone();
        let now = Utc::now();
        let created = now_string(now);
        let id = self
            .conn
            .call(move |conn| {
                match conn.execute(
                    "INSERT INTO feeds (name, slug, creation_date) VALUES (?1, ?2, ?3)",
                    params![feed.name, feed.slug, created],
                ) {
                    Ok(_) => Ok(Some(conn.last_insert_rowid())),
                    Err(e) if is_unique_violation(&e) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        match id {
            Some(_) => self
                .get_feed(&slug)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("feed {}", slug))),
            None => Err(AppError::UniquenessConflict(format!("feed slug {}", slug))),
        }
    }

    pub async fn rename_feed(&self, slug: &str, name: &str) -> Result<()> {
        let slug_owned = slug.to_string();
        let name = name.to_string();
        let changed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE feeds SET name = ?1 WHERE slug = ?2",
                    params![name, slug_owned],
                )?)
            })
            .await?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("feed {}", slug)));
        }
        Ok(())
    }

    pub async fn get_feed(&self, slug: &str) -> Result<Option<Feed>> {
        let slug = slug.to_string();
        let feed = self
            .conn
            .call(move |conn| {
                let feed = conn
                    .query_row(
                        "SELECT id, name, slug, creation_date FROM feeds WHERE slug = ?1",
                        params![slug],
                        feed_from_row,
                    )
                    .optional()?;
                Ok(feed)
            })
            .await?;
        Ok(feed)
    }

    pub async fn get_all_feeds(&self) -> Result<Vec<Feed>> {
        let feeds = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare("SELECT id, name, slug, creation_date FROM feeds ORDER BY name")?;
                let feeds = stmt
                    .query_map([], feed_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(feeds)
            })
            .await?;
        Ok(feeds)
    }

    // Aggregator operations

    pub async fn insert_aggregator(&self, aggregator: NewAggregator) -> Result<AggregatorConfig> {
        let slug = aggregator.slug.clone();
        let created = now_string(Utc::now());
        let step = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut feed_ids = Vec::with_capacity(aggregator.feed_slugs.len());
                for feed_slug in &aggregator.feed_slugs {
                    let id: Option<i64> = tx
                        .query_row(
                            "SELECT id FROM feeds WHERE slug = ?1",
                            params![feed_slug],
                            |row| row.get(0),
                        )
                        .optional()?;
                    match id {
                        Some(id) => feed_ids.push(id),
                        None => return Ok(AggregatorInsert::MissingFeed(feed_slug.clone())),
                    }
                }

                if let Err(e) = tx.execute(
                    "INSERT INTO aggregators (name, query, social_plugin, slug, creation_date)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        aggregator.name,
                        aggregator.query,
                        aggregator.social_plugin.as_str(),
                        aggregator.slug,
                        created,
                    ],
                ) {
                    if is_unique_violation(&e) {
                        return Ok(AggregatorInsert::SlugTaken);
                    }
                    return Err(e.into());
                }
                let id = tx.last_insert_rowid();
                for feed_id in &feed_ids {
                    tx.execute(
                        "INSERT OR IGNORE INTO aggregator_feeds (aggregator_id, feed_id) VALUES (?1, ?2)",
                        params![id, feed_id],
                    )?;
                }
                tx.commit()?;
                Ok(AggregatorInsert::Created(id, feed_ids))
            })
            .await?;

        match step {
            AggregatorInsert::Created(..) => self
                .get_aggregator(&slug)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("aggregator {}", slug))),
            AggregatorInsert::MissingFeed(feed) => {
                Err(AppError::NotFound(format!("feed {}", feed)))
            }
            AggregatorInsert::SlugTaken => {
                Err(AppError::UniquenessConflict(format!("aggregator slug {}", slug)))
            }
        }
    }

    pub async fn get_aggregator(&self, slug: &str) -> Result<Option<AggregatorConfig>> {
        let slug = slug.to_string();
        let aggregator = self
            .conn
            .call(move |conn| {
                let aggregator = conn
                    .query_row(
                        "SELECT id, name, query, social_plugin, slug, creation_date
                         FROM aggregators WHERE slug = ?1",
                        params![slug],
                        aggregator_from_row,
                    )
                    .optional()?;
                match aggregator {
                    Some(mut aggregator) => {
                        aggregator.feed_ids = aggregator_feed_ids(conn, aggregator.id)?;
                        Ok(Some(aggregator))
                    }
                    None => Ok(None),
                }
            })
            .await?;
        Ok(aggregator)
    }

    pub async fn get_all_aggregators(&self) -> Result<Vec<AggregatorConfig>> {
        let aggregators = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, query, social_plugin, slug, creation_date
                     FROM aggregators ORDER BY name",
                )?;
                let mut aggregators = stmt
                    .query_map([], aggregator_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                for aggregator in &mut aggregators {
                    aggregator.feed_ids = aggregator_feed_ids(conn, aggregator.id)?;
                }
                Ok(aggregators)
            })
            .await?;
        Ok(aggregators)
    }

    // Resource operations

    /// Creates or refreshes the resource keyed by `record.slug` in one transaction.
    ///
    /// An existing row only gets its source-derived fields rewritten, and only
    /// when they differ. Curated fields and feed membership are left alone.
    pub async fn upsert_resource(
        &self,
        record: CanonicalRecord,
        social_type: &str,
        query: &str,
        feed_ids: &[i64],
    ) -> Result<UpsertOutcome> {
        let slug = record.slug.clone();
        let social_type = social_type.to_string();
        let query = query.to_string();
        let feed_ids = feed_ids.to_vec();
        let now = now_string(Utc::now());
        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let resource_date = now_string(record.resource_date);

                let existing = tx
                    .query_row(
                        "SELECT social_id, social_type, description, media_url, media_url_type,
                                resource_date, author
                         FROM resources WHERE slug = ?1",
                        params![record.slug],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                [
                                    row.get::<_, String>(2)?,
                                    row.get::<_, String>(3)?,
                                    row.get::<_, String>(4)?,
                                    row.get::<_, String>(5)?,
                                    row.get::<_, String>(6)?,
                                ],
                            ))
                        },
                    )
                    .optional()?;

                let fresh = [
                    record.description.clone(),
                    record.media_url.clone(),
                    record.media_url_type.clone(),
                    resource_date.clone(),
                    record.author.clone(),
                ];

                let outcome = match existing {
                    None => {
                        tx.execute(
                            "INSERT INTO resources (slug, name, description, media_url,
                                 media_url_type, author, resource_date, social_id, social_type,
                                 query, creation_date, update_date)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                            params![
                                record.slug,
                                record.name,
                                record.description,
                                record.media_url,
                                record.media_url_type,
                                record.author,
                                resource_date,
                                record.social_id,
                                social_type,
                                query,
                                now,
                            ],
                        )?;
                        let id = tx.last_insert_rowid();
                        for feed_id in &feed_ids {
                            tx.execute(
                                "INSERT OR IGNORE INTO resource_feeds (resource_id, feed_id) VALUES (?1, ?2)",
                                params![id, feed_id],
                            )?;
                        }
                        Some(UpsertOutcome::Created)
                    }
                    Some((social_id, existing_type, _))
                        if social_id != record.social_id || existing_type != social_type =>
                    {
                        None
                    }
                    Some((_, _, current)) if current == fresh => Some(UpsertOutcome::Unchanged),
                    Some(_) => {
                        tx.execute(
                            "UPDATE resources SET description = ?2, media_url = ?3,
                                 media_url_type = ?4, resource_date = ?5, author = ?6,
                                 updated = CASE WHEN update_date IS NOT NULL THEN 1 ELSE updated END,
                                 update_date = ?7
                             WHERE slug = ?1",
                            params![
                                record.slug,
                                record.description,
                                record.media_url,
                                record.media_url_type,
                                resource_date,
                                record.author,
                                now,
                            ],
                        )?;
                        Some(UpsertOutcome::Refreshed)
                    }
                };
                tx.commit()?;
                Ok(outcome)
            })
            .await?;

        outcome.ok_or_else(|| {
            AppError::UniquenessConflict(format!("slug {} belongs to another source item", slug))
        })
    }

    pub async fn get_resource(&self, slug: &str) -> Result<Option<Resource>> {
        let slug = slug.to_string();
        let resource = self
            .conn
            .call(move |conn| {
                let sql = format!("SELECT {} FROM resources r WHERE r.slug = ?1", RESOURCE_COLUMNS);
                let resource = conn
                    .query_row(&sql, params![slug], resource_from_row)
                    .optional()?;
                Ok(resource)
            })
            .await?;
        Ok(resource)
    }

    /// Activated resources in public display order, one page at a time.
    ///
    /// `page` is 1-based. Asking past the last page is `NotFound`, except for
    /// the first page of an empty listing.
    pub async fn list_activated(
        &self,
        feed_slug: Option<&str>,
        page: usize,
        per_page: usize,
    ) -> Result<Page<Resource>> {
        let number = page.max(1);
        let per_page = per_page.max(1);
        let feed_slug = feed_slug.map(str::to_string);
        let offset = (number - 1)
            .checked_mul(per_page)
            .and_then(|offset| i64::try_from(offset).ok())
            .ok_or_else(|| AppError::NotFound(format!("page {}", number)))?;
        let limit = i64::try_from(per_page).unwrap_or(i64::MAX);

        let (total, items) = self
            .conn
            .call(move |conn| {
                let filter = format!("r.activate = 1 AND (?1 IS NULL OR {})", IN_FEED);
                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM resources r WHERE {}", filter),
                    params![feed_slug],
                    |row| row.get(0),
                )?;
                let sql = format!(
                    "SELECT {} FROM resources r WHERE {}
                     ORDER BY r.priority ASC, r.resource_date DESC, r.id ASC
                     LIMIT ?2 OFFSET ?3",
                    RESOURCE_COLUMNS, filter
                );
                let mut stmt = conn.prepare(&sql)?;
                let items = stmt
                    .query_map(params![feed_slug, limit, offset], resource_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok((total as usize, items))
            })
            .await?;

        let page = Page::new(items, number, per_page, total);
        if number > page.num_pages {
            return Err(AppError::NotFound(format!(
                "page {} of {}",
                number, page.num_pages
            )));
        }
        Ok(page)
    }

    /// All activated resources of one feed in public display order.
    pub async fn list_by_feed(&self, feed_slug: &str) -> Result<Vec<Resource>> {
        let feed_slug = feed_slug.to_string();
        let resources = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM resources r WHERE r.activate = 1 AND {}
                     ORDER BY r.priority ASC, r.resource_date DESC, r.id ASC",
                    RESOURCE_COLUMNS, IN_FEED
                );
                let mut stmt = conn.prepare(&sql)?;
                let resources = stmt
                    .query_map(params![feed_slug], resource_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(resources)
            })
            .await?;
        Ok(resources)
    }

    /// Editor listing: not-yet-updated first, newest first, then by query.
    pub async fn list_resources(&self, filter: ResourceFilter) -> Result<Vec<Resource>> {
        let resources = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM resources r
                     WHERE (?1 IS NULL OR {})
                       AND (?2 IS NULL OR r.social_type = ?2)
                       AND (?3 IS NULL OR r.activate = ?3)
                       AND (?4 IS NULL OR r.updated = ?4)
                     ORDER BY r.updated ASC, r.resource_date DESC, r.query ASC",
                    RESOURCE_COLUMNS, IN_FEED
                );
                let mut stmt = conn.prepare(&sql)?;
                let resources = stmt
                    .query_map(
                        params![
                            filter.feed_slug,
                            filter.social_type,
                            filter.activate,
                            filter.updated
                        ],
                        resource_from_row,
                    )?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(resources)
            })
            .await?;
        Ok(resources)
    }

    /// Bulk activate or deactivate. Returns how many resources matched.
    pub async fn set_activation(&self, slugs: &[String], activate: bool) -> Result<usize> {
        let slugs = slugs.to_vec();
        let now = now_string(Utc::now());
        let changed = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut changed = 0;
                for slug in &slugs {
                    changed += tx.execute(
                        "UPDATE resources SET activate = ?1, update_date = ?2, updated = 1
                         WHERE slug = ?3",
                        params![activate, now, slug],
                    )?;
                }
                tx.commit()?;
                Ok(changed)
            })
            .await?;
        Ok(changed)
    }

    /// Clones a resource under `<slug>_copy_<n>`, trying n = 0, 1, ... up to
    /// `max_attempts` slugs. The copy is deactivated and keeps feeds and tags.
    pub async fn duplicate_resource(&self, slug: &str, max_attempts: u32) -> Result<Resource> {
        let source = slug.to_string();
        let now = now_string(Utc::now());
        let step = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let original: Option<(i64, String)> = tx
                    .query_row(
                        "SELECT id, name FROM resources WHERE slug = ?1",
                        params![source],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;
                let Some((original_id, name)) = original else {
                    return Ok(DuplicateStep::Missing);
                };

                for ver in 0..max_attempts {
                    let new_slug = format!("{}_copy_{}", source, ver);
                    let new_name = format!("{} Copy {}", name, ver);
                    let inserted = tx.execute(
                        "INSERT INTO resources (slug, name, description, short_description,
                             image_path, image_size, thumbnail_path, thumbnail_size, media_url,
                             media_url_type, priority, activate, author, language, resource_date,
                             social_id, social_type, query, favorite, view_size, text_display,
                             button_label, button_color, background_color, new_page,
                             creation_date, update_date, updated)
                         SELECT ?1, ?2, description, short_description, image_path, image_size,
                             thumbnail_path, thumbnail_size, media_url, media_url_type, priority,
                             0, author, language, resource_date, social_id, social_type, query,
                             favorite, view_size, text_display, button_label, button_color,
                             background_color, new_page, ?3, ?3, 0
                         FROM resources WHERE id = ?4",
                        params![new_slug, new_name, now, original_id],
                    );
                    match inserted {
                        Ok(_) => {
                            let copy_id = tx.last_insert_rowid();
                            tx.execute(
                                "INSERT INTO resource_feeds (resource_id, feed_id)
                                 SELECT ?1, feed_id FROM resource_feeds WHERE resource_id = ?2",
                                params![copy_id, original_id],
                            )?;
                            tx.execute(
                                "INSERT INTO resource_tags (resource_id, tag)
                                 SELECT ?1, tag FROM resource_tags WHERE resource_id = ?2",
                                params![copy_id, original_id],
                            )?;
                            tx.commit()?;
                            return Ok(DuplicateStep::Created(new_slug));
                        }
                        Err(e) if is_unique_violation(&e) => continue,
                        Err(e) => return Err(e.into()),
                    }
                }
                Ok(DuplicateStep::Exhausted)
            })
            .await?;

        match step {
            DuplicateStep::Created(new_slug) => self
                .get_resource(&new_slug)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("resource {}", new_slug))),
            DuplicateStep::Missing => Err(AppError::NotFound(format!("resource {}", slug))),
            DuplicateStep::Exhausted => Err(AppError::UniquenessConflict(format!(
                "no free copy slug for {} after {} attempts",
                slug, max_attempts
            ))),
        }
    }

    /// Applies editor changes, with the usual save semantics on update_date.
    pub async fn update_curation(&self, slug: &str, curation: ResourceCuration) -> Result<Resource> {
        let target = slug.to_string();
        let now = now_string(Utc::now());
        let changed = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let changed = tx.execute(
                    "UPDATE resources SET
                         priority = COALESCE(?2, priority),
                         favorite = COALESCE(?3, favorite),
                         language = COALESCE(?4, language),
                         short_description = COALESCE(?5, short_description),
                         view_size = COALESCE(?6, view_size),
                         text_display = COALESCE(?7, text_display),
                         button_label = COALESCE(?8, button_label),
                         button_color = COALESCE(?9, button_color),
                         background_color = COALESCE(?10, background_color),
                         new_page = COALESCE(?11, new_page),
                         updated = CASE WHEN update_date IS NOT NULL THEN 1 ELSE updated END,
                         update_date = ?12
                     WHERE slug = ?1",
                    params![
                        target,
                        curation.priority,
                        curation.favorite,
                        curation.language,
                        curation.short_description,
                        curation.view_size,
                        curation.text_display,
                        curation.button_label,
                        curation.button_color,
                        curation.background_color,
                        curation.new_page,
                        now,
                    ],
                )?;
                if changed == 1 {
                    if let Some(tags) = &curation.tags {
                        let id: i64 = tx.query_row(
                            "SELECT id FROM resources WHERE slug = ?1",
                            params![target],
                            |row| row.get(0),
                        )?;
                        tx.execute("DELETE FROM resource_tags WHERE resource_id = ?1", params![id])?;
                        for tag in tags {
                            tx.execute(
                                "INSERT OR IGNORE INTO resource_tags (resource_id, tag) VALUES (?1, ?2)",
                                params![id, tag],
                            )?;
                        }
                    }
                }
                tx.commit()?;
                Ok(changed)
            })
            .await?;

        if changed == 0 {
            return Err(AppError::NotFound(format!("resource {}", slug)));
        }
        self.get_resource(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("resource {}", slug)))
    }

    pub async fn set_image(&self, slug: &str, image: ImageRef, thumbnail: bool) -> Result<()> {
        let target = slug.to_string();
        let now = now_string(Utc::now());
        let sql = if thumbnail {
            "UPDATE resources SET thumbnail_path = ?2, thumbnail_size = ?3,
                 updated = CASE WHEN update_date IS NOT NULL THEN 1 ELSE updated END,
                 update_date = ?4
             WHERE slug = ?1"
        } else {
            "UPDATE resources SET image_path = ?2, image_size = ?3,
                 updated = CASE WHEN update_date IS NOT NULL THEN 1 ELSE updated END,
                 update_date = ?4
             WHERE slug = ?1"
        };
        let changed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    sql,
                    params![target, image.path, image.size_bytes as i64, now],
                )?)
            })
            .await?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("resource {}", slug)));
        }
        Ok(())
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

fn now_string(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn split_list(value: Option<String>) -> Vec<String> {
    let mut items: Vec<String> = value
        .map(|s| {
            s.split(TAG_SEPARATOR)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    items.sort();
    items
}

fn image_from_columns(path: Option<String>, size: Option<i64>) -> Option<ImageRef> {
    path.map(|path| ImageRef {
        path,
        size_bytes: size.unwrap_or(0).max(0) as u64,
    })
}

fn aggregator_feed_ids(conn: &rusqlite::Connection, aggregator_id: i64) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT feed_id FROM aggregator_feeds WHERE aggregator_id = ?1 ORDER BY feed_id",
    )?;
    let ids = stmt
        .query_map(params![aggregator_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn feed_from_row(row: &Row) -> rusqlite::Result<Feed> {
    Ok(Feed {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        creation_date: row
            .get::<_, String>(3)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    })
}

fn aggregator_from_row(row: &Row) -> rusqlite::Result<AggregatorConfig> {
    let plugin: String = row.get(3)?;
    let social_plugin = plugin
        .parse::<SocialPlugin>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(AggregatorConfig {
        id: row.get(0)?,
        name: row.get(1)?,
        query: row.get(2)?,
        social_plugin,
        slug: row.get(4)?,
        creation_date: row
            .get::<_, String>(5)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        feed_ids: Vec::new(),
    })
}

fn resource_from_row(row: &Row) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        short_description: row.get(4)?,
        image: image_from_columns(row.get(5)?, row.get(6)?),
        thumbnail: image_from_columns(row.get(7)?, row.get(8)?),
        media_url: row.get(9)?,
        media_url_type: row.get(10)?,
        priority: row.get(11)?,
        activate: row.get(12)?,
        author: row.get(13)?,
        language: row.get(14)?,
        resource_date: row
            .get::<_, String>(15)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        social_id: row.get(16)?,
        social_type: row.get(17)?,
        query: row.get(18)?,
        favorite: row.get(19)?,
        view_size: row.get(20)?,
        text_display: row.get(21)?,
        button_label: row.get(22)?,
        button_color: row.get(23)?,
        background_color: row.get(24)?,
        new_page: row.get(25)?,
        creation_date: row
            .get::<_, String>(26)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
        update_date: row
            .get::<_, Option<String>>(27)?
            .and_then(|s| parse_datetime(&s)),
        updated: row.get(28)?,
        tags: split_list(row.get(29)?),
        feeds: split_list(row.get(30)?),
    })
}
