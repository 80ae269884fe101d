pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- feeds table
CREATE TABLE IF NOT EXISTS feeds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    creation_date TEXT NOT NULL
);

-- aggregators table
CREATE TABLE IF NOT EXISTS aggregators (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    query TEXT NOT NULL,
    social_plugin TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    creation_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS aggregator_feeds (
    aggregator_id INTEGER NOT NULL REFERENCES aggregators(id) ON DELETE CASCADE,
    feed_id INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    PRIMARY KEY (aggregator_id, feed_id)
);

-- resources table
CREATE TABLE IF NOT EXISTS resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    short_description TEXT NOT NULL DEFAULT '',
    image_path TEXT,
    image_size INTEGER,
    thumbnail_path TEXT,
    thumbnail_size INTEGER,
    media_url TEXT NOT NULL DEFAULT '',
    media_url_type TEXT NOT NULL DEFAULT '',
    priority INTEGER NOT NULL DEFAULT 100,
    activate INTEGER NOT NULL DEFAULT 0,
    author TEXT NOT NULL DEFAULT '',
    language TEXT NOT NULL DEFAULT '',
    resource_date TEXT NOT NULL,
    social_id TEXT NOT NULL DEFAULT '',
    social_type TEXT NOT NULL,
    query TEXT NOT NULL DEFAULT '',
    favorite INTEGER NOT NULL DEFAULT 0,
    view_size TEXT NOT NULL DEFAULT 'default',
    text_display TEXT NOT NULL DEFAULT 'default',
    button_label TEXT NOT NULL DEFAULT '',
    button_color TEXT NOT NULL DEFAULT 'black',
    background_color TEXT NOT NULL DEFAULT '',
    new_page INTEGER NOT NULL DEFAULT 0,
    creation_date TEXT NOT NULL,
    update_date TEXT,
    updated INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_resources_public_order
    ON resources(activate, priority, resource_date DESC);
CREATE INDEX IF NOT EXISTS idx_resources_social_type ON resources(social_type);

CREATE TABLE IF NOT EXISTS resource_feeds (
    resource_id INTEGER NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
    feed_id INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    PRIMARY KEY (resource_id, feed_id)
);

CREATE INDEX IF NOT EXISTS idx_resource_feeds_feed_id ON resource_feeds(feed_id);

CREATE TABLE IF NOT EXISTS resource_tags (
    resource_id INTEGER NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
    tag TEXT NOT NULL,
    PRIMARY KEY (resource_id, tag)
);
"#;
