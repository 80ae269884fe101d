mod aggregator;
mod feed;
mod resource;

pub use aggregator::{AggregatorConfig, NewAggregator, SocialPlugin};
pub use feed::{slugify, Feed, NewFeed};
pub use resource::{
    validate_image_size, CanonicalRecord, ImageRef, Page, Resource, ResourceCuration,
    ResourceFilter, RunResult, UpsertOutcome,
};
