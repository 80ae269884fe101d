use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A stored image file attached to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub image: Option<ImageRef>,
    pub thumbnail: Option<ImageRef>,
    pub media_url: String,
    pub media_url_type: String,

    pub priority: i64,
    pub activate: bool,
    pub author: String,
    pub language: String,
    pub resource_date: DateTime<Utc>,
    pub tags: Vec<String>,
    /// Slugs of the feeds this resource belongs to.
    pub feeds: Vec<String>,

    pub social_id: String,
    pub social_type: String,
    pub query: String,

    pub favorite: bool,
    pub view_size: String,
    pub text_display: String,
    pub button_label: String,
    pub button_color: String,
    pub background_color: String,
    pub new_page: bool,

    pub creation_date: DateTime<Utc>,
    pub update_date: Option<DateTime<Utc>>,
    pub updated: bool,
}

/// Source-derived fields of one provider post, ready to upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub social_id: String,
    pub name: String,
    pub slug: String,
    pub resource_date: DateTime<Utc>,
    pub description: String,
    pub media_url: String,
    pub media_url_type: String,
    pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Refreshed,
    Unchanged,
}

/// Editor changes to a resource. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct ResourceCuration {
    pub priority: Option<i64>,
    pub favorite: Option<bool>,
    pub language: Option<String>,
    pub short_description: Option<String>,
    pub view_size: Option<String>,
    pub text_display: Option<String>,
    pub button_label: Option<String>,
    pub button_color: Option<String>,
    pub background_color: Option<String>,
    pub new_page: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// Filters of the editor listing.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub social_type: Option<String>,
    pub feed_slug: Option<String>,
    pub activate: Option<bool>,
    pub updated: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: usize, per_page: usize, total: usize) -> Self {
        let num_pages = total.div_ceil(per_page).max(1);
        Self {
            items,
            number,
            num_pages,
            total,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }
}

/// Summary of one aggregator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub created: usize,
    pub refreshed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunResult {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Refreshed => self.refreshed += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Rejects images above `cap_kb` kilobytes. A cap of 0 accepts anything.
pub fn validate_image_size(size_bytes: u64, cap_kb: u64) -> Result<()> {
    let cap_bytes = cap_kb.saturating_mul(1024);
    if cap_kb != 0 && size_bytes > cap_bytes {
        return Err(AppError::Validation(format!(
            "The image size ({}) is bigger than {}",
            format_size(size_bytes),
            format_size(cap_bytes)
        )));
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return if bytes == 1 {
            "1 byte".to_string()
        } else {
            format!("{} bytes", bytes)
        };
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_cap_of_zero_disables_check() {
        assert!(validate_image_size(50 * 1024 * 1024, 0).is_ok());
    }

    #[test]
    fn oversized_image_reports_both_sizes() {
        let err = validate_image_size(2 * 1024 * 1024, 1024).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value: The image size (2.0 MB) is bigger than 1.0 MB"
        );
        assert!(validate_image_size(1024 * 1024, 1024).is_ok());
    }

    #[test]
    fn huge_cap_does_not_overflow() {
        assert!(validate_image_size(u64::MAX, u64::MAX).is_ok());
        assert!(validate_image_size(50 * 1024 * 1024, u64::MAX / 2).is_ok());
    }

    #[test]
    fn format_size_picks_unit() {
        assert_eq!(format_size(1), "1 byte");
        assert_eq!(format_size(900), "900 bytes");
        assert_eq!(format_size(1536), "1.5 KB");
    }

    #[test]
    fn page_counts_and_neighbours() {
        let page: Page<u8> = Page::new(vec![1, 2], 2, 2, 5);
        assert_eq!(page.num_pages, 3);
        assert!(page.has_next);
        assert!(page.has_previous);

        let empty: Page<u8> = Page::new(Vec::new(), 1, 10, 0);
        assert_eq!(empty.num_pages, 1);
        assert!(!empty.has_next);
        assert!(!empty.has_previous);
    }

    #[test]
    fn run_result_counts_outcomes() {
        let mut result = RunResult::default();
        result.record(UpsertOutcome::Created);
        result.record(UpsertOutcome::Created);
        result.record(UpsertOutcome::Unchanged);
        assert_eq!(result.created, 2);
        assert_eq!(result.unchanged, 1);
        assert_eq!(result.refreshed, 0);
    }
}
