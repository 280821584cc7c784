//! Catalog product records
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::money::ratio_pct;

/// Platform or genre labels attached to a product. Stored with their original
/// case; filters decide whether matching is case-sensitive.
pub type TagSet = SmallVec<[String; 4]>;

/// A purchasable digital title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    /// Base price in cents
    pub price_cents: i64,
    /// Sale price in cents, never above `price_cents`
    #[serde(default)]
    pub discounted_price_cents: Option<i64>,
    pub platforms: TagSet,
    pub genres: TagSet,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Price the customer actually pays: the discounted price when set,
    /// otherwise the base price.
    #[must_use]
    pub fn effective_price_cents(&self) -> i64 {
        self.discounted_price_cents.unwrap_or(self.price_cents)
    }

    #[must_use]
    pub const fn has_discount(&self) -> bool {
        self.discounted_price_cents.is_some()
    }

    /// Amount saved against the base price; 0 without a discount.
    #[must_use]
    pub fn savings_cents(&self) -> i64 {
        self.discounted_price_cents
            .map_or(0, |discounted| self.price_cents - discounted)
    }

    /// Rounded savings percentage shown on discounted cards.
    #[must_use]
    pub fn savings_pct(&self) -> u32 {
        if self.has_discount() {
            ratio_pct(self.savings_cents(), self.price_cents)
        } else {
            0
        }
    }

    /// `folded_query` must already be lowercased.
    #[must_use]
    pub fn matches_text(&self, folded_query: &str) -> bool {
        [&self.title, &self.developer, &self.publisher]
            .iter()
            .any(|field| field.to_lowercase().contains(folded_query))
    }

    #[must_use]
    pub fn has_genre_ignore_case(&self, genre: &str) -> bool {
        contains_ignore_case(&self.genres, genre)
    }

    #[must_use]
    pub fn has_platform_ignore_case(&self, platform: &str) -> bool {
        contains_ignore_case(&self.platforms, platform)
    }

    /// Exact-case OR match against a platform selection.
    #[must_use]
    pub fn has_any_platform(&self, selected: &[String]) -> bool {
        self.platforms.iter().any(|p| selected.contains(p))
    }

    /// Exact-case OR match against a genre selection.
    #[must_use]
    pub fn has_any_genre(&self, selected: &[String]) -> bool {
        self.genres.iter().any(|g| selected.contains(g))
    }

    /// True when the two products have at least one genre in common.
    #[must_use]
    pub fn shares_genre_with(&self, other: &Self) -> bool {
        self.genres.iter().any(|g| other.genres.contains(g))
    }

    /// First listed platform, used for order lines and compact cards.
    #[must_use]
    pub fn primary_platform(&self) -> &str {
        self.platforms.first().map_or("", String::as_str)
    }
}

fn contains_ignore_case(tags: &TagSet, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    tags.iter().any(|tag| tag.to_lowercase() == needle)
}
