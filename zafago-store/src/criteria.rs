//! Listing filter criteria and sort keys
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default price ceiling: the slider starts fully open at $100.00.
pub const DEFAULT_PRICE_CEILING_CENTS: i64 = 10_000;

/// Location parameter that narrows the listing to one genre.
pub const CATEGORY_PARAM: &str = "category";
/// Location parameter that narrows the listing to one platform.
pub const PLATFORM_PARAM: &str = "platform";

/// Ordering applied after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    /// Catalog order
    #[default]
    #[serde(rename = "featured")]
    Featured,
    #[serde(rename = "price-asc")]
    PriceAsc,
    #[serde(rename = "price-desc")]
    PriceDesc,
    #[serde(rename = "name-asc")]
    NameAsc,
    #[serde(rename = "name-desc")]
    NameDesc,
    /// Highest rated first
    #[serde(rename = "rating")]
    RatingDesc,
    /// Most recent release first
    #[serde(rename = "newest")]
    Newest,
}

impl SortKey {
    pub const ALL: [Self; 7] = [
        Self::Featured,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::NameAsc,
        Self::NameDesc,
        Self::RatingDesc,
        Self::Newest,
    ];

    /// Stable identifier used in query strings and CLI flags.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::RatingDesc => "rating",
            Self::Newest => "newest",
        }
    }

    /// Human label for the sort selector.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::NameAsc => "Name: A to Z",
            Self::NameDesc => "Name: Z to A",
            Self::RatingDesc => "Highest Rated",
            Self::Newest => "Newest First",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort key '{0}'")]
pub struct ParseSortKeyError(pub String);

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "featured" | "" => Ok(Self::Featured),
            "price-asc" | "price-ascending" => Ok(Self::PriceAsc),
            "price-desc" | "price-descending" => Ok(Self::PriceDesc),
            "name-asc" | "name-ascending" => Ok(Self::NameAsc),
            "name-desc" | "name-descending" => Ok(Self::NameDesc),
            "rating" | "rating-desc" | "rating-descending" => Ok(Self::RatingDesc),
            "newest" | "newest-first" => Ok(Self::Newest),
            other => Err(ParseSortKeyError(other.to_string())),
        }
    }
}

/// Everything the shopper selected for one listing view.
///
/// `category` and `platform` come from the current location; the remaining
/// fields are in-page selections. Values are not validated: a negative ceiling
/// simply filters everything out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default = "default_ceiling")]
    pub price_ceiling_cents: i64,
    #[serde(default)]
    pub sort: SortKey,
}

const fn default_ceiling() -> i64 {
    DEFAULT_PRICE_CEILING_CENTS
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: None,
            platform: None,
            platforms: Vec::new(),
            genres: Vec::new(),
            price_ceiling_cents: DEFAULT_PRICE_CEILING_CENTS,
            sort: SortKey::Featured,
        }
    }
}

impl FilterCriteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria seeded from a location query string such as
    /// `?category=rpg&platform=Steam`.
    #[must_use]
    pub fn from_query_string(qs: &str) -> Self {
        let mut criteria = Self::default();
        criteria.merge_location(qs);
        criteria
    }

    /// Overwrite the location-derived fields from `qs`, keeping in-page
    /// selections. Missing or empty parameters clear the field.
    pub fn merge_location(&mut self, qs: &str) {
        self.category = None;
        self.platform = None;
        for (key, value) in parse_query_pairs(qs) {
            if value.is_empty() {
                continue;
            }
            match &*key {
                CATEGORY_PARAM => self.category = Some(value.into_owned()),
                PLATFORM_PARAM => self.platform = Some(value.into_owned()),
                _ => {}
            }
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    #[must_use]
    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for platform in platforms {
            push_unique(&mut self.platforms, platform.into());
        }
        self
    }

    #[must_use]
    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for genre in genres {
            push_unique(&mut self.genres, genre.into());
        }
        self
    }

    #[must_use]
    pub fn with_price_ceiling_cents(mut self, ceiling: i64) -> Self {
        self.price_ceiling_cents = ceiling;
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Add the platform if absent, remove it if present.
    /// Returns whether the platform is now selected.
    pub fn toggle_platform(&mut self, platform: &str) -> bool {
        toggle(&mut self.platforms, platform)
    }

    /// Add the genre if absent, remove it if present.
    /// Returns whether the genre is now selected.
    pub fn toggle_genre(&mut self, genre: &str) -> bool {
        toggle(&mut self.genres, genre)
    }

    /// Clear every in-page selection. Location parameters survive because the
    /// reset control does not navigate.
    pub fn reset(&mut self) {
        *self = Self {
            category: self.category.take(),
            platform: self.platform.take(),
            ..Self::default()
        };
    }

    /// True when nothing narrows or reorders the catalog.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }

    /// Number of active narrowing filters, for the filter badge.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        usize::from(!self.query.is_empty())
            + usize::from(self.category.is_some())
            + usize::from(self.platform.is_some())
            + self.platforms.len()
            + self.genres.len()
            + usize::from(self.price_ceiling_cents != DEFAULT_PRICE_CEILING_CENTS)
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

fn toggle(values: &mut Vec<String>, value: &str) -> bool {
    if let Some(pos) = values.iter().position(|v| v == value) {
        values.remove(pos);
        false
    } else {
        values.push(value.to_string());
        true
    }
}

/// Split `a=1&b=two+words` into decoded pairs. A leading `?` is ignored and
/// undecodable values are kept verbatim.
fn parse_query_pairs(qs: &str) -> impl Iterator<Item = (Cow<'_, str>, Cow<'_, str>)> {
    qs.trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
}

fn decode_component(raw: &str) -> Cow<'_, str> {
    if raw.contains('+') {
        let spaced = raw.replace('+', " ");
        let decoded = urlencoding::decode(&spaced)
            .map_or_else(|_| spaced.clone(), Cow::into_owned);
        Cow::Owned(decoded)
    } else {
        urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
    }
}
