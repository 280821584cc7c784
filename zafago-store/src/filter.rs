//! Catalog filter/sort engine.
//!
//! [`apply`] is a pure function of (catalog, criteria). Each stage narrows or
//! reorders the working set; none can fail. Every call recomputes from scratch.

use std::cmp::Ordering;

use crate::collate::compare_titles;
use crate::criteria::{FilterCriteria, SortKey};
use crate::product::Product;

/// Lowest price the range control can express.
pub const PRICE_FLOOR_CENTS: i64 = 0;

/// Filter and order `catalog` according to `criteria`.
///
/// Equal sort keys keep their catalog order; `SortKey::Featured` keeps catalog
/// order outright. No matches is an empty vector, not an error.
#[must_use]
pub fn apply<'a>(catalog: &'a [Product], criteria: &FilterCriteria) -> Vec<&'a Product> {
    let folded_query = criteria.query.to_lowercase();
    let mut visible: Vec<&Product> = catalog
        .iter()
        .filter(|p| matches_query(p, &folded_query))
        .filter(|p| matches_category(p, criteria.category.as_deref()))
        .filter(|p| matches_location_platform(p, criteria.platform.as_deref()))
        .filter(|p| matches_selected_platforms(p, &criteria.platforms))
        .filter(|p| matches_selected_genres(p, &criteria.genres))
        .filter(|p| within_price(p, criteria.price_ceiling_cents))
        .collect();

    sort_products(&mut visible, criteria.sort);

    log::debug!(
        "listing recomputed: {} of {} products visible (sort {})",
        visible.len(),
        catalog.len(),
        criteria.sort
    );
    visible
}

/// Ordered result of a listing recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<'a> {
    pub products: Vec<&'a Product>,
}

impl<'a> Listing<'a> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<u32> {
        self.products.iter().map(|p| p.id).collect()
    }

    /// "Showing N games" line above the grid.
    #[must_use]
    pub fn headline(&self) -> String {
        let noun = if self.len() == 1 { "game" } else { "games" };
        format!("Showing {} {noun}", self.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Product> + '_ {
        self.products.iter().copied()
    }
}

/// [`apply`] wrapped in a [`Listing`].
#[must_use]
pub fn list<'a>(catalog: &'a [Product], criteria: &FilterCriteria) -> Listing<'a> {
    Listing {
        products: apply(catalog, criteria),
    }
}

fn matches_query(product: &Product, folded_query: &str) -> bool {
    folded_query.is_empty() || product.matches_text(folded_query)
}

fn matches_category(product: &Product, category: Option<&str>) -> bool {
    category.is_none_or(|genre| product.has_genre_ignore_case(genre))
}

fn matches_location_platform(product: &Product, platform: Option<&str>) -> bool {
    platform.is_none_or(|platform| product.has_platform_ignore_case(platform))
}

fn matches_selected_platforms(product: &Product, selected: &[String]) -> bool {
    selected.is_empty() || product.has_any_platform(selected)
}

fn matches_selected_genres(product: &Product, selected: &[String]) -> bool {
    selected.is_empty() || product.has_any_genre(selected)
}

fn within_price(product: &Product, ceiling_cents: i64) -> bool {
    let price = product.effective_price_cents();
    PRICE_FLOOR_CENTS <= price && price <= ceiling_cents
}

/// `sort_by` is a stable merge sort, which the tie rules depend on.
fn sort_products(products: &mut [&Product], key: SortKey) {
    match key {
        SortKey::Featured => {}
        SortKey::PriceAsc => products.sort_by_key(|p| p.effective_price_cents()),
        SortKey::PriceDesc => {
            products.sort_by(|a, b| b.effective_price_cents().cmp(&a.effective_price_cents()));
        }
        SortKey::NameAsc => products.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortKey::NameDesc => products.sort_by(|a, b| compare_titles(&b.title, &a.title)),
        SortKey::RatingDesc => products.sort_by(|a, b| compare_ratings_desc(a, b)),
        SortKey::Newest => products.sort_by(|a, b| b.release_date.cmp(&a.release_date)),
    }
}

fn compare_ratings_desc(a: &Product, b: &Product) -> Ordering {
    b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
}
