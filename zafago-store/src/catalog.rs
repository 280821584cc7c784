//! Static product catalog and its facets
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::product::{Product, TagSet};

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/games.json");

static EMBEDDED: Lazy<Catalog> = Lazy::new(|| {
    Catalog::from_json(DEFAULT_CATALOG_DATA).unwrap_or_else(|err| {
        log::error!("embedded catalog rejected: {err}");
        Catalog::empty()
    })
});

/// Errors raised when catalog invariants are violated at load time.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog data could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("product id {id} appears more than once")]
    DuplicateId { id: u32 },
    #[error("product {id} has a negative price ({price_cents} cents)")]
    NegativePrice { id: u32, price_cents: i64 },
    #[error("product {id} discount {discounted_cents} exceeds base price {price_cents}")]
    DiscountExceedsPrice {
        id: u32,
        price_cents: i64,
        discounted_cents: i64,
    },
    #[error("product {id} has no {field}")]
    EmptyTags { id: u32, field: &'static str },
    #[error("product {id} rating {rating:.2} is outside 0-5")]
    RatingOutOfRange { id: u32, rating: f32 },
}

#[derive(Deserialize)]
struct CatalogFile {
    products: Vec<Product>,
}

/// Immutable, validated collection of products in ranking order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Validate and wrap a product list. Catalog order is preserved; it doubles
    /// as the "featured" ranking.
    ///
    /// # Errors
    ///
    /// Returns an error if ids repeat, prices are inconsistent, tag sets are
    /// empty or a rating falls outside 0-5.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(product.id) {
                return Err(CatalogError::DuplicateId { id: product.id });
            }
            validate_product(product)?;
        }
        Ok(Self { products })
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// Load a catalog from a JSON document of the form `{"products": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a product fails validation.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.products)
    }

    /// The compiled-in catalog, parsed once per process.
    #[must_use]
    pub fn load_from_static() -> &'static Self {
        &EMBEDDED
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Every platform in first-appearance order.
    #[must_use]
    pub fn platforms(&self) -> Vec<&str> {
        unique_tags(self.products.iter().map(|p| &p.platforms))
    }

    /// Every genre in first-appearance order.
    #[must_use]
    pub fn genres(&self) -> Vec<&str> {
        unique_tags(self.products.iter().map(|p| &p.genres))
    }

    /// Highest effective price in the catalog, 0 when empty.
    #[must_use]
    pub fn max_effective_price_cents(&self) -> i64 {
        self.products
            .iter()
            .map(Product::effective_price_cents)
            .max()
            .unwrap_or(0)
    }

    /// Leading `count` products, used by the home page.
    #[must_use]
    pub fn featured(&self, count: usize) -> &[Product] {
        &self.products[..count.min(self.products.len())]
    }

    /// Other products sharing at least one genre with `id`, in catalog order.
    /// Unknown ids have no related products.
    #[must_use]
    pub fn related(&self, id: u32, limit: usize) -> Vec<&Product> {
        let Some(anchor) = self.get(id) else {
            return Vec::new();
        };
        self.products
            .iter()
            .filter(|p| p.id != anchor.id && p.shares_genre_with(anchor))
            .take(limit)
            .collect()
    }
}

fn validate_product(product: &Product) -> Result<(), CatalogError> {
    let id = product.id;
    if product.price_cents < 0 {
        return Err(CatalogError::NegativePrice {
            id,
            price_cents: product.price_cents,
        });
    }
    if let Some(discounted) = product.discounted_price_cents {
        if discounted < 0 {
            return Err(CatalogError::NegativePrice {
                id,
                price_cents: discounted,
            });
        }
        if discounted > product.price_cents {
            return Err(CatalogError::DiscountExceedsPrice {
                id,
                price_cents: product.price_cents,
                discounted_cents: discounted,
            });
        }
    }
    if product.platforms.is_empty() {
        return Err(CatalogError::EmptyTags {
            id,
            field: "platforms",
        });
    }
    if product.genres.is_empty() {
        return Err(CatalogError::EmptyTags { id, field: "genres" });
    }
    if !(0.0..=5.0).contains(&product.rating) {
        return Err(CatalogError::RatingOutOfRange {
            id,
            rating: product.rating,
        });
    }
    Ok(())
}

fn unique_tags<'a>(sets: impl Iterator<Item = &'a TagSet>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for tag in sets.flatten() {
        if seen.insert(tag.as_str()) {
            out.push(tag.as_str());
        }
    }
    out
}

/// Supplies the catalog at startup. Platform layers decide where it comes from.
pub trait CatalogSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the full catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be produced.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;
}

/// Catalog source backed by the compiled-in `games.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalog;

impl CatalogSource for EmbeddedCatalog {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Catalog::from_json(DEFAULT_CATALOG_DATA)
    }
}
