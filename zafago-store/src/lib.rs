//! Zafago Storefront Core
//!
//! Platform-agnostic catalog, listing and purchase logic for the Zafago game
//! key store. Rendering, routing and persistence live in the layers above.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod collate;
pub mod config;
pub mod criteria;
pub mod filter;
pub mod keys;
pub mod money;
pub mod product;
pub mod profile;
pub mod promo;

pub use cart::{Cart, CartLine, CartSummary, MAX_LINE_QUANTITY, ResolvedLine};
pub use catalog::{Catalog, CatalogError, CatalogSource, EmbeddedCatalog};
pub use checkout::{
    BillingDetails, ChargeRequest, CheckoutError, CheckoutRequest, MockGateway, Order, OrderLine,
    OrderStatus, PaymentError, PaymentGateway, PaymentMethod, PaymentReceipt, ValidationError,
    place_order,
};
pub use collate::compare_titles;
pub use config::{ConfigError, StoreConfig};
pub use criteria::{FilterCriteria, ParseSortKeyError, SortKey};
pub use filter::{Listing, apply, list};
pub use keys::{KeyIssuer, KeySecretError, is_well_formed_key};
pub use money::format_cents;
pub use product::{Product, TagSet};
pub use profile::{NotificationPrefs, OwnedGame, Profile};
pub use promo::{AppliedPromo, PromoError, PromoService, StaticPromoCodes};

use anyhow::Context;

/// Storefront facade: one catalog and one configuration shared by the
/// listing, product, cart and checkout pages.
#[derive(Debug, Clone)]
pub struct Storefront {
    catalog: Catalog,
    config: StoreConfig,
    promos: StaticPromoCodes,
    issuer: KeyIssuer,
}

impl Storefront {
    /// Build a storefront from any catalog source.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or the configuration
    /// is invalid.
    pub fn new<S>(source: &S, config: StoreConfig) -> anyhow::Result<Self>
    where
        S: CatalogSource,
    {
        config.validate().context("invalid store config")?;
        let catalog = source.load_catalog().context("failed to load catalog")?;
        let issuer =
            KeyIssuer::new(config.key_secret.as_bytes()).context("failed to key order issuer")?;
        log::info!(
            "storefront ready: {} games, {} promo codes",
            catalog.len(),
            config.promo_codes.len()
        );
        Ok(Self {
            promos: StaticPromoCodes::new(&config.promo_codes),
            catalog,
            config,
            issuer,
        })
    }

    /// Storefront over the compiled-in catalog and configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded data is unusable.
    pub fn embedded() -> anyhow::Result<Self> {
        Self::new(&EmbeddedCatalog, StoreConfig::load_from_static())
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub const fn key_issuer(&self) -> &KeyIssuer {
        &self.issuer
    }

    /// Criteria for a fresh visit to the listing with the given location
    /// query string, using the configured price ceiling.
    #[must_use]
    pub fn criteria_for_location(&self, query_string: &str) -> FilterCriteria {
        let mut criteria =
            FilterCriteria::new().with_price_ceiling_cents(self.config.default_price_ceiling_cents);
        criteria.merge_location(query_string);
        criteria
    }

    /// Set a shopper-chosen price ceiling, clamped to the slider range.
    #[must_use]
    pub fn with_price_ceiling(&self, criteria: FilterCriteria, ceiling_cents: i64) -> FilterCriteria {
        criteria.with_price_ceiling_cents(ceiling_cents.min(self.config.price_slider_max_cents))
    }

    /// Products above the slider maximum never show, whatever ceiling the
    /// criteria carry.
    #[must_use]
    pub fn listing(&self, criteria: &FilterCriteria) -> Listing<'_> {
        if criteria.price_ceiling_cents > self.config.price_slider_max_cents {
            let clamped = self.with_price_ceiling(criteria.clone(), criteria.price_ceiling_cents);
            return list(self.catalog.products(), &clamped);
        }
        list(self.catalog.products(), criteria)
    }

    #[must_use]
    pub fn product(&self, id: u32) -> Option<&Product> {
        self.catalog.get(id)
    }

    /// "You might also like" for a product page.
    #[must_use]
    pub fn related(&self, id: u32) -> Vec<&Product> {
        self.catalog.related(id, self.config.related_limit)
    }

    /// Home page featured row.
    #[must_use]
    pub fn featured(&self) -> &[Product] {
        self.catalog.featured(self.config.featured_count)
    }

    /// Redeem a promo code against the cart's current subtotal.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty or unknown.
    pub fn redeem_promo(&self, code: &str, cart: &Cart) -> Result<AppliedPromo, PromoError> {
        self.promos.redeem(code, cart.subtotal_cents(&self.catalog))
    }

    #[must_use]
    pub fn summarize(&self, cart: &Cart, promo: Option<&AppliedPromo>) -> CartSummary {
        cart.summarize(&self.catalog, self.config.tax_rate_bps, promo)
    }

    /// Place an order through `gateway`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty, the form is invalid, or the
    /// payment fails.
    pub fn checkout(
        &self,
        request: &CheckoutRequest<'_>,
        gateway: &dyn PaymentGateway,
    ) -> Result<Order, CheckoutError> {
        place_order(
            request,
            &self.catalog,
            self.config.tax_rate_bps,
            &self.issuer,
            gateway,
        )
    }
}
