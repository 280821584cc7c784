//! Shopping cart and order totals
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::money::percent_of_cents;
use crate::product::Product;
use crate::promo::AppliedPromo;

/// Most units of one product a single cart line can hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// A line item in the shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: u32,
    pub quantity: u32,
}

/// Shopping cart state. Lines keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

/// A cart line joined with its catalog product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLine<'a> {
    pub product: &'a Product,
    pub quantity: u32,
}

impl ResolvedLine<'_> {
    #[must_use]
    pub fn line_total_cents(&self) -> i64 {
        self.product.effective_price_cents() * i64::from(self.quantity)
    }
}

/// Money breakdown shown in the order summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl Cart {
    /// Create a new empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn find_line(&self, product_id: u32) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    fn find_line_mut(&mut self, product_id: u32) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }

    /// Add quantity to a product in the cart, capped at [`MAX_LINE_QUANTITY`].
    /// Returns the new quantity for that product.
    pub fn add_item(&mut self, product_id: u32, qty: u32) -> u32 {
        if qty == 0 {
            return self.quantity_of(product_id);
        }
        if let Some(line) = self.find_line_mut(product_id) {
            line.quantity = line.quantity.saturating_add(qty).min(MAX_LINE_QUANTITY);
            line.quantity
        } else {
            let quantity = qty.min(MAX_LINE_QUANTITY);
            self.lines.push(CartLine {
                product_id,
                quantity,
            });
            quantity
        }
    }

    /// Set the quantity of an existing line. Quantities below 1 are ignored,
    /// matching the quantity stepper which never drops a line on its own.
    /// Returns whether the cart changed.
    pub fn set_quantity(&mut self, product_id: u32, qty: u32) -> bool {
        if qty < 1 {
            return false;
        }
        let qty = qty.min(MAX_LINE_QUANTITY);
        match self.find_line_mut(product_id) {
            Some(line) if line.quantity != qty => {
                line.quantity = qty;
                true
            }
            _ => false,
        }
    }

    /// Remove a product's line entirely.
    pub fn remove_item(&mut self, product_id: u32) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    /// Clear the entire cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Get the current quantity of a product in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: u32) -> u32 {
        self.find_line(product_id).map_or(0, |line| line.quantity)
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Join lines with the catalog, dropping products that no longer exist.
    #[must_use]
    pub fn resolve<'a>(&self, catalog: &'a Catalog) -> Vec<ResolvedLine<'a>> {
        self.lines
            .iter()
            .filter_map(|line| {
                catalog.get(line.product_id).map(|product| ResolvedLine {
                    product,
                    quantity: line.quantity,
                })
            })
            .collect()
    }

    /// Subtotal of resolvable lines at effective prices.
    #[must_use]
    pub fn subtotal_cents(&self, catalog: &Catalog) -> i64 {
        self.resolve(catalog)
            .iter()
            .map(ResolvedLine::line_total_cents)
            .sum()
    }

    /// Totals: tax is charged on the full subtotal and the promo discount is
    /// taken off afterwards.
    #[must_use]
    pub fn summarize(
        &self,
        catalog: &Catalog,
        tax_rate_bps: u32,
        promo: Option<&AppliedPromo>,
    ) -> CartSummary {
        let subtotal_cents = self.subtotal_cents(catalog);
        let tax_cents = percent_of_cents(subtotal_cents, tax_rate_bps);
        let discount_cents = promo.map_or(0, |p| p.discount_cents.min(subtotal_cents));
        CartSummary {
            subtotal_cents,
            tax_cents,
            discount_cents,
            total_cents: subtotal_cents + tax_cents - discount_cents,
        }
    }
}
