//! Terminal rendering of a storefront listing.
use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use zafago_store::{FilterCriteria, Listing, Product, SortKey, Storefront, format_cents};

use crate::util::{parse_price, split_csv};

/// Browse selections as they arrive from the command line.
#[derive(Debug, Clone, Default)]
pub struct BrowseRequest {
    pub search: Option<String>,
    pub location: Option<String>,
    pub platforms: Option<String>,
    pub genres: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<SortKey>,
}

impl BrowseRequest {
    /// Resolve into listing criteria on top of the store defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the price is not a non-negative amount. Prices
    /// above the slider maximum are clamped to it.
    pub fn criteria(&self, store: &Storefront) -> Result<FilterCriteria> {
        let mut criteria = store.criteria_for_location(self.location.as_deref().unwrap_or(""));
        if let Some(search) = &self.search {
            criteria = criteria.with_query(search.as_str());
        }
        if let Some(platforms) = &self.platforms {
            criteria = criteria.with_platforms(split_csv(platforms));
        }
        if let Some(genres) = &self.genres {
            criteria = criteria.with_genres(split_csv(genres));
        }
        if let Some(max_price) = &self.max_price {
            criteria = store.with_price_ceiling(criteria, parse_price(max_price)?);
        }
        if let Some(sort) = self.sort {
            criteria = criteria.with_sort(sort);
        }
        Ok(criteria)
    }
}

fn price_label(product: &Product) -> String {
    let effective = product.effective_price_cents();
    if effective == 0 {
        return "Free".green().to_string();
    }
    if product.has_discount() {
        format!(
            "{} {} {}",
            format_cents(effective).green().bold(),
            format_cents(product.price_cents).dimmed().strikethrough(),
            format!("-{}%", product.savings_pct()).bright_red()
        )
    } else {
        format_cents(effective).bold().to_string()
    }
}

/// Write the listing the way the catalog page shows it.
pub fn render_listing<W: Write + ?Sized>(
    out: &mut W,
    criteria: &FilterCriteria,
    listing: &Listing<'_>,
) -> Result<()> {
    writeln!(out, "{}", listing.headline().bright_white().bold())?;
    writeln!(
        out,
        "Sort: {} | Active filters: {} | Max price: {}",
        criteria.sort.label(),
        criteria.active_filter_count(),
        format_cents(criteria.price_ceiling_cents)
    )?;
    writeln!(out, "{}", "-".repeat(60).dimmed())?;

    if listing.is_empty() {
        writeln!(out, "No games found. Try adjusting your filters.")?;
        return Ok(());
    }

    for product in listing.iter() {
        writeln!(
            out,
            "{:>3}  {}  {}",
            product.id,
            product.title.bold(),
            price_label(product)
        )?;
        writeln!(
            out,
            "     {} | {} | ★ {:.1} ({} reviews)",
            product.platforms.join(", ").cyan(),
            product.genres.join(", "),
            product.rating,
            product.review_count
        )?;
    }
    Ok(())
}

/// Resolve `request` against `store` and render the result.
///
/// # Errors
///
/// Returns an error if the request is invalid or output fails.
pub fn browse<W: Write + ?Sized>(
    out: &mut W,
    store: &Storefront,
    request: &BrowseRequest,
) -> Result<()> {
    let criteria = request.criteria(store)?;
    let listing = store.listing(&criteria);
    render_listing(out, &criteria, &listing)
}
