use anyhow::{Result, ensure};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::hash::Hasher;
use twox_hash::XxHash64;
use zafago_store::{Catalog, FilterCriteria, Product, SortKey, Storefront, apply};

use super::ScenarioCtx;
use super::listing::check_sorted;

/// Draw criteria that exercise every filter stage with plausible values.
pub fn random_criteria(catalog: &Catalog, slider_max_cents: i64, rng: &mut ChaCha8Rng) -> FilterCriteria {
    let mut criteria = FilterCriteria::new();
    if rng.gen_bool(0.4) {
        criteria.query = random_term(catalog, rng);
    }
    let genres = catalog.genres();
    let platforms = catalog.platforms();
    if rng.gen_bool(0.3) {
        criteria.category = genres.choose(rng).map(|g| (*g).to_string());
    }
    if rng.gen_bool(0.2) {
        criteria.platform = platforms.choose(rng).map(|p| (*p).to_string());
    }
    let platform_picks = rng.gen_range(0..=2);
    for platform in platforms.choose_multiple(rng, platform_picks) {
        criteria.toggle_platform(platform);
    }
    let genre_picks = rng.gen_range(0..=2);
    for genre in genres.choose_multiple(rng, genre_picks) {
        criteria.toggle_genre(genre);
    }
    criteria.price_ceiling_cents = if rng.gen_bool(0.5) {
        slider_max_cents
    } else {
        rng.gen_range(0..=slider_max_cents)
    };
    criteria.sort = SortKey::ALL.choose(rng).copied().unwrap_or_default();
    criteria
}

/// A lowercase fragment of some product's title.
fn random_term(catalog: &Catalog, rng: &mut ChaCha8Rng) -> String {
    let Some(product) = catalog.products().choose(rng) else {
        return String::new();
    };
    let words: Vec<&str> = product.title.split_whitespace().collect();
    let word = words.choose(rng).copied().unwrap_or_default();
    let chars: Vec<char> = word.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    let len = rng.gen_range(1..=chars.len());
    chars[..len].iter().collect::<String>().to_lowercase()
}

/// Tighten exactly one filter so the result can only shrink.
fn narrow(criteria: &FilterCriteria, catalog: &Catalog, rng: &mut ChaCha8Rng) -> FilterCriteria {
    let mut narrowed = criteria.clone();
    match rng.gen_range(0..4) {
        0 => narrowed.price_ceiling_cents = rng.gen_range(-1..=criteria.price_ceiling_cents.max(0)),
        1 if criteria.category.is_none() => {
            narrowed.category = catalog.genres().choose(rng).map(|g| (*g).to_string());
        }
        2 if criteria.platforms.is_empty() => {
            if let Some(platform) = catalog.platforms().choose(rng) {
                narrowed.toggle_platform(platform);
            }
        }
        _ => {
            let extra = random_term(catalog, rng);
            narrowed.query = format!("{}{extra}", criteria.query);
        }
    }
    narrowed
}

fn ids(products: &[&Product]) -> Vec<u32> {
    products.iter().map(|p| p.id).collect()
}

/// Identity, idempotence, monotonicity and stability over random criteria.
pub fn check_filter_properties(ctx: &ScenarioCtx<'_>, rng: &mut ChaCha8Rng) -> Result<()> {
    let catalog = ctx.store.catalog();
    let products = catalog.products();
    let slider_max = ctx.store.config().price_slider_max_cents;

    let everything = FilterCriteria::new().with_price_ceiling_cents(catalog.max_effective_price_cents());
    let identity = ids(&apply(products, &everything));
    let catalog_ids: Vec<u32> = products.iter().map(|p| p.id).collect();
    ensure!(identity == catalog_ids, "featured sort with no filters must return the catalog");

    for _ in 0..8 {
        let criteria = random_criteria(catalog, slider_max, rng);
        let first = apply(products, &criteria);

        let owned: Vec<Product> = first.iter().map(|p| (*p).clone()).collect();
        let second = apply(&owned, &criteria);
        ensure!(
            ids(&first) == ids(&second),
            "re-applying {criteria:?} changed {:?} into {:?}",
            ids(&first),
            ids(&second)
        );

        check_sorted(criteria.sort, &first, products)?;

        let narrowed = narrow(&criteria, catalog, rng);
        let wide = ids(&first);
        let narrow_ids = ids(&apply(products, &narrowed));
        ensure!(
            narrow_ids.iter().all(|id| wide.contains(id)),
            "narrowing {criteria:?} to {narrowed:?} added products: {narrow_ids:?} vs {wide:?}"
        );
    }
    Ok(())
}

/// Stable 64-bit fingerprint of a listing's order.
pub fn fingerprint(products: &[&Product]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for product in products {
        hasher.write(&product.id.to_le_bytes());
    }
    hasher.finish()
}

/// Independent storefronts produce identical listings for the same criteria.
pub fn check_determinism(ctx: &ScenarioCtx<'_>, rng: &mut ChaCha8Rng) -> Result<()> {
    let fresh = Storefront::embedded()?;
    let slider_max = ctx.store.config().price_slider_max_cents;
    for _ in 0..8 {
        let criteria = random_criteria(ctx.store.catalog(), slider_max, rng);
        let a = fingerprint(&ctx.store.listing(&criteria).products);
        let b = fingerprint(&ctx.store.listing(&criteria).products);
        let c = fingerprint(&fresh.listing(&criteria).products);
        ensure!(a == b && b == c, "fingerprints diverged for {criteria:?}: {a:x} {b:x} {c:x}");
    }
    Ok(())
}
