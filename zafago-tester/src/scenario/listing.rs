use anyhow::{Result, ensure};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;
use zafago_store::{FilterCriteria, Product, SortKey, compare_titles};

use super::ScenarioCtx;

/// Ordering a listing sorted by `key` must respect between two products.
pub fn compare_for_sort(key: SortKey, a: &Product, b: &Product) -> Ordering {
    match key {
        SortKey::Featured => Ordering::Equal,
        SortKey::PriceAsc => a.effective_price_cents().cmp(&b.effective_price_cents()),
        SortKey::PriceDesc => b.effective_price_cents().cmp(&a.effective_price_cents()),
        SortKey::NameAsc => compare_titles(&a.title, &b.title),
        SortKey::NameDesc => compare_titles(&b.title, &a.title),
        SortKey::RatingDesc => b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal),
        SortKey::Newest => b.release_date.cmp(&a.release_date),
    }
}

/// Check `listing` is ordered by `key` and ties keep catalog order.
pub fn check_sorted(key: SortKey, listing: &[&Product], catalog: &[Product]) -> Result<()> {
    let position = |id: u32| catalog.iter().position(|p| p.id == id);
    for pair in listing.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        match compare_for_sort(key, a, b) {
            Ordering::Greater => anyhow::bail!(
                "sort {key}: '{}' should not precede '{}'",
                a.title,
                b.title
            ),
            Ordering::Equal => ensure!(
                position(a.id) < position(b.id),
                "sort {key}: tie between '{}' and '{}' broke catalog order",
                a.title,
                b.title
            ),
            Ordering::Less => {}
        }
    }
    Ok(())
}

fn ids(products: &[&Product]) -> Vec<u32> {
    products.iter().map(|p| p.id).collect()
}

/// Each single filter selects exactly the products that satisfy it.
pub fn check_filters(ctx: &ScenarioCtx<'_>, rng: &mut ChaCha8Rng) -> Result<()> {
    let catalog = ctx.store.catalog();
    let base = ctx.store.criteria_for_location("");

    for genre in catalog.genres() {
        let criteria = base.clone().with_category(genre.to_uppercase());
        let expected: Vec<u32> = catalog
            .products()
            .iter()
            .filter(|p| p.has_genre_ignore_case(genre))
            .filter(|p| p.effective_price_cents() <= base.price_ceiling_cents)
            .map(|p| p.id)
            .collect();
        let got = ctx.store.listing(&criteria).ids();
        ensure!(got == expected, "category {genre}: got {got:?}, expected {expected:?}");
    }

    for platform in catalog.platforms() {
        let criteria = base.clone().with_platforms([platform]);
        let got = ctx.store.listing(&criteria);
        ensure!(
            got.iter().all(|p| p.platforms.iter().any(|t| t == platform)),
            "platform toggle {platform} let through a product without it"
        );
        let missing = catalog
            .products()
            .iter()
            .filter(|p| p.platforms.iter().any(|t| t == platform))
            .filter(|p| p.effective_price_cents() <= base.price_ceiling_cents)
            .any(|p| !got.ids().contains(&p.id));
        ensure!(!missing, "platform toggle {platform} dropped a matching product");
    }

    let mut products: Vec<&Product> = catalog.products().iter().collect();
    products.shuffle(rng);
    for product in products.iter().take(4) {
        let query = product.title.to_lowercase();
        let found = ctx.store.listing(&base.clone().with_query(&query)).ids();
        ensure!(found.contains(&product.id), "query '{query}' missed its own title");

        let price = product.effective_price_cents();
        let at = ctx.store.listing(&base.clone().with_price_ceiling_cents(price)).ids();
        ensure!(at.contains(&product.id), "ceiling {price} should include '{}'", product.title);
        let below = ctx
            .store
            .listing(&base.clone().with_price_ceiling_cents(price - 1))
            .ids();
        ensure!(!below.contains(&product.id), "ceiling {} should exclude '{}'", price - 1, product.title);
    }

    let none = ctx.store.listing(&base.clone().with_price_ceiling_cents(-1));
    ensure!(none.is_empty(), "negative ceiling should hide everything");
    Ok(())
}

/// Every sort key yields a stable ordering of the same products.
pub fn check_sorts(ctx: &ScenarioCtx<'_>, _rng: &mut ChaCha8Rng) -> Result<()> {
    let catalog = ctx.store.catalog();
    let base = ctx.store.criteria_for_location("");
    let mut unsorted = ctx.store.listing(&base).ids();
    unsorted.sort_unstable();

    for key in SortKey::ALL {
        let listing = ctx.store.listing(&base.clone().with_sort(key));
        let mut got = listing.ids();
        check_sorted(key, &listing.products, catalog.products())?;
        got.sort_unstable();
        ensure!(got == unsorted, "sort {key} changed the product set");
    }

    let asc = ids(&ctx.store.listing(&base.clone().with_sort(SortKey::NameAsc)).products);
    let mut desc = ids(&ctx.store.listing(&base.clone().with_sort(SortKey::NameDesc)).products);
    desc.reverse();
    ensure!(asc == desc, "name-desc should mirror name-asc for distinct titles");
    Ok(())
}

/// Location parameters replace only the location-derived fields.
pub fn check_location(ctx: &ScenarioCtx<'_>, _rng: &mut ChaCha8Rng) -> Result<()> {
    let criteria = ctx
        .store
        .criteria_for_location("?category=Open+World&platform=Steam");
    ensure!(
        criteria.category.as_deref() == Some("Open World"),
        "category should decode '+' as space, got {:?}",
        criteria.category
    );
    ensure!(criteria.platform.as_deref() == Some("Steam"), "platform param");

    let encoded = ctx.store.criteria_for_location("category=Open%20World");
    ensure!(encoded.category.as_deref() == Some("Open World"), "percent decoding");

    let mut in_page = criteria
        .clone()
        .with_query("ring")
        .with_platforms(["GOG"])
        .with_sort(SortKey::PriceAsc);
    in_page.merge_location("category=RPG");
    ensure!(in_page.category.as_deref() == Some("RPG"), "category replaced");
    ensure!(in_page.platform.is_none(), "missing platform param should clear it");
    ensure!(in_page.query == "ring", "query survives navigation");
    ensure!(in_page.platforms == ["GOG"], "toggled platforms survive navigation");
    ensure!(in_page.sort == SortKey::PriceAsc, "sort survives navigation");

    in_page.reset();
    ensure!(in_page.category.as_deref() == Some("RPG"), "reset keeps location category");
    ensure!(in_page.query.is_empty() && in_page.platforms.is_empty(), "reset clears selections");
    ensure!(in_page.sort == SortKey::Featured, "reset restores featured sort");

    let blank = FilterCriteria::from_query_string("category=&platform=");
    ensure!(blank.category.is_none() && blank.platform.is_none(), "empty params are ignored");
    Ok(())
}

/// Product pages resolve, price math holds and related games are relevant.
pub fn check_product_pages(ctx: &ScenarioCtx<'_>, _rng: &mut ChaCha8Rng) -> Result<()> {
    let catalog = ctx.store.catalog();
    let limit = ctx.store.config().related_limit;
    for product in catalog.products() {
        ensure!(
            ctx.store.product(product.id).map(|p| p.id) == Some(product.id),
            "product {} should resolve",
            product.id
        );
        ensure!(
            product.effective_price_cents() <= product.price_cents,
            "'{}' sells above list price",
            product.title
        );
        if product.has_discount() {
            ensure!(
                product.savings_pct() <= 100 && product.savings_cents() >= 0,
                "'{}' savings out of range",
                product.title
            );
        }

        let related = ctx.store.related(product.id);
        ensure!(related.len() <= limit, "'{}' has too many related games", product.title);
        for other in &related {
            ensure!(other.id != product.id, "'{}' lists itself as related", product.title);
            ensure!(
                other.shares_genre_with(product),
                "'{}' related to '{}' without a shared genre",
                other.title,
                product.title
            );
        }
        let positions: Vec<Option<usize>> = related
            .iter()
            .map(|r| catalog.products().iter().position(|p| p.id == r.id))
            .collect();
        ensure!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "related games for '{}' should keep catalog order",
            product.title
        );
    }
    ensure!(ctx.store.product(u32::MAX).is_none(), "unknown id should not resolve");
    Ok(())
}
