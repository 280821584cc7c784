use anyhow::{Result, ensure};
use rand_chacha::ChaCha8Rng;
use zafago_store::FilterCriteria;

use super::ScenarioCtx;

/// The embedded store loads and the unfiltered listing is the catalog.
pub fn check(ctx: &ScenarioCtx<'_>, _rng: &mut ChaCha8Rng) -> Result<()> {
    let catalog = ctx.store.catalog();
    ensure!(!catalog.is_empty(), "catalog should not be empty");

    let criteria = ctx.store.criteria_for_location("");
    let listing = ctx.store.listing(&criteria);
    let catalog_ids: Vec<u32> = catalog.products().iter().map(|p| p.id).collect();
    ensure!(
        listing.ids() == catalog_ids,
        "default listing {:?} should equal catalog order {catalog_ids:?}",
        listing.ids()
    );
    ensure!(
        listing.headline() == format!("Showing {} games", catalog.len()),
        "unexpected headline '{}'",
        listing.headline()
    );

    let featured = ctx.store.featured();
    ensure!(
        featured.len() == ctx.store.config().featured_count.min(catalog.len()),
        "featured row has {} games",
        featured.len()
    );

    let nothing = ctx
        .store
        .listing(&FilterCriteria::new().with_query("zzzz-no-such-game"));
    ensure!(nothing.is_empty(), "nonsense query should match nothing");
    ensure!(nothing.headline() == "Showing 0 games", "empty headline");
    Ok(())
}
