use anyhow::Result;
use rand_chacha::ChaCha8Rng;
use zafago_store::Storefront;

pub mod listing;
pub mod properties;
pub mod purchase;
pub mod smoke;

/// What a scenario iteration can see.
pub struct ScenarioCtx<'a> {
    pub store: &'a Storefront,
    pub seed: u64,
    pub iteration: usize,
}

pub type ScenarioCheck = fn(&ScenarioCtx<'_>, &mut ChaCha8Rng) -> Result<()>;

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub check: ScenarioCheck,
}

impl TestScenario {
    #[must_use]
    pub fn new(name: impl Into<String>, check: ScenarioCheck) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let scenario = match name.to_lowercase().as_str() {
        "smoke" => TestScenario::new("Smoke Test", smoke::check),
        "listing-filters" | "filters" => {
            TestScenario::new("Listing Filter Expectations", listing::check_filters)
        }
        "listing-sorts" | "sorts" => TestScenario::new("Listing Sort Orders", listing::check_sorts),
        "location-params" | "location" => {
            TestScenario::new("Location Query Merging", listing::check_location)
        }
        "product-pages" | "products" => TestScenario::new(
            "Product Detail and Related Games",
            listing::check_product_pages,
        ),
        "filter-properties" | "properties" => TestScenario::new(
            "Randomised Filter Properties",
            properties::check_filter_properties,
        ),
        "listing-determinism" | "determinism" => TestScenario::new(
            "Listing Fingerprint Determinism",
            properties::check_determinism,
        ),
        "cart-totals" | "cart" => {
            TestScenario::new("Cart Totals and Promo Codes", purchase::check_cart_totals)
        }
        "checkout-flow" | "checkout" => {
            TestScenario::new("Checkout and Key Delivery", purchase::check_checkout)
        }
        _ => return None,
    };
    Some(scenario)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("listing-filters", "Listing Filter Expectations"),
        ("listing-sorts", "Listing Sort Orders"),
        ("location-params", "Location Query Merging"),
        ("product-pages", "Product Detail and Related Games"),
        ("filter-properties", "Randomised Filter Properties"),
        ("listing-determinism", "Listing Fingerprint Determinism"),
        ("cart-totals", "Cart Totals and Promo Codes"),
        ("checkout-flow", "Checkout and Key Delivery"),
    ]
}
