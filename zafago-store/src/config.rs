//! Storefront configuration
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::criteria::DEFAULT_PRICE_CEILING_CENTS;
use crate::money::BPS_SCALE;

const DEFAULT_STORE_DATA: &str = include_str!("../assets/store.json");

/// Pricing and presentation knobs shared by the listing, cart and checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Sales tax in basis points (500 = 5%)
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,
    #[serde(default = "default_price_ceiling")]
    pub default_price_ceiling_cents: i64,
    /// Upper end of the price range control
    #[serde(default = "default_price_ceiling")]
    pub price_slider_max_cents: i64,
    #[serde(default = "default_featured_count")]
    pub featured_count: usize,
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
    /// Promo code -> whole percent off the subtotal
    #[serde(default)]
    pub promo_codes: BTreeMap<String, u32>,
    /// Secret used to derive order ids and activation keys
    #[serde(default = "default_key_secret")]
    pub key_secret: String,
}

const fn default_tax_rate_bps() -> u32 {
    500
}

const fn default_price_ceiling() -> i64 {
    DEFAULT_PRICE_CEILING_CENTS
}

const fn default_featured_count() -> usize {
    6
}

const fn default_related_limit() -> usize {
    4
}

fn default_key_secret() -> String {
    "zafago".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tax_rate_bps: default_tax_rate_bps(),
            default_price_ceiling_cents: default_price_ceiling(),
            price_slider_max_cents: default_price_ceiling(),
            featured_count: default_featured_count(),
            related_limit: default_related_limit(),
            promo_codes: BTreeMap::new(),
            key_secret: default_key_secret(),
        }
    }
}

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("store config could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tax rate {bps} bps exceeds 100%")]
    TaxRate { bps: u32 },
    #[error("{field} must not be negative (got {value})")]
    NegativeAmount { field: &'static str, value: i64 },
    #[error("default price ceiling {ceiling} exceeds slider max {max}")]
    CeilingAboveSlider { ceiling: i64, max: i64 },
    #[error("promo code '{code}' grants {pct}% which is outside 1-100")]
    PromoPercent { code: String, pct: u32 },
    #[error("key secret must not be empty")]
    EmptySecret,
}

impl StoreConfig {
    /// Parse and validate configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Embedded configuration, falling back to defaults if it is unusable.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_STORE_DATA).unwrap_or_else(|err| {
            log::warn!("embedded store config rejected, using defaults: {err}");
            Self::default()
        })
    }

    /// Check cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if i64::from(self.tax_rate_bps) > BPS_SCALE {
            return Err(ConfigError::TaxRate {
                bps: self.tax_rate_bps,
            });
        }
        for (field, value) in [
            ("default_price_ceiling_cents", self.default_price_ceiling_cents),
            ("price_slider_max_cents", self.price_slider_max_cents),
        ] {
            if value < 0 {
                return Err(ConfigError::NegativeAmount { field, value });
            }
        }
        if self.default_price_ceiling_cents > self.price_slider_max_cents {
            return Err(ConfigError::CeilingAboveSlider {
                ceiling: self.default_price_ceiling_cents,
                max: self.price_slider_max_cents,
            });
        }
        if let Some((code, pct)) = self
            .promo_codes
            .iter()
            .find(|(_, pct)| !(1..=100).contains(*pct))
        {
            return Err(ConfigError::PromoPercent {
                code: code.clone(),
                pct: *pct,
            });
        }
        if self.key_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_loads() {
        let cfg = StoreConfig::load_from_static();
        assert_eq!(cfg.tax_rate_bps, 500);
        assert_eq!(cfg.default_price_ceiling_cents, 10_000);
        assert_eq!(cfg.featured_count, 6);
        assert_eq!(cfg.related_limit, 4);
        assert_eq!(cfg.promo_codes.get("zafago10"), Some(&10));
        assert_eq!(cfg.promo_codes.get("welcome20"), Some(&20));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let cfg = StoreConfig::from_json("{}").unwrap();
        assert_eq!(cfg, StoreConfig::default());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            StoreConfig::from_json(r#"{"tax_rate_bps": 20000}"#),
            Err(ConfigError::TaxRate { bps: 20000 })
        ));
        assert!(matches!(
            StoreConfig::from_json(r#"{"default_price_ceiling_cents": 20000}"#),
            Err(ConfigError::CeilingAboveSlider { .. })
        ));
        assert!(matches!(
            StoreConfig::from_json(r#"{"price_slider_max_cents": -5}"#),
            Err(ConfigError::NegativeAmount {
                field: "price_slider_max_cents",
                ..
            })
        ));
        assert!(matches!(
            StoreConfig::from_json(r#"{"promo_codes": {"free": 0}}"#),
            Err(ConfigError::PromoPercent { .. })
        ));
        assert!(matches!(
            StoreConfig::from_json(r#"{"key_secret": ""}"#),
            Err(ConfigError::EmptySecret)
        ));
        assert!(matches!(
            StoreConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
