//! Promo code redemption
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::money::{pct_to_bps, percent_of_cents};

/// A promo code accepted against a specific subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPromo {
    /// Code as the shopper typed it
    pub code: String,
    pub percent: u32,
    pub discount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoError {
    #[error("enter a promo code")]
    Empty,
    #[error("invalid promo code '{0}'")]
    Unknown(String),
}

/// Redeems promo codes. Implementations may call out to a remote service;
/// the cart only sees the result.
pub trait PromoService {
    /// Redeem `code` against `subtotal_cents`.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty or not recognised.
    fn redeem(&self, code: &str, subtotal_cents: i64) -> Result<AppliedPromo, PromoError>;
}

/// Fixed table of percentage codes, matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticPromoCodes {
    percent_by_code: BTreeMap<String, u32>,
}

impl StaticPromoCodes {
    #[must_use]
    pub fn new(codes: &BTreeMap<String, u32>) -> Self {
        Self {
            percent_by_code: codes
                .iter()
                .map(|(code, pct)| (code.to_lowercase(), *pct))
                .collect(),
        }
    }

    #[must_use]
    pub fn percent_for(&self, code: &str) -> Option<u32> {
        self.percent_by_code.get(&code.trim().to_lowercase()).copied()
    }
}

impl PromoService for StaticPromoCodes {
    fn redeem(&self, code: &str, subtotal_cents: i64) -> Result<AppliedPromo, PromoError> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(PromoError::Empty);
        }
        let percent = self
            .percent_for(trimmed)
            .ok_or_else(|| PromoError::Unknown(trimmed.to_string()))?;
        let discount_cents = percent_of_cents(subtotal_cents.max(0), pct_to_bps(percent));
        log::debug!("promo {trimmed} accepted: {percent}% = {discount_cents} cents");
        Ok(AppliedPromo {
            code: trimmed.to_string(),
            percent,
            discount_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    fn codes() -> StaticPromoCodes {
        StaticPromoCodes::new(&StoreConfig::load_from_static().promo_codes)
    }

    #[test]
    fn redeems_case_insensitively() {
        let promo = codes().redeem("ZAFAGO10", 7798).unwrap();
        assert_eq!(promo.percent, 10);
        assert_eq!(promo.discount_cents, 780);
        assert_eq!(promo.code, "ZAFAGO10");

        let promo = codes().redeem("  Welcome20 ", 7798).unwrap();
        assert_eq!(promo.percent, 20);
        assert_eq!(promo.discount_cents, 1560);
    }

    #[test]
    fn rejects_unknown_and_empty_codes() {
        assert_eq!(
            codes().redeem("SAVEBIG", 1000),
            Err(PromoError::Unknown("SAVEBIG".to_string()))
        );
        assert_eq!(codes().redeem("   ", 1000), Err(PromoError::Empty));
    }

    #[test]
    fn zero_subtotal_discounts_nothing() {
        assert_eq!(codes().redeem("zafago10", 0).unwrap().discount_cents, 0);
    }
}
