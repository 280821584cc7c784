//! Activation keys and order ids.
//!
//! Keys are derived with HMAC-SHA256 over a domain tag and the purchase
//! coordinates, so the same order always yields the same keys.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Unambiguous key alphabet (no 0/O, 1/I).
const KEY_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const KEY_GROUPS: usize = 3;
const KEY_GROUP_LEN: usize = 5;
const ORDER_ID_MODULUS: u64 = 10_000_000;

#[derive(Debug, Error)]
#[error("key secret rejected: {0}")]
pub struct KeySecretError(#[from] hmac::digest::InvalidLength);

/// Issues order ids and product activation keys.
#[derive(Clone)]
pub struct KeyIssuer {
    mac: HmacSha256,
}

impl std::fmt::Debug for KeyIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyIssuer").finish_non_exhaustive()
    }
}

impl KeyIssuer {
    /// # Errors
    ///
    /// Returns an error if the MAC rejects the secret length.
    pub fn new(secret: &[u8]) -> Result<Self, KeySecretError> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
        })
    }

    fn digest(&self, domain_tag: &[u8], parts: &[&[u8]]) -> [u8; 32] {
        let mut mac = self.mac.clone();
        mac.update(domain_tag);
        for part in parts {
            let len = u64::try_from(part.len()).unwrap_or(u64::MAX);
            mac.update(&len.to_le_bytes());
            mac.update(part);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }

    /// Order id such as `ORD-2458613`, derived from the order fingerprint.
    #[must_use]
    pub fn order_id(&self, fingerprint: &[u8]) -> String {
        let digest = self.digest(b"zafago-order", &[fingerprint]);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let number = u64::from_le_bytes(head) % ORDER_ID_MODULUS;
        format!("ORD-{number:07}")
    }

    /// Activation key (`XXXXX-XXXXX-XXXXX`) for one unit of a product in an
    /// order.
    #[must_use]
    pub fn activation_key(&self, order_id: &str, product_id: u32, unit: u32) -> String {
        let digest = self.digest(
            b"zafago-key",
            &[
                order_id.as_bytes(),
                &product_id.to_le_bytes(),
                &unit.to_le_bytes(),
            ],
        );
        let symbols: Vec<char> = digest
            .iter()
            .take(KEY_GROUPS * KEY_GROUP_LEN)
            .map(|b| char::from(KEY_ALPHABET[usize::from(*b) % KEY_ALPHABET.len()]))
            .collect();
        symbols
            .chunks(KEY_GROUP_LEN)
            .map(|group| group.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// True when `key` has the `XXXXX-XXXXX-XXXXX` shape over the key alphabet.
#[must_use]
pub fn is_well_formed_key(key: &str) -> bool {
    let groups: Vec<&str> = key.split('-').collect();
    groups.len() == KEY_GROUPS
        && groups.iter().all(|group| {
            group.len() == KEY_GROUP_LEN && group.bytes().all(|b| KEY_ALPHABET.contains(&b))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> KeyIssuer {
        KeyIssuer::new(b"test-secret").unwrap()
    }

    #[test]
    fn keys_are_deterministic_and_well_formed() {
        let a = issuer().activation_key("ORD-0000001", 1, 0);
        let b = issuer().activation_key("ORD-0000001", 1, 0);
        assert_eq!(a, b);
        assert!(is_well_formed_key(&a), "{a}");
        assert_eq!(a.len(), 17);
    }

    #[test]
    fn keys_differ_per_unit_product_and_secret() {
        let issuer = issuer();
        let base = issuer.activation_key("ORD-0000001", 1, 0);
        assert_ne!(base, issuer.activation_key("ORD-0000001", 1, 1));
        assert_ne!(base, issuer.activation_key("ORD-0000001", 2, 0));
        assert_ne!(base, issuer.activation_key("ORD-0000002", 1, 0));
        let other = KeyIssuer::new(b"other").unwrap();
        assert_ne!(base, other.activation_key("ORD-0000001", 1, 0));
    }

    #[test]
    fn order_ids_are_fixed_width() {
        let id = issuer().order_id(b"alex@example.com|1x1|4x1");
        assert!(id.starts_with("ORD-"));
        assert_eq!(id.len(), 11);
        assert!(id[4..].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(id, issuer().order_id(b"alex@example.com|1x1|4x1"));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(!is_well_formed_key("ABCDE-FGHJK"));
        assert!(!is_well_formed_key("ABCDE-FGHJK-0OI1A"));
        assert!(is_well_formed_key("ABCDE-FGHJK-LMNPQ"));
    }

    #[test]
    fn debug_hides_secret() {
        assert_eq!(format!("{:?}", issuer()), "KeyIssuer { .. }");
    }
}
