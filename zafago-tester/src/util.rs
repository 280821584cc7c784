use anyhow::{Context, Result, bail};
use zafago_store::money::dollars_to_cents;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse comma-separated seeds, accepting decimal or `0x` hex.
pub fn parse_seeds(s: &str) -> Result<Vec<u64>> {
    split_csv(s)
        .iter()
        .map(|token| {
            let parsed = token.strip_prefix("0x").map_or_else(
                || token.parse::<u64>(),
                |hex| u64::from_str_radix(hex, 16),
            );
            parsed.with_context(|| format!("invalid seed '{token}'"))
        })
        .collect()
}

/// Parse a dollar amount such as `49.99` or `$50` into cents.
pub fn parse_price(s: &str) -> Result<i64> {
    let trimmed = s.trim().trim_start_matches('$');
    let dollars: f64 = trimmed
        .parse()
        .with_context(|| format!("invalid price '{s}'"))?;
    if !dollars.is_finite() || dollars < 0.0 {
        bail!("price must be a non-negative amount, got '{s}'");
    }
    Ok(dollars_to_cents(dollars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn parses_decimal_and_hex_seeds() {
        assert_eq!(parse_seeds("1337, 0x10").unwrap(), vec![1337, 16]);
        assert!(parse_seeds("nope").is_err());
        assert!(parse_seeds("").unwrap().is_empty());
    }

    #[test]
    fn parses_prices_into_cents() {
        assert_eq!(parse_price("49.99").unwrap(), 4999);
        assert_eq!(parse_price("$50").unwrap(), 5000);
        assert_eq!(parse_price("0").unwrap(), 0);
        assert!(parse_price("-1").is_err());
        assert!(parse_price("cheap").is_err());
    }
}
