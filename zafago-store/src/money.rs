//! Money helpers. All prices travel as integer cents; these functions keep the
//! float conversions and rounding in one place.

use num_traits::cast::cast;

/// Basis points in one whole (100%).
pub const BPS_SCALE: i64 = 10_000;

/// Format cents as a dollar string, e.g. `4799` -> `$47.99`.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

/// Take `bps` basis points of `cents`, rounding half away from zero.
#[must_use]
pub fn percent_of_cents(cents: i64, bps: u32) -> i64 {
    let scaled = i128::from(cents) * i128::from(bps);
    let scale = i128::from(BPS_SCALE);
    let half = scale / 2;
    let rounded = if scaled >= 0 {
        (scaled + half) / scale
    } else {
        (scaled - half) / scale
    };
    i64::try_from(rounded).unwrap_or(if rounded > 0 { i64::MAX } else { i64::MIN })
}

/// Convert a whole-percent value (e.g. `10` for 10%) into basis points.
#[must_use]
pub const fn pct_to_bps(pct: u32) -> u32 {
    pct.saturating_mul(100)
}

/// Convert a dollar amount to cents, rounding to the nearest cent.
/// Non-finite input yields 0.
#[must_use]
pub fn dollars_to_cents(dollars: f64) -> i64 {
    round_f64_to_i64(dollars * 100.0)
}

/// Round a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Whole percentage of `part` relative to `whole`, rounded to nearest.
/// Returns 0 when `whole` is not positive.
#[must_use]
pub fn ratio_pct(part: i64, whole: i64) -> u32 {
    if whole <= 0 {
        return 0;
    }
    let pct = round_f64_to_i64(i64_to_f64(part) / i64_to_f64(whole) * 100.0);
    u32::try_from(pct.max(0)).unwrap_or(u32::MAX)
}
