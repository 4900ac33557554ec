//! Ratio helpers for derived metrics
//!
//! Percentages and growth rates with explicit zero-denominator handling. Inputs
//! are the exact integer accumulators; rounding happens here, once, at the end.

/// Round to one decimal place (half away from zero)
///
/// # Examples
/// ```
/// use scout_analytics::utils::math::round_one_decimal;
///
/// assert_eq!(round_one_decimal(33.333), 33.3);
/// assert_eq!(round_one_decimal(66.666), 66.7);
/// ```
#[inline]
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Calculate percentage safely for i64 values, returning 0.0 if total is zero.
///
/// **Precision Note**: values above 2^53 lose precision when cast to f64, which
/// is irrelevant at display precision.
///
/// # Examples
/// ```
/// use scout_analytics::utils::math::safe_percentage;
///
/// assert_eq!(safe_percentage(50, 100), 50.0);
/// assert_eq!(safe_percentage(1, 4), 25.0);
/// assert_eq!(safe_percentage(50, 0), 0.0);  // Zero-division guard
/// ```
#[inline]
pub fn safe_percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Share of `part` in `total` as a percentage rounded to one decimal
#[inline]
pub fn share_percent(part: i64, total: i64) -> f64 {
    round_one_decimal(safe_percentage(part, total))
}

/// One-decimal shares of `parts` that add up to exactly 100.0 (largest remainder)
///
/// Every part is floored to tenths of a percent, then the missing tenths go to
/// the parts with the largest remainders, earlier parts first on ties. A zero
/// or negative total, or any negative part, falls back to [`share_percent`]
/// per part.
///
/// # Examples
/// ```
/// use scout_analytics::utils::math::apportion_percent;
///
/// assert_eq!(apportion_percent(&[150, 300]), vec![33.3, 66.7]);
/// assert_eq!(apportion_percent(&[1, 1, 1]), vec![33.4, 33.3, 33.3]);
/// ```
pub fn apportion_percent(parts: &[i64]) -> Vec<f64> {
    let total: i128 = parts.iter().map(|&p| p as i128).sum();
    if total <= 0 || parts.iter().any(|&p| p < 0) {
        return parts.iter().map(|&p| share_percent(p, total as i64)).collect();
    }

    let mut tenths: Vec<i128> = Vec::with_capacity(parts.len());
    let mut remainders: Vec<(i128, usize)> = Vec::with_capacity(parts.len());
    for (i, &part) in parts.iter().enumerate() {
        let scaled = part as i128 * 1000;
        tenths.push(scaled / total);
        remainders.push((scaled % total, i));
    }

    let missing = 1000 - tenths.iter().sum::<i128>();
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, i) in remainders.iter().take(missing.max(0) as usize) {
        tenths[i] += 1;
    }

    tenths.into_iter().map(|t| t as f64 / 10.0).collect()
}

/// Percentage change from `previous` to `current`, rounded to one decimal
///
/// Defined as exactly 0.0 when `previous` is zero, so a period with no history
/// never reports NaN or infinite growth.
///
/// # Examples
/// ```
/// use scout_analytics::utils::math::growth_percent;
///
/// assert_eq!(growth_percent(150, 100), 50.0);
/// assert_eq!(growth_percent(50, 100), -50.0);
/// assert_eq!(growth_percent(500, 0), 0.0);
/// ```
#[inline]
pub fn growth_percent(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        0.0
    } else {
        round_one_decimal(((current - previous) as f64 / previous as f64) * 100.0)
    }
}

/// Growth for values that are already ratios (averages)
#[inline]
pub fn growth_percent_f64(current: f64, previous: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        0.0
    } else {
        round_one_decimal(((current - previous) / previous) * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_percentage_normal() {
        assert_eq!(safe_percentage(50, 100), 50.0);
        assert_eq!(safe_percentage(3, 4), 75.0);
        assert_eq!(safe_percentage(0, 100), 0.0);
    }

    #[test]
    fn test_safe_percentage_zero_total() {
        assert_eq!(safe_percentage(50, 0), 0.0);
        assert_eq!(safe_percentage(0, 0), 0.0);
    }

    #[test]
    fn test_share_percent_rounding() {
        assert_eq!(share_percent(150, 450), 33.3);
        assert_eq!(share_percent(300, 450), 66.7);
        assert_eq!(share_percent(1, 3), 33.3);
    }

    #[test]
    fn test_apportioned_shares_sum_to_hundred() {
        let mut parts = vec![505; 19];
        parts.push(405);
        let shares = apportion_percent(&parts);
        let tenths: i64 = shares.iter().map(|s| (s * 10.0).round() as i64).sum();
        assert_eq!(tenths, 1000);
        assert_eq!(shares.iter().filter(|&&s| s == 5.1).count(), 10);
        assert_eq!(shares[19], 4.0);

        assert_eq!(apportion_percent(&[0, 0]), vec![0.0, 0.0]);
        assert!(apportion_percent(&[]).is_empty());
        assert_eq!(apportion_percent(&[7]), vec![100.0]);
    }

    #[test]
    fn test_growth_zero_previous() {
        for current in [0, 1, 100, 1_000_000] {
            assert_eq!(growth_percent(current, 0), 0.0);
        }
        assert_eq!(growth_percent_f64(12.5, 0.0), 0.0);
        assert_eq!(growth_percent_f64(12.5, f64::NAN), 0.0);
    }

    #[test]
    fn test_growth_values() {
        assert_eq!(growth_percent(110, 100), 10.0);
        assert_eq!(growth_percent(0, 100), -100.0);
        assert_eq!(growth_percent(1, 3), -66.7);
        assert_eq!(growth_percent_f64(1.5, 1.0), 50.0);
    }
}
