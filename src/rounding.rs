//! Presentation rounding. Internal computations keep full precision; these run only when a
//! value is placed into an output record.

/// Rounds half to even at `places` decimals, so 0.125 becomes 0.12 and 1.25 becomes 1.2.
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(places);
    (value * scale).round_ties_even() / scale
}

/// Percentages and ratings.
pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

/// Averages and probabilities.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    f64::from(part) / f64::from(whole) * 100.0
}

pub fn ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    f64::from(part) / f64::from(whole)
}
