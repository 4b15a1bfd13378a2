use crate::model::constants::RATIO_DECIMALS;

/// Ratio of an offensive counter (kills or incaps) to real deaths.
///
/// - no offense: 0, even with deaths
/// - offense but no real deaths: 1
/// - otherwise the quotient rounded to [`RATIO_DECIMALS`] places
pub fn death_ratio(offense: u32, real_deaths: u32) -> f64 {
    if offense == 0 {
        return 0.0;
    }

    if real_deaths == 0 {
        return 1.0;
    }

    round_to(offense as f64 / real_deaths as f64, RATIO_DECIMALS)
}

/// `min(numerator / denominator, 1)`, or 0 when the denominator is 0.
pub fn efficiency(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        return 0.0;
    }

    (numerator as f64 / denominator as f64).min(1.0)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
