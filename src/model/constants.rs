// Rating constants shared by both schemes
pub const RATING_SCALE: f64 = 500.0;
pub const CONTRIBUTION_FACTOR_CEILING: f64 = 2.0;

// Extended scheme weights
pub const EXTENDED_KILL_FACTOR: f64 = 0.9;
pub const EXTENDED_INCAP_FACTOR: f64 = 0.6;
pub const EXTENDED_DEATH_FACTOR: f64 = 1.0;
pub const EXTENDED_REVIVE_FACTOR: f64 = 1.0;
pub const EXTENDED_FALL_FACTOR: f64 = 0.3;
pub const EXTENDED_TK_FACTOR: f64 = 0.5;
pub const EXTENDED_CONTRIBUTION_THRESHOLD: f64 = 4000.0;

// Baseline scheme weights
pub const BASELINE_KILL_FACTOR: f64 = 1.0;
pub const BASELINE_DOWN_FACTOR: f64 = 0.5;
pub const BASELINE_DEATH_FACTOR: f64 = 1.0;
pub const BASELINE_REVIVE_FACTOR: f64 = 0.5;
pub const BASELINE_TEAMKILLED_FACTOR: f64 = 1.0;
pub const BASELINE_TK_FACTOR: f64 = 0.5;
pub const BASELINE_CONTRIBUTION_THRESHOLD: f64 = 750.0;

// Decimal places kept for kdr / idr
pub const RATIO_DECIMALS: i32 = 1;
