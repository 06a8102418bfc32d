// Rating prior and ordinal derivation
pub const DEFAULT_MU: f64 = 25.0;
pub const DEFAULT_SIGMA: f64 = 25.0 / 3.0;
pub const ORDINAL_FACTOR: f64 = 3.0;

// Skillset selection thresholds
pub const AIM_SPEED_MARGIN: f64 = 0.2;
pub const HIGH_BPM_THRESHOLD: f64 = 225.0;
pub const TECHNICAL_SLIDER_FACTOR: f64 = 0.97;
pub const PRECISION_CIRCLE_SIZE: f64 = 6.5;
pub const LOW_AR_THRESHOLD: f64 = 8.5;
pub const HIGH_AR_THRESHOLD: f64 = 10.3;

// Clock-rate multipliers applied to approach rate
pub const DOUBLE_TIME_RATE: f64 = 1.5;
pub const HALF_TIME_RATE: f64 = 0.75;
