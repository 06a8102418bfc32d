//! Raw osu! mod bitmask values and normalization helpers.

pub const NO_FAIL: u32 = 1;
pub const EASY: u32 = 2;
pub const TOUCH_DEVICE: u32 = 4;
pub const HIDDEN: u32 = 8;
pub const HARD_ROCK: u32 = 16;
pub const SUDDEN_DEATH: u32 = 32;
pub const DOUBLE_TIME: u32 = 64;
pub const RELAX: u32 = 128;
pub const HALF_TIME: u32 = 256;
pub const NIGHTCORE: u32 = 512;
pub const FLASHLIGHT: u32 = 1024;
pub const SPUN_OUT: u32 = 4096;
pub const PERFECT: u32 = 16384;
pub const SCORE_V2: u32 = 536_870_912;

/// Mods that do not change what is being rated. Note that stripping the
/// nightcore bit leaves the double-time bit in place, so NC scores fall
/// into the DoubleTime family.
pub const COSMETIC: u32 = NO_FAIL | SUDDEN_DEATH | NIGHTCORE | SPUN_OUT | PERFECT | SCORE_V2;

/// Normalizes a raw score bitmask by removing cosmetic mods.
pub fn normalize(raw: u32) -> u32 {
    raw & !COSMETIC
}
