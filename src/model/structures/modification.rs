use crate::model::structures::mods;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::EnumIter;

/// Normalized mod category a score group is rated under. `AllMods` is the
/// universal pseudo-modification: every game contributes to it in addition
/// to its specific bucket.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, PartialOrd, Ord)]
#[repr(u8)]
pub enum Modification {
    Nomod = 0,
    Hidden = 1,
    HardRock = 2,
    DoubleTime = 3,
    Easy = 4,
    Flashlight = 5,
    AllMods = 6
}

impl Modification {
    /// Representative bitmask used as the lookup key for beatmap difficulty.
    pub fn bits(&self) -> u32 {
        match self {
            Modification::Nomod => 0,
            Modification::Hidden => mods::HIDDEN,
            Modification::HardRock => mods::HARD_ROCK,
            Modification::DoubleTime => mods::DOUBLE_TIME,
            Modification::Easy => mods::EASY,
            Modification::Flashlight => mods::HIDDEN | mods::FLASHLIGHT,
            Modification::AllMods => 0
        }
    }
}

impl TryFrom<i32> for Modification {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Modification::Nomod),
            1 => Ok(Modification::Hidden),
            2 => Ok(Modification::HardRock),
            3 => Ok(Modification::DoubleTime),
            4 => Ok(Modification::Easy),
            5 => Ok(Modification::Flashlight),
            6 => Ok(Modification::AllMods),
            _ => Err(())
        }
    }
}
