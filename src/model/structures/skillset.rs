use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::EnumIter;

/// Difficulty-dimension tag a rating is tracked under. `Overall` applies to
/// every rated game; the rest are selected from beatmap difficulty attributes.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, PartialOrd, Ord)]
#[repr(u8)]
pub enum Skillset {
    Overall = 0,
    Aim = 1,
    Tapping = 2,
    Technical = 3,
    LowAr = 4,
    HighAr = 5,
    HighBpm = 6,
    Precision = 7
}

impl TryFrom<i32> for Skillset {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Skillset::Overall),
            1 => Ok(Skillset::Aim),
            2 => Ok(Skillset::Tapping),
            3 => Ok(Skillset::Technical),
            4 => Ok(Skillset::LowAr),
            5 => Ok(Skillset::HighAr),
            6 => Ok(Skillset::HighBpm),
            7 => Ok(Skillset::Precision),
            _ => Err(())
        }
    }
}
