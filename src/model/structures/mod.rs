pub mod modification;
pub mod mods;
pub mod rating_attribute;
pub mod scoring_attribute;
pub mod skillset;
