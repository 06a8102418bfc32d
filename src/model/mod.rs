//! Rating computation: freemod grouping, classification, ranking judgment
//! and Bayesian skill updates.

pub mod classification;
pub mod constants;
pub mod grouping;
pub mod ranking;
pub mod rating_engine;
pub mod rating_tracker;
pub mod skillsets;
pub mod structures;
