//! Incremental match-frame ingestion: cursor advancement, frame merging,
//! stalled-match detection and the per-match polling loop.

pub mod cursor;
pub mod fetcher;
pub mod merge;
pub mod stall;
pub mod worker;

use crate::{api::transport::ApiError, database::db::DbError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A computed cursor moved backwards. This indicates a protocol or API
    /// regression and halts ingestion for the affected match.
    #[error("cursor for match {match_id} regressed from {cursor} to {next}")]
    CursorRegression { match_id: i64, cursor: i64, next: i64 },

    #[error(transparent)]
    Database(#[from] DbError)
}
