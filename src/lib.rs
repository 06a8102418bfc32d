pub mod api;
pub mod args;
pub mod database;
pub mod ingestion;
pub mod messaging;
pub mod model;
pub mod utils;
