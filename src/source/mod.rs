//! Record sources.
//!
//! Everything that produces a batch of raw incident records: the
//! open-data HTTP client and the JSON file loader. Aggregation never
//! depends on which one was used.

pub mod client;

pub use client::{
    load_records_from_file, save_records, OpenDataClient, SourceConfig, SourceError,
};
