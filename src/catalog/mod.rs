//! Card catalog: ingestion, storage and queries

pub mod ingest;
pub mod query;
pub mod store;

pub use ingest::{IngestReport, Ingestor, SkippedRecord};
pub use query::{
    CardTypeFilter, EnergyCostFilter, Filter, FilterOptions, Page, Paging, QueryEngine, RawFilter,
};
pub use store::{CatalogSnapshot, CatalogStore, UpsertOutcome};
