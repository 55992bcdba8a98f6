//! The trek itself: the photo collection, ingestion into it, and everything
//! derived from it.
pub mod collection;
pub mod ingest;
pub mod stats;
pub mod structs;
