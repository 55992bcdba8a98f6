//! Per-file leaf work: reading tags, building locations and camera details,
//! and turning raw bytes into displayable assets.
pub mod data_url;
pub mod display_handle;
pub mod error;
pub mod extractor;
pub mod gps;
pub mod metadata;
pub mod tag_reader;
