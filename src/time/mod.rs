//! Parsing of EXIF capture timestamps.
mod parsing;
pub use parsing::{normalize_exif_datetime, parse_exif_datetime};
