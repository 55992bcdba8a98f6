//! # Trek Track
//!
//! Rebuild a hiking trek from a pile of geotagged photos.
//!
//! Photos go in as raw files (on disk or in memory). Each one is read for its GPS fix
//! and camera settings, turned into something a display surface can render, and added
//! to a session-scoped collection. From the geotagged photos the crate derives a
//! time-ordered trek with distance, peak elevation and duration, drives a single
//! shared selection with a timed playback mode, and exports the route as GPX 1.1.
//!
//! ## Key Features
//!
//! - **Metadata Extraction**: GPS position, altitude and capture time, plus camera make, model and exposure settings, read with `exiftool`.
//! - **Asset Normalization**: HEIC/HEIF files are transcoded to JPEG; every photo gets a display handle and an inline base64 encoding.
//! - **Batch Ingestion**: Files are processed concurrently; a broken file is dropped without affecting the rest of the batch.
//! - **Trek Statistics**: Haversine distance, peak elevation, duration, elevation profile and bounds.
//! - **Selection & Playback**: One active waypoint shared by map, gallery, elevation chart and viewer, with a cancellable walk through the trek.
//! - **GPX Export**: A `trk/trkseg/trkpt` document of the waypoints in time order.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trek_track::{RawFile, TrekSession};
//!
//! #[tokio::main]
//! async fn main() -> color_eyre::Result<()> {
//!     let session = TrekSession::builder().build().await?;
//!
//!     let report = session
//!         .ingest(vec![
//!             RawFile::from_path("assets/trailhead.jpg"),
//!             RawFile::from_path("assets/summit.heic"),
//!         ])
//!         .await;
//!     println!("Added {} photos, {} failed", report.added.len(), report.failed.len());
//!
//!     let view = session.view();
//!     println!("Statistics: {:?}", view.statistics);
//!     println!("GPX: {:?}", session.export_gpx()?);
//!
//!     Ok(())
//! }
//! ```

mod error;
pub mod export;
pub mod features;
pub mod selection;
pub mod session;
pub mod source;
pub mod time;
pub mod trek;
pub mod utils;

pub use error::TrekError;
pub use features::display_handle::{DisplayHandle, HandleKey, HandleRegistry, RenderableBytes};
pub use features::gps::GpsLocation;
pub use features::metadata::CameraMetadata;
pub use selection::structs::{ActiveWaypoint, PlaybackMode, SelectionState, SessionEvent, SurfaceCommand};
pub use session::{SessionSnapshot, TrekSession};
pub use source::RawFile;
pub use trek::ingest::{IngestFailure, IngestReport};
pub use trek::structs::{PhotoId, TrekStatistics, TrekView};
