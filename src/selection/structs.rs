use crate::trek::structs::{Bounds, PhotoId, TrekView};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    #[default]
    Idle,
    Playing,
}

/// The single active waypoint plus the playback mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub selected: Option<PhotoId>,
    pub mode: PlaybackMode,
}

/// What every collaborator is told about the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWaypoint {
    pub id: Option<PhotoId>,
    /// Zero-based index in the time-ordered trek; `None` for photos without a fix.
    pub index: Option<usize>,
}

/// Published to map, gallery, elevation chart and viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The collection changed; `view` is already recomputed.
    TrekChanged {
        view: Arc<TrekView>,
        photo_count: usize,
    },
    SelectionChanged(ActiveWaypoint),
    PlaybackChanged(PlaybackMode),
    /// Ask the map to frame these bounds.
    FitBounds(Bounds),
    /// Ask the full-screen viewer to open on this waypoint.
    ViewerOpened(ActiveWaypoint),
}

/// Requests coming back from the surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum SurfaceCommand {
    MarkerActivated(PhotoId),
    ChartPointActivated(PhotoId),
    OpenViewer(PhotoId),
    GalleryNext,
    GalleryPrevious,
    GalleryOpenAt(usize),
    FitAll,
    StartPlayback,
    StopPlayback,
}
