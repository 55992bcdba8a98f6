use crate::error::TrekError;
use crate::export::{export_file_name, render_trek};
use crate::features::data_url::{
    AssetNormalizer, DEFAULT_TRANSCODE_QUALITY, ImageTranscoder, Transcoder, to_data_url,
};
use crate::features::display_handle::{HandleRegistry, RenderableBytes};
use crate::features::extractor::MetadataExtractor;
use crate::features::tag_reader::{ExifToolReader, TagReader};
use crate::selection::controller::SelectionController;
use crate::selection::playback::{Advance, DEFAULT_DWELL, PlaybackTarget, drive_playback};
use crate::selection::structs::{
    ActiveWaypoint, PlaybackMode, SelectionState, SessionEvent, SurfaceCommand,
};
use crate::source::RawFile;
use crate::trek::collection::TrekCollection;
use crate::trek::ingest::{IngestPipeline, IngestReport};
use crate::trek::stats::recompute;
use crate::trek::structs::{PhotoId, PhotoSummary, TrekView};
use bon::bon;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, watch};

/// Serializable picture of the whole session at one instant.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub photos: Vec<PhotoSummary>,
    pub view: TrekView,
    pub selection: SelectionState,
    pub active: ActiveWaypoint,
}

struct SessionState {
    collection: TrekCollection,
    view: Arc<TrekView>,
    controller: SelectionController,
    batches_in_flight: usize,
}

impl SessionState {
    fn refresh_view(&mut self) {
        self.view = Arc::new(recompute(self.collection.photos()));
    }

    fn active(&self) -> ActiveWaypoint {
        let id = self.controller.selected().cloned();
        let index = id.as_ref().and_then(|id| self.view.trek.index_of(id));
        ActiveWaypoint { id, index }
    }

    fn trek_changed(&self) -> SessionEvent {
        SessionEvent::TrekChanged {
            view: Arc::clone(&self.view),
            photo_count: self.collection.len(),
        }
    }
}

struct SessionInner {
    state: Mutex<SessionState>,
    pipeline: IngestPipeline,
    registry: Arc<HandleRegistry>,
    events: broadcast::Sender<SessionEvent>,
    busy: watch::Sender<bool>,
    runtime: Handle,
    dwell: Duration,
    command_capacity: usize,
}

impl SessionInner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        // Sending only fails when nobody is subscribed.
        let _ = self.events.send(event);
    }

    /// Selects `id` and publishes the result. Every selection path ends here.
    fn select_locked(&self, state: &mut SessionState, id: PhotoId) -> ActiveWaypoint {
        state.controller.select(Some(id));
        let active = state.active();
        tracing::debug!(id = ?active.id, index = ?active.index, "selection changed");
        self.emit(SessionEvent::SelectionChanged(active.clone()));
        active
    }
}

/// Counts a batch as in flight for as long as it lives.
struct BusyGuard<'a> {
    inner: &'a SessionInner,
}

impl<'a> BusyGuard<'a> {
    fn enter(inner: &'a SessionInner) -> Self {
        let mut state = inner.lock();
        state.batches_in_flight += 1;
        if state.batches_in_flight == 1 {
            inner.busy.send_replace(true);
        }
        Self { inner }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        state.batches_in_flight -= 1;
        if state.batches_in_flight == 0 {
            self.inner.busy.send_replace(false);
        }
    }
}

/// The owner of a trek: its photo collection, derived view, selection and playback.
///
/// Cloning is cheap and every clone talks to the same session. Collaborators
/// (map, gallery, elevation chart, viewer) listen on [`TrekSession::subscribe`]
/// and talk back with [`SurfaceCommand`]s.
///
/// ```rust,no_run
/// # use trek_track::{TrekSession, TrekError, RawFile};
/// # #[tokio::main]
/// # async fn main() -> Result<(), TrekError> {
/// let session = TrekSession::builder().build().await?;
/// let report = session.ingest(vec![RawFile::from_path("assets/summit.jpg")]).await;
/// println!("added {} photos", report.added.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TrekSession {
    inner: Arc<SessionInner>,
}

#[bon]
impl TrekSession {
    /// Constructs a `TrekSession` via a builder pattern.
    ///
    /// # Builder Arguments
    ///
    /// * `exiftool_path: Option<PathBuf>` - An optional path to a specific `exiftool` executable. If `None`, `exiftool` is searched for in the system's PATH.
    /// * `tag_reader: Option<Arc<dyn TagReader>>` - Replaces `exiftool` entirely. When set, `exiftool_path` is ignored and no process is started.
    /// * `transcoder: Option<Arc<dyn Transcoder>>` - Converts HEIC-family files to something displayable. Defaults to [`ImageTranscoder`].
    /// * `dwell: Duration` - (Default: 3 s) How long playback stays on each waypoint.
    /// * `transcode_quality: f32` - (Default: `0.6`) JPEG quality for transcoded files, between 0 and 1.
    /// * `event_capacity: usize` - (Default: `256`) How many events a slow subscriber may lag behind before it starts missing some.
    ///
    /// # Errors
    ///
    /// * [`TrekError::Extraction`] if `exiftool` cannot be found or fails to start.
    /// * [`TrekError::NoRuntime`] if not awaited inside a tokio runtime.
    #[builder]
    pub async fn new(
        exiftool_path: Option<PathBuf>,
        tag_reader: Option<Arc<dyn TagReader>>,
        transcoder: Option<Arc<dyn Transcoder>>,
        #[builder(default = DEFAULT_DWELL)] dwell: Duration,
        #[builder(default = DEFAULT_TRANSCODE_QUALITY)] transcode_quality: f32,
        #[builder(default = 256)] event_capacity: usize,
    ) -> Result<Self, TrekError> {
        let runtime = Handle::try_current()?;
        let tag_reader: Arc<dyn TagReader> = match tag_reader {
            Some(reader) => reader,
            None => Arc::new(ExifToolReader::new(exiftool_path.as_deref())?),
        };
        let transcoder: Arc<dyn Transcoder> = match transcoder {
            Some(transcoder) => transcoder,
            None => Arc::new(ImageTranscoder),
        };

        let registry = Arc::new(HandleRegistry::new());
        let pipeline = IngestPipeline::new(
            MetadataExtractor::new(tag_reader),
            AssetNormalizer::new(transcoder, Arc::clone(&registry), transcode_quality),
        );
        let capacity = event_capacity.max(1);
        let (events, _) = broadcast::channel(capacity);
        let (busy, _) = watch::channel(false);

        let state = SessionState {
            collection: TrekCollection::new(Arc::clone(&registry)),
            view: Arc::new(TrekView::default()),
            controller: SelectionController::new(),
            batches_in_flight: 0,
        };

        Ok(Self {
            inner: Arc::new(SessionInner {
                state: Mutex::new(state),
                pipeline,
                registry,
                events,
                busy,
                runtime,
                dwell,
                command_capacity: capacity,
            }),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Aggregate busy flag: `true` while any ingest batch is in flight.
    pub fn busy(&self) -> watch::Receiver<bool> {
        self.inner.busy.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        *self.inner.busy.borrow()
    }

    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.inner.registry
    }

    /// Ingests a batch of files and appends the survivors in one step.
    ///
    /// Files are processed concurrently; a file that fails is dropped and
    /// reported without affecting the rest. The collection and its view change
    /// together, once, after the whole batch has finished.
    pub async fn ingest(&self, files: Vec<RawFile>) -> IngestReport {
        if files.is_empty() {
            return IngestReport::default();
        }

        let _busy = BusyGuard::enter(&self.inner);
        let (photos, failed) = self.inner.pipeline.process_batch(&files).await;

        let added = {
            let mut state = self.inner.lock();
            let before = state.active();
            let added = state.collection.append(photos);
            if !added.is_empty() {
                state.refresh_view();
                self.inner.emit(state.trek_changed());
                let after = state.active();
                if after != before {
                    self.inner.emit(SessionEvent::SelectionChanged(after));
                }
            }
            added
        };

        tracing::info!(
            files = files.len(),
            added = added.len(),
            failed = failed.len(),
            "batch ingested"
        );
        IngestReport { added, failed }
    }

    /// Removes one photo. Clears the selection if it pointed at that photo.
    pub fn remove(&self, id: &PhotoId) -> bool {
        let mut state = self.inner.lock();
        let before = state.active();
        if !state.collection.remove(id) {
            tracing::debug!(%id, "remove ignored: unknown photo");
            return false;
        }
        state.controller.forget(id);
        state.refresh_view();
        self.inner.emit(state.trek_changed());
        let after = state.active();
        if after != before {
            self.inner.emit(SessionEvent::SelectionChanged(after));
        }
        true
    }

    /// Empties the collection, releases every display handle, stops playback
    /// and drops the selection. Returns the number of photos removed.
    pub fn clear(&self) -> usize {
        let mut state = self.inner.lock();
        let had_selection = state.controller.selected().is_some();
        let removed = state.collection.clear();
        let was_playing = state.controller.reset();
        state.refresh_view();

        if removed > 0 {
            self.inner.emit(state.trek_changed());
        }
        if was_playing {
            self.inner.emit(SessionEvent::PlaybackChanged(PlaybackMode::Idle));
        }
        if had_selection {
            self.inner.emit(SessionEvent::SelectionChanged(ActiveWaypoint::default()));
        }
        tracing::debug!(removed, "collection cleared");
        removed
    }

    pub fn view(&self) -> Arc<TrekView> {
        Arc::clone(&self.inner.lock().view)
    }

    pub fn photos(&self) -> Vec<PhotoSummary> {
        self.inner.lock().collection.summaries()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().collection.is_empty()
    }

    pub fn selection(&self) -> SelectionState {
        self.inner.lock().controller.state().clone()
    }

    pub fn active(&self) -> ActiveWaypoint {
        self.inner.lock().active()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock();
        SessionSnapshot {
            photos: state.collection.summaries(),
            view: TrekView::clone(&state.view),
            selection: state.controller.state().clone(),
            active: state.active(),
        }
    }

    /// Selects any photo in the collection. Unknown ids are ignored.
    pub fn select(&self, id: &PhotoId) -> bool {
        let mut state = self.inner.lock();
        if !state.collection.contains(id) {
            tracing::debug!(%id, "select ignored: unknown photo");
            return false;
        }
        self.inner.select_locked(&mut state, id.clone());
        true
    }

    /// Selects the next waypoint in time order, wrapping after the last.
    pub fn next(&self) -> bool {
        self.step(1)
    }

    /// Selects the previous waypoint in time order, wrapping before the first.
    pub fn previous(&self) -> bool {
        self.step(-1)
    }

    fn step(&self, delta: isize) -> bool {
        let mut state = self.inner.lock();
        let Some(id) = state.controller.step(&state.view.trek, delta) else {
            return false;
        };
        self.inner.select_locked(&mut state, id);
        true
    }

    /// Selects the waypoint at `index` in time order. Out of range is a no-op.
    pub fn open_at(&self, index: usize) -> bool {
        let mut state = self.inner.lock();
        let Some(id) = state.view.trek.get(index).map(|waypoint| waypoint.id.clone()) else {
            tracing::debug!(index, "open_at ignored: out of range");
            return false;
        };
        self.inner.select_locked(&mut state, id);
        true
    }

    /// Selects the photo and asks the full-screen viewer to show it.
    pub fn open_viewer(&self, id: &PhotoId) -> bool {
        let mut state = self.inner.lock();
        if !state.collection.contains(id) {
            tracing::debug!(%id, "open_viewer ignored: unknown photo");
            return false;
        }
        let active = self.inner.select_locked(&mut state, id.clone());
        self.inner.emit(SessionEvent::ViewerOpened(active));
        true
    }

    /// Asks the map to frame every waypoint. No-op without waypoints.
    pub fn fit_all(&self) -> bool {
        let state = self.inner.lock();
        match state.view.bounds {
            Some(bounds) => {
                self.inner.emit(SessionEvent::FitBounds(bounds));
                true
            }
            None => false,
        }
    }

    /// Starts walking the trek from its first waypoint. Only valid when idle.
    pub fn start_playback(&self) -> bool {
        let ticket = {
            let mut state = self.inner.lock();
            let trek = Arc::clone(&state.view);
            let Some(ticket) = state.controller.start_playback(&trek.trek) else {
                return false;
            };
            self.inner.emit(SessionEvent::PlaybackChanged(PlaybackMode::Playing));
            ticket
        };
        tracing::debug!(run = ticket.run_id, waypoints = ticket.waypoints.len(), "playback started");
        self.inner
            .runtime
            .spawn(drive_playback(self.clone(), ticket, self.inner.dwell));
        true
    }

    /// Stops playback, keeping the waypoint it was on. Only valid while playing.
    pub fn stop_playback(&self) -> bool {
        let mut state = self.inner.lock();
        if !state.controller.stop_playback() {
            return false;
        }
        self.inner.emit(SessionEvent::PlaybackChanged(PlaybackMode::Idle));
        tracing::debug!("playback stopped");
        true
    }

    /// Applies a request from one of the surfaces. Returns whether anything changed.
    pub fn dispatch(&self, command: SurfaceCommand) -> bool {
        match command {
            SurfaceCommand::MarkerActivated(id) | SurfaceCommand::ChartPointActivated(id) => {
                self.select(&id)
            }
            SurfaceCommand::OpenViewer(id) => self.open_viewer(&id),
            SurfaceCommand::GalleryNext => self.next(),
            SurfaceCommand::GalleryPrevious => self.previous(),
            SurfaceCommand::GalleryOpenAt(index) => self.open_at(index),
            SurfaceCommand::FitAll => self.fit_all(),
            SurfaceCommand::StartPlayback => self.start_playback(),
            SurfaceCommand::StopPlayback => self.stop_playback(),
        }
    }

    /// A sender surfaces can hand commands to. Commands are applied in order
    /// by a task that lives until every sender is dropped.
    pub fn command_channel(&self) -> mpsc::Sender<SurfaceCommand> {
        let (sender, mut receiver) = mpsc::channel(self.inner.command_capacity);
        let session = self.clone();
        self.inner.runtime.spawn(async move {
            while let Some(command) = receiver.recv().await {
                tracing::debug!(?command, "surface command");
                session.dispatch(command);
            }
        });
        sender
    }

    /// The displayable bytes behind a photo's handle.
    pub fn renderable(&self, id: &PhotoId) -> Option<RenderableBytes> {
        let state = self.inner.lock();
        let photo = state.collection.get(id)?;
        self.inner.registry.resolve(photo.display_handle.key())
    }

    /// The full `data:` URL of a photo.
    pub fn data_url(&self, id: &PhotoId) -> Option<String> {
        let state = self.inner.lock();
        let photo = state.collection.get(id)?;
        Some(to_data_url(&photo.mime_type, &photo.inline_encoding))
    }

    /// GPX document of the current trek, or `None` without waypoints.
    pub fn export_gpx(&self) -> Result<Option<String>, TrekError> {
        let view = self.view();
        Ok(render_trek(&view.trek)?)
    }

    /// Writes the GPX document into `dir` as `trek_route_<date>.gpx`.
    pub async fn export_to(&self, dir: &Path, date: NaiveDate) -> Result<Option<PathBuf>, TrekError> {
        let Some(document) = self.export_gpx()? else {
            return Ok(None);
        };
        let path = dir.join(export_file_name(date));
        tokio::fs::write(&path, document).await?;
        tracing::info!(path = %path.display(), "track exported");
        Ok(Some(path))
    }
}

impl PlaybackTarget for TrekSession {
    fn advance_to(&self, run_id: u64, id: &PhotoId) -> Advance {
        let mut state = self.inner.lock();
        if !state.controller.is_current_run(run_id) {
            return Advance::Stale;
        }
        if !state.collection.contains(id) {
            return Advance::Skipped;
        }
        self.inner.select_locked(&mut state, id.clone());
        Advance::Selected
    }

    fn finish(&self, run_id: u64) {
        let mut state = self.inner.lock();
        if state.controller.finish_playback(run_id) {
            self.inner.emit(SessionEvent::PlaybackChanged(PlaybackMode::Idle));
            tracing::debug!(run = run_id, "playback finished");
        }
    }
}
