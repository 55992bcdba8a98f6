use crate::selection::structs::{PlaybackMode, SelectionState};
use crate::trek::structs::{PhotoId, TimeOrderedTrek};
use tokio_util::sync::CancellationToken;

/// Everything a playback walk needs, handed out by [`SelectionController::start_playback`].
#[derive(Debug, Clone)]
pub struct PlaybackTicket {
    pub run_id: u64,
    pub token: CancellationToken,
    /// Waypoint ids in trek order, captured when playback started.
    pub waypoints: Vec<PhotoId>,
}

#[derive(Debug)]
struct PlaybackRun {
    id: u64,
    token: CancellationToken,
}

/// The selection state machine: `Idle(selected)` and `Playing(selected)`.
///
/// Invalid transitions are no-ops that return `false`.
#[derive(Debug, Default)]
pub struct SelectionController {
    state: SelectionState,
    run: Option<PlaybackRun>,
    runs_started: u64,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected(&self) -> Option<&PhotoId> {
        self.state.selected.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.state.mode == PlaybackMode::Playing
    }

    /// Valid in both modes; never touches the mode.
    pub fn select(&mut self, id: Option<PhotoId>) {
        self.state.selected = id;
    }

    pub fn start_playback(&mut self, trek: &TimeOrderedTrek) -> Option<PlaybackTicket> {
        if self.is_playing() {
            tracing::debug!("start_playback ignored: already playing");
            return None;
        }
        if trek.is_empty() {
            tracing::debug!("start_playback ignored: no waypoints");
            return None;
        }

        self.runs_started += 1;
        let token = CancellationToken::new();
        self.run = Some(PlaybackRun {
            id: self.runs_started,
            token: token.clone(),
        });
        self.state.mode = PlaybackMode::Playing;

        Some(PlaybackTicket {
            run_id: self.runs_started,
            token,
            waypoints: trek.ids(),
        })
    }

    /// Cancels the walk and returns to idle, keeping the current selection.
    pub fn stop_playback(&mut self) -> bool {
        if !self.is_playing() {
            tracing::debug!("stop_playback ignored: not playing");
            return false;
        }
        if let Some(run) = self.run.take() {
            run.token.cancel();
        }
        self.state.mode = PlaybackMode::Idle;
        true
    }

    pub fn is_current_run(&self, run_id: u64) -> bool {
        self.run.as_ref().is_some_and(|run| run.id == run_id)
    }

    /// Natural end of a walk. Stale runs (already stopped or replaced) are ignored.
    pub fn finish_playback(&mut self, run_id: u64) -> bool {
        if !self.is_current_run(run_id) {
            return false;
        }
        self.run = None;
        self.state.mode = PlaybackMode::Idle;
        true
    }

    /// Drops the selection if it points at `id`.
    pub fn forget(&mut self, id: &PhotoId) -> bool {
        if self.selected() == Some(id) {
            self.state.selected = None;
            true
        } else {
            false
        }
    }

    /// Back to no selection and idle. Returns whether playback was running.
    pub fn reset(&mut self) -> bool {
        let was_playing = self.stop_playback();
        self.state.selected = None;
        was_playing
    }

    /// The waypoint `delta` steps away from the current one, wrapping around.
    ///
    /// With nothing (or a photo without a fix) selected, stepping forward
    /// starts at the first waypoint and stepping back at the last.
    pub fn step(&self, trek: &TimeOrderedTrek, delta: isize) -> Option<PhotoId> {
        let len = trek.len() as isize;
        if len == 0 {
            return None;
        }
        let current = self.selected().and_then(|id| trek.index_of(id));
        let target = match current {
            Some(index) => (index as isize + delta).rem_euclid(len),
            None if delta >= 0 => 0,
            None => len - 1,
        };
        trek.get(target as usize).map(|w| w.id.clone())
    }
}
