use crate::selection::controller::PlaybackTicket;
use crate::trek::structs::PhotoId;
use std::time::Duration;

pub const DEFAULT_DWELL: Duration = Duration::from_secs(3);

/// Result of asking the owner to move playback to the next waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Selected,
    /// The waypoint left the collection after playback started.
    Skipped,
    /// The run was stopped or replaced.
    Stale,
}

/// The party that owns selection state on behalf of a playback walk.
pub trait PlaybackTarget {
    fn advance_to(&self, run_id: u64, id: &PhotoId) -> Advance;
    fn finish(&self, run_id: u64);
}

/// Walks the ticket's waypoints, selecting each and dwelling before the next.
///
/// The token is checked before every selection and raced against every dwell,
/// so a stop lands within one dwell period. A selection already made stays.
pub async fn drive_playback<T: PlaybackTarget>(target: T, ticket: PlaybackTicket, dwell: Duration) {
    for id in &ticket.waypoints {
        if ticket.token.is_cancelled() {
            break;
        }
        match target.advance_to(ticket.run_id, id) {
            Advance::Selected => {}
            Advance::Skipped => continue,
            Advance::Stale => break,
        }
        tokio::select! {
            _ = tokio::time::sleep(dwell) => {}
            _ = ticket.token.cancelled() => break,
        }
    }
    target.finish(ticket.run_id);
}
