use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use trek_track::features::error::ExtractionError;
use trek_track::selection::structs::ActiveWaypoint;
use trek_track::{
    PhotoId, PlaybackMode, RawFile, SelectionState, SessionEvent, SurfaceCommand, TrekSession,
};

/// Tag dictionaries keyed by file name, shaped like `exiftool -n -j` output.
fn fixture_tags(name: &str) -> Value {
    match name {
        "a.jpg" => json!({
            "GPSLatitude": 46.0,
            "GPSLongitude": 7.0,
            "GPSAltitude": 1000.0,
            "DateTimeOriginal": "2024:07:20 08:00:00",
            "Make": "Google",
            "Model": "Pixel 8"
        }),
        "b.jpg" => json!({
            "GPSLatitude": 46.01,
            "GPSLongitude": 7.0,
            "GPSAltitude": 1500.0,
            "DateTimeOriginal": "2024:07:20 10:30:00"
        }),
        "c.jpg" => json!({
            "GPSLatitude": 46.02,
            "GPSLongitude": 7.0,
            "DateTimeOriginal": "2024:07:20 12:00:00"
        }),
        _ => json!({}),
    }
}

fn fixture_reader(file: &RawFile) -> Result<Value, ExtractionError> {
    Ok(fixture_tags(file.name()))
}

fn image(name: &str) -> RawFile {
    RawFile::from_bytes(name, "image/jpeg", vec![0xFF_u8, 0xD8, 0xFF])
}

async fn session() -> TrekSession {
    TrekSession::builder()
        .tag_reader(Arc::new(fixture_reader))
        .build()
        .await
        .unwrap()
}

/// A session holding the three waypoints plus one photo without a fix,
/// ingested out of time order.
async fn hiked_session() -> TrekSession {
    let session = session().await;
    let report = session
        .ingest(vec![image("c.jpg"), image("indoor.jpg"), image("a.jpg"), image("b.jpg")])
        .await;
    assert_eq!(report.added.len(), 4);
    session
}

fn waypoint_id(session: &TrekSession, index: usize) -> PhotoId {
    session.view().trek.get(index).unwrap().id.clone()
}

fn photo_id(session: &TrekSession, name: &str) -> PhotoId {
    session
        .photos()
        .into_iter()
        .find(|photo| photo.name == name)
        .unwrap()
        .id
}

fn drain(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

fn selected(id: &PhotoId, index: Option<usize>) -> SessionEvent {
    SessionEvent::SelectionChanged(ActiveWaypoint {
        id: Some(id.clone()),
        index,
    })
}

#[tokio::test]
async fn test_ingest_grows_by_successes_only() {
    let session = session().await;
    let files = vec![
        image("a.jpg"),
        RawFile::from_path("/definitely/not/here.jpg"),
        image("b.jpg"),
        RawFile::from_bytes("broken.heic", "image/heic", b"not an image".to_vec()),
        RawFile::from_bytes("notes.txt", "text/plain", b"hello".to_vec()),
    ];

    let report = session.ingest(files).await;

    assert_eq!(report.added.len(), 2);
    assert_eq!(report.failed.len(), 3);
    assert_eq!(session.len(), 2);
    assert_eq!(session.registry().live_count(), 2);
}

#[tokio::test]
async fn test_ingest_emits_one_trek_change_per_batch() {
    let session = session().await;
    let mut events = session.subscribe();

    session.ingest(vec![image("a.jpg"), image("b.jpg")]).await;

    let drained = drain(&mut events);
    assert_eq!(drained.len(), 1);
    let SessionEvent::TrekChanged { view, photo_count } = &drained[0] else {
        panic!("expected a trek change, got {drained:?}");
    };
    assert_eq!(*photo_count, 2);
    assert_eq!(view.trek.len(), 2);
    assert_eq!(**view, *session.view());
}

#[tokio::test]
async fn test_empty_batch_is_a_noop() {
    let session = session().await;
    let mut events = session.subscribe();
    let busy = session.busy();

    let report = session.ingest(Vec::new()).await;

    assert!(report.added.is_empty() && report.failed.is_empty());
    assert!(drain(&mut events).is_empty());
    assert!(!busy.has_changed().unwrap());
}

#[tokio::test]
async fn test_statistics_of_the_trek() {
    let session = hiked_session().await;
    let view = session.view();

    let names: Vec<&str> = view.trek.waypoints().iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);

    let stats = view.statistics.as_ref().unwrap();
    assert!((stats.total_distance_km - 2.224).abs() < 0.01, "{stats:?}");
    assert_eq!(stats.peak_elevation_m, Some(1500.0));
    assert_eq!(stats.duration_minutes, Some(240));
    assert_eq!(session.photos().len(), 4);
}

#[tokio::test]
async fn test_busy_spans_the_whole_batch() {
    let (permits, gate) = std::sync::mpsc::channel::<()>();
    let gate = Mutex::new(gate);
    let slow_reads = Arc::new(AtomicUsize::new(0));
    let reads = Arc::clone(&slow_reads);
    let slow_reader = move |file: &RawFile| -> Result<Value, ExtractionError> {
        if file.name() == "slow.jpg" {
            reads.fetch_add(1, Ordering::SeqCst);
            let _ = gate.lock().unwrap().recv();
        }
        Ok(fixture_tags(file.name()))
    };
    let session = TrekSession::builder()
        .tag_reader(Arc::new(slow_reader))
        .build()
        .await
        .unwrap();
    let mut busy = session.busy();
    assert!(!*busy.borrow_and_update());

    let slow = tokio::spawn({
        let session = session.clone();
        async move { session.ingest(vec![image("slow.jpg")]).await }
    });
    busy.changed().await.unwrap();
    assert!(*busy.borrow_and_update());
    assert!(session.is_empty(), "nothing is appended while the batch is in flight");

    // A second batch finishing does not clear the flag while the first still runs.
    let fast = session.ingest(vec![image("fast.jpg")]).await;
    assert_eq!(fast.added.len(), 1);
    assert!(session.is_busy());

    // One tag read serves both location and camera extraction.
    permits.send(()).unwrap();
    let slow = slow.await.unwrap();

    assert_eq!(slow.added.len(), 1);
    assert_eq!(slow_reads.load(Ordering::SeqCst), 1);
    assert!(!session.is_busy());
    assert_eq!(session.len(), 2);
}

#[tokio::test]
async fn test_clear_releases_handles_and_resets_selection() {
    let session = hiked_session().await;
    session.select(&waypoint_id(&session, 1));
    assert!(session.start_playback());
    let mut events = session.subscribe();

    assert_eq!(session.clear(), 4);

    assert_eq!(session.registry().live_count(), 0);
    assert_eq!(session.selection(), SelectionState::default());
    assert!(session.view().trek.is_empty());
    assert!(session.view().statistics.is_none());

    let drained = drain(&mut events);
    assert!(drained.contains(&SessionEvent::PlaybackChanged(PlaybackMode::Idle)));
    assert!(drained.contains(&SessionEvent::SelectionChanged(ActiveWaypoint::default())));
}

#[tokio::test]
async fn test_removing_selected_photo_clears_selection() {
    let session = hiked_session().await;
    let middle = waypoint_id(&session, 1);
    session.select(&middle);

    assert!(session.remove(&middle));
    assert!(!session.remove(&middle), "second remove is a no-op");

    assert!(session.selection().selected.is_none());
    assert_eq!(session.view().trek.len(), 2);
    assert_eq!(session.registry().live_count(), 3);
}

#[tokio::test]
async fn test_select_unknown_id_is_ignored() {
    let session = hiked_session().await;
    let mut events = session.subscribe();

    assert!(!session.select(&PhotoId::from("nope")));
    assert!(!session.dispatch(SurfaceCommand::MarkerActivated(PhotoId::from("nope"))));

    assert!(drain(&mut events).is_empty());
    assert!(session.selection().selected.is_none());
}

#[tokio::test]
async fn test_map_gallery_and_chart_converge() {
    let session = hiked_session().await;
    let first = waypoint_id(&session, 0);
    let middle = waypoint_id(&session, 1);
    let mut events = session.subscribe();
    let expected = selected(&middle, Some(1));

    let mut outcomes = Vec::new();
    for command in [
        SurfaceCommand::MarkerActivated(middle.clone()),
        SurfaceCommand::ChartPointActivated(middle.clone()),
        SurfaceCommand::GalleryOpenAt(1),
        SurfaceCommand::GalleryNext,
    ] {
        session.select(&first);
        drain(&mut events);

        assert!(session.dispatch(command));
        outcomes.push((drain(&mut events), session.selection()));
    }

    for (emitted, state) in outcomes {
        assert_eq!(emitted, vec![expected.clone()]);
        assert_eq!(
            state,
            SelectionState {
                selected: Some(middle.clone()),
                mode: PlaybackMode::Idle,
            }
        );
    }
}

#[tokio::test]
async fn test_gallery_wraps_and_ignores_out_of_range() {
    let session = hiked_session().await;
    let first = waypoint_id(&session, 0);
    let last = waypoint_id(&session, 2);

    assert!(session.previous());
    assert_eq!(session.active().id, Some(last.clone()));
    assert!(session.next());
    assert_eq!(session.active().id, Some(first));

    assert!(!session.open_at(3));
    assert_eq!(session.active().index, Some(0));
}

#[tokio::test]
async fn test_open_viewer_from_map_popup() {
    let session = hiked_session().await;
    let indoor = photo_id(&session, "indoor.jpg");
    let mut events = session.subscribe();

    assert!(session.dispatch(SurfaceCommand::OpenViewer(indoor.clone())));

    let active = ActiveWaypoint {
        id: Some(indoor),
        index: None,
    };
    assert_eq!(
        drain(&mut events),
        vec![
            SessionEvent::SelectionChanged(active.clone()),
            SessionEvent::ViewerOpened(active),
        ]
    );
}

#[tokio::test]
async fn test_fit_all_frames_waypoints() {
    let session = session().await;
    assert!(!session.fit_all());

    let session = hiked_session().await;
    let mut events = session.subscribe();
    assert!(session.fit_all());

    let drained = drain(&mut events);
    let [SessionEvent::FitBounds(bounds)] = drained.as_slice() else {
        panic!("expected one fit request, got {drained:?}");
    };
    assert_eq!(bounds.south, 46.0);
    assert_eq!(bounds.north, 46.02);
    assert_eq!(session.selection(), SelectionState::default());
}

#[tokio::test(start_paused = true)]
async fn test_playback_walks_the_trek_in_order() {
    let session = hiked_session().await;
    let ids: Vec<PhotoId> = (0..3).map(|i| waypoint_id(&session, i)).collect();
    let mut events = session.subscribe();
    let started = tokio::time::Instant::now();

    assert!(session.start_playback());
    assert!(!session.start_playback(), "start while playing is a no-op");

    let mut walked = Vec::new();
    loop {
        let event = events.recv().await.unwrap();
        let done = event == SessionEvent::PlaybackChanged(PlaybackMode::Idle);
        walked.push(event);
        if done {
            break;
        }
    }

    assert_eq!(
        walked,
        vec![
            SessionEvent::PlaybackChanged(PlaybackMode::Playing),
            selected(&ids[0], Some(0)),
            selected(&ids[1], Some(1)),
            selected(&ids[2], Some(2)),
            SessionEvent::PlaybackChanged(PlaybackMode::Idle),
        ]
    );
    assert!(started.elapsed() >= Duration::from_secs(9));
    assert_eq!(session.selection().selected, Some(ids[2].clone()));
    assert_eq!(session.selection().mode, PlaybackMode::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_stop_keeps_the_current_waypoint() {
    let session = hiked_session().await;
    let middle = waypoint_id(&session, 1);
    let mut events = session.subscribe();

    assert!(!session.stop_playback(), "stop while idle is a no-op");
    assert!(session.dispatch(SurfaceCommand::StartPlayback));
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::PlaybackChanged(PlaybackMode::Playing)
    );
    events.recv().await.unwrap();
    assert_eq!(events.recv().await.unwrap(), selected(&middle, Some(1)));

    assert!(session.dispatch(SurfaceCommand::StopPlayback));
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(
        drain(&mut events),
        vec![SessionEvent::PlaybackChanged(PlaybackMode::Idle)]
    );
    assert_eq!(
        session.selection(),
        SelectionState {
            selected: Some(middle),
            mode: PlaybackMode::Idle,
        }
    );
}

#[tokio::test]
async fn test_command_channel_applies_commands() {
    let session = hiked_session().await;
    let first = waypoint_id(&session, 0);
    let mut events = session.subscribe();

    let commands = session.command_channel();
    commands.send(SurfaceCommand::GalleryNext).await.unwrap();

    assert_eq!(events.recv().await.unwrap(), selected(&first, Some(0)));
    assert_eq!(session.active().id, Some(first));
}

#[tokio::test]
async fn test_snapshot_serializes() {
    let session = hiked_session().await;
    session.open_at(0);

    let snapshot = serde_json::to_value(session.snapshot()).unwrap();

    assert_eq!(snapshot["photos"].as_array().unwrap().len(), 4);
    assert_eq!(snapshot["view"]["trek"].as_array().unwrap().len(), 3);
    assert_eq!(snapshot["view"]["statistics"]["durationMinutes"], 240);
    assert_eq!(snapshot["selection"]["mode"], "idle");
    assert_eq!(snapshot["active"]["index"], 0);
}

#[tokio::test]
async fn test_data_url_and_renderable() {
    let session = hiked_session().await;
    let id = photo_id(&session, "a.jpg");

    assert_eq!(session.data_url(&id).unwrap(), "data:image/jpeg;base64,/9j/");
    let renderable = session.renderable(&id).unwrap();
    assert_eq!(&*renderable.bytes, &[0xFF, 0xD8, 0xFF]);
    assert!(session.data_url(&PhotoId::from("nope")).is_none());
}

#[tokio::test]
async fn test_export() {
    let empty = session().await;
    assert!(empty.export_gpx().unwrap().is_none());

    let session = hiked_session().await;
    let document = session.export_gpx().unwrap().unwrap();
    assert_eq!(document.matches("<trkpt").count(), 3);
    assert!(document.find("a.jpg").unwrap() < document.find("c.jpg").unwrap());
    assert!(!document.contains("indoor.jpg"));

    let dir = tempfile::tempdir().unwrap();
    let date = chrono::NaiveDate::from_ymd_opt(2024, 7, 20).unwrap();
    let path = session.export_to(dir.path(), date).await.unwrap().unwrap();
    assert_eq!(path, dir.path().join("trek_route_2024-07-20.gpx"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), document);
}
