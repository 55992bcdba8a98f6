use chrono::Utc;
use clap::{ArgAction, Parser, ValueHint};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;
use trek_track::utils::expand_inputs;
use trek_track::{PlaybackMode, RawFile, SessionEvent, TrekSession};

#[derive(Parser, Debug)]
#[command(author, version, about = "Rebuild a trek from geotagged photos", long_about = None)]
struct Cli {
    /// Photo files or directories to ingest
    #[arg(required = true, value_hint = ValueHint::AnyPath)]
    inputs: Vec<PathBuf>,

    /// Write `trek_route_<date>.gpx` into this directory
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    output_dir: Option<PathBuf>,

    /// Use this exiftool executable instead of the one on PATH
    #[arg(long, value_hint = ValueHint::ExecutablePath)]
    exiftool: Option<PathBuf>,

    /// Playback dwell per waypoint, in milliseconds
    #[arg(long, default_value_t = 3000)]
    dwell_ms: u64,

    /// Walk the trek once and log every waypoint
    #[arg(long, action = ArgAction::SetTrue)]
    play: bool,

    /// Print the session snapshot as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Also ingest hidden files inside directories
    #[arg(long, action = ArgAction::SetTrue)]
    include_hidden: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();

    let session = TrekSession::builder()
        .maybe_exiftool_path(cli.exiftool)
        .dwell(Duration::from_millis(cli.dwell_ms))
        .build()
        .await?;

    let files = expand_inputs(&cli.inputs, cli.include_hidden)?;
    println!("Found {} files.", files.len());
    let report = session
        .ingest(files.into_iter().map(RawFile::from_path).collect())
        .await;
    for failure in &report.failed {
        println!("Skipped {}: {}", failure.name, failure.reason);
    }

    let view = session.view();
    println!(
        "{} photos, {} waypoints",
        session.len(),
        view.trek.len()
    );
    match &view.statistics {
        Some(stats) => {
            println!("Distance: {:.2} km", stats.total_distance_km);
            match stats.peak_elevation_m {
                Some(peak) => println!("Peak elevation: {peak:.0} m"),
                None => println!("Peak elevation: unknown"),
            }
            match stats.duration_minutes {
                Some(minutes) => println!("Duration: {}h {:02}m", minutes / 60, minutes % 60),
                None => println!("Duration: unknown"),
            }
        }
        None => println!("Not enough waypoints for statistics."),
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    }

    if cli.play {
        let mut events = session.subscribe();
        if session.start_playback() {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::SelectionChanged(active)) => {
                        let waypoint = active.index.and_then(|index| view.trek.get(index));
                        if let Some(waypoint) = waypoint {
                            tracing::info!(
                                number = waypoint.number,
                                name = %waypoint.name,
                                lat = waypoint.location.lat,
                                lng = waypoint.location.lng,
                                "waypoint"
                            );
                        }
                    }
                    Ok(SessionEvent::PlaybackChanged(PlaybackMode::Idle)) => break,
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    if let Some(dir) = cli.output_dir {
        match session.export_to(&dir, Utc::now().date_naive()).await? {
            Some(path) => println!("Wrote {}", path.display()),
            None => println!("No geotagged photos, nothing to export."),
        }
    }

    Ok(())
}
