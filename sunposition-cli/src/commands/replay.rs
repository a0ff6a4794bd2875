//! `sunposition replay`: feed a recorded sensor log through a tracking session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::TryRecvError};

use sunposition::animation::{AnimationFrame, SunAnimationFrame};
use sunposition::config::{TrackerConfig, MAX_HOUR_OFFSET};
use sunposition::freshness::{FileFreshnessStore, FreshnessStore, MemoryFreshnessStore};
use sunposition::orientation::Orientation;
use sunposition::query::{Coordinate, FixedLocation, QueryOutcome, SunPosition};
use sunposition::sensor::{ManualSensorSource, SensorEvent};
use sunposition::session::SunTracker;
use sunposition::time::Timestamp;
use sunposition::visibility::VisibilityState;

use super::common::resolve_state_path;
use crate::ephemeris::FixedEphemeris;
use crate::error::CliError;
use crate::sensor_log::{self, LogEntry};

/// How long to wait for the fusion task to catch up with the log.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Arguments for the replay command.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Sensor log to replay (lines of `<accel|mag> x y z`)
    pub log: PathBuf,

    /// Device latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Device longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Sun azimuth to report, degrees clockwise from north
    #[arg(long, allow_hyphen_values = true)]
    pub azimuth: f64,

    /// Sun altitude to report, degrees above the horizon
    #[arg(long, allow_hyphen_values = true)]
    pub altitude: f64,

    /// Hours added to the current time for the query (overrides config)
    #[arg(long, allow_hyphen_values = true)]
    pub hour_offset: Option<i64>,

    /// Freshness state file (default: data directory)
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Keep the freshness record in memory only
    #[arg(long, conflicts_with = "state_file")]
    pub no_persist: bool,

    /// Also print compass dial frames
    #[arg(long)]
    pub compass: bool,
}

/// Everything a replay produced.
#[derive(Debug)]
pub struct ReplayReport {
    pub events: usize,
    pub outcome: Option<QueryOutcome>,
    pub compass_frames: Vec<AnimationFrame>,
    pub sun_frames: Vec<SunAnimationFrame>,
    pub lagged: u64,
    pub visibility: VisibilityState,
    pub orientation: Option<Orientation>,
}

/// Run the replay command.
pub fn run(args: ReplayArgs, config: TrackerConfig, verbose: bool) -> Result<(), CliError> {
    if let Some(hours) = args.hour_offset {
        if hours.abs() > MAX_HOUR_OFFSET {
            return Err(CliError::Argument(format!(
                "--hour-offset must be within ±{} hours",
                MAX_HOUR_OFFSET
            )));
        }
    }

    let entries = sensor_log::read_file(&args.log)?;

    let store: Arc<dyn FreshnessStore> = if args.no_persist {
        Arc::new(MemoryFreshnessStore::new())
    } else {
        Arc::new(FileFreshnessStore::new(resolve_state_path(
            args.state_file.clone(),
        )?))
    };

    // Frames are collected after the run, so the channels must hold them all.
    let capacity = config.output.channel_capacity.max(entries.len() + 1);
    let mut config = config.with_channel_capacity(capacity);
    if let Some(hours) = args.hour_offset {
        config = config.with_hour_offset(hours);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let report = runtime.block_on(replay(
        runtime.handle().clone(),
        &args,
        config,
        store,
        &entries,
    ))?;

    print_report(&report, args.compass, verbose);
    Ok(())
}

/// Drive one session over `entries` and collect its output.
pub async fn replay(
    handle: Handle,
    args: &ReplayArgs,
    config: TrackerConfig,
    store: Arc<dyn FreshnessStore>,
    entries: &[LogEntry],
) -> Result<ReplayReport, CliError> {
    let sensors = Arc::new(ManualSensorSource::new());
    let mut tracker = SunTracker::new(
        handle,
        config,
        Arc::new(FixedLocation::new(Coordinate::new(args.lat, args.lon))),
        Arc::new(FixedEphemeris::new(SunPosition::new(args.azimuth, args.altitude))),
        store,
        sensors.clone(),
    )?;

    let mut compass_rx = tracker.subscribe_compass();
    let mut sun_rx = tracker.subscribe_sun();
    let mut processed = tracker.subscribe_processed();

    // A new tracker has no position, so resume queries whatever the state file says.
    if !tracker.resume(Timestamp::now()) {
        tracing::warn!("Sun position query was not started");
    }
    let outcome = tracker.wait_for_query().await;

    let base = *processed.borrow();
    for entry in entries {
        if !sensors.send(SensorEvent::now(entry.kind, entry.vector)).await {
            return Err(CliError::Runtime("sensor subscription closed".to_string()));
        }
    }

    let target = base + entries.len() as u64;
    tokio::time::timeout(DRAIN_TIMEOUT, processed.wait_for(|n| *n >= target))
        .await
        .map_err(|_| CliError::Timeout("sensor log was not fully processed".to_string()))?
        .map_err(|_| CliError::Runtime("fusion task stopped early".to_string()))?;

    tracker.pause().await;

    let mut lagged = 0;
    let compass_frames = drain(&mut compass_rx, &mut lagged);
    let sun_frames = drain(&mut sun_rx, &mut lagged);

    Ok(ReplayReport {
        events: entries.len(),
        outcome,
        compass_frames,
        sun_frames,
        lagged,
        visibility: tracker.visibility(),
        orientation: tracker
            .fusion_state()
            .and_then(|state| state.filter().last_orientation()),
    })
}

fn drain<T: Clone>(rx: &mut broadcast::Receiver<T>, lagged: &mut u64) -> Vec<T> {
    let mut frames = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(frame) => frames.push(frame),
            Err(TryRecvError::Lagged(n)) => *lagged += n,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    frames
}

fn print_report(report: &ReplayReport, show_compass: bool, verbose: bool) {
    println!("Replayed {} sensor events", report.events);

    match &report.outcome {
        Some(QueryOutcome::Completed(p)) => println!(
            "Sun query:   completed (azimuth {:.1}°, altitude {:.1}°)",
            p.azimuth, p.altitude
        ),
        Some(QueryOutcome::Failed(e)) => println!("Sun query:   failed ({})", e),
        Some(other) => println!("Sun query:   {:?}", other),
        None => println!("Sun query:   not started"),
    }
    println!("Status:      {}", report.visibility);

    if show_compass {
        println!();
        println!("Compass frames ({}):", report.compass_frames.len());
        for frame in &report.compass_frames {
            println!("  dial {:>9.3}° -> {:>9.3}°", frame.previous, frame.current);
        }
    }

    println!();
    println!("Sun frames ({}):", report.sun_frames.len());
    for frame in &report.sun_frames {
        println!(
            "  angle {:>8.3}° -> {:>8.3}°   radius {:>3} -> {:>3}",
            frame.previous_angle,
            frame.current_angle,
            frame.previous_radius_offset,
            frame.current_radius_offset
        );
    }

    if report.lagged > 0 {
        println!("({} frames skipped by a lagging receiver)", report.lagged);
    }

    if verbose {
        match report.orientation {
            Some(o) => println!(
                "Final orientation: azimuth {:.1}°, pitch {:.1}°, roll {:.1}°",
                o.azimuth.to_degrees(),
                o.pitch.to_degrees(),
                o.roll.to_degrees()
            ),
            None => println!("Final orientation: unknown (need both sensor kinds)"),
        }
    }
}
