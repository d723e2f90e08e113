mod mercator;

use chrono::NaiveDate;
use mercator::WebMercator;
use plankton::{
    ConcentrationBand, Dataset, DisplayFilter, RadiusScale, Station, Summary, histogram,
    load_stations, marker_style,
};
use remora::{
    InteractionEffect, LatLng, PointerEvent, PositionUpdate, Projection, RemoraConfig,
    ScreenPoint, Simulation, TickOutcome, TickReport, vector,
};
use serde::{Deserialize, Serialize};

/// Host frame period used to timestamp scripted pointer events.
const FRAME_MS: u64 = 16;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Data(plankton::Error),
    Engine(remora::Error),
    UnknownStation(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Data(err) => write!(f, "{err}"),
            CliError::Engine(err) => write!(f, "{err}"),
            CliError::UnknownStation(id) => write!(f, "unknown station `{id}`"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<plankton::Error> for CliError {
    fn from(value: plankton::Error) -> Self {
        Self::Data(value)
    }
}

impl From<remora::Error> for CliError {
    fn from(value: remora::Error) -> Self {
        Self::Engine(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Summary,
}

#[derive(Debug, Clone)]
struct DragScript {
    station: String,
    offset: (f64, f64),
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    stations: Option<String>,
    measurements: Option<String>,
    year: Option<i32>,
    date: Option<NaiveDate>,
    zoom: f64,
    zoom_to: Option<f64>,
    center: Option<LatLng>,
    width: f64,
    height: f64,
    ticks: usize,
    config: Option<String>,
    drag: Option<DragScript>,
    station: Option<String>,
    pretty: bool,
}

/// `--config` file: engine tuning plus the marker radius scale.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    #[serde(flatten)]
    engine: RemoraConfig,
    markers: RadiusScale,
}

fn usage() -> &'static str {
    "remora-cli\n\
\n\
USAGE:\n\
  remora-cli layout --stations <csv> --measurements <csv> [--year <y> | --date <YYYY-MM-DD>] [--zoom <z>] [--zoom-to <z>] [--center <lat>,<lng>] [--width <px>] [--height <px>] [--ticks <n>] [--config <json>] [--drag <station>:<dx>,<dy>] [--pretty]\n\
  remora-cli summary --measurements <csv> [--station <id>] [--year <y> | --date <YYYY-MM-DD>] [--pretty]\n\
\n\
NOTES:\n\
  - A --date filter takes precedence over --year.\n\
  - --center defaults to the mean of the station coordinates; --zoom defaults to 11.\n\
  - --drag presses on the station after the first tick, moves it by (dx,dy) pixels, holds it\n\
    for one tick and releases it before the remaining ticks. The held tick counts toward\n\
    --ticks and always runs; with --ticks 1 it is the only one.\n\
  - --zoom-to simulates a zoom transition after the ticks and runs them again at the new zoom.\n\
  - Logs go to stderr; set RUST_LOG to adjust (default remora=info,plankton=info).\n\
"
}

fn parse_next<'a, T: std::str::FromStr>(
    it: &mut impl Iterator<Item = &'a String>,
) -> Result<T, CliError> {
    let Some(raw) = it.next() else {
        return Err(CliError::Usage(usage()));
    };
    raw.trim()
        .parse::<T>()
        .map_err(|_| CliError::Usage(usage()))
}

fn parse_pair(raw: &str) -> Option<(f64, f64)> {
    let (a, b) = raw.split_once(',')?;
    let a = a.trim().parse::<f64>().ok()?;
    let b = b.trim().parse::<f64>().ok()?;
    (a.is_finite() && b.is_finite()).then_some((a, b))
}

fn parse_drag(raw: &str) -> Option<DragScript> {
    let (station, offset) = raw.rsplit_once(':')?;
    if station.is_empty() {
        return None;
    }
    Some(DragScript {
        station: station.to_string(),
        offset: parse_pair(offset)?,
    })
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        zoom: 11.0,
        width: 800.0,
        height: 600.0,
        ticks: 60,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "summary" => args.command = Command::Summary,
            "--pretty" => args.pretty = true,
            "--stations" => args.stations = Some(parse_next(&mut it)?),
            "--measurements" => args.measurements = Some(parse_next(&mut it)?),
            "--config" => args.config = Some(parse_next(&mut it)?),
            "--station" => args.station = Some(parse_next(&mut it)?),
            "--year" => args.year = Some(parse_next(&mut it)?),
            "--date" => args.date = Some(parse_next(&mut it)?),
            "--zoom" => args.zoom = parse_next(&mut it)?,
            "--zoom-to" => args.zoom_to = Some(parse_next(&mut it)?),
            "--width" => args.width = parse_next(&mut it)?,
            "--height" => args.height = parse_next(&mut it)?,
            "--ticks" => args.ticks = parse_next(&mut it)?,
            "--center" => {
                let raw: String = parse_next(&mut it)?;
                let (lat, lng) = parse_pair(&raw).ok_or(CliError::Usage(usage()))?;
                args.center = Some(LatLng::new(lat, lng));
            }
            "--drag" => {
                let raw: String = parse_next(&mut it)?;
                args.drag = Some(parse_drag(&raw).ok_or(CliError::Usage(usage()))?);
            }
            _ => return Err(CliError::Usage(usage())),
        }
    }

    if !(args.zoom.is_finite() && args.width > 0.0 && args.height > 0.0) {
        return Err(CliError::Usage(usage()));
    }
    if args.measurements.is_none() {
        return Err(CliError::Usage(usage()));
    }
    if matches!(args.command, Command::Layout) && args.stations.is_none() {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    use std::io::Write;

    let mut out = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<ConfigFile, CliError> {
    let Some(path) = path else {
        return Ok(ConfigFile::default());
    };
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn mean_center(stations: &[Station]) -> LatLng {
    let n = stations.len().max(1) as f64;
    let (lat, lng) = stations.iter().fold((0.0, 0.0), |(lat, lng), s| {
        (lat + s.anchor.lat, lng + s.anchor.lng)
    });
    LatLng::new(lat / n, lng / n)
}

#[derive(Debug, Default, Serialize)]
struct TickTotals {
    ran: usize,
    skipped: usize,
    emitted: usize,
    last_max_displacement: f64,
}

impl TickTotals {
    fn record(&mut self, report: TickReport) {
        if report.outcome == TickOutcome::Ran {
            self.ran += 1;
        } else {
            self.skipped += 1;
        }
        self.emitted += report.emitted;
        self.last_max_displacement = report.max_displacement;
    }
}

/// Drives the simulation the way a map host would: one tick per frame, pointer events in
/// between, with a monotonic millisecond clock.
struct Host {
    sim: Simulation,
    projection: WebMercator,
    now_ms: u64,
    totals: TickTotals,
    effects: Vec<InteractionEffect>,
}

impl Host {
    fn frame(&mut self) {
        let mut updates: Vec<PositionUpdate> = Vec::new();
        let report = self.sim.tick(&self.projection, &mut updates);
        self.totals.record(report);
        self.now_ms += FRAME_MS;
    }

    fn run(&mut self, frames: usize) {
        for _ in 0..frames {
            self.frame();
        }
    }

    fn pointer(&mut self, event: PointerEvent) {
        let effects = self.sim.handle_pointer(event, self.now_ms);
        self.effects.extend(effects);
    }

    fn drag(&mut self, script: &DragScript) -> Result<(), CliError> {
        let handle = self
            .sim
            .registry()
            .handle(&script.station)
            .ok_or_else(|| CliError::UnknownStation(script.station.clone()))?;
        let from = match self.sim.node(handle).and_then(|n| n.simulated_position()) {
            Some(p) => p,
            None => {
                let anchor = self
                    .sim
                    .node(handle)
                    .map(|n| n.anchor())
                    .ok_or_else(|| CliError::UnknownStation(script.station.clone()))?;
                self.projection.project(anchor)?
            }
        };
        let to = from + vector(script.offset.0, script.offset.1);
        tracing::info!(
            station = %script.station,
            dx = script.offset.0,
            dy = script.offset.1,
            "scripted drag"
        );

        self.pointer(PointerEvent::Down {
            pixel: from,
            target: Some(handle),
        });
        self.pointer(PointerEvent::Move { pixel: to });
        self.frame();
        self.pointer(PointerEvent::Up { pixel: to });
        self.pointer(PointerEvent::Click {
            target: Some(handle),
        });
        Ok(())
    }

    fn rezoom(&mut self, zoom: f64) {
        self.sim.begin_transition();
        // The map animates; frames during the animation are no-ops.
        self.run(3);
        self.projection = self.projection.with_zoom(zoom);
        self.sim.end_transition();
    }
}

#[derive(Serialize)]
struct MarkerOut<'a> {
    id: &'a str,
    name: &'a str,
    anchor: LatLng,
    anchor_pixel: Option<ScreenPoint>,
    pixel: Option<ScreenPoint>,
    declutter_radius: f64,
    display_radius: f64,
    band: Option<ConcentrationBand>,
    fill: &'static str,
    peak: Option<f64>,
}

#[derive(Serialize)]
struct LayoutOut<'a> {
    center: LatLng,
    zoom: f64,
    width: f64,
    height: f64,
    ticks: TickTotals,
    effects: Vec<InteractionEffect>,
    markers: Vec<MarkerOut<'a>>,
}

fn run_layout(args: &Args) -> Result<(), CliError> {
    let (Some(stations_path), Some(measurements_path)) =
        (args.stations.as_deref(), args.measurements.as_deref())
    else {
        return Err(CliError::Usage(usage()));
    };
    let config = load_config(args.config.as_deref())?;
    let stations = load_stations(stations_path)?;
    let dataset = Dataset::load(measurements_path)?;
    let filter = DisplayFilter::from_parts(args.year, args.date);
    tracing::info!(
        stations = stations.len(),
        measurements = dataset.measurement_count(),
        dangerous = dataset.danger_count(),
        ?filter,
        "data loaded"
    );

    let mut sim = Simulation::new(config.engine)?;
    let mut styles = Vec::with_capacity(stations.len());
    for station in &stations {
        sim.register(station.id.as_str(), station.anchor)?;
        let style = marker_style(&dataset, &station.id, filter, &config.markers);
        sim.set_target_radius(&station.id, style.declutter_radius)?;
        styles.push(style);
    }

    let center = args.center.unwrap_or_else(|| mean_center(&stations));
    let mut host = Host {
        sim,
        projection: WebMercator::new(center, args.zoom, args.width, args.height),
        now_ms: 0,
        totals: TickTotals::default(),
        effects: Vec::new(),
    };

    match &args.drag {
        Some(script) => {
            // The held frame counts toward --ticks.
            host.run(args.ticks.saturating_sub(1).min(1));
            host.drag(script)?;
            host.run(args.ticks.saturating_sub(2));
        }
        None => host.run(args.ticks),
    }
    if let Some(zoom) = args.zoom_to {
        host.rezoom(zoom);
        host.run(args.ticks);
    }

    let markers = stations
        .iter()
        .zip(&styles)
        .map(|(station, style)| {
            let node = host.sim.node_by_id(&station.id);
            MarkerOut {
                id: &station.id,
                name: &station.name,
                anchor: station.anchor,
                anchor_pixel: node.and_then(|n| n.target_pixel()),
                pixel: node.and_then(|n| n.rendered_position()),
                declutter_radius: style.declutter_radius,
                display_radius: style.display_radius,
                band: style.band,
                fill: style.fill_color(),
                peak: style.peak,
            }
        })
        .collect();

    let out = LayoutOut {
        center,
        zoom: host.projection.zoom(),
        width: args.width,
        height: args.height,
        ticks: host.totals,
        effects: host.effects,
        markers,
    };
    write_json(&out, args.pretty)
}

#[derive(Serialize)]
struct SummaryOut<'a> {
    station: Option<&'a str>,
    measurements: usize,
    dangerous: usize,
    summary: Summary,
    histogram: Vec<plankton::HistogramBin>,
    years: Vec<i32>,
}

fn run_summary(args: &Args) -> Result<(), CliError> {
    let Some(measurements_path) = args.measurements.as_deref() else {
        return Err(CliError::Usage(usage()));
    };
    let dataset = Dataset::load(measurements_path)?;
    let filter = DisplayFilter::from_parts(args.year, args.date);
    let series = match args.station.as_deref() {
        Some(id) => dataset
            .station(id)
            .ok_or_else(|| CliError::UnknownStation(id.to_string()))?,
        None => dataset.global(),
    };
    let values = series.values(filter);
    let out = SummaryOut {
        station: args.station.as_deref(),
        measurements: dataset.measurement_count(),
        dangerous: dataset.danger_count(),
        summary: Summary::from_values(&values),
        histogram: histogram(&values, plankton::DEFAULT_BIN_WIDTH),
        years: series.years().collect(),
    };
    write_json(&out, args.pretty)
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Layout => run_layout(&args),
        Command::Summary => run_summary(&args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("remora=info,plankton=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing();

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
