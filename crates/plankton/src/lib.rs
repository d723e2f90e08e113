#![forbid(unsafe_code)]

//! Monitoring-station data for the `remora` declutter engine.
//!
//! Reads the station and measurement CSV exports, aggregates readings per station, year and
//! day, and turns a [`DisplayFilter`] into per-station [`MarkerStyle`]s whose
//! `declutter_radius` feeds `remora::Simulation::set_target_radius`.

pub mod dataset;
pub mod error;
pub mod measurement;
pub mod station;
pub mod style;
pub mod summary;

pub use dataset::{DANGER_THRESHOLD, Dataset, DisplayFilter, StationSeries};
pub use error::{Error, Result};
pub use measurement::{MeasurementRow, Sample};
pub use station::{Station, load_stations, parse_stations};
pub use style::{ConcentrationBand, MarkerStyle, NO_DATA_COLOR, RadiusScale, marker_style};
pub use summary::{HistogramBin, Summary, histogram};

/// Histogram bin width used by the source dashboards, in ppm.
pub const DEFAULT_BIN_WIDTH: f64 = 0.05;

pub(crate) fn csv_reader<R: std::io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}
