//! Marker styling: how a station's readings turn into a radius and a colour.

use crate::dataset::{Dataset, DisplayFilter};
use serde::{Deserialize, Serialize};

/// Fill colour of a station with no readings under the current filter.
pub const NO_DATA_COLOR: &str = "#AAAAAA";

/// H2S risk levels, in ppm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcentrationBand {
    Trace,
    Low,
    Moderate,
    High,
    Severe,
}

impl ConcentrationBand {
    pub const ALL: [ConcentrationBand; 5] = [
        Self::Trace,
        Self::Low,
        Self::Moderate,
        Self::High,
        Self::Severe,
    ];

    pub fn classify(value: f64) -> Self {
        if value < 0.05 {
            Self::Trace
        } else if value < 0.2 {
            Self::Low
        } else if value < 1.0 {
            Self::Moderate
        } else if value < 2.0 {
            Self::High
        } else {
            Self::Severe
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Trace => "#87CC21",
            Self::Low => "#b5ff5e",
            Self::Moderate => "#ff91d1",
            Self::High => "#e845b2",
            Self::Severe => "#212121",
        }
    }

    /// Lower bound of the band, inclusive.
    pub fn lower_bound(self) -> f64 {
        match self {
            Self::Trace => 0.0,
            Self::Low => 0.05,
            Self::Moderate => 0.2,
            Self::High => 1.0,
            Self::Severe => 2.0,
        }
    }
}

/// Maps a station's peak reading to a marker radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusScale {
    /// Radius for a 0 ppm peak.
    pub base: f64,
    /// Radius for a 1 ppm peak; larger peaks extrapolate linearly.
    pub at_one_ppm: f64,
    pub max: f64,
    /// Display radius of the grey no-data dot. Such markers never collide.
    pub no_data: f64,
}

impl Default for RadiusScale {
    fn default() -> Self {
        Self {
            base: 6.0,
            at_one_ppm: 20.0,
            max: 30.0,
            no_data: 5.0,
        }
    }
}

impl RadiusScale {
    pub fn radius_for(&self, peak: f64) -> f64 {
        let r = map_range(peak, 0.0, 1.0, self.base, self.at_one_ppm);
        r.max(self.base).min(self.max)
    }
}

fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    if in_min == in_max {
        return out_min;
    }
    (value - in_min) / (in_max - in_min) * (out_max - out_min) + out_min
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerStyle {
    /// Radius fed to the declutter solver.
    pub declutter_radius: f64,
    /// Radius the marker is drawn with.
    pub display_radius: f64,
    /// `None` when the station has no readings under the filter.
    pub band: Option<ConcentrationBand>,
    pub peak: Option<f64>,
}

impl MarkerStyle {
    pub fn fill_color(&self) -> &'static str {
        self.band.map(ConcentrationBand::color).unwrap_or(NO_DATA_COLOR)
    }

    pub fn has_data(&self) -> bool {
        self.band.is_some()
    }
}

pub fn marker_style(
    dataset: &Dataset,
    station_id: &str,
    filter: DisplayFilter,
    scale: &RadiusScale,
) -> MarkerStyle {
    let peak = dataset
        .values(station_id, filter)
        .into_iter()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));
    match peak {
        Some(peak) => {
            let radius = scale.radius_for(peak);
            MarkerStyle {
                declutter_radius: radius,
                display_radius: radius,
                band: Some(ConcentrationBand::classify(peak)),
                peak: Some(peak),
            }
        }
        None => MarkerStyle {
            declutter_radius: 0.0,
            display_radius: scale.no_data,
            band: None,
            peak: None,
        },
    }
}
