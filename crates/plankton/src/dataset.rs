use crate::error::Result;
use crate::measurement::{MeasurementRow, Sample, parse_measurements};
use chrono::NaiveDate;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Readings at or above this concentration (ppm) count as dangerous.
pub const DANGER_THRESHOLD: f64 = 1.0;

/// Which slice of the data drives the marker sizes and the summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayFilter {
    #[default]
    AllYears,
    Year(i32),
    /// A single day. Takes precedence over any year selection.
    Date(NaiveDate),
}

impl DisplayFilter {
    /// Builds a filter from optional CLI-style selections; a date wins over a year.
    pub fn from_parts(year: Option<i32>, date: Option<NaiveDate>) -> Self {
        match (date, year) {
            (Some(date), _) => Self::Date(date),
            (None, Some(year)) => Self::Year(year),
            (None, None) => Self::AllYears,
        }
    }
}

/// All samples for one station (or for every station, in the global series).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationSeries {
    all: Vec<Sample>,
    by_year: BTreeMap<i32, Vec<Sample>>,
}

impl StationSeries {
    fn push(&mut self, year: i32, sample: Sample) {
        self.all.push(sample);
        self.by_year.entry(year).or_default().push(sample);
    }

    pub fn all(&self) -> &[Sample] {
        &self.all
    }

    pub fn year(&self, year: i32) -> &[Sample] {
        self.by_year.get(&year).map(Vec::as_slice).unwrap_or_default()
    }

    /// Years with at least one sample, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.by_year.keys().copied()
    }

    pub fn filtered(&self, filter: DisplayFilter) -> Vec<&Sample> {
        match filter {
            DisplayFilter::AllYears => self.all.iter().collect(),
            DisplayFilter::Year(year) => self.year(year).iter().collect(),
            DisplayFilter::Date(date) => self
                .all
                .iter()
                .filter(|s| s.date == Some(date))
                .collect(),
        }
    }

    pub fn values(&self, filter: DisplayFilter) -> Vec<f64> {
        self.filtered(filter).into_iter().map(|s| s.value).collect()
    }

    /// Distinct sample dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.all.iter().filter_map(|s| s.date).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    /// The sampled days immediately before and after `date`, for day-by-day navigation.
    /// Both are `None` when `date` itself has no samples.
    pub fn adjacent_dates(&self, date: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let dates = self.dates();
        let Ok(idx) = dates.binary_search(&date) else {
            return (None, None);
        };
        let prev = idx.checked_sub(1).map(|i| dates[i]);
        let next = dates.get(idx + 1).copied();
        (prev, next)
    }

    /// Samples of one day ordered by time of day; samples without a time come last.
    pub fn daily(&self, date: NaiveDate) -> Vec<Sample> {
        let mut day: Vec<Sample> = self
            .all
            .iter()
            .filter(|s| s.date == Some(date))
            .copied()
            .collect();
        day.sort_by_key(|s| (s.time.is_none(), s.time));
        day
    }
}

/// Measurements aggregated per station, plus a global series across all stations.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    stations: IndexMap<String, StationSeries, FxBuildHasher>,
    global: StationSeries,
    measurement_count: usize,
    danger_count: usize,
}

impl Dataset {
    pub fn from_rows(rows: impl IntoIterator<Item = MeasurementRow>) -> Self {
        let mut dataset = Self::default();
        for row in rows {
            dataset.push(row);
        }
        dataset
    }

    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::from_rows(parse_measurements(reader)?))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::parse(std::io::BufReader::new(file))
    }

    pub fn push(&mut self, row: MeasurementRow) {
        self.measurement_count += 1;
        if row.sample.value >= DANGER_THRESHOLD {
            self.danger_count += 1;
        }
        self.global.push(row.year, row.sample);
        self.stations
            .entry(row.station_id)
            .or_default()
            .push(row.year, row.sample);
    }

    pub fn station(&self, id: &str) -> Option<&StationSeries> {
        self.stations.get(id)
    }

    pub fn stations(&self) -> impl Iterator<Item = (&str, &StationSeries)> + '_ {
        self.stations.iter().map(|(id, s)| (id.as_str(), s))
    }

    pub fn global(&self) -> &StationSeries {
        &self.global
    }

    /// Values for `id` under `filter`; empty for a station without measurements.
    pub fn values(&self, id: &str, filter: DisplayFilter) -> Vec<f64> {
        self.station(id)
            .map(|s| s.values(filter))
            .unwrap_or_default()
    }

    pub fn measurement_count(&self) -> usize {
        self.measurement_count
    }

    pub fn danger_count(&self) -> usize {
        self.danger_count
    }

    pub fn is_empty(&self) -> bool {
        self.measurement_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn row(
        year: i32,
        station: &str,
        date: (i32, u32, u32),
        time: Option<(u32, u32)>,
        value: f64,
    ) -> MeasurementRow {
        MeasurementRow {
            year,
            station_id: station.to_string(),
            sample: Sample {
                date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
                time: time.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
                value,
            },
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn aggregates_per_station_year_and_globally() {
        let ds = Dataset::from_rows([
            row(2022, "a", (2022, 6, 1), Some((9, 0)), 0.1),
            row(2023, "a", (2023, 6, 1), Some((9, 0)), 1.5),
            row(2023, "b", (2023, 6, 1), None, 1.0),
        ]);
        assert_eq!(ds.measurement_count(), 3);
        assert_eq!(ds.danger_count(), 2);
        assert_eq!(ds.values("a", DisplayFilter::AllYears), vec![0.1, 1.5]);
        assert_eq!(ds.values("a", DisplayFilter::Year(2023)), vec![1.5]);
        assert_eq!(ds.values("missing", DisplayFilter::AllYears), Vec::<f64>::new());
        assert_eq!(ds.global().year(2023).len(), 2);
        assert_eq!(
            ds.station("a").map(|s| s.years().collect::<Vec<_>>()),
            Some(vec![2022, 2023])
        );
    }

    #[test]
    fn date_filter_wins_over_year() {
        assert_eq!(
            DisplayFilter::from_parts(Some(2022), Some(day(2023, 6, 1))),
            DisplayFilter::Date(day(2023, 6, 1))
        );
        assert_eq!(DisplayFilter::from_parts(Some(2022), None), DisplayFilter::Year(2022));
        assert_eq!(DisplayFilter::from_parts(None, None), DisplayFilter::AllYears);
    }

    #[test]
    fn daily_samples_are_time_ordered_and_navigable() {
        let ds = Dataset::from_rows([
            row(2023, "a", (2023, 6, 2), Some((14, 0)), 0.3),
            row(2023, "a", (2023, 6, 2), None, 0.5),
            row(2023, "a", (2023, 6, 2), Some((8, 30)), 0.2),
            row(2023, "a", (2023, 6, 1), Some((9, 0)), 0.1),
            row(2023, "a", (2023, 6, 9), Some((9, 0)), 0.1),
        ]);
        let series = ds.station("a").expect("station a");

        let values: Vec<f64> = series.daily(day(2023, 6, 2)).iter().map(|s| s.value).collect();
        assert_eq!(values, vec![0.2, 0.3, 0.5]);

        assert_eq!(
            series.adjacent_dates(day(2023, 6, 2)),
            (Some(day(2023, 6, 1)), Some(day(2023, 6, 9)))
        );
        assert_eq!(series.adjacent_dates(day(2023, 6, 1)), (None, Some(day(2023, 6, 2))));
        assert_eq!(series.adjacent_dates(day(2023, 6, 5)), (None, None));
    }
}
