use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::io::Read;

const FILE: &str = "measurements";

/// One concentration reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    /// ppm, never negative.
    pub value: f64,
}

/// A parsed measurement row before aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub year: i32,
    pub station_id: String,
    pub sample: Sample,
}

/// Parses the date half of `M/D/YY H:MM`. Two-digit years are read as 20xx.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;
    let mut parts = date_part.split('/');
    let (m, d, y) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let month: u32 = m.parse().ok()?;
    let day: u32 = d.parse().ok()?;
    let mut year: i32 = y.parse().ok()?;
    if y.len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses the time-of-day half of `M/D/YY H:MM`, if there is one.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let time_part = raw.split_whitespace().nth(1)?;
    NaiveTime::parse_from_str(time_part, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time_part, "%H:%M"))
        .ok()
}

/// Parses a concentration cell. `nd` (not detected), empty and non-numeric cells yield `None`;
/// negative readings clamp to 0.
pub fn parse_concentration(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nd") {
        return None;
    }
    let value: f64 = raw.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.max(0.0))
}

/// Reads `year,station_id,datetime,concentration` rows after a header line.
///
/// Rows without a usable concentration are dropped silently (they are routine in the source
/// files); structurally broken rows are dropped with a warning.
pub fn parse_measurements<R: Read>(reader: R) -> Result<Vec<MeasurementRow>> {
    let mut rdr = super::csv_reader(reader);
    if rdr.headers()?.len() < 4 {
        return Err(Error::MissingColumn {
            file: FILE,
            column: "concentration",
        });
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let line = idx + 2;
        if record.len() < 4 {
            tracing::warn!(line, "measurement row has fewer than 4 columns; skipped");
            skipped += 1;
            continue;
        }
        let Some(value) = parse_concentration(&record[3]) else {
            skipped += 1;
            continue;
        };
        let Ok(year) = record[0].parse::<i32>() else {
            tracing::warn!(line, year = &record[0], "measurement year does not parse; skipped");
            skipped += 1;
            continue;
        };
        let raw_datetime = &record[2];
        rows.push(MeasurementRow {
            year,
            station_id: record[1].to_string(),
            sample: Sample {
                date: parse_date(raw_datetime),
                time: parse_time(raw_datetime),
                value,
            },
        });
    }
    tracing::debug!(rows = rows.len(), skipped, "measurements parsed");
    Ok(rows)
}
