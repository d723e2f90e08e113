use crate::error::{Error, Result};
use remora::LatLng;
use serde::Serialize;
use std::io::Read;
use std::path::Path;

const FILE: &str = "stations";

/// A monitoring station: one marker on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub id: String,
    pub anchor: LatLng,
    pub name: String,
}

/// Reads `id,lat,lng,name` rows after a header line.
///
/// Short rows and rows whose coordinates do not parse are skipped with a warning. A station
/// list is rejected when its header is too narrow or when no row survives.
pub fn parse_stations<R: Read>(reader: R) -> Result<Vec<Station>> {
    let mut rdr = super::csv_reader(reader);
    if rdr.headers()?.len() < 4 {
        return Err(Error::MissingColumn {
            file: FILE,
            column: "name",
        });
    }

    let mut out = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        // +2: 1-based, after the header row.
        let line = idx + 2;
        if record.len() < 4 {
            tracing::warn!(line, "station row has fewer than 4 columns; skipped");
            continue;
        }
        let id = record[0].to_string();
        let (Ok(lat), Ok(lng)) = (record[1].parse::<f64>(), record[2].parse::<f64>()) else {
            tracing::warn!(line, station = %id, "station coordinates do not parse; skipped");
            continue;
        };
        let anchor = LatLng::new(lat, lng);
        if !anchor.is_valid() {
            tracing::warn!(
                line,
                station = %id,
                lat,
                lng,
                "station coordinates out of range; skipped"
            );
            continue;
        }
        out.push(Station {
            id,
            anchor,
            name: record[3].to_string(),
        });
    }
    if out.is_empty() {
        return Err(Error::Empty { file: FILE });
    }
    Ok(out)
}

pub fn load_stations(path: impl AsRef<Path>) -> Result<Vec<Station>> {
    let file = std::fs::File::open(path)?;
    parse_stations(std::io::BufReader::new(file))
}
