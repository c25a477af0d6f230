//! Parsing of the tracking input stream into fixes.
//!
//! Accepted lines:
//!
//! - `<bearing>`: bearing drives both the ring and the model
//! - `<bearing> <track>`: ring shows the bearing, model shows the track
//! - `none`, `-` or an empty line: nothing to track
//! - a JSON array of position reports (needs an observer)

use crate::error::{PointerError, Result};
use crate::geo::{self, Observer, Report};
use serde::Serialize;

/// One tracking cycle's input. Angles are already in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fix {
    /// Direction from the observer to the object.
    pub bearing: f64,
    /// The object's own heading, when known.
    pub track: Option<f64>,
}

impl Fix {
    pub fn new(bearing: f64, track: Option<f64>) -> Result<Self> {
        let bearing = finite_degrees(bearing)?;
        let track = track.map(finite_degrees).transpose()?;
        Ok(Self { bearing, track })
    }

    /// Where the model should point.
    pub fn heading(&self) -> f64 {
        self.track.unwrap_or(self.bearing)
    }

    pub fn from_report(observer: &Observer, report: &Report) -> Result<Self> {
        let bearing = geo::initial_bearing(observer, report.lat, report.lon);
        Self::new(bearing, report.track)
    }
}

fn finite_degrees(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(geo::normalize_degrees(value))
    } else {
        Err(PointerError::InvalidFix(format!("angle {value} is not finite")))
    }
}

/// Parse one input line. `Ok(None)` means there is nothing to track.
pub fn parse_line(line: &str, observer: Option<&Observer>) -> Result<Option<Fix>> {
    let line = line.trim();
    if line.is_empty() || line == "-" || line.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    if line.starts_with('[') {
        let observer = observer.ok_or_else(|| {
            PointerError::InvalidFix("position reports need an observer in the config".into())
        })?;
        let reports: Vec<Report> = serde_json::from_str(line)?;
        return match geo::nearest(observer, &reports) {
            Some(report) => Fix::from_report(observer, report).map(Some),
            None => Ok(None),
        };
    }

    let mut numbers = line.split_whitespace().map(|word| {
        word.parse::<f64>()
            .map_err(|_| PointerError::InvalidFix(format!("'{word}' is not a number")))
    });
    let bearing = numbers
        .next()
        .ok_or_else(|| PointerError::InvalidFix("missing bearing".into()))??;
    let track = numbers.next().transpose()?;
    if numbers.next().is_some() {
        return Err(PointerError::InvalidFix(format!(
            "expected '<bearing> [track]', got '{line}'"
        )));
    }
    Fix::new(bearing, track).map(Some)
}
