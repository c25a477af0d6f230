//! Spherical-earth helpers for turning position reports into bearings.

use serde::{Deserialize, Serialize};

/// Where the pointer is installed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    pub lat: f64,
    pub lon: f64,
}

impl Observer {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// One tracked object as reported by the position feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub lat: f64,
    pub lon: f64,
    /// The object's own heading, degrees clockwise from north.
    #[serde(default, alias = "trak")]
    pub track: Option<f64>,
    #[serde(default)]
    pub on_ground: bool,
}

/// Reduce any finite angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees.rem_euclid(360.0);
    // rem_euclid of a tiny negative rounds up to exactly 360
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Initial great-circle bearing from `from` to (`lat`, `lon`), in `[0, 360)`.
pub fn initial_bearing(from: &Observer, lat: f64, lon: f64) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = lat.to_radians();
    let dlon = (lon - from.lon).to_radians();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_degrees(x.atan2(y).to_degrees())
}

/// Haversine central angle in radians. Only used for ordering, so no earth
/// radius is applied.
pub fn central_angle(from: &Observer, lat: f64, lon: f64) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = lat.to_radians();
    let dphi = (lat - from.lat).to_radians();
    let dlambda = (lon - from.lon).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// The closest airborne report, if any.
pub fn nearest<'a>(from: &Observer, reports: &'a [Report]) -> Option<&'a Report> {
    reports
        .iter()
        .filter(|r| !r.on_ground && r.lat.is_finite() && r.lon.is_finite())
        .min_by(|a, b| {
            central_angle(from, a.lat, a.lon).total_cmp(&central_angle(from, b.lat, b.lon))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONDON: Observer = Observer {
        lat: 51.5074,
        lon: -0.1278,
    };

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn normalize_wraps_both_ways() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-1e-20), 0.0);
    }

    #[test]
    fn cardinal_bearings() {
        let o = Observer { lat: 0.0, lon: 0.0 };
        assert!(close(initial_bearing(&o, 1.0, 0.0), 0.0, 1e-9));
        assert!(close(initial_bearing(&o, 0.0, 1.0), 90.0, 1e-9));
        assert!(close(initial_bearing(&o, -1.0, 0.0), 180.0, 1e-9));
        assert!(close(initial_bearing(&o, 0.0, -1.0), 270.0, 1e-9));
    }

    #[test]
    fn london_to_paris_is_south_east() {
        let b = initial_bearing(&LONDON, 48.8566, 2.3522);
        assert!(close(b, 148.0, 1.0), "bearing {b}");
    }

    #[test]
    fn central_angle_is_zero_at_observer() {
        assert!(close(central_angle(&LONDON, LONDON.lat, LONDON.lon), 0.0, 1e-12));
        // a quarter of a great circle
        let o = Observer { lat: 0.0, lon: 0.0 };
        assert!(close(
            central_angle(&o, 0.0, 90.0),
            std::f64::consts::FRAC_PI_2,
            1e-9
        ));
    }

    #[test]
    fn nearest_skips_grounded() {
        let reports = [
            Report {
                lat: 51.51,
                lon: -0.13,
                track: Some(10.0),
                on_ground: true,
            },
            Report {
                lat: 51.6,
                lon: -0.1,
                track: Some(20.0),
                on_ground: false,
            },
            Report {
                lat: 52.5,
                lon: -0.1,
                track: Some(30.0),
                on_ground: false,
            },
        ];
        let n = nearest(&LONDON, &reports).unwrap();
        assert_eq!(n.track, Some(20.0));
        assert!(nearest(&LONDON, &reports[..1]).is_none());
    }

    #[test]
    fn report_accepts_trak_alias() {
        let r: Report = serde_json::from_str(r#"{"lat":1.0,"lon":2.0,"trak":45.5}"#).unwrap();
        assert_eq!(r.track, Some(45.5));
        assert!(!r.on_ground);
    }
}
