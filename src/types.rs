use geo::{MultiPolygon, Point};
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

/// One data point to visualize: a "lat,long" location key and how many
/// times something was observed there. Order across observations is
/// irrelevant.
#[derive(Debug, Clone)]
pub struct Observation {
    pub location: String,
    pub occurrences: u64,
}

/// A parsed "lat,long" pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error, PartialEq)]
#[error("malformed coordinates {input:?}: expected \"lat,long\"")]
pub struct ParseCoordinatesError {
    pub input: String,
}

impl FromStr for Coordinates {
    type Err = ParseCoordinatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCoordinatesError {
            input: s.to_string(),
        };
        let (lat, lon) = s.split_once(',').ok_or_else(err)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| err())?;
        let longitude: f64 = lon.trim().parse().map_err(|_| err())?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(err());
        }
        Ok(Coordinates {
            latitude,
            longitude,
        })
    }
}

impl From<Coordinates> for Point<f64> {
    fn from(c: Coordinates) -> Self {
        Point::new(c.longitude, c.latitude)
    }
}

/// A sized circle marker ready for a rendering layer. The radius is a
/// bucket index, a visual scaling hint with no identity of its own.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub occurrences: u64,
    pub radius: i64,
}

/// One named polygon from the overlay document.
#[derive(Debug, Clone)]
pub struct Region {
    pub id: String,
    pub geometry: MultiPolygon<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_long_pair() {
        let c: Coordinates = "53.35,-6.26".parse().unwrap();
        assert_eq!(c.latitude, 53.35);
        assert_eq!(c.longitude, -6.26);
    }

    #[test]
    fn tolerates_whitespace_around_components() {
        let c: Coordinates = " 48.8566 , 2.3522 ".parse().unwrap();
        assert_eq!(c.latitude, 48.8566);
        assert_eq!(c.longitude, 2.3522);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("".parse::<Coordinates>().is_err());
        assert!("53.35".parse::<Coordinates>().is_err());
        assert!("abc,def".parse::<Coordinates>().is_err());
        assert!("NaN,0".parse::<Coordinates>().is_err());
    }

    #[test]
    fn converts_to_lon_lat_point() {
        let c: Coordinates = "10.0,20.0".parse().unwrap();
        let p: Point<f64> = c.into();
        assert_eq!(p.x(), 20.0);
        assert_eq!(p.y(), 10.0);
    }
}
