use crate::bucket::{bucket_index, BucketError};
use crate::types::{Coordinates, Marker, Observation};
use anyhow::{Context, Result};
use rayon::prelude::*;

/// Buckets an occurrence count partitions into.
pub const MARKER_RADIUS_BUCKETS: i64 = 10;
/// Buckets the zoom level partitions into when deriving the increment.
pub const RADIUS_INCREMENT_BUCKETS: i64 = 10;

const ZOOM_MIN: f64 = 1.0;
const ZOOM_MAX: f64 = 10.0;

/// Derives the radius increment from the map's zoom level.
///
/// The increment is not a free parameter: it is the same bucketing function
/// applied to a different domain. The zoom level is bounded to [1, 10] and
/// sorted into ten buckets with a base offset of 1, and the result is added
/// to every marker's radius bucket. Deeper zoom, larger markers.
pub fn radius_increment(zoom_level: u8) -> Result<i64, BucketError> {
    let zoom = (zoom_level as f64).clamp(ZOOM_MIN, ZOOM_MAX);
    bucket_index(zoom, RADIUS_INCREMENT_BUCKETS, ZOOM_MIN, ZOOM_MAX, 1)
}

/// Radius scale for one dataset at one zoom level.
///
/// Holds the observed min/max occurrence counts and the zoom-derived
/// increment. An empty dataset has no range; it short-circuits to the
/// default radius instead of handing infinite bounds to the bucketizer.
#[derive(Debug, Clone)]
pub struct MarkerScale {
    range: Option<(f64, f64)>,
    increment: i64,
    default_radius: i64,
}

impl MarkerScale {
    pub fn from_observations(
        observations: &[Observation],
        zoom_level: u8,
        default_radius: i64,
    ) -> Result<Self, BucketError> {
        let increment = radius_increment(zoom_level)?;

        let mut range = None;
        for obs in observations {
            let count = obs.occurrences as f64;
            range = match range {
                None => Some((count, count)),
                Some((min, max)) => Some((f64::min(min, count), f64::max(max, count))),
            };
        }

        Ok(MarkerScale {
            range,
            increment,
            default_radius,
        })
    }

    /// Marker radius for one occurrence count.
    pub fn radius_for(&self, occurrences: u64) -> Result<i64, BucketError> {
        match self.range {
            Some((min, max)) => bucket_index(
                occurrences as f64,
                MARKER_RADIUS_BUCKETS,
                min,
                max,
                self.increment,
            ),
            None => Ok(self.default_radius),
        }
    }
}

/// Turns a dataset into sized markers for the given zoom level.
pub fn scale_markers(
    observations: &[Observation],
    zoom_level: u8,
    default_radius: i64,
) -> Result<Vec<Marker>> {
    let scale = MarkerScale::from_observations(observations, zoom_level, default_radius)?;

    observations
        .par_iter()
        .map(|obs| {
            let coords: Coordinates = obs
                .location
                .parse()
                .with_context(|| format!("Observation at {:?}", obs.location))?;
            let radius = scale.radius_for(obs.occurrences)?;
            Ok(Marker {
                location: obs.location.clone(),
                latitude: coords.latitude,
                longitude: coords.longitude,
                occurrences: obs.occurrences,
                radius,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(location: &str, occurrences: u64) -> Observation {
        Observation {
            location: location.to_string(),
            occurrences,
        }
    }

    #[test]
    fn increment_tracks_zoom_level() {
        // zoom 1 is the bottom of the range, bucket 0 plus the base offset.
        assert_eq!(radius_increment(1).unwrap(), 1);
        // zoom 10 is the top of the range.
        assert_eq!(radius_increment(10).unwrap(), 11);
        // out-of-range zooms are clamped, not extrapolated.
        assert_eq!(radius_increment(0).unwrap(), 1);
        assert_eq!(radius_increment(19).unwrap(), 11);
    }

    #[test]
    fn increment_is_monotonic_in_zoom() {
        let mut prev = i64::MIN;
        for zoom in 1..=10 {
            let inc = radius_increment(zoom).unwrap();
            assert!(inc >= prev);
            prev = inc;
        }
    }

    #[test]
    fn scales_counts_across_the_observed_range() {
        let observations = vec![
            obs("0.0,0.0", 0),
            obs("1.0,1.0", 5),
            obs("2.0,2.0", 10),
        ];
        let markers = scale_markers(&observations, 1, 5).unwrap();

        // increment at zoom 1 is 1; range is [0, 10] over ten buckets.
        assert_eq!(markers[0].radius, 1);
        assert_eq!(markers[1].radius, 6);
        assert_eq!(markers[2].radius, 11);
    }

    #[test]
    fn max_count_never_exceeds_top_bucket() {
        let observations = vec![obs("0.0,0.0", 3), obs("1.0,1.0", 900)];
        let markers = scale_markers(&observations, 10, 5).unwrap();
        let increment = radius_increment(10).unwrap();
        for marker in &markers {
            assert!(marker.radius <= MARKER_RADIUS_BUCKETS + increment);
            assert!(marker.radius >= increment);
        }
    }

    #[test]
    fn radii_are_monotonic_in_occurrences() {
        let observations: Vec<Observation> = (0..20)
            .map(|i| obs(&format!("{i}.0,0.0"), i * 7))
            .collect();
        let markers = scale_markers(&observations, 4, 5).unwrap();
        for pair in markers.windows(2) {
            assert!(pair[0].radius <= pair[1].radius);
        }
    }

    #[test]
    fn single_observation_takes_top_bucket() {
        // min == max collapses the range; the lone count is at the maximum.
        let observations = vec![obs("53.35,-6.26", 42)];
        let markers = scale_markers(&observations, 1, 5).unwrap();
        assert_eq!(markers[0].radius, MARKER_RADIUS_BUCKETS + 1);
    }

    #[test]
    fn empty_dataset_yields_no_markers() {
        let markers = scale_markers(&[], 5, 5).unwrap();
        assert!(markers.is_empty());
    }

    #[test]
    fn empty_scale_falls_back_to_default_radius() {
        let scale = MarkerScale::from_observations(&[], 5, 7).unwrap();
        assert_eq!(scale.radius_for(123).unwrap(), 7);
    }

    #[test]
    fn malformed_location_is_an_error() {
        let observations = vec![obs("not-coordinates", 3)];
        assert!(scale_markers(&observations, 1, 5).is_err());
    }
}
