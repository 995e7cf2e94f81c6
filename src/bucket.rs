use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BucketError {
    #[error("invalid argument: bucket count must be positive, got {0}")]
    NonPositiveBucketCount(i64),
    #[error("invalid argument: bucket inputs must be finite (value={value}, min={min}, max={max})")]
    NonFiniteInput { value: f64, min: f64, max: f64 },
}

/// Sorts `value` into one of `bucket_count` equal-width buckets over
/// `[min_value, max_value]` and offsets the result by `increment`.
///
/// The minimum of the range maps to bucket 0 and anything at or above
/// `max_value` maps to the top bucket (`bucket_count`), so in-range values
/// always land in `[increment, bucket_count + increment]`. When
/// `min_value == max_value` the bucket width is zero, but every in-range
/// value then equals the maximum and takes the top-bucket branch, so the
/// division is never reached. Values outside the range are not rejected;
/// they extrapolate to out-of-range buckets and callers own that hygiene.
pub fn bucket_index(
    value: f64,
    bucket_count: i64,
    min_value: f64,
    max_value: f64,
    increment: i64,
) -> Result<i64, BucketError> {
    if bucket_count <= 0 {
        return Err(BucketError::NonPositiveBucketCount(bucket_count));
    }
    if !value.is_finite() || !min_value.is_finite() || !max_value.is_finite() {
        return Err(BucketError::NonFiniteInput {
            value,
            min: min_value,
            max: max_value,
        });
    }

    let bucket = if value < max_value {
        let bucket_size = (max_value - min_value) / bucket_count as f64;
        ((value - min_value) / bucket_size).ceil() as i64
    } else {
        bucket_count
    };

    Ok(bucket + increment)
}
