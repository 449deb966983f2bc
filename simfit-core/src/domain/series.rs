//! Time series: strictly increasing epoch-second timestamps paired with values.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing a time series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("timestamp count {times} does not match value count {values}")]
    LengthMismatch { times: usize, values: usize },

    #[error("timestamps must be strictly increasing (index {index}: {previous} then {current})")]
    NonIncreasing {
        index: usize,
        previous: i64,
        current: i64,
    },
}

/// A single (timestamp, value) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: i64,
    pub value: f64,
}

/// Ordered time series with epoch-second timestamps.
///
/// Timestamps are strictly increasing. Values may be NaN; observed series use
/// NaN (or a fill value) to mark missing samples, see [`TimeSeries::strip_missing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesParts")]
pub struct TimeSeries {
    times: Vec<i64>,
    values: Vec<f64>,
}

/// Unvalidated wire form; deserialization goes through [`TimeSeries::new`].
#[derive(Deserialize)]
struct SeriesParts {
    times: Vec<i64>,
    values: Vec<f64>,
}

impl TryFrom<SeriesParts> for TimeSeries {
    type Error = SeriesError;

    fn try_from(parts: SeriesParts) -> Result<Self, Self::Error> {
        Self::new(parts.times, parts.values)
    }
}

/// How missing observations are encoded in an observed series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingSentinel {
    /// Fill value used by the data provider in addition to NaN (e.g. `-1e31`).
    pub fill_value: Option<f64>,
}

impl MissingSentinel {
    pub fn is_missing(&self, value: f64) -> bool {
        if value.is_nan() {
            return true;
        }
        match self.fill_value {
            Some(fill) => value == fill,
            None => false,
        }
    }
}

/// Count of observed samples dropped because the value was missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingObservations {
    pub dropped: usize,
    pub dropped_times: Vec<i64>,
}

impl TimeSeries {
    pub fn new(times: Vec<i64>, values: Vec<f64>) -> Result<Self, SeriesError> {
        if times.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        for (i, pair) in times.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(SeriesError::NonIncreasing {
                    index: i + 1,
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }
        Ok(Self { times, values })
    }

    /// Build a series from calendar datetimes.
    ///
    /// Sub-second precision is truncated before conversion; naive datetimes
    /// are taken as UTC.
    pub fn from_datetimes(
        datetimes: &[NaiveDateTime],
        values: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        let times = datetimes
            .iter()
            .map(|dt| {
                dt.with_nanosecond(0)
                    .unwrap_or(*dt)
                    .and_utc()
                    .timestamp()
            })
            .collect();
        Self::new(times, values)
    }

    pub fn from_samples(samples: &[Sample]) -> Result<Self, SeriesError> {
        let times = samples.iter().map(|s| s.time).collect();
        let values = samples.iter().map(|s| s.value).collect();
        Self::new(times, values)
    }

    pub fn times(&self) -> &[i64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// First and last timestamp, or `None` for an empty series.
    pub fn span(&self) -> Option<(i64, i64)> {
        Some((*self.times.first()?, *self.times.last()?))
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.times
            .iter()
            .zip(&self.values)
            .map(|(&time, &value)| Sample { time, value })
    }

    /// Remove missing samples, returning the filtered series and what was dropped.
    pub fn strip_missing(&self, sentinel: MissingSentinel) -> (TimeSeries, MissingObservations) {
        let mut times = Vec::with_capacity(self.len());
        let mut values = Vec::with_capacity(self.len());
        let mut missing = MissingObservations::default();

        for sample in self.samples() {
            if sentinel.is_missing(sample.value) {
                missing.dropped += 1;
                missing.dropped_times.push(sample.time);
            } else {
                times.push(sample.time);
                values.push(sample.value);
            }
        }

        // Filtering preserves strict ordering, so no re-validation is needed.
        (TimeSeries { times, values }, missing)
    }
}
