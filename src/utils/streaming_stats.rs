use thiserror::Error;
use tracing::debug;

// Weighted streaming mean / variance. Used to summarize the m/z of a
// chromatogram weighted by intensity without keeping extra arrays around.

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum StreamingAggregatorError {
    #[error("No data has been added to the calculator")]
    NotEnoughData,
}

type Result<T> = std::result::Result<T, StreamingAggregatorError>;

/// Ref impl in javascript ...
/// https://nestedsoftware.com/2018/03/27/calculating-standard-deviation-on-streaming-data-253l.23919.html
/// https://nestedsoftware.com/2019/09/26/incremental-average-and-standard-deviation-with-sliding-window-470k.176143.html
///
/// Points with a weight of zero (or less) are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStatsCalculator {
    weight: f64,
    mean_n: f64,
    d_: f64,
}

impl RunningStatsCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new value to the running stats calculator.
    pub fn add(&mut self, value: f64, weight: f64) {
        if weight <= 0.0 {
            return;
        }
        self.weight += weight;
        let delta = value - self.mean_n;
        let last_mean_n = self.mean_n;
        self.mean_n += delta * (weight / self.weight);
        self.d_ += weight * (value - self.mean_n) * (value - last_mean_n);
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn mean(&self) -> Result<f64> {
        if self.weight == 0.0 {
            return Err(StreamingAggregatorError::NotEnoughData);
        }
        Ok(self.mean_n)
    }

    pub fn variance(&self) -> Result<f64> {
        if self.weight == 0.0 {
            return Err(StreamingAggregatorError::NotEnoughData);
        }
        Ok(self.d_.abs() / self.weight)
    }

    pub fn standard_deviation(&self) -> Result<f64> {
        let variance = self.variance()?;
        if !variance.is_finite() {
            debug!("variance is not finite, state -> {:?}", self);
        };
        Ok(variance.sqrt())
    }
}
