use std::fmt;
use std::time::Duration;

use super::config::TimeUnit;

/// The mean latency of one trial block
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub label : String,
    pub mean : Duration,
    pub unit : TimeUnit,
}

impl Measurement {
    /// `mean` in this measurement's unit
    pub fn value(&self) -> f64 {
        self.mean.as_secs_f64() * self.unit.scale()
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.6} {} per iter", self.label, self.value(), self.unit.suffix())
    }
}
