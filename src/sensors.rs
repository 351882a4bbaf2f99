//! Synthetic temperature/humidity readings.
//!
//! Every device is simulated as an unbounded random walk: the first reading is drawn from a
//! plausible indoor range, and each following reading nudges the previous one by a small uniform
//! step.  There is no mean reversion, so long runs may drift arbitrarily far.

use std::ops;

use chrono;
use rand;

use model;

use rand::Rng;

const SEED_TEMPERATURE_HUNDREDTHS: ops::Range<i64> = 2000..3000;
const SEED_HUMIDITY_HUNDREDTHS: ops::Range<i64> = 4500..6000;
const TEMPERATURE_STEP: f64 = 1.0;
const HUMIDITY_STEP: f64 = 2.0;

pub struct Simulator<R> {
    rng: R,
}

impl Simulator<rand::rngs::ThreadRng> {
    pub fn new() -> Self {
        Simulator::with_rng(rand::thread_rng())
    }
}

impl<R> Simulator<R>
where
    R: Rng,
{
    pub fn with_rng(rng: R) -> Self {
        Simulator { rng }
    }

    /// Produces the reading that follows `previous`, timestamped now.
    pub fn next(&mut self, previous: Option<&model::Reading>) -> model::Reading {
        let (temperature, humidity) = match previous {
            // Seeds are drawn on the hundredths grid so that rounding can never push them onto
            // the (exclusive) upper end of their range.
            None => (
                self.rng.gen_range(
                    SEED_TEMPERATURE_HUNDREDTHS.start,
                    SEED_TEMPERATURE_HUNDREDTHS.end,
                ) as f64
                    / 100.0,
                self.rng
                    .gen_range(SEED_HUMIDITY_HUNDREDTHS.start, SEED_HUMIDITY_HUNDREDTHS.end)
                    as f64
                    / 100.0,
            ),
            Some(previous) => (
                previous.temperature + self.rng.gen_range(-TEMPERATURE_STEP, TEMPERATURE_STEP),
                previous.humidity + self.rng.gen_range(-HUMIDITY_STEP, HUMIDITY_STEP),
            ),
        };

        model::Reading {
            temperature: round2(temperature),
            humidity: round2(humidity),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Chains `count` readings starting from nothing, oldest first.
    pub fn seed_history(&mut self, count: usize) -> Vec<model::Reading> {
        let mut history: Vec<model::Reading> = Vec::with_capacity(count);
        for _ in 0..count {
            let reading = self.next(history.last());
            history.push(reading);
        }
        history
    }
}

/// Rounds to two decimals, with halves going up (towards positive infinity).
pub fn round2(value: f64) -> f64 {
    ((value + ::std::f64::EPSILON) * 100.0 + 0.5).floor() / 100.0
}
