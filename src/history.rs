use std::fmt;
use std::str;

use chrono;
use itertools;
use rand;

use sensors;

use itertools::Itertools;
use rand::Rng;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Range {
    Day,
    Week,
    Quarter,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub device_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub temperature: f64,
    pub humidity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub temperature: (f64, f64),
    pub humidity: (f64, f64),
}

impl Range {
    pub fn points(&self) -> usize {
        match *self {
            Range::Day => 48,
            Range::Week => 168,
            Range::Quarter => 720,
        }
    }

    pub fn span(&self) -> chrono::Duration {
        match *self {
            Range::Day => chrono::Duration::hours(24),
            Range::Week => chrono::Duration::days(7),
            Range::Quarter => chrono::Duration::days(90),
        }
    }
}

impl str::FromStr for Range {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(Range::Day),
            "7d" => Ok(Range::Week),
            "3m" => Ok(Range::Quarter),
            _ => Err(format!("unknown range {:?}, expected one of 24h, 7d, 3m", s)),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Range::Day => "24h",
            Range::Week => "7d",
            Range::Quarter => "3m",
        })
    }
}

/// Generates a synthetic series for `range`, evenly spaced and ending at `end`.
pub fn generate<R>(
    rng: &mut R,
    device_id: &str,
    range: Range,
    end: chrono::DateTime<chrono::Utc>,
) -> Vec<Point>
where
    R: Rng,
{
    let points = range.points();
    let start = end - range.span();
    let step = range.span() / points as i32;

    let mut temperature: f64 = 20.0 + rng.gen_range(0.0, 8.0);
    let mut humidity: f64 = 45.0 + rng.gen_range(0.0, 10.0);

    (0..points)
        .map(|i| {
            temperature += rng.gen_range(-1.0, 1.0);
            humidity += rng.gen_range(-1.5, 1.5);
            Point {
                device_id: device_id.to_owned(),
                timestamp: start + step * i as i32,
                temperature: sensors::round2(temperature),
                humidity: sensors::round2(humidity),
            }
        })
        .collect()
}

pub fn summarize(points: &[Point]) -> Option<Summary> {
    use itertools::MinMaxResult::*;

    let minmax = |values: itertools::MinMaxResult<f64>| match values {
        NoElements => None,
        OneElement(v) => Some((v, v)),
        MinMax(lo, hi) => Some((lo, hi)),
    };

    // f64 is not Ord, so compare by hundredths which is the precision of every point.
    let temperature = minmax(
        points
            .iter()
            .map(|p| p.temperature)
            .minmax_by_key(|t| (t * 100.0).round() as i64),
    )?;
    let humidity = minmax(
        points
            .iter()
            .map(|p| p.humidity)
            .minmax_by_key(|h| (h * 100.0).round() as i64),
    )?;

    Some(Summary {
        temperature,
        humidity,
    })
}
