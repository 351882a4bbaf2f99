use std::fmt;

use model;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,
    Alert,
}

/// A reading alerts when any metric lies strictly outside its bounds; values equal to a bound
/// are fine, and so is having no reading at all.
pub fn is_alert(reading: Option<&model::Reading>, bounds: &model::ThresholdBounds) -> bool {
    match reading {
        None => false,
        Some(r) => {
            r.temperature < bounds.temp_min
                || r.temperature > bounds.temp_max
                || r.humidity < bounds.hum_min
                || r.humidity > bounds.hum_max
        }
    }
}

pub fn status(reading: Option<&model::Reading>, bounds: &model::ThresholdBounds) -> Status {
    if is_alert(reading, bounds) {
        Status::Alert
    } else {
        Status::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Status::Ok => f.write_str("OK"),
            Status::Alert => f.write_str("ALERT"),
        }
    }
}
