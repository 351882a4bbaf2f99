use std::collections;
use std::fmt;

use chrono;
use serde;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(deserialize_with = "deserialize_device_id")]
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdBounds {
    pub temp_min: f64,
    pub temp_max: f64,
    pub hum_min: f64,
    pub hum_max: f64,
}

/// Alert bounds for every device, with sparse per-device overrides.
///
/// An override replaces the global bounds as a whole; fields are never merged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdConfig {
    pub global: ThresholdBounds,
    #[serde(default)]
    pub per_device: collections::BTreeMap<String, ThresholdBounds>,
}

#[derive(Debug, Fail, PartialEq)]
pub enum ThresholdError {
    #[fail(display = "Temperature Min must be less than Max! ({} >= {})", min, max)]
    TemperatureRange { min: f64, max: f64 },
    #[fail(display = "Humidity Min must be less than Max! ({} >= {})", min, max)]
    HumidityRange { min: f64, max: f64 },
}

impl ThresholdBounds {
    pub fn validate(&self) -> Result<(), ThresholdError> {
        // Negated comparisons so that NaN bounds are rejected too.
        if !(self.temp_min < self.temp_max) {
            return Err(ThresholdError::TemperatureRange {
                min: self.temp_min,
                max: self.temp_max,
            });
        }
        if !(self.hum_min < self.hum_max) {
            return Err(ThresholdError::HumidityRange {
                min: self.hum_min,
                max: self.hum_max,
            });
        }
        Ok(())
    }
}

impl Default for ThresholdBounds {
    fn default() -> Self {
        ThresholdBounds {
            temp_min: 0.0,
            temp_max: 50.0,
            hum_min: 0.0,
            hum_max: 100.0,
        }
    }
}

impl fmt::Display for ThresholdBounds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "temp {}..{} °C, hum {}..{} %",
            self.temp_min, self.temp_max, self.hum_min, self.hum_max
        )
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig {
            global: ThresholdBounds::default(),
            per_device: collections::BTreeMap::new(),
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), ThresholdError> {
        self.global.validate()?;
        for bounds in self.per_device.values() {
            bounds.validate()?;
        }
        Ok(())
    }
}

fn deserialize_device_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    match <RawId as serde::Deserialize>::deserialize(deserializer)? {
        RawId::Text(id) => {
            if id.is_empty() {
                Err(serde::de::Error::invalid_value(
                    serde::de::Unexpected::Str(&id),
                    &"a non-empty device id",
                ))
            } else {
                Ok(id)
            }
        }
        RawId::Number(id) => Ok(id.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use serde_json;

    #[test]
    fn default_config() {
        let config = ThresholdConfig::default();
        assert_eq!(
            config.global,
            ThresholdBounds {
                temp_min: 0.0,
                temp_max: 50.0,
                hum_min: 0.0,
                hum_max: 100.0,
            }
        );
        assert!(config.per_device.is_empty());
    }

    #[test]
    fn bounds_validation() {
        assert_eq!(Ok(()), ThresholdBounds::default().validate());

        let inverted = ThresholdBounds {
            temp_min: 10.0,
            temp_max: 5.0,
            ..ThresholdBounds::default()
        };
        assert_eq!(
            Err(ThresholdError::TemperatureRange {
                min: 10.0,
                max: 5.0
            }),
            inverted.validate()
        );

        let equal = ThresholdBounds {
            hum_min: 40.0,
            hum_max: 40.0,
            ..ThresholdBounds::default()
        };
        assert_eq!(
            Err(ThresholdError::HumidityRange {
                min: 40.0,
                max: 40.0
            }),
            equal.validate()
        );
    }

    #[test]
    fn config_wire_format() {
        let raw = r#"{
            "global": {"tempMin": 0, "tempMax": 50, "humMin": 0, "humMax": 100},
            "perDevice": {"dev-2": {"tempMin": 5, "tempMax": 25, "humMin": 30, "humMax": 70}}
        }"#;
        let config: ThresholdConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(ThresholdBounds::default(), config.global);
        assert_eq!(25.0, config.per_device["dev-2"].temp_max);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["perDevice"]["dev-2"]["humMin"], 30.0);
    }

    #[test]
    fn device_ids_may_be_numeric() {
        let devices: Vec<Device> =
            serde_json::from_str(r#"[{"id": 7, "name": "Attic"}, {"id": "dev-9", "name": "Cellar", "createdAt": 1}]"#)
                .unwrap();
        assert_eq!("7", devices[0].id);
        assert_eq!("dev-9", devices[1].id);
        assert!(serde_json::from_str::<Device>(r#"{"id": "", "name": "x"}"#).is_err());
    }
}
