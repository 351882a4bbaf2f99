use std::time;

use failure;
use reqwest;
use serde_json;
use slog;

use model;

const FALLBACK_DEVICES: &'static [(&'static str, &'static str)] = &[
    ("dev-1", "Greenhouse Sensor A"),
    ("dev-2", "Warehouse Sensor B"),
    ("dev-3", "Office Sensor C"),
];

/// Fetches the device catalog, substituting the built-in device list on any kind of failure.
///
/// An empty `url` skips the request altogether.
pub fn fetch(log: &slog::Logger, url: &str, timeout: time::Duration) -> Vec<model::Device> {
    if url.is_empty() {
        info!(log, "no catalog url configured, using built-in devices");
        return fallback_devices();
    }

    match fetch_remote(url, timeout) {
        Ok(devices) => {
            info!(log, "fetched device catalog"; "url" => url, "devices" => devices.len());
            devices
        }
        Err(e) => {
            warn!(log, "device catalog unavailable, using built-in devices"; "url" => url, "error" => %e);
            fallback_devices()
        }
    }
}

pub fn fallback_devices() -> Vec<model::Device> {
    FALLBACK_DEVICES
        .iter()
        .map(|&(id, name)| model::Device {
            id: id.to_owned(),
            name: name.to_owned(),
        })
        .collect()
}

fn fetch_remote(url: &str, timeout: time::Duration) -> Result<Vec<model::Device>, failure::Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;
    let body = client.get(url).send()?.error_for_status()?.text()?;
    parse_devices(&body)
}

/// Parses a catalog response body, which must be a JSON array of devices.
pub fn parse_devices(body: &str) -> Result<Vec<model::Device>, failure::Error> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if !value.is_array() {
        return Err(failure::err_msg("catalog response is not an array"));
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod test {
    use super::*;

    fn log() -> slog::Logger {
        slog::Logger::root(slog::Discard, o!())
    }

    #[test]
    fn parses_device_array() {
        let devices = parse_devices(
            r#"[{"createdAt": 1, "name": "Barn", "id": "1"}, {"name": "Loft", "id": 2}]"#,
        )
        .unwrap();
        assert_eq!(
            vec![
                model::Device {
                    id: "1".to_owned(),
                    name: "Barn".to_owned(),
                },
                model::Device {
                    id: "2".to_owned(),
                    name: "Loft".to_owned(),
                },
            ],
            devices
        );
    }

    #[test]
    fn rejects_non_arrays() {
        assert!(parse_devices(r#"{"id": "dev-1", "name": "x"}"#).is_err());
        assert!(parse_devices("Not found").is_err());
        assert!(parse_devices(r#"[{"id": "dev-1"}]"#).is_err());
    }

    #[test]
    fn empty_url_uses_fallback() {
        let devices = fetch(&log(), "", time::Duration::from_millis(10));
        assert_eq!(fallback_devices(), devices);
        assert_eq!(3, devices.len());
        assert_eq!("dev-1", devices[0].id);
        assert_eq!("Office Sensor C", devices[2].name);
    }

    #[test]
    fn unreachable_catalog_uses_fallback() {
        let devices = fetch(
            &log(),
            "http://127.0.0.1:9/deviceList",
            time::Duration::from_millis(500),
        );
        assert_eq!(fallback_devices(), devices);
    }
}
