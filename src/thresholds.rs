use failure;
use serde_json;
use slog;

use model;
use storage;

/// Alert thresholds backed by durable storage.
///
/// Every successful mutation is written through to storage before it becomes visible; a rejected
/// or failed mutation leaves both the in-memory and the stored config untouched.
pub struct ThresholdStore<S> {
    log: slog::Logger,
    storage: S,
    config: model::ThresholdConfig,
}

impl<S> ThresholdStore<S>
where
    S: storage::Storage,
{
    /// Loads the stored config, falling back to defaults when it is missing or unusable.
    pub fn load(log: slog::Logger, storage: S) -> Self {
        let config = match storage.read(storage::THRESHOLDS_KEY) {
            Ok(Some(raw)) => match parse_config(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!(log, "ignoring malformed threshold config"; "error" => %e);
                    model::ThresholdConfig::default()
                }
            },
            Ok(None) => {
                debug!(log, "no stored threshold config, using defaults");
                model::ThresholdConfig::default()
            }
            Err(e) => {
                warn!(log, "could not read threshold config"; "error" => %e);
                model::ThresholdConfig::default()
            }
        };

        ThresholdStore {
            log,
            storage,
            config,
        }
    }

    pub fn config(&self) -> &model::ThresholdConfig {
        &self.config
    }

    pub fn update_global(&mut self, bounds: model::ThresholdBounds) -> Result<(), failure::Error> {
        bounds.validate()?;
        let mut config = self.config.clone();
        config.global = bounds;
        self.commit(config)?;
        info!(self.log, "updated global thresholds"; "bounds" => %bounds);
        Ok(())
    }

    pub fn set_per_device(
        &mut self,
        device_id: &str,
        bounds: model::ThresholdBounds,
    ) -> Result<(), failure::Error> {
        bounds.validate()?;
        let mut config = self.config.clone();
        config.per_device.insert(device_id.to_owned(), bounds);
        self.commit(config)?;
        info!(self.log, "updated device thresholds"; "device" => device_id, "bounds" => %bounds);
        Ok(())
    }

    /// The effective bounds for a device: its override if it has one, the global bounds otherwise.
    pub fn resolve(&self, device_id: &str) -> &model::ThresholdBounds {
        self.config
            .per_device
            .get(device_id)
            .unwrap_or(&self.config.global)
    }

    pub fn is_overridden(&self, device_id: &str) -> bool {
        self.config.per_device.contains_key(device_id)
    }

    fn commit(&mut self, config: model::ThresholdConfig) -> Result<(), failure::Error> {
        write_config(&self.storage, &config)?;
        self.config = config;
        Ok(())
    }
}

fn parse_config(raw: &str) -> Result<model::ThresholdConfig, failure::Error> {
    let config: model::ThresholdConfig = serde_json::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

fn write_config<S>(storage: &S, config: &model::ThresholdConfig) -> Result<(), failure::Error>
where
    S: storage::Storage,
{
    let raw = serde_json::to_string(config)?;
    storage.write(storage::THRESHOLDS_KEY, &raw)
}
