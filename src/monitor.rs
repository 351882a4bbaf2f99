use std::time;

use failure;
use rand;
use slog;
use tokio;

use alert;
use model;
use registry;
use storage;
use thresholds;
use util;

use tokio::prelude::*;

/// The live monitor: periodically advances every device and checks it against its thresholds.
pub struct Monitor<R, S> {
    log: slog::Logger,
    registry: registry::Registry<R>,
    thresholds: thresholds::ThresholdStore<S>,
}

pub struct DeviceStatus<'a> {
    pub session: &'a registry::DeviceSession,
    pub bounds: &'a model::ThresholdBounds,
    pub status: alert::Status,
}

impl<R, S> Monitor<R, S>
where
    R: rand::Rng,
    S: storage::Storage,
{
    pub fn new(
        log: slog::Logger,
        registry: registry::Registry<R>,
        thresholds: thresholds::ThresholdStore<S>,
    ) -> Self {
        Monitor {
            log,
            registry,
            thresholds,
        }
    }

    pub fn registry(&self) -> &registry::Registry<R> {
        &self.registry
    }

    pub fn thresholds(&self) -> &thresholds::ThresholdStore<S> {
        &self.thresholds
    }

    /// Evaluates the latest reading of every device against its effective bounds.
    pub fn evaluate(&self) -> Vec<DeviceStatus> {
        self.registry
            .sessions()
            .iter()
            .map(|session| {
                let bounds = self.thresholds.resolve(&session.device.id);
                DeviceStatus {
                    session,
                    bounds,
                    status: alert::status(session.latest_reading.as_ref(), bounds),
                }
            })
            .collect()
    }

    /// Runs one tick and returns how many devices are alerting afterwards.
    pub fn tick(&mut self) -> usize {
        self.registry.tick();

        let statuses = self.evaluate();
        let mut alerts = 0;
        for s in &statuses {
            let device = &s.session.device;
            if let Some(ref reading) = s.session.latest_reading {
                debug!(self.log, "reading";
                       "device" => &device.id,
                       "enabled" => s.session.enabled,
                       "temperature" => reading.temperature,
                       "humidity" => reading.humidity,
                       "status" => %s.status);
                if s.status == alert::Status::Alert {
                    alerts += 1;
                    warn!(self.log, "device out of bounds";
                          "device" => &device.id,
                          "name" => &device.name,
                          "enabled" => s.session.enabled,
                          "temperature" => reading.temperature,
                          "humidity" => reading.humidity,
                          "bounds" => %s.bounds);
                }
            }
        }
        info!(self.log, "tick"; "devices" => statuses.len(), "alerts" => alerts);

        alerts
    }

    /// Ticks every `period` until `ticks` ticks have run, or forever without a limit.
    ///
    /// Ticks run on a single thread, so one tick always completes before the next starts.
    pub fn run(&mut self, period: time::Duration, ticks: Option<u64>) -> Result<(), failure::Error> {
        info!(self.log, "starting monitor";
              "devices" => self.registry.sessions().len(),
              "period_ms" => util::duration_ms(period));

        let timer = util::every(self.log.clone(), "monitor".to_owned(), period);
        let timer: Box<dyn Stream<Item = (), Error = failure::Error>> = match ticks {
            Some(n) => Box::new(timer.take(n)),
            None => Box::new(timer),
        };

        let job = timer.for_each(|()| {
            self.tick();
            Ok::<(), failure::Error>(())
        });
        tokio::runtime::current_thread::block_on_all(job)?;

        info!(self.log, "monitor stopped");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use rand::SeedableRng;

    fn log() -> slog::Logger {
        slog::Logger::root(slog::Discard, o!())
    }

    fn monitor(
        storage: &storage::MemoryStorage,
    ) -> Monitor<rand::rngs::StdRng, &storage::MemoryStorage> {
        let rng = rand::rngs::StdRng::from_seed([9; 32]);
        let mut registry = registry::Registry::new(::sensors::Simulator::with_rng(rng));
        registry.initialize(vec![
            model::Device {
                id: "dev-1".to_owned(),
                name: "Greenhouse Sensor A".to_owned(),
            },
            model::Device {
                id: "dev-2".to_owned(),
                name: "Warehouse Sensor B".to_owned(),
            },
        ]);

        let mut thresholds = thresholds::ThresholdStore::load(log(), storage);
        thresholds
            .set_per_device(
                "dev-1",
                model::ThresholdBounds {
                    temp_min: -1000.0,
                    temp_max: -999.0,
                    hum_min: 0.0,
                    hum_max: 100.0,
                },
            )
            .unwrap();

        Monitor::new(log(), registry, thresholds)
    }

    #[test]
    fn evaluates_with_resolved_bounds() {
        let storage = storage::MemoryStorage::new();
        let monitor = monitor(&storage);

        let statuses = monitor.evaluate();
        assert_eq!(2, statuses.len());
        assert_eq!(alert::Status::Alert, statuses[0].status);
        assert_eq!(-999.0, statuses[0].bounds.temp_max);
        assert_eq!(alert::Status::Ok, statuses[1].status);
        assert_eq!(&model::ThresholdBounds::default(), statuses[1].bounds);
    }

    #[test]
    fn tick_counts_alerts() {
        let storage = storage::MemoryStorage::new();
        let mut monitor = monitor(&storage);

        for _ in 0..3 {
            assert_eq!(1, monitor.tick());
        }
        let session = monitor.registry().get("dev-2").unwrap();
        assert_eq!(registry::SEED_HISTORY_LEN + 3, session.history.len());
    }

    #[test]
    fn run_stops_after_limit() {
        let storage = storage::MemoryStorage::new();
        let mut monitor = monitor(&storage);

        monitor.run(time::Duration::from_millis(2), Some(4)).unwrap();

        for session in monitor.registry().sessions() {
            assert_eq!(registry::SEED_HISTORY_LEN + 4, session.history.len());
        }
        assert!(monitor.thresholds().is_overridden("dev-1"));
    }
}
