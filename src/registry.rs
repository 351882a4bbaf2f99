use std::collections;

use rand;

use model;
use sensors;

/// Maximum number of readings kept per device.
pub const HISTORY_CAPACITY: usize = 100;
/// Number of readings a freshly created session starts out with.
pub const SEED_HISTORY_LEN: usize = 20;

#[derive(Clone, Debug)]
pub struct DeviceSession {
    pub device: model::Device,
    pub enabled: bool,
    pub latest_reading: Option<model::Reading>,
    pub history: collections::VecDeque<model::Reading>,
}

/// Live state for every device of the catalog, advanced one tick at a time.
///
/// Ticks advance every session, including disabled ones: `enabled` only controls presentation.
pub struct Registry<R> {
    simulator: sensors::Simulator<R>,
    sessions: Vec<DeviceSession>,
}

impl<R> Registry<R>
where
    R: rand::Rng,
{
    pub fn new(simulator: sensors::Simulator<R>) -> Self {
        Registry {
            simulator,
            sessions: Vec::new(),
        }
    }

    /// Replaces all sessions with fresh ones, each seeded with a short history.
    pub fn initialize<I>(&mut self, devices: I)
    where
        I: IntoIterator<Item = model::Device>,
    {
        let simulator = &mut self.simulator;
        self.sessions = devices
            .into_iter()
            .map(|device| {
                let history = simulator.seed_history(SEED_HISTORY_LEN);
                DeviceSession {
                    device,
                    enabled: true,
                    latest_reading: history.last().cloned(),
                    history: history.into_iter().collect(),
                }
            })
            .collect();
    }

    pub fn tick(&mut self) {
        let simulator = &mut self.simulator;
        for session in &mut self.sessions {
            let reading = simulator.next(session.latest_reading.as_ref());
            session.history.push_back(reading.clone());
            while session.history.len() > HISTORY_CAPACITY {
                session.history.pop_front();
            }
            session.latest_reading = Some(reading);
        }
    }

    /// Flips the `enabled` flag of a device, returning the new value.
    pub fn toggle(&mut self, device_id: &str) -> Option<bool> {
        self.sessions
            .iter_mut()
            .find(|s| s.device.id == device_id)
            .map(|session| {
                session.enabled = !session.enabled;
                session.enabled
            })
    }

    /// Sets the `enabled` flag of a device regardless of its current value.
    pub fn set_enabled(&mut self, device_id: &str, enabled: bool) -> Option<()> {
        self.sessions
            .iter_mut()
            .find(|s| s.device.id == device_id)
            .map(|session| session.enabled = enabled)
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceSession> {
        self.sessions.iter().find(|s| s.device.id == device_id)
    }

    pub fn sessions(&self) -> &[DeviceSession] {
        &self.sessions
    }
}
