//! # statehub-adapter-simulators
//!
//! Simulated devices that speak the statehub topic protocol, for local
//! testing and demonstration.
//!
//! ## Provided devices
//!
//! | Device | Reports | Reacts to |
//! |--------|---------|-----------|
//! | [`TemperatureSensor`] | random reading in `[min, max]` every period | `GET_STATE` |
//! | [`Switch`] | `ON` / `OFF` after each change | `ON` / `OFF` / `TOGGLE` on `set`, `GET_STATE` |
//! | [`Clock`] | `HH:MM:SS`, advancing every period | `GET_STATE` |
//!
//! ## Dependency rule
//!
//! Depends on `statehub-app` (port traits) and `statehub-domain` only. The
//! caller supplies the [`Transport`] and feeds inbound messages through the
//! [`MessageHandler`] implementation.

mod devices;
mod error;

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use statehub_app::ports::{MessageHandler, Transport};
use statehub_domain::error::HubError;
use statehub_domain::topic::BaseTopic;

pub use devices::{Clock, Simulator, Switch, TemperatureSensor};
pub use error::SimulatorError;

const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

/// A set of simulators sharing one transport connection.
pub struct Fleet<T> {
    base: BaseTopic,
    simulators: Mutex<Vec<Simulator>>,
    transport: T,
    period: Duration,
}

impl<T: Transport> Fleet<T> {
    /// Subscribe to every simulator's inbound topics and announce initial
    /// states.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if a subscribe or publish cannot be
    /// queued.
    pub fn start(
        base: BaseTopic,
        simulators: Vec<Simulator>,
        period: Duration,
        transport: T,
    ) -> Result<Self, HubError> {
        for sim in &simulators {
            let id = sim.device_id();
            transport.subscribe(&base.command_topic(id))?;
            transport.subscribe(&base.status_request_topic(id))?;
            if let Some(initial) = sim.initial_report() {
                transport.publish(&base.status_topic(id), &initial, true)?;
            }
        }
        tracing::info!(count = simulators.len(), base = %base, "simulators online");

        Ok(Self {
            base,
            simulators: Mutex::new(simulators),
            transport,
            period: if period.is_zero() {
                DEFAULT_PERIOD
            } else {
                period
            },
        })
    }

    /// Emit periodic reports forever.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            self.tick();
        }
    }

    fn tick(&self) {
        let reports: Vec<(String, String)> = {
            let mut rng = rand::thread_rng();
            let mut simulators = self.lock();
            simulators
                .iter_mut()
                .filter_map(|sim| {
                    let report = sim.tick(&mut rng)?;
                    Some((self.base.status_topic(sim.device_id()), report))
                })
                .collect()
        };
        for (topic, payload) in reports {
            self.report(&topic, &payload);
        }
    }

    fn respond(&self, topic: &str, payload: &str) {
        let reply = {
            let mut rng = rand::thread_rng();
            let mut simulators = self.lock();
            simulators.iter_mut().find_map(|sim| {
                let id = sim.device_id().clone();
                if topic == self.base.command_topic(&id) {
                    let reply = sim.on_command(payload);
                    if reply.is_none() {
                        tracing::warn!(device_id = %id, %payload, "command ignored");
                    }
                    Some((self.base.status_topic(&id), reply))
                } else if topic == self.base.status_request_topic(&id) {
                    Some((
                        self.base.status_topic(&id),
                        sim.on_status_request(payload, &mut rng),
                    ))
                } else {
                    None
                }
            })
        };
        if let Some((status_topic, Some(state))) = reply {
            self.report(&status_topic, &state);
        }
    }

    fn report(&self, topic: &str, payload: &str) {
        match self.transport.publish(topic, payload, false) {
            Ok(()) => tracing::debug!(%topic, %payload, "simulator report"),
            Err(err) => tracing::error!(%topic, error = %err, "simulator report failed"),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Simulator>> {
        self.simulators
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> MessageHandler for Fleet<T> {
    async fn handle_message(&self, topic: &str, payload: &str) {
        self.respond(topic, payload);
    }
}
