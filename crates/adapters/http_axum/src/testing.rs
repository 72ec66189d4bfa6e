//! In-memory ports for driving the router in tests.

use std::sync::{Arc, Mutex};

use statehub_app::ports::{DeviceController, DeviceRepository, EventStore, RuleRepository};
use statehub_app::rule_engine::RuleEngine;
use statehub_app::services::device_service::DeviceService;
use statehub_app::services::event_service::EventService;
use statehub_app::services::rule_service::RuleService;
use statehub_domain::Timestamp;
use statehub_domain::device::Device;
use statehub_domain::error::{ConflictError, HubError, NotFoundError};
use statehub_domain::event::Event;
use statehub_domain::id::{DeviceId, RuleId};
use statehub_domain::rule::Rule;

use crate::state::AppState;

fn missing(entity: &'static str, id: impl ToString) -> HubError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}

#[derive(Default)]
pub struct MemDevices(Mutex<Vec<Device>>);

impl DeviceRepository for MemDevices {
    async fn create(&self, device: Device) -> Result<Device, HubError> {
        let mut devices = self.0.lock().unwrap();
        if devices.iter().any(|d| d.device_id == device.device_id) {
            return Err(ConflictError {
                entity: "Device",
                id: device.device_id.to_string(),
            }
            .into());
        }
        devices.push(device.clone());
        Ok(device)
    }

    async fn get_by_id(&self, id: &DeviceId) -> Result<Option<Device>, HubError> {
        Ok(self.0.lock().unwrap().iter().find(|d| &d.device_id == id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Device>, HubError> {
        Ok(self.0.lock().unwrap().clone())
    }

    async fn update(&self, device: Device) -> Result<Device, HubError> {
        let mut devices = self.0.lock().unwrap();
        let slot = devices
            .iter_mut()
            .find(|d| d.device_id == device.device_id)
            .ok_or_else(|| missing("Device", &device.device_id))?;
        *slot = device.clone();
        Ok(device)
    }

    async fn update_state(
        &self,
        id: &DeviceId,
        state: &str,
        at: Timestamp,
    ) -> Result<(), HubError> {
        let mut devices = self.0.lock().unwrap();
        let device = devices
            .iter_mut()
            .find(|d| &d.device_id == id)
            .ok_or_else(|| missing("Device", id))?;
        device.record_state(state, at);
        Ok(())
    }

    async fn delete(&self, id: &DeviceId) -> Result<(), HubError> {
        let mut devices = self.0.lock().unwrap();
        let before = devices.len();
        devices.retain(|d| &d.device_id != id);
        if devices.len() == before {
            return Err(missing("Device", id));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemEvents(pub Mutex<Vec<Event>>);

impl EventStore for MemEvents {
    async fn append(&self, event: Event) -> Result<Event, HubError> {
        self.0.lock().unwrap().push(event.clone());
        Ok(event)
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<Event>, HubError> {
        Ok(self.0.lock().unwrap().iter().rev().take(limit).cloned().collect())
    }

    async fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: usize,
    ) -> Result<Vec<Event>, HubError> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| &e.device_id == device_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemRules(Mutex<Vec<Rule>>);

impl RuleRepository for MemRules {
    async fn create(&self, rule: Rule) -> Result<Rule, HubError> {
        self.0.lock().unwrap().push(rule.clone());
        Ok(rule)
    }

    async fn get_by_id(&self, id: RuleId) -> Result<Option<Rule>, HubError> {
        Ok(self.0.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Rule>, HubError> {
        Ok(self.0.lock().unwrap().clone())
    }

    async fn delete(&self, id: RuleId) -> Result<(), HubError> {
        let mut rules = self.0.lock().unwrap();
        let before = rules.len();
        rules.retain(|r| r.id != id);
        if rules.len() == before {
            return Err(missing("Rule", id));
        }
        Ok(())
    }
}

/// Records `send:<device>:<payload>` and `status:<device>` calls.
#[derive(Default)]
pub struct SpyController(pub Mutex<Vec<String>>);

impl DeviceController for SpyController {
    fn send_command(&self, device_id: &DeviceId, payload: &str) -> Result<(), HubError> {
        self.0.lock().unwrap().push(format!("send:{device_id}:{payload}"));
        Ok(())
    }

    fn request_status(&self, device_id: &DeviceId) -> Result<(), HubError> {
        self.0.lock().unwrap().push(format!("status:{device_id}"));
        Ok(())
    }
}

pub type TestState = AppState<Arc<MemDevices>, Arc<MemEvents>, Arc<MemRules>>;

pub struct Harness {
    pub state: TestState,
    pub devices: Arc<MemDevices>,
    pub events: Arc<MemEvents>,
    pub controller: Arc<SpyController>,
}

pub fn harness() -> Harness {
    let devices = Arc::new(MemDevices::default());
    let events = Arc::new(MemEvents::default());
    let rules = Arc::new(MemRules::default());
    let controller = Arc::new(SpyController::default());
    let engine = Arc::new(RuleEngine::new(Arc::clone(&rules), controller.clone()));

    let state = AppState::from_arcs(
        Arc::new(DeviceService::new(Arc::clone(&devices))),
        Arc::new(EventService::new(Arc::clone(&events))),
        Arc::new(RuleService::new(rules, engine)),
        controller.clone(),
    );
    Harness {
        state,
        devices,
        events,
        controller,
    }
}
