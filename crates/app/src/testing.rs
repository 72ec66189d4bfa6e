//! In-memory port implementations shared by the unit tests.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use statehub_domain::Timestamp;
use statehub_domain::device::Device;
use statehub_domain::error::{ConflictError, HubError, NotFoundError};
use statehub_domain::event::Event;
use statehub_domain::id::{DeviceId, RuleId};
use statehub_domain::rule::Rule;

use crate::ports::{DeviceController, DeviceRepository, EventStore, RuleRepository, Transport};

#[derive(Default)]
pub struct InMemoryDeviceRepo {
    store: Mutex<BTreeMap<DeviceId, Device>>,
    failing: AtomicBool,
}

impl InMemoryDeviceRepo {
    pub fn with(devices: impl IntoIterator<Item = &'static str>) -> Self {
        let repo = Self::default();
        for id in devices {
            let device = Device::builder().device_id(id).build().unwrap();
            repo.store
                .lock()
                .unwrap()
                .insert(device.device_id.clone(), device);
        }
        repo
    }

    pub fn fail_reads(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn snapshot(&self, id: &str) -> Option<Device> {
        let id = DeviceId::new(id).ok()?;
        self.store.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.store.lock().unwrap().len()
    }
}

impl DeviceRepository for InMemoryDeviceRepo {
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = if store.contains_key(&device.device_id) {
            Err(ConflictError {
                entity: "Device",
                id: device.device_id.to_string(),
            }
            .into())
        } else {
            store.insert(device.device_id.clone(), device.clone());
            Ok(device)
        };
        async { result }
    }

    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HubError>> + Send {
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(HubError::Storage("disk on fire".into()))
        } else {
            Ok(self.store.lock().unwrap().get(id).cloned())
        };
        async { result }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, HubError>> + Send {
        let result = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = match store.get_mut(&device.device_id) {
            Some(slot) => {
                *slot = device.clone();
                Ok(device)
            }
            None => Err(not_found("Device", &device.device_id)),
        };
        async { result }
    }

    fn update_state(
        &self,
        id: &DeviceId,
        state: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = match store.get_mut(id) {
            Some(device) => {
                device.record_state(state, at);
                Ok(())
            }
            None => Err(not_found("Device", id)),
        };
        async { result }
    }

    fn delete(&self, id: &DeviceId) -> impl Future<Output = Result<(), HubError>> + Send {
        let result = match self.store.lock().unwrap().remove(id) {
            Some(_) => Ok(()),
            None => Err(not_found("Device", id)),
        };
        async { result }
    }
}

#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<Event>>,
}

impl InMemoryEventStore {
    pub fn all(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&self, event: Event) -> impl Future<Output = Result<Event, HubError>> + Send {
        self.events.lock().unwrap().push(event.clone());
        async { Ok(event) }
    }

    fn get_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, HubError>> + Send {
        let result = self
            .events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn find_by_device(
        &self,
        device_id: &DeviceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, HubError>> + Send {
        let result = self
            .events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| &e.device_id == device_id)
            .take(limit)
            .cloned()
            .collect();
        async { Ok(result) }
    }
}

#[derive(Default)]
pub struct InMemoryRuleRepo {
    rules: Mutex<Vec<Rule>>,
}

impl InMemoryRuleRepo {
    pub fn replace_all(&self, rules: Vec<Rule>) {
        *self.rules.lock().unwrap() = rules;
    }
}

impl RuleRepository for InMemoryRuleRepo {
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, HubError>> + Send {
        self.rules.lock().unwrap().push(rule.clone());
        async { Ok(rule) }
    }

    fn get_by_id(&self, id: RuleId) -> impl Future<Output = Result<Option<Rule>, HubError>> + Send {
        let result = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, HubError>> + Send {
        let result = self.rules.lock().unwrap().clone();
        async { Ok(result) }
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), HubError>> + Send {
        let mut rules = self.rules.lock().unwrap();
        let before = rules.len();
        rules.retain(|r| r.id != id);
        let result = if rules.len() == before {
            Err(not_found("Rule", id))
        } else {
            Ok(())
        };
        async { result }
    }
}

/// Records every publish and subscription.
#[derive(Default)]
pub struct RecordingTransport {
    published: Mutex<Vec<(String, String)>>,
    subscriptions: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn fail_publishes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn publish(&self, topic: &str, payload: &str, _retain: bool) -> Result<(), HubError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HubError::Transport("request queue full".into()));
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    fn subscribe(&self, pattern: &str) -> Result<(), HubError> {
        self.subscriptions.lock().unwrap().push(pattern.to_string());
        Ok(())
    }
}

/// Records controller calls as `send:<device>:<payload>` / `status:<device>`.
#[derive(Default)]
pub struct RecordingController {
    calls: Mutex<Vec<String>>,
    refuse: Mutex<Option<DeviceId>>,
}

impl RecordingController {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn refuse(&self, device_id: &str) {
        *self.refuse.lock().unwrap() = Some(DeviceId::new(device_id).unwrap());
    }

    fn check(&self, device_id: &DeviceId) -> Result<(), HubError> {
        if self.refuse.lock().unwrap().as_ref() == Some(device_id) {
            return Err(HubError::Transport("refused".into()));
        }
        Ok(())
    }
}

impl DeviceController for RecordingController {
    fn send_command(&self, device_id: &DeviceId, payload: &str) -> Result<(), HubError> {
        self.check(device_id)?;
        self.calls
            .lock()
            .unwrap()
            .push(format!("send:{device_id}:{payload}"));
        Ok(())
    }

    fn request_status(&self, device_id: &DeviceId) -> Result<(), HubError> {
        self.check(device_id)?;
        self.calls.lock().unwrap().push(format!("status:{device_id}"));
        Ok(())
    }
}

pub fn rule(name: &str, condition: &str, action: &str) -> Rule {
    Rule::builder()
        .name(name)
        .condition(condition)
        .action(action)
        .build_unchecked()
}

fn not_found(entity: &'static str, id: impl ToString) -> HubError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}
