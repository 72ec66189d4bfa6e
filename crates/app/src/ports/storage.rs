//! Storage port — registry traits for devices and rules.

use std::future::Future;
use std::sync::Arc;

use statehub_domain::Timestamp;
use statehub_domain::device::Device;
use statehub_domain::error::HubError;
use statehub_domain::id::{DeviceId, RuleId};
use statehub_domain::rule::Rule;

/// Registry of known devices.
pub trait DeviceRepository: Send + Sync {
    /// Persist a new device.
    ///
    /// Fails with [`HubError::Conflict`] if the id is already registered.
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send;

    /// Get a device by its identifier.
    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HubError>> + Send;

    /// List every device, ordered by id.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, HubError>> + Send;

    /// Replace a stored device.
    ///
    /// Fails with [`HubError::NotFound`] if it does not exist.
    fn update(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send;

    /// Overwrite `last_state` / `last_updated` of an existing device.
    fn update_state(
        &self,
        id: &DeviceId,
        state: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Remove a device.
    ///
    /// Fails with [`HubError::NotFound`] if it does not exist.
    fn delete(&self, id: &DeviceId) -> impl Future<Output = Result<(), HubError>> + Send;
}

/// Registry of automation rules.
pub trait RuleRepository: Send + Sync {
    /// Persist a new rule.
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, HubError>> + Send;

    /// Get a rule by its identifier.
    fn get_by_id(&self, id: RuleId)
    -> impl Future<Output = Result<Option<Rule>, HubError>> + Send;

    /// List every rule in insertion order.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, HubError>> + Send;

    /// Remove a rule.
    ///
    /// Fails with [`HubError::NotFound`] if it does not exist.
    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: RuleRepository> RuleRepository for Arc<T> {
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, HubError>> + Send {
        (**self).create(rule)
    }

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<Rule>, HubError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, HubError>> + Send {
        (**self).get_all()
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).delete(id)
    }
}

impl<T: DeviceRepository> DeviceRepository for Arc<T> {
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send {
        (**self).create(device)
    }

    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HubError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, HubError>> + Send {
        (**self).get_all()
    }

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send {
        (**self).update(device)
    }

    fn update_state(
        &self,
        id: &DeviceId,
        state: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).update_state(id, state, at)
    }

    fn delete(&self, id: &DeviceId) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).delete(id)
    }
}
