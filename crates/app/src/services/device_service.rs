//! Device service — registry use-cases for devices.

use statehub_domain::Timestamp;
use statehub_domain::device::{Device, DeviceType};
use statehub_domain::error::{ConflictError, HubError, NotFoundError};
use statehub_domain::id::DeviceId;

use crate::ports::DeviceRepository;

/// Last state a device reported, as seen by the registry.
///
/// Status requests are not correlated with their answers, so this is how
/// callers observe the effect of one: request, then poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub device_id: DeviceId,
    pub last_state: Option<String>,
    pub last_updated: Option<Timestamp>,
}

/// Application service for device registration and lookup.
pub struct DeviceService<R> {
    repo: R,
}

impl<R: DeviceRepository> DeviceService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Register a device. It has no state until it first reports.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] for an invalid id,
    /// [`HubError::Conflict`] if the id is already registered, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn add_device(
        &self,
        device_id: &str,
        device_type: DeviceType,
    ) -> Result<Device, HubError> {
        let device = Device::builder()
            .device_id(device_id)
            .device_type(device_type)
            .build()?;
        if self.repo.get_by_id(&device.device_id).await?.is_some() {
            return Err(ConflictError {
                entity: "Device",
                id: device.device_id.to_string(),
            }
            .into());
        }
        let device = self.repo.create(device).await?;
        tracing::info!(
            device_id = %device.device_id,
            device_type = %device.device_type,
            "device registered"
        );
        Ok(device)
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when no device with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self), fields(device_id = %id))]
    pub async fn get_device(&self, id: &DeviceId) -> Result<Device, HubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_devices(&self) -> Result<Vec<Device>, HubError> {
        self.repo.get_all().await
    }

    /// Change the type tag of a registered device.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] if the device does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self), fields(device_id = %id))]
    pub async fn edit_device_type(
        &self,
        id: &DeviceId,
        device_type: DeviceType,
    ) -> Result<Device, HubError> {
        let mut device = self.get_device(id).await?;
        device.device_type = device_type;
        self.repo.update(device).await
    }

    /// Remove a device. Its events stay in the log.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] if the device does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self), fields(device_id = %id))]
    pub async fn delete_device(&self, id: &DeviceId) -> Result<(), HubError> {
        self.repo.delete(id).await?;
        tracing::info!(device_id = %id, "device removed");
        Ok(())
    }

    /// Last known state of a device.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] if the device does not exist, or a
    /// storage error from the repository.
    pub async fn get_state(&self, id: &DeviceId) -> Result<DeviceState, HubError> {
        let device = self.get_device(id).await?;
        Ok(DeviceState {
            device_id: device.device_id,
            last_state: device.last_state,
            last_updated: device.last_updated,
        })
    }
}
