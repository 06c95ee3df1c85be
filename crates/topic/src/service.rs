//! Request/response services resolved by ID.
//!
//! A [`Service`] wraps a borrowed handler and an enabled flag. Callers look
//! services up through a [`ServiceManager`] instead of holding handler
//! references themselves.

use thiserror_no_std::Error;

use crate::registry::{Identified, Registry, RegistryError};

/// Process-unique service ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceId(pub u16);

/// Service failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceError {
    /// No service with this ID is registered.
    #[error("service {0:?} not found")]
    NotFound(ServiceId),
    /// The service exists but is disabled.
    #[error("service {0:?} is disabled")]
    NotEnabled(ServiceId),
    /// The underlying registry rejected the operation.
    #[error("service registry: {0}")]
    Registry(RegistryError),
}

impl From<RegistryError> for ServiceError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

/// A named request handler.
pub struct Service<'a, Req, Resp> {
    id: ServiceId,
    enabled: bool,
    handler: &'a dyn Fn(&Req) -> Resp,
}

impl<'a, Req, Resp> Service<'a, Req, Resp> {
    /// Enabled service `id` answering through `handler`.
    pub fn new(id: ServiceId, handler: &'a dyn Fn(&Req) -> Resp) -> Self {
        Self {
            id,
            enabled: true,
            handler,
        }
    }

    /// Handle `request`.
    pub fn call(&self, request: &Req) -> Result<Resp, ServiceError> {
        if !self.enabled {
            return Err(ServiceError::NotEnabled(self.id));
        }
        Ok((self.handler)(request))
    }

    /// `true` unless disabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the service.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl<Req, Resp> Identified for Service<'_, Req, Resp> {
    type Id = ServiceId;

    fn id(&self) -> ServiceId {
        self.id
    }
}

/// Registry of up to `N` services sharing one request/response type.
pub struct ServiceManager<'a, Req, Resp, const N: usize = 8> {
    services: Registry<Service<'a, Req, Resp>, N>,
}

impl<'a, Req, Resp, const N: usize> ServiceManager<'a, Req, Resp, N> {
    /// Empty manager.
    pub const fn new() -> Self {
        Self {
            services: Registry::new(),
        }
    }

    /// Register `service`.
    pub fn add(&mut self, service: Service<'a, Req, Resp>) -> Result<(), ServiceError> {
        let id = service.id;
        self.services.add(service)?;
        debug!("service {} registered", id.0);
        Ok(())
    }

    /// Deregister the service with `id`.
    pub fn remove(&mut self, id: ServiceId) -> Result<Service<'a, Req, Resp>, ServiceError> {
        let service = self
            .services
            .remove(id)
            .map_err(|_| ServiceError::NotFound(id))?;
        debug!("service {} removed", id.0);
        Ok(service)
    }

    /// Service with `id`.
    pub fn find(&self, id: ServiceId) -> Result<&Service<'a, Req, Resp>, ServiceError> {
        self.services.find(id).map_err(|_| ServiceError::NotFound(id))
    }

    /// Call the service with `id`.
    pub fn call(&self, id: ServiceId, request: &Req) -> Result<Resp, ServiceError> {
        self.find(id)?.call(request)
    }

    /// Enable or disable the service with `id`.
    pub fn set_enabled(&mut self, id: ServiceId, enabled: bool) -> Result<(), ServiceError> {
        self.services
            .find_mut(id)
            .map_err(|_| ServiceError::NotFound(id))?
            .set_enabled(enabled);
        Ok(())
    }

    /// Number of services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// `true` when no service is registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl<Req, Resp, const N: usize> Default for ServiceManager<'_, Req, Resp, N> {
    fn default() -> Self {
        Self::new()
    }
}
