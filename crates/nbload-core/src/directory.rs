// ── Directory abstraction ──
//
// Capability-level access to the remote resource collections: look one
// object up by filter, create one, patch one. The reconciler only talks
// to this trait; `NetboxClient` is the production implementation and
// `MemoryDirectory` the offline one.

use std::future::Future;

use nbload_api::{NetboxClient, Object, Resource, TlsMode, TransportConfig};
use serde_json::Value;

use crate::config::{DirectoryConfig, TlsVerification};
use crate::error::CoreError;

/// A remote object, reduced to the attributes reconciliation reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: u64,
    /// Human-readable label (name, model, or address).
    pub display: String,
    /// Owning device (interfaces) or linked device (inventory assets).
    pub device: Option<u64>,
    pub assigned_object_type: Option<String>,
    pub assigned_object_id: Option<u64>,
}

impl Record {
    /// Whether an IP address is bound to some object.
    pub fn is_assigned(&self) -> bool {
        self.assigned_object_id.is_some()
    }
}

impl From<Object> for Record {
    fn from(obj: Object) -> Self {
        Self {
            id: obj.id,
            display: obj.label(),
            device: obj.device.map(nbload_api::ObjectRef::id),
            assigned_object_type: obj.assigned_object_type,
            assigned_object_id: obj.assigned_object_id,
        }
    }
}

/// Get / create / update against named resource collections.
pub trait Directory {
    /// The single object matching `filter`, if any.
    fn get(
        &self,
        resource: Resource,
        filter: &[(&str, String)],
    ) -> impl Future<Output = Result<Option<Record>, CoreError>> + Send;

    /// Create an object and return it.
    fn create(
        &self,
        resource: Resource,
        fields: &Value,
    ) -> impl Future<Output = Result<Record, CoreError>> + Send;

    /// Patch fields on the object `id`.
    fn update(
        &self,
        resource: Resource,
        id: u64,
        fields: &Value,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl Directory for NetboxClient {
    async fn get(
        &self,
        resource: Resource,
        filter: &[(&str, String)],
    ) -> Result<Option<Record>, CoreError> {
        let found = NetboxClient::get(self, resource, filter).await?;
        Ok(found.map(Record::from))
    }

    async fn create(&self, resource: Resource, fields: &Value) -> Result<Record, CoreError> {
        let created = NetboxClient::create(self, resource, fields).await?;
        Ok(Record::from(created))
    }

    async fn update(&self, resource: Resource, id: u64, fields: &Value) -> Result<(), CoreError> {
        NetboxClient::update(self, resource, id, fields).await?;
        Ok(())
    }
}

/// Build a REST-backed directory from a runtime config.
pub fn connect(config: &DirectoryConfig) -> Result<NetboxClient, CoreError> {
    let tls = match &config.tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    };
    let transport = TransportConfig {
        tls,
        timeout: config.timeout,
    };
    Ok(NetboxClient::from_token(
        config.url.as_str(),
        &config.token,
        &transport,
    )?)
}
