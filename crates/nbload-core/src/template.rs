// ── Interface templates ──
//
// Adds a single interface template to a device type, the form-script
// companion to the bulk importer. Dry-run by default.

use std::fmt;

use serde_json::json;
use tracing::info;

use crate::Resource;
use crate::directory::{Directory, Record};
use crate::error::CoreError;

/// What to add, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRequest {
    /// Device type model.
    pub device_type: String,
    /// Narrows the device type lookup when models collide across vendors.
    pub manufacturer: Option<String>,
    pub name: String,
    /// Interface type slug, e.g. `1000base-t`.
    pub kind: String,
    pub enabled: bool,
}

/// Result of [`add_interface_template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOutcome {
    AlreadyExists { name: String, device_type: String },
    Added {
        id: u64,
        name: String,
        device_type: String,
    },
    WouldAdd { name: String, device_type: String },
}

impl fmt::Display for TemplateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists { name, device_type } => {
                write!(f, "Interface '{name}' already exists on {device_type}")
            }
            Self::Added {
                name, device_type, ..
            } => write!(f, "Added interface '{name}' to {device_type}"),
            Self::WouldAdd { name, device_type } => {
                write!(f, "(Dry run) Would add interface '{name}' to {device_type}")
            }
        }
    }
}

async fn resolve_device_type<D: Directory>(
    directory: &D,
    request: &TemplateRequest,
) -> Result<Record, CoreError> {
    let mut filter = vec![("model", request.device_type.clone())];

    if let Some(ref manufacturer) = request.manufacturer {
        let found = directory
            .get(Resource::Manufacturers, &[("name", manufacturer.clone())])
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity_type: Resource::Manufacturers.label().into(),
                identifier: manufacturer.clone(),
            })?;
        filter.push(("manufacturer_id", found.id.to_string()));
    }

    directory
        .get(Resource::DeviceTypes, &filter)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity_type: Resource::DeviceTypes.label().into(),
            identifier: request.device_type.clone(),
        })
}

/// Add one interface template to a device type.
///
/// With `commit == false` nothing is written and `WouldAdd` is returned.
pub async fn add_interface_template<D: Directory>(
    directory: &D,
    request: &TemplateRequest,
    commit: bool,
) -> Result<TemplateOutcome, CoreError> {
    if request.name.trim().is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "interface name cannot be empty".into(),
        });
    }

    let device_type = resolve_device_type(directory, request).await?;

    let existing = directory
        .get(
            Resource::InterfaceTemplates,
            &[
                ("device_type_id", device_type.id.to_string()),
                ("name", request.name.clone()),
            ],
        )
        .await?;
    if existing.is_some() {
        return Ok(TemplateOutcome::AlreadyExists {
            name: request.name.clone(),
            device_type: device_type.display,
        });
    }

    if !commit {
        return Ok(TemplateOutcome::WouldAdd {
            name: request.name.clone(),
            device_type: device_type.display,
        });
    }

    let created = directory
        .create(
            Resource::InterfaceTemplates,
            &json!({
                "device_type": device_type.id,
                "name": request.name,
                "type": request.kind,
                "enabled": request.enabled,
            }),
        )
        .await?;
    info!(
        device_type = %device_type.display,
        interface = %request.name,
        "added interface template"
    );

    Ok(TemplateOutcome::Added {
        id: created.id,
        name: request.name.clone(),
        device_type: device_type.display,
    })
}
