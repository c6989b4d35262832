// ── Row reconciliation ──
//
// Decides, for one input row, whether to create, reuse, skip or fail the
// device / interface / IP / asset linkage, and performs the matching
// directory mutations. Steps run strictly in order; the first error
// aborts the row. Mutations already made are not rolled back.

use std::fmt;
use std::net::IpAddr;

use serde_json::{Map, Value, json};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::Resource;
use crate::directory::{Directory, Record};
use crate::error::CoreError;
use crate::row::{Row, field};

/// Prefix appended to addresses given without one.
pub const DEFAULT_PREFIX: &str = "/24";
/// Interface type used when creating the binding interface.
pub const DEFAULT_INTERFACE_TYPE: &str = "1000base-t";
/// `assigned_object_type` for interface-bound IPs.
pub const INTERFACE_OBJECT_TYPE: &str = "dcim.interface";

// ── Options ──────────────────────────────────────────────────────────

/// Where the `dns_name` of a newly created IP comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum DnsNameSource {
    /// The row's `dns_name` column.
    #[default]
    Row,
    /// The device name.
    DeviceName,
}

/// Per-run reconciliation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Interface the IP is bound to (`LAN`, `WAN`, ...).
    pub interface_name: String,
    pub interface_type: String,
    pub dns_name: DnsNameSource,
    /// Link inventory-plugin assets to devices by serial.
    pub link_assets: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            interface_name: "LAN".into(),
            interface_type: DEFAULT_INTERFACE_TYPE.into(),
            dns_name: DnsNameSource::Row,
            link_assets: false,
        }
    }
}

// ── Results ──────────────────────────────────────────────────────────

/// Terminal classification of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped { reason: String },
    Failed { reason: String },
}

/// A remote mutation performed while reconciling a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    DeviceCreated { id: u64 },
    AssetLinked { asset: u64, device: u64 },
    InterfaceCreated { id: u64 },
    IpCreated { id: u64, address: String },
    IpAssigned { id: u64, interface: u64 },
    PrimaryIpSet {
        device: u64,
        field: &'static str,
        ip: u64,
    },
}

/// Outcome plus the mutations made before it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    pub outcome: Outcome,
    pub mutations: Vec<Mutation>,
}

// ── Errors ───────────────────────────────────────────────────────────

/// A required reference a row names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Manufacturer,
    DeviceType,
    Role,
    Site,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Manufacturer => "manufacturer",
            Self::DeviceType => "device_type",
            Self::Role => "role",
            Self::Site => "site",
        })
    }
}

fn join_missing(missing: &[ReferenceKind]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Why a row failed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Missing reference: {}", join_missing(.missing))]
    MissingReference { missing: Vec<ReferenceKind> },

    #[error(transparent)]
    Operation(#[from] CoreError),
}

// ── Address helpers ──────────────────────────────────────────────────

/// Append the default `/24` to a bare address. Empty stays empty.
pub fn normalize_address(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains('/') {
        raw.to_owned()
    } else {
        format!("{raw}{DEFAULT_PREFIX}")
    }
}

/// `primary_ip4` or `primary_ip6`, by the version of an `addr[/len]`.
pub fn primary_ip_field(address: &str) -> Result<&'static str, CoreError> {
    let invalid = || CoreError::ValidationFailed {
        message: format!("'{address}' does not appear to be an IPv4 or IPv6 interface"),
    };

    let (host, prefix) = match address.split_once('/') {
        Some((host, prefix)) => (host, Some(prefix)),
        None => (address, None),
    };
    let ip: IpAddr = host.parse().map_err(|_| invalid())?;
    let max_len = if ip.is_ipv4() { 32 } else { 128 };
    if let Some(prefix) = prefix {
        let len: u8 = prefix.parse().map_err(|_| invalid())?;
        if len > max_len {
            return Err(invalid());
        }
    }

    Ok(if ip.is_ipv4() {
        "primary_ip4"
    } else {
        "primary_ip6"
    })
}

// ── Reconciler ───────────────────────────────────────────────────────

struct References {
    device_type: Record,
    role: Record,
    site: Record,
    tenant: Option<Record>,
}

/// Reconciles rows against a [`Directory`], one at a time.
pub struct Reconciler<'a, D> {
    directory: &'a D,
    options: ReconcileOptions,
}

impl<'a, D: Directory> Reconciler<'a, D> {
    pub fn new(directory: &'a D, options: ReconcileOptions) -> Self {
        Self { directory, options }
    }

    /// Reconcile one row. Never returns an error: failures are classified.
    pub async fn reconcile(&self, row: &Row) -> RowReport {
        let mut mutations = Vec::new();
        let outcome = match self.apply(row, &mut mutations).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(device = %row.name(), error = %e, "row failed");
                Outcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        RowReport { outcome, mutations }
    }

    async fn apply(
        &self,
        row: &Row,
        mutations: &mut Vec<Mutation>,
    ) -> Result<Outcome, ReconcileError> {
        let refs = self.resolve_references(row).await?;
        let address = normalize_address(row.get(field::ADDRESS));

        let device = self.ensure_device(row, &refs, mutations).await?;

        if self.options.link_assets {
            self.link_asset(row, &device, mutations).await;
        }

        if address.is_empty() {
            return Ok(Outcome::Applied);
        }

        let interface = self.ensure_interface(row, &device, mutations).await?;

        let existing = self
            .directory
            .get(Resource::IpAddresses, &[("address", address.clone())])
            .await?;

        match existing {
            None => {
                let dns_name = match self.options.dns_name {
                    DnsNameSource::Row => row.get(field::DNS_NAME),
                    DnsNameSource::DeviceName => row.name(),
                };
                let ip = self
                    .directory
                    .create(
                        Resource::IpAddresses,
                        &json!({
                            "address": address,
                            "description": row.get(field::MAC),
                            "assigned_object_type": INTERFACE_OBJECT_TYPE,
                            "assigned_object_id": interface.id,
                            "dns_name": dns_name,
                            "status": "active",
                        }),
                    )
                    .await?;
                mutations.push(Mutation::IpCreated {
                    id: ip.id,
                    address: address.clone(),
                });
                info!(device = %row.name(), address = %address, "created and assigned IP");

                if ip.assigned_object_id == Some(interface.id) {
                    self.set_primary_ip(row, &device, &ip, &address, mutations)
                        .await?;
                }
            }
            Some(ip) if !ip.is_assigned() => {
                self.directory
                    .update(
                        Resource::IpAddresses,
                        ip.id,
                        &json!({
                            "assigned_object_type": INTERFACE_OBJECT_TYPE,
                            "assigned_object_id": interface.id,
                        }),
                    )
                    .await?;
                mutations.push(Mutation::IpAssigned {
                    id: ip.id,
                    interface: interface.id,
                });
                info!(device = %row.name(), address = %address, "assigned existing IP");

                self.set_primary_ip(row, &device, &ip, &address, mutations)
                    .await?;
            }
            Some(_) => {
                info!(address = %address, "IP already exists and is assigned, skipping binding");
                return Ok(Outcome::Skipped {
                    reason: format!("IP {address} already exists and is assigned"),
                });
            }
        }

        Ok(Outcome::Applied)
    }

    async fn resolve_references(&self, row: &Row) -> Result<References, ReconcileError> {
        let manufacturer = self
            .lookup_required(Resource::Manufacturers, row.get(field::MANUFACTURER))
            .await?;

        // Device types are only unique per manufacturer.
        let device_type = match &manufacturer {
            Some(m) if !row.get(field::DEVICE_TYPE).is_empty() => {
                let found = self
                    .directory
                    .get(
                        Resource::DeviceTypes,
                        &[
                            ("model", row.get(field::DEVICE_TYPE).to_owned()),
                            ("manufacturer_id", m.id.to_string()),
                        ],
                    )
                    .await?;
                if found.is_none() {
                    warn!(
                        model = %row.get(field::DEVICE_TYPE),
                        manufacturer = %m.display,
                        "device type not found"
                    );
                }
                found
            }
            _ => None,
        };

        let role = self
            .lookup_required(Resource::DeviceRoles, row.get(field::ROLE))
            .await?;
        let site = self
            .lookup_required(Resource::Sites, row.get(field::SITE))
            .await?;

        let tenant_name = row.get(field::TENANT);
        let tenant = if tenant_name.is_empty() {
            None
        } else {
            self.directory
                .get(Resource::Tenants, &[("name", tenant_name.to_owned())])
                .await?
        };

        match (manufacturer, device_type, role, site) {
            (Some(_), Some(device_type), Some(role), Some(site)) => Ok(References {
                device_type,
                role,
                site,
                tenant,
            }),
            (manufacturer, device_type, role, site) => {
                let mut missing = Vec::new();
                if manufacturer.is_none() {
                    missing.push(ReferenceKind::Manufacturer);
                } else if device_type.is_none() {
                    missing.push(ReferenceKind::DeviceType);
                }
                if role.is_none() {
                    missing.push(ReferenceKind::Role);
                }
                if site.is_none() {
                    missing.push(ReferenceKind::Site);
                }
                Err(ReconcileError::MissingReference { missing })
            }
        }
    }

    /// Look up a required reference by name. An empty name counts as missing.
    async fn lookup_required(
        &self,
        resource: Resource,
        name: &str,
    ) -> Result<Option<Record>, CoreError> {
        if name.is_empty() {
            warn!("{resource} name is empty");
            return Ok(None);
        }
        let found = self
            .directory
            .get(resource, &[("name", name.to_owned())])
            .await?;
        if found.is_none() {
            warn!(name = %name, "{resource} not found");
        }
        Ok(found)
    }

    async fn ensure_device(
        &self,
        row: &Row,
        refs: &References,
        mutations: &mut Vec<Mutation>,
    ) -> Result<Record, CoreError> {
        // An empty `name=` filter matches every device.
        if row.name().is_empty() {
            warn!("device name is empty");
            return Err(CoreError::ValidationFailed {
                message: "device name is empty".into(),
            });
        }

        if let Some(device) = self
            .directory
            .get(Resource::Devices, &[("name", row.name().to_owned())])
            .await?
        {
            info!(device = %row.name(), "device already exists");
            return Ok(device);
        }

        let device = self
            .directory
            .create(
                Resource::Devices,
                &json!({
                    "name": row.name(),
                    "device_type": refs.device_type.id,
                    "role": refs.role.id,
                    "site": refs.site.id,
                    "status": row.get(field::STATUS),
                    "serial": row.get(field::SERIAL),
                    "comments": row.get(field::COMMENTS),
                    "tenant": refs.tenant.as_ref().map(|t| t.id),
                    "description": row.get(field::MAC),
                }),
            )
            .await?;
        mutations.push(Mutation::DeviceCreated { id: device.id });
        info!(device = %row.name(), id = device.id, "created device");
        Ok(device)
    }

    /// Link the inventory asset with the row's serial to `device`.
    ///
    /// Never fails the row: every problem is logged and the row continues.
    async fn link_asset(&self, row: &Row, device: &Record, mutations: &mut Vec<Mutation>) {
        let serial = row.get(field::SERIAL);
        if serial.is_empty() {
            debug!(device = %row.name(), "no serial, skipping asset link");
            return;
        }

        let asset = match self
            .directory
            .get(Resource::InventoryAssets, &[("serial", serial.to_owned())])
            .await
        {
            Ok(Some(asset)) => asset,
            Ok(None) => {
                warn!(serial = %serial, "asset not found");
                return;
            }
            Err(e) => {
                warn!(device = %row.name(), error = %e, "could not look up asset");
                return;
            }
        };

        if asset.device.is_some() {
            info!(serial = %serial, "asset already assigned, skipping asset assignment");
            return;
        }

        match self
            .directory
            .update(
                Resource::InventoryAssets,
                asset.id,
                &json!({ "device": device.id }),
            )
            .await
        {
            Ok(()) => {
                mutations.push(Mutation::AssetLinked {
                    asset: asset.id,
                    device: device.id,
                });
                info!(serial = %serial, device = %row.name(), "linked asset to device");
            }
            Err(e) => warn!(device = %row.name(), error = %e, "could not link asset"),
        }
    }

    async fn ensure_interface(
        &self,
        row: &Row,
        device: &Record,
        mutations: &mut Vec<Mutation>,
    ) -> Result<Record, CoreError> {
        let name = &self.options.interface_name;
        if let Some(interface) = self
            .directory
            .get(
                Resource::Interfaces,
                &[("device_id", device.id.to_string()), ("name", name.clone())],
            )
            .await?
        {
            return Ok(interface);
        }

        let interface = self
            .directory
            .create(
                Resource::Interfaces,
                &json!({
                    "device": device.id,
                    "name": name,
                    "type": self.options.interface_type,
                }),
            )
            .await?;
        mutations.push(Mutation::InterfaceCreated { id: interface.id });
        info!(device = %row.name(), interface = %name, "created interface");
        Ok(interface)
    }

    async fn set_primary_ip(
        &self,
        row: &Row,
        device: &Record,
        ip: &Record,
        address: &str,
        mutations: &mut Vec<Mutation>,
    ) -> Result<(), CoreError> {
        let field = primary_ip_field(address)?;
        let mut patch = Map::new();
        patch.insert(field.to_owned(), Value::from(ip.id));
        self.directory
            .update(Resource::Devices, device.id, &Value::Object(patch))
            .await?;
        mutations.push(Mutation::PrimaryIpSet {
            device: device.id,
            field,
            ip: ip.id,
        });
        info!(device = %row.name(), address = %address, "set primary IP");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address_gets_default_prefix() {
        assert_eq!(normalize_address("10.0.0.5"), "10.0.0.5/24");
    }

    #[test]
    fn explicit_prefix_is_kept() {
        assert_eq!(normalize_address("10.0.0.5/30"), "10.0.0.5/30");
        assert_eq!(normalize_address("fe80::1/64"), "fe80::1/64");
    }

    #[test]
    fn empty_address_stays_empty() {
        assert_eq!(normalize_address(""), "");
        assert_eq!(normalize_address("   "), "");
    }

    #[test]
    fn primary_field_by_version() {
        assert!(matches!(primary_ip_field("10.1.1.1/24"), Ok("primary_ip4")));
        assert!(matches!(primary_ip_field("fe80::1/64"), Ok("primary_ip6")));
        assert!(matches!(primary_ip_field("192.0.2.7"), Ok("primary_ip4")));
    }

    #[test]
    fn primary_field_rejects_garbage() {
        assert!(primary_ip_field("not-an-ip/24").is_err());
        assert!(primary_ip_field("10.0.0.1/33").is_err());
        assert!(primary_ip_field("10.0.0.1/x").is_err());
    }

    #[test]
    fn missing_reference_message_is_space_joined() {
        let err = ReconcileError::MissingReference {
            missing: vec![ReferenceKind::DeviceType, ReferenceKind::Site],
        };
        assert_eq!(err.to_string(), "Missing reference: device_type site");
    }

    #[test]
    fn dns_name_source_parses_kebab_case() {
        assert_eq!("row".parse::<DnsNameSource>().ok(), Some(DnsNameSource::Row));
        assert_eq!(
            "device-name".parse::<DnsNameSource>().ok(),
            Some(DnsNameSource::DeviceName)
        );
        assert_eq!(DnsNameSource::DeviceName.to_string(), "device-name");
    }
}
