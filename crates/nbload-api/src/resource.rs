// Resource collections exposed by the REST API.
//
// Each variant maps to one collection path under `/api/`. Paths always
// end with a slash; the server redirects (and drops the body) otherwise.

use std::fmt;

/// A named REST resource collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Manufacturers,
    DeviceTypes,
    DeviceRoles,
    Sites,
    Tenants,
    Devices,
    Interfaces,
    IpAddresses,
    InterfaceTemplates,
    /// Inventory plugin assets (`netbox-inventory`).
    InventoryAssets,
}

impl Resource {
    /// Every collection, in dependency order.
    pub const ALL: [Resource; 10] = [
        Resource::Manufacturers,
        Resource::DeviceTypes,
        Resource::DeviceRoles,
        Resource::Sites,
        Resource::Tenants,
        Resource::Devices,
        Resource::Interfaces,
        Resource::IpAddresses,
        Resource::InterfaceTemplates,
        Resource::InventoryAssets,
    ];

    /// Collection path relative to the API root.
    pub fn path(self) -> &'static str {
        match self {
            Self::Manufacturers => "dcim/manufacturers/",
            Self::DeviceTypes => "dcim/device-types/",
            Self::DeviceRoles => "dcim/device-roles/",
            Self::Sites => "dcim/sites/",
            Self::Tenants => "tenancy/tenants/",
            Self::Devices => "dcim/devices/",
            Self::Interfaces => "dcim/interfaces/",
            Self::IpAddresses => "ipam/ip-addresses/",
            Self::InterfaceTemplates => "dcim/interface-templates/",
            Self::InventoryAssets => "plugins/inventory/assets/",
        }
    }

    /// Short singular name used in logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Manufacturers => "manufacturer",
            Self::DeviceTypes => "device type",
            Self::DeviceRoles => "device role",
            Self::Sites => "site",
            Self::Tenants => "tenant",
            Self::Devices => "device",
            Self::Interfaces => "interface",
            Self::IpAddresses => "IP address",
            Self::InterfaceTemplates => "interface template",
            Self::InventoryAssets => "inventory asset",
        }
    }

    /// Path of a single object in this collection.
    pub fn object_path(self, id: u64) -> String {
        format!("{}{id}/", self.path())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_slash_terminated() {
        for resource in Resource::ALL {
            assert!(resource.path().ends_with('/'), "{resource:?}");
            assert!(!resource.path().starts_with('/'), "{resource:?}");
        }
    }

    #[test]
    fn object_path_appends_id() {
        assert_eq!(Resource::Devices.object_path(42), "dcim/devices/42/");
        assert_eq!(
            Resource::InventoryAssets.object_path(7),
            "plugins/inventory/assets/7/"
        );
    }
}
