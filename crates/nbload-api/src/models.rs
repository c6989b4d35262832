// Wire types shared by every collection.
//
// The importer only ever needs a handful of attributes from a remote
// object, so a single permissive `Object` covers all collections. Unknown
// fields are ignored; absent ones default to `None`.

use serde::Deserialize;

/// Paged list envelope: `{ count, next, previous, results }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// A reference to another object: either a bare id or a nested brief
/// representation such as `{ "id": 3, "url": "...", "name": "sw1" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ObjectRef {
    Id(u64),
    Nested { id: u64 },
}

impl ObjectRef {
    pub fn id(self) -> u64 {
        match self {
            Self::Id(id) | Self::Nested { id } => id,
        }
    }
}

/// Any remote object, reduced to the attributes the importer reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Object {
    pub id: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Device types carry `model` instead of `name`.
    #[serde(default)]
    pub model: Option<String>,
    /// IP addresses carry `address` instead of `name`.
    #[serde(default)]
    pub address: Option<String>,
    /// Owning device (interfaces) or linked device (inventory assets).
    #[serde(default)]
    pub device: Option<ObjectRef>,
    #[serde(default)]
    pub assigned_object_type: Option<String>,
    #[serde(default)]
    pub assigned_object_id: Option<u64>,
}

impl Object {
    /// Best human-readable label for this object.
    pub fn label(&self) -> String {
        self.display
            .as_ref()
            .or(self.name.as_ref())
            .or(self.model.as_ref())
            .or(self.address.as_ref())
            .cloned()
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}
