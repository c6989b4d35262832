// A single input row: ordered, trimmed, string-keyed fields.

use indexmap::IndexMap;

/// Well-known column names.
pub mod field {
    pub const NAME: &str = "name";
    pub const MANUFACTURER: &str = "manufacturer";
    pub const DEVICE_TYPE: &str = "device_type";
    pub const ROLE: &str = "role";
    pub const SITE: &str = "site";
    pub const TENANT: &str = "tenant";
    pub const STATUS: &str = "status";
    pub const SERIAL: &str = "serial";
    pub const COMMENTS: &str = "comments";
    pub const MAC: &str = "mac";
    pub const ADDRESS: &str = "address";
    pub const DNS_NAME: &str = "dns_name";
}

/// One input record. Keys and values are trimmed on the way in; absent
/// columns read as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: IndexMap<String, String>,
}

impl Row {
    /// Build a row from `(column, value)` pairs, trimming both sides.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_owned(), v.as_ref().trim().to_owned()))
            .collect();
        Self { fields }
    }

    /// Set a field, trimming the value.
    pub fn set(&mut self, key: &str, value: &str) {
        self.fields.insert(key.trim().to_owned(), value.trim().to_owned());
    }

    /// Field value, or `""` when the column is absent.
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map_or("", String::as_str)
    }

    /// The device name column.
    pub fn name(&self) -> &str {
        self.get(field::NAME)
    }

    /// Values in the order of `headers`, empty for missing columns.
    pub fn values_for<'a>(&'a self, headers: &'a [String]) -> impl Iterator<Item = &'a str> {
        headers.iter().map(|h| self.get(h))
    }
}
