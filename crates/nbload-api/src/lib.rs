// nbload-api: Async Rust client for NetBox-style DCIM/IPAM REST APIs

pub mod client;
pub mod error;
pub mod models;
pub mod resource;
pub mod transport;

pub use client::NetboxClient;
pub use error::Error;
pub use models::{Object, ObjectRef, Page};
pub use resource::Resource;
pub use transport::{TlsMode, TransportConfig};
