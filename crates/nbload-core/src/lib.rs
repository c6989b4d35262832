// nbload-core: Row reconciliation between CSV input and the remote directory.

pub mod config;
pub mod directory;
pub mod error;
pub mod memory;
pub mod reconcile;
pub mod report;
pub mod row;
pub mod template;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DirectoryConfig, TlsVerification};
pub use directory::{Directory, Record, connect};
pub use error::CoreError;
pub use memory::{Call, MemoryDirectory, Op};
pub use reconcile::{
    DnsNameSource, Mutation, Outcome, ReconcileError, ReconcileOptions, Reconciler,
    ReferenceKind, RowReport, normalize_address, primary_ip_field,
};
pub use report::{ClassifiedRow, ImportReport, Summary};
pub use row::Row;
pub use template::{TemplateOutcome, TemplateRequest, add_interface_template};

pub use nbload_api::{NetboxClient, Resource};
