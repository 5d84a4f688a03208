//! Seeded generators for synthetic log fixtures.
//!
//! The centerpiece is the correlated dataset ([dataset]): a table mapping
//! client addresses to datacenters, and a web log in which the latency of
//! one endpoint depends on the client's datacenter. [access] and [syslog]
//! produce uncorrelated logs in other shapes.

pub mod access;
pub mod dataset;
pub mod err;
pub mod format;
pub mod output;
pub mod pool;
pub mod record;
pub mod rng;
pub mod synth;
pub mod syslog;
pub mod window;

pub use dataset::{generate, CorrelatedConfig, CorrelatedDataset};
pub use err::{Error, Result};
pub use format::{Dialect, LineParser};
pub use output::Target;
pub use pool::{Datacenter, IdentifierPool};
pub use record::LogRecord;
