//! `fleetkit_enrich` v1:
//! Server-side merge/enrich pipeline for vehicle inventories.
//!
//! Module layout:
//! - `conf`      : API defaults and response keys
//! - `spec`      : statuses, options, token and errors
//! - `api`       : fleet/label API seam and its HTTP client
//! - `mock`      : in-memory API used by tests and dry runs
//! - `color`     : per-pass label color resolver
//! - `enrich`    : orchestrator (load -> fetch -> merge -> color -> sort)
//! - `transport` : "send bytes, receive a tagged result" seam
pub mod api;
pub mod color;
pub mod conf;
pub mod enrich;
pub mod mock;
pub mod spec;
pub mod transport;

pub use api::{FleetApi, HttpFleetApi};
pub use color::{ColorResolver, derive_primary_label_id};
pub use enrich::{enrich, enrich_table};
pub use mock::MockFleetApi;
pub use spec::{
    EnrichError, EnumResponseStatus, FleetApiError, SpecBearerToken, SpecEnrichOptions,
    SpecEnrichReport, SpecEnrichResponse, SpecFleetApiOptions,
};
pub use transport::{LocalTransport, Transport};
