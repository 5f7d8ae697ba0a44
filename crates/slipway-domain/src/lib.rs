#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod fingerprint;
pub mod plan;
pub mod schema;

pub use fingerprint::FingerprintBuilder;
pub use plan::{
    classify_schema_state, plan_assets, plan_migration, AssetDecision, MigrationAction,
    MigrationPlan, SchemaState,
};
pub use schema::parse_schema_version;
