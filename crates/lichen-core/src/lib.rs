pub mod config;
pub mod containment;
pub mod input;
pub mod models;
pub mod output;
pub mod runtime;
pub mod stats;
pub mod store;
pub mod tracing_setup;
pub mod worker;

// Re-export the aggregation surface at crate root for convenience
pub use containment::{
    get_attribution_ids_with_count, get_contained_external_packages,
    get_contained_manual_packages, AttributionIdWithCount, PanelAttributionData,
};
pub use runtime::{CoreHandle, CoreRuntime};
pub use store::AttributionStore;
pub use worker::{AggregationReply, AggregationRequest, CacheUpdate, WorkerCommand};
