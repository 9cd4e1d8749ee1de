pub mod attribution_store;

pub use attribution_store::{AttributionData, AttributionStore};
