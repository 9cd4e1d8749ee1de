pub mod attribution;
pub mod resource;

pub use attribution::{AttributionCounts, AttributionId, Attributions, PackageAttribution};
pub use resource::{
    can_have_children, parent_directories, ResourceId, ResourceNode, ResourcesToAttributions,
};
