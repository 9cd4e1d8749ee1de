use std::collections::HashSet;

use crate::containment::{
    add_to_attributed_children_index, attributed_children_index, PanelAttributionData,
    ResourcesWithAttributedChildren,
};
use crate::input::InputFile;
use crate::models::{
    AttributionCounts, AttributionId, Attributions, PackageAttribution, ResourceId,
    ResourcesToAttributions,
};
use crate::output::OutputFile;

/// One attribution dataset with its derived index. The store holds two of
/// these: `external` (tool-detected) and `manual` (user-authored).
#[derive(Debug, Clone, Default)]
pub struct AttributionData {
    pub attributions: Attributions,
    pub resources_to_attributions: ResourcesToAttributions,
    pub resources_with_attributed_children: ResourcesWithAttributedChildren,
}

impl AttributionData {
    fn from_tables(
        attributions: Attributions,
        resources_to_attributions: ResourcesToAttributions,
    ) -> Self {
        let resources_with_attributed_children =
            attributed_children_index(&resources_to_attributions);
        Self {
            attributions,
            resources_to_attributions,
            resources_with_attributed_children,
        }
    }

    /// Snapshot for the aggregation functions and the worker cache. The
    /// worker owns its copy; later store edits do not leak into it.
    pub fn panel_data(&self) -> PanelAttributionData {
        PanelAttributionData {
            attributions: self.attributions.clone(),
            resources_to_attributions: self.resources_to_attributions.clone(),
            resources_with_attributed_children: self.resources_with_attributed_children.clone(),
        }
    }
}

/// Single source of truth for the loaded audit session: resource list,
/// both attribution datasets, the current selection and the resolved set.
/// Held by the UI in `Rc<RefCell<_>>`; everything else reads snapshots.
#[derive(Debug, Default)]
pub struct AttributionStore {
    pub external: AttributionData,
    pub manual: AttributionData,

    /// All known resource ids in path order, directories marked by their
    /// trailing slash. Drives the tree pane.
    resource_ids: Vec<ResourceId>,

    selected_resource_id: ResourceId,
    resolved_external_attributions: HashSet<AttributionId>,

    /// Set on any user edit that the output file must pick up.
    dirty: bool,
}

impl AttributionStore {
    pub fn new() -> Self {
        Self {
            selected_resource_id: "/".to_string(),
            ..Default::default()
        }
    }

    /// Replace the whole session with freshly loaded file contents. The
    /// attributed-children indexes are rebuilt from scratch here; later
    /// edits maintain them incrementally.
    pub fn load(&mut self, input: InputFile, output: Option<OutputFile>) {
        self.resource_ids = input.resources.resource_ids();
        self.external = AttributionData::from_tables(
            input.external_attributions,
            input.resources_to_attributions,
        );

        let output = output.unwrap_or_default();
        self.manual = AttributionData::from_tables(
            output.manual_attributions,
            output.resources_to_attributions,
        );
        self.resolved_external_attributions =
            output.resolved_external_attributions.into_iter().collect();

        self.selected_resource_id = "/".to_string();
        self.dirty = false;
    }

    pub fn resource_ids(&self) -> &[ResourceId] {
        &self.resource_ids
    }

    pub fn selected_resource_id(&self) -> &str {
        &self.selected_resource_id
    }

    /// Returns true if the selection actually changed.
    pub fn set_selected_resource(&mut self, resource_id: &str) -> bool {
        if self.selected_resource_id == resource_id {
            return false;
        }
        self.selected_resource_id = resource_id.to_string();
        true
    }

    pub fn resolved_external_attributions(&self) -> &HashSet<AttributionId> {
        &self.resolved_external_attributions
    }

    /// Toggle the resolved flag of an external attribution. Returns whether
    /// the attribution is resolved afterwards. This is the trigger point for
    /// persisting to the output file.
    pub fn toggle_resolved_external(&mut self, attribution_id: &str) -> bool {
        self.dirty = true;
        if self.resolved_external_attributions.remove(attribution_id) {
            tracing::debug!(attribution_id, "external attribution unresolved");
            false
        } else {
            self.resolved_external_attributions
                .insert(attribution_id.to_string());
            tracing::debug!(attribution_id, "external attribution resolved");
            true
        }
    }

    /// Attach a user-authored attribution to a resource, keeping the manual
    /// attributed-children index consistent without a full rebuild.
    pub fn add_manual_attribution(
        &mut self,
        resource_id: &str,
        attribution_id: AttributionId,
        attribution: PackageAttribution,
    ) {
        self.manual
            .attributions
            .insert(attribution_id.clone(), attribution);
        self.manual
            .resources_to_attributions
            .entry(resource_id.to_string())
            .or_default()
            .push(attribution_id);
        add_to_attributed_children_index(
            &mut self.manual.resources_with_attributed_children,
            resource_id,
        );
        self.dirty = true;
    }

    pub fn external_panel_data(&self) -> PanelAttributionData {
        self.external.panel_data()
    }

    pub fn manual_panel_data(&self) -> PanelAttributionData {
        self.manual.panel_data()
    }

    /// Attribution ids attached directly to the selected resource.
    pub fn direct_external_attribution_ids(&self) -> &[AttributionId] {
        self.external
            .resources_to_attributions
            .get(&self.selected_resource_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Header summary over the user-authored attributions.
    pub fn manual_attribution_counts(&self) -> AttributionCounts {
        AttributionCounts::from_attributions(&self.manual.attributions)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}
