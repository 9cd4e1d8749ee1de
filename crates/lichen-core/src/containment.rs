//! Contained-attribution aggregation.
//!
//! "Contained" means attached to some resource inside a directory's subtree,
//! as opposed to attached to the directory itself. The aggregation never
//! walks the full tree per request; it consults the precomputed
//! attributed-children index and only tallies the resources listed there.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{
    can_have_children, parent_directories, AttributionId, Attributions, ResourceId,
    ResourcesToAttributions,
};

/// Maps a directory id to the set of descendant resource ids that carry
/// direct attributions. Kept as `BTreeSet` so iteration (and therefore the
/// first-seen order of aggregated results) is path order, not hash order.
pub type ResourcesWithAttributedChildren = HashMap<ResourceId, BTreeSet<ResourceId>>;

/// Read-only bundle handed to the aggregation functions. External and manual
/// datasets are structurally identical but logically separate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelAttributionData {
    pub attributions: Attributions,
    pub resources_to_attributions: ResourcesToAttributions,
    pub resources_with_attributed_children: ResourcesWithAttributedChildren,
}

impl PanelAttributionData {
    pub fn is_empty(&self) -> bool {
        self.attributions.is_empty() && self.resources_to_attributions.is_empty()
    }
}

/// One row of an aggregated panel: an attribution id and the number of
/// distinct resources in the selected subtree that carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionIdWithCount {
    pub attribution_id: AttributionId,
    pub count: usize,
}

/// Build the attributed-children index from scratch: every directly
/// attributed resource is registered with each of its ancestor directories.
pub fn attributed_children_index(
    resources_to_attributions: &ResourcesToAttributions,
) -> ResourcesWithAttributedChildren {
    let mut index = ResourcesWithAttributedChildren::new();
    for (resource_id, attribution_ids) in resources_to_attributions {
        if !attribution_ids.is_empty() {
            add_to_attributed_children_index(&mut index, resource_id);
        }
    }
    index
}

/// Incremental variant of [`attributed_children_index`] for a single
/// newly-attributed resource.
pub fn add_to_attributed_children_index(
    index: &mut ResourcesWithAttributedChildren,
    resource_id: &str,
) {
    for parent in parent_directories(resource_id) {
        index.entry(parent).or_default().insert(resource_id.to_string());
    }
}

/// Contained external attributions beneath `selected_resource_id`, with
/// resolved attributions filtered out.
pub fn get_contained_external_packages(
    selected_resource_id: &str,
    external_data: &PanelAttributionData,
    resolved_external_attributions: Option<&HashSet<AttributionId>>,
) -> Vec<AttributionIdWithCount> {
    aggregate_attributions_from_children(
        selected_resource_id,
        external_data,
        resolved_external_attributions,
    )
}

/// Contained manual attributions beneath `selected_resource_id`. Resolved
/// external attributions never filter manual counts.
pub fn get_contained_manual_packages(
    selected_resource_id: &str,
    manual_data: &PanelAttributionData,
) -> Vec<AttributionIdWithCount> {
    aggregate_attributions_from_children(selected_resource_id, manual_data, None)
}

/// Rows for the direct (non-contained) panel: the attributions attached to
/// the selected resource itself, in mapping order.
pub fn get_attribution_ids_with_count(
    attribution_ids: &[AttributionId],
) -> Vec<AttributionIdWithCount> {
    attribution_ids
        .iter()
        .map(|attribution_id| AttributionIdWithCount {
            attribution_id: attribution_id.clone(),
            count: 1,
        })
        .collect()
}

fn aggregate_attributions_from_children(
    selected_resource_id: &str,
    attribution_data: &PanelAttributionData,
    resolved_attributions: Option<&HashSet<AttributionId>>,
) -> Vec<AttributionIdWithCount> {
    // Contained-package panels are only meaningful for directories.
    if !can_have_children(selected_resource_id) {
        return Vec::new();
    }

    let Some(attributed_children) = attribution_data
        .resources_with_attributed_children
        .get(selected_resource_id)
    else {
        // Unknown or attribution-free subtree: empty result, not an error.
        return Vec::new();
    };

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for child in attributed_children {
        let Some(attribution_ids) = attribution_data.resources_to_attributions.get(child) else {
            continue;
        };
        for attribution_id in attribution_ids {
            if resolved_attributions
                .map(|resolved| resolved.contains(attribution_id))
                .unwrap_or(false)
            {
                continue;
            }
            let entry = counts.entry(attribution_id.as_str()).or_insert(0);
            if *entry == 0 {
                first_seen.push(attribution_id.as_str());
            }
            // Each child resource contributes each of its direct attribution
            // ids once, so the tally is a distinct-resource count.
            *entry += 1;
        }
    }

    let mut result: Vec<AttributionIdWithCount> = first_seen
        .into_iter()
        .map(|attribution_id| AttributionIdWithCount {
            attribution_id: attribution_id.to_string(),
            count: counts[attribution_id],
        })
        .collect();
    // Stable sort keeps first-seen order among equal counts.
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_with(
        resources_to_attributions: &[(&str, &[&str])],
    ) -> PanelAttributionData {
        let mut mapping = ResourcesToAttributions::new();
        let mut attributions = Attributions::new();
        for (resource_id, attribution_ids) in resources_to_attributions {
            mapping.insert(
                resource_id.to_string(),
                attribution_ids.iter().map(|s| s.to_string()).collect(),
            );
            for id in attribution_ids.iter() {
                attributions.entry(id.to_string()).or_default();
            }
        }
        let resources_with_attributed_children = attributed_children_index(&mapping);
        PanelAttributionData {
            attributions,
            resources_to_attributions: mapping,
            resources_with_attributed_children,
        }
    }

    #[test]
    fn test_index_registers_all_ancestors() {
        let data = data_with(&[("/a/b/file1", &["x"]), ("/a/file2", &["y"])]);
        let index = &data.resources_with_attributed_children;

        let root: Vec<_> = index["/"].iter().cloned().collect();
        assert_eq!(root, vec!["/a/b/file1".to_string(), "/a/file2".to_string()]);
        assert!(index["/a/b/"].contains("/a/b/file1"));
        assert!(!index["/a/b/"].contains("/a/file2"));
        assert!(!index.contains_key("/a/b/file1"));
    }

    #[test]
    fn test_contained_packages_for_directory_tree() {
        // Tree { "a/": { "b/": { file1 }, file2 } }, X on file1, Y on file2.
        let data = data_with(&[("/a/b/file1", &["x"]), ("/a/file2", &["y"])]);

        let for_a = get_contained_external_packages("/a/", &data, None);
        assert_eq!(
            for_a,
            vec![
                AttributionIdWithCount { attribution_id: "x".into(), count: 1 },
                AttributionIdWithCount { attribution_id: "y".into(), count: 1 },
            ]
        );

        let for_a_b = get_contained_external_packages("/a/b/", &data, None);
        assert_eq!(
            for_a_b,
            vec![AttributionIdWithCount { attribution_id: "x".into(), count: 1 }]
        );
    }

    #[test]
    fn test_non_directory_yields_empty() {
        let data = data_with(&[("/a/file2", &["y"])]);
        assert!(get_contained_external_packages("/a/file2", &data, None).is_empty());
    }

    #[test]
    fn test_unknown_resource_yields_empty() {
        let data = data_with(&[("/a/file2", &["y"])]);
        assert!(get_contained_external_packages("/nope/", &data, None).is_empty());
        assert!(get_contained_external_packages("/a/", &PanelAttributionData::default(), None)
            .is_empty());
    }

    #[test]
    fn test_counts_distinct_resources_and_orders_by_count() {
        let data = data_with(&[
            ("/a/f1", &["x"]),
            ("/a/f2", &["x", "y"]),
            ("/a/sub/f3", &["x"]),
        ]);
        let result = get_contained_external_packages("/a/", &data, None);
        assert_eq!(
            result,
            vec![
                AttributionIdWithCount { attribution_id: "x".into(), count: 3 },
                AttributionIdWithCount { attribution_id: "y".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_ties_keep_first_seen_path_order() {
        let data = data_with(&[("/a/f1", &["y"]), ("/a/f0", &["x"])]);
        let result = get_contained_external_packages("/a/", &data, None);
        // /a/f0 sorts before /a/f1, so x is seen first.
        assert_eq!(result[0].attribution_id, "x");
        assert_eq!(result[1].attribution_id, "y");
    }

    #[test]
    fn test_resolved_attributions_are_filtered() {
        let data = data_with(&[("/a/f1", &["x"]), ("/a/f2", &["x", "y"])]);
        let resolved: HashSet<AttributionId> = ["x".to_string()].into_iter().collect();

        let result = get_contained_external_packages("/a/", &data, Some(&resolved));
        assert_eq!(
            result,
            vec![AttributionIdWithCount { attribution_id: "y".into(), count: 1 }]
        );

        // Manual counts ignore the resolved set entirely.
        let manual = get_contained_manual_packages("/a/", &data);
        assert_eq!(manual.len(), 2);
    }

    #[test]
    fn test_direct_panel_preserves_mapping_order() {
        let ids = vec!["b".to_string(), "a".to_string()];
        let rows = get_attribution_ids_with_count(&ids);
        assert_eq!(rows[0].attribution_id, "b");
        assert_eq!(rows[1].attribution_id, "a");
        assert!(rows.iter().all(|row| row.count == 1));
    }

    #[test]
    fn test_incremental_index_update_matches_rebuild() {
        let mut mapping = ResourcesToAttributions::new();
        mapping.insert("/a/f1".to_string(), vec!["x".to_string()]);
        let mut index = attributed_children_index(&mapping);

        mapping.insert("/a/b/f2".to_string(), vec!["y".to_string()]);
        add_to_attributed_children_index(&mut index, "/a/b/f2");

        assert_eq!(index, attributed_children_index(&mapping));
    }
}
