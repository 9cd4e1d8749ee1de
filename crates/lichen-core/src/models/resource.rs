use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::AttributionId;

/// Path-like resource identifier.
///
/// Ids start with `/` and use a trailing `/` to mark resources that can have
/// children (directories). A resource B lies in A's subtree iff B's id starts
/// with A's id and differs from it.
pub type ResourceId = String;

/// Direct (non-inherited) attributions per resource.
pub type ResourcesToAttributions = HashMap<ResourceId, Vec<AttributionId>>;

/// Whether a resource id denotes a resource that can have children.
pub fn can_have_children(resource_id: &str) -> bool {
    resource_id.ends_with('/')
}

/// All ancestor directory ids of a resource, outermost first, including the
/// root "/" but not the resource itself.
///
/// `/a/b/file` -> `["/", "/a/", "/a/b/"]`; `/a/b/` -> `["/", "/a/"]`.
pub fn parent_directories(resource_id: &str) -> Vec<ResourceId> {
    let mut parents = Vec::new();
    for (idx, ch) in resource_id.char_indices() {
        if ch == '/' && idx + 1 < resource_id.len() {
            parents.push(resource_id[..=idx].to_string());
        }
    }
    parents
}

/// The nested resource tree as stored in the input file: a directory maps
/// names to subtrees, a file is the literal `1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceNode {
    Directory(BTreeMap<String, ResourceNode>),
    File(u8),
}

impl ResourceNode {
    /// Flatten the tree into the full list of resource ids, directories
    /// carrying their trailing slash. Ids come out in path order because the
    /// children maps are sorted.
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        let mut ids = Vec::new();
        self.collect_ids("/", &mut ids);
        ids
    }

    fn collect_ids(&self, prefix: &str, ids: &mut Vec<ResourceId>) {
        if let ResourceNode::Directory(children) = self {
            for (name, child) in children {
                match child {
                    ResourceNode::Directory(_) => {
                        let id = format!("{}{}/", prefix, name);
                        ids.push(id.clone());
                        child.collect_ids(&id, ids);
                    }
                    ResourceNode::File(_) => {
                        ids.push(format!("{}{}", prefix, name));
                    }
                }
            }
        }
    }
}
