//! Input attribution file parsing.
//!
//! The input file carries the scanned resource tree and the tool-detected
//! (external) attributions. User edits live in the companion output file
//! (see [`crate::output`]).

use std::path::Path;

use serde::Deserialize;

use crate::models::{Attributions, ResourceNode, ResourcesToAttributions};

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("failed to read attribution file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse attribution file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("resource {resource_id} references unknown attribution {attribution_id}")]
    DanglingAttribution {
        resource_id: String,
        attribution_id: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFile {
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    pub resources: ResourceNode,
    #[serde(default)]
    pub external_attributions: Attributions,
    #[serde(default)]
    pub resources_to_attributions: ResourcesToAttributions,
}

/// Load and validate an input file. Dangling attribution references are a
/// defect in the file, not a tolerated state, so they fail the load.
pub fn load_input_file(path: &Path) -> Result<InputFile, FileError> {
    let contents = std::fs::read_to_string(path)?;
    let input: InputFile = serde_json::from_str(&contents)?;
    validate_mapping(&input.resources_to_attributions, &input.external_attributions)?;
    tracing::info!(
        path = %path.display(),
        attributions = input.external_attributions.len(),
        mapped_resources = input.resources_to_attributions.len(),
        "loaded input file"
    );
    Ok(input)
}

pub(crate) fn validate_mapping(
    resources_to_attributions: &ResourcesToAttributions,
    attributions: &Attributions,
) -> Result<(), FileError> {
    for (resource_id, attribution_ids) in resources_to_attributions {
        for attribution_id in attribution_ids {
            if !attributions.contains_key(attribution_id) {
                return Err(FileError::DanglingAttribution {
                    resource_id: resource_id.clone(),
                    attribution_id: attribution_id.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"{
        "metadata": { "projectId": "demo" },
        "resources": { "src": { "main.rs": 1 } },
        "externalAttributions": { "x": { "packageName": "xpkg" } },
        "resourcesToAttributions": { "/src/main.rs": ["x"] }
    }"#;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_file() {
        let file = write_temp(VALID);
        let input = load_input_file(file.path()).unwrap();
        assert_eq!(input.external_attributions.len(), 1);
        assert_eq!(
            input.resources.resource_ids(),
            vec!["/src/".to_string(), "/src/main.rs".to_string()]
        );
    }

    #[test]
    fn test_dangling_reference_is_a_load_error() {
        let file = write_temp(
            r#"{
                "resources": { "f": 1 },
                "externalAttributions": {},
                "resourcesToAttributions": { "/f": ["missing"] }
            }"#,
        );
        let err = load_input_file(file.path()).unwrap_err();
        assert!(matches!(err, FileError::DanglingAttribution { .. }));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let file = write_temp("{ not json");
        assert!(matches!(
            load_input_file(file.path()).unwrap_err(),
            FileError::Parse(_)
        ));
    }
}
