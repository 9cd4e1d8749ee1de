//! Output attribution file: the user-authored state that must survive
//! restarts — manual attributions, their resource mapping, and the
//! resolved-external set.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::input::{validate_mapping, FileError};
use crate::models::{AttributionId, Attributions, ResourcesToAttributions};
use crate::store::AttributionStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputFile {
    pub manual_attributions: Attributions,
    pub resources_to_attributions: ResourcesToAttributions,
    pub resolved_external_attributions: Vec<AttributionId>,
}

/// Load a previously saved output file, if present. A missing file is a
/// fresh session, not an error.
pub fn load_output_file(path: &Path) -> Result<Option<OutputFile>, FileError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let output: OutputFile = serde_json::from_str(&contents)?;
    validate_mapping(&output.resources_to_attributions, &output.manual_attributions)?;
    Ok(Some(output))
}

/// Persist the store's user-authored state. Writes to a temp file in the
/// same directory and renames over the target, so an interrupted save never
/// leaves a truncated output file behind.
pub fn save_output_file(path: &Path, store: &AttributionStore) -> Result<(), FileError> {
    let mut resolved: Vec<AttributionId> = store
        .resolved_external_attributions()
        .iter()
        .cloned()
        .collect();
    resolved.sort();

    let output = OutputFile {
        manual_attributions: store.manual.attributions.clone(),
        resources_to_attributions: store.manual.resources_to_attributions.clone(),
        resolved_external_attributions: resolved,
    };

    let bytes = serde_json::to_vec_pretty(&output)?;
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, &bytes)?;
    std::fs::rename(&temp_path, path)?;
    tracing::info!(path = %path.display(), "saved output file");
    Ok(())
}
