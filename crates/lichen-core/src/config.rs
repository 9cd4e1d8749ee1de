use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Input attribution file (scanned resources + external attributions).
    pub input_path: PathBuf,
    /// Output file for user edits. Defaults to the input path with an
    /// `_attributions.json` suffix next to it.
    pub output_path: PathBuf,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(input_path: P, output_path: Option<PathBuf>) -> Self {
        let input_path = input_path.as_ref().to_path_buf();
        let output_path = output_path.unwrap_or_else(|| default_output_path(&input_path));
        Self {
            input_path,
            output_path,
        }
    }
}

fn default_output_path(input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("lichen");
    input_path.with_file_name(format!("{}_attributions.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let config = CoreConfig::new("/tmp/scan.json", None);
        assert_eq!(
            config.output_path,
            PathBuf::from("/tmp/scan_attributions.json")
        );
    }

    #[test]
    fn test_explicit_output_path_wins() {
        let config = CoreConfig::new("/tmp/scan.json", Some(PathBuf::from("/tmp/out.json")));
        assert_eq!(config.output_path, PathBuf::from("/tmp/out.json"));
    }
}
