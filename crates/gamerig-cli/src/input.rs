//! Loading meta-skeletons, configuration files and previously generated rigs.

use anyhow::{Context, Result};
use gamerig_generate::{Armature, GenerateConfig};
use gamerig_spec::hash::metarig_hash;
use gamerig_spec::Metarig;
use std::path::Path;

/// A meta-skeleton together with its canonical hash.
#[derive(Debug)]
pub struct LoadResult {
    pub metarig: Metarig,
    /// BLAKE3 hash of the canonical JSON form (hex string).
    pub hash: String,
}

/// Loads a meta-skeleton from a JSON file.
pub fn load_metarig(path: &Path) -> Result<LoadResult> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metarig file: {}", path.display()))?;
    let metarig = Metarig::from_json(&json)
        .with_context(|| format!("Failed to parse metarig file: {}", path.display()))?;
    let hash = metarig_hash(&metarig).context("Failed to hash metarig")?;
    Ok(LoadResult { metarig, hash })
}

/// Loads a generation config, or the default when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<GenerateConfig> {
    let Some(path) = path else {
        return Ok(GenerateConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Loads the armature of a previous run.
///
/// Accepts either a bare armature or the full output written by
/// `gamerig generate`, whose armature sits under the `armature` key.
pub fn load_previous(path: &Path) -> Result<Armature> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read previous rig: {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse previous rig: {}", path.display()))?;
    if let Some(armature) = value.get_mut("armature") {
        value = armature.take();
    }
    serde_json::from_value(value)
        .with_context(|| format!("No armature found in previous rig: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamerig_generate::rigs::tentacle;
    use gamerig_generate::Generator;

    #[test]
    fn test_load_metarig_reports_parse_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_metarig(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse metarig file"));

        let err = load_metarig(&tmp.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read metarig file"));
    }

    #[test]
    fn test_load_config_default_and_file() {
        assert_eq!(load_config(None).unwrap(), GenerateConfig::default());

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"policy": "strict", "bone_groups": false}"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.policy, gamerig_generate::Policy::Strict);
        assert!(!config.bone_groups);
        assert!(config.selection_sets);
    }

    #[test]
    fn test_load_previous_accepts_full_output() {
        let rig = Generator::new(GenerateConfig::default().with_seed(4))
            .generate(&tentacle::sample(), None)
            .unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rig.json");
        std::fs::write(&path, serde_json::to_string(&rig).unwrap()).unwrap();

        let armature = load_previous(&path).unwrap();
        assert_eq!(armature.properties["gamerig_id"], rig.rig_id);
        assert_eq!(armature.len(), rig.armature.len());
    }
}
