//! Per-instance mapping from logical bone keys to actual bone names.

use std::collections::HashMap;

use gamerig_spec::naming::make_unique;

use crate::armature::EditMode;
use crate::error::{RigError, RigResult};

/// Logical-key to bone-name table owned by one rig instance.
///
/// Keys are unique and append-only. Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneNameMap {
    keys: Vec<String>,
    names: HashMap<String, String>,
}

impl BoneNameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actual bone name for `key`.
    pub fn resolve(&self, key: &str) -> RigResult<&str> {
        self.names
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| RigError::unknown_key(key))
    }

    /// Inserts a new key; existing keys are never overwritten.
    pub fn register(&mut self, key: impl Into<String>, actual: impl Into<String>) -> RigResult<()> {
        let key = key.into();
        if self.names.contains_key(&key) {
            return Err(RigError::DuplicateKey { key });
        }
        self.names.insert(key.clone(), actual.into());
        self.keys.push(key);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.names.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// `requested`, or its first numbered variant not yet used as a key.
    pub fn unique_key(&self, requested: &str) -> String {
        make_unique(requested, |k| self.contains(k))
    }

    /// Duplicates the bone behind `source_key` and registers the copy.
    ///
    /// Returns the new logical key, which is `requested` made unique among
    /// this map's keys.
    pub fn copy_bone(
        &mut self,
        edit: &mut EditMode<'_>,
        source_key: &str,
        requested: &str,
    ) -> RigResult<String> {
        let source = self.resolve(source_key)?.to_string();
        let key = self.unique_key(requested);
        let actual = edit.copy_bone(&source, &key)?;
        self.register(key.clone(), actual)?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::armature::Armature;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_register_and_resolve() {
        let mut map = BoneNameMap::new();
        map.register("ORG-face", "ORG-head").unwrap();
        assert_eq!(map.resolve("ORG-face").unwrap(), "ORG-head");
        assert_eq!(
            map.resolve("ORG-nose").unwrap_err(),
            RigError::unknown_key("ORG-nose")
        );
        assert_eq!(
            map.register("ORG-face", "x").unwrap_err(),
            RigError::DuplicateKey {
                key: "ORG-face".into()
            }
        );
    }

    #[test]
    fn test_copy_bone_suffixes_colliding_keys() {
        let mut arm = Armature::new("rig");
        let mut edit = arm.edit();
        edit.new_bone("ORG-jaw", [0.0; 3], [0.0, -0.1, 0.0]);

        let mut map = BoneNameMap::new();
        map.register("jaw_master", "ORG-jaw").unwrap();
        let keys: Vec<String> = (0..3)
            .map(|_| map.copy_bone(&mut edit, "jaw_master", "MCH-jaw_master").unwrap())
            .collect();
        assert_eq!(
            keys,
            vec!["MCH-jaw_master", "MCH-jaw_master.001", "MCH-jaw_master.002"]
        );
        for key in &keys {
            assert!(edit.contains(map.resolve(key).unwrap()));
        }
        assert_eq!(map.keys().len(), 4);
    }
}
