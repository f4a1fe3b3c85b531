//! Meta-skeleton fixtures and generation helpers.

use gamerig_generate::rigs::{face, limb, tentacle};
use gamerig_generate::{GenerateConfig, GeneratedRig, Generator};
use gamerig_spec::naming::mirror_name;
use gamerig_spec::{Bone, Metarig, RigParameters};
use std::path::PathBuf;
use tempfile::TempDir;

/// Seed used by fixtures that need a reproducible rig identifier.
pub const SEED: u64 = 42;

/// Generates `metarig` with the default config and [`SEED`].
pub fn generate(metarig: &Metarig) -> GeneratedRig {
    Generator::new(GenerateConfig::default().with_seed(SEED))
        .generate(metarig, None)
        .expect("fixture metarig should generate")
}

pub fn arm() -> Metarig {
    limb::arm::sample()
}

pub fn leg() -> Metarig {
    limb::leg::sample()
}

pub fn face() -> Metarig {
    face::sample()
}

/// A straight vertical tentacle of `bones` connected bones.
pub fn tentacle(bones: usize, parameters: RigParameters) -> Metarig {
    let step = 1.0 / bones as f64;
    let mut metarig = Metarig::new("metarig");
    for i in 0..bones {
        let name = if i == 0 {
            "Bone".to_string()
        } else {
            format!("Bone.{:03}", i)
        };
        let head = [0.0, 0.0, step * i as f64];
        let tail = [0.0, 0.0, step * (i + 1) as f64];
        let mut bone = Bone::new(name, head, tail);
        if i == 0 {
            bone = bone.with_rig_type(tentacle::RIG_TYPE).with_parameters(parameters.clone());
        } else {
            let parent = if i == 1 {
                "Bone".to_string()
            } else {
                format!("Bone.{:03}", i - 1)
            };
            bone = bone.with_parent(parent).with_connect(true);
        }
        metarig = metarig.with_bone(bone);
    }
    metarig
}

/// Five-bone tentacle split into two IK segments.
pub fn segmented_tentacle() -> Metarig {
    tentacle(
        5,
        RigParameters::new()
            .with("chain_length", 5)
            .with("mid_ik_lens", vec![2, 2, 0, 0]),
    )
}

/// Mirrors every bone across the X = 0 plane and swaps `.L`/`.R` names.
pub fn mirrored(metarig: &Metarig) -> Metarig {
    let mut out = metarig.clone();
    for bone in &mut out.bones {
        bone.name = mirror_name(&bone.name);
        bone.parent = bone.parent.as_deref().map(mirror_name);
        bone.head[0] = -bone.head[0];
        bone.tail[0] = -bone.tail[0];
        bone.roll = -bone.roll;
    }
    out
}

/// Left and right copies of `metarig` in one meta-skeleton.
pub fn both_sides(metarig: &Metarig) -> Metarig {
    metarig.clone().merged(mirrored(metarig))
}

/// A temporary directory holding meta-skeleton files for CLI runs.
pub struct MetarigDir {
    pub root: TempDir,
}

impl MetarigDir {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Writes `metarig` as `<name>.json` and returns its path.
    pub fn add(&self, name: &str, metarig: &Metarig) -> PathBuf {
        let path = self.root.path().join(format!("{}.json", name));
        let json = metarig.to_json_pretty().expect("Failed to serialize metarig");
        std::fs::write(&path, json).expect("Failed to write metarig");
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }
}

impl Default for MetarigDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamerig_spec::validation::validate_metarig;

    #[test]
    fn test_tentacle_fixture() {
        let metarig = tentacle(4, RigParameters::new());
        assert_eq!(metarig.bones.len(), 4);
        assert_eq!(metarig.bones[3].parent.as_deref(), Some("Bone.002"));
        assert!(validate_metarig(&metarig).is_ok());
    }

    #[test]
    fn test_both_sides() {
        let metarig = both_sides(&arm());
        assert_eq!(metarig.bones.len(), 6);
        let right = metarig.bone("forearm.R").unwrap();
        assert_eq!(right.parent.as_deref(), Some("upper_arm.R"));
        assert!(right.head[0] < 0.0);
        assert!(validate_metarig(&metarig).is_ok());
    }
}
