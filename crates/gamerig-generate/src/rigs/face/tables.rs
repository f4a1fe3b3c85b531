//! Anatomical tables of the face rig.
//!
//! Keys are logical bone keys: original bones are `ORG-<name>`, controls and
//! tweaks use their bare name, mechanism bones carry `MCH-`. These tables
//! are authored data; rows whose bones a face lacks are skipped.

/// Where a chain search starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFrom {
    /// The face root.
    Root,
    /// The last bone found by the previous row (the previous search start
    /// when that row found nothing).
    Previous,
}

/// Chains discovered under the face root, in discovery order.
pub const CHAINS: &[(&str, SearchFrom)] = &[
    ("nose", SearchFrom::Root),
    ("lip.T.L", SearchFrom::Root),
    ("lip.T.R", SearchFrom::Root),
    ("lip.B.L", SearchFrom::Root),
    ("lip.B.R", SearchFrom::Root),
    ("jaw", SearchFrom::Root),
    ("chin", SearchFrom::Previous),
    ("ear.L", SearchFrom::Root),
    ("ear.R", SearchFrom::Root),
    ("lid.T.L", SearchFrom::Root),
    ("lid.B.L", SearchFrom::Previous),
    ("lid.T.R", SearchFrom::Root),
    ("lid.B.R", SearchFrom::Previous),
    ("brow.B.L", SearchFrom::Root),
    ("brow.B.R", SearchFrom::Root),
    ("temple.L", SearchFrom::Root),
    ("jaw.L", SearchFrom::Previous),
    ("chin.L", SearchFrom::Previous),
    ("cheek.B.L", SearchFrom::Previous),
    ("brow.T.L", SearchFrom::Previous),
    ("temple.R", SearchFrom::Root),
    ("jaw.R", SearchFrom::Previous),
    ("chin.R", SearchFrom::Previous),
    ("cheek.B.R", SearchFrom::Previous),
    ("brow.T.R", SearchFrom::Previous),
    ("eye.L", SearchFrom::Root),
    ("eye.R", SearchFrom::Root),
    ("cheek.T.L", SearchFrom::Root),
    ("nose.L", SearchFrom::Previous),
    ("cheek.T.R", SearchFrom::Root),
    ("nose.R", SearchFrom::Previous),
    ("tongue", SearchFrom::Root),
];

/// Original bones that become dedicated controls.
pub const EYE_BONES: [&str; 2] = ["ORG-eye.L", "ORG-eye.R"];
pub const EAR_BONES: [&str; 2] = ["ORG-ear.L", "ORG-ear.R"];
pub const JAW_BONES: [&str; 3] = ["ORG-jaw.L", "ORG-jaw.R", "ORG-jaw"];

/// Original bones whose tweak gets a shared name.
pub const TWEAK_UNIQUE: &[(&str, &str)] = &[("ORG-lip.T.L", "lip.T"), ("ORG-lip.B.L", "lip.B")];

/// Original bones without a tweak of their own, besides temples and the
/// [`TWEAK_UNIQUE`] keys.
pub const TWEAK_EXCEPTIONS: &[&str] = &[
    "ORG-lip.T.R",
    "ORG-lip.B.R",
    "ORG-ear.L.001",
    "ORG-ear.R.001",
    "ORG-face",
    "ORG-cheek.T.L",
    "ORG-cheek.T.R",
    "ORG-cheek.B.L",
    "ORG-cheek.B.R",
    "ORG-ear.L",
    "ORG-ear.R",
    "ORG-eye.L",
    "ORG-eye.R",
    "ORG-eyes",
    "ORG-ears",
    "ORG-teeth",
];

/// Original bones that also get a tweak at their tail.
pub const TWEAK_TAILS: &[&str] = &[
    "ORG-brow.B.L.003",
    "ORG-brow.B.R.003",
    "ORG-nose.003",
    "ORG-chin.001",
    "ORG-lip.T.L.001",
    "ORG-lip.T.R.001",
    "ORG-tongue.002",
];

/// Tail tweaks with a name of their own.
pub const TAIL_NAMES: &[(&str, &str)] = &[("lip.T.L.001", "lips.L"), ("lip.T.R.001", "lips.R")];

/// Tweaks on the primary layers; every other tweak is secondary.
pub const PRIMARY_TWEAKS: &[&str] = &[
    "lid.B.L.002",
    "lid.T.L.002",
    "lid.B.R.002",
    "lid.T.R.002",
    "chin",
    "brow.T.L.001",
    "brow.T.L.002",
    "brow.T.L.003",
    "brow.T.R.001",
    "brow.T.R.002",
    "brow.T.R.003",
    "lip.B",
    "lip.B.L.001",
    "lip.B.R.001",
    "cheek.B.L.001",
    "cheek.B.R.001",
    "lips.L",
    "lips.R",
    "lip.T.L.001",
    "lip.T.R.001",
    "lip.T",
    "nose.002",
    "nose.L.001",
    "nose.R.001",
];

/// Deformation targets that track something other than the next tweak.
pub const DEF_SPECIALS: &[(&str, &str)] = &[
    ("MCH-target_jaw", "MCH-chin"),
    ("MCH-target_chin.L", "lips.L"),
    ("MCH-target_jaw.L.001", "chin.L"),
    ("MCH-target_chin.R", "lips.R"),
    ("MCH-target_jaw.R.001", "chin.R"),
    ("MCH-target_brow.T.L.003", "nose"),
    ("MCH-target_ear.L.003", "ear.L.004"),
    ("MCH-target_ear.L.004", "ear.L"),
    ("MCH-target_ear.R.003", "ear.R.004"),
    ("MCH-target_ear.R.004", "ear.R"),
    ("MCH-target_lip.B.L.001", "lips.L"),
    ("MCH-target_lip.B.R.001", "lips.R"),
    ("MCH-target_cheek.B.L.001", "brow.T.L"),
    ("MCH-target_cheek.B.R.001", "brow.T.R"),
    ("MCH-target_lip.T.L.001", "lips.L"),
    ("MCH-target_lip.T.R.001", "lips.R"),
    ("MCH-target_cheek.T.L.001", "nose.L"),
    ("MCH-target_nose.L.001", "nose.002"),
    ("MCH-target_cheek.T.R.001", "nose.R"),
    ("MCH-target_nose.R.001", "nose.002"),
    ("MCH-target_temple.L", "jaw.L"),
    ("MCH-target_brow.T.R.003", "nose"),
    ("MCH-target_temple.R", "jaw.R"),
];

/// Copy-transforms influence of each jaw fan bone on the jaw master.
pub const JAW_FAN: &[(&str, f64)] = &[
    ("MCH-mouth_lock", 0.20),
    ("MCH-jaw_master", 1.00),
    ("MCH-jaw_master.001", 0.75),
    ("MCH-jaw_master.002", 0.35),
    ("MCH-jaw_master.003", 0.10),
    ("MCH-jaw_master.004", 0.025),
];

/// Left-side tweak copy-location constraints: owner, target, influence.
/// Every row is mirrored to the right side by name.
pub const COPY_LOCATION_L: &[(&str, &str, f64)] = &[
    ("brow.T.L.002", "brow.T.L.001", 0.5),
    ("brow.T.L.002", "brow.T.L.003", 0.5),
    ("ear.L.003", "ear.L.004", 0.5),
    ("ear.L.003", "ear.L.002", 0.5),
    ("brow.B.L.001", "brow.B.L.002", 0.6),
    ("brow.B.L.003", "brow.B.L.002", 0.6),
    ("brow.B.L.002", "brow.T.L.002", 0.25),
    ("lid.T.L.001", "lid.T.L.002", 0.6),
    ("lid.T.L.003", "lid.T.L.002", 0.6),
    ("lid.T.L.002", "MCH-eye.L.001", 0.5),
    ("lid.B.L.001", "lid.B.L.002", 0.6),
    ("lid.B.L.003", "lid.B.L.002", 0.6),
    ("lid.B.L.002", "MCH-eye.L.001", 0.5),
    ("lid.B.L.002", "cheek.T.L.001", 0.1),
    ("cheek.T.L.001", "cheek.B.L.001", 0.5),
    ("nose.L", "nose.L.001", 0.25),
    ("nose.L.001", "lip.T.L.001", 0.2),
    ("cheek.B.L.001", "lips.L", 0.5),
    ("lip.T.L.001", "lips.L", 0.25),
    ("lip.T.L.001", "lip.T", 0.5),
    ("lip.B.L.001", "lips.L", 0.25),
    ("lip.B.L.001", "lip.B", 0.5),
];

/// Left-side tweaks that copy rotation and scale of a central lip tweak.
pub const COPY_ROTATION_SCALE_L: &[(&str, &str)] = &[("lip.T.L.001", "lip.T"), ("lip.B.L.001", "lip.B")];

/// Nose tweaks that move against the nose tip.
pub const NOSE_INVERTED: &[(&str, &str, f64)] = &[("nose.001", "nose.002", 0.35), ("nose.003", "nose.002", 0.5)];

/// Parent groups applied after the generic rules: parent, children.
pub const PARENT_GROUPS: &[(&str, &[&str])] = &[
    (
        "jaw_master",
        &["jaw", "jaw.R.001", "jaw.L.001", "chin.L", "chin.R", "chin", "MCH-chin", "tongue.003"],
    ),
    ("MCH-jaw_master", &["lip.B"]),
    ("MCH-jaw_master.001", &["lip.B.L.001", "lip.B.R.001"]),
    ("MCH-jaw_master.002", &["lips.L", "lips.R", "cheek.B.L.001", "cheek.B.R.001"]),
    ("MCH-jaw_master.003", &["lip.T", "lip.T.L.001", "lip.T.R.001"]),
    ("MCH-jaw_master.004", &["cheek.T.L.001", "cheek.T.R.001"]),
    ("nose_master", &["nose.002", "nose.003", "nose.L.001", "nose.R.001"]),
];

/// Single parent assignments applied last: child, parent.
pub const PARENT_OVERRIDES: &[(&str, &str)] = &[
    ("chin.001", "chin"),
    ("chin.002", "lip.B"),
    ("nose.001", "nose.002"),
    ("nose.003", "nose.002"),
    ("tongue", "tongue_master"),
    ("tongue.001", "MCH-tongue.001"),
    ("tongue.002", "MCH-tongue.002"),
];

/// Ear tweaks that hang off the ear control of their side.
pub const EAR_TWEAKS_L: &[&str] = &["ear.L.002", "ear.L.003", "ear.L.004"];

pub fn is_primary(tweak: &str) -> bool {
    PRIMARY_TWEAKS.contains(&tweak)
}

/// Special target of a deformation bone, if it has one.
pub fn def_special(target: &str) -> Option<&'static str> {
    DEF_SPECIALS.iter().find(|(bone, _)| *bone == target).map(|(_, t)| *t)
}

/// Tweak a deformation bone stretches to when it has no special target:
/// a numbered name bumps its last digit, any other name gets `.001`.
///
/// `nose.002` -> `nose.003`, `brow.T.L` -> `brow.T.L.001`.
pub fn next_tweak(name: &str) -> String {
    let last = name.chars().last().and_then(|c| c.to_digit(10));
    match last {
        Some(digit) if name.contains('.') => {
            format!("{}{}", &name[..name.len() - 1], digit + 1)
        }
        _ => format!("{}.001", name),
    }
}
