//! Bone naming and addressing rules.
//!
//! Generated armatures sort every bone into a naming class by prefix:
//!
//! - `ORG-` ([`BoneClass::Original`]): renamed copies of meta-skeleton bones
//! - `MCH-` ([`BoneClass::Mechanism`]): helper bones hidden from animators
//! - `JIG-` ([`BoneClass::Jig`]): scaffolding removed before generation ends
//! - anything else ([`BoneClass::Plain`]): controls and tweaks
//!
//! Numbered duplicates carry a zero-padded `.NNN` suffix, and laterality is
//! encoded by a trailing `L`/`R` component (`hand.L`, `lid.T.R.002`).

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

/// Prefix of bones copied from the meta-skeleton.
pub const ORG_PREFIX: &str = "ORG-";
/// Prefix of mechanism bones.
pub const MCH_PREFIX: &str = "MCH-";
/// Prefix of transient jig bones.
pub const JIG_PREFIX: &str = "JIG-";

const NUMBER_SUFFIX_PATTERN: &str = r"^(.+)\.(\d{3})$";
const LEFT_PATTERN: &str = r"L\.?\d*$";
const RIGHT_PATTERN: &str = r"R\.?\d*$";

static NUMBER_SUFFIX_REGEX: OnceLock<Regex> = OnceLock::new();
static LEFT_REGEX: OnceLock<Regex> = OnceLock::new();
static RIGHT_REGEX: OnceLock<Regex> = OnceLock::new();

fn number_suffix_regex() -> &'static Regex {
    NUMBER_SUFFIX_REGEX
        .get_or_init(|| Regex::new(NUMBER_SUFFIX_PATTERN).expect("invalid regex pattern"))
}

fn left_regex() -> &'static Regex {
    LEFT_REGEX.get_or_init(|| Regex::new(LEFT_PATTERN).expect("invalid regex pattern"))
}

fn right_regex() -> &'static Regex {
    RIGHT_REGEX.get_or_init(|| Regex::new(RIGHT_PATTERN).expect("invalid regex pattern"))
}

/// Naming class of a bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoneClass {
    Original,
    Mechanism,
    Jig,
    Plain,
}

impl BoneClass {
    /// Returns the name prefix of this class (empty for plain bones).
    pub fn prefix(&self) -> &'static str {
        match self {
            BoneClass::Original => ORG_PREFIX,
            BoneClass::Mechanism => MCH_PREFIX,
            BoneClass::Jig => JIG_PREFIX,
            BoneClass::Plain => "",
        }
    }
}

/// Classifies a bone name by its prefix.
pub fn classify(name: &str) -> BoneClass {
    if name.starts_with(ORG_PREFIX) {
        BoneClass::Original
    } else if name.starts_with(MCH_PREFIX) {
        BoneClass::Mechanism
    } else if name.starts_with(JIG_PREFIX) {
        BoneClass::Jig
    } else {
        BoneClass::Plain
    }
}

/// Strips the class prefix, if any.
pub fn basename(name: &str) -> &str {
    let prefix = classify(name).prefix();
    &name[prefix.len()..]
}

/// Puts `name` into `class`.
///
/// A name already in the class is returned unchanged, so applying this twice
/// is the same as applying it once.
pub fn with_class(name: &str, class: BoneClass) -> String {
    if classify(name) == class {
        return name.to_string();
    }
    format!("{}{}", class.prefix(), basename(name))
}

pub fn org(name: &str) -> String {
    with_class(name, BoneClass::Original)
}

pub fn mch(name: &str) -> String {
    with_class(name, BoneClass::Mechanism)
}

pub fn jig(name: &str) -> String {
    with_class(name, BoneClass::Jig)
}

pub fn is_org(name: &str) -> bool {
    classify(name) == BoneClass::Original
}

pub fn is_mch(name: &str) -> bool {
    classify(name) == BoneClass::Mechanism
}

pub fn is_jig(name: &str) -> bool {
    classify(name) == BoneClass::Jig
}

/// Splits a trailing `.NNN` suffix off a name.
///
/// `"brow.B.L.003"` gives `("brow.B.L", Some(3))`, `"jaw"` gives `("jaw", None)`.
pub fn split_number_suffix(name: &str) -> (&str, Option<u32>) {
    match number_suffix_regex().captures(name) {
        Some(caps) => {
            let stem = caps.get(1).map_or(name, |m| m.as_str());
            let number = caps.get(2).and_then(|m| m.as_str().parse().ok());
            (stem, number)
        }
        None => (name, None),
    }
}

/// Returns `base` or the first numbered variant of it that `exists` rejects.
///
/// A name without a numeric suffix gets `.001`; a name that already has one
/// is incremented (`brow.B.L.003` -> `brow.B.L.004`).
pub fn make_unique(base: &str, exists: impl Fn(&str) -> bool) -> String {
    let mut name = base.to_string();
    while exists(&name) {
        name = match split_number_suffix(&name) {
            (stem, Some(number)) => format!("{}.{:03}", stem, number + 1),
            (_, None) => format!("{}.001", name),
        };
    }
    name
}

/// Total order on bone names: by stem, then by numeric suffix (unnumbered first).
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let (stem_a, num_a) = split_number_suffix(a);
    let (stem_b, num_b) = split_number_suffix(b);
    stem_a
        .cmp(stem_b)
        .then_with(|| num_a.cmp(&num_b))
        .then_with(|| a.cmp(b))
}

/// Inserts `suffix` before the first period of `name`.
///
/// `("upper_arm.L", "_fk")` gives `"upper_arm_fk.L"`; a name without a period
/// just gets the suffix appended.
pub fn insert_before_first_period(name: &str, suffix: &str) -> String {
    match name.find('.') {
        Some(index) => format!("{}{}{}", &name[..index], suffix, &name[index..]),
        None => format!("{}{}", name, suffix),
    }
}

/// Laterality of a bone name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Center,
}

/// Laterality from a trailing `L[.digits]` / `R[.digits]` component.
pub fn side_of(name: &str) -> Side {
    if left_regex().is_match(name) {
        Side::Left
    } else if right_regex().is_match(name) {
        Side::Right
    } else {
        Side::Center
    }
}

/// Partitions names into sorted left and right lists, dropping center names.
pub fn symmetrical_split<S: AsRef<str>>(names: &[S]) -> (Vec<String>, Vec<String>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for name in names {
        let name = name.as_ref();
        match side_of(name) {
            Side::Left => left.push(name.to_string()),
            Side::Right => right.push(name.to_string()),
            Side::Center => {}
        }
    }
    left.sort();
    right.sort();
    (left, right)
}

/// Rewrites every `.L` as `.R`.
pub fn left_to_right(name: &str) -> String {
    name.replace(".L", ".R")
}

/// Swaps every `.L` with `.R` and back.
pub fn mirror_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '.' {
            match chars.peek() {
                Some('L') => {
                    out.push('R');
                    chars.next();
                }
                Some('R') => {
                    out.push('L');
                    chars.next();
                }
                _ => {}
            }
        }
    }
    out
}
