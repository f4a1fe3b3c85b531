//! Property-based tests for bone naming rules.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gamerig-tests --test proptest_naming
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use gamerig_spec::naming::{
    basename, compare_names, make_unique, mch, mirror_name, org, side_of, split_number_suffix, Side,
};

/// Bone-like names, with and without class prefixes and numeric suffixes.
fn bone_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("(ORG-|MCH-|JIG-)?[a-z_]{1,8}(\\.[LRTB])?(\\.[0-9]{3})?")
        .unwrap()
        .boxed()
}

// ============================================================================
// 1. Unique Names
// ============================================================================

proptest! {
    /// A made-unique name is never already taken.
    #[test]
    fn make_unique_avoids_existing(
        base in "[a-z]{1,4}",
        taken in prop::collection::vec(0u32..20, 0..10),
        base_taken in any::<bool>()
    ) {
        let mut existing: HashSet<String> =
            taken.iter().map(|n| format!("{}.{:03}", base, n)).collect();
        if base_taken {
            existing.insert(base.clone());
        }
        let name = make_unique(&base, |n| existing.contains(n));
        prop_assert!(!existing.contains(&name), "'{}' already exists", name);
        prop_assert!(name.starts_with(&base));
    }

    /// A free name comes back unchanged.
    #[test]
    fn make_unique_keeps_free_name(name in bone_name()) {
        prop_assert_eq!(make_unique(&name, |_| false), name);
    }
}

// ============================================================================
// 2. Numeric Suffixes
// ============================================================================

proptest! {
    /// Splitting a numbered name recovers the stem and number.
    #[test]
    fn split_suffix_recovers_parts(stem in "[a-z_][a-z_.]{0,8}", number in 0u32..1000) {
        let name = format!("{}.{:03}", stem, number);
        prop_assert_eq!(split_number_suffix(&name), (stem.as_str(), Some(number)));
    }

    /// Numbered copies sort after their stem and in numeric order.
    #[test]
    fn numbered_names_sort_after_stem(stem in "[a-z]{1,6}", a in 0u32..1000, b in 0u32..1000) {
        let first = format!("{}.{:03}", stem, a.min(b));
        let second = format!("{}.{:03}", stem, a.max(b));
        prop_assert!(compare_names(&stem, &first).is_lt());
        prop_assert!(compare_names(&first, &second).is_le());
    }
}

// ============================================================================
// 3. Classes and Mirroring
// ============================================================================

proptest! {
    /// Class prefixes are idempotent and keep the base name.
    #[test]
    fn class_prefix_idempotent(name in bone_name()) {
        let original = org(&name);
        prop_assert_eq!(org(&original), original.clone());
        prop_assert_eq!(basename(&original), basename(&name));
        let mch_name = mch(&original);
        prop_assert_eq!(basename(&mch_name), basename(&name));
    }

    /// Mirroring twice gives the original name.
    #[test]
    fn mirror_is_involution(name in bone_name()) {
        prop_assert_eq!(mirror_name(&mirror_name(&name)), name);
    }

    /// Mirroring swaps the side of sided names.
    #[test]
    fn mirror_swaps_side(stem in "[a-z_]{1,8}", left in any::<bool>(), number in 0u32..1000) {
        let side = if left { "L" } else { "R" };
        let name = format!("{}.{}.{:03}", stem, side, number);
        let expected = if left { Side::Right } else { Side::Left };
        prop_assert_eq!(side_of(&mirror_name(&name)), expected);
    }
}
