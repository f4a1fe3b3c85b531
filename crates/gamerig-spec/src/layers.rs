//! Armature layers, layer metadata, and colour groups.

use serde::{Deserialize, Serialize};

/// Number of bone layers in an armature.
pub const LAYER_COUNT: usize = 32;
/// Layer holding every `ORG-` bone after generation.
pub const ORG_LAYER: usize = 31;
/// Layer holding every `MCH-` bone after generation.
pub const MCH_LAYER: usize = 30;

/// 32-slot layer membership vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub [bool; LAYER_COUNT]);

impl LayerMask {
    /// Mask with no layer enabled.
    pub const fn empty() -> Self {
        Self([false; LAYER_COUNT])
    }

    /// Mask with exactly one layer enabled. Out-of-range indices give an empty mask.
    pub fn single(index: usize) -> Self {
        let mut mask = Self::empty();
        if index < LAYER_COUNT {
            mask.0[index] = true;
        }
        mask
    }

    /// Mask with the first layer enabled, the default for new bones.
    pub fn first() -> Self {
        Self::single(0)
    }

    pub fn is_set(&self, index: usize) -> bool {
        index < LAYER_COUNT && self.0[index]
    }

    pub fn set(&mut self, index: usize, on: bool) {
        if index < LAYER_COUNT {
            self.0[index] = on;
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&on| on)
    }

    /// Index of the lowest enabled layer.
    pub fn first_active(&self) -> Option<usize> {
        self.0.iter().position(|&on| on)
    }

    /// Enabled layer indices in ascending order.
    pub fn active(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
    }

    pub fn union(&self, other: &LayerMask) -> LayerMask {
        let mut out = *self;
        for (slot, &on) in out.0.iter_mut().zip(other.0.iter()) {
            *slot |= on;
        }
        out
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::first()
    }
}

fn default_row() -> u32 {
    1
}

/// Per-layer metadata authored on the meta-skeleton.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerInfo {
    /// Display name; unnamed layers get no UI toggle or selection set.
    #[serde(default)]
    pub name: String,
    /// UI row the toggle is placed in.
    #[serde(default = "default_row")]
    pub row: u32,
    /// 1-based index into the colour groups, 0 for none.
    #[serde(default)]
    pub group: u32,
    /// Whether a selection set is generated for this layer.
    #[serde(default)]
    pub selset: bool,
}

impl LayerInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            row: 1,
            group: 0,
            selset: false,
        }
    }

    pub fn with_row(mut self, row: u32) -> Self {
        self.row = row;
        self
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    pub fn with_selset(mut self, selset: bool) -> Self {
        self.selset = selset;
        self
    }
}

/// Bone colour set in linear RGB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorGroup {
    pub name: String,
    pub normal: [f64; 3],
    pub select: [f64; 3],
    pub active: [f64; 3],
}

impl ColorGroup {
    /// Same colours converted to sRGB.
    pub fn gamma_corrected(&self) -> ColorGroup {
        ColorGroup {
            name: self.name.clone(),
            normal: gamma_correct(self.normal),
            select: gamma_correct(self.select),
            active: gamma_correct(self.active),
        }
    }
}

/// Converts a linear RGB colour to sRGB.
pub fn gamma_correct(color: [f64; 3]) -> [f64; 3] {
    color.map(|c| {
        if c < 0.003_130_8 {
            (c * 12.92).max(0.0)
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_layer_mask_basics() {
        let mut mask = LayerMask::single(3);
        assert!(mask.is_set(3));
        assert_eq!(mask.first_active(), Some(3));
        mask.set(31, true);
        assert_eq!(mask.active().collect::<Vec<_>>(), vec![3, 31]);
        assert!(LayerMask::single(40).is_empty());
    }

    #[test]
    fn test_layer_mask_union() {
        let mask = LayerMask::single(1).union(&LayerMask::single(8));
        assert_eq!(mask.active().collect::<Vec<_>>(), vec![1, 8]);
    }

    #[test]
    fn test_layer_mask_serde() {
        let json = serde_json::to_string(&LayerMask::single(0)).unwrap();
        assert!(json.starts_with("[true,false"));
        let parsed: LayerMask = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, LayerMask::first());
    }

    #[test]
    fn test_layer_info_defaults() {
        let info: LayerInfo = serde_json::from_str(r#"{"name": "Face"}"#).unwrap();
        assert_eq!(info, LayerInfo::new("Face"));
        assert_eq!(info.row, 1);
    }

    #[test]
    fn test_gamma_correct() {
        let c = gamma_correct([0.0, 0.002, 1.0]);
        assert_eq!(c[0], 0.0);
        assert!((c[1] - 0.02584).abs() < 1e-9);
        assert!((c[2] - 1.0).abs() < 1e-9);
        assert_eq!(gamma_correct([-0.5, 0.0, 0.0])[0], 0.0);
    }
}
