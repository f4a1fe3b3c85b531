//! Sample face meta-skeleton.

use gamerig_spec::{Bone, Metarig, Vec3};

use super::RIG_TYPE;

/// name, parent, head, tail, roll, connected
type SampleBone = (&'static str, Option<&'static str>, Vec3, Vec3, f64, bool);

#[rustfmt::skip]
const BONES: &[SampleBone] = &[
    ("head", None, [0.0000, -0.0247, 0.0694], [0.0000, -0.0247, 0.2677], 0.0000, false),
    ("nose", Some("head"), [0.0000, -0.1576, 0.1913], [0.0000, -0.1550, 0.1723], 0.0000, false),
    ("lip.T.L", Some("head"), [0.0000, -0.1710, 0.1021], [0.0195, -0.1656, 0.1027], 0.0000, false),
    ("lip.B.L", Some("head"), [0.0000, -0.1667, 0.0859], [0.0185, -0.1585, 0.0909], -0.0789, false),
    ("jaw", Some("head"), [0.0000, -0.0945, 0.0372], [0.0000, -0.1519, 0.0273], 0.0000, false),
    ("ear.L", Some("head"), [0.0919, -0.0309, 0.1503], [0.0989, -0.0295, 0.1898], -0.0324, false),
    ("lip.T.R", Some("head"), [0.0000, -0.1710, 0.1021], [-0.0195, -0.1656, 0.1027], 0.0000, false),
    ("lip.B.R", Some("head"), [0.0000, -0.1667, 0.0859], [-0.0185, -0.1585, 0.0909], 0.0789, false),
    ("brow.B.L", Some("head"), [0.0791, -0.1237, 0.1927], [0.0704, -0.1349, 0.1983], 0.0132, false),
    ("lid.T.L", Some("head"), [0.0768, -0.1218, 0.1828], [0.0678, -0.1356, 0.1876], -0.2079, false),
    ("brow.B.R", Some("head"), [-0.0791, -0.1237, 0.1927], [-0.0704, -0.1349, 0.1983], -0.0132, false),
    ("lid.T.R", Some("head"), [-0.0768, -0.1218, 0.1828], [-0.0678, -0.1356, 0.1876], 0.2079, false),
    ("temple.L", Some("head"), [0.0873, -0.0597, 0.2404], [0.0881, -0.0611, 0.1569], -0.0312, false),
    ("temple.R", Some("head"), [-0.0873, -0.0597, 0.2404], [-0.0881, -0.0611, 0.1569], 0.0312, false),
    ("eye.L", Some("head"), [0.0516, -0.1209, 0.1822], [0.0516, -0.1451, 0.1822], 0.0000, false),
    ("eye.R", Some("head"), [-0.0516, -0.1209, 0.1822], [-0.0516, -0.1451, 0.1822], 0.0000, false),
    ("cheek.T.L", Some("head"), [0.0848, -0.0940, 0.1751], [0.0565, -0.1430, 0.1398], -0.0096, false),
    ("cheek.T.R", Some("head"), [-0.0848, -0.0940, 0.1751], [-0.0565, -0.1430, 0.1398], 0.0096, false),
    ("tongue", Some("head"), [0.0000, -0.1354, 0.0827], [0.0000, -0.1101, 0.0883], 0.0000, false),
    ("ear.R", Some("head"), [-0.0919, -0.0309, 0.1503], [-0.0989, -0.0295, 0.1898], 0.0324, false),
    ("nose.001", Some("nose"), [0.0000, -0.1550, 0.1723], [0.0000, -0.1965, 0.1331], 0.0000, true),
    ("lip.T.L.001", Some("lip.T.L"), [0.0195, -0.1656, 0.1027], [0.0352, -0.1494, 0.0955], 0.0236, true),
    ("lip.B.L.001", Some("lip.B.L"), [0.0185, -0.1585, 0.0909], [0.0352, -0.1494, 0.0955], 0.0731, true),
    ("chin", Some("jaw"), [0.0000, -0.1519, 0.0273], [0.0000, -0.1634, 0.0573], 0.0000, true),
    ("ear.L.001", Some("ear.L"), [0.0989, -0.0295, 0.1898], [0.1200, -0.0026, 0.1955], 0.0656, true),
    ("lip.T.R.001", Some("lip.T.R"), [-0.0195, -0.1656, 0.1027], [-0.0352, -0.1494, 0.0955], -0.0236, true),
    ("lip.B.R.001", Some("lip.B.R"), [-0.0185, -0.1585, 0.0909], [-0.0352, -0.1494, 0.0955], -0.0731, true),
    ("brow.B.L.001", Some("brow.B.L"), [0.0704, -0.1349, 0.1983], [0.0577, -0.1427, 0.2007], 0.1269, true),
    ("lid.T.L.001", Some("lid.T.L"), [0.0678, -0.1356, 0.1876], [0.0550, -0.1436, 0.1903], 0.1837, true),
    ("brow.B.R.001", Some("brow.B.R"), [-0.0704, -0.1349, 0.1983], [-0.0577, -0.1427, 0.2007], -0.1269, true),
    ("lid.T.R.001", Some("lid.T.R"), [-0.0678, -0.1356, 0.1876], [-0.0550, -0.1436, 0.1903], -0.1837, true),
    ("jaw.L", Some("temple.L"), [0.0881, -0.0611, 0.1569], [0.0764, -0.0689, 0.0856], -0.1138, true),
    ("jaw.R", Some("temple.R"), [-0.0881, -0.0611, 0.1569], [-0.0764, -0.0689, 0.0856], 0.1138, true),
    ("cheek.T.L.001", Some("cheek.T.L"), [0.0565, -0.1430, 0.1398], [0.0188, -0.1448, 0.1703], 0.1387, true),
    ("cheek.T.R.001", Some("cheek.T.R"), [-0.0565, -0.1430, 0.1398], [-0.0188, -0.1448, 0.1703], -0.1387, true),
    ("tongue.001", Some("tongue"), [0.0000, -0.1101, 0.0883], [0.0000, -0.0761, 0.0830], 0.0000, true),
    ("ear.R.001", Some("ear.R"), [-0.0989, -0.0295, 0.1898], [-0.1200, -0.0026, 0.1955], -0.0656, true),
    ("nose.002", Some("nose.001"), [0.0000, -0.1965, 0.1331], [0.0000, -0.1722, 0.1201], 0.0000, true),
    ("chin.001", Some("chin"), [0.0000, -0.1634, 0.0573], [0.0000, -0.1599, 0.0790], 0.0000, true),
    ("ear.L.002", Some("ear.L.001"), [0.1200, -0.0026, 0.1955], [0.1044, -0.0190, 0.1427], 0.2876, true),
    ("brow.B.L.002", Some("brow.B.L.001"), [0.0577, -0.1427, 0.2007], [0.0388, -0.1418, 0.1975], 0.0436, true),
    ("lid.T.L.002", Some("lid.T.L.001"), [0.0550, -0.1436, 0.1903], [0.0383, -0.1449, 0.1868], -0.0320, true),
    ("brow.B.R.002", Some("brow.B.R.001"), [-0.0577, -0.1427, 0.2007], [-0.0388, -0.1418, 0.1975], -0.0436, true),
    ("lid.T.R.002", Some("lid.T.R.001"), [-0.0550, -0.1436, 0.1903], [-0.0383, -0.1449, 0.1868], 0.0320, true),
    ("jaw.L.001", Some("jaw.L"), [0.0764, -0.0689, 0.0856], [0.0387, -0.1315, 0.0417], 0.0793, true),
    ("jaw.R.001", Some("jaw.R"), [-0.0764, -0.0689, 0.0856], [-0.0387, -0.1315, 0.0417], -0.0793, true),
    ("nose.L", Some("cheek.T.L.001"), [0.0188, -0.1448, 0.1703], [0.0176, -0.1627, 0.1310], 0.0997, true),
    ("nose.R", Some("cheek.T.R.001"), [-0.0188, -0.1448, 0.1703], [-0.0176, -0.1627, 0.1310], -0.0997, true),
    ("tongue.002", Some("tongue.001"), [0.0000, -0.0761, 0.0830], [0.0000, -0.0538, 0.0554], 0.0000, true),
    ("ear.R.002", Some("ear.R.001"), [-0.1200, -0.0026, 0.1955], [-0.1044, -0.0190, 0.1427], -0.2876, true),
    ("nose.003", Some("nose.002"), [0.0000, -0.1722, 0.1201], [0.0000, -0.1706, 0.1069], 0.0000, true),
    ("ear.L.003", Some("ear.L.002"), [0.1044, -0.0190, 0.1427], [0.0919, -0.0309, 0.1503], 1.7681, true),
    ("brow.B.L.003", Some("brow.B.L.002"), [0.0388, -0.1418, 0.1975], [0.0221, -0.1397, 0.1860], 0.1555, true),
    ("lid.T.L.003", Some("lid.T.L.002"), [0.0383, -0.1449, 0.1868], [0.0262, -0.1418, 0.1772], 0.0895, true),
    ("brow.B.R.003", Some("brow.B.R.002"), [-0.0388, -0.1418, 0.1975], [-0.0221, -0.1397, 0.1860], -0.1555, true),
    ("lid.T.R.003", Some("lid.T.R.002"), [-0.0383, -0.1449, 0.1868], [-0.0262, -0.1418, 0.1772], -0.0895, true),
    ("chin.L", Some("jaw.L.001"), [0.0387, -0.1315, 0.0417], [0.0352, -0.1494, 0.0955], -0.2078, true),
    ("chin.R", Some("jaw.R.001"), [-0.0387, -0.1315, 0.0417], [-0.0352, -0.1494, 0.0955], 0.2078, true),
    ("nose.L.001", Some("nose.L"), [0.0176, -0.1627, 0.1310], [0.0000, -0.1965, 0.1331], 0.1070, true),
    ("nose.R.001", Some("nose.R"), [-0.0176, -0.1627, 0.1310], [0.0000, -0.1965, 0.1331], -0.1070, true),
    ("ear.R.003", Some("ear.R.002"), [-0.1044, -0.0190, 0.1427], [-0.0919, -0.0309, 0.1503], -1.7681, true),
    ("lid.B.L", Some("lid.T.L.003"), [0.0262, -0.1418, 0.1772], [0.0393, -0.1425, 0.1735], 0.0756, true),
    ("lid.B.R", Some("lid.T.R.003"), [-0.0262, -0.1418, 0.1772], [-0.0393, -0.1425, 0.1735], -0.0756, true),
    ("cheek.B.L", Some("chin.L"), [0.0352, -0.1494, 0.0955], [0.0736, -0.1216, 0.1124], 0.0015, true),
    ("cheek.B.R", Some("chin.R"), [-0.0352, -0.1494, 0.0955], [-0.0736, -0.1216, 0.1124], -0.0015, true),
    ("lid.B.L.001", Some("lid.B.L"), [0.0393, -0.1425, 0.1735], [0.0553, -0.1418, 0.1714], 0.1015, true),
    ("lid.B.R.001", Some("lid.B.R"), [-0.0393, -0.1425, 0.1735], [-0.0553, -0.1418, 0.1714], -0.1015, true),
    ("cheek.B.L.001", Some("cheek.B.L"), [0.0736, -0.1216, 0.1124], [0.0848, -0.0940, 0.1751], 0.0000, true),
    ("cheek.B.R.001", Some("cheek.B.R"), [-0.0736, -0.1216, 0.1124], [-0.0848, -0.0940, 0.1751], 0.0000, true),
    ("lid.B.L.002", Some("lid.B.L.001"), [0.0553, -0.1418, 0.1714], [0.0694, -0.1351, 0.1770], -0.0748, true),
    ("lid.B.R.002", Some("lid.B.R.001"), [-0.0553, -0.1418, 0.1714], [-0.0694, -0.1351, 0.1770], 0.0748, true),
    ("brow.T.L", Some("cheek.B.L.001"), [0.0848, -0.0940, 0.1751], [0.0830, -0.1213, 0.2045], 0.1990, true),
    ("brow.T.R", Some("cheek.B.R.001"), [-0.0848, -0.0940, 0.1751], [-0.0830, -0.1213, 0.2045], -0.1990, true),
    ("lid.B.L.003", Some("lid.B.L.002"), [0.0694, -0.1351, 0.1770], [0.0768, -0.1218, 0.1828], -0.0085, true),
    ("lid.B.R.003", Some("lid.B.R.002"), [-0.0694, -0.1351, 0.1770], [-0.0768, -0.1218, 0.1828], 0.0085, true),
    ("brow.T.L.001", Some("brow.T.L"), [0.0830, -0.1213, 0.2045], [0.0588, -0.1450, 0.2164], 0.3974, true),
    ("brow.T.R.001", Some("brow.T.R"), [-0.0830, -0.1213, 0.2045], [-0.0588, -0.1450, 0.2164], -0.3974, true),
    ("brow.T.L.002", Some("brow.T.L.001"), [0.0588, -0.1450, 0.2164], [0.0215, -0.1586, 0.2062], 0.0995, true),
    ("brow.T.R.002", Some("brow.T.R.001"), [-0.0588, -0.1450, 0.2164], [-0.0215, -0.1586, 0.2062], -0.0995, true),
    ("brow.T.L.003", Some("brow.T.L.002"), [0.0215, -0.1586, 0.2062], [0.0000, -0.1576, 0.1913], 0.0065, true),
    ("brow.T.R.003", Some("brow.T.R.002"), [-0.0215, -0.1586, 0.2062], [0.0000, -0.1576, 0.1913], -0.0065, true),
];

/// A full face rooted at `head`, tagged `face` with default parameters.
pub fn sample() -> Metarig {
    let mut metarig = Metarig::new("metarig");
    for &(name, parent, head, tail, roll, connected) in BONES {
        let mut bone = Bone::new(name, head, tail).with_roll(roll).with_connect(connected);
        if let Some(parent) = parent {
            bone = bone.with_parent(parent);
        } else {
            bone = bone.with_rig_type(RIG_TYPE);
        }
        metarig = metarig.with_bone(bone);
    }
    metarig
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_a_single_tree() {
        let metarig = sample();
        assert_eq!(metarig.bones.len(), BONES.len());
        let roots: Vec<&str> = metarig
            .bones
            .iter()
            .filter(|b| b.parent.is_none())
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(roots, vec!["head"]);
    }
}
