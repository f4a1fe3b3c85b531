//! Widget shapes for control bones.
//!
//! A widget is a small wireframe mesh displayed in place of a control bone.
//! Meshes are expressed in bone space with the bone's Y axis pointing from
//! head to tail and unit length, so the host scales them by bone length.
//!
//! Widgets are created at most once per bone in a generation run; asking
//! for the same bone twice returns `None` the second time.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use gamerig_spec::Vec3;
use serde::{Deserialize, Serialize};

/// Prefix of every widget object name.
pub const WIDGET_PREFIX: &str = "WGT-";

/// Named shape builders available to rig types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetShape {
    Sphere,
    Cube,
    Limb,
    IkArrow,
    /// Circle around the bone at `head_tail`, with a direction tick.
    /// A negative radius mirrors the circle across the bone's XZ plane.
    DirectedCircle {
        radius: f64,
        head_tail: f64,
    },
    Face {
        size: f64,
    },
    Eye,
    Eyes,
    Ear,
    Jaw,
    Square {
        size: f64,
    },
    Hand,
    /// Box centred on the bone head with a tick marking the front.
    Torso,
}

/// Wireframe geometry of a widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetMesh {
    pub verts: Vec<Vec3>,
    pub edges: Vec<(usize, usize)>,
}

impl WidgetMesh {
    fn push_loop(&mut self, points: impl IntoIterator<Item = Vec3>) {
        let start = self.verts.len();
        self.verts.extend(points);
        let count = self.verts.len() - start;
        for i in 0..count {
            self.edges.push((start + i, start + (i + 1) % count));
        }
    }

    fn push_line(&mut self, a: Vec3, b: Vec3) {
        let start = self.verts.len();
        self.verts.push(a);
        self.verts.push(b);
        self.edges.push((start, start + 1));
    }
}

/// A created widget bound to one bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub name: String,
    pub bone: String,
    pub shape: WidgetShape,
    pub mesh: WidgetMesh,
}

/// Per-run widget cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetLibrary {
    rig_name: String,
    widgets: BTreeMap<String, Widget>,
}

impl WidgetLibrary {
    pub fn new(rig_name: impl Into<String>) -> Self {
        Self {
            rig_name: rig_name.into(),
            widgets: BTreeMap::new(),
        }
    }

    /// Object name of the widget for `bone`.
    pub fn widget_name(&self, bone: &str) -> String {
        format!("{}{}_{}", WIDGET_PREFIX, self.rig_name, bone)
    }

    /// Reserves the widget for `bone`.
    ///
    /// Returns `None` when this run already created one for the bone.
    pub fn create_widget(&mut self, bone: &str) -> Option<&mut Widget> {
        if self.widgets.contains_key(bone) {
            return None;
        }
        let widget = Widget {
            name: self.widget_name(bone),
            bone: bone.to_string(),
            shape: WidgetShape::Sphere,
            mesh: WidgetMesh::default(),
        };
        Some(self.widgets.entry(bone.to_string()).or_insert(widget))
    }

    /// Creates the widget for `bone` with the given shape.
    ///
    /// Returns the widget name, or `None` if the bone already has one.
    pub fn build(&mut self, bone: &str, shape: WidgetShape) -> Option<String> {
        let widget = self.create_widget(bone)?;
        widget.shape = shape;
        widget.mesh = shape.mesh();
        Some(widget.name.clone())
    }

    pub fn get(&self, bone: &str) -> Option<&Widget> {
        self.widgets.get(bone)
    }

    /// Widgets keyed by bone name.
    pub fn widgets(&self) -> impl Iterator<Item = &Widget> {
        self.widgets.values()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Consumes the library, returning all widgets in bone-name order.
    pub fn into_widgets(self) -> Vec<Widget> {
        self.widgets.into_values().collect()
    }
}

// =============================================================================
// Shape builders
// =============================================================================

fn circle(radius: f64, y: f64, segments: usize) -> impl Iterator<Item = Vec3> {
    (0..segments).map(move |i| {
        let a = TAU * i as f64 / segments as f64;
        [radius * a.cos(), y, radius * a.sin()]
    })
}

impl WidgetShape {
    /// Builds the wireframe for this shape.
    pub fn mesh(&self) -> WidgetMesh {
        let mut mesh = WidgetMesh::default();
        match *self {
            WidgetShape::Sphere => {
                for i in 0..3 {
                    let ring = circle(0.5, 0.0, 16).map(|[x, y, z]| match i {
                        0 => [x, y, z],
                        1 => [x, z, y],
                        _ => [y, x, z],
                    });
                    mesh.push_loop(ring);
                }
            }
            WidgetShape::Cube => {
                let h = 0.5;
                mesh.verts = vec![
                    [-h, 0.0, -h],
                    [h, 0.0, -h],
                    [h, 0.0, h],
                    [-h, 0.0, h],
                    [-h, 1.0, -h],
                    [h, 1.0, -h],
                    [h, 1.0, h],
                    [-h, 1.0, h],
                ];
                mesh.edges = vec![
                    (0, 1),
                    (1, 2),
                    (2, 3),
                    (3, 0),
                    (4, 5),
                    (5, 6),
                    (6, 7),
                    (7, 4),
                    (0, 4),
                    (1, 5),
                    (2, 6),
                    (3, 7),
                ];
            }
            WidgetShape::Limb => {
                mesh.push_line([0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
                mesh.push_loop(circle(0.1, 0.5, 12));
            }
            WidgetShape::IkArrow => {
                mesh.push_loop([
                    [0.1, 0.0, 0.0],
                    [0.1, 0.8, 0.0],
                    [0.25, 0.8, 0.0],
                    [0.0, 1.0, 0.0],
                    [-0.25, 0.8, 0.0],
                    [-0.1, 0.8, 0.0],
                    [-0.1, 0.0, 0.0],
                ]);
            }
            WidgetShape::DirectedCircle { radius, head_tail } => {
                mesh.push_loop(circle(radius.abs(), head_tail, 24).map(|[x, y, z]| {
                    [x, y, z * radius.signum()]
                }));
                let tip = [0.0, head_tail, radius * 1.2];
                mesh.push_line([0.0, head_tail, radius], tip);
            }
            WidgetShape::Face { size } => {
                let r = 0.1 * size;
                mesh.push_loop([[0.0, 0.0, r], [r, 0.0, 0.0], [0.0, 0.0, -r], [-r, 0.0, 0.0]]);
            }
            WidgetShape::Eye => {
                mesh.push_loop(circle(0.35, 0.0, 16));
            }
            WidgetShape::Eyes => {
                mesh.push_loop(circle(0.35, 0.0, 16).map(|[x, y, z]| [x - 0.6, y, z]));
                mesh.push_loop(circle(0.35, 0.0, 16).map(|[x, y, z]| [x + 0.6, y, z]));
                mesh.push_loop([[-1.1, 0.0, 0.5], [1.1, 0.0, 0.5], [1.1, 0.0, -0.5], [-1.1, 0.0, -0.5]]);
            }
            WidgetShape::Ear => {
                mesh.push_loop([[0.0, 0.0, 0.0], [0.3, 0.6, 0.0], [0.1, 1.0, 0.0], [-0.1, 0.6, 0.0]]);
            }
            WidgetShape::Jaw => {
                mesh.push_loop([
                    [-0.6, 0.0, 0.0],
                    [-0.5, 0.8, 0.0],
                    [0.0, 1.0, 0.0],
                    [0.5, 0.8, 0.0],
                    [0.6, 0.0, 0.0],
                ]);
            }
            WidgetShape::Square { size } => {
                let h = 0.5 * size;
                mesh.verts = vec![[h, 0.0, h], [-h, 0.0, h], [h, 0.0, -h], [-h, 0.0, -h]];
                mesh.edges = vec![(0, 1), (2, 3), (0, 2), (3, 1)];
            }
            WidgetShape::Hand => {
                mesh.push_loop([
                    [-0.3, 0.0, 0.0],
                    [0.3, 0.0, 0.0],
                    [0.4, 1.0, 0.0],
                    [-0.4, 1.0, 0.0],
                ]);
                mesh.push_line([-0.4, 0.0, 0.0], [-0.7, 0.4, 0.0]);
            }
            WidgetShape::Torso => {
                let h = 0.5;
                mesh.push_loop([[h, h, h], [h, -h, h], [-h, -h, h], [-h, h, h]]);
                mesh.push_loop([[h, h, -h], [h, -h, -h], [-h, -h, -h], [-h, h, -h]]);
                for i in 0..4 {
                    mesh.edges.push((i, i + 4));
                }
                mesh.push_loop([[-0.0495, -0.542, 0.4719], [0.0471, -0.542, 0.4719], [0.0, -0.6, 0.4719]]);
            }
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_widget_created_once_per_bone() {
        let mut lib = WidgetLibrary::new("rig");
        assert_eq!(
            lib.build("hand_ik.L", WidgetShape::Hand).as_deref(),
            Some("WGT-rig_hand_ik.L")
        );
        assert_eq!(lib.build("hand_ik.L", WidgetShape::Cube), None);
        assert_eq!(lib.get("hand_ik.L").unwrap().shape, WidgetShape::Hand);
        assert_eq!(lib.len(), 1);
    }

    #[test]
    fn test_square_mesh() {
        let mesh = WidgetShape::Square { size: 2.0 }.mesh();
        assert_eq!(
            mesh.verts,
            vec![[1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [1.0, 0.0, -1.0], [-1.0, 0.0, -1.0]]
        );
        assert_eq!(mesh.edges, vec![(0, 1), (2, 3), (0, 2), (3, 1)]);
    }

    #[test]
    fn test_meshes_are_well_formed() {
        let shapes = [
            WidgetShape::Sphere,
            WidgetShape::Cube,
            WidgetShape::Limb,
            WidgetShape::IkArrow,
            WidgetShape::DirectedCircle {
                radius: -0.4,
                head_tail: 0.5,
            },
            WidgetShape::Face { size: 1.5 },
            WidgetShape::Eye,
            WidgetShape::Eyes,
            WidgetShape::Ear,
            WidgetShape::Jaw,
            WidgetShape::Square { size: 1.0 },
            WidgetShape::Hand,
            WidgetShape::Torso,
        ];
        for shape in shapes {
            let mesh = shape.mesh();
            assert!(!mesh.edges.is_empty(), "{:?}", shape);
            for &(a, b) in &mesh.edges {
                assert!(a < mesh.verts.len() && b < mesh.verts.len(), "{:?}", shape);
            }
        }
    }
}
