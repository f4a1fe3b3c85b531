//! Structured control-panel description and its text rendering.
//!
//! Every rig instance contributes a [`UiFragment`]: ordered sections of
//! sliders and operator buttons, each section shown only while one of its
//! listed bones is selected. The orchestrator collects the fragments, the
//! operators of the rig types in use and the layer toggles into a [`RigUi`],
//! which renders to the text script stored with the rig.

use std::collections::BTreeMap;
use std::fmt::Write;

use gamerig_spec::{LayerInfo, LayerMask, MCH_LAYER};
use serde::{Deserialize, Serialize};

use crate::snap::{operator_id, OperatorDecl};

/// Toggles per layer-panel row.
pub const LAYER_ROW_WIDTH: usize = 4;

/// Value passed to an operator argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperatorArg {
    Bone(String),
    Bones(Vec<String>),
}

/// One control in a panel section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiItem {
    /// Slider bound to a custom property.
    Property {
        bone: String,
        property: String,
        label: String,
    },
    /// Button invoking a snap operator by short name.
    Operator {
        operator: String,
        label: String,
        arguments: BTreeMap<String, OperatorArg>,
    },
}

impl UiItem {
    pub fn property(bone: &str, property: &str, label: impl Into<String>) -> Self {
        UiItem::Property {
            bone: bone.to_string(),
            property: property.to_string(),
            label: label.into(),
        }
    }

    pub fn operator(
        operator: &str,
        label: impl Into<String>,
        arguments: impl IntoIterator<Item = (&'static str, OperatorArg)>,
    ) -> Self {
        UiItem::Operator {
            operator: operator.to_string(),
            label: label.into(),
            arguments: arguments
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

/// Items shown while any of `visible_when_selected` is selected.
///
/// An empty list means always visible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSection {
    pub visible_when_selected: Vec<String>,
    pub items: Vec<UiItem>,
}

impl UiSection {
    pub fn when_selected<S: AsRef<str>>(bones: &[S]) -> Self {
        Self {
            visible_when_selected: bones.iter().map(|b| b.as_ref().to_string()).collect(),
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: UiItem) -> Self {
        self.items.push(item);
        self
    }

    /// Whether the section shows for the given selection.
    pub fn is_visible<S: AsRef<str>>(&self, selected: &[S]) -> bool {
        self.visible_when_selected.is_empty()
            || selected
                .iter()
                .any(|s| self.visible_when_selected.iter().any(|b| b == s.as_ref()))
    }
}

/// UI contribution of one rig instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiFragment {
    pub rig_type: String,
    pub base_bone: String,
    pub sections: Vec<UiSection>,
}

impl UiFragment {
    pub fn new(rig_type: &str, base_bone: &str) -> Self {
        Self {
            rig_type: rig_type.to_string(),
            base_bone: base_bone.to_string(),
            sections: Vec::new(),
        }
    }

    /// Appends `section` unless it has no items.
    pub fn push(&mut self, section: UiSection) {
        if !section.items.is_empty() {
            self.sections.push(section);
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &UiItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }
}

/// A layer visibility toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerToggle {
    pub index: usize,
    pub name: String,
}

/// Toggles for the visible control layers, grouped by authored row.
///
/// Layers without metadata count as unnamed and sit in row 1. Rows are
/// ordered by row number and split after [`LAYER_ROW_WIDTH`] toggles.
pub fn layer_rows(visible: &LayerMask, layers: &[LayerInfo]) -> Vec<Vec<LayerToggle>> {
    let mut rows: BTreeMap<u32, Vec<LayerToggle>> = BTreeMap::new();
    for index in visible.active().filter(|&i| i < MCH_LAYER) {
        let (name, row) = layers
            .get(index)
            .map_or((String::new(), 1), |info| (info.name.clone(), info.row));
        rows.entry(row).or_default().push(LayerToggle { index, name });
    }
    rows.into_values()
        .flat_map(|row| {
            row.chunks(LAYER_ROW_WIDTH)
                .map(<[LayerToggle]>::to_vec)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Complete control-panel description of a generated rig.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RigUi {
    pub rig_id: String,
    pub script_name: String,
    #[serde(serialize_with = "serialize_operators")]
    pub operators: Vec<OperatorDecl>,
    pub fragments: Vec<UiFragment>,
    pub layer_rows: Vec<Vec<LayerToggle>>,
}

fn serialize_operators<S: serde::Serializer>(
    operators: &[OperatorDecl],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(Some(operators.len()))?;
    for op in operators {
        seq.serialize_element(&serde_json::json!({
            "name": op.name,
            "label": op.label,
            "arguments": op.arguments,
        }))?;
    }
    seq.end()
}

/// Name of the text script for a rig identifier.
pub fn script_name(rig_id: &str) -> String {
    format!("gamerig_ui_{}", rig_id)
}

impl RigUi {
    pub fn new(rig_id: &str) -> Self {
        Self {
            rig_id: rig_id.to_string(),
            script_name: script_name(rig_id),
            ..Self::default()
        }
    }

    /// Registers an operator once, keeping first-seen order.
    pub fn add_operator(&mut self, decl: OperatorDecl) {
        if !self.operators.iter().any(|d| d.name == decl.name) {
            self.operators.push(decl);
        }
    }

    /// Items visible for a selection, in panel order.
    pub fn visible_items<S: AsRef<str>>(&self, selected: &[S]) -> Vec<&UiItem> {
        self.fragments
            .iter()
            .flat_map(|f| f.sections.iter())
            .filter(|s| s.is_visible(selected))
            .flat_map(|s| s.items.iter())
            .collect()
    }

    /// Renders the panel as a text script.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.script_name);
        let _ = writeln!(out, "rig_id = \"{}\"", self.rig_id);

        if !self.operators.is_empty() {
            out.push('\n');
        }
        for op in &self.operators {
            let _ = writeln!(
                out,
                "operator {} \"{}\" ({})",
                operator_id(op.name, &self.rig_id),
                op.label,
                op.arguments.join(", ")
            );
        }

        out.push_str("\npanel \"Rig Main Properties\"\n");
        for fragment in &self.fragments {
            let _ = writeln!(out, "  # {}: {}", fragment.rig_type, fragment.base_bone);
            for section in &fragment.sections {
                let indent = if section.visible_when_selected.is_empty() {
                    "  "
                } else {
                    let _ = writeln!(
                        out,
                        "  when selected [{}]",
                        quoted_list(&section.visible_when_selected)
                    );
                    "    "
                };
                for item in &section.items {
                    self.render_item(&mut out, indent, item);
                }
                if !section.visible_when_selected.is_empty() {
                    out.push_str("  end\n");
                }
            }
        }
        out.push_str("end\n");

        out.push_str("\npanel \"Rig Layers\"\n");
        for row in &self.layer_rows {
            let toggles: Vec<String> = row
                .iter()
                .map(|t| format!("\"{}\" [{}]", t.name, t.index))
                .collect();
            let _ = writeln!(out, "  row {}", toggles.join(" "));
        }
        out.push_str("end\n");
        out
    }

    fn render_item(&self, out: &mut String, indent: &str, item: &UiItem) {
        match item {
            UiItem::Property {
                bone,
                property,
                label,
            } => {
                let _ = writeln!(
                    out,
                    "{}slider pose.bones[\"{}\"][\"{}\"] \"{}\"",
                    indent, bone, property, label
                );
            }
            UiItem::Operator {
                operator,
                label,
                arguments,
            } => {
                let args: Vec<String> = arguments
                    .iter()
                    .map(|(k, v)| match v {
                        OperatorArg::Bone(b) => format!("{}=\"{}\"", k, b),
                        OperatorArg::Bones(bs) => format!("{}=[{}]", k, quoted_list(bs)),
                    })
                    .collect();
                let _ = writeln!(
                    out,
                    "{}button {} \"{}\" {}",
                    indent,
                    operator_id(operator, &self.rig_id),
                    label,
                    args.join(" ")
                );
            }
        }
    }
}

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("\"{}\"", i))
        .collect::<Vec<_>>()
        .join(", ")
}
