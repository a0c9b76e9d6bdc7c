//! Property editors: the inspector rows a descriptor offers for a node, and
//! the commit path that writes an edited value back into the node.

use crate::model::{Design, NodeId, Size, TextStyle, Value};
use crate::registry::Registry;
use crate::registry::layouts::{EMPTY_SLOT, MAX_COUNT, ParamKind};
use crate::registry::widgets::{FieldSpec, FieldType};
use crate::resource::ResourceTable;
use chrono::NaiveDate;
use tracing::debug;

const NO_ICON: &str = "(none)";
const MAX_ROWS: i64 = MAX_COUNT as i64;

/// What an editor writes to when committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum EditTarget {
    Name,
    Field(&'static str),
    /// Number of rows of a record-list field.
    RowCount(&'static str),
    RowField {
        field: &'static str,
        row: usize,
        sub: &'static str,
    },
    Layout,
    LayoutParam(&'static str),
}

/// Input control to present, with its current value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Control {
    Text { value: String, multiline: bool },
    Toggle(bool),
    Integer { value: i64, min: i64, max: i64 },
    Float { value: f64, min: f64, max: f64 },
    Choice { options: Vec<String>, selected: usize },
    Lines(Vec<String>),
    Style(TextStyle),
    Size(Size),
    Date(NaiveDate),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum EditValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Choice(usize),
    Lines(Vec<String>),
    Style(TextStyle),
    Size(Size),
    Date(NaiveDate),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PropertyEditor {
    pub(crate) label: String,
    pub(crate) hint: String,
    pub(crate) control: Control,
    pub(crate) target: EditTarget,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum EditError {
    #[error("node no longer exists")]
    StaleNode,
    #[error("{kind} has no editable property `{name}`")]
    UnknownProperty { kind: String, name: String },
    #[error("value for `{0}` has the wrong type")]
    Mismatch(String),
    #[error("row {row} of `{field}` does not exist")]
    NoSuchRow { field: String, row: usize },
    #[error("unknown layout `{0}`")]
    UnknownLayout(String),
}

fn icon_options(icons: &ResourceTable) -> Vec<String> {
    std::iter::once(NO_ICON)
        .chain(icons.names())
        .map(str::to_owned)
        .collect()
}

/// Control for one field, or `None` if the field is not edited directly.
fn control_for(spec: &FieldSpec, value: &Value, icons: &ResourceTable) -> Option<Control> {
    let control = match (&spec.ty, value) {
        (FieldType::Bool, Value::Bool(b)) => Control::Toggle(*b),
        (FieldType::Int { min, max }, Value::Int(i)) => Control::Integer {
            value: *i,
            min: *min,
            max: *max,
        },
        (FieldType::Float { min, max }, Value::Float(f)) => Control::Float {
            value: *f,
            min: *min,
            max: *max,
        },
        (FieldType::Text { multiline }, Value::Text(s)) => Control::Text {
            value: s.clone(),
            multiline: *multiline,
        },
        (FieldType::Enum(labels), Value::Enum(i)) => Control::Choice {
            options: labels.iter().map(|l| l.to_string()).collect(),
            selected: usize::try_from(*i).unwrap_or(0).min(labels.len().saturating_sub(1)),
        },
        (FieldType::Style, Value::Style(s)) => Control::Style(*s),
        (FieldType::Icon, Value::Icon(icon)) => {
            let options = icon_options(icons);
            let selected = icon
                .map(|h| icons.name_of(h))
                .and_then(|name| options.iter().position(|o| o == name))
                .unwrap_or(0);
            Control::Choice { options, selected }
        }
        (FieldType::Strings, Value::Strings(items)) => Control::Lines(items.clone()),
        (FieldType::Size, Value::Size(s)) => Control::Size(*s),
        (FieldType::Date, Value::Date(d)) => Control::Date(*d),
        _ => return None,
    };
    Some(control)
}

/// Converts an edited value into a field value of the declared type.
fn value_for(spec: &FieldSpec, edit: EditValue, icons: &ResourceTable) -> Result<Value, EditError> {
    let value = match (&spec.ty, edit) {
        (FieldType::Bool, EditValue::Bool(b)) => Value::Bool(b),
        (FieldType::Int { min, max }, EditValue::Int(i)) => Value::Int(i.clamp(*min, *max)),
        (FieldType::Float { min, max }, EditValue::Float(f)) => Value::Float(f.clamp(*min, *max)),
        (FieldType::Text { .. }, EditValue::Text(s)) => Value::Text(s),
        (FieldType::Enum(labels), EditValue::Choice(i)) if i < labels.len() => {
            Value::Enum(i as i64)
        }
        (FieldType::Style, EditValue::Style(s)) => Value::Style(s),
        (FieldType::Icon, EditValue::Choice(0)) => Value::Icon(None),
        (FieldType::Icon, EditValue::Choice(i)) => {
            let name = icons
                .names()
                .nth(i - 1)
                .ok_or_else(|| EditError::Mismatch(spec.name.to_owned()))?;
            Value::Icon(icons.resolve(name))
        }
        (FieldType::Strings, EditValue::Lines(items)) => Value::Strings(items),
        (FieldType::Size, EditValue::Size(s)) => Value::Size(s),
        (FieldType::Date, EditValue::Date(d)) => Value::Date(d),
        _ => return Err(EditError::Mismatch(spec.name.to_owned())),
    };
    Ok(value)
}

impl Registry {
    /// One editor per user-editable property of `id`, in declaration order,
    /// followed by the layout editors of containers.
    pub(crate) fn property_editors(
        &self,
        design: &Design,
        icons: &ResourceTable,
        id: NodeId,
    ) -> Vec<PropertyEditor> {
        let Some(node) = design.get(id) else {
            return Vec::new();
        };
        let mut out = vec![PropertyEditor {
            label: "Name".into(),
            hint: "Stable name; shared in generated code when reused".into(),
            control: Control::Text {
                value: design.name(id).unwrap_or_default().to_owned(),
                multiline: false,
            },
            target: EditTarget::Name,
        }];

        if let Some(desc) = self.lookup(&node.kind) {
            for spec in &desc.fields {
                let Some(value) = node.fields.get(spec.name) else {
                    continue;
                };
                if let (FieldType::Records(row_specs), Value::Records(rows)) = (&spec.ty, value) {
                    out.push(PropertyEditor {
                        label: format!("{} count", spec.name),
                        hint: spec.hint.into(),
                        control: Control::Integer {
                            value: rows.len() as i64,
                            min: 0,
                            max: MAX_ROWS,
                        },
                        target: EditTarget::RowCount(spec.name),
                    });
                    for (row, fields) in rows.iter().enumerate() {
                        for sub in row_specs {
                            let Some(v) = fields.get(sub.name) else {
                                continue;
                            };
                            if let Some(control) = control_for(sub, v, icons) {
                                out.push(PropertyEditor {
                                    label: format!("{} {} {}", spec.name, row + 1, sub.name),
                                    hint: sub.hint.into(),
                                    control,
                                    target: EditTarget::RowField {
                                        field: spec.name,
                                        row,
                                        sub: sub.name,
                                    },
                                });
                            }
                        }
                    }
                    continue;
                }
                if let Some(control) = control_for(spec, value, icons) {
                    out.push(PropertyEditor {
                        label: spec.name.into(),
                        hint: spec.hint.into(),
                        control,
                        target: EditTarget::Field(spec.name),
                    });
                }
            }
        }

        if let Some(body) = &node.container {
            let current = self.layout_descriptor_for(design, id);
            let names: Vec<String> = self.layouts().map(|l| l.name.to_owned()).collect();
            let selected = current
                .and_then(|c| names.iter().position(|n| n == c.name))
                .unwrap_or(0);
            out.push(PropertyEditor {
                label: "Layout".into(),
                hint: String::new(),
                control: Control::Choice {
                    options: names,
                    selected,
                },
                target: EditTarget::Layout,
            });
            if let Some(layout) = current {
                let params = self.layout_params(design, id);
                let mut slot_options = vec![EMPTY_SLOT.to_owned()];
                slot_options.extend(body.children.iter().map(|c| self.display_label(design, *c)));
                for spec in layout.params {
                    let raw = params.get(spec.name).map(String::as_str).unwrap_or(spec.default);
                    let control = match spec.kind {
                        ParamKind::Count => Control::Integer {
                            value: raw.trim().parse().unwrap_or(1),
                            min: 1,
                            max: MAX_ROWS,
                        },
                        ParamKind::Number => Control::Float {
                            value: raw.trim().parse().unwrap_or(100.0),
                            min: 1.0,
                            max: 2000.0,
                        },
                        ParamKind::Choice(options) => Control::Choice {
                            options: options.iter().map(|o| o.to_string()).collect(),
                            selected: options.iter().position(|o| *o == raw).unwrap_or(0),
                        },
                        ParamKind::Slot => Control::Choice {
                            options: slot_options.clone(),
                            selected: raw
                                .trim()
                                .parse::<usize>()
                                .ok()
                                .filter(|i| *i < body.children.len())
                                .map(|i| i + 1)
                                .unwrap_or(0),
                        },
                    };
                    out.push(PropertyEditor {
                        label: spec.name.into(),
                        hint: String::new(),
                        control,
                        target: EditTarget::LayoutParam(spec.name),
                    });
                }
            }
        }
        out
    }

    /// Writes an edited value into the node. The change is applied before
    /// this returns; the caller repaints.
    pub(crate) fn commit(
        &self,
        design: &mut Design,
        icons: &ResourceTable,
        id: NodeId,
        target: &EditTarget,
        value: EditValue,
    ) -> Result<(), EditError> {
        let kind = design.get(id).ok_or(EditError::StaleNode)?.kind.clone();
        debug!(%kind, ?target, "commit property");
        let unknown = |name: &str| EditError::UnknownProperty {
            kind: kind.clone(),
            name: name.to_owned(),
        };
        match target {
            EditTarget::Name => match value {
                EditValue::Text(name) => {
                    design.set_name(id, Some(name.trim().to_owned()));
                    Ok(())
                }
                _ => Err(EditError::Mismatch("Name".into())),
            },
            EditTarget::Field(name) => {
                let spec = self
                    .lookup(&kind)
                    .and_then(|d| d.field(name))
                    .ok_or_else(|| unknown(*name))?;
                let value = value_for(spec, value, icons)?;
                let node = design.get_mut(id).ok_or(EditError::StaleNode)?;
                node.fields.set(spec.name, value);
                Ok(())
            }
            EditTarget::RowCount(name) => {
                let spec = self
                    .lookup(&kind)
                    .and_then(|d| d.field(name))
                    .ok_or_else(|| unknown(*name))?;
                let EditValue::Int(count) = value else {
                    return Err(EditError::Mismatch((*name).to_owned()));
                };
                let count = count.clamp(0, MAX_ROWS) as usize;
                let node = design.get_mut(id).ok_or(EditError::StaleNode)?;
                let mut rows = node.fields.records(name).to_vec();
                let dropped: Vec<NodeId> = rows
                    .iter()
                    .skip(count)
                    .flat_map(|row| row.nodes())
                    .collect();
                rows.truncate(count);
                while rows.len() < count {
                    rows.push(spec.default_row());
                }
                node.fields.set(spec.name, Value::Records(rows));
                for gone in dropped {
                    design.remove(gone);
                }
                Ok(())
            }
            EditTarget::RowField { field, row, sub } => {
                let sub_spec = self
                    .lookup(&kind)
                    .and_then(|d| d.field(field))
                    .and_then(|spec| match &spec.ty {
                        FieldType::Records(row_specs) => row_specs.iter().find(|s| s.name == *sub),
                        _ => None,
                    })
                    .ok_or_else(|| unknown(*sub))?;
                let value = value_for(sub_spec, value, icons)?;
                let node = design.get_mut(id).ok_or(EditError::StaleNode)?;
                match node.fields.get_mut(field) {
                    Some(Value::Records(rows)) if *row < rows.len() => {
                        rows[*row].set(sub_spec.name, value);
                        Ok(())
                    }
                    _ => Err(EditError::NoSuchRow {
                        field: (*field).to_owned(),
                        row: *row,
                    }),
                }
            }
            EditTarget::Layout => {
                let EditValue::Choice(i) = value else {
                    return Err(EditError::Mismatch("Layout".into()));
                };
                let name = self
                    .layouts()
                    .nth(i)
                    .map(|l| l.name)
                    .ok_or_else(|| EditError::UnknownLayout(i.to_string()))?;
                let stored = design.meta(id).map(|m| m.params.clone()).unwrap_or_default();
                if self.set_layout(design, id, name, &stored) {
                    Ok(())
                } else {
                    Err(unknown("Layout"))
                }
            }
            EditTarget::LayoutParam(param) => {
                let layout = self
                    .layout_descriptor_for(design, id)
                    .ok_or_else(|| unknown(*param))?;
                let spec = layout
                    .params
                    .iter()
                    .find(|p| p.name == *param)
                    .ok_or_else(|| unknown(*param))?;
                let raw = match (spec.kind, value) {
                    (ParamKind::Count, EditValue::Int(n)) => n.clamp(1, MAX_ROWS).to_string(),
                    (ParamKind::Number, EditValue::Float(f)) => f.clamp(1.0, 2000.0).to_string(),
                    (ParamKind::Choice(options), EditValue::Choice(i)) => options
                        .get(i)
                        .map(|o| o.to_string())
                        .ok_or_else(|| EditError::Mismatch((*param).to_owned()))?,
                    (ParamKind::Slot, EditValue::Choice(0)) => String::new(),
                    (ParamKind::Slot, EditValue::Choice(i)) => (i - 1).to_string(),
                    _ => return Err(EditError::Mismatch((*param).to_owned())),
                };
                // Every parameter is recomputed from the current editor state
                // and the strategy rebuilt; strategies are never patched.
                let mut params = self.layout_params(design, id);
                params.insert(spec.name.to_owned(), raw);
                let name = layout.name;
                if self.set_layout(design, id, name, &params) {
                    Ok(())
                } else {
                    Err(unknown(*param))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::layouts::LayoutStrategy;
    use pretty_assertions::assert_eq;

    fn setup() -> (Registry, ResourceTable, Design) {
        let icons = ResourceTable::builtin();
        (Registry::builtin(&icons), icons, Design::new())
    }

    fn editor<'a>(editors: &'a [PropertyEditor], target: &EditTarget) -> &'a PropertyEditor {
        editors
            .iter()
            .find(|e| &e.target == target)
            .expect("editor present")
    }

    #[test]
    fn test_label_editors_in_order() {
        let (registry, icons, mut design) = setup();
        let id = registry.create(&mut design, "Label").unwrap();
        let labels: Vec<_> = registry
            .property_editors(&design, &icons, id)
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(
            labels,
            ["Name", "Text", "Alignment", "Wrapping", "TextStyle", "Importance"]
        );
    }

    #[test]
    fn test_commit_updates_fields_synchronously() {
        let (registry, icons, mut design) = setup();
        let id = registry.create(&mut design, "Label").unwrap();
        registry
            .commit(&mut design, &icons, id, &EditTarget::Field("Text"), EditValue::Text("Hi".into()))
            .unwrap();
        registry
            .commit(&mut design, &icons, id, &EditTarget::Field("Alignment"), EditValue::Choice(1))
            .unwrap();
        let fields = &design.get(id).unwrap().fields;
        assert_eq!(fields.text("Text"), "Hi");
        assert_eq!(fields.get("Alignment"), Some(&Value::Enum(1)));
    }

    #[test]
    fn test_commit_rejects_wrong_value_kind() {
        let (registry, icons, mut design) = setup();
        let id = registry.create(&mut design, "Check").unwrap();
        let err = registry
            .commit(&mut design, &icons, id, &EditTarget::Field("Checked"), EditValue::Int(1))
            .unwrap_err();
        assert_eq!(err, EditError::Mismatch("Checked".into()));
        let err = registry
            .commit(&mut design, &icons, id, &EditTarget::Field("Nope"), EditValue::Bool(true))
            .unwrap_err();
        assert!(matches!(err, EditError::UnknownProperty { .. }));
    }

    #[test]
    fn test_icon_choice_round_trip() {
        let (registry, icons, mut design) = setup();
        let id = registry.create(&mut design, "Button").unwrap();
        let editors = registry.property_editors(&design, &icons, id);
        let Control::Choice { options, selected } = &editor(&editors, &EditTarget::Field("Icon")).control
        else {
            panic!("icon editor is a choice");
        };
        assert_eq!(*selected, 0);
        let home = options.iter().position(|o| o == "HomeIcon").unwrap();
        registry
            .commit(&mut design, &icons, id, &EditTarget::Field("Icon"), EditValue::Choice(home))
            .unwrap();
        assert_eq!(design.get(id).unwrap().fields.icon("Icon"), icons.resolve("HomeIcon"));
    }

    #[test]
    fn test_row_count_shrink_removes_nested_widgets() {
        let (registry, icons, mut design) = setup();
        let form = registry.create(&mut design, "Form").unwrap();
        let before = design.len();
        registry
            .commit(&mut design, &icons, form, &EditTarget::RowCount("Items"), EditValue::Int(1))
            .unwrap();
        assert_eq!(design.get(form).unwrap().fields.records("Items").len(), 1);
        assert_eq!(design.len(), before - 1);
        registry
            .commit(&mut design, &icons, form, &EditTarget::RowCount("Items"), EditValue::Int(3))
            .unwrap();
        let rows = design.get(form).unwrap().fields.records("Items");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].text("Text"), "Field");
        assert_eq!(rows[2].node("Widget"), None);
    }

    #[test]
    fn test_border_slot_selectors() {
        let (registry, icons, mut design) = setup();
        let root = registry.create(&mut design, "Container").unwrap();
        let a = registry.create(&mut design, "Label").unwrap();
        let b = registry.create(&mut design, "Button").unwrap();
        registry.add_child(&mut design, root, a);
        registry.add_child(&mut design, root, b);
        let border = registry.layouts().position(|l| l.name == "Border").unwrap();
        registry
            .commit(&mut design, &icons, root, &EditTarget::Layout, EditValue::Choice(border))
            .unwrap();

        let editors = registry.property_editors(&design, &icons, root);
        let Control::Choice { options, selected } =
            &editor(&editors, &EditTarget::LayoutParam("top")).control
        else {
            panic!("slot editor is a choice");
        };
        assert_eq!(options.len(), 3);
        assert_eq!(options[0], EMPTY_SLOT);
        assert_eq!(*selected, 0);

        registry
            .commit(&mut design, &icons, root, &EditTarget::LayoutParam("top"), EditValue::Choice(2))
            .unwrap();
        registry
            .commit(&mut design, &icons, root, &EditTarget::LayoutParam("left"), EditValue::Choice(1))
            .unwrap();
        let body = design.get(root).unwrap().container.as_ref().unwrap();
        let LayoutStrategy::Border(slots) = &body.layout else {
            panic!("border layout");
        };
        assert_eq!(slots.top, Some(b));
        assert_eq!(slots.left, Some(a));
        let params = &design.meta(root).unwrap().params;
        assert_eq!(params.get("top").map(String::as_str), Some("1"));
        assert_eq!(params.get("left").map(String::as_str), Some("0"));
        assert_eq!(params.get("bottom").map(String::as_str), Some(""));
    }

    #[test]
    fn test_grid_count_edit_rebuilds_strategy() {
        let (registry, icons, mut design) = setup();
        let root = registry.create(&mut design, "Container").unwrap();
        let grid = registry.layouts().position(|l| l.name == "Grid").unwrap();
        registry
            .commit(&mut design, &icons, root, &EditTarget::Layout, EditValue::Choice(grid))
            .unwrap();
        registry
            .commit(&mut design, &icons, root, &EditTarget::LayoutParam("count"), EditValue::Int(4))
            .unwrap();
        registry
            .commit(&mut design, &icons, root, &EditTarget::LayoutParam("grid_type"), EditValue::Choice(1))
            .unwrap();
        let params = registry.layout_params(&design, root);
        assert_eq!(params.get("count").map(String::as_str), Some("4"));
        assert_eq!(params.get("grid_type").map(String::as_str), Some("Rows"));
    }
}
