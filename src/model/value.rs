use crate::model::NodeId;
use crate::resource::IconHandle;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Text style record shared by labels and entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct TextStyle {
    pub(crate) bold: bool,
    pub(crate) italic: bool,
    pub(crate) monospace: bool,
    pub(crate) tab_width: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct Size {
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl Size {
    pub(crate) const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A live event handler. Never persisted; re-defaulted on create/decode.
#[derive(Clone, Default)]
pub(crate) struct Callback(Option<Rc<dyn Fn()>>);

impl Callback {
    pub(crate) fn new(f: impl Fn() + 'static) -> Self {
        Self(Some(Rc::new(f)))
    }

    pub(crate) fn invoke(&self) {
        if let Some(f) = &self.0 {
            f();
        }
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_set() { "Callback(set)" } else { "Callback(none)" })
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// One typed property value. Enumerations hold their underlying integer and
/// are interpreted through the declaring field's labels.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Enum(i64),
    Style(TextStyle),
    Icon(Option<IconHandle>),
    Strings(Vec<String>),
    Records(Vec<Fields>),
    Node(Option<NodeId>),
    Size(Size),
    Date(NaiveDate),
    Callback(Callback),
}

impl Value {
    pub(crate) fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub(crate) fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Strings(items.into_iter().map(Into::into).collect())
    }
}

/// Ordered property map. Insertion order is the declaration order of the
/// kind's field table.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Replaces an existing entry in place or appends a new one.
    pub(crate) fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.get_mut(&name) {
            Some(slot) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub(crate) fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn text(&self, name: &str) -> &str {
        match self.get(name) {
            Some(Value::Text(s)) => s,
            _ => "",
        }
    }

    pub(crate) fn bool(&self, name: &str) -> bool {
        matches!(self.get(name), Some(Value::Bool(true)))
    }

    pub(crate) fn int(&self, name: &str) -> i64 {
        match self.get(name) {
            Some(Value::Int(i) | Value::Enum(i)) => *i,
            _ => 0,
        }
    }

    pub(crate) fn float(&self, name: &str) -> f64 {
        match self.get(name) {
            Some(Value::Float(f)) => *f,
            Some(Value::Int(i)) => *i as f64,
            _ => 0.0,
        }
    }

    pub(crate) fn style(&self, name: &str) -> TextStyle {
        match self.get(name) {
            Some(Value::Style(s)) => *s,
            _ => TextStyle::default(),
        }
    }

    pub(crate) fn icon(&self, name: &str) -> Option<IconHandle> {
        match self.get(name) {
            Some(Value::Icon(icon)) => *icon,
            _ => None,
        }
    }

    pub(crate) fn strings(&self, name: &str) -> &[String] {
        match self.get(name) {
            Some(Value::Strings(items)) => items,
            _ => &[],
        }
    }

    pub(crate) fn records(&self, name: &str) -> &[Fields] {
        match self.get(name) {
            Some(Value::Records(rows)) => rows,
            _ => &[],
        }
    }

    pub(crate) fn node(&self, name: &str) -> Option<NodeId> {
        match self.get(name) {
            Some(Value::Node(id)) => *id,
            _ => None,
        }
    }

    pub(crate) fn size(&self, name: &str) -> Size {
        match self.get(name) {
            Some(Value::Size(s)) => *s,
            _ => Size::default(),
        }
    }

    pub(crate) fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.get(name) {
            Some(Value::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// Every nested node reference, in field order, including those held
    /// inside record lists.
    pub(crate) fn nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for (_, value) in &self.entries {
            match value {
                Value::Node(Some(id)) => out.push(*id),
                Value::Records(rows) => {
                    for row in rows {
                        out.extend(row.nodes());
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Clears every node reference equal to `id`. Returns true if one was found.
    pub(crate) fn detach(&mut self, id: NodeId) -> bool {
        let mut found = false;
        for (_, value) in &mut self.entries {
            match value {
                Value::Node(slot) if *slot == Some(id) => {
                    *slot = None;
                    found = true;
                }
                Value::Records(rows) => {
                    for row in rows {
                        found |= row.detach(id);
                    }
                }
                _ => {}
            }
        }
        found
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Fields {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.set(k, v);
        }
        fields
    }
}
