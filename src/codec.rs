//! Document codec: converts between the live design and its persisted JSON
//! form.
//!
//! Leaves are written as `{"Type", "Name", "Struct"}`; containers as
//! `{"Type", "Name", "Layout", "Objects", "Properties"}`. Enumerations are
//! written as integers and icons by symbolic name. Decoding is lenient below
//! the root: unknown nested kinds are dropped, mistyped fields fall back to
//! their defaults, and both are reported as [`DecodeWarning`]s.

use crate::model::{Design, Fields, Node, NodeId, Size, TextStyle, Value};
use crate::registry::Registry;
use crate::registry::layouts::{LayoutStrategy, ParamKind};
use crate::registry::widgets::{FieldSpec, FieldType};
use crate::resource::{IconName, ResourceTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One node of a persisted document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct DocNode {
    #[serde(rename = "Type")]
    pub(crate) kind: String,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
    #[serde(rename = "Struct", default, skip_serializing_if = "Option::is_none")]
    pub(crate) fields: Option<Map<String, Json>>,
    #[serde(rename = "Layout", default, skip_serializing_if = "Option::is_none")]
    pub(crate) layout: Option<String>,
    #[serde(rename = "Objects", default, skip_serializing_if = "Option::is_none")]
    pub(crate) objects: Option<Vec<DocNode>>,
    #[serde(rename = "Properties", default, skip_serializing_if = "Option::is_none")]
    pub(crate) properties: Option<BTreeMap<String, String>>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum CodecError {
    #[error("unknown component kind `{0}` at the document root")]
    UnknownRoot(String),
    #[error("node is not part of the design")]
    MissingNode,
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Recoverable problem found while decoding below the root.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum DecodeWarning {
    #[error("{path}: skipped unknown component kind `{kind}`")]
    UnknownKind { path: String, kind: String },
    #[error("{path}: `{kind}.{field}` is not a valid {expected}; using the default")]
    FieldMismatch {
        path: String,
        kind: String,
        field: String,
        expected: &'static str,
    },
    #[error("{path}: unknown layout `{layout}`; using VBox")]
    UnknownLayout { path: String, layout: String },
}

/// Decoded design plus the problems skipped along the way.
pub(crate) struct Decoded {
    pub(crate) design: Design,
    pub(crate) root: NodeId,
    pub(crate) warnings: Vec<DecodeWarning>,
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encodes the subtree at `id`. Live nodes are only read.
pub(crate) fn encode(
    design: &Design,
    registry: &Registry,
    icons: &ResourceTable,
    id: NodeId,
) -> Result<DocNode, CodecError> {
    let encoder = Encoder {
        design,
        registry,
        icons,
    };
    encoder.node(id).ok_or(CodecError::MissingNode)
}

struct Encoder<'a> {
    design: &'a Design,
    registry: &'a Registry,
    icons: &'a ResourceTable,
}

impl Encoder<'_> {
    fn node(&self, id: NodeId) -> Option<DocNode> {
        let node = self.design.get(id)?;
        let mut doc = DocNode {
            kind: node.kind.clone(),
            name: self.design.name(id).map(str::to_owned),
            ..Default::default()
        };
        if let Some(body) = &node.container {
            let layout = self
                .registry
                .layout_name(self.design, id)
                .unwrap_or("VBox");
            let params = self.registry.layout_params(self.design, id);
            doc.layout = Some(layout.to_owned());
            doc.objects = Some(body.children.iter().filter_map(|c| self.node(*c)).collect());
            doc.properties = (!params.is_empty()).then_some(params);
        } else {
            doc.fields = Some(self.fields(node));
        }
        Some(doc)
    }

    /// Serializable field view. Registered kinds follow their field table;
    /// anything else is written as a generic record of its exported fields.
    fn fields(&self, node: &Node) -> Map<String, Json> {
        let mut out = Map::new();
        match self.registry.lookup(&node.kind) {
            Some(desc) => {
                for spec in desc.fields.iter().filter(|s| !s.ty.is_transient()) {
                    if let Some(value) = node.fields.get(spec.name)
                        && let Some(json) = self.value(value)
                    {
                        out.insert(spec.name.to_owned(), json);
                    }
                }
            }
            None => {
                debug!(kind = %node.kind, "encoding unregistered kind as a generic record");
                for (name, value) in node.fields.iter() {
                    if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
                        continue;
                    }
                    if let Some(json) = self.value(value) {
                        out.insert(name.to_owned(), json);
                    }
                }
            }
        }
        out
    }

    fn value(&self, value: &Value) -> Option<Json> {
        let json = match value {
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) | Value::Enum(i) => Json::from(*i),
            Value::Float(f) => Json::from(*f),
            Value::Text(s) => Json::String(s.clone()),
            Value::Style(style) => serde_json::to_value(style).ok()?,
            Value::Icon(icon) => serde_json::to_value(IconName {
                table: self.icons,
                icon: *icon,
            })
            .ok()?,
            Value::Strings(items) => Json::from(items.clone()),
            Value::Records(rows) => Json::Array(
                rows.iter()
                    .map(|row| Json::Object(self.record(row)))
                    .collect(),
            ),
            Value::Node(Some(id)) => match self.node(*id) {
                Some(doc) => serde_json::to_value(doc).ok()?,
                None => Json::Null,
            },
            Value::Node(None) => Json::Null,
            Value::Size(size) => serde_json::to_value(size).ok()?,
            Value::Date(date) => Json::String(date.format(DATE_FORMAT).to_string()),
            Value::Callback(_) => return None,
        };
        Some(json)
    }

    fn record(&self, row: &Fields) -> Map<String, Json> {
        row.iter()
            .filter_map(|(name, value)| Some((name.to_owned(), self.value(value)?)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Rebuilds a design from `doc`. Fails only when the root kind is unknown.
pub(crate) fn decode(
    doc: &DocNode,
    registry: &Registry,
    icons: &ResourceTable,
) -> Result<Decoded, CodecError> {
    if registry.lookup(&doc.kind).is_none() {
        return Err(CodecError::UnknownRoot(doc.kind.clone()));
    }
    let mut decoder = Decoder {
        registry,
        icons,
        design: Design::new(),
        warnings: Vec::new(),
    };
    let root = decoder
        .node(doc, "")
        .ok_or_else(|| CodecError::UnknownRoot(doc.kind.clone()))?;
    decoder.design.set_root(root);
    for warning in &decoder.warnings {
        warn!("{warning}");
    }
    Ok(Decoded {
        design: decoder.design,
        root,
        warnings: decoder.warnings,
    })
}

struct Decoder<'a> {
    registry: &'a Registry,
    icons: &'a ResourceTable,
    design: Design,
    warnings: Vec<DecodeWarning>,
}

impl Decoder<'_> {
    fn node(&mut self, doc: &DocNode, path: &str) -> Option<NodeId> {
        let registry = self.registry;
        let Some(desc) = registry.lookup(&doc.kind) else {
            self.warnings.push(DecodeWarning::UnknownKind {
                path: path_or_root(path),
                kind: doc.kind.clone(),
            });
            return None;
        };

        let id = if desc.container {
            self.container(doc, path)
        } else {
            let mut fields = desc.defaults();
            let empty = Map::new();
            let stored = doc.fields.as_ref().unwrap_or(&empty);
            for spec in desc.fields.iter().filter(|s| !s.ty.is_transient()) {
                let Some(json) = stored.get(spec.name) else {
                    continue;
                };
                let field_path = format!("{path}/Struct/{}", spec.name);
                if let Some(value) = self.value(&doc.kind, spec, json, &field_path) {
                    fields.set(spec.name, value);
                }
            }
            for name in stored.keys().filter(|k| desc.field(k).is_none()) {
                debug!(kind = %doc.kind, field = %name, "ignoring unknown field");
            }
            self.design.insert(Node::leaf(doc.kind.as_str(), fields))
        };
        self.design.set_name(id, doc.name.clone());
        Some(id)
    }

    fn container(&mut self, doc: &DocNode, path: &str) -> NodeId {
        let registry = self.registry;
        let id = self
            .design
            .insert(Node::container(doc.kind.as_str(), LayoutStrategy::Box));

        // Old object index -> new child index, for slot parameters.
        let mut kept = BTreeMap::new();
        for (i, child) in doc.objects.iter().flatten().enumerate() {
            if let Some(cid) = self.node(child, &format!("{path}/Objects/{i}")) {
                let slot = self.design.get(id).map(|n| n.children().len()).unwrap_or(0);
                kept.insert(i, slot);
                self.design.append_child(id, cid);
            }
        }

        let requested = doc.layout.as_deref().unwrap_or("VBox");
        let layout = match registry.layout(requested) {
            Some(layout) => layout,
            None => {
                self.warnings.push(DecodeWarning::UnknownLayout {
                    path: path_or_root(path),
                    layout: requested.to_owned(),
                });
                match registry.layout("VBox") {
                    Some(layout) => layout,
                    None => return id,
                }
            }
        };

        let mut params = doc.properties.clone().unwrap_or_default();
        for spec in layout.params.iter().filter(|p| p.kind == ParamKind::Slot) {
            if let Some(raw) = params.get_mut(spec.name) {
                *raw = raw
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|old| kept.get(&old))
                    .map(|new| new.to_string())
                    .unwrap_or_default();
            }
        }
        let name = layout.name;
        registry.set_layout(&mut self.design, id, name, &params);
        id
    }

    fn mismatch(&mut self, kind: &str, spec: &FieldSpec, path: &str) -> Option<Value> {
        self.warnings.push(DecodeWarning::FieldMismatch {
            path: path.to_owned(),
            kind: kind.to_owned(),
            field: spec.name.to_owned(),
            expected: expected_name(&spec.ty),
        });
        None
    }

    /// Decodes one field. `None` means the field is skipped.
    fn value(&mut self, kind: &str, spec: &FieldSpec, json: &Json, path: &str) -> Option<Value> {
        let value = match (&spec.ty, json) {
            (FieldType::Bool, Json::Bool(b)) => Value::Bool(*b),
            (FieldType::Int { min, max }, Json::Number(n)) if n.is_i64() => {
                Value::Int(n.as_i64()?.clamp(*min, *max))
            }
            (FieldType::Float { .. }, Json::Number(n)) => Value::Float(n.as_f64()?),
            (FieldType::Text { .. }, Json::String(s)) => Value::Text(s.clone()),
            (FieldType::Enum(_), Json::Number(n)) if n.is_i64() => Value::Enum(n.as_i64()?),
            (FieldType::Style, Json::Object(_)) => {
                match serde_json::from_value::<TextStyle>(json.clone()) {
                    Ok(style) => Value::Style(style),
                    Err(_) => return self.mismatch(kind, spec, path),
                }
            }
            (FieldType::Icon, Json::Null) => Value::Icon(None),
            (FieldType::Icon, Json::String(name)) => {
                let icon = self.icons.resolve(name);
                if icon.is_none() {
                    debug!(icon = %name, "unresolvable icon name");
                }
                Value::Icon(icon)
            }
            (FieldType::Strings, Json::Array(items)) => {
                let strings: Option<Vec<String>> =
                    items.iter().map(|i| i.as_str().map(str::to_owned)).collect();
                match strings {
                    Some(strings) => Value::Strings(strings),
                    None => return self.mismatch(kind, spec, path),
                }
            }
            (FieldType::Records(row_specs), Json::Array(rows)) => {
                let mut out = Vec::with_capacity(rows.len());
                for (i, row) in rows.iter().enumerate() {
                    let Json::Object(map) = row else {
                        self.mismatch(kind, spec, &format!("{path}/{i}"));
                        continue;
                    };
                    let mut fields = spec.default_row();
                    for sub in row_specs.iter().filter(|s| !s.ty.is_transient()) {
                        if let Some(json) = map.get(sub.name)
                            && let Some(value) =
                                self.value(kind, sub, json, &format!("{path}/{i}/{}", sub.name))
                        {
                            fields.set(sub.name, value);
                        }
                    }
                    out.push(fields);
                }
                Value::Records(out)
            }
            (FieldType::Node, Json::Null) => Value::Node(None),
            (FieldType::Node, Json::Object(_)) => {
                match serde_json::from_value::<DocNode>(json.clone()) {
                    Ok(doc) => Value::Node(self.node(&doc, path)),
                    Err(_) => return self.mismatch(kind, spec, path),
                }
            }
            (FieldType::Size, Json::Object(_)) => match serde_json::from_value::<Size>(json.clone()) {
                Ok(size) => Value::Size(size),
                Err(_) => return self.mismatch(kind, spec, path),
            },
            (FieldType::Date, Json::String(s)) => match NaiveDate::parse_from_str(s, DATE_FORMAT) {
                Ok(date) => Value::Date(date),
                Err(_) => return self.mismatch(kind, spec, path),
            },
            _ => return self.mismatch(kind, spec, path),
        };
        Some(value)
    }
}

fn path_or_root(path: &str) -> String {
    if path.is_empty() {
        "/".to_owned()
    } else {
        path.to_owned()
    }
}

fn expected_name(ty: &FieldType) -> &'static str {
    match ty {
        FieldType::Bool => "bool",
        FieldType::Int { .. } => "integer",
        FieldType::Float { .. } => "number",
        FieldType::Text { .. } => "string",
        FieldType::Enum(_) => "enumeration index",
        FieldType::Style => "text style",
        FieldType::Icon => "icon name",
        FieldType::Strings => "string list",
        FieldType::Records(_) => "record list",
        FieldType::Node => "nested component",
        FieldType::Size => "size",
        FieldType::Date => "YYYY-MM-DD date",
        FieldType::Callback => "callback",
    }
}

// ---------------------------------------------------------------------------
// Byte streams
// ---------------------------------------------------------------------------

pub(crate) fn write_document<W: Write>(writer: W, doc: &DocNode) -> Result<(), CodecError> {
    serde_json::to_writer_pretty(writer, doc)?;
    Ok(())
}

pub(crate) fn read_document<R: Read>(reader: R) -> Result<DocNode, CodecError> {
    Ok(serde_json::from_reader(reader)?)
}

pub(crate) fn to_json(doc: &DocNode) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

pub(crate) fn from_json(text: &str) -> Result<DocNode, CodecError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::layouts::{GridLayout, GridOrientation};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Fixture {
        icons: ResourceTable,
        registry: Registry,
    }

    impl Fixture {
        fn new() -> Self {
            let icons = ResourceTable::builtin();
            let registry = Registry::builtin(&icons);
            Self { icons, registry }
        }

        fn encode(&self, design: &Design, id: NodeId) -> DocNode {
            encode(design, &self.registry, &self.icons, id).unwrap()
        }

        fn decode_json(&self, value: Json) -> Decoded {
            let doc: DocNode = serde_json::from_value(value).unwrap();
            decode(&doc, &self.registry, &self.icons).unwrap()
        }
    }

    #[test]
    fn test_label_round_trip() {
        let fx = Fixture::new();
        let mut design = Design::new();
        let id = fx.registry.create(&mut design, "Label").unwrap();
        let fields = &mut design.get_mut(id).unwrap().fields;
        fields.set("Text", Value::text("Hi"));
        fields.set("Alignment", Value::Enum(1));
        fields.set(
            "TextStyle",
            Value::Style(TextStyle {
                bold: true,
                ..Default::default()
            }),
        );

        let doc = fx.encode(&design, id);
        let stored = doc.fields.clone().unwrap();
        assert_eq!(stored["Text"], json!("Hi"));
        assert_eq!(stored["Alignment"], json!(1));
        assert_eq!(
            stored["TextStyle"],
            json!({"Bold": true, "Italic": false, "Monospace": false, "TabWidth": 0})
        );

        let decoded = decode(&doc, &fx.registry, &fx.icons).unwrap();
        assert!(decoded.warnings.is_empty());
        assert_eq!(
            decoded.design.get(decoded.root).unwrap().fields,
            design.get(id).unwrap().fields
        );
    }

    /// A non-default value for each field type. Slots and callbacks are
    /// left alone.
    fn sample(spec: &FieldSpec, icons: &ResourceTable) -> Option<Value> {
        let value = match &spec.ty {
            FieldType::Bool => Value::Bool(!matches!(spec.default, Value::Bool(true))),
            FieldType::Int { min, max } => Value::Int((min + max) / 2),
            FieldType::Float { min, max } => Value::Float(0.75_f64.clamp(*min, *max)),
            FieldType::Text { .. } => Value::text("say \"hi\"\nagain"),
            FieldType::Enum(labels) => Value::Enum(labels.len() as i64 - 1),
            FieldType::Style => Value::Style(TextStyle {
                bold: true,
                monospace: true,
                tab_width: 4,
                ..TextStyle::default()
            }),
            FieldType::Icon => Value::Icon(icons.resolve("HomeIcon")),
            FieldType::Strings => Value::strings(["one", "two"]),
            FieldType::Records(row) => {
                let mut fields = spec.default_row();
                for sub in row {
                    if let Some(value) = sample(sub, icons) {
                        fields.set(sub.name, value);
                    }
                }
                Value::Records(vec![fields.clone(), fields])
            }
            FieldType::Size => Value::Size(Size::new(64.0, 32.0)),
            FieldType::Date => Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            FieldType::Node | FieldType::Callback => return None,
        };
        Some(value)
    }

    /// Node handles differ between designs; compare everything else.
    fn without_nodes(fields: &Fields) -> Fields {
        fields
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::Node(_) => Value::Node(None),
                    Value::Records(rows) => Value::Records(rows.iter().map(without_nodes).collect()),
                    other => other.clone(),
                };
                (name.to_owned(), value)
            })
            .collect()
    }

    #[test]
    fn test_every_kind_round_trips() {
        let fx = Fixture::new();
        for kind in fx.registry.kinds() {
            let mut design = Design::new();
            let id = fx.registry.create(&mut design, kind).unwrap();
            let specs = fx.registry.lookup(kind).unwrap().fields.clone();
            for spec in &specs {
                if let Some(value) = sample(spec, &fx.icons) {
                    design.get_mut(id).unwrap().fields.set(spec.name, value);
                }
            }
            let doc = fx.encode(&design, id);
            let decoded = decode(&doc, &fx.registry, &fx.icons).unwrap();
            assert!(decoded.warnings.is_empty(), "{kind}: {:?}", decoded.warnings);
            assert_eq!(
                without_nodes(&decoded.design.get(decoded.root).unwrap().fields),
                without_nodes(&design.get(id).unwrap().fields),
                "{kind} fields survive"
            );
            assert_eq!(
                fx.encode(&decoded.design, decoded.root),
                doc,
                "{kind} re-encodes identically"
            );
        }
    }

    #[test]
    fn test_entry_row_count_is_an_integer() {
        let fx = Fixture::new();
        let decoded = fx.decode_json(json!({
            "Type": "Entry",
            "Struct": {"MultiLine": true, "MinRows": 6}
        }));
        let fields = &decoded.design.get(decoded.root).unwrap().fields;
        assert_eq!(fields.get("MinRows"), Some(&Value::Int(6)));

        let decoded = fx.decode_json(json!({"Type": "Entry", "Struct": {"MinRows": 100000}}));
        let fields = &decoded.design.get(decoded.root).unwrap().fields;
        assert_eq!(fields.get("MinRows"), Some(&Value::Int(20)));

        let decoded = fx.decode_json(json!({"Type": "Entry", "Struct": {"MinRows": 2.5}}));
        assert_eq!(decoded.warnings.len(), 1);
        let fields = &decoded.design.get(decoded.root).unwrap().fields;
        assert_eq!(fields.get("MinRows"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_name_preserved() {
        let fx = Fixture::new();
        let mut design = Design::new();
        let id = fx.registry.create(&mut design, "Label").unwrap();
        design.set_name(id, Some("myLabel".into()));
        let doc = fx.encode(&design, id);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["Name"], json!("myLabel"));

        let decoded = decode(&doc, &fx.registry, &fx.icons).unwrap();
        assert_eq!(decoded.design.name(decoded.root), Some("myLabel"));
    }

    #[test]
    fn test_grid_layout_round_trip() {
        let fx = Fixture::new();
        let decoded = fx.decode_json(json!({
            "Type": "Container",
            "Layout": "Grid",
            "Objects": [],
            "Properties": {"count": "3", "grid_type": "Rows"}
        }));
        let design = &decoded.design;
        let body = design.get(decoded.root).unwrap().container.as_ref().unwrap();
        assert_eq!(
            body.layout,
            LayoutStrategy::Grid(GridLayout {
                count: 3,
                orientation: GridOrientation::Rows
            })
        );
        let doc = fx.encode(design, decoded.root);
        assert_eq!(doc.layout.as_deref(), Some("Grid"));
        let props = doc.properties.unwrap();
        assert_eq!(props["count"], "3");
        assert_eq!(props["grid_type"], "Rows");
    }

    #[test]
    fn test_hbox_name_from_direction_marker() {
        let fx = Fixture::new();
        let decoded = fx.decode_json(json!({"Type": "Container", "Layout": "HBox", "Objects": []}));
        let doc = fx.encode(&decoded.design, decoded.root);
        assert_eq!(doc.layout.as_deref(), Some("HBox"));
        assert_eq!(doc.properties, None);
    }

    #[test]
    fn test_unknown_nested_kind_skipped() {
        let fx = Fixture::new();
        let decoded = fx.decode_json(json!({
            "Type": "Container",
            "Layout": "VBox",
            "Objects": [
                {"Type": "Label", "Struct": {"Text": "ok"}},
                {"Type": "Gauge", "Struct": {}}
            ]
        }));
        let root = decoded.design.get(decoded.root).unwrap();
        assert_eq!(root.children().len(), 1);
        assert_eq!(
            decoded.warnings,
            [DecodeWarning::UnknownKind {
                path: "/Objects/1".into(),
                kind: "Gauge".into()
            }]
        );
    }

    #[test]
    fn test_unknown_root_is_fatal() {
        let fx = Fixture::new();
        let doc = DocNode {
            kind: "Gauge".into(),
            ..Default::default()
        };
        let err = decode(&doc, &fx.registry, &fx.icons).err().unwrap();
        assert!(matches!(err, CodecError::UnknownRoot(kind) if kind == "Gauge"));
    }

    #[test]
    fn test_mismatched_field_skipped() {
        let fx = Fixture::new();
        let decoded = fx.decode_json(json!({
            "Type": "Label",
            "Struct": {"Text": 5, "Alignment": 2, "Extra": true}
        }));
        let fields = &decoded.design.get(decoded.root).unwrap().fields;
        assert_eq!(fields.text("Text"), "Label");
        assert_eq!(fields.get("Alignment"), Some(&Value::Enum(2)));
        assert_eq!(fields.get("Extra"), None);
        assert_eq!(decoded.warnings.len(), 1);
        assert!(matches!(
            &decoded.warnings[0],
            DecodeWarning::FieldMismatch { field, .. } if field == "Text"
        ));
    }

    #[test]
    fn test_icons_written_by_name() {
        let fx = Fixture::new();
        let mut design = Design::new();
        let id = fx.registry.create(&mut design, "Button").unwrap();
        let doc = fx.encode(&design, id);
        let stored = doc.fields.unwrap();
        assert_eq!(stored["Icon"], Json::Null);
        assert!(!stored.contains_key("OnTapped"));

        design
            .get_mut(id)
            .unwrap()
            .fields
            .set("Icon", Value::Icon(fx.icons.resolve("HomeIcon")));
        let stored = fx.encode(&design, id).fields.unwrap();
        assert_eq!(stored["Icon"], json!("HomeIcon"));

        let decoded = fx.decode_json(json!({"Type": "Button", "Struct": {"Icon": "NoSuchIcon"}}));
        assert_eq!(decoded.design.get(decoded.root).unwrap().fields.icon("Icon"), None);
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn test_border_slots_remapped_after_skip() {
        let fx = Fixture::new();
        let decoded = fx.decode_json(json!({
            "Type": "Container",
            "Layout": "Border",
            "Objects": [
                {"Type": "Gauge"},
                {"Type": "Label", "Struct": {"Text": "a"}},
                {"Type": "Button", "Struct": {"Text": "b"}}
            ],
            "Properties": {"top": "2", "left": "0", "right": "9", "bottom": ""}
        }));
        let params = fx.registry.layout_params(&decoded.design, decoded.root);
        assert_eq!(params["top"], "1");
        assert_eq!(params["left"], "");
        assert_eq!(params["right"], "");
        assert_eq!(params["bottom"], "");
    }

    #[test]
    fn test_unknown_layout_falls_back_to_vbox() {
        let fx = Fixture::new();
        let decoded = fx.decode_json(json!({"Type": "Container", "Layout": "Spiral", "Objects": []}));
        assert_eq!(
            fx.registry.layout_name(&decoded.design, decoded.root),
            Some("VBox")
        );
        assert!(matches!(
            &decoded.warnings[..],
            [DecodeWarning::UnknownLayout { layout, .. }] if layout == "Spiral"
        ));
    }

    #[test]
    fn test_nested_nodes_round_trip() {
        let fx = Fixture::new();
        let mut design = Design::new();
        let form = fx.registry.create(&mut design, "Form").unwrap();
        let doc = fx.encode(&design, form);
        let rows = &doc.fields.as_ref().unwrap()["Items"];
        assert_eq!(rows[0]["Text"], json!("Name"));
        assert_eq!(rows[0]["Widget"]["Type"], json!("Entry"));

        let decoded = decode(&doc, &fx.registry, &fx.icons).unwrap();
        let rows = decoded.design.get(decoded.root).unwrap().fields.records("Items");
        assert_eq!(rows.len(), 2);
        let widget = rows[1].node("Widget").unwrap();
        assert_eq!(decoded.design.get(widget).unwrap().kind, "Entry");
        assert_eq!(decoded.design.len(), 3);
    }

    #[test]
    fn test_unregistered_kind_encodes_generic_record() {
        let fx = Fixture::new();
        let mut design = Design::new();
        let id = design.insert(Node::leaf(
            "Gauge",
            Fields::new()
                .with("Value", Value::Float(0.5))
                .with("internal", Value::Bool(true)),
        ));
        let doc = fx.encode(&design, id);
        assert_eq!(doc.fields.unwrap(), json!({"Value": 0.5}).as_object().cloned().unwrap());
    }

    #[test]
    fn test_stream_round_trip() {
        let fx = Fixture::new();
        let mut design = Design::new();
        let root = fx.registry.create(&mut design, "Container").unwrap();
        let date = fx.registry.create(&mut design, "DateEntry").unwrap();
        fx.registry.add_child(&mut design, root, date);
        let doc = fx.encode(&design, root);

        let mut bytes = Vec::new();
        write_document(&mut bytes, &doc).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"Date\": \"2025-01-01\""));
        let back = read_document(bytes.as_slice()).unwrap();
        assert_eq!(back, doc);
        assert!(matches!(from_json("{"), Err(CodecError::Json(_))));
    }
}
