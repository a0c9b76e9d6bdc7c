//! Kind registry: maps component-kind names to their descriptors and layout
//! names to layout descriptors, and performs the structural operations that
//! need both (creation, child attachment, layout switching).

pub(crate) mod editor;
pub(crate) mod layouts;
pub(crate) mod widgets;

use crate::model::{Design, Direction, Node, NodeId, Value};
use crate::resource::ResourceTable;
use layouts::{LayoutDescriptor, LayoutStrategy};
use std::collections::BTreeMap;
use tracing::debug;
use widgets::{FieldType, WidgetDescriptor};

pub(crate) struct Registry {
    widgets: Vec<WidgetDescriptor>,
    layouts: Vec<LayoutDescriptor>,
}

impl Registry {
    pub(crate) fn new(widgets: Vec<WidgetDescriptor>, layouts: Vec<LayoutDescriptor>) -> Self {
        Self { widgets, layouts }
    }

    pub(crate) fn builtin(icons: &ResourceTable) -> Self {
        Self::new(widgets::builtin(icons), layouts::builtin())
    }

    pub(crate) fn lookup(&self, kind: &str) -> Option<&WidgetDescriptor> {
        self.widgets.iter().find(|w| w.kind == kind)
    }

    pub(crate) fn layout(&self, name: &str) -> Option<&LayoutDescriptor> {
        self.layouts.iter().find(|l| l.name == name)
    }

    /// Registered kinds in palette order.
    pub(crate) fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.widgets.iter().map(|w| w.kind)
    }

    pub(crate) fn layouts(&self) -> impl Iterator<Item = &LayoutDescriptor> {
        self.layouts.iter()
    }

    /// Creates a default instance of `kind`, including any nested content
    /// its populate hook adds. Containers start as a vertical box.
    pub(crate) fn create(&self, design: &mut Design, kind: &str) -> Option<NodeId> {
        let desc = self.lookup(kind)?;
        let id = if desc.container {
            let id = design.insert(Node::container(kind, LayoutStrategy::Box));
            design.meta_mut(id).dir = Some(Direction::Vertical);
            id
        } else {
            design.insert(Node::leaf(kind, desc.defaults()))
        };
        if let Some(populate) = desc.populate {
            populate(self, design, id);
        }
        debug!(kind, "created node");
        Some(id)
    }

    /// Whether `parent` can take another child without displacing one.
    pub(crate) fn can_add_child(&self, design: &Design, parent: NodeId) -> bool {
        let Some(node) = design.get(parent) else {
            return false;
        };
        if node.is_container() {
            return true;
        }
        self.lookup(&node.kind).is_some_and(|desc| {
            desc.fields.iter().any(|spec| match &spec.ty {
                FieldType::Node => node.fields.node(spec.name).is_none(),
                FieldType::Records(row) => row.iter().any(|r| matches!(r.ty, FieldType::Node)),
                _ => false,
            })
        })
    }

    /// Attaches `child` under `parent`. Containers append it; widgets with
    /// nested-node fields fill the first empty slot, then grow a record list,
    /// and finally replace the first slot (dropping its old subtree).
    pub(crate) fn add_child(&self, design: &mut Design, parent: NodeId, child: NodeId) -> bool {
        let Some(node) = design.get(parent) else {
            return false;
        };
        if node.is_container() {
            return design.append_child(parent, child);
        }
        let Some(desc) = self.lookup(&node.kind) else {
            return false;
        };

        let empty_slot = desc
            .fields
            .iter()
            .find(|spec| matches!(spec.ty, FieldType::Node) && node.fields.node(spec.name).is_none());
        if let Some(spec) = empty_slot {
            let name = spec.name;
            if let Some(node) = design.get_mut(parent) {
                node.fields.set(name, Value::Node(Some(child)));
            }
            return true;
        }

        let record_slot = desc.fields.iter().find_map(|spec| match &spec.ty {
            FieldType::Records(row) => row
                .iter()
                .find(|sub| matches!(sub.ty, FieldType::Node))
                .map(|sub| (spec, sub.name)),
            _ => None,
        });
        if let Some((spec, sub)) = record_slot {
            let row = spec.default_row().with(sub, Value::Node(Some(child)));
            if let Some(node) = design.get_mut(parent) {
                let mut rows = node.fields.records(spec.name).to_vec();
                rows.push(row);
                node.fields.set(spec.name, Value::Records(rows));
            }
            return true;
        }

        let first_slot = desc
            .fields
            .iter()
            .find(|spec| matches!(spec.ty, FieldType::Node));
        if let Some(spec) = first_slot {
            let old = node.fields.node(spec.name);
            let name = spec.name;
            if let Some(node) = design.get_mut(parent) {
                node.fields.set(name, Value::Node(Some(child)));
            }
            if let Some(old) = old {
                design.remove(old);
            }
            return true;
        }
        false
    }

    /// Switches the layout of container `id`, rebuilding the strategy from
    /// `params` and recording the direction marker and persisted parameters.
    pub(crate) fn set_layout(
        &self,
        design: &mut Design,
        id: NodeId,
        name: &str,
        params: &BTreeMap<String, String>,
    ) -> bool {
        let Some(desc) = self.layout(name) else {
            return false;
        };
        let Some(body) = design.get_mut(id).and_then(|n| n.container.as_mut()) else {
            return false;
        };
        body.layout = (desc.create)(&body.children, params);
        let current = desc.current_params(body, params);
        let meta = design.meta_mut(id);
        meta.dir = desc.dir;
        meta.params = current;
        debug!(layout = name, "layout changed");
        true
    }

    /// Layout descriptor matching the current strategy of container `id`.
    pub(crate) fn layout_descriptor_for(
        &self,
        design: &Design,
        id: NodeId,
    ) -> Option<&LayoutDescriptor> {
        let body = design.get(id)?.container.as_ref()?;
        let dir = design.meta(id).and_then(|m| m.dir);
        self.layout(body.layout.canonical_name(dir))
    }

    pub(crate) fn layout_name(&self, design: &Design, id: NodeId) -> Option<&'static str> {
        self.layout_descriptor_for(design, id).map(|d| d.name)
    }

    /// Parameters to persist for container `id`.
    pub(crate) fn layout_params(&self, design: &Design, id: NodeId) -> BTreeMap<String, String> {
        let (Some(desc), Some(body)) = (
            self.layout_descriptor_for(design, id),
            design.get(id).and_then(|n| n.container.as_ref()),
        ) else {
            return BTreeMap::new();
        };
        let empty = BTreeMap::new();
        let stored = design.meta(id).map(|m| &m.params).unwrap_or(&empty);
        desc.current_params(body, stored)
    }

    /// Re-syncs the persisted parameters of `id` after its children changed.
    pub(crate) fn refresh_layout(&self, design: &mut Design, id: NodeId) {
        if design.get(id).is_some_and(Node::is_container) {
            let params = self.layout_params(design, id);
            design.meta_mut(id).params = params;
        }
    }

    /// Short human label for outlines and slot pickers.
    pub(crate) fn display_label(&self, design: &Design, id: NodeId) -> String {
        let Some(node) = design.get(id) else {
            return String::new();
        };
        if let Some(name) = design.name(id) {
            return format!("{name} ({})", node.kind);
        }
        let caption = ["Text", "Title", "URL", "File"]
            .iter()
            .map(|f| node.fields.text(f))
            .find(|t| !t.is_empty());
        match (caption, self.layout_name(design, id)) {
            (Some(text), _) => format!("{}: {}", node.kind, text.lines().next().unwrap_or(text)),
            (None, Some(layout)) => format!("{} [{layout}]", node.kind),
            (None, None) => node.kind.clone(),
        }
    }
}
