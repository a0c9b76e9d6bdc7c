//! Layout strategies and their descriptors.
//!
//! A strategy is rebuilt from scratch every time its parameters change; it
//! never carries state over from a previous build.

use crate::codegen::{GenContext, indent};
use crate::model::{ContainerBody, Direction, NodeId, Size};
use std::collections::{BTreeMap, HashMap};

pub(crate) const EMPTY_SLOT: &str = "(empty)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GridOrientation {
    Columns,
    Rows,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct GridLayout {
    pub(crate) count: usize,
    pub(crate) orientation: GridOrientation,
}

impl GridLayout {
    /// (rows, columns) needed to place `children` cells.
    pub(crate) fn dimensions(&self, children: usize) -> (usize, usize) {
        let count = self.count.max(1);
        let other = children.div_ceil(count);
        match self.orientation {
            GridOrientation::Columns => (other, count),
            GridOrientation::Rows => (count, other),
        }
    }

    /// Child index placed at (row, col), if any.
    pub(crate) fn child_at(&self, children: usize, row: usize, col: usize) -> Option<usize> {
        let (rows, cols) = self.dimensions(children);
        let index = match self.orientation {
            GridOrientation::Columns => row * cols + col,
            GridOrientation::Rows => col * rows + row,
        };
        (index < children).then_some(index)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BorderSlots {
    pub(crate) top: Option<NodeId>,
    pub(crate) bottom: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl BorderSlots {
    pub(crate) fn get(&self, slot: &str) -> Option<NodeId> {
        match slot {
            "top" => self.top,
            "bottom" => self.bottom,
            "left" => self.left,
            "right" => self.right,
            _ => None,
        }
    }

    fn contains(&self, id: NodeId) -> bool {
        [self.top, self.bottom, self.left, self.right].contains(&Some(id))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum LayoutStrategy {
    /// Shared by `HBox` and `VBox`; the direction lives in the side-table.
    Box,
    Grid(GridLayout),
    AdaptiveGrid { count: usize },
    GridWrap { cell: Size },
    Border(BorderSlots),
    Center,
    Stack,
    Padded,
    Form,
}

impl LayoutStrategy {
    pub(crate) fn remap(&mut self, remap: &HashMap<NodeId, NodeId>) {
        if let LayoutStrategy::Border(slots) = self {
            for slot in [
                &mut slots.top,
                &mut slots.bottom,
                &mut slots.left,
                &mut slots.right,
            ] {
                if let Some(id) = slot
                    && let Some(mapped) = remap.get(&*id)
                {
                    *id = *mapped;
                }
            }
        }
    }

    /// Registry name for this strategy. Box layouts need the side-table
    /// direction marker to tell `HBox` from `VBox`.
    pub(crate) fn canonical_name(&self, dir: Option<Direction>) -> &'static str {
        match self {
            LayoutStrategy::Box => match dir {
                Some(Direction::Horizontal) => "HBox",
                _ => "VBox",
            },
            LayoutStrategy::Grid(_) => "Grid",
            LayoutStrategy::AdaptiveGrid { .. } => "AdaptiveGrid",
            LayoutStrategy::GridWrap { .. } => "GridWrap",
            LayoutStrategy::Border(_) => "Border",
            LayoutStrategy::Center => "Center",
            LayoutStrategy::Stack => "Stack",
            LayoutStrategy::Padded => "Padded",
            LayoutStrategy::Form => "Form",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ParamKind {
    Count,
    Number,
    Choice(&'static [&'static str]),
    /// Index of a child of the container, or empty.
    Slot,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ParamSpec {
    pub(crate) name: &'static str,
    pub(crate) kind: ParamKind,
    pub(crate) default: &'static str,
}

pub(crate) type CreateLayoutFn = fn(&[NodeId], &BTreeMap<String, String>) -> LayoutStrategy;
pub(crate) type GenerateLayoutFn = fn(NodeId, &ContainerBody, &mut GenContext<'_>) -> String;

pub(crate) struct LayoutDescriptor {
    pub(crate) name: &'static str,
    pub(crate) params: &'static [ParamSpec],
    pub(crate) create: CreateLayoutFn,
    pub(crate) generate: GenerateLayoutFn,
    pub(crate) namespaces: &'static [&'static str],
    /// Direction marker recorded when this layout is chosen.
    pub(crate) dir: Option<Direction>,
}

impl LayoutDescriptor {
    pub(crate) fn has_slots(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::Slot)
    }

    /// Parameter values to persist for `body`. Slot parameters are derived
    /// from the live strategy so they follow child moves and removals.
    pub(crate) fn current_params(
        &self,
        body: &ContainerBody,
        stored: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for spec in self.params {
            let value = match (spec.kind, &body.layout) {
                (ParamKind::Slot, LayoutStrategy::Border(slots)) => slots
                    .get(spec.name)
                    .and_then(|id| body.children.iter().position(|c| *c == id))
                    .map(|i| i.to_string())
                    .unwrap_or_default(),
                _ => stored
                    .get(spec.name)
                    .cloned()
                    .unwrap_or_else(|| spec.default.to_owned()),
            };
            out.insert(spec.name.to_owned(), value);
        }
        out
    }
}

const EGUI: &[&str] = &["eframe::egui"];

const GRID_TYPES: &[&str] = &["Columns", "Rows"];

/// Upper bound on grid row/column counts, for both documents and edits.
pub(crate) const MAX_COUNT: usize = 32;

const GRID_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "count",
        kind: ParamKind::Count,
        default: "1",
    },
    ParamSpec {
        name: "grid_type",
        kind: ParamKind::Choice(GRID_TYPES),
        default: "Columns",
    },
];

const ADAPTIVE_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "count",
    kind: ParamKind::Count,
    default: "1",
}];

const WRAP_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "width",
        kind: ParamKind::Number,
        default: "100",
    },
    ParamSpec {
        name: "height",
        kind: ParamKind::Number,
        default: "100",
    },
];

pub(crate) const BORDER_SLOTS: [&str; 4] = ["top", "bottom", "left", "right"];

const BORDER_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "top",
        kind: ParamKind::Slot,
        default: "",
    },
    ParamSpec {
        name: "bottom",
        kind: ParamKind::Slot,
        default: "",
    },
    ParamSpec {
        name: "left",
        kind: ParamKind::Slot,
        default: "",
    },
    ParamSpec {
        name: "right",
        kind: ParamKind::Slot,
        default: "",
    },
];

pub(crate) fn builtin() -> Vec<LayoutDescriptor> {
    vec![
        LayoutDescriptor {
            name: "VBox",
            params: &[],
            create: |_, _| LayoutStrategy::Box,
            generate: generate_box,
            namespaces: EGUI,
            dir: Some(Direction::Vertical),
        },
        LayoutDescriptor {
            name: "HBox",
            params: &[],
            create: |_, _| LayoutStrategy::Box,
            generate: generate_box,
            namespaces: EGUI,
            dir: Some(Direction::Horizontal),
        },
        LayoutDescriptor {
            name: "Grid",
            params: GRID_PARAMS,
            create: create_grid,
            generate: generate_grid,
            namespaces: EGUI,
            dir: None,
        },
        LayoutDescriptor {
            name: "AdaptiveGrid",
            params: ADAPTIVE_PARAMS,
            create: |_, params| LayoutStrategy::AdaptiveGrid {
                count: parse_count(params, "count", 1),
            },
            generate: generate_grid,
            namespaces: EGUI,
            dir: None,
        },
        LayoutDescriptor {
            name: "GridWrap",
            params: WRAP_PARAMS,
            create: |_, params| LayoutStrategy::GridWrap {
                cell: Size::new(
                    parse_number(params, "width", 100.0),
                    parse_number(params, "height", 100.0),
                ),
            },
            generate: generate_grid_wrap,
            namespaces: EGUI,
            dir: None,
        },
        LayoutDescriptor {
            name: "Border",
            params: BORDER_PARAMS,
            create: create_border,
            generate: generate_border,
            namespaces: EGUI,
            dir: None,
        },
        LayoutDescriptor {
            name: "Center",
            params: &[],
            create: |_, _| LayoutStrategy::Center,
            generate: generate_center,
            namespaces: EGUI,
            dir: None,
        },
        LayoutDescriptor {
            name: "Stack",
            params: &[],
            create: |_, _| LayoutStrategy::Stack,
            generate: generate_stack,
            namespaces: EGUI,
            dir: None,
        },
        LayoutDescriptor {
            name: "Padded",
            params: &[],
            create: |_, _| LayoutStrategy::Padded,
            generate: generate_padded,
            namespaces: EGUI,
            dir: None,
        },
        LayoutDescriptor {
            name: "Form",
            params: &[],
            create: |_, _| LayoutStrategy::Form,
            generate: generate_grid,
            namespaces: EGUI,
            dir: None,
        },
    ]
}

fn parse_count(params: &BTreeMap<String, String>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map_or(default, |n| n.min(MAX_COUNT))
}

fn parse_number(params: &BTreeMap<String, String>, key: &str, default: f32) -> f32 {
    params
        .get(key)
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|n| n.is_finite() && *n > 0.0)
        .unwrap_or(default)
}

/// Resolves a slot parameter to a child. Empty, garbled and out-of-range
/// values leave the slot unassigned.
pub(crate) fn parse_slot(
    children: &[NodeId],
    params: &BTreeMap<String, String>,
    key: &str,
) -> Option<NodeId> {
    params
        .get(key)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .and_then(|i| children.get(i).copied())
}

fn create_grid(_: &[NodeId], params: &BTreeMap<String, String>) -> LayoutStrategy {
    let orientation = match params.get("grid_type").map(|s| s.trim()) {
        Some("Rows") => GridOrientation::Rows,
        _ => GridOrientation::Columns,
    };
    LayoutStrategy::Grid(GridLayout {
        count: parse_count(params, "count", 1),
        orientation,
    })
}

fn create_border(children: &[NodeId], params: &BTreeMap<String, String>) -> LayoutStrategy {
    LayoutStrategy::Border(BorderSlots {
        top: parse_slot(children, params, "top"),
        bottom: parse_slot(children, params, "bottom"),
        left: parse_slot(children, params, "left"),
        right: parse_slot(children, params, "right"),
    })
}

fn children_code(body: &ContainerBody, cx: &mut GenContext<'_>) -> String {
    body.children.iter().map(|c| cx.node(*c)).collect()
}

fn generate_box(id: NodeId, body: &ContainerBody, cx: &mut GenContext<'_>) -> String {
    let horizontal = cx
        .design()
        .meta(id)
        .is_some_and(|m| m.dir == Some(Direction::Horizontal));
    let inner = children_code(body, cx);
    let method = if horizontal { "horizontal" } else { "vertical" };
    format!("ui.{method}(|ui| {{\n{}}});\n", indent(&inner, 1))
}

fn generate_grid(_: NodeId, body: &ContainerBody, cx: &mut GenContext<'_>) -> String {
    let grid = match &body.layout {
        LayoutStrategy::Grid(grid) => *grid,
        LayoutStrategy::AdaptiveGrid { count } => GridLayout {
            count: *count,
            orientation: GridOrientation::Columns,
        },
        _ => GridLayout {
            count: 2,
            orientation: GridOrientation::Columns,
        },
    };
    let salt = cx.salt("grid");
    let n = body.children.len();
    let (rows, cols) = grid.dimensions(n);
    let mut inner = String::new();
    for row in 0..rows {
        for col in 0..cols {
            match grid.child_at(n, row, col) {
                Some(i) => inner.push_str(&cx.node(body.children[i])),
                None => inner.push_str("ui.label(\"\");\n"),
            }
        }
        inner.push_str("ui.end_row();\n");
    }
    format!(
        "egui::Grid::new(\"{salt}\").num_columns({cols}).show(ui, |ui| {{\n{}}});\n",
        indent(&inner, 1)
    )
}

fn generate_grid_wrap(_: NodeId, body: &ContainerBody, cx: &mut GenContext<'_>) -> String {
    let cell = match &body.layout {
        LayoutStrategy::GridWrap { cell } => *cell,
        _ => Size::new(100.0, 100.0),
    };
    let mut inner = String::new();
    for child in &body.children {
        let code = cx.node(*child);
        inner.push_str(&format!(
            "ui.allocate_ui(egui::vec2({:.1}, {:.1}), |ui| {{\n{}}});\n",
            cell.width,
            cell.height,
            indent(&code, 1)
        ));
    }
    format!("ui.horizontal_wrapped(|ui| {{\n{}}});\n", indent(&inner, 1))
}

fn generate_border(_: NodeId, body: &ContainerBody, cx: &mut GenContext<'_>) -> String {
    let slots = match &body.layout {
        LayoutStrategy::Border(slots) => *slots,
        _ => BorderSlots::default(),
    };
    let slot_code = |slot: Option<NodeId>, cx: &mut GenContext<'_>| {
        slot.filter(|id| body.children.contains(id))
            .map(|id| cx.node(id))
            .unwrap_or_default()
    };
    let top = slot_code(slots.top, cx);
    let bottom = slot_code(slots.bottom, cx);
    let left = slot_code(slots.left, cx);
    let right = slot_code(slots.right, cx);
    let center: String = body
        .children
        .iter()
        .filter(|c| !slots.contains(**c))
        .map(|c| cx.node(*c))
        .collect();

    let middle = format!(
        "{left}ui.vertical(|ui| {{\n{}}});\n{right}",
        indent(&center, 1)
    );
    let inner = format!(
        "{top}ui.horizontal(|ui| {{\n{}}});\n{bottom}",
        indent(&middle, 1)
    );
    format!("ui.vertical(|ui| {{\n{}}});\n", indent(&inner, 1))
}

fn generate_center(_: NodeId, body: &ContainerBody, cx: &mut GenContext<'_>) -> String {
    let inner = children_code(body, cx);
    format!("ui.vertical_centered(|ui| {{\n{}}});\n", indent(&inner, 1))
}

fn generate_stack(_: NodeId, body: &ContainerBody, cx: &mut GenContext<'_>) -> String {
    let rect = cx.salt("stack_rect");
    let mut out = format!("let {rect} = ui.available_rect_before_wrap();\n");
    for child in &body.children {
        let code = cx.node(*child);
        out.push_str(&format!(
            "ui.scope_builder(egui::UiBuilder::new().max_rect({rect}), |ui| {{\n{}}});\n",
            indent(&code, 1)
        ));
    }
    out
}

fn generate_padded(_: NodeId, body: &ContainerBody, cx: &mut GenContext<'_>) -> String {
    let inner = children_code(body, cx);
    format!(
        "egui::Frame::NONE.inner_margin(8.0).show(ui, |ui| {{\n{}}});\n",
        indent(&inner, 1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Design, Fields, Node};

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ids(n: usize) -> Vec<NodeId> {
        let mut design = Design::new();
        (0..n)
            .map(|_| design.insert(Node::leaf("Label", Fields::new())))
            .collect()
    }

    #[test]
    fn test_grid_rows_dimensions() {
        let grid = create_grid(&[], &params(&[("count", "3"), ("grid_type", "Rows")]));
        let LayoutStrategy::Grid(grid) = grid else {
            panic!("expected grid");
        };
        assert_eq!(grid.dimensions(6), (3, 2));
        assert_eq!(grid.dimensions(7), (3, 3));
        // column-major fill
        assert_eq!(grid.child_at(6, 0, 1), Some(3));
        assert_eq!(grid.child_at(6, 2, 2), None);
    }

    #[test]
    fn test_grid_garbled_params_fall_back() {
        let grid = create_grid(&[], &params(&[("count", "many"), ("grid_type", "??")]));
        assert_eq!(
            grid,
            LayoutStrategy::Grid(GridLayout {
                count: 1,
                orientation: GridOrientation::Columns
            })
        );
    }

    #[test]
    fn test_grid_count_is_capped() {
        let grid = create_grid(&[], &params(&[("count", "5000000"), ("grid_type", "Rows")]));
        assert_eq!(
            grid,
            LayoutStrategy::Grid(GridLayout {
                count: MAX_COUNT,
                orientation: GridOrientation::Rows
            })
        );
    }

    #[test]
    fn test_border_tolerates_bad_indices() {
        let kids = ids(2);
        let border = create_border(
            &kids,
            &params(&[("top", "1"), ("bottom", "7"), ("left", ""), ("right", "x")]),
        );
        assert_eq!(
            border,
            LayoutStrategy::Border(BorderSlots {
                top: Some(kids[1]),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_create_is_idempotent() {
        let kids = ids(3);
        let p = params(&[("top", "0"), ("left", "2")]);
        assert_eq!(create_border(&kids, &p), create_border(&kids, &p));
    }

    #[test]
    fn test_current_params_follow_child_order() {
        let kids = ids(2);
        let border = builtin().into_iter().find(|d| d.name == "Border").unwrap();
        let mut body = ContainerBody {
            children: kids.clone(),
            layout: create_border(&kids, &params(&[("top", "0")])),
        };
        body.children.swap(0, 1);
        let current = border.current_params(&body, &BTreeMap::new());
        assert_eq!(current.get("top").map(String::as_str), Some("1"));
        assert_eq!(current.get("left").map(String::as_str), Some(""));
    }

    #[test]
    fn test_canonical_name_uses_direction_marker() {
        assert_eq!(
            LayoutStrategy::Box.canonical_name(Some(Direction::Horizontal)),
            "HBox"
        );
        assert_eq!(LayoutStrategy::Box.canonical_name(None), "VBox");
    }
}
