//! Design canvas: draws the live design with real egui widgets and maps
//! clicks back to the node under the pointer.
//!
//! Widgets draw from copies of their field values, so nothing the user does
//! on the canvas writes back into the design. Edits go through the inspector.
//! Buttons still fire their live `OnTapped` handler when one is attached.

use crate::model::{ContainerBody, Design, Direction, Node, NodeId, TextStyle, Value};
use crate::registry::Registry;
use crate::registry::layouts::{BorderSlots, GridLayout, GridOrientation, LayoutStrategy};
use crate::registry::widgets::progress_fraction;
use crate::resource::ResourceTable;
use chrono::NaiveDate;
use egui::{Color32, CornerRadius, Id, Pos2, Rect, RichText, Stroke, UiBuilder, vec2};
use egui_extras::DatePickerButton;

/// Screen area covered by one drawn node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Hit {
    pub(crate) id: NodeId,
    pub(crate) rect: Rect,
    pub(crate) depth: usize,
}

/// Deepest node containing `pos`. Among equally deep overlapping nodes the
/// one drawn last wins.
pub(crate) fn pick(hits: &[Hit], pos: Pos2) -> Option<NodeId> {
    hits.iter()
        .filter(|h| h.rect.contains(pos))
        .max_by_key(|h| h.depth)
        .map(|h| h.id)
}

struct Canvas<'a> {
    design: &'a Design,
    registry: &'a Registry,
    icons: &'a ResourceTable,
    hits: Vec<Hit>,
}

/// Draws the design and returns the node clicked this frame, if any.
pub(crate) fn show(
    ui: &mut egui::Ui,
    design: &Design,
    registry: &Registry,
    icons: &ResourceTable,
    selected: Option<NodeId>,
) -> Option<NodeId> {
    let mut canvas = Canvas {
        design,
        registry,
        icons,
        hits: Vec::new(),
    };
    let frame = egui::Frame::canvas(ui.style())
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_min_size(ui.available_size());
            match design.root() {
                Some(root) => canvas.node(ui, root, 0),
                None => {
                    ui.weak("Empty design");
                }
            }
        });
    let area = frame.response.rect;

    let painter = ui.painter();
    if let Some(pos) = ui.ctx().pointer_hover_pos()
        && area.contains(pos)
        && let Some(hovered) = pick(&canvas.hits, pos)
        && Some(hovered) != selected
        && let Some(hit) = canvas.hits.iter().find(|h| h.id == hovered)
    {
        painter.rect_stroke(
            hit.rect,
            CornerRadius::same(4),
            Stroke::new(1.0, Color32::from_gray(90)),
            egui::StrokeKind::Outside,
        );
    }
    if let Some(hit) = selected.and_then(|id| canvas.hits.iter().find(|h| h.id == id)) {
        painter.rect_stroke(
            hit.rect,
            CornerRadius::same(4),
            Stroke::new(2.0, Color32::LIGHT_BLUE),
            egui::StrokeKind::Outside,
        );
    }

    let clicked = ui
        .ctx()
        .input(|i| i.pointer.primary_clicked().then(|| i.pointer.interact_pos()))
        .flatten();
    clicked
        .filter(|pos| area.contains(*pos))
        .and_then(|pos| pick(&canvas.hits, pos))
}

impl Canvas<'_> {
    fn node(&mut self, ui: &mut egui::Ui, id: NodeId, depth: usize) {
        let design = self.design;
        let Some(node) = design.get(id) else {
            return;
        };
        let inner = ui.scope(|ui| match &node.container {
            Some(body) => self.container(ui, id, body, depth),
            None => self.widget(ui, id, node, depth),
        });
        let rect = inner.response.rect.intersect(ui.clip_rect());
        self.hits.push(Hit { id, rect, depth });
    }

    fn children(&mut self, ui: &mut egui::Ui, children: &[NodeId], depth: usize) {
        for child in children {
            self.node(ui, *child, depth + 1);
        }
    }

    fn container(&mut self, ui: &mut egui::Ui, id: NodeId, body: &ContainerBody, depth: usize) {
        if body.children.is_empty() {
            ui.weak(format!("Empty {}", self.registry.display_label(self.design, id)));
            return;
        }
        match &body.layout {
            LayoutStrategy::Box => {
                let horizontal = self
                    .design
                    .meta(id)
                    .is_some_and(|m| m.dir == Some(Direction::Horizontal));
                if horizontal {
                    ui.horizontal(|ui| self.children(ui, &body.children, depth));
                } else {
                    ui.vertical(|ui| self.children(ui, &body.children, depth));
                }
            }
            LayoutStrategy::Grid(grid) => self.grid(ui, id, *grid, &body.children, depth),
            LayoutStrategy::AdaptiveGrid { count } => {
                let grid = GridLayout {
                    count: *count,
                    orientation: GridOrientation::Columns,
                };
                self.grid(ui, id, grid, &body.children, depth);
            }
            LayoutStrategy::GridWrap { cell } => {
                ui.horizontal_wrapped(|ui| {
                    for child in &body.children {
                        ui.allocate_ui(vec2(cell.width, cell.height), |ui| {
                            self.node(ui, *child, depth + 1);
                        });
                    }
                });
            }
            LayoutStrategy::Border(slots) => self.border(ui, *slots, &body.children, depth),
            LayoutStrategy::Center => {
                ui.vertical_centered(|ui| self.children(ui, &body.children, depth));
            }
            LayoutStrategy::Stack => {
                let rect = ui.available_rect_before_wrap();
                for child in &body.children {
                    ui.scope_builder(UiBuilder::new().max_rect(rect), |ui| {
                        self.node(ui, *child, depth + 1);
                    });
                }
            }
            LayoutStrategy::Padded => {
                egui::Frame::NONE
                    .inner_margin(8.0)
                    .show(ui, |ui| self.children(ui, &body.children, depth));
            }
            LayoutStrategy::Form => {
                egui::Grid::new(("canvas-form-layout", id))
                    .num_columns(2)
                    .show(ui, |ui| {
                        for pair in body.children.chunks(2) {
                            for child in pair {
                                self.node(ui, *child, depth + 1);
                            }
                            ui.end_row();
                        }
                    });
            }
        }
    }

    fn grid(
        &mut self,
        ui: &mut egui::Ui,
        id: NodeId,
        grid: GridLayout,
        children: &[NodeId],
        depth: usize,
    ) {
        let n = children.len();
        let (rows, cols) = grid.dimensions(n);
        egui::Grid::new(("canvas-grid", id))
            .num_columns(cols)
            .show(ui, |ui| {
                for row in 0..rows {
                    for col in 0..cols {
                        match grid.child_at(n, row, col) {
                            Some(i) => self.node(ui, children[i], depth + 1),
                            None => {
                                ui.label("");
                            }
                        }
                    }
                    ui.end_row();
                }
            });
    }

    fn border(&mut self, ui: &mut egui::Ui, slots: BorderSlots, children: &[NodeId], depth: usize) {
        let slot = |id: Option<NodeId>| id.filter(|id| children.contains(id));
        let placed: Vec<NodeId> = [slots.top, slots.bottom, slots.left, slots.right]
            .into_iter()
            .filter_map(slot)
            .collect();
        ui.vertical(|ui| {
            if let Some(top) = slot(slots.top) {
                self.node(ui, top, depth + 1);
            }
            ui.horizontal(|ui| {
                if let Some(left) = slot(slots.left) {
                    self.node(ui, left, depth + 1);
                }
                ui.vertical(|ui| {
                    for child in children.iter().filter(|c| !placed.contains(c)) {
                        self.node(ui, *child, depth + 1);
                    }
                });
                if let Some(right) = slot(slots.right) {
                    self.node(ui, right, depth + 1);
                }
            });
            if let Some(bottom) = slot(slots.bottom) {
                self.node(ui, bottom, depth + 1);
            }
        });
    }

    fn widget(&mut self, ui: &mut egui::Ui, id: NodeId, node: &Node, depth: usize) {
        let f = &node.fields;
        match node.kind.as_str() {
            "Label" => {
                let text = rich_text(f.text("Text"), f.style("TextStyle"), f.int("Importance"));
                let label = match f.int("Wrapping") {
                    0 => egui::Label::new(text).extend(),
                    1 => egui::Label::new(text).truncate(),
                    _ => egui::Label::new(text).wrap(),
                };
                aligned(ui, f.int("Alignment"), |ui| {
                    ui.add(label);
                });
            }
            "Button" => {
                let glyph = self.icons.glyph(f.icon("Icon"));
                let text = f.text("Text");
                let caption = match (glyph.is_empty(), f.int("IconPlacement")) {
                    (true, _) => text.to_owned(),
                    (false, 1) => format!("{text} {glyph}"),
                    (false, _) => format!("{glyph} {text}"),
                };
                let mut button = egui::Button::new(caption.trim());
                match f.int("Importance") {
                    1 => button = button.fill(ui.visuals().selection.bg_fill),
                    3 => button = button.fill(Color32::DARK_RED),
                    _ => {}
                }
                aligned(ui, f.int("Alignment"), |ui| {
                    if ui.add(button).clicked()
                        && let Some(Value::Callback(handler)) = f.get("OnTapped")
                    {
                        handler.invoke();
                    }
                });
            }
            "Entry" => {
                let mut buf = f.text("Text").to_owned();
                let mut edit = if f.bool("MultiLine") {
                    egui::TextEdit::multiline(&mut buf)
                        .desired_rows(f.int("MinRows").clamp(1, 20) as usize)
                } else {
                    egui::TextEdit::singleline(&mut buf)
                };
                edit = edit
                    .hint_text(f.text("PlaceHolder"))
                    .password(f.bool("Password"))
                    .interactive(false);
                if f.style("TextStyle").monospace {
                    edit = edit.font(egui::TextStyle::Monospace);
                }
                ui.add(edit);
            }
            "Check" => {
                let mut checked = f.bool("Checked");
                ui.checkbox(&mut checked, f.text("Text"));
            }
            "Hyperlink" => {
                aligned(ui, f.int("Alignment"), |ui| {
                    ui.link(f.text("Text")).on_hover_text(f.text("URL"));
                });
            }
            "Icon" => {
                ui.label(RichText::new(self.icons.glyph(f.icon("Resource"))).size(24.0));
            }
            "Image" => {
                let size = f.size("MinSize");
                let (rect, _) = ui.allocate_exact_size(vec2(size.width, size.height), egui::Sense::hover());
                let painter = ui.painter();
                painter.rect_stroke(
                    rect,
                    CornerRadius::same(4),
                    Stroke::new(1.0, Color32::from_gray(120)),
                    egui::StrokeKind::Inside,
                );
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    format!("🖼 {}", f.text("File")),
                    egui::FontId::proportional(12.0),
                    ui.visuals().weak_text_color(),
                );
            }
            "ProgressBar" => {
                let fraction = progress_fraction(f.float("Min"), f.float("Max"), f.float("Value"));
                ui.add(egui::ProgressBar::new(fraction).show_percentage());
            }
            "Slider" => {
                let mut value = f.float("Value");
                let mut slider = egui::Slider::new(&mut value, f.float("Min")..=f.float("Max"));
                if f.float("Step") > 0.0 {
                    slider = slider.step_by(f.float("Step"));
                }
                if f.int("Orientation") == 1 {
                    slider = slider.vertical();
                }
                ui.add(slider);
            }
            "Select" => {
                let mut selected = f.text("Selected").to_owned();
                let caption = if selected.is_empty() {
                    f.text("PlaceHolder").to_owned()
                } else {
                    selected.clone()
                };
                egui::ComboBox::from_id_salt(("canvas-select", id))
                    .selected_text(caption)
                    .show_ui(ui, |ui| {
                        for option in f.strings("Options") {
                            ui.selectable_value(&mut selected, option.clone(), option);
                        }
                    });
            }
            "RadioGroup" => {
                let selected = f.text("Selected");
                let options = |ui: &mut egui::Ui| {
                    for option in f.strings("Options") {
                        ui.radio(option == selected, option);
                    }
                };
                if f.bool("Horizontal") {
                    ui.horizontal(options);
                } else {
                    ui.vertical(options);
                }
            }
            "Separator" => {
                ui.separator();
            }
            "Activity" => {
                ui.spinner();
            }
            "DateEntry" => {
                let mut date = f.date("Date").unwrap_or(NaiveDate::MIN);
                let salt = format!("canvas-date-{id:?}");
                ui.add(DatePickerButton::new(&mut date).id_salt(&salt));
            }
            "RichText" => {
                for line in f.text("Markdown").lines() {
                    match line.trim_start_matches('#') {
                        heading if heading.len() < line.len() => {
                            ui.heading(heading.trim());
                        }
                        _ if line.trim().is_empty() => ui.add_space(4.0),
                        text => {
                            ui.label(text);
                        }
                    }
                }
            }
            "Toolbar" => {
                ui.horizontal(|ui| {
                    for item in f.records("Items") {
                        match item.int("Type") {
                            1 => {
                                ui.separator();
                            }
                            2 => ui.add_space(16.0),
                            _ => {
                                let _ = ui.button(self.icons.glyph(item.icon("Icon")));
                            }
                        }
                    }
                });
            }
            "Form" => {
                egui::Grid::new(("canvas-form", id))
                    .num_columns(2)
                    .show(ui, |ui| {
                        for item in f.records("Items") {
                            let label = ui.label(item.text("Text"));
                            let hint = item.text("HintText");
                            if !hint.is_empty() {
                                let _ = label.on_hover_text(hint);
                            }
                            match item.node("Widget") {
                                Some(widget) => self.node(ui, widget, depth + 1),
                                None => {
                                    ui.label("");
                                }
                            }
                            ui.end_row();
                        }
                    });
                ui.horizontal(|ui| {
                    for key in ["CancelText", "SubmitText"] {
                        if !f.text(key).is_empty() {
                            let _ = ui.button(f.text(key));
                        }
                    }
                });
            }
            "AppTabs" => {
                let state = Id::new(("canvas-tabs", id));
                let mut current = ui.data(|d| d.get_temp::<usize>(state)).unwrap_or_default();
                let items = f.records("Items");
                let icons = self.icons;
                let header = |ui: &mut egui::Ui, current: &mut usize| {
                    ui.horizontal(|ui| {
                        for (i, item) in items.iter().enumerate() {
                            let glyph = icons.glyph(item.icon("Icon"));
                            let caption = format!("{glyph} {}", item.text("Text"));
                            ui.selectable_value(current, i, caption.trim());
                        }
                    });
                };
                let bottom = f.int("Location") == 1;
                if !bottom {
                    header(ui, &mut current);
                    ui.separator();
                }
                if let Some(content) = items.get(current).and_then(|item| item.node("Content")) {
                    self.node(ui, content, depth + 1);
                }
                if bottom {
                    ui.separator();
                    header(ui, &mut current);
                }
                ui.data_mut(|d| d.insert_temp(state, current));
            }
            "Card" => {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    if !f.text("Title").is_empty() {
                        ui.heading(f.text("Title"));
                    }
                    if !f.text("Subtitle").is_empty() {
                        ui.label(RichText::new(f.text("Subtitle")).weak());
                    }
                    if let Some(content) = f.node("Content") {
                        self.node(ui, content, depth + 1);
                    }
                });
            }
            "Scroll" => {
                let (h, v) = match f.int("Direction") {
                    1 => (true, false),
                    2 => (false, true),
                    3 => (false, false),
                    _ => (true, true),
                };
                egui::ScrollArea::new([h, v])
                    .id_salt(("canvas-scroll", id))
                    .max_height(240.0)
                    .show(ui, |ui| {
                        if let Some(content) = f.node("Content") {
                            self.node(ui, content, depth + 1);
                        }
                    });
            }
            "Split" => {
                let leading = f.node("Leading");
                let trailing = f.node("Trailing");
                if f.bool("Horizontal") {
                    ui.columns(2, |columns| {
                        if let Some(id) = leading {
                            self.node(&mut columns[0], id, depth + 1);
                        }
                        if let Some(id) = trailing {
                            self.node(&mut columns[1], id, depth + 1);
                        }
                    });
                } else {
                    ui.vertical(|ui| {
                        if let Some(id) = leading {
                            self.node(ui, id, depth + 1);
                        }
                        ui.separator();
                        if let Some(id) = trailing {
                            self.node(ui, id, depth + 1);
                        }
                    });
                }
            }
            _ => {
                // Kinds without a canvas renderer show their slot content.
                ui.group(|ui| {
                    ui.weak(&node.kind);
                    for child in node.fields.nodes() {
                        self.node(ui, child, depth + 1);
                    }
                });
            }
        }
    }
}

fn rich_text(text: &str, style: TextStyle, importance: i64) -> RichText {
    let mut out = RichText::new(text);
    if style.bold {
        out = out.strong();
    }
    if style.italic {
        out = out.italics();
    }
    if style.monospace {
        out = out.monospace();
    }
    match importance {
        1 => out.color(Color32::LIGHT_BLUE),
        2 => out.weak(),
        3 => out.color(Color32::RED),
        4 => out.color(Color32::YELLOW),
        5 => out.color(Color32::GREEN),
        _ => out,
    }
}

fn aligned(ui: &mut egui::Ui, alignment: i64, add: impl FnOnce(&mut egui::Ui)) {
    match alignment {
        1 => {
            ui.vertical_centered(add);
        }
        2 => {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), add);
        }
        _ => add(ui),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fields, Node};
    use egui::pos2;
    use pretty_assertions::assert_eq;

    fn ids(n: usize) -> Vec<NodeId> {
        let mut design = Design::new();
        (0..n)
            .map(|_| design.insert(Node::leaf("Label", Fields::new())))
            .collect()
    }

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Rect {
        Rect::from_min_max(pos2(x0, y0), pos2(x1, y1))
    }

    #[test]
    fn test_pick_prefers_deepest() {
        let id = ids(3);
        let hits = [
            Hit { id: id[1], rect: rect(10.0, 10.0, 50.0, 30.0), depth: 1 },
            Hit { id: id[2], rect: rect(10.0, 40.0, 50.0, 60.0), depth: 1 },
            Hit { id: id[0], rect: rect(0.0, 0.0, 100.0, 100.0), depth: 0 },
        ];
        assert_eq!(pick(&hits, pos2(20.0, 20.0)), Some(id[1]));
        assert_eq!(pick(&hits, pos2(20.0, 50.0)), Some(id[2]));
        assert_eq!(pick(&hits, pos2(80.0, 80.0)), Some(id[0]));
        assert_eq!(pick(&hits, pos2(200.0, 200.0)), None);
    }

    #[test]
    fn test_pick_overlap_takes_last_drawn() {
        let id = ids(2);
        let hits = [
            Hit { id: id[0], rect: rect(0.0, 0.0, 40.0, 40.0), depth: 2 },
            Hit { id: id[1], rect: rect(0.0, 0.0, 40.0, 40.0), depth: 2 },
        ];
        assert_eq!(pick(&hits, pos2(5.0, 5.0)), Some(id[1]));
    }

    #[test]
    fn test_rich_text_keeps_text() {
        let style = TextStyle {
            bold: true,
            ..TextStyle::default()
        };
        assert_eq!(rich_text("hello", style, 2).text(), "hello");
    }
}
