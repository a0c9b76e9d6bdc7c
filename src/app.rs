use crate::{
    builder::Builder,
    codec::DecodeWarning,
    codegen::CodeGenFormat,
    highlight::{self, Highlighter},
    model::{Design, NodeId},
    registry::{
        Registry,
        editor::{Control, EditValue, PropertyEditor},
    },
    render,
};
use chrono::NaiveDate;
use egui_extras::DatePickerButton;
use std::path::PathBuf;

/// Palette sections. Registered kinds not listed here go under "Other".
const PALETTE: &[(&str, &[&str])] = &[
    (
        "Basic",
        &["Label", "Button", "Hyperlink", "Icon", "Image", "Separator", "Activity"],
    ),
    (
        "Input",
        &["Entry", "Check", "Slider", "Select", "RadioGroup", "DateEntry"],
    ),
    ("Display", &["ProgressBar", "RichText", "Toolbar"]),
    (
        "Containers",
        &["Container", "Form", "AppTabs", "Card", "Scroll", "Split"],
    ),
];

const DOCUMENT_FILTER: (&str, &[&str]) = ("GUI Design", &["json", "gui"]);

pub(crate) struct DesignerApp {
    builder: Builder,
    palette_open: bool,
    /// Text in the code panel: generated code or an exported document.
    output: String,
    /// Error/status message to display
    status_message: Option<(String, std::time::Instant)>,
    /// Problems skipped by the last load or import
    warnings: Vec<DecodeWarning>,
    /// Syntax highlighter for code preview
    highlighter: Highlighter,
    /// Whether to show syntax highlighting (can be toggled for performance)
    syntax_highlighting: bool,
    /// Active tab in the right panel (0 = Inspector, 1 = Outline, 2 = Code)
    right_panel_tab: usize,
}

impl Default for DesignerApp {
    fn default() -> Self {
        Self {
            builder: Builder::new(),
            palette_open: true,
            output: String::new(),
            status_message: None,
            warnings: Vec::new(),
            highlighter: Highlighter::new(),
            syntax_highlighting: true,
            right_panel_tab: 0,
        }
    }
}

impl DesignerApp {
    /// Set a status message that will auto-clear after a few seconds
    fn set_status(&mut self, msg: String) {
        self.status_message = Some((msg, std::time::Instant::now()));
    }

    /// Pulls freshly generated code into the panel when auto-generate is on.
    fn tree_changed(&mut self) {
        if self.builder.auto_generate
            && let Some(text) = self.builder.generated_text()
        {
            self.output = text;
        }
    }

    fn generate(&mut self) {
        self.builder.generate();
        self.output = self.builder.generated_text().unwrap_or_default();
        self.right_panel_tab = 2;
        self.set_status("Code generated".into());
    }

    fn insert(&mut self, kind: &str) {
        match self.builder.insert(kind) {
            Ok(_) => self.tree_changed(),
            Err(e) => self.set_status(format!("Insert failed: {e}")),
        }
    }

    fn delete_selected(&mut self) {
        if self.builder.remove_selected() {
            self.tree_changed();
        } else {
            self.set_status("The root container cannot be deleted".into());
        }
    }

    fn duplicate_selected(&mut self) {
        if self.builder.duplicate_selected().is_some() {
            self.tree_changed();
        } else {
            self.set_status("Nothing to duplicate here".into());
        }
    }

    fn move_selected(&mut self, delta: isize) {
        if self.builder.move_selected(delta) {
            self.tree_changed();
        }
    }

    fn new_design(&mut self) {
        self.builder.reset();
        self.warnings.clear();
        self.output.clear();
        self.set_status("New design created".into());
    }

    /// Save design to file
    fn save_design(&mut self, path: PathBuf) {
        match self.builder.save(&path) {
            Ok(()) => self.set_status(format!("Saved to {}", path.display())),
            Err(e) => self.set_status(format!("Save failed: {e}")),
        }
    }

    /// Load design from file
    fn load_design(&mut self, path: PathBuf) {
        match self.builder.load(&path) {
            Ok(warnings) => {
                let msg = if warnings.is_empty() {
                    format!("Loaded {}", path.display())
                } else {
                    format!("Loaded {} with {} warnings", path.display(), warnings.len())
                };
                self.warnings = warnings;
                self.tree_changed();
                self.set_status(msg);
            }
            Err(e) => self.set_status(format!("Load failed: {e}")),
        }
    }

    fn save_as_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter(DOCUMENT_FILTER.0, DOCUMENT_FILTER.1)
            .set_file_name("design.json")
            .save_file()
        {
            self.save_design(path);
        }
    }

    fn save(&mut self) {
        match self.builder.current_file.clone() {
            Some(path) => self.save_design(path),
            None => self.save_as_dialog(),
        }
    }

    fn open_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter(DOCUMENT_FILTER.0, DOCUMENT_FILTER.1)
            .pick_file()
        {
            self.load_design(path);
        }
    }

    fn export_json(&mut self) {
        match self.builder.export_json() {
            Ok(json) => {
                self.output = json;
                self.right_panel_tab = 2;
            }
            Err(e) => self.set_status(format!("Export failed: {e}")),
        }
    }

    fn import_json(&mut self) {
        match self.builder.import_json(&self.output) {
            Ok(warnings) => {
                let n = warnings.len();
                self.warnings = warnings;
                self.tree_changed();
                self.set_status(format!("Imported design ({n} warnings)"));
            }
            Err(e) => self.set_status(format!("Import failed: {e}")),
        }
    }

    fn run_preview(&mut self) {
        match self.builder.run_preview() {
            Ok(pid) => {
                self.output = self.builder.generated_text().unwrap_or_default();
                self.set_status(format!("Preview started (pid {pid})"));
            }
            Err(e) => self.set_status(format!("{e}")),
        }
    }

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        // Show status message if recent
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed().as_secs() < 3 {
                ui.horizontal(|ui| {
                    ui.label(msg);
                });
            } else {
                self.status_message = None;
            }
        }

        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui
                    .button("New Design")
                    .on_hover_text("Start over with an empty container")
                    .clicked()
                {
                    self.new_design();
                    ui.close_kind(egui::UiKind::Menu);
                }
                ui.separator();
                if ui
                    .button("Open...")
                    .on_hover_text("Open a design file (Ctrl+O)")
                    .clicked()
                {
                    self.open_dialog();
                    ui.close_kind(egui::UiKind::Menu);
                }
                if ui
                    .button("Save")
                    .on_hover_text("Save design (Ctrl+S)")
                    .clicked()
                {
                    self.save();
                    ui.close_kind(egui::UiKind::Menu);
                }
                if ui
                    .button("Save As...")
                    .on_hover_text("Save design to a new file")
                    .clicked()
                {
                    self.save_as_dialog();
                    ui.close_kind(egui::UiKind::Menu);
                }
                ui.separator();
                if ui
                    .button("Generate Code")
                    .on_hover_text("Generate Rust code (Ctrl+G)")
                    .clicked()
                {
                    self.generate();
                    ui.close_kind(egui::UiKind::Menu);
                }
                if ui
                    .button("Export JSON")
                    .on_hover_text("Show the design document in the code panel")
                    .clicked()
                {
                    self.export_json();
                    ui.close_kind(egui::UiKind::Menu);
                }
                if ui
                    .button("Import JSON")
                    .on_hover_text("Replace the design with the document in the code panel")
                    .clicked()
                {
                    self.import_json();
                    ui.close_kind(egui::UiKind::Menu);
                }
                ui.separator();
                if ui
                    .button("Run Preview")
                    .on_hover_text("Build and run the generated program (F5)")
                    .clicked()
                {
                    self.run_preview();
                    ui.close_kind(egui::UiKind::Menu);
                }
                if ui.button("Stop Preview").clicked() {
                    self.builder.cancel_preview();
                    ui.close_kind(egui::UiKind::Menu);
                }
            });

            ui.menu_button("Edit", |ui| {
                let has_selection = self.builder.selected().is_some();
                ui.add_enabled_ui(has_selection, |ui| {
                    if ui
                        .button("Delete")
                        .on_hover_text("Delete selected (Del)")
                        .clicked()
                    {
                        self.delete_selected();
                        ui.close_kind(egui::UiKind::Menu);
                    }
                    if ui
                        .button("Duplicate")
                        .on_hover_text("Duplicate selected (Ctrl+D)")
                        .clicked()
                    {
                        self.duplicate_selected();
                        ui.close_kind(egui::UiKind::Menu);
                    }
                    ui.separator();
                    if ui
                        .button("Move Up")
                        .on_hover_text("Ctrl+Up")
                        .clicked()
                    {
                        self.move_selected(-1);
                        ui.close_kind(egui::UiKind::Menu);
                    }
                    if ui
                        .button("Move Down")
                        .on_hover_text("Ctrl+Down")
                        .clicked()
                    {
                        self.move_selected(1);
                        ui.close_kind(egui::UiKind::Menu);
                    }
                });
            });

            ui.menu_button("View", |ui| {
                ui.checkbox(&mut self.palette_open, "Show Palette");
                ui.checkbox(&mut self.syntax_highlighting, "Syntax Highlighting")
                    .on_hover_text("Enable syntax highlighting in code output");
            });

            ui.menu_button("Settings", |ui| {
                ui.strong("Code Generation");
                ui.add_space(4.0);
                ui.checkbox(&mut self.builder.auto_generate, "Auto-generate code")
                    .on_hover_text("Automatically regenerate code when the design changes");
                let comments = ui
                    .checkbox(&mut self.builder.options.comments, "Include comments")
                    .on_hover_text("Mark named components in generated code");
                let before = self.builder.options.format;
                ui.horizontal(|ui| {
                    ui.label("Output format:");
                    egui::ComboBox::from_id_salt("codegen_format")
                        .selected_text(self.builder.options.format.display_name())
                        .show_ui(ui, |ui| {
                            for format in CodeGenFormat::ALL {
                                ui.selectable_value(
                                    &mut self.builder.options.format,
                                    format,
                                    format.display_name(),
                                );
                            }
                        });
                });
                if (comments.changed() || before != self.builder.options.format)
                    && self.builder.generated().is_some()
                {
                    self.builder.generate();
                    self.output = self.builder.generated_text().unwrap_or_default();
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Generate Code").on_hover_text("Ctrl+G").clicked() {
                    self.generate();
                }
                ui.separator();
                if self.builder.preview_running() {
                    if ui.button("Stop Preview").clicked() {
                        self.builder.cancel_preview();
                    }
                } else if ui.button("Run Preview").on_hover_text("F5").clicked() {
                    self.run_preview();
                }
                if let Some(path) = &self.builder.current_file {
                    ui.separator();
                    ui.label(path.display().to_string());
                }
                ui.separator();
                ui.strong("GUI Designer");
            });
        });
    }

    fn palette_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Palette");
        ui.separator();
        ui.label("Click to add next to the selection");
        ui.add_space(4.0);

        let others: Vec<&'static str> = self
            .builder
            .registry()
            .kinds()
            .filter(|kind| !PALETTE.iter().any(|(_, kinds)| kinds.contains(kind)))
            .collect();

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let registry = self.builder.registry();
                for (section, kinds) in PALETTE {
                    egui::CollapsingHeader::new(*section)
                        .default_open(true)
                        .show(ui, |ui| {
                            for kind in kinds.iter().filter(|k| registry.lookup(k).is_some()) {
                                if ui.button(*kind).clicked() {
                                    clicked = Some(*kind);
                                }
                            }
                        });
                }
                if !others.is_empty() {
                    egui::CollapsingHeader::new("Other")
                        .default_open(false)
                        .show(ui, |ui| {
                            for kind in &others {
                                if ui.button(*kind).clicked() {
                                    clicked = Some(*kind);
                                }
                            }
                        });
                }

                ui.add_space(8.0);
                ui.separator();
                egui::CollapsingHeader::new("Shortcuts")
                    .default_open(false)
                    .show(ui, |ui| {
                        ui.small("Delete: remove");
                        ui.small("Ctrl+D: duplicate");
                        ui.small("Ctrl+Up/Down: reorder");
                        ui.small("Ctrl+S / Ctrl+O: save / open");
                        ui.small("Ctrl+G: generate");
                        ui.small("F5: run preview");
                    });
            });

        if let Some(kind) = clicked {
            self.insert(kind);
        }
    }

    fn inspector_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Inspector");
        ui.separator();
        let Some(id) = self.builder.selected() else {
            ui.label("Select a component on the canvas or in the outline");
            return;
        };
        let design = self.builder.design();
        let kind = design.get(id).map(|n| n.kind.clone()).unwrap_or_default();
        let is_root = design.root() == Some(id);
        ui.label(format!("Kind: {kind}"));
        ui.horizontal(|ui| {
            if ui.add_enabled(!is_root, egui::Button::new("Delete")).clicked() {
                self.delete_selected();
            }
            if ui.add_enabled(!is_root, egui::Button::new("Duplicate")).clicked() {
                self.duplicate_selected();
            }
            if ui.small_button("⬆").on_hover_text("Move up").clicked() {
                self.move_selected(-1);
            }
            if ui.small_button("⬇").on_hover_text("Move down").clicked() {
                self.move_selected(1);
            }
        });
        ui.add_space(6.0);

        let editors = self.builder.editors();
        let mut commit = None;
        egui::ScrollArea::vertical()
            .id_salt("inspector_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::Grid::new("inspector_grid")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        for (i, editor) in editors.iter().enumerate() {
                            if let Some(value) = property_row(ui, i, editor) {
                                commit = Some((editor.target.clone(), value));
                            }
                            ui.end_row();
                        }
                    });
            });

        if let Some((target, value)) = commit {
            match self.builder.commit(&target, value) {
                Ok(()) => self.tree_changed(),
                Err(e) => self.set_status(format!("Edit rejected: {e}")),
            }
        }
    }

    fn outline_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Outline");
        ui.separator();
        let mut clicked = None;
        egui::ScrollArea::vertical()
            .id_salt("outline_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let design = self.builder.design();
                if let Some(root) = design.root() {
                    outline_node(
                        ui,
                        design,
                        self.builder.registry(),
                        root,
                        self.builder.selected(),
                        &mut clicked,
                    );
                }
            });
        if let Some(id) = clicked {
            self.builder.select(Some(id));
        }
    }

    fn generated_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Generated Output");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.checkbox(&mut self.syntax_highlighting, "Syntax Highlighting")
                    .on_hover_text(
                        "Toggle syntax highlighting (turn off to edit or paste a document)",
                    );
            });
        });
        ui.label("Rust code (or JSON export) will appear here. Copy-paste into your app.");

        if self.syntax_highlighting && !self.output.is_empty() {
            let ext = highlight::extension_for(&self.output);
            highlight::code_viewer(ui, &self.highlighter, &self.output, ext);
        } else {
            egui::ScrollArea::vertical()
                .id_salt("generated_output_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let editor = egui::TextEdit::multiline(&mut self.output)
                        .code_editor()
                        .lock_focus(true)
                        .desired_rows(18)
                        .desired_width(f32::INFINITY);
                    ui.add(editor);
                });
        }
    }

    fn warnings_window(&mut self, ctx: &egui::Context) {
        if self.warnings.is_empty() {
            return;
        }
        let mut open = true;
        egui::Window::new("Load warnings")
            .open(&mut open)
            .default_width(360.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                    for warning in &self.warnings {
                        ui.label(warning.to_string());
                    }
                });
            });
        if !open {
            self.warnings.clear();
        }
    }
}

fn outline_node(
    ui: &mut egui::Ui,
    design: &Design,
    registry: &Registry,
    id: NodeId,
    selected: Option<NodeId>,
    clicked: &mut Option<NodeId>,
) {
    let label = registry.display_label(design, id);
    if ui.selectable_label(selected == Some(id), label).clicked() {
        *clicked = Some(id);
    }
    let children = design.children(id);
    if !children.is_empty() {
        ui.indent(id, |ui| {
            for child in children {
                outline_node(ui, design, registry, child, selected, clicked);
            }
        });
    }
}

/// One inspector row: label cell plus input cell. Returns the new value when
/// the user changed it this frame.
fn property_row(ui: &mut egui::Ui, index: usize, editor: &PropertyEditor) -> Option<EditValue> {
    let label = ui.label(&editor.label);
    if !editor.hint.is_empty() {
        label.on_hover_text(&editor.hint);
    }
    match &editor.control {
        Control::Text { value, multiline } => {
            let mut buf = value.clone();
            let edit = if *multiline {
                egui::TextEdit::multiline(&mut buf).desired_rows(4)
            } else {
                egui::TextEdit::singleline(&mut buf)
            };
            ui.add(edit.desired_width(f32::INFINITY))
                .changed()
                .then_some(EditValue::Text(buf))
        }
        Control::Toggle(value) => {
            let mut on = *value;
            ui.checkbox(&mut on, "").changed().then_some(EditValue::Bool(on))
        }
        Control::Integer { value, min, max } => {
            let mut v = *value;
            ui.add(egui::DragValue::new(&mut v).range(*min..=*max))
                .changed()
                .then_some(EditValue::Int(v))
        }
        Control::Float { value, min, max } => {
            let mut v = *value;
            ui.add(egui::DragValue::new(&mut v).speed(0.1).range(*min..=*max))
                .changed()
                .then_some(EditValue::Float(v))
        }
        Control::Choice { options, selected } => {
            let mut choice = *selected;
            egui::ComboBox::from_id_salt(("inspector_choice", index))
                .selected_text(options.get(choice).map(String::as_str).unwrap_or(""))
                .show_ui(ui, |ui| {
                    for (i, option) in options.iter().enumerate() {
                        ui.selectable_value(&mut choice, i, option);
                    }
                });
            (choice != *selected).then_some(EditValue::Choice(choice))
        }
        Control::Lines(lines) => {
            let mut buf = lines.join("\n");
            let changed = ui
                .add(
                    egui::TextEdit::multiline(&mut buf)
                        .desired_rows(4)
                        .desired_width(f32::INFINITY),
                )
                .changed();
            // Split on every newline so a freshly typed trailing line survives
            // the round trip through the model.
            let lines = if buf.is_empty() {
                Vec::new()
            } else {
                buf.split('\n').map(str::to_owned).collect()
            };
            changed.then_some(EditValue::Lines(lines))
        }
        Control::Style(style) => {
            let mut s = *style;
            ui.vertical(|ui| {
                ui.horizontal(|ui| {
                    ui.checkbox(&mut s.bold, "Bold");
                    ui.checkbox(&mut s.italic, "Italic");
                    ui.checkbox(&mut s.monospace, "Mono");
                });
                ui.horizontal(|ui| {
                    ui.label("Tab width");
                    ui.add(egui::DragValue::new(&mut s.tab_width).range(0..=16));
                });
            });
            (s != *style).then_some(EditValue::Style(s))
        }
        Control::Size(size) => {
            let mut s = *size;
            ui.horizontal(|ui| {
                ui.add(egui::DragValue::new(&mut s.width).range(0.0..=4096.0).prefix("w "));
                ui.add(egui::DragValue::new(&mut s.height).range(0.0..=4096.0).prefix("h "));
            });
            (s != *size).then_some(EditValue::Size(s))
        }
        Control::Date(date) => {
            let mut d: NaiveDate = *date;
            let salt = format!("inspector_date_{index}");
            ui.add(DatePickerButton::new(&mut d).id_salt(&salt));
            (d != *date).then_some(EditValue::Date(d))
        }
    }
}

impl eframe::App for DesignerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Text fields own the keyboard while focused
        let typing = ctx.wants_keyboard_input();
        let (
            delete_pressed,
            duplicate_pressed,
            generate_pressed,
            save_pressed,
            open_pressed,
            move_up,
            move_down,
            preview_pressed,
        ) = ctx.input(|i| {
            let del = !typing && i.key_pressed(egui::Key::Delete);
            let dup = i.modifiers.command && i.key_pressed(egui::Key::D);
            let gencode = i.modifiers.command && i.key_pressed(egui::Key::G);
            let save = i.modifiers.command && i.key_pressed(egui::Key::S);
            let open = i.modifiers.command && i.key_pressed(egui::Key::O);
            let up = !typing && i.modifiers.command && i.key_pressed(egui::Key::ArrowUp);
            let down = !typing && i.modifiers.command && i.key_pressed(egui::Key::ArrowDown);
            let preview = i.key_pressed(egui::Key::F5);
            (del, dup, gencode, save, open, up, down, preview)
        });

        if delete_pressed && self.builder.selected().is_some() {
            self.delete_selected();
        }
        if duplicate_pressed {
            self.duplicate_selected();
        }
        if move_up {
            self.move_selected(-1);
        }
        if move_down {
            self.move_selected(1);
        }
        if generate_pressed {
            self.generate();
        }
        if save_pressed {
            self.save();
        }
        if open_pressed {
            self.open_dialog();
        }
        if preview_pressed {
            self.run_preview();
        }

        egui::TopBottomPanel::top("menubar").show(ctx, |ui| self.top_bar(ui));
        if self.palette_open {
            egui::SidePanel::left("palette")
                .resizable(true)
                .show(ctx, |ui| {
                    self.palette_ui(ui);
                });
        }
        egui::SidePanel::right("inspector")
            .default_width(300.0)
            .show(ctx, |ui| {
                // Tab bar for right panel
                ui.horizontal(|ui| {
                    for (i, title) in ["Inspector", "Outline", "Code"].into_iter().enumerate() {
                        if ui
                            .selectable_label(self.right_panel_tab == i, title)
                            .clicked()
                        {
                            self.right_panel_tab = i;
                        }
                    }
                });
                ui.separator();

                match self.right_panel_tab {
                    0 => self.inspector_ui(ui),
                    1 => self.outline_ui(ui),
                    2 => self.generated_panel(ui),
                    _ => {}
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both()
                .id_salt("canvas_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let clicked = render::show(
                        ui,
                        self.builder.design(),
                        self.builder.registry(),
                        self.builder.icons(),
                        self.builder.selected(),
                    );
                    if let Some(id) = clicked {
                        self.builder.select(Some(id));
                        if self.right_panel_tab != 1 {
                            self.right_panel_tab = 0;
                        }
                    }
                });
        });

        self.warnings_window(ctx);
    }
}
