//! Component-kind descriptors: field tables, defaults and code generators.

use crate::codegen::{GenContext, indent, lit};
use crate::model::{Design, Fields, Node, NodeId, Size, TextStyle, Value};
use crate::registry::Registry;
use crate::resource::ResourceTable;
use chrono::{Datelike, NaiveDate};

pub(crate) const ALIGNMENTS: &[&str] = &["Leading", "Center", "Trailing"];
pub(crate) const WRAPPING: &[&str] = &["Off", "Truncate", "Break", "Word"];
pub(crate) const IMPORTANCE: &[&str] = &["Medium", "High", "Low", "Danger", "Warning", "Success"];
const ICON_PLACEMENT: &[&str] = &["Leading", "Trailing"];
const ORIENTATION: &[&str] = &["Horizontal", "Vertical"];
const SCROLL_DIRECTION: &[&str] = &["Both", "Horizontal", "Vertical", "None"];
const FILL_MODE: &[&str] = &["Stretch", "Contain", "Original"];
pub(crate) const TOOLBAR_ITEMS: &[&str] = &["Action", "Separator", "Spacer"];
const TAB_LOCATION: &[&str] = &["Top", "Bottom", "Leading", "Trailing"];

#[derive(Clone, Debug)]
pub(crate) enum FieldType {
    Bool,
    Int { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    Text { multiline: bool },
    Enum(&'static [&'static str]),
    Style,
    Icon,
    Strings,
    Records(Vec<FieldSpec>),
    Node,
    Size,
    Date,
    Callback,
}

impl FieldType {
    /// Transient fields hold live state and are never written to documents.
    pub(crate) fn is_transient(&self) -> bool {
        matches!(self, FieldType::Callback)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct FieldSpec {
    pub(crate) name: &'static str,
    pub(crate) ty: FieldType,
    pub(crate) default: Value,
    pub(crate) hint: &'static str,
}

impl FieldSpec {
    pub(crate) fn new(name: &'static str, ty: FieldType, default: Value) -> Self {
        Self {
            name,
            ty,
            default,
            hint: "",
        }
    }

    pub(crate) fn hint(mut self, hint: &'static str) -> Self {
        self.hint = hint;
        self
    }

    fn text(name: &'static str, default: &str) -> Self {
        Self::new(name, FieldType::Text { multiline: false }, Value::text(default))
    }

    fn boolean(name: &'static str, default: bool) -> Self {
        Self::new(name, FieldType::Bool, Value::Bool(default))
    }

    fn float(name: &'static str, default: f64) -> Self {
        Self::new(
            name,
            FieldType::Float {
                min: -1.0e6,
                max: 1.0e6,
            },
            Value::Float(default),
        )
    }

    fn choice(name: &'static str, labels: &'static [&'static str], default: i64) -> Self {
        Self::new(name, FieldType::Enum(labels), Value::Enum(default))
    }

    fn node(name: &'static str) -> Self {
        Self::new(name, FieldType::Node, Value::Node(None))
    }

    fn callback(name: &'static str) -> Self {
        Self::new(name, FieldType::Callback, Value::Callback(Default::default()))
    }

    fn records(name: &'static str, row: Vec<FieldSpec>) -> Self {
        Self::new(name, FieldType::Records(row), Value::Records(Vec::new()))
    }

    /// Default row for a record-list field.
    pub(crate) fn default_row(&self) -> Fields {
        match &self.ty {
            FieldType::Records(row) => row
                .iter()
                .map(|spec| (spec.name, spec.default.clone()))
                .collect(),
            _ => Fields::new(),
        }
    }
}

pub(crate) type GenerateFn = fn(&Node, &mut GenContext<'_>) -> String;
pub(crate) type PopulateFn = fn(&Registry, &mut Design, NodeId);

pub(crate) struct WidgetDescriptor {
    pub(crate) kind: &'static str,
    pub(crate) fields: Vec<FieldSpec>,
    pub(crate) container: bool,
    /// Adds default nested content after creation.
    pub(crate) populate: Option<PopulateFn>,
    /// Kinds without a generator go through the reflective fallback.
    pub(crate) generate: Option<GenerateFn>,
    pub(crate) namespaces: &'static [&'static str],
}

impl WidgetDescriptor {
    fn leaf(kind: &'static str, fields: Vec<FieldSpec>, generate: GenerateFn) -> Self {
        Self {
            kind,
            fields,
            container: false,
            populate: None,
            generate: Some(generate),
            namespaces: EGUI,
        }
    }

    fn populate(mut self, populate: PopulateFn) -> Self {
        self.populate = Some(populate);
        self
    }

    pub(crate) fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fresh field values for a new instance.
    pub(crate) fn defaults(&self) -> Fields {
        self.fields
            .iter()
            .map(|spec| (spec.name, spec.default.clone()))
            .collect()
    }

    /// Whether children can be attached through nested-node fields.
    pub(crate) fn has_slots(&self) -> bool {
        self.fields.iter().any(|f| match &f.ty {
            FieldType::Node => true,
            FieldType::Records(row) => row.iter().any(|r| matches!(r.ty, FieldType::Node)),
            _ => false,
        })
    }
}

const EGUI: &[&str] = &["eframe::egui"];
const DATE_NAMESPACES: &[&str] = &[
    "chrono::NaiveDate",
    "eframe::egui",
    "egui_extras::DatePickerButton",
];

pub(crate) fn builtin(icons: &ResourceTable) -> Vec<WidgetDescriptor> {
    let icon = |name: &str| Value::Icon(icons.resolve(name));
    let default_date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN);

    vec![
        WidgetDescriptor::leaf(
            "Label",
            vec![
                FieldSpec::text("Text", "Label"),
                FieldSpec::choice("Alignment", ALIGNMENTS, 0),
                FieldSpec::choice("Wrapping", WRAPPING, 0),
                FieldSpec::new("TextStyle", FieldType::Style, Value::Style(TextStyle::default())),
                FieldSpec::choice("Importance", IMPORTANCE, 0),
            ],
            generate_label,
        ),
        WidgetDescriptor::leaf(
            "Button",
            vec![
                FieldSpec::text("Text", "Button"),
                FieldSpec::new("Icon", FieldType::Icon, Value::Icon(None)),
                FieldSpec::choice("Importance", IMPORTANCE, 0),
                FieldSpec::choice("Alignment", ALIGNMENTS, 1),
                FieldSpec::choice("IconPlacement", ICON_PLACEMENT, 0),
                FieldSpec::callback("OnTapped"),
            ],
            generate_button,
        ),
        WidgetDescriptor::leaf(
            "Entry",
            vec![
                FieldSpec::text("Text", ""),
                FieldSpec::text("PlaceHolder", "Type here").hint("Shown while empty"),
                FieldSpec::boolean("MultiLine", false),
                FieldSpec::new("MinRows", FieldType::Int { min: 1, max: 20 }, Value::Int(3))
                    .hint("Visible rows when multi-line"),
                FieldSpec::boolean("Password", false),
                FieldSpec::choice("Wrapping", WRAPPING, 0),
                FieldSpec::new("TextStyle", FieldType::Style, Value::Style(TextStyle::default())),
                FieldSpec::callback("OnChanged"),
            ],
            generate_entry,
        ),
        WidgetDescriptor::leaf(
            "Check",
            vec![
                FieldSpec::text("Text", "Check"),
                FieldSpec::boolean("Checked", false),
                FieldSpec::callback("OnChanged"),
            ],
            generate_check,
        ),
        WidgetDescriptor::leaf(
            "Hyperlink",
            vec![
                FieldSpec::text("Text", "Open website"),
                FieldSpec::text("URL", "https://example.com"),
                FieldSpec::choice("Alignment", ALIGNMENTS, 0),
            ],
            generate_hyperlink,
        ),
        WidgetDescriptor::leaf(
            "Icon",
            vec![FieldSpec::new("Resource", FieldType::Icon, icon("HomeIcon"))],
            generate_icon,
        ),
        WidgetDescriptor::leaf(
            "Image",
            vec![
                FieldSpec::text("File", "image.png").hint("Path or URI"),
                FieldSpec::choice("FillMode", FILL_MODE, 1),
                FieldSpec::new("MinSize", FieldType::Size, Value::Size(Size::new(150.0, 150.0))),
            ],
            generate_image,
        ),
        WidgetDescriptor::leaf(
            "ProgressBar",
            vec![
                FieldSpec::float("Min", 0.0),
                FieldSpec::float("Max", 1.0),
                FieldSpec::float("Value", 0.25),
            ],
            generate_progress,
        ),
        WidgetDescriptor::leaf(
            "Slider",
            vec![
                FieldSpec::float("Min", 0.0),
                FieldSpec::float("Max", 100.0),
                FieldSpec::float("Step", 1.0),
                FieldSpec::float("Value", 42.0),
                FieldSpec::choice("Orientation", ORIENTATION, 0),
                FieldSpec::callback("OnChanged"),
            ],
            generate_slider,
        ),
        WidgetDescriptor::leaf(
            "Select",
            vec![
                FieldSpec::new(
                    "Options",
                    FieldType::Strings,
                    Value::strings(["Red", "Green", "Blue"]),
                )
                .hint("One option per line"),
                FieldSpec::text("Selected", ""),
                FieldSpec::text("PlaceHolder", "(Select one)"),
                FieldSpec::callback("OnChanged"),
            ],
            generate_select,
        ),
        WidgetDescriptor::leaf(
            "RadioGroup",
            vec![
                FieldSpec::new(
                    "Options",
                    FieldType::Strings,
                    Value::strings(["Option A", "Option B", "Option C"]),
                )
                .hint("One option per line"),
                FieldSpec::text("Selected", "Option A"),
                FieldSpec::boolean("Horizontal", false),
                FieldSpec::callback("OnChanged"),
            ],
            generate_radio,
        ),
        WidgetDescriptor::leaf("Separator", vec![], |_, _| "ui.separator();\n".to_owned()),
        WidgetDescriptor::leaf("Activity", vec![], |_, _| "ui.spinner();\n".to_owned()),
        WidgetDescriptor {
            namespaces: DATE_NAMESPACES,
            ..WidgetDescriptor::leaf(
                "DateEntry",
                vec![FieldSpec::new("Date", FieldType::Date, Value::Date(default_date))],
                generate_date,
            )
        },
        WidgetDescriptor {
            generate: None,
            ..WidgetDescriptor::leaf(
                "RichText",
                vec![
                    FieldSpec::new(
                        "Markdown",
                        FieldType::Text { multiline: true },
                        Value::text("# Title\n\nSome *rich* text"),
                    ),
                    FieldSpec::choice("Wrapping", WRAPPING, 3),
                ],
                |_, _| String::new(),
            )
        },
        WidgetDescriptor::leaf(
            "Toolbar",
            vec![FieldSpec {
                default: Value::Records(vec![
                    toolbar_item(0, icon("DocumentCreateIcon")),
                    toolbar_item(1, Value::Icon(None)),
                    toolbar_item(0, icon("ContentCopyIcon")),
                    toolbar_item(0, icon("ContentPasteIcon")),
                ]),
                ..FieldSpec::records(
                    "Items",
                    vec![
                        FieldSpec::choice("Type", TOOLBAR_ITEMS, 0),
                        FieldSpec::new("Icon", FieldType::Icon, Value::Icon(None)),
                    ],
                )
            }],
            generate_toolbar,
        ),
        WidgetDescriptor::leaf(
            "Form",
            vec![
                FieldSpec::records(
                    "Items",
                    vec![
                        FieldSpec::text("Text", "Field"),
                        FieldSpec::text("HintText", ""),
                        FieldSpec::node("Widget"),
                    ],
                ),
                FieldSpec::text("SubmitText", "Submit"),
                FieldSpec::text("CancelText", ""),
                FieldSpec::callback("OnSubmit"),
            ],
            generate_form,
        )
        .populate(populate_form),
        WidgetDescriptor::leaf(
            "AppTabs",
            vec![
                FieldSpec::records(
                    "Items",
                    vec![
                        FieldSpec::text("Text", "Tab"),
                        FieldSpec::new("Icon", FieldType::Icon, Value::Icon(None)),
                        FieldSpec::node("Content"),
                    ],
                ),
                FieldSpec::choice("Location", TAB_LOCATION, 0),
            ],
            generate_tabs,
        )
        .populate(populate_tabs),
        WidgetDescriptor::leaf(
            "Card",
            vec![
                FieldSpec::text("Title", "Card"),
                FieldSpec::text("Subtitle", ""),
                FieldSpec::node("Content"),
            ],
            generate_card,
        )
        .populate(|registry, design, id| fill_slot(registry, design, id, "Content", "Card content")),
        WidgetDescriptor::leaf(
            "Scroll",
            vec![
                FieldSpec::choice("Direction", SCROLL_DIRECTION, 0),
                FieldSpec::node("Content"),
            ],
            generate_scroll,
        )
        .populate(|registry, design, id| {
            fill_slot(registry, design, id, "Content", "Scrolling content")
        }),
        WidgetDescriptor::leaf(
            "Split",
            vec![
                FieldSpec::boolean("Horizontal", true),
                FieldSpec::float("Offset", 0.5).hint("Fraction given to the leading side"),
                FieldSpec::node("Leading"),
                FieldSpec::node("Trailing"),
            ],
            generate_split,
        )
        .populate(|registry, design, id| {
            fill_slot(registry, design, id, "Leading", "Leading");
            fill_slot(registry, design, id, "Trailing", "Trailing");
        }),
        WidgetDescriptor {
            kind: "Container",
            fields: vec![],
            container: true,
            populate: None,
            generate: None,
            namespaces: EGUI,
        },
    ]
}

fn toolbar_item(kind: i64, icon: Value) -> Fields {
    Fields::new().with("Type", Value::Enum(kind)).with("Icon", icon)
}

fn new_label(registry: &Registry, design: &mut Design, text: &str) -> Option<NodeId> {
    let id = registry.create(design, "Label")?;
    if let Some(node) = design.get_mut(id) {
        node.fields.set("Text", Value::text(text));
    }
    Some(id)
}

fn fill_slot(registry: &Registry, design: &mut Design, id: NodeId, field: &str, text: &str) {
    let label = new_label(registry, design, text);
    if let Some(node) = design.get_mut(id) {
        node.fields.set(field, Value::Node(label));
    }
}

fn populate_form(registry: &Registry, design: &mut Design, id: NodeId) {
    let mut rows = Vec::new();
    for (text, hint) in [("Name", "Your full name"), ("Email", "")] {
        let entry = registry.create(design, "Entry");
        rows.push(
            Fields::new()
                .with("Text", Value::text(text))
                .with("HintText", Value::text(hint))
                .with("Widget", Value::Node(entry)),
        );
    }
    if let Some(node) = design.get_mut(id) {
        node.fields.set("Items", Value::Records(rows));
    }
}

fn populate_tabs(registry: &Registry, design: &mut Design, id: NodeId) {
    let mut rows = Vec::new();
    for text in ["Tab 1", "Tab 2"] {
        let content = new_label(registry, design, &format!("{text} content"));
        rows.push(
            Fields::new()
                .with("Text", Value::text(text))
                .with("Icon", Value::Icon(None))
                .with("Content", Value::Node(content)),
        );
    }
    if let Some(node) = design.get_mut(id) {
        node.fields.set("Items", Value::Records(rows));
    }
}

// ---------------------------------------------------------------------------
// Code generators. Each returns statements drawing the widget into `ui`.
// ---------------------------------------------------------------------------

pub(crate) fn rich_text(text: &str, style: TextStyle, importance: i64) -> String {
    let mut out = format!("egui::RichText::new({})", lit(text));
    if style.bold {
        out.push_str(".strong()");
    }
    if style.italic {
        out.push_str(".italics()");
    }
    if style.monospace {
        out.push_str(".monospace()");
    }
    out.push_str(match importance {
        1 => ".color(egui::Color32::LIGHT_BLUE)",
        2 => ".weak()",
        3 => ".color(egui::Color32::RED)",
        4 => ".color(egui::Color32::YELLOW)",
        5 => ".color(egui::Color32::GREEN)",
        _ => "",
    });
    out
}

fn aligned(alignment: i64, body: String) -> String {
    match alignment {
        1 => format!("ui.vertical_centered(|ui| {{\n{}}});\n", indent(&body, 1)),
        2 => format!(
            "ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {{\n{}}});\n",
            indent(&body, 1)
        ),
        _ => body,
    }
}

fn generate_label(node: &Node, _: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let text = rich_text(f.text("Text"), f.style("TextStyle"), f.int("Importance"));
    let wrap = match f.int("Wrapping") {
        0 => ".extend()",
        1 => ".truncate()",
        _ => ".wrap()",
    };
    aligned(
        f.int("Alignment"),
        format!("ui.add(egui::Label::new({text}){wrap});\n"),
    )
}

fn generate_button(node: &Node, cx: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let glyph = cx.glyph(f.icon("Icon"));
    let text = f.text("Text");
    let caption = match (glyph.is_empty(), f.int("IconPlacement")) {
        (true, _) => text.to_owned(),
        (false, 1) => format!("{text} {glyph}"),
        (false, _) => format!("{glyph} {text}"),
    };
    let mut button = format!("egui::Button::new({})", lit(caption.trim()));
    match f.int("Importance") {
        1 => button.push_str(".fill(ui.visuals().selection.bg_fill)"),
        3 => button.push_str(".fill(egui::Color32::DARK_RED)"),
        _ => {}
    }
    aligned(f.int("Alignment"), format!("ui.add({button});\n"))
}

fn generate_entry(node: &Node, cx: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let field = cx.state(
        "entry",
        "String",
        format!("{}.to_owned()", lit(f.text("Text"))),
    );
    let mut edit = if f.bool("MultiLine") {
        format!(
            "egui::TextEdit::multiline(&mut {field}).desired_rows({})",
            f.int("MinRows").clamp(1, 20)
        )
    } else {
        format!("egui::TextEdit::singleline(&mut {field})")
    };
    let placeholder = f.text("PlaceHolder");
    if !placeholder.is_empty() {
        edit.push_str(&format!(".hint_text({})", lit(placeholder)));
    }
    if f.bool("Password") {
        edit.push_str(".password(true)");
    }
    if f.style("TextStyle").monospace {
        edit.push_str(".font(egui::TextStyle::Monospace)");
    }
    format!("ui.add({edit});\n")
}

fn generate_check(node: &Node, cx: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let field = cx.state("checked", "bool", f.bool("Checked").to_string());
    format!("ui.checkbox(&mut {field}, {});\n", lit(f.text("Text")))
}

fn generate_hyperlink(node: &Node, _: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    aligned(
        f.int("Alignment"),
        format!(
            "ui.hyperlink_to({}, {});\n",
            lit(f.text("Text")),
            lit(f.text("URL"))
        ),
    )
}

fn generate_icon(node: &Node, cx: &mut GenContext<'_>) -> String {
    let glyph = cx.glyph(node.fields.icon("Resource"));
    format!("ui.label({});\n", lit(glyph))
}

fn generate_image(node: &Node, _: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let file = f.text("File");
    let uri = if file.contains("://") {
        file.to_owned()
    } else {
        format!("file://{file}")
    };
    let size = f.size("MinSize");
    let sizing = match f.int("FillMode") {
        0 => format!(
            ".fit_to_exact_size(egui::vec2({:.1}, {:.1}))",
            size.width, size.height
        ),
        1 => format!(
            ".max_size(egui::vec2({:.1}, {:.1})).maintain_aspect_ratio(true)",
            size.width, size.height
        ),
        _ => String::new(),
    };
    format!("ui.add(egui::Image::new({}){sizing});\n", lit(&uri))
}

/// Fraction of `value` between `min` and `max`, clamped to 0..=1.
pub(crate) fn progress_fraction(min: f64, max: f64, value: f64) -> f32 {
    if max > min {
        ((value - min) / (max - min)).clamp(0.0, 1.0) as f32
    } else {
        0.0
    }
}

fn generate_progress(node: &Node, _: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let fraction = progress_fraction(f.float("Min"), f.float("Max"), f.float("Value"));
    format!("ui.add(egui::ProgressBar::new({fraction:.3}).show_percentage());\n")
}

fn generate_slider(node: &Node, cx: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let field = cx.state("slider", "f64", format!("{:?}", f.float("Value")));
    let mut slider = format!(
        "egui::Slider::new(&mut {field}, {:?}..={:?})",
        f.float("Min"),
        f.float("Max")
    );
    let step = f.float("Step");
    if step > 0.0 {
        slider.push_str(&format!(".step_by({step:?})"));
    }
    if f.int("Orientation") == 1 {
        slider.push_str(".vertical()");
    }
    format!("ui.add({slider});\n")
}

fn generate_select(node: &Node, cx: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let field = cx.state(
        "selected",
        "String",
        format!("{}.to_owned()", lit(f.text("Selected"))),
    );
    let salt = cx.salt("select");
    let options: String = f
        .strings("Options")
        .iter()
        .map(|o| format!("ui.selectable_value(&mut {field}, {}.to_owned(), {});\n", lit(o), lit(o)))
        .collect();
    format!(
        "egui::ComboBox::from_id_salt(\"{salt}\")\n    .selected_text(if {field}.is_empty() {{ {} }} else {{ {field}.as_str() }})\n    .show_ui(ui, |ui| {{\n{}    }});\n",
        lit(f.text("PlaceHolder")),
        indent(&options, 2)
    )
}

fn generate_radio(node: &Node, cx: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let field = cx.state(
        "choice",
        "String",
        format!("{}.to_owned()", lit(f.text("Selected"))),
    );
    let options: String = f
        .strings("Options")
        .iter()
        .map(|o| format!("ui.radio_value(&mut {field}, {}.to_owned(), {});\n", lit(o), lit(o)))
        .collect();
    let method = if f.bool("Horizontal") {
        "horizontal"
    } else {
        "vertical"
    };
    format!("ui.{method}(|ui| {{\n{}}});\n", indent(&options, 1))
}

fn generate_date(node: &Node, cx: &mut GenContext<'_>) -> String {
    let date = node.fields.date("Date").unwrap_or(NaiveDate::MIN);
    let field = cx.state(
        "date",
        "NaiveDate",
        format!(
            "NaiveDate::from_ymd_opt({}, {}, {}).unwrap_or_default()",
            date.year(),
            date.month(),
            date.day()
        ),
    );
    let salt = cx.salt("date");
    format!("ui.add(DatePickerButton::new(&mut {field}).id_salt(\"{salt}\"));\n")
}

fn generate_toolbar(node: &Node, cx: &mut GenContext<'_>) -> String {
    let mut inner = String::new();
    for item in node.fields.records("Items") {
        match item.int("Type") {
            1 => inner.push_str("ui.separator();\n"),
            2 => inner.push_str("ui.add_space(16.0);\n"),
            _ => {
                let glyph = cx.glyph(item.icon("Icon"));
                inner.push_str(&format!("let _ = ui.button({});\n", lit(glyph)));
            }
        }
    }
    format!("ui.horizontal(|ui| {{\n{}}});\n", indent(&inner, 1))
}

fn generate_form(node: &Node, cx: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let salt = cx.salt("form");
    let mut rows = String::new();
    for item in f.records("Items") {
        let hint = item.text("HintText");
        if hint.is_empty() {
            rows.push_str(&format!("ui.label({});\n", lit(item.text("Text"))));
        } else {
            rows.push_str(&format!(
                "ui.label({}).on_hover_text({});\n",
                lit(item.text("Text")),
                lit(hint)
            ));
        }
        match item.node("Widget") {
            Some(widget) => rows.push_str(&cx.node(widget)),
            None => rows.push_str("ui.label(\"\");\n"),
        }
        rows.push_str("ui.end_row();\n");
    }
    let mut out = format!(
        "egui::Grid::new(\"{salt}\").num_columns(2).show(ui, |ui| {{\n{}}});\n",
        indent(&rows, 1)
    );
    let buttons: String = ["CancelText", "SubmitText"]
        .iter()
        .map(|k| f.text(k))
        .filter(|t| !t.is_empty())
        .map(|t| format!("let _ = ui.button({});\n", lit(t)))
        .collect();
    if !buttons.is_empty() {
        out.push_str(&format!("ui.horizontal(|ui| {{\n{}}});\n", indent(&buttons, 1)));
    }
    out
}

fn generate_tabs(node: &Node, cx: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let field = cx.state("tab", "usize", "0".to_owned());
    let mut header = String::new();
    let mut arms = String::new();
    for (i, item) in f.records("Items").iter().enumerate() {
        let glyph = cx.glyph(item.icon("Icon"));
        let caption = format!("{glyph} {}", item.text("Text"));
        header.push_str(&format!(
            "ui.selectable_value(&mut {field}, {i}, {});\n",
            lit(caption.trim())
        ));
        let content = item.node("Content").map(|c| cx.node(c)).unwrap_or_default();
        arms.push_str(&format!("{i} => {{\n{}}}\n", indent(&content, 1)));
    }
    arms.push_str("_ => {}\n");
    let tabs = format!("ui.horizontal(|ui| {{\n{}}});\n", indent(&header, 1));
    let body = format!("match {field} {{\n{}}}\n", indent(&arms, 1));
    if f.int("Location") == 1 {
        format!("{body}ui.separator();\n{tabs}")
    } else {
        format!("{tabs}ui.separator();\n{body}")
    }
}

fn generate_card(node: &Node, cx: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let mut inner = String::new();
    if !f.text("Title").is_empty() {
        inner.push_str(&format!("ui.heading({});\n", lit(f.text("Title"))));
    }
    if !f.text("Subtitle").is_empty() {
        inner.push_str(&format!(
            "ui.label(egui::RichText::new({}).weak());\n",
            lit(f.text("Subtitle"))
        ));
    }
    if let Some(content) = f.node("Content") {
        inner.push_str(&cx.node(content));
    }
    format!(
        "egui::Frame::group(ui.style()).show(ui, |ui| {{\n{}}});\n",
        indent(&inner, 1)
    )
}

fn generate_scroll(node: &Node, cx: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let (h, v) = match f.int("Direction") {
        1 => (true, false),
        2 => (false, true),
        3 => (false, false),
        _ => (true, true),
    };
    let salt = cx.salt("scroll");
    let content = f.node("Content").map(|c| cx.node(c)).unwrap_or_default();
    format!(
        "egui::ScrollArea::new([{h}, {v}]).id_salt(\"{salt}\").show(ui, |ui| {{\n{}}});\n",
        indent(&content, 1)
    )
}

fn generate_split(node: &Node, cx: &mut GenContext<'_>) -> String {
    let f = &node.fields;
    let leading = f.node("Leading").map(|c| cx.node(c)).unwrap_or_default();
    let trailing = f.node("Trailing").map(|c| cx.node(c)).unwrap_or_default();
    if f.bool("Horizontal") {
        format!(
            "ui.columns(2, |columns| {{\n    {{\n        let ui = &mut columns[0];\n{}    }}\n    {{\n        let ui = &mut columns[1];\n{}    }}\n}});\n",
            indent(&leading, 2),
            indent(&trailing, 2)
        )
    } else {
        format!(
            "ui.vertical(|ui| {{\n{}    ui.separator();\n{}}});\n",
            indent(&leading, 1),
            indent(&trailing, 1)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_is_unique() {
        let kinds = builtin(&ResourceTable::builtin());
        let mut names: Vec<_> = kinds.iter().map(|k| k.kind).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), kinds.len());
    }

    #[test]
    fn test_defaults_follow_field_order() {
        let kinds = builtin(&ResourceTable::builtin());
        let label = kinds.iter().find(|k| k.kind == "Label").unwrap();
        let names: Vec<_> = label.defaults().iter().map(|(k, _)| k.to_owned()).collect();
        assert_eq!(
            names,
            ["Text", "Alignment", "Wrapping", "TextStyle", "Importance"]
        );
    }

    #[test]
    fn test_icon_default_resolves() {
        let icons = ResourceTable::builtin();
        let kinds = builtin(&icons);
        let icon = kinds.iter().find(|k| k.kind == "Icon").unwrap();
        assert_eq!(icon.defaults().icon("Resource"), icons.resolve("HomeIcon"));
    }

    #[test]
    fn test_slots_detected() {
        let kinds = builtin(&ResourceTable::builtin());
        let with_slots: Vec<_> = kinds.iter().filter(|k| k.has_slots()).map(|k| k.kind).collect();
        assert_eq!(with_slots, ["Form", "AppTabs", "Card", "Scroll", "Split"]);
    }

    #[test]
    fn test_rich_text_modifiers() {
        let style = TextStyle {
            bold: true,
            italic: true,
            ..Default::default()
        };
        assert_eq!(
            rich_text("Hi", style, 2),
            "egui::RichText::new(\"Hi\").strong().italics().weak()"
        );
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(progress_fraction(0.0, 10.0, 5.0), 0.5);
        assert_eq!(progress_fraction(0.0, 10.0, 50.0), 1.0);
        assert_eq!(progress_fraction(1.0, 1.0, 1.0), 0.0);
    }
}
