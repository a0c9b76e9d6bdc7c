//! Rust/egui code generation from a design.
//!
//! Every node becomes a run of statements drawing into a `ui`. Nodes whose
//! name is used more than once in the tree get a single `ui_<name>` function
//! that each use site calls; everything else is inlined where it appears.
//! Output depends only on the design, so generating twice gives identical
//! text.

use crate::model::{Design, Node, NodeId, Value};
use crate::registry::Registry;
use crate::resource::{IconHandle, ResourceTable};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const BASE_NAMESPACE: &str = "eframe::egui";

/// Code generation output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum CodeGenFormat {
    /// Single file with all code
    #[default]
    SingleFile,
    /// `Cargo.toml` followed by `src/main.rs`
    WithManifest,
    /// Just the state struct and UI functions (for embedding)
    UiOnly,
}

impl CodeGenFormat {
    pub(crate) const ALL: [CodeGenFormat; 3] = [
        CodeGenFormat::SingleFile,
        CodeGenFormat::WithManifest,
        CodeGenFormat::UiOnly,
    ];

    pub(crate) const fn display_name(&self) -> &'static str {
        match self {
            CodeGenFormat::SingleFile => "Single File",
            CodeGenFormat::WithManifest => "With Cargo.toml",
            CodeGenFormat::UiOnly => "UI Function Only",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CodeGenOptions {
    pub(crate) format: CodeGenFormat,
    /// Add comments to generated code
    pub(crate) comments: bool,
}

impl Default for CodeGenOptions {
    fn default() -> Self {
        Self {
            format: CodeGenFormat::default(),
            comments: true,
        }
    }
}

/// Result of one generation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GeneratedProgram {
    /// Standalone `src/main.rs`.
    pub(crate) main_rs: String,
    /// Companion `Cargo.toml`.
    pub(crate) manifest: String,
    /// State struct plus UI functions, without the app and `main`.
    pub(crate) ui_only: String,
    pub(crate) namespaces: BTreeSet<String>,
}

impl GeneratedProgram {
    /// Text shown in the output panel for `format`.
    pub(crate) fn render(&self, format: CodeGenFormat) -> String {
        match format {
            CodeGenFormat::SingleFile => self.main_rs.clone(),
            CodeGenFormat::WithManifest => {
                let rule = "// =============================================================================\n";
                let mut out = String::new();
                out.push_str(rule);
                out.push_str("// FILE: Cargo.toml\n");
                out.push_str(rule);
                for line in self.manifest.lines() {
                    out.push_str("// ");
                    out.push_str(line);
                    out.push('\n');
                }
                out.push('\n');
                out.push_str(rule);
                out.push_str("// FILE: src/main.rs\n");
                out.push_str(rule);
                out.push_str(&self.main_rs);
                out
            }
            CodeGenFormat::UiOnly => self.ui_only.clone(),
        }
    }
}

pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Single-line `//` comment. Control characters would end the comment
/// early, so they become spaces.
pub(crate) fn comment(text: &str) -> String {
    let line: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    format!("// {line}\n")
}

/// Quoted Rust string literal.
pub(crate) fn lit(s: &str) -> String {
    format!("\"{}\"", escape(s))
}

/// Indents every non-blank line by `levels` steps of four spaces.
pub(crate) fn indent(s: &str, levels: usize) -> String {
    let pad = "    ".repeat(levels);
    let mut out = String::with_capacity(s.len() + pad.len() * 4);
    for line in s.split_inclusive('\n') {
        if !line.trim().is_empty() {
            out.push_str(&pad);
        }
        out.push_str(line);
    }
    out
}

/// Rust identifier derived from a node name.
fn ident_for(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "n_");
    }
    out
}

struct StateField {
    name: String,
    ty: String,
    init: String,
}

/// Generation state threaded through the per-kind generators.
pub(crate) struct GenContext<'a> {
    design: &'a Design,
    registry: &'a Registry,
    icons: &'a ResourceTable,
    comments: bool,
    /// Name -> function ident, for names used more than once.
    shared: BTreeMap<String, String>,
    in_progress: BTreeSet<String>,
    definitions: Vec<(String, String)>,
    state: Vec<StateField>,
    counters: BTreeMap<String, usize>,
    namespaces: BTreeSet<String>,
}

impl<'a> GenContext<'a> {
    fn new(
        design: &'a Design,
        registry: &'a Registry,
        icons: &'a ResourceTable,
        root: Option<NodeId>,
        comments: bool,
    ) -> Self {
        let mut uses: BTreeMap<&str, usize> = BTreeMap::new();
        let mut order = Vec::new();
        for id in root.map(|r| design.walk(r)).unwrap_or_default() {
            if let Some(name) = design.name(id) {
                let count = uses.entry(name).or_default();
                if *count == 0 {
                    order.push(name);
                }
                *count += 1;
            }
        }
        let mut shared = BTreeMap::new();
        let mut taken = BTreeSet::new();
        for name in order {
            if uses.get(name).copied().unwrap_or(0) < 2 {
                continue;
            }
            let base = ident_for(name);
            let mut ident = base.clone();
            let mut n = 2;
            while !taken.insert(ident.clone()) {
                ident = format!("{base}_{n}");
                n += 1;
            }
            shared.insert(name.to_owned(), ident);
        }

        let mut namespaces = BTreeSet::new();
        namespaces.insert(BASE_NAMESPACE.to_owned());
        Self {
            design,
            registry,
            icons,
            comments,
            shared,
            in_progress: BTreeSet::new(),
            definitions: Vec::new(),
            state: Vec::new(),
            counters: BTreeMap::new(),
            namespaces,
        }
    }

    pub(crate) fn design(&self) -> &'a Design {
        self.design
    }

    pub(crate) fn require(&mut self, namespace: &str) {
        if !self.namespaces.contains(namespace) {
            self.namespaces.insert(namespace.to_owned());
        }
    }

    /// Display glyph for an icon, looked up through the resource table.
    pub(crate) fn glyph(&self, icon: Option<IconHandle>) -> &'static str {
        self.icons.glyph(icon)
    }

    fn next(&mut self, prefix: &str) -> String {
        let n = self.counters.entry(prefix.to_owned()).or_default();
        *n += 1;
        format!("{prefix}_{n}")
    }

    /// Declares a field of `GeneratedState` and returns the expression that
    /// accesses it.
    pub(crate) fn state(&mut self, prefix: &str, ty: &str, init: String) -> String {
        let name = self.next(prefix);
        let access = format!("state.{name}");
        self.state.push(StateField {
            name,
            ty: ty.to_owned(),
            init,
        });
        access
    }

    /// Fresh identifier for id salts and locals.
    pub(crate) fn salt(&mut self, prefix: &str) -> String {
        self.next(prefix)
    }

    /// Statements drawing node `id`. Shared names are emitted once as a
    /// function and called from every site.
    pub(crate) fn node(&mut self, id: NodeId) -> String {
        let design = self.design;
        let name = design.name(id);
        let shared = name.and_then(|n| Some((n, self.shared.get(n)?.clone())));
        let Some((name, ident)) = shared else {
            return self.inline(id);
        };
        if self.in_progress.contains(name) {
            // Same name nested inside its own definition.
            return self.inline(id);
        }
        if !self.definitions.iter().any(|(defined, _)| *defined == ident) {
            self.in_progress.insert(name.to_owned());
            let body = self.inline(id);
            self.in_progress.remove(name);
            self.definitions.push((ident.clone(), body));
        }
        format!("ui_{ident}(ui, state);\n")
    }

    fn inline(&mut self, id: NodeId) -> String {
        let design = self.design;
        let registry = self.registry;
        let Some(node) = design.get(id) else {
            return String::new();
        };
        let code = if let Some(body) = &node.container {
            match registry.layout_descriptor_for(design, id) {
                Some(layout) => {
                    for ns in layout.namespaces {
                        self.require(ns);
                    }
                    (layout.generate)(id, body, self)
                }
                None => {
                    let inner: String = body.children.iter().map(|c| self.node(*c)).collect();
                    format!("ui.vertical(|ui| {{\n{}}});\n", indent(&inner, 1))
                }
            }
        } else {
            match registry.lookup(&node.kind) {
                Some(desc) => {
                    for ns in desc.namespaces {
                        self.require(ns);
                    }
                    match desc.generate {
                        Some(generate) => generate(node, self),
                        None => self.reflect(node),
                    }
                }
                None => self.reflect(node),
            }
        };
        match design.name(id) {
            Some(name) if self.comments => comment(name) + &code,
            _ => code,
        }
    }

    /// Best-effort rendering of a node without a generator: a label listing
    /// its exported fields. Never fails.
    fn reflect(&mut self, node: &Node) -> String {
        debug!(kind = %node.kind, "reflective code fallback");
        let fields: Vec<String> = node
            .fields
            .iter()
            .filter(|(name, value)| {
                name.starts_with(|c: char| c.is_ascii_uppercase())
                    && !matches!(value, Value::Callback(_))
            })
            .map(|(name, value)| format!("{name}: {}", self.describe(value)))
            .collect();
        let record = if fields.is_empty() {
            node.kind.clone()
        } else {
            format!("{} {{ {} }}", node.kind, fields.join(", "))
        };
        format!(
            "{}ui.label({});\n",
            comment(&format!("{} has no generator; showing its fields.", node.kind)),
            lit(&record)
        )
    }

    fn describe(&self, value: &Value) -> String {
        match value {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) | Value::Enum(i) => i.to_string(),
            Value::Float(f) => format!("{f:?}"),
            Value::Text(s) => format!("{s:?}"),
            Value::Style(s) => format!(
                "{{ Bold: {}, Italic: {}, Monospace: {}, TabWidth: {} }}",
                s.bold, s.italic, s.monospace, s.tab_width
            ),
            Value::Icon(Some(h)) => self.icons.name_of(*h).to_owned(),
            Value::Icon(None) => "None".to_owned(),
            Value::Strings(items) => format!("{items:?}"),
            Value::Records(rows) => {
                let rows: Vec<String> = rows
                    .iter()
                    .map(|row| {
                        let parts: Vec<String> = row
                            .iter()
                            .map(|(k, v)| format!("{k}: {}", self.describe(v)))
                            .collect();
                        format!("{{ {} }}", parts.join(", "))
                    })
                    .collect();
                format!("[{}]", rows.join(", "))
            }
            Value::Node(Some(id)) => self
                .design
                .get(*id)
                .map(|n| n.kind.clone())
                .unwrap_or_else(|| "None".to_owned()),
            Value::Node(None) => "None".to_owned(),
            Value::Size(s) => format!("{{ Width: {:?}, Height: {:?} }}", s.width, s.height),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Callback(_) => "None".to_owned(),
        }
    }
}

fn state_struct(state: &[StateField]) -> String {
    let mut out = String::from("struct GeneratedState {\n");
    for field in state {
        out.push_str(&format!("    {}: {},\n", field.name, field.ty));
    }
    out.push_str("}\n\n");
    out.push_str("impl Default for GeneratedState {\n");
    out.push_str("    fn default() -> Self {\n");
    out.push_str("        Self {\n");
    for field in state {
        out.push_str(&format!("            {}: {},\n", field.name, field.init));
    }
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n\n");
    out
}

fn ui_functions(definitions: &[(String, String)], body: &str, comments: bool) -> String {
    let mut out = String::new();
    for (ident, code) in definitions {
        if comments {
            out.push_str(&format!("/// Shared by every `{ident}` site.\n"));
        }
        out.push_str(&format!(
            "fn ui_{ident}(ui: &mut egui::Ui, state: &mut GeneratedState) {{\n{}}}\n\n",
            indent(code, 1)
        ));
    }
    out.push_str("fn generated_ui(ctx: &egui::Context, state: &mut GeneratedState) {\n");
    out.push_str("    egui::CentralPanel::default().show(ctx, |ui| {\n");
    out.push_str(&indent(body, 2));
    out.push_str("    });\n");
    out.push_str("}\n");
    out
}

/// Version requirement for a crate root named in a namespace.
fn dependency_line(krate: &str) -> String {
    match krate {
        "eframe" => "eframe = \"0.33\"".to_owned(),
        "egui_extras" => {
            "egui_extras = { version = \"0.33\", features = [\"chrono\"] }".to_owned()
        }
        "chrono" => "chrono = \"0.4\"".to_owned(),
        other => format!("{other} = \"*\""),
    }
}

pub(crate) fn manifest(namespaces: &BTreeSet<String>) -> String {
    let crates: BTreeSet<&str> = namespaces
        .iter()
        .filter_map(|ns| ns.split("::").next())
        .chain(std::iter::once("eframe"))
        .collect();
    let mut out = String::from(
        "[package]\nname = \"generated-ui\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\n",
    );
    for krate in crates {
        out.push_str(&dependency_line(krate));
        out.push('\n');
    }
    out
}

/// Generates the program reproducing the tree under `root`.
pub(crate) fn generate(
    design: &Design,
    registry: &Registry,
    icons: &ResourceTable,
    root: Option<NodeId>,
    options: &CodeGenOptions,
) -> GeneratedProgram {
    let mut cx = GenContext::new(design, registry, icons, root, options.comments);
    let body = root.map(|r| cx.node(r)).unwrap_or_default();
    debug!(
        shared = cx.definitions.len(),
        state = cx.state.len(),
        "generated program"
    );

    let mut header = String::new();
    if options.comments {
        header.push_str("// =============================================================================\n");
        header.push_str("// Generated by gui-designer\n");
        header.push_str("// =============================================================================\n\n");
    } else {
        header.push_str("// --- generated by gui-designer ---\n");
    }
    let uses: String = cx
        .namespaces
        .iter()
        .map(|ns| format!("use {ns};\n"))
        .collect();
    let state = state_struct(&cx.state);
    let functions = ui_functions(&cx.definitions, &body, options.comments);

    let mut main_rs = format!("{header}{uses}\n{state}{functions}\n");
    if options.comments {
        main_rs.push_str("// =============================================================================\n");
        main_rs.push_str("// Application entry point\n");
        main_rs.push_str("// =============================================================================\n\n");
    }
    main_rs.push_str(
        "#[derive(Default)]\n\
         pub struct GeneratedApp {\n\
         \x20   state: GeneratedState,\n\
         }\n\n\
         impl eframe::App for GeneratedApp {\n\
         \x20   fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {\n\
         \x20       generated_ui(ctx, &mut self.state);\n\
         \x20   }\n\
         }\n\n\
         fn main() -> eframe::Result<()> {\n\
         \x20   let native_options = eframe::NativeOptions::default();\n\
         \x20   eframe::run_native(\n\
         \x20       \"Generated UI\",\n\
         \x20       native_options,\n\
         \x20       Box::new(|_cc| Ok(Box::new(GeneratedApp::default()))),\n\
         \x20   )\n\
         }\n",
    );

    let mut ui_only = String::new();
    if options.comments {
        ui_only.push_str("// UI function generated by gui-designer\n");
        ui_only.push_str("// Call it from your eframe::App::update method:\n");
        ui_only.push_str("// generated_ui(ctx, &mut self.state);\n\n");
    }
    ui_only.push_str(&uses);
    ui_only.push('\n');
    ui_only.push_str(&state);
    ui_only.push_str(&functions);

    GeneratedProgram {
        manifest: manifest(&cx.namespaces),
        main_rs,
        ui_only,
        namespaces: cx.namespaces,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fields, TextStyle};
    use pretty_assertions::assert_eq;

    struct Fixture {
        icons: ResourceTable,
        registry: Registry,
        design: Design,
    }

    impl Fixture {
        fn new() -> Self {
            let icons = ResourceTable::builtin();
            let registry = Registry::builtin(&icons);
            Self {
                icons,
                registry,
                design: Design::new(),
            }
        }

        fn root(&mut self) -> NodeId {
            let root = self.registry.create(&mut self.design, "Container").unwrap();
            self.design.set_root(root);
            root
        }

        fn add(&mut self, parent: NodeId, kind: &str) -> NodeId {
            let id = self.registry.create(&mut self.design, kind).unwrap();
            assert!(self.registry.add_child(&mut self.design, parent, id));
            id
        }

        fn generate(&self, options: CodeGenOptions) -> GeneratedProgram {
            generate(
                &self.design,
                &self.registry,
                &self.icons,
                self.design.root(),
                &options,
            )
        }
    }

    #[test]
    fn test_escape_and_indent() {
        assert_eq!(lit("a \"b\"\n\\"), "\"a \\\"b\\\"\\n\\\\\"");
        assert_eq!(indent("a\n\nb\n", 1), "    a\n\n    b\n");
        assert_eq!(ident_for("My Panel"), "my_panel");
        assert_eq!(ident_for("1st"), "n_1st");
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mut fx = Fixture::new();
        let root = fx.root();
        for kind in ["Label", "Entry", "Form", "DateEntry", "AppTabs", "Slider"] {
            fx.add(root, kind);
        }
        let first = fx.generate(CodeGenOptions::default());
        let second = fx.generate(CodeGenOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_shared_name_defined_once() {
        let mut fx = Fixture::new();
        let root = fx.root();
        let card = fx.add(root, "Card");
        let first = fx.add(root, "Label");
        let content = fx.design.get(card).unwrap().fields.node("Content").unwrap();
        fx.design.set_name(first, Some("shared".into()));
        fx.design.set_name(content, Some("shared".into()));

        let program = fx.generate(CodeGenOptions::default());
        let src = &program.main_rs;
        assert_eq!(src.matches("fn ui_shared(").count(), 1);
        assert_eq!(src.matches("ui_shared(ui, state);").count(), 2);
    }

    #[test]
    fn test_single_use_name_is_inlined() {
        let mut fx = Fixture::new();
        let root = fx.root();
        let label = fx.add(root, "Label");
        fx.design.set_name(label, Some("title".into()));
        let program = fx.generate(CodeGenOptions::default());
        assert!(!program.main_rs.contains("fn ui_"));
        assert!(program.main_rs.contains("// title\n"));
    }

    #[test]
    fn test_multiline_name_stays_in_comment() {
        let mut fx = Fixture::new();
        let root = fx.root();
        let label = fx.add(root, "Label");
        fx.design.set_name(label, Some("title\nfn broken(".into()));
        let src = fx.generate(CodeGenOptions::default()).main_rs;
        assert!(src.contains("// title fn broken(\n"));
        assert!(src.lines().all(|line| !line.trim_start().starts_with("fn broken(")));
    }

    #[test]
    fn test_oversized_grid_count_is_bounded() {
        let doc = crate::codec::from_json(
            r#"{"Type": "Container", "Layout": "AdaptiveGrid",
                "Objects": [{"Type": "Label", "Struct": {"Text": "only"}}],
                "Properties": {"count": "5000000"}}"#,
        )
        .unwrap();
        let fx = Fixture::new();
        let decoded = crate::codec::decode(&doc, &fx.registry, &fx.icons).unwrap();
        let program = generate(
            &decoded.design,
            &fx.registry,
            &fx.icons,
            Some(decoded.root),
            &CodeGenOptions::default(),
        );
        let fillers = program.main_rs.matches("ui.label(\"\");").count();
        assert_eq!(fillers, crate::registry::layouts::MAX_COUNT - 1);
    }

    #[test]
    fn test_state_fields_declared() {
        let mut fx = Fixture::new();
        let root = fx.root();
        fx.add(root, "Entry");
        fx.add(root, "Check");
        let src = fx.generate(CodeGenOptions::default()).main_rs;
        assert!(src.contains("    entry_1: String,\n"));
        assert!(src.contains("    checked_1: bool,\n"));
        assert!(src.contains("ui.checkbox(&mut state.checked_1, \"Check\");"));
    }

    #[test]
    fn test_reflective_fallback() {
        let mut fx = Fixture::new();
        let root = fx.root();
        let rich = fx.add(root, "RichText");
        fx.design.get_mut(rich).unwrap().fields = Fields::new()
            .with("Markdown", Value::text("**hi**"))
            .with("internal", Value::Bool(true));
        let unknown = fx.design.insert(Node::leaf(
            "Gauge",
            Fields::new().with("Style", Value::Style(TextStyle::default())),
        ));
        fx.design.append_child(root, unknown);

        let src = fx.generate(CodeGenOptions::default()).main_rs;
        assert!(src.contains("ui.label(\"RichText { Markdown: \\\"**hi**\\\" }\");"));
        assert!(src.contains("// Gauge has no generator"));
        assert!(src.contains("Gauge { Style: { Bold: false"));
    }

    #[test]
    fn test_namespaces_and_manifest() {
        let mut fx = Fixture::new();
        let root = fx.root();
        fx.add(root, "DateEntry");
        let program = fx.generate(CodeGenOptions::default());
        let namespaces: Vec<_> = program.namespaces.iter().map(String::as_str).collect();
        assert_eq!(
            namespaces,
            ["chrono::NaiveDate", "eframe::egui", "egui_extras::DatePickerButton"]
        );
        assert!(program.main_rs.contains("use egui_extras::DatePickerButton;\n"));
        assert!(program.manifest.contains("chrono = \"0.4\"\n"));
        assert!(
            program
                .manifest
                .contains("egui_extras = { version = \"0.33\", features = [\"chrono\"] }\n")
        );
        assert!(program.manifest.contains("eframe = \"0.33\"\n"));
    }

    #[test]
    fn test_formats() {
        let mut fx = Fixture::new();
        let root = fx.root();
        fx.add(root, "Button");
        let program = fx.generate(CodeGenOptions {
            format: CodeGenFormat::UiOnly,
            comments: false,
        });
        assert!(program.main_rs.contains("fn main()"));
        assert!(!program.ui_only.contains("fn main()"));
        assert!(program.ui_only.contains("fn generated_ui("));
        let with_manifest = program.render(CodeGenFormat::WithManifest);
        assert!(with_manifest.contains("// FILE: Cargo.toml"));
        assert!(with_manifest.ends_with(&program.main_rs));
    }

    #[test]
    fn test_empty_design_still_compiles_shape() {
        let fx = Fixture::new();
        let src = fx.generate(CodeGenOptions::default()).main_rs;
        assert!(src.contains("struct GeneratedState {\n}"));
        assert!(src.contains("fn generated_ui("));
    }
}
