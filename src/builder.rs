//! The builder owns the live design and its selection, and drives the codec,
//! code generator and preview on behalf of the UI shell.

use crate::codec::{self, CodecError, DecodeWarning, DocNode};
use crate::codegen::{self, CodeGenOptions, GeneratedProgram};
use crate::model::{Design, NodeId};
use crate::preview::{self, PreviewTask};
use crate::registry::Registry;
use crate::registry::editor::{EditError, EditTarget, EditValue, PropertyEditor};
use crate::resource::ResourceTable;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub(crate) enum BuilderError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("unknown component kind `{0}`")]
    UnknownKind(String),
    #[error("nothing is selected")]
    NoSelection,
    #[error("failed to launch preview: {0}")]
    Preview(#[source] io::Error),
}

pub(crate) struct Builder {
    icons: ResourceTable,
    registry: Registry,
    design: Design,
    selected: Option<NodeId>,
    /// Current document path (for Save)
    pub(crate) current_file: Option<PathBuf>,
    pub(crate) options: CodeGenOptions,
    /// Regenerate code whenever the tree changes
    pub(crate) auto_generate: bool,
    generated: Option<GeneratedProgram>,
    preview: Option<PreviewTask>,
    /// Earlier previews still running; polled so exited ones are reaped.
    stale_previews: Vec<PreviewTask>,
    preview_dir: PathBuf,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// A builder holding a fresh design: one vertical container, selected.
    pub(crate) fn new() -> Self {
        let icons = ResourceTable::builtin();
        let registry = Registry::builtin(&icons);
        let mut builder = Self {
            icons,
            registry,
            design: Design::new(),
            selected: None,
            current_file: None,
            options: CodeGenOptions::default(),
            auto_generate: false,
            generated: None,
            preview: None,
            stale_previews: Vec::new(),
            preview_dir: preview::default_dir(),
        };
        builder.reset();
        builder
    }

    /// Replaces the design with an empty root container.
    pub(crate) fn reset(&mut self) {
        self.design = Design::new();
        if let Some(root) = self.registry.create(&mut self.design, "Container") {
            self.design.set_root(root);
        }
        self.selected = self.design.root();
        self.current_file = None;
        self.generated = None;
        self.tree_mutated();
    }

    pub(crate) fn design(&self) -> &Design {
        &self.design
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn icons(&self) -> &ResourceTable {
        &self.icons
    }

    pub(crate) fn selected(&self) -> Option<NodeId> {
        self.selected.filter(|id| self.design.contains(*id))
    }

    // -----------------------------------------------------------------------
    // Selection and editing
    // -----------------------------------------------------------------------

    /// Selection-changed event. Returns the editors for the new selection.
    pub(crate) fn select(&mut self, id: Option<NodeId>) -> Vec<PropertyEditor> {
        self.selected = id.filter(|id| self.design.contains(*id));
        self.editors()
    }

    pub(crate) fn editors(&self) -> Vec<PropertyEditor> {
        match self.selected() {
            Some(id) => self
                .registry
                .property_editors(&self.design, &self.icons, id),
            None => Vec::new(),
        }
    }

    pub(crate) fn commit(&mut self, target: &EditTarget, value: EditValue) -> Result<(), BuilderError> {
        let id = self.selected().ok_or(BuilderError::NoSelection)?;
        self.registry
            .commit(&mut self.design, &self.icons, id, target, value)?;
        self.tree_mutated();
        Ok(())
    }

    /// Tree-mutated event.
    pub(crate) fn tree_mutated(&mut self) {
        if self.auto_generate {
            self.generate();
        }
    }

    // -----------------------------------------------------------------------
    // Structural edits
    // -----------------------------------------------------------------------

    /// Creates a `kind` and attaches it to the selection, or next to it when
    /// the selection cannot take a child. The new node becomes the selection.
    pub(crate) fn insert(&mut self, kind: &str) -> Result<NodeId, BuilderError> {
        let id = self
            .registry
            .create(&mut self.design, kind)
            .ok_or_else(|| BuilderError::UnknownKind(kind.to_owned()))?;
        let Some(root) = self.design.root() else {
            self.design.set_root(id);
            self.selected = Some(id);
            self.tree_mutated();
            return Ok(id);
        };

        let anchor = self.selected().unwrap_or(root);
        let attached = if self.registry.can_add_child(&self.design, anchor) {
            self.registry.add_child(&mut self.design, anchor, id)
        } else {
            match self.design.parent_of(anchor) {
                Some(parent) if self.design.get(parent).is_some_and(|n| n.is_container()) => {
                    let index = self
                        .design
                        .get(parent)
                        .and_then(|n| n.children().iter().position(|c| *c == anchor))
                        .map_or(usize::MAX, |i| i + 1);
                    self.design.insert_child(parent, index, id)
                }
                Some(parent) if self.registry.can_add_child(&self.design, parent) => {
                    self.registry.add_child(&mut self.design, parent, id)
                }
                _ => self.registry.add_child(&mut self.design, root, id),
            }
        };
        if !attached {
            self.design.remove(id);
            return Err(BuilderError::UnknownKind(kind.to_owned()));
        }
        if let Some(parent) = self.design.parent_of(id) {
            self.registry.refresh_layout(&mut self.design, parent);
        }
        debug!(kind, "inserted");
        self.selected = Some(id);
        self.tree_mutated();
        Ok(id)
    }

    /// Removes the selected subtree. The root cannot be removed.
    pub(crate) fn remove_selected(&mut self) -> bool {
        let Some(id) = self.selected() else {
            return false;
        };
        if Some(id) == self.design.root() {
            return false;
        }
        let parent = self.design.remove(id);
        if let Some(parent) = parent {
            self.registry.refresh_layout(&mut self.design, parent);
        }
        self.selected = parent.or(self.design.root());
        self.tree_mutated();
        true
    }

    /// Deep-copies the selected subtree next to the original.
    pub(crate) fn duplicate_selected(&mut self) -> Option<NodeId> {
        let id = self.selected()?;
        let parent = self.design.parent_of(id)?;
        let placed = if self.design.get(parent)?.is_container() {
            let index = self
                .design
                .get(parent)?
                .children()
                .iter()
                .position(|c| *c == id)
                .map_or(usize::MAX, |i| i + 1);
            let copy = self.design.duplicate(id)?;
            self.design.insert_child(parent, index, copy);
            copy
        } else if self.registry.can_add_child(&self.design, parent) {
            let copy = self.design.duplicate(id)?;
            self.registry.add_child(&mut self.design, parent, copy);
            copy
        } else {
            return None;
        };
        self.registry.refresh_layout(&mut self.design, parent);
        self.selected = Some(placed);
        self.tree_mutated();
        Some(placed)
    }

    /// Moves the selection within its container; slot parameters follow.
    pub(crate) fn move_selected(&mut self, delta: isize) -> bool {
        let Some(id) = self.selected() else {
            return false;
        };
        let Some(parent) = self.design.parent_of(id) else {
            return false;
        };
        if !self.design.move_child(parent, id, delta) {
            return false;
        }
        self.registry.refresh_layout(&mut self.design, parent);
        self.tree_mutated();
        true
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    pub(crate) fn document(&self) -> Result<DocNode, BuilderError> {
        let root = self.design.root().ok_or(CodecError::MissingNode)?;
        Ok(codec::encode(&self.design, &self.registry, &self.icons, root)?)
    }

    pub(crate) fn save_to<W: Write>(&self, writer: W) -> Result<(), BuilderError> {
        codec::write_document(writer, &self.document()?)?;
        Ok(())
    }

    pub(crate) fn save(&mut self, path: &Path) -> Result<(), BuilderError> {
        let io_err = |source| BuilderError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.save_to(&mut writer)?;
        writer.flush().map_err(io_err)?;
        self.current_file = Some(path.to_path_buf());
        info!(path = %path.display(), "saved");
        Ok(())
    }

    /// Replaces the design with the decoded document. The current design is
    /// kept if the document's root cannot be decoded.
    pub(crate) fn load_document(&mut self, doc: &DocNode) -> Result<Vec<DecodeWarning>, BuilderError> {
        let decoded = codec::decode(doc, &self.registry, &self.icons)?;
        self.design = decoded.design;
        self.selected = Some(decoded.root);
        self.generated = None;
        self.tree_mutated();
        Ok(decoded.warnings)
    }

    pub(crate) fn load_from<R: Read>(&mut self, reader: R) -> Result<Vec<DecodeWarning>, BuilderError> {
        let doc = codec::read_document(reader)?;
        self.load_document(&doc)
    }

    pub(crate) fn load(&mut self, path: &Path) -> Result<Vec<DecodeWarning>, BuilderError> {
        let file = File::open(path).map_err(|source| BuilderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let warnings = self.load_from(BufReader::new(file))?;
        self.current_file = Some(path.to_path_buf());
        info!(path = %path.display(), warnings = warnings.len(), "loaded");
        Ok(warnings)
    }

    pub(crate) fn export_json(&self) -> Result<String, BuilderError> {
        Ok(codec::to_json(&self.document()?)?)
    }

    pub(crate) fn import_json(&mut self, text: &str) -> Result<Vec<DecodeWarning>, BuilderError> {
        let doc = codec::from_json(text)?;
        self.load_document(&doc)
    }

    // -----------------------------------------------------------------------
    // Code generation and preview
    // -----------------------------------------------------------------------

    pub(crate) fn generate(&mut self) -> &GeneratedProgram {
        let program = codegen::generate(
            &self.design,
            &self.registry,
            &self.icons,
            self.design.root(),
            &self.options,
        );
        self.generated.insert(program)
    }

    pub(crate) fn generated(&self) -> Option<&GeneratedProgram> {
        self.generated.as_ref()
    }

    /// Output-panel text in the configured format.
    pub(crate) fn generated_text(&self) -> Option<String> {
        self.generated
            .as_ref()
            .map(|program| program.render(self.options.format))
    }

    /// Regenerates and launches the preview without waiting for it. A
    /// previous preview is left running and reaped once it exits.
    pub(crate) fn run_preview(&mut self) -> Result<u32, BuilderError> {
        let dir = self.preview_dir.clone();
        let program = self.generate();
        let task = PreviewTask::launch(&dir, program).map_err(BuilderError::Preview)?;
        let pid = task.id();
        self.replace_preview(task);
        Ok(pid)
    }

    fn replace_preview(&mut self, task: PreviewTask) {
        if let Some(mut old) = self.preview.replace(task)
            && old.is_running()
        {
            self.stale_previews.push(old);
        }
        self.reap_previews();
    }

    fn reap_previews(&mut self) {
        self.stale_previews.retain_mut(PreviewTask::is_running);
    }

    pub(crate) fn preview_running(&mut self) -> bool {
        self.reap_previews();
        self.preview.as_mut().is_some_and(PreviewTask::is_running)
    }

    pub(crate) fn cancel_preview(&mut self) {
        if let Some(task) = self.preview.as_mut()
            && let Err(e) = task.cancel()
        {
            warn!(error = %e, "failed to stop preview");
        }
        self.preview = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::layouts::BORDER_SLOTS;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn kinds_under(builder: &Builder, id: NodeId) -> Vec<String> {
        builder
            .design()
            .get(id)
            .unwrap()
            .children()
            .iter()
            .map(|c| builder.design().get(*c).unwrap().kind.clone())
            .collect()
    }

    #[test]
    fn test_new_selects_root_container() {
        let builder = Builder::new();
        let root = builder.design().root().unwrap();
        assert_eq!(builder.selected(), Some(root));
        assert_eq!(builder.registry().layout_name(builder.design(), root), Some("VBox"));
    }

    #[test]
    fn test_insert_into_selection_or_next_to_it() {
        let mut builder = Builder::new();
        let root = builder.design().root().unwrap();
        let label = builder.insert("Label").unwrap();
        assert_eq!(builder.selected(), Some(label));
        let button = builder.insert("Button").unwrap();
        assert_eq!(builder.design().parent_of(button), Some(root));
        assert_eq!(kinds_under(&builder, root), ["Label", "Button"]);

        builder.select(Some(label));
        builder.insert("Check").unwrap();
        assert_eq!(kinds_under(&builder, root), ["Label", "Check", "Button"]);

        assert!(matches!(
            builder.insert("Gauge"),
            Err(BuilderError::UnknownKind(kind)) if kind == "Gauge"
        ));
    }

    #[test]
    fn test_insert_into_record_list_widget() {
        let mut builder = Builder::new();
        let form = builder.insert("Form").unwrap();
        let entry = builder.insert("Entry").unwrap();
        assert_eq!(builder.design().parent_of(entry), Some(form));
        let rows = builder.design().get(form).unwrap().fields.records("Items");
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_select_returns_editors() {
        let mut builder = Builder::new();
        let label = builder.insert("Label").unwrap();
        let editors = builder.select(Some(label));
        assert_eq!(editors[0].target, EditTarget::Name);
        assert!(builder.select(None).is_empty());
    }

    #[test]
    fn test_remove_selected() {
        let mut builder = Builder::new();
        let root = builder.design().root().unwrap();
        assert!(!builder.remove_selected());
        let card = builder.insert("Card").unwrap();
        assert!(builder.remove_selected());
        assert!(!builder.design().contains(card));
        assert_eq!(builder.selected(), Some(root));
        assert_eq!(builder.design().len(), 1);
    }

    #[test]
    fn test_duplicate_places_copy_after_original() {
        let mut builder = Builder::new();
        let root = builder.design().root().unwrap();
        let label = builder.insert("Label").unwrap();
        builder.insert("Button").unwrap();
        builder.select(Some(label));
        builder
            .commit(&EditTarget::Name, EditValue::Text("title".into()))
            .unwrap();
        let copy = builder.duplicate_selected().unwrap();
        assert_eq!(kinds_under(&builder, root), ["Label", "Label", "Button"]);
        assert_eq!(builder.design().name(copy), None);
        assert_eq!(builder.selected(), Some(copy));

        // A filled single slot cannot take the copy.
        let card = builder.insert("Card").unwrap();
        let content = builder.design().get(card).unwrap().fields.node("Content");
        builder.select(content);
        assert_eq!(builder.duplicate_selected(), None);
    }

    #[test]
    fn test_move_keeps_border_slot() {
        let mut builder = Builder::new();
        let root = builder.design().root().unwrap();
        let first = builder.insert("Label").unwrap();
        builder.insert("Button").unwrap();
        let params: BTreeMap<String, String> =
            [("top".to_owned(), "0".to_owned())].into_iter().collect();
        assert!(builder.registry.set_layout(&mut builder.design, root, "Border", &params));

        builder.select(Some(first));
        assert!(builder.move_selected(1));
        assert!(!builder.move_selected(1));
        let stored = &builder.design().meta(root).unwrap().params;
        assert_eq!(stored["top"], "1");
        for slot in &BORDER_SLOTS[1..] {
            assert_eq!(stored[*slot], "");
        }
    }

    #[test]
    fn test_save_and_load_streams() {
        let mut builder = Builder::new();
        builder.insert("Slider").unwrap();
        builder.insert("DateEntry").unwrap();
        let mut bytes = Vec::new();
        builder.save_to(&mut bytes).unwrap();

        let mut other = Builder::new();
        let warnings = other.load_from(bytes.as_slice()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(other.export_json().unwrap(), builder.export_json().unwrap());
        assert_eq!(other.selected(), other.design().root());
    }

    #[test]
    fn test_bad_import_keeps_design() {
        let mut builder = Builder::new();
        builder.insert("Label").unwrap();
        let before = builder.export_json().unwrap();
        assert!(matches!(
            builder.import_json(r#"{"Type": "Gauge"}"#),
            Err(BuilderError::Codec(CodecError::UnknownRoot(_)))
        ));
        assert!(builder.import_json("not json").is_err());
        assert_eq!(builder.export_json().unwrap(), before);
    }

    #[test]
    fn test_auto_generate_on_mutation() {
        let mut builder = Builder::new();
        assert!(builder.generated().is_none());
        builder.auto_generate = true;
        builder.insert("Check").unwrap();
        let text = builder.generated_text().unwrap();
        assert!(text.contains("ui.checkbox(&mut state.checked_1"));
    }

    #[test]
    fn test_commit_without_selection() {
        let mut builder = Builder::new();
        builder.select(None);
        assert!(matches!(
            builder.commit(&EditTarget::Name, EditValue::Text("x".into())),
            Err(BuilderError::NoSelection)
        ));
    }

    #[test]
    fn test_save_to_missing_directory_reports_path() {
        let mut builder = Builder::new();
        let path = std::env::temp_dir()
            .join("gui-designer-no-such-dir")
            .join("design.json");
        let err = builder.save(&path).unwrap_err();
        assert!(err.to_string().contains("design.json"));
        assert_eq!(builder.current_file, None);
    }

    #[test]
    fn test_replaced_previews_are_reaped() {
        use std::process::Command;
        use std::time::Duration;

        let mut builder = Builder::new();
        builder.replace_preview(PreviewTask::spawn(Command::new("true")).unwrap());
        for _ in 0..200 {
            if !builder.preview_running() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!builder.preview_running());

        let mut sleeper = Command::new("sleep");
        sleeper.arg("30");
        builder.replace_preview(PreviewTask::spawn(sleeper).unwrap());
        assert!(builder.stale_previews.is_empty());

        builder.replace_preview(PreviewTask::spawn(Command::new("true")).unwrap());
        assert_eq!(builder.stale_previews.len(), 1);

        for task in &mut builder.stale_previews {
            task.cancel().unwrap();
        }
        builder.reap_previews();
        assert!(builder.stale_previews.is_empty());
        builder.cancel_preview();
    }
}
