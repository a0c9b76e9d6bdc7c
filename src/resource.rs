//! Resource symbol table: the fixed set of built-in icons, addressed by name.
//!
//! Icon handles are opaque and carry no meaning outside the process, so
//! documents and generated code always refer to icons by their symbolic
//! name. The reverse index only covers the built-in set; anything else
//! resolves to [`BROKEN_IMAGE`].

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Name emitted for handles that are not part of the built-in set.
pub(crate) const BROKEN_IMAGE: &str = "BrokenImageIcon";

/// Glyph used when an icon cannot be resolved at all.
const PLACEHOLDER_GLYPH: &str = "\u{fffd}";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct IconHandle(u32);

impl IconHandle {
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

// (name, glyph) pairs. The glyph is what the canvas and generated code draw.
const BUILTIN_ICONS: &[(&str, &str)] = &[
    ("AccountIcon", "👤"),
    ("BrokenImageIcon", "🖼"),
    ("CancelIcon", "✖"),
    ("CheckButtonCheckedIcon", "☑"),
    ("CheckButtonIcon", "☐"),
    ("ComputerIcon", "💻"),
    ("ConfirmIcon", "✔"),
    ("ContentAddIcon", "➕"),
    ("ContentClearIcon", "⌫"),
    ("ContentCopyIcon", "📋"),
    ("ContentCutIcon", "✂"),
    ("ContentPasteIcon", "📥"),
    ("ContentRedoIcon", "↷"),
    ("ContentRemoveIcon", "➖"),
    ("ContentUndoIcon", "↶"),
    ("DeleteIcon", "🗑"),
    ("DocumentCreateIcon", "📝"),
    ("DocumentIcon", "📄"),
    ("DocumentPrintIcon", "🖨"),
    ("DocumentSaveIcon", "💾"),
    ("DownloadIcon", "⬇"),
    ("ErrorIcon", "⛔"),
    ("FolderIcon", "📁"),
    ("FolderNewIcon", "🗀"),
    ("FolderOpenIcon", "📂"),
    ("GridIcon", "▦"),
    ("HelpIcon", "❔"),
    ("HistoryIcon", "🕓"),
    ("HomeIcon", "🏠"),
    ("InfoIcon", "ℹ"),
    ("ListIcon", "☰"),
    ("LoginIcon", "🔑"),
    ("LogoutIcon", "🚪"),
    ("MailComposeIcon", "✉"),
    ("MailSendIcon", "📤"),
    ("MediaPauseIcon", "⏸"),
    ("MediaPlayIcon", "▶"),
    ("MediaStopIcon", "⏹"),
    ("MenuIcon", "☰"),
    ("MoreHorizontalIcon", "⋯"),
    ("MoreVerticalIcon", "⋮"),
    ("MoveDownIcon", "⬇"),
    ("MoveUpIcon", "⬆"),
    ("NavigateBackIcon", "⬅"),
    ("NavigateNextIcon", "➡"),
    ("QuestionIcon", "❓"),
    ("SearchIcon", "🔍"),
    ("SettingsIcon", "⚙"),
    ("StorageIcon", "🗄"),
    ("UploadIcon", "⬆"),
    ("ViewFullScreenIcon", "⛶"),
    ("ViewRefreshIcon", "🔄"),
    ("VisibilityIcon", "👁"),
    ("VolumeUpIcon", "🔊"),
    ("WarningIcon", "⚠"),
];

pub(crate) struct ResourceTable {
    by_name: BTreeMap<&'static str, IconHandle>,
    by_handle: HashMap<IconHandle, &'static str>,
    glyphs: HashMap<IconHandle, &'static str>,
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ResourceTable {
    /// Builds the table from the built-in icon set.
    pub(crate) fn builtin() -> Self {
        let mut by_name = BTreeMap::new();
        let mut glyphs = HashMap::new();
        for (i, (name, glyph)) in BUILTIN_ICONS.iter().enumerate() {
            let handle = IconHandle::from_raw(i as u32 + 1);
            by_name.insert(*name, handle);
            glyphs.insert(handle, *glyph);
        }
        // Reverse index derives from the forward map; it is not authoritative
        // for handles minted elsewhere.
        let by_handle = by_name.iter().map(|(name, h)| (*h, *name)).collect();
        Self {
            by_name,
            by_handle,
            glyphs,
        }
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<IconHandle> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn name_of(&self, handle: IconHandle) -> &'static str {
        self.by_handle.get(&handle).copied().unwrap_or(BROKEN_IMAGE)
    }

    /// Display glyph for an optional icon. Unknown handles draw the broken
    /// image glyph, a missing icon draws nothing.
    pub(crate) fn glyph(&self, icon: Option<IconHandle>) -> &'static str {
        let Some(handle) = icon else {
            return "";
        };
        self.glyphs
            .get(&handle)
            .or_else(|| {
                self.resolve(BROKEN_IMAGE)
                    .and_then(|broken| self.glyphs.get(&broken))
            })
            .copied()
            .unwrap_or(PLACEHOLDER_GLYPH)
    }

    /// All addressable names, sorted.
    pub(crate) fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_name.keys().copied()
    }
}

/// Marshals an icon field as its symbolic name (or `null` when unset).
pub(crate) struct IconName<'a> {
    pub(crate) table: &'a ResourceTable,
    pub(crate) icon: Option<IconHandle>,
}

impl Serialize for IconName<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.icon {
            Some(handle) => serializer.serialize_str(self.table.name_of(handle)),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_and_name_of_are_inverse() {
        let table = ResourceTable::builtin();
        for name in table.names().collect::<Vec<_>>() {
            let handle = table.resolve(name).expect("builtin name resolves");
            assert_eq!(table.name_of(handle), name);
        }
    }

    #[test]
    fn test_unknown_handle_reports_broken_image() {
        let table = ResourceTable::builtin();
        let foreign = IconHandle::from_raw(9_999);
        assert_eq!(table.name_of(foreign), BROKEN_IMAGE);
        assert_eq!(table.glyph(Some(foreign)), "🖼");
    }

    #[test]
    fn test_resolve_unknown_name() {
        let table = ResourceTable::builtin();
        assert_eq!(table.resolve("NoSuchIcon"), None);
        assert_eq!(table.glyph(None), "");
    }

    #[test]
    fn test_icon_name_serializes_symbolically() {
        let table = ResourceTable::builtin();
        let home = table.resolve("HomeIcon");
        let json = serde_json::to_value(IconName { table: &table, icon: home }).unwrap();
        assert_eq!(json, serde_json::json!("HomeIcon"));
        let none = serde_json::to_value(IconName { table: &table, icon: None }).unwrap();
        assert!(none.is_null());
    }
}
