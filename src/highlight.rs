//! Syntax highlighting for the generated-code panel using syntect.

use egui::Color32;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const PLAIN: Color32 = Color32::LIGHT_GRAY;

/// Cached syntax highlighting resources.
pub(crate) struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub(crate) fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: "base16-ocean.dark".to_string(),
        }
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
    }

    /// Highlight `code` as the language of file extension `ext` (for example
    /// `rs`, `toml` or `json`) and return (text, color) spans. Unknown
    /// extensions are treated as plain text.
    pub(crate) fn highlight(&self, code: &str, ext: &str) -> Vec<(String, Color32)> {
        let Some(theme) = self.theme() else {
            return vec![(code.to_string(), PLAIN)];
        };
        let syntax = self
            .syntax_set
            .find_syntax_by_extension(ext)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut result = Vec::new();

        for line in LinesWithEndings::from(code) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => {
                    for (style, text) in ranges {
                        result.push((text.to_string(), style_to_color32(style)));
                    }
                }
                Err(_) => result.push((line.to_string(), PLAIN)),
            }
        }

        result
    }

    /// Render highlighted code as a LayoutJob for egui.
    pub(crate) fn layout_job(&self, code: &str, ext: &str) -> egui::text::LayoutJob {
        let mut job = egui::text::LayoutJob::default();

        for (text, color) in self.highlight(code, ext) {
            job.append(
                &text,
                0.0,
                egui::TextFormat {
                    font_id: egui::FontId::monospace(12.0),
                    color,
                    ..Default::default()
                },
            );
        }

        job
    }
}

/// Convert syntect Style to egui Color32.
fn style_to_color32(style: Style) -> Color32 {
    Color32::from_rgb(style.foreground.r, style.foreground.g, style.foreground.b)
}

/// Extension used to highlight generated output. Documents are JSON; code
/// with an embedded manifest stays Rust since the manifest is commented out.
pub(crate) fn extension_for(text: &str) -> &'static str {
    if text.trim_start().starts_with('{') {
        "json"
    } else {
        "rs"
    }
}

/// Read-only code viewer with syntax highlighting.
pub(crate) fn code_viewer(ui: &mut egui::Ui, highlighter: &Highlighter, code: &str, ext: &str) {
    let job = highlighter.layout_job(code, ext);

    egui::ScrollArea::both()
        .id_salt("highlighted_code_scroll")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.add(egui::Label::new(job).selectable(true));
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_highlight_rust_basic() {
        let highlighter = Highlighter::new();
        let spans = highlighter.highlight("fn main() {\n    println!(\"Hello\");\n}\n", "rs");
        assert!(spans.len() > 1);
        let joined: String = spans.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(joined, "fn main() {\n    println!(\"Hello\");\n}\n");
    }

    #[test]
    fn test_highlight_manifest_and_json() {
        let highlighter = Highlighter::new();
        let toml = highlighter.highlight("[dependencies]\neframe = \"0.33\"\n", "toml");
        assert!(!toml.is_empty());
        let json = highlighter.highlight("{\"Type\": \"Label\"}", "json");
        assert!(!json.is_empty());
    }

    #[test]
    fn test_unknown_extension_is_plain() {
        let highlighter = Highlighter::new();
        let spans = highlighter.highlight("anything\n", "nope");
        let joined: String = spans.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(joined, "anything\n");
    }

    #[test]
    fn test_layout_job() {
        let highlighter = Highlighter::new();
        let job = highlighter.layout_job("let x = 42;", "rs");
        assert_eq!(job.text, "let x = 42;");
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("  {\"Type\": \"Container\"}"), "json");
        assert_eq!(extension_for("use eframe::egui;\n"), "rs");
    }
}
