//! Style sheet injected into the editing frame.

/// Marker attribute on the injected `<style>` element. Serialization
/// leaves that element out so it never reaches saved content.
pub const EDITOR_STYLE_ATTR: &str = "data-lexdraft-editor";

/// Typography and editable-region treatment for the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceStyle {
    pub font_family: String,
    pub font_size: String,
    pub line_height: String,
    pub highlight_color: String,
    pub focus_color: String,
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        Self {
            font_family: "\"Times New Roman\", Times, serif".to_string(),
            font_size: "12pt".to_string(),
            line_height: "1.6".to_string(),
            highlight_color: "rgba(59, 130, 246, 0.08)".to_string(),
            focus_color: "#3b82f6".to_string(),
        }
    }
}

pub fn generate_editor_css(style: &SurfaceStyle) -> String {
    let SurfaceStyle {
        font_family,
        font_size,
        line_height,
        highlight_color,
        focus_color,
    } = style;

    format!(
        r#"
body {{
    font-family: {font_family};
    font-size: {font_size};
    line-height: {line_height};
    margin: 0 auto;
    max-width: 800px;
    padding: 40px;
}}
[contenteditable="true"] {{
    background-color: {highlight_color};
    border-radius: 2px;
    cursor: text;
    outline: none;
}}
[contenteditable="true"]:hover {{
    box-shadow: 0 0 0 1px {highlight_color};
}}
[contenteditable="true"]:focus {{
    box-shadow: 0 0 0 2px {focus_color};
}}
.section-title, h1, h2 {{
    cursor: default;
}}
"#
    )
}
