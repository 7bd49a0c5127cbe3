//! Static SVG compositor: page background, entity mark rectangles, text rows
//! and the connector overlay, in that paint order. Mark rectangles follow the
//! tree's depth-first order so nested marks paint over their parents.

use crate::layout::TextLayout;
use crate::router::Surface;
use crate::span::SpanTree;
use crate::theme::Theme;
use crate::xml::{escape_attr, escape_text};

/// Fill opacity for marks whose entity supplied no color.
const DEFAULT_MARK_OPACITY: f32 = 0.35;

pub fn render(tree: &SpanTree, layout: &TextLayout, surface: &Surface, theme: &Theme) -> String {
    let width = layout.width();
    let height = layout.height();

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}">"#
    );
    svg.push_str(&format!(
        r#"<rect width="100%" height="100%" fill="{}" />"#,
        escape_attr(&theme.background_color)
    ));

    for mark in tree.marks() {
        let (fill, opacity) = match &mark.background {
            Some(color) => (color.clone(), String::new()),
            None => (
                theme.muted_color.clone(),
                format!(r#" fill-opacity="{DEFAULT_MARK_OPACITY}""#),
            ),
        };
        for seg in layout.segments_of(&mark.entity_id) {
            svg.push_str(&format!(
                r#"<rect data-entity-id="{}" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{}"{} />"#,
                escape_attr(&mark.entity_id),
                seg.x,
                seg.y + theme.mark_pad_y,
                seg.width,
                seg.height - theme.mark_pad_y * 2.0,
                theme.mark_radius,
                escape_attr(&fill),
                opacity,
            ));
        }
    }

    for row in layout.rows() {
        if row.text.is_empty() {
            continue;
        }
        svg.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="{:.2}" fill="{}">{}</text>"#,
            row.x,
            row.baseline,
            theme.font_size,
            escape_attr(&theme.text_color),
            escape_text(&row.text),
        ));
    }

    svg.push_str(&surface.to_svg_fragment(&theme.connector_color));
    svg.push_str("</svg>");
    svg
}
