//! Geometry source for the relation router.
//!
//! The router never touches a concrete layout engine; it talks to a
//! [`LayoutProvider`], which reports the text container's box and per-entity
//! bounding boxes in a shared coordinate space. [`TextLayout`] is the
//! production implementation, shaping the document text with cosmic-text at a
//! fixed width so entity boxes reflect real line wrapping.

use std::collections::HashMap;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};

use crate::geometry::Rect;
use crate::span::SpanTree;
use crate::theme::Theme;

/// Capability supplying the boxes the router measures.
///
/// All rectangles are expressed in one coordinate space; the router
/// translates them into surface-local coordinates by subtracting the
/// container origin. A `None` from any method degrades gracefully: missing
/// entity boxes skip the relation, a missing container aborts the sync.
pub trait LayoutProvider {
    fn container_box(&self) -> Option<Rect>;
    fn box_of(&self, entity_id: &str) -> Option<Rect>;
    fn line_height_of(&self, entity_id: &str) -> Option<f32>;
}

/// One visual row of laid-out text, for the SVG compositor.
#[derive(Debug, Clone)]
pub struct Row {
    /// Top edge, container-local.
    pub top: f32,
    /// Left edge of the first glyph, container-local.
    pub x: f32,
    pub baseline: f32,
    pub text: String,
}

/// Static text layout produced by cosmic-text.
///
/// Boxes are container-local with the theme padding already applied, so the
/// container box itself sits at the origin.
pub struct TextLayout {
    width: f32,
    height: f32,
    line_height: f32,
    rows: Vec<Row>,
    boxes: HashMap<String, Rect>,
    segments: HashMap<String, Vec<Rect>>,
}

impl TextLayout {
    /// Shapes `text` at `width` and measures a box for every mark in `tree`.
    pub fn new(text: &str, tree: &SpanTree, theme: &Theme, width: f32) -> Self {
        let content_width = (width - theme.padding_x * 2.0).max(theme.font_size);
        let line_height = theme.line_height_px();

        let mut font_system = FontSystem::new();
        let mut buffer = Buffer::new(
            &mut font_system,
            Metrics {
                font_size: theme.font_size,
                line_height,
            },
        );
        buffer.set_size(&mut font_system, Some(content_width), None);
        let attrs = Attrs::new().family(Family::SansSerif);
        buffer.set_text(&mut font_system, text, &attrs, Shaping::Advanced, None);

        // Byte offset where each buffer line ('\n'-separated) starts.
        let mut line_offsets = Vec::new();
        let mut offset = 0usize;
        for line in text.split('\n') {
            line_offsets.push(offset);
            offset += line.len() + 1;
        }

        let mut rows = Vec::new();
        // (global_start, global_end, x, w, row_top) for every glyph.
        let mut glyph_spans: Vec<(usize, usize, f32, f32, f32)> = Vec::new();
        let mut content_height = 0.0f32;

        for run in buffer.layout_runs() {
            let base = line_offsets.get(run.line_i).copied().unwrap_or(0);
            content_height = content_height.max(run.line_top + run.line_height);

            let mut row_start = usize::MAX;
            let mut row_end = 0usize;
            let mut row_x = f32::MAX;

            for glyph in run.glyphs.iter() {
                glyph_spans.push((
                    base + glyph.start,
                    base + glyph.end,
                    glyph.x,
                    glyph.w,
                    run.line_top,
                ));
                row_start = row_start.min(glyph.start);
                row_end = row_end.max(glyph.end);
                row_x = row_x.min(glyph.x);
            }

            let row_text = if row_start <= row_end && row_start != usize::MAX {
                run.text.get(row_start..row_end).unwrap_or("").to_string()
            } else {
                String::new()
            };
            rows.push(Row {
                top: theme.padding_y + run.line_top,
                x: theme.padding_x + if row_x.is_finite() { row_x } else { 0.0 },
                baseline: theme.padding_y + run.line_y,
                text: row_text,
            });
        }

        let height = content_height + theme.padding_y * 2.0;

        let mut boxes = HashMap::new();
        let mut segments = HashMap::new();
        for mark in tree.marks() {
            let (rect, segs) = measure_interval(
                mark.byte_start,
                mark.byte_end,
                &glyph_spans,
                &rows,
                theme,
                line_height,
            );
            segments.insert(mark.entity_id.clone(), segs);
            boxes.insert(mark.entity_id.clone(), rect);
        }

        TextLayout {
            width,
            height,
            line_height,
            rows,
            boxes,
            segments,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Per-row rectangles covered by the entity, for background painting.
    pub fn segments_of(&self, entity_id: &str) -> &[Rect] {
        self.segments
            .get(entity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Bounding box and per-row segments for a byte interval.
///
/// The box is the union across rows, the way a browser reports an inline
/// element that wraps: top edge from the first row touched, height covering
/// every row touched.
fn measure_interval(
    byte_start: usize,
    byte_end: usize,
    glyph_spans: &[(usize, usize, f32, f32, f32)],
    rows: &[Row],
    theme: &Theme,
    line_height: f32,
) -> (Rect, Vec<Rect>) {
    let mut min_x = f32::MAX;
    let mut max_x = f32::MIN;
    let mut first_top = f32::MAX;
    let mut last_top = f32::MIN;
    // row top -> (min_x, max_x) for that row
    let mut per_row: Vec<(f32, f32, f32)> = Vec::new();

    for &(gs, ge, x, w, top) in glyph_spans {
        if gs >= byte_end || ge <= byte_start {
            continue;
        }
        min_x = min_x.min(x);
        max_x = max_x.max(x + w);
        first_top = first_top.min(top);
        last_top = last_top.max(top);

        match per_row.iter_mut().find(|(t, _, _)| *t == top) {
            Some((_, lo, hi)) => {
                *lo = lo.min(x);
                *hi = hi.max(x + w);
            }
            None => per_row.push((top, x, x + w)),
        }
    }

    if min_x == f32::MAX {
        // Zero-length interval (or whitespace-only): place a collapsed box at
        // the caret position.
        let (x, top) = caret_position(byte_start, glyph_spans, rows, theme);
        let rect = Rect::new(x, top, 0.0, line_height);
        return (rect, vec![rect]);
    }

    let rect = Rect::new(
        theme.padding_x + min_x,
        theme.padding_y + first_top,
        max_x - min_x,
        (last_top - first_top) + line_height,
    );

    per_row.sort_by(|a, b| a.0.total_cmp(&b.0));
    let segs = per_row
        .into_iter()
        .map(|(top, lo, hi)| {
            Rect::new(
                theme.padding_x + lo,
                theme.padding_y + top,
                hi - lo,
                line_height,
            )
        })
        .collect();

    (rect, segs)
}

fn caret_position(
    byte_offset: usize,
    glyph_spans: &[(usize, usize, f32, f32, f32)],
    rows: &[Row],
    theme: &Theme,
) -> (f32, f32) {
    // Glyph starting exactly at the offset wins; otherwise the right edge of
    // the glyph ending there.
    for &(gs, _, x, _, top) in glyph_spans {
        if gs == byte_offset {
            return (theme.padding_x + x, theme.padding_y + top);
        }
    }
    for &(_, ge, x, w, top) in glyph_spans {
        if ge == byte_offset {
            return (theme.padding_x + x + w, theme.padding_y + top);
        }
    }
    let top = rows.first().map(|r| r.top).unwrap_or(theme.padding_y);
    (theme.padding_x, top)
}

impl LayoutProvider for TextLayout {
    fn container_box(&self) -> Option<Rect> {
        Some(Rect::new(0.0, 0.0, self.width, self.height))
    }

    fn box_of(&self, entity_id: &str) -> Option<Rect> {
        self.boxes.get(entity_id).copied()
    }

    fn line_height_of(&self, entity_id: &str) -> Option<f32> {
        self.boxes.get(entity_id).map(|_| self.line_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::normalize;
    use crate::span::build_tree;

    fn layout_for(text: &str, intervals: &[(&str, i64, i64)], width: f32) -> TextLayout {
        let entities: Vec<crate::document::Entity> = intervals
            .iter()
            .map(|&(id, s, e)| crate::document::Entity {
                id: id.to_string(),
                start: crate::document::RawOffset::Int(s),
                end: crate::document::RawOffset::Int(e),
                color: None,
                attributes: None,
            })
            .collect();
        let spans = normalize(text, &entities).expect("valid");
        let theme = Theme::default();
        let tree = build_tree(text, &spans, &theme);
        TextLayout::new(text, &tree, &theme, width)
    }

    #[test]
    fn every_mark_gets_a_box() {
        let layout = layout_for("Paris is great", &[("e1", 0, 5), ("e2", 9, 14)], 800.0);
        assert!(layout.box_of("e1").is_some());
        assert!(layout.box_of("e2").is_some());
        assert!(layout.box_of("missing").is_none());
    }

    #[test]
    fn entities_on_one_line_share_a_top_edge() {
        let layout = layout_for("Paris is great", &[("e1", 0, 5), ("e2", 9, 14)], 800.0);
        let a = layout.box_of("e1").unwrap();
        let b = layout.box_of("e2").unwrap();
        assert_eq!(a.y, b.y);
        assert!(b.x > a.right());
    }

    #[test]
    fn later_lines_sit_lower() {
        let layout = layout_for("first\nsecond line", &[("a", 0, 5), ("b", 6, 12)], 800.0);
        let a = layout.box_of("a").unwrap();
        let b = layout.box_of("b").unwrap();
        assert!(b.y > a.y);
    }

    #[test]
    fn narrow_width_wraps_an_entity_over_multiple_rows() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let layout = layout_for(text, &[("wide", 0, 45)], 140.0);

        let bbox = layout.box_of("wide").unwrap();
        let lh = layout.line_height_of("wide").unwrap();
        assert!(bbox.height / lh > 2.0, "expected a wrapped entity");
        assert!(layout.segments_of("wide").len() > 2);
    }

    #[test]
    fn zero_length_interval_gets_a_collapsed_box() {
        let layout = layout_for("abc def", &[("caret", 4, 4)], 800.0);
        let bbox = layout.box_of("caret").unwrap();
        assert_eq!(bbox.width, 0.0);
        assert!(bbox.height > 0.0);
    }

    #[test]
    fn container_box_covers_all_entity_boxes() {
        let layout = layout_for("some text here", &[("e", 5, 9)], 800.0);
        let container = layout.container_box().unwrap();
        let bbox = layout.box_of("e").unwrap();
        assert!(bbox.x >= container.x);
        assert!(bbox.right() <= container.right());
        assert!(bbox.y >= container.y);
        assert!(bbox.bottom() <= container.bottom());
    }
}
