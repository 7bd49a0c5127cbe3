//! Self-contained HTML export.
//!
//! Emits the span tree as nested `<mark>` elements with CSS hover tooltips,
//! so the output needs no script and no external assets. Theme colors are
//! inlined into the stylesheet.

use crate::span::{Node, SpanTree};
use crate::theme::Theme;
use crate::xml::{escape_attr, escape_text};

pub fn render(tree: &SpanTree, theme: &Theme) -> String {
    let mut body = String::new();
    write_nodes(&tree.nodes, &mut body);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
body {{
  background: {background};
  color: {text};
  font-family: sans-serif;
  font-size: {font_size}px;
  line-height: {line_height};
  margin: 0;
}}
#display-textbox {{
  padding: {pad_y}px {pad_x}px;
  white-space: pre-wrap;
  word-wrap: break-word;
}}
.entity-mark {{
  position: relative;
  border-radius: {radius}px;
  padding: {mark_pad}px 0;
  color: inherit;
  cursor: pointer;
}}
.entity-mark .custom-tooltip {{
  visibility: hidden;
  position: absolute;
  bottom: 125%;
  left: 0;
  z-index: 1;
  max-width: 320px;
  padding: 6px 8px;
  border-radius: 4px;
  background: {text};
  color: {background};
  font-size: 12px;
  line-height: 1.4;
  white-space: pre;
}}
.entity-mark:hover > .custom-tooltip {{
  visibility: visible;
}}
</style>
</head>
<body>
<div id="display-textbox">{body}</div>
</body>
</html>
"#,
        background = theme.background_color,
        text = theme.text_color,
        font_size = theme.font_size,
        line_height = theme.line_height,
        pad_x = theme.padding_x,
        pad_y = theme.padding_y,
        radius = theme.mark_radius,
        mark_pad = theme.mark_pad_y,
    )
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::LineBreak => out.push_str("<br>"),
            Node::Mark(mark) => {
                let style = match &mark.background {
                    Some(color) => format!(r#" style="background-color: {}""#, escape_attr(color)),
                    None => String::new(),
                };
                out.push_str(&format!(
                    r#"<mark id="{id}" class="entity-mark"{style}><span class="custom-tooltip">{tooltip}</span>"#,
                    id = escape_attr(&mark.entity_id),
                    tooltip = escape_text(&mark.tooltip),
                ));
                write_nodes(&mark.children, out);
                out.push_str("</mark>");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Entity, RawOffset, normalize};
    use crate::span::build_tree;

    fn entity(id: &str, start: i64, end: i64) -> Entity {
        Entity {
            id: id.to_string(),
            start: RawOffset::Int(start),
            end: RawOffset::Int(end),
            color: None,
            attributes: None,
        }
    }

    fn html_for(text: &str, entities: &[Entity]) -> String {
        let theme = Theme::default();
        let spans = normalize(text, entities).expect("valid");
        let tree = build_tree(text, &spans, &theme);
        render(&tree, &theme)
    }

    #[test]
    fn marks_and_text_land_in_the_body() {
        let html = html_for("Paris is great", &[entity("e1", 0, 5), entity("e2", 9, 14)]);
        assert!(html.contains(r#"<mark id="e1""#));
        assert!(html.contains(r#"<mark id="e2""#));
        assert!(html.contains(" is "));
        assert_eq!(html.matches("</mark>").count(), 2);
    }

    #[test]
    fn nested_intervals_produce_nested_markup() {
        let html = html_for("abcdefghij", &[entity("outer", 0, 10), entity("inner", 2, 5)]);
        let outer_open = html.find(r#"<mark id="outer""#).unwrap();
        let inner_open = html.find(r#"<mark id="inner""#).unwrap();
        let first_close = html.find("</mark>").unwrap();
        assert!(outer_open < inner_open);
        assert!(inner_open < first_close);
    }

    #[test]
    fn newlines_become_br_tags() {
        let html = html_for("one\ntwo", &[]);
        assert!(html.contains("one<br>two"));
    }

    #[test]
    fn text_is_escaped() {
        let html = html_for("a <b> & c", &[entity("e1", 0, 1)]);
        assert!(html.contains("&lt;b&gt; &amp; c"));
    }

    #[test]
    fn tooltip_travels_with_its_mark() {
        let html = html_for("Paris is great", &[entity("e1", 0, 5)]);
        assert!(html.contains(r#"<span class="custom-tooltip">Entity ID: e1"#));
        assert!(html.contains("Text: Paris"));
    }

    #[test]
    fn theme_colors_reach_the_stylesheet() {
        let theme = Theme::default();
        let spans = normalize("hi", &[]).expect("valid");
        let tree = build_tree("hi", &spans, &theme);
        let html = render(&tree, &theme);
        assert!(html.contains(&theme.background_color));
        assert!(html.contains(&theme.text_color));
    }
}
