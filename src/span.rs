//! Span-to-tree renderer: turns a flat list of validated entity intervals
//! into a nested visual tree.
//!
//! Intervals are sorted by ascending start with ties broken by descending end
//! so the outer interval always opens first. The walk keeps a cursor (the
//! character offset already emitted into the currently open mark) and an
//! explicit stack of open marks; closing a mark flushes its trailing text into
//! it before reattaching it to its parent. Line breaks in flushed text become
//! explicit [`Node::LineBreak`] markers so the tree never carries raw
//! newlines.

use crate::document::{Span, render_order};
use crate::theme::Theme;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    LineBreak,
    Mark(Mark),
}

/// A styled inline element wrapping one entity interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub entity_id: String,
    /// Character offsets of the covered interval.
    pub start: usize,
    pub end: usize,
    pub byte_start: usize,
    pub byte_end: usize,
    /// Resolved background; `None` defers to the stylesheet default.
    pub background: Option<String>,
    /// Hover label: entity id, covered substring, pretty-printed attributes.
    pub tooltip: String,
    pub children: Vec<Node>,
}

impl Mark {
    fn open(span: &Span, text: &str, theme: &Theme) -> Self {
        let covered = &text[span.byte_start..span.byte_end];
        let tooltip = match &span.attributes {
            Some(attrs) => {
                let pretty = serde_json::to_string_pretty(attrs)
                    .unwrap_or_else(|_| String::from("{}"));
                format!(
                    "Entity ID: {}\nText: {}\nAttributes: {}",
                    span.id, covered, pretty
                )
            }
            None => format!("Entity ID: {}\nText: {}", span.id, covered),
        };

        Mark {
            entity_id: span.id.clone(),
            start: span.start,
            end: span.end,
            byte_start: span.byte_start,
            byte_end: span.byte_end,
            background: theme.resolve_color(span.color.as_ref()),
            tooltip,
            children: Vec::new(),
        }
    }
}

/// The nested visual tree for one render pass. Rebuilt wholesale on every
/// pass; there is no incremental diffing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpanTree {
    pub nodes: Vec<Node>,
}

impl SpanTree {
    /// Concatenation of all text content, with line-break markers restored as
    /// `\n`. For well-formed input this equals the source text exactly.
    pub fn plain_text(&self) -> String {
        fn walk(nodes: &[Node], out: &mut String) {
            for node in nodes {
                match node {
                    Node::Text(t) => out.push_str(t),
                    Node::LineBreak => out.push('\n'),
                    Node::Mark(mark) => walk(&mark.children, out),
                }
            }
        }
        let mut out = String::new();
        walk(&self.nodes, &mut out);
        out
    }

    /// All marks in depth-first preorder, which is also the paint order for
    /// the SVG compositor (parents before children).
    pub fn marks(&self) -> Vec<&Mark> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Mark>) {
            for node in nodes {
                if let Node::Mark(mark) = node {
                    out.push(mark);
                    walk(&mark.children, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    pub fn entity_ids(&self) -> Vec<&str> {
        self.marks().iter().map(|m| m.entity_id.as_str()).collect()
    }

    pub fn find(&self, entity_id: &str) -> Option<&Mark> {
        self.marks()
            .into_iter()
            .find(|m| m.entity_id == entity_id)
    }

    /// True when the mark for `descendant` sits somewhere under the mark for
    /// `ancestor`.
    pub fn is_descendant(&self, ancestor: &str, descendant: &str) -> bool {
        fn find<'a>(nodes: &'a [Node], id: &str) -> Option<&'a Mark> {
            for node in nodes {
                if let Node::Mark(mark) = node {
                    if mark.entity_id == id {
                        return Some(mark);
                    }
                    if let Some(found) = find(&mark.children, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        find(&self.nodes, ancestor)
            .is_some_and(|mark| find(&mark.children, descendant).is_some())
    }
}

/// Builds the nested tree for one render pass.
///
/// `spans` must have passed [`crate::document::normalize`]: intervals are in
/// range and free of partial overlap. Input order is the tie-break for
/// identical intervals (stable sort), so twins nest in the order supplied.
pub fn build_tree(text: &str, spans: &[Span], theme: &Theme) -> SpanTree {
    let mut root = Vec::new();

    if spans.is_empty() {
        flush_text(&mut root, text);
        return SpanTree { nodes: root };
    }

    let mut ordered: Vec<&Span> = spans.iter().collect();
    ordered.sort_by(render_order);

    let mut stack: Vec<Mark> = Vec::new();
    let mut cursor = 0usize; // byte offset already emitted

    for span in ordered {
        // Close every open mark that ends at or before this span's start.
        while stack.last().is_some_and(|open| open.end <= span.start) {
            let mut closed = stack.pop().expect("stack top checked above");
            flush_text(&mut closed.children, &text[cursor..closed.byte_end]);
            cursor = closed.byte_end;
            container(&mut stack, &mut root).push(Node::Mark(closed));
        }

        flush_text(container(&mut stack, &mut root), &text[cursor..span.byte_start]);
        cursor = span.byte_start;
        stack.push(Mark::open(span, text, theme));
    }

    while let Some(mut closed) = stack.pop() {
        flush_text(&mut closed.children, &text[cursor..closed.byte_end]);
        cursor = closed.byte_end;
        container(&mut stack, &mut root).push(Node::Mark(closed));
    }

    flush_text(&mut root, &text[cursor..]);
    SpanTree { nodes: root }
}

fn container<'a>(stack: &'a mut Vec<Mark>, root: &'a mut Vec<Node>) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(open) => &mut open.children,
        None => root,
    }
}

/// Emits `fragment` as text nodes with explicit line-break markers between
/// the newline-separated pieces.
fn flush_text(out: &mut Vec<Node>, fragment: &str) {
    if fragment.is_empty() {
        return;
    }
    let mut first = true;
    for line in fragment.split('\n') {
        if !first {
            out.push(Node::LineBreak);
        }
        if !line.is_empty() {
            out.push(Node::Text(line.to_string()));
        }
        first = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Entity, RawOffset, normalize};
    use proptest::prelude::*;

    fn entity(id: &str, start: i64, end: i64) -> Entity {
        Entity {
            id: id.to_string(),
            start: RawOffset::Int(start),
            end: RawOffset::Int(end),
            color: None,
            attributes: None,
        }
    }

    fn tree_for(text: &str, entities: &[Entity]) -> SpanTree {
        let spans = normalize(text, entities).expect("valid input");
        build_tree(text, &spans, &Theme::default())
    }

    #[test]
    fn paris_example_wraps_both_entities() {
        let text = "Paris is great";
        let tree = tree_for(text, &[entity("e1", 0, 5), entity("e2", 9, 14)]);

        assert_eq!(tree.plain_text(), text);
        assert_eq!(tree.entity_ids(), vec!["e1", "e2"]);

        let e1 = tree.find("e1").expect("e1 mounted");
        assert_eq!(&text[e1.byte_start..e1.byte_end], "Paris");
        let e2 = tree.find("e2").expect("e2 mounted");
        assert_eq!(&text[e2.byte_start..e2.byte_end], "great");
    }

    #[test]
    fn nested_interval_becomes_descendant_without_duplicating_text() {
        let text = "abcdefghij";
        let tree = tree_for(text, &[entity("e1", 0, 10), entity("e2", 2, 5)]);

        assert!(tree.is_descendant("e1", "e2"));
        assert_eq!(tree.plain_text(), text);
    }

    #[test]
    fn order_of_input_does_not_affect_nesting() {
        let text = "abcdefghij";
        // Inner listed first; the sort still opens the outer interval first.
        let tree = tree_for(text, &[entity("inner", 2, 5), entity("outer", 0, 10)]);
        assert!(tree.is_descendant("outer", "inner"));
    }

    #[test]
    fn disjoint_intervals_stay_siblings() {
        let text = "abcdefghij";
        let tree = tree_for(text, &[entity("a", 0, 3), entity("b", 5, 8)]);
        assert!(!tree.is_descendant("a", "b"));
        assert!(!tree.is_descendant("b", "a"));
        assert_eq!(tree.plain_text(), text);
    }

    #[test]
    fn adjacent_intervals_share_a_boundary() {
        let text = "abcdef";
        let tree = tree_for(text, &[entity("a", 0, 3), entity("b", 3, 6)]);
        assert_eq!(tree.entity_ids(), vec!["a", "b"]);
        assert!(!tree.is_descendant("a", "b"));
        assert_eq!(tree.plain_text(), text);
    }

    #[test]
    fn identical_intervals_nest_in_input_order() {
        let text = "abcdef";
        let tree = tree_for(text, &[entity("first", 1, 4), entity("second", 1, 4)]);
        assert!(tree.is_descendant("first", "second"));
        assert_eq!(tree.plain_text(), text);
    }

    #[test]
    fn zero_length_entity_renders_as_empty_mark() {
        let text = "abcdef";
        let tree = tree_for(text, &[entity("caret", 3, 3)]);

        let mark = tree.find("caret").expect("mounted");
        assert!(mark.children.is_empty());
        assert_eq!(tree.plain_text(), text);
    }

    #[test]
    fn zero_length_span_on_an_end_boundary_is_a_sibling() {
        // Intervals are half-open, so a caret sitting exactly on another
        // span's end is outside it and closes it like any adjacent span.
        let text = "abcdef";
        let tree = tree_for(text, &[entity("outer", 0, 6), entity("caret", 6, 6)]);
        assert!(!tree.is_descendant("outer", "caret"));
        assert_eq!(tree.entity_ids(), vec!["outer", "caret"]);
        assert_eq!(tree.plain_text(), text);

        // At a start boundary the caret is inside.
        let tree = tree_for(text, &[entity("outer", 2, 5), entity("caret", 2, 2)]);
        assert!(tree.is_descendant("outer", "caret"));
        assert_eq!(tree.plain_text(), text);
    }

    #[test]
    fn no_entities_emits_line_fragments() {
        let text = "line one\nline two\n\nline four";
        let tree = tree_for(text, &[]);

        let breaks = tree
            .nodes
            .iter()
            .filter(|n| matches!(n, Node::LineBreak))
            .count();
        assert_eq!(breaks, 3);
        assert_eq!(tree.plain_text(), text);
    }

    #[test]
    fn interior_line_breaks_survive_inside_marks() {
        let text = "one\ntwo three";
        let tree = tree_for(text, &[entity("e1", 0, 7)]);

        let mark = tree.find("e1").expect("mounted");
        assert!(mark.children.contains(&Node::LineBreak));
        assert_eq!(tree.plain_text(), text);
    }

    #[test]
    fn render_is_idempotent() {
        let text = "Paris is great";
        let entities = [entity("e1", 0, 5), entity("e2", 9, 14)];
        let first = tree_for(text, &entities);
        let second = tree_for(text, &entities);

        assert_eq!(first.plain_text(), second.plain_text());
        assert_eq!(first.entity_ids(), second.entity_ids());
    }

    #[test]
    fn tooltip_carries_id_substring_and_attributes() {
        let text = "Paris is great";
        let mut attrs = std::collections::BTreeMap::new();
        attrs.insert("type".to_string(), serde_json::json!("city"));
        let entities = [Entity {
            id: "e1".into(),
            start: RawOffset::Int(0),
            end: RawOffset::Int(5),
            color: None,
            attributes: Some(attrs),
        }];

        let tree = tree_for(text, &entities);
        let tooltip = &tree.find("e1").expect("mounted").tooltip;
        assert!(tooltip.contains("Entity ID: e1"));
        assert!(tooltip.contains("Text: Paris"));
        assert!(tooltip.contains("\"type\": \"city\""));
    }

    fn arb_entities() -> impl Strategy<Value = Vec<(usize, usize)>> {
        prop::collection::vec((0usize..=30, 0usize..=30), 0..6).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn well_nested_input_reproduces_text_and_ids(intervals in arb_entities()) {
            let text = "abcde fghij\nklmno pqrst\nuvwxy z";
            let entities: Vec<Entity> = intervals
                .iter()
                .enumerate()
                .map(|(i, &(s, e))| entity(&format!("e{i}"), s as i64, e as i64))
                .collect();

            // Only well-nested sets reach the tree builder.
            let Ok(spans) = normalize(text, &entities) else {
                return Ok(());
            };
            let tree = build_tree(text, &spans, &Theme::default());

            prop_assert_eq!(tree.plain_text(), text);

            let mut rendered: Vec<&str> = tree.entity_ids();
            rendered.sort_unstable();
            let mut expected: Vec<String> =
                entities.iter().map(|e| e.id.clone()).collect();
            expected.sort_unstable();
            prop_assert_eq!(
                rendered,
                expected.iter().map(String::as_str).collect::<Vec<_>>()
            );

            // Strict containment must be reflected as descent; disjoint
            // intervals must never be.
            for a in &spans {
                for b in &spans {
                    if a.id == b.id {
                        continue;
                    }
                    if a.contains(b) && !b.contains(a) {
                        prop_assert!(tree.is_descendant(&a.id, &b.id));
                    }
                    if a.end <= b.start && !a.contains(b) && !b.contains(a) {
                        prop_assert!(!tree.is_descendant(&a.id, &b.id));
                        prop_assert!(!tree.is_descendant(&b.id, &a.id));
                    }
                }
            }
        }
    }
}
