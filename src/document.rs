//! Input document model and the pure normalization step that turns raw wire
//! entities into validated spans.
//!
//! The wire format is tolerant: offsets may arrive as JSON numbers or numeric
//! strings, colors as literal CSS strings or palette indexes, and field names
//! follow the original viewer payload (`entity_id`, `entity_1_id`, `attr`,
//! `light_theme_colors`, ...). Normalization never mutates caller data; it
//! produces fresh [`Span`] records or rejects the document.

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::Deserialize;

use crate::error::VizError;

/// A raw offset from the wire: either a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawOffset {
    Int(i64),
    Text(String),
}

impl RawOffset {
    fn parse(&self, entity_id: &str) -> Result<i64, VizError> {
        match self {
            RawOffset::Int(v) => Ok(*v),
            RawOffset::Text(s) => {
                s.trim()
                    .parse::<i64>()
                    .map_err(|_| VizError::NonNumericOffset {
                        id: entity_id.to_string(),
                        value: s.clone(),
                    })
            }
        }
    }
}

/// Either a literal CSS color or an index into the active theme palette.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Indexed(usize),
    Named(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entity {
    #[serde(alias = "entity_id")]
    pub id: String,
    pub start: RawOffset,
    pub end: RawOffset,
    #[serde(default)]
    pub color: Option<ColorSpec>,
    #[serde(default, alias = "attr")]
    pub attributes: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relation {
    #[serde(alias = "entity_1_id")]
    pub entity1: String,
    #[serde(alias = "entity_2_id")]
    pub entity2: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColorEntry {
    #[serde(alias = "colorCode")]
    pub color_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Option<Vec<Relation>>,
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default, alias = "light_theme_colors")]
    pub light_palette: Vec<ColorEntry>,
    #[serde(default, alias = "dark_theme_colors")]
    pub dark_palette: Vec<ColorEntry>,
}

impl Document {
    pub fn from_json(json: &str) -> Result<Self, VizError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A validated entity interval. Offsets are character positions; the byte
/// range is precomputed so later slicing never re-walks the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub id: String,
    pub start: usize,
    pub end: usize,
    pub byte_start: usize,
    pub byte_end: usize,
    pub color: Option<ColorSpec>,
    pub attributes: Option<BTreeMap<String, serde_json::Value>>,
}

impl Span {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when `other` is fully contained in `self`.
    ///
    /// Intervals are half-open, so an empty span sitting exactly on
    /// `self.end` is outside; the tree renderer keeps it a sibling, the same
    /// as any adjacent span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start
            && other.end <= self.end
            && !(other.is_empty() && !self.is_empty() && other.start == self.end)
    }
}

/// Coerces and bounds-checks every entity, producing fresh spans.
///
/// Rejects inverted or out-of-range intervals, duplicate ids, and pairs that
/// overlap without nesting (the tree renderer cannot represent those). Input
/// order is preserved in the returned vector.
pub fn normalize(text: &str, entities: &[Entity]) -> Result<Vec<Span>, VizError> {
    // Char index -> byte index, with one trailing entry for the text end.
    let mut byte_at: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    byte_at.push(text.len());
    let text_len = byte_at.len() - 1;

    let mut seen = HashSet::new();
    let mut spans = Vec::with_capacity(entities.len());

    for entity in entities {
        if !seen.insert(entity.id.as_str()) {
            return Err(VizError::DuplicateId {
                id: entity.id.clone(),
            });
        }

        let start = entity.start.parse(&entity.id)?;
        let end = entity.end.parse(&entity.id)?;

        let malformed = || VizError::MalformedInterval {
            id: entity.id.clone(),
            start: start.max(0) as usize,
            end: end.max(0) as usize,
            text_len,
        };

        if start < 0 || end < start || end as usize > text_len {
            return Err(malformed());
        }

        let (start, end) = (start as usize, end as usize);
        spans.push(Span {
            id: entity.id.clone(),
            start,
            end,
            byte_start: byte_at[start],
            byte_end: byte_at[end],
            color: entity.color.clone(),
            attributes: entity.attributes.clone(),
        });
    }

    reject_partial_overlaps(&spans)?;
    Ok(spans)
}

/// Walks the spans in render order and rejects any pair that intersects
/// without containment. Identical intervals and full nesting are fine.
fn reject_partial_overlaps(spans: &[Span]) -> Result<(), VizError> {
    let mut ordered: Vec<&Span> = spans.iter().collect();
    ordered.sort_by(render_order);

    // Stack of currently open (end, id) pairs, outermost first.
    let mut open: Vec<(usize, &str)> = Vec::new();
    for span in ordered {
        while let Some(&(end, _)) = open.last() {
            if end <= span.start {
                open.pop();
            } else {
                break;
            }
        }
        if let Some(&(end, id)) = open.last() {
            if span.end > end {
                return Err(VizError::OverlappingSpans {
                    first: id.to_string(),
                    second: span.id.clone(),
                });
            }
        }
        open.push((span.end, &span.id));
    }
    Ok(())
}

/// Sort key for the nesting walk: ascending start, ties broken by descending
/// end so the outer interval opens first. The sort must be stable so that
/// identical intervals nest in input order.
pub fn render_order(a: &&Span, b: &&Span) -> std::cmp::Ordering {
    a.start.cmp(&b.start).then(b.end.cmp(&a.end))
}
