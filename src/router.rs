//! Relation router: connector paths between entity anchor points.
//!
//! Every routing pass re-reads geometry from the [`LayoutProvider`]; anchors
//! are never cached because any scroll, resize or reflow invalidates them.
//! Paths are drawn left to right regardless of the order the relation lists
//! its entities, as one of three cases: a flat hump between anchors on the
//! same row, a vertical lead-in up to the end row followed by the hump, or
//! the hump with a final drop when the start sits above the end.

use tracing::{debug, warn};

use crate::document::Relation;
use crate::geometry::{Point, Rect, Size, estimate_line_count};
use crate::layout::LayoutProvider;

#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    /// Corner radius of the quarter-circle arcs.
    pub curve_radius: f32,
    /// Wrapped-line count above which an entity anchors at its right edge
    /// instead of its horizontal midpoint.
    pub wrap_threshold: f32,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            curve_radius: 5.0,
            wrap_threshold: 2.0,
        }
    }
}

/// Vertical relationship between the two anchors of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCase {
    SameRow,
    StartBelowEnd,
    StartAboveEnd,
}

/// One routed connector, start anchor always left of (or tied with) the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub entity1: String,
    pub entity2: String,
    pub start: Point,
    pub end: Point,
    pub case: PathCase,
    pub radius: f32,
}

impl Connector {
    /// SVG path data for this connector: straight segments joined by
    /// quarter-circle arcs of the configured radius.
    pub fn to_svg_d(&self) -> String {
        let r = self.radius;
        let (sx, sy) = (self.start.x, self.start.y);
        let (ex, ey) = (self.end.x, self.end.y);

        match self.case {
            // Hump riding one corner radius above the shared row.
            PathCase::SameRow | PathCase::StartAboveEnd => format!(
                "M{sx:.2} {sy:.2} a {r:.2} {r:.2} 0 0 1 {r:.2} -{r:.2} \
                 L{:.2} {:.2} a {r:.2} {r:.2} 0 0 1 {r:.2} {r:.2} L{ex:.2} {ey:.2}",
                ex - r,
                sy - r,
            ),
            // Climb to the end row first, then the same hump across.
            PathCase::StartBelowEnd => format!(
                "M{sx:.2} {sy:.2} L{sx:.2} {ey:.2} a {r:.2} {r:.2} 0 0 1 {r:.2} -{r:.2} \
                 L{:.2} {:.2} a {r:.2} {r:.2} 0 0 1 {r:.2} {r:.2} L{ex:.2} {ey:.2}",
                ex - r,
                ey - r,
            ),
        }
    }
}

/// Surface-local anchor point for one entity, or `None` when unmounted.
fn anchor_of(
    provider: &dyn LayoutProvider,
    entity_id: &str,
    container: Point,
    options: &RouterOptions,
) -> Option<Point> {
    let bbox = provider.box_of(entity_id)?;
    let line_height = provider.line_height_of(entity_id).unwrap_or(f32::NAN);
    let lines = estimate_line_count(bbox.height, line_height);

    let local = bbox.relative_to(container);
    // A wrapped entity continues on the next row, so its midpoint is
    // meaningless; anchor at the right edge instead.
    let x = if lines > options.wrap_threshold {
        local.right()
    } else {
        local.mid_x()
    };
    Some(Point::new(x, local.y))
}

/// Routes every renderable relation. Relations with an unmounted endpoint are
/// skipped for this pass; that is filtering at work, not an error.
pub fn route(
    relations: &[Relation],
    provider: &dyn LayoutProvider,
    options: &RouterOptions,
) -> Vec<Connector> {
    let Some(container) = provider.container_box() else {
        warn!("text container not available; routing skipped");
        return Vec::new();
    };
    let origin = container.origin();

    let mut connectors = Vec::with_capacity(relations.len());
    for relation in relations {
        let a = anchor_of(provider, &relation.entity1, origin, options);
        let b = anchor_of(provider, &relation.entity2, origin, options);
        let (Some(a), Some(b)) = (a, b) else {
            debug!(
                entity1 = %relation.entity1,
                entity2 = %relation.entity2,
                "relation endpoint unmounted; skipping"
            );
            continue;
        };

        // Left-to-right, with a vertical tie-break so stacked anchors route
        // the same way regardless of listing order.
        let (start, end) = if a.x < b.x || (a.x == b.x && a.y <= b.y) {
            (a, b)
        } else {
            (b, a)
        };
        let case = if start.y == end.y {
            PathCase::SameRow
        } else if start.y > end.y {
            PathCase::StartBelowEnd
        } else {
            PathCase::StartAboveEnd
        };

        connectors.push(Connector {
            entity1: relation.entity1.clone(),
            entity2: relation.entity2.clone(),
            start,
            end,
            case,
            radius: options.curve_radius,
        });
    }
    connectors
}

/// The connector overlay, kept geometrically aligned with the text container.
///
/// `sync` copies the container's box (plus a uniform padding margin);
/// `draw` replaces the full path set. Both are idempotent, so coalesced
/// events can simply re-run the pair.
#[derive(Debug, Default)]
pub struct Surface {
    origin: Point,
    size: Size,
    padding: f32,
    synced: bool,
    connectors: Vec<Connector>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_padding(padding: f32) -> Self {
        Surface {
            padding,
            ..Self::default()
        }
    }

    /// Aligns this surface with the text container. When the container is
    /// missing the call is reported and aborted, leaving prior state intact.
    pub fn sync(&mut self, provider: &dyn LayoutProvider) {
        let Some(container) = provider.container_box() else {
            warn!("text container missing; surface not re-aligned");
            return;
        };
        self.origin = Point::new(container.x - self.padding, container.y - self.padding);
        self.size = Size::new(
            container.width + self.padding * 2.0,
            container.height + self.padding * 2.0,
        );
        self.synced = true;
    }

    /// Full redraw: clears previous paths, then adopts the new set. Refused
    /// (prior drawing untouched) until the surface has been aligned once.
    pub fn draw(&mut self, connectors: Vec<Connector>) {
        if !self.synced {
            warn!("surface never aligned; keeping previous drawing");
            return;
        }
        self.connectors = connectors;
    }

    pub fn clear(&mut self) {
        self.connectors.clear();
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// SVG fragment with one path per connector, offset by the surface
    /// padding so container-local coordinates land in the padded viewport.
    pub fn to_svg_fragment(&self, stroke: &str) -> String {
        if self.connectors.is_empty() {
            return String::new();
        }
        let mut svg = format!(
            r#"<g transform="translate({:.2} {:.2})" fill="none" stroke="{}" stroke-width="1.5">"#,
            self.padding, self.padding, stroke
        );
        for connector in &self.connectors {
            svg.push_str(&format!(
                r#"<path class="relation-path" d="{}" />"#,
                connector.to_svg_d()
            ));
        }
        svg.push_str("</g>");
        svg
    }
}
