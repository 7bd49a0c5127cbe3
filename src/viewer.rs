//! Viewer session: explicit state plus the event loop glue.
//!
//! Collaborators (filter panel, theme button, table panel, scroll/resize
//! handlers) own their chrome and hand the core plain events. Every event is
//! a full, idempotent pass: rebuild whatever the event invalidated, re-align
//! the surface, re-route the active relations. Rapid event bursts can be
//! coalesced by simply running the pass once more; no state accumulates
//! between passes.

use std::collections::HashSet;

use tracing::debug;

use crate::document::{Document, Relation, Span, ThemeMode, normalize};
use crate::error::VizError;
use crate::geometry::{Point, Rect, Size};
use crate::layout::{LayoutProvider, TextLayout};
use crate::router::{RouterOptions, Surface, route};
use crate::span::{SpanTree, build_tree};
use crate::theme::{GLOW_FALLBACK, Theme};

/// Which view an instance of an entity lives in. The same id may be mounted
/// in the text body and in an inspector table row at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Text,
    Table,
}

/// A mounted occurrence of an entity in some view.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub entity_id: String,
    pub view: ViewKind,
    pub background: Option<String>,
    /// Glow color while hover-highlighted, `None` otherwise.
    pub glow: Option<String>,
}

/// Registry of mounted entity instances across views, with bidirectional
/// hover-highlight propagation.
#[derive(Debug, Default)]
pub struct Scene {
    instances: Vec<Instance>,
}

impl Scene {
    fn from_tree(tree: &SpanTree) -> Self {
        let instances = tree
            .marks()
            .iter()
            .map(|mark| Instance {
                entity_id: mark.entity_id.clone(),
                view: ViewKind::Text,
                background: mark.background.clone(),
                glow: None,
            })
            .collect();
        Scene { instances }
    }

    fn register(&mut self, view: ViewKind, entity_id: &str, background: Option<String>) {
        self.instances.push(Instance {
            entity_id: entity_id.to_string(),
            view,
            background,
            glow: None,
        });
    }

    /// Toggles the highlight on every instance of `entity_id`, in any view.
    /// Idempotent: repeating the same state is a no-op in effect.
    pub fn set_highlight(&mut self, entity_id: &str, on: bool) {
        for instance in self
            .instances
            .iter_mut()
            .filter(|i| i.entity_id == entity_id)
        {
            instance.glow = if on {
                Some(glow_color(instance.background.as_deref()))
            } else {
                None
            };
        }
    }

    pub fn instances_of(&self, entity_id: &str) -> Vec<&Instance> {
        self.instances
            .iter()
            .filter(|i| i.entity_id == entity_id)
            .collect()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }
}

/// Glow derived from the instance's resolved background, with a fixed
/// default when the background is transparent or unset.
pub fn glow_color(background: Option<&str>) -> String {
    match background {
        None => GLOW_FALLBACK.to_string(),
        Some(bg) if bg == "transparent" || bg == "rgba(0, 0, 0, 0)" => GLOW_FALLBACK.to_string(),
        Some(bg) => bg.to_string(),
    }
}

/// The floating hover label. At most one exists at a time: showing a new one
/// replaces any current instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub content: String,
    pub position: Point,
}

const TOOLTIP_GAP: f32 = 5.0;
const TOOLTIP_EDGE_PAD: f32 = 10.0;

/// Places a tooltip of `size` against `anchor`: preferred above, flipped
/// below when it would clip at the viewport top, clamped at the right edge.
pub fn place_tooltip(anchor: Rect, size: Size, viewport: Size) -> Point {
    let mut x = anchor.x;
    let mut y = anchor.y - size.height - TOOLTIP_GAP;

    if x + size.width > viewport.width {
        x = viewport.width - size.width - TOOLTIP_EDGE_PAD;
    }
    if y < 0.0 {
        y = anchor.bottom() + TOOLTIP_GAP;
    }

    Point::new(x, y)
}

/// Events the collaborators feed into the session. Geometry-affecting
/// transitions (panel open/close) must be delivered after their animation
/// settles, since the pass measures the post-transition layout.
#[derive(Debug, Clone)]
pub enum ViewerEvent {
    /// The filter component recomputed the active entity set.
    FilterApplied { entity_ids: Vec<String> },
    ThemeToggled,
    Scrolled,
    Resized { width: f32 },
    PanelToggled { width: f32 },
}

/// One viewing session over an immutable document.
pub struct Viewer {
    document: Document,
    spans: Vec<Span>,
    theme: Theme,
    width: f32,
    options: RouterOptions,

    active_ids: HashSet<String>,
    table_rows: Vec<String>,

    tree: SpanTree,
    layout: TextLayout,
    surface: Surface,
    scene: Scene,
    tooltip: Option<Tooltip>,
}

impl Viewer {
    pub fn new(document: Document, width: f32, options: RouterOptions) -> Result<Self, VizError> {
        let spans = normalize(&document.text, &document.entities)?;
        let theme = Theme::for_document(
            document.theme,
            &document.light_palette,
            &document.dark_palette,
        )?;
        let active_ids = spans.iter().map(|s| s.id.clone()).collect();

        let mut viewer = Viewer {
            document,
            spans,
            theme,
            width,
            options,
            active_ids,
            table_rows: Vec::new(),
            tree: SpanTree::default(),
            layout: TextLayout::new("", &SpanTree::default(), &Theme::default(), width),
            surface: Surface::new(),
            scene: Scene::default(),
            tooltip: None,
        };
        viewer.rebuild();
        viewer.sync_and_route();
        Ok(viewer)
    }

    /// Spans currently eligible for rendering, in input order.
    fn active_spans(&self) -> Vec<Span> {
        self.spans
            .iter()
            .filter(|s| self.active_ids.contains(&s.id))
            .cloned()
            .collect()
    }

    /// Relations whose endpoints are both active and mounted.
    pub fn active_relations(&self) -> Vec<Relation> {
        let Some(relations) = &self.document.relations else {
            return Vec::new();
        };
        relations
            .iter()
            .filter(|r| {
                self.active_ids.contains(&r.entity1)
                    && self.active_ids.contains(&r.entity2)
                    && self.tree.find(&r.entity1).is_some()
                    && self.tree.find(&r.entity2).is_some()
            })
            .cloned()
            .collect()
    }

    /// Full tree + layout rebuild. No incremental diffing: the previous tree
    /// is discarded wholesale.
    fn rebuild(&mut self) {
        let active = self.active_spans();
        self.tree = build_tree(&self.document.text, &active, &self.theme);
        self.layout = TextLayout::new(&self.document.text, &self.tree, &self.theme, self.width);
        self.scene = Scene::from_tree(&self.tree);
        for id in self.table_rows.clone() {
            if self.active_ids.contains(&id) {
                let background = self.tree.find(&id).and_then(|m| m.background.clone());
                self.scene.register(ViewKind::Table, &id, background);
            }
        }
        debug!(
            entities = self.tree.entity_ids().len(),
            width = self.width,
            "tree rebuilt"
        );
    }

    fn sync_and_route(&mut self) {
        self.surface.sync(&self.layout);
        let connectors = route(&self.active_relations(), &self.layout, &self.options);
        self.surface.draw(connectors);
    }

    /// Applies one event as a full, idempotent pass.
    pub fn handle(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::FilterApplied { entity_ids } => {
                let known: HashSet<String> = self.spans.iter().map(|s| s.id.clone()).collect();
                self.active_ids = entity_ids.into_iter().filter(|id| known.contains(id)).collect();
                self.rebuild();
            }
            ViewerEvent::ThemeToggled => {
                let mode = match self.theme.mode {
                    ThemeMode::Light => ThemeMode::Dark,
                    ThemeMode::Dark => ThemeMode::Light,
                };
                // Palettes are theme-scoped, so marks must be restyled.
                if let Ok(theme) = Theme::for_document(
                    mode,
                    &self.document.light_palette,
                    &self.document.dark_palette,
                ) {
                    self.theme = theme;
                }
                self.rebuild();
            }
            ViewerEvent::Scrolled => {}
            ViewerEvent::Resized { width } | ViewerEvent::PanelToggled { width } => {
                self.width = width;
                self.rebuild();
            }
        }
        self.sync_and_route();
    }

    /// Mounts an inspector-table row for an entity, so highlights propagate
    /// to it. The table chrome itself lives outside the core.
    pub fn register_table_row(&mut self, entity_id: &str) {
        if !self.table_rows.iter().any(|id| id == entity_id) {
            self.table_rows.push(entity_id.to_string());
        }
        if self.active_ids.contains(entity_id) {
            let background = self
                .tree
                .find(entity_id)
                .and_then(|m| m.background.clone());
            self.scene.register(ViewKind::Table, entity_id, background);
        }
    }

    pub fn highlight(&mut self, entity_id: &str, on: bool) {
        self.scene.set_highlight(entity_id, on);
    }

    /// Target scroll position bringing the entity into view, when mounted.
    pub fn scroll_to_entity(&self, entity_id: &str) -> Option<Point> {
        let bbox = self.layout.box_of(entity_id)?;
        Some(Point::new(bbox.x, bbox.y))
    }

    /// Shows the hover tooltip for an entity, replacing any current one.
    pub fn show_tooltip(&mut self, entity_id: &str, size: Size) -> Option<&Tooltip> {
        self.tooltip = None;
        let mark = self.tree.find(entity_id)?;
        let anchor = self.layout.box_of(entity_id)?;
        let viewport = self.layout.container_box()?.size();
        self.tooltip = Some(Tooltip {
            content: mark.tooltip.clone(),
            position: place_tooltip(anchor, size, viewport),
        });
        self.tooltip.as_ref()
    }

    pub fn hide_tooltip(&mut self) {
        self.tooltip = None;
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn tree(&self) -> &SpanTree {
        &self.tree
    }

    pub fn layout(&self) -> &TextLayout {
        &self.layout
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}
