//! Annotated-text visualization engine.
//!
//! Takes a document (text, entity intervals, relations) and renders it as
//! nested entity marks with quarter-circle relation connectors. The pipeline:
//!
//! 1. [`document::normalize`] validates raw entities into byte-addressed spans
//! 2. [`span::build_tree`] nests the spans into a visual tree
//! 3. [`layout::TextLayout`] shapes the text and measures per-entity boxes
//! 4. [`router::route`] turns relations into connector paths
//! 5. [`svg`] / [`html`] emit static output; [`viewer::Viewer`] drives the
//!    interactive event loop on top of the same pieces

pub mod document;
pub mod error;
pub mod geometry;
pub mod html;
pub mod layout;
pub mod router;
pub mod span;
pub mod svg;
pub mod theme;
pub mod viewer;
pub mod xml;

pub use document::{Document, ThemeMode};
pub use error::VizError;
pub use router::RouterOptions;
pub use theme::Theme;
pub use viewer::Viewer;
