use thiserror::Error;

/// Failure taxonomy for document validation and rendering.
///
/// Missing relation anchors are deliberately *not* represented here: a relation
/// whose endpoints are unmounted is skipped for the current pass, which is a
/// normal consequence of filtering rather than an error.
#[derive(Debug, Error)]
pub enum VizError {
    /// `end < start`, or the interval reaches past the end of the text.
    #[error("entity '{id}' has malformed interval [{start}, {end}) over text of {text_len} chars")]
    MalformedInterval {
        id: String,
        start: usize,
        end: usize,
        text_len: usize,
    },

    /// Entity offsets arrived as strings that do not parse as integers.
    #[error("entity '{id}' has a non-numeric offset: {value:?}")]
    NonNumericOffset { id: String, value: String },

    /// Two intervals intersect without one containing the other. The nesting
    /// stack cannot represent this, so validation rejects the pair up front.
    #[error("entities '{first}' and '{second}' overlap without nesting")]
    OverlappingSpans { first: String, second: String },

    #[error("duplicate entity id '{id}'")]
    DuplicateId { id: String },

    #[error("palette '{name}' failed to parse: {reason}")]
    Palette { name: String, reason: String },

    #[error("unsupported output format: {0}")]
    OutputFormat(String),

    #[error("invalid raster scale: {0}")]
    RasterScale(f32),

    #[error("failed to parse document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Render(String),
}
