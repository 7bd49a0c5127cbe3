use serde::Deserialize;

use crate::document::{ColorEntry, ColorSpec, ThemeMode};
use crate::error::VizError;

const BUILTIN_THEMES: &[(&str, &str)] = &[
    ("light", include_str!("../themes/light.toml")),
    ("dark", include_str!("../themes/dark.toml")),
];

/// Glow color used when a highlighted mark has no resolved background.
pub const GLOW_FALLBACK: &str = "#3f87a6";

const FONT_SIZE: f32 = 16.0;
const LINE_HEIGHT: f32 = 1.6;
const PADDING: f32 = 32.0;
const MARK_RADIUS: f32 = 3.0;
const MARK_PAD_Y: f32 = 2.0;

#[derive(Debug, Deserialize)]
struct ThemeFile {
    background: String,
    foreground: String,
    connector: String,
    muted: String,
    palette: Vec<String>,
}

/// Page styling for one theme mode: colors plus the text metrics every layout
/// and render pass shares.
#[derive(Debug, Clone)]
pub struct Theme {
    pub mode: ThemeMode,
    pub background_color: String,
    pub text_color: String,
    pub connector_color: String,
    pub muted_color: String,
    pub palette: Vec<String>,

    pub font_size: f32,
    /// Multiplier over `font_size`; `line_height_px` gives the pixel value.
    pub line_height: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub mark_radius: f32,
    pub mark_pad_y: f32,
}

impl Theme {
    pub fn builtin(mode: ThemeMode) -> Result<Self, VizError> {
        let name = match mode {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        };
        let content = BUILTIN_THEMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
            .expect("both built-in themes are compiled in");

        let file: ThemeFile = toml::from_str(content).map_err(|e| VizError::Palette {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Theme {
            mode,
            background_color: file.background,
            text_color: file.foreground,
            connector_color: file.connector,
            muted_color: file.muted,
            palette: file.palette,
            font_size: FONT_SIZE,
            line_height: LINE_HEIGHT,
            padding_x: PADDING,
            padding_y: PADDING,
            mark_radius: MARK_RADIUS,
            mark_pad_y: MARK_PAD_Y,
        })
    }

    /// Built-in theme with the palette replaced by the document's own list,
    /// when the document supplies one for this mode.
    pub fn for_document(
        mode: ThemeMode,
        light_palette: &[ColorEntry],
        dark_palette: &[ColorEntry],
    ) -> Result<Self, VizError> {
        let mut theme = Self::builtin(mode)?;
        let supplied = match mode {
            ThemeMode::Light => light_palette,
            ThemeMode::Dark => dark_palette,
        };
        if !supplied.is_empty() {
            theme.palette = supplied.iter().map(|c| c.color_code.clone()).collect();
        }
        Ok(theme)
    }

    pub fn line_height_px(&self) -> f32 {
        self.font_size * self.line_height
    }

    /// Resolves an entity color against this theme.
    ///
    /// Literal strings pass through verbatim; integer indexes wrap around the
    /// palette the way the original server assigned attribute colors. An
    /// absent color (or an index against an empty palette) leaves the default
    /// styling to the stylesheet.
    pub fn resolve_color(&self, spec: Option<&ColorSpec>) -> Option<String> {
        match spec {
            None => None,
            Some(ColorSpec::Named(color)) => Some(color.clone()),
            Some(ColorSpec::Indexed(idx)) => {
                if self.palette.is_empty() {
                    None
                } else {
                    Some(self.palette[idx % self.palette.len()].clone())
                }
            }
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::builtin(ThemeMode::Light).expect("built-in light theme must parse")
    }
}
