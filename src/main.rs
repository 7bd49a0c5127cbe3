use std::path::PathBuf;

use clap::Parser;
use resvg::usvg;
use tiny_skia::{Pixmap, Transform};
use tracing_subscriber::EnvFilter;

use ieviz::document::{Document, ThemeMode};
use ieviz::error::VizError;
use ieviz::router::RouterOptions;
use ieviz::viewer::Viewer;
use ieviz::{html, svg};

/// A pure Rust annotated-text visualizer
#[derive(Parser, Debug)]
#[command(name = "ieviz")]
#[command(about = "Render annotated text to SVG, PNG, PDF or HTML", long_about = None)]
struct Args {
    /// Input document JSON (use "-" for stdin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path (extension determines format: .svg, .png, .pdf or .html)
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Theme override; defaults to the document's own theme field
    #[arg(short, long, value_parser = ["light", "dark"])]
    theme: Option<String>,

    /// Image width in pixels
    #[arg(short, long, default_value_t = 800.0)]
    width: f32,

    /// Corner radius of relation connector arcs
    #[arg(long, default_value_t = 5.0)]
    curve_radius: f32,

    /// Line-count estimate above which connectors anchor at the box's right edge
    #[arg(long, default_value_t = 2.0)]
    wrap_threshold: f32,

    /// Raster scale multiplier for PNG output (e.g. 2.0 for sharper output)
    #[arg(long, default_value_t = 1.0)]
    png_scale: f32,
}

fn main() -> Result<(), VizError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let json = if args.input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(&args.input)?
    };

    let mut document = Document::from_json(&json)?;
    match args.theme.as_deref() {
        Some("dark") => document.theme = ThemeMode::Dark,
        Some("light") => document.theme = ThemeMode::Light,
        _ => {}
    }

    let options = RouterOptions {
        curve_radius: args.curve_radius,
        wrap_threshold: args.wrap_threshold,
    };
    let viewer = Viewer::new(document, args.width, options)?;

    let output_ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| VizError::OutputFormat("output file has no extension".into()))?
        .to_ascii_lowercase();

    match output_ext.as_str() {
        "svg" => {
            let svg = svg::render(viewer.tree(), viewer.layout(), viewer.surface(), viewer.theme());
            std::fs::write(&args.output, svg)?;
            eprintln!("SVG saved to: {}", args.output.display());
        }
        "png" => {
            let svg = svg::render(viewer.tree(), viewer.layout(), viewer.surface(), viewer.theme());
            let png_data = svg_to_png(&svg, args.png_scale)?;
            std::fs::write(&args.output, png_data)?;
            eprintln!("PNG saved to: {}", args.output.display());
        }
        "pdf" => {
            let svg = svg::render(viewer.tree(), viewer.layout(), viewer.surface(), viewer.theme());
            let pdf_data = svg_to_pdf(&svg)?;
            std::fs::write(&args.output, pdf_data)?;
            eprintln!("PDF saved to: {}", args.output.display());
        }
        "html" => {
            let html = html::render(viewer.tree(), viewer.theme());
            std::fs::write(&args.output, html)?;
            eprintln!("HTML saved to: {}", args.output.display());
        }
        _ => {
            return Err(VizError::OutputFormat(format!(
                ".{} (use .svg, .png, .pdf or .html)",
                output_ext
            )));
        }
    }

    Ok(())
}

fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>, VizError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(VizError::RasterScale(scale));
    }

    let mut opts = usvg::Options::default();
    {
        let fontdb = opts.fontdb_mut();
        fontdb.load_system_fonts();
        configure_font_fallbacks(fontdb);
    }

    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| VizError::Render(format!("failed to parse SVG: {}", e)))?;

    let svg_width = (tree.size().width() * scale).ceil() as u32;
    let svg_height = (tree.size().height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(svg_width, svg_height)
        .ok_or_else(|| VizError::Render("failed to create pixmap".into()))?;
    let transform = Transform::from_scale(scale, scale);

    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| VizError::Render(format!("failed to encode PNG: {}", e)))
}

fn svg_to_pdf(svg: &str) -> Result<Vec<u8>, VizError> {
    use svg2pdf::usvg::fontdb;

    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();

    let mut opts = svg2pdf::usvg::Options::default();
    opts.fontdb = std::sync::Arc::new(fontdb);

    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
        .map_err(|e| VizError::Render(format!("failed to parse SVG: {}", e)))?;

    // Keep text as paths for broader viewer/font compatibility.
    let mut options = svg2pdf::ConversionOptions::default();
    options.embed_text = false;
    let page_options = svg2pdf::PageOptions::default();

    svg2pdf::to_pdf(&tree, options, page_options)
        .map_err(|e| VizError::Render(format!("failed to convert SVG to PDF: {}", e)))
}

/// Picks real installed families for the generic sans/serif/monospace names so
/// rasterization never falls back to a missing font.
fn configure_font_fallbacks(fontdb: &mut usvg::fontdb::Database) {
    let mut sans_family: Option<String> = None;
    let mut serif_family: Option<String> = None;
    let mut mono_family: Option<String> = None;
    let mut first_family: Option<String> = None;

    for face in fontdb.faces() {
        for (family, _) in &face.families {
            if first_family.is_none() {
                first_family = Some(family.clone());
            }

            let lower = family.to_ascii_lowercase();
            if sans_family.is_none() && lower.contains("sans") {
                sans_family = Some(family.clone());
            }
            if serif_family.is_none() && lower.contains("serif") {
                serif_family = Some(family.clone());
            }
            if mono_family.is_none() && (lower.contains("mono") || lower.contains("code")) {
                mono_family = Some(family.clone());
            }
        }
    }

    if let Some(family) = sans_family.as_deref().or(first_family.as_deref()) {
        fontdb.set_sans_serif_family(family);
    }
    if let Some(family) = serif_family.as_deref().or(first_family.as_deref()) {
        fontdb.set_serif_family(family);
    }
    if let Some(family) = mono_family
        .as_deref()
        .or(sans_family.as_deref())
        .or(first_family.as_deref())
    {
        fontdb.set_monospace_family(family);
    }
}
