use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use skinpaint::brush::{Brush, BrushShape, RgbColor};
use skinpaint::cursor::{cursor_hotspot, native_cursor_value, render_cursor_preview};
use skinpaint::editor::{TextureEditor, TextureEditorSettings};
use skinpaint::filter::CssFilterSettings;
use skinpaint::outline::{OutlineStroke, outline_from_alpha};
use skinpaint::texture::{encode_png_rgba8, resolve_texture_uri};

#[derive(Parser, Debug)]
#[command(name = "skinpaint", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a texture (with optional filters) to a PNG.
    Export(ExportArgs),
    /// Extract the silhouette outline of a texture as a PNG.
    Outline(OutlineArgs),
    /// Render a brush cursor preview and print its CSS cursor value.
    Cursor(CursorArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input texture (path or data URI).
    #[arg(long = "in")]
    in_path: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Filter settings JSON (see `CssFilterSettings`).
    #[arg(long)]
    filters: Option<PathBuf>,

    /// Target width; defaults to the texture's natural width.
    #[arg(long)]
    width: Option<u32>,

    /// Target height; defaults to the texture's natural height.
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Parser, Debug)]
struct OutlineArgs {
    /// Input texture (path or data URI).
    #[arg(long = "in")]
    in_path: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Stroke thickness in pixels.
    #[arg(long, default_value_t = 1)]
    thickness: u32,
}

#[derive(Parser, Debug)]
struct CursorArgs {
    #[arg(long, value_enum, default_value_t = ShapeChoice::Circle)]
    shape: ShapeChoice,

    #[arg(long, default_value_t = 20.0)]
    size: f64,

    /// Brush color as #rrggbb.
    #[arg(long, default_value = "#ff0000")]
    color: String,

    /// Output PNG path for the preview bitmap.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ShapeChoice {
    Circle,
    Square,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => export(args),
        Command::Outline(args) => outline(args),
        Command::Cursor(args) => cursor(args),
    }
}

fn export(args: ExportArgs) -> anyhow::Result<()> {
    let texture = resolve_texture_uri(&args.in_path)?;
    let width = args.width.unwrap_or(texture.width);
    let height = args.height.unwrap_or(texture.height);

    let mut settings = TextureEditorSettings::new("skinpaint-cli", width, height, &args.in_path);
    if let Some(path) = args.filters {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("read filters from '{}'", path.display()))?;
        let filters: CssFilterSettings =
            serde_json::from_str(&json).context("parse filter settings")?;
        settings = settings.with_filters(filters);
    }

    let editor = TextureEditor::new(settings)?;
    editor.download(Some(args.out.as_path()))?;
    println!("wrote {}", args.out.display());
    Ok(())
}

fn outline(args: OutlineArgs) -> anyhow::Result<()> {
    let texture = resolve_texture_uri(&args.in_path)?;
    let stroke = OutlineStroke {
        thickness: args.thickness,
        ..OutlineStroke::default()
    };
    let outline = outline_from_alpha(&texture, &stroke)?;

    let mut rgba = outline.rgba8_premul;
    skinpaint::composite::unpremultiply_rgba8_in_place(&mut rgba);
    let png = encode_png_rgba8(outline.width, outline.height, &rgba)?;
    std::fs::write(&args.out, png)
        .with_context(|| format!("write outline to '{}'", args.out.display()))?;
    println!("wrote {}", args.out.display());
    Ok(())
}

fn cursor(args: CursorArgs) -> anyhow::Result<()> {
    let brush = Brush {
        shape: match args.shape {
            ShapeChoice::Circle => BrushShape::Circle,
            ShapeChoice::Square => BrushShape::Square,
        },
        size: args.size,
        color: RgbColor::from_hex(&args.color)?,
    };

    let preview = render_cursor_preview(&brush)?;
    let hotspot = cursor_hotspot(&brush);
    let value = native_cursor_value(&preview, hotspot)?;

    let mut rgba = preview.data_as_u8_slice().to_vec();
    skinpaint::composite::unpremultiply_rgba8_in_place(&mut rgba);
    let png = encode_png_rgba8(
        u32::from(preview.width()),
        u32::from(preview.height()),
        &rgba,
    )?;
    std::fs::write(&args.out, png)
        .with_context(|| format!("write cursor preview to '{}'", args.out.display()))?;

    println!("{value}");
    Ok(())
}
