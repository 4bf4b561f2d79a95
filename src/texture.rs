use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::composite::premultiply_rgba8_in_place;
use crate::error::{SkinpaintError, SkinpaintResult};

/// Decoded texture raster. Premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, Debug)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Issued by [`TextureEditor::begin_texture_load`] and consumed by
/// [`TextureEditor::install_texture`]. Completions carrying a ticket that is
/// no longer the latest issued are dropped, so overlapping loads resolve
/// last-issued-wins regardless of completion order.
///
/// [`TextureEditor::begin_texture_load`]: crate::editor::TextureEditor::begin_texture_load
/// [`TextureEditor::install_texture`]: crate::editor::TextureEditor::install_texture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(pub(crate) u64);

pub fn decode_texture(bytes: &[u8]) -> SkinpaintResult<TextureImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode texture from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(TextureImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Resolve a texture source URI and decode it. `data:` URIs are decoded in
/// memory; anything else is treated as a filesystem path.
pub fn resolve_texture_uri(uri: &str) -> SkinpaintResult<TextureImage> {
    if uri.starts_with("data:") {
        return decode_texture(&bytes_from_data_uri(uri)?);
    }

    let bytes =
        std::fs::read(uri).with_context(|| format!("read texture from '{uri}'"))?;
    decode_texture(&bytes)
}

/// Read a local file and wrap it as a `data:` URI, the form
/// [`TextureEditor::set_texture_by_file`] feeds back into the URI pipeline.
///
/// [`TextureEditor::set_texture_by_file`]: crate::editor::TextureEditor::set_texture_by_file
pub fn texture_uri_from_file(path: &Path) -> SkinpaintResult<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read texture file '{}'", path.display()))?;
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(format!("data:{mime};base64,{}", BASE64.encode(&bytes)))
}

pub fn bytes_from_data_uri(uri: &str) -> SkinpaintResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| SkinpaintError::texture("not a data URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| SkinpaintError::texture("data URI has no payload"))?;
    if !meta.ends_with(";base64") {
        return Err(SkinpaintError::texture("data URI must be base64-encoded"));
    }
    BASE64
        .decode(payload)
        .map_err(|e| SkinpaintError::texture(format!("data URI payload: {e}")))
}

/// Encode a straight-alpha RGBA8 buffer as PNG bytes.
pub fn encode_png_rgba8(width: u32, height: u32, rgba8: &[u8]) -> SkinpaintResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, rgba8.to_vec())
        .ok_or_else(|| SkinpaintError::render("png buffer length mismatch"))?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

pub fn png_data_uri(png_bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png_bytes))
}
