use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;

use crate::brush::Brush;
use crate::colorize::colorize_rgba8;
use crate::composite::{
    over_in_place, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place,
};
use crate::cursor::CursorLayer;
use crate::error::{SkinpaintError, SkinpaintResult};
use crate::filter::CssFilterSettings;
use crate::notify::ChangeNotifier;
use crate::outline::{OutlineStroke, outline_from_alpha};
use crate::paint::{FreehandPaint, PaintSurface};
use crate::pointer::{PointerEvent, PointerKind, RateGate};
use crate::surface::{RasterSurface, surface_extent};
use crate::texture::{
    LoadTicket, TextureImage, encode_png_rgba8, png_data_uri, resolve_texture_uri,
    texture_uri_from_file,
};

/// Fast pointer motion is rate-limited to bound per-frame compositing cost.
const MOVE_THROTTLE: Duration = Duration::from_millis(5);

pub type ChangeCallback = Box<dyn FnMut()>;
pub type LoadCallback = Box<dyn FnOnce()>;

/// Rendering policy of the base-texture layer.
///
/// `Vector`: the live filter chain reruns over the scaled texture on every
/// redraw. `RasterizedComposite`: colorize is enabled, so redraws recolor a
/// cached raster first (a compositing filter operates on fixed pixels, not
/// live content). Selected deterministically from the filter settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureLayerMode {
    Vector,
    RasterizedComposite,
}

pub struct TextureEditorSettings {
    pub container_id: String,
    pub width: u32,
    pub height: u32,
    pub texture_path: String,
    pub brush: Option<Brush>,
    pub filters: Option<CssFilterSettings>,
    pub on_change: Option<ChangeCallback>,
    pub on_load: Option<LoadCallback>,
    pub paint_surface: Option<Box<dyn PaintSurface>>,
}

impl TextureEditorSettings {
    pub fn new(
        container_id: impl Into<String>,
        width: u32,
        height: u32,
        texture_path: impl Into<String>,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            width,
            height,
            texture_path: texture_path.into(),
            brush: None,
            filters: None,
            on_change: None,
            on_load: None,
            paint_surface: None,
        }
    }

    pub fn with_brush(mut self, brush: Brush) -> Self {
        self.brush = Some(brush);
        self
    }

    pub fn with_filters(mut self, filters: CssFilterSettings) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_on_change(mut self, callback: ChangeCallback) -> Self {
        self.on_change = Some(callback);
        self
    }

    pub fn with_on_load(mut self, callback: LoadCallback) -> Self {
        self.on_load = Some(callback);
        self
    }

    pub fn with_paint_surface(mut self, surface: Box<dyn PaintSurface>) -> Self {
        self.paint_surface = Some(surface);
        self
    }

    pub fn validate(&self) -> SkinpaintResult<()> {
        if self.container_id.trim().is_empty() {
            return Err(SkinpaintError::validation("container id must be non-empty"));
        }
        if self.texture_path.is_empty() {
            return Err(SkinpaintError::validation("texture path must be non-empty"));
        }
        surface_extent(self.width, self.height)?;
        if let Some(brush) = &self.brush {
            brush.validate()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for TextureEditorSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureEditorSettings")
            .field("container_id", &self.container_id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("texture_path", &self.texture_path)
            .field("brush", &self.brush)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

/// Orchestrator of the stacked drawing surfaces.
///
/// Bottom to top: base texture, paint overlay, outline helper, cursor, all
/// at the same target dimensions. Owns the texture pipeline, the filter
/// policy, the brush, and the throttled change notification; external code
/// interacts only through these setters plus the paint-surface handle.
pub struct TextureEditor {
    container_id: String,
    width: u32,
    height: u32,

    texture_layer: RasterSurface,
    paint: Box<dyn PaintSurface>,
    outline_layer: RasterSurface,
    cursor: CursorLayer,

    brush: Brush,
    filters: CssFilterSettings,
    css_filter_attr: String,
    mode: TextureLayerMode,

    texture: Option<TextureImage>,
    /// Scaled-to-target premultiplied snapshot of the current texture; the
    /// filter pipeline reruns from this cache instead of resampling.
    base_premul: Option<Vec<u8>>,

    notifier: ChangeNotifier,
    move_gate: RateGate,
    load_seq: u64,
}

impl TextureEditor {
    pub fn new(mut settings: TextureEditorSettings) -> SkinpaintResult<Self> {
        settings.validate()?;

        let brush = settings.brush.unwrap_or_default();
        let cursor = CursorLayer::new(&brush)?;

        let mut paint = settings
            .paint_surface
            .take()
            .map(Ok)
            .unwrap_or_else(|| {
                FreehandPaint::new(settings.width, settings.height)
                    .map(|p| Box::new(p) as Box<dyn PaintSurface>)
            })?;
        paint.set_size(settings.width, settings.height)?;
        paint.set_brush(brush);

        let on_change = settings.on_change.take().unwrap_or_else(|| Box::new(|| {}));
        let notifier = ChangeNotifier::new(on_change);
        let filters = settings.filters;
        let on_load = settings.on_load.take();
        let texture_path = std::mem::take(&mut settings.texture_path);

        let mut editor = Self {
            container_id: settings.container_id,
            width: settings.width,
            height: settings.height,
            texture_layer: RasterSurface::new(settings.width, settings.height)?,
            paint,
            outline_layer: RasterSurface::new(settings.width, settings.height)?,
            cursor,
            brush,
            filters: CssFilterSettings::default(),
            css_filter_attr: "none".to_string(),
            mode: TextureLayerMode::Vector,
            texture: None,
            base_premul: None,
            notifier,
            move_gate: RateGate::new(MOVE_THROTTLE),
            load_seq: 0,
        };

        // First pipeline pass: texture, then outline, then the supplied
        // filters, so the first visible frame already reflects them. The
        // load callback only fires after all of it succeeded.
        editor.set_texture_by_uri(&texture_path)?;
        if let Some(filters) = filters {
            editor.apply_css_filters(filters)?;
        }
        if let Some(on_load) = on_load {
            on_load();
        }
        Ok(editor)
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Right-click is reserved for brush interaction; the host must keep the
    /// native context menu away from the editor's root surface.
    pub fn blocks_context_menu(&self) -> bool {
        true
    }

    // ----- brush -----

    pub fn brush(&self) -> Brush {
        self.brush
    }

    /// Atomically update the paint surface and the cursor renderer; there is
    /// deliberately no way to move one without the other.
    pub fn set_brush(&mut self, brush: Brush) -> SkinpaintResult<()> {
        brush.validate()?;
        self.brush = brush;
        self.paint.set_brush(brush);
        self.cursor.set_brush(&brush)?;
        Ok(())
    }

    // ----- pointer fan-out -----

    /// Feed a raw pointer event to the paint surface and the cursor layer.
    /// `Move` events are admitted at most once per 5 ms; the low-frequency
    /// kinds always pass. Returns whether paint content changed.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        if event.kind == PointerKind::Move && !self.move_gate.admit(Instant::now()) {
            return false;
        }

        let painted = self.paint.handle_pointer(event);
        self.cursor.handle_pointer(event);
        if painted {
            self.notify_change();
        }
        painted
    }

    /// Handle to the paint overlay for paint-specific operations; the other
    /// three layers stay internal.
    pub fn paint_surface(&self) -> &dyn PaintSurface {
        self.paint.as_ref()
    }

    pub fn paint_surface_mut(&mut self) -> &mut dyn PaintSurface {
        self.paint.as_mut()
    }

    // ----- texture pipeline -----

    /// Begin a texture load. The returned ticket stays valid until the next
    /// `begin_texture_load`; installing with an outdated ticket is a no-op.
    pub fn begin_texture_load(&mut self) -> LoadTicket {
        self.load_seq += 1;
        LoadTicket(self.load_seq)
    }

    /// Install a decoded texture and derive its outline, as one step.
    /// Dropping stale tickets here is what makes overlapping loads resolve
    /// last-issued-wins, never a texture paired with another load's outline.
    pub fn install_texture(
        &mut self,
        ticket: LoadTicket,
        texture: TextureImage,
    ) -> SkinpaintResult<()> {
        if ticket.0 != self.load_seq {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.load_seq,
                "dropping stale texture load"
            );
            return Ok(());
        }

        self.base_premul = Some(resample_premul(
            &texture.rgba8_premul,
            texture.width,
            texture.height,
            self.width,
            self.height,
        ));
        self.update_outline(&texture)?;
        self.texture = Some(texture);
        self.redraw_texture_layer()?;
        self.notify_change();
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn set_texture_by_uri(&mut self, uri: &str) -> SkinpaintResult<()> {
        let ticket = self.begin_texture_load();
        let texture = resolve_texture_uri(uri)?;
        self.install_texture(ticket, texture)
    }

    /// Decode a local file to a data URI, then run the URI pipeline.
    pub fn set_texture_by_file(&mut self, path: &Path) -> SkinpaintResult<()> {
        let uri = texture_uri_from_file(path)?;
        self.set_texture_by_uri(&uri)
    }

    pub fn texture(&self) -> Option<&TextureImage> {
        self.texture.as_ref()
    }

    fn update_outline(&mut self, texture: &TextureImage) -> SkinpaintResult<()> {
        let stroke = OutlineStroke::default();
        let outline = outline_from_alpha(texture, &stroke)?;

        let sx = f64::from(self.width) / f64::from(texture.width);
        let sy = f64::from(self.height) / f64::from(texture.height);

        self.outline_layer
            .install_premul_bytes(&outline.rgba8_premul, outline.width, outline.height)?;
        self.outline_layer
            .set_display_size(sx * f64::from(outline.width), sy * f64::from(outline.height));
        self.outline_layer
            .set_offset(f64::from(stroke.thickness) * sx, f64::from(stroke.thickness) * sy);
        Ok(())
    }

    // ----- filters -----

    /// Apply a whole filter configuration: pick the texture-layer mode from
    /// the colorize flag, store the CSS expression, redraw that layer only,
    /// and end with a single change notification no matter how many
    /// adjustments were toggled.
    pub fn apply_css_filters(&mut self, filters: CssFilterSettings) -> SkinpaintResult<()> {
        self.mode = if filters.wants_colorize() {
            TextureLayerMode::RasterizedComposite
        } else {
            TextureLayerMode::Vector
        };
        self.filters = filters;
        self.css_filter_attr = filters.to_css_filter();
        self.redraw_texture_layer()?;
        self.notify_change();
        Ok(())
    }

    pub fn filters(&self) -> CssFilterSettings {
        self.filters
    }

    /// The texture layer's current CSS filter expression (`"none"` when no
    /// adjustment is enabled).
    pub fn css_filter(&self) -> &str {
        &self.css_filter_attr
    }

    pub fn texture_layer_mode(&self) -> TextureLayerMode {
        self.mode
    }

    fn redraw_texture_layer(&mut self) -> SkinpaintResult<()> {
        let Some(base) = &self.base_premul else {
            return Ok(());
        };

        let untouched = self.mode == TextureLayerMode::Vector && !self.filters.any_enabled();
        if untouched {
            let base = base.clone();
            return self
                .texture_layer
                .install_premul_bytes(&base, self.width, self.height);
        }

        let mut buf = base.clone();
        unpremultiply_rgba8_in_place(&mut buf);
        if self.mode == TextureLayerMode::RasterizedComposite {
            colorize_rgba8(&mut buf, self.filters.hue.rotate_deg);
        }
        self.filters.apply_to_rgba8(&mut buf);
        premultiply_rgba8_in_place(&mut buf);
        self.texture_layer
            .install_premul_bytes(&buf, self.width, self.height)
    }

    // ----- change notification -----

    /// Replace the change callback. The whole throttle/grace policy object
    /// is swapped, so internal call sites always reach the current one.
    pub fn set_on_change(&mut self, callback: ChangeCallback) {
        self.notifier = ChangeNotifier::new(callback);
    }

    /// Drive the scheduled notification stages; call once per host frame.
    /// Returns whether the change callback ran.
    pub fn pump(&mut self) -> bool {
        self.notifier.pump(Instant::now())
    }

    pub fn has_pending_change(&self) -> bool {
        self.notifier.is_pending()
    }

    fn notify_change(&mut self) {
        self.notifier.trigger(Instant::now());
    }

    // ----- auxiliary operations -----

    pub fn clear_paint(&mut self) {
        self.paint.clear();
        self.notify_change();
    }

    /// Editing-aid toggle: flips the helper layer's visibility and nothing
    /// else. Content did not change, so no notification is triggered.
    pub fn toggle_texture_outline(&mut self) {
        self.outline_layer.toggle_visible();
    }

    pub fn outline_visible(&self) -> bool {
        self.outline_layer.is_visible()
    }

    pub fn outline_display_size(&self) -> (f64, f64) {
        self.outline_layer.display_size()
    }

    pub fn outline_offset(&self) -> (f64, f64) {
        self.outline_layer.offset()
    }

    // ----- compositing / export -----

    /// Composite the content layers (base texture, then paint, in that
    /// order) at target size. The outline and cursor layers are editing
    /// aids and excluded. Premultiplied RGBA8.
    pub fn composite(&self) -> SkinpaintResult<Vec<u8>> {
        let mut out = vec![0u8; self.buffer_len()?];
        over_in_place(&mut out, self.texture_layer.pixmap().data_as_u8_slice())?;
        over_in_place(&mut out, self.paint.pixmap().data_as_u8_slice())?;
        Ok(out)
    }

    /// Composite all four layers bottom-to-top for on-screen display,
    /// honoring visibility and placement.
    pub fn render_preview(&self) -> SkinpaintResult<Vec<u8>> {
        let mut out = vec![0u8; self.buffer_len()?];
        over_in_place(&mut out, self.texture_layer.pixmap().data_as_u8_slice())?;
        over_in_place(&mut out, self.paint.pixmap().data_as_u8_slice())?;
        self.outline_layer
            .composite_into(&mut out, self.width, self.height)?;
        self.cursor
            .surface()
            .composite_into(&mut out, self.width, self.height)?;
        Ok(out)
    }

    /// The export composite as a portable PNG data URI.
    pub fn to_uri(&self) -> SkinpaintResult<String> {
        let mut rgba = self.composite()?;
        unpremultiply_rgba8_in_place(&mut rgba);
        let png = encode_png_rgba8(self.width, self.height, &rgba)?;
        Ok(png_data_uri(&png))
    }

    /// Persist the export to disk. Defaults to `download.png` in the current
    /// directory when no filename is given.
    pub fn download(&self, filename: Option<&Path>) -> SkinpaintResult<PathBuf> {
        let path = filename
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("download.png"));

        let mut rgba = self.composite()?;
        unpremultiply_rgba8_in_place(&mut rgba);
        let png = encode_png_rgba8(self.width, self.height, &rgba)?;
        std::fs::write(&path, png)
            .with_context(|| format!("write export to '{}'", path.display()))?;
        Ok(path)
    }

    /// Current native-cursor value for the host's pointer styling.
    pub fn cursor_value(&self) -> &str {
        self.cursor.cursor_value()
    }

    pub fn cursor_hotspot(&self) -> (f64, f64) {
        self.cursor.hotspot()
    }

    fn buffer_len(&self) -> SkinpaintResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| SkinpaintError::render("composite buffer size overflow"))
    }
}

impl std::fmt::Debug for TextureEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureEditor")
            .field("container_id", &self.container_id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("brush", &self.brush)
            .field("mode", &self.mode)
            .field("load_seq", &self.load_seq)
            .finish_non_exhaustive()
    }
}

/// Nearest-neighbor resample of a premultiplied RGBA8 raster.
fn resample_premul(src: &[u8], src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Vec<u8> {
    if src_w == dst_w && src_h == dst_h {
        return src.to_vec();
    }

    let (sw, sh) = (src_w as usize, src_h as usize);
    let (dw, dh) = (dst_w as usize, dst_h as usize);
    let mut out = vec![0u8; dw * dh * 4];
    for dy in 0..dh {
        let sy = (dy * sh / dh).min(sh - 1);
        for dx in 0..dw {
            let sx = (dx * sw / dw).min(sw - 1);
            let si = (sy * sw + sx) * 4;
            let di = (dy * dw + dx) * 4;
            out[di..di + 4].copy_from_slice(&src[si..si + 4]);
        }
    }
    out
}
