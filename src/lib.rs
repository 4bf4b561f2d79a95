#![forbid(unsafe_code)]

pub mod brush;
pub mod catalog;
pub mod colorize;
pub mod composite;
pub mod cursor;
pub mod editor;
pub mod error;
pub mod filter;
pub mod notify;
pub mod outline;
pub mod paint;
pub mod pointer;
pub mod surface;
pub mod texture;

pub use brush::{Brush, BrushShape, RgbColor};
pub use catalog::{Item, Model, ModelViewerSettings, TextureMeta, slugify};
pub use editor::{TextureEditor, TextureEditorSettings, TextureLayerMode};
pub use error::{SkinpaintError, SkinpaintResult};
pub use filter::CssFilterSettings;
pub use notify::ChangeNotifier;
pub use outline::{OutlineImage, OutlineStroke, outline_from_alpha};
pub use paint::{FreehandPaint, PaintSurface};
pub use pointer::{PointerEvent, PointerKind};
pub use texture::{LoadTicket, TextureImage, resolve_texture_uri, texture_uri_from_file};
