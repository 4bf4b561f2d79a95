//! Interface to the item catalog collaborator: the static records describing
//! paintable models and the derivation of per-texture editor panels from
//! them. The catalog data itself lives outside this crate.

use crate::editor::TextureEditorSettings;

/// Model name whose editor panels get the tall layout.
pub const PLAYER_MODEL_NAME: &str = "player";

const PLAYER_EDITOR_HEIGHT: f64 = 520.0;
const DEFAULT_EDITOR_HEIGHT: f64 = 240.0;

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TextureMeta {
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Model {
    pub name: String,
    pub filename: String,
    pub textures: Vec<TextureMeta>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub category: String,
    pub id: String,
    pub model: Model,
    pub viewer_orientation: f64,
}

/// Settings handed to the 3D viewer collaborator. Textures are deliberately
/// absent: the viewer is driven by the editor's live composite instead.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModelViewerSettings {
    pub container_id: String,
    pub model_path: String,
}

/// Normalize free text into a URL/DOM-safe token: lowercased, alphanumeric
/// runs joined by single dashes.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Deterministic, human-legible identifier for a model: its filename plus
/// every texture filename, slugified.
pub fn model_to_id(model: &Model) -> String {
    let texture_names = model
        .textures
        .iter()
        .map(|t| t.filename.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    slugify(&format!("{} {texture_names}", model.filename))
}

pub fn model_filename_path(assets_root: &str, filename: &str) -> String {
    format!("{}/{}", assets_root.trim_end_matches('/'), filename)
}

fn editor_height(item: &Item) -> f64 {
    if item.model.name == PLAYER_MODEL_NAME {
        PLAYER_EDITOR_HEIGHT
    } else {
        DEFAULT_EDITOR_HEIGHT
    }
}

/// One editor panel per model texture, sized so every panel shares the
/// item's editor height while keeping the texture's aspect ratio.
pub fn item_to_editor_settings(item: &Item, assets_root: &str) -> Vec<TextureEditorSettings> {
    item.model
        .textures
        .iter()
        .map(|texture| {
            let scale = editor_height(item) / f64::from(texture.height);
            let container_id = slugify(&format!(
                "editor {} {}",
                item.model.filename, texture.filename
            ));
            TextureEditorSettings::new(
                container_id,
                (scale * f64::from(texture.width)).round() as u32,
                (scale * f64::from(texture.height)).round() as u32,
                model_filename_path(assets_root, &texture.filename),
            )
        })
        .collect()
}

pub fn item_to_viewer_settings(item: &Item, assets_root: &str) -> ModelViewerSettings {
    ModelViewerSettings {
        container_id: slugify(&format!("viewer {}", item.id)),
        model_path: model_filename_path(assets_root, &item.model.filename),
    }
}
