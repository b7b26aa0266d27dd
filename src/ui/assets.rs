use eframe::egui;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to load image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Field and ball textures. Either may be missing; the field view then draws
/// plain shapes instead.
#[derive(Default)]
pub struct FieldAssets {
    pub field: Option<egui::TextureHandle>,
    pub ball: Option<egui::TextureHandle>,
}

impl FieldAssets {
    pub fn load(ctx: &egui::Context, field_path: &Path, ball_path: &Path) -> Self {
        FieldAssets {
            field: load_or_warn(ctx, field_path),
            ball: load_or_warn(ctx, ball_path),
        }
    }
}

fn load_or_warn(ctx: &egui::Context, path: &Path) -> Option<egui::TextureHandle> {
    match load_texture(ctx, path) {
        Ok(texture) => {
            info!("Loaded {}", path.display());
            Some(texture)
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

fn load_texture(ctx: &egui::Context, path: &Path) -> Result<egui::TextureHandle, AssetError> {
    let img = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let size = [img.width() as usize, img.height() as usize];
    let rgba = img.to_rgba8();

    Ok(ctx.load_texture(
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("image"),
        egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()),
        egui::TextureOptions::LINEAR,
    ))
}
