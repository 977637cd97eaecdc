//! Asset resolution: tilesets, unit sprite sheets, shadows and portraits.
//!
//! Unit assets live under `assets/units/{folder}/`, with a `male/` variant
//! subfolder as fallback. A candidate path that fails to load is skipped
//! silently; only the last exhausted candidate is reported.

use crate::errors::AssetError;
use crate::rendering::ShadowLayer;
use image::RgbaImage;
use std::future::Future;
use std::path::PathBuf;

/// Source of raw asset bytes, addressed by server-relative path.
pub trait AssetFetcher {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> + Send;
}

/// Assets read from a local directory laid out like the server's asset root.
#[derive(Clone, Debug)]
pub struct LocalAssets {
    root: PathBuf,
}

impl LocalAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetFetcher for LocalAssets {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full = self.root.join(path.trim_start_matches('/'));
        tokio::fs::read(&full)
            .await
            .map_err(|_| AssetError::NotFound(full.display().to_string()))
    }
}

pub fn tileset_path(name: &str) -> String {
    format!("assets/tilesets/{}", name)
}

/// Sprite folders to try, in order.
pub fn sprite_paths(asset_folder: &str) -> [String; 2] {
    [
        format!("assets/units/{}/sprites", asset_folder),
        format!("assets/units/{}/sprites/male", asset_folder),
    ]
}

/// Portrait images to try, in order.
pub fn portrait_paths(asset_folder: &str) -> [String; 2] {
    [
        format!("assets/units/{}/portraits/portrait.png", asset_folder),
        format!("assets/units/{}/portraits/male/portrait.png", asset_folder),
    ]
}

pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, AssetError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| AssetError::Decode(e.to_string()))
}

/// Fetch and decode an image in one step.
pub async fn load_image<F: AssetFetcher>(fetcher: &F, path: &str) -> Result<RgbaImage, AssetError> {
    let bytes = fetcher.fetch(path).await?;
    decode_image(&bytes)
}

const DEFAULT_FRAME_WIDTH: u32 = 24;
const DEFAULT_FRAME_HEIGHT: u32 = 48;
const DEFAULT_FRAME_DURATION: u32 = 10;

/// Which animation the descriptor provided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationName {
    Idle,
    /// Substituted because the descriptor has no `Idle` entry.
    Walk,
}

impl AnimationName {
    pub fn as_str(self) -> &'static str {
        match self {
            AnimationName::Idle => "Idle",
            AnimationName::Walk => "Walk",
        }
    }

    pub fn sheet_file(self) -> &'static str {
        match self {
            AnimationName::Idle => "Idle-Anim.png",
            AnimationName::Walk => "Walk-Anim.png",
        }
    }
}

/// Frame geometry and timing for one animation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationDescriptor {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Display duration of each frame, in repaint ticks.
    pub durations: Vec<u32>,
    pub animation: AnimationName,
}

/// Parse `AnimData.xml`, selecting `Idle` or falling back to `Walk`.
pub fn parse_anim_data(xml: &str) -> Result<AnimationDescriptor, AssetError> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| AssetError::Descriptor(e.to_string()))?;
    let anims = doc
        .descendants()
        .find(|n| n.has_tag_name("Anims"))
        .ok_or_else(|| AssetError::Descriptor("missing <Anims>".to_string()))?;

    let find = |name: &str| {
        anims
            .children()
            .filter(|n| n.has_tag_name("Anim"))
            .find(|anim| child_text(*anim, "Name") == Some(name))
    };

    let (selected, animation) = match find("Idle") {
        Some(anim) => (anim, AnimationName::Idle),
        None => match find("Walk") {
            Some(anim) => (anim, AnimationName::Walk),
            None => return Err(AssetError::Descriptor("no Idle or Walk animation".to_string())),
        },
    };

    let frame_width = child_text(selected, "FrameWidth")
        .and_then(|t| t.parse().ok())
        .unwrap_or(DEFAULT_FRAME_WIDTH);
    let frame_height = child_text(selected, "FrameHeight")
        .and_then(|t| t.parse().ok())
        .unwrap_or(DEFAULT_FRAME_HEIGHT);
    let durations = selected
        .descendants()
        .filter(|n| n.has_tag_name("Duration"))
        .map(|d| {
            d.text()
                .and_then(|t| t.trim().parse().ok())
                .unwrap_or(DEFAULT_FRAME_DURATION)
        })
        .collect();

    Ok(AnimationDescriptor {
        frame_width,
        frame_height,
        durations,
        animation,
    })
}

fn child_text<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.descendants()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(str::trim)
}

/// A resolved unit sprite.
#[derive(Clone, Debug)]
pub struct LoadedSprite {
    /// Folder the sprite was found in.
    pub path: String,
    pub descriptor: AnimationDescriptor,
    /// `None` if the sheet failed to load after the path was found viable.
    pub image: Option<RgbaImage>,
}

/// Resolve the idle sprite for a unit, trying the base folder then the male variant.
pub async fn resolve_sprite<F: AssetFetcher>(fetcher: &F, asset_folder: &str) -> Result<LoadedSprite, AssetError> {
    let candidates = sprite_paths(asset_folder);
    let last = candidates.len() - 1;
    for (i, path) in candidates.iter().enumerate() {
        if let Some(sprite) = load_sprite_from(fetcher, path, i == last).await {
            return Ok(sprite);
        }
    }
    tracing::warn!("no sprite found for unit folder {}", asset_folder);
    Err(AssetError::NotFound(asset_folder.to_string()))
}

async fn load_sprite_from<F: AssetFetcher>(fetcher: &F, path: &str, final_attempt: bool) -> Option<LoadedSprite> {
    // The idle sheet doubles as the existence probe for the folder.
    let marker = load_image(fetcher, &format!("{}/{}", path, AnimationName::Idle.sheet_file()))
        .await
        .ok()?;

    let xml = fetcher.fetch(&format!("{}/AnimData.xml", path)).await.ok()?;
    let xml = String::from_utf8(xml).ok()?;
    let descriptor = match parse_anim_data(&xml) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            tracing::debug!("{}: {}", path, e);
            return None;
        }
    };

    let image = match descriptor.animation {
        AnimationName::Idle => Some(marker),
        AnimationName::Walk => {
            let sheet = format!("{}/{}", path, AnimationName::Walk.sheet_file());
            match load_image(fetcher, &sheet).await {
                Ok(image) => Some(image),
                Err(e) => {
                    if final_attempt {
                        tracing::error!("failed to load sprite sheet {}: {}", sheet, e);
                    }
                    None
                }
            }
        }
    };

    Some(LoadedSprite {
        path: path.to_string(),
        descriptor,
        image,
    })
}

/// Load the shadow sheet next to a resolved sprite, with its baseline offset.
pub async fn resolve_shadow<F: AssetFetcher>(fetcher: &F, sprite: &LoadedSprite) -> Option<ShadowLayer> {
    let path = format!("{}/Shadow.png", sprite.path);
    match load_image(fetcher, &path).await {
        Ok(image) => {
            let offset = shadow_baseline_offset(
                &image,
                sprite.descriptor.frame_width,
                sprite.descriptor.frame_height,
            );
            Some(ShadowLayer { image, offset })
        }
        Err(e) => {
            tracing::debug!("no shadow for {}: {}", sprite.path, e);
            None
        }
    }
}

/// Rows of transparent padding under the shadow in the first frame.
///
/// Scans upward from the bottom row and stops at the first row holding any
/// opaque pixel. A fully transparent frame yields 0.
pub fn shadow_baseline_offset(image: &RgbaImage, frame_width: u32, frame_height: u32) -> u32 {
    let width = frame_width.min(image.width());
    let height = frame_height.min(image.height());

    let mut offset = 0;
    for y in (0..height).rev() {
        let transparent = (0..width).all(|x| image.get_pixel(x, y)[3] == 0);
        if !transparent {
            return offset;
        }
        offset += 1;
    }
    0
}

/// Resolve a unit portrait; `None` means draw the empty placeholder.
pub async fn resolve_portrait<F: AssetFetcher>(fetcher: &F, asset_folder: &str) -> Option<(String, RgbaImage)> {
    for path in portrait_paths(asset_folder) {
        if let Ok(image) = load_image(fetcher, &path).await {
            return Some((path, image));
        }
    }
    tracing::debug!("no portrait for unit folder {}", asset_folder);
    None
}
