//! Frame-timed sprite animation.
//!
//! Sheets lay their frames out left to right on the first row. Each repaint
//! draws the current frame, then counts one tick against that frame's
//! duration.

use crate::assets::{AnimationDescriptor, LoadedSprite};
use crate::rendering::{Canvas, Rect};
use image::RgbaImage;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Frame shown after `ticks` repaints, given per-frame durations.
///
/// Durations of 0 count as 1. An empty list always yields frame 0.
pub fn frame_at(durations: &[u32], ticks: u64) -> usize {
    let cycle: u64 = durations.iter().map(|d| u64::from((*d).max(1))).sum();
    if cycle == 0 {
        return 0;
    }
    let mut remaining = ticks % cycle;
    for (i, d) in durations.iter().enumerate() {
        let d = u64::from((*d).max(1));
        if remaining < d {
            return i;
        }
        remaining -= d;
    }
    0
}

/// A decoded sheet with its frame geometry.
#[derive(Clone, Debug)]
pub struct SpriteSheet {
    pub image: RgbaImage,
    pub descriptor: AnimationDescriptor,
}

impl SpriteSheet {
    /// `None` when the sheet image failed to load.
    pub fn from_loaded(sprite: LoadedSprite) -> Option<Self> {
        let image = sprite.image?;
        Some(Self {
            image,
            descriptor: sprite.descriptor,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.descriptor.durations.len()
    }

    fn frame_rect(&self, frame: usize) -> Rect {
        let fw = self.descriptor.frame_width;
        Rect::new((frame as u32 * fw) as i32, 0, fw, self.descriptor.frame_height)
    }
}

/// Shadow sheet drawn under a map-placed sprite.
#[derive(Clone, Debug)]
pub struct ShadowLayer {
    pub image: RgbaImage,
    /// Rows both layers are shifted down by.
    pub offset: u32,
}

/// Steps through a sheet's frames on a tick schedule.
#[derive(Clone, Debug)]
pub struct SpriteAnimator {
    sheet: SpriteSheet,
    shadow: Option<ShadowLayer>,
    frame: usize,
    tick: u32,
}

impl SpriteAnimator {
    pub fn new(sheet: SpriteSheet, shadow: Option<ShadowLayer>) -> Self {
        Self {
            sheet,
            shadow,
            frame: 0,
            tick: 0,
        }
    }

    pub fn frame_index(&self) -> usize {
        self.frame
    }

    /// Canvas size that fits a frame plus the baseline shift.
    pub fn canvas_size(&self) -> (u32, u32) {
        let offset = self.shadow.as_ref().map_or(0, |s| s.offset);
        (
            self.sheet.descriptor.frame_width,
            self.sheet.descriptor.frame_height + offset,
        )
    }

    /// Swap in a new sheet; playback restarts at frame 0.
    pub fn set_sheet(&mut self, sheet: SpriteSheet, shadow: Option<ShadowLayer>) {
        self.sheet = sheet;
        self.shadow = shadow;
        self.frame = 0;
        self.tick = 0;
    }

    /// Count one tick without drawing.
    pub fn advance(&mut self) {
        let count = self.sheet.frame_count();
        if count == 0 {
            return;
        }
        self.tick += 1;
        let duration = self.sheet.descriptor.durations[self.frame % count].max(1);
        if self.tick >= duration {
            self.tick = 0;
            self.frame = (self.frame + 1) % count;
        }
    }

    /// Draw the current frame, shadow first.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        canvas.clear();
        let src = self.sheet.frame_rect(self.frame);
        let offset = self.shadow.as_ref().map_or(0, |s| s.offset) as i32;
        let dst = Rect::new(0, offset, src.w, src.h);
        if let Some(shadow) = &self.shadow {
            canvas.draw_image(&shadow.image, src, dst);
        }
        canvas.draw_image(&self.sheet.image, src, dst);
    }

    /// One repaint: draw, then advance.
    pub fn step<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        self.draw(canvas);
        self.advance();
    }
}

/// A running repaint loop. Dropping the handle stops it.
#[derive(Debug)]
pub struct AnimationHandle {
    task: JoinHandle<()>,
}

impl AnimationHandle {
    /// Repaint `canvas` every `interval` until dropped.
    pub fn spawn<C>(mut animator: SpriteAnimator, canvas: Arc<Mutex<C>>, interval: Duration) -> Self
    where
        C: Canvas + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match canvas.lock() {
                    Ok(mut canvas) => animator.step(&mut *canvas),
                    Err(_) => {
                        tracing::warn!("sprite canvas poisoned, stopping animation");
                        break;
                    }
                }
            }
        });
        Self { task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
