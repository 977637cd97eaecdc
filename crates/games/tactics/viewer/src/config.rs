//! Viewer configuration.

use std::time::Duration;

/// Runtime configuration shared by the networking, asset and rendering layers.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Base URL of the backend (e.g., "http://localhost:8000").
    pub server_url: String,
    /// Requests taking longer than this resolve as a failed response.
    pub request_timeout: Duration,
    /// How long a toast stays visible.
    pub toast_duration: Duration,
    /// Repaint rate driving sprite animations.
    pub repaint_hz: u32,
    /// Source tile size in tileset images, in pixels.
    pub tile_size: u32,
    /// Integer scale applied when blitting tiles.
    pub tile_scale: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            request_timeout: Duration::from_millis(5000),
            toast_duration: Duration::from_millis(3000),
            repaint_hz: 60,
            tile_size: 16,
            tile_scale: 2,
        }
    }
}

impl ViewerConfig {
    /// Edge length of one tile on the canvas.
    pub fn tile_px(&self) -> u32 {
        self.tile_size * self.tile_scale
    }

    /// Interval between two repaint steps.
    pub fn repaint_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.repaint_hz.max(1)))
    }
}
