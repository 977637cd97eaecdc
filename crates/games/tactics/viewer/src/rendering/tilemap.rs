//! Tile map rendering.
//!
//! A pass loads every tileset first and draws only once all of them are in
//! memory. The base layer and overlay layer are blitted per cell, then the
//! caller's overlay callback runs once on top.

use crate::assets::{load_image, tileset_path, AssetFetcher};
use crate::config::ViewerConfig;
use crate::errors::RenderError;
use crate::rendering::{Canvas, Rect};
use futures_util::future::join_all;
use image::RgbaImage;
use std::sync::Arc;
use tactics_types::{Match, MapDetail, TileData, TileLayer};

/// Result of a render pass that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// No canvas, or the map has no tile data or tilesets.
    Skipped,
    Drawn { tiles: usize },
}

/// Load all tilesets, in order. Any failure fails the whole set.
pub async fn load_tilesets<F: AssetFetcher>(fetcher: &F, names: &[String]) -> Result<Vec<RgbaImage>, RenderError> {
    let loads = names.iter().map(|name| async move {
        load_image(fetcher, &tileset_path(name))
            .await
            .map_err(|source| RenderError::TilesetLoad {
                name: name.clone(),
                source,
            })
    });
    join_all(loads).await.into_iter().collect()
}

/// Draw both tile layers. Returns the number of tiles blitted.
pub fn draw_layers<C: Canvas + ?Sized>(
    canvas: &mut C,
    map: &MapDetail,
    tiles: &TileData,
    tilesets: &[RgbaImage],
    tile_size: u32,
    scale: u32,
) -> usize {
    let mut drawn = 0;
    for y in 0..map.height {
        for x in 0..map.width {
            for layer in [&tiles.base, &tiles.overlay] {
                if draw_cell(canvas, layer, x, y, tilesets, tile_size, scale) {
                    drawn += 1;
                }
            }
        }
    }
    drawn
}

fn draw_cell<C: Canvas + ?Sized>(
    canvas: &mut C,
    layer: &TileLayer,
    x: u16,
    y: u16,
    tilesets: &[RgbaImage],
    tile_size: u32,
    scale: u32,
) -> bool {
    let Some((tile_index, tileset_index)) = TileData::cell(layer, x, y).and_then(|r| r.resolve()) else {
        return false;
    };
    let Some(tileset) = tilesets.get(tileset_index) else {
        return false;
    };
    let tiles_per_row = tileset.width() / tile_size.max(1);
    if tiles_per_row == 0 {
        return false;
    }

    let src = Rect::new(
        ((tile_index % tiles_per_row) * tile_size) as i32,
        ((tile_index / tiles_per_row) * tile_size) as i32,
        tile_size,
        tile_size,
    );
    let px = tile_size * scale;
    let dst = Rect::new((x as u32 * px) as i32, (y as u32 * px) as i32, px, px);
    canvas.draw_image(tileset, src, dst);
    true
}

/// Run one full render pass of `map` onto `canvas`.
///
/// On a tileset load failure nothing is drawn and the overlay is not called.
pub async fn render_map<F, C, O>(
    fetcher: &F,
    canvas: Option<&mut C>,
    map: &MapDetail,
    config: &ViewerConfig,
    overlay: O,
) -> Result<RenderOutcome, RenderError>
where
    F: AssetFetcher,
    C: Canvas + ?Sized,
    O: FnOnce(&mut C),
{
    let (Some(canvas), Some(tiles)) = (canvas, map.tile_data.as_ref()) else {
        return Ok(RenderOutcome::Skipped);
    };
    if map.tileset_names.is_empty() {
        return Ok(RenderOutcome::Skipped);
    }

    let tilesets = match load_tilesets(fetcher, &map.tileset_names).await {
        Ok(tilesets) => tilesets,
        Err(e) => {
            tracing::error!("map {}: {}", map.name, e);
            return Err(e);
        }
    };

    canvas.clear();
    let drawn = draw_layers(canvas, map, tiles, &tilesets, config.tile_size, config.tile_scale);
    overlay(canvas);
    tracing::debug!("map {}: drew {} tiles", map.name, drawn);
    Ok(RenderOutcome::Drawn { tiles: drawn })
}

/// Re-renders whenever it is handed a different match snapshot.
#[derive(Debug)]
pub struct TileMapRenderer {
    config: ViewerConfig,
    last: Option<Arc<Match>>,
}

impl TileMapRenderer {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config, last: None }
    }

    /// Canvas dimensions needed for `map`.
    pub fn canvas_size(&self, map: &MapDetail) -> (u32, u32) {
        let px = self.config.tile_px();
        (map.width as u32 * px, map.height as u32 * px)
    }

    /// Render unless `game` is the same snapshot as the last pass.
    ///
    /// Returns `Ok(None)` when nothing changed. A failed pass is not retried
    /// until a new snapshot arrives.
    pub async fn render_if_changed<F, C, O>(
        &mut self,
        fetcher: &F,
        canvas: Option<&mut C>,
        game: &Arc<Match>,
        overlay: O,
    ) -> Result<Option<RenderOutcome>, RenderError>
    where
        F: AssetFetcher,
        C: Canvas + ?Sized,
        O: FnOnce(&mut C),
    {
        if self.last.as_ref().is_some_and(|last| Arc::ptr_eq(last, game)) {
            return Ok(None);
        }
        self.last = Some(Arc::clone(game));
        render_map(fetcher, canvas, &game.map, &self.config, overlay).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::tests::MemoryAssets;
    use crate::game::test_support::sample_match;
    use crate::rendering::canvas::tests::RecordingCanvas;
    use crate::rendering::PixelCanvas;
    use crate::errors::AssetError;
    use image::Rgba;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tactics_types::{GameStatus, TileRef};
    use tokio::sync::Notify;

    /// Holds back one path until the gate opens.
    struct GatedAssets {
        inner: MemoryAssets,
        gated: String,
        gate: Arc<Notify>,
        fetched: AtomicUsize,
    }

    impl AssetFetcher for GatedAssets {
        async fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
            if path == self.gated {
                self.gate.notified().await;
            }
            let bytes = self.inner.fetch(path).await;
            self.fetched.fetch_add(1, Ordering::SeqCst);
            bytes
        }
    }

    /// Records `(source image width, src, dst)` into shared storage.
    struct SharedCanvas {
        draws: Arc<Mutex<Vec<(u32, Rect, Rect)>>>,
    }

    impl Canvas for SharedCanvas {
        fn width(&self) -> u32 {
            64
        }

        fn height(&self) -> u32 {
            64
        }

        fn clear(&mut self) {}

        fn draw_image(&mut self, image: &RgbaImage, src: Rect, dst: Rect) {
            self.draws.lock().unwrap().push((image.width(), src, dst));
        }

        fn fill_rect(&mut self, _dst: Rect, _color: Rgba<u8>) {}
    }

    /// 64x32 tileset: 4 tiles per row, 2 rows, each tile a distinct colour.
    fn tileset() -> RgbaImage {
        RgbaImage::from_fn(64, 32, |x, y| {
            let index = (y / 16) * 4 + x / 16;
            Rgba([index as u8 * 10, 0, 0, 255])
        })
    }

    fn assets() -> MemoryAssets {
        let mut assets = MemoryAssets::default();
        assets.insert_image("assets/tilesets/outside.png", &tileset());
        assets
    }

    #[tokio::test]
    async fn test_draws_every_base_tile_then_overlay_once() {
        let game = sample_match(GameStatus::Preparation, None);
        let mut canvas = RecordingCanvas::new(128, 128);
        let mut overlay_calls = 0;

        let outcome = render_map(&assets(), Some(&mut canvas), &game.map, &ViewerConfig::default(), |c: &mut RecordingCanvas| {
            overlay_calls += 1;
            assert_eq!(c.images.len(), 16);
        })
        .await
        .unwrap();

        assert_eq!(outcome, RenderOutcome::Drawn { tiles: 16 });
        assert_eq!(overlay_calls, 1);
        // Column 3 uses tile 3: source (48, 0), destination scaled by 2.
        assert!(canvas
            .images
            .contains(&(Rect::new(48, 0, 16, 16), Rect::new(96, 32, 32, 32))));
    }

    #[tokio::test]
    async fn test_draw_waits_for_every_tileset() {
        let mut game = sample_match(GameStatus::Preparation, None);
        game.map.tileset_names.push("inside.png".to_string());
        let tiles = game.map.tile_data.as_mut().unwrap();
        tiles.overlay = vec![vec![None, Some(TileRef(Some(1), Some(1)))]];

        let mut inner = assets();
        inner.insert_image("assets/tilesets/inside.png", &RgbaImage::from_pixel(32, 16, Rgba([0, 9, 0, 255])));
        let gate = Arc::new(Notify::new());
        let assets = GatedAssets {
            inner,
            gated: "assets/tilesets/inside.png".to_string(),
            gate: Arc::clone(&gate),
            fetched: AtomicUsize::new(0),
        };

        let draws = Arc::new(Mutex::new(Vec::new()));
        let mut canvas = SharedCanvas {
            draws: Arc::clone(&draws),
        };
        let overlay_calls = AtomicUsize::new(0);
        let config = ViewerConfig::default();
        let mut render = std::pin::pin!(render_map(&assets, Some(&mut canvas), &game.map, &config, |_: &mut SharedCanvas| {
            overlay_calls.fetch_add(1, Ordering::SeqCst);
        }));

        // First tileset is in, second is held back: nothing may be drawn yet.
        assert!(tokio::time::timeout(Duration::from_millis(50), &mut render).await.is_err());
        assert_eq!(assets.fetched.load(Ordering::SeqCst), 1);
        assert!(draws.lock().unwrap().is_empty());
        assert_eq!(overlay_calls.load(Ordering::SeqCst), 0);

        gate.notify_one();
        let outcome = render.await.unwrap();
        assert_eq!(outcome, RenderOutcome::Drawn { tiles: 17 });
        assert_eq!(overlay_calls.load(Ordering::SeqCst), 1);

        // Tile 1 of the 2-wide second tileset, drawn on cell (1, 0).
        let draws = draws.lock().unwrap();
        assert!(draws.contains(&(32, Rect::new(16, 0, 16, 16), Rect::new(32, 0, 32, 32))));
        assert_eq!(draws.iter().filter(|(w, _, _)| *w == 32).count(), 1);
    }

    #[tokio::test]
    async fn test_negative_and_missing_indices_are_skipped() {
        let mut game = sample_match(GameStatus::Preparation, None);
        let tiles = game.map.tile_data.as_mut().unwrap();
        tiles.base[0][0] = Some(TileRef(Some(-1), Some(0)));
        tiles.base[0][1] = Some(TileRef(None, Some(0)));
        tiles.base[0][2] = None;
        tiles.base[0][3] = Some(TileRef(Some(1), Some(5)));
        tiles.overlay = vec![vec![None, Some(TileRef(Some(5), Some(0)))]];

        let mut canvas = RecordingCanvas::new(128, 128);
        let outcome = render_map(&assets(), Some(&mut canvas), &game.map, &ViewerConfig::default(), |_: &mut RecordingCanvas| {})
            .await
            .unwrap();

        assert_eq!(outcome, RenderOutcome::Drawn { tiles: 13 });
        assert!(canvas.images.iter().all(|(_, dst)| dst.y != 0 || dst.x == 32));
        // Tile 5 on a 4-wide sheet sits at column 1, row 1.
        assert!(canvas
            .images
            .contains(&(Rect::new(16, 16, 16, 16), Rect::new(32, 0, 32, 32))));
    }

    #[tokio::test]
    async fn test_tileset_failure_aborts_pass() {
        let mut game = sample_match(GameStatus::Preparation, None);
        game.map.tileset_names.push("missing.png".to_string());

        let mut canvas = RecordingCanvas::new(128, 128);
        let mut overlay_called = false;
        let err = render_map(&assets(), Some(&mut canvas), &game.map, &ViewerConfig::default(), |_: &mut RecordingCanvas| {
            overlay_called = true
        })
        .await
        .unwrap_err();

        assert_eq!(
            err,
            RenderError::TilesetLoad {
                name: "missing.png".to_string(),
                source: AssetError::NotFound("assets/tilesets/missing.png".to_string()),
            }
        );
        assert!(canvas.images.is_empty());
        assert_eq!(canvas.clears, 0);
        assert!(!overlay_called);
    }

    #[tokio::test]
    async fn test_missing_inputs_are_a_no_op() {
        let mut game = sample_match(GameStatus::Preparation, None);
        let config = ViewerConfig::default();

        let outcome = render_map(&assets(), None::<&mut RecordingCanvas>, &game.map, &config, |_| {})
            .await
            .unwrap();
        assert_eq!(outcome, RenderOutcome::Skipped);

        game.map.tile_data = None;
        let mut canvas = RecordingCanvas::new(128, 128);
        let outcome = render_map(&assets(), Some(&mut canvas), &game.map, &config, |_| {})
            .await
            .unwrap();
        assert_eq!(outcome, RenderOutcome::Skipped);
        assert!(canvas.images.is_empty());
    }

    #[tokio::test]
    async fn test_renderer_reruns_only_on_new_snapshot() {
        let game = Arc::new(sample_match(GameStatus::Preparation, None));
        let mut renderer = TileMapRenderer::new(ViewerConfig::default());
        let (w, h) = renderer.canvas_size(&game.map);
        assert_eq!((w, h), (128, 128));
        let mut canvas = PixelCanvas::new(w, h);
        let assets = assets();

        let first = renderer.render_if_changed(&assets, Some(&mut canvas), &game, |_| {}).await.unwrap();
        assert_eq!(first, Some(RenderOutcome::Drawn { tiles: 16 }));
        assert_eq!(*canvas.image().get_pixel(100, 5), Rgba([30, 0, 0, 255]));

        let again = renderer.render_if_changed(&assets, Some(&mut canvas), &game, |_| {}).await.unwrap();
        assert_eq!(again, None);

        let refreshed = Arc::new((*game).clone());
        let third = renderer.render_if_changed(&assets, Some(&mut canvas), &refreshed, |_| {}).await.unwrap();
        assert!(third.is_some());
    }
}
