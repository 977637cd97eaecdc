//! Mode-specific highlight layers drawn on top of the tile map.

use crate::rendering::{Canvas, Rect};
use image::Rgba;
use tactics_types::{Tile, TileData};

/// Own spawn cells, 35% yellow.
pub const SPAWN_ZONE_COLOR: Rgba<u8> = Rgba([255, 255, 0, 89]);
/// The selected spawn cell, 50% orange.
pub const SPAWN_ACTIVE_COLOR: Rgba<u8> = Rgba([255, 165, 0, 128]);
/// Flag cells, 40% cyan.
pub const FLAG_ZONE_COLOR: Rgba<u8> = Rgba([0, 200, 255, 102]);

fn fill_tile<C: Canvas + ?Sized>(canvas: &mut C, x: usize, y: usize, tile_px: u32, color: Rgba<u8>) {
    let dst = Rect::new((x as u32 * tile_px) as i32, (y as u32 * tile_px) as i32, tile_px, tile_px);
    canvas.fill_rect(dst, color);
}

/// Highlight the cells `seat` may spawn on. Returns the number of cells filled.
pub fn conquest_overlay<C: Canvas + ?Sized>(
    canvas: &mut C,
    tiles: &TileData,
    seat: u8,
    active: Option<Tile>,
    tile_px: u32,
) -> usize {
    let Some(grid) = tiles.spawn_points.as_ref() else {
        return 0;
    };
    if seat == 0 {
        return 0;
    }

    let mut filled = 0;
    for (y, row) in grid.iter().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            if cell != seat {
                continue;
            }
            let is_active = active.is_some_and(|t| t.x as usize == x && t.y as usize == y);
            let color = if is_active { SPAWN_ACTIVE_COLOR } else { SPAWN_ZONE_COLOR };
            fill_tile(canvas, x, y, tile_px, color);
            filled += 1;
        }
    }
    filled
}

/// Highlight every flag cell.
pub fn ctf_overlay<C: Canvas + ?Sized>(canvas: &mut C, tiles: &TileData, tile_px: u32) -> usize {
    let Some(grid) = tiles.flag_data.as_ref() else {
        return 0;
    };

    let mut filled = 0;
    for (y, row) in grid.iter().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            if cell == 0 {
                continue;
            }
            fill_tile(canvas, x, y, tile_px, FLAG_ZONE_COLOR);
            filled += 1;
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::canvas::tests::RecordingCanvas;

    fn tiles() -> TileData {
        TileData {
            spawn_points: Some(vec![vec![1, 0, 2], vec![1, 1, 2]]),
            flag_data: Some(vec![vec![0, 3, 0], vec![0, 0, 1]]),
            ..TileData::default()
        }
    }

    #[test]
    fn test_conquest_highlights_own_seat() {
        let mut canvas = RecordingCanvas::new(96, 64);
        let filled = conquest_overlay(&mut canvas, &tiles(), 1, Some(Tile::new(1, 1)), 32);

        assert_eq!(filled, 3);
        assert_eq!(canvas.fills[0], (Rect::new(0, 0, 32, 32), SPAWN_ZONE_COLOR));
        assert_eq!(canvas.fills[2], (Rect::new(32, 32, 32, 32), SPAWN_ACTIVE_COLOR));
    }

    #[test]
    fn test_conquest_without_seat_draws_nothing() {
        let mut canvas = RecordingCanvas::new(96, 64);
        assert_eq!(conquest_overlay(&mut canvas, &tiles(), 0, None, 32), 0);
        assert_eq!(conquest_overlay(&mut canvas, &TileData::default(), 1, None, 32), 0);
        assert!(canvas.fills.is_empty());
    }

    #[test]
    fn test_flag_cells() {
        let mut canvas = RecordingCanvas::new(96, 64);
        assert_eq!(ctf_overlay(&mut canvas, &tiles(), 32), 2);
        assert_eq!(canvas.fills[1], (Rect::new(64, 32, 32, 32), FLAG_ZONE_COLOR));
    }
}
