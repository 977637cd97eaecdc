//! Preparation-phase placement rules.
//!
//! These checks run before any network call. The backend stays the
//! authority; a request that passes here can still be rejected there.

use crate::errors::ApiError;
use crate::game::{ActiveUnit, MatchState, Selection};
use crate::ui::Toasts;
use std::fmt;
use tactics_types::{GameMode, PlaceUnitRequest, Tile, UnitSummary};

/// Map a canvas pixel to the tile under it.
pub fn pixel_to_tile(px: u32, py: u32, tile_px: u32) -> Tile {
    let tile_px = tile_px.max(1);
    let axis = |p: u32| u16::try_from(p / tile_px).unwrap_or(u16::MAX);
    Tile::new(axis(px), axis(py))
}

/// Outcome of clicking a tile during preparation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileSelection {
    /// The match is not in preparation; clicks do nothing.
    Ignored,
    /// Unit cap already reached.
    CapReached { limit: u32 },
    /// A placed unit already stands here.
    Occupied { unit_instance_id: u64, show_info: bool },
    /// Tile is outside the player's spawn region; selection cleared.
    Cleared,
    /// Tile accepted; the purchase menu may open.
    Accepted(Tile),
}

/// Why a placement did not happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotLoaded,
    CapReached { limit: u32 },
    TileOccupied,
    NoTileSelected,
    InsufficientFunds { name: String, cost: u32, cash: u32 },
    Backend(ApiError),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotLoaded => write!(f, "The match is still loading"),
            Rejection::CapReached { limit } => write!(f, "Unit limit reached ({} max)", limit),
            Rejection::TileOccupied => write!(f, "That tile is already occupied"),
            Rejection::NoTileSelected => write!(f, "Select a tile first"),
            Rejection::InsufficientFunds { name, cost, cash } => {
                write!(f, "Not enough cash for {} ({} needed, {} left)", name, cost, cash)
            }
            Rejection::Backend(_) => write!(f, "The server rejected that action"),
        }
    }
}

impl std::error::Error for Rejection {}

/// Apply the placement rules to a clicked tile, in precedence order:
/// unit cap, then occupancy, then (Conquest) spawn region.
pub fn select_tile(state: &MatchState, tile: Tile) -> TileSelection {
    if !state.in_preparation() {
        return TileSelection::Ignored;
    }

    if let Some(limit) = state.game.unit_limit {
        if state.units.len() >= limit as usize {
            return TileSelection::CapReached { limit };
        }
    }

    let conquest = state.game.gamemode == GameMode::Conquest;
    if let Some(unit) = state.unit_at(tile) {
        return TileSelection::Occupied {
            unit_instance_id: unit.id,
            show_info: conquest,
        };
    }

    if conquest {
        let seat = state.seat().unwrap_or(0);
        let tagged = state
            .game
            .map
            .tile_data
            .as_ref()
            .map(|tiles| tiles.spawn_seat(tile))
            .unwrap_or(0);
        if seat == 0 || tagged != seat {
            return TileSelection::Cleared;
        }
    }

    TileSelection::Accepted(tile)
}

/// Local affordability check.
pub fn check_affordable(state: &MatchState, unit: &UnitSummary) -> Result<(), Rejection> {
    if unit.cost > state.cash() {
        return Err(Rejection::InsufficientFunds {
            name: unit.name.clone(),
            cost: unit.cost,
            cash: state.cash(),
        });
    }
    Ok(())
}

/// Selection state plus toasts for the preparation view.
#[derive(Debug)]
pub struct PlacementController {
    pub selection: Selection,
    pub toasts: Toasts,
}

impl PlacementController {
    pub fn new(toasts: Toasts) -> Self {
        Self {
            selection: Selection::default(),
            toasts,
        }
    }

    /// Handle a tile click and update selection, info panel and toasts.
    pub fn click_tile(&mut self, state: &MatchState, tile: Tile) -> TileSelection {
        let outcome = select_tile(state, tile);
        match outcome {
            TileSelection::Ignored => {}
            TileSelection::CapReached { limit } => {
                self.selection.tile = None;
                self.selection.purchase_menu = false;
                self.toasts.show(Rejection::CapReached { limit }.to_string());
            }
            TileSelection::Occupied { unit_instance_id, show_info } => {
                self.selection.tile = None;
                self.selection.purchase_menu = false;
                self.toasts.show(Rejection::TileOccupied.to_string());
                if show_info {
                    self.selection.active_unit = Some(ActiveUnit::Locked(unit_instance_id));
                }
            }
            TileSelection::Cleared => {
                self.selection.tile = None;
                self.selection.purchase_menu = false;
            }
            TileSelection::Accepted(tile) => {
                self.selection.tile = Some(tile);
                self.selection.purchase_menu = true;
            }
        }
        outcome
    }

    /// Build a placement request for the selected tile, or toast why not.
    pub fn begin_purchase(&mut self, state: &MatchState, unit: &UnitSummary) -> Result<PlaceUnitRequest, Rejection> {
        let result = self.purchase_request(state, unit);
        if let Err(rejection) = &result {
            self.toasts.show(rejection.to_string());
        }
        result
    }

    fn purchase_request(&self, state: &MatchState, unit: &UnitSummary) -> Result<PlaceUnitRequest, Rejection> {
        let tile = self.selection.tile.ok_or(Rejection::NoTileSelected)?;
        check_affordable(state, unit)?;
        Ok(PlaceUnitRequest {
            unit_id: unit.id,
            x: tile.x,
            y: tile.y,
        })
    }

    /// Close the menu after a confirmed placement.
    pub fn finish_purchase(&mut self) {
        self.selection.tile = None;
        self.selection.purchase_menu = false;
    }
}
