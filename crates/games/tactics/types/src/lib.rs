//! Canonical serializable types for the tactics match viewer.
//!
//! Every payload the backend returns is deserialized into one of these
//! structures at the API boundary. Anything that does not fit is rejected
//! there instead of leaking half-formed data into rendering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position on the map, in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub x: u16,
    pub y: u16,
}

impl Tile {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Lifecycle stage of a match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Open,
    Closed,
    Preparation,
    InProgress,
    Completed,
}

/// Game mode tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    #[serde(rename = "Conquest", alias = "conquest")]
    Conquest,
    #[serde(rename = "War", alias = "war")]
    War,
    #[serde(rename = "Capture The Flag", alias = "capture_the_flag", alias = "capture-the-flag")]
    CaptureTheFlag,
}

impl GameMode {
    /// Wire name, as sent in a create-game request.
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Conquest => "Conquest",
            GameMode::War => "War",
            GameMode::CaptureTheFlag => "Capture The Flag",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference into a tileset: `[tile_index, tileset_index]` on the wire.
///
/// Either half may be `null`, and a negative tile index means "no tile".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRef(pub Option<i32>, pub Option<i32>);

impl TileRef {
    /// Returns `(tile_index, tileset_index)` if this reference names a drawable tile.
    pub fn resolve(self) -> Option<(u32, usize)> {
        let tile = self.0.filter(|t| *t >= 0)?;
        let tileset = self.1.filter(|t| *t >= 0)?;
        Some((tile as u32, tileset as usize))
    }
}

/// One layer of tile references, indexed `[y][x]`.
pub type TileLayer = Vec<Vec<Option<TileRef>>>;

/// Tile grids for a map, plus mode-specific auxiliary grids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TileData {
    #[serde(default)]
    pub base: TileLayer,
    #[serde(default)]
    pub overlay: TileLayer,
    /// Conquest: each cell holds the 1-based seat number allowed to spawn there, or 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn_points: Option<Vec<Vec<u8>>>,
    /// Capture The Flag: non-zero cells are flag locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_data: Option<Vec<Vec<u8>>>,
}

impl TileData {
    /// Tile reference at `(x, y)` in a layer, if the cell exists and is not empty.
    pub fn cell(layer: &TileLayer, x: u16, y: u16) -> Option<TileRef> {
        layer
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .flatten()
    }

    /// Seat number tagged on a spawn cell (0 when untagged or out of range).
    pub fn spawn_seat(&self, tile: Tile) -> u8 {
        self.spawn_points
            .as_ref()
            .and_then(|grid| grid.get(tile.y as usize))
            .and_then(|row| row.get(tile.x as usize))
            .copied()
            .unwrap_or(0)
    }
}

/// Full map attached to a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapDetail {
    pub id: u64,
    pub name: String,
    pub width: u16,
    pub height: u16,
    #[serde(default)]
    pub tileset_names: Vec<String>,
    #[serde(default)]
    pub tile_data: Option<TileData>,
    #[serde(default)]
    pub allowed_modes: Vec<GameMode>,
}

/// Map catalog entry used when creating a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSummary {
    pub id: u64,
    pub name: String,
    pub width: u16,
    pub height: u16,
    #[serde(default)]
    pub allowed_modes: Vec<GameMode>,
}

/// Host of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub id: u64,
    pub username: String,
}

/// One seat in a match roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Seat identifier; seats are numbered by ascending `id`.
    pub id: u64,
    /// User identifier of the occupant.
    pub player_id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default)]
    pub cash_remaining: Option<u32>,
    #[serde(default)]
    pub units: Vec<u64>,
}

/// Match detail as returned by `GET /api/games/{id_or_link}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: u64,
    pub game_name: String,
    pub link: String,
    pub status: GameStatus,
    pub gamemode: GameMode,
    pub map_name: String,
    pub map: MapDetail,
    pub host_id: u64,
    #[serde(default)]
    pub host: Option<HostInfo>,
    #[serde(default)]
    pub players: Vec<RosterEntry>,
    pub max_players: u8,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub starting_cash: Option<u32>,
    #[serde(default)]
    pub cash_per_turn: Option<u32>,
    #[serde(default)]
    pub unit_limit: Option<u32>,
    #[serde(default)]
    pub max_turns: Option<u32>,
    #[serde(default)]
    pub turn_time_limit: Option<u32>,
    #[serde(default)]
    pub current_turn: Option<u32>,
    #[serde(default)]
    pub winner_id: Option<u64>,
    #[serde(default)]
    pub timestamp: String,
}

impl Match {
    /// Check that the map grids agree with the declared map size.
    ///
    /// A map without tile data is valid here; the renderer treats it as empty.
    pub fn validate(&self) -> Result<(), PayloadError> {
        let Some(tile_data) = &self.map.tile_data else {
            return Ok(());
        };
        check_layer("base", &tile_data.base, self.map.width, self.map.height)?;
        if !tile_data.overlay.is_empty() {
            check_layer("overlay", &tile_data.overlay, self.map.width, self.map.height)?;
        }
        Ok(())
    }

    /// 1-based seat of a user, by ascending seat id.
    pub fn seat_of(&self, user_id: u64) -> Option<u8> {
        let mut seats: Vec<&RosterEntry> = self.players.iter().collect();
        seats.sort_by_key(|p| p.id);
        seats
            .iter()
            .position(|p| p.player_id == user_id)
            .map(|idx| (idx + 1) as u8)
    }
}

fn check_layer<T>(layer: &'static str, grid: &[Vec<T>], width: u16, height: u16) -> Result<(), PayloadError> {
    if grid.len() != height as usize {
        return Err(PayloadError::GridMismatch {
            layer,
            expected: (width, height),
            found_rows: grid.len(),
        });
    }
    if let Some(row) = grid.iter().find(|row| row.len() != width as usize) {
        return Err(PayloadError::RowMismatch {
            layer,
            expected: width,
            found: row.len(),
        });
    }
    Ok(())
}

/// Player shown in a lobby listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedPlayer {
    /// User identifier (listings carry no seat ids).
    pub id: u64,
    #[serde(default)]
    pub username: String,
}

/// Lobby listing entry (open, completed and in-progress lists).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameListing {
    pub id: u64,
    #[serde(default)]
    pub game_name: String,
    pub link: String,
    #[serde(default)]
    pub status: GameStatus,
    pub map_name: String,
    pub max_players: u8,
    #[serde(default)]
    pub host: Option<HostInfo>,
    #[serde(default)]
    pub players: Vec<ListedPlayer>,
    #[serde(default)]
    pub timestamp: String,
}

/// Any response that only needs to surface the match link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub link: String,
}

/// Body of `POST /api/games/create`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateGameRequest {
    pub game_name: String,
    pub map_name: String,
    pub gamemode: GameMode,
    pub max_players: u8,
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_cash: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_per_turn: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_time_limit: Option<u32>,
}

/// The requesting player's per-match state (`GET /api/games/{link}/player`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: u64,
    pub player_id: u64,
    #[serde(default)]
    pub cash_remaining: u32,
    #[serde(default)]
    pub is_ready: bool,
    #[serde(default)]
    pub units: Vec<u64>,
}

/// Unit catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub id: u64,
    pub name: String,
    pub asset_folder: String,
    #[serde(default)]
    pub types: Vec<String>,
    pub cost: u32,
    #[serde(default)]
    pub species_id: Option<u64>,
    #[serde(default)]
    pub form_id: Option<u64>,
    #[serde(default)]
    pub base_stats: Option<BaseStats>,
    #[serde(default)]
    pub move_ids: Vec<u64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub sp_attack: u32,
    pub sp_defense: u32,
    pub speed: u32,
}

/// A unit instance committed to a tile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedUnit {
    pub id: u64,
    pub unit_id: u64,
    pub unit: UnitSummary,
    pub x: u16,
    pub y: u16,
    pub current_hp: u32,
    /// User identifier of the owner.
    pub player_id: u64,
    #[serde(default)]
    pub status_effects: Vec<String>,
}

impl PlacedUnit {
    pub fn tile(&self) -> Tile {
        Tile::new(self.x, self.y)
    }
}

/// Body of `POST /api/games/{link}/units/place`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceUnitRequest {
    pub unit_id: u64,
    pub x: u16,
    pub y: u16,
}

/// Move catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveInfo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub move_type: String,
    pub category: String,
    #[serde(default)]
    pub power: Option<u32>,
    #[serde(default)]
    pub accuracy: Option<u32>,
    #[serde(default)]
    pub pp: Option<u32>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub targeting: Option<String>,
    #[serde(default)]
    pub cooldown: Option<u32>,
    #[serde(default)]
    pub effects: Vec<String>,
}

/// Authenticated user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub elo: Option<i32>,
    #[serde(default)]
    pub currency: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Match-scoped notifications relayed over the game WebSocket.
///
/// The payload is a bare event name; anything outside this set is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Notification {
    PlayerJoined,
    GameStarted,
    PlayerReady,
    PreparationStarted,
}

impl Notification {
    pub fn parse(payload: &str) -> Option<Self> {
        match payload.trim() {
            "player_joined" => Some(Notification::PlayerJoined),
            "game_started" => Some(Notification::GameStarted),
            "player_ready" => Some(Notification::PlayerReady),
            "preparation_started" => Some(Notification::PreparationStarted),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Notification::PlayerJoined => "player_joined",
            Notification::GameStarted => "game_started",
            Notification::PlayerReady => "player_ready",
            Notification::PreparationStarted => "preparation_started",
        }
    }
}

/// A payload that deserialized but is structurally inconsistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// A tile grid has the wrong number of rows.
    GridMismatch {
        layer: &'static str,
        expected: (u16, u16),
        found_rows: usize,
    },
    /// A tile grid row has the wrong number of cells.
    RowMismatch {
        layer: &'static str,
        expected: u16,
        found: usize,
    },
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::GridMismatch { layer, expected, found_rows } => write!(
                f,
                "{} layer has {} rows, map is {}x{}",
                layer, found_rows, expected.0, expected.1
            ),
            PayloadError::RowMismatch { layer, expected, found } => {
                write!(f, "{} layer row has {} cells, expected {}", layer, found, expected)
            }
        }
    }
}

impl std::error::Error for PayloadError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match(tile_data: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": 7,
            "game_name": "My Match",
            "link": "abc123",
            "status": "preparation",
            "gamemode": "conquest",
            "map_name": "Route 224",
            "map": {
                "id": 1,
                "name": "Route 224",
                "width": 2,
                "height": 2,
                "tileset_names": ["outside.png"],
                "tile_data": tile_data
            },
            "host_id": 1,
            "players": [
                { "id": 20, "player_id": 2 },
                { "id": 10, "player_id": 1 }
            ],
            "max_players": 2,
            "unit_limit": 3
        })
    }

    #[test]
    fn test_tile_ref_resolution() {
        assert_eq!(TileRef(Some(4), Some(1)).resolve(), Some((4, 1)));
        assert_eq!(TileRef(Some(-1), Some(0)).resolve(), None);
        assert_eq!(TileRef(None, Some(0)).resolve(), None);
        assert_eq!(TileRef(Some(3), None).resolve(), None);
    }

    #[test]
    fn test_match_parses_and_validates() {
        let json = sample_match(serde_json::json!({
            "base": [[[0, 0], [1, 0]], [null, [-1, 0]]],
            "overlay": [[null, null], [[null, 0], null]],
            "spawn_points": [[1, 0], [0, 2]]
        }));
        let game: Match = serde_json::from_value(json).unwrap();
        assert!(game.validate().is_ok());
        assert_eq!(game.status, GameStatus::Preparation);
        assert_eq!(game.gamemode, GameMode::Conquest);

        let tiles = game.map.tile_data.as_ref().unwrap();
        assert_eq!(TileData::cell(&tiles.base, 1, 0), Some(TileRef(Some(1), Some(0))));
        assert_eq!(TileData::cell(&tiles.base, 0, 1), None);
        assert_eq!(tiles.spawn_seat(Tile::new(1, 1)), 2);
        assert_eq!(tiles.spawn_seat(Tile::new(5, 5)), 0);
    }

    #[test]
    fn test_validate_rejects_short_grid() {
        let json = sample_match(serde_json::json!({ "base": [[[0, 0], [1, 0]]] }));
        let game: Match = serde_json::from_value(json).unwrap();
        assert!(matches!(
            game.validate(),
            Err(PayloadError::GridMismatch { layer: "base", found_rows: 1, .. })
        ));
    }

    #[test]
    fn test_missing_tile_data_is_valid() {
        let json = sample_match(serde_json::Value::Null);
        let game: Match = serde_json::from_value(json).unwrap();
        assert!(game.map.tile_data.is_none());
        assert!(game.validate().is_ok());
    }

    #[test]
    fn test_seats_follow_seat_id_order() {
        let json = sample_match(serde_json::Value::Null);
        let game: Match = serde_json::from_value(json).unwrap();
        assert_eq!(game.seat_of(1), Some(1));
        assert_eq!(game.seat_of(2), Some(2));
        assert_eq!(game.seat_of(99), None);
    }

    #[test]
    fn test_mode_aliases() {
        let mode: GameMode = serde_json::from_str("\"Capture The Flag\"").unwrap();
        assert_eq!(mode, GameMode::CaptureTheFlag);
        assert_eq!(serde_json::to_string(&mode).unwrap(), "\"Capture The Flag\"");
        assert_eq!(mode.to_string(), "Capture The Flag");

        let legacy: GameMode = serde_json::from_str("\"capture_the_flag\"").unwrap();
        assert_eq!(legacy, GameMode::CaptureTheFlag);
        let war: GameMode = serde_json::from_str("\"war\"").unwrap();
        assert_eq!(war.as_str(), "War");
    }

    #[test]
    fn test_create_request_sends_title_case_mode() {
        let request = CreateGameRequest {
            game_name: "My Match".to_string(),
            map_name: "Route 224".to_string(),
            gamemode: GameMode::Conquest,
            max_players: 2,
            is_private: false,
            starting_cash: None,
            cash_per_turn: None,
            max_turns: None,
            unit_limit: None,
            turn_time_limit: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["gamemode"], "Conquest");
        assert!(body.get("unit_limit").is_none());

        let ctf = CreateGameRequest {
            gamemode: GameMode::CaptureTheFlag,
            ..request
        };
        assert_eq!(serde_json::to_value(&ctf).unwrap()["gamemode"], "Capture The Flag");
    }

    #[test]
    fn test_listing_players_carry_user_ids() {
        let listings: Vec<GameListing> = serde_json::from_str(
            r#"[{"id": 3, "game_name": "Open One", "link": "xyz789", "status": "open",
                 "map_name": "Route 224", "max_players": 4,
                 "host": {"id": 1, "username": "ash"},
                 "players": [{"id": 1}, {"id": 2, "username": "gary"}],
                 "timestamp": "2025-01-01T10:00:00"}]"#,
        )
        .unwrap();
        assert_eq!(listings[0].players.len(), 2);
        assert_eq!(listings[0].players[0].id, 1);
        assert_eq!(listings[0].players[0].username, "");
        assert_eq!(listings[0].players[1].username, "gary");
    }

    #[test]
    fn test_notification_vocabulary() {
        assert_eq!(Notification::parse("player_joined"), Some(Notification::PlayerJoined));
        assert_eq!(Notification::parse(" game_started\n"), Some(Notification::GameStarted));
        assert_eq!(Notification::parse("chat:hello"), None);
        assert_eq!(Notification::parse(""), None);
    }
}
