//! Fixtures shared by unit tests.

use tactics_types::{
    GameMode, GameStatus, HostInfo, MapDetail, Match, PlacedUnit, RosterEntry, TileData, TileRef,
    UnitSummary,
};

/// A 4x4 Conquest match for users 1 (host, seat 1) and 2 (seat 2).
///
/// Seat 1 spawns in column 0, seat 2 in column 3.
pub fn sample_match(status: GameStatus, unit_limit: Option<u32>) -> Match {
    let base = (0..4)
        .map(|_| (0..4).map(|x| Some(TileRef(Some(x), Some(0)))).collect())
        .collect();
    let spawn_points = (0..4).map(|_| vec![1, 0, 0, 2]).collect();

    Match {
        id: 7,
        game_name: "My Match".to_string(),
        link: "abc123".to_string(),
        status,
        gamemode: GameMode::Conquest,
        map_name: "Route 224".to_string(),
        map: MapDetail {
            id: 1,
            name: "Route 224".to_string(),
            width: 4,
            height: 4,
            tileset_names: vec!["outside.png".to_string()],
            tile_data: Some(TileData {
                base,
                overlay: Vec::new(),
                spawn_points: Some(spawn_points),
                flag_data: None,
            }),
            allowed_modes: vec![GameMode::Conquest],
        },
        host_id: 1,
        host: Some(HostInfo {
            id: 1,
            username: "ash".to_string(),
        }),
        players: vec![
            RosterEntry {
                id: 10,
                player_id: 1,
                username: "ash".to_string(),
                is_ready: false,
                cash_remaining: Some(100),
                units: Vec::new(),
            },
            RosterEntry {
                id: 20,
                player_id: 2,
                username: "gary".to_string(),
                is_ready: false,
                cash_remaining: Some(100),
                units: Vec::new(),
            },
        ],
        max_players: 2,
        is_private: false,
        starting_cash: Some(100),
        cash_per_turn: Some(10),
        unit_limit,
        max_turns: Some(30),
        turn_time_limit: None,
        current_turn: None,
        winner_id: None,
        timestamp: "2025-05-01T12:00:00".to_string(),
    }
}

pub fn unit(id: u64, cost: u32) -> UnitSummary {
    UnitSummary {
        id,
        name: format!("unit-{}", id),
        asset_folder: format!("{:04}", id),
        types: vec!["normal".to_string()],
        cost,
        species_id: Some(id),
        form_id: None,
        base_stats: None,
        move_ids: Vec::new(),
    }
}

pub fn placed(id: u64, owner: u64, x: u16, y: u16, cost: u32) -> PlacedUnit {
    PlacedUnit {
        id,
        unit_id: 1,
        unit: unit(1, cost),
        x,
        y,
        current_hp: 40,
        player_id: owner,
        status_effects: Vec::new(),
    }
}
