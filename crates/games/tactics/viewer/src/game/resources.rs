//! Match view state.

use std::sync::Arc;
use tactics_types::{GameStatus, Match, PlacedUnit, PlayerState, Tile};

/// Everything one refresh cycle fetched for a match.
///
/// Replaced wholesale on every refresh; never patched field by field.
#[derive(Clone, Debug)]
pub struct MatchState {
    pub game: Arc<Match>,
    /// The requesting player's seat state; `cash_remaining` is the local cash mirror.
    /// `None` when viewing as a spectator.
    pub player: Option<PlayerState>,
    /// Placed units visible to the requesting player.
    pub units: Vec<PlacedUnit>,
}

impl MatchState {
    /// Build a snapshot, hiding other players' picks while the match is in preparation.
    pub fn new(game: Match, player: Option<PlayerState>, units: Vec<PlacedUnit>) -> Self {
        let units = if game.status == GameStatus::Preparation {
            let owned: &[u64] = player.as_ref().map(|p| p.units.as_slice()).unwrap_or(&[]);
            units
                .into_iter()
                .filter(|unit| owned.contains(&unit.id))
                .collect()
        } else {
            units
        };

        Self {
            game: Arc::new(game),
            player,
            units,
        }
    }

    pub fn user_id(&self) -> Option<u64> {
        self.player.as_ref().map(|p| p.player_id)
    }

    pub fn is_host(&self) -> bool {
        self.user_id() == Some(self.game.host_id)
    }

    pub fn is_full(&self) -> bool {
        self.game.players.len() >= self.game.max_players as usize
    }

    pub fn all_ready(&self) -> bool {
        !self.game.players.is_empty() && self.game.players.iter().all(|p| p.is_ready)
    }

    pub fn in_preparation(&self) -> bool {
        self.game.status == GameStatus::Preparation
    }

    pub fn cash(&self) -> u32 {
        self.player.as_ref().map_or(0, |p| p.cash_remaining)
    }

    pub fn is_ready(&self) -> bool {
        self.player.as_ref().is_some_and(|p| p.is_ready)
    }

    /// 1-based seat number of the requesting player.
    pub fn seat(&self) -> Option<u8> {
        self.game.seat_of(self.user_id()?)
    }

    pub fn unit_at(&self, tile: Tile) -> Option<&PlacedUnit> {
        self.units.iter().find(|unit| unit.tile() == tile)
    }

    pub fn unit(&self, unit_instance_id: u64) -> Option<&PlacedUnit> {
        self.units.iter().find(|unit| unit.id == unit_instance_id)
    }

    /// Record a confirmed placement.
    pub fn apply_placed(&mut self, unit: PlacedUnit) {
        if let Some(player) = self.player.as_mut() {
            player.cash_remaining = player.cash_remaining.saturating_sub(unit.unit.cost);
            player.units.push(unit.id);
        }
        self.units.push(unit);
    }

    /// Record a confirmed removal, refunding the unit's cost.
    pub fn apply_removed(&mut self, unit_instance_id: u64) {
        let removed = self
            .units
            .iter()
            .position(|u| u.id == unit_instance_id)
            .map(|idx| self.units.remove(idx));
        if let Some(player) = self.player.as_mut() {
            if let Some(unit) = removed {
                player.cash_remaining = player.cash_remaining.saturating_add(unit.unit.cost);
            }
            player.units.retain(|id| *id != unit_instance_id);
        }
    }
}

/// Unit shown in the info panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveUnit {
    /// Follows the pointer.
    Hovered(u64),
    /// Pinned by a click; hovering does not replace it.
    Locked(u64),
}

impl ActiveUnit {
    pub fn id(self) -> u64 {
        match self {
            ActiveUnit::Hovered(id) | ActiveUnit::Locked(id) => id,
        }
    }
}

/// Local-only selection state for the match view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Tile highlighted as the placement target.
    pub tile: Option<Tile>,
    /// Unit under inspection.
    pub active_unit: Option<ActiveUnit>,
    /// Whether the unit purchase menu is open.
    pub purchase_menu: bool,
}

impl Selection {
    pub fn hover(&mut self, unit_instance_id: Option<u64>) {
        if matches!(self.active_unit, Some(ActiveUnit::Locked(_))) {
            return;
        }
        self.active_unit = unit_instance_id.map(ActiveUnit::Hovered);
    }

    /// Lock a unit into the info panel, or unlock it if it already is.
    pub fn toggle_lock(&mut self, unit_instance_id: u64) {
        self.active_unit = match self.active_unit {
            Some(ActiveUnit::Locked(id)) if id == unit_instance_id => None,
            _ => Some(ActiveUnit::Locked(unit_instance_id)),
        };
    }

    pub fn clear(&mut self) {
        *self = Selection::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::{placed, sample_match};

    #[test]
    fn test_preparation_hides_other_players_units() {
        let game = sample_match(GameStatus::Preparation, Some(3));
        let player = PlayerState {
            id: 10,
            player_id: 1,
            cash_remaining: 100,
            is_ready: false,
            units: vec![100],
        };
        let units = vec![placed(100, 1, 0, 0, 50), placed(200, 2, 1, 1, 50)];

        let state = MatchState::new(game.clone(), Some(player.clone()), units.clone());
        assert_eq!(state.units.len(), 1);
        assert_eq!(state.units[0].id, 100);

        let mut running = game;
        running.status = GameStatus::InProgress;
        let state = MatchState::new(running.clone(), Some(player), units.clone());
        assert_eq!(state.units.len(), 2);

        let spectator = MatchState::new(running, None, units);
        assert_eq!(spectator.units.len(), 2);
        assert!(!spectator.is_host());
        assert_eq!(spectator.seat(), None);
    }

    #[test]
    fn test_derived_flags() {
        let mut game = sample_match(GameStatus::Open, None);
        let player = PlayerState {
            id: 10,
            player_id: 1,
            ..PlayerState::default()
        };
        let state = MatchState::new(game.clone(), Some(player.clone()), Vec::new());
        assert!(state.is_host());
        assert!(state.is_full());
        assert!(!state.all_ready());
        assert_eq!(state.seat(), Some(1));

        for p in &mut game.players {
            p.is_ready = true;
        }
        game.max_players = 4;
        let state = MatchState::new(game, Some(player), Vec::new());
        assert!(!state.is_full());
        assert!(state.all_ready());
    }

    #[test]
    fn test_cash_mirror_follows_confirmed_changes() {
        let game = sample_match(GameStatus::Preparation, Some(3));
        let player = PlayerState {
            id: 10,
            player_id: 1,
            cash_remaining: 100,
            ..PlayerState::default()
        };
        let mut state = MatchState::new(game, Some(player), Vec::new());

        state.apply_placed(placed(5, 1, 0, 0, 75));
        assert_eq!(state.cash(), 25);
        assert_eq!(state.player.as_ref().unwrap().units, vec![5]);

        state.apply_removed(5);
        assert_eq!(state.cash(), 100);
        assert!(state.units.is_empty());
        assert!(state.player.as_ref().unwrap().units.is_empty());
    }

    #[test]
    fn test_refund_saturates_cash() {
        let game = sample_match(GameStatus::Preparation, Some(3));
        let player = PlayerState {
            id: 10,
            player_id: 1,
            cash_remaining: u32::MAX - 10,
            units: vec![5],
            ..PlayerState::default()
        };
        let mut state = MatchState::new(game, Some(player), vec![placed(5, 1, 0, 0, 75)]);

        state.apply_removed(5);
        assert_eq!(state.cash(), u32::MAX);
    }

    #[test]
    fn test_locked_unit_ignores_hover() {
        let mut selection = Selection::default();
        selection.hover(Some(1));
        assert_eq!(selection.active_unit, Some(ActiveUnit::Hovered(1)));

        selection.toggle_lock(2);
        selection.hover(Some(3));
        assert_eq!(selection.active_unit, Some(ActiveUnit::Locked(2)));

        selection.toggle_lock(2);
        assert_eq!(selection.active_unit, None);
    }
}
