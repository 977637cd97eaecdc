//! Lobby: listings, filters, game creation and join/start/spectate actions.

use crate::errors::ApiError;
use crate::networking::Api;
use crate::ui::Route;
use std::fmt;
use tactics_types::{CreateGameRequest, GameListing, GameMode, MapSummary};

/// Games shown per page in the open-games list.
pub const PAGE_SIZE: usize = 10;

/// Completed games shown (newest first).
pub const COMPLETED_SHOWN: usize = 10;

/// Player-count bounds offered when creating a game.
pub const MIN_PLAYERS: u8 = 2;
pub const MAX_PLAYERS: u8 = 8;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PlayerFilter {
    #[default]
    All,
    Exactly(u8),
}

/// Listing filter: capacity and map name, either of which may be "All".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LobbyFilter {
    pub players: PlayerFilter,
    /// Case-insensitive exact map name; `None` matches all maps.
    pub map: Option<String>,
}

impl LobbyFilter {
    pub fn matches(&self, game: &GameListing) -> bool {
        let players_match = match self.players {
            PlayerFilter::All => true,
            PlayerFilter::Exactly(n) => game.max_players == n,
        };
        let map_match = match &self.map {
            None => true,
            Some(map) => game.map_name.to_lowercase() == map.to_lowercase(),
        };
        players_match && map_match
    }

    /// Matching games, newest first.
    pub fn apply<'a>(&self, games: &'a [GameListing]) -> Vec<&'a GameListing> {
        let mut filtered: Vec<&GameListing> = games.iter().filter(|g| self.matches(g)).collect();
        // ISO-8601 timestamps order lexicographically.
        filtered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        filtered
    }
}

pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE)
}

/// Items on a 1-based page; out-of-range pages are empty.
pub fn page<T>(items: &[T], page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

/// Whether the user already holds a seat (joining is disabled then).
pub fn is_user_in_game(game: &GameListing, user_id: Option<u64>) -> bool {
    match user_id {
        Some(id) => game.players.iter().any(|p| p.id == id),
        None => false,
    }
}

/// Create-game form input that failed local checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    EmptyName,
    NoMapSelected,
    PlayerCount(u8),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::EmptyName => write!(f, "game name is required"),
            FormError::NoMapSelected => write!(f, "no map selected"),
            FormError::PlayerCount(n) => write!(
                f,
                "player count {} outside {}..={}",
                n, MIN_PLAYERS, MAX_PLAYERS
            ),
        }
    }
}

impl std::error::Error for FormError {}

/// Create-game form state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateGameForm {
    pub game_name: String,
    pub map_name: String,
    pub gamemode: GameMode,
    pub max_players: u8,
    pub is_private: bool,
    pub starting_cash: Option<u32>,
    pub cash_per_turn: Option<u32>,
    pub max_turns: Option<u32>,
    pub unit_limit: Option<u32>,
    pub turn_time_limit: Option<u32>,
}

impl Default for CreateGameForm {
    fn default() -> Self {
        Self {
            game_name: String::new(),
            map_name: String::new(),
            gamemode: GameMode::Conquest,
            max_players: MIN_PLAYERS,
            is_private: false,
            starting_cash: None,
            cash_per_turn: None,
            max_turns: None,
            unit_limit: None,
            turn_time_limit: None,
        }
    }
}

impl CreateGameForm {
    /// Select a map; a mode the map does not allow snaps to its first allowed mode.
    pub fn select_map(&mut self, map: &MapSummary) {
        self.map_name = map.name.clone();
        if !map.allowed_modes.is_empty() && !map.allowed_modes.contains(&self.gamemode) {
            self.gamemode = map.allowed_modes[0];
        }
    }

    pub fn to_request(&self) -> Result<CreateGameRequest, FormError> {
        if self.game_name.trim().is_empty() {
            return Err(FormError::EmptyName);
        }
        if self.map_name.is_empty() {
            return Err(FormError::NoMapSelected);
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(FormError::PlayerCount(self.max_players));
        }

        Ok(CreateGameRequest {
            game_name: self.game_name.clone(),
            map_name: self.map_name.clone(),
            gamemode: self.gamemode,
            max_players: self.max_players,
            is_private: self.is_private,
            starting_cash: self.starting_cash,
            cash_per_turn: self.cash_per_turn,
            max_turns: self.max_turns,
            unit_limit: self.unit_limit,
            turn_time_limit: self.turn_time_limit,
        })
    }
}

/// One page of open games.
#[derive(Clone, Debug)]
pub struct LobbyPage {
    pub games: Vec<GameListing>,
    pub page: usize,
    pub total_pages: usize,
}

/// Lobby actions against the backend.
#[derive(Clone)]
pub struct Lobby {
    api: Api,
}

impl Lobby {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    pub async fn open_games(&self, filter: &LobbyFilter, page_number: usize) -> Result<LobbyPage, ApiError> {
        let games = self.api.open_games().await?;
        let filtered = filter.apply(&games);
        Ok(LobbyPage {
            games: page(&filtered, page_number).iter().map(|g| (*g).clone()).collect(),
            page: page_number,
            total_pages: page_count(filtered.len()),
        })
    }

    pub async fn completed_games(&self, filter: &LobbyFilter) -> Result<Vec<GameListing>, ApiError> {
        let games = self.api.completed_games().await?;
        Ok(filter
            .apply(&games)
            .into_iter()
            .take(COMPLETED_SHOWN)
            .cloned()
            .collect())
    }

    pub async fn in_progress_games(&self, filter: &LobbyFilter) -> Result<Vec<GameListing>, ApiError> {
        let games = self.api.in_progress_games().await?;
        Ok(filter.apply(&games).into_iter().cloned().collect())
    }

    pub async fn create(&self, request: &CreateGameRequest) -> Result<Route, ApiError> {
        match self.api.create_game(request).await {
            Ok(created) => {
                tracing::info!("created game {:?} -> {}", request.game_name, created.link);
                Ok(Route::Game(created.link))
            }
            Err(e) => {
                tracing::error!("failed to create game: {}", e);
                Err(e)
            }
        }
    }

    pub async fn join(&self, game_id: u64) -> Result<Route, ApiError> {
        match self.api.join_game(game_id).await {
            Ok(joined) => Ok(Route::Game(joined.link)),
            Err(e) => {
                tracing::warn!("failed to join game {}: {}", game_id, e);
                Err(e)
            }
        }
    }

    pub async fn start(&self, game_id: u64) -> Result<Route, ApiError> {
        match self.api.start_game(game_id).await {
            Ok(started) => Ok(Route::Game(started.link)),
            Err(e) => {
                tracing::warn!("failed to start game {}: {}", game_id, e);
                Err(e)
            }
        }
    }

    /// Spectating needs no backend call.
    pub fn spectate(&self, game: &GameListing) -> Route {
        Route::Game(game.link.clone())
    }
}
