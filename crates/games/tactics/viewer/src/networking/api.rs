//! Typed backend endpoints.

use crate::assets::AssetFetcher;
use crate::errors::{ApiError, AssetError};
use crate::networking::client::HttpClient;
use tactics_types::{
    CreateGameRequest, GameListing, LinkRef, LoginRequest, MapSummary, Match, MoveInfo,
    PlaceUnitRequest, PlacedUnit, PlayerState, RegisterRequest, UnitSummary, User,
};

/// Endpoint path for a match's WebSocket feed.
pub fn game_socket_path(link: &str) -> String {
    format!("/api/ws/game/{}", link)
}

/// Endpoint path for the global WebSocket feed.
pub const GLOBAL_SOCKET_PATH: &str = "/api/ws/global";

/// The backend REST surface.
#[derive(Clone)]
pub struct Api {
    http: HttpClient,
}

impl Api {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    // Session

    pub async fn me(&self) -> Result<User, ApiError> {
        self.http.get("/api/me").await.json()
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<(), ApiError> {
        self.http.post("/api/login", Some(request)).await.ok()
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.http.post("/api/register", Some(request)).await.ok()
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.http.post::<()>("/api/logout", None).await.ok()
    }

    // Lobby

    pub async fn official_maps(&self) -> Result<Vec<MapSummary>, ApiError> {
        self.http.get("/api/maps/official").await.json()
    }

    pub async fn create_game(&self, request: &CreateGameRequest) -> Result<LinkRef, ApiError> {
        self.http.post("/api/games/create", Some(request)).await.json()
    }

    pub async fn open_games(&self) -> Result<Vec<GameListing>, ApiError> {
        self.http.get("/api/games/open").await.json()
    }

    pub async fn completed_games(&self) -> Result<Vec<GameListing>, ApiError> {
        self.http.get("/api/games/completed").await.json()
    }

    pub async fn in_progress_games(&self) -> Result<Vec<GameListing>, ApiError> {
        self.http.get("/api/games/in-progress").await.json()
    }

    pub async fn join_game(&self, game_id: u64) -> Result<LinkRef, ApiError> {
        self.http
            .post::<()>(&format!("/api/games/join/{}", game_id), None)
            .await
            .json()
    }

    pub async fn start_game(&self, game_id: u64) -> Result<LinkRef, ApiError> {
        self.http
            .post::<()>(&format!("/api/games/start/{}", game_id), None)
            .await
            .json()
    }

    // Match

    /// Fetch match detail, rejecting structurally inconsistent maps.
    pub async fn game(&self, id_or_link: &str) -> Result<Match, ApiError> {
        let game: Match = self.http.get(&format!("/api/games/{}", id_or_link)).await.json()?;
        game.validate()?;
        Ok(game)
    }

    pub async fn player_state(&self, link: &str) -> Result<PlayerState, ApiError> {
        self.http
            .get(&format!("/api/games/{}/player", link))
            .await
            .json()
    }

    pub async fn units(&self, id_or_link: &str) -> Result<Vec<PlacedUnit>, ApiError> {
        self.http
            .get(&format!("/api/games/{}/units", id_or_link))
            .await
            .json()
    }

    pub async fn place_unit(&self, link: &str, request: &PlaceUnitRequest) -> Result<PlacedUnit, ApiError> {
        self.http
            .post(&format!("/api/games/{}/units/place", link), Some(request))
            .await
            .json()
    }

    pub async fn remove_unit(&self, link: &str, unit_instance_id: u64) -> Result<(), ApiError> {
        self.http
            .delete(&format!("/api/games/{}/units/remove/{}", link, unit_instance_id))
            .await
            .ok()
    }

    pub async fn toggle_ready(&self, link: &str) -> Result<PlayerState, ApiError> {
        self.http
            .post::<()>(&format!("/api/games/{}/player/ready", link), None)
            .await
            .json()
    }

    // Catalog

    pub async fn unit_summaries(&self) -> Result<Vec<UnitSummary>, ApiError> {
        self.http.get("/api/units/summary").await.json()
    }

    pub async fn moves(&self) -> Result<Vec<MoveInfo>, ApiError> {
        self.http.get("/api/moves/all").await.json()
    }
}

impl AssetFetcher for Api {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let response = self.http.get(&format!("/{}", path.trim_start_matches('/'))).await;
        if response.is_ok() {
            Ok(response.body)
        } else {
            Err(AssetError::NotFound(path.to_string()))
        }
    }
}
