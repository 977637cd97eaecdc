//! Match state synchronization.
//!
//! A `MatchSync` fetches one match on mount, subscribes to the match's
//! WebSocket feed, and re-runs the full fetch whenever a recognized
//! notification arrives. Each refresh replaces the whole snapshot.
//!
//! Refresh cycles are not sequenced. If two overlap, whichever finishes
//! last is what the view shows.

use crate::errors::ApiError;
use crate::game::{MatchState, PlacementController, Rejection};
use crate::networking::{game_socket_path, Api, SocketFeed};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tactics_types::{Notification, PlayerState, UnitSummary};

/// Fetch-on-mount plus notification-driven refresh for one match.
pub struct MatchSync {
    api: Api,
    /// Match id or link, as used to open the view.
    key: String,
    state: Option<MatchState>,
    error: Option<String>,
    notify_tx: Sender<Notification>,
    notify_rx: Receiver<Notification>,
    feed: Option<SocketFeed>,
    /// Link the feed was opened for, whether or not the connection succeeded.
    subscribed_link: Option<String>,
    refreshes: u64,
}

impl MatchSync {
    /// Fetch the match and open its feed.
    pub async fn mount(api: Api, key: impl Into<String>) -> Self {
        let (notify_tx, notify_rx) = unbounded();
        let mut sync = Self {
            api,
            key: key.into(),
            state: None,
            error: None,
            notify_tx,
            notify_rx,
            feed: None,
            subscribed_link: None,
            refreshes: 0,
        };

        if sync.refresh().await.is_ok() {
            sync.ensure_subscription().await;
        }
        sync
    }

    pub fn state(&self) -> Option<&MatchState> {
        self.state.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of refresh cycles started, including the one on mount.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    pub fn is_subscribed(&self) -> bool {
        self.feed.as_ref().is_some_and(|feed| feed.is_live())
    }

    pub fn is_host(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.is_host())
    }

    pub fn is_full(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.is_full())
    }

    pub fn all_ready(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.all_ready())
    }

    /// Run the full fetch sequence and replace the snapshot.
    ///
    /// On failure the previous snapshot stays and the error is recorded.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        self.refreshes += 1;
        match self.fetch().await {
            Ok(state) => {
                tracing::info!(
                    "match {}: refreshed ({:?}, {} players, {} units)",
                    state.game.link,
                    state.game.status,
                    state.game.players.len(),
                    state.units.len()
                );
                self.state = Some(state);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("match {}: refresh failed: {}", self.key, e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<MatchState, ApiError> {
        let game = self.api.game(&self.key).await?;
        let player = match self.api.player_state(&game.link).await {
            Ok(player) => Some(player),
            // Not seated in this match: view as a spectator.
            Err(ApiError::Status(403 | 404)) => None,
            Err(e) => return Err(e),
        };
        let units = self.api.units(&game.link).await?;
        Ok(MatchState::new(game, player, units))
    }

    /// Open the feed for the current link, closing any feed for an older link.
    ///
    /// A failed connection is not retried.
    pub async fn ensure_subscription(&mut self) {
        let Some(link) = self.state.as_ref().map(|s| s.game.link.clone()) else {
            return;
        };
        if self.subscribed_link.as_deref() == Some(link.as_str()) {
            return;
        }

        self.feed = None;
        match SocketFeed::open_match(self.api.http(), &game_socket_path(&link), self.notify_tx.clone()).await {
            Ok(feed) => self.feed = Some(feed),
            Err(e) => tracing::warn!("match {}: live updates unavailable: {}", link, e),
        }
        self.subscribed_link = Some(link);
    }

    /// Drain pending notifications; if there were any, refresh once.
    ///
    /// Returns whether a refresh ran.
    pub async fn pump(&mut self) -> bool {
        let mut pending = Vec::new();
        while let Ok(notification) = self.notify_rx.try_recv() {
            pending.push(notification);
        }
        if pending.is_empty() {
            return false;
        }

        tracing::debug!("match {}: notifications {:?}", self.key, pending);
        if self.refresh().await.is_ok() {
            self.ensure_subscription().await;
        }
        true
    }

    /// Buy `unit` for the controller's selected tile.
    ///
    /// Local checks run first; the snapshot only changes after the backend accepts.
    pub async fn place_unit(
        &mut self,
        controller: &mut PlacementController,
        unit: &UnitSummary,
    ) -> Result<(), Rejection> {
        let Some(state) = self.state.as_ref() else {
            return Err(Rejection::NotLoaded);
        };
        let request = controller.begin_purchase(state, unit)?;
        let link = state.game.link.clone();

        match self.api.place_unit(&link, &request).await {
            Ok(placed) => {
                tracing::info!("match {}: placed {} at ({}, {})", link, unit.name, placed.x, placed.y);
                if let Some(state) = self.state.as_mut() {
                    state.apply_placed(placed);
                }
                controller.finish_purchase();
                Ok(())
            }
            Err(e) => Err(self.reject(controller, &link, e)),
        }
    }

    /// Remove one of the player's placed units.
    pub async fn remove_unit(
        &mut self,
        controller: &mut PlacementController,
        unit_instance_id: u64,
    ) -> Result<(), Rejection> {
        let Some(state) = self.state.as_ref() else {
            return Err(Rejection::NotLoaded);
        };
        let link = state.game.link.clone();

        match self.api.remove_unit(&link, unit_instance_id).await {
            Ok(()) => {
                if let Some(state) = self.state.as_mut() {
                    state.apply_removed(unit_instance_id);
                }
                if controller.selection.active_unit.map(|a| a.id()) == Some(unit_instance_id) {
                    controller.selection.active_unit = None;
                }
                Ok(())
            }
            Err(e) => Err(self.reject(controller, &link, e)),
        }
    }

    /// Toggle the player's readiness.
    pub async fn toggle_ready(&mut self, controller: &mut PlacementController) -> Result<PlayerState, Rejection> {
        let Some(state) = self.state.as_ref() else {
            return Err(Rejection::NotLoaded);
        };
        let link = state.game.link.clone();

        match self.api.toggle_ready(&link).await {
            Ok(player) => {
                if let Some(state) = self.state.as_mut() {
                    state.player = Some(player.clone());
                }
                Ok(player)
            }
            Err(e) => Err(self.reject(controller, &link, e)),
        }
    }

    fn reject(&self, controller: &mut PlacementController, link: &str, e: ApiError) -> Rejection {
        tracing::warn!("match {}: request rejected: {}", link, e);
        let rejection = Rejection::Backend(e);
        controller.toasts.show(rejection.to_string());
        rejection
    }
}
