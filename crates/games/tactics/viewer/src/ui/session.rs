//! Authenticated session.

use crate::errors::ApiError;
use crate::networking::{Api, SocketFeed, GLOBAL_SOCKET_PATH};
use tactics_types::{LoginRequest, RegisterRequest, User};

/// Application-level session state: the current user and the global feed.
///
/// Owned by the application root and dropped with it; nothing here is global.
pub struct Session {
    api: Api,
    user: Option<User>,
    global_feed: Option<SocketFeed>,
}

impl Session {
    pub fn new(api: Api) -> Self {
        Self {
            api,
            user: None,
            global_feed: None,
        }
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Restore the session from the cookie jar, if the backend still recognizes it.
    pub async fn restore(&mut self) -> Option<&User> {
        match self.api.me().await {
            Ok(user) => {
                tracing::info!("session restored for {}", user.username);
                self.user = Some(user);
                self.open_global_feed().await;
            }
            Err(e) => {
                tracing::debug!("no active session: {}", e);
                self.user = None;
            }
        }
        self.user.as_ref()
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<&User, ApiError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.api.login(&request).await?;
        let user = self.api.me().await?;
        tracing::info!("logged in as {}", user.username);
        self.user = Some(user);
        self.open_global_feed().await;
        self.user.as_ref().ok_or(ApiError::Status(401))
    }

    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> Result<(), ApiError> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.api.register(&request).await
    }

    /// Log out. Local state is cleared even if the backend call fails.
    pub async fn logout(&mut self) -> Result<(), ApiError> {
        let result = self.api.logout().await;
        self.user = None;
        self.global_feed = None;
        result
    }

    pub fn has_global_feed(&self) -> bool {
        self.global_feed.as_ref().is_some_and(|feed| feed.is_live())
    }

    async fn open_global_feed(&mut self) {
        if self.global_feed.is_some() {
            return;
        }
        match SocketFeed::open_global(self.api.http(), GLOBAL_SOCKET_PATH).await {
            Ok(feed) => self.global_feed = Some(feed),
            Err(e) => tracing::warn!("global feed unavailable: {}", e),
        }
    }
}
