mod lobby;
mod session;
mod toast;

pub use lobby::*;
pub use session::*;
pub use toast::*;

use std::fmt;

/// Client-side navigation target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    JoinGame,
    CreateGame,
    CompletedGames,
    Game(String),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::JoinGame => write!(f, "/games/join"),
            Route::CreateGame => write!(f, "/games/create"),
            Route::CompletedGames => write!(f, "/games/completed"),
            Route::Game(link) => write!(f, "/games/{}", link),
        }
    }
}
