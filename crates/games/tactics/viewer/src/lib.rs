//! Headless match-viewer client for the tactics backend.
//!
//! Covers the lobby, the preparation phase (unit placement), live match
//! synchronization over REST + WebSocket, and software rendering of tile
//! maps and animated unit sprites.

pub mod assets;
pub mod config;
pub mod errors;
pub mod game;
pub mod networking;
pub mod rendering;
pub mod ui;
