mod api;
mod client;
mod socket;
mod state_sync;

pub use api::*;
pub use client::*;
pub use socket::*;
pub use state_sync::*;
