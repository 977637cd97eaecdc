//! Rendering onto explicit canvas handles.

mod canvas;
mod overlays;
mod sprite;
mod tilemap;

pub use canvas::*;
pub use overlays::*;
pub use sprite::*;
pub use tilemap::*;
