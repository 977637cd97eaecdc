mod placement;
mod resources;

#[cfg(test)]
pub(crate) mod test_support;

pub use placement::*;
pub use resources::*;
