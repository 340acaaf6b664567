mod physics;
mod scale;
mod types;
mod world;

pub use physics::*;
pub use scale::*;
pub use types::*;
pub use world::*;
