//! Compute module - Rendering, fitness and genetic operators.

mod entity;
mod evolution;
mod fitness;
mod population;
mod raster;
mod reproduce;
mod workers;

pub use entity::*;
pub use evolution::*;
pub use fitness::*;
pub use population::*;
pub use raster::*;
pub use reproduce::*;
pub use workers::*;
