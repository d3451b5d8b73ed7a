pub mod aoi;
pub mod band;
pub mod grid;
pub mod imagery;
pub mod sensor;
pub mod style;
pub mod tile;
pub mod time;
pub mod vector;

pub use aoi::*;
pub use band::*;
pub use grid::*;
pub use imagery::*;
pub use sensor::*;
pub use style::*;
pub use tile::*;
pub use time::*;
pub use vector::*;
