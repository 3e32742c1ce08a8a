pub mod geometry {
    pub mod ellipse;
    pub mod line;
    pub mod point;

    pub use ellipse::ellipse_perimeter;
    pub use line::{Coverage, LineAa};
    pub use point::Point;
}

mod algorithm;
pub mod board;
pub mod canvas;
pub mod config;
mod float;
pub mod grid;
mod peg_distancer;
pub mod target;
pub mod verboser;

pub use algorithm::*;
pub use board::Board;
pub use canvas::Canvas;
pub use config::{Background, Config};
pub use float::Float;
pub use grid::Grid;
pub use target::Target;
