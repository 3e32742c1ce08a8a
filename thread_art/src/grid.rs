use serde::{Deserialize, Serialize};

use crate::geometry::Point;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T = usize> {
    pub height: T,
    pub width: T,
}

impl<T> Grid<T> {
    pub fn new(height: T, width: T) -> Self {
        Self { height, width }
    }
}

impl Grid {
    pub fn square(side: usize) -> Self {
        Self::new(side, side)
    }

    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Integer midpoint of the grid.
    pub fn center(&self) -> Point<isize> {
        Point {
            x: (self.width / 2) as isize,
            y: (self.height / 2) as isize,
        }
    }

    /// Buffer index of `point`, or `None` when it falls outside the grid.
    pub fn index_of(&self, point: Point<isize>) -> Option<usize> {
        let x = usize::try_from(point.x).ok()?;
        let y = usize::try_from(point.y).ok()?;
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    pub fn contains(&self, point: Point<isize>) -> bool {
        self.index_of(point).is_some()
    }
}
