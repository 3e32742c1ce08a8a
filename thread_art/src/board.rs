use std::cmp::Ordering;

use num_traits::{AsPrimitive, ToPrimitive};
use thiserror::Error;

use crate::{
    geometry::{ellipse_perimeter, Point},
    verboser::{Message, Verboser},
    Float, Grid,
};

/// Ordered ring of pegs on the board. Peg `0` is where the thread starts.
#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    pegs: Vec<Point<isize>>,
    grid: Grid,
}

impl Board {
    /// Places pegs on an ellipse inscribed in `grid`.
    ///
    /// The usable radius keeps a one pixel margin, `min(height, width) / 2 - 1`,
    /// and is scaled by `rows_multiplier` along y and `cols_multiplier` along x.
    /// A semi-axis longer than the grid diagonal is rejected.
    /// The rasterized perimeter is deduplicated, ordered by bearing from the
    /// grid centre and finally every `nail_step`-th pixel becomes a peg.
    pub fn ellipse<S: Float>(
        grid: Grid,
        nail_step: usize,
        rows_multiplier: S,
        cols_multiplier: S,
        verboser: &mut impl Verboser,
    ) -> Result<Self, Error>
    where
        usize: AsPrimitive<S>,
    {
        if nail_step == 0 {
            return Err(Error::NailStep);
        }
        let center = grid.center();
        let radius = (grid.height.min(grid.width) / 2).saturating_sub(1);
        let (height, width): (S, S) = (grid.height.as_(), grid.width.as_());
        let diagonal = height.hypot(width).ceil();
        let semi_axis = |multiplier: S| -> Result<isize, Error> {
            let axis = radius.as_() * multiplier;
            let axis = if multiplier > S::ZERO && axis <= diagonal {
                axis.trunc().to_isize()
            } else {
                None
            };
            axis.ok_or_else(|| Error::Multiplier(multiplier.to_f64().unwrap_or(f64::NAN)))
        };
        let rows = semi_axis(rows_multiplier)?;
        let cols = semi_axis(cols_multiplier)?;

        let mut perimeter = ellipse_perimeter(center, rows, cols);
        perimeter.sort_unstable();
        perimeter.dedup();
        perimeter.sort_by(|a, b| by_bearing(center, a, b));

        let pegs: Vec<_> = perimeter.into_iter().step_by(nail_step).collect();
        verboser.verbose(Message::PlacingPegs(pegs.len()));
        tracing::debug!(
            pegs = pegs.len(),
            rows,
            cols,
            nail_step,
            "placed pegs on ellipse"
        );
        if pegs.iter().any(|&peg| !grid.contains(peg)) {
            tracing::warn!("some pegs fall outside the board, their lines will be clipped");
        }
        Self::from_pegs(grid, pegs)
    }

    /// Uses `pegs` as they are, in the given order.
    pub fn from_pegs(grid: Grid, pegs: Vec<Point<isize>>) -> Result<Self, Error> {
        if pegs.len() < 2 {
            return Err(Error::TooFewPegs(pegs.len()));
        }
        for (idx, peg) in pegs.iter().enumerate() {
            if pegs[..idx].contains(peg) {
                return Err(Error::Duplicated(*peg));
            }
        }
        Ok(Self { pegs, grid })
    }

    pub fn pegs(&self) -> &[Point<isize>] {
        &self.pegs
    }

    pub fn len(&self) -> usize {
        self.pegs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pegs.is_empty()
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Peg positions mapped onto a board scaled by `ratio` along each axis.
    pub fn scaled<S: Float>(&self, ratio: Point<S>) -> Vec<Point<isize>>
    where
        isize: AsPrimitive<S>,
        S: AsPrimitive<isize>,
    {
        self.pegs
            .iter()
            .map(|peg| {
                Point {
                    x: peg.x.as_() * ratio.x,
                    y: peg.y.as_() * ratio.y,
                }
                .as_()
            })
            .collect()
    }
}

fn by_bearing(center: Point<isize>, a: &Point<isize>, b: &Point<isize>) -> Ordering {
    let center = center.as_::<f64>();
    a.as_::<f64>()
        .bearing(&center)
        .total_cmp(&b.as_::<f64>().bearing(&center))
        .then_with(|| (a.y, a.x).cmp(&(b.y, b.x)))
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Nail step must be greater than zero")]
    NailStep,
    #[error("Radius multiplier must be positive and keep the ellipse within the board diagonal, got {0}")]
    Multiplier(f64),
    #[error("At least 2 pegs are required, the layout produced {0}")]
    TooFewPegs(usize),
    #[error("Peg {0} appears more than once")]
    Duplicated(Point<isize>),
}
