use std::ops::Sub;

use num_traits::AsPrimitive;

use crate::Float;

/// A position on the board. `x` is the column and `y` the row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> Sub for Point<T>
where
    T: Sub<Output = T>,
{
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Point {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl<T: Float> Point<T> {
    pub fn distance(&self, other: &Self) -> T {
        let delta = *self - *other;
        delta.x.hypot(delta.y)
    }

    /// Bearing of `self` seen from `origin`, in `(-PI, PI]`.
    pub fn bearing(&self, origin: &Self) -> T {
        let delta = *self - *origin;
        delta.y.atan2(delta.x)
    }
}

impl<S> Point<S> {
    pub fn as_<I: Copy + 'static>(self) -> Point<I>
    where
        S: AsPrimitive<I>,
    {
        Point {
            x: self.x.as_(),
            y: self.y.as_(),
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Point<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:2}, {:2})", self.x, self.y)
    }
}
