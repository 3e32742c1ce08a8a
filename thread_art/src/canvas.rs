use std::ops::Deref;

use image::GrayImage;
use num_traits::AsPrimitive;
use thiserror::Error;

use crate::{
    config::Background,
    geometry::{Coverage, Point},
    target::Target,
    Float, Grid,
};

/// Ink accumulated on the board, one value in `[0, 1]` per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas<S> {
    pixels: Vec<S>,
    grid: Grid,
}

/// A pixel a line would change: its buffer index and the value before and
/// after drawing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OverlayPixel<S> {
    pub index: usize,
    pub before: S,
    pub after: S,
}

/// Result of drawing one line over a canvas, restricted to the pixels inside
/// the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay<S>(Vec<OverlayPixel<S>>);

impl<S> Deref for Overlay<S> {
    type Target = [OverlayPixel<S>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Float> Canvas<S> {
    pub fn new(grid: Grid, background: Background) -> Self {
        Self {
            pixels: vec![background.value(); grid.len()],
            grid,
        }
    }

    /// Lazily computes `clip(current + strength * coverage)` for every pixel
    /// of `line` inside the grid. Every other operation goes through here.
    pub fn overlay<'a, L>(&'a self, line: L, strength: S) -> impl Iterator<Item = OverlayPixel<S>> + 'a
    where
        L: IntoIterator<Item = Coverage<S>>,
        L::IntoIter: 'a,
    {
        line.into_iter().filter_map(move |pixel| {
            let index = self.grid.index_of(pixel.point)?;
            let before = self.pixels[index];
            Some(OverlayPixel {
                index,
                before,
                after: (before + strength * pixel.coverage).max(S::ZERO).min(S::ONE),
            })
        })
    }

    /// Values the canvas would take if `line` were drawn, without drawing it.
    pub fn preview(&self, line: impl IntoIterator<Item = Coverage<S>>, strength: S) -> Overlay<S> {
        Overlay(self.overlay(line, strength).collect())
    }

    /// Draws `line` and returns what changed.
    ///
    /// All values are computed against the canvas as it was before the call,
    /// so a pixel listed twice keeps the last computed value.
    pub fn commit(&mut self, line: impl IntoIterator<Item = Coverage<S>>, strength: S) -> Overlay<S> {
        let overlay = self.preview(line, strength);
        for pixel in overlay.iter() {
            self.pixels[pixel.index] = pixel.after;
        }
        overlay
    }

    /// Reduction of the squared error against `target` that drawing `line`
    /// would bring, measured on the pixels the line touches.
    pub fn improvement(
        &self,
        line: impl IntoIterator<Item = Coverage<S>>,
        strength: S,
        target: &Target<S>,
    ) -> Result<S, Error> {
        self.check(target)?;
        Ok(self.improvement_unchecked(line, strength, target))
    }

    // Callers must have checked that `target` shares this canvas' grid.
    pub(crate) fn improvement_unchecked(
        &self,
        line: impl IntoIterator<Item = Coverage<S>>,
        strength: S,
        target: &Target<S>,
    ) -> S {
        let target = target.pixels();
        self.overlay(line, strength)
            .map(|pixel| {
                let expected = target[pixel.index];
                let before = pixel.before - expected;
                let after = pixel.after - expected;
                before * before - after * after
            })
            .sum()
    }

    /// Total squared error against `target`.
    pub fn squared_error(&self, target: &Target<S>) -> Result<S, Error> {
        self.check(target)?;
        Ok(self
            .pixels
            .iter()
            .zip(target.pixels())
            .map(|(&value, &expected)| (value - expected) * (value - expected))
            .sum())
    }

    fn check(&self, target: &Target<S>) -> Result<(), Error> {
        if target.grid() == self.grid {
            Ok(())
        } else {
            Err(Error::Mismatch {
                canvas: self.grid,
                target: target.grid(),
            })
        }
    }

    pub fn get(&self, point: Point<isize>) -> Option<S> {
        self.grid.index_of(point).map(|index| self.pixels[index])
    }

    pub fn pixels(&self) -> &[S] {
        &self.pixels
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// 8-bit grayscale rendering, 0 black and 255 white.
    pub fn to_luma(&self) -> Result<GrayImage, Error>
    where
        S: AsPrimitive<u8>,
    {
        let too_large = || Error::TooLarge(self.grid);
        let width = u32::try_from(self.grid.width).map_err(|_| too_large())?;
        let height = u32::try_from(self.grid.height).map_err(|_| too_large())?;
        let buffer = self
            .pixels
            .iter()
            .map(|&value| (value * S::TWO_FIVE_FIVE).round().as_())
            .collect();
        GrayImage::from_raw(width, height, buffer).ok_or_else(too_large)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Canvas is {canvas:?} but the target is {target:?}")]
    Mismatch { canvas: Grid, target: Grid },
    #[error("Canvas {0:?} does not fit in an image")]
    TooLarge(Grid),
}
