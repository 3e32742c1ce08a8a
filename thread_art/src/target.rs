use image::{imageops::FilterType, DynamicImage, GenericImageView};
use num_traits::AsPrimitive;
use thiserror::Error;

use crate::{Float, Grid};

/// Grayscale picture the thread has to reproduce, values in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Target<S> {
    pixels: Vec<S>,
    grid: Grid,
}

impl<S: Float> Target<S> {
    /// Uses `pixels` in row-major order, clamping them into `[0, 1]`.
    pub fn from_pixels(grid: Grid, pixels: Vec<S>) -> Result<Self, Error> {
        if grid.is_empty() {
            return Err(Error::Empty);
        }
        if pixels.len() != grid.len() {
            return Err(Error::Length {
                expected: grid.len(),
                found: pixels.len(),
            });
        }
        Ok(Self {
            pixels: pixels
                .into_iter()
                .map(|value| value.max(S::ZERO).min(S::ONE))
                .collect(),
            grid,
        })
    }

    /// Crops the largest centred square of `image`, resizes it to
    /// `side_len` x `side_len`, converts it to luma and scales it by
    /// `dampening`.
    pub fn from_image(image: &DynamicImage, side_len: usize, dampening: S) -> Result<Self, Error>
    where
        f32: AsPrimitive<S>,
    {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 || side_len == 0 {
            return Err(Error::Empty);
        }
        let side = u32::try_from(side_len).map_err(|_| Error::TooLarge(side_len))?;
        let square = largest_square(image).resize_exact(side, side, FilterType::Triangle);
        let pixels = square
            .to_rgb32f()
            .pixels()
            .map(|pixel| {
                let [red, green, blue] = pixel.0.map(|channel| -> S { channel.as_() });
                let luma = S::LUMA_RED * red + S::LUMA_GREEN * green + S::LUMA_BLUE * blue;
                (luma * dampening).max(S::ZERO).min(S::ONE)
            })
            .collect();
        Ok(Self {
            pixels,
            grid: Grid::square(side_len),
        })
    }

    pub fn pixels(&self) -> &[S] {
        &self.pixels
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }
}

fn largest_square(image: &DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    let half = width.min(height) / 2;
    if half == 0 {
        return image.clone();
    }
    if height <= width {
        let center = width / 2;
        image.crop_imm(center - half, 0, 2 * half, height)
    } else {
        let center = height / 2;
        image.crop_imm(0, center - half, width, 2 * half)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("The target image is empty")]
    Empty,
    #[error("Expected {expected} pixels, found {found}")]
    Length { expected: usize, found: usize },
    #[error("Side length {0} is too large")]
    TooLarge(usize),
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    #[test]
    fn from_pixels_clamps_and_checks_length() {
        let grid = Grid::new(1, 3);
        let target = Target::from_pixels(grid, vec![-0.5f64, 0.25, 2.0]).unwrap();
        assert_eq!(target.pixels(), &[0.0, 0.25, 1.0]);
        assert!(matches!(
            Target::<f64>::from_pixels(grid, vec![0.0; 2]),
            Err(Error::Length {
                expected: 3,
                found: 2
            })
        ));
        assert!(matches!(
            Target::<f64>::from_pixels(Grid::new(0, 3), vec![]),
            Err(Error::Empty)
        ));
    }

    #[test]
    fn white_image_is_dampened() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));
        let target = Target::<f64>::from_image(&image, 4, 0.9).unwrap();
        assert_eq!(target.grid(), Grid::square(4));
        for &value in target.pixels() {
            assert!((value - 0.9 * 0.9999).abs() < 1e-6);
        }
    }

    #[test]
    fn luma_weights_channels() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 255, 0])));
        let target = Target::<f32>::from_image(&image, 2, 1.0).unwrap();
        for &value in target.pixels() {
            assert!((value - 0.5870).abs() < 1e-5);
        }
    }

    #[test]
    fn wide_image_keeps_its_centre() {
        // left and right thirds are black, the middle square is white
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(12, 4, |x, _| {
            if (4..8).contains(&x) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        }));
        let square = largest_square(&image);
        assert_eq!(square.dimensions(), (4, 4));
        let target = Target::<f64>::from_image(&image, 4, 1.0).unwrap();
        assert!(target.pixels().iter().all(|&value| value > 0.99));
    }

    #[test]
    fn tall_image_is_cropped_vertically() {
        // odd short edges lose a pixel, the resize squares them afterwards
        let image = DynamicImage::ImageRgb8(RgbImage::new(5, 9));
        assert_eq!(largest_square(&image).dimensions(), (5, 4));
        let target = Target::<f32>::from_image(&image, 3, 0.9).unwrap();
        assert_eq!(target.grid(), Grid::square(3));
    }
}
