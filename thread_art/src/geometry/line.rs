use std::iter::FusedIterator;

use num_traits::AsPrimitive;

use super::Point;
use crate::Float;

/// A pixel touched by a line together with the share of it the line covers.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Coverage<S> {
    pub point: Point<isize>,
    pub coverage: S,
}

/// Anti-aliased line between two pixel centres.
///
/// Walks the line with Zingl's error-driven variant of Wu's algorithm: every
/// step yields the pixel on the ideal line plus, when it is close enough, the
/// neighbour across the line. Coverage is `1 - distance / length`, so the
/// output lies in `(0, 1]` and zero-coverage pixels are skipped.
///
/// The walk is unbounded; coordinates may fall outside any image and it is up
/// to the consumer to drop them. The iterator is a pure function of its
/// endpoints, so cloning it restarts the same footprint.
#[derive(Clone, Debug)]
pub struct LineAa<S> {
    point: Point<isize>,
    end: Point<isize>,
    step: Point<isize>,
    delta: Point<isize>,
    err: isize,
    length: S,
    pending: [Coverage<S>; 3],
    pending_len: usize,
    cursor: usize,
    finished: bool,
}

impl<S: Float> LineAa<S>
where
    isize: AsPrimitive<S>,
{
    pub fn new(start: Point<isize>, end: Point<isize>) -> Self {
        let delta = Point {
            x: start.x.abs_diff(end.x) as isize,
            y: start.y.abs_diff(end.y) as isize,
        };
        let length = if delta.x + delta.y == 0 {
            S::ONE
        } else {
            delta.x.as_().hypot(delta.y.as_())
        };
        Self {
            point: start,
            end,
            step: Point {
                x: if start.x < end.x { 1 } else { -1 },
                y: if start.y < end.y { 1 } else { -1 },
            },
            err: delta.x - delta.y,
            delta,
            length,
            pending: [Coverage::default(); 3],
            pending_len: 0,
            cursor: 0,
            finished: false,
        }
    }

    pub fn start(&self) -> Point<isize> {
        self.point
    }

    pub fn end(&self) -> Point<isize> {
        self.end
    }

    fn push(&mut self, point: Point<isize>, distance: isize) {
        self.pending[self.pending_len] = Coverage {
            point,
            coverage: S::ONE - distance.abs().as_() / self.length,
        };
        self.pending_len += 1;
    }

    fn walk(&mut self) {
        self.pending_len = 0;
        self.cursor = 0;

        let Point { x: dc, y: dr } = self.delta;
        let current = self.point;
        let err = self.err;

        self.push(current, err - dc + dr);

        if 2 * err >= -dc {
            if current.x == self.end.x {
                self.finished = true;
                return;
            }
            if (err + dr).as_() < self.length {
                self.push(
                    Point {
                        x: current.x,
                        y: current.y + self.step.y,
                    },
                    err + dr,
                );
            }
            self.err -= dr;
            self.point.x += self.step.x;
        }

        if 2 * err <= dr {
            if current.y == self.end.y {
                self.finished = true;
                return;
            }
            if (dc - err).as_() < self.length {
                self.push(
                    Point {
                        x: current.x + self.step.x,
                        y: current.y,
                    },
                    dc - err,
                );
            }
            self.err += dc;
            self.point.y += self.step.y;
        }
    }
}

impl<S: Float> Iterator for LineAa<S>
where
    isize: AsPrimitive<S>,
{
    type Item = Coverage<S>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cursor < self.pending_len {
                let pixel = self.pending[self.cursor];
                self.cursor += 1;
                if pixel.coverage > S::ZERO {
                    return Some(pixel);
                }
            } else if self.finished {
                return None;
            } else {
                self.walk();
            }
        }
    }
}

impl<S: Float> FusedIterator for LineAa<S> where isize: AsPrimitive<S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn footprint(start: (isize, isize), end: (isize, isize)) -> Vec<Coverage<f64>> {
        LineAa::new(Point::new(start.0, start.1), Point::new(end.0, end.1)).collect()
    }

    #[test]
    fn equal_endpoints_give_single_full_pixel() {
        let line = footprint((3, 7), (3, 7));
        assert_eq!(
            line,
            vec![Coverage {
                point: Point::new(3, 7),
                coverage: 1.0
            }]
        );
    }

    #[test]
    fn axis_aligned_lines_are_fully_covered() {
        let horizontal = footprint((0, 2), (4, 2));
        assert_eq!(horizontal.len(), 5);
        assert!(horizontal.iter().all(|pixel| pixel.coverage == 1.0));
        assert!(horizontal.iter().all(|pixel| pixel.point.y == 2));

        let vertical = footprint((1, 5), (1, 0));
        assert_eq!(vertical.len(), 6);
        assert!(vertical.iter().all(|pixel| pixel.coverage == 1.0));
        assert_eq!(vertical.last().map(|pixel| pixel.point), Some(Point::new(1, 0)));
    }

    #[test]
    fn diagonal_has_full_core_and_shared_neighbours() {
        let line = footprint((0, 0), (9, 9));
        let side = 1.0 - std::f64::consts::FRAC_1_SQRT_2;
        assert_eq!(line.len(), 28);
        for pixel in line.iter() {
            if pixel.point.x == pixel.point.y {
                assert_eq!(pixel.coverage, 1.0);
            } else {
                assert_eq!(pixel.point.x.abs_diff(pixel.point.y), 1);
                assert!((pixel.coverage - side).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn clone_restarts_the_same_footprint() {
        let mut line = LineAa::<f32>::new(Point::new(2, 40), Point::new(33, 3));
        let copy = line.clone();
        let _ = line.next();
        let first: Vec<_> = copy.clone().collect();
        let second: Vec<_> = copy.collect();
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn coverage_stays_in_unit_range(
            x0 in -50isize..50, y0 in -50isize..50,
            x1 in -50isize..50, y1 in -50isize..50,
        ) {
            let line = footprint((x0, y0), (x1, y1));
            prop_assert!(!line.is_empty());
            for pixel in line.iter() {
                prop_assert!(pixel.coverage > 0.0 && pixel.coverage <= 1.0);
            }
            prop_assert_eq!(line[0].point, Point::new(x0, y0));
            prop_assert!(line.iter().any(|pixel| pixel.point == Point::new(x1, y1)));
        }

        #[test]
        fn pixels_stay_near_the_segment(
            x0 in 0isize..40, y0 in 0isize..40,
            x1 in 0isize..40, y1 in 0isize..40,
        ) {
            for pixel in footprint((x0, y0), (x1, y1)) {
                prop_assert!(pixel.point.x >= x0.min(x1) - 1 && pixel.point.x <= x0.max(x1) + 1);
                prop_assert!(pixel.point.y >= y0.min(y1) - 1 && pixel.point.y <= y0.max(y1) + 1);
            }
        }
    }
}
