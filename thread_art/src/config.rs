use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Float, Grid};

/// Colour of the empty board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    Black,
    #[default]
    White,
}

impl Background {
    pub fn value<S: Float>(self) -> S {
        match self {
            Background::Black => S::ZERO,
            Background::White => S::ONE,
        }
    }
}

/// Parameters of a run. Defaults draw dark thread on a white 400 px board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "S: Float + Deserialize<'de>"))]
pub struct Config<S> {
    /// Maximum number of accepted pulls.
    pub pull_budget: usize,
    /// Keep one perimeter pixel out of `nail_step` as a peg.
    pub nail_step: usize,
    /// Side of the square the target is resized to.
    pub side_len: usize,
    /// Ink added per unit of coverage. Negative darkens, positive lightens.
    pub line_strength: S,
    pub background: Background,
    /// Radius multiplier along the rows axis.
    pub r1_multiplier: S,
    /// Radius multiplier along the columns axis.
    pub r2_multiplier: S,
    /// Factor applied to the grayscale target before the search.
    pub dampening: S,
    /// Lets the current peg compete as a zero-length pull.
    pub allow_self_pull: bool,
    /// Ring distance, in pegs, below which a pull is not considered.
    pub min_peg_distance: usize,
}

impl<S: Float> Default for Config<S> {
    fn default() -> Self {
        Self {
            pull_budget: 4000,
            nail_step: 4,
            side_len: 400,
            line_strength: -S::TENTH,
            background: Background::White,
            r1_multiplier: S::ONE,
            r2_multiplier: S::ONE,
            dampening: S::NINE_TENTHS,
            allow_self_pull: false,
            min_peg_distance: 0,
        }
    }
}

impl<S: Float> Config<S> {
    pub fn validate(&self) -> Result<(), Error> {
        if self.pull_budget == 0 {
            return Err(Error::PullBudget);
        }
        if self.nail_step == 0 {
            return Err(Error::NailStep);
        }
        if self.side_len == 0 {
            return Err(Error::SideLen);
        }
        if !self.line_strength.is_finite() || self.line_strength == S::ZERO {
            return Err(Error::LineStrength(self.line_strength.to_string()));
        }
        for multiplier in [self.r1_multiplier, self.r2_multiplier] {
            if !multiplier.is_finite() || multiplier <= S::ZERO {
                return Err(Error::RadiusMultiplier(multiplier.to_string()));
            }
        }
        if !(self.dampening > S::ZERO && self.dampening <= S::ONE) {
            return Err(Error::Dampening(self.dampening.to_string()));
        }
        Ok(())
    }

    /// Checks that a target of shape `grid` fits this configuration.
    pub fn validate_target(&self, grid: Grid) -> Result<(), Error> {
        if grid != Grid::square(self.side_len) {
            Err(Error::TargetShape {
                side_len: self.side_len,
                height: grid.height,
                width: grid.width,
            })
        } else {
            Ok(())
        }
    }
}

impl<S> Config<S> {
    /// Converts the scalar fields, e.g. from a parsed `f64` file to `f32`.
    pub fn map<T>(self, f: impl Fn(S) -> T) -> Config<T> {
        Config {
            pull_budget: self.pull_budget,
            nail_step: self.nail_step,
            side_len: self.side_len,
            line_strength: f(self.line_strength),
            background: self.background,
            r1_multiplier: f(self.r1_multiplier),
            r2_multiplier: f(self.r2_multiplier),
            dampening: f(self.dampening),
            allow_self_pull: self.allow_self_pull,
            min_peg_distance: self.min_peg_distance,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Pull budget must be greater than zero")]
    PullBudget,
    #[error("Nail step must be greater than zero")]
    NailStep,
    #[error("Board side length must be greater than zero")]
    SideLen,
    #[error("Line strength must be a non-zero finite number, got {0}")]
    LineStrength(String),
    #[error("Radius multipliers must be positive finite numbers, got {0}")]
    RadiusMultiplier(String),
    #[error("Dampening must lie in (0, 1], got {0}")]
    Dampening(String),
    #[error("Target must be {side_len}x{side_len} pixels, got {height}x{width}")]
    TargetShape {
        side_len: usize,
        height: usize,
        width: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::<f32>::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pull_budget, 4000);
        assert_eq!(config.nail_step, 4);
        assert_eq!(config.side_len, 400);
        assert_eq!(config.line_strength, -0.1);
        assert_eq!(config.background, Background::White);
    }

    #[test]
    fn invalid_fields_are_reported() {
        let base = Config::<f64>::default();
        let cases = [
            Config {
                pull_budget: 0,
                ..base.clone()
            },
            Config {
                nail_step: 0,
                ..base.clone()
            },
            Config {
                side_len: 0,
                ..base.clone()
            },
            Config {
                line_strength: 0.0,
                ..base.clone()
            },
            Config {
                r1_multiplier: -1.0,
                ..base.clone()
            },
            Config {
                r2_multiplier: f64::INFINITY,
                ..base.clone()
            },
            Config {
                dampening: 1.5,
                ..base.clone()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn target_must_match_side_len() {
        let config = Config::<f64> {
            side_len: 10,
            ..Default::default()
        };
        assert!(config.validate_target(Grid::square(10)).is_ok());
        assert!(matches!(
            config.validate_target(Grid::new(10, 12)),
            Err(Error::TargetShape { .. })
        ));
    }

    #[test]
    fn map_converts_scalars() {
        let config = Config::<f64>::default().map(|value| value as f32);
        assert_eq!(config.dampening, 0.9f32);
        assert_eq!(config.r1_multiplier, 1.0f32);
    }

    #[test]
    fn background_values() {
        assert_eq!(Background::Black.value::<f64>(), 0.0);
        assert_eq!(Background::White.value::<f32>(), 1.0);
    }
}
