use thiserror::Error;

/// Minimum separation, counted in pegs along the ring, between the two ends
/// of a pull.
#[derive(Clone, Copy, Debug)]
pub struct PegDistancer {
    count: usize,
    min: usize,
}

impl PegDistancer {
    pub fn new(count: usize, min: usize) -> Result<Self, Error> {
        if count < 2 * min {
            Err(Error(count / 2))
        } else {
            Ok(Self { count, min })
        }
    }

    //NOTE: This does not check if a_idx and b_idx are inside bounds.
    pub fn is_valid(&self, a_idx: usize, b_idx: usize) -> bool {
        let diff = a_idx.abs_diff(b_idx);
        diff.min(self.count - diff) >= self.min
    }
}

#[derive(Debug, Error)]
#[error("The minimum distance between pegs must not exceed {0}.")]
pub struct Error(usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_wraps_around_the_ring() {
        let distancer = PegDistancer::new(10, 3).unwrap();
        assert!(distancer.is_valid(0, 3));
        assert!(distancer.is_valid(0, 7));
        assert!(!distancer.is_valid(0, 8));
        assert!(!distancer.is_valid(9, 1));
        assert!(!distancer.is_valid(4, 4));
    }

    #[test]
    fn zero_minimum_accepts_everything() {
        let distancer = PegDistancer::new(5, 0).unwrap();
        assert!((0..5).all(|a| (0..5).all(|b| distancer.is_valid(a, b))));
    }

    #[test]
    fn minimum_larger_than_half_ring_is_rejected() {
        assert!(PegDistancer::new(10, 5).is_ok());
        assert!(PegDistancer::new(10, 6).is_err());
    }
}
