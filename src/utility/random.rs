use rand::Rng;
use std::fmt;

use crate::error::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinSide {
    Heads,
    Tails,
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heads => write!(f, "Heads"),
            Self::Tails => write!(f, "Tails"),
        }
    }
}

pub fn flip_coin<R: Rng + ?Sized>(rng: &mut R) -> CoinSide {
    if rng.gen_bool(0.5) {
        CoinSide::Heads
    } else {
        CoinSide::Tails
    }
}

/// Inclusive range check used by `/number`.
pub fn validate_range(min: i64, max: i64) -> Result<(), CommandError> {
    if min > max {
        return Err(CommandError::validation(format!(
            "Invalid range! The first number ({}) must be less than or equal to the second ({}).",
            min, max
        )));
    }
    Ok(())
}

/// Returns `x` with `min <= x <= max`.
pub fn number_between<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> Result<i64, CommandError> {
    validate_range(min, max)?;
    Ok(rng.gen_range(min..=max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_number_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for (min, max) in [(1, 6), (-10, 10), (5, 5), (i64::MIN, i64::MAX), (0, 1)] {
            for _ in 0..200 {
                let x = number_between(&mut rng, min, max).unwrap();
                assert!(min <= x && x <= max, "{} not in [{}, {}]", x, min, max);
            }
        }
    }

    #[test]
    fn test_inverted_range_is_validation_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = number_between(&mut rng, 10, 1).unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
    }

    #[test]
    fn test_coin_lands_on_both_sides() {
        let mut rng = StdRng::seed_from_u64(3);
        let flips: Vec<_> = (0..100).map(|_| flip_coin(&mut rng)).collect();
        assert!(flips.contains(&CoinSide::Heads));
        assert!(flips.contains(&CoinSide::Tails));
    }
}
