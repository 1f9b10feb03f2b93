//! Seeded train/test partition and contiguous k-fold indices.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};

/// Positions of the train and test rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Training positions, in shuffle order.
    pub train: Vec<usize>,
    /// Test positions, in shuffle order.
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded ChaCha8 stream and hold out the first
/// ⌈fraction·n⌉ positions for testing.
///
/// The same `n`, `fraction` and `seed` always give the same partition, on
/// every platform.
///
/// # Errors
/// `InsufficientData` if either partition would be empty.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<Split> {
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(Error::insufficient_data(format!(
            "{n} rows cannot be split into non-empty train and test partitions"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let train = order.split_off(n_test);
    Ok(Split { train, test: order })
}

/// Contiguous folds over `n` positions, the first `n % k` one longer.
///
/// Each item is the half-open range of the validation fold.
///
/// # Errors
/// `InsufficientData` if `n < k`.
pub fn kfold(n: usize, k: usize) -> Result<Vec<std::ops::Range<usize>>> {
    if k < 2 || n < k {
        return Err(Error::insufficient_data(format!(
            "{k}-fold cross-validation needs at least {k} training rows, got {n}"
        )));
    }
    let base = n / k;
    let extra = n % k;
    let mut start = 0;
    Ok((0..k)
        .map(|fold| {
            let len = base + usize::from(fold < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect())
}
