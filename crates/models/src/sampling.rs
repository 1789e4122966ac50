//! Uniform `(user, positive, negative)` triple sampling for pairwise models.

use data_loader::{Interaction, InteractionSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NEGATIVE_ATTEMPTS: usize = 10;

/// Draws a random training interaction and an item the user has not seen.
pub(crate) struct TripletSampler<'a> {
    train: &'a InteractionSet,
    n_items: usize,
}

impl<'a> TripletSampler<'a> {
    pub(crate) fn new(train: &'a InteractionSet, n_items: usize) -> Self {
        Self { train, n_items }
    }

    /// `None` when no unseen item was found within a few attempts.
    pub(crate) fn sample<R: Rng>(&self, rng: &mut R) -> Option<(usize, usize, usize)> {
        let interactions = self.train.interactions();
        if interactions.is_empty() || self.n_items < 2 {
            return None;
        }

        let Interaction { user, item, .. } = interactions[rng.random_range(0..interactions.len())];
        let seen = self.train.user_items(user);

        (0..NEGATIVE_ATTEMPTS)
            .map(|_| rng.random_range(0..self.n_items))
            .find(|negative| seen.is_none_or(|items| !items.contains(negative)))
            .map(|negative| (user, item, negative))
    }
}

/// Seeded generator, or one seeded from the OS when no seed is configured
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Initial latent factors: uniform in `[-0.5, 0.5) / k`
pub(crate) fn init_factors<R: Rng>(rng: &mut R, len: usize, k: usize) -> Vec<f32> {
    let scale = 1.0 / k.max(1) as f32;
    (0..len).map(|_| (rng.random::<f32>() - 0.5) * scale).collect()
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `ln σ(x)` derivative weight, `σ(-x)`, computed without overflow
pub(crate) fn sigmoid_neg(x: f32) -> f32 {
    if x >= 0.0 {
        let e = (-x).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + x.exp())
    }
}

pub(crate) fn all_finite(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_set() -> InteractionSet {
        let mut set = InteractionSet::new();
        for (user, item) in [(0, 0), (0, 1), (1, 2)] {
            set.insert(Interaction {
                user,
                item,
                rating: 1.0,
            });
        }
        set
    }

    #[test]
    fn test_negatives_are_unseen() {
        let set = create_test_set();
        let sampler = TripletSampler::new(&set, 4);
        let mut rng = seeded_rng(Some(7));

        for _ in 0..200 {
            if let Some((user, positive, negative)) = sampler.sample(&mut rng) {
                let seen = set.user_items(user).unwrap();
                assert!(seen.contains(&positive));
                assert!(!seen.contains(&negative));
            }
        }
    }

    #[test]
    fn test_no_negative_available() {
        let set = create_test_set();
        let sampler = TripletSampler::new(&set, 1);
        let mut rng = seeded_rng(Some(7));
        assert!(sampler.sample(&mut rng).is_none());
    }

    #[test]
    fn test_sigmoid_neg() {
        assert!((sigmoid_neg(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid_neg(100.0) < 1e-6);
        assert!((sigmoid_neg(-100.0) - 1.0).abs() < 1e-6);
    }
}
