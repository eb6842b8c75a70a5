// Run-wide deterministic rng. Reseed once at startup for reproducible runs.

use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};
use std::cell::RefCell;

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::seed_from_u64(0));
}

/// Reseeds the thread-local generator.
pub fn seed(seed: u64) {
    RNG.with_borrow_mut(|rng| *rng = StdRng::seed_from_u64(seed));
}

/// Runs `f` with the thread-local generator.
pub fn with_rng<T>(f: impl FnOnce(&mut StdRng) -> T) -> T {
    RNG.with_borrow_mut(f)
}

/// Uniform choice over a slice. `None` on an empty slice.
pub fn choose<T: Copy>(items: &[T]) -> Option<T> {
    with_rng(|rng| items.choose(rng).copied())
}

#[cfg(test)]
mod test {
    use super::{choose, seed};

    #[test]
    fn choose_is_reproducible_after_seeding() {
        let items = [1u32, 2, 3, 4, 5];
        seed(42);
        let first: Vec<_> = (0..10).map(|_| choose(&items).unwrap()).collect();
        seed(42);
        let second: Vec<_> = (0..10).map(|_| choose(&items).unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn choose_on_empty_slice_is_none() {
        assert_eq!(choose::<u32>(&[]), None);
    }
}
