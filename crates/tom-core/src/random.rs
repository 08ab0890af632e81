/// Source of dice values, injected by the host. Implementations must return a
/// value in `min..=max`; out-of-range values are clamped by the caller.
pub trait RandomSource {
    fn roll(&mut self, min: i64, max: i64) -> i64;
}

impl<F> RandomSource for F
where
    F: FnMut(i64, i64) -> i64,
{
    fn roll(&mut self, min: i64, max: i64) -> i64 {
        self(min, max)
    }
}

/// Seeded splitmix64 generator for hosts that need a concrete source.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl RandomSource for SeededRandom {
    fn roll(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        let span = (i128::from(max) - i128::from(min) + 1) as u128;
        if span > u128::from(u64::MAX) {
            return self.next_u64() as i64;
        }
        let span = span as u64;
        // Rejection keeps every face equally likely.
        let limit = u64::MAX - u64::MAX % span;
        loop {
            let value = self.next_u64();
            if value < limit {
                return (i128::from(min) + i128::from(value % span)) as i64;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RandomSource, SeededRandom};

    #[test]
    fn same_seed_same_rolls() {
        let mut left = SeededRandom::new(42);
        let mut right = SeededRandom::new(42);
        for _ in 0..32 {
            assert_eq!(left.roll(1, 100), right.roll(1, 100));
        }
    }

    #[test]
    fn rolls_stay_in_bounds() {
        let mut random = SeededRandom::new(7);
        for _ in 0..1000 {
            let value = random.roll(-3, 3);
            assert!((-3..=3).contains(&value));
        }
        assert_eq!(random.roll(5, 5), 5);
        let wide = random.roll(i64::MIN, i64::MAX);
        assert!((i64::MIN..=i64::MAX).contains(&wide));
    }

    #[test]
    fn closures_are_sources() {
        let mut max_random = |_min: i64, max: i64| max;
        assert_eq!(max_random.roll(1, 20), 20);
    }
}
