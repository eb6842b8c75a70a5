/// Rescales raw rewards by the first nonzero reward observed in the run.
///
/// State spans the whole run and is never reset between episodes. The divisor
/// is the signed first reward, so scale is normalized against the first
/// observed event magnitude.
#[derive(Debug, Clone, Default)]
pub struct RewardNormalizer {
    first: Option<f64>,
}

impl RewardNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity until the first nonzero reward; `raw / r0` from then on.
    pub fn normalize(&mut self, raw: f64) -> f64 {
        if self.first.is_none() && raw != 0.0 {
            self.first = Some(raw);
        }
        match self.first {
            Some(first) => raw / first,
            None => raw,
        }
    }
}

#[cfg(test)]
mod test {
    use super::RewardNormalizer;

    #[test]
    fn identity_before_first_nonzero() {
        let mut norm = RewardNormalizer::new();
        assert_eq!(norm.normalize(0.0), 0.0);
        assert_eq!(norm.normalize(0.0), 0.0);
    }

    #[test]
    fn scales_by_first_nonzero() {
        let mut norm = RewardNormalizer::new();
        assert_eq!(norm.normalize(0.0), 0.0);
        assert_eq!(norm.normalize(10.0), 1.0);
        assert_eq!(norm.normalize(5.0), 0.5);
        assert_eq!(norm.normalize(0.0), 0.0);
        assert_eq!(norm.normalize(-10.0), -1.0);
    }

    #[test]
    fn negative_first_reward_flips_sign() {
        let mut norm = RewardNormalizer::new();
        assert_eq!(norm.normalize(-4.0), 1.0);
        assert_eq!(norm.normalize(2.0), -0.5);
    }

    #[test]
    fn all_zero_run_stays_identity() {
        let mut norm = RewardNormalizer::new();
        for _ in 0..100 {
            assert_eq!(norm.normalize(0.0), 0.0);
        }
    }
}
