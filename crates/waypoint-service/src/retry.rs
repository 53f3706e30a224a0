//! Exponential backoff with jitter for transient execution failures.
//!
//! Only failures the executor classifies as transient are retried. A
//! validated [`RetryConfig`] makes the jittered delays strictly increasing
//! until they reach `max_backoff_ms`. [`Backoff`] additionally enforces a
//! 1 ms step so the guarantee survives millisecond rounding.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Delay generator for one request's retry loop.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: RetryConfig,
    retries: u32,
    last: Option<Duration>,
}

impl Backoff {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            config: config.clone(),
            retries: 0,
            last: None,
        }
    }

    /// Un-jittered delay before retry `retry` (1-based), before capping.
    pub fn base_delay_ms(&self, retry: u32) -> f64 {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        self.config.initial_backoff_ms as f64 * self.config.multiplier.powi(exponent)
    }

    /// Delay to sleep before the next retry.
    pub fn next_delay<R: Rng>(&mut self, rng: &mut R) -> Duration {
        self.retries += 1;
        let jitter = if self.config.jitter_max > self.config.jitter_min {
            rng.gen_range(self.config.jitter_min..=self.config.jitter_max)
        } else {
            self.config.jitter_min
        };
        let cap_ms = self.config.max_backoff_ms;
        let jittered_ms = (self.base_delay_ms(self.retries) * jitter).round();
        let mut delay_ms = if jittered_ms.is_finite() && jittered_ms < cap_ms as f64 {
            jittered_ms as u64
        } else {
            cap_ms
        };
        if let Some(last) = self.last {
            let floor = u64::try_from(last.as_millis()).unwrap_or(u64::MAX).saturating_add(1);
            delay_ms = delay_ms.max(floor).min(cap_ms);
        }
        let delay = Duration::from_millis(delay_ms);
        self.last = Some(delay);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn base_delay_grows_geometrically() {
        let b = Backoff::new(&RetryConfig::default());
        assert_eq!(b.base_delay_ms(1), 100.0);
        assert_eq!(b.base_delay_ms(2), 200.0);
        assert_eq!(b.base_delay_ms(4), 800.0);
    }

    #[test]
    fn delays_stay_within_jitter_band() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = Backoff::new(&RetryConfig::default());
        let first = b.next_delay(&mut rng).as_millis();
        assert!((80..=120).contains(&first), "{first}");
        let second = b.next_delay(&mut rng).as_millis();
        assert!((160..=240).contains(&second), "{second}");
    }

    #[test]
    fn delays_capped_at_max_backoff() {
        let config = RetryConfig {
            max_attempts: 10,
            max_backoff_ms: 500,
            ..RetryConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut b = Backoff::new(&config);
        let delays: Vec<_> = (0..8).map(|_| b.next_delay(&mut rng)).collect();
        assert!(delays.iter().all(|d| *d <= Duration::from_millis(500)));
        assert_eq!(delays[7], Duration::from_millis(500));
    }

    #[test]
    fn tiny_backoff_still_strictly_increases() {
        let config = RetryConfig {
            initial_backoff_ms: 1,
            ..RetryConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut b = Backoff::new(&config);
        let delays: Vec<_> = (0..6).map(|_| b.next_delay(&mut rng)).collect();
        assert!(delays.windows(2).all(|w| w[0] < w[1]), "{delays:?}");
    }

    proptest! {
        /// Delays strictly increase until the cap, then stay at the cap.
        #[test]
        fn delays_monotonic_up_to_cap(seed in any::<u64>(), initial in 1u64..500, cap in 500u64..20_000) {
            let config = RetryConfig {
                max_attempts: 12,
                initial_backoff_ms: initial,
                max_backoff_ms: cap,
                ..RetryConfig::default()
            };
            prop_assume!(config.validate().is_ok());
            let mut rng = StdRng::seed_from_u64(seed);
            let mut b = Backoff::new(&config);
            let delays: Vec<u128> = (0..12).map(|_| b.next_delay(&mut rng).as_millis()).collect();
            for w in delays.windows(2) {
                prop_assert!(w[0] < w[1] || (w[0] == u128::from(cap) && w[1] == u128::from(cap)));
            }
            prop_assert!(delays.iter().all(|d| *d <= u128::from(cap)));
        }
    }
}
