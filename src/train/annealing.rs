//! KL-weight annealing schedule
//!
//! The weight on the latent-space regularization term ramps from 0 toward
//! 1 once training passes a step threshold, one increment per checkpoint
//! boundary. The result is a step-function ramp, not continuous growth.

use crate::config::TrainParams;

#[derive(Debug, Clone, PartialEq)]
pub struct AnnealingScheduler {
    rate: f64,
    rise_time: u64,
    rise_factor: f64,
    enabled: bool,
}

impl AnnealingScheduler {
    pub fn new(enabled: bool, initial_rate: f64, rise_time: u64, rise_factor: f64) -> Self {
        Self { rate: initial_rate, rise_time, rise_factor, enabled }
    }

    /// Schedule from training hyperparameters: an annealing run starts at
    /// rate 0, a non-annealing run pins the rate at full weight.
    #[must_use]
    pub fn from_params(params: &TrainParams) -> Self {
        let initial = if params.annealing { 0.0 } else { 1.0 };
        Self::new(params.annealing, initial, params.kl_rate_rise_time, params.kl_rate_rise_factor)
    }

    /// Fixed full-weight schedule
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false, 1.0, 0, 0.0)
    }

    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Apply at most one increment for the current step. Returns whether
    /// the rate changed. Called once per checkpoint boundary.
    pub fn advance(&mut self, current_step: u64) -> bool {
        if self.enabled && current_step >= self.rise_time && self.rate < 1.0 {
            self.rate = (self.rate + self.rise_factor).min(1.0);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rise_before_threshold() {
        let mut sched = AnnealingScheduler::new(true, 0.0, 1000, 0.25);
        assert!(!sched.advance(999));
        assert_eq!(sched.rate(), 0.0);
    }

    #[test]
    fn test_step_ramp_and_saturation() {
        let mut sched = AnnealingScheduler::new(true, 0.0, 1000, 0.4);
        assert!(sched.advance(1000));
        assert!(sched.advance(2000));
        assert!(sched.advance(3000));
        assert_eq!(sched.rate(), 1.0);
        // saturated: no further change
        assert!(!sched.advance(4000));
        assert_eq!(sched.rate(), 1.0);
    }

    #[test]
    fn test_disabled_rate_is_pinned() {
        let mut sched = AnnealingScheduler::disabled();
        assert!(!sched.advance(1_000_000));
        assert_eq!(sched.rate(), 1.0);
    }

    #[test]
    fn test_from_params() {
        let mut params = TrainParams::default();
        assert_eq!(AnnealingScheduler::from_params(&params).rate(), 1.0);

        params.annealing = true;
        let sched = AnnealingScheduler::from_params(&params);
        assert_eq!(sched.rate(), 0.0);
    }
}
