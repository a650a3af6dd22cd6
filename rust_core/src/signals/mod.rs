//! Auxiliary pregame signals blended alongside the classifier.
//!
//! - Head-to-head win rate of the home side at home against this opponent
//! - Home-court baseline (constant)
//! - Rest-day differential

pub mod head_to_head;
pub mod rest;

pub use head_to_head::{head_to_head, HeadToHead, H2H_WINDOW};
pub use rest::{rest_bump, rest_days, RestAdjustment, REST_BUMP_PER_DAY, REST_CLAMP_DAYS};

/// Fixed home-court bump favoring the home side. Not derived from data.
pub const HOME_COURT_BUMP: f64 = 0.05;

/// Home-court signal for one side, expressed as 0.5 ± bump
pub fn home_court_signal(for_home: bool) -> f64 {
    if for_home {
        0.5 + HOME_COURT_BUMP
    } else {
        0.5 - HOME_COURT_BUMP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_court_signal_is_symmetric() {
        assert!((home_court_signal(true) - 0.55).abs() < 1e-12);
        assert!((home_court_signal(false) - 0.45).abs() < 1e-12);
        assert!((home_court_signal(true) + home_court_signal(false) - 1.0).abs() < 1e-12);
    }
}
