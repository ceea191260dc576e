//! The backend's fixed resolution enum and the TTL table used to pick the
//! coarsest resolution that still covers a requested window.

use std::fmt;

/// One of the backend's fixed output resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resolution {
    Full,
    Min5,
    Min20,
    Min60,
    Min240,
    Min1440,
}

impl Resolution {
    const ORDER: [Resolution; 6] =
        [Resolution::Full, Resolution::Min5, Resolution::Min20, Resolution::Min60, Resolution::Min240, Resolution::Min1440];

    /// The step size of this resolution, in milliseconds.
    pub fn step_ms(self) -> i64 {
        match self {
            Resolution::Full => 10_000,
            Resolution::Min5 => 5 * 60_000,
            Resolution::Min20 => 20 * 60_000,
            Resolution::Min60 => 60 * 60_000,
            Resolution::Min240 => 240 * 60_000,
            Resolution::Min1440 => 1_440 * 60_000,
        }
    }

    /// Retention, in milliseconds, before points at this resolution expire.
    pub fn ttl_ms(self) -> i64 {
        let days = match self {
            Resolution::Full => 7,
            Resolution::Min5 => 30,
            Resolution::Min20 => 60,
            Resolution::Min60 => 90,
            Resolution::Min240 => 180,
            Resolution::Min1440 => 365,
        };
        days * 86_400_000
    }

    /// The step size of the next coarser resolution, or `i64::MAX` for the
    /// coarsest.
    fn next_step_ms(self) -> i64 {
        let idx = Self::ORDER.iter().position(|&r| r == self).expect("exhaustive enum");
        Self::ORDER.get(idx + 1).map(|r| r.step_ms()).unwrap_or(i64::MAX)
    }

    /// Choose the finest resolution `R` such that `requested_step_ms <
    /// R.next_step_ms()` and `age_ms < R.ttl_ms()`, falling back to
    /// [`Resolution::Min1440`] if none qualifies.
    pub fn choose(requested_step_ms: i64, age_ms: i64) -> Resolution {
        for &r in &Self::ORDER {
            if requested_step_ms < r.next_step_ms() && age_ms < r.ttl_ms() {
                return r;
            }
        }
        Resolution::Min1440
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resolution::Full => "FULL",
            Resolution::Min5 => "MIN5",
            Resolution::Min20 => "MIN20",
            Resolution::Min60 => "MIN60",
            Resolution::Min240 => "MIN240",
            Resolution::Min1440 => "MIN1440",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chooses_full_for_fresh_fine_grained_request() {
        assert_eq!(Resolution::choose(5_000, 60_000), Resolution::Full);
    }

    #[test]
    fn chooses_coarser_resolution_as_requested_step_grows() {
        assert_eq!(Resolution::choose(11_000, 60_000), Resolution::Min5);
        assert_eq!(Resolution::choose(5 * 60_000 + 1, 60_000), Resolution::Min20);
    }

    #[test]
    fn falls_back_to_coarsest_resolution_for_very_old_data() {
        let far_past = 400 * 86_400_000;
        assert_eq!(Resolution::choose(10_000, far_past), Resolution::Min1440);
    }

    #[test]
    fn display_matches_backend_enum_names() {
        assert_eq!(Resolution::Min240.to_string(), "MIN240");
    }
}
