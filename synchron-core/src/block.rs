//! Feasible durations of a single axis
//!
//! Step 1 may find several extremal profiles for one axis. The fastest one
//! defines the minimum duration; when two further profiles exist, the
//! durations strictly between them cannot be realized and form a blocked
//! interval.

use crate::profile::Profile;

/// Tolerance under which two candidate durations count as equal
const DURATION_EPS: f64 = 8.0 * f64::EPSILON;

/// Blocked interval of durations `(left, right)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Interval {
    /// Lower bound (exclusive)
    pub left: f64,
    /// Upper bound (exclusive)
    pub right: f64,
    /// Profile realizing the duration `right`
    pub profile: Profile,
}

impl Interval {
    /// Create an interval from raw bounds (sorted), with an empty profile
    pub fn new(left: f64, right: f64) -> Self {
        Self {
            left: left.min(right),
            right: left.max(right),
            profile: Profile::default(),
        }
    }

    /// Create the interval spanned by two profiles
    ///
    /// The profile of the longer duration becomes the interval's profile.
    pub fn between(first: &Profile, second: &Profile) -> Self {
        let first_duration = first.duration();
        let second_duration = second.duration();
        if first_duration < second_duration {
            Self {
                left: first_duration,
                right: second_duration,
                profile: *second,
            }
        } else {
            Self {
                left: second_duration,
                right: first_duration,
                profile: *first,
            }
        }
    }
}

/// Result of the extremal profile search of one axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Block {
    /// Minimum-duration profile
    pub p_min: Profile,
    /// Minimum duration (brake included)
    pub t_min: f64,
    /// Optional blocked interval above `t_min`
    pub a: Option<Interval>,
}

impl Block {
    /// Create a block holding only a minimum profile
    pub fn from_min(profile: Profile) -> Self {
        Self {
            p_min: profile,
            t_min: profile.duration(),
            a: None,
        }
    }

    /// Build a block from the valid profiles of a Step 1 search
    ///
    /// Returns `None` if there is no candidate or an unexpected number of
    /// candidates.
    pub fn calculate(valid_profiles: &[Profile]) -> Option<Self> {
        match valid_profiles {
            [single] => Some(Self::from_min(*single)),
            [first, second] => {
                if libm::fabs(first.duration() - second.duration()) < DURATION_EPS {
                    return Some(Self::from_min(*first));
                }

                let (min, other) = if first.duration() < second.duration() {
                    (first, second)
                } else {
                    (second, first)
                };
                let mut block = Self::from_min(*min);
                block.a = Some(Interval::between(min, other));
                Some(block)
            }
            [_, _, _] => {
                let idx_min = valid_profiles
                    .iter()
                    .enumerate()
                    .min_by(|(_, l), (_, r)| l.duration().total_cmp(&r.duration()))
                    .map(|(i, _)| i)?;
                let idx_else_1 = (idx_min + 1) % 3;
                let idx_else_2 = (idx_min + 2) % 3;

                let mut block = Self::from_min(valid_profiles[idx_min]);
                block.a = Some(Interval::between(
                    &valid_profiles[idx_else_1],
                    &valid_profiles[idx_else_2],
                ));
                Some(block)
            }
            _ => None,
        }
    }

    /// Check if duration `t` cannot be realized by this axis
    pub fn is_blocked(&self, t: f64) -> bool {
        if t < self.t_min {
            return true;
        }
        match &self.a {
            Some(interval) => interval.left < t && t < interval.right,
            None => false,
        }
    }

    /// Get the extremal profile whose feasible range contains `t`
    pub fn get_profile(&self, t: f64) -> &Profile {
        match &self.a {
            Some(interval) if t >= interval.right => &interval.profile,
            _ => &self.p_min,
        }
    }
}
