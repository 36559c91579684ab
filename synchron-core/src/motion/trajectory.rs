//! Calculated multi-axis trajectory

use crate::profile::{KinematicState, Profile};

/// Synchronized profiles of `N` axes
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Trajectory<const N: usize> {
    pub(crate) profiles: [Profile; N],
    pub(crate) duration: f64,
    pub(crate) independent_min_durations: [f64; N],
    pub(crate) limiting_dof: Option<usize>,
}

impl<const N: usize> Default for Trajectory<N> {
    fn default() -> Self {
        Self {
            profiles: [Profile::default(); N],
            duration: 0.0,
            independent_min_durations: [0.0; N],
            limiting_dof: None,
        }
    }
}

impl<const N: usize> Trajectory<N> {
    /// Total duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn profiles(&self) -> &[Profile; N] {
        &self.profiles
    }

    /// Minimum duration each axis would need on its own
    pub fn independent_min_durations(&self) -> &[f64; N] {
        &self.independent_min_durations
    }

    /// Axis that determined the duration, if any
    ///
    /// `None` when the duration came from `minimum_duration` or was
    /// rounded to the control cycle.
    pub fn limiting_dof(&self) -> Option<usize> {
        self.limiting_dof
    }

    /// Sample all axes at `time`
    ///
    /// Times before the start clamp to the initial state; past the end of
    /// its profile each axis continues with its final acceleration.
    pub fn at_time(&self, time: f64) -> [KinematicState; N] {
        let mut states = [KinematicState::default(); N];
        for (state, profile) in states.iter_mut().zip(self.profiles.iter()) {
            *state = profile.state_at(time);
        }
        states
    }
}
