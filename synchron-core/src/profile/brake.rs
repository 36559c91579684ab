//! Brake pre-trajectory
//!
//! When an axis starts with an acceleration outside its limits, it first
//! ramps the acceleration back inside with maximal jerk. The extremal and
//! synchronized profiles are then computed from the post-brake state.

use super::{integrate, KinematicState};

/// Margin added to the brake duration so the post-brake acceleration lies
/// strictly inside the limits
pub const BRAKE_EPS: f64 = 2.2e-14;

/// Single constant-jerk phase executed before the main profile
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BrakeProfile {
    /// Brake duration (zero when no brake is needed)
    pub duration: f64,
    /// Jerk applied while braking
    pub jerk: f64,
    /// Position at brake start
    pub p0: f64,
    /// Velocity at brake start
    pub v0: f64,
    /// Acceleration at brake start
    pub a0: f64,
}

impl BrakeProfile {
    /// Plan the brake for a velocity-controlled, jerk-limited axis
    ///
    /// No brake is planned for `j_max == 0`, as the acceleration cannot
    /// change at all.
    pub fn velocity_brake(a0: f64, a_max: f64, a_min: f64, j_max: f64) -> Self {
        let mut brake = Self::default();
        if j_max == 0.0 {
            return brake;
        }

        if a0 > a_max {
            brake.jerk = -j_max;
            brake.duration = (a0 - a_max) / j_max + BRAKE_EPS;
        } else if a0 < a_min {
            brake.jerk = j_max;
            brake.duration = (a_min - a0) / j_max + BRAKE_EPS;
        }
        brake
    }

    /// Check if a brake phase is executed
    pub fn is_active(&self) -> bool {
        self.duration > 0.0
    }

    /// Record the start state and return the state after braking
    ///
    /// Returns `(position, velocity, acceleration)`.
    pub fn finalize(&mut self, p: f64, v: f64, a: f64) -> (f64, f64, f64) {
        if !self.is_active() {
            self.duration = 0.0;
            return (p, v, a);
        }

        self.p0 = p;
        self.v0 = v;
        self.a0 = a;
        integrate(self.duration, p, v, a, self.jerk)
    }

    /// Sample the brake `time` seconds after its start
    pub fn state_at(&self, time: f64) -> KinematicState {
        let (position, velocity, acceleration) =
            integrate(time, self.p0, self.v0, self.a0, self.jerk);
        KinematicState {
            position,
            velocity,
            acceleration,
            jerk: self.jerk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libm::fabs;

    #[test]
    fn test_no_brake_within_limits() {
        let brake = BrakeProfile::velocity_brake(0.5, 1.0, -1.0, 1.0);
        assert!(!brake.is_active());
        assert_eq!(brake.duration, 0.0);
    }

    #[test]
    fn test_brake_above_max_acceleration() {
        let mut brake = BrakeProfile::velocity_brake(2.0, 1.0, -1.0, 2.0);
        assert!(brake.is_active());
        assert_eq!(brake.jerk, -2.0);
        assert!(fabs(brake.duration - 0.5) < 1e-12);

        let (_, v, a) = brake.finalize(0.0, 1.0, 2.0);
        assert!(a <= 1.0);
        assert!(fabs(a - 1.0) < 1e-12);
        // Average acceleration 1.5 over 0.5 s
        assert!(fabs(v - 1.75) < 1e-12);
    }

    #[test]
    fn test_brake_below_min_acceleration() {
        let mut brake = BrakeProfile::velocity_brake(-3.0, 1.0, -1.0, 1.0);
        assert_eq!(brake.jerk, 1.0);
        assert!(fabs(brake.duration - 2.0) < 1e-12);

        let (_, _, a) = brake.finalize(0.0, 0.0, -3.0);
        assert!(a >= -1.0);
    }

    #[test]
    fn test_zero_jerk_never_brakes() {
        let brake = BrakeProfile::velocity_brake(5.0, 1.0, -1.0, 0.0);
        assert!(!brake.is_active());
    }

    #[test]
    fn test_state_at_within_brake() {
        let mut brake = BrakeProfile::velocity_brake(2.0, 1.0, -1.0, 1.0);
        brake.finalize(0.0, 0.0, 2.0);

        let state = brake.state_at(0.5);
        assert!(fabs(state.acceleration - 1.5) < 1e-12);
        assert_eq!(state.jerk, -1.0);
    }
}
