//! Extremal profile search for jerk-limited velocity control

use heapless::Vec;
use libm::{fabs, sqrt};

use crate::block::{Block, Interval};
use crate::profile::{ControlSigns, Profile, ReachedLimits};

/// Capacity of the candidate buffer
///
/// The number of extremal profile shapes of the velocity interface is
/// fixed and small.
pub const MAX_VALID_PROFILES: usize = 3;

/// Minimum-time profile search for one jerk-limited axis
#[derive(Debug)]
pub struct VelocityThirdOrderStep1 {
    a0: f64,
    af: f64,
    a_max: f64,
    a_min: f64,
    j_max: f64,
    /// Velocity difference `vf - v0`
    vd: f64,
    valid_profiles: Vec<Profile, MAX_VALID_PROFILES>,
}

impl VelocityThirdOrderStep1 {
    /// Prepare a search with limits `a_max > 0 > a_min` and `j_max >= 0`
    pub fn new(v0: f64, a0: f64, vf: f64, af: f64, a_max: f64, a_min: f64, j_max: f64) -> Self {
        Self {
            a0,
            af,
            a_max,
            a_min,
            j_max,
            vd: vf - v0,
            valid_profiles: Vec::new(),
        }
    }

    fn add_profile(&mut self, profile: &Profile) {
        if self.valid_profiles.push(*profile).is_err() {
            warn!("Candidate buffer full, dropping profile of {}s", profile.duration());
        }
    }

    /// Acceleration plateau at the limit
    fn time_acc0(&mut self, profile: &mut Profile, a_max: f64, a_min: f64, j_max: f64) {
        let (a0, af, vd) = (self.a0, self.af, self.vd);

        profile.t = [
            (-a0 + a_max) / j_max,
            (a0 * a0 + af * af) / (2.0 * a_max * j_max) - a_max / j_max + vd / a_max,
            (-af + a_max) / j_max,
            0.0,
            0.0,
            0.0,
            0.0,
        ];

        if profile.check_for_velocity(ControlSigns::Uddu, ReachedLimits::Acc0, j_max, a_max, a_min)
        {
            self.add_profile(profile);
        }
    }

    /// Triangular acceleration without reaching a limit
    fn time_none(
        &mut self,
        profile: &mut Profile,
        a_max: f64,
        a_min: f64,
        j_max: f64,
        return_after_found: bool,
    ) {
        let (a0, af, vd) = (self.a0, self.af, self.vd);

        let h1 = (a0 * a0 + af * af) / 2.0 + j_max * vd;
        if h1 < 0.0 {
            return;
        }
        let h1 = sqrt(h1);

        // Peak acceleration -h1
        profile.t = [-(a0 + h1) / j_max, 0.0, -(af + h1) / j_max, 0.0, 0.0, 0.0, 0.0];
        if profile.check_for_velocity(ControlSigns::Uddu, ReachedLimits::None, j_max, a_max, a_min)
        {
            self.add_profile(profile);
            if return_after_found {
                return;
            }
        }

        // Peak acceleration +h1
        profile.t = [(-a0 + h1) / j_max, 0.0, (-af + h1) / j_max, 0.0, 0.0, 0.0, 0.0];
        if profile.check_for_velocity(ControlSigns::Uddu, ReachedLimits::None, j_max, a_max, a_min)
        {
            self.add_profile(profile);
        }
    }

    /// Zero jerk: the acceleration is frozen, so only a constant
    /// acceleration phase (or standing still) can reach the target
    fn time_all_single_step(&self, profile: &mut Profile) -> bool {
        if fabs(self.af - self.a0) > f64::EPSILON {
            return false;
        }

        profile.t = [0.0; 7];
        if fabs(self.a0) > f64::EPSILON {
            profile.t[3] = self.vd / self.a0;
        } else if fabs(self.vd) > f64::EPSILON {
            return false;
        }

        profile.check_for_velocity(
            ControlSigns::Uddu,
            ReachedLimits::None,
            0.0,
            self.a_max,
            self.a_min,
        )
    }

    /// Search the extremal profiles starting from the boundary of `input`
    ///
    /// Returns `None` if the target cannot be reached within the limits.
    pub fn get_profile(mut self, input: &Profile) -> Option<Block> {
        let mut profile = Profile::default();
        profile.set_boundary_from(input);

        if self.j_max == 0.0 {
            if !self.time_all_single_step(&mut profile) {
                trace!("Zero jerk limit, target unreachable");
                return None;
            }

            let mut block = Block::from_min(profile);
            if fabs(self.a0) > f64::EPSILON {
                // Only the exact constant-acceleration duration is feasible
                block.a = Some(Interval::new(block.t_min, f64::INFINITY));
            }
            return Some(block);
        }

        let up = (self.a_max, self.a_min, self.j_max);
        let down = (self.a_min, self.a_max, -self.j_max);

        if fabs(self.af) < f64::EPSILON {
            // No blocked interval when af == 0, so the first profile found is optimal
            let order = if self.vd >= 0.0 { [up, down] } else { [down, up] };
            for (a_max, a_min, j_max) in order {
                self.time_acc0(&mut profile, a_max, a_min, j_max);
                if !self.valid_profiles.is_empty() {
                    break;
                }
                self.time_none(&mut profile, a_max, a_min, j_max, true);
                if !self.valid_profiles.is_empty() {
                    break;
                }
            }
        } else {
            for (a_max, a_min, j_max) in [up, down] {
                self.time_acc0(&mut profile, a_max, a_min, j_max);
            }
            for (a_max, a_min, j_max) in [up, down] {
                self.time_none(&mut profile, a_max, a_min, j_max, false);
            }
        }

        trace!("Velocity step 1 found {} profiles", self.valid_profiles.len());
        Block::calculate(&self.valid_profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Direction;

    fn approx(a: f64, b: f64) -> bool {
        fabs(a - b) < 1e-8
    }

    fn solve(
        v0: f64,
        a0: f64,
        vf: f64,
        af: f64,
        a_max: f64,
        a_min: f64,
        j_max: f64,
    ) -> Option<Block> {
        let mut input = Profile::default();
        input.set_boundary(0.0, v0, a0, 0.0, vf, af);
        VelocityThirdOrderStep1::new(v0, a0, vf, af, a_max, a_min, j_max).get_profile(&input)
    }

    #[test]
    fn test_acc0_profile() {
        let block = solve(0.0, 0.0, 2.0, 0.0, 1.0, -1.0, 1.0).unwrap();
        // vd / aMax + aMax / jMax
        assert!(approx(block.t_min, 3.0));
        assert!(block.a.is_none());

        let p = block.p_min;
        assert_eq!(p.limits, ReachedLimits::Acc0);
        assert_eq!(p.direction, Direction::Up);
        assert!(approx(p.t[0], 1.0));
        assert!(approx(p.t[1], 1.0));
        assert!(approx(p.t[2], 1.0));
        assert!(approx(p.v[7], 2.0));
        assert!(approx(p.a[7], 0.0));
    }

    #[test]
    fn test_none_profile() {
        let block = solve(0.0, 0.0, 0.5, 0.0, 1.0, -1.0, 1.0).unwrap();
        // 2 * sqrt(vd / jMax)
        assert!(approx(block.t_min, 2.0 * sqrt(0.5)));
        assert_eq!(block.p_min.limits, ReachedLimits::None);
    }

    #[test]
    fn test_negative_velocity_change() {
        let block = solve(1.0, 0.0, -1.0, 0.0, 1.0, -1.0, 1.0).unwrap();
        assert!(approx(block.t_min, 3.0));
        assert_eq!(block.p_min.direction, Direction::Down);
        assert!(approx(block.p_min.v[7], -1.0));
    }

    #[test]
    fn test_asymmetric_limits() {
        // Braking uses aMin = -2
        let block = solve(4.0, 0.0, 0.0, 0.0, 1.0, -2.0, 2.0).unwrap();
        // vd / aMin + aMin / jMax with signs folded in
        assert!(approx(block.t_min, 3.0));
        assert!(approx(block.p_min.a[1], -2.0));
    }

    #[test]
    fn test_nonzero_target_acceleration() {
        let block = solve(0.0, 0.0, 1.0, 0.5, 1.0, -1.0, 1.0).unwrap();
        assert!(approx(block.t_min, 1.625));
        assert!(block.a.is_none());
        assert!(approx(block.p_min.a[7], 0.5));
    }

    #[test]
    fn test_blocked_interval() {
        let block = solve(0.0, 0.5, 0.1, 0.5, 1.0, -1.0, 1.0).unwrap();
        assert!(approx(block.t_min, 2.0 * (sqrt(0.35) - 0.5)));

        let interval = block.a.unwrap();
        assert!(approx(interval.left, 2.0 * (0.5 - sqrt(0.15))));
        assert!(approx(interval.right, 2.0 * (0.5 + sqrt(0.15))));
        assert!(block.is_blocked(1.0));
        assert!(!block.is_blocked(2.0));
    }

    #[test]
    fn test_zero_state_is_zero_duration() {
        let block = solve(0.5, 0.0, 0.5, 0.0, 1.0, -1.0, 1.0).unwrap();
        assert_eq!(block.t_min, 0.0);
    }

    #[test]
    fn test_zero_limits_zero_delta() {
        let block = solve(0.3, 0.0, 0.3, 0.0, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(block.t_min, 0.0);
        assert!(block.a.is_none());
    }

    #[test]
    fn test_zero_jerk_velocity_change_infeasible() {
        assert!(solve(0.0, 0.0, 1.0, 0.0, 1.0, -1.0, 0.0).is_none());
    }

    #[test]
    fn test_zero_jerk_constant_acceleration() {
        let block = solve(0.0, 0.5, 1.0, 0.5, 1.0, -1.0, 0.0).unwrap();
        assert!(approx(block.t_min, 2.0));

        let interval = block.a.unwrap();
        assert!(approx(interval.left, 2.0));
        assert!(interval.right.is_infinite());
        assert!(block.is_blocked(2.5));
    }

    #[test]
    fn test_zero_jerk_wrong_sign_acceleration() {
        assert!(solve(0.0, -0.5, 1.0, -0.5, 1.0, -1.0, 0.0).is_none());
    }
}
