//! Time synchronization for jerk-limited velocity control

use libm::{fabs, sqrt};

use crate::profile::{ControlSigns, Profile, ReachedLimits, J_EPS};

/// Relative slack under which a negative radicand is treated as round-off
const RADICAND_EPS: f64 = 1e-12;

/// Profile recomputation for a jerk-limited axis and an imposed duration
#[derive(Debug)]
pub struct VelocityThirdOrderStep2 {
    tf: f64,
    a0: f64,
    af: f64,
    a_max: f64,
    a_min: f64,
    j_max: f64,
    /// Velocity difference `vf - v0`
    vd: f64,
    /// Acceleration difference `af - a0`
    ad: f64,
}

impl VelocityThirdOrderStep2 {
    /// Prepare a synchronization to duration `tf`
    ///
    /// `tf` must not be below the axis' own minimum duration; this is the
    /// caller's responsibility.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tf: f64,
        v0: f64,
        a0: f64,
        vf: f64,
        af: f64,
        a_max: f64,
        a_min: f64,
        j_max: f64,
    ) -> Self {
        Self {
            tf,
            a0,
            af,
            a_max,
            a_min,
            j_max,
            vd: vf - v0,
            ad: af - a0,
        }
    }

    fn time_acc0(&self, profile: &mut Profile, a_max: f64, a_min: f64, j_max: f64) -> bool {
        let (tf, a0, af, vd, ad) = (self.tf, self.a0, self.af, self.vd, self.ad);

        // UDDU: ramp, plateau at a free acceleration, ramp back
        {
            let mut radicand =
                tf * tf + (-ad * ad + 2.0 * j_max * ((a0 + af) * tf - 2.0 * vd)) / (j_max * j_max);
            if radicand < 0.0 && radicand > -RADICAND_EPS * (1.0 + tf * tf) {
                radicand = 0.0;
            }

            if radicand >= 0.0 {
                let h1 = sqrt(radicand);
                let t0 = ad / (2.0 * j_max) + (tf - h1) / 2.0;
                profile.t = [t0, h1, tf - (t0 + h1), 0.0, 0.0, 0.0, 0.0];

                // A vanishing plateau is the triangular profile of Step 1
                let limits = if h1 < f64::EPSILON {
                    ReachedLimits::None
                } else {
                    ReachedLimits::Acc0
                };
                if profile.check_for_velocity_with_timing(
                    ControlSigns::Uddu,
                    limits,
                    tf,
                    j_max,
                    a_max,
                    a_min,
                ) {
                    return true;
                }
            }
        }

        // UDDU with the plateau exactly at the limit. At tf == t_min the
        // square root above amplifies round-off past A_EPS.
        {
            let t0 = (a_max - a0) / j_max;
            let t2 = (a_max - af) / j_max;
            profile.t = [t0, tf - (t0 + t2), t2, 0.0, 0.0, 0.0, 0.0];

            if profile.check_for_velocity_with_timing(
                ControlSigns::Uddu,
                ReachedLimits::Acc0,
                tf,
                j_max,
                a_max,
                a_min,
            ) {
                return true;
            }
        }

        // UDUD: ramp, plateau, ramp further in the same direction
        {
            let h1 = -ad + j_max * tf;
            if fabs(h1) > f64::EPSILON {
                let t0 = -ad * ad / (2.0 * j_max * h1) + (vd - a0 * tf) / h1;
                let t1 = -ad / j_max + tf;
                profile.t = [t0, t1, 0.0, 0.0, tf - (t0 + t1), 0.0, 0.0];

                if profile.check_for_velocity_with_timing(
                    ControlSigns::Udud,
                    ReachedLimits::Acc0,
                    tf,
                    j_max,
                    a_max,
                    a_min,
                ) {
                    return true;
                }
            }
        }

        // UDUD in two steps: hold the initial acceleration, then ramp
        {
            profile.t = [0.0, -ad / j_max + tf, 0.0, 0.0, ad / j_max, 0.0, 0.0];

            if profile.check_for_velocity_with_timing(
                ControlSigns::Udud,
                ReachedLimits::Acc0,
                tf,
                j_max,
                a_max,
                a_min,
            ) {
                return true;
            }
        }

        false
    }

    fn time_none(&self, profile: &mut Profile, a_max: f64, a_min: f64, j_max: f64) -> bool {
        let (tf, a0, af, vd, ad) = (self.tf, self.a0, self.af, self.vd, self.ad);

        if fabs(a0) < f64::EPSILON && fabs(af) < f64::EPSILON && fabs(vd) < f64::EPSILON {
            profile.t = [0.0, tf, 0.0, 0.0, 0.0, 0.0, 0.0];

            if profile.check_for_velocity_with_timing(
                ControlSigns::Uddu,
                ReachedLimits::None,
                tf,
                j_max,
                a_max,
                a_min,
            ) {
                return true;
            }
        }

        // Single ramp with reduced jerk, then hold the target acceleration
        let h1 = 2.0 * (af * tf - vd);
        if fabs(h1) > f64::EPSILON && fabs(ad) > f64::EPSILON {
            let t0 = h1 / ad;
            profile.t = [t0, tf - t0, 0.0, 0.0, 0.0, 0.0, 0.0];

            let jf = ad * ad / h1;
            if fabs(jf) < fabs(j_max) + J_EPS
                && profile.check_for_velocity_with_timing(
                    ControlSigns::Uddu,
                    ReachedLimits::None,
                    tf,
                    jf,
                    a_max,
                    a_min,
                )
            {
                return true;
            }
        }

        false
    }

    /// Zero jerk: only the constant-acceleration duration or a hold works
    fn time_all_single_step(&self, profile: &mut Profile) -> bool {
        if fabs(self.ad) > f64::EPSILON {
            return false;
        }

        profile.t = [0.0; 7];
        if fabs(self.a0) > f64::EPSILON {
            profile.t[3] = self.vd / self.a0;
        } else if fabs(self.vd) < f64::EPSILON {
            profile.t[3] = self.tf;
        } else {
            return false;
        }

        profile.check_for_velocity_with_timing(
            ControlSigns::Uddu,
            ReachedLimits::None,
            self.tf,
            0.0,
            self.a_max,
            self.a_min,
        )
    }

    fn check_all(&self, profile: &mut Profile, a_max: f64, a_min: f64, j_max: f64) -> bool {
        self.time_acc0(profile, a_max, a_min, j_max) || self.time_none(profile, a_max, a_min, j_max)
    }

    /// Rewrite `profile` (boundary already set) to last exactly `tf`
    ///
    /// Returns `false` if no profile family realizes `tf`; the phases of
    /// `profile` are then meaningless.
    pub fn get_profile(self, profile: &mut Profile) -> bool {
        if self.j_max == 0.0 {
            return self.time_all_single_step(profile);
        }

        // Guess the likely direction first
        let found = if self.vd > 0.0 {
            self.check_all(profile, self.a_max, self.a_min, self.j_max)
                || self.check_all(profile, self.a_min, self.a_max, -self.j_max)
        } else {
            self.check_all(profile, self.a_min, self.a_max, -self.j_max)
                || self.check_all(profile, self.a_max, self.a_min, self.j_max)
        };

        if !found {
            debug!("Velocity step 2 failed for tf = {}", self.tf);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::velocity::VelocityThirdOrderStep1;

    fn approx(a: f64, b: f64) -> bool {
        fabs(a - b) < 1e-8
    }

    #[allow(clippy::too_many_arguments)]
    fn solve(
        tf: f64,
        v0: f64,
        a0: f64,
        vf: f64,
        af: f64,
        a_max: f64,
        a_min: f64,
        j_max: f64,
    ) -> Option<Profile> {
        let mut profile = Profile::default();
        profile.set_boundary(0.0, v0, a0, 0.0, vf, af);
        VelocityThirdOrderStep2::new(tf, v0, a0, vf, af, a_max, a_min, j_max)
            .get_profile(&mut profile)
            .then_some(profile)
    }

    #[test]
    fn test_extended_duration() {
        let p = solve(3.5, 0.0, 0.0, 2.0, 0.0, 1.0, -1.0, 1.0).unwrap();
        assert!(approx(p.duration(), 3.5));
        assert!(approx(p.v[7], 2.0));
        assert!(approx(p.a[7], 0.0));
        // Plateau below the limit
        assert!(p.a[1] < 1.0);
        assert!(approx(p.t[1], sqrt(4.25)));
    }

    #[test]
    fn test_minimum_duration_matches_step1() {
        let p = solve(3.0, 0.0, 0.0, 2.0, 0.0, 1.0, -1.0, 1.0).unwrap();
        assert!(approx(p.t[0], 1.0));
        assert!(approx(p.t[1], 1.0));
        assert!(approx(p.t[2], 1.0));
    }

    #[test]
    fn test_triangular_minimum_duration() {
        let tf = 2.0 * sqrt(0.5);
        let p = solve(tf, 0.0, 0.0, 0.5, 0.0, 1.0, -1.0, 1.0).unwrap();
        assert!(approx(p.duration(), tf));
        assert!(approx(p.v[7], 0.5));
    }

    #[test]
    fn test_hold_without_motion() {
        let p = solve(2.0, 1.0, 0.0, 1.0, 0.0, 1.0, -1.0, 1.0).unwrap();
        assert!(approx(p.duration(), 2.0));
        assert!(approx(p.v[7], 1.0));
        assert!(p.a.iter().all(|a| fabs(*a) < 1e-12));
    }

    #[test]
    fn test_negative_velocity_change() {
        let p = solve(4.0, 1.0, 0.0, -1.0, 0.0, 1.0, -1.0, 1.0).unwrap();
        assert!(approx(p.duration(), 4.0));
        assert!(approx(p.v[7], -1.0));
        assert!(p.a[1] < 0.0);
    }

    #[test]
    fn test_nonzero_target_acceleration() {
        // a0 = 0 -> af = 0.5, ramping up in two separated steps
        let tf = 2.0;
        let vd = 0.75;
        let p = solve(tf, 0.0, 0.0, vd, 0.5, 1.0, -1.0, 1.0).unwrap();
        assert!(approx(p.duration(), tf));
        assert!(approx(p.a[7], 0.5));
        assert!(approx(p.v[7], vd));
    }

    /// Minimum duration from Step 1 for the same boundary
    #[allow(clippy::too_many_arguments)]
    fn t_min(v0: f64, a0: f64, vf: f64, af: f64, a_max: f64, a_min: f64, j_max: f64) -> f64 {
        let mut boundary = Profile::default();
        boundary.set_boundary(0.0, v0, a0, 0.0, vf, af);
        VelocityThirdOrderStep1::new(v0, a0, vf, af, a_max, a_min, j_max)
            .get_profile(&boundary)
            .unwrap()
            .t_min
    }

    #[test]
    fn test_minimum_duration_with_short_plateau() {
        let (v0, a0, vf, af) = (
            -0.35933343740841384,
            1.246465932907801,
            0.83977518631843,
            1.222868395419395,
        );
        let (a_max, a_min, j_max) = (2.1231214340758795, -1.3210037858302646, 2.4883961848361213);

        let tf = t_min(v0, a0, vf, af, a_max, a_min, j_max);
        assert!(approx(tf, 0.7142207179281785));

        let p = solve(tf, v0, a0, vf, af, a_max, a_min, j_max).unwrap();
        assert_eq!(p.limits, ReachedLimits::Acc0);
        assert!(p.t[1] < 1e-3);
        assert!(p.a[1] <= a_max + 1e-12);
        assert!(approx(p.v[7], vf));
        assert!(approx(p.a[7], af));
    }

    #[test]
    fn test_minimum_duration_with_short_plateau_down() {
        let (v0, a0, vf, af) = (0.0, 0.121, -1.245304, -1.284);
        let (a_max, a_min, j_max) = (0.652, -2.254, 3.412);

        let tf = t_min(v0, a0, vf, af, a_max, a_min, j_max);
        let p = solve(tf, v0, a0, vf, af, a_max, a_min, j_max).unwrap();
        assert_eq!(p.limits, ReachedLimits::Acc0);
        assert!(p.t[1] < 1e-4);
        assert!(p.a[1] >= a_min - 1e-12);
        assert!(approx(p.duration(), tf));
        assert!(approx(p.v[7], vf));
    }

    #[test]
    fn test_duration_inside_blocked_interval_fails() {
        // Durations between 0.2254 and 1.7746 are infeasible for this axis
        assert!(solve(1.0, 0.0, 0.5, 0.1, 0.5, 1.0, -1.0, 1.0).is_none());
        assert!(solve(2.0, 0.0, 0.5, 0.1, 0.5, 1.0, -1.0, 1.0).is_some());
    }

    #[test]
    fn test_zero_jerk_hold() {
        assert!(solve(1.5, 0.2, 0.0, 0.2, 0.0, 1.0, -1.0, 0.0).is_some());
        assert!(solve(1.5, 0.2, 0.0, 0.4, 0.0, 1.0, -1.0, 0.0).is_none());
    }

    #[test]
    fn test_zero_jerk_exact_duration_only() {
        assert!(solve(2.0, 0.0, 0.5, 1.0, 0.5, 1.0, -1.0, 0.0).is_some());
        assert!(solve(2.5, 0.0, 0.5, 1.0, 0.5, 1.0, -1.0, 0.0).is_none());
    }
}
