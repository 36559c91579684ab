//! Velocity control interface
//!
//! Each solver is a prepared request: the constructor precomputes the
//! boundary differences shared by every candidate family, and
//! `get_profile` consumes the solver, so one instance serves exactly one
//! axis in one planning cycle.
//!
//! - Step 1 finds the minimum-duration profile and the feasible durations
//!   ([`Block`](crate::block::Block)).
//! - Step 2 recomputes a profile for an imposed duration `tf`.

pub mod second_step1;
pub mod second_step2;
pub mod third_step1;
pub mod third_step2;

pub use second_step1::VelocitySecondOrderStep1;
pub use second_step2::VelocitySecondOrderStep2;
pub use third_step1::{VelocityThirdOrderStep1, MAX_VALID_PROFILES};
pub use third_step2::VelocityThirdOrderStep2;
