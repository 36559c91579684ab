//! TOML planner configuration
//!
//! ```toml
//! version = 1
//! cycle_time = 0.001
//! synchronization = "time"
//!
//! [[axis]]
//! name = "x"
//! max_acceleration = 2.0
//! max_jerk = 8.0
//! ```
//!
//! The file is deserialized into growable collections first, so running
//! out of `heapless` capacity is reported as its own error instead of a
//! generic syntax error.

use heapless::String as HString;
use serde::Deserialize;

use synchron_core::config::{
    AxisConfig, DurationDiscretization, PlannerConfig, Synchronization, CONFIG_VERSION,
    DEFAULT_CYCLE_TIME, MAX_NAME_LEN,
};

/// Parse error
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Malformed TOML or unknown key
    Syntax(String),
    /// Invalid value for a planner-wide key
    InvalidValue(&'static str),
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
    /// Unsupported format version
    VersionMismatch { found: u8 },
    /// Two axes share a name
    DuplicateAxis(String),
    /// Axis name or limits are invalid
    InvalidAxis { index: usize },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    version: u8,
    #[serde(default = "default_cycle_time")]
    cycle_time: f64,
    #[serde(default)]
    synchronization: Synchronization,
    #[serde(default)]
    duration_discretization: DurationDiscretization,
    #[serde(default)]
    minimum_duration: Option<f64>,
    #[serde(default)]
    axis: Vec<RawAxis>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAxis {
    name: String,
    max_acceleration: f64,
    #[serde(default)]
    min_acceleration: Option<f64>,
    #[serde(default)]
    max_jerk: Option<f64>,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_cycle_time() -> f64 {
    DEFAULT_CYCLE_TIME
}

fn default_enabled() -> bool {
    true
}

/// Parse TOML configuration into PlannerConfig
pub fn parse_config(input: &str) -> Result<PlannerConfig, ParseError> {
    let raw: RawConfig =
        ::toml::from_str(input).map_err(|e| ParseError::Syntax(e.message().into()))?;

    if raw.version != CONFIG_VERSION {
        return Err(ParseError::VersionMismatch { found: raw.version });
    }
    if !(raw.cycle_time.is_finite() && raw.cycle_time > 0.0) {
        return Err(ParseError::InvalidValue("cycle_time"));
    }
    if let Some(t) = raw.minimum_duration {
        if t.is_nan() || t < 0.0 {
            return Err(ParseError::InvalidValue("minimum_duration"));
        }
    }

    let mut config = PlannerConfig {
        version: raw.version,
        cycle_time: raw.cycle_time,
        synchronization: raw.synchronization,
        duration_discretization: raw.duration_discretization,
        minimum_duration: raw.minimum_duration,
        ..PlannerConfig::default()
    };

    for (index, axis) in raw.axis.into_iter().enumerate() {
        if config.axis(&axis.name).is_some() {
            return Err(ParseError::DuplicateAxis(axis.name));
        }

        let axis = parse_axis(index, axis)?;
        config
            .axes
            .push(axis)
            .map_err(|_| ParseError::TooManyItems)?;
    }

    Ok(config)
}

fn parse_axis(index: usize, raw: RawAxis) -> Result<AxisConfig, ParseError> {
    let invalid = ParseError::InvalidAxis { index };

    let name: HString<MAX_NAME_LEN> = raw.name.as_str().try_into().map_err(|_| invalid.clone())?;
    if name.is_empty() {
        return Err(invalid);
    }

    let limits_ok = raw.max_acceleration.is_finite()
        && raw.max_acceleration >= 0.0
        && raw.min_acceleration.map_or(true, |a| a.is_finite() && a <= 0.0)
        && raw.max_jerk.map_or(true, |j| j.is_finite() && j >= 0.0);
    if !limits_ok {
        return Err(invalid);
    }

    Ok(AxisConfig {
        name,
        max_acceleration: raw.max_acceleration,
        min_acceleration: raw.min_acceleration,
        max_jerk: raw.max_jerk,
        enabled: raw.enabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANNER_TOML: &str = include_str!("../planner.toml");

    #[test]
    fn test_parse_bundled_config() {
        let config = parse_config(PLANNER_TOML).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.cycle_time, 0.001);
        assert_eq!(config.synchronization, Synchronization::Time);
        assert_eq!(config.axes.len(), 3);

        let x = config.axis("x").unwrap();
        assert_eq!(x.limits().a_min(), -1.5);
        assert_eq!(x.max_jerk, Some(8.0));

        let spindle = config.axis("spindle").unwrap();
        assert_eq!(spindle.max_jerk, None);
        assert!(!config.axis("z").unwrap().enabled);
    }

    #[test]
    fn test_defaults() {
        let config = parse_config("version = 1\n").unwrap();
        assert_eq!(config.cycle_time, DEFAULT_CYCLE_TIME);
        assert_eq!(config.duration_discretization, DurationDiscretization::Continuous);
        assert_eq!(config.minimum_duration, None);
        assert!(config.axes.is_empty());
    }

    #[test]
    fn test_enum_values() {
        let config = parse_config(
            "version = 1\nsynchronization = \"none\"\nduration_discretization = \"discrete\"\n",
        )
        .unwrap();
        assert_eq!(config.synchronization, Synchronization::None);
        assert_eq!(config.duration_discretization, DurationDiscretization::Discrete);

        assert!(matches!(
            parse_config("version = 1\nsynchronization = \"phase\"\n"),
            Err(ParseError::Syntax(_))
        ));
    }

    #[test]
    fn test_version_mismatch() {
        assert_eq!(
            parse_config("version = 2\n"),
            Err(ParseError::VersionMismatch { found: 2 })
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(parse_config("version = "), Err(ParseError::Syntax(_))));
        assert!(matches!(
            parse_config("version = 1\nspeed = 3\n"),
            Err(ParseError::Syntax(_))
        ));
        assert!(matches!(parse_config(""), Err(ParseError::Syntax(_))));
    }

    #[test]
    fn test_invalid_cycle_time() {
        assert_eq!(
            parse_config("version = 1\ncycle_time = 0.0\n"),
            Err(ParseError::InvalidValue("cycle_time"))
        );
        assert_eq!(
            parse_config("version = 1\nminimum_duration = -1.0\n"),
            Err(ParseError::InvalidValue("minimum_duration"))
        );
    }

    #[test]
    fn test_invalid_axis() {
        let toml = "version = 1\n[[axis]]\nname = \"a\"\nmax_acceleration = 1.0\n\
                    [[axis]]\nname = \"b\"\nmax_acceleration = 1.0\nmin_acceleration = 0.5\n";
        assert_eq!(parse_config(toml), Err(ParseError::InvalidAxis { index: 1 }));

        let toml =
            "version = 1\n[[axis]]\nname = \"a_very_long_axis_name\"\nmax_acceleration = 1.0\n";
        assert_eq!(parse_config(toml), Err(ParseError::InvalidAxis { index: 0 }));
    }

    #[test]
    fn test_duplicate_axis() {
        let toml = "version = 1\n[[axis]]\nname = \"x\"\nmax_acceleration = 1.0\n\
                    [[axis]]\nname = \"x\"\nmax_acceleration = 2.0\n";
        assert_eq!(parse_config(toml), Err(ParseError::DuplicateAxis("x".into())));
    }

    #[test]
    fn test_too_many_axes() {
        let mut toml = String::from("version = 1\n");
        for i in 0..9 {
            toml.push_str(&format!("[[axis]]\nname = \"a{}\"\nmax_acceleration = 1.0\n", i));
        }
        assert_eq!(parse_config(&toml), Err(ParseError::TooManyItems));
    }
}
