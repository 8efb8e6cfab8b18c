use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A project lifecycle stage.
///
/// The variants are declared in lifecycle order, so the derived ordering is the
/// chronological one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    /// Mission analysis / needs identification.
    Zero,
    /// Feasibility.
    A,
    /// Preliminary definition.
    B,
    /// Detailed definition.
    C,
    /// Qualification and production.
    D,
    /// Utilisation.
    E,
    /// Disposal.
    F,
}

impl Phase {
    /// All phases in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Zero,
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
    ];

    /// The canonical upper case name of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "ZERO",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = UnknownPhaseError;

    /// Parses a phase name, ignoring case. `0` is accepted for [`Phase::Zero`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        if upper == "0" {
            return Ok(Self::Zero);
        }
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str() == upper)
            .ok_or_else(|| UnknownPhaseError(s.to_string()))
    }
}

/// Error returned when a string does not name a [`Phase`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown phase '{0}': expected one of ZERO, A, B, C, D, E, F")]
pub struct UnknownPhaseError(String);

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("ZERO", Phase::Zero; "zero by name")]
    #[test_case("0", Phase::Zero; "zero by digit")]
    #[test_case("b", Phase::B; "lower case")]
    #[test_case(" F ", Phase::F; "surrounding whitespace")]
    fn parses_phase(input: &str, expected: Phase) {
        assert_eq!(input.parse::<Phase>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_phase() {
        assert_eq!(
            "G".parse::<Phase>(),
            Err(UnknownPhaseError("G".to_string()))
        );
    }

    #[test]
    fn ordering_follows_lifecycle() {
        let mut phases = vec![Phase::C, Phase::Zero, Phase::A];
        phases.sort();
        assert_eq!(phases, vec![Phase::Zero, Phase::A, Phase::C]);
    }

    #[test]
    fn serializes_upper_case_names() {
        let yaml = serde_yaml::to_string(&[Phase::Zero, Phase::B]).unwrap();
        assert_eq!(yaml, "- ZERO\n- B\n");
    }
}
